// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
// ============================================================================

pub mod coin;   // Déclaration du module coin (fichier coin.rs)
pub mod chart;  // Déclaration du module chart (fichier chart.rs)

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use coinwatch::models::coin::Coin;
// On peut faire : use coinwatch::models::Coin;
pub use chart::ChartSeries;
pub use coin::Coin;

// ============================================================================
// Module : store
// ============================================================================
// L'état durable de l'application, hors UI :
// - market : table des cryptos, réconciliée entre catalogue et feed
// - watchlist : favoris de l'utilisateur, persistés sur disque
// ============================================================================

pub mod market;    // Table des cryptos + cache des graphiques
pub mod watchlist; // Favoris persistés en JSON

pub use market::MarketStore;
pub use watchlist::WatchlistStore;

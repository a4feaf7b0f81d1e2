// ============================================================================
// Module : api
// ============================================================================
// Intégrations réseau sortantes : catalogue REST et feed de prix temps réel
// ============================================================================

pub mod coingecko; // Catalogue top 100 + graphique 7 jours (REST)
pub mod stream;    // Feed de prix Coinbase (WebSocket)

pub use stream::StreamClient;

// ============================================================================
// Structure : Coin
// ============================================================================
// Une crypto du catalogue (top 100 par capitalisation)
//
// Les champs reprennent exactement le JSON de l'endpoint /coins/markets :
// serde désérialise la réponse directement dans cette structure, sans
// structure intermédiaire.
// ============================================================================

use serde::Deserialize;

/// Une crypto telle que retournée par le catalogue CoinGecko
///
/// Clé d'identité : `id` (stable, assignée par le catalogue).
/// Clé secondaire : `symbol`, utilisée pour rattacher les ticks du feed
/// temps réel, non garantie unique entre deux actifs listés.
#[derive(Debug, Clone, Deserialize)]
pub struct Coin {
    /// Identifiant catalogue (ex: "bitcoin")
    pub id: String,

    /// Symbole court en minuscules (ex: "btc")
    pub symbol: String,

    /// Nom complet (ex: "Bitcoin")
    pub name: String,

    /// URL de l'icône du coin
    pub image: String,

    /// Prix courant dans la devise de référence
    pub current_price: f64,

    /// Variation sur 24h en pourcentage
    /// CONCEPT RUST : Option pour les champs nullables
    /// - CoinGecko renvoie null pour les actifs fraîchement listés
    /// - Some(pct) : variation connue, None : pas encore de donnée
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
}

impl Coin {
    /// Identifiant de paire pour le feed Coinbase (ex: "BTC-USD")
    pub fn product_id(&self, quote: &str) -> String {
        format!("{}-{}", self.symbol.to_uppercase(), quote.to_uppercase())
    }

    /// Vérifie si le coin correspond à une recherche (nom ou symbole)
    ///
    /// La comparaison est insensible à la casse, comme la barre de
    /// recherche d'où vient la requête.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query) || self.symbol.to_lowercase().contains(&query)
    }

    /// Retourne true si la variation 24h est positive ou nulle
    pub fn is_positive(&self) -> bool {
        self.price_change_percentage_24h.map(|c| c >= 0.0).unwrap_or(false)
    }

    /// Formatte le prix pour l'affichage
    ///
    /// Les petites valeurs gardent plus de décimales : un coin à $0.000012
    /// afficherait "$0.00" avec deux décimales fixes.
    pub fn display_price(&self) -> String {
        if self.current_price >= 1.0 {
            format!("${:.2}", self.current_price)
        } else {
            format!("${:.6}", self.current_price)
        }
    }

    /// Formatte la variation 24h avec flèche (ex: "▲ +2.11%")
    pub fn display_change(&self) -> String {
        match self.price_change_percentage_24h {
            Some(change) => {
                let arrow = if change >= 0.0 { "▲" } else { "▼" };
                format!("{} {:+.2}%", arrow, change)
            }
            None => "—".to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn bitcoin() -> Coin {
        Coin {
            id: "bitcoin".to_string(),
            symbol: "btc".to_string(),
            name: "Bitcoin".to_string(),
            image: "https://example.com/btc.png".to_string(),
            current_price: 50000.0,
            price_change_percentage_24h: Some(1.5),
        }
    }

    #[test]
    fn test_deserialize_from_catalog_json() {
        // Extrait réel du format /coins/markets
        let json = r#"{
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "image": "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
            "current_price": 50000.0,
            "price_change_percentage_24h": 1.5,
            "market_cap": 980000000000
        }"#;

        let coin: Coin = serde_json::from_str(json).unwrap();
        assert_eq!(coin.id, "bitcoin");
        assert_eq!(coin.symbol, "btc");
        assert_eq!(coin.current_price, 50000.0);
        assert_eq!(coin.price_change_percentage_24h, Some(1.5));
    }

    #[test]
    fn test_deserialize_null_change() {
        // price_change_percentage_24h peut être null côté API
        let json = r#"{
            "id": "newcoin",
            "symbol": "new",
            "name": "New Coin",
            "image": "https://example.com/new.png",
            "current_price": 0.5,
            "price_change_percentage_24h": null
        }"#;

        let coin: Coin = serde_json::from_str(json).unwrap();
        assert_eq!(coin.price_change_percentage_24h, None);
        assert!(!coin.is_positive());
    }

    #[test]
    fn test_product_id() {
        assert_eq!(bitcoin().product_id("usd"), "BTC-USD");
    }

    #[test]
    fn test_matches_query() {
        let coin = bitcoin();
        assert!(coin.matches_query("bit"));
        assert!(coin.matches_query("BTC"));
        assert!(coin.matches_query(""));
        assert!(!coin.matches_query("ethereum"));
    }

    #[test]
    fn test_display_change() {
        let mut coin = bitcoin();
        assert_eq!(coin.display_change(), "▲ +1.50%");

        coin.price_change_percentage_24h = Some(-3.2);
        assert_eq!(coin.display_change(), "▼ -3.20%");

        coin.price_change_percentage_24h = None;
        assert_eq!(coin.display_change(), "—");
    }

    #[test]
    fn test_display_price_small_values() {
        let mut coin = bitcoin();
        coin.current_price = 0.000123;
        assert_eq!(coin.display_price(), "$0.000123");
    }
}

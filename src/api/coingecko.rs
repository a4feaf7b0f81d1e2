// ============================================================================
// API Client : CoinGecko
// ============================================================================
// Récupère le catalogue des cryptos et l'historique de prix depuis CoinGecko
//
// Deux appels one-shot :
// - /coins/markets : top 100 par capitalisation (id, symbole, nom, icône,
//   prix, variation 24h)
// - /coins/{id}/market_chart : série de prix sur 7 jours
// ============================================================================

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};

use crate::models::{ChartSeries, Coin};

/// Base de l'API publique CoinGecko
const API_BASE: &str = "https://api.coingecko.com/api/v3";

/// Devise de référence, utilisée partout (catalogue, paires du feed,
/// graphique, affichage)
pub const VS_CURRENCY: &str = "usd";

/// Taille du catalogue : top 100 par capitalisation, une seule page
const CATALOG_PER_PAGE: u32 = 100;

/// Fenêtre de l'historique de prix pour la vue détail
const CHART_DAYS: u32 = 7;

// ============================================================================
// Structures pour parser les réponses JSON
// ============================================================================

/// Réponse de /coins/{id}/market_chart
///
/// Le champ `prices` est une liste de paires [timestamp_ms, prix] ; seule la
/// composante prix est retenue. Les champs market_caps et total_volumes de
/// la réponse sont ignorés par serde.
#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Vec<(f64, f64)>,
}

// ============================================================================
// Fonctions publiques de l'API
// ============================================================================

/// Récupère le top 100 des cryptos par capitalisation
///
/// Retourne la liste des fiches du catalogue, ou une erreur avec contexte.
/// L'appelant (le worker) avale l'erreur et dégrade en liste vide : la UI ne
/// distingue pas "aucun coin" de "panne réseau".
#[instrument]
pub async fn fetch_top_coins() -> Result<Vec<Coin>> {
    let url = build_markets_url();
    debug!(url = %url, "Built CoinGecko markets URL");

    let client = http_client()?;

    debug!("Sending catalog request to CoinGecko");
    let response = client
        .get(&url)
        .send()
        .await
        .context("Échec de la requête HTTP vers CoinGecko")?;

    let status = response.status();
    debug!(status = %status, "Received HTTP response");

    if !status.is_success() {
        error!(status = %status, "CoinGecko returned error status");
        anyhow::bail!("CoinGecko a retourné une erreur : HTTP {}", status);
    }

    // CONCEPT RUST : Serde deserialization
    // - .json::<T>() désérialise directement la réponse vers Vec<Coin>
    // - la réponse est un tableau JSON de fiches
    let coins: Vec<Coin> = response
        .json()
        .await
        .context("Échec du parsing JSON du catalogue CoinGecko")?;

    if coins.is_empty() {
        warn!("CoinGecko returned an empty catalog");
    }

    info!(coins = coins.len(), "Successfully fetched coin catalog");
    Ok(coins)
}

/// Récupère la série de prix sur 7 jours pour un coin
///
/// Seule la composante prix de chaque point [timestamp, prix] est conservée.
#[instrument]
pub async fn fetch_market_chart(coin_id: &str) -> Result<ChartSeries> {
    let url = build_chart_url(coin_id);
    debug!(url = %url, "Built CoinGecko market chart URL");

    let client = http_client()?;

    debug!("Sending chart request to CoinGecko");
    let response = client
        .get(&url)
        .send()
        .await
        .context("Échec de la requête HTTP vers CoinGecko")?;

    let status = response.status();
    debug!(status = %status, "Received HTTP response");

    if !status.is_success() {
        error!(status = %status, "CoinGecko returned error status");
        anyhow::bail!("CoinGecko a retourné une erreur : HTTP {}", status);
    }

    let chart: MarketChartResponse = response
        .json()
        .await
        .context("Échec du parsing JSON du graphique CoinGecko")?;

    // Ne garde que le prix de chaque paire [timestamp, prix]
    let prices: Vec<f64> = chart.prices.into_iter().map(|(_, price)| price).collect();

    info!(points = prices.len(), "Successfully fetched market chart");
    Ok(ChartSeries::new(coin_id.to_string(), prices))
}

// ============================================================================
// Helpers
// ============================================================================

/// Construit le client HTTP partagé par les deux appels
///
/// Un User-Agent explicite évite le filtrage de l'API publique.
fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
        .build()
        .context("Échec de la création du client HTTP")
}

/// Construit l'URL du catalogue top 100
fn build_markets_url() -> String {
    format!(
        "{}/coins/markets?vs_currency={}&per_page={}&page=1&sparkline=false",
        API_BASE, VS_CURRENCY, CATALOG_PER_PAGE
    )
}

/// Construit l'URL de l'historique de prix 7 jours d'un coin
fn build_chart_url(coin_id: &str) -> String {
    format!(
        "{}/coins/{}/market_chart?vs_currency={}&days={}",
        API_BASE, coin_id, VS_CURRENCY, CHART_DAYS
    )
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_markets_url() {
        let url = build_markets_url();
        assert!(url.contains("coins/markets"));
        assert!(url.contains("vs_currency=usd"));
        assert!(url.contains("per_page=100"));
        assert!(url.contains("page=1"));
        assert!(url.contains("sparkline=false"));
    }

    #[test]
    fn test_build_chart_url() {
        let url = build_chart_url("bitcoin");
        assert!(url.contains("coins/bitcoin/market_chart"));
        assert!(url.contains("vs_currency=usd"));
        assert!(url.contains("days=7"));
    }

    #[test]
    fn test_parse_market_chart_response() {
        let json = r#"{
            "prices": [[1700000000000, 50000.0], [1700003600000, 50500.5]],
            "market_caps": [[1700000000000, 1.0]],
            "total_volumes": [[1700000000000, 2.0]]
        }"#;

        let chart: MarketChartResponse = serde_json::from_str(json).unwrap();
        let prices: Vec<f64> = chart.prices.into_iter().map(|(_, p)| p).collect();
        assert_eq!(prices, vec![50000.0, 50500.5]);
    }

    // Test async nécessite tokio test runtime
    #[tokio::test]
    async fn test_fetch_top_coins() {
        // Test avec un vrai appel API (peut échouer si pas de connexion)
        let result = fetch_top_coins().await;

        match result {
            Ok(coins) => {
                assert!(!coins.is_empty());
                assert!(coins.len() <= 100);
                println!("✓ Récupéré {} cryptos", coins.len());
            }
            Err(e) => {
                println!("⚠ Test skippé (pas de connexion?) : {}", e);
            }
        }
    }
}

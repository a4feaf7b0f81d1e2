// ============================================================================
// Structure : MarketStore
// ============================================================================
// Table en mémoire des fiches du catalogue, mutée par deux sources :
// 1. remplacement complet après un fetch du catalogue (replace_all)
// 2. mise à jour partielle par tick du feed, par clé d'identité (apply_tick)
//
// Les deux opérations sont totales sur la table courante et s'exécutent sur
// le thread de la boucle d'événements : les mutations sont sérialisées, pas
// de transaction nécessaire.
//
// Le store porte aussi le cache des graphiques 7 jours : une entrée par coin
// consulté, jamais invalidée pendant la session.
// ============================================================================

use std::collections::HashMap;

use tracing::debug;

use crate::models::{ChartSeries, Coin};
use crate::store::WatchlistStore;

/// Table des cryptos affichées, plus le cache des graphiques
#[derive(Default)]
pub struct MarketStore {
    coins: Vec<Coin>,
    chart_cache: HashMap<String, ChartSeries>,
}

impl MarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toutes les fiches, dans l'ordre du catalogue (capitalisation)
    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    /// Remplace la table entière par un nouveau snapshot du catalogue
    ///
    /// Aucune fiche de l'ancienne table ne survit : un id absent du nouveau
    /// snapshot disparaît. Le cache des graphiques n'est pas touché.
    pub fn replace_all(&mut self, coins: Vec<Coin>) {
        debug!(old = self.coins.len(), new = coins.len(), "Replacing catalog snapshot");
        self.coins = coins;
    }

    /// Applique un tick à la fiche identifiée par `id`
    ///
    /// Parcourt la table en remplaçant les champs de prix de la fiche
    /// correspondante, toutes les autres passent inchangées. Sans
    /// correspondance (tick arrivé avant le catalogue, actif délisté),
    /// la table reste identique.
    pub fn apply_tick(&mut self, id: &str, price: f64, change: f64) {
        self.coins = std::mem::take(&mut self.coins)
            .into_iter()
            .map(|coin| {
                if coin.id == id {
                    Coin {
                        current_price: price,
                        price_change_percentage_24h: Some(change),
                        ..coin
                    }
                } else {
                    coin
                }
            })
            .collect();
    }

    /// Retrouve une fiche par id
    pub fn get(&self, id: &str) -> Option<&Coin> {
        self.coins.iter().find(|coin| coin.id == id)
    }

    /// Résout un symbole du feed vers l'id catalogue
    ///
    /// Première correspondance gagnante : deux actifs listés peuvent
    /// partager un symbole, le catalogue ne désambiguïse pas. Comportement
    /// assumé, voir DESIGN.md.
    pub fn find_id_by_symbol(&self, symbol: &str) -> Option<&str> {
        self.coins
            .iter()
            .find(|coin| coin.symbol == symbol)
            .map(|coin| coin.id.as_str())
    }

    /// Vue filtrée par la recherche (nom ou symbole, insensible à la casse)
    ///
    /// Requête vide : tout le catalogue.
    pub fn filtered(&self, query: &str) -> Vec<&Coin> {
        if query.is_empty() {
            return self.coins.iter().collect();
        }
        self.coins
            .iter()
            .filter(|coin| coin.matches_query(query))
            .collect()
    }

    /// Vue restreinte aux favoris, dans l'ordre du catalogue
    pub fn favorites<'a>(&'a self, watchlist: &WatchlistStore) -> Vec<&'a Coin> {
        self.coins
            .iter()
            .filter(|coin| watchlist.contains(&coin.id))
            .collect()
    }

    /// Identifiants de paires pour la souscription au feed (ex: "BTC-USD")
    pub fn product_ids(&self, quote: &str) -> Vec<String> {
        self.coins.iter().map(|coin| coin.product_id(quote)).collect()
    }

    // ========================================================================
    // Cache des graphiques
    // ========================================================================

    /// Série en cache pour un coin, si déjà récupérée cette session
    pub fn chart(&self, coin_id: &str) -> Option<&ChartSeries> {
        self.chart_cache.get(coin_id)
    }

    pub fn has_chart(&self, coin_id: &str) -> bool {
        self.chart_cache.contains_key(coin_id)
    }

    /// Met une série en cache (y compris vide : l'échec du fetch est mis en
    /// cache comme série vide et ne sera pas retenté cette session)
    pub fn cache_chart(&mut self, series: ChartSeries) {
        self.chart_cache.insert(series.coin_id.clone(), series);
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(id: &str, symbol: &str, name: &str, price: f64, change: f64) -> Coin {
        Coin {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            image: String::new(),
            current_price: price,
            price_change_percentage_24h: Some(change),
        }
    }

    fn sample_store() -> MarketStore {
        let mut store = MarketStore::new();
        store.replace_all(vec![
            coin("bitcoin", "btc", "Bitcoin", 50000.0, 1.5),
            coin("ethereum", "eth", "Ethereum", 3000.0, -0.8),
        ]);
        store
    }

    #[test]
    fn test_replace_all_supersedes() {
        let mut store = sample_store();
        store.replace_all(vec![coin("solana", "sol", "Solana", 150.0, 3.0)]);

        // Aucune fiche de l'ancien snapshot ne survit
        assert_eq!(store.len(), 1);
        assert!(store.get("bitcoin").is_none());
        assert!(store.get("solana").is_some());
    }

    #[test]
    fn test_apply_tick_updates_matching_record() {
        let mut store = sample_store();
        store.apply_tick("bitcoin", 51000.0, 2.0);

        let bitcoin = store.get("bitcoin").unwrap();
        assert_eq!(bitcoin.current_price, 51000.0);
        assert_eq!(bitcoin.price_change_percentage_24h, Some(2.0));

        // Les autres fiches passent inchangées
        let ethereum = store.get("ethereum").unwrap();
        assert_eq!(ethereum.current_price, 3000.0);
        assert_eq!(ethereum.price_change_percentage_24h, Some(-0.8));
    }

    #[test]
    fn test_apply_tick_unknown_id_is_noop() {
        let mut store = sample_store();
        store.apply_tick("dogecoin", 0.5, 10.0);

        // Cardinalité et contenu préservés
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("bitcoin").unwrap().current_price, 50000.0);
        assert_eq!(store.get("ethereum").unwrap().current_price, 3000.0);
    }

    #[test]
    fn test_apply_tick_on_empty_table() {
        // Tick arrivé avant le snapshot du catalogue : aucun effet
        let mut store = MarketStore::new();
        store.apply_tick("bitcoin", 51000.0, 2.0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_find_id_by_symbol() {
        let store = sample_store();
        assert_eq!(store.find_id_by_symbol("btc"), Some("bitcoin"));
        assert_eq!(store.find_id_by_symbol("xrp"), None);
    }

    #[test]
    fn test_find_id_by_symbol_first_match_wins() {
        let mut store = MarketStore::new();
        store.replace_all(vec![
            coin("bitcoin", "btc", "Bitcoin", 50000.0, 1.5),
            coin("bitcoin-clone", "btc", "Bitcoin Clone", 1.0, 0.0),
        ]);

        // Symbole partagé : la première fiche du catalogue gagne
        assert_eq!(store.find_id_by_symbol("btc"), Some("bitcoin"));
    }

    #[test]
    fn test_filtered() {
        let store = sample_store();
        assert_eq!(store.filtered("").len(), 2);
        assert_eq!(store.filtered("bit").len(), 1);
        assert_eq!(store.filtered("ETH").len(), 1);
        assert_eq!(store.filtered("xrp").len(), 0);
    }

    #[test]
    fn test_product_ids() {
        let store = sample_store();
        assert_eq!(store.product_ids("usd"), vec!["BTC-USD", "ETH-USD"]);
    }

    #[test]
    fn test_chart_cache() {
        let mut store = sample_store();
        assert!(!store.has_chart("bitcoin"));

        store.cache_chart(ChartSeries::new("bitcoin".to_string(), vec![1.0, 2.0]));
        assert!(store.has_chart("bitcoin"));
        assert_eq!(store.chart("bitcoin").unwrap().len(), 2);

        // Une série vide (échec du fetch) est un cache valide
        store.cache_chart(ChartSeries::empty("ethereum".to_string()));
        assert!(store.has_chart("ethereum"));
        assert!(store.chart("ethereum").unwrap().is_empty());
    }
}

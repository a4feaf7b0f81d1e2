// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// PATTERN : "Application State"
// - Tous les écrans lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// - App est possédée par la boucle d'événements et passée par référence :
//   les mutations (snapshot catalogue, ticks, toggles) sont sérialisées sur
//   ce seul thread
// ============================================================================

use chrono::{DateTime, Local};
use tracing::debug;

use crate::models::Coin;
use crate::store::{MarketStore, WatchlistStore};

// ============================================================================
// Enum : Screen
// ============================================================================
// Un seul écran actif à la fois (state machine) ; le compilateur force à
// gérer tous les cas.
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : top 100 du catalogue, avec recherche
    Markets,

    /// Vue des favoris
    Watchlist,

    /// Vue détail d'un coin : prix + sparkline 7 jours
    Details,

    /// Mode saisie de la recherche (Vim-like : Enter valide, ESC annule)
    SearchInput,
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Table des cryptos + cache des graphiques
    pub market: MarketStore,

    /// Favoris persistés
    pub watchlist: WatchlistStore,

    /// Écran actuellement affiché
    pub current_screen: Screen,

    /// Dernier écran liste (Markets ou Watchlist) : cible du retour
    /// depuis la vue détail
    pub last_list_screen: Screen,

    /// Index sélectionné dans la liste visible de l'écran courant
    pub selected_index: usize,

    /// Requête de recherche courante (filtre la vue Markets en direct)
    pub search_query: String,

    /// Coin affiché par la vue détail
    pub detail_coin_id: Option<String>,

    /// Two-step quit : première pression de 'q' arme la confirmation
    pub confirm_quit: bool,

    /// Indique si un chargement est en cours (catalogue ou graphique)
    pub is_loading: bool,

    /// Message de chargement optionnel affiché à l'utilisateur
    pub loading_message: Option<String>,

    /// Feed temps réel démarré (la souscription n'est jamais acquittée :
    /// on trace seulement qu'elle a été demandée)
    pub live: bool,

    /// Heure de la dernière mise à jour de la table (snapshot ou tick)
    pub last_update: Option<DateTime<Local>>,
}

impl App {
    /// Crée l'état initial avec la watchlist relue du disque
    pub fn new(watchlist: WatchlistStore) -> Self {
        Self {
            running: true,
            market: MarketStore::new(),
            watchlist,
            current_screen: Screen::Markets,
            last_list_screen: Screen::Markets,
            selected_index: 0,
            search_query: String::new(),
            detail_coin_id: None,
            confirm_quit: false,
            is_loading: false,
            loading_message: None,
            live: false,
            last_update: None,
        }
    }

    // ========================================================================
    // Cycle de vie
    // ========================================================================

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    pub fn start_loading(&mut self, message: Option<String>) {
        self.is_loading = true;
        self.loading_message = message;
    }

    pub fn stop_loading(&mut self) {
        self.is_loading = false;
        self.loading_message = None;
    }

    // ========================================================================
    // Vues dérivées
    // ========================================================================

    /// Liste visible de l'écran courant
    ///
    /// - Watchlist : les favoris, dans l'ordre du catalogue
    /// - Markets / recherche : le catalogue filtré par la requête
    pub fn visible_coins(&self) -> Vec<&Coin> {
        match self.current_screen {
            Screen::Watchlist => self.market.favorites(&self.watchlist),
            _ => self.market.filtered(&self.search_query),
        }
    }

    pub fn visible_len(&self) -> usize {
        self.visible_coins().len()
    }

    /// Coin sélectionné dans la liste visible
    pub fn selected_coin(&self) -> Option<&Coin> {
        self.visible_coins().get(self.selected_index).copied()
    }

    /// Coin affiché par la vue détail
    ///
    /// None si l'id a disparu de la table (catalogue rafraîchi entre-temps) :
    /// la vue affiche alors son état "introuvable".
    pub fn detail_coin(&self) -> Option<&Coin> {
        self.detail_coin_id
            .as_deref()
            .and_then(|id| self.market.get(id))
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn navigate_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn navigate_down(&mut self) {
        let max_index = self.visible_len().saturating_sub(1);
        self.selected_index = (self.selected_index + 1).min(max_index);
    }

    /// Ramène la sélection dans les bornes de la liste visible
    ///
    /// Nécessaire après tout rétrécissement de la liste : nouveau snapshot,
    /// favori retiré, caractère ajouté à la recherche.
    fn clamp_selection(&mut self) {
        let max_index = self.visible_len().saturating_sub(1);
        self.selected_index = self.selected_index.min(max_index);
    }

    pub fn show_markets(&mut self) {
        self.current_screen = Screen::Markets;
        self.last_list_screen = Screen::Markets;
        self.selected_index = 0;
    }

    pub fn show_watchlist(&mut self) {
        self.current_screen = Screen::Watchlist;
        self.last_list_screen = Screen::Watchlist;
        self.selected_index = 0;
    }

    /// Bascule entre les deux onglets liste
    pub fn toggle_tab(&mut self) {
        match self.current_screen {
            Screen::Markets => self.show_watchlist(),
            Screen::Watchlist => self.show_markets(),
            _ => {}
        }
    }

    pub fn is_on_markets(&self) -> bool {
        self.current_screen == Screen::Markets
    }

    pub fn is_on_watchlist(&self) -> bool {
        self.current_screen == Screen::Watchlist
    }

    pub fn is_on_details(&self) -> bool {
        self.current_screen == Screen::Details
    }

    pub fn is_in_search_mode(&self) -> bool {
        self.current_screen == Screen::SearchInput
    }

    // ========================================================================
    // Vue détail
    // ========================================================================

    /// Ouvre la vue détail sur le coin sélectionné
    ///
    /// Retourne l'id du coin si son graphique n'est pas encore en cache :
    /// l'appelant doit alors demander le fetch au worker. Le cache n'est
    /// jamais invalidé pendant la session, donc au plus un fetch par coin.
    pub fn open_details(&mut self) -> Option<String> {
        let coin_id = self.selected_coin().map(|coin| coin.id.clone())?;

        self.last_list_screen = self.current_screen;
        self.current_screen = Screen::Details;
        self.detail_coin_id = Some(coin_id.clone());

        if self.market.has_chart(&coin_id) {
            None
        } else {
            Some(coin_id)
        }
    }

    /// Referme la vue détail et revient à la liste d'origine
    pub fn close_details(&mut self) {
        self.current_screen = self.last_list_screen;
        self.detail_coin_id = None;
        self.clamp_selection();
    }

    // ========================================================================
    // Recherche
    // ========================================================================

    /// Entre en mode saisie de recherche (depuis Markets)
    ///
    /// La requête existante est conservée et reste éditable.
    pub fn start_search(&mut self) {
        self.current_screen = Screen::SearchInput;
    }

    /// Valide la recherche : sort du mode saisie en gardant le filtre
    pub fn submit_search(&mut self) {
        self.current_screen = Screen::Markets;
    }

    /// Annule la recherche : sort du mode saisie et efface le filtre
    pub fn cancel_search(&mut self) {
        self.search_query.clear();
        self.current_screen = Screen::Markets;
        self.clamp_selection();
    }

    /// Efface le filtre depuis l'écran Markets
    pub fn clear_search(&mut self) {
        self.search_query.clear();
        self.clamp_selection();
    }

    /// Ajoute un caractère à la requête (le filtre s'applique en direct)
    pub fn search_push(&mut self, c: char) {
        self.search_query.push(c);
        self.selected_index = 0;
    }

    /// Supprime le dernier caractère de la requête
    pub fn search_backspace(&mut self) {
        self.search_query.pop();
        self.selected_index = 0;
    }

    // ========================================================================
    // Favoris
    // ========================================================================

    /// Bascule le favori du coin courant (sélection ou vue détail)
    pub fn toggle_favorite(&mut self) {
        let coin_id = match self.current_screen {
            Screen::Details => self.detail_coin_id.clone(),
            _ => self.selected_coin().map(|coin| coin.id.clone()),
        };

        if let Some(coin_id) = coin_id {
            self.watchlist.toggle(&coin_id);
            // Sur l'écran Watchlist, retirer un favori rétrécit la liste
            self.clamp_selection();
        }
    }

    // ========================================================================
    // Réconciliation : snapshot catalogue et ticks du feed
    // ========================================================================

    /// Applique un nouveau snapshot du catalogue
    pub fn apply_catalog(&mut self, coins: Vec<Coin>) {
        self.market.replace_all(coins);
        self.last_update = Some(Local::now());
        self.clamp_selection();
        self.stop_loading();
    }

    /// Applique un tick du feed à la table
    ///
    /// Le product_id du feed ("BTC-USD") est résolu vers l'id catalogue via
    /// le symbole ; sans correspondance (tick arrivé avant le snapshot,
    /// actif inconnu) le tick est abandonné silencieusement. Prix ou
    /// variation non parsables : abandonné aussi.
    pub fn apply_tick(&mut self, product_id: &str, price: &str, change: &str) {
        let symbol = match product_id.split('-').next() {
            Some(base) => base.to_lowercase(),
            None => return,
        };

        let coin_id = match self.market.find_id_by_symbol(&symbol) {
            Some(id) => id.to_string(),
            None => {
                debug!(product_id = %product_id, "Tick for unknown symbol, dropped");
                return;
            }
        };

        let price: f64 = match price.parse() {
            Ok(price) => price,
            Err(_) => return,
        };
        let change: f64 = match change.parse() {
            Ok(change) => change,
            Err(_) => return,
        };

        self.market.apply_tick(&coin_id, price, change);
        self.last_update = Some(Local::now());
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coin;

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

    /// App de test : watchlist sur un chemin temporaire unique
    fn test_app(name: &str) -> App {
        let path = std::env::temp_dir()
            .join("coinwatch-tests")
            .join(format!("app-{}-{}.json", name, std::process::id()));
        let _ = std::fs::remove_file(&path);
        App::new(WatchlistStore::load_from(path))
    }

    fn loaded_app(name: &str) -> App {
        let mut app = test_app(name);
        app.apply_catalog(vec![
            coin("bitcoin", "btc", "Bitcoin", 50000.0, 1.5),
            coin("ethereum", "eth", "Ethereum", 3000.0, -0.8),
            coin("solana", "sol", "Solana", 150.0, 3.0),
        ]);
        app
    }

    #[test]
    fn test_app_creation() {
        let app = test_app("creation");
        assert!(app.is_running());
        assert!(app.market.is_empty());
        assert_eq!(app.current_screen, Screen::Markets);
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_navigation_bounds() {
        let mut app = loaded_app("navigation");

        assert_eq!(app.selected_index, 0);
        app.navigate_down();
        assert_eq!(app.selected_index, 1);
        app.navigate_down();
        app.navigate_down(); // au max : reste au dernier
        assert_eq!(app.selected_index, 2);

        app.navigate_up();
        app.navigate_up();
        app.navigate_up(); // au min : reste à 0
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_toggle_tab() {
        let mut app = loaded_app("tabs");
        assert!(app.is_on_markets());

        app.toggle_tab();
        assert!(app.is_on_watchlist());

        app.toggle_tab();
        assert!(app.is_on_markets());
    }

    #[test]
    fn test_search_filters_live() {
        let mut app = loaded_app("search");
        app.start_search();
        assert!(app.is_in_search_mode());

        app.search_push('s');
        app.search_push('o');
        let visible = app.visible_coins();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "solana");

        app.submit_search();
        assert!(app.is_on_markets());
        assert_eq!(app.search_query, "so"); // le filtre survit à la validation

        app.clear_search();
        assert_eq!(app.visible_len(), 3);
    }

    #[test]
    fn test_cancel_search_clears_query() {
        let mut app = loaded_app("cancel-search");
        app.start_search();
        app.search_push('x');
        assert_eq!(app.visible_len(), 0);

        app.cancel_search();
        assert!(app.is_on_markets());
        assert_eq!(app.visible_len(), 3);
    }

    #[test]
    fn test_open_details_requests_chart_once() {
        let mut app = loaded_app("details");

        // Premier passage : le graphique n'est pas en cache, fetch demandé
        assert_eq!(app.open_details(), Some("bitcoin".to_string()));
        assert!(app.is_on_details());
        assert_eq!(app.detail_coin().unwrap().id, "bitcoin");

        app.market
            .cache_chart(crate::models::ChartSeries::new("bitcoin".to_string(), vec![1.0]));
        app.close_details();
        assert!(app.is_on_markets());

        // Second passage : cache présent, pas de nouveau fetch
        assert_eq!(app.open_details(), None);
    }

    #[test]
    fn test_details_returns_to_originating_tab() {
        let mut app = loaded_app("details-origin");
        app.toggle_favorite(); // bitcoin en favori
        app.show_watchlist();

        app.open_details();
        app.close_details();
        assert!(app.is_on_watchlist());
    }

    #[test]
    fn test_watchlist_toggle_scenario() {
        // Scénario de référence : toggle deux fois revient à l'état initial
        let mut app = test_app("toggle-scenario");
        app.apply_catalog(vec![coin("bitcoin", "btc", "Bitcoin", 50000.0, 1.5)]);

        app.toggle_favorite();
        assert_eq!(app.watchlist.ids(), ["bitcoin".to_string()]);

        app.toggle_favorite();
        assert!(app.watchlist.is_empty());
    }

    #[test]
    fn test_removing_favorite_clamps_selection() {
        let mut app = loaded_app("clamp");
        app.toggle_favorite(); // bitcoin
        app.navigate_down();
        app.toggle_favorite(); // ethereum
        app.show_watchlist();

        app.navigate_down();
        assert_eq!(app.selected_index, 1);
        app.toggle_favorite(); // retire ethereum : la liste rétrécit
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_apply_tick_resolves_symbol() {
        let mut app = loaded_app("tick");
        app.apply_tick("BTC-USD", "51000", "2.00");

        let bitcoin = app.market.get("bitcoin").unwrap();
        assert_eq!(bitcoin.current_price, 51000.0);
        assert_eq!(bitcoin.price_change_percentage_24h, Some(2.0));
    }

    #[test]
    fn test_apply_tick_unknown_symbol_dropped() {
        let mut app = loaded_app("tick-unknown");
        app.apply_tick("DOGE-USD", "0.5", "10.00");

        assert_eq!(app.market.len(), 3);
        assert_eq!(app.market.get("bitcoin").unwrap().current_price, 50000.0);
    }

    #[test]
    fn test_apply_tick_before_catalog_dropped() {
        // Tick arrivé avant le snapshot : la table vide reste vide
        let mut app = test_app("tick-early");
        app.apply_tick("BTC-USD", "51000", "2.00");
        assert!(app.market.is_empty());
    }

    #[test]
    fn test_refresh_supersedes_catalog() {
        let mut app = loaded_app("refresh");
        app.apply_catalog(vec![coin("cardano", "ada", "Cardano", 0.6, 0.2)]);

        assert_eq!(app.market.len(), 1);
        assert!(app.market.get("bitcoin").is_none());
    }
}

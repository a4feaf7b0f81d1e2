// ============================================================================
// CoinWatch - Watchlist crypto dans le terminal
// ============================================================================
// TUI listant le top 100 des cryptos, avec favoris persistés, feed de prix
// temps réel et vue détail avec sparkline 7 jours
//
// Architecture :
// - boucle d'événements synchrone sur le thread principal (crossterm)
// - un worker thread avec son runtime tokio pour les I/O réseau
// - communication par channels mpsc dans les deux sens : l'état App n'est
//   muté que sur le thread principal, au drain des résultats
// ============================================================================

use std::io;
use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info};

use coinwatch::api::coingecko::{self, VS_CURRENCY};
use coinwatch::api::StreamClient;
use coinwatch::app::App;
use coinwatch::models::{ChartSeries, Coin};
use coinwatch::store::WatchlistStore;
use coinwatch::ui::{self, events::EventHandler};

// ============================================================================
// Command / WorkerResult : protocole entre la UI et le worker
// ============================================================================
// Command pattern avec channels : la boucle d'événements envoie des
// commandes, le worker exécute les tâches async et renvoie les résultats.
// Les ticks du feed empruntent le même canal de résultats.
// ============================================================================

/// Commandes envoyées au worker thread
#[derive(Debug, Clone)]
enum Command {
    /// Recharger le catalogue top 100 (démarrage et rafraîchissement)
    FetchCatalog,

    /// Récupérer le graphique 7 jours d'un coin
    FetchChart { coin_id: String },

    /// Ouvrir le feed de prix et souscrire aux paires données
    ConnectFeed { product_ids: Vec<String> },

    /// Fermer le feed de prix
    DisconnectFeed,
}

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
enum WorkerResult {
    /// Nouveau snapshot du catalogue
    ///
    /// Une panne réseau arrive ici en liste vide : l'erreur est avalée au
    /// worker, la UI ne distingue pas "aucun coin" de "panne réseau"
    CatalogLoaded { coins: Vec<Coin> },

    /// Graphique d'un coin (série vide si le fetch a échoué)
    ChartLoaded { series: ChartSeries },

    /// Un tick du feed : (product_id, prix, variation), tels que transmis
    /// par le callback du StreamClient
    Tick {
        product_id: String,
        price: String,
        change: String,
    },
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// Les println! ne fonctionnent pas une fois le TUI lancé : on log vers un
// fichier avec rotation quotidienne.
//
// Les logs sont écrits dans :
// - Linux/WSL : ~/.local/share/coinwatch/logs/coinwatch.log
// - macOS : ~/Library/Application Support/coinwatch/logs/coinwatch.log
// - Windows : C:\Users\<user>\AppData\Local\coinwatch\logs\coinwatch.log
//
// # Utilisation
// ```bash
// tail -f ~/.local/share/coinwatch/logs/coinwatch.log
// RUST_LOG=coinwatch=trace cargo run
// ```
// ============================================================================

/// Initialise le système de logging vers fichier
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("coinwatch")
        .join("logs");

    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "coinwatch.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true) // Inclut le module (ex: coinwatch::api::stream)
                .with_thread_ids(true) // Utile pour distinguer UI et worker
                .with_line_number(true),
        )
        .with(
            // RUST_LOG=debug, RUST_LOG=coinwatch=trace, etc.
            // Par défaut : debug pour coinwatch, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coinwatch=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée
// ============================================================================

fn main() -> Result<()> {
    // Si l'init des logs échoue, on continue sans logging
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!("CoinWatch starting up");

    // La watchlist est relue une seule fois au démarrage ; vide au premier
    // lancement ou sur échec de lecture
    let watchlist = WatchlistStore::load();
    let mut app = App::new(watchlist);

    // Channels de communication avec le worker
    let (command_tx, command_rx) = mpsc::channel::<Command>();
    let (result_tx, result_rx) = mpsc::channel::<WorkerResult>();

    info!("Spawning background worker thread");
    spawn_background_worker(command_rx, result_tx);

    // Premier chargement du catalogue, en arrière-plan : le TUI démarre
    // tout de suite avec son indicateur de chargement
    app.start_loading(Some("Chargement du top 100...".to_string()));
    command_tx
        .send(Command::FetchCatalog)
        .context("Worker indisponible au démarrage")?;

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &events, &command_tx, &result_rx);

    // Ferme le feed avant de rendre le terminal : libération sur le chemin
    // de sortie normal (rien n'est garanti sur une terminaison anormale)
    let _ = command_tx.send(Command::DisconnectFeed);

    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Background Worker Thread
// ============================================================================
// Thread séparé qui possède le runtime tokio :
// - les fetchs REST s'exécutent en block_on, un à la fois
// - la connexion du feed vit en tâche spawnée sur le même runtime, ses
//   ticks partent dans le canal de résultats via le callback
// ============================================================================

/// Worker thread qui exécute les tâches réseau en arrière-plan
fn spawn_background_worker(
    command_rx: mpsc::Receiver<Command>,
    result_tx: mpsc::Sender<WorkerResult>,
) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = ?e, "Failed to create tokio runtime, worker unavailable");
                return;
            }
        };

        // Le client du feed vit aussi longtemps que le worker
        let mut feed = StreamClient::new(runtime.handle().clone());

        loop {
            match command_rx.recv() {
                Ok(command) => {
                    debug!(?command, "Worker received command");

                    match command {
                        Command::FetchCatalog => {
                            // L'échec est avalé ici : catch à la frontière,
                            // log, dégradation en liste vide
                            let coins = runtime
                                .block_on(coingecko::fetch_top_coins())
                                .unwrap_or_else(|e| {
                                    error!(error = ?e, "Failed to fetch coin catalog");
                                    Vec::new()
                                });
                            let _ = result_tx.send(WorkerResult::CatalogLoaded { coins });
                        }

                        Command::FetchChart { coin_id } => {
                            // Même politique : une série vide est mise en
                            // cache et la vue détail affiche son message
                            let series = runtime
                                .block_on(coingecko::fetch_market_chart(&coin_id))
                                .unwrap_or_else(|e| {
                                    error!(coin = %coin_id, error = ?e, "Failed to fetch market chart");
                                    ChartSeries::empty(coin_id.clone())
                                });
                            let _ = result_tx.send(WorkerResult::ChartLoaded { series });
                        }

                        Command::ConnectFeed { product_ids } => {
                            let tick_tx = result_tx.clone();
                            feed.connect(
                                product_ids,
                                Box::new(move |product_id, price, change| {
                                    // Le send échoue seulement si la UI est
                                    // partie : le tick est alors perdu
                                    let _ = tick_tx.send(WorkerResult::Tick {
                                        product_id,
                                        price,
                                        change,
                                    });
                                }),
                            );
                        }

                        Command::DisconnectFeed => feed.disconnect(),
                    }
                }
                Err(_) => {
                    // Canal fermé : la UI est partie
                    info!("Worker thread exiting (channel closed)");
                    feed.disconnect();
                    break;
                }
            }
        }
    });
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// Pattern classique : à chaque itération
//   0. drainer les résultats du worker (snapshot, graphiques, ticks)
//   1. dessiner l'interface
//   2. traiter l'événement clavier (poll avec timeout)
// ============================================================================

/// Exécute la boucle principale de l'application
fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    command_tx: &mpsc::Sender<Command>,
    result_rx: &mpsc::Receiver<WorkerResult>,
) -> Result<()> {
    loop {
        if !app.is_running() {
            break;
        }

        // ========================================
        // 0. RÉSULTATS : draine tout ce que le worker a produit
        // ========================================
        // try_recv en boucle : le feed peut avoir accumulé plusieurs ticks
        // depuis le dernier tour (poll de 250ms)
        while let Ok(result) = result_rx.try_recv() {
            apply_result(app, result, command_tx);
        }

        // ========================================
        // 1. RENDER
        // ========================================
        terminal.draw(|frame| ui::render(frame, app))?;

        // ========================================
        // 2. INPUT
        // ========================================
        match events.next() {
            Ok(event) => handle_event(app, event, command_tx),
            Err(e) => {
                debug!(error = ?e, "Event read error");
            }
        }
    }

    Ok(())
}

/// Applique un résultat du worker à l'état
///
/// Toutes les mutations du store passent par ici et par handle_event : un
/// seul thread mute, les écritures sont sérialisées.
fn apply_result(app: &mut App, result: WorkerResult, command_tx: &mpsc::Sender<Command>) {
    match result {
        WorkerResult::CatalogLoaded { coins } => {
            info!(coins = coins.len(), "Applying catalog snapshot");
            app.apply_catalog(coins);

            // Souscription au feed une fois le premier snapshot en place,
            // avec les paires dérivées du catalogue. Une seule connexion
            // pour la durée de la session.
            if !app.live && !app.market.is_empty() {
                let product_ids = app.market.product_ids(VS_CURRENCY);
                info!(products = product_ids.len(), "Requesting price feed connection");
                let _ = command_tx.send(Command::ConnectFeed { product_ids });
                app.live = true;
            }
        }

        WorkerResult::ChartLoaded { series } => {
            debug!(coin = %series.coin_id, points = series.len(), "Caching chart series");
            app.market.cache_chart(series);
        }

        WorkerResult::Tick {
            product_id,
            price,
            change,
        } => {
            app.apply_tick(&product_id, &price, &change);
        }
    }
}

// ============================================================================
// Gestion des événements
// ============================================================================

/// Traite un événement clavier et met à jour l'état
///
/// Les guards ordonnent les priorités : le mode saisie de recherche capture
/// les caractères avant les raccourcis ('q', 'f', 'r'... y sont du texte).
fn handle_event(app: &mut App, event: ui::Event, command_tx: &mpsc::Sender<Command>) {
    use coinwatch::ui::events::{
        get_char_from_event, is_backspace_event, is_down_event, is_enter_event, is_escape_event,
        is_favorite_event, is_quit_event, is_refresh_event, is_search_char_event, is_search_event,
        is_tab_event, is_up_event, Event,
    };

    match event {
        // ========================================
        // Mode saisie de recherche
        // ========================================
        Event::Key(_) if is_escape_event(&event) && app.is_in_search_mode() => {
            debug!("Search cancelled");
            app.cancel_search();
        }

        Event::Key(_) if is_enter_event(&event) && app.is_in_search_mode() => {
            info!(query = %app.search_query, "Search submitted");
            app.submit_search();
        }

        Event::Key(_) if is_backspace_event(&event) && app.is_in_search_mode() => {
            app.search_backspace();
        }

        // Les caractères passent avant la navigation : 'j' et 'k' sont du
        // texte ici, seules les flèches naviguent pendant la saisie
        Event::Key(_) if is_search_char_event(&event) && app.is_in_search_mode() => {
            if let Some(c) = get_char_from_event(&event) {
                app.search_push(c);
            }
        }

        Event::Key(_) if is_up_event(&event) && app.is_in_search_mode() => {
            app.navigate_up();
        }
        Event::Key(_) if is_down_event(&event) && app.is_in_search_mode() => {
            app.navigate_down();
        }

        // ========================================
        // Quit two-step
        // ========================================
        Event::Key(_) if is_quit_event(&event) => {
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
        }

        // ========================================
        // Navigation entre écrans
        // ========================================
        Event::Key(_) if is_tab_event(&event) && !app.is_on_details() => {
            app.cancel_quit();
            debug!("Tab switched");
            app.toggle_tab();
        }

        Event::Key(_) if is_up_event(&event) && !app.is_on_details() => {
            app.cancel_quit();
            app.navigate_up();
        }
        Event::Key(_) if is_down_event(&event) && !app.is_on_details() => {
            app.cancel_quit();
            app.navigate_down();
        }

        // Enter : ouvre la vue détail, et demande le graphique au worker
        // s'il n'est pas déjà en cache (jamais invalidé : au plus un fetch
        // par coin et par session)
        Event::Key(_) if is_enter_event(&event) && !app.is_on_details() => {
            app.cancel_quit();
            if let Some(coin_id) = app.open_details() {
                info!(coin = %coin_id, "Requesting chart fetch");
                let _ = command_tx.send(Command::FetchChart { coin_id });
            }
        }

        // ESC : retour depuis la vue détail, ou efface le filtre sur Markets
        Event::Key(_) if is_escape_event(&event) && app.is_on_details() => {
            app.cancel_quit();
            debug!("Returning to list");
            app.close_details();
        }
        Event::Key(_) if is_escape_event(&event) && app.is_on_markets() => {
            app.cancel_quit();
            app.clear_search();
        }

        // ========================================
        // Actions
        // ========================================
        Event::Key(_) if is_favorite_event(&event) => {
            app.cancel_quit();
            app.toggle_favorite();
        }

        Event::Key(_) if is_search_event(&event) && app.is_on_markets() => {
            app.cancel_quit();
            debug!("Entering search mode");
            app.start_search();
        }

        // 'r' : seul recours utilisateur après une panne réseau avalée
        Event::Key(_) if is_refresh_event(&event) && !app.is_in_search_mode() => {
            app.cancel_quit();
            info!("Manual catalog refresh requested");
            app.start_loading(Some("Actualisation...".to_string()));
            let _ = command_tx.send(Command::FetchCatalog);
        }

        Event::Tick => {
            // Tick d'affichage : le redraw suffit
        }

        Event::Key(_) => {
            // Toute autre touche annule la confirmation de quit
            app.cancel_quit();
        }
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// Raw mode + alternate screen ; toujours restaurer le terminal avant de
// quitter, même en cas d'erreur.
// ============================================================================

/// Configure le terminal en mode TUI
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;

    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;

    terminal.show_cursor()?;

    Ok(())
}

// ============================================================================
// Feed de prix temps réel : Coinbase
// ============================================================================
// Client WebSocket pour le channel "ticker" public de Coinbase Exchange
//
// Contrat :
// - connect(product_ids, on_tick) ouvre exactement une connexion, envoie un
//   seul message de souscription, puis invoque le callback pour chaque tick
//   reconnu portant à la fois un prix et un prix de référence 24h
// - disconnect() ferme la connexion de manière idempotente
// - connect() alors qu'une connexion existe déconnecte d'abord
// - pas de reconnexion, pas de backoff, pas d'accusé de souscription ;
//   l'ordre des messages est celui du transport
// ============================================================================

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Endpoint public du feed Coinbase Exchange
const WS_URL: &str = "wss://ws-feed.exchange.coinbase.com";

/// Callback invoqué pour chaque tick : (product_id, prix, variation 24h)
///
/// Le prix est transmis tel que reçu (string) ; la variation est calculée
/// ici et formatée à 2 décimales.
pub type TickCallback = Box<dyn Fn(String, String, String) + Send + Sync + 'static>;

// ============================================================================
// Messages du protocole
// ============================================================================

/// Message de souscription envoyé à l'ouverture
#[derive(Debug, Serialize)]
struct SubscribeMessage<'a> {
    #[serde(rename = "type")]
    msg_type: &'a str, // "subscribe"
    product_ids: &'a [String],
    channels: [&'a str; 1], // ["ticker"]
}

/// Message entrant du channel ticker
///
/// Tous les champs utiles sont optionnels : le feed envoie aussi des
/// messages "subscriptions", "heartbeat", "error"... qui ne les portent
/// pas. Un message sans prix ou sans référence 24h est ignoré.
#[derive(Debug, Deserialize)]
struct TickerMessage {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(default)]
    product_id: Option<String>,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    open_24h: Option<String>,
}

// ============================================================================
// Structure StreamClient
// ============================================================================
// CONCEPT RUST : tâche détenue + signal d'arrêt
// - la connexion vit dans une tâche tokio spawnée sur le runtime du worker
// - disconnect() envoie un signal oneshot ; la tâche ferme le socket et
//   se termine d'elle-même
// ============================================================================

/// Client du feed de prix : une connexion au plus à la fois
pub struct StreamClient {
    runtime: tokio::runtime::Handle,
    shutdown: Option<oneshot::Sender<()>>,
}

impl StreamClient {
    /// Crée un client déconnecté, lié au runtime qui portera la connexion
    pub fn new(runtime: tokio::runtime::Handle) -> Self {
        Self {
            runtime,
            shutdown: None,
        }
    }

    /// Vérifie si une connexion est en cours
    pub fn is_connected(&self) -> bool {
        self.shutdown.is_some()
    }

    /// Ouvre la connexion et souscrit au channel ticker
    ///
    /// Une connexion existante est d'abord fermée : il n'y a jamais deux
    /// connexions simultanées.
    pub fn connect(&mut self, product_ids: Vec<String>, on_tick: TickCallback) {
        if self.is_connected() {
            debug!("Already connected, disconnecting first");
            self.disconnect();
        }

        info!(products = product_ids.len(), "Starting price feed");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.runtime.spawn(run_feed(product_ids, on_tick, shutdown_rx));
        self.shutdown = Some(shutdown_tx);
    }

    /// Ferme la connexion et oublie l'état interne
    ///
    /// Idempotent : sans connexion en cours, ne fait rien.
    pub fn disconnect(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            info!("Stopping price feed");
            // Si la tâche est déjà morte (erreur réseau), le send échoue :
            // il n'y a alors plus rien à arrêter
            let _ = shutdown.send(());
        }
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

// ============================================================================
// Tâche de la connexion
// ============================================================================

/// Corps de la tâche : ouvre, souscrit, lit jusqu'au signal d'arrêt
async fn run_feed(
    product_ids: Vec<String>,
    on_tick: TickCallback,
    mut shutdown: oneshot::Receiver<()>,
) {
    // Pas de reconnexion : en cas d'erreur la tâche se termine, le feed
    // reste silencieux jusqu'au prochain connect()
    if let Err(e) = feed_loop(&product_ids, &on_tick, &mut shutdown).await {
        error!(error = ?e, "Price feed terminated with error");
    }
    info!("Price feed closed");
}

async fn feed_loop(
    product_ids: &[String],
    on_tick: &TickCallback,
    shutdown: &mut oneshot::Receiver<()>,
) -> Result<()> {
    // Le signal d'arrêt couvre aussi la phase de connexion : un
    // disconnect() pendant le handshake termine la tâche
    let ws = tokio::select! {
        _ = &mut *shutdown => return Ok(()),
        connected = connect_async(WS_URL) => {
            connected.context("Échec de la connexion au feed Coinbase")?.0
        }
    };
    info!("WebSocket connection established");

    // CONCEPT RUST : split du stream
    // - write : envoi de la souscription (et des pongs)
    // - read : flux des messages entrants
    let (mut write, mut read) = ws.split();

    let subscribe = SubscribeMessage {
        msg_type: "subscribe",
        product_ids,
        channels: ["ticker"],
    };
    let payload =
        serde_json::to_string(&subscribe).context("Échec de la sérialisation de la souscription")?;

    write
        .send(Message::Text(payload))
        .await
        .context("Échec de l'envoi de la souscription")?;
    debug!(products = product_ids.len(), "Subscription message sent");

    loop {
        // CONCEPT RUST : select! entre le flux et le signal d'arrêt
        // - le premier des deux prêt gagne
        // - &mut *shutdown : le receiver oneshot est une Future réutilisable
        //   dans la boucle via la référence
        tokio::select! {
            _ = &mut *shutdown => {
                debug!("Shutdown signal received");
                let _ = write.send(Message::Close(None)).await;
                break;
            }
            incoming = read.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => handle_message(&text, on_tick),
                    Some(Ok(Message::Ping(data))) => {
                        let _ = write.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Server closed the connection");
                        break;
                    }
                    Some(Ok(_)) => {} // binaire, pong... ignorés
                    Some(Err(e)) => {
                        warn!(error = ?e, "WebSocket read error");
                        break;
                    }
                    None => {
                        info!("WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

// ============================================================================
// Traitement des messages entrants
// ============================================================================

/// Parse un message texte et invoque le callback si c'est un tick complet
///
/// Tout message non reconnu (autre type, JSON invalide, champ manquant,
/// nombre non parsable) est ignoré silencieusement : le feed émet bien
/// d'autres types de messages que les ticks.
fn handle_message(text: &str, on_tick: &TickCallback) {
    let message: TickerMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(_) => return,
    };

    if message.msg_type != "ticker" {
        return;
    }

    match (message.product_id, message.price, message.open_24h) {
        (Some(product_id), Some(price), Some(open_24h)) => {
            if let Some(change) = percent_change_24h(&price, &open_24h) {
                on_tick(product_id, price, change);
            }
        }
        _ => {}
    }
}

/// Calcule la variation 24h en pourcentage, formatée à 2 décimales
///
/// `(prix - ref) / ref * 100`, et 0 quand la référence vaut 0 : jamais de
/// division par zéro ni de NaN. None si l'un des deux nombres ne parse pas.
fn percent_change_24h(price: &str, open_24h: &str) -> Option<String> {
    let price: f64 = price.parse().ok()?;
    let open_24h: f64 = open_24h.parse().ok()?;

    let percent = if open_24h == 0.0 {
        0.0
    } else {
        (price - open_24h) / open_24h * 100.0
    };

    Some(format!("{:.2}", percent))
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    /// Callback de test qui pousse les ticks dans un channel
    fn collecting_callback() -> (TickCallback, mpsc::Receiver<(String, String, String)>) {
        let (tx, rx) = mpsc::channel();
        let callback: TickCallback = Box::new(move |product_id, price, change| {
            let _ = tx.send((product_id, price, change));
        });
        (callback, rx)
    }

    #[test]
    fn test_percent_change() {
        // Scénario de référence : 51000 contre 50000 → +2.00%
        assert_eq!(
            percent_change_24h("51000", "50000"),
            Some("2.00".to_string())
        );
        assert_eq!(
            percent_change_24h("48500", "50000"),
            Some("-3.00".to_string())
        );
    }

    #[test]
    fn test_percent_change_zero_reference() {
        // Référence nulle : 0, jamais NaN ni panic
        assert_eq!(percent_change_24h("51000", "0"), Some("0.00".to_string()));
        assert_eq!(percent_change_24h("51000", "0.0"), Some("0.00".to_string()));
    }

    #[test]
    fn test_percent_change_unparsable() {
        assert_eq!(percent_change_24h("abc", "50000"), None);
        assert_eq!(percent_change_24h("51000", ""), None);
    }

    #[test]
    fn test_subscribe_message_shape() {
        let product_ids = vec!["BTC-USD".to_string(), "ETH-USD".to_string()];
        let subscribe = SubscribeMessage {
            msg_type: "subscribe",
            product_ids: &product_ids,
            channels: ["ticker"],
        };

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&subscribe).unwrap()).unwrap();
        assert_eq!(json["type"], "subscribe");
        assert_eq!(json["product_ids"][0], "BTC-USD");
        assert_eq!(json["channels"][0], "ticker");
    }

    #[test]
    fn test_handle_ticker_message() {
        let (callback, rx) = collecting_callback();

        let text = r#"{
            "type": "ticker",
            "product_id": "BTC-USD",
            "price": "51000",
            "open_24h": "50000",
            "volume_24h": "12345.6"
        }"#;
        handle_message(text, &callback);

        let (product_id, price, change) = rx.try_recv().unwrap();
        assert_eq!(product_id, "BTC-USD");
        assert_eq!(price, "51000");
        assert_eq!(change, "2.00");
    }

    #[test]
    fn test_ignores_other_message_kinds() {
        let (callback, rx) = collecting_callback();

        // Accusé de souscription : pas un tick
        handle_message(r#"{"type":"subscriptions","channels":[]}"#, &callback);
        // Tick incomplet : open_24h absent
        handle_message(
            r#"{"type":"ticker","product_id":"BTC-USD","price":"51000"}"#,
            &callback,
        );
        // JSON invalide
        handle_message("not json", &callback);

        assert!(rx.try_recv().is_err());
    }
}

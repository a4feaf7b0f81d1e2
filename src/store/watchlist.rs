// ============================================================================
// Structure : WatchlistStore
// ============================================================================
// Favoris de l'utilisateur : un ensemble d'ids de coins, persisté sur disque
// comme liste JSON sous une seule clé (un fichier), relu au démarrage.
//
// Politique d'erreur :
// - lecture : vide au premier lancement ou sur échec (loggé)
// - écriture : fire-and-forget ; un échec est loggé, l'état mémoire n'est
//   pas annulé. Mémoire et disque peuvent diverger jusqu'au prochain
//   toggle réussi.
// ============================================================================

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, error, info};

/// Nom du fichier de persistance sous le répertoire de données
const WATCHLIST_FILE: &str = "watchlist.json";

/// Ensemble des coins favoris, persisté entre les lancements
///
/// L'ordre de la liste persiste tel quel mais n'a pas de sens métier.
pub struct WatchlistStore {
    ids: Vec<String>,
    path: PathBuf,
}

impl WatchlistStore {
    /// Charge la watchlist depuis l'emplacement par défaut
    ///
    /// Appelé une seule fois au démarrage.
    pub fn load() -> Self {
        Self::load_from(default_path())
    }

    /// Charge la watchlist depuis un chemin explicite
    ///
    /// Fichier absent (premier lancement), illisible ou corrompu : on part
    /// d'une watchlist vide, l'erreur éventuelle est loggée.
    pub fn load_from(path: PathBuf) -> Self {
        let ids = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(ids) => {
                    info!(count = ids.len(), "Watchlist loaded from storage");
                    ids
                }
                Err(e) => {
                    error!(error = ?e, path = ?path, "Failed to parse watchlist file");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?path, "No watchlist file yet, starting empty");
                Vec::new()
            }
            Err(e) => {
                error!(error = ?e, path = ?path, "Failed to read watchlist file");
                Vec::new()
            }
        };

        Self { ids, path }
    }

    /// Vérifie si un coin est dans les favoris
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    /// Les ids favoris, dans l'ordre d'ajout
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Bascule l'appartenance d'un coin et persiste la nouvelle liste
    ///
    /// Deux toggles successifs ramènent l'ensemble à son état d'origine.
    /// L'écriture est au-plus-une-fois : sur échec, l'état mémoire reste
    /// acquis et l'erreur est loggée.
    pub fn toggle(&mut self, id: &str) {
        match self.ids.iter().position(|existing| existing == id) {
            Some(index) => {
                self.ids.remove(index);
                debug!(coin = %id, "Removed from watchlist");
            }
            None => {
                self.ids.push(id.to_string());
                debug!(coin = %id, "Added to watchlist");
            }
        }

        if let Err(e) = self.persist() {
            error!(error = ?e, "Failed to save watchlist to storage");
        }
    }

    /// Écrit la liste complète en JSON
    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .context("Échec de la création du répertoire de données")?;
        }

        let raw = serde_json::to_string(&self.ids)
            .context("Échec de la sérialisation de la watchlist")?;

        fs::write(&self.path, raw).context("Échec de l'écriture du fichier watchlist")
    }
}

/// Emplacement par défaut : <data_local_dir>/coinwatch/watchlist.json
///
/// - Linux/WSL : ~/.local/share/coinwatch/watchlist.json
/// - macOS : ~/Library/Application Support/coinwatch/watchlist.json
/// - Windows : C:\Users\<user>\AppData\Local\coinwatch\watchlist.json
fn default_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("coinwatch")
        .join(WATCHLIST_FILE)
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Chemin de test unique par cas, sous le répertoire temporaire
    fn test_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join("coinwatch-tests")
            .join(format!("{}-{}.json", name, std::process::id()))
    }

    fn cleanup(path: &PathBuf) {
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let path = test_path("missing");
        cleanup(&path);

        let store = WatchlistStore::load_from(path.clone());
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_is_empty() {
        let path = test_path("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "ceci n'est pas du JSON").unwrap();

        let store = WatchlistStore::load_from(path.clone());
        assert!(store.is_empty());

        cleanup(&path);
    }

    #[test]
    fn test_toggle_twice_restores_membership() {
        let path = test_path("toggle-twice");
        cleanup(&path);
        let mut store = WatchlistStore::load_from(path.clone());

        store.toggle("bitcoin");
        assert!(store.contains("bitcoin"));
        assert_eq!(store.ids(), ["bitcoin".to_string()]);

        store.toggle("bitcoin");
        assert!(!store.contains("bitcoin"));
        assert!(store.is_empty());

        cleanup(&path);
    }

    #[test]
    fn test_toggle_persists_across_loads() {
        let path = test_path("roundtrip");
        cleanup(&path);

        {
            let mut store = WatchlistStore::load_from(path.clone());
            store.toggle("bitcoin");
            store.toggle("ethereum");
        }

        // Un nouveau load relit la liste écrite par le toggle
        let reloaded = WatchlistStore::load_from(path.clone());
        assert_eq!(
            reloaded.ids(),
            ["bitcoin".to_string(), "ethereum".to_string()]
        );

        cleanup(&path);
    }

    #[test]
    fn test_toggle_keeps_memory_state_on_write_failure() {
        // Chemin inscriptible nulle part : l'écriture échoue, l'état
        // mémoire reste acquis (fenêtre d'incohérence documentée)
        let path = PathBuf::from("/proc/coinwatch-impossible/watchlist.json");
        let mut store = WatchlistStore::load_from(path);

        store.toggle("bitcoin");
        assert!(store.contains("bitcoin"));
    }
}

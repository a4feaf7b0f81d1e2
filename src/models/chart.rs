// ============================================================================
// Structure : ChartSeries
// ============================================================================
// Série de prix sur 7 jours pour un coin, destinée au sparkline de la vue
// détail. Transiente : mise en cache par id de coin pour la durée de la
// session, jamais invalidée.
// ============================================================================

/// Série de prix d'un coin sur la fenêtre récente (7 jours)
///
/// Seule la composante prix des points `[timestamp, prix]` de l'API est
/// conservée ; l'axe du temps est implicite (points équidistants).
#[derive(Debug, Clone)]
pub struct ChartSeries {
    /// Identifiant catalogue du coin concerné
    pub coin_id: String,

    /// Prix ordonnés du plus ancien au plus récent
    pub prices: Vec<f64>,
}

impl ChartSeries {
    /// Crée une série à partir des prix retenus
    pub fn new(coin_id: String, prices: Vec<f64>) -> Self {
        Self { coin_id, prices }
    }

    /// Série vide : utilisée quand le fetch du graphique a échoué
    /// (l'échec est dégradé, pas propagé ; la vue affiche un message)
    pub fn empty(coin_id: String) -> Self {
        Self { coin_id, prices: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Borne basse des prix de la série
    pub fn min_price(&self) -> Option<f64> {
        self.prices.iter().copied().fold(None, |acc, p| match acc {
            Some(min) if min <= p => Some(min),
            _ => Some(p),
        })
    }

    /// Borne haute des prix de la série
    pub fn max_price(&self) -> Option<f64> {
        self.prices.iter().copied().fold(None, |acc, p| match acc {
            Some(max) if max >= p => Some(max),
            _ => Some(p),
        })
    }

    /// Points (x, y) pour le widget Chart de ratatui
    ///
    /// x est l'index du point : le widget reçoit des bounds [0, len-1]
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.prices
            .iter()
            .enumerate()
            .map(|(i, &price)| (i as f64, price))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_series() {
        let series = ChartSeries::empty("bitcoin".to_string());
        assert!(series.is_empty());
        assert_eq!(series.min_price(), None);
        assert_eq!(series.max_price(), None);
        assert!(series.points().is_empty());
    }

    #[test]
    fn test_min_max() {
        let series = ChartSeries::new("bitcoin".to_string(), vec![3.0, 1.0, 2.0]);
        assert_eq!(series.min_price(), Some(1.0));
        assert_eq!(series.max_price(), Some(3.0));
    }

    #[test]
    fn test_points_are_indexed() {
        let series = ChartSeries::new("bitcoin".to_string(), vec![10.0, 20.0]);
        assert_eq!(series.points(), vec![(0.0, 10.0), (1.0, 20.0)]);
    }
}

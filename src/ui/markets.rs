// ============================================================================
// Markets - Vue principale
// ============================================================================
// Le top 100 du catalogue, filtré en direct par la recherche, rafraîchi par
// les ticks du feed à chaque redraw
// ============================================================================

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders},
    Frame,
};

use crate::app::App;
use crate::ui::{
    create_layout, render_centered_message, render_coin_list, render_footer, render_header,
};

/// Dessine l'écran Markets (et son mode saisie de recherche)
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, app, chunks[0]);
    render_list(frame, app, chunks[1]);
    render_footer(frame, app, chunks[2]);
}

/// Dessine la liste du catalogue
fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(list_title(app));

    // Catalogue pas encore chargé : indicateur de chargement
    if app.market.is_empty() && app.is_loading {
        let message = app
            .loading_message
            .clone()
            .unwrap_or_else(|| "Chargement...".to_string());
        render_centered_message(
            frame,
            block,
            area,
            vec![Line::from(Span::styled(
                message,
                Style::default().fg(Color::Gray),
            ))],
        );
        return;
    }

    let coins = app.visible_coins();

    // Catalogue vide (panne réseau avalée) ou filtre sans résultat :
    // même état "introuvable", la UI ne distingue pas les deux causes
    if coins.is_empty() {
        let message = if app.search_query.is_empty() {
            "Aucune crypto — [r] pour réessayer"
        } else {
            "Aucun résultat pour ce filtre"
        };
        render_centered_message(
            frame,
            block,
            area,
            vec![Line::from(Span::styled(
                message,
                Style::default().fg(Color::Gray),
            ))],
        );
        return;
    }

    render_coin_list(frame, app, &coins, block, area);
}

/// Titre du bloc liste : filtre actif et actualisation y sont signalés
fn list_title(app: &App) -> String {
    if app.is_loading && !app.market.is_empty() {
        return " 📊 Top 100 — ⟳ actualisation... ".to_string();
    }
    if app.search_query.is_empty() {
        " 📊 Top 100 ".to_string()
    } else {
        format!(" 📊 Top 100 — filtre \"{}\" ", app.search_query)
    }
}

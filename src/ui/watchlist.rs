// ============================================================================
// Watchlist - Vue des favoris
// ============================================================================
// Le sous-ensemble favori du catalogue, dans l'ordre du catalogue. Les prix
// vivent dans la même table que Markets : les ticks du feed s'y reflètent
// de la même façon.
// ============================================================================

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders},
    Frame,
};

use crate::app::App;
use crate::ui::{
    create_layout, render_centered_message, render_coin_list, render_footer, render_header,
};

/// Dessine l'écran Watchlist
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, app, chunks[0]);
    render_list(frame, app, chunks[1]);
    render_footer(frame, app, chunks[2]);
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" ★ Watchlist ({}) ", app.watchlist.len()));

    let coins = app.visible_coins();

    if coins.is_empty() {
        // Favoris enregistrés mais catalogue pas encore chargé : on ne
        // peut rien afficher de plus précis que l'état vide
        render_centered_message(
            frame,
            block,
            area,
            vec![
                Line::from(Span::styled(
                    "Votre watchlist est vide.",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Appuyez sur [f] sur une crypto pour l'ajouter.",
                    Style::default().fg(Color::Gray),
                )),
            ],
        );
        return;
    }

    render_coin_list(frame, app, &coins, block, area);
}

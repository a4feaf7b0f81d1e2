// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
//
// Les écrans ne possèdent aucun état durable : ils rendent des vues
// dérivées de App, les mutations passent par la boucle d'événements.
// ============================================================================

pub mod details;   // Vue détail : prix + sparkline 7 jours
pub mod events;    // Gestion des événements clavier
pub mod markets;   // Vue principale : top 100 + recherche
pub mod watchlist; // Vue des favoris

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::{App, Screen};
use crate::models::Coin;

// Re-exports pour simplifier les imports
pub use events::{Event, EventHandler};

/// Largeur de la colonne nom dans les listes
const NAME_COLUMN_WIDTH: usize = 24;

/// Dessine l'interface complète
///
/// Routing par pattern matching sur l'écran courant : le compilateur
/// garantit que tous les écrans sont gérés.
pub fn render(frame: &mut Frame, app: &App) {
    match app.current_screen {
        Screen::Markets | Screen::SearchInput => markets::render(frame, app),
        Screen::Watchlist => watchlist::render(frame, app),
        Screen::Details => details::render(frame, app),
    }
}

// ============================================================================
// Layout commun
// ============================================================================

/// Layout des écrans liste : header, contenu, footer
pub(crate) fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header : 3 lignes
            Constraint::Min(0),    // Content : tout le reste
            Constraint::Length(3), // Footer : 3 lignes
        ])
        .split(area)
        .to_vec()
}

// ============================================================================
// Header : titre, onglets, état du feed
// ============================================================================

/// Dessine le header avec les onglets et l'état du feed temps réel
pub(crate) fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" 🚀 CoinWatch ")
        .title_alignment(Alignment::Center);

    // L'onglet actif : sur la vue détail, celui d'où on vient
    let markets_active = matches!(
        app.current_screen,
        Screen::Markets | Screen::SearchInput
    ) || (app.is_on_details() && app.last_list_screen == Screen::Markets);
    let watchlist_active = app.is_on_watchlist()
        || (app.is_on_details() && app.last_list_screen == Screen::Watchlist);

    let tab_style = |active: bool| {
        if active {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };

    let mut spans = vec![
        Span::styled(" Markets ", tab_style(markets_active)),
        Span::raw("│"),
        Span::styled(" Watchlist ", tab_style(watchlist_active)),
    ];

    if app.live {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(
            "● LIVE",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ));
    }

    if let Some(last_update) = app.last_update {
        spans.push(Span::styled(
            format!("   MAJ {}", last_update.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let paragraph = Paragraph::new(vec![Line::from(spans)])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Liste de cryptos : partagée par Markets et Watchlist
// ============================================================================

/// Dessine une liste de cryptos avec sélection et scroll
///
/// Le scroll est délégué au ListState de ratatui : la ligne sélectionnée
/// reste visible même avec 100 entrées.
pub(crate) fn render_coin_list(
    frame: &mut Frame,
    app: &App,
    coins: &[&Coin],
    block: Block,
    area: Rect,
) {
    let items: Vec<ListItem> = coins
        .iter()
        .map(|coin| coin_row(coin, app.watchlist.contains(&coin.id)))
        .collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .add_modifier(Modifier::BOLD)
            .add_modifier(Modifier::REVERSED),
    );

    let mut state = ListState::default();
    state.select(Some(app.selected_index));

    frame.render_stateful_widget(list, area, &mut state);
}

/// Construit la ligne d'une crypto
///
/// Format : " ★ BTC      Bitcoin                    $50000.00  ▲ +1.50%"
fn coin_row(coin: &Coin, is_favorite: bool) -> ListItem<'static> {
    let change_color = match coin.price_change_percentage_24h {
        Some(change) if change < 0.0 => Color::Red,
        Some(_) => Color::Green,
        None => Color::DarkGray,
    };

    let star = if is_favorite { "★" } else { " " };

    let line = Line::from(vec![
        Span::styled(format!(" {} ", star), Style::default().fg(Color::Yellow)),
        Span::raw(format!(
            "{:<8} {:<width$} ",
            coin.symbol.to_uppercase(),
            truncate_name(&coin.name),
            width = NAME_COLUMN_WIDTH
        )),
        Span::styled(
            format!("{:>14}  ", coin.display_price()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(coin.display_change(), Style::default().fg(change_color)),
    ]);

    ListItem::new(line)
}

/// Tronque le nom avec ellipse pour tenir dans sa colonne
fn truncate_name(name: &str) -> String {
    if name.chars().count() <= NAME_COLUMN_WIDTH {
        name.to_string()
    } else {
        let truncated: String = name.chars().take(NAME_COLUMN_WIDTH - 1).collect();
        format!("{}…", truncated)
    }
}

// ============================================================================
// Footer : raccourcis et confirmations
// ============================================================================

/// Dessine le footer : confirmation de quit, saisie de recherche, ou
/// raccourcis de l'écran courant
pub(crate) fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let border_color = if app.is_in_search_mode() {
        Color::Green // vert pour signaler le mode saisie
    } else {
        Color::Cyan
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let line = if app.is_awaiting_quit_confirmation() {
        // Two-step quit : avertissement qui attire l'attention
        Line::from(vec![
            Span::styled(
                "⚠  Appuyez sur ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else if app.is_in_search_mode() {
        // Ligne de saisie avec curseur
        Line::from(vec![
            Span::styled(
                "Recherche : ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(&app.search_query, Style::default().fg(Color::White)),
            Span::styled(
                "█",
                Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::raw("   "),
            Span::styled("[Enter]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" Valider  "),
            Span::styled("[ESC]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::raw(" Annuler"),
        ])
    } else {
        shortcuts_line(app)
    };

    let alignment = if app.is_in_search_mode() {
        Alignment::Left
    } else {
        Alignment::Center
    };

    let paragraph = Paragraph::new(vec![line]).block(block).alignment(alignment);
    frame.render_widget(paragraph, area);
}

/// Raccourcis clavier de l'écran courant
fn shortcuts_line(app: &App) -> Line<'static> {
    let key_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    match app.current_screen {
        Screen::Details => Line::from(vec![
            Span::styled("[ESC]", key_style),
            Span::raw(" Retour  "),
            Span::styled("[f]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" Favori  "),
            Span::styled("[q]", key_style),
            Span::raw(" Quit"),
        ]),
        Screen::Watchlist => Line::from(vec![
            Span::styled("[q]", key_style),
            Span::raw(" Quit  "),
            Span::styled("[Tab]", key_style),
            Span::raw(" Markets  "),
            Span::styled("[↑↓ / j k]", key_style),
            Span::raw(" Naviguer  "),
            Span::styled("[Enter]", key_style),
            Span::raw(" Détail  "),
            Span::styled("[f]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::raw(" Retirer"),
        ]),
        _ => Line::from(vec![
            Span::styled("[q]", key_style),
            Span::raw(" Quit  "),
            Span::styled("[Tab]", key_style),
            Span::raw(" Watchlist  "),
            Span::styled("[↑↓ / j k]", key_style),
            Span::raw(" Naviguer  "),
            Span::styled("[Enter]", key_style),
            Span::raw(" Détail  "),
            Span::styled("[f]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" Favori  "),
            Span::styled("[/]", key_style),
            Span::raw(" Recherche  "),
            Span::styled("[r]", key_style),
            Span::raw(" Rafraîchir"),
        ]),
    }
}

/// Message centré dans une zone (états vides et chargements)
pub(crate) fn render_centered_message(frame: &mut Frame, block: Block, area: Rect, lines: Vec<Line>) {
    let mut text = vec![Line::from("")];
    text.extend(lines);

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("Bitcoin"), "Bitcoin");

        let long = "Un Nom De Crypto Vraiment Beaucoup Trop Long";
        let truncated = truncate_name(long);
        assert_eq!(truncated.chars().count(), NAME_COLUMN_WIDTH);
        assert!(truncated.ends_with('…'));
    }
}

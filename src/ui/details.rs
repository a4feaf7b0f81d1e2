// ============================================================================
// Details - Vue détail d'un coin
// ============================================================================
// Prix courant, variation 24h, état favori, et sparkline des 7 derniers
// jours dessiné avec le widget Chart de ratatui
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;
use crate::models::{ChartSeries, Coin};
use crate::ui::{create_layout, render_footer, render_header};

/// Dessine la vue détail
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, app, chunks[0]);
    render_body(frame, app, chunks[1]);
    render_footer(frame, app, chunks[2]);
}

fn render_body(frame: &mut Frame, app: &App, area: Rect) {
    // L'id peut avoir disparu de la table si le catalogue a été rafraîchi
    // entre l'ouverture de la vue et maintenant
    let coin = match app.detail_coin() {
        Some(coin) => coin,
        None => {
            render_message(frame, area, "Crypto introuvable.");
            return;
        }
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Prix et variation
            Constraint::Min(0),    // Sparkline
        ])
        .split(area)
        .to_vec();

    render_price_header(frame, app, coin, chunks[0]);
    render_chart(frame, app, coin, chunks[1]);
}

// ============================================================================
// Header : prix et variation
// ============================================================================

fn render_price_header(frame: &mut Frame, app: &App, coin: &Coin, area: Rect) {
    let is_favorite = app.watchlist.contains(&coin.id);
    let star = if is_favorite { "★ Favori" } else { "☆" };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(
            " 📈 {} ({}) ",
            coin.name,
            coin.symbol.to_uppercase()
        ));

    let color = if coin.is_positive() {
        Color::Green
    } else {
        Color::Red
    };

    let text = vec![
        Line::from(vec![
            Span::raw("Prix : "),
            Span::styled(
                coin.display_price(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::raw("24h :  "),
            Span::styled(coin.display_change(), Style::default().fg(color)),
            Span::raw("   "),
            Span::styled(star, Style::default().fg(Color::Yellow)),
        ]),
    ];

    let paragraph = Paragraph::new(text).block(block);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Sparkline 7 jours
// ============================================================================

fn render_chart(frame: &mut Frame, app: &App, coin: &Coin, area: Rect) {
    // Trois états : fetch en vol, échec mis en cache (série vide), série
    let series = match app.market.chart(&coin.id) {
        None => {
            render_message(frame, area, "Chargement du graphique...");
            return;
        }
        Some(series) if series.is_empty() => {
            render_message(frame, area, "Impossible de charger le graphique.");
            return;
        }
        Some(series) => series,
    };

    render_series(frame, coin, series, area);
}

fn render_series(frame: &mut Frame, coin: &Coin, series: &ChartSeries, area: Rect) {
    let points = series.points();

    let min = series.min_price().unwrap_or(0.0);
    let max = series.max_price().unwrap_or(1.0);
    // Petite marge verticale pour décoller la courbe des bords
    let pad = ((max - min) * 0.05).max(max.abs() * 0.001);
    let y_bounds = [min - pad, max + pad];

    let color = if coin.is_positive() {
        Color::Green
    } else {
        Color::Red
    };

    let datasets = vec![Dataset::default()
        .name(format!("{} — 7 jours", coin.symbol.to_uppercase()))
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points)];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Évolution 7 jours ");

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, (points.len().saturating_sub(1)) as f64])
                .labels(vec![
                    Span::styled("J-7", Style::default().fg(Color::Gray)),
                    Span::styled("aujourd'hui", Style::default().fg(Color::Gray)),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds(y_bounds)
                .labels(vec![
                    Span::styled(format_axis_price(min), Style::default().fg(Color::Gray)),
                    Span::styled(
                        format_axis_price((min + max) / 2.0),
                        Style::default().fg(Color::Gray),
                    ),
                    Span::styled(format_axis_price(max), Style::default().fg(Color::Gray)),
                ]),
        );

    frame.render_widget(chart, area);
}

/// Formatte un prix pour les labels de l'axe Y
fn format_axis_price(price: f64) -> String {
    if price >= 1.0 {
        format!("${:.2}", price)
    } else {
        format!("${:.6}", price)
    }
}

// ============================================================================
// États sans graphique
// ============================================================================

fn render_message(frame: &mut Frame, area: Rect, message: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(Color::Gray))),
    ];

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
    fn test_format_axis_price() {
        assert_eq!(format_axis_price(50000.0), "$50000.00");
        assert_eq!(format_axis_price(0.5), "$0.500000");
    }
}

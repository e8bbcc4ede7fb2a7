//! Panel 2: Summary table, one row per symbol, plus unresolved symbols.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Cell, Paragraph, Row, Table, Wrap};

use tickerboard_core::{format, Symbol, SummaryRow};

use crate::app::AppState;
use crate::theme;
use crate::ui::{guidance, render_guidance};

const HEADERS: [&str; 5] = ["Symbol", "Last Close", "Change", "Volume", "Last Date"];

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    if let Some(state) = guidance(app) {
        let (message, hint) = state.message();
        render_guidance(f, area, message, hint);
        return;
    }
    let Some(snapshot) = &app.snapshot else {
        return;
    };

    let footer_height = if snapshot.unresolved.is_empty() { 0 } else { 2 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(footer_height)])
        .split(area);

    let header = Row::new(
        HEADERS
            .iter()
            .map(|h| Cell::from(*h).style(theme::accent().add_modifier(Modifier::BOLD))),
    )
    .height(1);

    let rows = snapshot.summary.iter().map(summary_row);

    let widths = [
        Constraint::Length(12),
        Constraint::Length(14),
        Constraint::Length(10),
        Constraint::Length(16),
        Constraint::Length(12),
    ];
    let table = Table::new(rows, widths).header(header).column_spacing(2);
    f.render_widget(table, chunks[0]);

    if !snapshot.unresolved.is_empty() {
        let para = Paragraph::new(unresolved_line(&snapshot.unresolved)).wrap(Wrap { trim: true });
        f.render_widget(para, chunks[1]);
    }
}

fn right(text: String) -> Cell<'static> {
    Cell::from(Text::from(text).alignment(Alignment::Right))
}

fn summary_row(row: &SummaryRow) -> Row<'static> {
    Row::new(vec![
        Cell::from(row.symbol.to_string()).style(theme::text()),
        right(format::price(row.last_close)),
        right(format::percent(row.change_pct)).style(theme::change_style(row.change_pct)),
        right(format::volume(row.last_volume)),
        Cell::from(row.last_date.to_string()).style(theme::text_secondary()),
    ])
}

fn unresolved_line(symbols: &[Symbol]) -> Line<'static> {
    let names: Vec<&str> = symbols.iter().map(Symbol::as_str).collect();
    Line::from(vec![
        Span::styled("No data returned for: ", theme::warning()),
        Span::styled(names.join(", "), theme::text()),
    ])
}

//! Sidebar: asset class, symbol checklist, period, display toggles.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, SidebarRow};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(false))
        .title(" Settings ")
        .title_style(theme::panel_title(false));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let (lines, cursor_line) = build_lines(app);

    // Keep the cursor row on screen.
    let height = inner.height as usize;
    let offset = (cursor_line + 1).saturating_sub(height);
    let para = Paragraph::new(lines).scroll((offset as u16, 0));
    f.render_widget(para, inner);
}

/// Sidebar lines plus the line index of the cursor row.
fn build_lines(app: &AppState) -> (Vec<Line<'static>>, usize) {
    let mut lines = Vec::new();
    let mut cursor_line = 0;

    for (i, row) in app.sidebar_rows().into_iter().enumerate() {
        if matches!(row, SidebarRow::Period | SidebarRow::ShowVolume) {
            lines.push(Line::from(""));
        }
        let selected = i == app.cursor;
        if selected {
            cursor_line = lines.len();
        }
        let mut line = row_line(app, row);
        if selected {
            line = line.patch_style(theme::accent().add_modifier(Modifier::REVERSED));
        }
        lines.push(line);
    }
    (lines, cursor_line)
}

fn checkbox(on: bool) -> &'static str {
    if on { "[x]" } else { "[ ]" }
}

fn row_line(app: &AppState, row: SidebarRow) -> Line<'static> {
    match row {
        SidebarRow::AssetClass => Line::from(vec![
            Span::styled(" Asset class ", theme::muted()),
            Span::styled(format!("< {} >", app.asset_class.label()), theme::accent_bold()),
        ]),
        SidebarRow::Symbol(i) => {
            let state = app.class_state();
            let Some(symbol) = state.universe.get(i) else {
                return Line::from("");
            };
            let order = state.selected.iter().position(|s| s == symbol);
            let style = if order.is_some() {
                theme::text()
            } else {
                theme::text_secondary()
            };
            let rank = order.map(|n| format!(" {}", n + 1)).unwrap_or_default();
            Line::from(vec![
                Span::styled(format!(" {} ", checkbox(order.is_some())), theme::accent()),
                Span::styled(symbol.to_string(), style),
                Span::styled(rank, theme::muted()),
            ])
        }
        SidebarRow::AddSymbol => Line::from(Span::styled(" + add symbol (a)", theme::muted())),
        SidebarRow::Period => Line::from(vec![
            Span::styled(" Period      ", theme::muted()),
            Span::styled(format!("< {} >", app.period.label()), theme::accent_bold()),
        ]),
        SidebarRow::StartDate => Line::from(vec![
            Span::styled("   Start     ", theme::muted()),
            Span::styled(app.custom_start.to_string(), theme::text()),
        ]),
        SidebarRow::EndDate => Line::from(vec![
            Span::styled("   End       ", theme::muted()),
            Span::styled(app.end_date().to_string(), theme::text()),
        ]),
        SidebarRow::ShowVolume => Line::from(vec![
            Span::styled(format!(" {} ", checkbox(app.show_volume)), theme::accent()),
            Span::styled("Show volume", theme::text()),
        ]),
        SidebarRow::LogScale => Line::from(vec![
            Span::styled(format!(" {} ", checkbox(app.log_scale)), theme::accent()),
            Span::styled("Log scale", theme::text()),
        ]),
    }
}

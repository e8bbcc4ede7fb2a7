//! Top-level UI layout: sidebar, active panel, status bar.

pub mod help_panel;
pub mod overlays;
pub mod overview;
pub mod sidebar;
pub mod status_bar;
pub mod summary_panel;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::app::{AppState, Overlay, Panel};
use crate::theme;

const SIDEBAR_WIDTH: u16 = 30;

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    // Split: main area + 1-line status bar.
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());

    let main_area = chunks[0];
    let status_area = chunks[1];

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(main_area);

    sidebar::render(f, columns[0], app);
    draw_panel(f, columns[1], app);
    status_bar::render(f, status_area, app);

    // Draw overlays on top.
    match app.overlay {
        Overlay::Welcome => overlays::render_welcome(f, main_area),
        Overlay::ErrorHistory => overlays::render_error_history(f, main_area, app),
        Overlay::AddSymbol => overlays::render_add_symbol(f, main_area, app),
        Overlay::None => {}
    }
}

/// Draw the active panel with its border and, after a failed load, the
/// error banner.
fn draw_panel(f: &mut Frame, area: Rect, app: &AppState) {
    let panel = app.active_panel;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(true))
        .title(format!(" {} [{}] ", panel.label(), panel.index() + 1))
        .title_style(theme::panel_title(true));

    let mut inner = block.inner(area);
    f.render_widget(block, area);

    if panel != Panel::Help {
        if let Some(error) = &app.banner {
            let split = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(1)])
                .split(inner);
            render_banner(f, split[0], error);
            inner = split[1];
        }
    }

    match panel {
        Panel::Overview => overview::render(f, inner, app),
        Panel::Summary => summary_panel::render(f, inner, app),
        Panel::Help => help_panel::render(f, inner, app),
    }
}

fn render_banner(f: &mut Frame, area: Rect, error: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::negative())
        .title(" Load failed [r]retry [e]errors ")
        .title_style(theme::negative());
    let para = Paragraph::new(Span::styled(error, theme::negative()))
        .block(block)
        .wrap(Wrap { trim: true });
    f.render_widget(para, area);
}

/// Centered muted message lines for empty and loading states.
pub fn render_guidance(f: &mut Frame, area: Rect, message: &str, hint: &str) {
    let lines = vec![
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), theme::text())),
        Line::from(""),
        Line::from(Span::styled(hint.to_string(), theme::muted())),
    ];
    let para = Paragraph::new(lines)
        .alignment(ratatui::layout::Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(para, area);
}

/// What the data panels show instead of data, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guidance {
    NoSymbols,
    Loading,
    NoData,
    /// Last load failed; the banner carries the message.
    Failed,
    /// Custom dates do not form a range, so nothing was requested.
    InvalidRange,
}

impl Guidance {
    pub fn message(self) -> (&'static str, &'static str) {
        match self {
            Guidance::NoSymbols => (
                "Select at least one symbol.",
                "Move with j/k in the sidebar and press Space, or press a to add a ticker.",
            ),
            Guidance::Loading => ("Loading market data...", ""),
            Guidance::NoData => (
                "No data for the selected symbols and period.",
                "Try a longer period or check the ticker spelling.",
            ),
            Guidance::Failed => ("No data to show.", "Press r to retry."),
            Guidance::InvalidRange => (
                "Start date is after end date.",
                "Move the dates with h/l (or H/L for 30 days) in the sidebar.",
            ),
        }
    }
}

/// Decide the empty state for the current app, or `None` when there is
/// data to draw.
pub fn guidance(app: &AppState) -> Option<Guidance> {
    use tickerboard_runner::SnapshotStatus;

    if app.selected_symbols().is_empty() {
        return Some(Guidance::NoSymbols);
    }
    if app.range_error.is_some() {
        return Some(Guidance::InvalidRange);
    }
    match &app.snapshot {
        None if app.is_loading() => Some(Guidance::Loading),
        None if app.banner.is_some() => Some(Guidance::Failed),
        None => Some(Guidance::Loading),
        Some(snapshot) => match snapshot.status() {
            SnapshotStatus::NoSymbols => Some(Guidance::NoSymbols),
            SnapshotStatus::NoData => Some(Guidance::NoData),
            SnapshotStatus::Ready => None,
        },
    }
}

/// Compute a centered rect for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    #[test]
    fn guidance_states() {
        let (mut app, _rx, _tx) = test_app();
        assert_eq!(guidance(&app), Some(Guidance::Loading));
        app.banner = Some("offline".into());
        assert_eq!(guidance(&app), Some(Guidance::Failed));
        app.range_error = Some("invalid date range".into());
        assert_eq!(guidance(&app), Some(Guidance::InvalidRange));
        app.stocks.selected.clear();
        assert_eq!(guidance(&app), Some(Guidance::NoSymbols));
    }

    #[test]
    fn inverted_range_is_not_shown_as_loading() {
        let (mut app, _rx, _tx) = test_app();
        app.period = tickerboard_core::domain::Period::Custom;
        app.custom_end = app.custom_start - chrono::Days::new(1);
        app.request_load(false);
        assert_eq!(guidance(&app), Some(Guidance::InvalidRange));

        app.custom_end = app.custom_start;
        app.request_load(false);
        assert_eq!(guidance(&app), Some(Guidance::Loading));
    }

    #[test]
    fn centered_rect_is_inside_area() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(60, 40, area);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.height, 20);
        assert!(popup.x >= area.x && popup.right() <= area.right());
    }

    #[test]
    fn draws_every_panel_and_overlay() {
        let (mut app, _rx, _tx) = test_app();
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        for overlay in [Overlay::Welcome, Overlay::AddSymbol, Overlay::ErrorHistory, Overlay::None] {
            app.overlay = overlay;
            for panel in [Panel::Overview, Panel::Summary, Panel::Help] {
                app.active_panel = panel;
                terminal.draw(|f| draw(f, &app)).unwrap();
            }
        }
        app.banner = Some("network unreachable: offline".into());
        terminal.draw(|f| draw(f, &app)).unwrap();
    }

    #[test]
    fn draws_loaded_snapshot() {
        use std::sync::Arc;
        use std::time::Duration;
        use tickerboard_core::data::InMemoryProvider;
        use tickerboard_core::Symbol;
        use tickerboard_runner::Dashboard;

        let (mut app, _rx, _tx) = test_app();
        let start = app.current_range().unwrap().start();
        let day = |n: u64| start.checked_add_days(chrono::Days::new(n)).unwrap();
        let provider = InMemoryProvider::new()
            .with_series(
                Symbol::new("AAPL").unwrap(),
                [(day(1), Some(100.0), Some(1_000.0)), (day(2), None, None), (day(3), Some(121.0), Some(2_000.0))],
            )
            .with_series(Symbol::new("NVDA").unwrap(), [(day(2), Some(0.0), Some(5.0)), (day(3), Some(3.0), None)]);
        let dashboard = Dashboard::new(Arc::new(provider), Duration::from_secs(300));
        let snapshot = dashboard
            .snapshot(app.selected_symbols(), app.current_range().unwrap())
            .unwrap();
        assert_eq!(guidance(&app), Some(Guidance::Loading));
        app.snapshot = Some(snapshot);
        app.overlay = Overlay::None;
        assert_eq!(guidance(&app), None);

        let mut terminal = Terminal::new(TestBackend::new(140, 45)).unwrap();
        for log_scale in [false, true] {
            app.log_scale = log_scale;
            for panel in [Panel::Overview, Panel::Summary] {
                app.active_panel = panel;
                terminal.draw(|f| draw(f, &app)).unwrap();
            }
        }
    }
}

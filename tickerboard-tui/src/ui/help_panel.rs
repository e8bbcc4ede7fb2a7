//! Panel 3: Help. Keyboard shortcuts.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let mut lines: Vec<Line> = Vec::new();

    section(&mut lines, "Global");
    key(&mut lines, "1-3", "Switch to panel by number");
    key(&mut lines, "Tab / Shift+Tab", "Cycle panels forward / back");
    key(&mut lines, "r", "Refresh: bypass the cache and re-download");
    key(&mut lines, "C", "Clear the cache");
    key(&mut lines, "e", "Open error history overlay");
    key(&mut lines, "q", "Quit");
    lines.push(Line::from(""));

    section(&mut lines, "Sidebar");
    key(&mut lines, "j / k", "Move cursor down / up");
    key(&mut lines, "Space / Enter", "Toggle symbol or setting under cursor");
    key(&mut lines, "h / l", "Previous / next value, or move a date one day");
    key(&mut lines, "H / L", "Move a date 30 days (presets: end date only)");
    key(&mut lines, "a", "Add a custom symbol");
    key(&mut lines, "c", "Switch Stocks / Crypto");
    key(&mut lines, "p", "Next period preset");
    key(&mut lines, "v", "Show / hide volume chart");
    key(&mut lines, "g", "Linear / log price scale");
    lines.push(Line::from(""));

    section(&mut lines, "Data");
    key(&mut lines, "Prices", "Daily adjusted close from Yahoo Finance");
    key(&mut lines, "Change", "Last close vs first close of the period");
    key(
        &mut lines,
        "Cache",
        &format!("Results are reused for {}s per exact request", app.config.cache.ttl_secs),
    );
    key(&mut lines, "End date", "Exclusive: the last day shown is the day before");

    let para = Paragraph::new(lines);
    f.render_widget(para, area);
}

fn section(lines: &mut Vec<Line<'_>>, title: &str) {
    lines.push(Line::from(Span::styled(title.to_string(), theme::accent_bold())));
}

fn key(lines: &mut Vec<Line<'_>>, keys: &str, desc: &str) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {:>16}  ", keys), theme::accent()),
        Span::styled(desc.to_string(), theme::muted()),
    ]));
}

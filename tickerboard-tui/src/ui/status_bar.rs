//! Bottom status bar: panel hints, load state, last status message.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::{AppState, StatusLevel};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let mut spans: Vec<Span> = Vec::new();

    // Panel hints
    spans.push(Span::styled(
        " 1:Overview 2:Summary 3:Help r:refresh q:quit",
        theme::muted(),
    ));
    spans.push(Span::raw(" | "));

    if app.is_loading() {
        spans.push(Span::styled("loading... ", theme::warning()));
    } else if let Some(snapshot) = &app.snapshot {
        let source = if snapshot.from_cache { "cached" } else { "fresh" };
        spans.push(Span::styled(
            format!(
                "{} {} as of {} ",
                snapshot.key.range,
                source,
                snapshot.fetched_at.with_timezone(&chrono::Local).format("%H:%M:%S")
            ),
            theme::text_secondary(),
        ));
    }

    // Status message
    if let Some((msg, level)) = &app.status_message {
        let style = match level {
            StatusLevel::Info => theme::accent(),
            StatusLevel::Warning => theme::warning(),
            StatusLevel::Error => theme::negative(),
        };
        spans.push(Span::styled(msg.as_str(), style));
    }

    let line = Line::from(spans);
    let para = Paragraph::new(line);
    f.render_widget(para, area);
}

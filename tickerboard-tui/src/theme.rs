//! Parrot/neon theme tokens for the dashboard.
//!
//! # Color Palette
//! - **Accent**: Electric cyan (focus, highlights)
//! - **Positive**: Neon green (gains)
//! - **Negative**: Hot pink (losses, errors)
//! - **Warning**: Neon orange (guidance, alerts)
//! - **Neutral**: Cool purple (secondary info)
//! - **Muted**: Steel blue (hints, disabled rows)

use ratatui::style::{Color, Modifier, Style};

pub const ACCENT: Color = Color::Rgb(0, 255, 255);
pub const POSITIVE: Color = Color::Rgb(0, 255, 128);
pub const NEGATIVE: Color = Color::Rgb(255, 20, 147);
pub const WARNING: Color = Color::Rgb(255, 140, 0);
pub const NEUTRAL: Color = Color::Rgb(147, 112, 219);
pub const MUTED: Color = Color::Rgb(100, 149, 237);
pub const TEXT_PRIMARY: Color = Color::White;
pub const TEXT_SECONDARY: Color = Color::Rgb(170, 170, 170);

/// Series colours, assigned to symbols in selection order.
pub const SERIES: [Color; 8] = [
    Color::Rgb(0, 255, 255),
    Color::Rgb(255, 140, 0),
    Color::Rgb(0, 255, 128),
    Color::Rgb(255, 20, 147),
    Color::Rgb(147, 112, 219),
    Color::Rgb(255, 230, 0),
    Color::Rgb(100, 149, 237),
    Color::Rgb(240, 240, 240),
];

pub fn series_color(index: usize) -> Color {
    SERIES[index % SERIES.len()]
}

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn positive() -> Style {
    Style::default().fg(POSITIVE)
}

pub fn negative() -> Style {
    Style::default().fg(NEGATIVE)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn neutral() -> Style {
    Style::default().fg(NEUTRAL)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn text() -> Style {
    Style::default().fg(TEXT_PRIMARY)
}

pub fn text_secondary() -> Style {
    Style::default().fg(TEXT_SECONDARY)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        muted()
    }
}

/// Gains green, losses pink, unknown muted.
pub fn change_style(change_pct: Option<f64>) -> Style {
    match change_pct {
        Some(v) if v >= 0.0 => positive(),
        Some(_) => negative(),
        None => muted(),
    }
}

//! Panel 1: Overview. KPI strip, price chart and optional volume chart.
//!
//! The chart x axis is days since the start of the requested range, so
//! every symbol shares one axis even when their trading calendars differ.

use chrono::NaiveDate;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph};

use tickerboard_core::{format, LongRow, Symbol};
use tickerboard_runner::DashboardSnapshot;

use crate::app::AppState;
use crate::theme;
use crate::ui::{guidance, render_guidance};

const KPI_HEIGHT: u16 = 4;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    if let Some(state) = guidance(app) {
        let (message, hint) = state.message();
        render_guidance(f, area, message, hint);
        return;
    }
    let Some(snapshot) = &app.snapshot else {
        return;
    };

    let mut constraints = vec![Constraint::Length(KPI_HEIGHT), Constraint::Min(8)];
    if app.show_volume {
        constraints.push(Constraint::Percentage(30));
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    render_kpis(f, chunks[0], app, snapshot);
    render_price_chart(f, chunks[1], snapshot, app.log_scale);
    if app.show_volume {
        render_volume_chart(f, chunks[2], snapshot);
    }
}

fn render_kpis(f: &mut Frame, area: Rect, app: &AppState, snapshot: &DashboardSnapshot) {
    let symbols = app.kpi_symbols();
    if symbols.is_empty() {
        return;
    }
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, symbols.len() as u32); symbols.len()])
        .split(area);

    for (i, (symbol, card)) in symbols.iter().zip(cards.iter()).enumerate() {
        let row = snapshot.summary_for(symbol);
        let last_close = row.and_then(|r| r.last_close);
        let change = row.and_then(|r| r.change_pct);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::series_color(i)))
            .title(format!(" {symbol} "))
            .title_style(theme::accent_bold());
        let lines = vec![
            Line::from(Span::styled(format::price(last_close), theme::text())),
            Line::from(Span::styled(format::percent(change), theme::change_style(change))),
        ];
        f.render_widget(Paragraph::new(lines).block(block), *card);
    }
}

/// Symbols to chart, in selection order, that have data.
fn charted_symbols(snapshot: &DashboardSnapshot) -> Vec<&Symbol> {
    snapshot
        .key
        .symbols
        .iter()
        .filter(|s| snapshot.table.contains(s))
        .collect()
}

fn day_offset(origin: NaiveDate, date: NaiveDate) -> f64 {
    (date - origin).num_days() as f64
}

/// Chart points for one symbol's closes. Absent closes are skipped; on a
/// log scale so are non-positive ones.
pub fn price_points(rows: &[&LongRow], origin: NaiveDate, log_scale: bool) -> Vec<(f64, f64)> {
    rows.iter()
        .filter_map(|r| {
            let close = r.close?;
            let y = if log_scale {
                (close > 0.0).then(|| close.ln())?
            } else {
                close
            };
            Some((day_offset(origin, r.date), y))
        })
        .collect()
}

pub fn volume_points(rows: &[&LongRow], origin: NaiveDate) -> Vec<(f64, f64)> {
    rows.iter()
        .filter_map(|r| Some((day_offset(origin, r.date), r.volume? as f64)))
        .collect()
}

/// Y bounds over every series, padded by 5%. A flat series gets a unit
/// band so the axis never collapses.
pub fn y_bounds(series: &[Vec<(f64, f64)>]) -> Option<(f64, f64)> {
    let (lo, hi) = series
        .iter()
        .flatten()
        .map(|&(_, y)| y)
        .filter(|y| y.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, y| match acc {
            None => Some((y, y)),
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
        })?;
    let span = hi - lo;
    if span <= f64::EPSILON {
        let pad = (lo.abs() * 0.05).max(0.5);
        return Some((lo - pad, hi + pad));
    }
    let pad = span * 0.05;
    Some((lo - pad, hi + pad))
}

/// Three y-axis labels (low, mid, high) in price units. On a log scale the
/// plotted values are `ln(close)` and are mapped back before formatting.
pub fn price_labels(lo: f64, hi: f64, log_scale: bool) -> Vec<String> {
    [lo, (lo + hi) / 2.0, hi]
        .into_iter()
        .map(|y| {
            let price = if log_scale { y.exp() } else { y };
            format::number(price, if price.abs() >= 1000.0 { 0 } else { 2 })
        })
        .collect()
}

fn x_axis(snapshot: &DashboardSnapshot) -> Axis<'static> {
    let range = snapshot.key.range;
    let span = range.days().max(1) as f64;
    let mid = range.start() + chrono::Duration::days(range.days() / 2);
    Axis::default()
        .style(theme::muted())
        .bounds([0.0, span])
        .labels(vec![
            Span::styled(range.start().to_string(), theme::muted()),
            Span::styled(mid.to_string(), theme::muted()),
            Span::styled(range.end().to_string(), theme::muted()),
        ])
}

fn render_price_chart(f: &mut Frame, area: Rect, snapshot: &DashboardSnapshot, log_scale: bool) {
    let origin = snapshot.key.range.start();
    let symbols = charted_symbols(snapshot);
    let series: Vec<Vec<(f64, f64)>> = symbols
        .iter()
        .map(|s| price_points(&snapshot.series(s), origin, log_scale))
        .collect();

    let Some((y_min, y_max)) = y_bounds(&series) else {
        render_guidance(f, area, "No closing prices in this period.", "");
        return;
    };

    let datasets: Vec<Dataset> = symbols
        .iter()
        .zip(series.iter())
        .enumerate()
        .map(|(i, (symbol, data))| {
            Dataset::default()
                .name(symbol.to_string())
                .marker(symbols::Marker::Braille)
                .style(Style::default().fg(theme::series_color(i)))
                .graph_type(GraphType::Line)
                .data(data)
        })
        .collect();

    let title = if log_scale { " Close (log) " } else { " Close " };
    let chart = Chart::new(datasets)
        .block(Block::default().title(Span::styled(title, theme::accent_bold())))
        .x_axis(x_axis(snapshot))
        .y_axis(
            Axis::default()
                .style(theme::muted())
                .bounds([y_min, y_max])
                .labels(
                    price_labels(y_min, y_max, log_scale)
                        .into_iter()
                        .map(|l| Span::styled(l, theme::muted()))
                        .collect::<Vec<_>>(),
                ),
        );

    f.render_widget(chart, area);
}

fn render_volume_chart(f: &mut Frame, area: Rect, snapshot: &DashboardSnapshot) {
    let origin = snapshot.key.range.start();
    let symbols = charted_symbols(snapshot);
    let series: Vec<Vec<(f64, f64)>> = symbols
        .iter()
        .map(|s| volume_points(&snapshot.series(s), origin))
        .collect();

    let y_max = series
        .iter()
        .flatten()
        .map(|&(_, v)| v)
        .fold(0.0_f64, f64::max);
    if y_max <= 0.0 {
        render_guidance(f, area, "No volume reported for this selection.", "");
        return;
    }

    let datasets: Vec<Dataset> = symbols
        .iter()
        .zip(series.iter())
        .enumerate()
        .map(|(i, (symbol, data))| {
            Dataset::default()
                .name(symbol.to_string())
                .marker(symbols::Marker::HalfBlock)
                .style(Style::default().fg(theme::series_color(i)))
                .graph_type(GraphType::Bar)
                .data(data)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(Block::default().title(Span::styled(" Volume ", theme::accent_bold())))
        .x_axis(x_axis(snapshot))
        .y_axis(
            Axis::default()
                .style(theme::muted())
                .bounds([0.0, y_max * 1.05])
                .labels(vec![
                    Span::styled("0", theme::muted()),
                    Span::styled(format::compact(y_max), theme::muted()),
                ]),
        );

    f.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, day).unwrap()
    }

    fn row(day: u32, close: Option<f64>, volume: Option<u64>) -> LongRow {
        LongRow {
            date: d(day),
            symbol: Symbol::new("AAPL").unwrap(),
            close,
            volume,
        }
    }

    #[test]
    fn absent_closes_are_skipped() {
        let rows = [row(2, Some(10.0), Some(5)), row(3, None, Some(7)), row(4, Some(12.0), None)];
        let refs: Vec<&LongRow> = rows.iter().collect();
        assert_eq!(price_points(&refs, d(1), false), vec![(1.0, 10.0), (3.0, 12.0)]);
        assert_eq!(volume_points(&refs, d(1)), vec![(1.0, 5.0), (2.0, 7.0)]);
    }

    #[test]
    fn log_scale_plots_ln_and_skips_non_positive() {
        let rows = [row(2, Some(std::f64::consts::E), None), row(3, Some(0.0), None)];
        let refs: Vec<&LongRow> = rows.iter().collect();
        let points = price_points(&refs, d(2), true);
        assert_eq!(points.len(), 1);
        assert!((points[0].1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn log_labels_are_in_price_units() {
        let labels = price_labels(100f64.ln(), 400f64.ln(), true);
        assert_eq!(labels, ["100.00", "200.00", "400.00"]);
        let linear = price_labels(1000.0, 3000.0, false);
        assert_eq!(linear, ["1,000", "2,000", "3,000"]);
    }

    #[test]
    fn bounds_of_flat_and_empty_series() {
        assert_eq!(y_bounds(&[]), None);
        assert_eq!(y_bounds(&[vec![]]), None);
        let (lo, hi) = y_bounds(&[vec![(0.0, 5.0), (1.0, 5.0)]]).unwrap();
        assert!(lo < 5.0 && hi > 5.0);
    }

    proptest! {
        #[test]
        fn bounds_contain_every_point(ys in prop::collection::vec(-1e6f64..1e6, 1..50)) {
            let series = vec![ys.iter().enumerate().map(|(i, &y)| (i as f64, y)).collect::<Vec<_>>()];
            let (lo, hi) = y_bounds(&series).unwrap();
            prop_assert!(lo < hi);
            for &y in &ys {
                prop_assert!(lo <= y && y <= hi);
            }
        }
    }
}

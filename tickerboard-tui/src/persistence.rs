//! App state persistence: JSON save/load across restarts.
//!
//! Every field is optional so a state file from an older build, or one the
//! user trimmed by hand, still loads; missing fields keep the config
//! defaults.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use tickerboard_core::domain::{AssetClass, Period, Symbol};

use crate::app::{AppState, ClassState, Overlay, Panel};

/// Per-asset-class selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedClass {
    /// Symbols added through the input overlay.
    pub custom: Vec<Symbol>,
    /// Selection in selection order.
    pub selected: Vec<Symbol>,
}

/// Serializable subset of app state that persists across restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub asset_class: Option<AssetClass>,
    pub period: Option<Period>,
    pub custom_start: Option<NaiveDate>,
    pub custom_end: Option<NaiveDate>,
    pub stocks: Option<PersistedClass>,
    pub crypto: Option<PersistedClass>,
    pub show_volume: Option<bool>,
    pub log_scale: Option<bool>,
    pub active_panel: Option<Panel>,
    pub welcome_dismissed: bool,
}

/// Load persisted state from disk. Returns defaults if file is missing or corrupt.
pub fn load(path: &Path) -> PersistedState {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt state file");
            PersistedState::default()
        }),
        Err(_) => PersistedState::default(),
    }
}

/// Save persisted state to disk. Creates parent directories if needed.
pub fn save(path: &Path, state: &PersistedState) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn extract_class(state: &ClassState, defaults: &[Symbol]) -> PersistedClass {
    PersistedClass {
        custom: state
            .universe
            .iter()
            .filter(|s| !defaults.contains(s))
            .cloned()
            .collect(),
        selected: state.selected.clone(),
    }
}

fn apply_class(state: &mut ClassState, persisted: PersistedClass) {
    for symbol in persisted.custom {
        if !state.universe.contains(&symbol) {
            state.universe.push(symbol);
        }
    }
    state.selected = persisted
        .selected
        .into_iter()
        .filter(|s| state.universe.contains(s))
        .collect();
}

/// Extract persisted state from AppState.
pub fn extract(app: &AppState) -> PersistedState {
    PersistedState {
        asset_class: Some(app.asset_class),
        period: Some(app.period),
        custom_start: Some(app.custom_start),
        custom_end: Some(app.custom_end),
        stocks: Some(extract_class(&app.stocks, app.config.universe(AssetClass::Stocks))),
        crypto: Some(extract_class(&app.crypto, app.config.universe(AssetClass::Crypto))),
        show_volume: Some(app.show_volume),
        log_scale: Some(app.log_scale),
        active_panel: Some(app.active_panel),
        welcome_dismissed: app.overlay != Overlay::Welcome,
    }
}

/// Apply persisted state to AppState.
pub fn apply(app: &mut AppState, state: PersistedState) {
    if let Some(class) = state.asset_class {
        app.asset_class = class;
    }
    if let Some(period) = state.period {
        app.period = period;
    }
    if let Some(start) = state.custom_start {
        app.custom_start = start;
    }
    if let Some(end) = state.custom_end {
        app.custom_end = end;
    }
    if let Some(stocks) = state.stocks {
        apply_class(&mut app.stocks, stocks);
    }
    if let Some(crypto) = state.crypto {
        apply_class(&mut app.crypto, crypto);
    }
    if let Some(show) = state.show_volume {
        app.show_volume = show;
    }
    if let Some(log) = state.log_scale {
        app.log_scale = log;
    }
    if let Some(panel) = state.active_panel {
        app.active_panel = panel;
    }
    app.overlay = if state.welcome_dismissed {
        Overlay::None
    } else {
        Overlay::Welcome
    };
}

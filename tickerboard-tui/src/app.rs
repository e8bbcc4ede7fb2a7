//! Application state, single-owner, main-thread only.
//!
//! All TUI state lives here. The worker thread communicates via channels.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use tickerboard_core::domain::{AssetClass, DateRange, Period, Symbol};
use tickerboard_runner::{resolve_range, DashboardConfig, DashboardSnapshot, SnapshotStatus};

use crate::worker::{FailureKind, WorkerCommand, WorkerResponse};

const ERROR_HISTORY_CAP: usize = 50;

/// Which panel is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Panel {
    Overview,
    Summary,
    Help,
}

impl Panel {
    pub const COUNT: usize = 3;

    pub fn index(self) -> usize {
        match self {
            Panel::Overview => 0,
            Panel::Summary => 1,
            Panel::Help => 2,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Panel::Overview),
            1 => Some(Panel::Summary),
            2 => Some(Panel::Help),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Panel::Overview => "Overview",
            Panel::Summary => "Summary",
            Panel::Help => "Help",
        }
    }

    pub fn next(self) -> Panel {
        Panel::from_index((self.index() + 1) % Self::COUNT).unwrap_or(Panel::Overview)
    }

    pub fn prev(self) -> Panel {
        Panel::from_index((self.index() + Self::COUNT - 1) % Self::COUNT).unwrap_or(Panel::Overview)
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// An error record for the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    pub context: String,
}

/// Error category for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Input,
    Config,
    Other,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Network => "NET",
            ErrorCategory::Data => "DATA",
            ErrorCategory::Input => "INPUT",
            ErrorCategory::Config => "CFG",
            ErrorCategory::Other => "ERR",
        }
    }
}

impl From<FailureKind> for ErrorCategory {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::Network => ErrorCategory::Network,
            FailureKind::Data => ErrorCategory::Data,
        }
    }
}

/// Which overlay (if any) is shown on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    Welcome,
    AddSymbol,
    ErrorHistory,
}

/// One selectable row of the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarRow {
    AssetClass,
    Symbol(usize),
    AddSymbol,
    Period,
    StartDate,
    EndDate,
    ShowVolume,
    LogScale,
}

/// Universe and selection of one asset class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassState {
    /// Default universe followed by user-added symbols.
    pub universe: Vec<Symbol>,
    /// Selected symbols, in the order they were selected.
    pub selected: Vec<Symbol>,
}

impl ClassState {
    pub fn from_config(config: &DashboardConfig, class: AssetClass) -> Self {
        let universe = config.universe(class).to_vec();
        let selected = config
            .default_selection(class)
            .iter()
            .filter(|s| universe.contains(s))
            .cloned()
            .collect();
        Self { universe, selected }
    }

    pub fn is_selected(&self, symbol: &Symbol) -> bool {
        self.selected.contains(symbol)
    }

    pub fn toggle(&mut self, symbol: &Symbol) {
        if let Some(pos) = self.selected.iter().position(|s| s == symbol) {
            self.selected.remove(pos);
        } else if self.universe.contains(symbol) {
            self.selected.push(symbol.clone());
        }
    }

    /// Add a symbol to the universe and select it. Returns false when it
    /// was already listed.
    pub fn add(&mut self, symbol: Symbol) -> bool {
        if self.universe.contains(&symbol) {
            if !self.is_selected(&symbol) {
                self.selected.push(symbol);
            }
            return false;
        }
        self.universe.push(symbol.clone());
        self.selected.push(symbol);
        true
    }
}

/// Load request currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRequest {
    pub id: u64,
    pub force: bool,
}

/// Top-level application state.
pub struct AppState {
    // Navigation
    pub active_panel: Panel,
    pub running: bool,
    pub overlay: Overlay,

    // Sidebar settings
    pub config: DashboardConfig,
    pub asset_class: AssetClass,
    pub stocks: ClassState,
    pub crypto: ClassState,
    pub period: Period,
    pub custom_start: NaiveDate,
    pub custom_end: NaiveDate,
    pub show_volume: bool,
    pub log_scale: bool,
    pub cursor: usize,
    pub symbol_input: String,
    /// Anchor of preset windows, re-read from `clock` on every load.
    pub today: NaiveDate,
    pub clock: fn() -> NaiveDate,
    /// End of preset windows when moved back from today.
    pub preset_end: Option<NaiveDate>,

    // Data
    pub snapshot: Option<DashboardSnapshot>,
    /// Provider failure of the latest request, shown above the panels.
    pub banner: Option<String>,
    /// Why the current settings cannot be requested at all.
    pub range_error: Option<String>,
    pub pending: Option<PendingRequest>,
    next_request_id: u64,

    // Worker communication
    pub worker_tx: Sender<WorkerCommand>,
    pub worker_rx: Receiver<WorkerResponse>,

    // Cross-cutting
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,

    // Paths
    pub state_path: PathBuf,
}

impl AppState {
    pub fn new(
        config: DashboardConfig,
        clock: fn() -> NaiveDate,
        worker_tx: Sender<WorkerCommand>,
        worker_rx: Receiver<WorkerResponse>,
        state_path: PathBuf,
    ) -> Self {
        let stocks = ClassState::from_config(&config, AssetClass::Stocks);
        let crypto = ClassState::from_config(&config, AssetClass::Crypto);
        let period = config.defaults.period;
        let today = clock();
        // Custom bounds start out as the default preset's window.
        let window = Period::ThreeMonths
            .range_ending(today)
            .map(|r| (r.start(), r.end()))
            .unwrap_or((today, today));
        Self {
            active_panel: Panel::Overview,
            running: true,
            overlay: Overlay::Welcome,
            asset_class: config.defaults.asset_class,
            stocks,
            crypto,
            period,
            custom_start: window.0,
            custom_end: window.1,
            show_volume: config.display.show_volume,
            log_scale: config.display.log_scale,
            cursor: 0,
            symbol_input: String::new(),
            today,
            clock,
            preset_end: None,
            config,
            snapshot: None,
            banner: None,
            range_error: None,
            pending: None,
            next_request_id: 1,
            worker_tx,
            worker_rx,
            status_message: None,
            error_history: VecDeque::with_capacity(ERROR_HISTORY_CAP),
            error_scroll: 0,
            state_path,
        }
    }

    pub fn class_state(&self) -> &ClassState {
        match self.asset_class {
            AssetClass::Stocks => &self.stocks,
            AssetClass::Crypto => &self.crypto,
        }
    }

    pub fn class_state_mut(&mut self) -> &mut ClassState {
        match self.asset_class {
            AssetClass::Stocks => &mut self.stocks,
            AssetClass::Crypto => &mut self.crypto,
        }
    }

    /// Selected symbols of the active asset class, in selection order.
    pub fn selected_symbols(&self) -> &[Symbol] {
        &self.class_state().selected
    }

    /// Symbols that get a KPI card: the first `kpi_limit` selected.
    pub fn kpi_symbols(&self) -> &[Symbol] {
        let selected = self.selected_symbols();
        &selected[..selected.len().min(self.config.display.kpi_limit)]
    }

    pub fn custom_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        (self.period == Period::Custom).then_some((self.custom_start, self.custom_end))
    }

    pub fn current_range(&self) -> Result<DateRange, tickerboard_runner::PipelineError> {
        resolve_range(self.period, self.preset_end.unwrap_or(self.today), self.custom_bounds())
    }

    /// End date shown in the sidebar for the active period.
    pub fn end_date(&self) -> NaiveDate {
        match self.period {
            Period::Custom => self.custom_end,
            _ => self.preset_end.unwrap_or(self.today),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Rows of the sidebar, top to bottom, for the active asset class.
    pub fn sidebar_rows(&self) -> Vec<SidebarRow> {
        let mut rows = vec![SidebarRow::AssetClass];
        rows.extend((0..self.class_state().universe.len()).map(SidebarRow::Symbol));
        rows.push(SidebarRow::AddSymbol);
        rows.push(SidebarRow::Period);
        if self.period == Period::Custom {
            rows.push(SidebarRow::StartDate);
        }
        rows.push(SidebarRow::EndDate);
        rows.push(SidebarRow::ShowVolume);
        rows.push(SidebarRow::LogScale);
        rows
    }

    pub fn cursor_row(&self) -> Option<SidebarRow> {
        self.sidebar_rows().get(self.cursor).copied()
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.sidebar_rows().len();
        if len == 0 {
            return;
        }
        self.cursor = self.cursor.saturating_add_signed(delta).min(len - 1);
    }

    fn clamp_cursor(&mut self) {
        let len = self.sidebar_rows().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    // ── Settings changes. Each one that alters the request reloads. ──

    pub fn toggle_asset_class(&mut self) {
        self.asset_class = self.asset_class.toggle();
        self.clamp_cursor();
        self.request_load(false);
    }

    pub fn toggle_symbol(&mut self, index: usize) {
        let Some(symbol) = self.class_state().universe.get(index).cloned() else {
            return;
        };
        self.class_state_mut().toggle(&symbol);
        self.request_load(false);
    }

    /// Parse the input overlay's text and add it to the active universe.
    /// Tickers are upper-cased as typed; symbols stay case-sensitive.
    pub fn submit_symbol_input(&mut self) {
        let raw = std::mem::take(&mut self.symbol_input);
        self.overlay = Overlay::None;
        match Symbol::new(raw.trim().to_ascii_uppercase()) {
            Ok(symbol) => {
                let label = symbol.to_string();
                if self.class_state_mut().add(symbol) {
                    self.set_status(format!("Added {label}"));
                }
                self.request_load(false);
            }
            Err(_) => self.set_warning("Symbol cannot be empty"),
        }
    }

    pub fn cycle_period(&mut self, forward: bool) {
        self.period = if forward {
            self.period.next()
        } else {
            Period::ALL
                .iter()
                .copied()
                .find(|p| p.next() == self.period)
                .unwrap_or(self.period)
        };
        self.clamp_cursor();
        self.request_load(false);
    }

    /// Move a date bound by `days` (negative moves back).
    ///
    /// Custom periods move either bound freely. Presets only move their end
    /// date, which never passes today; reaching today again re-anchors the
    /// window to the current date.
    pub fn shift_date(&mut self, which: SidebarRow, days: i64) {
        if self.period != Period::Custom {
            if which != SidebarRow::EndDate {
                return;
            }
            let Some(end) = shift_days(self.end_date(), days) else {
                return;
            };
            self.today = (self.clock)();
            self.preset_end = (end < self.today).then_some(end);
            self.request_load(false);
            return;
        }

        let target = match which {
            SidebarRow::StartDate => &mut self.custom_start,
            SidebarRow::EndDate => &mut self.custom_end,
            _ => return,
        };
        if let Some(date) = shift_days(*target, days) {
            *target = date;
            self.request_load(false);
        }
    }

    // Display toggles change rendering only.

    pub fn toggle_volume(&mut self) {
        self.show_volume = !self.show_volume;
    }

    pub fn toggle_log_scale(&mut self) {
        self.log_scale = !self.log_scale;
    }

    // ── Loading ──

    /// Send a load for the current settings to the worker. Any request
    /// still in flight is superseded.
    pub fn request_load(&mut self, force: bool) {
        self.today = (self.clock)();
        if self.preset_end.is_some_and(|end| end >= self.today) {
            self.preset_end = None;
        }
        let range = match self.current_range() {
            Ok(range) => range,
            Err(e) => {
                self.pending = None;
                self.snapshot = None;
                self.banner = None;
                self.range_error = Some(e.to_string());
                let context = format!("{} → {}", self.custom_start, self.custom_end);
                self.push_error(ErrorCategory::Input, e.to_string(), context);
                return;
            }
        };
        self.range_error = None;

        let id = self.next_request_id;
        self.next_request_id += 1;
        let command = WorkerCommand::Load {
            request_id: id,
            symbols: self.selected_symbols().to_vec(),
            range,
            force,
        };
        debug!(request_id = id, force, %range, "requesting load");
        if self.worker_tx.send(command).is_err() {
            self.pending = None;
            self.push_error(ErrorCategory::Other, "Worker thread is not running".into(), String::new());
            return;
        }
        self.pending = Some(PendingRequest { id, force });
    }

    /// Apply a worker response. Responses to superseded requests are
    /// dropped.
    pub fn apply_response(&mut self, response: WorkerResponse) {
        match response {
            WorkerResponse::Loaded { request_id, snapshot } => {
                if !self.is_current(request_id) {
                    debug!(request_id, "discarding stale response");
                    return;
                }
                let force = self.pending.is_some_and(|p| p.force);
                self.pending = None;
                self.banner = None;
                self.report_loaded(&snapshot, force);
                self.snapshot = Some(*snapshot);
            }
            WorkerResponse::Failed {
                request_id,
                kind,
                error,
            } => {
                if !self.is_current(request_id) {
                    debug!(request_id, "discarding stale failure");
                    return;
                }
                self.pending = None;
                self.snapshot = None;
                self.banner = Some(error.clone());
                let context = self.selected_symbols().iter().map(Symbol::as_str).collect::<Vec<_>>().join(", ");
                self.push_error(kind.into(), error, context);
            }
            WorkerResponse::CacheCleared => self.set_status("Cache cleared"),
        }
    }

    fn is_current(&self, request_id: u64) -> bool {
        self.pending.is_some_and(|p| p.id == request_id)
    }

    fn report_loaded(&mut self, snapshot: &DashboardSnapshot, forced: bool) {
        match snapshot.status() {
            SnapshotStatus::NoSymbols => self.status_message = None,
            SnapshotStatus::NoData => self.set_warning("No data for the selected symbols and period"),
            SnapshotStatus::Ready if !snapshot.unresolved.is_empty() => {
                let names: Vec<&str> = snapshot.unresolved.iter().map(Symbol::as_str).collect();
                self.set_warning(format!("No data for: {}", names.join(", ")));
            }
            SnapshotStatus::Ready => {
                let source = if snapshot.from_cache {
                    "cache"
                } else if forced {
                    "refresh"
                } else {
                    "provider"
                };
                self.set_status(format!("Loaded {} symbols from {source}", snapshot.summary.len()));
            }
        }
    }

    /// Push an error to the history, capping at 50.
    pub fn push_error(&mut self, category: ErrorCategory, message: String, context: String) {
        let record = ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.clone(),
            context,
        };
        self.error_history.push_front(record);
        if self.error_history.len() > ERROR_HISTORY_CAP {
            self.error_history.pop_back();
        }
        self.status_message = Some((message, StatusLevel::Error));
    }

    /// Set an info status message.
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    /// Set a warning status message.
    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }
}

fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

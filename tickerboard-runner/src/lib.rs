//! Tickerboard Runner: pipeline orchestration on top of `tickerboard-core`.
//!
//! This crate provides:
//! - A TTL result cache keyed by the exact request
//! - Dashboard snapshots (load → reshape → summarise) with cache bypass
//! - TOML configuration with defaults and validation
//! - CSV, JSON, Parquet and Markdown export
//! - Tracing subscriber setup for the binaries

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod export;
pub mod logging;

pub use cache::{Clock, ManualClock, SystemClock, TtlCache, DEFAULT_TTL};
pub use config::{ConfigError, DashboardConfig};
pub use dashboard::{
    resolve_range, Dashboard, DashboardSnapshot, PipelineError, RequestKey, SnapshotStatus,
};
pub use export::{save_export, ExportError, ExportFormat};

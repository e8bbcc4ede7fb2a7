//! Background worker thread. Every provider call runs here so the UI
//! thread never blocks on the network.
//!
//! Communication with the TUI main thread is via `mpsc` channels. Each load
//! carries the request id it was issued with; the UI drops responses whose
//! id is no longer the latest.

use std::io;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use tickerboard_core::data::DataError;
use tickerboard_core::domain::{DateRange, Symbol};
use tickerboard_runner::{Dashboard, DashboardSnapshot, PipelineError};
use tracing::{debug, warn};

/// Commands sent from the TUI to the worker.
#[derive(Debug)]
pub enum WorkerCommand {
    Load {
        request_id: u64,
        symbols: Vec<Symbol>,
        range: DateRange,
        /// Skip the cache and re-download.
        force: bool,
    },
    ClearCache,
    Shutdown,
}

/// Where a failure came from, for the error history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Data,
}

/// Responses sent from the worker back to the TUI.
#[derive(Debug, Clone)]
pub enum WorkerResponse {
    Loaded {
        request_id: u64,
        snapshot: Box<DashboardSnapshot>,
    },
    Failed {
        request_id: u64,
        kind: FailureKind,
        error: String,
    },
    CacheCleared,
}

/// Spawn the background worker thread.
pub fn spawn_worker(
    dashboard: Dashboard,
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("tickerboard-worker".into())
        .spawn(move || worker_loop(&dashboard, rx, tx))
}

fn worker_loop(dashboard: &Dashboard, rx: Receiver<WorkerCommand>, tx: Sender<WorkerResponse>) {
    loop {
        let response = match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(WorkerCommand::ClearCache) => {
                dashboard.clear_cache();
                WorkerResponse::CacheCleared
            }
            Ok(WorkerCommand::Load {
                request_id,
                symbols,
                range,
                force,
            }) => handle_load(dashboard, request_id, &symbols, range, force),
        };
        if tx.send(response).is_err() {
            // UI side is gone
            break;
        }
    }
    debug!("worker stopped");
}

fn handle_load(
    dashboard: &Dashboard,
    request_id: u64,
    symbols: &[Symbol],
    range: DateRange,
    force: bool,
) -> WorkerResponse {
    let result = if force {
        dashboard.refresh(symbols, range)
    } else {
        dashboard.snapshot(symbols, range)
    };
    match result {
        Ok(snapshot) => WorkerResponse::Loaded {
            request_id,
            snapshot: Box::new(snapshot),
        },
        Err(e) => {
            warn!(request_id, error = %e, "load failed");
            WorkerResponse::Failed {
                request_id,
                kind: failure_kind(&e),
                error: e.to_string(),
            }
        }
    }
}

fn failure_kind(error: &PipelineError) -> FailureKind {
    match error {
        PipelineError::Data(
            DataError::NetworkUnreachable(_)
            | DataError::RateLimited { .. }
            | DataError::AuthenticationRequired(_)
            | DataError::CircuitBreakerTripped,
        ) => FailureKind::Network,
        _ => FailureKind::Data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::time::Duration;
    use tickerboard_core::data::InMemoryProvider;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, day).unwrap()
    }

    fn spawn(provider: Arc<InMemoryProvider>) -> (Sender<WorkerCommand>, Receiver<WorkerResponse>, JoinHandle<()>) {
        let dashboard = Dashboard::new(provider, Duration::from_secs(300));
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let handle = spawn_worker(dashboard, cmd_rx, resp_tx).unwrap();
        (cmd_tx, resp_rx, handle)
    }

    fn load(request_id: u64, force: bool) -> WorkerCommand {
        WorkerCommand::Load {
            request_id,
            symbols: vec![Symbol::new("AAPL").unwrap()],
            range: DateRange::new(d(1), d(31)).unwrap(),
            force,
        }
    }

    #[test]
    fn loads_and_echoes_request_id() {
        let provider = Arc::new(
            InMemoryProvider::new().with_series(Symbol::new("AAPL").unwrap(), [(d(2), Some(1.0), Some(1.0))]),
        );
        let (tx, rx, handle) = spawn(provider.clone());

        tx.send(load(7, false)).unwrap();
        match rx.recv().unwrap() {
            WorkerResponse::Loaded { request_id, snapshot } => {
                assert_eq!(request_id, 7);
                assert_eq!(snapshot.summary.len(), 1);
            }
            other => panic!("unexpected response {other:?}"),
        }

        tx.send(load(8, true)).unwrap();
        assert!(matches!(rx.recv().unwrap(), WorkerResponse::Loaded { request_id: 8, .. }));
        assert_eq!(provider.calls(), 2);

        tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn failures_are_reported_not_fatal() {
        let provider = Arc::new(InMemoryProvider::new());
        provider.set_failure(Some("no route to host"));
        let (tx, rx, handle) = spawn(provider.clone());

        tx.send(load(1, false)).unwrap();
        match rx.recv().unwrap() {
            WorkerResponse::Failed { request_id, kind, error } => {
                assert_eq!(request_id, 1);
                assert_eq!(kind, FailureKind::Network);
                assert!(error.contains("no route to host"));
            }
            other => panic!("unexpected response {other:?}"),
        }

        provider.set_failure(None);
        tx.send(load(2, false)).unwrap();
        assert!(matches!(rx.recv().unwrap(), WorkerResponse::Loaded { request_id: 2, .. }));

        drop(tx);
        handle.join().unwrap();
    }

    #[test]
    fn clear_cache_acknowledged() {
        let (tx, rx, handle) = spawn(Arc::new(InMemoryProvider::new()));
        tx.send(WorkerCommand::ClearCache).unwrap();
        assert!(matches!(rx.recv().unwrap(), WorkerResponse::CacheCleared));
        tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }
}

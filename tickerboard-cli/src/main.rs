//! Tickerboard CLI: the dashboard pipeline without the terminal UI.
//!
//! Commands:
//! - `summary` prints the per-symbol summary table for a selection
//! - `export` writes long rows or the summary as CSV, JSON, Parquet or Markdown
//! - `symbols` lists the default universe of an asset class
//! - `config init` / `config show` manage the TOML configuration file

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use tickerboard_core::domain::{parse_symbols, AssetClass, DateRange, Period, Symbol};
use tickerboard_core::{format, SummaryRow};
use tickerboard_runner::{
    logging, resolve_range, save_export, Dashboard, DashboardConfig, DashboardSnapshot,
    ExportFormat, SnapshotStatus,
};

#[derive(Parser)]
#[command(
    name = "tickerboard-cli",
    about = "Tickerboard CLI: daily prices, volume and period change for stocks and crypto"
)]
struct Cli {
    /// Path to a TOML config file. Defaults to <config dir>/tickerboard/config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Symbol and date-range selection shared by `summary` and `export`.
#[derive(Args, Debug)]
struct Selection {
    /// Symbols to load (e.g. AAPL MSFT). Defaults to the configured selection.
    symbols: Vec<String>,

    /// Use the crypto universe defaults instead of stocks.
    #[arg(long, default_value_t = false)]
    crypto: bool,

    /// Period preset ending today: 1M, 3M, 6M or 1Y.
    #[arg(long, conflicts_with_all = ["start", "end"])]
    period: Option<Period>,

    /// Custom start date (YYYY-MM-DD), inclusive.
    #[arg(long, requires = "end", value_parser = parse_date)]
    start: Option<NaiveDate>,

    /// Custom end date (YYYY-MM-DD), exclusive.
    #[arg(long, requires = "start", value_parser = parse_date)]
    end: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the summary table for a selection.
    Summary {
        #[command(flatten)]
        selection: Selection,
    },
    /// Export the long rows (or the summary) of a selection to a file.
    Export {
        #[command(flatten)]
        selection: Selection,

        /// Output format: csv, json, parquet or md.
        #[arg(long, value_parser = parse_format)]
        format: ExportFormat,

        /// Output file path.
        #[arg(long)]
        out: PathBuf,

        /// Write the per-symbol summary instead of the long rows.
        #[arg(long, default_value_t = false)]
        summary: bool,
    },
    /// List the default universe and selection of an asset class.
    Symbols {
        /// Show crypto instead of stocks.
        #[arg(long, default_value_t = false)]
        crypto: bool,
    },
    /// Configuration file commands.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a configuration file with default values.
    Init {
        /// Where to write. Defaults to <config dir>/tickerboard/config.toml.
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Print the effective configuration as TOML.
    Show {
        /// Print only the path the configuration is read from.
        #[arg(long, default_value_t = false)]
        path: bool,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date '{s}': {e}"))
}

fn parse_format(s: &str) -> Result<ExportFormat, String> {
    s.parse().map_err(|e: tickerboard_runner::ExportError| e.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init();

    match cli.command {
        Commands::Summary { selection } => run_summary(cli.config.as_deref(), &selection),
        Commands::Export {
            selection,
            format,
            out,
            summary,
        } => run_export(cli.config.as_deref(), &selection, format, &out, summary),
        Commands::Symbols { crypto } => run_symbols(cli.config.as_deref(), asset_class(crypto)),
        Commands::Config { action } => match action {
            ConfigAction::Init { path, force } => run_config_init(path, force),
            ConfigAction::Show { path } => run_config_show(cli.config.as_deref(), path),
        },
    }
}

fn asset_class(crypto: bool) -> AssetClass {
    if crypto {
        AssetClass::Crypto
    } else {
        AssetClass::Stocks
    }
}

fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    DashboardConfig::load(path).context("failed to load configuration")
}

/// Explicit symbols, or the configured default selection of the class.
fn resolve_symbols(config: &DashboardConfig, selection: &Selection) -> Vec<Symbol> {
    if selection.symbols.is_empty() {
        config.default_selection(asset_class(selection.crypto)).to_vec()
    } else {
        parse_symbols(&selection.symbols)
    }
}

fn resolve_selection_range(
    config: &DashboardConfig,
    selection: &Selection,
    today: NaiveDate,
) -> Result<DateRange> {
    let (period, custom) = match (selection.start, selection.end) {
        (Some(start), Some(end)) => (Period::Custom, Some((start, end))),
        _ => (selection.period.unwrap_or(config.defaults.period), None),
    };
    if period == Period::Custom && custom.is_none() {
        bail!("--period Custom needs --start and --end");
    }
    Ok(resolve_range(period, today, custom)?)
}

/// Run the pipeline for a selection. A provider failure ends the process
/// with exit code 1.
fn fetch(config_path: Option<&Path>, selection: &Selection) -> Result<DashboardSnapshot> {
    let config = load_config(config_path)?;
    let symbols = resolve_symbols(&config, selection);
    let today = chrono::Local::now().date_naive();
    let range = resolve_selection_range(&config, selection, today)?;
    debug!(symbols = symbols.len(), %range, "running pipeline");

    let dashboard = Dashboard::from_config(&config).context("failed to build data provider")?;
    match dashboard.snapshot(&symbols, range) {
        Ok(snapshot) => Ok(snapshot),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn run_summary(config_path: Option<&Path>, selection: &Selection) -> Result<()> {
    let snapshot = fetch(config_path, selection)?;
    match snapshot.status() {
        SnapshotStatus::NoSymbols => println!("Select at least one symbol."),
        SnapshotStatus::NoData => {
            println!("No data for the selected symbols and period ({}).", snapshot.key.range)
        }
        SnapshotStatus::Ready => {
            println!("Period: {}\n", snapshot.key.range);
            print!("{}", summary_table(&snapshot.summary));
            if !snapshot.unresolved.is_empty() {
                println!("\nNo data returned for: {}", join_symbols(&snapshot.unresolved));
            }
        }
    }
    Ok(())
}

fn run_export(
    config_path: Option<&Path>,
    selection: &Selection,
    format: ExportFormat,
    out: &Path,
    summary_only: bool,
) -> Result<()> {
    let snapshot = fetch(config_path, selection)?;
    if snapshot.status() != SnapshotStatus::Ready {
        eprintln!("Warning: nothing loaded for this selection; writing an empty export.");
    }
    save_export(&snapshot, format, out, summary_only)
        .with_context(|| format!("failed to write {}", out.display()))?;
    let what = if summary_only { "summary rows" } else { "rows" };
    let count = if summary_only {
        snapshot.summary.len()
    } else {
        snapshot.rows.len()
    };
    println!("Wrote {count} {what} as {format} to {}", out.display());
    Ok(())
}

fn run_symbols(config_path: Option<&Path>, class: AssetClass) -> Result<()> {
    let config = load_config(config_path)?;
    let selected = config.default_selection(class);
    println!("{} universe:", class.label());
    for symbol in config.universe(class) {
        let mark = if selected.contains(symbol) { "*" } else { " " };
        println!("  {mark} {symbol}");
    }
    println!("\n* selected by default");
    Ok(())
}

fn run_config_init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let Some(path) = path.or_else(DashboardConfig::default_path) else {
        bail!("no config directory on this platform; pass --path");
    };
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let toml = DashboardConfig::default().to_toml()?;
    std::fs::write(&path, toml).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn run_config_show(config_path: Option<&Path>, path_only: bool) -> Result<()> {
    let source = config_path
        .map(Path::to_path_buf)
        .or_else(|| DashboardConfig::default_path().filter(|p| p.exists()));
    if path_only {
        match &source {
            Some(path) => println!("{}", path.display()),
            None => println!("(built-in defaults)"),
        }
        return Ok(());
    }
    let config = load_config(config_path)?;
    if let Some(path) = &source {
        println!("# {}", path.display());
    }
    print!("{}", config.to_toml()?);
    Ok(())
}

fn join_symbols(symbols: &[Symbol]) -> String {
    symbols.iter().map(Symbol::as_str).collect::<Vec<_>>().join(", ")
}

/// Plain-text summary table with right-aligned numeric columns.
fn summary_table(rows: &[SummaryRow]) -> String {
    let headers = ["Symbol", "Last Close", "Change", "Volume", "Last Date"];
    let cells: Vec<[String; 5]> = rows
        .iter()
        .map(|r| {
            [
                r.symbol.to_string(),
                format::price(r.last_close),
                format::percent(r.change_pct),
                format::volume(r.last_volume),
                r.last_date.to_string(),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let mut out = String::new();
    let line = |cols: [&str; 5]| {
        format!(
            "{:<w0$}  {:>w1$}  {:>w2$}  {:>w3$}  {:<w4$}\n",
            cols[0],
            cols[1],
            cols[2],
            cols[3],
            cols[4],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
            w3 = widths[3],
            w4 = widths[4],
        )
    };
    out.push_str(&line(headers));
    out.push_str(&format!("{}\n", "-".repeat(widths.iter().sum::<usize>() + 8)));
    for row in &cells {
        out.push_str(&line([&row[0], &row[1], &row[2], &row[3], &row[4]]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn selection(args: &[&str]) -> Selection {
        let mut argv = vec!["tickerboard-cli", "summary"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Summary { selection } => selection,
            _ => unreachable!(),
        }
    }

    #[test]
    fn parses_summary_selection() {
        let s = selection(&["AAPL", "MSFT", "--period", "1Y"]);
        assert_eq!(s.symbols, ["AAPL", "MSFT"]);
        assert_eq!(s.period, Some(Period::OneYear));
        assert!(!s.crypto);
    }

    #[test]
    fn start_requires_end_and_excludes_period() {
        let argv = ["tickerboard-cli", "summary", "--start", "2024-01-01"];
        assert!(Cli::try_parse_from(argv).is_err());
        let argv = [
            "tickerboard-cli", "summary", "--period", "1M", "--start", "2024-01-01", "--end", "2024-02-01",
        ];
        assert!(Cli::try_parse_from(argv).is_err());
        let argv = ["tickerboard-cli", "summary", "--start", "2024-13-01", "--end", "2024-02-01"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn export_parses_format() {
        let argv = [
            "tickerboard-cli", "export", "BTC-USD", "--crypto", "--format", "parquet", "--out", "x.pq", "--summary",
        ];
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Export { format, summary, selection, .. } => {
                assert_eq!(format, ExportFormat::Parquet);
                assert!(summary);
                assert!(selection.crypto);
            }
            _ => panic!("expected export"),
        }
        let bad = ["tickerboard-cli", "export", "--format", "xlsx", "--out", "x"];
        assert!(Cli::try_parse_from(bad).is_err());
    }

    #[test]
    fn default_symbols_follow_asset_class() {
        let config = DashboardConfig::default();
        let stocks = resolve_symbols(&config, &selection(&[]));
        assert_eq!(stocks, config.default_selection(AssetClass::Stocks));
        let crypto = resolve_symbols(&config, &selection(&["--crypto"]));
        assert_eq!(crypto, config.default_selection(AssetClass::Crypto));
        let explicit = resolve_symbols(&config, &selection(&["TSLA", " ", "TSLA"]));
        assert_eq!(explicit, vec![Symbol::new("TSLA").unwrap()]);
    }

    #[test]
    fn range_from_preset_or_custom_bounds() {
        let config = DashboardConfig::default();
        let r = resolve_selection_range(&config, &selection(&["--period", "1M"]), d(3, 31)).unwrap();
        assert_eq!((r.start(), r.end()), (d(3, 1), d(3, 31)));

        let r = resolve_selection_range(
            &config,
            &selection(&["--start", "2024-01-02", "--end", "2024-02-01"]),
            d(6, 1),
        )
        .unwrap();
        assert_eq!((r.start(), r.end()), (d(1, 2), d(2, 1)));

        let inverted = selection(&["--start", "2024-02-01", "--end", "2024-01-02"]);
        assert!(resolve_selection_range(&config, &inverted, d(6, 1)).is_err());
        assert!(resolve_selection_range(&config, &selection(&["--period", "custom"]), d(6, 1)).is_err());
    }

    #[test]
    fn table_aligns_columns_and_marks_missing_values() {
        let rows = vec![
            SummaryRow {
                symbol: Symbol::new("AAPL").unwrap(),
                last_close: Some(1234.5),
                change_pct: Some(21.0),
                last_volume: Some(1_500_000),
                last_date: d(1, 31),
            },
            SummaryRow {
                symbol: Symbol::new("XAUUSD=X").unwrap(),
                last_close: None,
                change_pct: None,
                last_volume: None,
                last_date: d(1, 31),
            },
        ];
        let table = summary_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].contains("1,234.50") && lines[2].contains("+21.00%") && lines[2].contains("1,500,000"));
        assert!(lines[3].contains("n/a"));
        let widths: Vec<usize> = lines.iter().map(|l| l.len()).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]));
    }
}

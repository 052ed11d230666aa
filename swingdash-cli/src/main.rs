//! SwingDash CLI: ticker analysis, daily movers and comparison tables.
//!
//! Commands:
//! - `analyze`: indicators, signal, levels and fundamentals for one ticker
//! - `movers`: top gainers and losers across the configured universe
//! - `compare`: 2 to 10 tickers side by side
//! - `config show` / `config init`: print or write the effective configuration
//!
//! Logs go to stderr (`RUST_LOG` overrides the default `swingdash=info`);
//! tables go to stdout.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use swingdash_core::cache::SystemClock;
use swingdash_core::compare::Comparison;
use swingdash_core::data::{
    CachedProvider, CachedSnapshotProvider, CircuitBreaker, CsvProvider, DataSource, MarketDataProvider,
    NullSnapshotProvider, ScreenerProvider, SnapshotProvider, SyntheticProvider, YahooProvider,
};
use swingdash_core::format::{display_or_na, format_pct, indian_grouping, DomesticUnit};
use swingdash_core::indicators::IndicatorRow;
use swingdash_core::ranking::{LogProgress, MoverBoard, MoverRecord};
use swingdash_core::{AnalysisReport, Dashboard, DashboardConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = "swingdash.toml";

type AppDashboard = Dashboard<CachedProvider<Arc<dyn MarketDataProvider>>, CachedSnapshotProvider<Arc<dyn SnapshotProvider>>>;

#[derive(Parser)]
#[command(name = "swingdash", about = "SwingDash: swing-trading signals, levels and fundamentals")]
struct Cli {
    /// Path to a TOML config file. Defaults to ./swingdash.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Market data source: yahoo, csv or synthetic.
    #[arg(long, global = true, default_value = "yahoo")]
    source: DataSource,

    /// Directory of {SYMBOL}.csv files for --source csv.
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    /// Unit for domestic-currency amounts: crore or lakh.
    #[arg(long, global = true)]
    unit: Option<DomesticUnit>,

    /// Print JSON instead of tables.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one ticker (e.g. RELIANCE, TCS.NS, AAPL).
    Analyze {
        ticker: String,

        /// Skip the screener.in fundamentals scrape.
        #[arg(long, default_value_t = false)]
        no_screener: bool,

        /// Number of recent indicator rows to print.
        #[arg(long, default_value_t = 5)]
        rows: usize,
    },
    /// Top gainers and losers across the configured universe.
    Movers {
        /// Override the configured number of names per side.
        #[arg(long)]
        top: Option<usize>,
    },
    /// Compare 2 to 10 tickers side by side.
    Compare {
        #[arg(required = true, num_args = 1..)]
        tickers: Vec<String>,
    },
    /// Configuration commands.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
    /// Write the default configuration to a file.
    Init {
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(unit) = cli.unit {
        config.display.unit = unit;
    }

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                print!("{}", config.to_toml()?);
                Ok(())
            }
            ConfigAction::Init { path, force } => run_config_init(&path, force),
        },
        Commands::Analyze {
            ticker,
            no_screener,
            rows,
        } => {
            let dashboard = build_dashboard(config, cli.source, &cli.data_dir, !no_screener)?;
            run_analyze(&dashboard, &ticker, rows, cli.json)
        }
        Commands::Movers { top } => {
            if let Some(n) = top {
                config.ranking.top_n = n;
            }
            let dashboard = build_dashboard(config, cli.source, &cli.data_dir, false)?;
            run_movers(&dashboard, cli.json)
        }
        Commands::Compare { tickers } => {
            let dashboard = build_dashboard(config, cli.source, &cli.data_dir, false)?;
            run_compare(&dashboard, &tickers, cli.json)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("swingdash=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    match path {
        Some(path) => DashboardConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            Ok(DashboardConfig::from_file(Path::new(DEFAULT_CONFIG_FILE))?)
        }
        None => Ok(DashboardConfig::default()),
    }
}

fn run_config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (pass --force to overwrite)", path.display());
    }
    std::fs::write(path, DashboardConfig::default().to_toml()?)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn build_dashboard(
    config: DashboardConfig,
    source: DataSource,
    data_dir: &Path,
    screener: bool,
) -> Result<AppDashboard> {
    let provider: Arc<dyn MarketDataProvider> = match source {
        DataSource::Yahoo => {
            let breaker = Arc::new(CircuitBreaker::default_provider("yahoo"));
            Arc::new(YahooProvider::new(&config.provider, breaker)?)
        }
        DataSource::Csv => {
            if !data_dir.is_dir() {
                bail!("data directory not found: {}", data_dir.display());
            }
            Arc::new(CsvProvider::new(data_dir))
        }
        DataSource::Synthetic => Arc::new(SyntheticProvider::today()),
    };
    debug!(source = ?source, provider = provider.name(), "market data ready");
    let snapshots: Arc<dyn SnapshotProvider> = if screener && source == DataSource::Yahoo {
        Arc::new(ScreenerProvider::new(&config.provider)?)
    } else {
        Arc::new(NullSnapshotProvider)
    };

    let clock = Arc::new(SystemClock);
    let provider = CachedProvider::new(provider, config.cache.history_ttl(), clock.clone());
    let snapshots = CachedSnapshotProvider::new(snapshots, config.cache.snapshot_ttl(), clock.clone());
    Ok(Dashboard::new(provider, snapshots, config, clock))
}

// ---------------------------------------------------------------------------
// analyze
// ---------------------------------------------------------------------------

fn run_analyze(dashboard: &AppDashboard, ticker: &str, rows: usize, as_json: bool) -> Result<()> {
    let report = dashboard.analyze(ticker)?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&report_json(&report, rows))?);
    } else {
        print_report(&report, rows);
    }
    Ok(())
}

fn report_json(report: &AnalysisReport, rows: usize) -> serde_json::Value {
    json!({
        "input": report.input,
        "resolved": report.resolved,
        "attempts": report.attempts,
        "close": report.close(),
        "change_pct": report.change_pct(),
        "pattern": report.pattern,
        "signal": report.signal,
        "indicators": report.frame.tail_rows(rows),
        "levels": report.levels,
        "fundamentals": report.fundamentals,
        "screener": report.screener,
    })
}

fn print_report(report: &AnalysisReport, rows: usize) {
    println!();
    println!("=== {} ===", report.resolved);
    if report.attempts.len() > 1 {
        println!("Resolved '{}' after trying: {}", report.input, report.attempts.join(", "));
    }
    println!(
        "Close:    {}   Change: {}",
        report.close().map(|c| indian_grouping(c, 2)).unwrap_or_else(|| "NA".into()),
        report.change_pct().map(format_pct).unwrap_or_else(|| "NA".into())
    );
    println!("Signal:   {} | {}", report.signal.action, report.signal.strength);
    println!("Pattern:  {}", report.pattern);

    println!();
    println!("--- Votes ---");
    for ballot in &report.signal.ballots {
        let vote = ballot.vote.map(|v| format!("{v:?}")).unwrap_or_else(|| "-".into());
        println!("{:<12} {vote}", ballot.check.label());
    }
    println!(
        "Tally: {} buy / {} sell",
        report.signal.tally.buy, report.signal.tally.sell
    );

    println!();
    println!("--- Indicators ---");
    println!(
        "{:<10} {:>10} {:>10} {:>10} {:>7} {:>8} {:>8} {:>8} {:>7} {:>10} {:>10}",
        "Date", "Close", "EMA10", "EMA20", "RSI", "MACD", "Signal", "ATR", "ADX", "BB Upper", "BB Lower"
    );
    println!("{}", "-".repeat(110));
    for row in report.frame.tail_rows(rows) {
        print_indicator_row(&row);
    }

    if let Some(levels) = &report.levels {
        println!();
        println!("--- Levels ---");
        for (label, price) in levels.pivots.rows() {
            println!("{label:<16} {}", display_or_na(Some(price)));
        }
        println!("{:<16} {}", "Stop Loss", display_or_na(levels.stop_loss));
        for target in &levels.targets {
            println!("{:<16} {}", target.label, display_or_na(Some(target.price)));
        }
    }

    println!();
    println!("--- Fundamentals ---");
    match &report.fundamentals {
        Some(snapshot) => {
            for (label, value) in &snapshot.rows {
                println!("{label:<22} {value}");
            }
            for flag in &snapshot.score.flags {
                println!("  + {flag}");
            }
        }
        None => println!("unavailable"),
    }

    if let Some(scraped) = &report.screener {
        println!();
        println!("--- Screener ---");
        for (label, value) in scraped {
            println!("{label:<28} {value}");
        }
    }
    println!();
}

fn print_indicator_row(row: &IndicatorRow) {
    println!(
        "{:<10} {:>10} {:>10} {:>10} {:>7} {:>8} {:>8} {:>8} {:>7} {:>10} {:>10}",
        row.bar.date.format("%Y-%m-%d").to_string(),
        display_or_na(Some(row.bar.close)),
        display_or_na(row.ema_fast),
        display_or_na(row.ema_slow),
        display_or_na(row.rsi),
        display_or_na(row.macd),
        display_or_na(row.macd_signal),
        display_or_na(row.atr),
        display_or_na(row.adx),
        display_or_na(row.bb_upper),
        display_or_na(row.bb_lower),
    );
}

// ---------------------------------------------------------------------------
// movers
// ---------------------------------------------------------------------------

fn run_movers(dashboard: &AppDashboard, as_json: bool) -> Result<()> {
    let progress = LogProgress;
    let board = dashboard.movers(Some(&progress), None);
    if as_json {
        println!("{}", serde_json::to_string_pretty(&*board)?);
    } else {
        print_movers(&board);
    }
    Ok(())
}

fn print_movers(board: &MoverBoard) {
    println!();
    println!("=== Top Gainers ===");
    print_mover_table(&board.gainers);
    println!();
    println!("=== Top Losers ===");
    print_mover_table(&board.losers);
    println!();
    println!(
        "Ranked {} of {} symbols ({} failed)",
        board.ranked.len(),
        board.total,
        board.failure_count()
    );
    for (symbol, reason) in &board.failures {
        println!("  {symbol}: {reason}");
    }
}

fn print_mover_table(records: &[MoverRecord]) {
    println!("{:<16} {:<28} {:>12} {:>10} {:>9}", "Symbol", "Name", "Price", "Change", "Change%");
    println!("{}", "-".repeat(79));
    for r in records {
        println!(
            "{:<16} {:<28} {:>12} {:>10} {:>9}",
            r.symbol,
            r.name,
            display_or_na(Some(r.price)),
            display_or_na(Some(r.change)),
            format_pct(r.change_pct)
        );
    }
}

// ---------------------------------------------------------------------------
// compare
// ---------------------------------------------------------------------------

fn run_compare(dashboard: &AppDashboard, tickers: &[String], as_json: bool) -> Result<()> {
    let comparison = dashboard.compare(tickers)?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
    } else {
        print_comparison(&comparison);
    }
    Ok(())
}

fn print_comparison(comparison: &Comparison) {
    println!();
    println!(
        "{:<12} {:<14} {:>10} {:>8} {:>7} {:>7} {:<6} {:<18} {:<18} {:>7} {:>6}",
        "Input", "Symbol", "Close", "Chg%", "RSI", "ADX", "Signal", "Strength", "Pattern", "P/E", "Score"
    );
    println!("{}", "-".repeat(124));
    for row in &comparison.rows {
        match &row.outcome {
            Ok(m) => println!(
                "{:<12} {:<14} {:>10} {:>8} {:>7} {:>7} {:<6} {:<18} {:<18} {:>7} {:>6}",
                row.input,
                m.resolved,
                display_or_na(m.close),
                m.change_pct.map(format_pct).unwrap_or_else(|| "NA".into()),
                display_or_na(m.rsi),
                display_or_na(m.adx),
                m.action.to_string(),
                m.strength.to_string(),
                m.pattern.to_string(),
                display_or_na(m.pe),
                m.score.map(|s| format!("{s}/6")).unwrap_or_else(|| "NA".into()),
            ),
            Err(reason) => println!("{:<12} unavailable: {reason}", row.input),
        }
    }
    println!();
}

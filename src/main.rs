use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use backtester::Backtester;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use core_types::{Candle, Period};
use market_feed::{MarketFeed, MarketProjection};
use storage::{ConfigStore, ExportDocument, JsonFileStore, SavedConfig};
use strategies::params::TradingStrategy;

/// The main entry point for the Uptick dashboard core.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Backtest(args) => handle_backtest(args),
        Commands::Watch(args) => handle_watch(args).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Market-data distribution and backtesting core for the Uptick dashboard.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a strategy against historical candles and print the report.
    Backtest(BacktestArgs),
    /// Connect to the live feed and log one market's updates until ctrl-c.
    Watch(WatchArgs),
}

#[derive(Parser)]
struct BacktestArgs {
    /// Path to a JSON array of candles.
    #[arg(long)]
    candles: PathBuf,

    /// Path to a JSON strategy definition.
    #[arg(long, conflicts_with = "config")]
    strategy: Option<PathBuf>,

    /// Name of a saved configuration to run instead of an explicit strategy.
    #[arg(long)]
    config: Option<String>,

    /// Path of the saved-configuration store.
    #[arg(long, default_value = "configs.json")]
    store: PathBuf,

    /// Lookback period label recorded with the run (1M, 3M, 6M, 1Y).
    #[arg(long, default_value = "3M")]
    period: Period,

    /// Starting capital for the simulation.
    #[arg(long, default_value_t = 1_000_000.0)]
    capital: f64,

    /// Write the full result as a self-contained JSON export.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Save the run under this name in the configuration store.
    #[arg(long)]
    save: Option<String>,
}

#[derive(Parser)]
struct WatchArgs {
    /// Market code to watch (e.g. "KRW-BTC").
    #[arg(long, default_value = "KRW-BTC")]
    market: String,
}

// ==============================================================================
// Backtest Command Logic
// ==============================================================================

fn handle_backtest(args: BacktestArgs) -> anyhow::Result<()> {
    let settings = configuration::load_settings()?;
    let store = JsonFileStore::new(&args.store);

    let (strategy, period, capital) = match (&args.strategy, &args.config) {
        (Some(path), None) => {
            let raw = fs::read_to_string(path)?;
            let strategy: TradingStrategy = serde_json::from_str(&raw)?;
            (strategy, args.period, args.capital)
        }
        (None, Some(name)) => {
            let saved = store.get(name)?;
            (saved.strategy, saved.period, saved.initial_capital)
        }
        _ => anyhow::bail!("exactly one of --strategy or --config is required"),
    };
    strategy.validate()?;

    let raw = fs::read_to_string(&args.candles)?;
    let candles: Vec<Candle> = serde_json::from_str(&raw)?;
    tracing::info!(market = %strategy.market, bars = candles.len(), "running backtest");

    let result = Backtester::new(settings.simulation).run(&strategy.params, &candles, capital)?;
    print_report(&result.report);

    if let Some(path) = &args.export {
        let doc = ExportDocument::new(strategy.clone(), period, capital, result.clone());
        fs::write(path, doc.to_json()?)?;
        println!("Exported full result to {}", path.display());
    }

    if let Some(name) = &args.save {
        store.upsert(SavedConfig {
            name: name.clone(),
            strategy,
            period,
            initial_capital: capital,
            created_at: chrono::Utc::now(),
            result: Some(result),
        })?;
        println!("Saved configuration '{name}' to {}", args.store.display());
    }

    Ok(())
}

fn print_report(report: &analytics::PerformanceReport) {
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Total profit".to_string(), format!("{:.2}", report.total_profit)]);
    table.add_row(vec!["Profit rate".to_string(), format!("{:.2}%", report.profit_rate)]);
    table.add_row(vec!["Trades".to_string(), report.total_trades.to_string()]);
    table.add_row(vec![
        "Win rate".to_string(),
        format!("{:.1}% ({}/{})", report.win_rate, report.win_count, report.total_trades),
    ]);
    table.add_row(vec!["Profit factor".to_string(), format!("{:.2}", report.profit_factor)]);
    table.add_row(vec!["Expectancy".to_string(), format!("{:.2}", report.expectancy)]);
    table.add_row(vec!["Max drawdown".to_string(), format!("{:.2}%", report.max_drawdown)]);
    table.add_row(vec!["Sharpe ratio".to_string(), format!("{:.2}", report.sharpe_ratio)]);
    table.add_row(vec!["Recovery factor".to_string(), format!("{:.2}", report.recovery_factor)]);
    println!("{table}");

    if !report.monthly_returns.is_empty() {
        let mut monthly = Table::new();
        monthly.set_header(vec!["Month", "Profit", "Rate", "Trades"]);
        for row in &report.monthly_returns {
            monthly.add_row(vec![
                row.month.clone(),
                format!("{:.2}", row.profit),
                format!("{:.2}%", row.profit_rate),
                row.trades.to_string(),
            ]);
        }
        println!("{monthly}");
    }
}

// ==============================================================================
// Watch Command Logic
// ==============================================================================

async fn handle_watch(args: WatchArgs) -> anyhow::Result<()> {
    let settings = configuration::load_settings()?;
    let feed = MarketFeed::new(settings.feed);

    feed.add_status_observer(|state| {
        tracing::info!(?state, "feed status");
    });
    feed.connect();
    let projection = MarketProjection::bind(&feed, args.market.clone());

    let mut ticker_log = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = ticker_log.tick() => {
                if let Some(ticker) = projection.ticker() {
                    tracing::info!(
                        market = %args.market,
                        price = ticker.trade_price,
                        change_rate = ticker.signed_change_rate,
                        trades_held = projection.trades().len(),
                        "tick"
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    drop(projection);
    feed.disconnect();
    Ok(())
}

//! Folio CLI - Command line interface for portfolio ledger and analytics.
//!
//! This binary provides JSON output for integration with callers. Price data
//! comes from a JSON fixture file passed with `--prices` (see
//! `StaticProvider`); the ledger lives at `FOLIO_LEDGER_FILE` or
//! `~/.folio/ledger.json`.

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde_json::json;

use folio_core::{
    calendar::WeekdayCalendar,
    ledger::{LedgerStore, PositionFilter},
    provider::StaticProvider,
    queries, ApiResponse,
};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Portfolio ledger and valuation analytics")]
#[command(version)]
struct Cli {
    /// Path to a JSON price fixture file (required for valuation queries)
    #[arg(long, global = true)]
    prices: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ledger management commands
    Ledger {
        #[command(subcommand)]
        action: LedgerAction,
    },
    /// Portfolio analytics queries
    Query {
        #[command(subcommand)]
        action: QueryAction,
    },
    /// Instrument lookups
    Stock {
        #[command(subcommand)]
        action: StockAction,
    },
}

#[derive(Subcommand)]
enum LedgerAction {
    /// Create a new ledger
    Init {
        /// Starting cash balance
        #[arg(short, long)]
        balance: f64,
    },
    /// Record a cash deposit (negative for withdrawal)
    Deposit {
        /// Amount to deposit
        #[arg(short, long)]
        amount: f64,
    },
    /// Buy shares at the live quote
    Buy {
        /// Stock symbol
        #[arg(short, long)]
        symbol: String,
        /// Number of shares
        #[arg(short = 'n', long)]
        quantity: u32,
    },
    /// Sell shares at the live quote
    Sell {
        /// Stock symbol
        #[arg(short, long)]
        symbol: String,
        /// Number of shares
        #[arg(short = 'n', long)]
        quantity: u32,
    },
    /// List open positions aggregated by symbol
    Positions,
    /// Ledger status summary
    Status,
}

#[derive(Subcommand)]
enum QueryAction {
    /// Current total portfolio value
    Balance,
    /// Portfolio value per session as [unix_millis, value] pairs
    History,
    /// Day-over-day percent change per session
    Change,
    /// Sortino ratio of daily returns
    Sortino,
    /// Beta against a benchmark instrument
    Beta {
        /// Benchmark symbol
        #[arg(short, long)]
        benchmark: String,
    },
    /// Sector concentration of positions
    Sectors,
    /// Net long/short exposure
    Exposure,
}

#[derive(Subcommand)]
enum StockAction {
    /// Latest quoted price
    Quote {
        /// Stock symbol
        #[arg(short, long)]
        symbol: String,
    },
    /// Historical closes as [unix_millis, value] pairs
    Chart {
        /// Stock symbol
        #[arg(short, long)]
        symbol: String,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: String,
    },
    /// Search known instruments by symbol substring
    Search {
        /// Symbol substring
        #[arg(short, long)]
        query: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let output = match cli.command {
        Commands::Ledger { action } => handle_ledger(action, cli.prices),
        Commands::Query { action } => handle_query(action, cli.prices),
        Commands::Stock { action } => handle_stock(action, cli.prices),
    };

    println!("{}", output);
}

fn err_json(error: impl ToString) -> String {
    serde_json::to_string_pretty(&ApiResponse::<()>::err(error.to_string())).unwrap()
}

fn load_provider(prices: Option<PathBuf>) -> Result<StaticProvider, String> {
    let path = prices.ok_or("price fixture required: pass --prices <file>")?;
    StaticProvider::from_file(&path).map_err(|e| e.to_string())
}

fn load_store() -> Result<LedgerStore, String> {
    LedgerStore::load(LedgerStore::default_path()).map_err(|e| e.to_string())
}

fn handle_ledger(action: LedgerAction, prices: Option<PathBuf>) -> String {
    match action {
        LedgerAction::Init { balance } => {
            match LedgerStore::create(LedgerStore::default_path(), balance) {
                Ok(store) => serde_json::to_string_pretty(&ApiResponse::ok(json!({
                    "portfolio_id": store.portfolio_id(),
                    "starting_balance": balance,
                })))
                .unwrap(),
                Err(e) => err_json(e),
            }
        }
        LedgerAction::Deposit { amount } => {
            let mut store = match load_store() {
                Ok(store) => store,
                Err(e) => return err_json(e),
            };
            let id = store.portfolio_id();
            match store.deposit(id, amount, Utc::now()) {
                Ok(transaction) => {
                    if let Err(e) = store.save() {
                        return err_json(e);
                    }
                    serde_json::to_string_pretty(&ApiResponse::ok(json!({
                        "transaction": transaction,
                        "cash": store.cash_balance(id).ok(),
                    })))
                    .unwrap()
                }
                Err(e) => err_json(e),
            }
        }
        LedgerAction::Buy { symbol, quantity } => {
            let provider = match load_provider(prices) {
                Ok(provider) => provider,
                Err(e) => return err_json(e),
            };
            let mut store = match load_store() {
                Ok(store) => store,
                Err(e) => return err_json(e),
            };
            let id = store.portfolio_id();
            match store.buy(id, &symbol, quantity, &provider, Utc::now()) {
                Ok(position) => {
                    if let Err(e) = store.save() {
                        return err_json(e);
                    }
                    serde_json::to_string_pretty(&ApiResponse::ok(json!({
                        "position": position,
                        "cash": store.cash_balance(id).ok(),
                    })))
                    .unwrap()
                }
                Err(e) => err_json(e),
            }
        }
        LedgerAction::Sell { symbol, quantity } => {
            let provider = match load_provider(prices) {
                Ok(provider) => provider,
                Err(e) => return err_json(e),
            };
            let mut store = match load_store() {
                Ok(store) => store,
                Err(e) => return err_json(e),
            };
            let id = store.portfolio_id();
            match store.sell(id, &symbol, quantity, &provider, Utc::now()) {
                Ok(closed) => {
                    if let Err(e) = store.save() {
                        return err_json(e);
                    }
                    serde_json::to_string_pretty(&ApiResponse::ok(json!({
                        "closed": closed,
                        "cash": store.cash_balance(id).ok(),
                    })))
                    .unwrap()
                }
                Err(e) => err_json(e),
            }
        }
        LedgerAction::Positions => {
            let store = match load_store() {
                Ok(store) => store,
                Err(e) => return err_json(e),
            };
            match queries::open_positions(store.portfolio_id(), &store) {
                Ok(positions) => serde_json::to_string_pretty(&ApiResponse::ok(json!({
                    "positions": positions,
                })))
                .unwrap(),
                Err(e) => err_json(e),
            }
        }
        LedgerAction::Status => {
            let store = match load_store() {
                Ok(store) => store,
                Err(e) => return err_json(e),
            };
            let id = store.portfolio_id();
            let open = store
                .positions(id, PositionFilter::Open)
                .map(|p| p.len())
                .unwrap_or(0);
            let transactions = store.transactions(id).map(|t| t.len()).unwrap_or(0);
            serde_json::to_string_pretty(&ApiResponse::ok(json!({
                "portfolio_id": id,
                "cash": store.cash_balance(id).ok(),
                "open_positions": open,
                "transactions": transactions,
            })))
            .unwrap()
        }
    }
}

fn handle_query(action: QueryAction, prices: Option<PathBuf>) -> String {
    let provider = match load_provider(prices) {
        Ok(provider) => provider,
        Err(e) => return err_json(e),
    };
    let store = match load_store() {
        Ok(store) => store,
        Err(e) => return err_json(e),
    };
    let id = store.portfolio_id();
    let calendar = WeekdayCalendar;
    let now = Utc::now();

    match action {
        QueryAction::Balance => match queries::balance(id, &store, &provider, &calendar, now) {
            Ok(value) => {
                serde_json::to_string_pretty(&ApiResponse::ok(json!({ "balance": value })))
                    .unwrap()
            }
            Err(e) => err_json(e),
        },
        QueryAction::History => match queries::history(id, &store, &provider, &calendar, now) {
            Ok(series) => serde_json::to_string_pretty(&ApiResponse::ok(json!({
                "history": series.to_pairs(),
            })))
            .unwrap(),
            Err(e) => err_json(e),
        },
        QueryAction::Change => match queries::change(id, &store, &provider, &calendar, now) {
            Ok(series) => serde_json::to_string_pretty(&ApiResponse::ok(json!({
                "change": series.to_pairs(),
            })))
            .unwrap(),
            Err(e) => err_json(e),
        },
        QueryAction::Sortino => match queries::sortino(id, &store, &provider, &calendar, now) {
            Ok(ratio) => serde_json::to_string_pretty(&ApiResponse::ok(json!({
                // NaN marks a degenerate downside; JSON has no NaN literal
                "sortino": if ratio.is_nan() { None } else { Some(ratio) },
            })))
            .unwrap(),
            Err(e) => err_json(e),
        },
        QueryAction::Beta { benchmark } => {
            match queries::beta(id, &store, &provider, &calendar, now, &benchmark) {
                Ok(value) => serde_json::to_string_pretty(&ApiResponse::ok(json!({
                    "benchmark": benchmark,
                    "beta": if value.is_nan() { None } else { Some(value) },
                })))
                .unwrap(),
                Err(e) => err_json(e),
            }
        }
        QueryAction::Sectors => match queries::sectors(id, &store, &provider) {
            Ok(shares) => serde_json::to_string_pretty(&ApiResponse::ok(json!({
                "sectors": shares,
            })))
            .unwrap(),
            Err(e) => err_json(e),
        },
        QueryAction::Exposure => {
            match queries::net_exposure(id, &store, &provider, &calendar, now) {
                Ok(value) => serde_json::to_string_pretty(&ApiResponse::ok(json!({
                    "net_exposure": if value.is_nan() { None } else { Some(value) },
                })))
                .unwrap(),
                Err(e) => err_json(e),
            }
        }
    }
}

fn handle_stock(action: StockAction, prices: Option<PathBuf>) -> String {
    match action {
        StockAction::Quote { symbol } => {
            let provider = match load_provider(prices) {
                Ok(provider) => provider,
                Err(e) => return err_json(e),
            };
            match queries::latest_price(&provider, &symbol) {
                Ok(price) => serde_json::to_string_pretty(&ApiResponse::ok(json!({
                    "symbol": symbol.to_uppercase(),
                    "latest_price": price,
                })))
                .unwrap(),
                Err(e) => err_json(e),
            }
        }
        StockAction::Chart { symbol, start, end } => {
            let provider = match load_provider(prices) {
                Ok(provider) => provider,
                Err(e) => return err_json(e),
            };
            let (start, end) = match (parse_date(&start), parse_date(&end)) {
                (Ok(start), Ok(end)) => (start, end),
                (Err(e), _) | (_, Err(e)) => return err_json(e),
            };
            match queries::chart(&provider, &symbol, start, end) {
                Ok(series) => serde_json::to_string_pretty(&ApiResponse::ok(json!({
                    "symbol": symbol.to_uppercase(),
                    "chart": series.to_pairs(),
                })))
                .unwrap(),
                Err(e) => err_json(e),
            }
        }
        StockAction::Search { query } => {
            let store = match load_store() {
                Ok(store) => store,
                Err(e) => return err_json(e),
            };
            let instruments = queries::instruments(&store, query.as_deref());
            serde_json::to_string_pretty(&ApiResponse::ok(json!({
                "instruments": instruments,
            })))
            .unwrap()
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date '{}': {}", s, e))
}

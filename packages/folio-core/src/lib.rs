//! Folio Core - Portfolio valuation and analytics library.
//!
//! This crate reconstructs a portfolio's value over time from a sparse
//! transaction ledger and per-instrument price history:
//!
//! - **Ledger**: append-only transactions and positions with JSON persistence
//! - **Balance reconstruction**: cash balance per trading session
//! - **Position valuation**: mark-to-market overlay per position
//! - **Analytics**: percent change, Sortino ratio, beta, net exposure,
//!   sector concentration
//!
//! # Example
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use folio_core::calendar::WeekdayCalendar;
//! use folio_core::ledger::LedgerStore;
//! use folio_core::provider::StaticProvider;
//! use folio_core::queries;
//!
//! let store = LedgerStore::in_memory(10_000.0);
//! let provider = StaticProvider::new();
//! let calendar = WeekdayCalendar;
//!
//! let history = queries::history(store.portfolio_id(), &store, &provider, &calendar, Utc::now())
//!     .expect("valuation failed");
//! println!("{} sessions valued", history.len());
//! ```

pub mod analytics;
pub mod calendar;
pub mod ledger;
pub mod provider;
pub mod queries;
pub mod series;
pub mod types;
pub mod valuation;

// Re-export commonly used types
pub use series::DailySeries;
pub use types::{
    ApiResponse, Direction, Instrument, Portfolio, Position, Quote, SectorShare, Transaction,
};

// Re-export main functionality
pub use analytics::{beta, net_exposure, sector_shares, sortino};
pub use calendar::{TradingCalendar, WeekdayCalendar};
pub use ledger::{LedgerStore, PositionFilter};
pub use provider::{PriceProvider, StaticProvider};
pub use valuation::{reconstruct_balance, value_positions};

/// Error types for folio-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no price data for {symbol}")]
    NoData { symbol: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("degenerate statistic: {0}")]
    DegenerateStatistic(String),

    #[error("position not found: {0}")]
    PositionNotFound(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),
}

/// Result type for folio-core operations.
pub type Result<T> = std::result::Result<T, Error>;

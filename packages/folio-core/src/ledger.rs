//! Ledger state and JSON persistence.
//!
//! The store holds one portfolio's append-only transaction and position
//! ledger plus the instruments referenced by it. Reads are keyed by an
//! explicit portfolio id; there is no implicit "first portfolio" lookup.
//! Mutations take an explicit timestamp so callers (and tests) control the
//! clock.

use std::env;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provider::PriceProvider;
use crate::types::{Direction, Instrument, Portfolio, Position, Transaction};
use crate::{Error, Result};

/// Filter for position reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionFilter {
    All,
    Open,
    Closed,
}

/// Serialized ledger state.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LedgerState {
    portfolio: Portfolio,
    instruments: Vec<Instrument>,
    transactions: Vec<Transaction>,
    positions: Vec<Position>,
}

impl LedgerState {
    fn new(portfolio: Portfolio) -> Self {
        Self {
            portfolio,
            instruments: Vec::new(),
            transactions: Vec::new(),
            positions: Vec::new(),
        }
    }
}

/// Ledger store that manages one portfolio and persists to JSON.
#[derive(Debug)]
pub struct LedgerStore {
    /// Path to the ledger JSON file; empty for in-memory stores
    path: PathBuf,
    state: LedgerState,
}

impl LedgerStore {
    /// Create an in-memory store (no persistence) with a fresh portfolio
    /// created now.
    pub fn in_memory(starting_balance: f64) -> Self {
        Self::in_memory_at(starting_balance, Utc::now())
    }

    /// Create an in-memory store with an explicit creation time.
    pub fn in_memory_at(starting_balance: f64, created_at: DateTime<Utc>) -> Self {
        Self {
            path: PathBuf::new(),
            state: LedgerState::new(Portfolio::new(1, starting_balance, created_at)),
        }
    }

    /// Create a new ledger at `path` and persist it.
    pub fn create(path: PathBuf, starting_balance: f64) -> Result<Self> {
        let mut store = Self {
            path,
            state: LedgerState::new(Portfolio::new(1, starting_balance, Utc::now())),
        };
        store.save()?;
        Ok(store)
    }

    /// Load an existing ledger from `path`.
    pub fn load(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("no ledger at {}", path.display())));
        }

        let content = fs::read_to_string(&path)?;
        let state: LedgerState = serde_json::from_str(&content)?;
        Ok(Self { path, state })
    }

    /// Get the default ledger file path.
    ///
    /// Default path: `~/.folio/ledger.json`.
    /// Can be overridden with the `FOLIO_LEDGER_FILE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("FOLIO_LEDGER_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".folio/ledger.json"))
            .unwrap_or_else(|| PathBuf::from("ledger.json"))
    }

    /// Save the current state to disk. No-op for in-memory stores.
    pub fn save(&mut self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&self.state)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// The id of the portfolio this store holds.
    pub fn portfolio_id(&self) -> u64 {
        self.state.portfolio.id
    }

    /// Look up a portfolio by id.
    pub fn portfolio(&self, portfolio_id: u64) -> Result<&Portfolio> {
        if self.state.portfolio.id != portfolio_id {
            return Err(Error::NotFound(format!("portfolio {}", portfolio_id)));
        }
        Ok(&self.state.portfolio)
    }

    /// All cash transactions for a portfolio, in insertion order.
    pub fn transactions(&self, portfolio_id: u64) -> Result<&[Transaction]> {
        self.portfolio(portfolio_id)?;
        Ok(&self.state.transactions)
    }

    /// Positions for a portfolio, filtered, ordered by opening time.
    pub fn positions(&self, portfolio_id: u64, filter: PositionFilter) -> Result<Vec<Position>> {
        self.portfolio(portfolio_id)?;
        let mut positions: Vec<Position> = self
            .state
            .positions
            .iter()
            .filter(|p| match filter {
                PositionFilter::All => true,
                PositionFilter::Open => p.is_open(),
                PositionFilter::Closed => !p.is_open(),
            })
            .cloned()
            .collect();
        positions.sort_by_key(|p| p.opened_at);
        Ok(positions)
    }

    /// All known instruments.
    pub fn instruments(&self) -> &[Instrument] {
        &self.state.instruments
    }

    /// Find an instrument by exact symbol.
    pub fn find_instrument(&self, symbol: &str) -> Option<&Instrument> {
        let symbol = symbol.to_uppercase();
        self.state.instruments.iter().find(|i| i.symbol == symbol)
    }

    /// Case-insensitive substring search over symbols, capped at 10 results.
    pub fn search_instruments(&self, query: &str) -> Vec<&Instrument> {
        let query = query.to_uppercase();
        self.state
            .instruments
            .iter()
            .filter(|i| i.symbol.contains(&query))
            .take(10)
            .collect()
    }

    /// Current cash balance: starting balance plus all transaction amounts.
    pub fn cash_balance(&self, portfolio_id: u64) -> Result<f64> {
        let portfolio = self.portfolio(portfolio_id)?;
        let delta: f64 = self.state.transactions.iter().map(|t| t.amount).sum();
        Ok(portfolio.starting_balance + delta)
    }

    /// Record a cash deposit (or withdrawal, with a negative amount).
    pub fn deposit(
        &mut self,
        portfolio_id: u64,
        amount: f64,
        at: DateTime<Utc>,
    ) -> Result<Transaction> {
        self.portfolio(portfolio_id)?;
        let transaction = Transaction::new(amount, at);
        self.state.transactions.push(transaction.clone());
        Ok(transaction)
    }

    /// Buy `quantity` shares of `symbol` at the live quote.
    ///
    /// One logical unit: quote the symbol, create the instrument if absent,
    /// open a long position, and append the matching negative cash
    /// transaction. Nothing is recorded if any step fails.
    pub fn buy(
        &mut self,
        portfolio_id: u64,
        symbol: &str,
        quantity: u32,
        provider: &impl PriceProvider,
        at: DateTime<Utc>,
    ) -> Result<Position> {
        self.portfolio(portfolio_id)?;

        if quantity == 0 {
            return Err(Error::InvalidOperation(
                "quantity must be positive".to_string(),
            ));
        }

        let quote = provider.latest_quote(symbol)?;
        let cost = quantity as f64 * quote.price;
        let cash = self.cash_balance(portfolio_id)?;
        if cost > cash {
            return Err(Error::InvalidOperation(format!(
                "insufficient cash: need ${:.2}, have ${:.2}",
                cost, cash
            )));
        }

        let symbol_upper = symbol.to_uppercase();
        if self.find_instrument(&symbol_upper).is_none() {
            self.state
                .instruments
                .push(Instrument::new(&symbol_upper, &quote.company_name));
        }

        let position = Position::new(&symbol_upper, quantity, Direction::Long, at, quote.price);
        self.state.positions.push(position.clone());
        self.state.transactions.push(Transaction::new(-cost, at));

        Ok(position)
    }

    /// Sell `quantity` shares of `symbol` at the live quote.
    ///
    /// Closes open long positions oldest-first. A position larger than the
    /// remaining quantity is split: the sold part becomes a closed record,
    /// the remainder stays open. Proceeds are appended as a positive cash
    /// transaction.
    pub fn sell(
        &mut self,
        portfolio_id: u64,
        symbol: &str,
        quantity: u32,
        provider: &impl PriceProvider,
        at: DateTime<Utc>,
    ) -> Result<Vec<Position>> {
        self.portfolio(portfolio_id)?;

        if quantity == 0 {
            return Err(Error::InvalidOperation(
                "quantity must be positive".to_string(),
            ));
        }

        let symbol_upper = symbol.to_uppercase();
        let open_quantity: u32 = self
            .state
            .positions
            .iter()
            .filter(|p| p.symbol == symbol_upper && p.is_open())
            .map(|p| p.quantity)
            .sum();

        if open_quantity == 0 {
            return Err(Error::PositionNotFound(symbol_upper));
        }
        if quantity > open_quantity {
            return Err(Error::InvalidOperation(format!(
                "cannot sell {} shares of {}, only {} open",
                quantity, symbol_upper, open_quantity
            )));
        }

        let quote = provider.latest_quote(&symbol_upper)?;

        // Oldest-first over open positions in this symbol
        let mut order: Vec<usize> = (0..self.state.positions.len())
            .filter(|&i| {
                let p = &self.state.positions[i];
                p.symbol == symbol_upper && p.is_open()
            })
            .collect();
        order.sort_by_key(|&i| self.state.positions[i].opened_at);

        let mut remaining = quantity;
        let mut closed = Vec::new();
        for i in order {
            if remaining == 0 {
                break;
            }
            let position = &mut self.state.positions[i];
            if position.quantity <= remaining {
                remaining -= position.quantity;
                position.closed_at = Some(at);
                closed.push(position.clone());
            } else {
                // Split: the sold part becomes its own closed record
                position.quantity -= remaining;
                let mut sold = position.clone();
                sold.quantity = remaining;
                sold.closed_at = Some(at);
                remaining = 0;
                closed.push(sold.clone());
                self.state.positions.push(sold);
            }
        }

        let proceeds = quantity as f64 * quote.price;
        self.state.transactions.push(Transaction::new(proceeds, at));

        Ok(closed)
    }
}

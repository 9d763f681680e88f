//! Price series provider interface.
//!
//! The valuation engine never talks to a market-data service directly; it
//! consumes this trait. Production implementations wrap a quote API,
//! [`StaticProvider`] serves fixtures for tests and offline use.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::Quote;
use crate::{Error, Result};

/// Source of historical closes and live quotes.
///
/// Implementations are expected to bound their own call time (network
/// timeouts included); the engines issue at most one call per instrument per
/// field and never retry.
pub trait PriceProvider {
    /// Daily closing prices for `symbol` over `[start, end]`, ascending.
    ///
    /// Fails with [`Error::NoData`] when the symbol is unknown or the range
    /// contains no sessions with data.
    fn daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, f64)>>;

    /// Current quote for `symbol`.
    ///
    /// Fails with [`Error::NotFound`] for unknown symbols.
    fn latest_quote(&self, symbol: &str) -> Result<Quote>;
}

/// One instrument's fixture data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstrumentData {
    /// Daily closes, ascending by date
    #[serde(default)]
    pub closes: Vec<(NaiveDate, f64)>,
    /// Live quote, if quoted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<Quote>,
}

/// In-memory price provider backed by a symbol -> data map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticProvider {
    instruments: HashMap<String, InstrumentData>,
}

impl StaticProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a provider from a JSON fixture file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Set the close series for a symbol.
    pub fn with_closes(mut self, symbol: &str, closes: Vec<(NaiveDate, f64)>) -> Self {
        self.instruments
            .entry(symbol.to_uppercase())
            .or_default()
            .closes = closes;
        self
    }

    /// Set the live quote for a symbol.
    pub fn with_quote(mut self, symbol: &str, quote: Quote) -> Self {
        self.instruments
            .entry(symbol.to_uppercase())
            .or_default()
            .quote = Some(quote);
        self
    }
}

impl PriceProvider for StaticProvider {
    fn daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, f64)>> {
        let symbol = symbol.to_uppercase();
        let data = self.instruments.get(&symbol).ok_or(Error::NoData {
            symbol: symbol.clone(),
        })?;

        let closes: Vec<(NaiveDate, f64)> = data
            .closes
            .iter()
            .filter(|(date, _)| *date >= start && *date <= end)
            .copied()
            .collect();

        if closes.is_empty() {
            return Err(Error::NoData { symbol });
        }
        Ok(closes)
    }

    fn latest_quote(&self, symbol: &str) -> Result<Quote> {
        let symbol = symbol.to_uppercase();
        self.instruments
            .get(&symbol)
            .and_then(|data| data.quote.clone())
            .ok_or(Error::NotFound(symbol))
    }
}

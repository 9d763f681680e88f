//! Core data types for the portfolio ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A portfolio anchored by its starting cash balance.
///
/// Immutable after creation; all later cash movement goes through
/// [`Transaction`] records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Portfolio {
    /// Portfolio identifier
    pub id: u64,
    /// Cash balance at creation time
    pub starting_balance: f64,
    /// When the portfolio was created
    pub created_at: DateTime<Utc>,
}

impl Portfolio {
    /// Create a new portfolio with the given id and starting balance.
    pub fn new(id: u64, starting_balance: f64, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            starting_balance,
            created_at,
        }
    }
}

/// A signed cash movement (trade settlement or deposit). Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Signed amount: negative for purchases, positive for proceeds/deposits
    pub amount: f64,
    /// When the cash moved
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction.
    pub fn new(amount: f64, timestamp: DateTime<Utc>) -> Self {
        Self { amount, timestamp }
    }
}

/// A tradable instrument. Created on first reference, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instrument {
    /// Ticker symbol (uppercase, unique)
    pub symbol: String,
    /// Human-readable company name
    pub display_name: String,
}

impl Instrument {
    /// Create a new instrument, normalizing the symbol to uppercase.
    pub fn new(symbol: &str, display_name: &str) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            display_name: display_name.to_string(),
        }
    }
}

/// Position direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Sign applied to the position's value contribution: +1 long, -1 short.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

/// A single opened (and possibly closed) position in one instrument.
///
/// Never mutated after creation except to set `closed_at` when sold.
/// Multiple positions in the same instrument may coexist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    /// Instrument symbol (uppercase)
    pub symbol: String,
    /// Number of shares (always positive; direction carries the sign)
    pub quantity: u32,
    /// Long or short
    pub direction: Direction,
    /// When the position was opened
    pub opened_at: DateTime<Utc>,
    /// When the position was closed; `None` means still open
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    /// Price per share at execution
    pub execution_price: f64,
}

impl Position {
    /// Create a new open position.
    pub fn new(
        symbol: &str,
        quantity: u32,
        direction: Direction,
        opened_at: DateTime<Utc>,
        execution_price: f64,
    ) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            quantity,
            direction,
            opened_at,
            closed_at: None,
            execution_price,
        }
    }

    /// Whether the position is still open (marked against the live quote).
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// Notional value at execution: quantity * execution_price.
    pub fn notional(&self) -> f64 {
        self.quantity as f64 * self.execution_price
    }
}

/// A live quote for an instrument.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    /// Latest trade price
    pub price: f64,
    /// Company name
    pub company_name: String,
    /// Sector classification
    pub sector: String,
}

/// One sector's share of portfolio weight, normalized so shares sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectorShare {
    /// Sector name
    pub name: String,
    /// Normalized weight in [0, 1]
    pub share: f64,
}

/// API response wrapper for success cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_new() {
        let pos = Position::new("tsla", 10, Direction::Long, Utc::now(), 260.95);
        assert_eq!(pos.symbol, "TSLA");
        assert_eq!(pos.quantity, 10);
        assert!(pos.is_open());
        assert_eq!(pos.notional(), 2609.5);
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Long.sign(), 1.0);
        assert_eq!(Direction::Short.sign(), -1.0);
    }

    #[test]
    fn test_position_closed() {
        let mut pos = Position::new("AAPL", 5, Direction::Long, Utc::now(), 150.0);
        pos.closed_at = Some(Utc::now());
        assert!(!pos.is_open());
    }

    #[test]
    fn test_instrument_uppercase() {
        let inst = Instrument::new("aapl", "Apple Inc.");
        assert_eq!(inst.symbol, "AAPL");
        assert_eq!(inst.display_name, "Apple Inc.");
    }

    #[test]
    fn test_api_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test".to_string());
        assert!(response.ok);
        assert_eq!(response.data, Some("test".to_string()));

        let err_response: ApiResponse<String> = ApiResponse::err("error");
        assert!(!err_response.ok);
        assert_eq!(err_response.error, Some("error".to_string()));
    }
}

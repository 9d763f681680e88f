//! Cash balance reconstruction.

use chrono::{DateTime, Utc};

use crate::calendar::TradingCalendar;
use crate::series::DailySeries;
use crate::types::Transaction;

/// Reconstruct the daily cash balance from the starting balance and the
/// transaction ledger.
///
/// One point per calendar day from the creation date through `as_of`
/// inclusive: the starting balance anchors the first day, each transaction
/// adds its amount on its date (same-day amounts sum), inactive days carry a
/// zero delta, and the cumulative sum yields the running balance. The result
/// is then restricted to trading sessions; non-session days are dropped
/// entirely, not zero-filled.
///
/// With no transactions the series is flat at `starting_balance` for every
/// session in range. A range without sessions yields an empty series.
pub fn reconstruct_balance(
    starting_balance: f64,
    created_at: DateTime<Utc>,
    transactions: &[Transaction],
    as_of: DateTime<Utc>,
    calendar: &impl TradingCalendar,
) -> DailySeries {
    let start = created_at.date_naive();
    let end = as_of.date_naive();
    if end < start {
        return DailySeries::new();
    }

    let mut events = vec![(start, starting_balance)];
    events.extend(
        transactions
            .iter()
            .map(|t| (t.timestamp.date_naive(), t.amount)),
    );

    DailySeries::from_events(events)
        .resample_daily(start, end, 0.0)
        .cumsum()
        .restrict_sessions(calendar)
}

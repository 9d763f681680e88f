//! Typed query resolvers over the ledger and price provider.
//!
//! Each function resolves one field of the historical portfolio API as a
//! pure function of `(portfolio_id, ledger, provider, calendar, as_of)` —
//! no hidden portfolio lookup and no I/O hiding inside record methods.
//! Callers serialize series with [`DailySeries::to_pairs`] at the boundary.

use chrono::{DateTime, Utc};

use crate::analytics;
use crate::calendar::TradingCalendar;
use crate::ledger::{LedgerStore, PositionFilter};
use crate::provider::PriceProvider;
use crate::series::DailySeries;
use crate::types::{Instrument, Position, SectorShare};
use crate::valuation::{reconstruct_balance, value_positions};
use crate::Result;

/// Total portfolio value per trading session: reconstructed cash balance
/// with every position's mark-to-market contribution overlaid.
pub fn history(
    portfolio_id: u64,
    store: &LedgerStore,
    provider: &impl PriceProvider,
    calendar: &impl TradingCalendar,
    as_of: DateTime<Utc>,
) -> Result<DailySeries> {
    let portfolio = store.portfolio(portfolio_id)?;
    let transactions = store.transactions(portfolio_id)?;

    let base = reconstruct_balance(
        portfolio.starting_balance,
        portfolio.created_at,
        transactions,
        as_of,
        calendar,
    );

    let positions = store.positions(portfolio_id, PositionFilter::All)?;
    value_positions(&positions, &base, as_of, provider, calendar)
}

/// Current total portfolio value: the last point of the history, or the raw
/// cash balance when no session has elapsed yet.
pub fn balance(
    portfolio_id: u64,
    store: &LedgerStore,
    provider: &impl PriceProvider,
    calendar: &impl TradingCalendar,
    as_of: DateTime<Utc>,
) -> Result<f64> {
    let series = history(portfolio_id, store, provider, calendar, as_of)?;
    match series.last() {
        Some((_, value)) => Ok(value),
        None => store.cash_balance(portfolio_id),
    }
}

/// Day-over-day percent change of the portfolio value, in percent.
///
/// The first session is reported as 0, never NaN.
pub fn change(
    portfolio_id: u64,
    store: &LedgerStore,
    provider: &impl PriceProvider,
    calendar: &impl TradingCalendar,
    as_of: DateTime<Utc>,
) -> Result<DailySeries> {
    let series = history(portfolio_id, store, provider, calendar, as_of)?;
    Ok(series.pct_change().scale(100.0))
}

/// Open positions aggregated by symbol: quantities sum, the earliest opening
/// time and the first-seen execution price represent the group.
pub fn open_positions(portfolio_id: u64, store: &LedgerStore) -> Result<Vec<Position>> {
    let open = store.positions(portfolio_id, PositionFilter::Open)?;

    let mut aggregated: Vec<Position> = Vec::new();
    for position in open {
        match aggregated.iter_mut().find(|p| p.symbol == position.symbol) {
            Some(existing) => existing.quantity += position.quantity,
            None => aggregated.push(position),
        }
    }
    Ok(aggregated)
}

/// Sector concentration: each position weighted by quantity x execution
/// price, normalized so shares sum to 1.0. No positions yields no shares.
pub fn sectors(
    portfolio_id: u64,
    store: &LedgerStore,
    provider: &impl PriceProvider,
) -> Result<Vec<SectorShare>> {
    let positions = store.positions(portfolio_id, PositionFilter::All)?;
    if positions.is_empty() {
        return Ok(Vec::new());
    }

    let mut weights = Vec::with_capacity(positions.len());
    for position in &positions {
        let quote = provider.latest_quote(&position.symbol)?;
        weights.push((quote.sector, position.notional()));
    }

    analytics::sector_shares(&weights)
}

/// Sortino ratio of the portfolio's daily returns (target 0, risk-free 0).
///
/// `f64::NAN` when the downside subset is empty or degenerate.
pub fn sortino(
    portfolio_id: u64,
    store: &LedgerStore,
    provider: &impl PriceProvider,
    calendar: &impl TradingCalendar,
    as_of: DateTime<Utc>,
) -> Result<f64> {
    let series = history(portfolio_id, store, provider, calendar, as_of)?;
    let returns = series.pct_change().values();
    Ok(analytics::sortino(&returns, 0.0, 0.0))
}

/// Beta of the portfolio's returns against a benchmark instrument, over the
/// sessions the two series share.
pub fn beta(
    portfolio_id: u64,
    store: &LedgerStore,
    provider: &impl PriceProvider,
    calendar: &impl TradingCalendar,
    as_of: DateTime<Utc>,
    benchmark: &str,
) -> Result<f64> {
    let series = history(portfolio_id, store, provider, calendar, as_of)?;
    let (Some((start, _)), Some((end, _))) = (series.first(), series.last()) else {
        return Ok(f64::NAN);
    };

    let closes = provider.daily_closes(benchmark, start, end)?;
    let benchmark_returns = DailySeries::from_points(closes).pct_change();
    let portfolio_returns = series.pct_change();

    Ok(analytics::beta(&portfolio_returns, &benchmark_returns))
}

/// Net exposure: signed live notional of open positions over total balance.
pub fn net_exposure(
    portfolio_id: u64,
    store: &LedgerStore,
    provider: &impl PriceProvider,
    calendar: &impl TradingCalendar,
    as_of: DateTime<Utc>,
) -> Result<f64> {
    let open = store.positions(portfolio_id, PositionFilter::Open)?;

    let mut legs = Vec::with_capacity(open.len());
    for position in &open {
        let quote = provider.latest_quote(&position.symbol)?;
        legs.push((position.quantity as f64 * quote.price, position.direction));
    }

    let total = balance(portfolio_id, store, provider, calendar, as_of)?;
    Ok(analytics::net_exposure(&legs, total))
}

/// Latest quoted price for an instrument. Unknown symbols propagate as
/// not-found.
pub fn latest_price(provider: &impl PriceProvider, symbol: &str) -> Result<f64> {
    Ok(provider.latest_quote(symbol)?.price)
}

/// Historical close chart for an instrument over `[start, end]`.
pub fn chart(
    provider: &impl PriceProvider,
    symbol: &str,
    start: chrono::NaiveDate,
    end: chrono::NaiveDate,
) -> Result<DailySeries> {
    Ok(DailySeries::from_points(provider.daily_closes(
        symbol, start, end,
    )?))
}

/// Known instruments, optionally filtered by a symbol substring, capped
/// at 10.
pub fn instruments(store: &LedgerStore, query: Option<&str>) -> Vec<Instrument> {
    match query {
        Some(q) if !q.is_empty() => store.search_instruments(q).into_iter().cloned().collect(),
        _ => store.instruments().iter().take(10).cloned().collect(),
    }
}

//! Position mark-to-market valuation.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::calendar::TradingCalendar;
use crate::provider::PriceProvider;
use crate::series::DailySeries;
use crate::types::Position;
use crate::{Error, Result};

/// One position's daily value contribution since it was opened.
///
/// Fetches the instrument's closes from the opening date to the closing date
/// (or `as_of` when still open), appending today's live quote for open
/// positions so the latest point is not stale. The first difference followed
/// by a cumulative sum converts absolute prices into value added since open,
/// anchored at zero on the opening day; the entry price itself is already in
/// the cash balance through the matching transaction. Scaled by quantity and
/// direction sign (+1 long, -1 short).
pub fn position_contribution(
    position: &Position,
    as_of: DateTime<Utc>,
    provider: &impl PriceProvider,
) -> Result<DailySeries> {
    let start = position.opened_at.date_naive();
    let end = position
        .closed_at
        .map(|c| c.date_naive())
        .unwrap_or_else(|| as_of.date_naive());

    let closes = provider.daily_closes(&position.symbol, start, end)?;
    let mut prices = DailySeries::from_points(closes);

    if position.is_open() {
        // Overlay today's quote; a quote outage keeps the historical closes.
        match provider.latest_quote(&position.symbol) {
            Ok(quote) => prices.append_after(as_of.date_naive(), quote.price),
            Err(e) => {
                warn!(symbol = %position.symbol, error = %e, "live quote unavailable, using last close");
            }
        }
    }

    let factor = position.quantity as f64 * position.direction.sign();
    Ok(prices.diff().cumsum().scale(factor))
}

/// Overlay every position's contribution onto the base cash-balance series.
///
/// Contributions are computed independently per position and merged with a
/// date-aligned outer join, so the result is invariant under reordering the
/// input and spans the union of the base range and all position ranges,
/// restricted to trading sessions.
///
/// A per-instrument fetch failure is logged and that position skipped; the
/// call fails with [`Error::NoData`] only when positions exist and none of
/// them contributed.
pub fn value_positions(
    positions: &[Position],
    base: &DailySeries,
    as_of: DateTime<Utc>,
    provider: &impl PriceProvider,
    calendar: &impl TradingCalendar,
) -> Result<DailySeries> {
    let mut total = base.clone();
    let mut contributed = 0usize;

    for position in positions {
        match position_contribution(position, as_of, provider) {
            Ok(contribution) => {
                debug!(symbol = %position.symbol, points = contribution.len(), "position valued");
                total = total.add(&contribution);
                contributed += 1;
            }
            Err(e) => {
                warn!(symbol = %position.symbol, error = %e, "skipping position, no usable price data");
            }
        }
    }

    if !positions.is_empty() && contributed == 0 {
        let mut symbols: Vec<&str> = positions.iter().map(|p| p.symbol.as_str()).collect();
        symbols.sort_unstable();
        symbols.dedup();
        return Err(Error::NoData {
            symbol: symbols.join(", "),
        });
    }

    Ok(total.restrict_sessions(calendar))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WeekdayCalendar;
    use crate::provider::StaticProvider;
    use crate::types::{Direction, Quote};
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap()
            .and_utc()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // Mon 2024-01-01 .. Wed 2024-01-03, path [100, 105, 103]
    fn provider() -> StaticProvider {
        StaticProvider::new()
            .with_closes(
                "ACME",
                vec![
                    (d(2024, 1, 1), 100.0),
                    (d(2024, 1, 2), 105.0),
                    (d(2024, 1, 3), 103.0),
                ],
            )
            .with_quote(
                "ACME",
                Quote {
                    price: 104.0,
                    company_name: "Acme Corp".to_string(),
                    sector: "Industrials".to_string(),
                },
            )
    }

    fn closed_position(symbol: &str, quantity: u32, direction: Direction) -> Position {
        let mut p = Position::new(symbol, quantity, direction, at(2024, 1, 1), 100.0);
        p.closed_at = Some(at(2024, 1, 3));
        p
    }

    #[test]
    fn test_contribution_anchored_at_zero() {
        // Long 1 share, path [100,105,103] -> contribution [0, 5, 3],
        // regardless of the entry price.
        let mut position = closed_position("ACME", 1, Direction::Long);
        position.execution_price = 987.0; // deliberately wrong entry price

        let series = position_contribution(&position, at(2024, 1, 3), &provider()).unwrap();
        assert_eq!(series.values(), vec![0.0, 5.0, 3.0]);
    }

    #[test]
    fn test_contribution_scales_by_quantity_and_sign() {
        let long = closed_position("ACME", 10, Direction::Long);
        let short = closed_position("ACME", 10, Direction::Short);
        let provider = provider();

        let long_series = position_contribution(&long, at(2024, 1, 3), &provider).unwrap();
        let short_series = position_contribution(&short, at(2024, 1, 3), &provider).unwrap();

        assert_eq!(long_series.values(), vec![0.0, 50.0, 30.0]);
        assert_eq!(short_series.values(), vec![0.0, -50.0, -30.0]);
    }

    #[test]
    fn test_open_position_appends_live_quote() {
        // Open position valued on Thu 2024-01-04; closes end Wed, the quote
        // at 104 supplies Thursday's point: 104 - 100 = 4 since open.
        let position = Position::new("ACME", 1, Direction::Long, at(2024, 1, 1), 100.0);

        let series = position_contribution(&position, at(2024, 1, 4), &provider()).unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series.last(), Some((d(2024, 1, 4), 4.0)));
    }

    #[test]
    fn test_open_position_survives_quote_outage() {
        let no_quote = StaticProvider::new().with_closes(
            "ACME",
            vec![(d(2024, 1, 1), 100.0), (d(2024, 1, 2), 105.0)],
        );
        let position = Position::new("ACME", 1, Direction::Long, at(2024, 1, 1), 100.0);

        let series = position_contribution(&position, at(2024, 1, 4), &no_quote).unwrap();
        assert_eq!(series.last(), Some((d(2024, 1, 2), 5.0)));
    }

    #[test]
    fn test_value_positions_overlays_base() {
        let base = DailySeries::from_points(vec![
            (d(2024, 1, 1), 9_000.0),
            (d(2024, 1, 2), 9_000.0),
            (d(2024, 1, 3), 9_000.0),
        ]);
        let positions = vec![closed_position("ACME", 10, Direction::Long)];

        let total = value_positions(
            &positions,
            &base,
            at(2024, 1, 3),
            &provider(),
            &WeekdayCalendar,
        )
        .unwrap();

        assert_eq!(total.values(), vec![9_000.0, 9_050.0, 9_030.0]);
    }

    #[test]
    fn test_value_positions_order_invariant() {
        let base = DailySeries::from_points(vec![(d(2024, 1, 1), 1_000.0)]);
        let provider = provider()
            .with_closes(
                "BOLT",
                vec![(d(2024, 1, 2), 50.0), (d(2024, 1, 3), 55.0)],
            )
            .with_quote(
                "BOLT",
                Quote {
                    price: 55.0,
                    company_name: "Bolt Ltd".to_string(),
                    sector: "Materials".to_string(),
                },
            );

        let a = closed_position("ACME", 10, Direction::Long);
        let mut b = Position::new("BOLT", 5, Direction::Long, at(2024, 1, 2), 50.0);
        b.closed_at = Some(at(2024, 1, 3));

        let forward = value_positions(
            &[a.clone(), b.clone()],
            &base,
            at(2024, 1, 3),
            &provider,
            &WeekdayCalendar,
        )
        .unwrap();
        let reversed = value_positions(
            &[b, a],
            &base,
            at(2024, 1, 3),
            &provider,
            &WeekdayCalendar,
        )
        .unwrap();

        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_failed_instrument_is_isolated() {
        let base = DailySeries::from_points(vec![
            (d(2024, 1, 1), 1_000.0),
            (d(2024, 1, 2), 1_000.0),
            (d(2024, 1, 3), 1_000.0),
        ]);
        // GHOST has no data anywhere; ACME is fine
        let positions = vec![
            closed_position("ACME", 1, Direction::Long),
            closed_position("GHOST", 1, Direction::Long),
        ];

        let total = value_positions(
            &positions,
            &base,
            at(2024, 1, 3),
            &provider(),
            &WeekdayCalendar,
        )
        .unwrap();

        // ACME's contribution survives the GHOST outage
        assert_eq!(total.values(), vec![1_000.0, 1_005.0, 1_003.0]);
    }

    #[test]
    fn test_all_instruments_failing_is_no_data() {
        let base = DailySeries::from_points(vec![(d(2024, 1, 1), 1_000.0)]);
        let positions = vec![closed_position("GHOST", 1, Direction::Long)];

        let result = value_positions(
            &positions,
            &base,
            at(2024, 1, 3),
            &provider(),
            &WeekdayCalendar,
        );
        assert!(matches!(result, Err(Error::NoData { .. })));
    }

    #[test]
    fn test_no_positions_returns_base() {
        let base = DailySeries::from_points(vec![(d(2024, 1, 1), 1_000.0)]);

        let total = value_positions(&[], &base, at(2024, 1, 3), &provider(), &WeekdayCalendar)
            .unwrap();
        assert_eq!(total, base);
    }

    #[test]
    fn test_result_spans_union_of_ranges() {
        // Base covers Mon-Tue, position covers Tue-Wed; result spans Mon-Wed
        let base = DailySeries::from_points(vec![
            (d(2024, 1, 1), 500.0),
            (d(2024, 1, 2), 500.0),
        ]);
        let mut position = Position::new("ACME", 1, Direction::Long, at(2024, 1, 2), 105.0);
        position.closed_at = Some(at(2024, 1, 3));

        let total = value_positions(
            &[position],
            &base,
            at(2024, 1, 3),
            &provider(),
            &WeekdayCalendar,
        )
        .unwrap();

        assert_eq!(total.first(), Some((d(2024, 1, 1), 500.0)));
        // Wed has no base point: only the position's contribution (103-105=-2)
        assert_eq!(total.last(), Some((d(2024, 1, 3), -2.0)));
    }
}

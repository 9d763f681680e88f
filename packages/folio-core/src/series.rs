//! Daily time series and its algebra.
//!
//! [`DailySeries`] is the shared currency of the valuation and analytics
//! engines: an ordered sequence of (date, value) points, at most one per
//! calendar day. The operations here are the building blocks the spec'd
//! reconstruction needs: resampling, first difference, cumulative sum,
//! percent change, and date-aligned (outer join) addition.

use chrono::{DateTime, Days, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::calendar::TradingCalendar;

/// An ordered daily series: ascending dates, one value per date.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DailySeries {
    points: Vec<(NaiveDate, f64)>,
}

impl DailySeries {
    /// Create an empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from unordered dated events.
    ///
    /// Events are sorted by date and amounts on the same day are summed,
    /// so multiple transactions on one date collapse into a single point.
    pub fn from_events(events: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        let mut events: Vec<(NaiveDate, f64)> = events.into_iter().collect();
        events.sort_by_key(|(date, _)| *date);

        let mut points: Vec<(NaiveDate, f64)> = Vec::with_capacity(events.len());
        for (date, amount) in events {
            match points.last_mut() {
                Some((last, value)) if *last == date => *value += amount,
                _ => points.push((date, amount)),
            }
        }

        Self { points }
    }

    /// Build a series from already-ordered points (e.g. provider closes).
    ///
    /// Points are sorted defensively; on duplicate dates the later point wins.
    pub fn from_points(points: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        let mut raw: Vec<(NaiveDate, f64)> = points.into_iter().collect();
        raw.sort_by_key(|(date, _)| *date);

        let mut points: Vec<(NaiveDate, f64)> = Vec::with_capacity(raw.len());
        for (date, value) in raw {
            match points.last_mut() {
                Some((last, existing)) if *last == date => *existing = value,
                _ => points.push((date, value)),
            }
        }

        Self { points }
    }

    /// Number of points in the series.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The last point, if any.
    pub fn last(&self) -> Option<(NaiveDate, f64)> {
        self.points.last().copied()
    }

    /// The first point, if any.
    pub fn first(&self) -> Option<(NaiveDate, f64)> {
        self.points.first().copied()
    }

    /// Iterate over (date, value) points in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.points.iter().copied()
    }

    /// The values in date order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    /// Append a point strictly after the current last date.
    ///
    /// A point on or before the last date is ignored; the series never goes
    /// backwards. Used to overlay today's live quote on historical closes.
    pub fn append_after(&mut self, date: NaiveDate, value: f64) {
        match self.points.last() {
            Some((last, _)) if date <= *last => {}
            _ => self.points.push((date, value)),
        }
    }

    /// Resample to exactly one point per calendar day over `[start, end]`.
    ///
    /// Days without a point get `fill` (zero delta for event series).
    /// Existing points outside the range are dropped.
    pub fn resample_daily(&self, start: NaiveDate, end: NaiveDate, fill: f64) -> Self {
        let mut points = Vec::new();
        let mut day = start;
        while day <= end {
            let value = self
                .points
                .iter()
                .find(|(date, _)| *date == day)
                .map(|(_, v)| *v)
                .unwrap_or(fill);
            points.push((day, value));
            day = match day.checked_add_days(Days::new(1)) {
                Some(next) => next,
                None => break,
            };
        }
        Self { points }
    }

    /// Cumulative sum: each point becomes the sum of all values up to it.
    pub fn cumsum(&self) -> Self {
        let mut running = 0.0;
        let points = self
            .points
            .iter()
            .map(|(date, value)| {
                running += value;
                (*date, running)
            })
            .collect();
        Self { points }
    }

    /// Day-over-day first difference. The first point becomes 0.
    pub fn diff(&self) -> Self {
        let points = self
            .points
            .iter()
            .enumerate()
            .map(|(i, (date, value))| {
                if i == 0 {
                    (*date, 0.0)
                } else {
                    (*date, value - self.points[i - 1].1)
                }
            })
            .collect();
        Self { points }
    }

    /// Percent change: `(v[t] - v[t-1]) / v[t-1]`.
    ///
    /// The first point is reported as 0, never NaN; a zero previous value
    /// also yields 0 so the series stays finite everywhere.
    pub fn pct_change(&self) -> Self {
        let points = self
            .points
            .iter()
            .enumerate()
            .map(|(i, (date, value))| {
                if i == 0 || self.points[i - 1].1 == 0.0 {
                    (*date, 0.0)
                } else {
                    let prev = self.points[i - 1].1;
                    (*date, (value - prev) / prev)
                }
            })
            .collect();
        Self { points }
    }

    /// Multiply every value by a scalar.
    pub fn scale(&self, factor: f64) -> Self {
        let points = self
            .points
            .iter()
            .map(|(date, value)| (*date, value * factor))
            .collect();
        Self { points }
    }

    /// Date-aligned addition with an outer join on the date index.
    ///
    /// Dates present in only one operand keep that operand's value (the
    /// other side contributes 0). The result spans the union of both ranges.
    pub fn add(&self, other: &Self) -> Self {
        let mut points = Vec::with_capacity(self.points.len().max(other.points.len()));
        let (mut i, mut j) = (0, 0);

        while i < self.points.len() || j < other.points.len() {
            match (self.points.get(i), other.points.get(j)) {
                (Some(&(da, va)), Some(&(db, vb))) => {
                    if da == db {
                        points.push((da, va + vb));
                        i += 1;
                        j += 1;
                    } else if da < db {
                        points.push((da, va));
                        i += 1;
                    } else {
                        points.push((db, vb));
                        j += 1;
                    }
                }
                (Some(&(da, va)), None) => {
                    points.push((da, va));
                    i += 1;
                }
                (None, Some(&(db, vb))) => {
                    points.push((db, vb));
                    j += 1;
                }
                (None, None) => break,
            }
        }

        Self { points }
    }

    /// Inner join with another series: only dates present in both survive.
    ///
    /// Returns paired values in date order. Used to overlap portfolio and
    /// benchmark returns before regression.
    pub fn join_inner(&self, other: &Self) -> Vec<(f64, f64)> {
        let mut pairs = Vec::new();
        let (mut i, mut j) = (0, 0);

        while i < self.points.len() && j < other.points.len() {
            let (da, va) = self.points[i];
            let (db, vb) = other.points[j];
            if da == db {
                pairs.push((va, vb));
                i += 1;
                j += 1;
            } else if da < db {
                i += 1;
            } else {
                j += 1;
            }
        }

        pairs
    }

    /// Drop every point whose date is not a trading session.
    ///
    /// Non-session days are removed entirely, not zero-filled. An empty
    /// result (no sessions in range) is a valid series, not an error.
    pub fn restrict_sessions(&self, calendar: &impl TradingCalendar) -> Self {
        let points = self
            .points
            .iter()
            .filter(|(date, _)| calendar.is_session(*date))
            .copied()
            .collect();
        Self { points }
    }

    /// Serialize to the wire format: `[unix_millis, value]` pairs at
    /// midnight UTC per calendar date, preserving order.
    pub fn to_pairs(&self) -> Vec<(i64, f64)> {
        self.points
            .iter()
            .map(|(date, value)| (midnight_utc_millis(*date), *value))
            .collect()
    }
}

/// Unix milliseconds for midnight UTC on the given date.
pub fn midnight_utc_millis(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Recover the calendar date from wire-format unix milliseconds.
pub fn date_from_millis(millis: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WeekdayCalendar;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_from_events_sums_same_day() {
        let series = DailySeries::from_events(vec![
            (d(2024, 1, 3), 5.0),
            (d(2024, 1, 1), 1.0),
            (d(2024, 1, 3), 2.0),
        ]);

        assert_eq!(series.len(), 2);
        assert_eq!(series.first(), Some((d(2024, 1, 1), 1.0)));
        assert_eq!(series.last(), Some((d(2024, 1, 3), 7.0)));
    }

    #[test]
    fn test_resample_daily_zero_fills() {
        let series = DailySeries::from_events(vec![(d(2024, 1, 2), 3.0)]);
        let resampled = series.resample_daily(d(2024, 1, 1), d(2024, 1, 4), 0.0);

        assert_eq!(resampled.len(), 4);
        assert_eq!(resampled.values(), vec![0.0, 3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_cumsum() {
        let series = DailySeries::from_events(vec![
            (d(2024, 1, 1), 10.0),
            (d(2024, 1, 2), -4.0),
            (d(2024, 1, 3), 1.0),
        ]);

        assert_eq!(series.cumsum().values(), vec![10.0, 6.0, 7.0]);
    }

    #[test]
    fn test_diff_anchors_at_zero() {
        // Price path [100, 105, 103] -> deltas [0, 5, -2]
        let series = DailySeries::from_points(vec![
            (d(2024, 1, 1), 100.0),
            (d(2024, 1, 2), 105.0),
            (d(2024, 1, 3), 103.0),
        ]);

        let diff = series.diff();
        assert_eq!(diff.values(), vec![0.0, 5.0, -2.0]);
        // diff then cumsum recovers value added since open: [0, 5, 3]
        assert_eq!(diff.cumsum().values(), vec![0.0, 5.0, 3.0]);
    }

    #[test]
    fn test_pct_change_first_is_zero() {
        let series = DailySeries::from_points(vec![
            (d(2024, 1, 1), 100.0),
            (d(2024, 1, 2), 110.0),
            (d(2024, 1, 3), 99.0),
        ]);

        let change = series.pct_change();
        let values = change.values();
        assert_eq!(values[0], 0.0);
        assert!((values[1] - 0.10).abs() < 1e-12);
        assert!((values[2] + 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_pct_change_zero_prev_stays_finite() {
        let series =
            DailySeries::from_points(vec![(d(2024, 1, 1), 0.0), (d(2024, 1, 2), 50.0)]);

        let values = series.pct_change().values();
        assert_eq!(values, vec![0.0, 0.0]);
        assert!(values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_add_outer_join() {
        let a = DailySeries::from_points(vec![(d(2024, 1, 1), 1.0), (d(2024, 1, 2), 2.0)]);
        let b = DailySeries::from_points(vec![(d(2024, 1, 2), 10.0), (d(2024, 1, 3), 20.0)]);

        let sum = a.add(&b);
        assert_eq!(sum.len(), 3);
        assert_eq!(sum.values(), vec![1.0, 12.0, 20.0]);
    }

    #[test]
    fn test_join_inner_overlap_only() {
        let a = DailySeries::from_points(vec![
            (d(2024, 1, 1), 1.0),
            (d(2024, 1, 2), 2.0),
            (d(2024, 1, 3), 3.0),
        ]);
        let b = DailySeries::from_points(vec![(d(2024, 1, 2), 20.0), (d(2024, 1, 4), 40.0)]);

        assert_eq!(a.join_inner(&b), vec![(2.0, 20.0)]);
    }

    #[test]
    fn test_restrict_sessions_drops_weekends() {
        // 2024-01-05 is a Friday, 06/07 the weekend, 08 a Monday
        let series = DailySeries::from_points(vec![
            (d(2024, 1, 5), 1.0),
            (d(2024, 1, 6), 2.0),
            (d(2024, 1, 7), 3.0),
            (d(2024, 1, 8), 4.0),
        ]);

        let sessions = series.restrict_sessions(&WeekdayCalendar);
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions.values(), vec![1.0, 4.0]);
    }

    #[test]
    fn test_append_after_ignores_stale_dates() {
        let mut series =
            DailySeries::from_points(vec![(d(2024, 1, 2), 100.0)]);

        series.append_after(d(2024, 1, 2), 999.0);
        assert_eq!(series.len(), 1);
        assert_eq!(series.last(), Some((d(2024, 1, 2), 100.0)));

        series.append_after(d(2024, 1, 3), 101.0);
        assert_eq!(series.last(), Some((d(2024, 1, 3), 101.0)));
    }

    #[test]
    fn test_wire_pairs_round_trip() {
        let series = DailySeries::from_points(vec![
            (d(2024, 1, 1), 10.0),
            (d(2024, 3, 15), 20.0),
        ]);

        let pairs = series.to_pairs();
        assert_eq!(pairs.len(), 2);
        // Midnight UTC on 2024-01-01
        assert_eq!(pairs[0].0, 1_704_067_200_000);

        for ((millis, _), (date, _)) in pairs.iter().zip(series.iter()) {
            assert_eq!(date_from_millis(*millis), Some(date));
        }
    }
}

//! Trading calendar oracle.

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Oracle for whether a given calendar day is a trading session on the
/// reference exchange.
pub trait TradingCalendar {
    /// Whether the exchange is open for trading on `date`.
    fn is_session(&self, date: NaiveDate) -> bool;
}

/// Weekday-only calendar: Monday through Friday are sessions.
///
/// Exchange holidays are not modeled; a holiday-aware implementation can be
/// swapped in through the trait without touching the engines.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeekdayCalendar;

impl TradingCalendar for WeekdayCalendar {
    fn is_session(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }
}

/// All sessions in `[start, end]` inclusive, ascending.
pub fn sessions_between(
    calendar: &impl TradingCalendar,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<NaiveDate> {
    let mut sessions = Vec::new();
    let mut day = start;
    while day <= end {
        if calendar.is_session(day) {
            sessions.push(day);
        }
        day = match day.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    sessions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_weekday_sessions() {
        // 2024-01-05 Friday, 2024-01-06 Saturday, 2024-01-07 Sunday
        assert!(WeekdayCalendar.is_session(d(2024, 1, 5)));
        assert!(!WeekdayCalendar.is_session(d(2024, 1, 6)));
        assert!(!WeekdayCalendar.is_session(d(2024, 1, 7)));
        assert!(WeekdayCalendar.is_session(d(2024, 1, 8)));
    }

    #[test]
    fn test_sessions_between() {
        // Friday through Monday -> Friday and Monday only
        let sessions = sessions_between(&WeekdayCalendar, d(2024, 1, 5), d(2024, 1, 8));
        assert_eq!(sessions, vec![d(2024, 1, 5), d(2024, 1, 8)]);
    }

    #[test]
    fn test_sessions_between_weekend_only_is_empty() {
        let sessions = sessions_between(&WeekdayCalendar, d(2024, 1, 6), d(2024, 1, 7));
        assert!(sessions.is_empty());
    }
}

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PayPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl PayPeriod {
    pub fn containing(date: NaiveDate) -> Self {
        let start = week_start(date);
        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..7).map(move |offset| start + Duration::days(offset))
    }

    pub fn key(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn label(&self) -> String {
        let week = self.start.iso_week();
        format!(
            "W{:02} {} ({} → {})",
            week.week(),
            week.year(),
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_monday() as i64;
    date - Duration::days(offset)
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| "Invalid date format. Use YYYY-MM-DD.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pay_period_key(date: NaiveDate) -> String {
        PayPeriod::containing(date).key()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_date_valid() {
        let date = parse_date("2026-02-03").unwrap();
        assert_eq!(date.year(), 2026);
        assert_eq!(date.month(), 2);
        assert_eq!(date.day(), 3);
    }

    #[test]
    fn parse_date_invalid() {
        assert!(parse_date("02-03-2026").is_err());
        assert!(parse_date("2026-02-30").is_err());
    }

    #[test]
    fn whole_week_shares_one_key() {
        let keys: Vec<String> = (17..=23).map(|d| pay_period_key(day(2025, 11, d))).collect();
        assert!(keys.iter().all(|key| key == "2025-11-17"));
        assert_eq!(pay_period_key(day(2025, 11, 24)), "2025-11-24");
        assert_eq!(pay_period_key(day(2025, 11, 16)), "2025-11-10");
    }

    #[test]
    fn period_spans_monday_to_sunday() {
        let period = PayPeriod::containing(day(2025, 11, 23));
        assert_eq!(period.start(), day(2025, 11, 17));
        assert_eq!(period.end(), day(2025, 11, 23));
        let days: Vec<NaiveDate> = period.days().collect();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].weekday(), chrono::Weekday::Mon);
        assert_eq!(days[6].weekday(), chrono::Weekday::Sun);
    }

    #[test]
    fn period_crosses_year_boundary() {
        let period = PayPeriod::containing(day(2026, 1, 1));
        assert_eq!(period.start(), day(2025, 12, 29));
        assert_eq!(period.end(), day(2026, 1, 4));
        assert!(period.label().starts_with("W01 2026"));
    }

    #[test]
    fn period_contains_only_its_week() {
        let period = PayPeriod::containing(day(2025, 11, 19));
        assert!(!period.contains(day(2025, 11, 16)));
        assert!(period.contains(day(2025, 11, 17)));
        assert!(!period.contains(day(2025, 11, 24)));
    }
}

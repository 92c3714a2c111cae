use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc, Weekday};
use chrono_tz::Tz;

/// Returns the current time in the configured timezone.
pub fn now_in_timezone(tz: &Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(tz)
}

/// Returns today's date in the configured timezone.
pub fn today_local(tz: &Tz) -> NaiveDate {
    now_in_timezone(tz).date_naive()
}

/// Parses `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or RFC 3339, keeping the
/// calendar date as written.
pub fn parse_date_value(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

pub fn is_working_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Number of Monday-Friday dates in `[start, end]`, inclusive.
///
/// Public holidays are not excluded. Returns 0 when `end < start`.
pub fn count_working_days(start: NaiveDate, end: NaiveDate) -> i32 {
    if end < start {
        return 0;
    }
    let total = (end - start).num_days() + 1;
    let full_weeks = total / 7;
    let tail_start = start + Duration::days(full_weeks * 7);
    let tail = (0..total % 7)
        .filter(|offset| is_working_day(tail_start + Duration::days(*offset)))
        .count() as i64;
    let days = full_weeks * 5 + tail;
    days as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn naive_count(start: NaiveDate, end: NaiveDate) -> i32 {
        start
            .iter_days()
            .take_while(|day| *day <= end)
            .filter(|day| is_working_day(*day))
            .count() as i32
    }

    #[test]
    fn monday_to_sunday_is_five_days() {
        assert_eq!(count_working_days(d("2024-12-02"), d("2024-12-08")), 5);
    }

    #[test]
    fn weekend_only_range_is_zero() {
        assert_eq!(count_working_days(d("2024-12-07"), d("2024-12-08")), 0);
        assert_eq!(count_working_days(d("2024-12-07"), d("2024-12-07")), 0);
    }

    #[test]
    fn single_weekday_counts_once() {
        assert_eq!(count_working_days(d("2024-12-04"), d("2024-12-04")), 1);
    }

    #[test]
    fn reversed_range_is_zero() {
        assert_eq!(count_working_days(d("2024-12-06"), d("2024-12-02")), 0);
    }

    #[test]
    fn matches_day_by_day_count_over_many_ranges() {
        let base = d("2024-02-20");
        for offset in 0..14 {
            let start = base + Duration::days(offset);
            for len in 0..40 {
                let end = start + Duration::days(len);
                assert_eq!(
                    count_working_days(start, end),
                    naive_count(start, end),
                    "{start}..{end}"
                );
            }
        }
    }

    #[test]
    fn parse_date_value_supports_rfc3339_sql_and_plain_date() {
        assert_eq!(parse_date_value("2026-02-04T09:10:11+09:00"), Some(d("2026-02-04")));
        assert_eq!(parse_date_value("2026-02-04 09:10:11"), Some(d("2026-02-04")));
        assert_eq!(parse_date_value(" 2026-02-04 "), Some(d("2026-02-04")));
        assert!(parse_date_value("not-a-date").is_none());
        assert!(parse_date_value("2026-13-01").is_none());
    }

    #[test]
    fn today_local_follows_timezone() {
        let tokyo: Tz = "Asia/Tokyo".parse().unwrap();
        let utc_today = today_local(&chrono_tz::UTC);
        let tokyo_today = today_local(&tokyo);
        let diff = (tokyo_today - utc_today).num_days();
        assert!((0..=1).contains(&diff));
    }
}

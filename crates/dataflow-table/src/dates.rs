//! Date/time parsing and arithmetic shared by `to_timestamp` coercion and
//! the `date_process` operator.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

const FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y年%m月%d日",
    "%m/%d/%Y",
    "%d/%m/%Y",
];

/// Parses a free-form date/datetime string, trying the common formats this
/// engine's upstream spreadsheets use.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_hms_opt(0, 0, 0).unwrap());
        }
    }
    None
}

/// ISO week-style weekday, 1-based Monday=1, as used by `date_process`.
pub fn weekday_1_monday(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_monday() + 1
}

pub fn quarter(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

/// Applies an offset of the form `([+-]?\d+)([dMy])` (`d`=days, `M`=months,
/// `y`=years) to a date.
pub fn apply_offset(date: NaiveDate, offset: &str) -> Option<NaiveDate> {
    let offset = offset.trim();
    if offset.is_empty() {
        return Some(date);
    }
    let unit = offset.chars().last()?;
    let amount_str = &offset[..offset.len() - unit.len_utf8()];
    let amount: i64 = amount_str.parse().ok()?;
    match unit {
        'd' => Some(date + Duration::days(amount)),
        'M' => add_months(date, amount),
        'y' => add_months(date, amount * 12),
        _ => None,
    }
}

fn add_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let total = date.year() as i64 * 12 + (date.month() as i64 - 1) + months;
    let year = (total.div_euclid(12)) as i32;
    let month = (total.rem_euclid(12)) as u32 + 1;
    let day = date.day();
    // clamp to the last valid day of the target month
    for d in (1..=day).rev() {
        if let Some(nd) = NaiveDate::from_ymd_opt(year, month, d) {
            return Some(nd);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_formats() {
        assert!(parse_timestamp("2025-10-03").is_some());
        assert!(parse_timestamp("2025/10/03").is_some());
        assert!(parse_timestamp("2025-10-03 12:30:00").is_some());
    }

    #[test]
    fn offset_months_clamps_to_month_end() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let shifted = apply_offset(d, "1M").unwrap();
        assert_eq!(shifted, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
    }

    #[test]
    fn weekday_monday_is_one() {
        let monday = NaiveDate::from_ymd_opt(2026, 7, 27).unwrap();
        assert_eq!(weekday_1_monday(monday), 1);
    }
}

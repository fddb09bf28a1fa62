//! Date helper functions

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};

/// Format a date using a Moment.js-style format string
///
/// # Examples
/// ```ignore
/// format_date(&date, "YYYY-MM-DD") // -> "2024-01-15"
/// ```
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>, format: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let chrono_format = moment_to_chrono_format(format);
    date.format(&chrono_format).to_string()
}

/// Format a date in ISO 8601 / XML format, for `<time datetime>`
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}

/// Date shown in post listings: `d MMM` in the current year, `d MMM YYYY` otherwise
pub fn listing_date<Tz: TimeZone>(date: &DateTime<Tz>, today: NaiveDate) -> String
where
    Tz::Offset: std::fmt::Display,
{
    if date.year() == today.year() {
        format_date(date, "D MMM")
    } else {
        format_date(date, "D MMM YYYY")
    }
}

/// Convert a Moment.js format to a chrono format
fn moment_to_chrono_format(format: &str) -> String {
    // Longest tokens first within each family
    let replacements = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("DDDD", "%j"),
        ("DD", "%d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("dddd", "%A"),
        ("ddd", "%a"),
        ("ZZ", "%z"),
        ("SSS", "%3f"),
    ];

    let mut result = format.to_string();
    for (from, to) in replacements {
        result = result.replace(from, to);
    }

    // Single `D` is the unpadded day of month
    let mut out = String::with_capacity(result.len());
    let mut prev = '\0';
    for c in result.chars() {
        if c == 'D' && prev != '%' {
            out.push_str("%-d");
        } else {
            out.push(c);
        }
        prev = c;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    #[test]
    fn test_format_date() {
        let date = Local.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(format_date(&date, "YYYY-MM-DD"), "2024-01-15");
        assert_eq!(format_date(&date, "YYYY/MM/DD"), "2024/01/15");
    }

    #[test]
    fn test_moment_to_chrono() {
        assert_eq!(moment_to_chrono_format("YYYY-MM-DD"), "%Y-%m-%d");
        assert_eq!(moment_to_chrono_format("HH:mm:ss"), "%H:%M:%S");
        assert_eq!(moment_to_chrono_format("D MMM"), "%-d %b");
    }

    #[test]
    fn test_listing_date_current_year() {
        let date = Local.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap();
        assert_eq!(listing_date(&date, today), "5 Mar");
    }

    #[test]
    fn test_listing_date_other_year() {
        let date = Local.with_ymd_and_hms(2022, 5, 1, 10, 0, 0).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(listing_date(&date, today), "1 May 2022");
    }
}

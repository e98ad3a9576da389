use anyhow::{anyhow, Result};
use chrono::{Days, Local, NaiveDate, NaiveDateTime, NaiveTime};

const DATETIME_FORMATS: [&str; 4] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// `YYYY-MM-DD`, `today` or `tomorrow`.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let today = Local::now().date_naive();
    match input.trim().to_lowercase().as_str() {
        "today" => Ok(today),
        "tomorrow" => today
            .checked_add_days(Days::new(1))
            .ok_or_else(|| anyhow!("Date out of range")),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .map_err(|e| anyhow!("Failed to parse date '{}': {} (expected YYYY-MM-DD)", input, e)),
    }
}

pub fn parse_datetime(input: &str) -> Result<NaiveDateTime> {
    let input = input.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .ok_or_else(|| anyhow!("Failed to parse date-time '{}' (expected 'YYYY-MM-DD HH:MM')", input))
}

/// A full date-time, or a bare `HH:MM` placed on `day`.
pub fn parse_datetime_on(input: &str, day: NaiveDate) -> Result<NaiveDateTime> {
    match NaiveTime::parse_from_str(input.trim(), "%H:%M") {
        Ok(time) => Ok(day.and_time(time)),
        Err(_) => parse_datetime(input),
    }
}

/// `YYYY-MM` into `(year, month)`. The month range is checked by the core.
pub fn parse_month(input: &str) -> Result<(i32, u32)> {
    let (year, month) = input
        .trim()
        .split_once('-')
        .ok_or_else(|| anyhow!("Failed to parse month '{}' (expected YYYY-MM)", input))?;
    let year = year.parse().map_err(|_| anyhow!("Invalid year in '{}'", input))?;
    let month = month.parse().map_err(|_| anyhow!("Invalid month in '{}'", input))?;
    Ok((year, month))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-03-15").unwrap(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(parse_date("Today").unwrap(), Local::now().date_naive());
        assert!(parse_date("15/03/2024").is_err());
    }

    #[test]
    fn test_parse_datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
        assert_eq!(parse_datetime("2024-03-01 09:00").unwrap(), expected);
        assert_eq!(parse_datetime("2024-03-01T09:00").unwrap(), expected);
        assert_eq!(parse_datetime("2024-03-01 09:00:00").unwrap(), expected);
        assert!(parse_datetime("2024-03-01").is_err());
    }

    #[test]
    fn test_parse_time_on_day() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(parse_datetime_on("09:15", day).unwrap(), day.and_hms_opt(9, 15, 0).unwrap());
        assert_eq!(
            parse_datetime_on("2024-03-02 01:00", day).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap().and_hms_opt(1, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2024-03").unwrap(), (2024, 3));
        assert_eq!(parse_month("2024-13").unwrap(), (2024, 13));
        assert!(parse_month("March").is_err());
    }
}

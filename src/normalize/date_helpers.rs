use chrono::NaiveDate;

use crate::constants::dates::DEFAULT_DAY;
use crate::errors::CorpusError;

/// Calendar bounds of one issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IssueDates {
    /// First day of the first month.
    pub start_issue: NaiveDate,
    /// Last month of the range, on the same day as `start_issue`.
    pub end_issue: NaiveDate,
}

/// Parse an annotated issue date string into start and end dates.
///
/// Accepted shapes:
/// - `June 1965`: day 1, start and end in June.
/// - `June-July 1965`: day 1, start in June, end in July.
/// - `7 June 1965` or `June 7 1965`: day 7, start and end in June.
///
/// Seasonal names and misspelled months are rejected; callers replace them
/// before parsing (see [`crate::normalize::prenormalize_dates`]).
pub fn parse_issue_dates(dates: &str) -> Result<IssueDates, CorpusError> {
    let has_hyphen = dates.contains('-');
    let tokens: Vec<&str> = dates
        .split(|c: char| c == '-' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .collect();
    if tokens.len() < 2 {
        return Err(date_error(dates, "expected a month name and a year"));
    }

    let (day, start_month) = if tokens.len() == 3 && !has_hyphen {
        if is_day_token(tokens[0]) {
            (tokens[0], tokens[1])
        } else {
            (tokens[1], tokens[0])
        }
    } else {
        ("", tokens[0])
    };
    let end_month = if has_hyphen && tokens.len() > 2 {
        tokens[1]
    } else {
        start_month
    };
    let year_token = tokens[tokens.len() - 1];

    let day = if day.is_empty() {
        DEFAULT_DAY
    } else {
        day.parse::<u32>()
            .map_err(|_| date_error(dates, &format!("'{day}' is not a day of month")))?
    };
    let year = year_token
        .parse::<i32>()
        .map_err(|_| date_error(dates, &format!("'{year_token}' is not a year")))?;

    Ok(IssueDates {
        start_issue: build_date(dates, year, start_month, day)?,
        end_issue: build_date(dates, year, end_month, day)?,
    })
}

fn build_date(dates: &str, year: i32, month: &str, day: u32) -> Result<NaiveDate, CorpusError> {
    let month_number = month_token_to_number(&month.to_ascii_lowercase())
        .ok_or_else(|| date_error(dates, &format!("'{month}' is not a month name")))?;
    NaiveDate::from_ymd_opt(year, month_number, day)
        .ok_or_else(|| date_error(dates, &format!("day {day} does not exist in {month} {year}")))
}

fn is_day_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|ch| ch.is_ascii_digit())
}

fn date_error(dates: &str, reason: &str) -> CorpusError {
    CorpusError::DateFormat {
        dates: dates.to_string(),
        reason: reason.to_string(),
    }
}

/// Convert a lowercase month token to a month number (1-12).
fn month_token_to_number(token: &str) -> Option<u32> {
    match token.trim_end_matches('.') {
        "jan" | "january" => Some(1),
        "feb" | "february" => Some(2),
        "mar" | "march" => Some(3),
        "apr" | "april" => Some(4),
        "may" => Some(5),
        "jun" | "june" => Some(6),
        "jul" | "july" => Some(7),
        "aug" | "august" => Some(8),
        "sep" | "sept" | "september" => Some(9),
        "oct" | "october" => Some(10),
        "nov" | "november" => Some(11),
        "dec" | "december" => Some(12),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn parses_single_month() {
        let parsed = parse_issue_dates("July 1967").unwrap();
        assert_eq!(parsed.start_issue, ymd(1967, 7, 1));
        assert_eq!(parsed.end_issue, ymd(1967, 7, 1));
    }

    #[test]
    fn parses_month_range() {
        let parsed = parse_issue_dates("June-July 1965").unwrap();
        assert_eq!(parsed.start_issue, ymd(1965, 6, 1));
        assert_eq!(parsed.end_issue, ymd(1965, 7, 1));
    }

    #[test]
    fn parses_day_in_either_position() {
        let day_first = parse_issue_dates("7 June 1965").unwrap();
        let month_first = parse_issue_dates("June 7 1965").unwrap();
        assert_eq!(day_first.start_issue, ymd(1965, 6, 7));
        assert_eq!(day_first, month_first);
        assert_eq!(month_first.end_issue, ymd(1965, 6, 7));
    }

    #[test]
    fn month_names_ignore_case_and_abbreviation() {
        assert_eq!(
            parse_issue_dates("DECEMBER 1966").unwrap().start_issue,
            ymd(1966, 12, 1)
        );
        assert_eq!(
            parse_issue_dates("Sept. 1966").unwrap().start_issue,
            ymd(1966, 9, 1)
        );
    }

    #[test]
    fn rejects_unnormalized_names() {
        assert!(matches!(
            parse_issue_dates("Summer 1967"),
            Err(CorpusError::DateFormat { dates, .. }) if dates == "Summer 1967"
        ));
        assert!(matches!(
            parse_issue_dates("Decmeber 1965"),
            Err(CorpusError::DateFormat { .. })
        ));
    }

    #[test]
    fn rejects_malformed_shapes() {
        assert!(parse_issue_dates("").is_err());
        assert!(parse_issue_dates("1965").is_err());
        assert!(parse_issue_dates("June 19x5").is_err());
        assert!(parse_issue_dates("31 June 1965").is_err());
        assert!(parse_issue_dates("June July 1965").is_err());
    }
}

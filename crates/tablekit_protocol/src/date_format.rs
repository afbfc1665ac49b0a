//! The twelve supported date display patterns.
//!
//! A date field stores ISO-8601 on the wire regardless of pattern; the
//! pattern only governs how the value is rendered and how typed input is
//! parsed. Parsing is strict: the input must match the pattern's length and
//! tokens exactly, so a half-typed value never coerces to a valid-but-wrong
//! date.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Date/date-time display pattern, named by its wire token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DateFormat {
    #[default]
    #[serde(rename = "dd/MM/yyyy")]
    DayMonthYearSlash,
    #[serde(rename = "MM/dd/yyyy")]
    MonthDayYearSlash,
    #[serde(rename = "yyyy/MM/dd")]
    YearMonthDaySlash,
    #[serde(rename = "dd-MM-yyyy")]
    DayMonthYearDash,
    #[serde(rename = "MM-dd-yyyy")]
    MonthDayYearDash,
    #[serde(rename = "yyyy-MM-dd")]
    YearMonthDayDash,
    #[serde(rename = "dd/MM/yyyy HH:mm")]
    DayMonthYearSlashTime,
    #[serde(rename = "MM/dd/yyyy HH:mm")]
    MonthDayYearSlashTime,
    #[serde(rename = "yyyy/MM/dd HH:mm")]
    YearMonthDaySlashTime,
    #[serde(rename = "dd-MM-yyyy HH:mm")]
    DayMonthYearDashTime,
    #[serde(rename = "MM-dd-yyyy HH:mm")]
    MonthDayYearDashTime,
    #[serde(rename = "yyyy-MM-dd HH:mm")]
    YearMonthDayDashTime,
}

/// Failure to parse typed input under a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{input}' does not match the pattern {pattern}")]
pub struct DateParseError {
    pub input: String,
    pub pattern: &'static str,
}

impl DateFormat {
    pub const ALL: [DateFormat; 12] = [
        DateFormat::DayMonthYearSlash,
        DateFormat::MonthDayYearSlash,
        DateFormat::YearMonthDaySlash,
        DateFormat::DayMonthYearDash,
        DateFormat::MonthDayYearDash,
        DateFormat::YearMonthDayDash,
        DateFormat::DayMonthYearSlashTime,
        DateFormat::MonthDayYearSlashTime,
        DateFormat::YearMonthDaySlashTime,
        DateFormat::DayMonthYearDashTime,
        DateFormat::MonthDayYearDashTime,
        DateFormat::YearMonthDayDashTime,
    ];

    /// The wire token, e.g. `dd/MM/yyyy HH:mm`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DateFormat::DayMonthYearSlash => "dd/MM/yyyy",
            DateFormat::MonthDayYearSlash => "MM/dd/yyyy",
            DateFormat::YearMonthDaySlash => "yyyy/MM/dd",
            DateFormat::DayMonthYearDash => "dd-MM-yyyy",
            DateFormat::MonthDayYearDash => "MM-dd-yyyy",
            DateFormat::YearMonthDayDash => "yyyy-MM-dd",
            DateFormat::DayMonthYearSlashTime => "dd/MM/yyyy HH:mm",
            DateFormat::MonthDayYearSlashTime => "MM/dd/yyyy HH:mm",
            DateFormat::YearMonthDaySlashTime => "yyyy/MM/dd HH:mm",
            DateFormat::DayMonthYearDashTime => "dd-MM-yyyy HH:mm",
            DateFormat::MonthDayYearDashTime => "MM-dd-yyyy HH:mm",
            DateFormat::YearMonthDayDashTime => "yyyy-MM-dd HH:mm",
        }
    }

    pub fn has_time(&self) -> bool {
        self.as_str().len() > 10
    }

    fn chrono_pattern(&self) -> &'static str {
        match self {
            DateFormat::DayMonthYearSlash => "%d/%m/%Y",
            DateFormat::MonthDayYearSlash => "%m/%d/%Y",
            DateFormat::YearMonthDaySlash => "%Y/%m/%d",
            DateFormat::DayMonthYearDash => "%d-%m-%Y",
            DateFormat::MonthDayYearDash => "%m-%d-%Y",
            DateFormat::YearMonthDayDash => "%Y-%m-%d",
            DateFormat::DayMonthYearSlashTime => "%d/%m/%Y %H:%M",
            DateFormat::MonthDayYearSlashTime => "%m/%d/%Y %H:%M",
            DateFormat::YearMonthDaySlashTime => "%Y/%m/%d %H:%M",
            DateFormat::DayMonthYearDashTime => "%d-%m-%Y %H:%M",
            DateFormat::MonthDayYearDashTime => "%m-%d-%Y %H:%M",
            DateFormat::YearMonthDayDashTime => "%Y-%m-%d %H:%M",
        }
    }

    /// Render a value under this pattern. Presentation only - the stored ISO
    /// value is never derived from this output.
    pub fn format(&self, value: NaiveDateTime) -> String {
        value.format(self.chrono_pattern()).to_string()
    }

    /// Strict parse: length and tokens must match exactly.
    pub fn parse_strict(&self, input: &str) -> Result<NaiveDateTime, DateParseError> {
        let fail = || DateParseError {
            input: input.to_string(),
            pattern: self.as_str(),
        };
        // Every token is fixed-width once zero-padded, so a length mismatch
        // is already a rejection (chrono alone would accept "1/2/2024").
        if input.len() != self.as_str().len() {
            return Err(fail());
        }
        if self.has_time() {
            NaiveDateTime::parse_from_str(input, self.chrono_pattern()).map_err(|_| fail())
        } else {
            NaiveDate::parse_from_str(input, self.chrono_pattern())
                .map_err(|_| fail())
                .map(|d| d.and_hms_opt(0, 0, 0).expect("midnight is always valid"))
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|fmt| fmt.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Invalid date format: '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(12, 5, 0)
            .unwrap()
    }

    #[test]
    fn twelve_distinct_tokens() {
        let mut tokens: Vec<_> = DateFormat::ALL.iter().map(|f| f.as_str()).collect();
        tokens.dedup();
        assert_eq!(tokens.len(), 12);
    }

    #[test]
    fn format_and_parse_agree() {
        for fmt in DateFormat::ALL {
            let rendered = fmt.format(noon());
            let parsed = fmt.parse_strict(&rendered).unwrap();
            assert_eq!(parsed.date(), noon().date(), "{}", fmt);
            if fmt.has_time() {
                assert_eq!(parsed.time(), noon().time(), "{}", fmt);
            }
        }
    }

    #[test]
    fn half_typed_input_is_rejected() {
        let fmt = DateFormat::DayMonthYearSlash;
        assert!(fmt.parse_strict("31/01/202").is_err());
        assert!(fmt.parse_strict("1/1/2024").is_err());
        assert!(fmt.parse_strict("31-01-2024").is_err());
        assert!(fmt.parse_strict("31/01/2024").is_ok());
    }

    #[test]
    fn wrong_calendar_dates_fail() {
        let fmt = DateFormat::YearMonthDayDash;
        assert!(fmt.parse_strict("2024-02-30").is_err());
    }

    #[test]
    fn serde_uses_the_token() {
        let json = serde_json::to_string(&DateFormat::MonthDayYearSlashTime).unwrap();
        assert_eq!(json, "\"MM/dd/yyyy HH:mm\"");
        let parsed: DateFormat = serde_json::from_str("\"yyyy-MM-dd\"").unwrap();
        assert_eq!(parsed, DateFormat::YearMonthDayDash);
    }
}

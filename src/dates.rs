use std::str::FromStr;

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateParseError {
    #[error("`{0}` is not a date, expected MM/DD/YY")]
    Format(String),
    #[error("`{0}` has a year that isn't two digits, expected MM/DD/YY")]
    Year(String),
    #[error("`{0}` is not a valid calendar date")]
    Invalid(String),
}

/// Parses the dates typed by users, such as `3/4/25` or `03/04/25`.
///
/// Month and day are zero-padded before parsing. The year must be given with
/// two digits; longer years are refused rather than reinterpreted.
pub fn parse(text: &str) -> Result<NaiveDate, DateParseError> {
    let text = text.trim();
    let parts: Vec<&str> = text.split('/').collect();

    let [month, day, year] = parts.as_slice() else {
        return Err(DateParseError::Format(text.to_string()));
    };

    let numeric = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit());
    if !(numeric(*month) && numeric(*day) && numeric(*year)) || month.len() > 2 || day.len() > 2 {
        return Err(DateParseError::Format(text.to_string()));
    }
    if year.len() != 2 {
        return Err(DateParseError::Year(text.to_string()));
    }

    let padded = format!("{:0>2}/{:0>2}/{}", month, day, year);
    NaiveDate::parse_from_str(&padded, "%m/%d/%y")
        .map_err(|_| DateParseError::Invalid(text.to_string()))
}

/// Due date argument of the slash commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueDate(pub NaiveDate);

impl FromStr for DueDate {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s).map(DueDate)
    }
}

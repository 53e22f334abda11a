//! The calendar month that scopes settlements and the month lock.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{Date, Month};

use crate::Error;

/// A (year, month) pair, e.g. 2021-03.
///
/// The settlement month of a transaction is the [YearMonth] of its date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: Month,
}

impl YearMonth {
    /// Create a new year-month.
    ///
    /// # Errors
    /// Returns [Error::InvalidMonth] if `year` is not a four digit year.
    pub fn new(year: i32, month: Month) -> Result<Self, Error> {
        if !(0..=9999).contains(&year) {
            return Err(Error::InvalidMonth(format!("{year}-{:02}", month as u8)));
        }

        Ok(Self { year, month })
    }

    /// The month that `date` falls in.
    pub fn from_date(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month of the year.
    pub fn month(&self) -> Month {
        self.month
    }

    /// The first day of the month.
    pub fn first_day(&self) -> Date {
        // Day 1 exists in every month.
        Date::from_calendar_date(self.year, self.month, 1).unwrap_or(Date::MIN)
    }

    /// The first day of the following month, i.e. the exclusive upper bound of this month.
    pub fn first_day_of_next_month(&self) -> Date {
        let (year, month) = match self.month {
            Month::December => (self.year + 1, Month::January),
            month => (self.year, month.next()),
        };

        Date::from_calendar_date(year, month, 1).unwrap_or(Date::MAX)
    }

    /// The last day of the month.
    pub fn last_day(&self) -> Date {
        self.first_day_of_next_month()
            .previous_day()
            .unwrap_or(Date::MAX)
    }

    /// Whether `date` falls inside this month.
    pub fn contains(&self, date: Date) -> bool {
        Self::from_date(date) == *self
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month as u8)
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    /// Parse a month in the strict format `yyyy-MM`, e.g. "2021-03".
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidMonth(text.to_owned());
        let bytes = text.as_bytes();

        if bytes.len() != 7 || bytes[4] != b'-' {
            return Err(invalid());
        }

        let all_digits = bytes[..4]
            .iter()
            .chain(&bytes[5..])
            .all(|byte| byte.is_ascii_digit());

        if !all_digits {
            return Err(invalid());
        }

        let year: i32 = text[..4].parse().map_err(|_| invalid())?;
        let month: u8 = text[5..].parse().map_err(|_| invalid())?;
        let month = Month::try_from(month).map_err(|_| invalid())?;

        Self::new(year, month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl ToSql for YearMonth {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for YearMonth {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        text.parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

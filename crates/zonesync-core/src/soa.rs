//! SOA serial-number codec
//!
//! Serial numbers are ten digits: an eight digit `YYYYMMDD` date followed by
//! a two digit version (`00`-`99`). Incrementing is day-boundary aware and
//! never wraps, so every exported serial is strictly larger than the one it
//! replaces.

use chrono::{Datelike, NaiveDate, Utc};
use std::fmt;

use crate::error::SerialError;

const DATE_FORMAT: &str = "%Y%m%d";
const MAX_VERSION: u32 = 99;

/// A date + version SOA serial number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SerialNumber {
    date: NaiveDate,
    version: u32,
}

impl SerialNumber {
    /// Build a serial number from its parts
    pub fn new(date: NaiveDate, version: u32) -> Result<Self, SerialError> {
        if version > MAX_VERSION {
            return Err(SerialError::VersionOutOfRange(version));
        }
        Ok(Self { date, version })
    }

    /// Parse a ten digit serial, rejecting dates after today (UTC)
    pub fn parse(text: &str) -> Result<Self, SerialError> {
        Self::parse_at(text, today())
    }

    /// Parse a ten digit serial, rejecting dates after `today`
    pub fn parse_at(text: &str, today: NaiveDate) -> Result<Self, SerialError> {
        if text.len() != 10 || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SerialError::Malformed(text.to_string()));
        }

        let (date_part, version_part) = text.split_at(8);
        let date = NaiveDate::parse_from_str(date_part, DATE_FORMAT)
            .map_err(|_| SerialError::InvalidDate(text.to_string()))?;
        if date > today {
            return Err(SerialError::FutureDate(text.to_string()));
        }

        let version: u32 = version_part
            .parse()
            .map_err(|_| SerialError::Malformed(text.to_string()))?;

        Self::new(date, version)
    }

    /// The date part
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The version part (0-99)
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Advance the serial against today's date (UTC)
    pub fn inc(&mut self) -> Result<(), SerialError> {
        self.inc_at(today())
    }

    /// Advance the serial against `today`
    ///
    /// A serial from any other day restarts at `today` version 0. On the same
    /// day the version goes up by one; at version 99 the serial is left
    /// untouched and an error is returned.
    pub fn inc_at(&mut self, today: NaiveDate) -> Result<(), SerialError> {
        if self.date != today {
            self.date = today;
            self.version = 0;
            return Ok(());
        }
        if self.version >= MAX_VERSION {
            return Err(SerialError::CeilingReached(self.to_string()));
        }
        self.version += 1;
        Ok(())
    }

    /// Numeric form as carried by the SOA record
    pub fn as_u32(&self) -> u32 {
        let value = u64::from(self.date.year().unsigned_abs()) * 1_000_000
            + u64::from(self.date.month()) * 10_000
            + u64::from(self.date.day()) * 100
            + u64::from(self.version);
        // YYYYMMDDvv stays below u32::MAX until year 4294
        u32::try_from(value).unwrap_or(u32::MAX)
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}", self.date.format(DATE_FORMAT), self.version)
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

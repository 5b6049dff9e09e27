//! Board time handling.
//!
//! Platform boards show times as zero-padded "HH:MM" strings with no date
//! attached. This module provides a time-of-day type whose ordering matches
//! lexicographic order on the rendered string, and whose arithmetic wraps
//! around midnight the way a rolling departure board does.

use std::fmt;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Minutes in a day.
const DAY_MINUTES: i64 = 24 * 60;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A wall-clock time of day as shown on a platform board.
///
/// Stored as minutes since midnight. Because the rendered form is always
/// fixed-width `"HH:MM"`, the derived ordering is identical to lexicographic
/// order on the string representation.
///
/// # Examples
///
/// ```
/// use status_server::domain::BoardTime;
///
/// let t = BoardTime::parse_hhmm("14:30").unwrap();
/// assert_eq!(t.to_string(), "14:30");
///
/// // Arithmetic wraps around midnight
/// let late = BoardTime::parse_hhmm("23:30").unwrap();
/// assert_eq!(late.plus_minutes(60).to_string(), "00:30");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoardTime(u16);

impl BoardTime {
    /// Create a time from hour and minute components.
    ///
    /// Returns `None` if `hour > 23` or `minute > 59`.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(BoardTime((hour * 60 + minute) as u16))
    }

    /// Parse a time from "HH:MM" format.
    ///
    /// # Examples
    ///
    /// ```
    /// use status_server::domain::BoardTime;
    ///
    /// // Valid times
    /// assert!(BoardTime::parse_hhmm("00:00").is_ok());
    /// assert!(BoardTime::parse_hhmm("23:59").is_ok());
    ///
    /// // Invalid formats
    /// assert!(BoardTime::parse_hhmm("1430").is_err());
    /// assert!(BoardTime::parse_hhmm("14:3").is_err());
    /// assert!(BoardTime::parse_hhmm("25:00").is_err());
    /// ```
    pub fn parse_hhmm(s: &str) -> Result<Self, TimeError> {
        // Must be exactly 5 characters: HH:MM
        if s.len() != 5 {
            return Err(TimeError::new("expected HH:MM format"));
        }

        let bytes = s.as_bytes();

        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }

        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        Ok(BoardTime((hour * 60 + minute) as u16))
    }

    /// Returns the hour (0-23).
    pub fn hour(&self) -> u32 {
        (self.0 / 60) as u32
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u32 {
        (self.0 % 60) as u32
    }

    /// Returns minutes since midnight (0-1439).
    pub fn minutes_of_day(&self) -> u16 {
        self.0
    }

    /// Add a signed number of minutes, wrapping around midnight.
    ///
    /// A board shows only times of day, so `23:50 + 20min` is `00:10` and
    /// `00:10 - 20min` is `23:50`.
    pub fn plus_minutes(self, minutes: i64) -> Self {
        let total = (self.0 as i64 + minutes).rem_euclid(DAY_MINUTES);
        BoardTime(total as u16)
    }
}

impl From<NaiveTime> for BoardTime {
    /// Truncates seconds: a board never shows them.
    fn from(t: NaiveTime) -> Self {
        BoardTime((t.hour() * 60 + t.minute()) as u16)
    }
}

impl TryFrom<String> for BoardTime {
    type Error = TimeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        BoardTime::parse_hhmm(&s)
    }
}

impl From<BoardTime> for String {
    fn from(t: BoardTime) -> String {
        t.to_string()
    }
}

impl fmt::Debug for BoardTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoardTime({:02}:{:02})", self.hour(), self.minute())
    }
}

impl fmt::Display for BoardTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

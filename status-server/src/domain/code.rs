//! Station code types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid station code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station code: {reason}")]
pub struct InvalidStationCode {
    reason: &'static str,
}

/// A validated Indian Railways station code.
///
/// Station codes are 2-5 ASCII letters or digits (e.g. `NDLS`, `BCT`, `HWH`).
/// Parsing trims surrounding whitespace and uppercases, so user input like
/// `"ndls"` normalizes to `NDLS`. Any `StationCode` value is valid by
/// construction.
///
/// # Examples
///
/// ```
/// use status_server::domain::StationCode;
///
/// let ndls = StationCode::parse("ndls").unwrap();
/// assert_eq!(ndls.as_str(), "NDLS");
///
/// // Blank input is rejected
/// assert!(StationCode::parse("").is_err());
/// assert!(StationCode::parse("   ").is_err());
///
/// // Wrong length is rejected
/// assert!(StationCode::parse("N").is_err());
/// assert!(StationCode::parse("NEWDELHI").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StationCode(String);

impl StationCode {
    /// Parse a station code from user or wire input.
    ///
    /// Trims surrounding whitespace and uppercases before validating.
    /// The trimmed input must be 2-5 ASCII letters or digits.
    pub fn parse(s: &str) -> Result<Self, InvalidStationCode> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(InvalidStationCode {
                reason: "must not be blank",
            });
        }

        if trimmed.len() < 2 || trimmed.len() > 5 {
            return Err(InvalidStationCode {
                reason: "must be 2-5 characters",
            });
        }

        if !trimmed.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(InvalidStationCode {
                reason: "must be ASCII letters or digits",
            });
        }

        Ok(StationCode(trimmed.to_ascii_uppercase()))
    }

    /// Returns the normalized (uppercase) code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Boundary predicate for user-entered station codes.
///
/// Presentation code should check this before invoking a fetch, so blank or
/// malformed input is rejected at the edge instead of deep in the stack.
///
/// # Examples
///
/// ```
/// use status_server::domain::is_valid_station_code;
///
/// assert!(is_valid_station_code("NDLS"));
/// assert!(is_valid_station_code("ndls"));
/// assert!(!is_valid_station_code(""));
/// assert!(!is_valid_station_code("N D L"));
/// ```
pub fn is_valid_station_code(s: &str) -> bool {
    StationCode::parse(s).is_ok()
}

impl TryFrom<String> for StationCode {
    type Error = InvalidStationCode;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        StationCode::parse(&s)
    }
}

impl From<StationCode> for String {
    fn from(code: StationCode) -> String {
        code.0
    }
}

impl fmt::Debug for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationCode({})", self.0)
    }
}

impl fmt::Display for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

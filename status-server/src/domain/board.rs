//! Canonical station snapshot types.
//!
//! A [`StationInfo`] is the unit of data the whole service moves around:
//! built fresh by a data source on every fetch, validated, then handed to
//! consumers as an immutable snapshot. Nothing mutates a snapshot in place.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::code::StationCode;
use super::status::{StatusKind, TrainStatus};
use super::time::BoardTime;

/// Platform label shown for a cancelled train.
pub const CANCELLED_PLATFORM: &str = "--";

/// One train's state at a station.
///
/// The status-specific fields (delay minutes, next stop) live inside
/// [`TrainStatus`], so a `TrainPlatformInfo` cannot express a delayed train
/// without a delay or a departed train without a next stop. The platform
/// sentinel rule is checked by [`StationInfo::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainPlatformInfo {
    /// Five-digit train number, unique within a snapshot.
    pub train_number: String,

    /// Display name.
    pub train_name: String,

    /// When the train is expected at the platform.
    pub expected_arrival: BoardTime,

    /// When the train is expected to leave.
    pub expected_departure: BoardTime,

    /// Platform label; `"--"` exactly when the train is cancelled.
    pub platform: String,

    /// Status plus its status-specific payload, flattened on the wire.
    #[serde(flatten)]
    pub status: TrainStatus,

    /// Origin city. Never the board station's own city.
    pub source: String,

    /// Destination city. Never the board station's own city.
    pub destination: String,
}

/// A snapshot of one station's platform board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationInfo {
    /// Normalized station code.
    pub code: StationCode,

    /// Station display name.
    pub name: String,

    /// City the station is in.
    pub city: String,

    /// Trains sorted ascending by expected arrival.
    pub trains: Vec<TrainPlatformInfo>,

    /// When this snapshot was created.
    pub last_updated: DateTime<Utc>,
}

/// A snapshot that violates the platform-board invariants.
///
/// A live payload failing these checks is treated as malformed by the feed
/// layer and discarded; a synthesized snapshot failing them is a
/// programming error and is surfaced to the polling controller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("train {train_number}: platform must be \"--\" exactly when cancelled")]
    PlatformSentinel { train_number: String },

    #[error("train {train_number}: {endpoint} equals the station's own city {city}")]
    EndpointIsHomeCity {
        train_number: String,
        endpoint: &'static str,
        city: String,
    },

    #[error("train number {train_number} is not 5 digits starting 1-9")]
    BadTrainNumber { train_number: String },

    #[error("train {train_number} appears more than once")]
    DuplicateTrainNumber { train_number: String },

    #[error("trains out of order at {train_number}: expected arrivals must be non-decreasing")]
    OutOfOrder { train_number: String },
}

impl StationInfo {
    /// Check every invariant the type system does not already enforce.
    ///
    /// Returns the first violation found, walking trains in board order.
    pub fn validate(&self) -> Result<(), BoardError> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut prev_arrival: Option<BoardTime> = None;

        for train in &self.trains {
            let cancelled = train.status.kind() == StatusKind::Cancelled;
            if cancelled != (train.platform == CANCELLED_PLATFORM) {
                return Err(BoardError::PlatformSentinel {
                    train_number: train.train_number.clone(),
                });
            }

            if train.source == self.city {
                return Err(BoardError::EndpointIsHomeCity {
                    train_number: train.train_number.clone(),
                    endpoint: "source",
                    city: self.city.clone(),
                });
            }
            if train.destination == self.city {
                return Err(BoardError::EndpointIsHomeCity {
                    train_number: train.train_number.clone(),
                    endpoint: "destination",
                    city: self.city.clone(),
                });
            }

            if !is_train_number(&train.train_number) {
                return Err(BoardError::BadTrainNumber {
                    train_number: train.train_number.clone(),
                });
            }

            if !seen.insert(train.train_number.as_str()) {
                return Err(BoardError::DuplicateTrainNumber {
                    train_number: train.train_number.clone(),
                });
            }

            if let Some(prev) = prev_arrival {
                if train.expected_arrival < prev {
                    return Err(BoardError::OutOfOrder {
                        train_number: train.train_number.clone(),
                    });
                }
            }
            prev_arrival = Some(train.expected_arrival);
        }

        Ok(())
    }
}

/// A train number is 5 ASCII digits with a non-zero first digit.
fn is_train_number(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 5
        && (b'1'..=b'9').contains(&bytes[0])
        && bytes[1..].iter().all(|b| b.is_ascii_digit())
}

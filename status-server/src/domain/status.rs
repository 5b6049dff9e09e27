//! Train status enumeration and the timing classifier.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::time::BoardTime;

/// The discrete status values a train on a platform board can show.
///
/// This is the fieldless mirror of [`TrainStatus`], used where only the
/// variant matters (classification, filtering, tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    OnTime,
    Delayed,
    Arrived,
    Departed,
    Cancelled,
}

/// A train's status together with the data that only exists in that status.
///
/// Delay minutes only accompany a delayed train, and onward-journey details
/// only accompany a departed one, so those fields live on the variants and
/// the invariants hold by construction. The serde representation is tagged
/// on `"status"` with the variant's fields alongside it, which is also the
/// wire shape of the live feed:
///
/// ```
/// use status_server::domain::TrainStatus;
///
/// let delayed = TrainStatus::Delayed { delay_minutes: 15 };
/// let json = serde_json::to_value(&delayed).unwrap();
/// assert_eq!(json["status"], "DELAYED");
/// assert_eq!(json["delayMinutes"], 15);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "status",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum TrainStatus {
    OnTime,
    Delayed {
        delay_minutes: u32,
    },
    Arrived,
    Departed {
        next_station: String,
        next_station_arrival: BoardTime,
    },
    Cancelled,
}

impl TrainStatus {
    /// Returns the fieldless kind of this status.
    pub fn kind(&self) -> StatusKind {
        match self {
            TrainStatus::OnTime => StatusKind::OnTime,
            TrainStatus::Delayed { .. } => StatusKind::Delayed,
            TrainStatus::Arrived => StatusKind::Arrived,
            TrainStatus::Departed { .. } => StatusKind::Departed,
            TrainStatus::Cancelled => StatusKind::Cancelled,
        }
    }
}

impl fmt::Display for TrainStatus {
    /// The badge text a board renders for this status.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainStatus::OnTime => f.write_str("On Time"),
            TrainStatus::Delayed { delay_minutes } => {
                write!(f, "Delayed by {delay_minutes} mins")
            }
            TrainStatus::Arrived => f.write_str("Arrived"),
            TrainStatus::Departed { .. } => f.write_str("Departed"),
            TrainStatus::Cancelled => f.write_str("Cancelled"),
        }
    }
}

/// Classify a train's status from its raw timing fields.
///
/// Offsets are signed minutes relative to now; negative means in the past.
/// `delay_minutes` is 0 when no delay is reported. A reported delay wins
/// over anything the offsets say.
///
/// Cancellation is not a timing property: the data source decides it with
/// its own draw before consulting this function, so `Cancelled` is never
/// returned here and the function is fully deterministic.
///
/// # Examples
///
/// ```
/// use status_server::domain::{classify, StatusKind};
///
/// // Arrived: came in 10 minutes ago, leaves in 20
/// assert_eq!(classify(-10, 20, 0), StatusKind::Arrived);
///
/// // A delay overrides the offsets
/// assert_eq!(classify(5, 25, 15), StatusKind::Delayed);
/// ```
pub fn classify(
    arrival_offset_mins: i64,
    departure_offset_mins: i64,
    delay_minutes: u32,
) -> StatusKind {
    if delay_minutes > 0 {
        StatusKind::Delayed
    } else if arrival_offset_mins < 0 && departure_offset_mins > 0 {
        StatusKind::Arrived
    } else if departure_offset_mins < 0 {
        StatusKind::Departed
    } else {
        StatusKind::OnTime
    }
}

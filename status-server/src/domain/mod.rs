//! Domain types for the platform status service.
//!
//! This module contains the core model: validated station codes, board
//! times, train status, and the station snapshot. Types enforce their
//! invariants at construction time where possible, so code that receives
//! them can trust their validity; the remaining cross-field rules live in
//! [`StationInfo::validate`].

mod board;
mod code;
mod status;
mod time;

pub use board::{BoardError, CANCELLED_PLATFORM, StationInfo, TrainPlatformInfo};
pub use code::{InvalidStationCode, StationCode, is_valid_station_code};
pub use status::{StatusKind, TrainStatus, classify};
pub use time::{BoardTime, TimeError};

//! Synthetic board generation.
//!
//! When no live feed is configured, or the configured feed fails, the
//! service still has to answer with something that looks like a real
//! departure board. This module fabricates one for any station code: a
//! handful of trains with mutually consistent timings and statuses,
//! anchored to the current time.

use std::collections::HashSet;

use chrono::{Local, Utc};
use rand::Rng;

use super::directory::station_identity;
use crate::domain::{
    BoardTime, CANCELLED_PLATFORM, StationCode, StationInfo, StatusKind, TrainPlatformInfo,
    TrainStatus, classify,
};

/// Cities trains run between. Never contains the unknown-station
/// fallback city, so filtering a board's home city out always leaves
/// somewhere for its trains to go.
const CITIES: &[&str] = &[
    "New Delhi",
    "Mumbai",
    "Kolkata",
    "Chennai",
    "Bengaluru",
    "Hyderabad",
    "Ahmedabad",
    "Pune",
    "Jaipur",
    "Lucknow",
    "Patna",
    "Bhopal",
    "Nagpur",
    "Kanpur",
    "Agra",
];

/// Display names for synthesized trains.
const TRAIN_NAMES: &[&str] = &[
    "Rajdhani Express",
    "Shatabdi Express",
    "Duronto Express",
    "Sampark Kranti Express",
    "Garib Rath Express",
    "Jan Shatabdi Express",
    "Humsafar Express",
    "Tejas Express",
    "Vande Bharat Express",
    "Intercity Express",
    "Superfast Express",
    "Mail Express",
];

/// Platform labels a synthesized train can be assigned.
const PLATFORMS: &[&str] = &["1", "2", "3", "4", "5", "6", "7", "8"];

/// Bounds on how many trains a synthesized board shows.
const MIN_TRAINS: usize = 5;
const MAX_TRAINS: usize = 10;

/// How far around now a synthesized arrival can fall, in minutes.
const ARRIVAL_OFFSET_MIN: i64 = -30;
const ARRIVAL_OFFSET_MAX: i64 = 90;

/// Bounds on how long a train sits at the platform, in minutes.
const DWELL_MIN: i64 = 5;
const DWELL_MAX: i64 = 25;

/// Chance that a synthesized train carries a reported delay.
const DELAY_PROBABILITY: f64 = 0.4;

/// Bounds on the reported delay, in minutes.
const DELAY_MIN: u32 = 5;
const DELAY_MAX: u32 = 60;

/// Residual chance that a train whose timings leave it on time is
/// cancelled instead.
const CANCEL_PROBABILITY: f64 = 0.05;

/// Minutes from departure here to arrival at a departed train's next stop.
const ONWARD_LEG_MINUTES: i64 = 60;

/// Generate a synthetic board for a station.
///
/// `now` anchors every timing field. The result always satisfies
/// [`StationInfo::validate`]: trains are sorted by expected arrival, train
/// numbers are unique, and statuses agree with their timings.
///
/// # Examples
///
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use status_server::domain::{BoardTime, StationCode};
/// use status_server::feed::generate_board;
///
/// let code = StationCode::parse("NDLS").unwrap();
/// let now = BoardTime::from_hm(9, 30).unwrap();
/// let board = generate_board(&code, now, &mut StdRng::seed_from_u64(42));
/// assert!(board.validate().is_ok());
/// assert_eq!(board.city, "New Delhi");
/// ```
pub fn generate_board(code: &StationCode, now: BoardTime, rng: &mut impl Rng) -> StationInfo {
    let identity = station_identity(code);
    let count = rng.random_range(MIN_TRAINS..=MAX_TRAINS);

    // Endpoints exclude the board's own city. An unknown station's
    // fallback city is not in the pool, so nothing is filtered out then.
    let away: Vec<&str> = CITIES
        .iter()
        .copied()
        .filter(|&c| c != identity.city)
        .collect();

    let mut numbers = HashSet::new();
    let mut trains: Vec<TrainPlatformInfo> = (0..count)
        .map(|_| generate_train(&away, now, &mut numbers, rng))
        .collect();

    trains.sort_by_key(|t| t.expected_arrival);

    StationInfo {
        code: code.clone(),
        name: identity.name,
        city: identity.city,
        trains,
        last_updated: Utc::now(),
    }
}

fn generate_train(
    away: &[&str],
    now: BoardTime,
    numbers: &mut HashSet<u32>,
    rng: &mut impl Rng,
) -> TrainPlatformInfo {
    let arrival_offset = rng.random_range(ARRIVAL_OFFSET_MIN..=ARRIVAL_OFFSET_MAX);
    let departure_offset = arrival_offset + rng.random_range(DWELL_MIN..=DWELL_MAX);

    let expected_arrival = now.plus_minutes(arrival_offset);
    let expected_departure = now.plus_minutes(departure_offset);

    let delay_minutes = if rng.random_bool(DELAY_PROBABILITY) {
        rng.random_range(DELAY_MIN..=DELAY_MAX)
    } else {
        0
    };

    let status = match classify(arrival_offset, departure_offset, delay_minutes) {
        StatusKind::Delayed => TrainStatus::Delayed { delay_minutes },
        StatusKind::Arrived => TrainStatus::Arrived,
        StatusKind::Departed => TrainStatus::Departed {
            next_station: pick(rng, CITIES).to_string(),
            next_station_arrival: expected_departure.plus_minutes(ONWARD_LEG_MINUTES),
        },
        // Timings leave the train on time; a residual draw may cancel it
        _ => {
            if rng.random_bool(CANCEL_PROBABILITY) {
                TrainStatus::Cancelled
            } else {
                TrainStatus::OnTime
            }
        }
    };

    let platform = match status {
        TrainStatus::Cancelled => CANCELLED_PLATFORM.to_string(),
        _ => pick(rng, PLATFORMS).to_string(),
    };

    TrainPlatformInfo {
        train_number: unique_train_number(numbers, rng),
        train_name: pick(rng, TRAIN_NAMES).to_string(),
        expected_arrival,
        expected_departure,
        platform,
        status,
        // Drawn independently, so a train can loop back where it started
        source: pick(rng, away).to_string(),
        destination: pick(rng, away).to_string(),
    }
}

fn pick<'a>(rng: &mut impl Rng, pool: &'a [&'a str]) -> &'a str {
    pool[rng.random_range(0..pool.len())]
}

/// Draw a five-digit train number not already on the board.
///
/// Redraws on collision. At most ten trains share a board against ninety
/// thousand candidate numbers, so the loop is effectively bounded.
fn unique_train_number(numbers: &mut HashSet<u32>, rng: &mut impl Rng) -> String {
    loop {
        let number = rng.random_range(10000..=99999);
        if numbers.insert(number) {
            return number.to_string();
        }
    }
}

/// The degraded-mode data source.
///
/// Answers the same question as the live client, from whole cloth. Every
/// call synthesizes a fresh board anchored to the current local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticSource;

impl SyntheticSource {
    /// Synthesize a snapshot for the station as of now.
    pub fn platform_status(&self, code: &StationCode) -> StationInfo {
        let now = BoardTime::from(Local::now().time());
        generate_board(code, now, &mut rand::rng())
    }
}

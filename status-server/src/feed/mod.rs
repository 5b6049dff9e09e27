//! Station status feed.
//!
//! Two interchangeable sources answer "what is happening at this station
//! right now": an HTTP client for a live feed, and a generator that
//! synthesizes plausible boards offline. [`StatusFetcher`] sits in front
//! of both and quietly swaps in the generator whenever the live feed
//! lets it down.

mod client;
mod directory;
mod error;
mod source;
mod synthetic;

pub use client::{DEFAULT_TIMEOUT_SECS, RemoteClient, RemoteConfig};
pub use directory::{StationIdentity, station_identity};
pub use error::FeedError;
pub use source::{SourceConfig, StationSource, StatusFetcher};
pub use synthetic::{SyntheticSource, generate_board};

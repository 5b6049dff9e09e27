//! Station platform status server.
//!
//! Given a station code, serves a live platform board: every train due at
//! the station with its timings, platform, and a computed running status,
//! refreshed on demand and on a fixed interval. When the live feed is
//! missing or unreachable the server degrades to synthesized boards
//! rather than going dark.

pub mod domain;
pub mod feed;
pub mod poll;
pub mod web;

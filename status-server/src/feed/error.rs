//! Error types for the status feed.

use crate::domain::BoardError;

/// Errors from the live status feed.
///
/// All of these are recoverable: the fetcher answers any of them by
/// switching to the synthetic source, so callers normally never see one.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The client could not be built from its configuration
    #[error("feed config error: {message}")]
    Config { message: String },

    /// The HTTP request itself failed (connection refused, timeout, ...)
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body was not a valid snapshot document
    #[error("json parse error: {message}")]
    Json {
        message: String,
        /// Leading part of the offending body, for the logs
        body: Option<String>,
    },

    /// The decoded snapshot violates the board invariants
    #[error("invalid snapshot: {0}")]
    Invalid(#[from] BoardError),
}

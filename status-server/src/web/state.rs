//! Application state shared across request handlers.

use std::sync::Arc;

use crate::feed::StatusFetcher;
use crate::poll::BoardController;

/// Shared application state.
///
/// Handlers get two services: the fetcher for on-demand lookups of any
/// station, and the controller owning the watched station's board.
#[derive(Clone)]
pub struct AppState {
    /// On-demand status fetcher
    pub fetcher: Arc<StatusFetcher>,
    /// Polling controller for the watched station
    pub board: Arc<BoardController<StatusFetcher>>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(fetcher: StatusFetcher, board: BoardController<StatusFetcher>) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            board: Arc::new(board),
        }
    }
}

//! Web layer for the platform status service.
//!
//! A thin JSON surface over the fetcher and the board controller. The
//! handlers stay small; everything interesting happens below them.

mod routes;
mod state;

pub use routes::{AppError, ErrorResponse, create_router};
pub use state::AppState;

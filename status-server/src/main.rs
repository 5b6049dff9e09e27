use std::net::SocketAddr;
use std::time::Duration;

use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use status_server::domain::StationCode;
use status_server::feed::{SourceConfig, StationSource, StatusFetcher};
use status_server::poll::{BoardController, DEFAULT_POLL_INTERVAL, PollConfig};
use status_server::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut source_config = match std::env::var("FEED_URL") {
        Ok(url) => SourceConfig::live(url),
        Err(_) => SourceConfig::synthetic(),
    };
    if let Ok(api_key) = std::env::var("FEED_API_KEY") {
        source_config = source_config.with_api_key(api_key);
    }

    let source = StationSource::resolve(&source_config).expect("failed to create status source");
    let fetcher = StatusFetcher::new(source);

    let poll_interval = std::env::var("POLL_INTERVAL_SECS")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_POLL_INTERVAL);
    let board = BoardController::new(fetcher.clone(), PollConfig::new(poll_interval));

    // Watch the home station from startup so /api/board has something
    // to say before anyone posts a selection
    let watched = std::env::var("STATION_CODE").unwrap_or_else(|_| "NDLS".to_string());
    match StationCode::parse(&watched) {
        Ok(code) => {
            board.search(code).await;
        }
        Err(e) => warn!(code = %watched, error = %e, "ignoring invalid STATION_CODE"),
    }

    let state = AppState::new(fetcher, board);
    let app = create_router(state.clone());

    let port = std::env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listener");
    info!(%addr, "platform status server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    state.board.close().await;
    info!("terminating");
}

/// Resolves when the process receives an interrupt or terminate signal.
async fn shutdown_signal() {
    let interrupt = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => info!("received interrupt"),
        _ = terminate => info!("received terminate signal"),
    }
}

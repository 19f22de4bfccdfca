use shared::error::InitializationError;
use shared::{load_config, shutdown_listener};
use splits_api::poller::DEFAULT_POLL_INTERVAL_SECS;
use splits_api::{ActiveSplitsState, ApiError, SplitsApi, poll_active_splits};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    Init(#[from] InitializationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

#[tokio::main]
async fn main() -> Result<(), MainError> {
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_env_filter(EnvFilter::from_default_env())
        .finish();

    tracing::subscriber::set_global_default(subscriber).map_err(InitializationError::Tracing)?;

    let config = load_config().map_err(InitializationError::from)?;
    info!(config = ?config, "config loaded");

    let api = SplitsApi::new(&config.api)?;
    let interval = config
        .poller
        .as_ref()
        .map_or(DEFAULT_POLL_INTERVAL_SECS, |p| p.interval_seconds);
    let state = Arc::new(ActiveSplitsState::new());

    let shutdown_token = CancellationToken::new();
    let signal_handle = tokio::spawn(shutdown_listener(Some(shutdown_token.clone())));

    let poller_handle = tokio::spawn(poll_active_splits(
        api,
        Arc::clone(&state),
        Duration::from_secs(interval),
        shutdown_token.clone(),
    ));

    let report_handle = tokio::spawn(report_loop(Arc::clone(&state), shutdown_token.clone()));

    tokio::select! {
        res = poller_handle => {
            shutdown_token.cancel();
            res??;
        }
        res = report_handle => {
            shutdown_token.cancel();
            res?;
        }
        res = signal_handle => {
            shutdown_token.cancel();
            res?;
        }
    }

    Ok(())
}

async fn report_loop(state: Arc<ActiveSplitsState>, shutdown: CancellationToken) {
    loop {
        tokio::select! {
            _ = sleep(Duration::from_secs(30)) => {}
            _ = shutdown.cancelled() => {
                info!("shutdown requested, exiting report loop");
                break;
            }
        }

        let snapshot = state.snapshot();
        info!(
            active = snapshot.active.len(),
            scheduled = snapshot.scheduled.len(),
            server_timestamp = ?snapshot.server_timestamp,
            "current splits"
        );
    }
}

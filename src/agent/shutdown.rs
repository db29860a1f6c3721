use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Detects signals sent to the process and turns them into a regular exit of the agent.
///
/// Returns without cancelling when the agent stopped on its own first.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        result = tokio::signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Received interrupt, shutting down"),
                Err(e) => {
                    error!("Failed to listen for interrupts {e:?}");
                    return;
                }
            }
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}

use tokio::select;
use tokio_util::sync::CancellationToken;

/// Turns a termination signal into a cancellation, which closes the reader
/// and scheduler loops and lets the event loop run its final flush.
pub async fn detect_shutdown(cancellation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancellation.cancel();
        },
        _ = cancellation.cancelled() => (),
    };
}

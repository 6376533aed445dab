use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::utils::clock::Clock;

use super::DaemonEvent;

/// Emits a flush tick on a fixed interval. The tick goes through the same
/// channel as tab events, so a flush can never interleave with event handling.
pub struct FlushScheduler {
    next: mpsc::Sender<DaemonEvent>,
    interval: Duration,
    shutdown: CancellationToken,
    clock: Box<dyn Clock>,
}

impl FlushScheduler {
    pub fn new(
        next: mpsc::Sender<DaemonEvent>,
        interval: Duration,
        shutdown: CancellationToken,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            next,
            interval,
            shutdown,
            clock,
        }
    }

    /// Executes the scheduler event loop.
    pub async fn run(self) -> Result<()> {
        let mut flush_point = self.clock.instant();
        loop {
            flush_point += self.interval;

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.clock.sleep_until(flush_point) => ()
            }

            debug!("Requesting flush");
            if self.next.send(DaemonEvent::Flush).await.is_err() {
                // Consumer is gone, nothing left to schedule for.
                return Ok(());
            }
        }
    }
}

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::browser::EventSource;

use super::DaemonEvent;

/// Pumps extension events into the daemon channel, preserving arrival order.
pub struct EventReader<S> {
    source: S,
    next: mpsc::Sender<DaemonEvent>,
    shutdown: CancellationToken,
}

impl<S: EventSource> EventReader<S> {
    pub fn new(source: S, next: mpsc::Sender<DaemonEvent>, shutdown: CancellationToken) -> Self {
        Self {
            source,
            next,
            shutdown,
        }
    }

    /// Executes the reader event loop. When the extension closes the stream
    /// the rest of the daemon is cancelled too, the browser is gone.
    pub async fn run(mut self) -> Result<()> {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                event = self.source.next_event() => match event {
                    Ok(Some(event)) => {
                        debug!("Received {event:?}");
                        if self.next.send(DaemonEvent::Tab(event)).await.is_err() {
                            return Ok(());
                        }
                    }
                    Ok(None) => {
                        info!("Event stream ended");
                        self.shutdown.cancel();
                        return Ok(());
                    }
                    Err(e) => {
                        error!("Failed to read event: {e:?}");
                        self.shutdown.cancel();
                        return Err(e);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use crate::{
        browser::{MockEventSource, TabEvent},
        daemon::DaemonEvent,
    };

    use super::EventReader;

    #[tokio::test]
    async fn forwards_events_then_cancels_on_stream_end() -> Result<()> {
        let mut source = MockEventSource::new();
        let mut events = vec![
            Ok(None),
            Ok(Some(TabEvent::Activated {
                tab_id: 1,
                url: "https://github.com".into(),
            })),
        ];
        source
            .expect_next_event()
            .times(2)
            .returning(move || events.pop().unwrap());

        let (sender, mut receiver) = mpsc::channel(4);
        let shutdown = CancellationToken::new();
        let reader = EventReader::new(source, sender, shutdown.clone());
        reader.run().await?;

        assert!(matches!(
            receiver.recv().await,
            Some(DaemonEvent::Tab(TabEvent::Activated { tab_id: 1, .. }))
        ));
        // Sender dropped after the stream ended.
        assert!(receiver.recv().await.is_none());
        assert!(shutdown.is_cancelled());
        Ok(())
    }
}

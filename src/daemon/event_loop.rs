use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{browser::CurrentTab, utils::clock::Clock};

use super::{submit::SubmissionBatcher, tracker::TimeTracker, DaemonEvent};

/// Single consumer of the daemon channel. It owns all tracker state, so every
/// start/stop transition and every flush runs on one task, one event at a
/// time, in arrival order.
pub struct EventLoop {
    receiver: mpsc::Receiver<DaemonEvent>,
    tracker: TimeTracker,
    current_tab: CurrentTab,
    batcher: SubmissionBatcher,
    clock: Box<dyn Clock>,
}

impl EventLoop {
    pub fn new(
        receiver: mpsc::Receiver<DaemonEvent>,
        tracker: TimeTracker,
        batcher: SubmissionBatcher,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            receiver,
            tracker,
            current_tab: CurrentTab::default(),
            batcher,
            clock,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        while let Some(event) = self.receiver.recv().await {
            self.handle(event).await;
        }
        // Producers are gone. Flush what is left so the tail interval
        // survives shutdown.
        info!("Event channel closed, flushing remaining time");
        self.flush().await;
        Ok(())
    }

    async fn handle(&mut self, event: DaemonEvent) {
        match event {
            DaemonEvent::Tab(event) => {
                debug!("Handling {event:?}");
                self.current_tab.observe(&event);
                self.tracker.handle_event(&event);
            }
            DaemonEvent::Flush => self.flush().await,
        }
    }

    /// Stop, snapshot-and-clear, submit, then reopen a session for the tab
    /// that is still focused. The stop happens strictly before the snapshot,
    /// so the interval ending at this tick is in it.
    async fn flush(&mut self) {
        let snapshot = self.tracker.take_ledger();
        self.batcher.submit(snapshot, self.clock.time()).await;

        if let Some((tab_id, url)) = self.current_tab.get() {
            let url = url.to_owned();
            self.tracker.resume(tab_id, &url);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::Result;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use crate::{
        browser::TabEvent,
        daemon::{
            submit::{Batch, BatchTransport, SubmissionBatcher},
            tracker::TimeTracker,
            DaemonEvent,
        },
        utils::clock::testing::ManualClock,
    };

    use super::EventLoop;

    /// Transport that remembers every batch it was handed.
    #[derive(Clone, Default)]
    struct RecordingTransport {
        batches: Arc<Mutex<Vec<Batch>>>,
    }

    #[async_trait]
    impl BatchTransport for RecordingTransport {
        async fn submit(&self, batch: &Batch) -> Result<()> {
            self.batches.lock().unwrap().push(batch.clone());
            Ok(())
        }
    }

    fn event_loop() -> (EventLoop, ManualClock, RecordingTransport) {
        let clock = ManualClock::start_of_test();
        let transport = RecordingTransport::default();
        let (_, receiver) = mpsc::channel(1);
        let event_loop = EventLoop::new(
            receiver,
            TimeTracker::new(Box::new(clock.clone())),
            SubmissionBatcher::new("u1".into(), Box::new(transport.clone())),
            Box::new(clock.clone()),
        );
        (event_loop, clock, transport)
    }

    fn activated(tab_id: i64, url: &str) -> DaemonEvent {
        DaemonEvent::Tab(TabEvent::Activated {
            tab_id,
            url: url.into(),
        })
    }

    #[tokio::test]
    async fn flush_right_after_a_switch_keeps_the_final_interval() {
        let (mut event_loop, clock, transport) = event_loop();

        event_loop.handle(activated(1, "https://github.com")).await;
        clock.advance_ms(1000);
        event_loop.handle(activated(2, "https://facebook.com")).await;
        event_loop.handle(DaemonEvent::Flush).await;

        let batches = transport.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].time_data, [("github.com".into(), 1000)].into());
    }

    #[tokio::test]
    async fn flush_restarts_a_session_for_the_focused_tab() {
        let (mut event_loop, clock, transport) = event_loop();

        event_loop.handle(activated(1, "https://github.com")).await;
        clock.advance_ms(1000);
        event_loop.handle(DaemonEvent::Flush).await;
        // Still on github after the flush, the new session accrues there.
        clock.advance_ms(700);
        event_loop.handle(DaemonEvent::Flush).await;

        let batches = transport.batches.lock().unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].time_data, [("github.com".into(), 1000)].into());
        assert_eq!(batches[1].time_data, [("github.com".into(), 700)].into());
    }

    #[tokio::test]
    async fn consecutive_flushes_without_activity_submit_nothing() {
        let (mut event_loop, clock, transport) = event_loop();

        event_loop.handle(activated(1, "chrome://newtab")).await;
        clock.advance_ms(1000);
        event_loop.handle(DaemonEvent::Flush).await;
        event_loop.handle(DaemonEvent::Flush).await;

        assert!(transport.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn run_flushes_the_tail_when_the_channel_closes() -> Result<()> {
        let clock = ManualClock::start_of_test();
        let transport = RecordingTransport::default();
        let (sender, receiver) = mpsc::channel(4);
        let event_loop = EventLoop::new(
            receiver,
            TimeTracker::new(Box::new(clock.clone())),
            SubmissionBatcher::new("u1".into(), Box::new(transport.clone())),
            Box::new(clock.clone()),
        );

        sender
            .send(activated(1, "https://github.com"))
            .await
            .unwrap();
        let handle = tokio::spawn(event_loop.run());
        // Give the loop a chance to open the session before time passes.
        tokio::task::yield_now().await;
        clock.advance_ms(2000);
        drop(sender);
        handle.await??;

        let batches = transport.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].time_data, [("github.com".into(), 2000)].into());
        Ok(())
    }
}

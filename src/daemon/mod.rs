use std::path::PathBuf;

use anyhow::Result;
use event_loop::EventLoop;
use reader::EventReader;
use scheduler::FlushScheduler;
use storage::entry_storage::EntryStorageImpl;
use submit::{BatchTransport, HttpTransport, LocalTransport, SubmissionBatcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracker::TimeTracker;
use tracing::{error, info};

use crate::{
    browser::{native::NativeMessagingSource, EventSource, TabEvent},
    config::Config,
    utils::clock::{Clock, DefaultClock},
};

pub mod args;
pub mod event_loop;
pub mod reader;
pub mod scheduler;
pub mod shutdown;
pub mod storage;
pub mod submit;
pub mod tracker;

/// Everything the event loop consumes. Tab activity and flush ticks share one
/// channel, so they are handled strictly one at a time, in arrival order.
#[derive(Debug)]
pub enum DaemonEvent {
    Tab(TabEvent),
    Flush,
}

/// Represents the starting point for the daemon
pub async fn start_daemon(dir: PathBuf) -> Result<()> {
    std::env::set_current_dir("/")?;

    let config = Config::load(&dir)?;
    info!(
        "Tracking for {} with a {:?} flush interval",
        config.user_id,
        config.submit_interval()
    );

    let (sender, receiver) = mpsc::channel::<DaemonEvent>(16);
    let shutdown_token = CancellationToken::new();

    let reader = create_reader(
        NativeMessagingSource::stdin(),
        sender.clone(),
        &shutdown_token,
    );
    let scheduler = create_scheduler(sender, &config, &shutdown_token, DefaultClock);
    let consumer = create_event_loop(&config, dir.join("entries"), receiver, DefaultClock)?;

    let (_, reader_result, scheduler_result, loop_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token),
        reader.run(),
        scheduler.run(),
        consumer.run(),
    );

    if let Err(reader_result) = reader_result {
        error!("Reader module got an error {:?}", reader_result);
    }

    if let Err(scheduler_result) = scheduler_result {
        error!("Scheduler module got an error {:?}", scheduler_result);
    }

    if let Err(loop_result) = loop_result {
        error!("Event loop got an error {:?}", loop_result);
    }

    Ok(())
}

fn create_reader(
    source: impl EventSource,
    sender: mpsc::Sender<DaemonEvent>,
    shutdown_token: &CancellationToken,
) -> EventReader<impl EventSource> {
    EventReader::new(source, sender, shutdown_token.clone())
}

fn create_scheduler(
    sender: mpsc::Sender<DaemonEvent>,
    config: &Config,
    shutdown_token: &CancellationToken,
    clock: impl Clock,
) -> FlushScheduler {
    FlushScheduler::new(
        sender,
        config.submit_interval(),
        shutdown_token.clone(),
        Box::new(clock),
    )
}

fn create_event_loop(
    config: &Config,
    entry_dir: PathBuf,
    receiver: mpsc::Receiver<DaemonEvent>,
    clock: impl Clock + Clone,
) -> Result<EventLoop> {
    let transport: Box<dyn BatchTransport> = match &config.backend_url {
        Some(base_url) => Box::new(HttpTransport::new(base_url)),
        None => Box::new(LocalTransport::new(EntryStorageImpl::new(entry_dir)?)),
    };
    let batcher = SubmissionBatcher::new(config.user_id.clone(), transport);
    let tracker = TimeTracker::new(Box::new(clock.clone()));
    Ok(EventLoop::new(receiver, tracker, batcher, Box::new(clock)))
}

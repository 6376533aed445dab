use std::{
    collections::BTreeMap,
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use fs4::tokio::AsyncFileExt;
use futures::{stream, StreamExt};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, warn};

use crate::utils::time::{date_range, date_to_entry_name};

use super::entities::TimeEntry;

/// Interface for abstracting storage of time entries. Inserts are append-only
/// bulk writes, queries filter one user over a date window.
pub trait EntryStorage {
    fn insert(&self, entries: Vec<TimeEntry>) -> impl Future<Output = Result<()>> + Send;

    fn query_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<TimeEntry>>> + Send;
}

/// The main realization of [EntryStorage]. Entries land in one JSON-lines
/// file per UTC day, guarded with file locks so the daemon and the cli can
/// touch the same directory.
pub struct EntryStorageImpl {
    entry_dir: PathBuf,
}

impl EntryStorageImpl {
    pub fn new(entry_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&entry_dir)?;

        Ok(Self { entry_dir })
    }

    fn day_path(&self, date: NaiveDate) -> PathBuf {
        self.entry_dir.join(date_to_entry_name(date))
    }

    async fn append_day(&self, date: NaiveDate, entries: &[TimeEntry]) -> Result<()> {
        let mut file = File::options()
            .append(true)
            .create(true)
            .open(self.day_path(date))
            .await?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = Self::append_with_file(&mut file, entries).await;
        file.unlock_async().await?;
        result
    }

    async fn append_with_file(file: &mut File, entries: &[TimeEntry]) -> Result<()> {
        let mut buffer = Vec::<u8>::new();
        for entry in entries {
            serde_json::to_writer(&mut buffer, entry)?;
            buffer.push(b'\n');
        }

        file.write_all(&buffer).await?;
        file.flush().await?;
        Ok(())
    }

    async fn read_day(&self, date: NaiveDate) -> Result<Vec<TimeEntry>> {
        async fn extract(path: &Path) -> Result<Vec<TimeEntry>, std::io::Error> {
            debug!("Extracting {path:?}");
            let file = File::open(path).await?;
            file.lock_shared()?;
            let buffer = BufReader::new(file);
            let mut lines = buffer.lines();
            let mut entries = vec![];
            while let Ok(Some(line)) = lines.next_line().await {
                match serde_json::from_str::<TimeEntry>(&line) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => {
                        // ignore illegal values. Might happen after shutdowns
                        warn!(
                            "During parsing in path {:?} found illegal json string {}: {e}",
                            path, &line
                        )
                    }
                }
            }

            lines.into_inner().into_inner().unlock_async().await?;

            Ok(entries)
        }

        match extract(&self.day_path(date)).await {
            Ok(entries) => Ok(entries),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(vec![]),
            Err(e) => Err(e)?,
        }
    }
}

impl EntryStorage for EntryStorageImpl {
    async fn insert(&self, entries: Vec<TimeEntry>) -> Result<()> {
        // A batch normally shares one timestamp, but nothing forces that, so
        // group per day file. Days are written one after another: an error
        // midway leaves earlier days inserted (at-least-partial, not atomic).
        let mut per_day = BTreeMap::<NaiveDate, Vec<TimeEntry>>::new();
        for entry in entries {
            per_day.entry(entry.date.date_naive()).or_default().push(entry);
        }

        for (date, day_entries) in per_day {
            self.append_day(date, &day_entries).await?;
        }
        Ok(())
    }

    async fn query_range(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>> {
        let days = date_range(start.date_naive(), end.date_naive()).collect::<Vec<_>>();

        let mut reads = stream::iter(days)
            .map(|day| self.read_day(day))
            .buffered(4);

        let mut entries = Vec::new();
        while let Some(day_entries) = reads.next().await {
            for entry in day_entries? {
                if entry.user_id == user_id && entry.date >= start && entry.date <= end {
                    entries.push(entry);
                }
            }
        }
        Ok(entries)
    }
}

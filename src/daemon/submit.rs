use std::collections::HashMap;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::daemon::storage::{entities::TimeEntry, entry_storage::EntryStorage};

use super::tracker::Ledger;

/// One flush worth of accrued time, in the shape the track endpoint accepts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub user_id: String,
    pub time_data: HashMap<String, u64>,
    pub timestamp: DateTime<Utc>,
}

impl Batch {
    /// Expands the batch into the records the store keeps, one per domain.
    pub fn to_entries(&self) -> Vec<TimeEntry> {
        self.time_data
            .iter()
            .map(|(domain, time_spent)| TimeEntry {
                user_id: self.user_id.clone(),
                domain: domain.clone(),
                time_spent: *time_spent,
                date: self.timestamp,
            })
            .collect()
    }
}

/// Delivery of a batch to wherever entries are persisted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BatchTransport: Send + Sync {
    async fn submit(&self, batch: &Batch) -> Result<()>;
}

/// Packs ledger snapshots into batches and hands them to the transport.
/// The ledger was already cleared when a snapshot gets here, so a batch that
/// fails to send is dropped, delivery is at most once.
pub struct SubmissionBatcher {
    user_id: String,
    transport: Box<dyn BatchTransport>,
}

impl SubmissionBatcher {
    pub fn new(user_id: String, transport: Box<dyn BatchTransport>) -> Self {
        Self { user_id, transport }
    }

    pub async fn submit(&self, snapshot: Ledger, timestamp: DateTime<Utc>) {
        if snapshot.is_empty() {
            debug!("Nothing accrued since the last flush, skipping submission");
            return;
        }
        let batch = Batch {
            user_id: self.user_id.clone(),
            time_data: snapshot,
            timestamp,
        };
        match self.transport.submit(&batch).await {
            Ok(()) => info!("Submitted batch of {} domains", batch.time_data.len()),
            Err(e) => error!("Failed to submit batch, dropping it: {e:?}"),
        }
    }
}

/// Posts batches to the backend's track endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/api/track", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl BatchTransport for HttpTransport {
    async fn submit(&self, batch: &Batch) -> Result<()> {
        let response = self.client.post(&self.endpoint).json(batch).send().await?;
        if !response.status().is_success() {
            bail!("Track endpoint answered {}", response.status());
        }
        Ok(())
    }
}

/// Writes batches straight into the local entry store. This is the whole
/// submit round trip collapsed into one process, used when no backend url is
/// configured.
pub struct LocalTransport<S> {
    storage: S,
}

impl<S> LocalTransport<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl<S: EntryStorage + Send + Sync> BatchTransport for LocalTransport<S> {
    async fn submit(&self, batch: &Batch) -> Result<()> {
        self.storage.insert(batch.to_entries()).await
    }
}

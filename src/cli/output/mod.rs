pub mod classify;

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::daemon::storage::{entities::TimeEntry, entry_storage::EntryStorage};

use classify::{Category, ClassificationSets};

/// Summed time for one domain within the queried window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainUsage {
    /// Named `_id` on the wire, matching the dashboard endpoint's group-by
    /// output.
    #[serde(rename = "_id")]
    pub domain: String,
    #[serde(rename = "totalTime")]
    pub total_time: u64,
}

/// Category totals plus the per-domain breakdown for one user and window.
/// Derived on every query, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub productive_time: u64,
    pub unproductive_time: u64,
    pub neutral_time: u64,
    pub total_time: u64,
    pub breakdown: Vec<DomainUsage>,
}

/// Queries a user's entries within `[start, end]` and aggregates them.
pub async fn summarize(
    storage: &impl EntryStorage,
    sets: &ClassificationSets,
    user_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<DashboardSummary> {
    let entries = storage.query_range(user_id, start, end).await?;
    Ok(aggregate(entries, sets))
}

/// Sums time per domain, classifies each domain once, and accumulates the
/// category totals. Domains without entries in the window are simply absent.
pub fn aggregate(entries: Vec<TimeEntry>, sets: &ClassificationSets) -> DashboardSummary {
    let mut per_domain = HashMap::<String, u64>::new();
    for entry in entries {
        *per_domain.entry(entry.domain).or_insert(0) += entry.time_spent;
    }

    let mut breakdown = per_domain
        .into_iter()
        .map(|(domain, total_time)| DomainUsage { domain, total_time })
        .collect::<Vec<_>>();
    // Largest first; ties broken by name to keep the output deterministic.
    breakdown.sort_by(|a, b| {
        b.total_time
            .cmp(&a.total_time)
            .then_with(|| a.domain.cmp(&b.domain))
    });

    let mut productive_time = 0;
    let mut unproductive_time = 0;
    let mut neutral_time = 0;
    for usage in &breakdown {
        match sets.classify(&usage.domain) {
            Category::Productive => productive_time += usage.total_time,
            Category::Unproductive => unproductive_time += usage.total_time,
            Category::Neutral => neutral_time += usage.total_time,
        }
    }

    DashboardSummary {
        productive_time,
        unproductive_time,
        neutral_time,
        total_time: productive_time + unproductive_time + neutral_time,
        breakdown,
    }
}

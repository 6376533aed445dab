use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted slice of accrued time: one record per (domain, submitted
/// batch). Immutable once written.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub user_id: String,
    pub domain: String,
    /// Milliseconds accrued for this domain within one flush interval.
    pub time_spent: u64,
    pub date: DateTime<Utc>,
}

//! Daemon and dashboard settings, read from `config.json` in the application
//! directory. Every field has a default, so a missing file means a fully
//! default configuration.

use std::{io, path::Path, time::Duration};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::output::classify::ClassificationSets;

const DEFAULT_SUBMIT_INTERVAL_MS: u64 = 5 * 60 * 1000;
const DEFAULT_DASHBOARD_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub user_id: String,
    /// How often accrued time is flushed and submitted, in milliseconds.
    pub submit_interval_ms: u64,
    pub productive_sites: Vec<String>,
    pub unproductive_sites: Vec<String>,
    /// Length of the trailing dashboard window, in days.
    pub dashboard_window_days: i64,
    /// Base url of the backend. When absent, batches are written to the local
    /// entry store instead of being posted.
    pub backend_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_id: "demo-user".into(),
            submit_interval_ms: DEFAULT_SUBMIT_INTERVAL_MS,
            productive_sites: [
                "stackoverflow.com",
                "stackoverflow.co",
                "github.com",
                "codepen.io",
                "developer.mozilla.org",
                "linkedin.com",
                "medium.com",
            ]
            .map(String::from)
            .into(),
            unproductive_sites: [
                "facebook.com",
                "twitter.com",
                "instagram.com",
                "reddit.com",
                "youtube.com",
            ]
            .map(String::from)
            .into(),
            dashboard_window_days: DEFAULT_DASHBOARD_WINDOW_DAYS,
            backend_url: None,
        }
    }
}

impl Config {
    pub fn load(application_dir: &Path) -> Result<Config> {
        let path = application_dir.join("config.json");
        match std::fs::read(&path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No config at {path:?}, using defaults");
                Ok(Config::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn submit_interval(&self) -> Duration {
        Duration::from_millis(self.submit_interval_ms)
    }

    /// The single source of truth for domain categories, shared by whoever
    /// aggregates entries.
    pub fn classification_sets(&self) -> ClassificationSets {
        ClassificationSets::new(
            self.productive_sites.iter().cloned(),
            self.unproductive_sites.iter().cloned(),
        )
    }
}

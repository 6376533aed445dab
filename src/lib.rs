//! Daemon and cli for tracking how long you spend on each website.
//! A browser extension reports tab activity over native messaging, the daemon
//! accrues time per domain and periodically ships it to a backend (or a local
//! store), and the cli turns the stored entries into a productivity dashboard.
//!

pub mod browser;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod utils;

//! Persistence of submitted time entries.
//! The basic idea is:
//!  - There is a directory with one JSON-lines file per UTC day.
//!  - Each line is a [entities::TimeEntry], one per (domain, submitted batch).
//!  - Entries are append-only, aggregation reads them back by date range.

pub mod entities;
pub mod entry_storage;

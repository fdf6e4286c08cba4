//! Database module for fsearch
//!
//! Persists the last completed snapshot in SQLite so the index survives
//! restarts and can be queried offline by the CLI.

mod schema;
mod snapshots;

pub use schema::Database;

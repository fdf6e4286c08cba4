//! fsearch - filesystem metadata indexer and search service
//!
//! A crawler walks the configured roots and publishes immutable snapshots of
//! file metadata; the query engine answers substring and regex searches with
//! directory, extension, size and mtime filters against whichever snapshot
//! is current.

pub mod config;
pub mod database;
pub mod index;
pub mod indexer;
pub mod platform;
pub mod search;
pub mod server;

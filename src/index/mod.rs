//! In-memory file record store
//!
//! Snapshots are immutable and swapped wholesale by the index service.

mod service;
mod snapshot;

pub use service::IndexService;
pub use snapshot::IndexSnapshot;

//! Storage abstractions for tree caching and record persistence.
//!
//! The scan pipeline only sees this trait: the tree cache makes the bulk
//! listing a load-or-fetch input, and the record writer is the single output
//! artifact of a run.

pub mod local;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{RepositoryEntry, ScanStats, TextbookRecord};

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for scanner storage backends.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load the cached repository tree, if one exists.
    async fn load_tree_cache(&self) -> Result<Option<Vec<RepositoryEntry>>>;

    /// Persist the repository tree cache.
    async fn save_tree_cache(&self, tree: &[RepositoryEntry]) -> Result<()>;

    /// Write the final record set; returns the output location.
    async fn write_records(&self, records: &[TextbookRecord], stats: &ScanStats)
    -> Result<PathBuf>;
}

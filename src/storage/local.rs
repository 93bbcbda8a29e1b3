//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── config.toml           # Scanner configuration
//! ├── tree-cache.json       # Cached repository listing
//! └── textbook-data.json    # Generated record set
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{RepositoryEntry, ScanStats, TextbookRecord};
use crate::storage::RecordStore;

const TREE_CACHE_FILE: &str = "tree-cache.json";
const OUTPUT_FILE: &str = "textbook-data.json";

/// Cached repository tree with its fetch timestamp.
#[derive(Debug, Serialize, Deserialize)]
struct TreeCache {
    fetched_at: DateTime<Utc>,
    tree: Vec<RepositoryEntry>,
}

/// Output document wrapping the record set.
#[derive(Debug, Serialize)]
struct OutputDoc<'a> {
    generated_at: DateTime<Utc>,
    stats: &'a ScanStats,
    textbooks: &'a [TextbookRecord],
}

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    output_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        let root_dir = root_dir.into();
        let output_path = root_dir.join(OUTPUT_FILE);
        Self {
            root_dir,
            output_path,
        }
    }

    /// Override the output file location.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Location of the tree cache file.
    pub fn tree_cache_path(&self) -> PathBuf {
        self.root_dir.join(TREE_CACHE_FILE)
    }

    /// Location of the generated data file.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Ensure the parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.ensure_dir(path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(path, &bytes).await
    }

    /// Read JSON data, returning None if the file doesn't exist.
    async fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl RecordStore for LocalStorage {
    async fn load_tree_cache(&self) -> Result<Option<Vec<RepositoryEntry>>> {
        let cache: Option<TreeCache> = self.read_json(&self.tree_cache_path()).await?;
        Ok(cache.map(|c| {
            log::debug!("Tree cache from {}", c.fetched_at);
            c.tree
        }))
    }

    async fn save_tree_cache(&self, tree: &[RepositoryEntry]) -> Result<()> {
        let cache = TreeCache {
            fetched_at: Utc::now(),
            tree: tree.to_vec(),
        };
        self.write_json(&self.tree_cache_path(), &cache).await?;
        log::info!("Saved tree cache to {}", self.tree_cache_path().display());
        Ok(())
    }

    async fn write_records(
        &self,
        records: &[TextbookRecord],
        stats: &ScanStats,
    ) -> Result<PathBuf> {
        let doc = OutputDoc {
            generated_at: Utc::now(),
            stats,
            textbooks: records,
        };
        self.write_json(&self.output_path, &doc).await?;
        Ok(self.output_path.clone())
    }
}

// src/pipeline/scan.rs

//! Full scan pipeline.
//!
//! Loads the repository listing (cache first), filters it down to document
//! files, classifies each one, probes CDN availability, joins the two result
//! sets on file path, and persists the final records.

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{Config, LevelKey, RepositoryEntry, ScanStats, TextbookRecord};
use crate::services::{MetadataClassifier, ProbeScheduler, TreeClient, UrlProber};
use crate::storage::RecordStore;
use crate::utils::UrlBuilder;

/// Options for a scan run.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Skip CDN probing and emit direct URLs for both slots.
    pub offline: bool,

    /// Ignore the cached tree and refetch from the API.
    pub refresh: bool,
}

/// Summary of a completed scan.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub record_count: usize,
    pub dropped_unknown: usize,
    pub output_path: std::path::PathBuf,
}

/// Run the full scan pipeline.
pub async fn run_scan(
    config: Arc<Config>,
    storage: &dyn RecordStore,
    options: &ScanOptions,
) -> Result<ScanOutcome> {
    let entries = load_entries(&config, storage, options.refresh).await?;
    if entries.is_empty() {
        // Nothing to process is a run-level failure, not an empty result.
        return Err(AppError::fetch("repository tree", "listing is empty"));
    }

    let mut records = build_records(&config, &entries)?;

    let probe_stats = if options.offline {
        log::info!("Probing disabled; emitting direct URLs only");
        None
    } else {
        let prober = UrlProber::new(&config)?;
        let scheduler = ProbeScheduler::new(prober, config.scanner.max_concurrent);
        let paths: Vec<String> = records.iter().map(|r| r.file_path.clone()).collect();

        let (decisions, stats) = scheduler.probe_all(&paths).await;
        for record in &mut records {
            if let Some(decision) = decisions.get(&record.file_path) {
                record.china_url = decision.china_url.clone();
                record.cdn_reachable = Some(decision.reachable);
                record.cdn_status_code = Some(decision.status_code);
            }
        }
        Some(stats)
    };

    // Downstream policy: records the classifier could not identify are
    // dropped here, after their probe outcomes were still collected.
    let before = records.len();
    records.retain(|record| !record.has_unknown_identity());
    let dropped_unknown = before - records.len();
    if dropped_unknown > 0 {
        log::info!(
            "Dropped {} records with unknown level or subject",
            dropped_unknown
        );
    }

    let mut stats = ScanStats::from_records(&records);
    stats.probe = probe_stats;

    let output_path = storage.write_records(&records, &stats).await?;
    log::info!(
        "Wrote {} records to {}",
        records.len(),
        output_path.display()
    );

    Ok(ScanOutcome {
        record_count: records.len(),
        dropped_unknown,
        output_path,
    })
}

/// Load the repository listing from cache, falling back to the API.
async fn load_entries(
    config: &Arc<Config>,
    storage: &dyn RecordStore,
    refresh: bool,
) -> Result<Vec<RepositoryEntry>> {
    if !refresh {
        if let Some(cached) = storage.load_tree_cache().await? {
            log::info!("Loaded repository tree from cache ({} entries)", cached.len());
            return Ok(cached);
        }
    }

    let client = TreeClient::new(config)?;
    let tree = client.fetch().await?;
    storage.save_tree_cache(&tree).await?;
    Ok(tree)
}

/// Filter the listing down to document files and classify each one.
fn build_records(
    config: &Arc<Config>,
    entries: &[RepositoryEntry],
) -> Result<Vec<TextbookRecord>> {
    let ignore_sets = config.build_ignore_sets()?;
    let classifier = MetadataClassifier::new(Arc::clone(config));
    let urls = UrlBuilder::new(&config.repo);

    let mut records = Vec::new();
    let mut document_count = 0usize;
    let mut ignored = 0usize;

    for entry in entries {
        if !entry.is_document() {
            continue;
        }
        document_count += 1;

        if let Some(key) = LevelKey::from_path(&entry.path) {
            if !config.level_enabled(key) {
                ignored += 1;
                continue;
            }
            if ignore_sets
                .get(&key)
                .is_some_and(|set| set.is_match(&entry.path))
            {
                log::debug!("Ignoring {} (level {} pattern)", entry.path, key.as_str());
                ignored += 1;
                continue;
            }
        }

        let metadata = classifier.classify(entry.file_name(), Some(&entry.path));
        records.push(TextbookRecord::assemble(
            entry,
            metadata,
            urls.direct_url(&entry.path),
        ));
    }

    log::info!(
        "Found {} document files in {} tree entries ({} excluded by level filters)",
        document_count,
        entries.len(),
        ignored
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryKind;

    fn blob(path: &str) -> RepositoryEntry {
        RepositoryEntry {
            path: path.to_string(),
            kind: EntryKind::Blob,
            size: 100,
        }
    }

    fn tree(path: &str) -> RepositoryEntry {
        RepositoryEntry {
            path: path.to_string(),
            kind: EntryKind::Tree,
            size: 0,
        }
    }

    #[test]
    fn test_build_records_filters_non_documents() {
        let config = Arc::new(Config::default());
        let entries = vec![
            tree("小学"),
            tree("小学/数学"),
            blob("README.md"),
            blob("小学/数学/人教版/一年级/课本.pdf"),
        ];

        let records = build_records(&config, &entries).expect("build records");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, "小学");
        assert_eq!(records[0].grade, "一年级");
        assert_eq!(records[0].china_url, records[0].international_url);
    }

    #[test]
    fn test_build_records_respects_disabled_level() {
        let mut config = Config::default();
        config
            .levels
            .get_mut("daxue")
            .expect("daxue level")
            .enabled = false;
        let config = Arc::new(config);

        let entries = vec![
            blob("大学/高等数学/课本.pdf"),
            blob("小学/数学/人教版/一年级/课本.pdf"),
        ];
        let records = build_records(&config, &entries).expect("build records");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, "小学");
    }

    #[test]
    fn test_build_records_applies_ignore_patterns() {
        let mut config = Config::default();
        config
            .levels
            .get_mut("xiaoxue")
            .expect("xiaoxue level")
            .ignore_patterns = vec!["小学/英语/*".to_string()];
        let config = Arc::new(config);

        let entries = vec![
            blob("小学/英语/人教版/一年级/课本.pdf"),
            blob("小学/数学/人教版/一年级/课本.pdf"),
        ];
        let records = build_records(&config, &entries).expect("build records");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].subject, "数学");
    }

    #[test]
    fn test_build_records_keeps_unclassifiable_entries() {
        let config = Arc::new(Config::default());
        let entries = vec![blob("扫描件001.pdf")];

        let records = build_records(&config, &entries).expect("build records");
        assert_eq!(records.len(), 1);
        assert!(records[0].has_unknown_identity());
    }
}

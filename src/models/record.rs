//! Classification and output record structures.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::RepositoryEntry;

/// Sentinel for classification fields that could not be resolved.
pub const UNKNOWN: &str = "unknown";

/// Sentinel publisher for files without a recognizable publisher.
pub const UNKNOWN_PUBLISHER: &str = "未知出版社";

/// Structured metadata for one document file, produced by the classifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextbookMetadata {
    /// Filename as it appears in the repository
    pub original_name: String,

    /// Name with the document extension and split suffix stripped
    pub parsed_name: String,

    /// Education level label, verbatim from the path
    pub level: String,

    pub subject: String,
    pub grade: String,
    pub semester: String,

    /// Normalized publisher name
    pub publisher: String,

    /// Whether the file is one numbered part of a multi-part document
    pub is_split: bool,

    /// Part index, present iff `is_split`
    pub part_number: Option<u32>,
}

impl TextbookMetadata {
    /// Fresh record with every classification field at its sentinel.
    pub fn new(original_name: impl Into<String>) -> Self {
        let original_name = original_name.into();
        Self {
            parsed_name: original_name.clone(),
            original_name,
            level: UNKNOWN.to_string(),
            subject: UNKNOWN.to_string(),
            grade: UNKNOWN.to_string(),
            semester: UNKNOWN.to_string(),
            publisher: UNKNOWN_PUBLISHER.to_string(),
            is_split: false,
            part_number: None,
        }
    }
}

/// Result of one classification stage: only the fields the stage resolved.
///
/// Stages never write sentinels here; a `None` field leaves the target record
/// untouched when the partial is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialMetadata {
    pub level: Option<String>,
    pub subject: Option<String>,
    pub grade: Option<String>,
    pub semester: Option<String>,
    pub publisher: Option<String>,
}

impl PartialMetadata {
    /// Apply every resolved field onto `target`.
    ///
    /// With `preserve_level` set, a level the target already resolved wins
    /// over the partial's level guess.
    pub fn apply_to(&self, target: &mut TextbookMetadata, preserve_level: bool) {
        if let Some(level) = &self.level {
            if !(preserve_level && target.level != UNKNOWN) {
                target.level = level.clone();
            }
        }
        if let Some(subject) = &self.subject {
            target.subject = subject.clone();
        }
        if let Some(grade) = &self.grade {
            target.grade = grade.clone();
        }
        if let Some(semester) = &self.semester {
            target.semester = semester.clone();
        }
        if let Some(publisher) = &self.publisher {
            target.publisher = publisher.clone();
        }
    }
}

/// Final per-file record: metadata joined with delivery URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextbookRecord {
    pub level: String,
    pub subject: String,
    pub grade: String,
    pub semester: String,
    pub publisher: String,

    /// Display title (parsed name)
    pub title: String,

    pub file_path: String,
    pub file_name: String,

    pub is_split: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_number: Option<u32>,

    pub file_size: u64,

    /// Direct-origin URL, always usable internationally
    pub international_url: String,

    /// CDN mirror URL when reachable, proxy fallback otherwise.
    /// Defaults to the direct URL until probing runs.
    pub china_url: String,

    /// Probe result, absent when probing was skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdn_reachable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdn_status_code: Option<u16>,
}

impl TextbookRecord {
    /// Join a repository entry with its classified metadata.
    pub fn assemble(entry: &RepositoryEntry, metadata: TextbookMetadata, direct_url: String) -> Self {
        Self {
            level: metadata.level,
            subject: metadata.subject,
            grade: metadata.grade,
            semester: metadata.semester,
            publisher: metadata.publisher,
            title: metadata.parsed_name,
            file_path: entry.path.clone(),
            file_name: entry.file_name().to_string(),
            is_split: metadata.is_split,
            part_number: metadata.part_number,
            file_size: entry.size,
            china_url: direct_url.clone(),
            international_url: direct_url,
            cdn_reachable: None,
            cdn_status_code: None,
        }
    }

    /// Whether the classifier failed to identify this record.
    pub fn has_unknown_identity(&self) -> bool {
        self.level == UNKNOWN || self.subject == UNKNOWN
    }
}

/// Probe counters for one scheduler run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeStats {
    pub tested: usize,
    pub reachable: usize,
    pub unreachable: usize,
    /// Mirror hit rate in percent, one decimal
    pub success_rate: f64,
}

impl ProbeStats {
    /// Finalize counters once all outcomes are in.
    pub fn finish(&mut self, tested: usize) {
        self.tested = tested;
        self.success_rate = if tested > 0 {
            (self.reachable as f64 / tested as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };
    }
}

/// Summary statistics written alongside the record set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    pub total_entries: usize,
    pub main_files: usize,
    pub split_files: usize,
    pub levels: usize,
    pub subjects: usize,
    pub publishers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe: Option<ProbeStats>,
}

impl ScanStats {
    /// Compute record counts and distinct classification values.
    pub fn from_records(records: &[TextbookRecord]) -> Self {
        let mut levels = HashSet::new();
        let mut subjects = HashSet::new();
        let mut publishers = HashSet::new();
        let mut split_files = 0usize;

        for record in records {
            if record.is_split {
                split_files += 1;
            }
            levels.insert(record.level.as_str());
            subjects.insert(record.subject.as_str());
            publishers.insert(record.publisher.as_str());
        }

        Self {
            total_entries: records.len(),
            main_files: records.len() - split_files,
            split_files,
            levels: levels.len(),
            subjects: subjects.len(),
            publishers: publishers.len(),
            probe: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryKind;

    fn sample_entry(path: &str) -> RepositoryEntry {
        RepositoryEntry {
            path: path.to_string(),
            kind: EntryKind::Blob,
            size: 2048,
        }
    }

    #[test]
    fn test_new_metadata_defaults() {
        let metadata = TextbookMetadata::new("课本.pdf");
        assert_eq!(metadata.level, UNKNOWN);
        assert_eq!(metadata.publisher, UNKNOWN_PUBLISHER);
        assert!(!metadata.is_split);
        assert!(metadata.part_number.is_none());
    }

    #[test]
    fn test_partial_preserves_resolved_level() {
        let mut target = TextbookMetadata::new("课本.pdf");
        target.level = "小学".to_string();

        let partial = PartialMetadata {
            level: Some("初中".to_string()),
            subject: Some("道德与法治".to_string()),
            ..PartialMetadata::default()
        };

        partial.apply_to(&mut target, true);
        assert_eq!(target.level, "小学");
        assert_eq!(target.subject, "道德与法治");
    }

    #[test]
    fn test_partial_fills_unknown_level() {
        let mut target = TextbookMetadata::new("课本.pdf");
        let partial = PartialMetadata {
            level: Some("初中".to_string()),
            ..PartialMetadata::default()
        };

        partial.apply_to(&mut target, true);
        assert_eq!(target.level, "初中");

        let mut replaced = TextbookMetadata::new("课本.pdf");
        replaced.level = "小学".to_string();
        partial.apply_to(&mut replaced, false);
        assert_eq!(replaced.level, "初中");
    }

    #[test]
    fn test_assemble_keeps_direct_url_for_both_slots() {
        let entry = sample_entry("小学/数学/课本.pdf");
        let metadata = TextbookMetadata::new("课本.pdf");
        let record = TextbookRecord::assemble(&entry, metadata, "https://example.com/x".into());
        assert_eq!(record.international_url, record.china_url);
        assert_eq!(record.file_size, 2048);
        assert!(record.cdn_reachable.is_none());
    }

    #[test]
    fn test_scan_stats_counts() {
        let entry = sample_entry("小学/数学/课本.pdf");
        let mut first = TextbookMetadata::new("课本.pdf.1");
        first.level = "小学".to_string();
        first.subject = "数学".to_string();
        first.is_split = true;
        first.part_number = Some(1);

        let mut second = TextbookMetadata::new("课本.pdf");
        second.level = "小学".to_string();
        second.subject = "语文".to_string();

        let records = vec![
            TextbookRecord::assemble(&entry, first, "https://example.com/1".into()),
            TextbookRecord::assemble(&entry, second, "https://example.com/2".into()),
        ];

        let stats = ScanStats::from_records(&records);
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.split_files, 1);
        assert_eq!(stats.main_files, 1);
        assert_eq!(stats.levels, 1);
        assert_eq!(stats.subjects, 2);
    }

    #[test]
    fn test_probe_stats_rate() {
        let mut stats = ProbeStats {
            reachable: 2,
            unreachable: 1,
            ..ProbeStats::default()
        };
        stats.finish(3);
        assert_eq!(stats.tested, 3);
        assert_eq!(stats.success_rate, 66.7);
    }
}

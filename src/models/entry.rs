//! Repository tree entry structures.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One entry of the bulk repository listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepositoryEntry {
    /// Repository-relative path
    pub path: String,

    /// Git object type
    #[serde(rename = "type")]
    pub kind: EntryKind,

    /// Blob size in bytes (absent for trees)
    #[serde(default)]
    pub size: u64,
}

/// Git object type of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    /// Submodule commits and anything the API adds later
    #[serde(other)]
    Other,
}

impl RepositoryEntry {
    /// Whether this entry is a document the scanner processes: a blob whose
    /// path ends in the PDF extension or a numbered split-part suffix.
    pub fn is_document(&self) -> bool {
        self.kind == EntryKind::Blob && is_document_path(&self.path)
    }

    /// Bare filename portion of the path.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

fn split_document_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\.pdf\.\d+$").expect("valid split-document pattern"))
}

fn is_document_path(path: &str) -> bool {
    path.ends_with(".pdf") || path.ends_with(".PDF") || split_document_re().is_match(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(path: &str) -> RepositoryEntry {
        RepositoryEntry {
            path: path.to_string(),
            kind: EntryKind::Blob,
            size: 1024,
        }
    }

    #[test]
    fn test_is_document() {
        assert!(blob("小学/数学/课本.pdf").is_document());
        assert!(blob("小学/数学/课本.PDF").is_document());
        assert!(blob("小学/数学/课本.pdf.3").is_document());
        assert!(blob("小学/数学/课本.PDF.12").is_document());
        assert!(!blob("README.md").is_document());
        assert!(!blob("小学/数学/课本.pdf.bak").is_document());
    }

    #[test]
    fn test_tree_is_not_document() {
        let entry = RepositoryEntry {
            path: "小学/数学.pdf".to_string(),
            kind: EntryKind::Tree,
            size: 0,
        };
        assert!(!entry.is_document());
    }

    #[test]
    fn test_file_name() {
        assert_eq!(blob("小学/数学/课本.pdf").file_name(), "课本.pdf");
        assert_eq!(blob("课本.pdf").file_name(), "课本.pdf");
    }

    #[test]
    fn test_deserialize_tree_entry() {
        let json = r#"{"path": "小学/数学", "mode": "040000", "type": "tree", "sha": "abc"}"#;
        let entry: RepositoryEntry = serde_json::from_str(json).expect("entry parses");
        assert_eq!(entry.kind, EntryKind::Tree);
        assert_eq!(entry.size, 0);
    }

    #[test]
    fn test_deserialize_unknown_kind() {
        let json = r#"{"path": "vendored", "type": "commit", "size": 0}"#;
        let entry: RepositoryEntry = serde_json::from_str(json).expect("entry parses");
        assert_eq!(entry.kind, EntryKind::Other);
    }
}

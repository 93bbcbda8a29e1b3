//! Path and filename tokenization.
//!
//! Splits repository paths into segments, strips document extensions and
//! split-part suffixes, and decides whether a path segment names a file
//! rather than a publisher or grade directory.

use std::sync::OnceLock;

use regex::Regex;

/// Folder suffix marking a directory of split-file parts.
const MERGE_FOLDER_MARKER: &str = ".pdf_merge_folder";

/// Title prefix of compulsory-education textbooks placed directly under a
/// subject directory.
const COMPULSORY_PREFIX: &str = "义务教育教科书";

fn split_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.(\d+)$").expect("valid split-suffix pattern"))
}

fn split_pdf_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.pdf\.\d+$").expect("valid split-pdf pattern"))
}

/// Remove the document extension from a name.
pub fn strip_document_extension(name: &str) -> String {
    name.replace(".pdf", "").replace(".PDF", "")
}

/// Detect and strip a trailing `.<digits>` split suffix.
///
/// Returns the bare name and the part number when the suffix was present.
pub fn split_part(name: &str) -> (String, Option<u32>) {
    if let Some(caps) = split_suffix_re().captures(name) {
        let whole = caps.get(0).expect("match group");
        if let Ok(part) = caps[1].parse::<u32>() {
            return (name[..whole.start()].to_string(), Some(part));
        }
    }
    (name.to_string(), None)
}

/// Split a repository path into its ordered segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').collect()
}

/// Whether a path segment is a leaf-file marker: a PDF name, a split part,
/// a merge folder, or a compulsory-education textbook title.
pub fn is_leaf_segment(segment: &str) -> bool {
    segment.ends_with(".pdf")
        || split_pdf_re().is_match(segment)
        || segment.contains(MERGE_FOLDER_MARKER)
        || segment.starts_with(COMPULSORY_PREFIX)
}

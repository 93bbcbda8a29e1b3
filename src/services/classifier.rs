//! Textbook metadata classifier.
//!
//! Turns a repository path and filename into a structured metadata record
//! through an ordered cascade: split detection, the practice-material rule,
//! structural path parsing, and filename-only fallbacks. Stages after the
//! structural parse return partial records that are merged in with explicit
//! override rules; a path-resolved level is never replaced by a guess.

use std::sync::Arc;

use crate::models::{Config, LevelKey, PartialMetadata, TextbookMetadata, UNKNOWN};
use crate::services::{patterns, tokenizer};

/// Top-level directory holding math practice materials.
const PRACTICE_DIR: &str = "学数学最重要的刷习题在这里";

/// Title of the ideological-education reader series with dedicated rules.
const READER_SERIES: &str = "习近平新时代中国特色社会主义思想学生读本";

/// Grade label for levels configured not to show grades.
const COURSE_GRADE: &str = "course";

/// Classifies document files into textbook metadata records.
///
/// Pure computation over its inputs; classification never fails, fields the
/// cascade cannot resolve keep their sentinels.
pub struct MetadataClassifier {
    config: Arc<Config>,
}

impl MetadataClassifier {
    /// Create a new classifier with the given configuration.
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Classify one file. `path` is the repository-relative path when known;
    /// without it only the filename rules run.
    pub fn classify(&self, filename: &str, path: Option<&str>) -> TextbookMetadata {
        let mut record = TextbookMetadata::new(filename);

        // Split detection runs before all other parsing.
        let stripped = tokenizer::strip_document_extension(filename);
        let (parsed_name, part_number) = tokenizer::split_part(&stripped);
        record.parsed_name = parsed_name;
        record.is_split = part_number.is_some();
        record.part_number = part_number;

        let Some(path) = path else {
            self.fill_from_filename(&mut record);
            return record;
        };

        let parts = tokenizer::segments(path);
        if path
            .strip_prefix(PRACTICE_DIR)
            .is_some_and(|rest| rest.starts_with('/'))
        {
            self.classify_practice(&parts, path, &mut record);
        } else if parts.len() >= 3 {
            self.classify_structural(&parts, path, &mut record);
        } else {
            self.fill_from_filename(&mut record);
        }
        record
    }

    /// Structural parse for `{level}/{subject}/...` paths.
    fn classify_structural(&self, parts: &[&str], path: &str, record: &mut TextbookMetadata) {
        if !parts[0].is_empty() {
            record.level = parts[0].to_string();
        }
        if !parts[1].is_empty() {
            record.subject = parts[1].to_string();
        }
        let show_grades = self.config.show_grades(LevelKey::from_path(path));

        let third = parts[2];
        if tokenizer::is_leaf_segment(third) {
            // {level}/{subject}/{file} - no publisher directory
            record.grade = self.grade_from_name(&record.parsed_name, show_grades);
        } else {
            record.publisher = patterns::normalize_publisher(third);
            match parts.get(3) {
                Some(fourth) if tokenizer::is_leaf_segment(fourth) => {
                    record.grade = self.grade_from_name(&record.parsed_name, show_grades);
                }
                Some(fourth) => {
                    // {level}/{subject}/{publisher}/{grade}/...
                    record.grade = if show_grades {
                        (*fourth).to_string()
                    } else {
                        COURSE_GRADE.to_string()
                    };
                }
                None => {
                    record.grade = if show_grades {
                        UNKNOWN.to_string()
                    } else {
                        COURSE_GRADE.to_string()
                    };
                }
            }
        }

        if let Some(semester) = patterns::match_semester(&record.parsed_name) {
            record.semester = semester.to_string();
        }

        // Grade equal to the whole name signals the grade matcher found
        // nothing real; retry with the complex-filename rule.
        if record.subject == UNKNOWN
            || record.grade == UNKNOWN
            || record.grade == record.parsed_name
        {
            let special = special_complex(&record.parsed_name, Some(path));
            if special.subject.is_some() {
                special.apply_to(record, true);
            }
        }
    }

    /// Grade for a file that sits directly in a publisher or subject
    /// directory: the complex-filename rule first, then the grade matcher.
    fn grade_from_name(&self, name: &str, show_grades: bool) -> String {
        if !show_grades {
            return COURSE_GRADE.to_string();
        }
        let special = special_complex(name, None);
        if let Some(grade) = special.grade {
            return grade;
        }
        patterns::match_grade(name).unwrap_or_else(|| UNKNOWN.to_string())
    }

    /// Practice-material rule for the dedicated drill directory.
    fn classify_practice(&self, parts: &[&str], path: &str, record: &mut TextbookMetadata) {
        record.subject = "数学练习".to_string();
        record.grade = "练习题".to_string();
        record.publisher = "练习题集".to_string();
        record.semester = "practice".to_string();

        match parts.get(1) {
            Some(second) if second.contains("初中练习题") => {
                record.level = "初中".to_string();
                if record.original_name.contains("中考") || path.contains("中考") {
                    record.subject = "中考数学".to_string();
                    record.grade = "中考练习".to_string();
                } else {
                    record.grade = patterns::match_grade(&record.parsed_name)
                        .unwrap_or_else(|| "数学练习".to_string());
                }
            }
            Some(second) if second.contains("高中练习题") => {
                record.level = "高中".to_string();
                if record.original_name.contains("高考") || path.contains("高考") {
                    record.subject = "高考数学".to_string();
                    record.grade = "高考练习".to_string();
                } else {
                    record.grade = patterns::match_grade(&record.parsed_name)
                        .unwrap_or_else(|| "数学练习".to_string());
                }
            }
            Some(second) if second.contains("小学练习题") => {
                record.level = "小学".to_string();
                record.grade = patterns::match_grade(&record.parsed_name)
                    .unwrap_or_else(|| "数学练习".to_string());
            }
            // Unrecognized collection names default to middle school.
            _ => record.level = "初中".to_string(),
        }

        if let Some(third) = parts.get(2) {
            if third.contains('版') || third.contains("出版社") {
                record.publisher = patterns::normalize_publisher(third);
            } else if !third.is_empty() {
                record.publisher = (*third).to_string();
            }
        }
    }

    /// Filename-only fallback: the complex-filename rule, then independent
    /// subject/grade/semester matching.
    fn fill_from_filename(&self, record: &mut TextbookMetadata) {
        let special = special_complex(&record.parsed_name, None);
        if special.subject.is_some() {
            special.apply_to(record, false);
            return;
        }

        if let Some(subject) = patterns::match_subject(&record.parsed_name) {
            record.subject = subject;
        }
        if let Some(grade) = patterns::match_grade(&record.parsed_name) {
            record.grade = grade;
        }
        if let Some(semester) = patterns::match_semester(&record.parsed_name) {
            record.semester = semester.to_string();
        }
    }
}

/// Complex-filename rule for long-form titles that defeat the generic
/// matchers. Currently covers the student reader series.
fn special_complex(name: &str, path: Option<&str>) -> PartialMetadata {
    let mut partial = PartialMetadata::default();
    if !name.contains(READER_SERIES) {
        return partial;
    }

    partial.subject = Some("道德与法治".to_string());
    partial.publisher = Some("人民出版社".to_string());

    let (grade, level): (&str, &str) = if name.contains("小学低年级") {
        ("低年级", "小学")
    } else if name.contains("小学高年级") {
        ("高年级", "小学")
    } else if name.contains("小学中年级") {
        ("中年级", "小学")
    } else if name.contains("初中") {
        ("全册", "初中")
    } else if name.contains("高中") {
        ("全册", "高中")
    } else if name.contains("小学") {
        ("全册", "小学")
    } else {
        ("", "")
    };
    if !level.is_empty() {
        partial.grade = Some(grade.to_string());
        partial.level = Some(level.to_string());
    }

    if partial.level.is_none() {
        if let Some(path) = path {
            let first = path.split('/').next().unwrap_or("");
            if matches!(first, "小学" | "初中" | "高中" | "大学") {
                partial.level = Some(first.to_string());
                if partial.grade.is_none() {
                    partial.grade = Some("全册".to_string());
                }
            }
            // Semester resolves only on this path-assisted branch.
            partial.semester = Some("complete".to_string());
        }
    }

    partial
}

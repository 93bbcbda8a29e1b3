//! Ordered pattern tables for subject, grade, and semester recognition, plus
//! grade and publisher normalization.
//!
//! Every table is priority-ordered: matchers are tried top to bottom and the
//! first hit wins, so more specific entries must stay above the generic ones.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::UNKNOWN_PUBLISHER;

/// Override patterns checked before the generic subject list. The plain
/// `生物` entry sits below `生物学` so the compound term wins.
const SUBJECT_OVERRIDES: &[(&str, &str)] = &[
    ("习近平新时代中国特色社会主义思想学生读本", "道德与法治"),
    ("思想品德", "道德与法治"),
    ("品德与生活", "道德与法治"),
    ("品德与社会", "道德与法治"),
    ("思想政治", "政治"),
    ("生物学", "生物学"),
    ("生物", "生物学"),
];

/// Generic subject tokens, tried in order after the overrides.
const SUBJECTS: &[&str] = &[
    "语文",
    "数学",
    "英语",
    "物理",
    "化学",
    "生物学",
    "历史",
    "地理",
    "政治",
    "道德与法治",
    "科学",
    "音乐",
    "美术",
    "体育与健康",
    "信息技术",
    "高等数学",
    "线性代数",
    "概率论",
    "大学物理",
    "大学英语",
    "计算机",
    "思想品德",
    "社会",
    "自然",
    "综合实践",
    "通用技术",
    "俄语",
    "日语",
    "人文地理",
    "心理健康",
    "劳动技术",
    "书法",
    "传统文化",
    "国学",
    "经典诵读",
];

/// Grade patterns in priority order: numeral grades, course labels, age
/// bands, per-stage year labels, then exam/term labels.
const GRADE_PATTERNS: &[&str] = &[
    r"[一二三四五六七八九十]年级",
    r"\d+年级",
    r"必修\d+",
    r"选修\d+",
    r"全一册",
    r"低年级",
    r"高年级",
    r"中年级",
    r"幼儿园",
    r"学前班",
    r"高一",
    r"高二",
    r"高三",
    r"初一",
    r"初二",
    r"初三",
    r"七年级",
    r"八年级",
    r"九年级",
    r"大一",
    r"大二",
    r"大三",
    r"大四",
    r"中考",
    r"高考",
    r"练习题",
    r"复习",
    r"预习",
    r"上学期",
    r"下学期",
    r"第一学期",
    r"第二学期",
];

fn grade_regexes() -> &'static Vec<Regex> {
    static REGEXES: OnceLock<Vec<Regex>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        GRADE_PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern).expect("valid grade pattern"))
            .collect()
    })
}

fn year_grade_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)年级").expect("valid year-grade pattern"))
}

/// Match a subject token in `text`. Overrides take priority over the generic
/// list; within each table the first match wins.
pub fn match_subject(text: &str) -> Option<String> {
    for (needle, subject) in SUBJECT_OVERRIDES {
        if text.contains(needle) {
            return Some((*subject).to_string());
        }
    }
    SUBJECTS
        .iter()
        .find(|subject| text.contains(**subject))
        .map(|subject| (*subject).to_string())
}

/// Match a grade label in `text` and normalize it.
pub fn match_grade(text: &str) -> Option<String> {
    for regex in grade_regexes() {
        if let Some(found) = regex.find(text) {
            return Some(normalize_grade(found.as_str()));
        }
    }
    None
}

/// Match a semester label in `text`.
pub fn match_semester(text: &str) -> Option<&'static str> {
    if text.contains("上册") {
        Some("first")
    } else if text.contains("下册") {
        Some("second")
    } else if text.contains("全一册") || text.contains("必修") || text.contains("选修") {
        Some("complete")
    } else {
        None
    }
}

/// Convert digit-based year grades (1–10) to their ideographic form; all
/// other grade labels pass through unchanged.
pub fn normalize_grade(grade: &str) -> String {
    if let Some(caps) = year_grade_re().captures(grade) {
        if let Some(numeral) = ideographic_numeral(&caps[1]) {
            return format!("{numeral}年级");
        }
    }
    grade.to_string()
}

fn ideographic_numeral(digits: &str) -> Option<&'static str> {
    match digits {
        "1" => Some("一"),
        "2" => Some("二"),
        "3" => Some("三"),
        "4" => Some("四"),
        "5" => Some("五"),
        "6" => Some("六"),
        "7" => Some("七"),
        "8" => Some("八"),
        "9" => Some("九"),
        "10" => Some("十"),
        _ => None,
    }
}

/// Canonicalize a publisher name to its short `…版` form.
///
/// Combined names like `华中师大版-华中师范大学出版社` keep the part that
/// already carries the edition suffix; `出版社` endings collapse to `版`.
pub fn normalize_publisher(raw: &str) -> String {
    if raw.is_empty() {
        return UNKNOWN_PUBLISHER.to_string();
    }

    if raw.contains('-') {
        let first = raw.split('-').next().unwrap_or("");
        if first.ends_with('版') {
            return first.to_string();
        }
        let last = raw.rsplit('-').next().unwrap_or("");
        if last.ends_with("出版社") {
            return last.replace("出版社", "版");
        }
        if last.ends_with('版') {
            return last.to_string();
        }
        return format!("{last}版");
    }

    if raw.ends_with("出版社") {
        return raw.replace("出版社", "版");
    }
    if !raw.ends_with('版') && !raw.ends_with('社') {
        return format!("{raw}版");
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_overrides_win() {
        assert_eq!(
            match_subject("习近平新时代中国特色社会主义思想学生读本（初中）"),
            Some("道德与法治".to_string())
        );
        assert_eq!(match_subject("思想政治必修1"), Some("政治".to_string()));
        assert_eq!(match_subject("思想品德七年级"), Some("道德与法治".to_string()));
    }

    #[test]
    fn test_subject_biology_compound() {
        assert_eq!(match_subject("生物学七年级上册"), Some("生物学".to_string()));
        assert_eq!(match_subject("生物七年级上册"), Some("生物学".to_string()));
    }

    #[test]
    fn test_subject_generic_order() {
        assert_eq!(match_subject("义务教育教科书·数学"), Some("数学".to_string()));
        assert_eq!(match_subject("经典诵读选编"), Some("经典诵读".to_string()));
        assert_eq!(match_subject("通知.txt"), None);
    }

    #[test]
    fn test_grade_ideographic_and_digit() {
        assert_eq!(match_grade("数学一年级上册"), Some("一年级".to_string()));
        assert_eq!(match_grade("数学4年级上册"), Some("四年级".to_string()));
        assert_eq!(match_grade("思想政治必修3"), Some("必修3".to_string()));
        assert_eq!(match_grade("篮球指南"), None);
    }

    #[test]
    fn test_grade_stage_labels() {
        assert_eq!(match_grade("高三总复习"), Some("高三".to_string()));
        assert_eq!(match_grade("小学低年级读本"), Some("低年级".to_string()));
        assert_eq!(match_grade("中考冲刺卷"), Some("中考".to_string()));
    }

    #[test]
    fn test_normalize_grade_passthrough() {
        assert_eq!(normalize_grade("4年级"), "四年级");
        assert_eq!(normalize_grade("11年级"), "11年级");
        assert_eq!(normalize_grade("必修1"), "必修1");
        assert_eq!(normalize_grade("高二"), "高二");
    }

    #[test]
    fn test_semester() {
        assert_eq!(match_semester("数学一年级上册"), Some("first"));
        assert_eq!(match_semester("数学一年级下册"), Some("second"));
        assert_eq!(match_semester("历史全一册"), Some("complete"));
        assert_eq!(match_semester("物理选修2"), Some("complete"));
        assert_eq!(match_semester("数学一年级"), None);
    }

    #[test]
    fn test_publisher_combined_short_form_wins() {
        assert_eq!(
            normalize_publisher("华中师大版-华中师范大学出版社"),
            "华中师大版"
        );
    }

    #[test]
    fn test_publisher_combined_long_form() {
        assert_eq!(normalize_publisher("教材-人民教育出版社"), "人民教育版");
        assert_eq!(normalize_publisher("教材-北师大"), "北师大版");
    }

    #[test]
    fn test_publisher_single() {
        assert_eq!(normalize_publisher("人民教育出版社"), "人民教育版");
        assert_eq!(normalize_publisher("人教版"), "人教版");
        assert_eq!(normalize_publisher("新华社"), "新华社");
        assert_eq!(normalize_publisher("北师大"), "北师大版");
        assert_eq!(normalize_publisher(""), UNKNOWN_PUBLISHER);
    }
}

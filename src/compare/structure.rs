//! Document-level structure checks.

use crate::classify::rules::section_label;
use crate::model::{Document, ParagraphRole, RequirementSpec, Violation, ViolationKind};
use crate::parser::label_split_offset;
use serde_json::{json, Value};

/// Roles a thesis must contain when the requirements mention them.
pub const REQUIRED_ROLES: [ParagraphRole; 5] = [
    ParagraphRole::TitleZh,
    ParagraphRole::AbstractZh,
    ParagraphRole::AbstractContentZh,
    ParagraphRole::KeywordsZh,
    ParagraphRole::KeywordsContentZh,
];

/// Minimum characters of Chinese abstract content.
pub const MIN_ABSTRACT_CHARS: usize = 10;

/// Minimum number of Chinese keywords.
pub const MIN_KEYWORDS: usize = 3;

const LOCATION_PREFIX: &str = "document";

/// Check required sections, abstract length and keyword count.
pub fn check_structure(document: &Document, spec: &RequirementSpec) -> Vec<Violation> {
    let mut violations = Vec::new();

    for role in REQUIRED_ROLES {
        if spec.role(role).is_none() || document.has_role(role) {
            continue;
        }
        violations.push(Violation::new(
            ViolationKind::Structure,
            format!("missing {} ({})", role.display_name_zh(), role),
            format!("{}.{}", LOCATION_PREFIX, role),
            json!("present"),
            Value::Null,
        ));
    }

    let abstract_chars: usize = document
        .records_with_role(ParagraphRole::AbstractContentZh)
        .map(|(_, r)| r.text.trim().chars().count())
        .sum();
    if document.has_role(ParagraphRole::AbstractContentZh) && abstract_chars < MIN_ABSTRACT_CHARS {
        violations.push(Violation::new(
            ViolationKind::Structure,
            format!(
                "abstract content is too short: {} characters, at least {} expected",
                abstract_chars, MIN_ABSTRACT_CHARS
            ),
            format!("{}.{}", LOCATION_PREFIX, ParagraphRole::AbstractContentZh),
            json!(MIN_ABSTRACT_CHARS),
            json!(abstract_chars),
        ));
    }

    if let Some(keywords) = keyword_count(document) {
        if keywords < MIN_KEYWORDS {
            violations.push(Violation::new(
                ViolationKind::Structure,
                format!(
                    "too few keywords: {} found, at least {} expected",
                    keywords, MIN_KEYWORDS
                ),
                format!("{}.{}", LOCATION_PREFIX, ParagraphRole::KeywordsContentZh),
                json!(MIN_KEYWORDS),
                json!(keywords),
            ));
        }
    }

    violations
}

/// Number of Chinese keywords, or `None` when the document has none at all.
///
/// Keyword content records are preferred; a keyword label paragraph that was
/// never split contributes the text after its label.
pub fn keyword_count(document: &Document) -> Option<usize> {
    let mut texts: Vec<&str> = document
        .records_with_role(ParagraphRole::KeywordsContentZh)
        .map(|(_, r)| r.text.as_str())
        .collect();

    if texts.is_empty() {
        for (_, record) in document.records_with_role(ParagraphRole::KeywordsZh) {
            if let Some(offset) = label_split_offset(&record.text) {
                let byte = record
                    .text
                    .char_indices()
                    .nth(offset)
                    .map(|(i, _)| i)
                    .unwrap_or(record.text.len());
                texts.push(&record.text[byte..]);
            }
        }
    }

    if texts.is_empty() {
        return None;
    }

    let count = texts
        .iter()
        .flat_map(|text| text.split(['；', ';', '，', ',']))
        .map(str::trim)
        .filter(|k| !k.is_empty() && section_label(k).is_none())
        .count();
    Some(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ParagraphRecord;

    fn document(items: &[(&str, ParagraphRole)]) -> Document {
        let mut doc = Document::new();
        for (i, (text, role)) in items.iter().enumerate() {
            doc.add_record(ParagraphRecord::text(*text, i).with_role(*role));
        }
        doc
    }

    fn spec_with(roles: &[ParagraphRole]) -> RequirementSpec {
        let mut spec = RequirementSpec::new();
        for role in roles {
            spec.set_role(*role, json!({"fonts": {"bold": false}}));
        }
        spec
    }

    #[test]
    fn test_missing_required_role() {
        let doc = document(&[("正文", ParagraphRole::Body)]);
        let spec = spec_with(&[ParagraphRole::TitleZh, ParagraphRole::Body]);
        let violations = check_structure(&doc, &spec);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location, "document.title_zh");
        assert_eq!(violations[0].kind, ViolationKind::Structure);
    }

    #[test]
    fn test_short_abstract_and_few_keywords() {
        let doc = document(&[
            ("摘要：", ParagraphRole::AbstractZh),
            ("太短", ParagraphRole::AbstractContentZh),
            ("关键词：", ParagraphRole::KeywordsZh),
            ("格式；论文", ParagraphRole::KeywordsContentZh),
        ]);
        let violations = check_structure(&doc, &RequirementSpec::new());
        let locations: Vec<&str> = violations.iter().map(|v| v.location.as_str()).collect();
        assert_eq!(
            locations,
            vec!["document.abstract_content_zh", "document.keywords_content_zh"]
        );
    }

    #[test]
    fn test_keywords_in_label_paragraph() {
        let doc = document(&[("关键词：格式；论文；检查", ParagraphRole::KeywordsZh)]);
        assert_eq!(keyword_count(&doc), Some(3));
        assert_eq!(keyword_count(&Document::new()), None);
    }

    #[test]
    fn test_complete_front_matter() {
        let doc = document(&[
            ("论文格式检查研究", ParagraphRole::TitleZh),
            ("摘要：", ParagraphRole::AbstractZh),
            ("这是摘要内容，长度足够。", ParagraphRole::AbstractContentZh),
            ("关键词：", ParagraphRole::KeywordsZh),
            ("格式；论文；检查", ParagraphRole::KeywordsContentZh),
        ]);
        let spec = spec_with(&REQUIRED_ROLES);
        assert!(check_structure(&doc, &spec).is_empty());
    }
}

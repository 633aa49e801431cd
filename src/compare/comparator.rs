//! Recursive comparison of attribute trees against requirement trees.

use super::options::CompareOptions;
use super::units::{
    canonical_font, parse_alignment, parse_bool, parse_color, parse_font_size,
    parse_line_spacing, value_length, value_number, value_text,
};
use crate::model::{
    is_unconstrained, Document, LineSpacing, ParagraphRecord, RequirementSpec, Violation,
    ViolationKind, POINTS_PER_CM,
};
use serde_json::Value;

/// Characters of paragraph text carried into a violation.
pub const EXCERPT_CHARS: usize = 20;

/// How a leaf is normalized before comparison, chosen by its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    FontSize,
    FontName,
    Alignment,
    LineSpacing,
    Length,
    Bool,
    Color,
    Other,
}

impl FieldKind {
    pub fn of(key: &str) -> Self {
        match key {
            "size" | "font_size" => FieldKind::FontSize,
            "zh_family" | "en_family" | "family" | "font" | "font_name" => FieldKind::FontName,
            "alignment" => FieldKind::Alignment,
            "line_spacing" => FieldKind::LineSpacing,
            "first_line" | "first_line_indent" | "left" | "right" | "hanging" | "space_before"
            | "space_after" | "left_indent" | "right_indent" => FieldKind::Length,
            "bold" | "italic" | "isAllCaps" | "all_caps" | "underline" => FieldKind::Bool,
            "color" => FieldKind::Color,
            _ => FieldKind::Other,
        }
    }
}

/// Compare one record against the requirement subtree for its role.
///
/// Locations are `{role}.{path}`; every violation carries the record index
/// and a short excerpt of its text.
pub fn compare_record(
    index: usize,
    record: &ParagraphRecord,
    requirement: &Value,
    options: &CompareOptions,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    compare_tree(
        &record.attribute_tree(),
        requirement,
        record.role.label(),
        options,
        &mut violations,
    );
    let excerpt = record.excerpt(EXCERPT_CHARS);
    violations
        .into_iter()
        .map(|v| v.with_paragraph(index, excerpt.clone()))
        .collect()
}

/// Compare every text record that has a requirement for its role, then the
/// page settings and, when enabled, the document structure.
pub fn compare_document(
    document: &Document,
    spec: &RequirementSpec,
    options: &CompareOptions,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (index, record) in document.records.iter().enumerate() {
        if !record.is_text() {
            continue;
        }
        let Some(requirement) = spec.role(record.role) else {
            continue;
        };
        if is_unconstrained(requirement) {
            continue;
        }
        violations.extend(compare_record(index, record, requirement, options));
    }

    if let Some(paper) = spec.paper() {
        violations.extend(super::page::compare_page(&document.page, paper, options));
    }

    if options.structural_checks {
        violations.extend(super::structure::check_structure(document, spec));
    }

    log::info!(
        "compared {} records: {} violations",
        document.len(),
        violations.len()
    );
    violations
}

/// Walk `expected` key by key, reporting into `out` with locations under `prefix`.
pub fn compare_tree(
    actual: &Value,
    expected: &Value,
    prefix: &str,
    options: &CompareOptions,
    out: &mut Vec<Violation>,
) {
    let Some(expected) = expected.as_object() else {
        return;
    };

    for (key, required) in expected {
        if is_unconstrained(required) {
            continue;
        }
        let location = format!("{}.{}", prefix, key);

        let found = match actual.get(key) {
            Some(Value::Null) | None => {
                if !options.is_optional(key) {
                    out.push(Violation::new(
                        ViolationKind::MissingField,
                        format!("missing required field '{}'", key),
                        location,
                        required.clone(),
                        Value::Null,
                    ));
                }
                continue;
            }
            Some(found) => found,
        };

        let found = match found {
            Value::Array(values) => {
                if values.len() > 1 {
                    out.push(Violation::new(
                        ViolationKind::InconsistentValue,
                        format!("'{}' has multiple values: {}", key, list_text(values)),
                        location.clone(),
                        required.clone(),
                        found.clone(),
                    ));
                }
                // Keep comparing the first value so a wrong value is reported too.
                match values.first() {
                    Some(first) => first,
                    None => continue,
                }
            }
            other => other,
        };

        if required.is_object() {
            if found.is_object() {
                compare_tree(found, required, &location, options, out);
            } else {
                out.push(Violation::new(
                    ViolationKind::TypeMismatch,
                    format!(
                        "'{}' should be an object, found {}",
                        key,
                        type_name(found)
                    ),
                    location,
                    required.clone(),
                    found.clone(),
                ));
            }
            continue;
        }

        if !values_match(key, required, found, options) {
            out.push(Violation::new(
                ViolationKind::ValueMismatch,
                format!(
                    "'{}' mismatch: expected {}, found {}",
                    key,
                    value_text(required),
                    value_text(found)
                ),
                location,
                required.clone(),
                found.clone(),
            ));
        }
    }
}

/// Whether an actual leaf satisfies a required leaf.
///
/// A required array is a list of acceptable values.
pub fn values_match(key: &str, required: &Value, actual: &Value, options: &CompareOptions) -> bool {
    if is_unconstrained(required) {
        return true;
    }
    if let Value::Array(choices) = required {
        return choices
            .iter()
            .any(|choice| values_match(key, choice, actual, options));
    }

    let tolerance_pt = options.length_tolerance_cm * POINTS_PER_CM;
    match FieldKind::of(key) {
        FieldKind::FontSize => numeric_match(
            parse_font_size(required),
            parse_font_size(actual),
            options.font_size_tolerance_pt,
        ),
        FieldKind::FontName => match (required.as_str(), actual.as_str()) {
            (Some(r), Some(a)) => canonical_font(r) == canonical_font(a),
            _ => loose_match(required, actual, tolerance_pt, options),
        },
        FieldKind::Alignment => match (parse_alignment(required), parse_alignment(actual)) {
            (Some(r), Some(a)) => r == a,
            _ => loose_match(required, actual, tolerance_pt, options),
        },
        FieldKind::LineSpacing => {
            match (parse_line_spacing(required), parse_line_spacing(actual)) {
                (Some(r), Some(a)) => line_spacing_match(r, a, options),
                _ => loose_match(required, actual, tolerance_pt, options),
            }
        }
        FieldKind::Length => numeric_match(
            value_length(required, options.char_width_pt),
            value_length(actual, options.char_width_pt),
            tolerance_pt,
        ),
        FieldKind::Bool => match (parse_bool(required), parse_bool(actual)) {
            (Some(r), Some(a)) => r == a,
            _ => false,
        },
        FieldKind::Color => {
            match (
                required.as_str().and_then(parse_color),
                actual.as_str().and_then(parse_color),
            ) {
                (Some(r), Some(a)) => r == a,
                _ => loose_match(required, actual, tolerance_pt, options),
            }
        }
        FieldKind::Other => loose_match(required, actual, tolerance_pt, options),
    }
}

fn line_spacing_match(required: LineSpacing, actual: LineSpacing, options: &CompareOptions) -> bool {
    match (required, actual) {
        (LineSpacing::Multiple(r), LineSpacing::Multiple(a)) => {
            (r - a).abs() <= options.line_multiple_tolerance
        }
        (LineSpacing::Exact(r), LineSpacing::Exact(a))
        | (LineSpacing::AtLeast(r), LineSpacing::AtLeast(a)) => {
            (r.points() - a.points()).abs() <= options.line_fixed_tolerance_pt
        }
        _ => false,
    }
}

fn numeric_match(required: Option<f32>, actual: Option<f32>, tolerance: f32) -> bool {
    match (required, actual) {
        (Some(r), Some(a)) => (r - a).abs() <= tolerance + f32::EPSILON,
        _ => false,
    }
}

/// Fallback equality: case-insensitive text, then lengths, then bare numbers.
fn loose_match(required: &Value, actual: &Value, tolerance_pt: f32, options: &CompareOptions) -> bool {
    if required == actual {
        return true;
    }
    if let (Some(r), Some(a)) = (required.as_str(), actual.as_str()) {
        if r.trim().eq_ignore_ascii_case(a.trim()) {
            return true;
        }
    }
    if let (Some(r), Some(a)) = (
        value_length(required, options.char_width_pt),
        value_length(actual, options.char_width_pt),
    ) {
        if required.is_string() || actual.is_string() {
            return (r - a).abs() <= tolerance_pt;
        }
    }
    numeric_match(value_number(required), value_number(actual), options.length_tolerance_cm)
}

fn list_text(values: &[Value]) -> String {
    let items: Vec<String> = values.iter().map(value_text).collect();
    format!("[{}]", items.join(", "))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Alignment, Measure, ParagraphRole};
    use serde_json::json;

    fn record() -> ParagraphRecord {
        let mut record = ParagraphRecord::text("这是摘要内容，长度足够。", 1)
            .with_role(ParagraphRole::AbstractContentZh);
        record.fonts.zh_family.insert("宋体".to_string());
        record.fonts.en_family.insert("Times New Roman".to_string());
        record.fonts.size.insert(12.0);
        record.fonts.color.insert("black".to_string());
        record.fonts.bold.insert(false);
        record.fonts.italic.insert(false);
        record.fonts.all_caps.insert(false);
        record.format.alignment = Alignment::Center;
        record.format.first_line = Measure::Chars(2.0);
        record
    }

    fn compare(requirement: Value) -> Vec<Violation> {
        compare_record(3, &record(), &requirement, &CompareOptions::default())
    }

    // ==================== Leaf Tests ====================

    #[test]
    fn test_alignment_mismatch_location() {
        let violations = compare(json!({"paragraph_format": {"alignment": "left"}}));
        assert_eq!(violations.len(), 1);
        let v = &violations[0];
        assert_eq!(v.kind, ViolationKind::ValueMismatch);
        assert!(v.message.contains("alignment"));
        assert_eq!(v.location, "abstract_content_zh.paragraph_format.alignment");
        assert_eq!(v.paragraph, Some(3));
        assert_eq!(v.expected, json!("left"));
        assert_eq!(v.actual, json!("center"));
    }

    #[test]
    fn test_equivalent_values_match() {
        let violations = compare(json!({
            "fonts": {
                "zh_family": "SimSun",
                "en_family": "TNR",
                "size": "小四",
                "color": "auto",
                "bold": "no",
                "isAllCaps": "0"
            },
            "paragraph_format": {
                "alignment": "居中",
                "line_spacing": "single",
                "indentation": {"first_line": "2字符", "left": "0mm"}
            }
        }));
        assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn test_unit_conversion_between_cm_and_chars() {
        // 2 characters at 10.5pt = 21pt = 0.741cm
        assert!(compare(json!({"paragraph_format": {"indentation": {"first_line": "0.74cm"}}})).is_empty());
        assert_eq!(
            compare(json!({"paragraph_format": {"indentation": {"first_line": "1cm"}}})).len(),
            1
        );
    }

    #[test]
    fn test_unknown_always_matches() {
        assert!(compare(json!({"fonts": {"size": "unknown", "zh_family": "Unknown"}})).is_empty());
        assert!(compare(json!({"fonts": {"underline": "unknown"}})).is_empty());
    }

    // ==================== Structure Tests ====================

    #[test]
    fn test_missing_field() {
        let violations = compare(json!({"fonts": {"underline": true}}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::MissingField);
        assert_eq!(violations[0].location, "abstract_content_zh.fonts.underline");

        let options = CompareOptions::default().with_optional_key("underline");
        let quiet = compare_record(0, &record(), &json!({"fonts": {"underline": true}}), &options);
        assert!(quiet.is_empty());
    }

    #[test]
    fn test_type_mismatch() {
        let violations = compare(json!({"paragraph_format": {"alignment": {"value": "left"}}}));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::TypeMismatch);
    }

    #[test]
    fn test_inconsistent_sizes_reported_once() {
        let mut mixed = record();
        mixed.fonts.size.insert(14.0);
        let options = CompareOptions::default();

        for required in ["12pt", "14pt", "五号"] {
            let violations =
                compare_record(0, &mixed, &json!({"fonts": {"size": required}}), &options);
            let inconsistent = violations
                .iter()
                .filter(|v| v.kind == ViolationKind::InconsistentValue)
                .count();
            assert_eq!(inconsistent, 1, "required {}", required);
        }

        // The first value (12) is still compared.
        let violations = compare_record(0, &mixed, &json!({"fonts": {"size": "五号"}}), &options);
        assert!(violations.iter().any(|v| v.kind == ViolationKind::ValueMismatch));
        let violations = compare_record(0, &mixed, &json!({"fonts": {"size": "小四"}}), &options);
        assert!(!violations.iter().any(|v| v.kind == ViolationKind::ValueMismatch));
    }

    #[test]
    fn test_comparison_is_idempotent() {
        let requirement = json!({
            "fonts": {"size": "三号", "bold": true},
            "paragraph_format": {"alignment": "justify"}
        });
        let first = compare(requirement.clone());
        let second = compare(requirement);
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_required_choices() {
        assert!(compare(json!({"paragraph_format": {"alignment": ["left", "center"]}})).is_empty());
    }
}

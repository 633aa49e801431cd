//! JSON rendering for check reports.

use super::CheckReport;
use crate::error::{Error, Result};
use crate::model::Violation;
use serde::Serialize;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

fn serialize<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Convert a report to JSON.
pub fn to_json(report: &CheckReport, format: JsonFormat) -> Result<String> {
    serialize(report, format)
}

/// Convert a violation list to a JSON array.
pub fn violations_to_json(violations: &[Violation], format: JsonFormat) -> Result<String> {
    serialize(violations, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Document, ParagraphRecord, ViolationKind};
    use serde_json::{json, Value};

    fn report() -> CheckReport {
        let mut doc = Document::new();
        doc.metadata.source = Some("thesis.docx".to_string());
        doc.add_record(ParagraphRecord::text("正文", 0));
        let violation = Violation::new(
            ViolationKind::ValueMismatch,
            "'alignment' mismatch: expected left, found center",
            "body.paragraph_format.alignment",
            json!("left"),
            json!("center"),
        );
        CheckReport::new(&doc, vec![violation])
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&report(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"source\""));
        assert!(json.contains("thesis.docx"));
        assert!(json.contains('\n'));

        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["violations"][0]["location"], "body.paragraph_format.alignment");
        assert_eq!(value["stats"]["by_kind"]["value_mismatch"], 1);
        assert!(value.get("classification").is_none());
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&report(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_violation_array() {
        let json = violations_to_json(&report().violations, JsonFormat::Compact).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        let array = value.as_array().unwrap();
        assert_eq!(array.len(), 1);
        assert_eq!(array[0]["expected"], "left");
        assert_eq!(array[0]["actual"], "center");
        assert!(array[0]["message"].as_str().unwrap().contains("alignment"));
    }
}

//! Format violations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Category of a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A required key has no actual value
    MissingField,
    /// Runs of one paragraph disagree on a value
    InconsistentValue,
    /// A nested requirement met a non-nested actual value
    TypeMismatch,
    /// The actual value differs from the required one
    ValueMismatch,
    /// Document structure problem (missing section, too few keywords)
    Structure,
    /// A reference entry does not follow the citation style
    Citation,
}

/// A single mismatch between actual and required formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,

    /// Human-readable description naming the field
    pub message: String,

    /// Dotted path, prefixed by the role label or `paper`/`document`
    pub location: String,

    pub expected: Value,

    pub actual: Value,

    /// Record index the violation belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<usize>,

    /// Truncated paragraph text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

impl Violation {
    /// Create a violation not tied to a paragraph.
    pub fn new(
        kind: ViolationKind,
        message: impl Into<String>,
        location: impl Into<String>,
        expected: Value,
        actual: Value,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            location: location.into(),
            expected,
            actual,
            paragraph: None,
            excerpt: None,
        }
    }

    /// Attach the record index and text excerpt.
    pub fn with_paragraph(mut self, index: usize, excerpt: impl Into<String>) -> Self {
        self.paragraph = Some(index);
        self.excerpt = Some(excerpt.into());
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)?;
        if let Some(excerpt) = &self.excerpt {
            write!(f, " (\"{}\")", excerpt)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_shape() {
        let v = Violation::new(
            ViolationKind::ValueMismatch,
            "alignment mismatch: expected left, found center",
            "abstract_content_zh.paragraph_format.alignment",
            json!("left"),
            json!("center"),
        )
        .with_paragraph(3, "这是摘要内容...");

        let value = serde_json::to_value(&v).unwrap();
        assert_eq!(value["kind"], "value_mismatch");
        assert_eq!(value["expected"], "left");
        assert_eq!(value["paragraph"], 3);
        assert!(v.to_string().starts_with("abstract_content_zh.paragraph_format.alignment"));
    }

    #[test]
    fn test_optional_fields_skipped() {
        let v = Violation::new(
            ViolationKind::Structure,
            "missing section",
            "document.structure",
            json!("abstract_zh"),
            json!(null),
        );
        let value = serde_json::to_value(&v).unwrap();
        assert!(value.get("paragraph").is_none());
        assert!(value.get("excerpt").is_none());
    }
}

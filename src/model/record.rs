//! Paragraph records.

use super::attributes::{FontAttributes, ParagraphFormat};
use super::resource::ImageData;
use super::role::ParagraphRole;
use super::table::TableData;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One physical paragraph, image or table of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphRecord {
    /// Structural role (mutated by the classifier)
    pub role: ParagraphRole,

    /// Confidence of the current role, 0..1
    pub confidence: f32,

    /// Raw text content
    pub text: String,

    /// Resolved font attributes
    pub fonts: FontAttributes,

    /// Resolved paragraph format
    pub format: ParagraphFormat,

    /// Paragraph style display name, when one is applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_name: Option<String>,

    /// Index of the physical body block this record came from
    pub source_index: usize,

    /// Non-text payload
    pub element: ElementContent,
}

impl ParagraphRecord {
    /// Create a text record with default attributes.
    pub fn text(text: impl Into<String>, source_index: usize) -> Self {
        Self {
            role: ParagraphRole::Body,
            confidence: 0.0,
            text: text.into(),
            fonts: FontAttributes::default(),
            format: ParagraphFormat::default(),
            style_name: None,
            source_index,
            element: ElementContent::Text,
        }
    }

    /// Create an image record.
    pub fn image(image: ImageData, source_index: usize) -> Self {
        Self {
            role: ParagraphRole::Figure,
            confidence: 1.0,
            element: ElementContent::Image(image),
            ..Self::text(String::new(), source_index)
        }
    }

    /// Create a table record.
    pub fn table(table: TableData, source_index: usize) -> Self {
        let text = table.plain_text();
        Self {
            role: ParagraphRole::Table,
            confidence: 1.0,
            element: ElementContent::Table(table),
            ..Self::text(text, source_index)
        }
    }

    /// Builder-style role setter.
    pub fn with_role(mut self, role: ParagraphRole) -> Self {
        self.role = role;
        self
    }

    /// Whether this is an ordinary text paragraph.
    pub fn is_text(&self) -> bool {
        matches!(self.element, ElementContent::Text)
    }

    pub fn is_image(&self) -> bool {
        matches!(self.element, ElementContent::Image(_))
    }

    pub fn is_table(&self) -> bool {
        matches!(self.element, ElementContent::Table(_))
    }

    /// Number of characters in the text.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Text prefix used to point at the paragraph in reports.
    pub fn excerpt(&self, max_chars: usize) -> String {
        let trimmed = self.text.trim();
        let prefix: String = trimmed.chars().take(max_chars).collect();
        if trimmed.chars().count() > max_chars {
            format!("{}...", prefix)
        } else {
            prefix
        }
    }

    /// Font and paragraph attributes in requirement-file shape.
    pub fn attribute_tree(&self) -> Value {
        json!({
            "fonts": self.fonts.to_tree(),
            "paragraph_format": self.format.to_tree(),
        })
    }
}

/// Non-text payload of a record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementContent {
    /// Ordinary paragraph
    #[default]
    Text,
    /// Paragraph holding an inline image
    Image(ImageData),
    /// Table
    Table(TableData),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt() {
        let record = ParagraphRecord::text("这是一个非常长的段落内容，用来测试摘要截断是否正确工作的情况", 0);
        assert_eq!(record.excerpt(5), "这是一个非...");
        let short = ParagraphRecord::text("  短  ", 1);
        assert_eq!(short.excerpt(20), "短");
    }

    #[test]
    fn test_table_record() {
        let table = TableData {
            rows: vec![
                vec!["a".into(), "b".into()],
                vec!["c".into(), "d".into(), "e".into()],
            ],
            sequence: 1,
        };
        assert_eq!(table.column_count(), 3);
        let record = ParagraphRecord::table(table, 4);
        assert!(record.is_table());
        assert_eq!(record.role, ParagraphRole::Table);
        assert_eq!(record.text, "a\tb\nc\td\te");
    }

    #[test]
    fn test_serialized_kind_tag() {
        let record = ParagraphRecord::text("正文", 0);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["element"]["kind"], "text");
        assert_eq!(value["role"], "body");
    }
}

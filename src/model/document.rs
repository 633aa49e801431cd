//! Document-level types.

use super::page::PageSettings;
use super::record::ParagraphRecord;
use super::role::ParagraphRole;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The extracted document model: records in physical order plus page settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Document metadata
    pub metadata: Metadata,

    /// Page settings of the final section
    pub page: PageSettings,

    /// Paragraph, image and table records in document order
    pub records: Vec<ParagraphRecord>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the document has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a record.
    pub fn add_record(&mut self, record: ParagraphRecord) {
        self.records.push(record);
    }

    /// Get a record by index.
    pub fn get(&self, index: usize) -> Option<&ParagraphRecord> {
        self.records.get(index)
    }

    /// Iterate over records with a given role.
    pub fn records_with_role(
        &self,
        role: ParagraphRole,
    ) -> impl Iterator<Item = (usize, &ParagraphRecord)> {
        self.records
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.role == role)
    }

    /// Check whether any record carries the role.
    pub fn has_role(&self, role: ParagraphRole) -> bool {
        self.records.iter().any(|r| r.role == role)
    }

    /// Count of records per role.
    pub fn role_counts(&self) -> BTreeMap<ParagraphRole, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.role).or_insert(0) += 1;
        }
        counts
    }

    /// Plain text of all text records, one per line.
    pub fn plain_text(&self) -> String {
        self.records
            .iter()
            .filter(|r| r.is_text())
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Document metadata collected during extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Source file name, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Number of body blocks (paragraphs and tables) after splitting
    pub block_count: usize,

    /// Number of paragraphs split at an embedded section keyword
    pub split_count: usize,

    /// Number of text records
    pub paragraph_count: usize,

    /// Number of image records
    pub image_count: usize,

    /// Number of table records
    pub table_count: usize,

    /// Defects recovered with defaults during extraction
    pub recovered_defects: usize,
}

//! Check report with metadata and statistics.

use crate::classify::ClassificationSummary;
use crate::model::{Document, ParagraphRole, Violation, ViolationKind};
use crate::reconstruct::ReconstructSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Result of checking a document against a requirement specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    /// When the report was produced
    pub generated_at: DateTime<Utc>,

    /// Source document name, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Violations in document order
    pub violations: Vec<Violation>,

    /// Classified text paragraphs
    pub records: Vec<RecordSummary>,

    /// Counters
    pub stats: CheckStats,

    /// Classification counters, when classification ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<ClassificationSummary>,

    /// Reconstruction counters, when the document was fixed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconstruction: Option<ReconstructSummary>,
}

impl CheckReport {
    /// Build a report from a classified document and its violations.
    pub fn new(document: &Document, violations: Vec<Violation>) -> Self {
        let records = document
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_text())
            .map(|(index, r)| RecordSummary {
                index,
                role: r.role,
                confidence: r.confidence,
                text: r.text.clone(),
            })
            .collect();
        let stats = CheckStats::collect(document, &violations);

        Self {
            generated_at: Utc::now(),
            source: document.metadata.source.clone(),
            violations,
            records,
            stats,
            classification: None,
            reconstruction: None,
        }
    }

    /// Attach classification counters.
    pub fn with_classification(mut self, summary: ClassificationSummary) -> Self {
        self.classification = Some(summary);
        self
    }

    /// Attach reconstruction counters.
    pub fn with_reconstruction(mut self, summary: ReconstructSummary) -> Self {
        self.reconstruction = Some(summary);
        self
    }

    /// True when no violation was found.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations that point at a record.
    pub fn violations_for(&self, index: usize) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(move |v| v.paragraph == Some(index))
    }
}

/// One classified paragraph as shown in reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    /// Record index in the document
    pub index: usize,
    pub role: ParagraphRole,
    pub confidence: f32,
    pub text: String,
}

/// Statistics of a check run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckStats {
    /// Number of text paragraphs
    pub paragraph_count: usize,

    /// Number of images
    pub image_count: usize,

    /// Number of tables
    pub table_count: usize,

    /// Total violations
    pub violation_count: usize,

    /// Distinct paragraphs with at least one violation
    pub flagged_paragraphs: usize,

    /// Violations per kind
    pub by_kind: BTreeMap<ViolationKind, usize>,

    /// Violations per location prefix (role label, `paper`, `document`, ...)
    pub by_scope: BTreeMap<String, usize>,
}

impl CheckStats {
    /// Count records and violations.
    pub fn collect(document: &Document, violations: &[Violation]) -> Self {
        let mut stats = Self::default();
        for record in &document.records {
            if record.is_image() {
                stats.image_count += 1;
            } else if record.is_table() {
                stats.table_count += 1;
            } else {
                stats.paragraph_count += 1;
            }
        }
        for violation in violations {
            stats.add_violation(violation);
        }
        stats.flagged_paragraphs = violations
            .iter()
            .filter_map(|v| v.paragraph)
            .collect::<BTreeSet<_>>()
            .len();
        stats
    }

    /// Count one violation.
    pub fn add_violation(&mut self, violation: &Violation) {
        self.violation_count += 1;
        *self.by_kind.entry(violation.kind).or_insert(0) += 1;
        *self.by_scope.entry(scope_of(&violation.location)).or_insert(0) += 1;
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &CheckStats) {
        self.paragraph_count += other.paragraph_count;
        self.image_count += other.image_count;
        self.table_count += other.table_count;
        self.violation_count += other.violation_count;
        self.flagged_paragraphs += other.flagged_paragraphs;
        for (kind, count) in &other.by_kind {
            *self.by_kind.entry(*kind).or_insert(0) += count;
        }
        for (scope, count) in &other.by_scope {
            *self.by_scope.entry(scope.clone()).or_insert(0) += count;
        }
    }
}

/// First segment of a dotted location, without any index suffix.
fn scope_of(location: &str) -> String {
    let head = location.split('.').next().unwrap_or(location);
    head.split('[').next().unwrap_or(head).to_string()
}

//! Comparison tolerances.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Tolerances and switches for the requirement comparator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareOptions {
    /// Indents and spacing, in centimeters
    pub length_tolerance_cm: f32,

    /// Font sizes, in points
    pub font_size_tolerance_pt: f32,

    /// Page margins and header/footer distances, in centimeters
    pub margin_tolerance_cm: f32,

    /// Paper width and height, in centimeters
    pub paper_tolerance_cm: f32,

    /// Line spacing multiples
    pub line_multiple_tolerance: f32,

    /// Exact and minimum line heights, in points
    pub line_fixed_tolerance_pt: f32,

    /// Width of one character when converting "N characters" indents
    pub char_width_pt: f32,

    /// Keys that never produce a missing-field violation
    pub optional_keys: BTreeSet<String>,

    /// Run the document-level structure checks
    pub structural_checks: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            length_tolerance_cm: 0.1,
            font_size_tolerance_pt: 0.5,
            margin_tolerance_cm: 0.01,
            paper_tolerance_cm: 0.2,
            line_multiple_tolerance: 0.1,
            line_fixed_tolerance_pt: 0.5,
            char_width_pt: 10.5,
            optional_keys: BTreeSet::new(),
            structural_checks: true,
        }
    }
}

impl CompareOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a key as optional.
    pub fn with_optional_key(mut self, key: impl Into<String>) -> Self {
        self.optional_keys.insert(key.into());
        self
    }

    /// Enable or disable structure checks.
    pub fn with_structural_checks(mut self, enabled: bool) -> Self {
        self.structural_checks = enabled;
        self
    }

    /// Set the character width used for character-based indents.
    pub fn with_char_width(mut self, points: f32) -> Self {
        self.char_width_pt = points;
        self
    }

    /// Set the margin tolerance.
    pub fn with_margin_tolerance(mut self, cm: f32) -> Self {
        self.margin_tolerance_cm = cm;
        self
    }

    pub fn is_optional(&self, key: &str) -> bool {
        self.optional_keys.contains(key)
    }
}

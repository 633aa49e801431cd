//! Reconstruction options.

use serde::{Deserialize, Serialize};

/// Switches for document reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructOptions {
    /// Color runs of paragraphs with violations red
    pub highlight: bool,

    /// Format paragraphs inside table cells with the body style
    pub format_table_cells: bool,

    /// Write the `paper` requirements into every section
    pub apply_page_settings: bool,

    /// Number figure and table captions in recreate mode
    pub number_captions: bool,

    /// Width of one character when reading "N characters" requirements
    pub char_width_pt: f32,
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            highlight: false,
            format_table_cells: false,
            apply_page_settings: true,
            number_captions: true,
            char_width_pt: 10.5,
        }
    }
}

impl ReconstructOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable violation highlighting.
    pub fn with_highlight(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }

    /// Enable or disable table cell formatting.
    pub fn with_table_cells(mut self, format: bool) -> Self {
        self.format_table_cells = format;
        self
    }

    /// Enable or disable page settings.
    pub fn with_page_settings(mut self, apply: bool) -> Self {
        self.apply_page_settings = apply;
        self
    }

    /// Enable or disable caption numbering.
    pub fn with_caption_numbers(mut self, number: bool) -> Self {
        self.number_captions = number;
        self
    }
}

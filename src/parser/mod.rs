//! DOCX parsing module.
//!
//! Reads `word/document.xml` with its styles, theme and relationships and
//! produces a [`Document`](crate::model::Document) of paragraph records with
//! fully resolved formatting.

mod docx_parser;
mod options;
pub mod section;
pub mod split;
pub mod styles;
pub mod theme;
pub mod wml;

pub use docx_parser::{
    DocxParser, DEFAULT_COLOR, DEFAULT_EN_FAMILY, DEFAULT_FONT_SIZE, DEFAULT_TITLE_ZH_FAMILY,
    DEFAULT_ZH_FAMILY,
};
pub use options::{ErrorMode, ParseOptions};
pub use split::{label_split_offset, split_label_paragraphs, SECTION_LABEL};
pub use styles::{FontRef, ParaProps, RunProps, StyleSheet};
pub use theme::ThemeFonts;

//! Requirement comparison.
//!
//! Attribute trees of classified records are compared against the requirement
//! subtree for their role. Mismatches become [`Violation`](crate::model::Violation)s;
//! nothing here mutates the document.

mod comparator;
mod derive;
mod options;
pub mod page;
pub mod structure;
pub mod units;

pub use comparator::{
    compare_document, compare_record, compare_tree, values_match, FieldKind, EXCERPT_CHARS,
};
pub use derive::derive_requirements;
pub use options::CompareOptions;
pub use page::compare_page;
pub use structure::{check_structure, keyword_count};

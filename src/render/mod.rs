//! Rendering of check reports to JSON and plain text.

mod json;
mod result;
mod text;

pub use json::{to_json, violations_to_json, JsonFormat};
pub use result::{CheckReport, CheckStats, RecordSummary};
pub use text::to_text;

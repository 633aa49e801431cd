//! Document model types.
//!
//! The extractor produces a [`Document`] of [`ParagraphRecord`]s in physical
//! order. The classifier mutates record roles; the comparator and the
//! reconstructor only read them.

mod attributes;
mod document;
mod page;
mod record;
mod requirement;
mod resource;
mod role;
mod table;
mod violation;

pub use attributes::{
    Alignment, FontAttributes, Length, LineSpacing, Measure, ParagraphFormat, ValueSet,
    EMU_PER_POINT, POINTS_PER_CM, TWIPS_PER_POINT,
};
pub(crate) use attributes::round_to;
pub use document::{Document, Metadata};
pub use page::{Margins, Orientation, PageSettings, PaperSize, PAPER_SIZES};
pub use record::{ElementContent, ParagraphRecord};
pub use requirement::{is_unconstrained, RequirementSpec, PAPER_KEY};
pub use resource::ImageData;
pub use role::ParagraphRole;
pub use table::TableData;
pub use violation::{Violation, ViolationKind};

//! Document reconstruction.
//!
//! Two modes write the required formatting back into a DOCX:
//!
//! - **In place**: the original `word/document.xml` is edited paragraph by
//!   paragraph, everything else in the package is copied untouched.
//! - **Recreate**: a new package is assembled from the extracted records,
//!   with figures and tables renumbered and captions placed consistently.

mod in_place;
mod options;
pub mod page;
mod recreate;
pub mod runs;
pub mod style;

pub use options::ReconstructOptions;
pub use page::PageTarget;
pub use style::{role_styles, RoleStyle, Script};

use crate::error::Result;
use crate::model::{Document, ParagraphRole, RequirementSpec, Violation};
use crate::package::Package;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counters reported after a reconstruction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructSummary {
    /// Body blocks (paragraphs and tables) in the output
    pub blocks: usize,
    /// Paragraphs that received role formatting
    pub formatted: usize,
    /// Tables, images, captions and equations left as they are
    pub special: usize,
    /// Paragraphs with no matching record or no required style
    pub skipped: usize,
    /// Paragraphs kept unchanged after a formatting error
    pub failed: usize,
    /// Paragraphs highlighted for violations
    pub highlighted: usize,
    /// Sections whose page settings were written
    pub sections: usize,
}

/// Applies a requirement specification to documents.
#[derive(Debug, Clone)]
pub struct Reconstructor {
    styles: BTreeMap<ParagraphRole, RoleStyle>,
    page: Option<PageTarget>,
    options: ReconstructOptions,
}

impl Reconstructor {
    /// Prepare the per-role styles of `spec`.
    pub fn new(spec: &RequirementSpec, options: ReconstructOptions) -> Self {
        let styles = role_styles(spec, options.char_width_pt);
        let page = spec
            .paper()
            .map(|paper| PageTarget::from_requirement(paper, options.char_width_pt))
            .filter(|target| !target.is_empty());
        Self {
            styles,
            page,
            options,
        }
    }

    pub fn options(&self) -> &ReconstructOptions {
        &self.options
    }

    /// Required style of a role, if the specification constrains it.
    pub fn style(&self, role: ParagraphRole) -> Option<&RoleStyle> {
        self.styles.get(&role)
    }

    /// Required page settings, if any.
    pub fn page(&self) -> Option<&PageTarget> {
        self.page.as_ref()
    }

    /// Edit `package` so each paragraph of `document` matches its role's style.
    ///
    /// `document` must have been extracted from `package`. Violations are
    /// used for highlighting only.
    pub fn in_place(
        &self,
        package: &mut Package,
        document: &Document,
        violations: &[Violation],
    ) -> Result<ReconstructSummary> {
        in_place::reconstruct(
            package,
            document,
            &self.styles,
            self.page.as_ref(),
            violations,
            &self.options,
        )
    }

    /// Build a new package from `document`.
    pub fn recreate(
        &self,
        document: &Document,
        violations: &[Violation],
    ) -> Result<(Package, ReconstructSummary)> {
        recreate::recreate(
            document,
            &self.styles,
            self.page.as_ref(),
            violations,
            &self.options,
        )
    }
}

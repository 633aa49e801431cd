//! # thesisfmt
//!
//! Thesis formatting checker and fixer for DOCX documents.
//!
//! The pipeline extracts every paragraph with its resolved formatting,
//! assigns each one a structural role (title, abstract, heading, body, ...),
//! compares the formatting against a JSON requirement specification keyed by
//! role, and writes a corrected document.
//!
//! ## Quick Start
//!
//! ```no_run
//! use thesisfmt::{RequirementSpec, Thesisfmt};
//!
//! fn main() -> thesisfmt::Result<()> {
//!     let spec = RequirementSpec::from_path("requirements.json")?;
//!     let thesis = Thesisfmt::new().open("thesis.docx")?;
//!
//!     let report = thesis.check(&spec);
//!     for violation in &report.violations {
//!         println!("{}", violation);
//!     }
//!
//!     thesis.fix_to(&spec, "thesis.fixed.docx")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Style resolution**: run, character style, paragraph style chain,
//!   document defaults and theme fonts
//! - **Role classification**: deterministic rules plus an optional external
//!   oracle queried in bounded parallel windows
//! - **Requirement comparison**: unit-aware (cm, mm, pt, 字符, 字号 names)
//!   with per-paragraph and page-level violations
//! - **Reconstruction**: in-place editing that preserves every untouched
//!   package part, or a freshly recreated document

pub mod citation;
pub mod classify;
pub mod compare;
pub mod detect;
pub mod error;
pub mod model;
pub mod package;
pub mod parser;
pub mod reconstruct;
pub mod render;

// Re-export commonly used types
pub use citation::{check_citations, CitationStyle};
pub use classify::{ClassificationSummary, Classifier, ClassifierConfig, RoleOracle};
pub use compare::{compare_document, derive_requirements, CompareOptions};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_docx, DocxFormat};
pub use error::{Error, Result};
pub use model::{
    Alignment, Document, FontAttributes, Length, LineSpacing, Metadata, PageSettings,
    ParagraphFormat, ParagraphRecord, ParagraphRole, RequirementSpec, Violation, ViolationKind,
};
pub use package::Package;
pub use parser::{DocxParser, ParseOptions};
pub use reconstruct::{ReconstructOptions, ReconstructSummary, Reconstructor};
pub use render::{CheckReport, JsonFormat};

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Parse a DOCX file into paragraph records.
///
/// Roles are not assigned yet; every text record starts as body.
///
/// # Example
///
/// ```no_run
/// use thesisfmt::parse_file;
///
/// let doc = parse_file("thesis.docx").unwrap();
/// println!("Records: {}", doc.len());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    DocxParser::open(path)?.parse()
}

/// Parse a DOCX file with custom options.
pub fn parse_file_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Document> {
    DocxParser::open_with_options(path, options)?.parse()
}

/// Parse a DOCX from bytes.
pub fn parse_bytes(data: &[u8]) -> Result<Document> {
    DocxParser::from_bytes(data)?.parse()
}

/// Parse a DOCX from bytes with custom options.
pub fn parse_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Document> {
    DocxParser::from_bytes_with_options(data, options)?.parse()
}

/// Parse a DOCX from a reader.
pub fn parse_reader<R: Read>(reader: R) -> Result<Document> {
    DocxParser::from_reader(reader)?.parse()
}

/// Parse a DOCX file asynchronously.
///
/// The package is read with `tokio::fs`; parsing itself runs on the calling task.
#[cfg(feature = "async")]
pub async fn parse_file_async<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let data = tokio::fs::read(path).await?;
    let mut document = parse_bytes(&data)?;
    document.metadata.source = path.file_name().map(|n| n.to_string_lossy().into_owned());
    Ok(document)
}

/// Assign roles with the rule pass only.
pub fn classify(document: &mut Document) -> ClassificationSummary {
    Classifier::new(ClassifierConfig::default()).classify(document)
}

/// Parse, classify (rules only) and compare a DOCX file.
///
/// # Example
///
/// ```no_run
/// use thesisfmt::{check_file, RequirementSpec};
///
/// let spec = RequirementSpec::from_path("requirements.json").unwrap();
/// let report = check_file("thesis.docx", &spec).unwrap();
/// println!("{} violations", report.violations.len());
/// ```
pub fn check_file<P: AsRef<Path>>(path: P, spec: &RequirementSpec) -> Result<CheckReport> {
    Ok(Thesisfmt::new().open(path)?.check(spec))
}

/// Correct a DOCX file in place and save it to `output`.
pub fn fix_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    spec: &RequirementSpec,
    output: Q,
) -> Result<ReconstructSummary> {
    Thesisfmt::new().open(input)?.fix_to(spec, output)
}

/// Derive a requirement specification from a correctly formatted reference document.
pub fn derive_file<P: AsRef<Path>>(path: P) -> Result<RequirementSpec> {
    Ok(Thesisfmt::new().open(path)?.derive())
}

/// Builder for the full check-and-fix pipeline.
///
/// # Example
///
/// ```no_run
/// use thesisfmt::{ClassifierConfig, Thesisfmt};
///
/// let thesis = Thesisfmt::new()
///     .lenient()
///     .with_classifier_config(ClassifierConfig::default().with_window_size(4))
///     .with_highlight(true)
///     .open("thesis.docx")?;
/// println!("{} paragraphs classified", thesis.classification().paragraphs);
/// # Ok::<(), thesisfmt::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct Thesisfmt {
    parse_options: ParseOptions,
    classifier_config: ClassifierConfig,
    oracle: Option<Arc<dyn RoleOracle>>,
    compare_options: CompareOptions,
    reconstruct_options: ReconstructOptions,
}

impl Thesisfmt {
    /// Create a builder with default options and no oracle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recover from damaged style and theme parts.
    pub fn lenient(mut self) -> Self {
        self.parse_options = self.parse_options.lenient();
        self
    }

    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    pub fn with_classifier_config(mut self, config: ClassifierConfig) -> Self {
        self.classifier_config = config;
        self
    }

    /// Consult an external oracle for paragraphs the rules cannot settle.
    pub fn with_oracle(mut self, oracle: Arc<dyn RoleOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn with_compare_options(mut self, options: CompareOptions) -> Self {
        self.compare_options = options;
        self
    }

    pub fn with_reconstruct_options(mut self, options: ReconstructOptions) -> Self {
        self.reconstruct_options = options;
        self
    }

    /// Color runs of violating paragraphs red when fixing.
    pub fn with_highlight(mut self, highlight: bool) -> Self {
        self.reconstruct_options = self.reconstruct_options.with_highlight(highlight);
        self
    }

    fn classifier(&self) -> Result<Classifier> {
        match &self.oracle {
            Some(oracle) => Classifier::with_oracle(self.classifier_config.clone(), oracle.clone()),
            None => Ok(Classifier::new(self.classifier_config.clone())),
        }
    }

    /// Parse and classify a DOCX file.
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<ParsedThesis> {
        let parser = DocxParser::open_with_options(path, self.parse_options.clone())?;
        self.finish(parser)
    }

    /// Parse and classify a DOCX from bytes.
    pub fn open_bytes(&self, data: &[u8]) -> Result<ParsedThesis> {
        let parser = DocxParser::from_bytes_with_options(data, self.parse_options.clone())?;
        self.finish(parser)
    }

    fn finish(&self, parser: DocxParser) -> Result<ParsedThesis> {
        let mut document = parser.parse()?;
        let classification = self.classifier()?.classify(&mut document);
        Ok(ParsedThesis {
            document,
            package: parser.into_package(),
            classification,
            compare_options: self.compare_options.clone(),
            reconstruct_options: self.reconstruct_options.clone(),
        })
    }
}

impl std::fmt::Debug for Thesisfmt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Thesisfmt")
            .field("parse_options", &self.parse_options)
            .field("classifier_config", &self.classifier_config)
            .field("has_oracle", &self.oracle.is_some())
            .field("compare_options", &self.compare_options)
            .field("reconstruct_options", &self.reconstruct_options)
            .finish()
    }
}

/// A parsed and classified document together with its source package.
#[derive(Debug, Clone)]
pub struct ParsedThesis {
    document: Document,
    package: Package,
    classification: ClassificationSummary,
    compare_options: CompareOptions,
    reconstruct_options: ReconstructOptions,
}

impl ParsedThesis {
    /// The classified document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The source package, unmodified.
    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn classification(&self) -> &ClassificationSummary {
        &self.classification
    }

    /// Violations of `spec`, in document order.
    pub fn violations(&self, spec: &RequirementSpec) -> Vec<Violation> {
        compare_document(&self.document, spec, &self.compare_options)
    }

    /// Full check report.
    pub fn check(&self, spec: &RequirementSpec) -> CheckReport {
        CheckReport::new(&self.document, self.violations(spec))
            .with_classification(self.classification.clone())
    }

    fn highlight_violations(&self, spec: &RequirementSpec) -> Vec<Violation> {
        if self.reconstruct_options.highlight {
            self.violations(spec)
        } else {
            Vec::new()
        }
    }

    /// Apply `spec` to a copy of the source package.
    pub fn fix(&self, spec: &RequirementSpec) -> Result<(Package, ReconstructSummary)> {
        let reconstructor = Reconstructor::new(spec, self.reconstruct_options.clone());
        let mut package = self.package.clone();
        let summary =
            reconstructor.in_place(&mut package, &self.document, &self.highlight_violations(spec))?;
        Ok((package, summary))
    }

    /// Apply `spec` and save the corrected document.
    pub fn fix_to<P: AsRef<Path>>(&self, spec: &RequirementSpec, path: P) -> Result<ReconstructSummary> {
        let (package, summary) = self.fix(spec)?;
        package.save(path)?;
        Ok(summary)
    }

    /// Build a new document from the records with `spec` applied.
    pub fn recreate(&self, spec: &RequirementSpec) -> Result<(Package, ReconstructSummary)> {
        Reconstructor::new(spec, self.reconstruct_options.clone())
            .recreate(&self.document, &self.highlight_violations(spec))
    }

    /// Requirement specification matching this document's own formatting.
    pub fn derive(&self) -> RequirementSpec {
        derive_requirements(&self.document)
    }

    /// Check the reference list against a citation style.
    pub fn cite(&self, style: CitationStyle) -> Vec<Violation> {
        check_citations(&self.document, style)
    }

    /// Consume and return the classified document.
    pub fn into_document(self) -> Document {
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Builder Tests ====================

    #[test]
    fn test_builder_default() {
        let builder = Thesisfmt::default();
        assert!(builder.oracle.is_none());
        assert!(!builder.reconstruct_options.highlight);
    }

    #[test]
    fn test_builder_chained() {
        let builder = Thesisfmt::new()
            .lenient()
            .with_highlight(true)
            .with_compare_options(CompareOptions::default().with_structural_checks(false));

        assert!(matches!(
            builder.parse_options.error_mode,
            parser::ErrorMode::Lenient
        ));
        assert!(builder.reconstruct_options.highlight);
        assert!(!builder.compare_options.structural_checks);
        assert!(format!("{:?}", builder).contains("has_oracle: false"));
    }

    // ==================== Edge Case Tests ====================

    #[test]
    fn test_parse_bytes_empty_data() {
        let data: [u8; 0] = [];
        assert!(parse_bytes(&data).is_err());
    }

    #[test]
    fn test_parse_bytes_not_zip() {
        let result = parse_bytes(b"<w:document/>");
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_detect_format_empty_data() {
        let result = detect_format_from_bytes(&[]);
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_open_invalid_bytes() {
        let result = Thesisfmt::new().open_bytes(b"not a docx");
        assert!(result.is_err());
    }
}

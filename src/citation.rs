//! Reference list validation.
//!
//! Entries are the text records after a references heading (or records
//! classified as reference content). Each entry is matched against the
//! patterns of one citation style; entries that do not fit are reported as
//! violations pointing at the record.

use crate::error::{Error, Result};
use crate::model::{Document, ParagraphRecord, ParagraphRole, Violation, ViolationKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;

/// Supported reference list styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationStyle {
    /// GB/T 7714 numbered references
    #[serde(rename = "gbt7714")]
    GbT7714,
    Apa,
    Mla,
}

impl CitationStyle {
    pub fn name(self) -> &'static str {
        match self {
            CitationStyle::GbT7714 => "GB/T 7714",
            CitationStyle::Apa => "APA",
            CitationStyle::Mla => "MLA",
        }
    }
}

impl fmt::Display for CitationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CitationStyle {
    type Err = Error;

    /// Accepts names such as `gbt7714`, `GB/T 7714-2015`, `apa`, `MLA`.
    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_lowercase();
        if lowered.contains("gb") {
            Ok(CitationStyle::GbT7714)
        } else if lowered.contains("apa") {
            Ok(CitationStyle::Apa)
        } else if lowered.contains("mla") {
            Ok(CitationStyle::Mla)
        } else {
            Err(Error::UnsupportedCitationStyle(s.to_string()))
        }
    }
}

/// GB/T 7714 document type, identified by its bracketed marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceType {
    Journal,
    Monograph,
    Thesis,
    Conference,
    Electronic,
    Report,
    Standard,
    Patent,
    Newspaper,
}

impl ReferenceType {
    /// Markers checked in this order; `[J/OL]` and `[C/OL]` share a type with `[J]` and `[C]`.
    const MARKERS: &'static [(&'static str, ReferenceType)] = &[
        ("[J]", ReferenceType::Journal),
        ("[J/OL]", ReferenceType::Journal),
        ("[M]", ReferenceType::Monograph),
        ("[D]", ReferenceType::Thesis),
        ("[C]", ReferenceType::Conference),
        ("[C/OL]", ReferenceType::Conference),
        ("[EB/OL]", ReferenceType::Electronic),
        ("[R]", ReferenceType::Report),
        ("[S]", ReferenceType::Standard),
        ("[P]", ReferenceType::Patent),
        ("[N]", ReferenceType::Newspaper),
    ];

    /// Type of an entry from its marker.
    pub fn detect(entry: &str) -> Option<Self> {
        Self::MARKERS
            .iter()
            .find(|(marker, _)| entry.contains(marker))
            .map(|&(_, kind)| kind)
    }

    pub fn description(self) -> &'static str {
        match self {
            ReferenceType::Journal => "journal article",
            ReferenceType::Monograph => "monograph",
            ReferenceType::Thesis => "thesis",
            ReferenceType::Conference => "conference paper",
            ReferenceType::Electronic => "electronic resource",
            ReferenceType::Report => "report",
            ReferenceType::Standard => "standard",
            ReferenceType::Patent => "patent",
            ReferenceType::Newspaper => "newspaper article",
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            ReferenceType::Journal => &JOURNAL,
            ReferenceType::Monograph => &MONOGRAPH,
            ReferenceType::Thesis => &THESIS,
            ReferenceType::Conference => &CONFERENCE,
            ReferenceType::Electronic => &ELECTRONIC,
            ReferenceType::Report => &REPORT,
            ReferenceType::Standard => &STANDARD,
            ReferenceType::Patent => &PATENT,
            ReferenceType::Newspaper => &NEWSPAPER,
        }
    }
}

fn gbt(body: &str) -> Regex {
    Regex::new(&format!(r"^\[\d+\]\s+[\w\s,]+\.\s+{}", body)).expect("valid reference regex")
}

/// Longest text still read as a references heading.
const MAX_HEADING_CHARS: usize = 20;

static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[\d+\]").expect("valid numbering regex"));

// [n] Author. Title[J]. Journal, 2020, 43(5): 1-10.
static JOURNAL: Lazy<Regex> = Lazy::new(|| {
    gbt(r".+\[J(/OL)?\]\.\s+.+,\s+\d{4}(,\s+\d+(\(\d+\))?)?(:\s*\d+(-\d+)?)?\.?$")
});
// [n] Author. Title[M]. Place: Publisher, 2018: 1-10.
static MONOGRAPH: Lazy<Regex> =
    Lazy::new(|| gbt(r".+\[M\]\.\s+.*(:\s+.+,\s+\d{4}(:\s*\d+(-\d+)?)?)?\.?$"));
// [n] Author. Title[D]. Place: University, 2021.
static THESIS: Lazy<Regex> = Lazy::new(|| gbt(r".+\[D\]\.\s+.*(:\s+.+,\s+\d{4})?\.?$"));
static CONFERENCE: Lazy<Regex> = Lazy::new(|| {
    gbt(r".+\[C(/OL)?\]\.\s+.+(,\s+.+,\s+\d{4})?\.(\s+.+:\s+.+,\s+\d{4}(:\s*\d+(-\d+)?)?)?\.?$")
});
static ELECTRONIC: Lazy<Regex> = Lazy::new(|| {
    gbt(r".+\[EB/OL\]\.(\s+.+:\s+.+,\s+\d{4})?\s*(\[\d{4}-\d{2}-\d{2}\])?\.(\s+https?://.*)?$")
});
static REPORT: Lazy<Regex> = Lazy::new(|| gbt(r".+\[R\]\.\s+.*\d{4}.*$"));
// Standards are often issued by a committee, so the author part is free-form.
static STANDARD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[\d+\]\s+.+\[S\]\.\s+.*\d{4}.*$").expect("valid reference regex"));
static PATENT: Lazy<Regex> = Lazy::new(|| gbt(r".+\[P\]\.\s+.*\d{4}.*$"));
static NEWSPAPER: Lazy<Regex> = Lazy::new(|| gbt(r".+\[N\]\.\s+.+,\s*\d{4}.*$"));

static APA_AUTHOR_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w\s,.&'-]+\s+\(\d{4}[a-z]?\)").expect("valid APA regex"));
static MLA_AUTHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w\s,]+\.").expect("valid MLA regex"));

/// Problems of a single entry under `style`. Empty when the entry conforms.
///
/// Full-width brackets and punctuation are folded (NFKC) before matching.
pub fn check_entry(entry: &str, style: CitationStyle) -> Vec<String> {
    let normalized: String = entry.trim().nfkc().collect();
    let entry = normalized.as_str();
    match style {
        CitationStyle::GbT7714 => check_gbt_entry(entry),
        CitationStyle::Apa if !APA_AUTHOR_YEAR.is_match(entry) => {
            vec!["author and year do not follow APA 'Author (Year)'".to_string()]
        }
        CitationStyle::Mla if !MLA_AUTHOR.is_match(entry) => {
            vec!["author does not follow MLA 'Author.'".to_string()]
        }
        _ => Vec::new(),
    }
}

fn check_gbt_entry(entry: &str) -> Vec<String> {
    if !NUMBERED.is_match(entry) {
        return vec!["entry should start with a [n] number".to_string()];
    }

    let mut problems = Vec::new();
    if !entry.contains(". ") {
        problems.push("missing '. ' separator between author and title".to_string());
    }
    match ReferenceType::detect(entry) {
        Some(kind) if !kind.pattern().is_match(entry) => problems.push(format!(
            "{} does not follow GB/T 7714",
            kind.description()
        )),
        Some(_) => {}
        None => problems.push("unknown document type marker".to_string()),
    }
    problems
}

/// Records that make up the reference list, with their record indices.
pub fn reference_entries(document: &Document) -> Vec<(usize, &ParagraphRecord)> {
    let mut entries = Vec::new();
    let mut in_references = false;

    for (index, record) in document.records.iter().enumerate() {
        if !record.is_text() {
            continue;
        }
        let text = record.text.trim();
        if record.role == ParagraphRole::References || is_references_heading(text) {
            in_references = true;
            continue;
        }
        let heading_ends_list = in_references
            && (matches!(
                record.role,
                ParagraphRole::Heading1 | ParagraphRole::Acknowledgments
            ) || is_acknowledgments_heading(text));
        if heading_ends_list {
            in_references = false;
        }
        if text.is_empty() {
            continue;
        }
        if in_references || record.role == ParagraphRole::ReferencesContent {
            entries.push((index, record));
        }
    }
    entries
}

fn is_references_heading(text: &str) -> bool {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact.chars().count() <= MAX_HEADING_CHARS
        && (compact.starts_with("参考文献") || compact.to_lowercase().starts_with("references"))
}

fn is_acknowledgments_heading(text: &str) -> bool {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact.starts_with("致谢") || compact.to_lowercase().starts_with("acknowledg")
}

/// Check every reference entry of `document` against `style`.
pub fn check_citations(document: &Document, style: CitationStyle) -> Vec<Violation> {
    let entries = reference_entries(document);
    if entries.is_empty() {
        return vec![Violation::new(
            ViolationKind::Structure,
            "no reference entries found",
            "document.references",
            json!(style.name()),
            json!(null),
        )];
    }

    let mut violations = Vec::new();
    for (number, (index, record)) in entries.iter().enumerate() {
        for problem in check_entry(&record.text, style) {
            violations.push(
                Violation::new(
                    ViolationKind::Citation,
                    format!("reference #{}: {}", number + 1, problem),
                    format!("references[{}]", number + 1),
                    json!(style.name()),
                    json!(record.text.trim()),
                )
                .with_paragraph(*index, record.excerpt(crate::compare::EXCERPT_CHARS)),
            );
        }
    }
    log::info!(
        "checked {} reference entries against {}: {} problems",
        entries.len(),
        style,
        violations.len()
    );
    violations
}

//! Plain text rendering for check reports.

use super::CheckReport;
use crate::model::Violation;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Convert a report to a human-readable text report.
///
/// Violations are grouped by scope (role label, `paper`, `document`) and
/// listed in document order inside each group.
pub fn to_text(report: &CheckReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Format check report");
    if let Some(source) = &report.source {
        let _ = writeln!(out, "Document: {}", source);
    }
    let _ = writeln!(
        out,
        "Generated: {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(
        out,
        "Paragraphs: {}, images: {}, tables: {}",
        report.stats.paragraph_count, report.stats.image_count, report.stats.table_count
    );

    if report.is_clean() {
        let _ = writeln!(out, "\nNo violations found.");
        return out;
    }

    let _ = writeln!(
        out,
        "Violations: {} in {} paragraphs",
        report.stats.violation_count, report.stats.flagged_paragraphs
    );

    let mut groups: BTreeMap<&str, Vec<&Violation>> = BTreeMap::new();
    for violation in &report.violations {
        groups.entry(scope(&violation.location)).or_default().push(violation);
    }
    for (scope, violations) in groups {
        let _ = writeln!(out, "\n[{}] {}", scope, violations.len());
        for violation in violations {
            let _ = write!(out, "  - {}", violation.message);
            if let Some(excerpt) = &violation.excerpt {
                let _ = write!(out, " @ \"{}\"", excerpt);
            }
            let _ = writeln!(out);
        }
    }
    out
}

fn scope(location: &str) -> &str {
    let head = location.split('.').next().unwrap_or(location);
    head.split('[').next().unwrap_or(head)
}

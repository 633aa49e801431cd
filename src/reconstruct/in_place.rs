//! In-place reconstruction: the original package is edited paragraph by paragraph.

use super::page::{apply_to_sections, PageTarget};
use super::runs::format_runs;
use super::style::RoleStyle;
use super::{ReconstructOptions, ReconstructSummary};
use crate::classify::rules::CAPTION;
use crate::error::{Error, Result};
use crate::model::{Document, ParagraphRecord, ParagraphRole, Violation};
use crate::package::{Package, XmlElement, DOCUMENT_PART};
use crate::parser::split_label_paragraphs;
use crate::parser::wml::{
    block_at, block_at_mut, block_paths, has_graphic, paragraph_text, W_BODY, W_P, W_PPR, W_TBL,
};
use std::collections::{BTreeMap, HashSet};

/// What a body block is, as far as formatting is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    Table,
    Image,
    Empty,
    Text(String),
}

impl Block {
    fn of(element: &XmlElement) -> Self {
        if element.is(W_TBL) {
            return Block::Table;
        }
        if has_graphic(element) {
            return Block::Image;
        }
        let text = paragraph_text(element);
        if text.trim().is_empty() {
            Block::Empty
        } else {
            Block::Text(text)
        }
    }

    fn is_graphic_or_table(&self) -> bool {
        matches!(self, Block::Table | Block::Image)
    }
}

/// Rewrite `word/document.xml` of `package` so each paragraph carries the
/// formatting required for its role.
///
/// Records are matched to physical blocks by their `source_index`. Tables,
/// images, captions and equations keep their formatting. A paragraph whose
/// rewrite fails keeps its original content.
pub(super) fn reconstruct(
    package: &mut Package,
    document: &Document,
    styles: &BTreeMap<ParagraphRole, RoleStyle>,
    page: Option<&PageTarget>,
    violations: &[Violation],
    options: &ReconstructOptions,
) -> Result<ReconstructSummary> {
    let mut main = package
        .xml_part(DOCUMENT_PART)?
        .ok_or_else(|| Error::MissingPart(DOCUMENT_PART.to_string()))?;
    let body = main
        .root
        .child_mut(W_BODY)
        .ok_or_else(|| Error::Corrupted("main document part has no body".to_string()))?;

    // Extraction split embedded labels; the tree must be split the same way.
    if document.metadata.split_count > 0 {
        split_label_paragraphs(body);
    }

    let paths = block_paths(body);
    if document.metadata.block_count > 0 && paths.len() != document.metadata.block_count {
        log::warn!(
            "document has {} blocks but {} were extracted; formatting may be misaligned",
            paths.len(),
            document.metadata.block_count
        );
    }

    let records: BTreeMap<usize, &ParagraphRecord> = document
        .records
        .iter()
        .map(|r| (r.source_index, r))
        .collect();
    let flagged: HashSet<usize> = violations
        .iter()
        .filter_map(|v| v.paragraph)
        .filter_map(|i| document.records.get(i))
        .map(|r| r.source_index)
        .collect();
    let blocks: Vec<Block> = paths
        .iter()
        .map(|path| block_at(body, path).map(Block::of).unwrap_or(Block::Empty))
        .collect();

    let mut summary = ReconstructSummary {
        blocks: paths.len(),
        ..Default::default()
    };

    for (index, path) in paths.iter().enumerate() {
        let text = match &blocks[index] {
            Block::Table => {
                summary.special += 1;
                if options.format_table_cells {
                    if let (Some(style), Some(table)) =
                        (styles.get(&ParagraphRole::Body), block_at_mut(body, path))
                    {
                        format_cells(table, style, &mut summary);
                    }
                }
                continue;
            }
            Block::Image => {
                summary.special += 1;
                continue;
            }
            Block::Empty => continue,
            Block::Text(text) => text,
        };

        let record = records.get(&index).copied();
        if is_caption(&blocks, index) || is_equation(text, record) {
            summary.special += 1;
            continue;
        }
        let Some(record) = record else {
            summary.skipped += 1;
            continue;
        };
        let Some(style) = styles.get(&record.role) else {
            summary.skipped += 1;
            continue;
        };
        let Some(paragraph) = block_at_mut(body, path) else {
            continue;
        };

        let highlight = options.highlight && flagged.contains(&index);
        match format_isolated(paragraph, style, highlight) {
            Ok(()) => {
                summary.formatted += 1;
                if highlight {
                    summary.highlighted += 1;
                }
            }
            Err(e) => {
                log::warn!("paragraph {} kept unchanged: {}", index, e);
                summary.failed += 1;
            }
        }
    }

    if options.apply_page_settings {
        if let Some(target) = page.filter(|t| !t.is_empty()) {
            summary.sections = apply_to_sections(body, target);
        }
    }

    package.set_xml_part(DOCUMENT_PART, &main)?;
    log::info!(
        "reconstructed {} paragraphs ({} special, {} skipped, {} failed)",
        summary.formatted,
        summary.special,
        summary.skipped,
        summary.failed
    );
    Ok(summary)
}

/// Format a paragraph, leaving it untouched if anything fails.
pub(super) fn format_isolated(
    paragraph: &mut XmlElement,
    style: &RoleStyle,
    highlight: bool,
) -> Result<()> {
    let mut candidate = paragraph.clone();
    format_paragraph(&mut candidate, style, highlight)?;
    *paragraph = candidate;
    Ok(())
}

/// Apply paragraph properties and run fonts.
fn format_paragraph(
    paragraph: &mut XmlElement,
    style: &RoleStyle,
    highlight: bool,
) -> Result<()> {
    if style.has_paragraph_format() {
        style.apply_paragraph(paragraph.ensure_first_child(W_PPR));
    }
    if style.has_fonts() || highlight {
        format_runs(paragraph, style, highlight)?;
    }
    Ok(())
}

/// A caption pattern next to a table or image, skipping at most one empty paragraph.
fn is_caption<'a>(blocks: &'a [Block], index: usize) -> bool {
    let Block::Text(text) = &blocks[index] else {
        return false;
    };
    if !CAPTION.is_match(text.trim()) {
        return false;
    }

    let before = |steps: usize| index.checked_sub(steps).and_then(|i| blocks.get(i));
    let after = |steps: usize| blocks.get(index + steps);
    let neighbours: [&dyn Fn(usize) -> Option<&'a Block>; 2] = [&before, &after];
    neighbours.iter().any(|neighbour| match neighbour(1) {
        Some(Block::Empty) => neighbour(2).is_some_and(Block::is_graphic_or_table),
        Some(block) => block.is_graphic_or_table(),
        None => false,
    })
}

fn is_equation(text: &str, record: Option<&ParagraphRecord>) -> bool {
    let trimmed = text.trim_start();
    trimmed.starts_with("式")
        || trimmed.starts_with("公式")
        || record.is_some_and(|r| r.role == ParagraphRole::Equation)
}

fn format_cells(table: &mut XmlElement, style: &RoleStyle, summary: &mut ReconstructSummary) {
    for child in table.elements_mut() {
        if child.is(W_P) {
            match format_isolated(child, style, false) {
                Ok(()) => summary.formatted += 1,
                Err(e) => {
                    log::warn!("table cell paragraph kept unchanged: {}", e);
                    summary.failed += 1;
                }
            }
        } else {
            format_cells(child, style, summary);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Block {
        Block::Text(s.to_string())
    }

    #[test]
    fn test_caption_adjacency() {
        let blocks = vec![
            text("图1 系统结构"),
            Block::Image,
            Block::Empty,
            text("表1 实验结果"),
            Block::Table,
            text("正文"),
            text("表2 不在表格旁边"),
        ];
        assert!(is_caption(&blocks, 0));
        assert!(is_caption(&blocks, 3));
        assert!(!is_caption(&blocks, 5));
        assert!(!is_caption(&blocks, 6));
    }

    #[test]
    fn test_caption_skips_one_empty_paragraph_only() {
        let blocks = vec![Block::Image, Block::Empty, text("图1 结构")];
        assert!(is_caption(&blocks, 2));
        let blocks = vec![Block::Image, Block::Empty, Block::Empty, text("图1 结构")];
        assert!(!is_caption(&blocks, 3));
    }

    #[test]
    fn test_equation_detection() {
        assert!(is_equation("式中，x 表示输入", None));
        assert!(is_equation("公式(1)", None));
        let record = ParagraphRecord::text("E = mc^2 (1)", 0).with_role(ParagraphRole::Equation);
        assert!(is_equation(&record.text, Some(&record)));
        assert!(!is_equation("正文", None));
    }
}

//! Splitting of paragraphs that carry an inline section label.
//!
//! A paragraph such as `摘要：本文研究……` holds both the abstract heading and
//! the start of its content. It is split in the XML tree right after the
//! label and its colon, so every later stage sees two physical paragraphs.

use super::wml::{
    block_at_mut, block_paths, paragraph_text, run_text, text_element, W_P, W_PPR, W_R, W_RPR,
    W_SECT_PR,
};
use crate::package::{XmlElement, XmlNode};
use once_cell::sync::Lazy;
use regex::Regex;

/// Section label followed by a colon.
pub static SECTION_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(摘要|Abstract|关键词|Keywords)\b\s*[:：]").expect("valid section label regex")
});

/// Passes over the body before giving up on further splits.
const MAX_PASSES: usize = 16;

/// Character offset right after an embedded section label, when content follows it.
pub fn label_split_offset(text: &str) -> Option<usize> {
    let found = SECTION_LABEL.find(text)?;
    if text[found.end()..].trim().is_empty() {
        return None;
    }
    Some(text[..found.end()].chars().count())
}

/// Split every body paragraph that embeds a section label. Returns the number of splits.
pub fn split_label_paragraphs(body: &mut XmlElement) -> usize {
    let mut total = 0;

    for _ in 0..MAX_PASSES {
        let mut splits = 0;
        // Back to front, so inserting a sibling never shifts a path still to visit.
        for path in block_paths(body).iter().rev() {
            let Some(paragraph) = block_at_mut(body, path) else {
                continue;
            };
            if !paragraph.is(W_P) {
                continue;
            }
            let Some(offset) = label_split_offset(&paragraph_text(paragraph)) else {
                continue;
            };
            let Some(tail) = split_paragraph(paragraph, offset) else {
                continue;
            };

            let (parent_path, last) = path.split_at(path.len() - 1);
            if let Some(parent) = block_at_mut(body, parent_path) {
                parent.children.insert(last[0] + 1, XmlNode::Element(tail));
                splits += 1;
            }
        }

        total += splits;
        if splits == 0 {
            break;
        }
    }

    if total > 0 {
        log::debug!("split {} paragraphs at section labels", total);
    }
    total
}

/// Split a paragraph at a character offset, returning the new trailing paragraph.
///
/// A run straddling the offset is cut in two; both halves keep its run
/// properties. Other inline containers move as a whole.
pub fn split_paragraph(paragraph: &mut XmlElement, offset: usize) -> Option<XmlElement> {
    let mut position = 0;
    let mut split_at = None;

    let mut index = 0;
    while index < paragraph.children.len() {
        let length = match &paragraph.children[index] {
            XmlNode::Element(e) if e.is(W_PPR) => {
                index += 1;
                continue;
            }
            XmlNode::Element(e) if e.is(W_R) => run_text(e).chars().count(),
            XmlNode::Element(e) => paragraph_text(e).chars().count(),
            _ => 0,
        };

        if position >= offset {
            split_at = Some(index);
            break;
        }

        if position + length > offset {
            if let XmlNode::Element(run) = &mut paragraph.children[index] {
                if run.is(W_R) {
                    let tail = cut_run(run, offset - position);
                    paragraph.children.insert(index + 1, XmlNode::Element(tail));
                    split_at = Some(index + 1);
                    break;
                }
            }
        }

        position += length;
        index += 1;
    }

    let split_at = split_at?;
    let moved: Vec<XmlNode> = paragraph.children.drain(split_at..).collect();

    let mut tail = XmlElement::new(W_P);
    if let Some(ppr) = paragraph.child_mut(W_PPR) {
        let tail_ppr = ppr.clone();
        // A section break belongs to the last paragraph of the pair.
        ppr.remove_children(|e| e.is(W_SECT_PR));
        tail.children.push(XmlNode::Element(tail_ppr));
    }
    tail.children.extend(moved);
    Some(tail)
}

/// Truncate a run to `keep` characters and return a run holding the rest.
fn cut_run(run: &mut XmlElement, keep: usize) -> XmlElement {
    let text = run_text(run);
    let head: String = text.chars().take(keep).collect();
    let rest: String = text.chars().skip(keep).collect();
    let rpr = run.child(W_RPR).cloned();

    run.children.retain(|n| matches!(n, XmlNode::Element(e) if e.is(W_RPR)));
    run.children.push(XmlNode::Element(text_element(&head)));

    let mut tail = XmlElement::new(W_R);
    if let Some(rpr) = rpr {
        tail.children.push(XmlNode::Element(rpr));
    }
    tail.with_child(text_element(&rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::XmlDocument;

    fn body(xml: &str) -> XmlElement {
        XmlDocument::parse(xml.as_bytes(), "test").unwrap().root
    }

    #[test]
    fn test_label_offset() {
        assert_eq!(label_split_offset("摘要：这是摘要内容"), Some(3));
        assert_eq!(label_split_offset("Abstract: This paper"), Some(9));
        assert_eq!(label_split_offset("KEYWORDS ： a; b"), Some(10));
        assert_eq!(label_split_offset("摘要："), None);
        assert_eq!(label_split_offset("摘要内容：不是标签"), None);
        assert_eq!(label_split_offset("普通段落"), None);
    }

    #[test]
    fn test_split_inside_run() {
        let mut b = body(
            r#"<w:body><w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>摘要：这是摘要内容，长度足够。</w:t></w:r></w:p></w:body>"#,
        );
        assert_eq!(split_label_paragraphs(&mut b), 1);

        let paragraphs: Vec<_> = b.children_named(W_P).collect();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraph_text(paragraphs[0]), "摘要：");
        assert_eq!(paragraph_text(paragraphs[1]), "这是摘要内容，长度足够。");
        // Both halves keep paragraph and run properties.
        assert!(paragraphs[1].path(&[W_PPR, "w:jc"]).is_some());
        assert!(paragraphs[1].path(&[W_R, W_RPR, "w:b"]).is_some());
    }

    #[test]
    fn test_split_at_run_boundary() {
        let mut b = body(
            r#"<w:body><w:p><w:r><w:t>Keywords:</w:t></w:r><w:r><w:t xml:space="preserve"> thesis; format</w:t></w:r></w:p></w:body>"#,
        );
        assert_eq!(split_label_paragraphs(&mut b), 1);
        let paragraphs: Vec<_> = b.children_named(W_P).collect();
        assert_eq!(paragraph_text(paragraphs[0]), "Keywords:");
        assert_eq!(paragraph_text(paragraphs[1]), " thesis; format");
    }

    #[test]
    fn test_repeated_labels_split_twice() {
        let mut b = body(
            r#"<w:body><w:p><w:r><w:t>Abstract: text here Keywords: a; b</w:t></w:r></w:p></w:body>"#,
        );
        assert_eq!(split_label_paragraphs(&mut b), 2);
        let texts: Vec<String> = b.children_named(W_P).map(paragraph_text).collect();
        assert_eq!(texts, vec!["Abstract:", " text here Keywords:", " a; b"]);
    }

    #[test]
    fn test_section_break_moves_to_tail() {
        let mut b = body(
            r#"<w:body><w:p><w:pPr><w:sectPr/></w:pPr><w:r><w:t>摘要：内容</w:t></w:r></w:p></w:body>"#,
        );
        split_label_paragraphs(&mut b);
        let paragraphs: Vec<_> = b.children_named(W_P).collect();
        assert!(paragraphs[0].path(&[W_PPR, W_SECT_PR]).is_none());
        assert!(paragraphs[1].path(&[W_PPR, W_SECT_PR]).is_some());
    }
}

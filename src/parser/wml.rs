//! WordprocessingML element helpers.
//!
//! Word writes the main namespace with the `w:` prefix, DrawingML with `a:`,
//! `wp:` and `pic:`, and relationships with `r:`. Names are matched on those
//! qualified forms.

use crate::package::{XmlElement, XmlNode};

pub const W_BODY: &str = "w:body";
pub const W_P: &str = "w:p";
pub const W_R: &str = "w:r";
pub const W_T: &str = "w:t";
pub const W_TBL: &str = "w:tbl";
pub const W_TR: &str = "w:tr";
pub const W_TC: &str = "w:tc";
pub const W_PPR: &str = "w:pPr";
pub const W_RPR: &str = "w:rPr";
pub const W_SDT: &str = "w:sdt";
pub const W_SDT_CONTENT: &str = "w:sdtContent";
pub const W_SECT_PR: &str = "w:sectPr";
pub const W_VAL: &str = "w:val";

/// Inline containers whose runs belong to the enclosing paragraph.
pub const RUN_CONTAINERS: &[&str] = &[
    "w:hyperlink",
    "w:ins",
    "w:smartTag",
    "w:fldSimple",
    "w:customXml",
    "w:sdt",
    "w:sdtContent",
];

/// Run children that make a run more than plain text.
const NON_TEXT_RUN_CONTENT: &[&str] = &[
    "w:drawing",
    "w:pict",
    "w:object",
    "w:fldChar",
    "w:instrText",
    "w:footnoteReference",
    "w:endnoteReference",
    "w:commentReference",
    "w:sym",
    "mc:AlternateContent",
];

/// Index path from `w:body` to a block element, through `children` vectors.
pub type BlockPath = Vec<usize>;

/// Paths of every body-level `w:p` and `w:tbl`, in document order.
///
/// Content controls (`w:sdt`) are transparent: their paragraphs and tables
/// count as body blocks.
pub fn block_paths(body: &XmlElement) -> Vec<BlockPath> {
    let mut out = Vec::new();
    collect_blocks(body, &mut Vec::new(), &mut out);
    out
}

fn collect_blocks(parent: &XmlElement, prefix: &mut Vec<usize>, out: &mut Vec<BlockPath>) {
    for (index, node) in parent.children.iter().enumerate() {
        let XmlNode::Element(element) = node else {
            continue;
        };
        prefix.push(index);
        if element.is(W_P) || element.is(W_TBL) {
            out.push(prefix.clone());
        } else if element.is(W_SDT) || element.is(W_SDT_CONTENT) {
            collect_blocks(element, prefix, out);
        }
        prefix.pop();
    }
}

/// Element at a block path.
pub fn block_at<'a>(root: &'a XmlElement, path: &[usize]) -> Option<&'a XmlElement> {
    let mut current = root;
    for &index in path {
        current = match current.children.get(index)? {
            XmlNode::Element(e) => e,
            _ => return None,
        };
    }
    Some(current)
}

/// Mutable element at a block path.
pub fn block_at_mut<'a>(root: &'a mut XmlElement, path: &[usize]) -> Option<&'a mut XmlElement> {
    let mut current = root;
    for &index in path {
        current = match current.children.get_mut(index)? {
            XmlNode::Element(e) => e,
            _ => return None,
        };
    }
    Some(current)
}

/// `w:val` of a named child, e.g. `w:jc`.
pub fn child_val<'a>(parent: &'a XmlElement, name: &str) -> Option<&'a str> {
    parent.child(name).and_then(|c| c.attr(W_VAL))
}

/// Read an on/off property such as `w:b`. Absent `w:val` means on.
pub fn on_off(element: &XmlElement) -> bool {
    !matches!(
        element.attr(W_VAL).map(str::trim),
        Some("0" | "false" | "off" | "none")
    )
}

/// On/off value of a named child, if the child exists.
pub fn child_on_off(parent: &XmlElement, name: &str) -> Option<bool> {
    parent.child(name).map(on_off)
}

/// Parse an integer attribute. Decimal values are rounded.
pub fn attr_i64(element: &XmlElement, key: &str) -> Option<i64> {
    let raw = element.attr(key)?.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().map(|v| v.round() as i64))
}

/// Runs of a paragraph in reading order, including runs inside hyperlinks,
/// insertions, simple fields and content controls.
pub fn paragraph_runs(paragraph: &XmlElement) -> Vec<&XmlElement> {
    let mut runs = Vec::new();
    collect_runs(paragraph, &mut runs);
    runs
}

fn collect_runs<'a>(parent: &'a XmlElement, out: &mut Vec<&'a XmlElement>) {
    for child in parent.elements() {
        if child.is(W_R) {
            out.push(child);
        } else if RUN_CONTAINERS.contains(&child.name.as_str()) {
            collect_runs(child, out);
        }
    }
}

/// Visible text of a run.
pub fn run_text(run: &XmlElement) -> String {
    let mut text = String::new();
    for child in run.elements() {
        match child.name.as_str() {
            W_T => text.push_str(&child.text()),
            "w:tab" | "w:ptab" => text.push('\t'),
            "w:br" | "w:cr" => text.push('\n'),
            "w:noBreakHyphen" => text.push('-'),
            _ => {}
        }
    }
    text
}

/// Visible text of a paragraph.
pub fn paragraph_text(paragraph: &XmlElement) -> String {
    paragraph_runs(paragraph)
        .into_iter()
        .map(run_text)
        .collect()
}

/// Whether the run holds anything besides text, tabs and breaks.
pub fn run_has_non_text_content(run: &XmlElement) -> bool {
    run.elements()
        .any(|c| NON_TEXT_RUN_CONTENT.contains(&c.name.as_str()))
}

/// Whether the paragraph holds a drawing, VML picture or embedded object.
pub fn has_graphic(paragraph: &XmlElement) -> bool {
    paragraph.contains("w:drawing") || paragraph.contains("w:pict") || paragraph.contains("w:object")
}

/// Relationship id of the first embedded image in the element.
pub fn first_blip_embed(element: &XmlElement) -> Option<&str> {
    if let Some(blip) = element.find("a:blip") {
        if let Some(id) = blip.attr("r:embed") {
            return Some(id);
        }
    }
    element.find("v:imagedata").and_then(|d| d.attr("r:id"))
}

/// Paragraph style id (`w:pStyle`).
pub fn paragraph_style_id(paragraph: &XmlElement) -> Option<&str> {
    paragraph
        .path(&[W_PPR, "w:pStyle"])
        .and_then(|s| s.attr(W_VAL))
}

/// Build a `w:t` element, preserving leading and trailing whitespace.
pub fn text_element(text: &str) -> XmlElement {
    let mut t = XmlElement::new(W_T);
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        t.set_attr("xml:space", "preserve");
    }
    t.with_text(text)
}

/// Cell texts of a table, one row per `w:tr`.
pub fn table_cells(table: &XmlElement) -> Vec<Vec<String>> {
    table
        .children_named(W_TR)
        .map(|row| {
            row.children_named(W_TC)
                .map(|cell| {
                    cell.children_named(W_P)
                        .map(paragraph_text)
                        .collect::<Vec<_>>()
                        .join("\n")
                })
                .collect()
        })
        .collect()
}

//! Page settings written into section properties.

use crate::compare::units::value_length;
use crate::model::{is_unconstrained, Length, Orientation, PageSettings, PaperSize};
use crate::package::XmlElement;
use crate::parser::wml::{attr_i64, W_SECT_PR};
use serde_json::Value;

/// Child order of `w:sectPr`.
pub const SECT_PR_ORDER: &[&str] = &[
    "w:headerReference",
    "w:footerReference",
    "w:footnotePr",
    "w:endnotePr",
    "w:type",
    "w:pgSz",
    "w:pgMar",
    "w:paperSrc",
    "w:pgBorders",
    "w:lnNumType",
    "w:pgNumType",
    "w:cols",
    "w:formProt",
    "w:vAlign",
    "w:noEndnote",
    "w:titlePg",
    "w:textDirection",
    "w:bidi",
    "w:rtlGutter",
    "w:docGrid",
    "w:printerSettings",
    "w:sectPrChange",
];

/// Required page settings. `None` fields are left as they are.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PageTarget {
    /// Portrait width and height
    pub size: Option<(Length, Length)>,
    pub orientation: Option<Orientation>,
    pub top: Option<Length>,
    pub bottom: Option<Length>,
    pub left: Option<Length>,
    pub right: Option<Length>,
    pub header: Option<Length>,
    pub footer: Option<Length>,
}

impl PageTarget {
    /// Read the `paper` requirement subtree.
    pub fn from_requirement(paper: &Value, char_width_pt: f32) -> Self {
        let length = |value: Option<&Value>| {
            value
                .filter(|v| !is_unconstrained(v))
                .and_then(|v| value_length(v, char_width_pt))
                .map(Length::from_points)
        };

        let mut size = paper
            .get("size")
            .and_then(Value::as_str)
            .and_then(PaperSize::by_name)
            .map(|p| (p.width(), p.height()));
        if let (Some(width), Some(height)) = (length(paper.get("width")), length(paper.get("height")))
        {
            let (short, long) = if width.0 <= height.0 {
                (width, height)
            } else {
                (height, width)
            };
            size = Some((short, long));
        }

        let margins = paper.get("margins");
        let (header, footer) = match paper.get("header") {
            Some(Value::Object(distances)) => (
                length(distances.get("top")),
                length(distances.get("bottom")),
            ),
            other => (length(other), length(paper.get("footer"))),
        };

        Self {
            size,
            orientation: paper
                .get("orientation")
                .and_then(Value::as_str)
                .and_then(Orientation::parse),
            top: length(margins.and_then(|m| m.get("top"))),
            bottom: length(margins.and_then(|m| m.get("bottom"))),
            left: length(margins.and_then(|m| m.get("left"))),
            right: length(margins.and_then(|m| m.get("right"))),
            header,
            footer,
        }
    }

    /// Settings read back from an extracted document.
    pub fn from_settings(page: &PageSettings) -> Self {
        Self {
            size: Some((
                Length(page.width.0.min(page.height.0)),
                Length(page.width.0.max(page.height.0)),
            )),
            orientation: Some(page.orientation),
            top: Some(page.margins.top),
            bottom: Some(page.margins.bottom),
            left: Some(page.margins.left),
            right: Some(page.margins.right),
            header: page.header,
            footer: page.footer,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == PageTarget::default()
    }

    /// Write the settings into one `w:sectPr`.
    pub fn apply(&self, sect_pr: &mut XmlElement) {
        if self.size.is_some() || self.orientation.is_some() {
            let page_size = sect_pr.ensure_child("w:pgSz", SECT_PR_ORDER);
            let current = PageSettings::default();
            let width = attr_i64(page_size, "w:w").unwrap_or(current.width.twips());
            let height = attr_i64(page_size, "w:h").unwrap_or(current.height.twips());
            let (short, long) = match self.size {
                Some((w, h)) => (w.twips(), h.twips()),
                None => (width.min(height), width.max(height)),
            };
            let landscape = match self.orientation {
                Some(orientation) => orientation == Orientation::Landscape,
                None => width > height,
            };

            if landscape {
                page_size.set_attr("w:w", long.to_string());
                page_size.set_attr("w:h", short.to_string());
                page_size.set_attr("w:orient", "landscape");
            } else {
                page_size.set_attr("w:w", short.to_string());
                page_size.set_attr("w:h", long.to_string());
                page_size.remove_attr("w:orient");
            }
        }

        let margins = [
            ("w:top", self.top),
            ("w:bottom", self.bottom),
            ("w:left", self.left),
            ("w:right", self.right),
            ("w:header", self.header),
            ("w:footer", self.footer),
        ];
        if margins.iter().any(|(_, value)| value.is_some()) {
            let page_margins = sect_pr.ensure_child("w:pgMar", SECT_PR_ORDER);
            for (key, value) in margins {
                if let Some(length) = value {
                    page_margins.set_attr(key, length.twips().to_string());
                }
            }
        }
    }
}

/// Apply the page settings to every section of the body. Returns the section count.
pub fn apply_to_sections(body: &mut XmlElement, target: &PageTarget) -> usize {
    let mut count = 0;
    visit_sections(body, &mut |sect_pr: &mut XmlElement| {
        target.apply(sect_pr);
        count += 1;
    });
    count
}

fn visit_sections(element: &mut XmlElement, visit: &mut dyn FnMut(&mut XmlElement)) {
    for child in element.elements_mut() {
        if child.is(W_SECT_PR) {
            visit(child);
        } else {
            visit_sections(child, visit);
        }
    }
}

//! Page-level settings.

use super::attributes::Length;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// Parse an orientation name (English or Chinese).
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "portrait" | "纵向" | "竖向" => Some(Orientation::Portrait),
            "landscape" | "横向" => Some(Orientation::Landscape),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

/// Page margins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: Length,
    pub bottom: Length,
    pub left: Length,
    pub right: Length,
}

impl Default for Margins {
    /// Word's default: 2.54cm top/bottom, 3.17cm left/right.
    fn default() -> Self {
        Self {
            top: Length::from_twips(1440),
            bottom: Length::from_twips(1440),
            left: Length::from_twips(1800),
            right: Length::from_twips(1800),
        }
    }
}

/// Page size, orientation and margins of the document's final section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSettings {
    pub width: Length,
    pub height: Length,
    pub orientation: Orientation,
    pub margins: Margins,
    /// Header distance from the top edge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Length>,
    /// Footer distance from the bottom edge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<Length>,
}

impl Default for PageSettings {
    /// A4 portrait.
    fn default() -> Self {
        Self {
            width: Length::from_twips(11906),
            height: Length::from_twips(16838),
            orientation: Orientation::Portrait,
            margins: Margins::default(),
            header: None,
            footer: None,
        }
    }
}

/// A named paper size, in portrait orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaperSize {
    pub name: &'static str,
    pub width_mm: f32,
    pub height_mm: f32,
}

/// Known paper sizes.
pub const PAPER_SIZES: &[PaperSize] = &[
    PaperSize { name: "A3", width_mm: 297.0, height_mm: 420.0 },
    PaperSize { name: "A4", width_mm: 210.0, height_mm: 297.0 },
    PaperSize { name: "A5", width_mm: 148.0, height_mm: 210.0 },
    PaperSize { name: "B5", width_mm: 176.0, height_mm: 250.0 },
    PaperSize { name: "Letter", width_mm: 215.9, height_mm: 279.4 },
    PaperSize { name: "Legal", width_mm: 215.9, height_mm: 355.6 },
];

impl PaperSize {
    /// Look up a paper size by name, case-insensitively.
    pub fn by_name(name: &str) -> Option<PaperSize> {
        let name = name.trim();
        PAPER_SIZES
            .iter()
            .copied()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Portrait width.
    pub fn width(&self) -> Length {
        Length::from_mm(self.width_mm)
    }

    /// Portrait height.
    pub fn height(&self) -> Length {
        Length::from_mm(self.height_mm)
    }
}

impl PageSettings {
    /// Name of the paper size matching these dimensions within `tolerance_cm`.
    pub fn paper_name(&self, tolerance_cm: f32) -> Option<&'static str> {
        let (short, long) = if self.width.0 <= self.height.0 {
            (self.width, self.height)
        } else {
            (self.height, self.width)
        };
        PAPER_SIZES
            .iter()
            .find(|p| {
                (p.width().cm() - short.cm()).abs() <= tolerance_cm
                    && (p.height().cm() - long.cm()).abs() <= tolerance_cm
            })
            .map(|p| p.name)
    }

    /// Page settings in requirement-file shape.
    ///
    /// `size` is the matching paper name, or `unknown` for custom sizes.
    pub fn to_tree(&self) -> Value {
        let mut tree = Map::new();
        tree.insert(
            "size".into(),
            json!(self.paper_name(0.2).unwrap_or("unknown")),
        );
        tree.insert("width".into(), json!(self.width.to_string()));
        tree.insert("height".into(), json!(self.height.to_string()));
        tree.insert("orientation".into(), json!(self.orientation.as_str()));
        tree.insert(
            "margins".into(),
            json!({
                "top": self.margins.top.to_string(),
                "bottom": self.margins.bottom.to_string(),
                "left": self.margins.left.to_string(),
                "right": self.margins.right.to_string(),
            }),
        );
        if self.header.is_some() || self.footer.is_some() {
            let mut header = Map::new();
            if let Some(top) = self.header {
                header.insert("top".into(), json!(top.to_string()));
            }
            if let Some(bottom) = self.footer {
                header.insert("bottom".into(), json!(bottom.to_string()));
            }
            tree.insert("header".into(), Value::Object(header));
        }
        Value::Object(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_a4() {
        let page = PageSettings::default();
        assert_eq!(page.paper_name(0.2), Some("A4"));
        assert!((page.margins.left.cm() - 3.17).abs() < 0.01);
    }

    #[test]
    fn test_landscape_paper_name() {
        let page = PageSettings {
            width: Length::from_mm(420.0),
            height: Length::from_mm(297.0),
            orientation: Orientation::Landscape,
            ..Default::default()
        };
        assert_eq!(page.paper_name(0.2), Some("A3"));
    }

    #[test]
    fn test_orientation_parse() {
        assert_eq!(Orientation::parse("横向"), Some(Orientation::Landscape));
        assert_eq!(Orientation::parse("Portrait"), Some(Orientation::Portrait));
        assert_eq!(Orientation::parse("diagonal"), None);
    }

    #[test]
    fn test_page_tree() {
        let page = PageSettings {
            header: Some(Length::from_cm(1.5)),
            ..Default::default()
        };
        let tree = page.to_tree();
        assert_eq!(tree["size"], "A4");
        assert_eq!(tree["orientation"], "portrait");
        assert_eq!(tree["margins"]["top"], "2.54cm");
        assert_eq!(tree["header"]["top"], "1.5cm");
        assert!(tree["header"].get("bottom").is_none());
    }

    #[test]
    fn test_paper_lookup() {
        assert_eq!(PaperSize::by_name("a4").map(|p| p.height_mm), Some(297.0));
        assert!(PaperSize::by_name("A9").is_none());
    }
}

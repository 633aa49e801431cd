//! Font and paragraph formatting attributes.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Twips per point.
pub const TWIPS_PER_POINT: f32 = 20.0;
/// Points per centimeter.
pub const POINTS_PER_CM: f32 = 72.0 / 2.54;
/// English Metric Units per point.
pub const EMU_PER_POINT: f32 = 12_700.0;

/// Paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// Read a `w:jc` value.
    pub fn from_wml(value: &str) -> Option<Self> {
        match value {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "both" | "distribute" | "justify" | "lowKashida" | "mediumKashida"
            | "highKashida" | "thaiDistribute" => Some(Alignment::Justify),
            _ => None,
        }
    }

    /// Value written to `w:jc`.
    pub fn to_wml(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }

    /// Parse a human alignment name, including common synonyms.
    pub fn parse(text: &str) -> Option<Self> {
        let lowered = text.trim().to_lowercase();
        match lowered.as_str() {
            "left" | "左对齐" | "left-aligned" | "左" | "start" => Some(Alignment::Left),
            "center" | "centre" | "居中" | "centered" | "居中对齐" | "中" => {
                Some(Alignment::Center)
            }
            "right" | "右对齐" | "right-aligned" | "右" | "end" => Some(Alignment::Right),
            "justify" | "justified" | "both" | "两端对齐" | "two-ends" | "distribute"
            | "分散对齐" => Some(Alignment::Justify),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical length, stored in points.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Length(pub f32);

impl Length {
    pub const ZERO: Length = Length(0.0);

    pub fn from_points(pt: f32) -> Self {
        Length(pt)
    }

    pub fn from_twips(twips: i64) -> Self {
        Length(twips as f32 / TWIPS_PER_POINT)
    }

    pub fn from_cm(cm: f32) -> Self {
        Length(cm * POINTS_PER_CM)
    }

    pub fn from_mm(mm: f32) -> Self {
        Length::from_cm(mm / 10.0)
    }

    pub fn from_inches(inches: f32) -> Self {
        Length(inches * 72.0)
    }

    pub fn from_emu(emu: i64) -> Self {
        Length(emu as f32 / EMU_PER_POINT)
    }

    pub fn points(self) -> f32 {
        self.0
    }

    pub fn cm(self) -> f32 {
        self.0 / POINTS_PER_CM
    }

    pub fn twips(self) -> i64 {
        (self.0 * TWIPS_PER_POINT).round() as i64
    }

    pub fn emu(self) -> i64 {
        (self.0 * EMU_PER_POINT).round() as i64
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}cm", round_to(self.cm(), 3))
    }
}

/// An indentation or spacing amount.
///
/// Word stores indents either as lengths or in hundredths of a character,
/// and paragraph spacing either as lengths or in hundredths of a line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "snake_case")]
pub enum Measure {
    Length(Length),
    Chars(f32),
    Lines(f32),
}

impl Default for Measure {
    fn default() -> Self {
        Measure::Length(Length::ZERO)
    }
}

impl Measure {
    pub fn is_zero(&self) -> bool {
        match self {
            Measure::Length(l) => l.0.abs() < f32::EPSILON,
            Measure::Chars(n) | Measure::Lines(n) => n.abs() < f32::EPSILON,
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measure::Length(l) => write!(f, "{}", l),
            Measure::Chars(n) => write!(f, "{} characters", round_to(*n, 2)),
            Measure::Lines(n) => write!(f, "{} lines", round_to(*n, 2)),
        }
    }
}

/// Line spacing rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "value", rename_all = "snake_case")]
pub enum LineSpacing {
    /// Multiple of single spacing (`lineRule="auto"`, 240 = 1.0)
    Multiple(f32),
    /// Exact height (`lineRule="exact"`)
    Exact(Length),
    /// Minimum height (`lineRule="atLeast"`)
    AtLeast(Length),
}

impl Default for LineSpacing {
    fn default() -> Self {
        LineSpacing::Multiple(1.0)
    }
}

impl fmt::Display for LineSpacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineSpacing::Multiple(m) => write!(f, "{}", round_to(*m, 2)),
            LineSpacing::Exact(l) => write!(f, "exactly {}pt", round_to(l.points(), 2)),
            LineSpacing::AtLeast(l) => write!(f, "at least {}pt", round_to(l.points(), 2)),
        }
    }
}

/// An insertion-ordered set of distinct values.
///
/// A paragraph whose runs disagree on an attribute holds more than one value
/// here. The first value is the one seen on the earliest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueSet<T>(Vec<T>);

impl<T> Default for ValueSet<T> {
    fn default() -> Self {
        ValueSet(Vec::new())
    }
}

impl<T: PartialEq> ValueSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(value: T) -> Self {
        ValueSet(vec![value])
    }

    /// Insert a value if not already present. Returns true when inserted.
    pub fn insert(&mut self, value: T) -> bool {
        if self.0.contains(&value) {
            return false;
        }
        self.0.push(value);
        true
    }

    /// Insert `value` only when the set is empty.
    pub fn fill_if_empty(&mut self, value: T) {
        if self.0.is_empty() {
            self.0.push(value);
        }
    }

    pub fn first(&self) -> Option<&T> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// At most one distinct value.
    pub fn is_consistent(&self) -> bool {
        self.0.len() <= 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }

    pub fn contains(&self, value: &T) -> bool {
        self.0.contains(value)
    }
}

impl<T: PartialEq> FromIterator<T> for ValueSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = ValueSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

/// Per-paragraph font attributes, one value set per field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FontAttributes {
    /// East Asian font families
    pub zh_family: ValueSet<String>,
    /// Latin font families
    pub en_family: ValueSet<String>,
    /// Sizes in points
    pub size: ValueSet<f32>,
    /// `black` or `#RRGGBB`
    pub color: ValueSet<String>,
    pub bold: ValueSet<bool>,
    pub italic: ValueSet<bool>,
    pub all_caps: ValueSet<bool>,
}

impl FontAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when every field holds at least one value.
    pub fn is_resolved(&self) -> bool {
        !self.zh_family.is_empty()
            && !self.en_family.is_empty()
            && !self.size.is_empty()
            && !self.color.is_empty()
            && !self.bold.is_empty()
            && !self.italic.is_empty()
            && !self.all_caps.is_empty()
    }

    /// Attribute tree in requirement-file shape. Every leaf is an array.
    pub fn to_tree(&self) -> Value {
        json!({
            "zh_family": self.zh_family.iter().collect::<Vec<_>>(),
            "en_family": self.en_family.iter().collect::<Vec<_>>(),
            "size": self.size.iter().map(|s| round_to(*s, 2)).collect::<Vec<_>>(),
            "color": self.color.iter().collect::<Vec<_>>(),
            "bold": self.bold.iter().collect::<Vec<_>>(),
            "italic": self.italic.iter().collect::<Vec<_>>(),
            "isAllCaps": self.all_caps.iter().collect::<Vec<_>>(),
        })
    }
}

/// Resolved paragraph formatting.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParagraphFormat {
    pub alignment: Alignment,
    pub first_line: Measure,
    pub left: Measure,
    pub right: Measure,
    pub space_before: Measure,
    pub space_after: Measure,
    pub line_spacing: LineSpacing,
}

impl ParagraphFormat {
    /// Attribute tree in requirement-file shape.
    pub fn to_tree(&self) -> Value {
        json!({
            "alignment": self.alignment.as_str(),
            "line_spacing": self.line_spacing.to_string(),
            "indentation": {
                "first_line": self.first_line.to_string(),
                "left": self.left.to_string(),
                "right": self.right.to_string(),
                "space_before": self.space_before.to_string(),
                "space_after": self.space_after.to_string(),
            }
        })
    }
}

/// Round to a fixed number of decimals, for display.
pub(crate) fn round_to(value: f32, decimals: i32) -> f32 {
    let factor = 10f32.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_parsing() {
        assert_eq!(Alignment::from_wml("both"), Some(Alignment::Justify));
        assert_eq!(Alignment::from_wml("start"), Some(Alignment::Left));
        assert_eq!(Alignment::from_wml("bogus"), None);
        assert_eq!(Alignment::parse("居中"), Some(Alignment::Center));
        assert_eq!(Alignment::parse("Two-Ends"), Some(Alignment::Justify));
        assert_eq!(Alignment::Justify.to_wml(), "both");
    }

    #[test]
    fn test_length_conversions() {
        let l = Length::from_twips(567);
        assert!((l.cm() - 1.0).abs() < 0.01);
        assert_eq!(Length::from_cm(2.54).twips(), 1440);
        assert_eq!(Length::from_inches(1.0).emu(), 914_400);
        assert_eq!(Length::from_cm(1.0).to_string(), "1cm");
    }

    #[test]
    fn test_value_set_keeps_first_order() {
        let mut set = ValueSet::new();
        assert!(set.insert(12.0f32));
        assert!(set.insert(14.0));
        assert!(!set.insert(12.0));
        assert_eq!(set.first(), Some(&12.0));
        assert_eq!(set.len(), 2);
        assert!(!set.is_consistent());
    }

    #[test]
    fn test_font_tree_shape() {
        let mut fonts = FontAttributes::new();
        fonts.size.insert(12.0);
        fonts.bold.insert(false);
        let tree = fonts.to_tree();
        assert_eq!(tree["size"], json!([12.0]));
        assert_eq!(tree["bold"], json!([false]));
        assert_eq!(tree["zh_family"], json!([]));
        assert!(!fonts.is_resolved());
    }

    #[test]
    fn test_paragraph_format_tree() {
        let format = ParagraphFormat {
            alignment: Alignment::Justify,
            first_line: Measure::Chars(2.0),
            line_spacing: LineSpacing::Multiple(1.5),
            ..Default::default()
        };
        let tree = format.to_tree();
        assert_eq!(tree["alignment"], "justify");
        assert_eq!(tree["line_spacing"], "1.5");
        assert_eq!(tree["indentation"]["first_line"], "2 characters");
        assert_eq!(tree["indentation"]["left"], "0cm");
    }
}

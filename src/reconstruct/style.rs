//! Formatting targets read from a requirement subtree, and their WML form.

use crate::compare::units::{
    parse_alignment, parse_bool, parse_color, parse_font_size, parse_line_spacing, parse_measure,
};
use crate::model::{
    is_unconstrained, Alignment, LineSpacing, Measure, ParagraphRole, RequirementSpec,
};
use crate::package::XmlElement;
use crate::parser::wml::W_VAL;
use serde_json::Value;
use std::collections::BTreeMap;

/// Child order of `w:pPr`.
pub const PPR_ORDER: &[&str] = &[
    "w:pStyle",
    "w:keepNext",
    "w:keepLines",
    "w:pageBreakBefore",
    "w:framePr",
    "w:widowControl",
    "w:numPr",
    "w:suppressLineNumbers",
    "w:pBdr",
    "w:shd",
    "w:tabs",
    "w:suppressAutoHyphens",
    "w:kinsoku",
    "w:wordWrap",
    "w:overflowPunct",
    "w:topLinePunct",
    "w:autoSpaceDE",
    "w:autoSpaceDN",
    "w:bidi",
    "w:adjustRightInd",
    "w:snapToGrid",
    "w:spacing",
    "w:ind",
    "w:contextualSpacing",
    "w:mirrorIndents",
    "w:suppressOverlap",
    "w:jc",
    "w:textDirection",
    "w:textAlignment",
    "w:textboxTightWrap",
    "w:outlineLvl",
    "w:divId",
    "w:cnfStyle",
    "w:rPr",
    "w:sectPr",
    "w:pPrChange",
];

/// Child order of `w:rPr`.
pub const RPR_ORDER: &[&str] = &[
    "w:rStyle",
    "w:rFonts",
    "w:b",
    "w:bCs",
    "w:i",
    "w:iCs",
    "w:caps",
    "w:smallCaps",
    "w:strike",
    "w:dstrike",
    "w:outline",
    "w:shadow",
    "w:emboss",
    "w:imprint",
    "w:noProof",
    "w:snapToGrid",
    "w:vanish",
    "w:webHidden",
    "w:color",
    "w:spacing",
    "w:w",
    "w:kern",
    "w:position",
    "w:sz",
    "w:szCs",
    "w:highlight",
    "w:u",
    "w:effect",
    "w:bdr",
    "w:shd",
    "w:fitText",
    "w:vertAlign",
    "w:rtl",
    "w:cs",
    "w:em",
    "w:lang",
    "w:eastAsianLayout",
    "w:specVanish",
    "w:oMath",
];

/// Color written for highlighted runs.
pub const HIGHLIGHT_COLOR: &str = "FF0000";

const THEME_FONT_ATTRS: &[&str] = &[
    "w:asciiTheme",
    "w:hAnsiTheme",
    "w:eastAsiaTheme",
    "w:cstheme",
];

/// Which family a run receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Cjk,
    Latin,
}

/// Required formatting for one role. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleStyle {
    pub zh_family: Option<String>,
    pub en_family: Option<String>,
    pub size: Option<f32>,
    /// `black` or `#RRGGBB`
    pub color: Option<String>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub all_caps: Option<bool>,
    pub alignment: Option<Alignment>,
    pub first_line: Option<Measure>,
    pub left: Option<Measure>,
    pub right: Option<Measure>,
    pub space_before: Option<Measure>,
    pub space_after: Option<Measure>,
    pub line_spacing: Option<LineSpacing>,
}

impl RoleStyle {
    /// Read a role's requirement subtree. Unparseable leaves are skipped with a warning.
    pub fn from_requirement(requirement: &Value, char_width_pt: f32) -> Self {
        let fonts = requirement.get("fonts");
        let format = requirement.get("paragraph_format");
        let indentation = format.and_then(|f| f.get("indentation"));
        let font = |key: &str| leaf(fonts, key);
        let indent = |key: &str| {
            leaf(indentation, key).and_then(|v| parsed(key, v, |v| parse_measure(v, char_width_pt)))
        };

        Self {
            zh_family: font("zh_family").and_then(|v| v.as_str().map(str::to_string)),
            en_family: font("en_family").and_then(|v| v.as_str().map(str::to_string)),
            size: font("size").and_then(|v| parsed("size", v, parse_font_size)),
            color: font("color")
                .and_then(|v| parsed("color", v, |v| v.as_str().and_then(parse_color))),
            bold: font("bold").and_then(|v| parsed("bold", v, parse_bool)),
            italic: font("italic").and_then(|v| parsed("italic", v, parse_bool)),
            all_caps: font("isAllCaps").and_then(|v| parsed("isAllCaps", v, parse_bool)),
            alignment: leaf(format, "alignment")
                .and_then(|v| parsed("alignment", v, parse_alignment)),
            first_line: indent("first_line"),
            left: indent("left"),
            right: indent("right"),
            space_before: indent("space_before"),
            space_after: indent("space_after"),
            line_spacing: leaf(format, "line_spacing")
                .and_then(|v| parsed("line_spacing", v, parse_line_spacing)),
        }
    }

    /// Nothing to apply.
    pub fn is_empty(&self) -> bool {
        *self == RoleStyle::default()
    }

    pub fn has_paragraph_format(&self) -> bool {
        self.alignment.is_some()
            || self.first_line.is_some()
            || self.left.is_some()
            || self.right.is_some()
            || self.space_before.is_some()
            || self.space_after.is_some()
            || self.line_spacing.is_some()
    }

    pub fn has_fonts(&self) -> bool {
        self.zh_family.is_some()
            || self.en_family.is_some()
            || self.size.is_some()
            || self.color.is_some()
            || self.bold.is_some()
            || self.italic.is_some()
            || self.all_caps.is_some()
    }

    /// Write alignment, spacing and indentation into `w:pPr`.
    pub fn apply_paragraph(&self, ppr: &mut XmlElement) {
        if let Some(alignment) = self.alignment {
            ppr.replace_child(
                XmlElement::new("w:jc").with_attr(W_VAL, alignment.to_wml()),
                PPR_ORDER,
            );
        }

        if self.space_before.is_some() || self.space_after.is_some() || self.line_spacing.is_some()
        {
            let spacing = ppr.ensure_child("w:spacing", PPR_ORDER);
            if let Some(before) = self.space_before {
                write_spacing(spacing, "w:before", "w:beforeLines", "w:beforeAutospacing", before);
            }
            if let Some(after) = self.space_after {
                write_spacing(spacing, "w:after", "w:afterLines", "w:afterAutospacing", after);
            }
            if let Some(line) = self.line_spacing {
                let (value, rule) = match line {
                    LineSpacing::Multiple(m) => ((m * 240.0).round() as i64, "auto"),
                    LineSpacing::Exact(l) => (l.twips(), "exact"),
                    LineSpacing::AtLeast(l) => (l.twips(), "atLeast"),
                };
                spacing.set_attr("w:line", value.to_string());
                spacing.set_attr("w:lineRule", rule);
            }
        }

        if self.first_line.is_some() || self.left.is_some() || self.right.is_some() {
            let ind = ppr.ensure_child("w:ind", PPR_ORDER);
            if let Some(first) = self.first_line {
                for key in ["w:firstLine", "w:firstLineChars", "w:hanging", "w:hangingChars"] {
                    ind.remove_attr(key);
                }
                match first {
                    Measure::Chars(n) if n < 0.0 => {
                        ind.set_attr("w:hangingChars", hundredths(-n));
                    }
                    Measure::Chars(n) | Measure::Lines(n) => {
                        ind.set_attr("w:firstLineChars", hundredths(n));
                    }
                    Measure::Length(l) if l.points() < 0.0 => {
                        ind.set_attr("w:hanging", (-l.twips()).to_string());
                    }
                    Measure::Length(l) => ind.set_attr("w:firstLine", l.twips().to_string()),
                }
            }
            if let Some(left) = self.left {
                write_indent(ind, &["w:left", "w:start"], &["w:leftChars", "w:startChars"], left);
            }
            if let Some(right) = self.right {
                write_indent(ind, &["w:right", "w:end"], &["w:rightChars", "w:endChars"], right);
            }
        }
    }

    /// Write font properties for a run of the given script into `w:rPr`.
    pub fn apply_run(&self, rpr: &mut XmlElement, script: Script) {
        if self.zh_family.is_some() || self.en_family.is_some() {
            let fonts = rpr.ensure_child("w:rFonts", RPR_ORDER);
            for key in THEME_FONT_ATTRS {
                fonts.remove_attr(key);
            }
            if let Some(zh) = &self.zh_family {
                fonts.set_attr("w:eastAsia", zh.as_str());
            }
            let latin = match script {
                Script::Cjk => self.zh_family.as_ref().or(self.en_family.as_ref()),
                Script::Latin => self.en_family.as_ref().or(self.zh_family.as_ref()),
            };
            if let Some(latin) = latin {
                fonts.set_attr("w:ascii", latin.as_str());
                fonts.set_attr("w:hAnsi", latin.as_str());
            }
        }

        if let Some(bold) = self.bold {
            rpr.replace_child(on_off("w:b", bold), RPR_ORDER);
        }
        if let Some(italic) = self.italic {
            rpr.replace_child(on_off("w:i", italic), RPR_ORDER);
        }
        if let Some(caps) = self.all_caps {
            rpr.replace_child(on_off("w:caps", caps), RPR_ORDER);
        }
        if let Some(color) = &self.color {
            set_color(rpr, color);
        }
        if let Some(size) = self.size {
            let half_points = ((size * 2.0).round() as i64).to_string();
            rpr.replace_child(
                XmlElement::new("w:sz").with_attr(W_VAL, half_points.as_str()),
                RPR_ORDER,
            );
            rpr.replace_child(
                XmlElement::new("w:szCs").with_attr(W_VAL, half_points.as_str()),
                RPR_ORDER,
            );
        }
    }
}

/// Mark a run as part of a paragraph with violations.
pub fn highlight_run(rpr: &mut XmlElement) {
    set_color(rpr, &format!("#{}", HIGHLIGHT_COLOR));
}

fn set_color(rpr: &mut XmlElement, color: &str) {
    let value = if color == "black" {
        "000000".to_string()
    } else {
        color.trim_start_matches('#').to_string()
    };
    rpr.replace_child(XmlElement::new("w:color").with_attr(W_VAL, value), RPR_ORDER);
}

/// Parse every constrained role subtree of a requirement specification.
pub fn role_styles(spec: &RequirementSpec, char_width_pt: f32) -> BTreeMap<ParagraphRole, RoleStyle> {
    spec.roles()
        .filter(|(_, requirement)| !is_unconstrained(requirement))
        .map(|(role, requirement)| (role, RoleStyle::from_requirement(requirement, char_width_pt)))
        .filter(|(_, style)| !style.is_empty())
        .collect()
}

fn leaf<'a>(parent: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    let value = parent?.get(key)?;
    let value = match value {
        Value::Array(choices) => choices.first()?,
        other => other,
    };
    if is_unconstrained(value) {
        None
    } else {
        Some(value)
    }
}

fn parsed<T>(key: &str, value: &Value, parse: impl Fn(&Value) -> Option<T>) -> Option<T> {
    let result = parse(value);
    if result.is_none() {
        log::warn!("cannot apply requirement '{}' = {}", key, value);
    }
    result
}

fn on_off(name: &str, value: bool) -> XmlElement {
    let element = XmlElement::new(name);
    if value {
        element
    } else {
        element.with_attr(W_VAL, "0")
    }
}

fn hundredths(n: f32) -> String {
    ((n * 100.0).round() as i64).to_string()
}

fn write_spacing(spacing: &mut XmlElement, twips: &str, lines: &str, auto: &str, value: Measure) {
    spacing.remove_attr(twips);
    spacing.remove_attr(lines);
    spacing.remove_attr(auto);
    match value {
        Measure::Lines(n) | Measure::Chars(n) => spacing.set_attr(lines, hundredths(n)),
        Measure::Length(l) => spacing.set_attr(twips, l.twips().to_string()),
    }
}

fn write_indent(ind: &mut XmlElement, twips: &[&str], chars: &[&str], value: Measure) {
    for key in twips.iter().chain(chars) {
        ind.remove_attr(key);
    }
    match value {
        Measure::Chars(n) | Measure::Lines(n) => ind.set_attr(chars[0], hundredths(n)),
        Measure::Length(l) => ind.set_attr(twips[0], l.twips().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Length;
    use crate::parser::wml::{W_PPR, W_RPR};
    use serde_json::json;

    fn style() -> RoleStyle {
        RoleStyle::from_requirement(
            &json!({
                "fonts": {
                    "zh_family": "宋体",
                    "en_family": "Times New Roman",
                    "size": "小四",
                    "bold": false,
                    "color": "unknown"
                },
                "paragraph_format": {
                    "alignment": "justify",
                    "line_spacing": "1.5",
                    "indentation": {"first_line": "2字符", "space_before": "0.5行", "left": "0cm"}
                }
            }),
            10.5,
        )
    }

    #[test]
    fn test_parse_requirement() {
        let style = style();
        assert_eq!(style.zh_family.as_deref(), Some("宋体"));
        assert_eq!(style.size, Some(12.0));
        assert_eq!(style.bold, Some(false));
        assert_eq!(style.color, None);
        assert_eq!(style.alignment, Some(Alignment::Justify));
        assert_eq!(style.first_line, Some(Measure::Chars(2.0)));
        assert_eq!(style.space_before, Some(Measure::Lines(0.5)));
        assert_eq!(style.left, Some(Measure::Length(Length::ZERO)));
        assert_eq!(style.line_spacing, Some(LineSpacing::Multiple(1.5)));
        assert!(style.has_fonts() && style.has_paragraph_format());
    }

    #[test]
    fn test_apply_paragraph_in_schema_order() {
        let mut ppr = XmlElement::new(W_PPR)
            .with_child(XmlElement::new("w:pStyle").with_attr(W_VAL, "Normal"))
            .with_child(XmlElement::new("w:ind").with_attr("w:firstLine", "420"))
            .with_child(XmlElement::new("w:rPr"));
        style().apply_paragraph(&mut ppr);

        let names: Vec<&str> = ppr.elements().map(|e| e.name.as_str()).collect();
        let position = |name: &str| names.iter().position(|n| *n == name).unwrap();
        assert!(position("w:pStyle") < position("w:spacing"));
        assert!(position("w:spacing") < position("w:ind"));
        assert!(position("w:ind") < position("w:jc"));
        assert!(position("w:jc") < position("w:rPr"));

        let ind = ppr.child("w:ind").unwrap();
        assert_eq!(ind.attr("w:firstLineChars"), Some("200"));
        assert_eq!(ind.attr("w:firstLine"), None);
        assert_eq!(ind.attr("w:left"), Some("0"));
        let spacing = ppr.child("w:spacing").unwrap();
        assert_eq!(spacing.attr("w:line"), Some("360"));
        assert_eq!(spacing.attr("w:lineRule"), Some("auto"));
        assert_eq!(spacing.attr("w:beforeLines"), Some("50"));
        assert_eq!(ppr.child("w:jc").and_then(|j| j.attr(W_VAL)), Some("both"));
    }

    #[test]
    fn test_apply_run_per_script() {
        let mut cjk = XmlElement::new(W_RPR).with_child(
            XmlElement::new("w:rFonts").with_attr("w:asciiTheme", "minorHAnsi"),
        );
        style().apply_run(&mut cjk, Script::Cjk);
        let fonts = cjk.child("w:rFonts").unwrap();
        assert_eq!(fonts.attr("w:ascii"), Some("宋体"));
        assert_eq!(fonts.attr("w:eastAsia"), Some("宋体"));
        assert_eq!(fonts.attr("w:asciiTheme"), None);
        assert_eq!(cjk.child("w:sz").and_then(|s| s.attr(W_VAL)), Some("24"));
        assert_eq!(cjk.child("w:b").and_then(|s| s.attr(W_VAL)), Some("0"));

        let mut latin = XmlElement::new(W_RPR);
        style().apply_run(&mut latin, Script::Latin);
        let fonts = latin.child("w:rFonts").unwrap();
        assert_eq!(fonts.attr("w:ascii"), Some("Times New Roman"));
        assert_eq!(fonts.attr("w:eastAsia"), Some("宋体"));
        let names: Vec<&str> = latin.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["w:rFonts", "w:b", "w:sz", "w:szCs"]);
    }

    #[test]
    fn test_highlight_color() {
        let mut rpr = XmlElement::new(W_RPR);
        highlight_run(&mut rpr);
        assert_eq!(rpr.child("w:color").and_then(|c| c.attr(W_VAL)), Some("FF0000"));
    }

    #[test]
    fn test_role_styles_skip_unconstrained() {
        let spec = RequirementSpec::from_value(json!({
            "body": {"fonts": {"size": "小四"}},
            "heading1": {},
            "heading2": {"fonts": {"size": "unknown"}}
        }))
        .unwrap();
        let styles = role_styles(&spec, 10.5);
        assert_eq!(styles.len(), 1);
        assert!(styles.contains_key(&ParagraphRole::Body));
    }
}

//! Style sheet (`word/styles.xml`) and property inheritance.
//!
//! Run and paragraph properties are held as `Option` fields. Resolution walks
//! from the most specific source to the least specific one, and each step
//! only fills fields that are still `None`.

use super::theme::ThemeFonts;
use super::wml::{attr_i64, child_on_off, child_val, W_PPR, W_RPR};
use crate::model::{Alignment, Length, LineSpacing, Measure};
use crate::package::XmlElement;
use std::collections::{HashMap, HashSet};

/// Maximum `basedOn` depth followed before giving up.
const MAX_STYLE_DEPTH: usize = 32;

/// A font named directly or through the theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontRef {
    Named(String),
    Theme(String),
}

impl FontRef {
    /// Concrete family name, looking theme references up.
    pub fn resolve<'a>(&'a self, theme: &'a ThemeFonts) -> Option<&'a str> {
        match self {
            FontRef::Named(name) => Some(name.as_str()),
            FontRef::Theme(reference) => theme.resolve(reference),
        }
    }
}

/// Character formatting from one source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunProps {
    pub east_asia: Option<FontRef>,
    pub latin: Option<FontRef>,
    /// Size in points
    pub size: Option<f32>,
    /// `black` or `#RRGGBB`
    pub color: Option<String>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub caps: Option<bool>,
    /// Character style id (`w:rStyle`)
    pub style_id: Option<String>,
}

impl RunProps {
    /// Read a `w:rPr` element.
    pub fn from_rpr(rpr: &XmlElement) -> Self {
        let mut props = RunProps::default();

        if let Some(fonts) = rpr.child("w:rFonts") {
            // Theme attributes take precedence over explicit names.
            props.east_asia = named_or_theme(fonts, "w:eastAsiaTheme", &["w:eastAsia"]);
            props.latin = named_or_theme(fonts, "w:asciiTheme", &["w:ascii"])
                .or_else(|| named_or_theme(fonts, "w:hAnsiTheme", &["w:hAnsi"]));
        }

        props.size = child_val(rpr, "w:sz")
            .and_then(|v| v.trim().parse::<f32>().ok())
            .map(|half_points| half_points / 2.0);
        props.color = child_val(rpr, "w:color").map(normalize_color);
        props.bold = child_on_off(rpr, "w:b");
        props.italic = child_on_off(rpr, "w:i");
        props.caps = child_on_off(rpr, "w:caps");
        props.style_id = child_val(rpr, "w:rStyle").map(str::to_string);
        props
    }

    /// Fill fields that are still unset from a less specific source.
    pub fn inherit(&mut self, parent: &RunProps) {
        fill(&mut self.east_asia, &parent.east_asia);
        fill(&mut self.latin, &parent.latin);
        fill(&mut self.size, &parent.size);
        fill(&mut self.color, &parent.color);
        fill(&mut self.bold, &parent.bold);
        fill(&mut self.italic, &parent.italic);
        fill(&mut self.caps, &parent.caps);
    }
}

/// Paragraph formatting from one source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParaProps {
    pub alignment: Option<Alignment>,
    pub first_line: Option<Measure>,
    pub left: Option<Measure>,
    pub right: Option<Measure>,
    pub space_before: Option<Measure>,
    pub space_after: Option<Measure>,
    pub line_spacing: Option<LineSpacing>,
}

impl ParaProps {
    /// Read a `w:pPr` element.
    pub fn from_ppr(ppr: &XmlElement) -> Self {
        let mut props = ParaProps {
            alignment: child_val(ppr, "w:jc").and_then(Alignment::from_wml),
            ..Default::default()
        };

        if let Some(ind) = ppr.child("w:ind") {
            props.first_line = read_first_line(ind);
            props.left = read_measure(ind, &["w:leftChars", "w:startChars"], &["w:left", "w:start"], Measure::Chars);
            props.right = read_measure(ind, &["w:rightChars", "w:endChars"], &["w:right", "w:end"], Measure::Chars);
        }

        if let Some(spacing) = ppr.child("w:spacing") {
            props.space_before = read_measure(spacing, &["w:beforeLines"], &["w:before"], Measure::Lines);
            props.space_after = read_measure(spacing, &["w:afterLines"], &["w:after"], Measure::Lines);
            props.line_spacing = attr_i64(spacing, "w:line").map(|line| {
                match spacing.attr("w:lineRule") {
                    Some("exact") => LineSpacing::Exact(Length::from_twips(line)),
                    Some("atLeast") => LineSpacing::AtLeast(Length::from_twips(line)),
                    _ => LineSpacing::Multiple(line as f32 / 240.0),
                }
            });
        }

        props
    }

    /// Fill fields that are still unset from a less specific source.
    pub fn inherit(&mut self, parent: &ParaProps) {
        fill(&mut self.alignment, &parent.alignment);
        fill(&mut self.first_line, &parent.first_line);
        fill(&mut self.left, &parent.left);
        fill(&mut self.right, &parent.right);
        fill(&mut self.space_before, &parent.space_before);
        fill(&mut self.space_after, &parent.space_after);
        fill(&mut self.line_spacing, &parent.line_spacing);
    }
}

/// Style type (`w:type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKind {
    Paragraph,
    Character,
    Table,
    Numbering,
}

/// One `w:style` definition.
#[derive(Debug, Clone)]
pub struct Style {
    pub id: String,
    pub name: Option<String>,
    pub kind: StyleKind,
    pub based_on: Option<String>,
    pub is_default: bool,
    pub run: RunProps,
    pub para: ParaProps,
}

/// Parsed styles plus theme fonts.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    styles: HashMap<String, Style>,
    default_paragraph: Option<String>,
    doc_run: RunProps,
    doc_para: ParaProps,
    theme: ThemeFonts,
}

impl StyleSheet {
    /// Build from the roots of the styles and theme parts, either of which may be absent.
    pub fn from_parts(styles: Option<&XmlElement>, theme: Option<&XmlElement>) -> Self {
        let mut sheet = StyleSheet {
            theme: theme.map(ThemeFonts::from_theme).unwrap_or_default(),
            ..Default::default()
        };

        let Some(root) = styles else {
            return sheet;
        };

        if let Some(defaults) = root.child("w:docDefaults") {
            if let Some(rpr) = defaults.path(&["w:rPrDefault", W_RPR]) {
                sheet.doc_run = RunProps::from_rpr(rpr);
            }
            if let Some(ppr) = defaults.path(&["w:pPrDefault", W_PPR]) {
                sheet.doc_para = ParaProps::from_ppr(ppr);
            }
        }

        for element in root.children_named("w:style") {
            let Some(id) = element.attr("w:styleId") else {
                continue;
            };
            let kind = match element.attr("w:type") {
                Some("character") => StyleKind::Character,
                Some("table") => StyleKind::Table,
                Some("numbering") => StyleKind::Numbering,
                _ => StyleKind::Paragraph,
            };
            let is_default = matches!(element.attr("w:default"), Some("1" | "true"));
            let style = Style {
                id: id.to_string(),
                name: child_val(element, "w:name").map(str::to_string),
                kind,
                based_on: child_val(element, "w:basedOn").map(str::to_string),
                is_default,
                run: element.child(W_RPR).map(RunProps::from_rpr).unwrap_or_default(),
                para: element.child(W_PPR).map(ParaProps::from_ppr).unwrap_or_default(),
            };
            if is_default && kind == StyleKind::Paragraph {
                sheet.default_paragraph = Some(style.id.clone());
            }
            sheet.styles.insert(style.id.clone(), style);
        }

        sheet
    }

    pub fn style(&self, id: &str) -> Option<&Style> {
        self.styles.get(id)
    }

    /// Display name of a style, falling back to its id.
    pub fn style_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.style(id)
            .and_then(|s| s.name.as_deref())
            .unwrap_or(id)
    }

    /// The paragraph style applied when a paragraph names none.
    pub fn default_paragraph_style(&self) -> Option<&str> {
        self.default_paragraph.as_deref()
    }

    pub fn theme(&self) -> &ThemeFonts {
        &self.theme
    }

    pub fn doc_run(&self) -> &RunProps {
        &self.doc_run
    }

    pub fn doc_para(&self) -> &ParaProps {
        &self.doc_para
    }

    /// Run and paragraph properties of a style and its `basedOn` ancestors.
    pub fn resolve_chain(&self, id: &str) -> (RunProps, ParaProps) {
        let mut run = RunProps::default();
        let mut para = ParaProps::default();
        let mut visited = HashSet::new();
        let mut current = Some(id);

        while let Some(style_id) = current {
            if !visited.insert(style_id) || visited.len() > MAX_STYLE_DEPTH {
                log::warn!("style chain of '{}' loops or is too deep", id);
                break;
            }
            let Some(style) = self.style(style_id) else {
                log::debug!("style '{}' is not defined", style_id);
                break;
            };
            run.inherit(&style.run);
            para.inherit(&style.para);
            current = style.based_on.as_deref();
        }

        (run, para)
    }
}

fn fill<T: Clone>(slot: &mut Option<T>, parent: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(parent);
    }
}

fn named_or_theme(fonts: &XmlElement, theme_key: &str, named_keys: &[&str]) -> Option<FontRef> {
    if let Some(reference) = fonts.attr(theme_key) {
        return Some(FontRef::Theme(reference.to_string()));
    }
    named_keys
        .iter()
        .find_map(|k| fonts.attr(k))
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| FontRef::Named(n.to_string()))
}

/// Normalize a `w:color` value to `black` or `#RRGGBB`.
pub fn normalize_color(value: &str) -> String {
    let value = value.trim();
    if value.eq_ignore_ascii_case("auto") || value == "000000" {
        "black".to_string()
    } else {
        format!("#{}", value.to_ascii_uppercase())
    }
}

fn nonzero(element: &XmlElement, keys: &[&str]) -> Option<i64> {
    keys.iter()
        .find_map(|k| attr_i64(element, k))
        .filter(|v| *v != 0)
}

fn read_measure(
    element: &XmlElement,
    unit_keys: &[&str],
    twips_keys: &[&str],
    unit: fn(f32) -> Measure,
) -> Option<Measure> {
    if let Some(hundredths) = nonzero(element, unit_keys) {
        return Some(unit(hundredths as f32 / 100.0));
    }
    twips_keys
        .iter()
        .find_map(|k| attr_i64(element, k))
        .map(|t| Measure::Length(Length::from_twips(t)))
}

fn read_first_line(ind: &XmlElement) -> Option<Measure> {
    if let Some(chars) = nonzero(ind, &["w:firstLineChars"]) {
        return Some(Measure::Chars(chars as f32 / 100.0));
    }
    if let Some(chars) = nonzero(ind, &["w:hangingChars"]) {
        return Some(Measure::Chars(-(chars as f32) / 100.0));
    }
    if let Some(hanging) = attr_i64(ind, "w:hanging") {
        return Some(Measure::Length(Length::from_twips(-hanging)));
    }
    attr_i64(ind, "w:firstLine").map(|t| Measure::Length(Length::from_twips(t)))
}

//! Normalization of requirement values.
//!
//! Requirement files are written by people, so the same quantity shows up as
//! `"2字符"`, `"2 characters"` or `"0.74cm"`, and the same font as `"SimSun"` or
//! `"宋体"`. Everything here maps such text onto a canonical form that can be
//! compared numerically or by equality.

use crate::model::{Alignment, Length, LineSpacing, Measure, POINTS_PER_CM};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Height of one line in Word's `beforeLines`/`afterLines` units.
pub const LINE_HEIGHT_PT: f32 = 12.0;

static NUMBER_WITH_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([-+]?\d*\.?\d+)\s*([^\d\s.]*)$").expect("valid number regex")
});

static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-+]?\d*\.?\d+").expect("valid leading number regex"));

/// Chinese font-size names and their point sizes.
pub const CHINESE_FONT_SIZES: &[(&str, f32)] = &[
    ("初号", 42.0),
    ("小初", 36.0),
    ("一号", 26.0),
    ("小一", 24.0),
    ("二号", 22.0),
    ("小二", 18.0),
    ("三号", 16.0),
    ("小三", 15.0),
    ("四号", 14.0),
    ("小四", 12.0),
    ("五号", 10.5),
    ("小五", 9.0),
    ("六号", 7.5),
    ("小六", 6.5),
    ("七号", 5.5),
    ("八号", 5.0),
];

/// Groups of equivalent font names. The first entry is the canonical name.
pub const FONT_ALIASES: &[&[&str]] = &[
    &["宋体", "simsun", "songti", "song", "新宋体", "nsimsun", "songti sc"],
    &["黑体", "simhei", "heiti", "hei", "heiti sc"],
    &["微软雅黑", "microsoft yahei", "msyh", "yahei"],
    &["仿宋", "fangsong", "simfang", "仿宋_gb2312", "fangsong_gb2312"],
    &["楷体", "kaiti", "simkai", "楷体_gb2312", "kaiti_gb2312"],
    &["times new roman", "times", "tnr"],
];

/// Extract the first number in a string.
pub fn leading_number(text: &str) -> Option<f32> {
    LEADING_NUMBER
        .find(text)
        .and_then(|m| m.as_str().parse::<f32>().ok())
}

/// Numeric content of a JSON value: numbers as-is, strings by their first number.
pub fn value_number(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) => leading_number(s),
        _ => None,
    }
}

/// Display form of a JSON value without quotes around strings.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse a length into points.
///
/// Recognized units: cm, mm, in/inch, pt/磅, characters/字符 (converted with
/// `char_width_pt`), lines/行. A bare number is taken as centimeters.
pub fn parse_length(text: &str, char_width_pt: f32) -> Option<f32> {
    let cleaned = text.trim().to_lowercase();
    let found = NUMBER_WITH_UNIT.captures(&cleaned)?;
    let number: f32 = found.get(1)?.as_str().parse().ok()?;
    let unit = found.get(2).map(|m| m.as_str().trim()).unwrap_or_default();

    let points = match unit {
        "" | "cm" | "厘米" => number * POINTS_PER_CM,
        "mm" | "毫米" => Length::from_mm(number).points(),
        "in" | "inch" | "inches" | "英寸" => Length::from_inches(number).points(),
        "pt" | "pts" | "point" | "points" | "磅" => number,
        "characters" | "character" | "chars" | "char" | "字符" | "字" => number * char_width_pt,
        "lines" | "line" | "行" => number * LINE_HEIGHT_PT,
        _ => return None,
    };
    Some(points)
}

/// [`parse_length`] over a JSON value; plain numbers are centimeters.
pub fn value_length(value: &Value, char_width_pt: f32) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|v| v as f32 * POINTS_PER_CM),
        Value::String(s) => parse_length(s, char_width_pt),
        _ => None,
    }
}

/// Parse an indent or spacing amount, keeping character and line units.
pub fn parse_measure(value: &Value, char_width_pt: f32) -> Option<Measure> {
    if let Value::String(text) = value {
        let cleaned = text.trim().to_lowercase();
        let found = NUMBER_WITH_UNIT.captures(&cleaned)?;
        let number: f32 = found.get(1)?.as_str().parse().ok()?;
        match found.get(2).map(|m| m.as_str()).unwrap_or_default() {
            "characters" | "character" | "chars" | "char" | "字符" | "字" => {
                return Some(Measure::Chars(number))
            }
            "lines" | "line" | "行" => return Some(Measure::Lines(number)),
            _ => {}
        }
    }
    value_length(value, char_width_pt).map(|points| Measure::Length(Length::from_points(points)))
}

/// Parse a font size in points, accepting Chinese size names.
pub fn parse_font_size(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) => {
            let trimmed = s.trim();
            let name = trimmed.trim_end_matches("字号").trim();
            if let Some((_, size)) = CHINESE_FONT_SIZES.iter().find(|(n, _)| *n == name) {
                return Some(*size);
            }
            leading_number(trimmed)
        }
        _ => None,
    }
}

/// Canonical lowercase name of a font family.
pub fn canonical_font(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    FONT_ALIASES
        .iter()
        .find(|group| group.contains(&lowered.as_str()))
        .map(|group| group[0].to_string())
        .unwrap_or(lowered)
}

/// Interpret a boolean written as a bool, number or common word.
pub fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "t" | "1" | "on" | "是" => Some(true),
            "false" | "no" | "n" | "f" | "0" | "off" | "否" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Canonical color: `black` or uppercase `#RRGGBB`.
pub fn parse_color(text: &str) -> Option<String> {
    let lowered = text.trim().to_lowercase();
    let named = match lowered.as_str() {
        "black" | "黑色" | "黑" | "auto" | "自动" => return Some("black".to_string()),
        "white" | "白色" => "FFFFFF",
        "red" | "红色" => "FF0000",
        "green" | "绿色" => "00FF00",
        "blue" | "蓝色" => "0000FF",
        "yellow" | "黄色" => "FFFF00",
        other => other.trim_start_matches('#'),
    };
    if named.len() != 6 || !named.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let upper = named.to_ascii_uppercase();
    if upper == "000000" {
        Some("black".to_string())
    } else {
        Some(format!("#{}", upper))
    }
}

/// Parse alignment names and their synonyms.
pub fn parse_alignment(value: &Value) -> Option<Alignment> {
    value.as_str().and_then(Alignment::parse)
}

/// Parse a line spacing description.
pub fn parse_line_spacing(value: &Value) -> Option<LineSpacing> {
    let text = match value {
        Value::Number(n) => return n.as_f64().map(|v| LineSpacing::Multiple(v as f32)),
        Value::String(s) => s.trim().to_lowercase(),
        _ => return None,
    };

    match text.as_str() {
        "single" | "单倍行距" | "单倍" => return Some(LineSpacing::Multiple(1.0)),
        "double" | "双倍行距" | "双倍" => return Some(LineSpacing::Multiple(2.0)),
        _ => {}
    }

    let number = leading_number(&text)?;
    let at_least = ["at least", "atleast", "最小值", "至少"]
        .iter()
        .any(|k| text.contains(k));
    let has_length_unit = ["pt", "磅", "cm", "mm"].iter().any(|u| text.contains(u));

    if at_least {
        return Some(LineSpacing::AtLeast(Length::from_points(
            length_points(&text, number),
        )));
    }
    if text.contains("exact") || text.contains("固定值") || has_length_unit {
        return Some(LineSpacing::Exact(Length::from_points(length_points(
            &text, number,
        ))));
    }
    Some(LineSpacing::Multiple(number))
}

fn length_points(text: &str, number: f32) -> f32 {
    if text.contains("cm") {
        number * POINTS_PER_CM
    } else if text.contains("mm") {
        Length::from_mm(number).points()
    } else {
        number
    }
}

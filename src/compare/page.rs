//! Page-level comparison.

use super::options::CompareOptions;
use super::units::{value_length, value_text};
use crate::model::{
    is_unconstrained, Length, Orientation, PageSettings, PaperSize, Violation, ViolationKind,
    PAPER_KEY, POINTS_PER_CM,
};
use serde_json::{json, Value};

/// Compare the document's page settings against the `paper` requirement.
///
/// Recognized keys: `size` (paper name), `width`, `height`, `orientation`,
/// `margins` (`top`/`bottom`/`left`/`right`), `header` (an object with `top`
/// for the header distance and `bottom` for the footer distance, or a single
/// length) and `footer`.
pub fn compare_page(page: &PageSettings, paper: &Value, options: &CompareOptions) -> Vec<Violation> {
    let mut violations = Vec::new();
    let Some(paper) = paper.as_object() else {
        return violations;
    };
    let actual = page.to_tree();

    for (key, required) in paper {
        if is_unconstrained(required) {
            continue;
        }
        let location = format!("{}.{}", PAPER_KEY, key);

        match key.as_str() {
            "size" => {
                let Some(name) = required.as_str() else {
                    violations.push(mismatch(key, &location, required, &actual[key.as_str()]));
                    continue;
                };
                let Some(size) = PaperSize::by_name(name) else {
                    log::warn!("unknown paper size '{}' in requirements", name);
                    continue;
                };
                if !paper_matches(page, size, options.paper_tolerance_cm) {
                    let found = match page.paper_name(options.paper_tolerance_cm) {
                        Some(found) => json!(found),
                        None => json!(format!("{}×{}", page.width, page.height)),
                    };
                    violations.push(mismatch(key, &location, required, &found));
                }
            }
            "width" | "height" => {
                let found = if key == "width" { page.width } else { page.height };
                check_length(
                    key,
                    &location,
                    required,
                    found,
                    options.paper_tolerance_cm,
                    options,
                    &mut violations,
                );
            }
            "orientation" => {
                let expected = required.as_str().and_then(Orientation::parse);
                if expected != Some(page.orientation) {
                    violations.push(mismatch(
                        key,
                        &location,
                        required,
                        &json!(page.orientation.as_str()),
                    ));
                }
            }
            "margins" => {
                let Some(margins) = required.as_object() else {
                    violations.push(type_mismatch(key, &location, required));
                    continue;
                };
                for (side, value) in margins {
                    let found = match side.as_str() {
                        "top" => page.margins.top,
                        "bottom" => page.margins.bottom,
                        "left" => page.margins.left,
                        "right" => page.margins.right,
                        other => {
                            log::warn!("unknown margin '{}' in requirements", other);
                            continue;
                        }
                    };
                    check_length(
                        side,
                        &format!("{}.{}", location, side),
                        value,
                        found,
                        options.margin_tolerance_cm,
                        options,
                        &mut violations,
                    );
                }
            }
            "header" => match required {
                Value::Object(distances) => {
                    for (edge, value) in distances {
                        let found = match edge.as_str() {
                            "top" => page.header,
                            "bottom" => page.footer,
                            other => {
                                log::warn!("unknown header distance '{}' in requirements", other);
                                continue;
                            }
                        };
                        check_optional_length(
                            edge,
                            &format!("{}.{}", location, edge),
                            value,
                            found,
                            options,
                            &mut violations,
                        );
                    }
                }
                _ => check_optional_length(
                    key,
                    &location,
                    required,
                    page.header,
                    options,
                    &mut violations,
                ),
            },
            "footer" => check_optional_length(
                key,
                &location,
                required,
                page.footer,
                options,
                &mut violations,
            ),
            other => log::warn!("unknown paper key '{}' in requirements", other),
        }
    }

    violations
}

fn paper_matches(page: &PageSettings, size: PaperSize, tolerance_cm: f32) -> bool {
    let (short, long) = if page.width.0 <= page.height.0 {
        (page.width, page.height)
    } else {
        (page.height, page.width)
    };
    (size.width().cm() - short.cm()).abs() <= tolerance_cm
        && (size.height().cm() - long.cm()).abs() <= tolerance_cm
}

fn check_optional_length(
    key: &str,
    location: &str,
    required: &Value,
    found: Option<Length>,
    options: &CompareOptions,
    out: &mut Vec<Violation>,
) {
    if is_unconstrained(required) {
        return;
    }
    match found {
        Some(found) => check_length(
            key,
            location,
            required,
            found,
            options.margin_tolerance_cm,
            options,
            out,
        ),
        None if !options.is_optional(key) => out.push(Violation::new(
            ViolationKind::MissingField,
            format!("missing required field '{}'", key),
            location,
            required.clone(),
            Value::Null,
        )),
        None => {}
    }
}

fn check_length(
    key: &str,
    location: &str,
    required: &Value,
    found: Length,
    tolerance_cm: f32,
    options: &CompareOptions,
    out: &mut Vec<Violation>,
) {
    if is_unconstrained(required) {
        return;
    }
    let matches = value_length(required, options.char_width_pt)
        .map(|points| (points / POINTS_PER_CM - found.cm()).abs() <= tolerance_cm + 1e-4)
        .unwrap_or(false);
    if !matches {
        out.push(mismatch(key, location, required, &json!(found.to_string())));
    }
}

fn mismatch(key: &str, location: &str, required: &Value, found: &Value) -> Violation {
    Violation::new(
        ViolationKind::ValueMismatch,
        format!(
            "'{}' mismatch: expected {}, found {}",
            key,
            value_text(required),
            value_text(found)
        ),
        location,
        required.clone(),
        found.clone(),
    )
}

fn type_mismatch(key: &str, location: &str, required: &Value) -> Violation {
    Violation::new(
        ViolationKind::TypeMismatch,
        format!("'{}' should be an object", key),
        location,
        required.clone(),
        Value::Null,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a4() -> PageSettings {
        PageSettings::default()
    }

    #[test]
    fn test_matching_page() {
        let paper = json!({
            "size": "A4",
            "orientation": "Portrait",
            "margins": {"top": "2.54cm", "bottom": "25.4mm", "left": "3.17cm", "right": "unknown"}
        });
        let violations = compare_page(&a4(), &paper, &CompareOptions::default());
        assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn test_margin_mismatch() {
        let paper = json!({"margins": {"left": "2.5cm", "top": 2.54}});
        let violations = compare_page(&a4(), &paper, &CompareOptions::default());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location, "paper.margins.left");
        assert_eq!(violations[0].actual, json!("3.175cm"));
    }

    #[test]
    fn test_size_and_orientation_mismatch() {
        let paper = json!({"size": "B5", "orientation": "landscape"});
        let violations = compare_page(&a4(), &paper, &CompareOptions::default());
        assert_eq!(violations.len(), 2);
        let size = violations
            .iter()
            .find(|v| v.location == "paper.size")
            .unwrap();
        assert_eq!(size.actual, json!("A4"));
        assert!(violations.iter().any(|v| v.location == "paper.orientation"));
    }

    #[test]
    fn test_missing_header_distance() {
        let paper = json!({"header": {"top": "1.5cm"}});
        let violations = compare_page(&a4(), &paper, &CompareOptions::default());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::MissingField);

        let page = PageSettings {
            header: Some(Length::from_cm(1.5)),
            ..a4()
        };
        assert!(compare_page(&page, &paper, &CompareOptions::default()).is_empty());
    }
}

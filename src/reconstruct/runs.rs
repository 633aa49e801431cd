//! Run rewriting with script splitting.

use super::style::{highlight_run, RoleStyle, Script};
use crate::error::{Error, Result};
use crate::package::{XmlElement, XmlNode};
use crate::parser::wml::{
    run_has_non_text_content, run_text, text_element, RUN_CONTAINERS, W_R, W_RPR, W_T,
};

/// Script of a character, or `None` for whitespace, which joins its neighbours.
pub fn script_of(c: char) -> Option<Script> {
    if c.is_whitespace() {
        return None;
    }
    let cjk = matches!(c as u32,
        0x2E80..=0x2FDF      // radicals
        | 0x3000..=0x303F    // CJK punctuation
        | 0x3040..=0x30FF    // kana
        | 0x3100..=0x312F    // bopomofo
        | 0x31C0..=0x31EF    // strokes
        | 0x3400..=0x4DBF    // extension A
        | 0x4E00..=0x9FFF    // unified ideographs
        | 0xF900..=0xFAFF    // compatibility ideographs
        | 0xFE30..=0xFE4F    // compatibility forms
        | 0xFF00..=0xFFEF    // full-width forms
        | 0x20000..=0x2FA1F);
    Some(if cjk { Script::Cjk } else { Script::Latin })
}

/// Split text into maximal same-script segments.
///
/// Whitespace stays with the segment it follows; leading whitespace goes
/// with the first segment. Concatenating the segments gives back the input.
pub fn split_by_script(text: &str) -> Vec<(Script, String)> {
    let mut segments: Vec<(Script, String)> = Vec::new();
    let mut pending = String::new();

    for c in text.chars() {
        match script_of(c) {
            None => match segments.last_mut() {
                Some((_, segment)) => segment.push(c),
                None => pending.push(c),
            },
            Some(script) => match segments.last_mut() {
                Some((current, segment)) if *current == script => segment.push(c),
                _ => {
                    let mut segment = std::mem::take(&mut pending);
                    segment.push(c);
                    segments.push((script, segment));
                }
            },
        }
    }

    if !pending.is_empty() {
        segments.push((Script::Latin, pending));
    }
    segments
}

/// Script of the first non-whitespace character.
pub fn dominant_script(text: &str) -> Script {
    text.chars().find_map(script_of).unwrap_or(Script::Latin)
}

/// Apply fonts to every run under `parent`, splitting plain-text runs at
/// script boundaries. Returns the number of runs written.
///
/// Runs holding drawings, fields or note references are left as they are.
pub fn format_runs(parent: &mut XmlElement, style: &RoleStyle, highlight: bool) -> Result<usize> {
    let mut written = 0;
    let children = std::mem::take(&mut parent.children);
    let mut rebuilt = Vec::with_capacity(children.len());

    for node in children {
        match node {
            XmlNode::Element(run) if run.is(W_R) => {
                let runs = rewrite_run(run, style, highlight)?;
                written += runs.len();
                rebuilt.extend(runs.into_iter().map(XmlNode::Element));
            }
            XmlNode::Element(mut container)
                if RUN_CONTAINERS.contains(&container.name.as_str()) =>
            {
                written += format_runs(&mut container, style, highlight)?;
                rebuilt.push(XmlNode::Element(container));
            }
            other => rebuilt.push(other),
        }
    }

    parent.children = rebuilt;
    Ok(written)
}

fn rewrite_run(run: XmlElement, style: &RoleStyle, highlight: bool) -> Result<Vec<XmlElement>> {
    if run_has_non_text_content(&run) {
        return Ok(vec![run]);
    }
    let text = run_text(&run);
    if text.is_empty() {
        return Ok(vec![run]);
    }

    let base = run.child(W_RPR).cloned();
    let mut shell = run;
    let children = std::mem::take(&mut shell.children);

    // Pieces in document order. Tabs, breaks and other inline marks join the
    // piece they sit in; a new piece starts only where the script changes.
    let mut pieces: Vec<(Option<Script>, Vec<XmlNode>)> = vec![(None, Vec::new())];
    for node in children {
        match node {
            XmlNode::Element(child) if child.is(W_RPR) => {}
            XmlNode::Element(child) if child.is(W_T) => {
                let content = child.text();
                if content.chars().all(char::is_whitespace) {
                    push_piece(&mut pieces, None, XmlNode::Element(child));
                    continue;
                }
                for (script, segment) in split_by_script(&content) {
                    push_piece(
                        &mut pieces,
                        Some(script),
                        XmlNode::Element(text_element(&segment)),
                    );
                }
            }
            other => push_piece(&mut pieces, None, other),
        }
    }

    let fallback = dominant_script(&text);
    let runs: Vec<XmlElement> = pieces
        .into_iter()
        .filter(|(_, nodes)| !nodes.is_empty())
        .map(|(script, nodes)| {
            let mut rpr = base.clone().unwrap_or_else(|| XmlElement::new(W_RPR));
            style.apply_run(&mut rpr, script.unwrap_or(fallback));
            if highlight {
                highlight_run(&mut rpr);
            }
            let mut piece = shell.clone();
            if !rpr.children.is_empty() || !rpr.attributes.is_empty() {
                piece.children.push(XmlNode::Element(rpr));
            }
            piece.children.extend(nodes);
            piece
        })
        .collect();

    let rejoined: String = runs.iter().map(run_text).collect();
    if rejoined != text {
        return Err(Error::Corrupted(format!(
            "script split changed run text '{}'",
            text
        )));
    }
    Ok(runs)
}

/// Append a node to the last piece, opening a new piece when `script`
/// differs from the script the last piece already carries.
fn push_piece(pieces: &mut Vec<(Option<Script>, Vec<XmlNode>)>, script: Option<Script>, node: XmlNode) {
    let start_new = match (pieces.last(), script) {
        (Some((Some(current), _)), Some(next)) => *current != next,
        (None, _) => true,
        _ => false,
    };
    if start_new {
        pieces.push((script, Vec::new()));
    }
    if let Some((current, nodes)) = pieces.last_mut() {
        if current.is_none() {
            *current = script;
        }
        nodes.push(node);
    }
}

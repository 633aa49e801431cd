//! Requirement derivation from a reference document.

use crate::model::{Document, ParagraphRole, RequirementSpec};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Counts values in first-seen order so ties resolve to the earliest value.
#[derive(Debug, Default)]
struct Tally {
    counts: Vec<(Value, usize)>,
}

impl Tally {
    fn add(&mut self, value: &Value) {
        match self.counts.iter_mut().find(|(v, _)| v == value) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((value.clone(), 1)),
        }
    }

    fn most_frequent(&self) -> Option<Value> {
        let mut best: Option<&(Value, usize)> = None;
        for entry in &self.counts {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(v, _)| v.clone())
    }
}

/// Build a requirement specification from a classified reference document.
///
/// Every leaf takes the most frequent value among the text records of each
/// role; multi-valued attributes contribute their first value. Page settings
/// are copied as the `paper` subtree.
pub fn derive_requirements(document: &Document) -> RequirementSpec {
    let mut tallies: BTreeMap<ParagraphRole, BTreeMap<String, Tally>> = BTreeMap::new();

    for record in document.records.iter().filter(|r| r.is_text()) {
        if record.text.trim().is_empty() {
            continue;
        }
        let leaves = tallies.entry(record.role).or_default();
        let mut flat = Vec::new();
        flatten(&record.attribute_tree(), "", &mut flat);
        for (path, value) in flat {
            leaves.entry(path).or_default().add(&value);
        }
    }

    let mut spec = RequirementSpec::new();
    for (role, leaves) in tallies {
        let mut tree = Value::Object(Map::new());
        for (path, tally) in leaves {
            if let Some(value) = tally.most_frequent() {
                insert_path(&mut tree, &path, value);
            }
        }
        spec.set_role(role, tree);
    }
    spec.set_paper(document.page.to_tree());

    log::info!(
        "derived requirements for {} roles",
        spec.roles().count()
    );
    spec
}

impl RequirementSpec {
    /// See [`derive_requirements`].
    pub fn derive_from(document: &Document) -> Self {
        derive_requirements(document)
    }
}

fn flatten(value: &Value, prefix: &str, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(child, &path, out);
            }
        }
        Value::Array(values) => {
            if let Some(first) = values.first() {
                out.push((prefix.to_string(), first.clone()));
            }
        }
        other => out.push((prefix.to_string(), other.clone())),
    }
}

fn insert_path(tree: &mut Value, path: &str, value: Value) {
    let keys: Vec<&str> = path.split('.').collect();
    insert_keys(tree, &keys, value);
}

fn insert_keys(tree: &mut Value, keys: &[&str], value: Value) {
    let Value::Object(map) = tree else {
        return;
    };
    match keys {
        [] => {}
        [last] => {
            map.insert(last.to_string(), value);
        }
        [first, rest @ ..] => {
            let child = map
                .entry(first.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            insert_keys(child, rest, value);
        }
    }
}

//! Part relationships (`_rels/*.rels`).

use super::xml::{XmlDocument, XmlElement};
use std::collections::HashMap;

/// Namespace of `.rels` parts.
pub const RELS_NAMESPACE: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Relationship type for embedded images.
pub const IMAGE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// Relationship type for the style definitions part.
pub const STYLES_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// Relationship type from the package root to the main document.
pub const OFFICE_DOCUMENT_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// A single relationship entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    /// True for `TargetMode="External"`
    pub external: bool,
}

/// Relationships of one part, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    by_id: HashMap<String, Relationship>,
    order: Vec<String>,
}

impl Relationships {
    /// Read relationships from a parsed `.rels` part.
    pub fn from_xml(doc: &XmlDocument) -> Self {
        let mut rels = Self::default();
        for rel in doc.root.children_named("Relationship") {
            let (Some(id), Some(target)) = (rel.attr("Id"), rel.attr("Target")) else {
                continue;
            };
            rels.insert(Relationship {
                id: id.to_string(),
                rel_type: rel.attr("Type").unwrap_or_default().to_string(),
                target: target.to_string(),
                external: rel.attr("TargetMode") == Some("External"),
            });
        }
        rels
    }

    fn insert(&mut self, rel: Relationship) {
        if !self.by_id.contains_key(&rel.id) {
            self.order.push(rel.id.clone());
        }
        self.by_id.insert(rel.id.clone(), rel);
    }

    /// Add an internal relationship under the next free `rIdN` and return its id.
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        let mut next = self.by_id.len() + 1;
        while self.by_id.contains_key(&format!("rId{}", next)) {
            next += 1;
        }
        let id = format!("rId{}", next);
        self.insert(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            external: false,
        });
        id
    }

    /// Serialize as a `.rels` part, in insertion order.
    pub fn to_xml(&self) -> XmlDocument {
        let mut root = XmlElement::new("Relationships").with_attr("xmlns", RELS_NAMESPACE);
        for rel in self.order.iter().filter_map(|id| self.by_id.get(id)) {
            let mut element = XmlElement::new("Relationship")
                .with_attr("Id", rel.id.as_str())
                .with_attr("Type", rel.rel_type.as_str())
                .with_attr("Target", rel.target.as_str());
            if rel.external {
                element.set_attr("TargetMode", "External");
            }
            root = root.with_child(element);
        }
        XmlDocument::new(root)
    }

    /// Look up a relationship by id.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// Package entry name a relationship points to, relative to `base_dir`.
    pub fn target_part(&self, id: &str, base_dir: &str) -> Option<String> {
        let rel = self.get(id)?;
        if rel.external {
            return None;
        }
        Some(resolve_target(base_dir, &rel.target))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Resolve a relationship target against the directory of its source part.
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

//! Requirement specifications.
//!
//! A requirement file is a JSON object keyed by role label, plus a `paper`
//! key for page settings:
//!
//! ```json
//! {
//!   "body": {
//!     "fonts": { "zh_family": "宋体", "en_family": "Times New Roman", "size": "小四" },
//!     "paragraph_format": {
//!       "alignment": "justify",
//!       "line_spacing": "1.5",
//!       "indentation": { "first_line": "2 characters" }
//!     }
//!   },
//!   "paper": { "size": "A4", "margins": { "top": "2.5cm", "left": "3cm" } }
//! }
//! ```
//!
//! Leaves are strings with unit suffixes, numbers or booleans. The literal
//! `"unknown"` places no constraint.

use super::role::ParagraphRole;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Key holding page-level requirements.
pub const PAPER_KEY: &str = "paper";
/// Older files name the page-level subtree `cover`.
const PAPER_KEY_ALIAS: &str = "cover";

/// Nested per-role requirements plus a page-level subtree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct RequirementSpec {
    roles: BTreeMap<ParagraphRole, Value>,
    paper: Option<Value>,
}

impl RequirementSpec {
    /// Create an empty specification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Load from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Build from a parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(Error::InvalidRequirement(
                "top level must be a JSON object".to_string(),
            ));
        };

        let mut spec = RequirementSpec::new();
        for (key, subtree) in map {
            if key == PAPER_KEY || (key == PAPER_KEY_ALIAS && spec.paper.is_none()) {
                if !subtree.is_object() {
                    return Err(Error::InvalidRequirement(format!(
                        "'{}' must be an object",
                        key
                    )));
                }
                spec.paper = Some(subtree);
                continue;
            }

            match ParagraphRole::from_label(&key) {
                Some(role) => {
                    if !subtree.is_object() {
                        return Err(Error::InvalidRequirement(format!(
                            "requirements for '{}' must be an object",
                            key
                        )));
                    }
                    spec.roles.insert(role, subtree);
                }
                _ => log::warn!("ignoring unknown requirement key '{}'", key),
            }
        }
        Ok(spec)
    }

    /// Requirement subtree for a role.
    pub fn role(&self, role: ParagraphRole) -> Option<&Value> {
        self.roles.get(&role)
    }

    /// Page-level subtree.
    pub fn paper(&self) -> Option<&Value> {
        self.paper.as_ref()
    }

    /// Set the subtree for a role.
    pub fn set_role(&mut self, role: ParagraphRole, requirements: Value) {
        self.roles.insert(role, requirements);
    }

    /// Set the page-level subtree.
    pub fn set_paper(&mut self, paper: Value) {
        self.paper = Some(paper);
    }

    /// Iterate over roles with requirements.
    pub fn roles(&self) -> impl Iterator<Item = (ParagraphRole, &Value)> {
        self.roles.iter().map(|(r, v)| (*r, v))
    }

    /// Check if nothing is required.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty() && self.paper.is_none()
    }

    /// JSON form of the specification.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for (role, subtree) in &self.roles {
            map.insert(role.label().to_string(), subtree.clone());
        }
        if let Some(paper) = &self.paper {
            map.insert(PAPER_KEY.to_string(), paper.clone());
        }
        Value::Object(map)
    }

    /// Pretty JSON text.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_value())?)
    }
}

impl TryFrom<Value> for RequirementSpec {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        RequirementSpec::from_value(value)
    }
}

impl From<RequirementSpec> for Value {
    fn from(spec: RequirementSpec) -> Self {
        spec.to_value()
    }
}

/// Whether a requirement leaf places no constraint.
pub fn is_unconstrained(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => {
            let s = s.trim();
            s.is_empty() || s.eq_ignore_ascii_case("unknown") || s == "未知"
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_roles_and_paper() {
        let spec = RequirementSpec::from_json_str(
            r#"{
                "body": {"fonts": {"size": "12pt"}},
                "abstract_content_zh": {"paragraph_format": {"alignment": "left"}},
                "paper": {"size": "A4"},
                "mystery": {}
            }"#,
        )
        .unwrap();

        assert!(spec.role(ParagraphRole::Body).is_some());
        assert_eq!(
            spec.role(ParagraphRole::AbstractContentZh).unwrap()["paragraph_format"]["alignment"],
            "left"
        );
        assert_eq!(spec.paper().unwrap()["size"], "A4");
        assert_eq!(spec.roles().count(), 2);
    }

    #[test]
    fn test_cover_alias() {
        let spec = RequirementSpec::from_value(json!({"cover": {"size": "A3"}})).unwrap();
        assert_eq!(spec.paper().unwrap()["size"], "A3");
    }

    #[test]
    fn test_invalid_shapes() {
        assert!(matches!(
            RequirementSpec::from_value(json!([1, 2])),
            Err(Error::InvalidRequirement(_))
        ));
        assert!(matches!(
            RequirementSpec::from_value(json!({"body": "12pt"})),
            Err(Error::InvalidRequirement(_))
        ));
        assert!(RequirementSpec::from_json_str("{oops").is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let spec = RequirementSpec::from_value(json!({
            "heading1": {"fonts": {"bold": true}},
            "paper": {"orientation": "portrait"}
        }))
        .unwrap();
        let text = serde_json::to_string(&spec).unwrap();
        let back: RequirementSpec = serde_json::from_str(&text).unwrap();
        assert_eq!(spec, back);
    }

    #[test]
    fn test_unconstrained_values() {
        assert!(is_unconstrained(&json!("Unknown")));
        assert!(is_unconstrained(&json!(null)));
        assert!(is_unconstrained(&json!("")));
        assert!(!is_unconstrained(&json!("12pt")));
        assert!(!is_unconstrained(&json!(false)));
    }
}

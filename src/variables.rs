//! Variable data model.
//!
//! The raw side mirrors what the host design tool hands us: a flat table of
//! variables keyed by stable id, with aliases stored as typed references
//! rather than pointers. The formatted side (`Variable`, `ModeValue`,
//! `VariableCollection`) is what the UI and the token exporter consume.

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Collections whose name starts with this marker are kept out of the export.
pub const HIDDEN_COLLECTION_PREFIX: char = '_';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VariableType {
    Float,
    String,
    Boolean,
    Color,
}

impl VariableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableType::Float => "FLOAT",
            VariableType::String => "STRING",
            VariableType::Boolean => "BOOLEAN",
            VariableType::Color => "COLOR",
        }
    }
}

/// A raw per-mode value as delivered by the host.
///
/// Channel floats for colors are in [0, 1]. Aliases reference another
/// variable by id and are resolved by [`crate::resolve::AliasResolver`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RawValue {
    Color {
        r: f64,
        g: f64,
        b: f64,
        #[serde(default = "default_alpha")]
        a: f64,
    },
    Number {
        value: f64,
    },
    Text {
        value: String,
    },
    Boolean {
        value: bool,
    },
    Alias {
        #[serde(rename = "targetId")]
        target_id: String,
    },
}

fn default_alpha() -> f64 {
    1.0
}

impl RawValue {
    pub fn is_alias(&self) -> bool {
        matches!(self, RawValue::Alias { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVariable {
    pub id: String,
    /// Path-like name, segments separated by "/".
    pub name: String,
    #[serde(rename = "type")]
    pub ty: VariableType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hidden_from_publishing: bool,
    /// Externally published variables are excluded before normalization.
    #[serde(default)]
    pub remote: bool,
    /// Per-mode raw values, keyed by mode name.
    #[serde(default)]
    pub values_by_mode: BTreeMap<String, RawValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCollection {
    pub id: String,
    pub name: String,
    /// Ordered list of mode names.
    pub modes: Vec<String>,
    pub variable_ids: Vec<String>,
}

/// Read access to the host's variable graph.
///
/// Injected into the normalizer and resolver so tests can supply a fake in
/// place of the live host bridge.
pub trait VariableSource {
    fn collections(&self) -> &[RawCollection];
    fn variable(&self, id: &str) -> Option<&RawVariable>;
    /// Style table published alongside the variables, already token-shaped.
    /// Empty object when the host exposes none.
    fn styles(&self) -> Value {
        empty_styles()
    }
}

fn empty_styles() -> Value {
    Value::Object(serde_json::Map::new())
}

/// One snapshot of the host's variable graph, serialized over the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDocument {
    #[serde(default)]
    pub collections: Vec<RawCollection>,
    #[serde(default)]
    pub variables: BTreeMap<String, RawVariable>,
    #[serde(default = "empty_styles")]
    pub styles: Value,
}

impl Default for VariableDocument {
    fn default() -> Self {
        Self {
            collections: Vec::new(),
            variables: BTreeMap::new(),
            styles: empty_styles(),
        }
    }
}

impl VariableDocument {
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let content = fs::read_to_string(path)?;
        let document = serde_json::from_str(&content)?;
        Ok(document)
    }
}

impl VariableSource for VariableDocument {
    fn collections(&self) -> &[RawCollection] {
        &self.collections
    }

    fn variable(&self, id: &str) -> Option<&RawVariable> {
        self.variables.get(id)
    }

    fn styles(&self) -> Value {
        self.styles.clone()
    }
}

/// A formatted per-mode value.
///
/// For aliases, `resolved_value` and `resolved_name` reflect the terminal
/// non-alias value at the end of the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeValue {
    pub raw: RawValue,
    pub display_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_name: Option<String>,
    #[serde(rename = "type")]
    pub ty: VariableType,
}

/// One variable formatted across all modes of its owning collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: VariableType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hidden: bool,
    pub modes: BTreeMap<String, ModeValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableCollection {
    pub name: String,
    pub modes: Vec<String>,
    pub variables: Vec<Variable>,
}

impl VariableCollection {
    /// Hidden collections stay visible in the UI but never reach the export.
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with(HIDDEN_COLLECTION_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_value_alias_roundtrip() {
        let json = r#"{"kind":"alias","targetId":"VariableID:1:23"}"#;
        let value: RawValue = serde_json::from_str(json).expect("deserialize");
        assert_eq!(
            value,
            RawValue::Alias {
                target_id: "VariableID:1:23".to_string()
            }
        );
        assert!(value.is_alias());
        assert_eq!(serde_json::to_string(&value).expect("serialize"), json);
    }

    #[test]
    fn color_alpha_defaults_to_opaque() {
        let value: RawValue =
            serde_json::from_str(r#"{"kind":"color","r":1.0,"g":0.5,"b":0.0}"#).expect("color");
        match value {
            RawValue::Color { a, .. } => assert_eq!(a, 1.0),
            other => panic!("expected color, got {other:?}"),
        }
    }

    #[test]
    fn document_deserialize() {
        let json = r#"
        {
            "collections": [
                {"id": "c1", "name": "spacing", "modes": ["Default"], "variableIds": ["v1"]}
            ],
            "variables": {
                "v1": {
                    "id": "v1",
                    "name": "sm",
                    "type": "FLOAT",
                    "valuesByMode": {"Default": {"kind": "number", "value": 4.0}}
                }
            }
        }
        "#;

        let document: VariableDocument = serde_json::from_str(json).expect("deserialize");
        assert_eq!(document.collections.len(), 1);
        let variable = document.variable("v1").expect("variable");
        assert_eq!(variable.ty, VariableType::Float);
        assert!(!variable.remote);
        assert!(document.variable("v2").is_none());

        // A document without a styles table reads back as an empty object.
        assert_eq!(document.styles(), serde_json::json!({}));
    }

    #[test]
    fn styles_table_is_carried_through() {
        let json = r##"
        {
            "styles": {
                "color/brand": {"$value": "#1a73e8", "$type": "COLOR"}
            }
        }
        "##;

        let document: VariableDocument = serde_json::from_str(json).expect("deserialize");
        assert_eq!(document.styles()["color/brand"]["$value"], "#1a73e8");
    }

    #[test]
    fn hidden_collection_marker() {
        let collection = VariableCollection {
            name: "_internal".to_string(),
            modes: vec!["Default".to_string()],
            variables: vec![],
        };
        assert!(collection.is_hidden());
    }
}

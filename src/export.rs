//! Fold formatted collections into the design-tokens export tree.

use crate::variables::{ModeValue, Variable, VariableCollection};
use serde_json::{Map, Value};

/// Build the nested export object.
///
/// Hidden collections (underscore prefix) and hidden variables are left out.
/// A collection with more than one mode fans out into one sub-object per
/// mode; a single-mode collection emits its token leaves directly under the
/// collection name. Leaves are keyed by the variable's full path, flat.
pub fn export_tokens(collections: &[VariableCollection]) -> Value {
    let mut root = Map::new();

    for collection in collections {
        if collection.is_hidden() {
            continue;
        }

        let visible: Vec<&Variable> = collection
            .variables
            .iter()
            .filter(|variable| !variable.hidden)
            .collect();

        if collection.modes.len() > 1 {
            let mut by_mode = Map::new();
            for mode in &collection.modes {
                let mut leaves = Map::new();
                for variable in &visible {
                    if let Some(value) = variable.modes.get(mode) {
                        leaves.insert(variable.name.clone(), token_leaf(variable, value));
                    }
                }
                by_mode.insert(mode.clone(), Value::Object(leaves));
            }
            root.insert(collection.name.clone(), Value::Object(by_mode));
        } else {
            let mut leaves = Map::new();
            for variable in &visible {
                if let Some(value) = variable.modes.values().next() {
                    leaves.insert(variable.name.clone(), token_leaf(variable, value));
                }
            }
            root.insert(collection.name.clone(), Value::Object(leaves));
        }
    }

    Value::Object(root)
}

/// Serialize the export tree the way it is committed: pretty-printed, keys
/// sorted, byte-stable for identical inputs.
pub fn export_to_string(tokens: &Value) -> String {
    serde_json::to_string_pretty(tokens).unwrap_or_else(|_| "{}".to_string())
}

fn token_leaf(variable: &Variable, value: &ModeValue) -> Value {
    let mut leaf = Map::new();

    // Prefer the terminal resolved value (hex for colors) over the raw
    // display form.
    let token_value = value
        .resolved_value
        .clone()
        .unwrap_or_else(|| value.display_value.clone());
    leaf.insert("$value".to_string(), Value::String(token_value));
    leaf.insert(
        "$type".to_string(),
        Value::String(variable.ty.as_str().to_string()),
    );

    if !variable.description.is_empty() {
        leaf.insert(
            "$description".to_string(),
            Value::String(variable.description.clone()),
        );
    }
    if let Some(resolved_from) = value.resolved_name.as_deref() {
        if !resolved_from.is_empty() {
            leaf.insert(
                "$resolvedFrom".to_string(),
                Value::String(resolved_from.to_string()),
            );
        }
    }

    Value::Object(leaf)
}

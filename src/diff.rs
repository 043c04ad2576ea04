//! Leaf-level diffing of two design-token documents.
//!
//! Both documents are flattened into path-keyed leaf maps, compared, and the
//! changes rendered as human-readable diff text (`@ path` / `-` / `+`
//! blocks). Output ordering follows sorted path strings, so the text is
//! reproducible for identical inputs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Token properties tracked by the diff (without their `$` prefix).
const TOKEN_PROPERTIES: [&str; 3] = ["value", "description", "type"];

/// Marker prepended to hex color values so the UI can render a swatch.
pub const COLOR_SWATCH_MARKER: char = '\u{25a0}'; // ■

/// One leaf-level change. A `None` on either side signals an add or remove.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffChange {
    pub path: Vec<String>,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

/// Compute the minimal set of changed, added, and removed token leaves
/// between two JSON documents, sorted by path.
pub fn diff(old_json: &str, new_json: &str) -> Result<Vec<DiffChange>, serde_json::Error> {
    let old: Value = serde_json::from_str(old_json)?;
    let new: Value = serde_json::from_str(new_json)?;

    let old_leaves = flatten_tokens(&old);
    let new_leaves = flatten_tokens(&new);

    let paths: BTreeSet<&String> = old_leaves.keys().chain(new_leaves.keys()).collect();
    let mut changes = Vec::new();

    for path in paths {
        let old_value = old_leaves.get(path);
        let new_value = new_leaves.get(path);
        if canonical(old_value) == canonical(new_value) {
            continue;
        }
        changes.push(DiffChange {
            path: path.split('/').map(str::to_string).collect(),
            old_value: old_value.cloned(),
            new_value: new_value.cloned(),
        });
    }

    Ok(changes)
}

/// Walk a token document and record every leaf property under a synthetic
/// `<ancestorPath>/<property>` key. An object carrying `$value` or `$type`
/// is a token leaf; everything else is traversed.
fn flatten_tokens(document: &Value) -> BTreeMap<String, Value> {
    let mut leaves = BTreeMap::new();
    traverse(document, &mut Vec::new(), &mut leaves);
    leaves
}

fn traverse(current: &Value, path: &mut Vec<String>, leaves: &mut BTreeMap<String, Value>) {
    match current {
        Value::Object(map) => {
            if map.contains_key("$value") || map.contains_key("$type") {
                for property in TOKEN_PROPERTIES {
                    if let Some(value) = map.get(&format!("${property}")) {
                        path.push(property.to_string());
                        leaves.insert(path.join("/"), value.clone());
                        path.pop();
                    }
                }
                return;
            }
            for (key, value) in map {
                path.push(key.clone());
                traverse(value, path, leaves);
                path.pop();
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                path.push(index.to_string());
                traverse(value, path, leaves);
                path.pop();
            }
        }
        _ => {}
    }
}

fn canonical(value: Option<&Value>) -> Option<String> {
    value.map(|v| v.to_string())
}

/// Render changes as diff text: one block per change, blocks separated by a
/// blank line.
pub fn render_diff(changes: &[DiffChange]) -> String {
    if changes.is_empty() {
        return String::new();
    }

    let mut sorted: Vec<&DiffChange> = changes.iter().collect();
    sorted.sort_by_key(|change| change.path.join("/"));

    let blocks: Vec<String> = sorted
        .iter()
        .map(|change| {
            let path = change.path.join("/");
            let property = change.path.last().map(String::as_str).unwrap_or_default();
            let mut lines = vec![format!("@ {path}")];
            if let Some(old) = &change.old_value {
                lines.push(format!("- {}", render_value(property, old)));
            }
            if let Some(new) = &change.new_value {
                lines.push(format!("+ {}", render_value(property, new)));
            }
            lines.join("\n")
        })
        .collect();

    blocks.join("\n\n")
}

fn render_value(property: &str, value: &Value) -> String {
    match value {
        Value::String(s) => {
            if property == "value" && is_hex_color(s) {
                format!("{COLOR_SWATCH_MARKER} {s}")
            } else {
                s.clone()
            }
        }
        other => other.to_string(),
    }
}

fn is_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    matches!(digits.len(), 6 | 8) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

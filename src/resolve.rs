//! Alias indirection resolution.

use crate::error::ResolveError;
use crate::format::format_value;
use crate::variables::{RawValue, VariableSource, VariableType};
use std::collections::HashSet;

/// Terminal result of following an alias chain.
#[derive(Debug, Clone)]
pub struct ResolvedAlias {
    /// The terminal non-alias raw value.
    pub value: RawValue,
    /// Name of the variable the chain terminated at.
    pub name: String,
    pub ty: VariableType,
    /// Canonical display form of the terminal value (hex for colors).
    pub resolved_value: String,
}

pub struct AliasResolver<'a, S: VariableSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: VariableSource + ?Sized> AliasResolver<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Follow an alias-to-alias chain until a concrete value is reached.
    ///
    /// `mode` selects which of the target's per-mode values to read; a target
    /// that does not carry that mode contributes its first declared value
    /// instead (targets usually live in single-mode collections). A visited
    /// set turns a cyclic chain into [`ResolveError::CyclicAlias`] instead of
    /// unbounded recursion.
    pub fn resolve(&self, target_id: &str, mode: &str) -> Result<ResolvedAlias, ResolveError> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut chain: Vec<String> = Vec::new();
        let mut current = target_id.to_string();

        loop {
            if !visited.insert(current.clone()) {
                if let Some(repeat) = self.source.variable(&current) {
                    chain.push(repeat.name.clone());
                }
                return Err(ResolveError::CyclicAlias { chain });
            }

            let variable = self
                .source
                .variable(&current)
                .ok_or_else(|| ResolveError::UnknownVariable { id: current.clone() })?;
            chain.push(variable.name.clone());

            let value = variable
                .values_by_mode
                .get(mode)
                .or_else(|| variable.values_by_mode.values().next())
                .ok_or_else(|| ResolveError::MissingMode {
                    name: variable.name.clone(),
                    mode: mode.to_string(),
                })?;

            match value {
                RawValue::Alias { target_id } => {
                    current = target_id.clone();
                }
                terminal => {
                    return Ok(ResolvedAlias {
                        value: terminal.clone(),
                        name: variable.name.clone(),
                        ty: variable.ty,
                        resolved_value: format_value(terminal, variable.ty),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::{RawVariable, VariableDocument};
    use std::collections::BTreeMap;

    fn variable(id: &str, name: &str, ty: VariableType, value: RawValue) -> RawVariable {
        let mut values_by_mode = BTreeMap::new();
        values_by_mode.insert("Default".to_string(), value);
        RawVariable {
            id: id.to_string(),
            name: name.to_string(),
            ty,
            description: String::new(),
            hidden_from_publishing: false,
            remote: false,
            values_by_mode,
        }
    }

    fn document(variables: Vec<RawVariable>) -> VariableDocument {
        let mut document = VariableDocument::default();
        for v in variables {
            document.variables.insert(v.id.clone(), v);
        }
        document
    }

    #[test]
    fn three_hop_chain_resolves_to_terminal() {
        let document = document(vec![
            variable(
                "v1",
                "brand/primary",
                VariableType::Color,
                RawValue::Alias {
                    target_id: "v2".to_string(),
                },
            ),
            variable(
                "v2",
                "palette/blue",
                VariableType::Color,
                RawValue::Alias {
                    target_id: "v3".to_string(),
                },
            ),
            variable(
                "v3",
                "base/blue-500",
                VariableType::Color,
                RawValue::Color {
                    r: 0.0,
                    g: 0.0,
                    b: 1.0,
                    a: 1.0,
                },
            ),
        ]);

        let resolver = AliasResolver::new(&document);
        let resolved = resolver.resolve("v2", "Default").expect("resolve");
        // Resolving the first alias lands on the terminal variable's name
        // and value, not an intermediate hop.
        assert_eq!(resolved.name, "base/blue-500");
        assert_eq!(resolved.resolved_value, "#0000ff");
        assert_eq!(resolved.ty, VariableType::Color);
    }

    #[test]
    fn cycle_is_reported_not_recursed() {
        let document = document(vec![
            variable(
                "v1",
                "a",
                VariableType::Float,
                RawValue::Alias {
                    target_id: "v2".to_string(),
                },
            ),
            variable(
                "v2",
                "b",
                VariableType::Float,
                RawValue::Alias {
                    target_id: "v1".to_string(),
                },
            ),
        ]);

        let resolver = AliasResolver::new(&document);
        let err = resolver.resolve("v1", "Default").unwrap_err();
        match err {
            ResolveError::CyclicAlias { chain } => {
                assert_eq!(chain.first().map(String::as_str), Some("a"));
            }
            other => panic!("expected cycle error, got {other}"),
        }
    }

    #[test]
    fn deleted_target_is_a_resolution_failure() {
        let document = document(vec![variable(
            "v1",
            "a",
            VariableType::Float,
            RawValue::Alias {
                target_id: "gone".to_string(),
            },
        )]);

        let resolver = AliasResolver::new(&document);
        let err = resolver.resolve("v1", "Default").unwrap_err();
        assert!(matches!(err, ResolveError::UnknownVariable { id } if id == "gone"));
    }

    #[test]
    fn missing_mode_falls_back_to_first_value() {
        let document = document(vec![variable(
            "v1",
            "spacing/sm",
            VariableType::Float,
            RawValue::Number { value: 4.0 },
        )]);

        let resolver = AliasResolver::new(&document);
        let resolved = resolver.resolve("v1", "Dark").expect("fallback");
        assert_eq!(resolved.resolved_value, "4");
    }
}

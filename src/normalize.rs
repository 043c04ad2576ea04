//! Turn raw host variables into formatted, per-mode variable records.

use crate::error::ResolveError;
use crate::format::format_value;
use crate::resolve::AliasResolver;
use crate::variables::{
    ModeValue, RawCollection, RawValue, RawVariable, Variable, VariableCollection, VariableSource,
};
use std::collections::BTreeMap;

/// Format every collection in the source.
///
/// Remote (externally published) variables are excluded before
/// normalization; a variable whose resolution fails is logged and dropped so
/// one bad alias does not abort the whole export.
pub fn format_collections<S: VariableSource + ?Sized>(source: &S) -> Vec<VariableCollection> {
    source
        .collections()
        .iter()
        .map(|collection| format_collection(source, collection))
        .collect()
}

fn format_collection<S: VariableSource + ?Sized>(
    source: &S,
    collection: &RawCollection,
) -> VariableCollection {
    let mut variables = Vec::new();

    for id in &collection.variable_ids {
        let Some(raw) = source.variable(id) else {
            tracing::warn!(id = %id, collection = %collection.name, "variable missing from table, skipping");
            continue;
        };
        if raw.remote {
            continue;
        }

        match normalize_variable(source, raw, collection) {
            Ok(variable) => variables.push(variable),
            Err(err) => {
                tracing::warn!(name = %raw.name, %err, "skipping variable: resolution failed");
            }
        }
    }

    VariableCollection {
        name: collection.name.clone(),
        modes: collection.modes.clone(),
        variables,
    }
}

/// Normalize one variable across all modes of its owning collection.
pub fn normalize_variable<S: VariableSource + ?Sized>(
    source: &S,
    raw: &RawVariable,
    collection: &RawCollection,
) -> Result<Variable, ResolveError> {
    let resolver = AliasResolver::new(source);
    let mut modes = BTreeMap::new();

    for mode in &collection.modes {
        let Some(value) = raw.values_by_mode.get(mode) else {
            tracing::warn!(name = %raw.name, mode = %mode, "no value for mode, skipping mode");
            continue;
        };

        let mode_value = match value {
            RawValue::Alias { target_id } => {
                let resolved = resolver.resolve(target_id, mode)?;
                ModeValue {
                    raw: value.clone(),
                    display_value: resolved.resolved_value.clone(),
                    resolved_value: Some(resolved.resolved_value),
                    resolved_name: Some(resolved.name),
                    ty: raw.ty,
                }
            }
            concrete => ModeValue {
                raw: concrete.clone(),
                display_value: format_value(concrete, raw.ty),
                resolved_value: None,
                resolved_name: None,
                ty: raw.ty,
            },
        };

        modes.insert(mode.clone(), mode_value);
    }

    Ok(Variable {
        name: raw.name.clone(),
        ty: raw.ty,
        description: raw.description.clone(),
        hidden: raw.hidden_from_publishing,
        modes,
    })
}

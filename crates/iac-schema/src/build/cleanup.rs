//! Post-processing cleanup: remove schema models unreachable from the root
//! model, along with their mappings, then drop model-to-model mappings that
//! no longer lead anywhere.

use std::collections::{BTreeSet, VecDeque};

use iac_schema_models::{ApiResource, FieldMapping, MappingDefinition, ModelToModelMapping};
use tracing::debug;

use super::SchemaModels;
use crate::error::{Error, Result};

/// Remove models (and their mappings) not reachable from `root`, then
/// prune model-to-model mappings whose target SDK model has no direct
/// assignments left.
///
/// Reachability is a mark from the root, so unreachable cycles are
/// collected too.
///
/// # Errors
///
/// [`Error::DanglingReference`] if a retained field references a model that
/// does not exist; [`Error::SdkModelNotFound`] / [`Error::SdkFieldNotFound`]
/// if a model-to-model mapping names an unknown SDK model or field.
pub(crate) fn remove_unused_models_and_mappings(
    resource: &ApiResource,
    root: &str,
    models: &mut SchemaModels,
    mappings: &mut MappingDefinition,
) -> Result<()> {
    let reachable = reachable_models(root, models)?;

    let unused: Vec<String> = models
        .keys()
        .filter(|name| !reachable.contains(*name))
        .cloned()
        .collect();
    for name in &unused {
        debug!(model = %name, "removing unused model");
        models.remove(name);
    }
    mappings
        .fields
        .retain(|m| models.contains_key(m.schema_model_name()));

    remove_unused_model_to_model_mappings(resource, mappings)
}

/// Names of every model reachable from `root` through field references.
fn reachable_models(root: &str, models: &SchemaModels) -> Result<BTreeSet<String>> {
    let mut reachable = BTreeSet::new();
    let mut queue = VecDeque::new();
    if models.contains_key(root) {
        reachable.insert(root.to_string());
        queue.push_back(root.to_string());
    }

    while let Some(name) = queue.pop_front() {
        let Some(model) = models.get(&name) else {
            continue;
        };
        for (field_name, field) in &model.fields {
            let Some(target) = field.object_definition.innermost_reference() else {
                continue;
            };
            if !models.contains_key(target) {
                return Err(Error::DanglingReference {
                    model: name.clone(),
                    field: field_name.clone(),
                    reference: target.to_string(),
                });
            }
            if reachable.insert(target.to_string()) {
                queue.push_back(target.to_string());
            }
        }
    }

    Ok(reachable)
}

/// Drop model-to-model mappings whose associated SDK model no longer has any
/// direct assignment pointing at it.
fn remove_unused_model_to_model_mappings(
    resource: &ApiResource,
    mappings: &mut MappingDefinition,
) -> Result<()> {
    let assigned_sdk_models: BTreeSet<String> = mappings
        .fields
        .iter()
        .filter_map(|m| match m {
            FieldMapping::DirectAssignment(direct) => Some(direct.sdk_model_name.clone()),
            FieldMapping::ModelToModel(_) => None,
        })
        .collect();

    let mut kept = Vec::with_capacity(mappings.fields.len());
    for mapping in mappings.fields.drain(..) {
        let keep = match &mapping {
            FieldMapping::DirectAssignment(_) => true,
            FieldMapping::ModelToModel(m) => {
                model_to_model_is_used(resource, m, &assigned_sdk_models)?
            }
        };
        if keep {
            kept.push(mapping);
        } else {
            debug!(%mapping, "removing unused model-to-model mapping");
        }
    }
    mappings.fields = kept;
    Ok(())
}

fn model_to_model_is_used(
    resource: &ApiResource,
    mapping: &ModelToModelMapping,
    assigned_sdk_models: &BTreeSet<String>,
) -> Result<bool> {
    let sdk_model = resource
        .models
        .get(&mapping.sdk_model_name)
        .ok_or_else(|| Error::SdkModelNotFound {
            model: mapping.sdk_model_name.clone(),
        })?;
    let sdk_field = sdk_model
        .fields
        .get(&mapping.sdk_field_name)
        .ok_or_else(|| Error::SdkFieldNotFound {
            model: mapping.sdk_model_name.clone(),
            field: mapping.sdk_field_name.clone(),
        })?;

    // a field that isn't a reference can't lead to further assignments
    let Some(associated) = sdk_field.object_definition.innermost_reference() else {
        return Ok(true);
    };
    Ok(assigned_sdk_models.contains(associated))
}

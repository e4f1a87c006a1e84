//! The root schema model.
//!
//! Three groups of fields make up the root model:
//!
//! - **envelope**: fields of the payload models themselves (`Location`,
//!   `Tags`, `Sku`, ...), minus `Id`/`Name`/`Type` and the `properties` block
//! - **resource ID**: see [`super::resource_id`]
//! - **properties**: the fields of each payload's `properties` model, lifted
//!   onto the root, with a model-to-model mapping per payload
//!
//! A field present in several payloads is merged: it is required if the
//! create payload requires it, optional if create or update accept it, and
//! computed otherwise. Its type comes from read, then create, then update.

use std::collections::BTreeSet;
use std::ops::ControlFlow;

use iac_schema_models::{
    ApiField, ApiModel, ApiResource, FieldMapping, MappingDefinition, SchemaModel,
};
use tracing::{debug, trace};

use super::fields::{insert_field, schema_field};
use super::payloads::{find_create_read_update_payloads, OperationPayloads, PayloadKind};
use super::resolve::{merge_discovered, DiscoveredModels, ModelResolver};
use super::{proceed, resource_id, ModelParseResult, ResourceBuildInfo, ResourceBuildInput, SkipReason};
use crate::error::{Error, Result, ResultExt};
use crate::matchers::MatcherRegistry;
use crate::normalize::{object_definition_should_be_skipped, Normalizer};

/// Payload fields that never become envelope fields.
const ENVELOPE_EXCLUDED: &[&str] = &["Id", "Name", "Type", "Properties"];

fn is_envelope_excluded(field_name: &str) -> bool {
    ENVELOPE_EXCLUDED
        .iter()
        .any(|excluded| excluded.eq_ignore_ascii_case(field_name))
}

/// One model contributing fields to the root model.
#[derive(Debug, Clone, Copy)]
struct FieldSource<'a> {
    kind: PayloadKind,
    model_name: &'a str,
    model: &'a ApiModel,
}

/// Build the root schema model and discover the nested API models it needs.
pub(crate) fn schema_from_top_level_model<'a>(
    resource: &'a ApiResource,
    matchers: &MatcherRegistry,
    normalizer: &Normalizer<'_>,
    input: &ResourceBuildInput,
    info: &ResourceBuildInfo,
    mappings: &mut MappingDefinition,
) -> Result<ControlFlow<SkipReason, ModelParseResult<'a>>> {
    let payloads = proceed!(find_create_read_update_payloads(resource, input));
    let root = input.schema_model_name.as_str();
    let mut model = SchemaModel::default();

    let envelope: Vec<FieldSource<'a>> = payloads
        .all()
        .map(|p| FieldSource {
            kind: p.kind,
            model_name: p.model_name,
            model: p.model,
        })
        .collect();
    add_merged_fields(normalizer, root, &envelope, is_envelope_excluded, info, &mut model, mappings)
        .context(|| "retrieving top-level fields")?;

    let id = resource
        .resource_ids
        .get(&input.resource_id_name)
        .ok_or_else(|| Error::ResourceIdNotFound {
            name: input.resource_id_name.clone(),
        })?;
    debug!(resource_id = id.display_value(), "adding resource ID fields");
    for (field_name, field) in resource_id::fields_within_resource_id(id, mappings) {
        let segment = mappings
            .resource_id
            .iter()
            .find(|m| m.schema_field_name == field_name)
            .map_or_else(|| field_name.clone(), |m| m.segment_name.clone());
        insert_field(&mut model, root, field_name, &segment, field, mappings)?;
    }

    let properties: Vec<FieldSource<'a>> = payloads
        .all()
        .filter_map(|p| {
            p.properties.map(|props| FieldSource {
                kind: p.kind,
                model_name: props.model_name,
                model: props.model,
            })
        })
        .collect();
    for payload in payloads.all() {
        if let Some(props) = payload.properties {
            push_unique(
                mappings,
                FieldMapping::model_to_model(root, payload.model_name, props.field_name),
            );
        }
    }
    add_merged_fields(normalizer, root, &properties, |_| false, info, &mut model, mappings)
        .context(|| "retrieving fields within the properties model")?;

    let nested_models = proceed!(nested_models_for(resource, matchers, &payloads)?);

    Ok(ControlFlow::Continue(ModelParseResult {
        model,
        nested_models,
    }))
}

/// Every API model reachable from the envelope and properties fields.
fn nested_models_for<'a>(
    resource: &'a ApiResource,
    matchers: &MatcherRegistry,
    payloads: &OperationPayloads<'a>,
) -> Result<ControlFlow<SkipReason, DiscoveredModels<'a>>> {
    let resolver = ModelResolver::new(resource, matchers);
    let mut all_models = DiscoveredModels::new();

    for payload in payloads.all() {
        let envelope_fields = payload
            .model
            .fields
            .iter()
            .filter(|(name, _)| !is_envelope_excluded(name));
        let found = proceed!(resolver
            .models_within_fields(envelope_fields)
            .context(|| format!("identifying models within payload {:?}", payload.model_name))?);
        merge_discovered(&mut all_models, found)?;

        if let Some(props) = payload.properties {
            let found = proceed!(resolver
                .models_within_fields(&props.model.fields)
                .context(|| format!("identifying models within payload {:?}", props.model_name))?);
            merge_discovered(&mut all_models, found)?;
        }
    }

    Ok(ControlFlow::Continue(all_models))
}

/// Add one root field per distinct field name across `sources`, plus one
/// direct assignment per distinct source model holding it.
fn add_merged_fields(
    normalizer: &Normalizer<'_>,
    root: &str,
    sources: &[FieldSource<'_>],
    exclude: impl Fn(&str) -> bool,
    info: &ResourceBuildInfo,
    model: &mut SchemaModel,
    mappings: &mut MappingDefinition,
) -> Result<()> {
    let field_names: BTreeSet<&String> = sources.iter().flat_map(|s| s.model.fields.keys()).collect();

    for field_name in field_names {
        if exclude(field_name) {
            continue;
        }

        let present: Vec<(&FieldSource<'_>, &ApiField)> = sources
            .iter()
            .filter_map(|s| s.model.fields.get(field_name).map(|f| (s, f)))
            .collect();
        let from = |kind: PayloadKind| {
            present
                .iter()
                .find(|(source, _)| source.kind == kind)
                .map(|(_, field)| *field)
        };
        let create = from(PayloadKind::Create);
        let update = from(PayloadKind::Update);
        let Some(definition) = from(PayloadKind::Read).or(create).or(update) else {
            continue;
        };
        if object_definition_should_be_skipped(&definition.object_definition) {
            trace!(field = %field_name, "skipping unsupported field");
            continue;
        }

        let required = create.is_some_and(|f| f.required);
        let optional = !required
            && (create.is_some_and(|f| f.optional)
                || update.is_some_and(|f| f.required || f.optional));

        let Some(field) = schema_field(normalizer, field_name, definition, required, optional, info)
            .context(|| format!("building field {field_name:?}"))?
        else {
            continue;
        };

        let schema_field_name = info.schema_field_name(field_name);
        insert_field(model, root, schema_field_name.clone(), field_name, field, mappings)?;
        let mut seen = BTreeSet::new();
        for (source, _) in &present {
            if seen.insert(source.model_name) {
                mappings.fields.push(FieldMapping::direct(
                    root,
                    &schema_field_name,
                    source.model_name,
                    field_name,
                ));
            }
        }
    }

    Ok(())
}

fn push_unique(mappings: &mut MappingDefinition, mapping: FieldMapping) {
    if !mappings.fields.contains(&mapping) {
        mappings.fields.push(mapping);
    }
}

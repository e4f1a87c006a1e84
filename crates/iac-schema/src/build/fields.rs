//! Schema fields for nested models.

use iac_schema_models::{ApiField, ApiModel, FieldMapping, MappingDefinition, SchemaField, SchemaModel};
use tracing::trace;

use super::ResourceBuildInfo;
use crate::error::{Error, Result, ResultExt};
use crate::normalize::{object_definition_should_be_skipped, Normalizer};

/// Build the schema field for one SDK field with the given flags.
///
/// `None` when the field's kind has no schema representation.
pub(crate) fn schema_field(
    normalizer: &Normalizer<'_>,
    sdk_field_name: &str,
    sdk_field: &ApiField,
    required: bool,
    optional: bool,
    info: &ResourceBuildInfo,
) -> Result<Option<SchemaField>> {
    let Some(definition) = normalizer.field_definition(sdk_field)? else {
        return Ok(None);
    };

    let mut field = SchemaField::new(definition, required, optional);
    field.validation = normalizer.validation(&sdk_field.object_definition);
    field.description = info
        .description(sdk_field_name)
        .or_else(|| sdk_field.description.clone());
    Ok(Some(field))
}

/// Build the schema model for a nested SDK model, one schema field (and
/// one direct assignment) per supported SDK field.
///
/// Flags come straight from the SDK field.
pub(crate) fn build_nested_model(
    normalizer: &Normalizer<'_>,
    schema_model_name: &str,
    sdk_model_name: &str,
    sdk_model: &ApiModel,
    info: &ResourceBuildInfo,
    mappings: &mut MappingDefinition,
) -> Result<SchemaModel> {
    let mut model = SchemaModel::default();

    for (sdk_field_name, sdk_field) in &sdk_model.fields {
        if object_definition_should_be_skipped(&sdk_field.object_definition) {
            trace!(field = %sdk_field_name, "skipping unsupported field");
            continue;
        }

        let Some(field) = schema_field(
            normalizer,
            sdk_field_name,
            sdk_field,
            sdk_field.required,
            sdk_field.optional,
            info,
        )
        .context(|| format!("building field {sdk_field_name:?}"))?
        else {
            continue;
        };

        let schema_field_name = info.schema_field_name(sdk_field_name);
        insert_field(
            &mut model,
            schema_model_name,
            schema_field_name.clone(),
            sdk_field_name,
            field,
            mappings,
        )?;
        mappings.fields.push(FieldMapping::direct(
            schema_model_name,
            &schema_field_name,
            sdk_model_name,
            sdk_field_name,
        ));
    }

    Ok(model)
}

/// Insert `field` as `schema_field_name`, rejecting a name already taken by
/// another SDK field or resource ID segment.
///
/// Call before recording the new field's own mappings; the existing field's
/// source is looked up in `mappings`.
pub(crate) fn insert_field(
    model: &mut SchemaModel,
    schema_model_name: &str,
    schema_field_name: String,
    source: &str,
    field: SchemaField,
    mappings: &MappingDefinition,
) -> Result<()> {
    if model.fields.contains_key(&schema_field_name) {
        return Err(Error::DuplicateSchemaField {
            model: schema_model_name.to_string(),
            first: field_source(mappings, schema_model_name, &schema_field_name),
            field: schema_field_name,
            second: source.to_string(),
        });
    }
    model.fields.insert(schema_field_name, field);
    Ok(())
}

/// The SDK field (or resource ID segment) behind an existing schema field.
fn field_source(mappings: &MappingDefinition, schema_model_name: &str, schema_field_name: &str) -> String {
    let direct = mappings.fields.iter().find_map(|m| match m {
        FieldMapping::DirectAssignment(d)
            if d.schema_model_name == schema_model_name
                && d.schema_field_name == schema_field_name =>
        {
            Some(d.sdk_field_name.clone())
        }
        _ => None,
    });
    direct
        .or_else(|| {
            mappings
                .resource_id
                .iter()
                .find(|m| m.schema_field_name == schema_field_name)
                .map(|m| m.segment_name.clone())
        })
        .unwrap_or_else(|| schema_field_name.to_string())
}

#[cfg(test)]
mod tests {
    use iac_schema_models::{
        ApiObjectDefinition, ApiResource, ConstantDetails, ConstantFieldType, CustomFieldType,
        FieldValidation, SchemaObjectDefinition,
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::build::FieldOverride;
    use crate::matchers::MatcherRegistry;

    fn field(definition: ApiObjectDefinition, required: bool, optional: bool) -> ApiField {
        ApiField {
            json_name: String::new(),
            object_definition: definition,
            required,
            optional,
            description: Some("From the API.".to_string()),
        }
    }

    fn resource() -> ApiResource {
        let mut resource = ApiResource::default();
        resource.constants.insert(
            "Mode".to_string(),
            ConstantDetails {
                field_type: ConstantFieldType::String,
                values: [("Fast", "Fast"), ("Slow", "Slow")]
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
        );
        let mut rule = ApiModel::default();
        rule.fields.insert(
            "Mode".to_string(),
            field(ApiObjectDefinition::reference("Mode"), true, false),
        );
        rule.fields.insert(
            "Child".to_string(),
            field(ApiObjectDefinition::reference("Child"), false, true),
        );
        rule.fields.insert(
            "Etag".to_string(),
            field(ApiObjectDefinition::String, false, false),
        );
        rule.fields.insert(
            "Blob".to_string(),
            field(ApiObjectDefinition::RawFile, false, true),
        );
        resource.models.insert("Rule".to_string(), rule);
        resource
            .models
            .insert("Child".to_string(), ApiModel::default());
        resource
    }

    #[test]
    fn builds_fields_and_direct_mappings() {
        let resource = resource();
        let matchers = MatcherRegistry::empty();
        let normalizer = Normalizer::new(&resource, &matchers, "WidgetResource");
        let mut mappings = MappingDefinition::default();

        let model = build_nested_model(
            &normalizer,
            "WidgetResourceRule",
            "Rule",
            &resource.models["Rule"],
            &ResourceBuildInfo::default(),
            &mut mappings,
        )
        .unwrap();

        assert_eq!(
            model.fields.keys().collect::<Vec<_>>(),
            vec!["Child", "Etag", "Mode"]
        );

        let mode = &model.fields["Mode"];
        assert_eq!(mode.object_definition, SchemaObjectDefinition::String);
        assert!(mode.required && !mode.computed);
        assert_eq!(
            mode.validation,
            Some(FieldValidation::PossibleValues {
                values: vec!["Fast".to_string(), "Slow".to_string()]
            })
        );
        assert_eq!(
            model.fields["Child"].object_definition,
            SchemaObjectDefinition::reference("WidgetResourceChild")
        );
        assert!(model.fields["Etag"].computed);

        assert_eq!(
            mappings
                .fields
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            vec![
                "DirectAssignment WidgetResourceRule.Child <-> Rule.Child",
                "DirectAssignment WidgetResourceRule.Etag <-> Rule.Etag",
                "DirectAssignment WidgetResourceRule.Mode <-> Rule.Mode",
            ]
        );
    }

    #[test]
    fn overrides_rename_fields_and_mappings() {
        let resource = resource();
        let matchers = MatcherRegistry::empty();
        let normalizer = Normalizer::new(&resource, &matchers, "WidgetResource");
        let mut mappings = MappingDefinition::default();
        let info = ResourceBuildInfo {
            overrides: vec![FieldOverride {
                name: "Etag".to_string(),
                updated_name: Some("EntityTag".to_string()),
                description: Some("Overridden.".to_string()),
            }],
        };

        let model = build_nested_model(
            &normalizer,
            "WidgetResourceRule",
            "Rule",
            &resource.models["Rule"],
            &info,
            &mut mappings,
        )
        .unwrap();

        let renamed = &model.fields["EntityTag"];
        assert_eq!(renamed.description.as_deref(), Some("Overridden."));
        assert!(mappings
            .fields
            .contains(&FieldMapping::direct("WidgetResourceRule", "EntityTag", "Rule", "Etag")));
    }

    #[test]
    fn override_onto_existing_field_errors() {
        let resource = resource();
        let matchers = MatcherRegistry::empty();
        let normalizer = Normalizer::new(&resource, &matchers, "WidgetResource");
        let mut mappings = MappingDefinition::default();
        let info = ResourceBuildInfo {
            overrides: vec![FieldOverride {
                name: "Etag".to_string(),
                updated_name: Some("Mode".to_string()),
                description: None,
            }],
        };

        let err = build_nested_model(
            &normalizer,
            "WidgetResourceRule",
            "Rule",
            &resource.models["Rule"],
            &info,
            &mut mappings,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "schema field \"Mode\" in model \"WidgetResourceRule\" is produced by both \"Etag\" and \"Mode\""
        );
    }

    #[test]
    fn matched_fields_become_custom_types() {
        #[derive(Debug)]
        struct ChildMatcher;
        impl crate::matchers::CustomFieldMatcher for ChildMatcher {
            fn custom_field_type(&self) -> CustomFieldType {
                CustomFieldType::SystemAssignedIdentity
            }
            fn is_match(&self, definition: &ApiObjectDefinition, _: &ApiResource) -> bool {
                definition.innermost_reference() == Some("Child")
            }
        }

        let resource = resource();
        let matchers = MatcherRegistry::empty().register(ChildMatcher);
        let normalizer = Normalizer::new(&resource, &matchers, "WidgetResource");
        let mut mappings = MappingDefinition::default();

        let model = build_nested_model(
            &normalizer,
            "WidgetResourceRule",
            "Rule",
            &resource.models["Rule"],
            &ResourceBuildInfo::default(),
            &mut mappings,
        )
        .unwrap();

        assert_eq!(
            model.fields["Child"].object_definition,
            SchemaObjectDefinition::Custom {
                custom_type: CustomFieldType::SystemAssignedIdentity
            }
        );
    }
}

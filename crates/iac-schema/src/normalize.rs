//! API-side → schema-side object definition conversion.
//!
//! Every other stage goes through [`Normalizer`] so that model-name
//! prefixing, constant flattening and custom-type substitution happen in
//! exactly one place.

use iac_schema_models::{
    ApiField, ApiModel, ApiObjectDefinition, ApiResource, ConstantDetails, ConstantFieldType,
    FieldValidation, SchemaObjectDefinition,
};

use crate::error::{Error, Result};
use crate::matchers::MatcherRegistry;

/// What a reference name resolves to within an [`ApiResource`].
#[derive(Debug, Clone, Copy)]
pub(crate) enum ResolvedReference<'a> {
    /// A named constant.
    Constant(&'a ConstantDetails),
    /// A named model.
    Model(&'a ApiModel),
}

/// Resolve `name` against the constant and model tables.
///
/// # Errors
///
/// [`Error::ReferenceNotFound`] if the name is in neither table,
/// [`Error::AmbiguousReference`] if it is in both.
pub(crate) fn resolve_reference<'a>(
    resource: &'a ApiResource,
    name: &str,
) -> Result<ResolvedReference<'a>> {
    match (resource.constants.get(name), resource.models.get(name)) {
        (Some(_), Some(_)) => Err(Error::AmbiguousReference {
            name: name.to_string(),
        }),
        (Some(constant), None) => Ok(ResolvedReference::Constant(constant)),
        (None, Some(model)) => Ok(ResolvedReference::Model(model)),
        (None, None) => Err(Error::ReferenceNotFound {
            name: name.to_string(),
        }),
    }
}

/// Whether a field of this kind is dropped entirely (no schema field, no mapping).
pub(crate) fn object_definition_should_be_skipped(definition: &ApiObjectDefinition) -> bool {
    matches!(
        definition.innermost(),
        ApiObjectDefinition::RawFile
            | ApiObjectDefinition::RawObject
            | ApiObjectDefinition::SystemData
    )
}

/// Converts API field definitions into schema field definitions for one resource.
pub(crate) struct Normalizer<'a> {
    resource: &'a ApiResource,
    matchers: &'a MatcherRegistry,
    schema_model_name: &'a str,
}

impl<'a> Normalizer<'a> {
    pub(crate) fn new(
        resource: &'a ApiResource,
        matchers: &'a MatcherRegistry,
        schema_model_name: &'a str,
    ) -> Self {
        Self {
            resource,
            matchers,
            schema_model_name,
        }
    }

    /// Schema model name for a nested SDK model.
    ///
    /// Models are prefixed with the resource's schema model name to avoid
    /// conflicts where a model is reused across a package.
    pub(crate) fn nested_model_name(&self, sdk_model_name: &str) -> String {
        format!("{}{sdk_model_name}", self.schema_model_name)
    }

    /// Schema definition for a field: custom matchers first, then the
    /// generic structural conversion.
    ///
    /// Returns `None` for kinds that have no schema representation.
    pub(crate) fn field_definition(
        &self,
        field: &ApiField,
    ) -> Result<Option<SchemaObjectDefinition>> {
        if let Some(custom_type) = self.matchers.find_match(&field.object_definition, self.resource)
        {
            return Ok(Some(SchemaObjectDefinition::Custom { custom_type }));
        }
        self.convert(&field.object_definition)
    }

    /// Generic structural conversion.
    pub(crate) fn convert(
        &self,
        definition: &ApiObjectDefinition,
    ) -> Result<Option<SchemaObjectDefinition>> {
        let converted = match definition {
            ApiObjectDefinition::Boolean => SchemaObjectDefinition::Boolean,
            ApiObjectDefinition::Integer => SchemaObjectDefinition::Integer,
            ApiObjectDefinition::Float => SchemaObjectDefinition::Float,
            ApiObjectDefinition::String => SchemaObjectDefinition::String,
            ApiObjectDefinition::DateTime => SchemaObjectDefinition::DateTime,
            ApiObjectDefinition::Location => SchemaObjectDefinition::Location,
            ApiObjectDefinition::Tags => SchemaObjectDefinition::Tags,
            ApiObjectDefinition::List { nested_item } => {
                let Some(inner) = self.convert(nested_item)? else {
                    return Ok(None);
                };
                SchemaObjectDefinition::list(inner)
            }
            ApiObjectDefinition::Dictionary { nested_item } => {
                let Some(inner) = self.convert(nested_item)? else {
                    return Ok(None);
                };
                SchemaObjectDefinition::dictionary(inner)
            }
            ApiObjectDefinition::Reference { reference_name } => {
                match resolve_reference(self.resource, reference_name)? {
                    ResolvedReference::Constant(constant) => match constant.field_type {
                        ConstantFieldType::String => SchemaObjectDefinition::String,
                        ConstantFieldType::Integer => SchemaObjectDefinition::Integer,
                        ConstantFieldType::Float => SchemaObjectDefinition::Float,
                    },
                    ResolvedReference::Model(_) => {
                        SchemaObjectDefinition::reference(&self.nested_model_name(reference_name))
                    }
                }
            }
            ApiObjectDefinition::RawFile
            | ApiObjectDefinition::RawObject
            | ApiObjectDefinition::SystemData => return Ok(None),
        };
        Ok(Some(converted))
    }

    /// Validation derived from the field's constraints: a reference to a
    /// constant yields its possible values. No constraint → no rule.
    pub(crate) fn validation(&self, definition: &ApiObjectDefinition) -> Option<FieldValidation> {
        let name = definition.innermost_reference()?;
        let constant = self.resource.constants.get(name)?;
        let mut values: Vec<String> = constant.values.values().cloned().collect();
        values.sort();
        values.dedup();
        Some(FieldValidation::PossibleValues { values })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn resource() -> ApiResource {
        let mut resource = ApiResource::default();
        resource.constants.insert(
            "Tier".to_string(),
            ConstantDetails {
                field_type: ConstantFieldType::String,
                values: BTreeMap::from([
                    ("Premium".to_string(), "Premium".to_string()),
                    ("Basic".to_string(), "Basic".to_string()),
                ]),
            },
        );
        resource.constants.insert(
            "Capacity".to_string(),
            ConstantDetails {
                field_type: ConstantFieldType::Integer,
                values: BTreeMap::from([("One".to_string(), "1".to_string())]),
            },
        );
        resource
            .models
            .insert("Sku".to_string(), ApiModel::default());
        resource
    }

    #[test]
    fn references_are_prefixed_and_constants_flattened() {
        let resource = resource();
        let matchers = MatcherRegistry::empty();
        let normalizer = Normalizer::new(&resource, &matchers, "WidgetResource");

        assert_eq!(
            normalizer
                .convert(&ApiObjectDefinition::list(ApiObjectDefinition::reference("Sku")))
                .unwrap(),
            Some(SchemaObjectDefinition::list(SchemaObjectDefinition::reference(
                "WidgetResourceSku"
            )))
        );
        assert_eq!(
            normalizer
                .convert(&ApiObjectDefinition::reference("Tier"))
                .unwrap(),
            Some(SchemaObjectDefinition::String)
        );
        assert_eq!(
            normalizer
                .convert(&ApiObjectDefinition::reference("Capacity"))
                .unwrap(),
            Some(SchemaObjectDefinition::Integer)
        );
    }

    #[test]
    fn raw_kinds_have_no_schema_representation() {
        let resource = resource();
        let matchers = MatcherRegistry::empty();
        let normalizer = Normalizer::new(&resource, &matchers, "WidgetResource");

        let raw = ApiObjectDefinition::dictionary(ApiObjectDefinition::RawObject);
        assert!(object_definition_should_be_skipped(&raw));
        assert_eq!(normalizer.convert(&raw).unwrap(), None);
    }

    #[test]
    fn unknown_and_ambiguous_references_error() {
        let mut resource = resource();
        let matchers = MatcherRegistry::empty();

        {
            let normalizer = Normalizer::new(&resource, &matchers, "WidgetResource");
            let err = normalizer
                .convert(&ApiObjectDefinition::reference("Nope"))
                .unwrap_err();
            assert!(matches!(err, Error::ReferenceNotFound { .. }));
        }

        resource
            .models
            .insert("Tier".to_string(), ApiModel::default());
        let normalizer = Normalizer::new(&resource, &matchers, "WidgetResource");
        let err = normalizer
            .convert(&ApiObjectDefinition::reference("Tier"))
            .unwrap_err();
        assert!(matches!(err, Error::AmbiguousReference { .. }));
    }

    #[test]
    fn validation_from_constant_values_sorted() {
        let resource = resource();
        let matchers = MatcherRegistry::empty();
        let normalizer = Normalizer::new(&resource, &matchers, "WidgetResource");

        assert_eq!(
            normalizer.validation(&ApiObjectDefinition::list(ApiObjectDefinition::reference(
                "Tier"
            ))),
            Some(FieldValidation::PossibleValues {
                values: vec!["Basic".to_string(), "Premium".to_string()],
            })
        );
        assert_eq!(normalizer.validation(&ApiObjectDefinition::String), None);
        assert_eq!(
            normalizer.validation(&ApiObjectDefinition::reference("Sku")),
            None
        );
    }
}

//! Discovering every API model reachable from a set of fields.

use std::collections::BTreeMap;
use std::ops::ControlFlow;

use iac_schema_models::{ApiField, ApiModel, ApiObjectDefinition, ApiResource};
use tracing::trace;

use super::{proceed, SkipReason};
use crate::error::{Error, Result, ResultExt};
use crate::matchers::MatcherRegistry;
use crate::normalize::{object_definition_should_be_skipped, resolve_reference, ResolvedReference};

/// SDK model name → SDK model, for every model the walk reached.
pub(crate) type DiscoveredModels<'a> = BTreeMap<String, &'a ApiModel>;

/// Walks the model graph of one [`ApiResource`].
pub(crate) struct ModelResolver<'a, 'm> {
    resource: &'a ApiResource,
    matchers: &'m MatcherRegistry,
}

impl<'a, 'm> ModelResolver<'a, 'm> {
    pub(crate) fn new(resource: &'a ApiResource, matchers: &'m MatcherRegistry) -> Self {
        Self { resource, matchers }
    }

    /// All models transitively referenced by `fields`.
    ///
    /// Fields claimed by a custom matcher are not descended into, nor are
    /// raw/system kinds. Breaks with [`SkipReason::DiscriminatedType`] as
    /// soon as a discriminated model is reached.
    ///
    /// # Errors
    ///
    /// Unresolvable or ambiguous references, and a model name discovered
    /// twice with different shapes.
    pub(crate) fn models_within_fields<'f>(
        &self,
        fields: impl IntoIterator<Item = (&'f String, &'f ApiField)>,
    ) -> Result<ControlFlow<SkipReason, DiscoveredModels<'a>>> {
        let mut all_models = DiscoveredModels::new();

        for (field_name, field) in fields {
            if object_definition_should_be_skipped(&field.object_definition) {
                continue;
            }

            let mut found = DiscoveredModels::new();
            proceed!(self
                .walk(&field.object_definition, &mut found)
                .context(|| format!("identifying models within field {field_name:?}"))?);
            merge_discovered(&mut all_models, found)?;
        }

        Ok(ControlFlow::Continue(all_models))
    }

    /// Depth-first walk; `found` doubles as the visited set so cycles
    /// terminate.
    fn walk(
        &self,
        definition: &ApiObjectDefinition,
        found: &mut DiscoveredModels<'a>,
    ) -> Result<ControlFlow<SkipReason>> {
        if let Some(custom_type) = self.matchers.find_match(definition, self.resource) {
            trace!(?custom_type, "field claimed by custom matcher");
            return Ok(ControlFlow::Continue(()));
        }
        let Some(name) = definition.innermost_reference() else {
            return Ok(ControlFlow::Continue(()));
        };

        let model = match resolve_reference(self.resource, name)? {
            ResolvedReference::Constant(_) => return Ok(ControlFlow::Continue(())),
            ResolvedReference::Model(model) => model,
        };
        if model.is_discriminated_type() {
            return Ok(ControlFlow::Break(SkipReason::DiscriminatedType {
                model: name.to_string(),
            }));
        }
        if found.contains_key(name) {
            return Ok(ControlFlow::Continue(()));
        }
        found.insert(name.to_string(), model);

        for (field_name, field) in &model.fields {
            if object_definition_should_be_skipped(&field.object_definition) {
                continue;
            }
            proceed!(self.walk(&field.object_definition, found).context(|| {
                format!("identifying models within field {field_name:?} of model {name:?}")
            })?);
        }

        Ok(ControlFlow::Continue(()))
    }
}

/// Union `found` into `all`, rejecting a name seen twice with different shapes.
pub(crate) fn merge_discovered<'a>(
    all: &mut DiscoveredModels<'a>,
    found: DiscoveredModels<'a>,
) -> Result<()> {
    for (name, model) in found {
        match all.get(&name) {
            Some(existing) if *existing != model => {
                return Err(Error::DuplicateModelShape {
                    model: name,
                    first: existing.fields.keys().cloned().collect(),
                    second: model.fields.keys().cloned().collect(),
                });
            }
            Some(_) => {}
            None => {
                all.insert(name, model);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn field(definition: ApiObjectDefinition) -> ApiField {
        ApiField {
            json_name: String::new(),
            object_definition: definition,
            required: false,
            optional: true,
            description: None,
        }
    }

    fn model(fields: &[(&str, ApiObjectDefinition)]) -> ApiModel {
        ApiModel {
            fields: fields
                .iter()
                .map(|(name, def)| ((*name).to_string(), field(def.clone())))
                .collect(),
            ..ApiModel::default()
        }
    }

    fn discover(
        resource: &ApiResource,
        root: &str,
    ) -> Result<ControlFlow<SkipReason, Vec<String>>> {
        let matchers = MatcherRegistry::empty();
        let resolver = ModelResolver::new(resource, &matchers);
        let fields = &resource.models[root].fields;
        Ok(match resolver.models_within_fields(fields)? {
            ControlFlow::Continue(models) => ControlFlow::Continue(models.into_keys().collect()),
            ControlFlow::Break(skip) => ControlFlow::Break(skip),
        })
    }

    #[test]
    fn finds_nested_models_through_lists_and_maps() {
        let mut resource = ApiResource::default();
        resource.models.insert(
            "Root".to_string(),
            model(&[
                ("Rules", ApiObjectDefinition::list(ApiObjectDefinition::reference("Rule"))),
                (
                    "Labels",
                    ApiObjectDefinition::dictionary(ApiObjectDefinition::reference("Label")),
                ),
                ("Name", ApiObjectDefinition::String),
            ]),
        );
        resource.models.insert(
            "Rule".to_string(),
            model(&[("Target", ApiObjectDefinition::reference("Target"))]),
        );
        resource
            .models
            .insert("Target".to_string(), model(&[("Id", ApiObjectDefinition::String)]));
        resource
            .models
            .insert("Label".to_string(), model(&[("Value", ApiObjectDefinition::String)]));

        assert_eq!(
            discover(&resource, "Root").unwrap(),
            ControlFlow::Continue(vec![
                "Label".to_string(),
                "Rule".to_string(),
                "Target".to_string()
            ])
        );
    }

    #[test]
    fn cycles_terminate() {
        let mut resource = ApiResource::default();
        resource.models.insert(
            "Root".to_string(),
            model(&[("Node", ApiObjectDefinition::reference("Node"))]),
        );
        resource.models.insert(
            "Node".to_string(),
            model(&[(
                "Children",
                ApiObjectDefinition::list(ApiObjectDefinition::reference("Node")),
            )]),
        );

        assert_eq!(
            discover(&resource, "Root").unwrap(),
            ControlFlow::Continue(vec!["Node".to_string()])
        );
    }

    #[test]
    fn constants_and_raw_kinds_are_not_models() {
        let mut resource = ApiResource::default();
        resource
            .constants
            .insert("Tier".to_string(), iac_schema_models::ConstantDetails::default());
        resource.models.insert(
            "Root".to_string(),
            model(&[
                ("Tier", ApiObjectDefinition::reference("Tier")),
                ("Blob", ApiObjectDefinition::RawObject),
                ("SystemData", ApiObjectDefinition::SystemData),
            ]),
        );

        assert_eq!(
            discover(&resource, "Root").unwrap(),
            ControlFlow::Continue(Vec::new())
        );
    }

    #[test]
    fn discriminated_model_skips() {
        let mut resource = ApiResource::default();
        resource.models.insert(
            "Root".to_string(),
            model(&[("Pet", ApiObjectDefinition::reference("Wrapper"))]),
        );
        resource.models.insert(
            "Wrapper".to_string(),
            model(&[("Animal", ApiObjectDefinition::reference("Animal"))]),
        );
        let mut animal = model(&[("Kind", ApiObjectDefinition::String)]);
        animal.field_name_containing_discriminated_value = Some("Kind".to_string());
        resource.models.insert("Animal".to_string(), animal);

        assert_eq!(
            discover(&resource, "Root").unwrap(),
            ControlFlow::Break(SkipReason::DiscriminatedType {
                model: "Animal".to_string()
            })
        );
    }

    #[test]
    fn unknown_reference_is_reported_with_field_context() {
        let mut resource = ApiResource::default();
        resource.models.insert(
            "Root".to_string(),
            model(&[("Broken", ApiObjectDefinition::reference("Missing"))]),
        );

        let err = discover(&resource, "Root").unwrap_err();
        assert_eq!(
            err.to_string(),
            "identifying models within field \"Broken\": \
             reference \"Missing\" was neither a constant nor a model"
        );
    }

    #[test]
    fn merging_rejects_different_shapes() {
        let first = model(&[("A", ApiObjectDefinition::String)]);
        let second = model(&[("B", ApiObjectDefinition::String)]);

        let mut all = DiscoveredModels::from([("Thing".to_string(), &first)]);
        merge_discovered(&mut all, DiscoveredModels::from([("Thing".to_string(), &first)]))
            .unwrap();

        let err =
            merge_discovered(&mut all, DiscoveredModels::from([("Thing".to_string(), &second)]))
                .unwrap_err();
        assert!(matches!(err, Error::DuplicateModelShape { ref model, .. } if model == "Thing"));
    }
}

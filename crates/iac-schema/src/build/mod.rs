//! Schema building for a single resource.
//!
//! [`Builder::build`] runs the stages in a fixed order, threading one
//! [`MappingDefinition`] through all of them:
//!
//! 1. **Top-level model** ([`top_level`]): locate the create/read/update
//!    payloads, assemble the root model from envelope, resource ID and
//!    `properties` fields, and discover every nested API model ([`resolve`]).
//! 2. **Nested models** ([`fields`]): one prefixed schema model per
//!    discovered API model.
//! 3. **Rule pipeline** ([`crate::processors`]): ordered rewrite passes.
//! 4. **Display names**: `hcl_name` assignment and collision checks.
//! 5. **Cleanup** ([`cleanup`]): drop models and mappings unreachable from
//!    the root.
//!
//! A resource that cannot be generated (missing operations, discriminated
//! types) yields [`BuildOutcome::Skipped`], never an error. Errors are
//! reserved for defects in the input or the rule set, and no partial schema
//! accompanies them.

mod cleanup;
mod fields;
mod payloads;
mod resolve;
mod resource_id;
mod top_level;

use std::collections::BTreeMap;
use std::fmt;
use std::ops::ControlFlow;

use iac_schema_models::{ApiResource, MappingDefinition, SchemaModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

use crate::error::{Error, Result, ResultExt};
use crate::matchers::MatcherRegistry;
use crate::naming::to_snake_case;
use crate::normalize::Normalizer;
use crate::processors::ProcessorPipeline;

/// Schema model name → schema model.
pub type SchemaModels = BTreeMap<String, SchemaModel>;

/// Return early with the skip when a stage reports one.
macro_rules! proceed {
    ($step:expr) => {
        match $step {
            ::std::ops::ControlFlow::Continue(value) => value,
            ::std::ops::ControlFlow::Break(skip) => {
                return Ok(::std::ops::ControlFlow::Break(skip))
            }
        }
    };
}
pub(crate) use proceed;

/// Which operations and identifiers make up one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBuildInput {
    /// Name of the root schema model (e.g. `EventHubNamespaceResource`).
    /// Nested models are prefixed with it.
    pub schema_model_name: String,

    /// Resource ID the resource is addressed by.
    pub resource_id_name: String,

    /// SDK operation creating the resource (required).
    pub create_method: String,

    /// SDK operation reading the resource (required).
    pub read_method: String,

    /// SDK operation updating the resource (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_method: Option<String>,
}

/// Per-resource field overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceBuildInfo {
    /// Field overrides, matched by SDK field name.
    pub overrides: Vec<FieldOverride>,
}

/// Rename and/or describe a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOverride {
    /// SDK field name the override applies to.
    pub name: String,

    /// Schema field name to use instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_name: Option<String>,

    /// Description to use instead of the API description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ResourceBuildInfo {
    fn find(&self, sdk_field_name: &str) -> Option<&FieldOverride> {
        self.overrides.iter().find(|o| o.name == sdk_field_name)
    }

    /// Schema field name for an SDK field, after overrides.
    pub(crate) fn schema_field_name(&self, sdk_field_name: &str) -> String {
        self.find(sdk_field_name)
            .and_then(|o| o.updated_name.clone())
            .unwrap_or_else(|| sdk_field_name.to_string())
    }

    /// Override description for an SDK field, if any.
    pub(crate) fn description(&self, sdk_field_name: &str) -> Option<String> {
        self.find(sdk_field_name).and_then(|o| o.description.clone())
    }
}

/// Why a resource was not generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Create/read missing or not returning a single model, or update named
    /// but not resolvable.
    NotApplicable {
        /// Human-readable detail.
        reason: String,
    },
    /// A reachable model is a member of a discriminated union.
    DiscriminatedType {
        /// The discriminated model.
        model: String,
    },
}

impl SkipReason {
    pub(crate) fn not_applicable(reason: impl Into<String>) -> Self {
        Self::NotApplicable {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotApplicable { reason } => write!(f, "not applicable: {reason}"),
            Self::DiscriminatedType { model } => {
                write!(f, "model {model:?} is a discriminated type")
            }
        }
    }
}

/// The schema and mappings for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSchema {
    /// Schema models keyed by name; contains the root model.
    pub models: SchemaModels,

    /// Mappings between the schema models and the API models.
    pub mappings: MappingDefinition,
}

/// Result of a successful [`Builder::build`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildOutcome {
    /// The resource was built.
    Built(ResourceSchema),
    /// The resource is intentionally not eligible for schema generation.
    Skipped(SkipReason),
}

impl BuildOutcome {
    /// The built schema, discarding the skip reason.
    #[must_use]
    pub fn into_built(self) -> Option<ResourceSchema> {
        match self {
            Self::Built(schema) => Some(schema),
            Self::Skipped(_) => None,
        }
    }

    /// Whether the resource was skipped.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

/// Bundles the root model with the API models discovered while building it.
#[derive(Debug)]
pub(crate) struct ModelParseResult<'a> {
    pub(crate) model: SchemaModel,
    pub(crate) nested_models: BTreeMap<String, &'a iac_schema_models::ApiModel>,
}

/// Builds schema models and mappings for the resources of one [`ApiResource`].
///
/// Construct with [`Builder::new`] (built-in matchers and processors) and
/// adjust via [`matchers`](Self::matchers), [`processors`](Self::processors)
/// or [`with_project_config`](Self::with_project_config).
///
/// # Example
///
/// ```ignore
/// let builder = Builder::new(&api_resource);
/// match builder.build(&input, None)? {
///     BuildOutcome::Built(schema) => emit(schema),
///     BuildOutcome::Skipped(reason) => tracing::info!(%reason, "skipping"),
/// }
/// ```
#[derive(Debug)]
pub struct Builder<'a> {
    /// API resource graph the resources are built from.
    resource: &'a ApiResource,

    /// Custom field matchers, in precedence order.
    matchers: MatcherRegistry,

    /// Model rewrite passes, in execution order.
    processors: ProcessorPipeline,
}

impl<'a> Builder<'a> {
    /// A builder with the built-in matchers and processors.
    #[must_use]
    pub fn new(resource: &'a ApiResource) -> Self {
        Self {
            resource,
            matchers: MatcherRegistry::default_matchers(),
            processors: ProcessorPipeline::default_processors(),
        }
    }

    /// Replace the custom field matchers.
    #[must_use]
    pub fn matchers(mut self, matchers: MatcherRegistry) -> Self {
        self.matchers = matchers;
        self
    }

    /// Replace the rule pipeline.
    #[must_use]
    pub fn processors(mut self, processors: ProcessorPipeline) -> Self {
        self.processors = processors;
        self
    }

    /// Apply matcher and processor toggles from a
    /// [`ProjectConfig`](crate::ProjectConfig).
    #[must_use]
    pub fn with_project_config(self, project: &crate::ProjectConfig) -> Self {
        self.matchers(project.matchers.registry())
            .processors(project.processors.pipeline())
    }

    /// Build the schema for one resource.
    ///
    /// # Errors
    ///
    /// Returns an error if a reference cannot be resolved (or is ambiguous),
    /// models or display names conflict, the resource ID is missing, or a
    /// processor fails. Ineligible resources are reported as
    /// [`BuildOutcome::Skipped`] instead.
    pub fn build(
        &self,
        input: &ResourceBuildInput,
        info: Option<&ResourceBuildInfo>,
    ) -> Result<BuildOutcome> {
        let _span = debug_span!("build", resource = %input.schema_model_name).entered();

        let default_info = ResourceBuildInfo::default();
        let info = info.unwrap_or(&default_info);

        match self.build_models(input, info)? {
            ControlFlow::Continue(schema) => Ok(BuildOutcome::Built(schema)),
            ControlFlow::Break(skip) => {
                debug!(%skip, "resource was filtered out");
                Ok(BuildOutcome::Skipped(skip))
            }
        }
    }

    fn build_models(
        &self,
        input: &ResourceBuildInput,
        info: &ResourceBuildInfo,
    ) -> Result<ControlFlow<SkipReason, ResourceSchema>> {
        let normalizer = Normalizer::new(self.resource, &self.matchers, &input.schema_model_name);
        let mut mappings = MappingDefinition::default();

        let parsed = proceed!(top_level::schema_from_top_level_model(
            self.resource,
            &self.matchers,
            &normalizer,
            input,
            info,
            &mut mappings,
        )
        .context(|| "building schema from top level model")?);

        let mut models = SchemaModels::new();
        models.insert(input.schema_model_name.clone(), parsed.model);

        for (sdk_model_name, sdk_model) in &parsed.nested_models {
            let schema_model_name = normalizer.nested_model_name(sdk_model_name);
            let _span = debug_span!("nested_model", model = %sdk_model_name).entered();
            let model = fields::build_nested_model(
                &normalizer,
                &schema_model_name,
                sdk_model_name,
                sdk_model,
                info,
                &mut mappings,
            )
            .context(|| format!("building model definition for nested model {sdk_model_name:?}"))?;
            models.insert(schema_model_name, model);
        }

        self.processors
            .run(&mut models, &mut mappings)
            .context(|| "processing models")?;

        assign_hcl_names(&mut models)?;

        cleanup::remove_unused_models_and_mappings(
            self.resource,
            &input.schema_model_name,
            &mut models,
            &mut mappings,
        )
        .context(|| "removing unused models/mappings")?;

        Ok(ControlFlow::Continue(ResourceSchema { models, mappings }))
    }
}

/// Assign each field's `hcl_name` and reject display-name collisions.
///
/// Within one model, two fields producing the same display name must
/// reference the same target model.
fn assign_hcl_names(models: &mut SchemaModels) -> Result<()> {
    for (model_name, model) in models.iter_mut() {
        let mut block_refs: BTreeMap<String, String> = BTreeMap::new();

        for (field_name, field) in &mut model.fields {
            field.hcl_name = to_snake_case(field_name);

            let Some(target) = field.object_definition.innermost_reference() else {
                continue;
            };
            if let Some(existing) = block_refs.get(&field.hcl_name) {
                if existing != target {
                    return Err(Error::DuplicateHclName {
                        model: model_name.clone(),
                        hcl_name: field.hcl_name.clone(),
                        first: existing.clone(),
                        second: target.to_string(),
                    });
                }
            }
            block_refs.insert(field.hcl_name.clone(), target.to_string());
        }
    }
    Ok(())
}

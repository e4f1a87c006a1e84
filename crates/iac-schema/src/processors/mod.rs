//! Model rewrite rules.
//!
//! Once every schema model is built, each model is passed through an
//! ordered list of [`ModelProcessor`]s. Models are visited in name order
//! and, for each model, every processor runs in registration order; each
//! processor sees the tables as left by the previous one. Sweeps repeat
//! until one changes nothing.
//!
//! Built-in processors:
//! - [`FlattenReferenceId`]: a block holding only an `Id` becomes an `...Id` string
//! - [`FlattenSkuName`]: a `Sku` block whose only settable field is `Name`
//!   becomes a `SkuName` string
//! - [`RemoveProvisioningState`]: drops the computed `ProvisioningState` field
//!
//! Processors must be idempotent, and must not leave references to models
//! that don't exist; the final cleanup rejects those.

mod provisioning_state;
mod reference_id;
mod sku;

use std::fmt;

use iac_schema_models::{FieldMapping, MappingDefinition, SchemaField};
use tracing::{debug, trace};

use crate::build::SchemaModels;
use crate::error::{Error, Result, ResultExt};

pub use provisioning_state::RemoveProvisioningState;
pub use reference_id::FlattenReferenceId;
pub use sku::FlattenSkuName;

/// Upper bound on pipeline sweeps before giving up on a fixpoint.
pub const MAX_SWEEPS: usize = 8;

/// A rewrite rule applied to one schema model at a time.
///
/// The model being processed is `models[model_name]`; processors may also
/// read or rewrite any other model and the mappings.
pub trait ModelProcessor: fmt::Debug + Send + Sync {
    /// Short name for logs and error context.
    fn name(&self) -> &'static str;

    /// Rewrite `models[model_name]` (and anything related).
    ///
    /// # Errors
    ///
    /// Implementation-defined; the pipeline aborts the build on error.
    fn process_model(
        &self,
        model_name: &str,
        models: &mut SchemaModels,
        mappings: &mut MappingDefinition,
    ) -> Result<()>;
}

/// Ordered list of processors; index is execution order.
#[derive(Debug)]
pub struct ProcessorPipeline {
    processors: Vec<Box<dyn ModelProcessor>>,
}

impl ProcessorPipeline {
    /// A pipeline that leaves every model untouched.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// The built-in processors, in order:
    /// [`FlattenReferenceId`], [`FlattenSkuName`], [`RemoveProvisioningState`].
    #[must_use]
    pub fn default_processors() -> Self {
        Self::empty()
            .register(FlattenReferenceId)
            .register(FlattenSkuName)
            .register(RemoveProvisioningState)
    }

    /// Append a processor; it runs after those already registered.
    #[must_use]
    pub fn register(mut self, processor: impl ModelProcessor + 'static) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Number of registered processors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Whether no processors are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Names of the registered processors, in execution order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.processors.iter().map(|p| p.name())
    }

    /// Run every processor over every model, sweeping again until a sweep
    /// leaves models and mappings unchanged.
    ///
    /// Within a sweep the model list is snapshotted up front; a model removed
    /// by an earlier processor is not visited. Repeating the sweep lets a
    /// rewrite of a nested model (e.g. dropping `ProvisioningState`) enable a
    /// rewrite of the model referencing it, so running the pipeline again on
    /// its own output changes nothing.
    ///
    /// # Errors
    ///
    /// The first processor error, annotated with the model and processor.
    /// [`Error::ProcessorsDidNotSettle`] if models are still changing after
    /// [`MAX_SWEEPS`] sweeps.
    pub fn run(&self, models: &mut SchemaModels, mappings: &mut MappingDefinition) -> Result<()> {
        if self.processors.is_empty() {
            return Ok(());
        }

        for sweep in 1..=MAX_SWEEPS {
            let before = (models.clone(), mappings.clone());
            self.sweep(models, mappings)?;
            if before.0 == *models && before.1 == *mappings {
                trace!(sweep, "processors settled");
                return Ok(());
            }
        }
        Err(Error::ProcessorsDidNotSettle { sweeps: MAX_SWEEPS })
    }

    fn sweep(&self, models: &mut SchemaModels, mappings: &mut MappingDefinition) -> Result<()> {
        let model_names: Vec<String> = models.keys().cloned().collect();

        for model_name in &model_names {
            for processor in &self.processors {
                if !models.contains_key(model_name) {
                    break;
                }
                trace!(model = %model_name, processor = processor.name(), "running processor");
                processor
                    .process_model(model_name, models, mappings)
                    .context(|| {
                        format!("processing model {model_name:?} with {}", processor.name())
                    })?;
            }
        }
        Ok(())
    }
}

impl Default for ProcessorPipeline {
    fn default() -> Self {
        Self::default_processors()
    }
}

/// Replaces a reference field with a scalar taken from the referenced
/// model, moving the mappings along.
///
/// The parent's direct assignments for the old field become model-to-model
/// mappings onto the same SDK field, and the new field is directly assigned
/// from the SDK field behind `target_model.target_field`. The referenced
/// model is left in place for the final cleanup to collect.
#[derive(Debug)]
pub(crate) struct FlattenedField {
    pub(crate) model_name: String,
    pub(crate) field_name: String,
    pub(crate) new_field_name: String,
    pub(crate) replacement: SchemaField,
    pub(crate) target_model: String,
    pub(crate) target_field: String,
}

impl FlattenedField {
    /// Apply the rewrite. Returns `false` (and changes nothing) if the target
    /// field has no SDK mapping or the new name is already taken.
    pub(crate) fn apply(self, models: &mut SchemaModels, mappings: &mut MappingDefinition) -> bool {
        let Some((sdk_model, sdk_field)) = mappings.fields.iter().find_map(|m| match m {
            FieldMapping::DirectAssignment(d)
                if d.schema_model_name == self.target_model
                    && d.schema_field_name == self.target_field =>
            {
                Some((d.sdk_model_name.clone(), d.sdk_field_name.clone()))
            }
            _ => None,
        }) else {
            trace!(model = %self.target_model, field = %self.target_field, "no mapping to flatten from");
            return false;
        };

        let Some(model) = models.get_mut(&self.model_name) else {
            return false;
        };
        if model.fields.contains_key(&self.new_field_name) {
            trace!(model = %self.model_name, field = %self.new_field_name, "flattened name already in use");
            return false;
        }
        model.fields.remove(&self.field_name);
        model
            .fields
            .insert(self.new_field_name.clone(), self.replacement);

        let mut parents = Vec::new();
        mappings.fields.retain(|m| match m {
            FieldMapping::DirectAssignment(d)
                if d.schema_model_name == self.model_name && d.schema_field_name == self.field_name =>
            {
                parents.push((d.sdk_model_name.clone(), d.sdk_field_name.clone()));
                false
            }
            _ => true,
        });
        for (parent_model, parent_field) in parents {
            let mapping = FieldMapping::model_to_model(&self.model_name, &parent_model, &parent_field);
            if !mappings.fields.contains(&mapping) {
                mappings.fields.push(mapping);
            }
        }
        mappings.fields.push(FieldMapping::direct(
            &self.model_name,
            &self.new_field_name,
            &sdk_model,
            &sdk_field,
        ));

        debug!(
            model = %self.model_name,
            from = %self.field_name,
            to = %self.new_field_name,
            "flattened field"
        );
        true
    }
}

//! Mappings between schema models and API (SDK) models.
//!
//! Each mapping describes one direction; the emitter infers the inverse.

use std::fmt;

use serde::{Deserialize, Serialize};

/// All mappings produced for one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingDefinition {
    /// Field and model mappings, in the order they were produced.
    pub fields: Vec<FieldMapping>,

    /// Resource ID segment mappings.
    pub resource_id: Vec<ResourceIdMapping>,
}

/// A single field-level or model-level mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FieldMapping {
    /// 1:1 assignment between a schema field and an SDK field.
    DirectAssignment(DirectAssignmentMapping),
    /// Whole-model mapping between a schema model and the model held by an
    /// SDK field (e.g. the `properties` block).
    ModelToModel(ModelToModelMapping),
}

impl FieldMapping {
    /// Schema model this mapping writes into.
    #[must_use]
    pub fn schema_model_name(&self) -> &str {
        match self {
            Self::DirectAssignment(m) => &m.schema_model_name,
            Self::ModelToModel(m) => &m.schema_model_name,
        }
    }

    /// Shorthand for a direct assignment.
    #[must_use]
    pub fn direct(
        schema_model_name: &str,
        schema_field_name: &str,
        sdk_model_name: &str,
        sdk_field_name: &str,
    ) -> Self {
        Self::DirectAssignment(DirectAssignmentMapping {
            schema_model_name: schema_model_name.to_string(),
            schema_field_name: schema_field_name.to_string(),
            sdk_model_name: sdk_model_name.to_string(),
            sdk_field_name: sdk_field_name.to_string(),
        })
    }

    /// Shorthand for a model-to-model mapping.
    #[must_use]
    pub fn model_to_model(schema_model_name: &str, sdk_model_name: &str, sdk_field_name: &str) -> Self {
        Self::ModelToModel(ModelToModelMapping {
            schema_model_name: schema_model_name.to_string(),
            sdk_model_name: sdk_model_name.to_string(),
            sdk_field_name: sdk_field_name.to_string(),
        })
    }
}

impl fmt::Display for FieldMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectAssignment(m) => write!(
                f,
                "DirectAssignment {}.{} <-> {}.{}",
                m.schema_model_name, m.schema_field_name, m.sdk_model_name, m.sdk_field_name
            ),
            Self::ModelToModel(m) => write!(
                f,
                "ModelToModel {} <-> {}.{}",
                m.schema_model_name, m.sdk_model_name, m.sdk_field_name
            ),
        }
    }
}

/// Schema field ⇄ SDK field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectAssignmentMapping {
    /// Schema model holding the field.
    pub schema_model_name: String,
    /// Schema field name.
    pub schema_field_name: String,
    /// SDK model holding the field.
    pub sdk_model_name: String,
    /// SDK field name.
    pub sdk_field_name: String,
}

/// Schema model ⇄ model held by an SDK field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelToModelMapping {
    /// Schema model.
    pub schema_model_name: String,
    /// SDK model holding the field.
    pub sdk_model_name: String,
    /// SDK field whose (innermost) type is the mapped model.
    pub sdk_field_name: String,
}

/// Schema field ⇄ resource ID segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdMapping {
    /// Schema field on the root model.
    pub schema_field_name: String,
    /// Segment name within the resource ID.
    pub segment_name: String,
    /// The segment is read from the parent resource's ID held in the field.
    #[serde(default)]
    pub parsed_from_parent_id: bool,
}

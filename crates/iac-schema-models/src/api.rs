//! API-side data model: the resource graph produced by the upstream REST
//! spec parser.
//!
//! Everything in here is treated as immutable input by the schema builder.
//!
//! # File format
//!
//! ```yaml
//! constants:
//!   SkuTier:
//!     field_type: String
//!     values:
//!       Basic: Basic
//!       Premium: Premium
//! models:
//!   Namespace:
//!     fields:
//!       Location:
//!         json_name: location
//!         object_definition: { type: location }
//!         required: true
//!       Properties:
//!         json_name: properties
//!         object_definition: { type: reference, reference_name: NamespaceProperties }
//!         optional: true
//! operations:
//!   CreateOrUpdate:
//!     request_object: { type: reference, reference_name: Namespace }
//!     response_object: { type: reference, reference_name: Namespace }
//! resource_ids:
//!   NamespaceId: /subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.EventHub/namespaces/{namespaceName}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resource_id::ResourceIdDefinition;

/// The full API resource graph for one API resource (a package of
/// operations sharing models and constants).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiResource {
    /// Constants (enumerations), keyed by name.
    pub constants: BTreeMap<String, ConstantDetails>,

    /// Models, keyed by name.
    pub models: BTreeMap<String, ApiModel>,

    /// Operations, keyed by SDK operation name.
    pub operations: BTreeMap<String, ApiOperation>,

    /// Resource identifiers, keyed by name.
    pub resource_ids: BTreeMap<String, ResourceIdDefinition>,
}

/// A named structural type in the request/response graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiModel {
    /// Fields keyed by SDK field name (e.g. `PrincipalId`).
    pub fields: BTreeMap<String, ApiField>,

    /// Name of the field holding the discriminated value (discriminator parents).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_name_containing_discriminated_value: Option<String>,

    /// The discriminated value selecting this implementation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminated_value: Option<String>,

    /// Parent type of a discriminated implementation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_type_name: Option<String>,
}

impl ApiModel {
    /// Whether this model takes part in a discriminated union, either as the
    /// parent or as one of the implementations.
    #[must_use]
    pub fn is_discriminated_type(&self) -> bool {
        self.field_name_containing_discriminated_value.is_some()
            || self.discriminated_value.is_some()
            || self.parent_type_name.is_some()
    }
}

/// A single field within an [`ApiModel`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiField {
    /// Wire name of the field (e.g. `principalId`).
    pub json_name: String,

    /// Type descriptor.
    pub object_definition: ApiObjectDefinition,

    /// Whether the field must be sent.
    #[serde(default)]
    pub required: bool,

    /// Whether the field may be sent. Neither required nor optional means
    /// the field is read-only.
    #[serde(default)]
    pub optional: bool,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// API-side type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiObjectDefinition {
    /// `true`/`false`.
    Boolean,
    /// Whole number.
    Integer,
    /// Floating-point number.
    Float,
    /// Free-form string.
    String,
    /// RFC 3339 timestamp.
    DateTime,
    /// Ordered list of the nested item.
    List {
        /// Item type.
        nested_item: Box<ApiObjectDefinition>,
    },
    /// String-keyed dictionary of the nested item.
    Dictionary {
        /// Value type.
        nested_item: Box<ApiObjectDefinition>,
    },
    /// Reference to a model or a constant by name.
    Reference {
        /// Name of the referenced model or constant.
        reference_name: String,
    },
    /// Raw file contents.
    RawFile,
    /// Opaque JSON object.
    RawObject,
    /// System-managed metadata (creation/modification audit block).
    SystemData,
    /// Azure-style location (region) common type.
    Location,
    /// Key/value tags common type.
    Tags,
}

impl ApiObjectDefinition {
    /// Look through `List`/`Dictionary` wrappers to the underlying definition.
    #[must_use]
    pub fn innermost(&self) -> &Self {
        match self {
            Self::List { nested_item } | Self::Dictionary { nested_item } => {
                nested_item.innermost()
            }
            other => other,
        }
    }

    /// Name of the referenced model/constant, if the innermost definition is
    /// a reference.
    #[must_use]
    pub fn innermost_reference(&self) -> Option<&str> {
        match self.innermost() {
            Self::Reference { reference_name } => Some(reference_name),
            _ => None,
        }
    }

    /// Shorthand for a reference definition.
    #[must_use]
    pub fn reference(name: &str) -> Self {
        Self::Reference {
            reference_name: name.to_string(),
        }
    }

    /// Shorthand for a list of `item`.
    #[must_use]
    pub fn list(item: Self) -> Self {
        Self::List {
            nested_item: Box::new(item),
        }
    }

    /// Shorthand for a dictionary of `item`.
    #[must_use]
    pub fn dictionary(item: Self) -> Self {
        Self::Dictionary {
            nested_item: Box::new(item),
        }
    }
}

/// Underlying wire type of a constant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstantFieldType {
    /// String-valued enumeration.
    #[default]
    String,
    /// Integer-valued enumeration.
    Integer,
    /// Float-valued enumeration.
    Float,
}

/// A named enumeration of allowed values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstantDetails {
    /// Wire type of the values.
    pub field_type: ConstantFieldType,

    /// Allowed values, keyed by their SDK name.
    pub values: BTreeMap<String, String>,
}

impl ConstantDetails {
    /// Whether the constant's value set is exactly `expected`.
    #[must_use]
    pub fn has_exact_values(&self, expected: &[&str]) -> bool {
        self.values.len() == expected.len()
            && expected
                .iter()
                .all(|value| self.values.values().any(|v| v == value))
    }
}

/// A single SDK operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiOperation {
    /// Request payload, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_object: Option<ApiObjectDefinition>,

    /// Response payload, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_object: Option<ApiObjectDefinition>,

    /// Resource ID the operation is scoped to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id_name: Option<String>,
}

//! Schema-side data model: what the emitter for the declarative
//! infrastructure-as-code tool consumes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A generated schema model (one block in the resource's schema).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaModel {
    /// Fields keyed by schema field name (e.g. `PrincipalId`).
    pub fields: BTreeMap<String, SchemaField>,
}

/// A single field within a [`SchemaModel`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Type descriptor.
    pub object_definition: SchemaObjectDefinition,

    /// Display name in the target configuration language (e.g. `principal_id`).
    ///
    /// Assigned once the rule pipeline has finished; empty before that.
    #[serde(default)]
    pub hcl_name: String,

    /// Must be set by the user.
    pub required: bool,

    /// May be set by the user.
    pub optional: bool,

    /// Set by the service. Always `!required && !optional`.
    pub computed: bool,

    /// Changing the value recreates the resource.
    pub force_new: bool,

    /// Validation applied to user-supplied values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,

    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SchemaField {
    /// A field with flags derived from `required`/`optional`.
    #[must_use]
    pub fn new(object_definition: SchemaObjectDefinition, required: bool, optional: bool) -> Self {
        Self {
            object_definition,
            hcl_name: String::new(),
            required,
            optional,
            computed: !required && !optional,
            force_new: false,
            validation: None,
            description: None,
        }
    }
}

/// Schema-side type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchemaObjectDefinition {
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
        nested_object: Box<SchemaObjectDefinition>,
    },
    /// Unordered set of the nested item.
    Set {
        /// Item type.
        nested_object: Box<SchemaObjectDefinition>,
    },
    /// String-keyed dictionary of the nested item.
    Dictionary {
        /// Value type.
        nested_object: Box<SchemaObjectDefinition>,
    },
    /// Reference to another schema model by name.
    Reference {
        /// Name of the referenced schema model.
        reference_name: String,
    },
    /// Location (region) common type.
    Location,
    /// Key/value tags common type.
    Tags,
    /// A canonical type substituted by a custom field matcher.
    Custom {
        /// Which canonical type.
        custom_type: CustomFieldType,
    },
}

impl SchemaObjectDefinition {
    /// Look through `List`/`Set`/`Dictionary` wrappers to the underlying definition.
    #[must_use]
    pub fn innermost(&self) -> &Self {
        match self {
            Self::List { nested_object }
            | Self::Set { nested_object }
            | Self::Dictionary { nested_object } => nested_object.innermost(),
            other => other,
        }
    }

    /// Name of the referenced schema model, if the innermost definition is a
    /// reference.
    #[must_use]
    pub fn innermost_reference(&self) -> Option<&str> {
        match self.innermost() {
            Self::Reference { reference_name } => Some(reference_name),
            _ => None,
        }
    }

    /// Mutable access to the innermost reference name, for renaming.
    pub fn innermost_reference_mut(&mut self) -> Option<&mut String> {
        match self {
            Self::List { nested_object }
            | Self::Set { nested_object }
            | Self::Dictionary { nested_object } => nested_object.innermost_reference_mut(),
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
            nested_object: Box::new(item),
        }
    }

    /// Shorthand for a dictionary of `item`.
    #[must_use]
    pub fn dictionary(item: Self) -> Self {
        Self::Dictionary {
            nested_object: Box::new(item),
        }
    }
}

/// Canonical field types recognized by custom field matchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CustomFieldType {
    /// `{PrincipalId, TenantId, Type: {SystemAssigned, None}}`.
    SystemAssignedIdentity,
    /// `{PrincipalId, TenantId, Type: {SystemAssigned, UserAssigned},
    /// UserAssignedIdentities: map of {ClientId, PrincipalId}}`.
    SystemOrUserAssignedIdentityMap,
}

/// Validation applied to a schema field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldValidation {
    /// Value must be one of `values`.
    PossibleValues {
        /// Allowed values, sorted.
        values: Vec<String>,
    },
}

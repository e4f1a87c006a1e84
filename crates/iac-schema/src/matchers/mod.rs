//! Custom field matchers.
//!
//! A matcher recognizes a well-known composite shape in the API model graph
//! (e.g. a managed identity block) and substitutes a canonical
//! [`CustomFieldType`] for the generic structural conversion.
//!
//! Matchers live in an explicit, ordered [`MatcherRegistry`] built at
//! orchestration time. **Registration order is precedence**: the first
//! matcher whose [`is_match`](CustomFieldMatcher::is_match) returns `true`
//! wins, later matchers are not consulted.

mod identity;

use std::fmt;

use iac_schema_models::{ApiObjectDefinition, ApiResource, CustomFieldType};

pub use identity::{SystemAssignedIdentityMatcher, SystemOrUserAssignedIdentityMapMatcher};

/// Recognizes one canonical field shape.
///
/// Implementations must be total and side-effect free: a shape that does not
/// match returns `false`, never panics.
pub trait CustomFieldMatcher: fmt::Debug + Send + Sync {
    /// Canonical type substituted on a match.
    fn custom_field_type(&self) -> CustomFieldType;

    /// Whether `definition` (a field's object definition) has this shape.
    fn is_match(&self, definition: &ApiObjectDefinition, resource: &ApiResource) -> bool;
}

/// Ordered list of custom field matchers; index is priority.
#[derive(Debug)]
pub struct MatcherRegistry {
    matchers: Vec<Box<dyn CustomFieldMatcher>>,
}

impl MatcherRegistry {
    /// A registry with no matchers: every field takes the generic path.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            matchers: Vec::new(),
        }
    }

    /// The built-in matchers, most specific first:
    /// 1. [`SystemOrUserAssignedIdentityMapMatcher`]
    /// 2. [`SystemAssignedIdentityMatcher`]
    #[must_use]
    pub fn default_matchers() -> Self {
        Self::empty()
            .register(SystemOrUserAssignedIdentityMapMatcher)
            .register(SystemAssignedIdentityMatcher)
    }

    /// Append a matcher with the lowest precedence so far.
    #[must_use]
    pub fn register(mut self, matcher: impl CustomFieldMatcher + 'static) -> Self {
        self.matchers.push(Box::new(matcher));
        self
    }

    /// Number of registered matchers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    /// Whether no matchers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Canonical type of the first matcher that claims `definition`.
    #[must_use]
    pub fn find_match(
        &self,
        definition: &ApiObjectDefinition,
        resource: &ApiResource,
    ) -> Option<CustomFieldType> {
        self.matchers
            .iter()
            .find(|m| m.is_match(definition, resource))
            .map(|m| m.custom_field_type())
    }
}

impl Default for MatcherRegistry {
    fn default() -> Self {
        Self::default_matchers()
    }
}

#[cfg(test)]
mod tests {
    use iac_schema_models::{ApiField, ApiModel};

    use super::*;

    /// Claims every reference, regardless of shape.
    #[derive(Debug)]
    struct AnyReference(CustomFieldType);

    impl CustomFieldMatcher for AnyReference {
        fn custom_field_type(&self) -> CustomFieldType {
            self.0
        }

        fn is_match(&self, definition: &ApiObjectDefinition, _: &ApiResource) -> bool {
            matches!(definition, ApiObjectDefinition::Reference { .. })
        }
    }

    fn resource_with_model() -> ApiResource {
        let mut model = ApiModel::default();
        model.fields.insert(
            "Value".to_string(),
            ApiField {
                json_name: "value".to_string(),
                object_definition: ApiObjectDefinition::String,
                required: false,
                optional: true,
                description: None,
            },
        );
        let mut resource = ApiResource::default();
        resource.models.insert("Thing".to_string(), model);
        resource
    }

    #[test]
    fn first_registered_match_wins() {
        let resource = resource_with_model();
        let reference = ApiObjectDefinition::reference("Thing");

        let forward = MatcherRegistry::empty()
            .register(AnyReference(CustomFieldType::SystemAssignedIdentity))
            .register(AnyReference(CustomFieldType::SystemOrUserAssignedIdentityMap));
        assert_eq!(
            forward.find_match(&reference, &resource),
            Some(CustomFieldType::SystemAssignedIdentity)
        );

        let reversed = MatcherRegistry::empty()
            .register(AnyReference(CustomFieldType::SystemOrUserAssignedIdentityMap))
            .register(AnyReference(CustomFieldType::SystemAssignedIdentity));
        assert_eq!(
            reversed.find_match(&reference, &resource),
            Some(CustomFieldType::SystemOrUserAssignedIdentityMap)
        );
    }

    #[test]
    fn empty_registry_never_matches() {
        let resource = resource_with_model();
        let registry = MatcherRegistry::empty();
        assert!(registry.is_empty());
        assert_eq!(
            registry.find_match(&ApiObjectDefinition::reference("Thing"), &resource),
            None
        );
    }

    #[test]
    fn default_registry_has_builtins() {
        assert_eq!(MatcherRegistry::default().len(), 2);
    }
}

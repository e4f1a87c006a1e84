//! Managed identity matchers.
//!
//! Both matchers are closed-set: every field of the referenced model must be
//! one of the expected fields with the expected type, and every expected
//! field must be present. Field names compare case-insensitively.

use iac_schema_models::{ApiModel, ApiObjectDefinition, ApiResource, CustomFieldType};

use super::CustomFieldMatcher;

/// `{PrincipalId: string, TenantId: string, Type: {SystemAssigned, UserAssigned},
/// UserAssignedIdentities: map of {ClientId: string, PrincipalId: string}}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOrUserAssignedIdentityMapMatcher;

impl CustomFieldMatcher for SystemOrUserAssignedIdentityMapMatcher {
    fn custom_field_type(&self) -> CustomFieldType {
        CustomFieldType::SystemOrUserAssignedIdentityMap
    }

    fn is_match(&self, definition: &ApiObjectDefinition, resource: &ApiResource) -> bool {
        let Some(model) = referenced_model(definition, resource) else {
            return false;
        };

        let mut has_principal_id = false;
        let mut has_tenant_id = false;
        let mut has_matching_type = false;
        let mut has_user_assigned_identities = false;

        for (field_name, field) in &model.fields {
            if field_name.eq_ignore_ascii_case("PrincipalId") && !has_principal_id {
                has_principal_id = is_string(&field.object_definition);
                if !has_principal_id {
                    return false;
                }
            } else if field_name.eq_ignore_ascii_case("TenantId") && !has_tenant_id {
                has_tenant_id = is_string(&field.object_definition);
                if !has_tenant_id {
                    return false;
                }
            } else if field_name.eq_ignore_ascii_case("Type") && !has_matching_type {
                has_matching_type = is_constant_with_values(
                    &field.object_definition,
                    resource,
                    &["SystemAssigned", "UserAssigned"],
                );
                if !has_matching_type {
                    return false;
                }
            } else if field_name.eq_ignore_ascii_case("UserAssignedIdentities")
                && !has_user_assigned_identities
            {
                has_user_assigned_identities =
                    is_map_of_user_assigned_identity(&field.object_definition, resource);
                if !has_user_assigned_identities {
                    return false;
                }
            } else {
                // extra (or case-duplicated) fields mean this can't be a match
                return false;
            }
        }

        has_principal_id && has_tenant_id && has_matching_type && has_user_assigned_identities
    }
}

/// `{PrincipalId: string, TenantId: string, Type: {SystemAssigned, None}}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAssignedIdentityMatcher;

impl CustomFieldMatcher for SystemAssignedIdentityMatcher {
    fn custom_field_type(&self) -> CustomFieldType {
        CustomFieldType::SystemAssignedIdentity
    }

    fn is_match(&self, definition: &ApiObjectDefinition, resource: &ApiResource) -> bool {
        let Some(model) = referenced_model(definition, resource) else {
            return false;
        };

        let mut has_principal_id = false;
        let mut has_tenant_id = false;
        let mut has_matching_type = false;

        for (field_name, field) in &model.fields {
            if field_name.eq_ignore_ascii_case("PrincipalId") && !has_principal_id {
                has_principal_id = is_string(&field.object_definition);
                if !has_principal_id {
                    return false;
                }
            } else if field_name.eq_ignore_ascii_case("TenantId") && !has_tenant_id {
                has_tenant_id = is_string(&field.object_definition);
                if !has_tenant_id {
                    return false;
                }
            } else if field_name.eq_ignore_ascii_case("Type") && !has_matching_type {
                has_matching_type = is_constant_with_values(
                    &field.object_definition,
                    resource,
                    &["SystemAssigned", "None"],
                );
                if !has_matching_type {
                    return false;
                }
            } else {
                return false;
            }
        }

        has_principal_id && has_tenant_id && has_matching_type
    }
}

/// The model a direct reference points at, if any.
fn referenced_model<'a>(
    definition: &ApiObjectDefinition,
    resource: &'a ApiResource,
) -> Option<&'a ApiModel> {
    let ApiObjectDefinition::Reference { reference_name } = definition else {
        return None;
    };
    // a name that is also a constant is ambiguous; leave it to the resolver
    if resource.constants.contains_key(reference_name) {
        return None;
    }
    resource.models.get(reference_name)
}

fn is_string(definition: &ApiObjectDefinition) -> bool {
    matches!(definition, ApiObjectDefinition::String)
}

fn is_constant_with_values(
    definition: &ApiObjectDefinition,
    resource: &ApiResource,
    expected: &[&str],
) -> bool {
    let ApiObjectDefinition::Reference { reference_name } = definition else {
        return false;
    };
    resource
        .constants
        .get(reference_name)
        .is_some_and(|constant| constant.has_exact_values(expected))
}

/// Dictionary of a model with exactly `{ClientId: string, PrincipalId: string}`.
fn is_map_of_user_assigned_identity(
    definition: &ApiObjectDefinition,
    resource: &ApiResource,
) -> bool {
    let ApiObjectDefinition::Dictionary { nested_item } = definition else {
        return false;
    };
    let Some(inner) = referenced_model(nested_item, resource) else {
        return false;
    };

    let mut has_client_id = false;
    let mut has_principal_id = false;
    for (field_name, field) in &inner.fields {
        if field_name.eq_ignore_ascii_case("ClientId") && !has_client_id {
            has_client_id = is_string(&field.object_definition);
            if !has_client_id {
                return false;
            }
        } else if field_name.eq_ignore_ascii_case("PrincipalId") && !has_principal_id {
            has_principal_id = is_string(&field.object_definition);
            if !has_principal_id {
                return false;
            }
        } else {
            return false;
        }
    }

    has_client_id && has_principal_id
}

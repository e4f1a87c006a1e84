use iac_schema_models::{FieldMapping, MappingDefinition};
use tracing::debug;

use super::ModelProcessor;
use crate::build::SchemaModels;
use crate::error::Result;

/// Drops the service-managed `ProvisioningState` field (and its mapping).
/// A settable field of that name is left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveProvisioningState;

impl ModelProcessor for RemoveProvisioningState {
    fn name(&self) -> &'static str {
        "remove_provisioning_state"
    }

    fn process_model(
        &self,
        model_name: &str,
        models: &mut SchemaModels,
        mappings: &mut MappingDefinition,
    ) -> Result<()> {
        let Some(model) = models.get_mut(model_name) else {
            return Ok(());
        };

        let removed: Vec<String> = model
            .fields
            .iter()
            .filter(|(name, field)| name.eq_ignore_ascii_case("ProvisioningState") && field.computed)
            .map(|(name, _)| name.clone())
            .collect();

        for field_name in removed {
            model.fields.remove(&field_name);
            mappings.fields.retain(|m| match m {
                FieldMapping::DirectAssignment(d) => {
                    d.schema_model_name != model_name || d.schema_field_name != field_name
                }
                FieldMapping::ModelToModel(_) => true,
            });
            debug!(model = %model_name, field = %field_name, "removed provisioning state");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use iac_schema_models::{SchemaField, SchemaModel, SchemaObjectDefinition};

    use super::*;

    #[test]
    fn removes_computed_provisioning_state_only() {
        let mut root = SchemaModel::default();
        root.fields.insert(
            "ProvisioningState".to_string(),
            SchemaField::new(SchemaObjectDefinition::String, false, false),
        );
        root.fields.insert(
            "Colour".to_string(),
            SchemaField::new(SchemaObjectDefinition::String, false, true),
        );
        let mut child = SchemaModel::default();
        child.fields.insert(
            "ProvisioningState".to_string(),
            SchemaField::new(SchemaObjectDefinition::String, false, true),
        );
        let mut models =
            SchemaModels::from([("Root".to_string(), root), ("RootChild".to_string(), child)]);
        let mut mappings = MappingDefinition {
            fields: vec![
                FieldMapping::direct("Root", "ProvisioningState", "Props", "ProvisioningState"),
                FieldMapping::direct("Root", "Colour", "Props", "Colour"),
                FieldMapping::direct("RootChild", "ProvisioningState", "Child", "ProvisioningState"),
            ],
            resource_id: Vec::new(),
        };

        for name in ["Root", "RootChild"] {
            RemoveProvisioningState
                .process_model(name, &mut models, &mut mappings)
                .unwrap();
        }

        assert!(!models["Root"].fields.contains_key("ProvisioningState"));
        assert!(models["RootChild"].fields.contains_key("ProvisioningState"));
        assert_eq!(mappings.fields.len(), 2);
        assert!(!mappings
            .fields
            .contains(&FieldMapping::direct("Root", "ProvisioningState", "Props", "ProvisioningState")));
    }
}

use iac_schema_models::{MappingDefinition, SchemaObjectDefinition};

use super::{FlattenedField, ModelProcessor};
use crate::build::SchemaModels;
use crate::error::Result;
use crate::naming::singular;

/// Replaces references to models holding nothing but a string `Id` with the
/// ID itself: `Subnet { Id }` → `SubnetId: string`, and a list of them
/// → `SubnetIds: [string]` (`Addresses` → `AddressIds`).
#[derive(Debug, Clone, Copy, Default)]
pub struct FlattenReferenceId;

impl ModelProcessor for FlattenReferenceId {
    fn name(&self) -> &'static str {
        "flatten_reference_id"
    }

    fn process_model(
        &self,
        model_name: &str,
        models: &mut SchemaModels,
        mappings: &mut MappingDefinition,
    ) -> Result<()> {
        let Some(model) = models.get(model_name) else {
            return Ok(());
        };

        let rewrites: Vec<FlattenedField> = model
            .fields
            .iter()
            .filter_map(|(field_name, field)| {
                let (target, is_list) = match &field.object_definition {
                    SchemaObjectDefinition::Reference { reference_name } => (reference_name, false),
                    SchemaObjectDefinition::List { nested_object } => match nested_object.as_ref() {
                        SchemaObjectDefinition::Reference { reference_name } => {
                            (reference_name, true)
                        }
                        _ => return None,
                    },
                    _ => return None,
                };
                let id_field = id_only_field(models.get(target)?)?;

                let mut replacement = field.clone();
                replacement.validation = None;
                let new_field_name = if is_list {
                    replacement.object_definition =
                        SchemaObjectDefinition::list(SchemaObjectDefinition::String);
                    format!("{}Ids", singular(field_name))
                } else {
                    replacement.object_definition = SchemaObjectDefinition::String;
                    format!("{field_name}Id")
                };

                Some(FlattenedField {
                    model_name: model_name.to_string(),
                    field_name: field_name.clone(),
                    new_field_name,
                    replacement,
                    target_model: target.clone(),
                    target_field: id_field.to_string(),
                })
            })
            .collect();

        for rewrite in rewrites {
            rewrite.apply(models, mappings);
        }
        Ok(())
    }
}

/// Name of the model's only field, if it is a string called `Id`.
fn id_only_field(model: &iac_schema_models::SchemaModel) -> Option<&str> {
    let mut fields = model.fields.iter();
    let (name, field) = fields.next()?;
    let is_id = fields.next().is_none()
        && name.eq_ignore_ascii_case("Id")
        && field.object_definition == SchemaObjectDefinition::String;
    is_id.then_some(name.as_str())
}

use iac_schema_models::{MappingDefinition, SchemaModel, SchemaObjectDefinition};

use super::{FlattenedField, ModelProcessor};
use crate::build::SchemaModels;
use crate::error::Result;

/// Replaces a `Sku` block with a `SkuName` string when `Name` is the only
/// field of the block the user can set. The name's possible values carry
/// over as validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlattenSkuName;

impl ModelProcessor for FlattenSkuName {
    fn name(&self) -> &'static str {
        "flatten_sku_name"
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

        let rewrite = model.fields.iter().find_map(|(field_name, field)| {
            if !field_name.eq_ignore_ascii_case("Sku") {
                return None;
            }
            let SchemaObjectDefinition::Reference { reference_name } = &field.object_definition
            else {
                return None;
            };
            let sku_model = models.get(reference_name)?;
            let (name_field_name, name_field) = settable_name_field(sku_model)?;

            let mut replacement = field.clone();
            replacement.object_definition = SchemaObjectDefinition::String;
            replacement.validation.clone_from(&name_field.validation);
            if name_field.description.is_some() {
                replacement.description.clone_from(&name_field.description);
            }

            Some(FlattenedField {
                model_name: model_name.to_string(),
                field_name: field_name.clone(),
                new_field_name: format!("{field_name}Name"),
                replacement,
                target_model: reference_name.clone(),
                target_field: name_field_name.to_string(),
            })
        });

        if let Some(rewrite) = rewrite {
            rewrite.apply(models, mappings);
        }
        Ok(())
    }
}

/// The string `Name` field, if every other field of the SKU is computed.
fn settable_name_field(
    sku: &SchemaModel,
) -> Option<(&str, &iac_schema_models::SchemaField)> {
    let (name, field) = sku
        .fields
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("Name"))?;
    if field.object_definition != SchemaObjectDefinition::String {
        return None;
    }
    let others_computed = sku
        .fields
        .iter()
        .filter(|(other, _)| *other != name)
        .all(|(_, f)| f.computed);
    others_computed.then_some((name.as_str(), field))
}

#[cfg(test)]
mod tests {
    use iac_schema_models::{FieldMapping, FieldValidation, SchemaField};
    use pretty_assertions::assert_eq;

    use super::*;

    fn setup(tier_computed: bool) -> (SchemaModels, MappingDefinition) {
        let mut root = SchemaModel::default();
        root.fields.insert(
            "Sku".to_string(),
            SchemaField::new(SchemaObjectDefinition::reference("RootSku"), true, false),
        );

        let mut sku = SchemaModel::default();
        let mut name = SchemaField::new(SchemaObjectDefinition::String, true, false);
        name.validation = Some(FieldValidation::PossibleValues {
            values: vec!["Basic".to_string(), "Premium".to_string()],
        });
        sku.fields.insert("Name".to_string(), name);
        sku.fields.insert(
            "Tier".to_string(),
            SchemaField::new(SchemaObjectDefinition::String, false, !tier_computed),
        );

        let models = SchemaModels::from([("Root".to_string(), root), ("RootSku".to_string(), sku)]);
        let mappings = MappingDefinition {
            fields: vec![
                FieldMapping::direct("Root", "Sku", "Namespace", "Sku"),
                FieldMapping::direct("RootSku", "Name", "Sku", "Name"),
                FieldMapping::direct("RootSku", "Tier", "Sku", "Tier"),
            ],
            resource_id: Vec::new(),
        };
        (models, mappings)
    }

    #[test]
    fn flattens_sku_with_only_settable_name() {
        let (mut models, mut mappings) = setup(true);
        FlattenSkuName
            .process_model("Root", &mut models, &mut mappings)
            .unwrap();

        let sku_name = &models["Root"].fields["SkuName"];
        assert!(sku_name.required);
        assert_eq!(sku_name.object_definition, SchemaObjectDefinition::String);
        assert_eq!(
            sku_name.validation,
            Some(FieldValidation::PossibleValues {
                values: vec!["Basic".to_string(), "Premium".to_string()],
            })
        );
        assert!(!models["Root"].fields.contains_key("Sku"));
        assert!(mappings
            .fields
            .contains(&FieldMapping::model_to_model("Root", "Namespace", "Sku")));
        assert!(mappings
            .fields
            .contains(&FieldMapping::direct("Root", "SkuName", "Sku", "Name")));

        let (once_models, once_mappings) = (models.clone(), mappings.clone());
        FlattenSkuName
            .process_model("Root", &mut models, &mut mappings)
            .unwrap();
        assert_eq!(models, once_models);
        assert_eq!(mappings, once_mappings);
    }

    #[test]
    fn keeps_sku_with_other_settable_fields() {
        let (mut models, mut mappings) = setup(false);
        let before = (models.clone(), mappings.clone());
        FlattenSkuName
            .process_model("Root", &mut models, &mut mappings)
            .unwrap();
        assert_eq!((models, mappings), before);
    }
}

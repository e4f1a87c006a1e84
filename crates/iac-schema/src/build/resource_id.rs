//! Top-level fields derived from the resource ID.
//!
//! For `/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.EventHub/namespaces/{namespaceName}/eventhubs/{eventHubName}`:
//!
//! | field         | source                                                        |
//! |---------------|---------------------------------------------------------------|
//! | `Name`        | `eventHubName`                                                |
//! | `NamespaceId` | `subscriptionId`, `resourceGroupName`, `namespaceName` (parent) |
//!
//! Without a user-specified parent the resource group (and/or scope) get
//! fields of their own. The subscription comes from provider configuration.

use std::collections::BTreeMap;

use iac_schema_models::{
    MappingDefinition, ResourceIdDefinition, ResourceIdMapping, ResourceIdSegment, SchemaField,
    SchemaObjectDefinition, SegmentType,
};

use crate::naming::capitalize;

/// Schema fields (keyed by name) identifying the resource, recording one
/// [`ResourceIdMapping`] per segment they cover.
pub(crate) fn fields_within_resource_id(
    id: &ResourceIdDefinition,
    mappings: &mut MappingDefinition,
) -> BTreeMap<String, SchemaField> {
    let mut fields = BTreeMap::new();
    let user_specified: Vec<&ResourceIdSegment> =
        id.segments_of_type(SegmentType::UserSpecified).collect();

    let Some((name_segment, parents)) = user_specified.split_last() else {
        // singleton / scope-only resources: addressed by their parent alone
        add_parent_fields(id, None, &mut fields, mappings);
        return fields;
    };

    fields.insert(
        "Name".to_string(),
        identifier_field(format!("The name of this resource ({}).", name_segment.name)),
    );
    mappings.resource_id.push(ResourceIdMapping {
        schema_field_name: "Name".to_string(),
        segment_name: name_segment.name.clone(),
        parsed_from_parent_id: false,
    });

    add_parent_fields(id, parents.last().copied(), &mut fields, mappings);
    fields
}

fn add_parent_fields(
    id: &ResourceIdDefinition,
    parent: Option<&ResourceIdSegment>,
    fields: &mut BTreeMap<String, SchemaField>,
    mappings: &mut MappingDefinition,
) {
    if let Some(parent) = parent {
        let field_name = parent_id_field_name(&parent.name);
        fields.insert(
            field_name.clone(),
            identifier_field(format!("The ID of the parent resource ({}).", parent.name)),
        );

        // everything before the resource's own name is read from the parent ID
        let name_index = id
            .segments
            .iter()
            .rposition(|s| s.segment_type == SegmentType::UserSpecified);
        let parent_segments = id.segments[..name_index.unwrap_or(0)]
            .iter()
            .filter(|s| {
                matches!(
                    s.segment_type,
                    SegmentType::SubscriptionId
                        | SegmentType::ResourceGroup
                        | SegmentType::Scope
                        | SegmentType::UserSpecified
                )
            });
        for segment in parent_segments {
            mappings.resource_id.push(ResourceIdMapping {
                schema_field_name: field_name.clone(),
                segment_name: segment.name.clone(),
                parsed_from_parent_id: true,
            });
        }
        return;
    }

    for segment in id.segments_of_type(SegmentType::Scope) {
        fields.insert(
            "Scope".to_string(),
            identifier_field("The scope this resource is created within.".to_string()),
        );
        mappings.resource_id.push(ResourceIdMapping {
            schema_field_name: "Scope".to_string(),
            segment_name: segment.name.clone(),
            parsed_from_parent_id: false,
        });
    }
    for segment in id.segments_of_type(SegmentType::ResourceGroup) {
        fields.insert(
            "ResourceGroupName".to_string(),
            identifier_field("The name of the resource group.".to_string()),
        );
        mappings.resource_id.push(ResourceIdMapping {
            schema_field_name: "ResourceGroupName".to_string(),
            segment_name: segment.name.clone(),
            parsed_from_parent_id: false,
        });
    }
}

/// `namespaceName` → `NamespaceId`.
fn parent_id_field_name(segment_name: &str) -> String {
    let base = segment_name.strip_suffix("Name").unwrap_or(segment_name);
    format!("{}Id", capitalize(base))
}

fn identifier_field(description: String) -> SchemaField {
    let mut field = SchemaField::new(SchemaObjectDefinition::String, true, false);
    field.force_new = true;
    field.description = Some(description);
    field
}

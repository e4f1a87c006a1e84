//! Locating the create/read/update payload models of a resource.

use std::ops::ControlFlow;

use iac_schema_models::{ApiModel, ApiObjectDefinition, ApiResource};

use super::{ResourceBuildInput, SkipReason};

/// Which operation a payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PayloadKind {
    Create,
    Read,
    Update,
}

/// The model carried by one operation's payload.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Payload<'a> {
    pub(crate) kind: PayloadKind,
    pub(crate) model_name: &'a str,
    pub(crate) model: &'a ApiModel,
    pub(crate) properties: Option<PropertiesModel<'a>>,
}

/// The nested `properties` block of a payload model.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PropertiesModel<'a> {
    /// Field within the payload model holding the block.
    pub(crate) field_name: &'a str,
    pub(crate) model_name: &'a str,
    pub(crate) model: &'a ApiModel,
}

/// The payloads of one resource. Create and read are mandatory.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OperationPayloads<'a> {
    pub(crate) create: Payload<'a>,
    pub(crate) read: Payload<'a>,
    pub(crate) update: Option<Payload<'a>>,
}

impl<'a> OperationPayloads<'a> {
    /// Create, read, then update.
    pub(crate) fn all(&self) -> impl Iterator<Item = &Payload<'a>> {
        [Some(&self.create), Some(&self.read), self.update.as_ref()]
            .into_iter()
            .flatten()
    }
}

/// Find the payload models for the operations named in `input`.
///
/// Breaks with [`SkipReason::NotApplicable`] if create or read is missing or
/// does not carry a single model, or if an update operation is named but
/// unusable.
pub(crate) fn find_create_read_update_payloads<'a>(
    resource: &'a ApiResource,
    input: &ResourceBuildInput,
) -> ControlFlow<SkipReason, OperationPayloads<'a>> {
    let create = find_payload(resource, &input.create_method, PayloadKind::Create)?;
    let read = find_payload(resource, &input.read_method, PayloadKind::Read)?;
    let update = match &input.update_method {
        Some(method) => Some(find_payload(resource, method, PayloadKind::Update)?),
        None => None,
    };

    ControlFlow::Continue(OperationPayloads {
        create,
        read,
        update,
    })
}

fn find_payload<'a>(
    resource: &'a ApiResource,
    method: &str,
    kind: PayloadKind,
) -> ControlFlow<SkipReason, Payload<'a>> {
    let label = match kind {
        PayloadKind::Create => "create",
        PayloadKind::Read => "read",
        PayloadKind::Update => "update",
    };

    let Some(operation) = resource.operations.get(method) else {
        return skip(format!("{label} operation {method:?} was not found"));
    };
    let object = match kind {
        PayloadKind::Create | PayloadKind::Update => operation.request_object.as_ref(),
        PayloadKind::Read => operation.response_object.as_ref(),
    };
    let Some(object) = object else {
        return skip(format!("{label} operation {method:?} has no payload"));
    };
    let ApiObjectDefinition::Reference { reference_name } = object else {
        return skip(format!(
            "{label} operation {method:?} payload is not a single model"
        ));
    };
    let Some((model_name, model)) = resource.models.get_key_value(reference_name) else {
        return skip(format!(
            "{label} operation {method:?} payload {reference_name:?} is not a model"
        ));
    };

    ControlFlow::Continue(Payload {
        kind,
        model_name,
        model,
        properties: properties_model(resource, model),
    })
}

/// The model referenced by a `properties` field, matched case-insensitively.
fn properties_model<'a>(
    resource: &'a ApiResource,
    model: &'a ApiModel,
) -> Option<PropertiesModel<'a>> {
    model.fields.iter().find_map(|(field_name, field)| {
        if !field_name.eq_ignore_ascii_case("properties") {
            return None;
        }
        let ApiObjectDefinition::Reference { reference_name } = &field.object_definition else {
            return None;
        };
        let (model_name, model) = resource.models.get_key_value(reference_name)?;
        Some(PropertiesModel {
            field_name,
            model_name,
            model,
        })
    })
}

fn skip<T>(reason: String) -> ControlFlow<SkipReason, T> {
    ControlFlow::Break(SkipReason::not_applicable(reason))
}

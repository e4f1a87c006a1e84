//! Resource identifier definitions.
//!
//! Resource IDs are supplied as ARM-style URI templates and parsed into typed
//! segments:
//!
//! ```text
//! /subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.EventHub/namespaces/{namespaceName}
//!  └─ static ──┘ └ subscription ┘ └── static ──┘ └─ resource group ─┘ └ static ┘ └ provider ──────┘ └ static ┘ └ user ───────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a single resource ID segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentType {
    /// Fixed literal (e.g. `resourceGroups`).
    Static,
    /// Resource provider namespace following `providers` (e.g. `Microsoft.EventHub`).
    ResourceProvider,
    /// `{subscriptionId}` following `subscriptions`.
    SubscriptionId,
    /// `{resourceGroupName}` following `resourceGroups`.
    ResourceGroup,
    /// Leading `{scope}` placeholder for extension resources.
    Scope,
    /// Any other `{placeholder}` supplied by the user.
    UserSpecified,
}

/// A single parsed segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceIdSegment {
    /// Segment name (`namespaceName`, `staticProviders`, …).
    pub name: String,
    /// Segment kind.
    pub segment_type: SegmentType,
    /// Literal value for static and provider segments.
    pub fixed_value: Option<String>,
}

/// A resource ID template with its parsed segments.
///
/// Serialized as the template string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceIdDefinition {
    /// Original template, e.g. `/subscriptions/{subscriptionId}/…`.
    pub id: String,
    /// Parsed segments in order.
    pub segments: Vec<ResourceIdSegment>,
}

/// Error returned when a resource ID template cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResourceIdError(String);

impl fmt::Display for ParseResourceIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseResourceIdError {}

impl ResourceIdDefinition {
    /// Parse an ARM-style template into segments.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is empty, does not start with `/`,
    /// or contains an unterminated `{placeholder}`.
    pub fn parse(template: &str) -> Result<Self, ParseResourceIdError> {
        let Some(rest) = template.strip_prefix('/') else {
            return Err(ParseResourceIdError(format!(
                "resource ID {template:?} must start with '/'"
            )));
        };

        let mut segments: Vec<ResourceIdSegment> = Vec::new();
        for (index, raw) in rest.split('/').filter(|s| !s.is_empty()).enumerate() {
            let previous = segments.last().and_then(|s| s.fixed_value.as_deref());

            let segment = if let Some(inner) = raw.strip_prefix('{') {
                let Some(name) = inner.strip_suffix('}') else {
                    return Err(ParseResourceIdError(format!(
                        "unterminated placeholder {raw:?} in resource ID {template:?}"
                    )));
                };
                let segment_type = match previous {
                    Some(p) if p.eq_ignore_ascii_case("subscriptions") => {
                        SegmentType::SubscriptionId
                    }
                    Some(p) if p.eq_ignore_ascii_case("resourceGroups") => {
                        SegmentType::ResourceGroup
                    }
                    None if index == 0 && name.eq_ignore_ascii_case("scope") => {
                        SegmentType::Scope
                    }
                    _ => SegmentType::UserSpecified,
                };
                ResourceIdSegment {
                    name: name.to_string(),
                    segment_type,
                    fixed_value: None,
                }
            } else {
                let segment_type = match previous {
                    Some(p) if p.eq_ignore_ascii_case("providers") => {
                        SegmentType::ResourceProvider
                    }
                    _ => SegmentType::Static,
                };
                ResourceIdSegment {
                    name: static_segment_name(raw),
                    segment_type,
                    fixed_value: Some(raw.to_string()),
                }
            };
            segments.push(segment);
        }

        if segments.is_empty() {
            return Err(ParseResourceIdError(format!(
                "resource ID {template:?} has no segments"
            )));
        }

        Ok(Self {
            id: template.to_string(),
            segments,
        })
    }

    /// Template string used for display in error messages.
    #[must_use]
    pub fn display_value(&self) -> &str {
        &self.id
    }

    /// Segments of the given kind, in order.
    pub fn segments_of_type(
        &self,
        segment_type: SegmentType,
    ) -> impl Iterator<Item = &ResourceIdSegment> {
        self.segments
            .iter()
            .filter(move |s| s.segment_type == segment_type)
    }
}

impl TryFrom<String> for ResourceIdDefinition {
    type Error = ParseResourceIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ResourceIdDefinition> for String {
    fn from(value: ResourceIdDefinition) -> Self {
        value.id
    }
}

/// `Microsoft.EventHub` → `staticMicrosoftEventHub`.
fn static_segment_name(raw: &str) -> String {
    let mut name = String::from("static");
    let mut capitalize_next = true;
    for c in raw.chars() {
        if !c.is_ascii_alphanumeric() {
            capitalize_next = true;
            continue;
        }
        if capitalize_next {
            name.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            name.push(c);
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_resource_group_scoped_id() {
        let id = ResourceIdDefinition::parse(
            "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.EventHub/namespaces/{namespaceName}",
        )
        .unwrap();

        let kinds: Vec<SegmentType> = id.segments.iter().map(|s| s.segment_type).collect();
        assert_eq!(
            kinds,
            vec![
                SegmentType::Static,
                SegmentType::SubscriptionId,
                SegmentType::Static,
                SegmentType::ResourceGroup,
                SegmentType::Static,
                SegmentType::ResourceProvider,
                SegmentType::Static,
                SegmentType::UserSpecified,
            ]
        );
        assert_eq!(id.segments[5].name, "staticMicrosoftEventHub");
        assert_eq!(id.segments[7].name, "namespaceName");
    }

    #[test]
    fn parse_scope_id() {
        let id = ResourceIdDefinition::parse(
            "/{scope}/providers/Microsoft.Authorization/locks/{lockName}",
        )
        .unwrap();
        assert_eq!(id.segments[0].segment_type, SegmentType::Scope);
        assert_eq!(
            id.segments_of_type(SegmentType::UserSpecified).count(),
            1
        );
    }

    #[test]
    fn parse_rejects_relative_and_unterminated() {
        assert!(ResourceIdDefinition::parse("subscriptions/{id}").is_err());
        assert!(ResourceIdDefinition::parse("/subscriptions/{id").is_err());
        assert!(ResourceIdDefinition::parse("/").is_err());
    }

    #[test]
    fn serde_round_trips_template() {
        let template = "/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}";
        let id: ResourceIdDefinition =
            serde_yaml_ng::from_str(&format!("\"{template}\"")).unwrap();
        assert_eq!(id.display_value(), template);
        let out = serde_yaml_ng::to_string(&id).unwrap();
        assert!(out.contains(template));
    }
}

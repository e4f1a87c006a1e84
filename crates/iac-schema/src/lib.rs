#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! ## API Reference

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod build;
mod config;
mod error;
mod matchers;
mod naming;
mod normalize;
mod processors;

use std::collections::BTreeMap;

pub use build::{
    BuildOutcome, Builder, FieldOverride, ResourceBuildInfo, ResourceBuildInput, ResourceSchema,
    SchemaModels, SkipReason,
};
pub use config::{
    load_api_resource, MatcherConfig, ProcessorConfig, ProjectConfig, ResourceConfig,
};
pub use error::{Error, Result};
pub use matchers::{
    CustomFieldMatcher, MatcherRegistry, SystemAssignedIdentityMatcher,
    SystemOrUserAssignedIdentityMapMatcher,
};
pub use processors::{
    FlattenReferenceId, FlattenSkuName, ModelProcessor, ProcessorPipeline,
    RemoveProvisioningState, MAX_SWEEPS,
};

pub use iac_schema_models as models;

/// Build every resource listed in `project`, keyed by schema model name.
///
/// Resources are independent: each gets its own mapping table, and a skipped
/// resource does not affect the others.
///
/// # Errors
///
/// The first resource that fails, annotated with its schema model name.
pub fn build_project(
    resource: &models::ApiResource,
    project: &ProjectConfig,
) -> Result<BTreeMap<String, BuildOutcome>> {
    use error::ResultExt;

    let builder = Builder::new(resource).with_project_config(project);
    project
        .resources
        .iter()
        .map(|entry| {
            let name = &entry.input.schema_model_name;
            builder
                .build(&entry.input, Some(&entry.info))
                .context(|| format!("building resource {name:?}"))
                .map(|outcome| (name.clone(), outcome))
        })
        .collect()
}

/// Internal helpers exposed for integration tests.
///
/// **Not covered by semver guarantees.**
#[doc(hidden)]
pub mod internal {
    /// `PascalCase` → `snake_case` display-name conversion.
    #[must_use]
    pub fn to_snake_case(s: &str) -> String {
        crate::naming::to_snake_case(s)
    }
}

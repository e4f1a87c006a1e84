//! Project-level configuration and input loading.
//!
//! A project file lists the resources to build out of one API resource and
//! toggles the built-in rules. YAML and TOML are both accepted (by file
//! extension).
//!
//! # File format
//!
//! ```yaml
//! # iac-schema.yaml
//! resources:
//!   - schema_model_name: EventHubNamespaceResource
//!     resource_id_name: NamespaceId
//!     create_method: CreateOrUpdate
//!     read_method: Get
//!     update_method: Update
//!     overrides:
//!       - name: ZoneRedundant
//!         updated_name: ZoneRedundancyEnabled
//!
//! # Processor toggles (all default to true).
//! processors:
//!   flatten_reference_id: true
//!   flatten_sku_name: true
//!   remove_provisioning_state: false
//!
//! # Custom field matcher toggles (all default to true).
//! matchers:
//!   system_or_user_assigned_identity_map: true
//!   system_assigned_identity: true
//! ```

use std::path::Path;

use iac_schema_models::ApiResource;
use serde::Deserialize;

use crate::build::{ResourceBuildInfo, ResourceBuildInput};
use crate::error::{Result, ResultExt};
use crate::matchers::{MatcherRegistry, SystemAssignedIdentityMatcher, SystemOrUserAssignedIdentityMapMatcher};
use crate::processors::{
    FlattenReferenceId, FlattenSkuName, ProcessorPipeline, RemoveProvisioningState,
};

/// Project-level schema generation config.
///
/// Loaded via [`ProjectConfig::load`] and applied to a
/// [`Builder`](crate::Builder) via
/// [`Builder::with_project_config`](crate::Builder::with_project_config).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Resources to build.
    pub resources: Vec<ResourceConfig>,

    /// Processor toggles.
    pub processors: ProcessorConfig,

    /// Custom field matcher toggles.
    pub matchers: MatcherConfig,
}

/// One resource entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    /// Operations and identifiers.
    #[serde(flatten)]
    pub input: ResourceBuildInput,

    /// Field overrides.
    #[serde(flatten)]
    pub info: ResourceBuildInfo,
}

/// Which built-in processors run. All default to `true`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Run [`FlattenReferenceId`].
    pub flatten_reference_id: bool,

    /// Run [`FlattenSkuName`].
    pub flatten_sku_name: bool,

    /// Run [`RemoveProvisioningState`].
    pub remove_provisioning_state: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            flatten_reference_id: true,
            flatten_sku_name: true,
            remove_provisioning_state: true,
        }
    }
}

impl ProcessorConfig {
    /// The enabled built-in processors, in their default order.
    #[must_use]
    pub fn pipeline(&self) -> ProcessorPipeline {
        let mut pipeline = ProcessorPipeline::empty();
        if self.flatten_reference_id {
            pipeline = pipeline.register(FlattenReferenceId);
        }
        if self.flatten_sku_name {
            pipeline = pipeline.register(FlattenSkuName);
        }
        if self.remove_provisioning_state {
            pipeline = pipeline.register(RemoveProvisioningState);
        }
        pipeline
    }
}

/// Which built-in matchers are registered. All default to `true`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Register [`SystemOrUserAssignedIdentityMapMatcher`].
    pub system_or_user_assigned_identity_map: bool,

    /// Register [`SystemAssignedIdentityMatcher`].
    pub system_assigned_identity: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            system_or_user_assigned_identity_map: true,
            system_assigned_identity: true,
        }
    }
}

impl MatcherConfig {
    /// The enabled built-in matchers, in their default precedence.
    #[must_use]
    pub fn registry(&self) -> MatcherRegistry {
        let mut registry = MatcherRegistry::empty();
        if self.system_or_user_assigned_identity_map {
            registry = registry.register(SystemOrUserAssignedIdentityMapMatcher);
        }
        if self.system_assigned_identity {
            registry = registry.register(SystemAssignedIdentityMatcher);
        }
        registry
    }
}

impl ProjectConfig {
    /// Load from a YAML (`.yaml`/`.yml`) or TOML (`.toml`) file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        if is_toml(path) {
            Ok(toml::from_str(&content)?)
        } else {
            Ok(serde_yaml_ng::from_str(&content)?)
        }
    }

    /// The resource entry whose schema model name is `name`.
    #[must_use]
    pub fn resource(&self, name: &str) -> Option<&ResourceConfig> {
        self.resources
            .iter()
            .find(|r| r.input.schema_model_name == name)
    }
}

/// Load an [`ApiResource`] from a JSON (`.json`) or YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_api_resource(path: &Path) -> Result<ApiResource> {
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let parsed: Result<ApiResource> = if is_json {
        serde_json::from_str(&content).map_err(Into::into)
    } else {
        serde_yaml_ng::from_str(&content).map_err(Into::into)
    };
    parsed.context(|| format!("parsing API resource {}", path.display()))
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

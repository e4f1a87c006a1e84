//! Typed error enum for the `iac-schema` library API.
//!
//! Library consumers can match on specific variants (use
//! [`Error::root_cause`] to look through [`Error::Context`] wrappers). The
//! CLI (`main.rs`) converts these to `anyhow::Error` at the binary boundary.
//!
//! A resource that is simply not eligible for schema generation is *not* an
//! error (see [`SkipReason`](crate::SkipReason)).

/// Errors produced by `iac-schema` library operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// File I/O failure (reading config or API resource files).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error(transparent)]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON parsing failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML config parsing failure.
    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    /// A reference resolves to neither a model nor a constant.
    #[error("reference {name:?} was neither a constant nor a model")]
    ReferenceNotFound {
        /// The unresolved reference name.
        name: String,
    },

    /// A reference resolves to both a model and a constant.
    #[error("reference {name:?} was both a constant and a model")]
    AmbiguousReference {
        /// The ambiguous reference name.
        name: String,
    },

    /// The same model name was discovered twice with different fields.
    #[error("duplicate models named {model:?} were parsed with different fields: {first:?} / {second:?}")]
    DuplicateModelShape {
        /// Model name.
        model: String,
        /// Field names of the first discovery.
        first: Vec<String>,
        /// Field names of the second discovery.
        second: Vec<String>,
    },

    /// Two fields in one schema model share a display name but reference
    /// different models.
    #[error(
        "found duplicate HCL name {hcl_name:?} in model {model:?} referencing both {first:?} and {second:?}"
    )]
    DuplicateHclName {
        /// Schema model holding both fields.
        model: String,
        /// The shared display name.
        hcl_name: String,
        /// Reference target of the first field.
        first: String,
        /// Reference target of the second field.
        second: String,
    },

    /// Two SDK fields (or an SDK field and a resource ID segment) produce
    /// the same schema field name in one model, usually through an override.
    #[error("schema field {field:?} in model {model:?} is produced by both {first:?} and {second:?}")]
    DuplicateSchemaField {
        /// Schema model holding the field.
        model: String,
        /// The shared schema field name.
        field: String,
        /// SDK field (or segment) that produced the field first.
        first: String,
        /// SDK field (or segment) that produced it again.
        second: String,
    },

    /// The processor pipeline kept rewriting models after its sweep limit.
    #[error("processors were still changing models after {sweeps} sweeps")]
    ProcessorsDidNotSettle {
        /// Number of sweeps run.
        sweeps: usize,
    },

    /// The resource ID named by the build input does not exist.
    #[error("couldn't find Resource ID named {name:?}")]
    ResourceIdNotFound {
        /// The missing resource ID name.
        name: String,
    },

    /// A mapping names an SDK model that does not exist.
    #[error("the SDK Model {model:?} was not found")]
    SdkModelNotFound {
        /// The missing model name.
        model: String,
    },

    /// A mapping names an SDK field that does not exist.
    #[error("field {field:?} was not found in SDK Model {model:?}")]
    SdkFieldNotFound {
        /// Model the field was looked up in.
        model: String,
        /// The missing field name.
        field: String,
    },

    /// A retained schema field references a schema model that no longer
    /// exists (typically left behind by a processor).
    #[error("field {field:?} in model {model:?} references missing model {reference:?}")]
    DanglingReference {
        /// Schema model holding the field.
        model: String,
        /// Schema field name.
        field: String,
        /// The missing target model.
        reference: String,
    },

    /// Another error, annotated with the stage or entity that produced it.
    #[error("{context}: {source}")]
    Context {
        /// What was being done, e.g. `building nested model "Foo"`.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// The innermost error, looking through [`Error::Context`] wrappers.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Convenience alias used throughout the library's public API.
pub type Result<T> = std::result::Result<T, Error>;

/// Attach stage/entity context to a library error.
pub(crate) trait ResultExt<T> {
    /// Wrap the error (if any) in [`Error::Context`].
    fn context<C: Into<String>>(self, context: impl FnOnce() -> C) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context<C: Into<String>>(self, context: impl FnOnce() -> C) -> Result<T> {
        self.map_err(|source| Error::Context {
            context: context().into(),
            source: Box::new(source),
        })
    }
}

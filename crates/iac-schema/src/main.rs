//! CLI for `iac-schema`.
//!
//! # Subcommands
//!
//! ```text
//! # Build every resource listed in the config
//! iac-schema build --api-resource eventhub.json --config iac-schema.yaml --output schema.yaml
//!
//! # Build a single resource, without the SKU flattening rule
//! iac-schema build --api-resource eventhub.json --config iac-schema.yaml \
//!   --resource EventHubNamespaceResource --no-flatten-sku-name
//!
//! # Summarize an API resource
//! iac-schema inspect --api-resource eventhub.json
//! ```

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use iac_schema::models::{ApiObjectDefinition, ApiResource};
use iac_schema::{BuildOutcome, Builder, ProjectConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Infrastructure-as-code schema builder for REST API resources.
#[derive(Parser)]
#[command(name = "iac-schema", version, about)]
struct Cli {
    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Build schema models and mappings for the configured resources.
    Build(BuildArgs),

    /// Print a summary of an API resource: models, constants, operations.
    Inspect(InspectArgs),
}

#[derive(Parser)]
struct BuildArgs {
    /// Path to the API resource (`.json`, otherwise YAML).
    #[arg(short, long)]
    api_resource: PathBuf,

    /// Path to the project config (`.toml`, otherwise YAML).
    #[arg(short, long)]
    config: PathBuf,

    /// Write the result here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only build these resources (schema model names). Repeatable.
    #[arg(short, long)]
    resource: Vec<String>,

    /// Skip the `flatten_reference_id` processor.
    #[arg(long)]
    no_flatten_reference_id: bool,

    /// Skip the `flatten_sku_name` processor.
    #[arg(long)]
    no_flatten_sku_name: bool,

    /// Skip the `remove_provisioning_state` processor.
    #[arg(long)]
    no_remove_provisioning_state: bool,
}

#[derive(Parser)]
struct InspectArgs {
    /// Path to the API resource (`.json`, otherwise YAML).
    #[arg(short, long)]
    api_resource: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "iac_schema=debug" } else { "iac_schema=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Build(args) => run_build(&args),
        Command::Inspect(args) => run_inspect(&args),
    }
}

fn run_build(args: &BuildArgs) -> anyhow::Result<()> {
    info!(path = %args.config.display(), "loading config");
    let mut project = ProjectConfig::load(&args.config)
        .with_context(|| format!("Failed to load config: {}", args.config.display()))?;
    apply_cli_overrides(&mut project, args);

    let resource = load_resource(&args.api_resource)?;

    let selected: Vec<_> = project
        .resources
        .iter()
        .filter(|r| args.resource.is_empty() || args.resource.contains(&r.input.schema_model_name))
        .collect();
    for name in &args.resource {
        if project.resource(name).is_none() {
            bail!("Resource {name:?} is not listed in {}", args.config.display());
        }
    }

    let builder = Builder::new(&resource).with_project_config(&project);
    let mut outcomes = BTreeMap::new();
    for entry in selected {
        let name = &entry.input.schema_model_name;
        let outcome = builder
            .build(&entry.input, Some(&entry.info))
            .with_context(|| format!("Failed to build resource {name:?}"))?;
        match &outcome {
            BuildOutcome::Built(schema) => info!(
                resource = %name,
                models = schema.models.len(),
                mappings = schema.mappings.fields.len(),
                "built"
            ),
            BuildOutcome::Skipped(reason) => info!(resource = %name, %reason, "skipped"),
        }
        outcomes.insert(name.clone(), outcome);
    }

    let rendered = serde_yaml_ng::to_string(&outcomes).context("Failed to serialize schema")?;
    match &args.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write output: {}", path.display()))?;
            info!(path = %path.display(), "wrote schema");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

/// CLI flags can only turn processors off.
fn apply_cli_overrides(project: &mut ProjectConfig, args: &BuildArgs) {
    if args.no_flatten_reference_id {
        project.processors.flatten_reference_id = false;
    }
    if args.no_flatten_sku_name {
        project.processors.flatten_sku_name = false;
    }
    if args.no_remove_provisioning_state {
        project.processors.remove_provisioning_state = false;
    }
}

fn run_inspect(args: &InspectArgs) -> anyhow::Result<()> {
    let resource = load_resource(&args.api_resource)?;

    println!(
        "{} models, {} constants, {} operations, {} resource IDs",
        resource.models.len(),
        resource.constants.len(),
        resource.operations.len(),
        resource.resource_ids.len(),
    );

    println!("\nOperations:");
    for (name, operation) in &resource.operations {
        println!(
            "  {name}: request={} response={} id={}",
            describe(operation.request_object.as_ref()),
            describe(operation.response_object.as_ref()),
            operation.resource_id_name.as_deref().unwrap_or("-"),
        );
    }

    println!("\nResource IDs:");
    for (name, id) in &resource.resource_ids {
        println!("  {name}: {}", id.display_value());
    }

    let discriminated: Vec<&String> = resource
        .models
        .iter()
        .filter(|(_, model)| model.is_discriminated_type())
        .map(|(name, _)| name)
        .collect();
    if !discriminated.is_empty() {
        println!("\nDiscriminated models (resources using these are skipped):");
        for name in discriminated {
            println!("  {name}");
        }
    }
    Ok(())
}

fn load_resource(path: &std::path::Path) -> anyhow::Result<ApiResource> {
    info!(path = %path.display(), "loading API resource");
    iac_schema::load_api_resource(path)
        .with_context(|| format!("Failed to load API resource: {}", path.display()))
}

fn describe(object: Option<&ApiObjectDefinition>) -> String {
    match object {
        None => "-".to_string(),
        Some(ApiObjectDefinition::Reference { reference_name }) => reference_name.clone(),
        Some(ApiObjectDefinition::List { nested_item }) => {
            format!("[{}]", describe(Some(nested_item.as_ref())))
        }
        Some(ApiObjectDefinition::Dictionary { nested_item }) => {
            format!("{{{}}}", describe(Some(nested_item.as_ref())))
        }
        Some(other) => format!("{other:?}"),
    }
}

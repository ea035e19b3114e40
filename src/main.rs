//! schemamap CLI entry point

use std::path::Path;

use clap::Parser;
use eyre::{Context, Result};
use tracing::info;

use schemamap::cli::{Cli, Command};
use schemamap::config::Config;
use schemamap::llm;
use schemamap::pipeline::Pipeline;
use schemamap::store::MappingStore;

fn setup_logging(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!(
        "schemamap loaded config: provider={}, model={}",
        config.llm.provider, config.llm.model
    );

    match cli.command {
        Command::Run {
            vendor,
            vendor_schema,
            target_schema,
            source,
        } => cmd_run(&config, &vendor, &vendor_schema, &target_schema, &source).await,
        Command::Map {
            vendor,
            vendor_schema,
            target_schema,
        } => cmd_map(&config, &vendor, &vendor_schema, &target_schema).await,
        Command::Transform { vendor, source } => cmd_transform(&config, &vendor, &source),
        Command::Mappings { vendor } => cmd_mappings(&config, vendor.as_deref()),
    }
}

/// Full two-stage pipeline: mapping inference then transform
async fn cmd_run(
    config: &Config,
    vendor: &str,
    vendor_schema: &Path,
    target_schema: &Path,
    source: &Path,
) -> Result<()> {
    // Fatal at startup: no stage executes without a credential
    config.validate()?;

    let llm = llm::create_client(&config.llm).context("Failed to create LLM client")?;
    let store = MappingStore::new(config.storage.artifact_dir.clone());
    let mut pipeline = Pipeline::new(llm, store);

    let output = pipeline.run(vendor, vendor_schema, target_schema, source).await?;

    println!("Transform complete: {}", output.display());
    Ok(())
}

/// Mapping inference only
async fn cmd_map(config: &Config, vendor: &str, vendor_schema: &Path, target_schema: &Path) -> Result<()> {
    config.validate()?;

    let llm = llm::create_client(&config.llm).context("Failed to create LLM client")?;
    let store = MappingStore::new(config.storage.artifact_dir.clone());
    let mut pipeline = Pipeline::new(llm, store);

    let artifact = pipeline.run_mapping_only(vendor, vendor_schema, target_schema).await?;

    println!("Mapping template saved: {}", artifact.display());
    Ok(())
}

/// Transform only, against a previously persisted mapping
///
/// Needs no oracle credential: the mapping artifact is the input.
fn cmd_transform(config: &Config, vendor: &str, source: &Path) -> Result<()> {
    let store = MappingStore::new(config.storage.artifact_dir.clone());
    let mapping = store.load(vendor).context("Transform requires a persisted mapping")?;

    let output = config.storage.artifact_dir.join(format!("{}_transformed.csv", vendor));
    let path = schemamap::transform::apply(source, &mapping, &output).context("Transform failed")?;

    println!("Transform complete: {}", path.display());
    Ok(())
}

/// Print persisted mapping artifacts
fn cmd_mappings(config: &Config, vendor: Option<&str>) -> Result<()> {
    let store = MappingStore::new(config.storage.artifact_dir.clone());

    let vendors = match vendor {
        Some(v) => vec![v.to_string()],
        None => store.persisted_vendors()?,
    };

    if vendors.is_empty() {
        println!("No mapping artifacts found in {}", config.storage.artifact_dir.display());
        return Ok(());
    }

    for v in vendors {
        let mapping = store.load(&v).context(format!("Failed to load mapping for '{}'", v))?;
        println!("{} ({} fields)", v, mapping.len());
        for (vendor_field, target_field) in &mapping {
            println!("  {} -> {}", vendor_field, target_field);
        }
    }

    Ok(())
}

//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// schemamap - vendor-to-target schema mapping and transform
#[derive(Parser)]
#[command(
    name = "schemamap",
    about = "LLM-assisted vendor schema mapping and data transform pipeline",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Run the full pipeline: infer the mapping, then transform the data
    Run {
        /// Vendor identifier (names the artifacts)
        #[arg(long)]
        vendor: String,

        /// Vendor schema CSV (field names, optional samples)
        #[arg(long = "vendor-schema")]
        vendor_schema: PathBuf,

        /// Target schema CSV (field names, descriptions)
        #[arg(long = "target-schema")]
        target_schema: PathBuf,

        /// Vendor data CSV to transform
        #[arg(long)]
        source: PathBuf,
    },

    /// Infer and persist the field mapping only
    Map {
        /// Vendor identifier (names the artifact)
        #[arg(long)]
        vendor: String,

        /// Vendor schema CSV (field names, optional samples)
        #[arg(long = "vendor-schema")]
        vendor_schema: PathBuf,

        /// Target schema CSV (field names, descriptions)
        #[arg(long = "target-schema")]
        target_schema: PathBuf,
    },

    /// Transform vendor data using a previously persisted mapping
    Transform {
        /// Vendor identifier (selects the mapping artifact)
        #[arg(long)]
        vendor: String,

        /// Vendor data CSV to transform
        #[arg(long)]
        source: PathBuf,
    },

    /// Show persisted mapping artifacts
    Mappings {
        /// Limit to one vendor
        #[arg(long)]
        vendor: Option<String>,
    },
}

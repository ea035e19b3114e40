//! Schema readers for vendor and target CSV files
//!
//! A schema file lists one field per row: the first column is the field
//! name, the optional second column is a sample value (vendor) or the
//! business definition (target). Vendor field names are normalized
//! (trim + lowercase) before matching; target names are kept verbatim
//! because their descriptive text, not their casing, drives the match.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Errors reading a schema file
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Schema file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Schema file has no fields: {}", .0.display())]
    Empty(PathBuf),

    #[error("Schema file not readable as UTF-8 CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error reading schema: {0}")]
    Io(#[from] std::io::Error),
}

/// A vendor's raw schema: ordered, normalized field names plus samples
#[derive(Debug, Clone)]
pub struct VendorSchema {
    pub vendor: String,
    pub fields: Vec<String>,
    pub samples: Vec<String>,
}

/// The customer's canonical schema: ordered field names plus descriptions
#[derive(Debug, Clone)]
pub struct TargetSchema {
    pub fields: Vec<String>,
    pub descriptions: Vec<String>,
}

impl TargetSchema {
    /// Field/description pairs in schema order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(String::as_str)
            .zip(self.descriptions.iter().map(String::as_str))
    }

    /// Check whether a field name belongs to this schema
    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

/// Read a vendor schema file, normalizing field names
pub fn read_vendor(path: &Path, vendor: &str) -> Result<VendorSchema, SchemaError> {
    debug!(path = %path.display(), %vendor, "read_vendor: called");
    let (raw_fields, samples) = read_rows(path)?;

    let fields = raw_fields.iter().map(|f| f.trim().to_lowercase()).collect();

    Ok(VendorSchema {
        vendor: vendor.to_string(),
        fields,
        samples,
    })
}

/// Read a target schema file, keeping field names verbatim
pub fn read_target(path: &Path) -> Result<TargetSchema, SchemaError> {
    debug!(path = %path.display(), "read_target: called");
    let (fields, descriptions) = read_rows(path)?;

    Ok(TargetSchema { fields, descriptions })
}

/// Read (field, second-column) pairs from a schema CSV
///
/// The header row is skipped. Files with a single column yield empty
/// strings for the second element so callers stay index-aligned.
fn read_rows(path: &Path) -> Result<(Vec<String>, Vec<String>), SchemaError> {
    if !path.exists() {
        debug!(path = %path.display(), "read_rows: file missing");
        return Err(SchemaError::NotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

    let mut fields = Vec::new();
    let mut extras = Vec::new();

    for result in reader.records() {
        let record = result?;
        let Some(name) = record.get(0) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        fields.push(name.to_string());
        extras.push(record.get(1).unwrap_or("").to_string());
    }

    if fields.is_empty() {
        debug!(path = %path.display(), "read_rows: no fields found");
        return Err(SchemaError::Empty(path.to_path_buf()));
    }

    debug!(field_count = fields.len(), "read_rows: parsed");
    Ok((fields, extras))
}

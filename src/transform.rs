//! Mapping-driven transform of vendor data
//!
//! Applies a persisted field mapping to a vendor data file: mapped source
//! fields are renamed to their target fields in the output header, unmapped
//! fields pass through under their original names, and every row is copied
//! in order with values untouched.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::store::FieldMapping;

/// Errors from the transform stage
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Vendor data file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Vendor data file malformed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error writing transformed output: {0}")]
    Io(#[from] std::io::Error),
}

/// Apply a field mapping to a vendor data file
///
/// Preconditions are checked before any row is processed: the source must
/// exist, and callers are expected to have loaded a non-empty mapping
/// (MappingStore::load enforces that). Output row order matches source
/// row order and non-renamed values are written verbatim, so repeated
/// runs over identical inputs are byte-identical.
pub fn apply(source: &Path, mapping: &FieldMapping, output: &Path) -> Result<PathBuf, TransformError> {
    debug!(source = %source.display(), entries = mapping.len(), "apply: called");

    if !source.exists() {
        debug!(source = %source.display(), "apply: source missing");
        return Err(TransformError::SourceNotFound(source.to_path_buf()));
    }

    let mut reader = csv::Reader::from_path(source)?;
    let headers = reader.headers()?.clone();

    let renamed: Vec<String> = headers
        .iter()
        .map(|field| match mapping.get(field) {
            Some(target) => {
                debug!(%field, %target, "apply: renaming field");
                target.clone()
            }
            None => {
                debug!(%field, "apply: passing field through");
                field.to_string()
            }
        })
        .collect();

    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record(&renamed)?;

    let mut rows = 0usize;
    for result in reader.records() {
        let record = result?;
        writer.write_record(&record)?;
        rows += 1;
    }
    writer.flush()?;

    info!(rows, output = %output.display(), "apply: transform complete");
    Ok(output.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn mapping() -> FieldMapping {
        FieldMapping::from([
            ("cust_nm".to_string(), "customer_name".to_string()),
            ("addr1".to_string(), "address_line_1".to_string()),
        ])
    }

    #[test]
    fn test_apply_renames_mapped_fields() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("vendor.csv");
        let output = dir.path().join("out.csv");
        fs::write(&source, "cust_nm,addr1\nAcme,1 Main St\n").unwrap();

        apply(&source, &mapping(), &output).unwrap();

        let content = fs::read_to_string(&output).unwrap();
        assert_eq!(content, "customer_name,address_line_1\nAcme,1 Main St\n");
    }

    #[test]
    fn test_unmapped_fields_pass_through() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("vendor.csv");
        let output = dir.path().join("out.csv");
        fs::write(&source, "cust_nm,internal_code\nAcme,X42\n").unwrap();

        apply(&source, &mapping(), &output).unwrap();

        let content = fs::read_to_string(&output).unwrap();
        assert_eq!(content, "customer_name,internal_code\nAcme,X42\n");
    }

    #[test]
    fn test_apply_preserves_row_order_and_values() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("vendor.csv");
        let output = dir.path().join("out.csv");
        fs::write(&source, "cust_nm\nZeta\nAlpha\nMid Corp\n").unwrap();

        apply(&source, &mapping(), &output).unwrap();

        let content = fs::read_to_string(&output).unwrap();
        assert_eq!(content, "customer_name\nZeta\nAlpha\nMid Corp\n");
    }

    #[test]
    fn test_apply_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("vendor.csv");
        fs::write(&source, "cust_nm,addr1\nAcme,1 Main St\nBeta,2 Oak Ave\n").unwrap();

        let out1 = dir.path().join("out1.csv");
        let out2 = dir.path().join("out2.csv");
        apply(&source, &mapping(), &out1).unwrap();
        apply(&source, &mapping(), &out2).unwrap();

        assert_eq!(fs::read(&out1).unwrap(), fs::read(&out2).unwrap());
    }

    #[test]
    fn test_missing_source_fails_before_output() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("nope.csv");
        let output = dir.path().join("out.csv");

        let result = apply(&source, &mapping(), &output);
        assert!(matches!(result, Err(TransformError::SourceNotFound(_))));
        assert!(!output.exists(), "no output written on precondition failure");
    }
}

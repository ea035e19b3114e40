//! Mapping artifact persistence
//!
//! A vendor's field mapping is persisted as `<vendor>_mappings.csv` with
//! columns `vendor_field,target_field`, one row per matched field. The
//! store also keeps an in-memory multi-vendor view; merging overwrites
//! the previous entry for a vendor (last-write-wins, no history).

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

/// Vendor field -> target field, ordered for deterministic artifacts
pub type FieldMapping = BTreeMap<String, String>;

/// Errors from mapping persistence
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No mapping found for vendor '{vendor}' (expected {}). Run the mapping stage first.", .path.display())]
    MappingNotFound { vendor: String, path: PathBuf },

    #[error("Mapping artifact malformed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error persisting mapping: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable per-vendor mapping artifacts plus an in-memory merge view
pub struct MappingStore {
    artifact_dir: PathBuf,
    mappings: HashMap<String, FieldMapping>,
}

impl MappingStore {
    /// Create a store rooted at the given artifact directory
    pub fn new(artifact_dir: impl Into<PathBuf>) -> Self {
        let artifact_dir = artifact_dir.into();
        debug!(dir = %artifact_dir.display(), "MappingStore::new: called");
        Self {
            artifact_dir,
            mappings: HashMap::new(),
        }
    }

    /// Deterministic artifact path for a vendor
    pub fn artifact_path(&self, vendor: &str) -> PathBuf {
        self.artifact_dir.join(format!("{}_mappings.csv", vendor))
    }

    /// Persist a vendor's mapping as a durable CSV artifact
    ///
    /// Writes to a temporary sibling and atomically renames it into place
    /// so a crash mid-write never leaves a truncated artifact. An empty
    /// mapping still produces a header-only file: the mapping stage
    /// completed, it just resolved nothing.
    pub fn persist(&self, vendor: &str, mapping: &FieldMapping) -> Result<PathBuf, StoreError> {
        debug!(%vendor, entries = mapping.len(), "persist: called");
        fs::create_dir_all(&self.artifact_dir)?;

        let path = self.artifact_path(vendor);
        let tmp_path = self.artifact_dir.join(format!(".{}_mappings.csv.tmp", vendor));

        {
            let mut writer = csv::Writer::from_path(&tmp_path)?;
            writer.write_record(["vendor_field", "target_field"])?;
            for (vendor_field, target_field) in mapping {
                writer.write_record([vendor_field, target_field])?;
            }
            writer.flush()?;
        }

        fs::rename(&tmp_path, &path)?;

        info!(%vendor, entries = mapping.len(), path = %path.display(), "persist: mapping artifact written");
        Ok(path)
    }

    /// Load a vendor's persisted mapping
    ///
    /// Fails with MappingNotFound if the artifact is absent or has zero
    /// rows - an empty mapping cannot drive a transform.
    pub fn load(&self, vendor: &str) -> Result<FieldMapping, StoreError> {
        let path = self.artifact_path(vendor);
        debug!(%vendor, path = %path.display(), "load: called");

        if !path.exists() {
            return Err(StoreError::MappingNotFound {
                vendor: vendor.to_string(),
                path,
            });
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut mapping = FieldMapping::new();

        for result in reader.records() {
            let record = result?;
            if let (Some(vendor_field), Some(target_field)) = (record.get(0), record.get(1)) {
                mapping.insert(vendor_field.to_string(), target_field.to_string());
            }
        }

        if mapping.is_empty() {
            debug!(%vendor, "load: artifact present but empty");
            return Err(StoreError::MappingNotFound {
                vendor: vendor.to_string(),
                path,
            });
        }

        debug!(%vendor, entries = mapping.len(), "load: loaded");
        Ok(mapping)
    }

    /// Insert or overwrite the in-memory entry for a vendor
    pub fn merge(&mut self, vendor: &str, mapping: FieldMapping) {
        debug!(%vendor, entries = mapping.len(), "merge: called");
        self.mappings.insert(vendor.to_string(), mapping);
    }

    /// Get the in-memory mapping for a vendor, if merged
    pub fn get(&self, vendor: &str) -> Option<&FieldMapping> {
        self.mappings.get(vendor)
    }

    /// Vendors with persisted artifacts in the artifact directory
    pub fn persisted_vendors(&self) -> Result<Vec<String>, StoreError> {
        let mut vendors = Vec::new();
        if !self.artifact_dir.exists() {
            return Ok(vendors);
        }
        for entry in fs::read_dir(&self.artifact_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(vendor) = name.strip_suffix("_mappings.csv")
                && !vendor.starts_with('.')
            {
                vendors.push(vendor.to_string());
            }
        }
        vendors.sort();
        Ok(vendors)
    }
}

impl AsRef<Path> for MappingStore {
    fn as_ref(&self) -> &Path {
        &self.artifact_dir
    }
}

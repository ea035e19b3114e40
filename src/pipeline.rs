//! Two-stage reconciliation pipeline
//!
//! Mapping Inference then Transform Apply, modeled as a forward-only
//! finite-state machine: Mapping -> Transform -> Done. The transition out
//! of Mapping fires unconditionally once every vendor field has been
//! offered to the matcher - even zero resolved fields advances the state,
//! leaving an empty-but-valid mapping artifact behind. The transform then
//! reloads the persisted artifact rather than trusting the in-memory copy;
//! persistence is the crash-consistency boundary between the stages.
//!
//! Fail-fast: any fatal error propagates to the run boundary. No retries,
//! no backward edges. An abort mid-run leaves partial artifacts in place;
//! that gap is documented, not silently repaired.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::{Context, Result};
use tracing::{info, warn};

use crate::llm::LlmClient;
use crate::matcher::{FieldMatcher, MatchOutcome};
use crate::schema::{self, TargetSchema, VendorSchema};
use crate::store::{FieldMapping, MappingStore};
use crate::transform;

/// Pipeline stage - a two-node sequence needs an enum, not a workflow graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Mapping,
    Transform,
    Done,
}

impl Stage {
    /// Advance to the next stage; Done is terminal
    pub fn advance(self) -> Stage {
        match self {
            Stage::Mapping => Stage::Transform,
            Stage::Transform => Stage::Done,
            Stage::Done => Stage::Done,
        }
    }
}

/// Working record of one run, owned by the pipeline for its duration
///
/// Discarded when the run ends; the durable residue is the mapping and
/// output artifacts, not this struct.
#[derive(Debug)]
pub struct PipelineState {
    pub vendor: String,
    pub vendor_schema: VendorSchema,
    pub target_schema: TargetSchema,
    pub mapping: FieldMapping,
    pub mapping_complete: bool,
    pub transform_complete: bool,
    pub output: Option<PathBuf>,
}

/// Orchestrates one single-vendor, single-threaded run
pub struct Pipeline {
    llm: Arc<dyn LlmClient>,
    store: MappingStore,
}

impl Pipeline {
    pub fn new(llm: Arc<dyn LlmClient>, store: MappingStore) -> Self {
        Self { llm, store }
    }

    /// Run the full two-stage pipeline for one vendor
    ///
    /// Returns the transformed output artifact path.
    pub async fn run(
        &mut self,
        vendor: &str,
        vendor_schema_path: &Path,
        target_schema_path: &Path,
        source_path: &Path,
    ) -> Result<PathBuf> {
        let mut state = self.read_schemas(vendor, vendor_schema_path, target_schema_path)?;

        let mut stage = Stage::Mapping;
        while stage != Stage::Done {
            stage = match stage {
                Stage::Mapping => {
                    self.run_mapping_stage(&mut state).await?;
                    stage.advance()
                }
                Stage::Transform => {
                    self.run_transform_stage(&mut state, source_path)?;
                    stage.advance()
                }
                Stage::Done => Stage::Done,
            };
        }

        state
            .output
            .clone()
            .ok_or_else(|| eyre::eyre!("Pipeline finished without producing an output artifact"))
    }

    /// Run only the mapping-inference stage, returning the artifact path
    pub async fn run_mapping_only(
        &mut self,
        vendor: &str,
        vendor_schema_path: &Path,
        target_schema_path: &Path,
    ) -> Result<PathBuf> {
        let mut state = self.read_schemas(vendor, vendor_schema_path, target_schema_path)?;
        self.run_mapping_stage(&mut state).await?;
        Ok(self.store.artifact_path(vendor))
    }

    /// Run only the transform stage against a previously persisted mapping
    pub fn run_transform_only(&self, vendor: &str, source_path: &Path) -> Result<PathBuf> {
        let mapping = self
            .store
            .load(vendor)
            .context("Transform requires a persisted mapping")?;

        let output = self.output_path(vendor);
        let path = transform::apply(source_path, &mapping, &output).context("Transform failed")?;
        Ok(path)
    }

    /// Read both schemas and initialize the run's state
    fn read_schemas(
        &self,
        vendor: &str,
        vendor_schema_path: &Path,
        target_schema_path: &Path,
    ) -> Result<PipelineState> {
        let vendor_schema = schema::read_vendor(vendor_schema_path, vendor).context("Failed to read vendor schema")?;
        let target_schema = schema::read_target(target_schema_path).context("Failed to read target schema")?;

        info!(
            %vendor,
            vendor_fields = vendor_schema.fields.len(),
            target_fields = target_schema.fields.len(),
            "read_schemas: schemas loaded"
        );

        Ok(PipelineState {
            vendor: vendor.to_string(),
            vendor_schema,
            target_schema,
            mapping: FieldMapping::new(),
            mapping_complete: false,
            transform_complete: false,
            output: None,
        })
    }

    /// Stage 1: match every vendor field, then persist and merge the mapping
    async fn run_mapping_stage(&mut self, state: &mut PipelineState) -> Result<()> {
        info!(vendor = %state.vendor, "run_mapping_stage: started");
        let matcher = FieldMatcher::new(self.llm.clone());

        let mut skipped = 0usize;
        for vendor_field in &state.vendor_schema.fields {
            match matcher.match_field(vendor_field, &state.target_schema).await {
                MatchOutcome::Matched(target_field) => {
                    state.mapping.insert(vendor_field.clone(), target_field);
                }
                MatchOutcome::Skipped => {
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            warn!(
                vendor = %state.vendor,
                skipped,
                matched = state.mapping.len(),
                "run_mapping_stage: some fields could not be resolved"
            );
        }

        // Persist before transform may run; this is the durable boundary
        // between the stages, in this run or a later one.
        let path = self
            .store
            .persist(&state.vendor, &state.mapping)
            .context("Failed to persist mapping artifact")?;
        self.store.merge(&state.vendor, state.mapping.clone());

        state.mapping_complete = true;
        info!(
            vendor = %state.vendor,
            entries = state.mapping.len(),
            artifact = %path.display(),
            "run_mapping_stage: complete"
        );
        Ok(())
    }

    /// Stage 2: reload the persisted mapping and apply it to the source data
    fn run_transform_stage(&self, state: &mut PipelineState, source_path: &Path) -> Result<()> {
        debug_assert!(state.mapping_complete, "transform must not start before mapping completes");
        info!(vendor = %state.vendor, "run_transform_stage: started");

        let mapping = self
            .store
            .load(&state.vendor)
            .context("Transform requires a persisted, non-empty mapping")?;

        let output = self.output_path(&state.vendor);
        let path = transform::apply(source_path, &mapping, &output).context("Transform failed")?;

        state.transform_complete = true;
        state.output = Some(path);
        info!(vendor = %state.vendor, output = %output.display(), "run_transform_stage: complete");
        Ok(())
    }

    /// Deterministic output artifact path for a vendor
    fn output_path(&self, vendor: &str) -> PathBuf {
        self.store.as_ref().join(format!("{}_transformed.csv", vendor))
    }
}

//! schemamap - LLM-assisted schema reconciliation
//!
//! Reconciles a vendor's raw field list with a customer's canonical schema
//! by asking an LLM oracle, once per vendor field, which target field it
//! corresponds to; persists the correspondence as a reusable CSV artifact;
//! and applies it to transform vendor data into the target shape.
//!
//! # Modules
//!
//! - [`schema`] - vendor/target schema readers
//! - [`matcher`] - per-field semantic matching with strict response decoding
//! - [`store`] - mapping artifact persistence and multi-vendor merge
//! - [`transform`] - mapping-driven data transform
//! - [`pipeline`] - two-stage orchestration (Mapping -> Transform -> Done)
//! - [`llm`] - oracle client trait and Anthropic implementation
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod llm;
pub mod matcher;
pub mod pipeline;
pub mod schema;
pub mod store;
pub mod transform;

// Re-export commonly used types
pub use config::{Config, LlmConfig, StorageConfig};
pub use llm::{AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError};
pub use matcher::{FieldMatcher, MatchOutcome};
pub use pipeline::{Pipeline, PipelineState, Stage};
pub use schema::{SchemaError, TargetSchema, VendorSchema};
pub use store::{FieldMapping, MappingStore, StoreError};
pub use transform::TransformError;

//! Per-field semantic matching against the LLM oracle
//!
//! One completion request per vendor field, sequential and in vendor-field
//! order. The oracle's reply is decoded strictly: it must be a JSON object
//! containing the queried vendor field as a key, and the value must name a
//! field that actually exists in the target schema. Anything else - decode
//! failure, missing key, hallucinated target, transport error after the
//! client's retry budget - skips that field and the run continues. The
//! oracle is an unreliable external dependency; one bad answer must not
//! abort the whole stage.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::llm::{CompletionRequest, LlmClient, Message};
use crate::schema::TargetSchema;

const SYSTEM_PROMPT: &str = "You map vendor data fields to a customer's canonical schema. \
                             Respond with ONLY a JSON object mapping the vendor field to the \
                             best-matching target field. No prose, no explanation.";

/// Max tokens for a single field-match reply; the answer is one tiny object
const MATCH_MAX_TOKENS: u32 = 256;

/// Outcome of matching one vendor field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The oracle named a valid target field
    Matched(String),
    /// Decode failure, missing key, unknown target, or oracle error
    Skipped,
}

/// Queries the oracle for one vendor field at a time
pub struct FieldMatcher {
    llm: Arc<dyn LlmClient>,
}

impl FieldMatcher {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Match one vendor field against the target schema
    pub async fn match_field(&self, vendor_field: &str, target: &TargetSchema) -> MatchOutcome {
        debug!(%vendor_field, "match_field: called");

        let request = CompletionRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            messages: vec![Message::user(build_prompt(vendor_field, target))],
            max_tokens: MATCH_MAX_TOKENS,
        };

        let response = match self.llm.complete(request).await {
            Ok(r) => r,
            Err(e) => {
                warn!(%vendor_field, error = %e, "match_field: oracle call failed, skipping field");
                return MatchOutcome::Skipped;
            }
        };

        let Some(text) = response.content else {
            warn!(%vendor_field, "match_field: empty oracle response, skipping field");
            return MatchOutcome::Skipped;
        };

        decode_match(vendor_field, &text, target)
    }
}

/// Build the per-field matching prompt
///
/// Same shape as a human would write it: the subject field, then the full
/// target field/description set as JSON, then the required output format.
fn build_prompt(vendor_field: &str, target: &TargetSchema) -> String {
    let descriptions: serde_json::Map<String, Value> = target
        .pairs()
        .map(|(field, desc)| (field.to_string(), Value::String(desc.to_string())))
        .collect();

    format!(
        "Match the vendor field '{}' with the most relevant target field.\n\
         Target fields and descriptions:\n{}\n\
         Return a JSON object mapping the vendor field to the target field.",
        vendor_field,
        serde_json::to_string_pretty(&Value::Object(descriptions)).unwrap_or_default()
    )
}

/// Strictly decode an oracle reply into a match outcome
///
/// Accepts only a JSON object with an entry for the queried vendor field
/// whose value is a known target field.
fn decode_match(vendor_field: &str, text: &str, target: &TargetSchema) -> MatchOutcome {
    let cleaned = strip_code_fences(text);

    let parsed: Value = match serde_json::from_str(cleaned) {
        Ok(v) => v,
        Err(e) => {
            warn!(%vendor_field, error = %e, "decode_match: invalid JSON, skipping field");
            return MatchOutcome::Skipped;
        }
    };

    let Some(obj) = parsed.as_object() else {
        warn!(%vendor_field, "decode_match: response is not a JSON object, skipping field");
        return MatchOutcome::Skipped;
    };

    let Some(value) = obj.get(vendor_field) else {
        warn!(%vendor_field, "decode_match: response missing queried field key, skipping field");
        return MatchOutcome::Skipped;
    };

    let Some(target_field) = value.as_str() else {
        warn!(%vendor_field, "decode_match: mapped value is not a string, skipping field");
        return MatchOutcome::Skipped;
    };

    if !target.contains(target_field) {
        warn!(%vendor_field, %target_field, "decode_match: target field not in schema, skipping field");
        return MatchOutcome::Skipped;
    }

    debug!(%vendor_field, %target_field, "decode_match: matched");
    MatchOutcome::Matched(target_field.to_string())
}

/// Strip a surrounding markdown code fence, if present
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the optional language tag on the opening fence line
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches(['\r', '\n'])
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

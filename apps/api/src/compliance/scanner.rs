//! Compliance scanner: pluggable model backend plus the degrade-on-failure pipeline.
//!
//! `AppState` holds an `Arc<dyn ComplianceModel>`; production uses
//! `LlmComplianceModel`, tests swap in stubs.

use async_trait::async_trait;
use tracing::{error, info};

use crate::compliance::assembly::ScanInput;
use crate::compliance::normalize::{
    fallback_response, normalize_output, DocumentInfo, RawModelOutput,
};
use crate::compliance::prompts::{output_schema, render_prompt, system_prompt};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::compliance::ComplianceScanResponse;

/// Produces a model assessment for one scan input.
#[async_trait]
pub trait ComplianceModel: Send + Sync {
    async fn assess(&self, input: &ScanInput) -> Result<RawModelOutput, LlmError>;
}

/// Assessment via the configured LLM with the compliance structured-output schema.
pub struct LlmComplianceModel(pub LlmClient);

#[async_trait]
impl ComplianceModel for LlmComplianceModel {
    async fn assess(&self, input: &ScanInput) -> Result<RawModelOutput, LlmError> {
        let prompt = render_prompt(input);
        let value = self
            .0
            .call_value(&prompt, &system_prompt(), Some(&output_schema()))
            .await?;

        let kind = match &value {
            serde_json::Value::Array(_) => "array",
            serde_json::Value::String(_) => "string",
            serde_json::Value::Number(_) => "number",
            serde_json::Value::Bool(_) => "bool",
            serde_json::Value::Null => "null",
            serde_json::Value::Object(_) => "object",
        };
        RawModelOutput::from_value(value)
            .ok_or_else(|| LlmError::UnexpectedShape(format!("expected an object, got {kind}")))
    }
}

/// Runs one scan end to end. Never fails: any model error yields the fallback document.
pub async fn run_scan(
    model: &dyn ComplianceModel,
    input: &ScanInput,
    info: &DocumentInfo,
) -> ComplianceScanResponse {
    match model.assess(input).await {
        Ok(output) => {
            let response = normalize_output(output, info, &mut rand::thread_rng());
            info!(
                document_id = %response.document.id,
                compliance_status = ?response.document.compliance_status,
                compliance_score = response.document.detailed_report.compliance_score,
                "Compliance scan completed"
            );
            response
        }
        Err(e) => {
            error!("Error generating compliance scan: {e}");
            let response = fallback_response(info, &mut rand::thread_rng());
            info!(
                document_id = %response.document.id,
                "Created fallback response due to compliance scan error"
            );
            response
        }
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ────────────────────────────────────────────────────────────────────────────
// Request payloads
// ────────────────────────────────────────────────────────────────────────────

/// A single piece of compliance text, optionally labelled with where it came from.
#[derive(Debug, Clone, Deserialize)]
pub struct ComplianceDataItem {
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComplianceScanRequest {
    pub compliance_data: Vec<ComplianceDataItem>,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub user_context: Option<Value>,
}

// ────────────────────────────────────────────────────────────────────────────
// Frontend contract
// ────────────────────────────────────────────────────────────────────────────

/// The three statuses the dashboard knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceStatus {
    Compliant,
    Issues,
    Review,
}

/// Processing state of the scanned document card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Complete,
    Error,
}

/// Scores for the five canonical sections. Every key is always serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionScores {
    #[serde(rename = "Public File Requirements")]
    pub public_file_requirements: u8,
    #[serde(rename = "Technical Compliance")]
    pub technical_compliance: u8,
    #[serde(rename = "Ownership Disclosure")]
    pub ownership_disclosure: u8,
    #[serde(rename = "EAS Compliance")]
    pub eas_compliance: u8,
    #[serde(rename = "RF Exposure")]
    pub rf_exposure: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedComplianceReport {
    pub compliance_score: i64,
    pub compliance_status: String,
    pub summary_of_findings: String,
    pub section_breakdown: String,
    pub specific_issues: String,
    pub recommendations: String,
    pub section_scores: SectionScores,
}

/// A scanned document card as rendered by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedDocument {
    pub id: String,
    pub name: String,
    pub size: String,
    pub upload_time: String,
    pub progress: u8,
    pub status: DocumentStatus,
    pub compliance_status: ComplianceStatus,
    pub compliance_message: String,
    pub detailed_report: DetailedComplianceReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceScanResponse {
    pub document: ScannedDocument,
    pub message: String,
}

//! Response normalization. Turns whatever the model returned into the exact
//! document shape the dashboard renders.
//!
//! Nothing in here fails. Unknown keys are dropped, unknown statuses become
//! `review`, and sections the model skipped are filled from their typical
//! ranges. The fallback path builds the same shape with fixed text.

use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::compliance::sections::{match_section, random_scores, PartialScores};
use crate::models::compliance::{
    ComplianceScanResponse, ComplianceStatus, DetailedComplianceReport, DocumentStatus,
    ScannedDocument, SectionScores,
};

pub const SUCCESS_MESSAGE: &str = "Compliance scan completed successfully";
pub const FALLBACK_MESSAGE: &str =
    "Document scan encountered an error but returned a fallback response";
pub const FALLBACK_SCORE: i64 = 50;
pub const FALLBACK_STATUS_DETAIL: &str = "Needs Review";
pub const FALLBACK_COMPLIANCE_MESSAGE: &str =
    "Assessment could not be completed due to a processing error.";

const MISSING_TEXT: &str = "Not provided by the assessment.";

// ────────────────────────────────────────────────────────────────────────────
// Model output
// ────────────────────────────────────────────────────────────────────────────

/// The typed report the model is asked to produce.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelReport {
    pub compliance_score: i64,
    pub compliance_status: String,
    pub compliance_message: String,
    pub detailed_report: ModelDetailedReport,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelDetailedReport {
    pub compliance_score: i64,
    pub compliance_status: String,
    pub summary_of_findings: String,
    pub section_breakdown: String,
    pub specific_issues: String,
    pub recommendations: String,
    /// Kept in the model's key order; the first key of a match tier wins.
    pub section_scores: Map<String, Value>,
}

/// What came back from the model: either the requested shape, or some other object.
#[derive(Debug, Clone)]
pub enum RawModelOutput {
    Structured(ModelReport),
    Raw(Map<String, Value>),
}

impl RawModelOutput {
    /// Classifies a parsed JSON value. Non-object values are not model output at all.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => {
                match serde_json::from_value::<ModelReport>(Value::Object(map.clone())) {
                    Ok(report) => Some(RawModelOutput::Structured(report)),
                    Err(_) => Some(RawModelOutput::Raw(map)),
                }
            }
            _ => None,
        }
    }
}

/// Best-effort identity of the scanned document.
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub name: String,
    pub size: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Status
// ────────────────────────────────────────────────────────────────────────────

/// Maps any model status onto the three dashboard statuses. Total: unknown → `Review`.
pub fn normalize_status(raw: &str) -> ComplianceStatus {
    let folded: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();

    match folded.as_str() {
        "compliant" => ComplianceStatus::Compliant,
        "partial" | "non_compliant" | "issues" => ComplianceStatus::Issues,
        "needs_review" | "review" => ComplianceStatus::Review,
        _ => ComplianceStatus::Review,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Section scores
// ────────────────────────────────────────────────────────────────────────────

/// Maps arbitrary `(key, value)` pairs onto the five canonical sections.
pub fn normalize_section_scores<'a, I, R>(scores: I, rng: &mut R) -> SectionScores
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
    R: Rng + ?Sized,
{
    let mut partial = PartialScores::default();
    for (key, value) in scores {
        let Some((section, tier)) = match_section(key) else {
            continue;
        };
        if let Some(score) = score_from_value(value) {
            partial.offer(section, tier, score);
        }
    }
    partial.fill(rng)
}

/// Reads a section score from an integer, float or numeric string, clamped to 0–100.
fn score_from_value(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(0.0, 100.0) as u8)
}

// ────────────────────────────────────────────────────────────────────────────
// Document assembly
// ────────────────────────────────────────────────────────────────────────────

/// Builds the response for a model answer. Always produces a full document.
pub fn normalize_output<R: Rng + ?Sized>(
    output: RawModelOutput,
    info: &DocumentInfo,
    rng: &mut R,
) -> ComplianceScanResponse {
    let report = match output {
        RawModelOutput::Structured(report) => from_structured(report, rng),
        RawModelOutput::Raw(map) => from_raw(&map, rng),
    };

    ComplianceScanResponse {
        document: scanned_document(
            info,
            DocumentStatus::Complete,
            report.status,
            report.message,
            report.detailed,
        ),
        message: SUCCESS_MESSAGE.to_string(),
    }
}

/// The degraded document returned when the model could not be invoked or understood.
pub fn fallback_response<R: Rng + ?Sized>(
    info: &DocumentInfo,
    rng: &mut R,
) -> ComplianceScanResponse {
    let detailed = DetailedComplianceReport {
        compliance_score: FALLBACK_SCORE,
        compliance_status: FALLBACK_STATUS_DETAIL.to_string(),
        summary_of_findings: "Unable to complete assessment due to processing error.".to_string(),
        section_breakdown: "No section breakdown available due to processing error.".to_string(),
        specific_issues: "Assessment could not be completed.".to_string(),
        recommendations: "Please try again with a more detailed document.".to_string(),
        section_scores: random_scores(rng),
    };

    ComplianceScanResponse {
        document: scanned_document(
            info,
            DocumentStatus::Error,
            ComplianceStatus::Review,
            FALLBACK_COMPLIANCE_MESSAGE.to_string(),
            detailed,
        ),
        message: FALLBACK_MESSAGE.to_string(),
    }
}

struct NormalizedReport {
    status: ComplianceStatus,
    message: String,
    detailed: DetailedComplianceReport,
}

fn from_structured<R: Rng + ?Sized>(report: ModelReport, rng: &mut R) -> NormalizedReport {
    let detail = report.detailed_report;
    let section_scores = normalize_section_scores(
        detail.section_scores.iter().map(|(k, v)| (k.as_str(), v)),
        rng,
    );

    NormalizedReport {
        status: normalize_status(&report.compliance_status),
        message: report.compliance_message,
        detailed: DetailedComplianceReport {
            compliance_score: report.compliance_score,
            compliance_status: detail.compliance_status,
            summary_of_findings: detail.summary_of_findings,
            section_breakdown: detail.section_breakdown,
            specific_issues: detail.specific_issues,
            recommendations: detail.recommendations,
            section_scores,
        },
    }
}

/// Reads a loosely-shaped object. Fields may live under `detailed_report` or at the top level.
fn from_raw<R: Rng + ?Sized>(map: &Map<String, Value>, rng: &mut R) -> NormalizedReport {
    let empty = Map::new();
    let detail = map
        .get("detailed_report")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let lookup = |key: &str| detail.get(key).or_else(|| map.get(key));
    let text = |key: &str| {
        lookup(key)
            .and_then(value_as_text)
            .unwrap_or_else(|| MISSING_TEXT.to_string())
    };

    let status_raw = map
        .get("compliance_status")
        .or_else(|| detail.get("compliance_status"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let score = map
        .get("compliance_score")
        .or_else(|| detail.get("compliance_score"))
        .and_then(value_as_i64)
        .unwrap_or(FALLBACK_SCORE);
    let detail_status = detail
        .get("compliance_status")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| status_raw.clone());
    let message = map
        .get("compliance_message")
        .and_then(value_as_text)
        .unwrap_or_else(|| MISSING_TEXT.to_string());

    let section_scores = match lookup("section_scores").and_then(Value::as_object) {
        Some(scores) => normalize_section_scores(scores.iter().map(|(k, v)| (k.as_str(), v)), rng),
        None => random_scores(rng),
    };

    NormalizedReport {
        status: normalize_status(&status_raw),
        message,
        detailed: DetailedComplianceReport {
            compliance_score: score,
            compliance_status: detail_status,
            summary_of_findings: text("summary_of_findings"),
            section_breakdown: text("section_breakdown"),
            specific_issues: text("specific_issues"),
            recommendations: text("recommendations"),
            section_scores,
        },
    }
}

/// Strings pass through, lists are joined one per line, anything else is serialized.
fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(value_as_text)
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        other => Some(other.to_string()),
    }
}

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    }
}

fn scanned_document(
    info: &DocumentInfo,
    status: DocumentStatus,
    compliance_status: ComplianceStatus,
    compliance_message: String,
    detailed_report: DetailedComplianceReport,
) -> ScannedDocument {
    ScannedDocument {
        id: new_document_id(),
        name: info.name.clone(),
        size: info.size.clone(),
        upload_time: Utc::now().to_rfc3339(),
        progress: 100,
        status,
        compliance_status,
        compliance_message,
        detailed_report,
    }
}

/// `doc_` followed by eight lowercase hex characters.
pub fn new_document_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("doc_{}", &hex[..8])
}

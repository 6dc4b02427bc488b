// Compliance scan LLM prompt templates and the structured-output schema.

use serde_json::{json, Value};

use crate::compliance::assembly::ScanInput;
use crate::compliance::sections::Section;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::OutputSchema;

pub const COMPLIANCE_SCAN_SYSTEM: &str = "\
You are an FCC compliance expert reviewing broadcast station documentation. \
You will be given a compliance document, a list of questions and organizational context. \
Assess the document strictly on its contents; if something is not documented, treat it as a gap. ";

pub const COMPLIANCE_SCAN_PROMPT: &str = r#"Assess the following material for FCC compliance.

<Compliance Data>
{compliance_data}
</Compliance Data>

<Questions>
{questions}
</Questions>

<Context>
{context}
</Context>

Return one JSON object with:
- "compliance_score": overall score from 0 to 100
- "compliance_status": exactly one of "compliant", "issues", "review"
- "compliance_message": one or two sentences explaining the status
- "detailed_report": {
    "compliance_score": same overall score,
    "compliance_status": a descriptive status such as "Partial Compliance",
    "summary_of_findings": string,
    "section_breakdown": string,
    "specific_issues": string,
    "recommendations": string,
    "section_scores": an object with an integer 0-100 for each of: {sections}
  }"#;

/// Full system prompt for the scan call.
pub fn system_prompt() -> String {
    format!("{COMPLIANCE_SCAN_SYSTEM}{JSON_ONLY_SYSTEM}")
}

/// Renders the user prompt for one scan.
pub fn render_prompt(input: &ScanInput) -> String {
    let questions = input
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}. {}", i + 1, q))
        .collect::<Vec<_>>()
        .join("\n");
    let context = if input.context.is_empty() {
        "None provided"
    } else {
        input.context.as_str()
    };

    let sections = section_list();
    fill_template(
        COMPLIANCE_SCAN_PROMPT,
        &[
            ("sections", sections.as_str()),
            ("questions", questions.as_str()),
            ("context", context),
            ("compliance_data", input.document_text.as_str()),
        ],
    )
}

/// Substitutes `{name}` placeholders in one pass, so inserted values are never
/// scanned for placeholders themselves. Unknown braces are copied through.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let hit = values
            .iter()
            .find(|(name, _)| tail.starts_with(name) && tail[name.len()..].starts_with('}'));
        match hit {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn section_list() -> String {
    Section::ALL
        .iter()
        .map(|s| format!("\"{}\"", s.canonical_name()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Structured-output schema. `section_scores` stays open so that off-list keys
/// reach the normalizer instead of failing the call.
pub fn output_schema() -> OutputSchema {
    let text = || json!({"type": "string"});
    let score = || json!({"type": "integer", "minimum": 0, "maximum": 100});

    let detailed: Value = json!({
        "type": "object",
        "properties": {
            "compliance_score": score(),
            "compliance_status": text(),
            "summary_of_findings": text(),
            "section_breakdown": text(),
            "specific_issues": text(),
            "recommendations": text(),
            "section_scores": {
                "type": "object",
                "additionalProperties": {"type": "integer"}
            }
        },
        "required": [
            "compliance_score", "compliance_status", "summary_of_findings",
            "section_breakdown", "specific_issues", "recommendations", "section_scores"
        ]
    });

    OutputSchema {
        name: "compliance_scan",
        schema: json!({
            "type": "object",
            "properties": {
                "compliance_score": score(),
                "compliance_status": {"type": "string", "enum": ["compliant", "issues", "review"]},
                "compliance_message": text(),
                "detailed_report": detailed
            },
            "required": ["compliance_score", "compliance_status", "compliance_message", "detailed_report"]
        }),
    }
}

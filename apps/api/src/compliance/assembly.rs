use serde_json::Value;

use crate::models::compliance::ComplianceDataItem;

const FRAGMENT_SEPARATOR: &str = "\n\n";
const DEFAULT_DOCUMENT_NAME: &str = "Submitted Compliance Data";

/// Questions asked of every document when the caller supplies none.
pub const DEFAULT_QUESTIONS: [&str; 10] = [
    "Is the station's online public inspection file complete and current, including quarterly issues/programs lists?",
    "Are ownership reports (FCC Form 323 or 323-E) filed on time and do they disclose all attributable interests?",
    "Does the station operate within its authorized power, frequency and antenna parameters?",
    "Are Emergency Alert System tests received, logged and retransmitted as required?",
    "Is the EAS equipment certified, properly configured and monitoring the assigned sources?",
    "Has the station evaluated RF exposure at the transmitter site against FCC limits, including for workers?",
    "Are tower lighting, painting and antenna structure registration obligations being met?",
    "Are political file and sponsorship identification obligations documented and satisfied?",
    "Are children's programming and commercial limit requirements met and reported, where applicable?",
    "Are license renewals, modifications and other required filings up to date?",
];

/// Everything the model sees for one scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanInput {
    pub document_text: String,
    pub questions: Vec<String>,
    pub context: String,
}

impl ScanInput {
    /// Assembles the model input. Empty `questions` get [`DEFAULT_QUESTIONS`].
    pub fn new(document_text: String, questions: Vec<String>, context: Option<&Value>) -> Self {
        let questions = if questions.is_empty() {
            DEFAULT_QUESTIONS.iter().map(|q| q.to_string()).collect()
        } else {
            questions
        };
        Self {
            document_text,
            questions,
            context: stringify_context(context),
        }
    }
}

/// Joins fragment contents in order with a blank line between them.
pub fn join_fragments(items: &[ComplianceDataItem]) -> String {
    items
        .iter()
        .map(|item| item.content.as_str())
        .collect::<Vec<_>>()
        .join(FRAGMENT_SEPARATOR)
}

/// Strings pass through untouched; other JSON is serialized; absent context is empty.
pub fn stringify_context(context: Option<&Value>) -> String {
    match context {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Display name for text submissions: the first labelled fragment, if any.
pub fn document_name(items: &[ComplianceDataItem]) -> String {
    items
        .iter()
        .filter_map(|item| item.source.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_DOCUMENT_NAME)
        .to_string()
}

/// Human-readable size with one decimal on a 1024 base.
pub fn format_file_size(size_bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let size = size_bytes as f64;
    if size < KB {
        format!("{size_bytes} bytes")
    } else if size < MB {
        format!("{:.1} KB", size / KB)
    } else if size < GB {
        format!("{:.1} MB", size / MB)
    } else {
        format!("{:.1} GB", size / GB)
    }
}

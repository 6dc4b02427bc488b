//! PDF text extraction for uploaded compliance documents.
//!
//! Text is pulled page by page so the model sees page boundaries, and the
//! Info dictionary is read as a flat string map when one is present.

use std::collections::BTreeMap;

use lopdf::{Document, Object};
use thiserror::Error;
use tracing::{debug, warn};

const PAGE_ERROR_MARKER: &str = "[Error extracting text from this page]";

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Only PDF files are allowed")]
    NotPdf,

    #[error("Invalid PDF: {0}")]
    Invalid(String),

    #[error("Could not extract text from PDF. The file may be scanned or contain only images.")]
    NoText,
}

/// Text pulled out of an uploaded PDF.
#[derive(Debug, Clone)]
pub struct ExtractedPdf {
    pub filename: String,
    pub text: String,
    pub page_count: usize,
    pub metadata: Option<BTreeMap<String, String>>,
}

/// Rejects uploads whose filename does not carry a `.pdf` extension.
pub fn ensure_pdf_filename(filename: &str) -> Result<(), PdfError> {
    if filename.to_lowercase().ends_with(".pdf") {
        Ok(())
    } else {
        Err(PdfError::NotPdf)
    }
}

/// Extracts per-page text and Info metadata from an in-memory PDF.
///
/// Each page renders as `--- Page N ---\n<text>\n\n`. A page that fails to
/// decode keeps its marker with a placeholder line, but only text that was
/// actually extracted counts towards the "has text" check.
pub fn extract(filename: &str, bytes: &[u8]) -> Result<ExtractedPdf, PdfError> {
    ensure_pdf_filename(filename)?;

    let doc = Document::load_mem(bytes).map_err(|e| PdfError::Invalid(e.to_string()))?;
    let pages = doc.get_pages();
    let page_count = pages.len();

    let mut text = String::new();
    let mut has_text = false;

    for page_num in pages.keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(page_text) => {
                let trimmed = page_text.trim();
                if trimmed.is_empty() {
                    continue;
                }
                has_text = true;
                text.push_str(&format!("--- Page {page_num} ---\n{trimmed}\n\n"));
            }
            Err(e) => {
                warn!("Error extracting text from page {page_num}: {e}");
                text.push_str(&format!("--- Page {page_num} ---\n{PAGE_ERROR_MARKER}\n\n"));
            }
        }
    }

    if !has_text {
        return Err(PdfError::NoText);
    }

    let metadata = read_metadata(&doc);
    debug!(
        "Extracted {} chars from {} pages of '{}'",
        text.len(),
        page_count,
        filename
    );

    Ok(ExtractedPdf {
        filename: filename.to_string(),
        text,
        page_count,
        metadata,
    })
}

/// Reads the trailer's Info dictionary. Non-string entries are skipped.
fn read_metadata(doc: &Document) -> Option<BTreeMap<String, String>> {
    let info = doc.trailer.get(b"Info").ok()?;
    let dict = match info {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok()?,
        Object::Dictionary(dict) => dict,
        _ => return None,
    };

    let meta: BTreeMap<String, String> = dict
        .iter()
        .filter_map(|(key, value)| {
            let bytes = value.as_str().ok()?;
            let key = String::from_utf8_lossy(key).trim_start_matches('/').to_string();
            Some((key, decode_pdf_string(bytes)))
        })
        .collect();

    if meta.is_empty() {
        None
    } else {
        Some(meta)
    }
}

/// PDF text strings are UTF-16BE or UTF-8 when they carry a byte-order mark,
/// PDFDocEncoding otherwise.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    bytes.iter().map(|&b| pdf_doc_char(b)).collect()
}

/// PDFDocEncoding differs from Latin-1 in 0x18..=0x1F and 0x80..=0xA0.
fn pdf_doc_char(byte: u8) -> char {
    const LOW: [char; 8] = [
        '\u{02D8}', '\u{02C7}', '\u{02C6}', '\u{02D9}', '\u{02DD}', '\u{02DB}', '\u{02DA}', '\u{02DC}',
    ];
    const HIGH: [char; 33] = [
        '\u{2022}', '\u{2020}', '\u{2021}', '\u{2026}', '\u{2014}', '\u{2013}', '\u{0192}', '\u{2044}',
        '\u{2039}', '\u{203A}', '\u{2212}', '\u{2030}', '\u{201E}', '\u{201C}', '\u{201D}', '\u{2018}',
        '\u{2019}', '\u{201A}', '\u{2122}', '\u{FB01}', '\u{FB02}', '\u{0141}', '\u{0152}', '\u{0160}',
        '\u{0178}', '\u{017D}', '\u{0131}', '\u{0142}', '\u{0153}', '\u{0161}', '\u{017E}',
        char::REPLACEMENT_CHARACTER,
        '\u{20AC}',
    ];
    match byte {
        0x18..=0x1F => LOW[usize::from(byte - 0x18)],
        0x80..=0xA0 => HIGH[usize::from(byte - 0x80)],
        0xAD => char::REPLACEMENT_CHARACTER,
        _ => char::from(byte),
    }
}

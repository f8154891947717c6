//! Document text extraction for uploaded resumes and job descriptions.
//!
//! Format is chosen by file extension only: `pdf`, `docx` or `txt`. Anything else
//! is rejected before the bytes are looked at.

use std::fmt;

use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Failed to read PDF '{filename}': {message}")]
    Pdf { filename: String, message: String },

    #[error("Failed to read DOCX '{filename}': {message}")]
    Docx { filename: String, message: String },

    #[error("Text file '{filename}' is not valid UTF-8")]
    InvalidUtf8 {
        filename: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Txt,
}

impl DocumentFormat {
    /// Format for `filename`, judged by the text after its last `.` (case-insensitive).
    /// A name without a dot is treated as one big extension and rejected.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractionError> {
        let extension = filename
            .rsplit('.')
            .next()
            .unwrap_or(filename)
            .to_lowercase();

        match extension.as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            "txt" => Ok(DocumentFormat::Txt),
            _ => Err(ExtractionError::UnsupportedFormat { extension }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Txt => "txt",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracts plain text from an uploaded file.
pub fn extract_text(
    filename: &str,
    bytes: &[u8],
) -> Result<(DocumentFormat, String), ExtractionError> {
    let format = DocumentFormat::from_filename(filename)?;

    let text = match format {
        DocumentFormat::Pdf => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractionError::Pdf {
                filename: filename.to_string(),
                message: e.to_string(),
            })?
        }
        DocumentFormat::Docx => extract_docx(filename, bytes)?,
        DocumentFormat::Txt => {
            String::from_utf8(bytes.to_vec()).map_err(|source| ExtractionError::InvalidUtf8 {
                filename: filename.to_string(),
                source,
            })?
        }
    };

    tracing::debug!("Extracted {} chars from '{}' ({})", text.len(), filename, format);
    Ok((format, text))
}

/// Paragraph text of a .docx, one paragraph per line.
///
/// Paragraph → Run → Text; runs within a paragraph are concatenated as-is.
fn extract_docx(filename: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| ExtractionError::Docx {
        filename: filename.to_string(),
        message: format!("{e:?}"),
    })?;

    let mut text = String::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(para) = child {
            for para_child in &para.children {
                if let ParagraphChild::Run(run) = para_child {
                    for run_child in &run.children {
                        if let RunChild::Text(t) = run_child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }

    Ok(text)
}

//! Structured error types for the Carta engine.
//!
//! Very little in this crate is allowed to fail. Missing layout fields are
//! defaulted, missing assets become placeholders, over-height blocks get a
//! page of their own. What remains are the real input errors: a document that
//! doesn't parse, a font that can't be read, and I/O at the CLI boundary.

use thiserror::Error;

/// Result alias used by the public API.
pub type Result<T> = std::result::Result<T, CartaError>;

/// The unified error type returned by all public Carta API functions.
#[derive(Debug, Error)]
pub enum CartaError {
    /// JSON input failed to parse as a menu document or layout.
    #[error("Failed to parse document: {source}{}", format_hint(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
    /// A registered font could not be decoded or parsed.
    #[error("Font error: {0}")]
    Font(String),
    /// An asset (icon, logo) could not be resolved or decoded.
    #[error("Asset error: {0}")]
    Asset(String),
    /// PDF generation failed.
    #[error("Render error: {0}")]
    Render(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for CartaError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the menu document schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        CartaError::Parse { source: e, hint }
    }
}

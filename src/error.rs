//! Structured error types for the report renderer.
//!
//! Two layers: [`SurfaceError`] is local to one element and always recovered
//! by the layout code, while [`RenderError`] is terminal and only produced when
//! input cannot be read or the document cannot be finalized.

use std::path::PathBuf;

use thiserror::Error;

/// A failure of a single drawing-surface primitive.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("page {0} does not exist")]
    NoSuchPage(usize),
    #[error("box of height {0:.1} cannot hold a single line")]
    NoRoom(f64),
    #[error("image error: {0}")]
    Image(String),
    #[error("encoding error: {0}")]
    Encoding(String),
}

/// The terminal error type returned by the public rendering API.
#[derive(Debug, Error)]
pub enum RenderError {
    /// JSON input failed to parse.
    #[error("failed to parse input: {source}{}", hint_suffix(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
    /// A configuration or template file was rejected.
    #[error("config error: {0}")]
    Config(String),
    /// Reading input or writing the output file failed.
    #[error("i/o error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The document could not be serialized.
    #[error("failed to finalize document: {0}")]
    Finalize(#[source] SurfaceError),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but has the wrong shape. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        RenderError::Parse { source: e, hint }
    }
}

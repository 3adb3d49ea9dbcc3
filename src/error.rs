use thiserror::Error;
use crate::types::FontName;

/// Failure to produce an interchange document from a rendered tree.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("no `{marker}` page markers found under the export root")]
    NoPages { marker: String },

    #[error("failed to encode interchange document: {0}")]
    Json(#[from] serde_json::Error),
}

/// A platform rejection raised by a design host.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("font '{0}' is not available")]
    FontUnavailable(FontName),

    #[error("font '{0}' has not been loaded")]
    FontNotLoaded(FontName),

    #[error("text node has no font")]
    MissingFont,

    #[error("invalid vector markup: {0}")]
    InvalidMarkup(String),

    #[error("node {0} does not exist")]
    UnknownNode(u32),

    #[error("{property} is not supported on {kind} nodes")]
    Unsupported { property: &'static str, kind: &'static str },

    #[error("{property} rejected: {reason}")]
    Rejected { property: &'static str, reason: String },
}

/// Terminal reconstruction failures. The display strings are what the host
/// reports back to the user.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid JSON format")]
    InvalidFormat,

    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(serde_json::Value),

    #[error("Import failed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Import failed: no font could be loaded for '{family}'")]
    FontUnavailable { family: String },

    #[error("Import failed: {0}")]
    Host(#[from] HostError),
}

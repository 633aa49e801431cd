//! Error types for thesisfmt library.

use std::io;
use thiserror::Error;

/// Result type alias for thesisfmt operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reading, checking or rewriting a document.
///
/// Only conditions that stop the whole pipeline are represented here. Defects
/// confined to a single paragraph are recovered in place and logged.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not a zip-packaged word-processing document.
    #[error("Unknown file format: not a valid DOCX package")]
    UnknownFormat,

    /// The zip container could not be read or written.
    #[error("Package error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// An XML part could not be parsed or serialized.
    #[error("XML error in {part}: {message}")]
    Xml {
        /// Package entry the error belongs to
        part: String,
        /// Parser or writer message
        message: String,
    },

    /// A required package entry is missing.
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// The document structure is corrupted or malformed.
    #[error("Corrupted document structure: {0}")]
    Corrupted(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The requirement specification is not usable.
    #[error("Invalid requirement specification: {0}")]
    InvalidRequirement(String),

    /// The external classification capability failed.
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// Citation style name not recognized.
    #[error("Unsupported citation style: {0}")]
    UnsupportedCitationStyle(String),

    /// Error during report rendering.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an XML error for the given package part.
    pub fn xml(part: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::Xml {
            part: part.into(),
            message: message.to_string(),
        }
    }
}

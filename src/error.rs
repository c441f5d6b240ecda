//! Error types for the word2md library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Word2MdError`] — **Fatal** for the unit of work it occurs in: the
//!   whole run in single-document mode, one document in batch mode.
//!   Returned as `Err(Word2MdError)` from the `convert*` functions.
//!
//! * [`DocumentError`] — **Non-fatal**: one document in a batch failed but
//!   the batch carried on. Stored inside [`crate::output::BatchReport`] so
//!   callers can inspect partial success.
//!
//! Every fatal error belongs to one [`ErrorKind`]; the CLI uses it to pick a
//! message prefix, library callers can use it to decide what is worth
//! reporting to a user versus an operator.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`Word2MdError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad path, wrong extension, missing directory, invalid config.
    Validation,
    /// Read, write, or mkdir failure.
    Io,
    /// The extractor or renderer could not make sense of the input.
    Conversion,
}

/// All fatal errors returned by the word2md library.
#[derive(Debug, Error)]
pub enum Word2MdError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// Source document was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Source exists but does not carry the expected extension.
    #[error("File must be a {expected} file: '{path}'")]
    NotADocx { path: PathBuf, expected: String },

    /// Input directory for batch mode does not exist.
    #[error("Directory not found: '{path}'")]
    DirectoryNotFound { path: PathBuf },

    /// The input path is neither a regular file nor a directory.
    #[error("'{path}' is neither a file nor a directory")]
    UnsupportedInput { path: PathBuf },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not read the source document.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not list the entries of the input directory.
    #[error("Failed to list directory '{path}': {source}")]
    ListDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create the output or images directory.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write an extracted image.
    #[error("Failed to write image '{path}': {source}")]
    ImageWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The document container (zip) or one of its XML parts is unreadable.
    #[error("Document is corrupt: {detail}")]
    CorruptDocument { detail: String },

    /// A part every Word document must carry is absent.
    #[error("Document has no '{part}' part")]
    MissingPart { part: String },

    /// The HTML → Markdown transformer failed.
    #[error("Markdown rendering failed: {detail}")]
    RenderFailed { detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Word2MdError {
    /// Which of the three error kinds this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileNotFound { .. }
            | Self::NotADocx { .. }
            | Self::DirectoryNotFound { .. }
            | Self::UnsupportedInput { .. }
            | Self::InvalidConfig(_) => ErrorKind::Validation,
            Self::ReadFailed { .. }
            | Self::ListDirFailed { .. }
            | Self::CreateDirFailed { .. }
            | Self::ImageWriteFailed { .. }
            | Self::OutputWriteFailed { .. } => ErrorKind::Io,
            Self::CorruptDocument { .. }
            | Self::MissingPart { .. }
            | Self::RenderFailed { .. }
            | Self::Internal(_) => ErrorKind::Conversion,
        }
    }

    /// `true` for errors caused by bad user input rather than the environment.
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

impl From<zip::result::ZipError> for Word2MdError {
    fn from(e: zip::result::ZipError) -> Self {
        Word2MdError::CorruptDocument {
            detail: e.to_string(),
        }
    }
}

impl From<quick_xml::Error> for Word2MdError {
    fn from(e: quick_xml::Error) -> Self {
        Word2MdError::CorruptDocument {
            detail: format!("malformed XML: {e}"),
        }
    }
}

/// A non-fatal error for a single document in a batch.
///
/// The batch continues past it; the CLI prints it and still exits 0.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("Error converting {file_name}: {message}")]
pub struct DocumentError {
    /// File name (not full path) of the document that failed.
    pub file_name: String,
    /// Rendered message of the underlying [`Word2MdError`].
    pub message: String,
    /// Kind of the underlying error.
    pub kind: ErrorKind,
}

impl DocumentError {
    pub fn new(file_name: impl Into<String>, err: &Word2MdError) -> Self {
        Self {
            file_name: file_name.into(),
            message: err.to_string(),
            kind: err.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_a_docx_display_names_extension() {
        let e = Word2MdError::NotADocx {
            path: PathBuf::from("notes.txt"),
            expected: ".docx".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains(".docx"), "got: {msg}");
        assert!(msg.contains("notes.txt"), "got: {msg}");
    }

    #[test]
    fn kinds_are_grouped() {
        assert_eq!(
            Word2MdError::FileNotFound {
                path: "a.docx".into()
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            Word2MdError::OutputWriteFailed {
                path: "a.md".into(),
                source: std::io::Error::other("disk full"),
            }
            .kind(),
            ErrorKind::Io
        );
        assert_eq!(
            Word2MdError::MissingPart {
                part: "word/document.xml".into()
            }
            .kind(),
            ErrorKind::Conversion
        );
    }

    #[test]
    fn zip_error_maps_to_corrupt_document() {
        let e: Word2MdError = zip::result::ZipError::InvalidArchive("bad header".into()).into();
        assert_eq!(e.kind(), ErrorKind::Conversion);
        assert!(e.to_string().contains("corrupt"));
    }

    #[test]
    fn document_error_display_names_file() {
        let inner = Word2MdError::CorruptDocument {
            detail: "invalid Zip archive".into(),
        };
        let e = DocumentError::new("b.docx", &inner);
        assert!(e.to_string().contains("b.docx"));
        assert_eq!(e.kind, ErrorKind::Conversion);
    }
}

//! Result types produced by the conversion entry points.

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One embedded image after it has been written to the images directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenImage {
    /// Declared MIME type, e.g. `image/png`.
    pub content_type: String,
    /// `image-<uuid>.<ext>`.
    pub generated_name: String,
    /// Relative reference used in the Markdown, e.g. `images/image-….png`.
    pub reference: String,
    /// Where the bytes were written.
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Per-document counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub images_written: usize,
    pub image_bytes: u64,
    pub warnings: usize,
    pub duration_ms: u64,
}

/// Output of converting one document's bytes: Markdown text, warnings in the
/// order extraction produced them, and the images that were written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionResult {
    pub markdown: String,
    pub warnings: Vec<String>,
    pub images: Vec<WrittenImage>,
    pub stats: ConversionStats,
}

/// Output of converting one document file to one Markdown file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutput {
    pub source: PathBuf,
    pub output_path: PathBuf,
    /// Markdown text as written to `output_path`. Not serialised; it is on disk.
    #[serde(skip_serializing, default)]
    pub markdown: String,
    pub warnings: Vec<String>,
    pub images: Vec<WrittenImage>,
    pub stats: ConversionStats,
}

impl DocumentOutput {
    pub(crate) fn new(source: PathBuf, output_path: PathBuf, result: ConversionResult) -> Self {
        Self {
            source,
            output_path,
            markdown: result.markdown,
            warnings: result.warnings,
            images: result.images,
            stats: result.stats,
        }
    }
}

/// One item of a batch: the converted document or the error that stopped it.
pub type DocumentOutcome = Result<DocumentOutput, DocumentError>;

/// Summary of a directory conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Number of eligible documents found.
    pub found: usize,
    pub converted: Vec<DocumentOutput>,
    pub failed: Vec<DocumentError>,
}

impl BatchReport {
    pub(crate) fn new(input_dir: PathBuf, output_dir: PathBuf, found: usize) -> Self {
        Self {
            input_dir,
            output_dir,
            found,
            converted: Vec::with_capacity(found),
            failed: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, outcome: DocumentOutcome) {
        match outcome {
            Ok(doc) => self.converted.push(doc),
            Err(e) => self.failed.push(e),
        }
    }

    /// `true` when the input directory held no eligible documents.
    pub fn is_empty(&self) -> bool {
        self.found == 0
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, Word2MdError};

    #[test]
    fn report_records_outcomes() {
        let mut report = BatchReport::new("in".into(), "in/output".into(), 2);
        report.record(Ok(DocumentOutput::new(
            "in/a.docx".into(),
            "in/output/a.md".into(),
            ConversionResult::default(),
        )));
        let err = Word2MdError::CorruptDocument {
            detail: "bad zip".into(),
        };
        report.record(Err(DocumentError::new("b.docx", &err)));

        assert!(!report.is_empty());
        assert!(!report.all_succeeded());
        assert_eq!(report.converted.len(), 1);
        assert_eq!(report.failed[0].file_name, "b.docx");
        assert_eq!(report.failed[0].kind, ErrorKind::Conversion);
    }

    #[test]
    fn document_output_json_omits_markdown() {
        let doc = DocumentOutput::new(
            "a.docx".into(),
            "a.md".into(),
            ConversionResult {
                markdown: "# Title\n".into(),
                ..Default::default()
            },
        );
        let json = serde_json::to_string(&doc).unwrap();
        assert!(!json.contains("# Title"));
        assert!(json.contains("output_path"));
    }
}

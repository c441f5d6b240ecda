//! Eager conversion entry points: one document, one directory, or raw bytes.
//!
//! ## Single vs. batch failure semantics
//!
//! [`convert_document`] returns `Err` for anything that goes wrong: there is
//! only one unit of work, so a failure is the failure of the run.
//! [`convert_directory`] only returns `Err` when the directory itself is
//! unusable. A document that fails inside a batch is recorded as a
//! [`DocumentError`] in the [`BatchReport`] and the batch moves on.
//!
//! Documents are always processed one at a time, in file-name order. Use
//! [`crate::stream::convert_directory_stream`] to receive batch results as
//! they complete instead of all at the end.

use crate::config::ConversionConfig;
use crate::error::{DocumentError, Word2MdError};
use crate::output::{BatchReport, ConversionResult, ConversionStats, DocumentOutput};
use crate::pipeline::docx::DocxExtractor;
use crate::pipeline::extract::DocumentExtractor;
use crate::pipeline::images::ImageWriter;
use crate::pipeline::input;
use crate::pipeline::postprocess;
use crate::pipeline::render::{Html2MdRenderer, MarkdownRenderer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert one `.docx` file to Markdown.
///
/// The Markdown lands at `<output_dir>/<stem>.md` and images under
/// `<output_dir>/<images_dir_name>/`, where `output_dir` is
/// [`ConversionConfig::output_dir`] or, if unset, the directory holding the
/// source. An existing Markdown file of the same name is overwritten.
///
/// # Errors
/// - [`Word2MdError::FileNotFound`] / [`Word2MdError::NotADocx`] before
///   anything is written
/// - I/O errors for reading the source or writing outputs
/// - Conversion errors for corrupt or incomplete documents
pub async fn convert_document(
    source: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<DocumentOutput, Word2MdError> {
    let source = source.as_ref();
    info!("Starting conversion: {}", source.display());

    // ── Step 1: Validate input ───────────────────────────────────────────
    input::validate_document(source, &config.document_extension).await?;

    // ── Step 2: Resolve and create output layout ─────────────────────────
    let output_dir = config.document_output_dir(source);
    input::ensure_output_dirs(&output_dir, &config.images_dir_name).await?;

    // ── Step 3: Convert ──────────────────────────────────────────────────
    process_document(source, &output_dir, 1, 1, config).await
}

/// Convert every `.docx` directly inside `input_dir`.
///
/// Output goes to [`ConversionConfig::output_dir`] or, if unset,
/// `<input_dir>/<batch_output_dir_name>`. All documents share one images
/// directory; unique image names keep them apart.
///
/// # Returns
/// `Ok(BatchReport)` once every document has been attempted, even if some
/// (or all) of them failed. An input directory with no eligible documents
/// yields an empty report; only the output layout is created.
///
/// # Errors
/// Only for the directory as a whole: missing, unreadable, or an output
/// directory that cannot be created.
pub async fn convert_directory(
    input_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<BatchReport, Word2MdError> {
    let input_dir = input_dir.as_ref();
    info!("Starting batch conversion: {}", input_dir.display());

    // ── Step 1: Validate input ───────────────────────────────────────────
    input::validate_input_dir(input_dir).await?;

    // ── Step 2: Create output layout once for the whole batch ────────────
    let output_dir = config.batch_output_dir(input_dir);
    input::ensure_output_dirs(&output_dir, &config.images_dir_name).await?;

    // ── Step 3: List eligible documents ──────────────────────────────────
    let documents = input::list_documents(input_dir, config).await?;
    let mut report = BatchReport::new(
        input_dir.to_path_buf(),
        output_dir.clone(),
        documents.len(),
    );
    if documents.is_empty() {
        info!(
            "No {} files found in {}",
            config.document_extension,
            input_dir.display()
        );
        return Ok(report);
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(documents.len());
    }

    // ── Step 4: Convert sequentially, isolating failures ─────────────────
    let total = documents.len();
    for (i, path) in documents.iter().enumerate() {
        let outcome = process_document(path, &output_dir, i + 1, total, config)
            .await
            .map_err(|e| DocumentError::new(input::display_name(path), &e));
        report.record(outcome);
    }

    info!(
        "Batch complete: {}/{} documents converted",
        report.converted.len(),
        total
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, report.converted.len());
    }

    Ok(report)
}

/// Convert document bytes already in memory.
///
/// Images are written to `<output_dir>/<images_dir_name>/` (created if
/// missing); the Markdown is returned rather than written. Useful when the
/// document comes from a database or a network stream.
///
/// # Example
/// ```rust,no_run
/// use word2md::{convert_bytes, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("report.docx")?;
/// let result = convert_bytes(&bytes, "./out", &ConversionConfig::default()).await?;
/// println!("{}", result.markdown);
/// # Ok(())
/// # }
/// ```
pub async fn convert_bytes(
    bytes: &[u8],
    output_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionResult, Word2MdError> {
    let images_dir =
        input::ensure_output_dirs(output_dir.as_ref(), &config.images_dir_name).await?;
    convert_into(bytes, images_dir, config).await
}

/// Synchronous wrapper around [`convert_document`].
///
/// Creates a temporary tokio runtime internally; do not call from inside an
/// async context.
pub fn convert_sync(
    source: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<DocumentOutput, Word2MdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Word2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_document(source, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Convert one document whose output directories already exist, reporting
/// progress events for it. Shared by single, batch, and streaming modes.
pub(crate) async fn process_document(
    source: &Path,
    output_dir: &Path,
    index: usize,
    total: usize,
    config: &ConversionConfig,
) -> Result<DocumentOutput, Word2MdError> {
    let file_name = input::display_name(source);
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(&file_name, index, total);
    }

    let result = write_document(source, output_dir, config).await;

    match &result {
        Ok(doc) => {
            for w in &doc.warnings {
                warn!("{}: {}", file_name, w);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_warning(&file_name, w);
                }
            }
            info!(
                "Converted {} → {} ({} images, {} warnings, {}ms)",
                file_name,
                doc.output_path.display(),
                doc.stats.images_written,
                doc.stats.warnings,
                doc.stats.duration_ms
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_complete(&file_name, doc.images.len(), doc.warnings.len());
            }
        }
        Err(e) => {
            warn!("Error converting {}: {}", file_name, e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_error(&file_name, &e.to_string());
            }
        }
    }
    result
}

async fn write_document(
    source: &Path,
    output_dir: &Path,
    config: &ConversionConfig,
) -> Result<DocumentOutput, Word2MdError> {
    let bytes = tokio::fs::read(source)
        .await
        .map_err(|e| Word2MdError::ReadFailed {
            path: source.to_path_buf(),
            source: e,
        })?;
    debug!("Read {} bytes from {}", bytes.len(), source.display());

    let images_dir = output_dir.join(&config.images_dir_name);
    let result = convert_into(&bytes, images_dir, config).await?;

    let output_path =
        input::markdown_output_path(source, output_dir, &config.document_extension);
    write_markdown(&output_path, &result.markdown).await?;

    Ok(DocumentOutput::new(source.to_path_buf(), output_path, result))
}

/// Extract, render, and clean one document's bytes; images go to `images_dir`.
async fn convert_into(
    bytes: &[u8],
    images_dir: PathBuf,
    config: &ConversionConfig,
) -> Result<ConversionResult, Word2MdError> {
    let start = Instant::now();
    let extractor = resolve_extractor(config);
    let renderer = resolve_renderer(config);

    let mut writer = ImageWriter::new(images_dir, config);
    let extraction = extractor.extract(bytes, &mut writer).await?;
    let images = writer.into_written();

    let markdown = renderer.render(&extraction.html)?;
    let markdown = if config.post_process {
        postprocess::clean_markdown(&markdown)
    } else {
        markdown
    };

    let stats = ConversionStats {
        images_written: images.len(),
        image_bytes: images.iter().map(|i| i.size_bytes).sum(),
        warnings: extraction.warnings.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    Ok(ConversionResult {
        markdown,
        warnings: extraction.warnings,
        images,
        stats,
    })
}

/// Write via a temp file + rename so a failed write never leaves a
/// truncated Markdown file behind.
async fn write_markdown(path: &Path, markdown: &str) -> Result<(), Word2MdError> {
    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, markdown)
        .await
        .map_err(|e| Word2MdError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Word2MdError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Configured extractor, or the built-in `.docx` one.
fn resolve_extractor(config: &ConversionConfig) -> Arc<dyn DocumentExtractor> {
    match config.extractor {
        Some(ref extractor) => Arc::clone(extractor),
        None => Arc::new(DocxExtractor),
    }
}

/// Configured renderer, or the built-in `html2md` one.
fn resolve_renderer(config: &ConversionConfig) -> Arc<dyn MarkdownRenderer> {
    match config.renderer {
        Some(ref renderer) => Arc::clone(renderer),
        None => Arc::new(Html2MdRenderer),
    }
}

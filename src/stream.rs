//! Streaming batch conversion: yield each document's outcome as soon as it
//! has been written.
//!
//! ## Why a stream?
//!
//! [`crate::convert::convert_directory`] returns nothing until the last
//! document is done. A caller driving a UI or a job queue usually wants to
//! react per document, and a [`DocumentStream`] gives exactly that while
//! keeping the same ordering and failure isolation: documents are converted
//! one at a time in file-name order, and a failed document is an `Err` item,
//! never the end of the stream.

use crate::config::ConversionConfig;
use crate::convert::process_document;
use crate::error::{DocumentError, Word2MdError};
use crate::output::DocumentOutcome;
use crate::pipeline::input;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-document outcomes.
pub type DocumentStream = Pin<Box<dyn Stream<Item = DocumentOutcome> + Send>>;

/// Convert every `.docx` in `input_dir`, streaming outcomes in order.
///
/// Validation, listing, and output-directory creation happen before the
/// stream is returned, so those failures surface as the outer `Err`. Batch
/// start/complete progress events are not fired; per-document events are.
///
/// # Returns
/// - `Ok(DocumentStream)` — one item per eligible document (possibly none)
/// - `Err(Word2MdError)` — the directory itself is unusable
pub async fn convert_directory_stream(
    input_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<DocumentStream, Word2MdError> {
    let input_dir = input_dir.as_ref();
    info!("Starting streaming batch conversion: {}", input_dir.display());

    // ── Validate and create output layout ────────────────────────────────
    input::validate_input_dir(input_dir).await?;
    let output_dir = config.batch_output_dir(input_dir);
    input::ensure_output_dirs(&output_dir, &config.images_dir_name).await?;

    // ── List ─────────────────────────────────────────────────────────────
    let documents = input::list_documents(input_dir, config).await?;
    if documents.is_empty() {
        info!(
            "No {} files found in {}",
            config.document_extension,
            input_dir.display()
        );
        return Ok(Box::pin(stream::empty::<DocumentOutcome>()));
    }

    let total = documents.len();
    let config = config.clone();
    let s = stream::iter(documents.into_iter().enumerate()).then(move |(i, path)| {
        let config = config.clone();
        let output_dir = output_dir.clone();
        async move {
            process_document(&path, &output_dir, i + 1, total, &config)
                .await
                .map_err(|e| DocumentError::new(input::display_name(&path), &e))
        }
    });

    Ok(Box::pin(s))
}

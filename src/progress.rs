//! Progress-callback trait for per-document conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline works through a document or a batch.
//!
//! # Example
//!
//! ```rust
//! use word2md::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, file_name: &str, images: usize, warnings: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{file_name}: {images} images, {warnings} warnings");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it processes each document.
///
/// Implementations must be `Send + Sync` so a config can be shared with
/// spawned tasks. All methods have default no-op implementations so callers
/// only override what they care about. Events arrive strictly in order:
/// documents are never processed concurrently.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first document of a batch.
    ///
    /// # Arguments
    /// * `total_documents` — number of eligible documents found
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called before a document is read.
    ///
    /// # Arguments
    /// * `file_name` — file name of the document
    /// * `index`     — 1-indexed position in the batch (1 in single mode)
    /// * `total`     — batch size (1 in single mode)
    fn on_document_start(&self, file_name: &str, index: usize, total: usize) {
        let _ = (file_name, index, total);
    }

    /// Called once per extraction warning, in the order they were produced.
    fn on_warning(&self, file_name: &str, message: &str) {
        let _ = (file_name, message);
    }

    /// Called when a document's Markdown has been written.
    ///
    /// # Arguments
    /// * `file_name` — file name of the document
    /// * `images`    — number of images written for it
    /// * `warnings`  — number of extraction warnings
    fn on_document_complete(&self, file_name: &str, images: usize, warnings: usize) {
        let _ = (file_name, images, warnings);
    }

    /// Called when a document fails.
    ///
    /// # Arguments
    /// * `file_name` — file name of the document
    /// * `error`     — human-readable error description
    fn on_document_error(&self, file_name: &str, error: &str) {
        let _ = (file_name, error);
    }

    /// Called once after every document of a batch has been attempted.
    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

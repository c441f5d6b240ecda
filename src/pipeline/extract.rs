//! Structure extraction seam: document bytes → HTML + warnings.
//!
//! The pipeline never talks to a concrete parser. It hands the raw document
//! bytes to a [`DocumentExtractor`] together with an [`ImageHandler`]; the
//! extractor calls the handler once per embedded image, in document order,
//! and awaits the returned [`ImageReference`] before moving on to the next
//! image. The reference's `src` is what ends up in the HTML.
//!
//! [`crate::pipeline::docx::DocxExtractor`] is the default implementation.
//! Tests swap in their own extractor to exercise the pipeline without
//! building real documents.

use crate::error::Word2MdError;
use async_trait::async_trait;

/// One embedded image, as found by the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    /// Declared MIME type, e.g. `image/png`. Empty when the document did not
    /// declare one.
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// Alternative text attached to the image in the document, if any.
    pub alt_text: Option<String>,
}

/// Replacement reference for an image, returned by the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub src: String,
    pub alt: Option<String>,
}

/// What an extractor produces for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// HTML fragment with every image reference already rewritten.
    pub html: String,
    /// Non-fatal structural notices, in the order they were raised.
    pub warnings: Vec<String>,
}

/// Receives every embedded image during extraction.
#[async_trait]
pub trait ImageHandler: Send {
    /// Persist (or otherwise handle) `image` and return the reference the
    /// HTML should use for it. An error aborts the extraction.
    async fn on_image(&mut self, image: EmbeddedImage) -> Result<ImageReference, Word2MdError>;
}

/// Turns document bytes into HTML, reporting images through `images`.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract(
        &self,
        bytes: &[u8],
        images: &mut dyn ImageHandler,
    ) -> Result<Extraction, Word2MdError>;
}

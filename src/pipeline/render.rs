//! HTML → Markdown rendering.
//!
//! The extractor hands over an HTML fragment; a [`MarkdownRenderer`] turns it
//! into Markdown text. Image elements must come out as `![alt](src)` with
//! `src` untouched, because `src` is the `images/<name>` reference the image
//! writer already produced.
//!
//! ## Why catch_unwind?
//!
//! `html2md` walks the DOM recursively and has been known to panic on odd
//! nesting. A panic inside one document must not take down a whole batch, so
//! it is caught here and surfaced as [`Word2MdError::RenderFailed`].

use crate::error::Word2MdError;
use tracing::debug;

/// Converts an HTML fragment into Markdown text.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, html: &str) -> Result<String, Word2MdError>;
}

/// Default renderer backed by the `html2md` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Html2MdRenderer;

impl MarkdownRenderer for Html2MdRenderer {
    fn render(&self, html: &str) -> Result<String, Word2MdError> {
        debug!("Rendering {} bytes of HTML", html.len());
        std::panic::catch_unwind(|| html2md::parse_html(html)).map_err(|panic| {
            let detail = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "html2md panicked".to_string());
            Word2MdError::RenderFailed { detail }
        })
    }
}

//! # word2md
//!
//! Convert Word documents (`.docx`) to Markdown, extracting embedded images
//! into an `images/` directory next to the output and rewriting every image
//! reference to point at the extracted file.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .docx
//!  │
//!  ├─ 1. Input    validate path, resolve output layout, create directories
//!  ├─ 2. Extract  zip + XML → HTML (spawn_blocking); images handed out one by one
//!  ├─ 3. Images   write image-<uuid>.<ext>, reference becomes images/<name>
//!  ├─ 4. Render   HTML → Markdown (html2md)
//!  ├─ 5. Polish   deterministic whitespace cleanup
//!  └─ 6. Output   <stem>.md + warnings + per-document stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use word2md::{convert_document, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder().output_dir("./markdown").build()?;
//!     let output = convert_document("report.docx", &config).await?;
//!     println!("wrote {}", output.output_path.display());
//!     for w in &output.warnings {
//!         eprintln!("warning: {w}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Batch Mode
//!
//! [`convert_directory`] converts every `.docx` directly inside a directory,
//! one at a time in file-name order. A document that fails is recorded in the
//! returned [`BatchReport`] and the batch carries on.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `word2md` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! word2md = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert_bytes, convert_directory, convert_document, convert_sync};
pub use error::{DocumentError, ErrorKind, Word2MdError};
pub use output::{
    BatchReport, ConversionResult, ConversionStats, DocumentOutcome, DocumentOutput, WrittenImage,
};
pub use pipeline::docx::DocxExtractor;
pub use pipeline::extract::{
    DocumentExtractor, EmbeddedImage, Extraction, ImageHandler, ImageReference,
};
pub use pipeline::input::{classify_input, InputKind};
pub use pipeline::render::{Html2MdRenderer, MarkdownRenderer};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{convert_directory_stream, DocumentStream};

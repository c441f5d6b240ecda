//! Pipeline stages for Word-to-Markdown conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different HTML → Markdown backend) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ images ──▶ render ──▶ postprocess
//! (paths)   (docx→HTML) (to disk)  (html2md)  (cleanup)
//! ```
//!
//! 1. [`input`]   — classify and validate paths, list batch documents,
//!    create output directories
//! 2. [`extract`] — the extractor seam; [`docx`] is the default
//!    implementation and parses the zip container in `spawn_blocking`
//! 3. [`images`]  — write each embedded image under a unique name and return
//!    the `images/<name>` reference the HTML should use
//! 4. [`render`]  — HTML → Markdown
//! 5. [`postprocess`] — deterministic whitespace and invisible-character
//!    cleanup

pub mod docx;
pub mod extract;
pub mod images;
pub mod input;
pub mod postprocess;
pub mod render;

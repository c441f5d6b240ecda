//! Configuration types for Word-to-Markdown conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Output locations are always explicit
//! here: nothing is inferred from the working directory or from where the
//! executable happens to be installed.

use crate::error::Word2MdError;
use crate::pipeline::extract::DocumentExtractor;
use crate::pipeline::render::MarkdownRenderer;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configuration for a Word-to-Markdown conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use word2md::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .output_dir("./markdown")
///     .images_dir_name("assets")
///     .build()
///     .unwrap();
/// assert_eq!(config.images_dir_name, "assets");
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Where Markdown files (and the images directory) are written.
    ///
    /// If None: single-document mode writes next to the source file, batch
    /// mode writes to `<input_dir>/<batch_output_dir_name>`.
    pub output_dir: Option<PathBuf>,

    /// Name of the images subdirectory under the output directory. Default: `images`.
    ///
    /// Also the prefix of every rewritten image reference (`images/<name>`).
    pub images_dir_name: String,

    /// Suffix a file must end with to be treated as a document. Default: `.docx`.
    ///
    /// Matched case-sensitively, so `report.DOCX` is not picked up.
    pub document_extension: String,

    /// Prefix of generated image file names. Default: `image`.
    pub image_prefix: String,

    /// Extension used when an image's content type carries no subtype. Default: `png`.
    pub default_image_extension: String,

    /// Batch-mode output directory name under the input directory. Default: `output`.
    pub batch_output_dir_name: String,

    /// Run the deterministic Markdown cleanup rules. Default: true.
    pub post_process: bool,

    /// Pre-constructed structure extractor. If None, uses [`crate::DocxExtractor`].
    pub extractor: Option<Arc<dyn DocumentExtractor>>,

    /// Pre-constructed HTML → Markdown renderer. If None, uses [`crate::Html2MdRenderer`].
    pub renderer: Option<Arc<dyn MarkdownRenderer>>,

    /// Optional per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            images_dir_name: "images".to_string(),
            document_extension: ".docx".to_string(),
            image_prefix: "image".to_string(),
            default_image_extension: "png".to_string(),
            batch_output_dir_name: "output".to_string(),
            post_process: true,
            extractor: None,
            renderer: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("output_dir", &self.output_dir)
            .field("images_dir_name", &self.images_dir_name)
            .field("document_extension", &self.document_extension)
            .field("image_prefix", &self.image_prefix)
            .field("default_image_extension", &self.default_image_extension)
            .field("batch_output_dir_name", &self.batch_output_dir_name)
            .field("post_process", &self.post_process)
            .field(
                "extractor",
                &self.extractor.as_ref().map(|_| "<dyn DocumentExtractor>"),
            )
            .field(
                "renderer",
                &self.renderer.as_ref().map(|_| "<dyn MarkdownRenderer>"),
            )
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Output directory for a single document: the configured one, else the
    /// directory containing `source`.
    pub fn document_output_dir(&self, source: &Path) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => source
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    /// Output directory for a batch: the configured one, else
    /// `<input_dir>/<batch_output_dir_name>`.
    pub fn batch_output_dir(&self, input_dir: &Path) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => input_dir.join(&self.batch_output_dir_name),
        }
    }

    /// `true` when `file_name` ends with the document extension (case-sensitive).
    pub fn is_document_name(&self, file_name: &str) -> bool {
        file_name.ends_with(&self.document_extension)
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl fmt::Debug for ConversionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ConversionConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    pub fn images_dir_name(mut self, name: impl Into<String>) -> Self {
        self.config.images_dir_name = name.into();
        self
    }

    pub fn document_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.document_extension = ext.into();
        self
    }

    pub fn image_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.image_prefix = prefix.into();
        self
    }

    pub fn default_image_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.default_image_extension = ext.into();
        self
    }

    pub fn batch_output_dir_name(mut self, name: impl Into<String>) -> Self {
        self.config.batch_output_dir_name = name.into();
        self
    }

    pub fn post_process(mut self, v: bool) -> Self {
        self.config.post_process = v;
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn DocumentExtractor>) -> Self {
        self.config.extractor = Some(extractor);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn MarkdownRenderer>) -> Self {
        self.config.renderer = Some(renderer);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Word2MdError> {
        let c = &self.config;
        if !is_single_component(&c.images_dir_name) {
            return Err(Word2MdError::InvalidConfig(format!(
                "images directory name must be a single path component, got '{}'",
                c.images_dir_name
            )));
        }
        if !is_single_component(&c.batch_output_dir_name) {
            return Err(Word2MdError::InvalidConfig(format!(
                "batch output directory name must be a single path component, got '{}'",
                c.batch_output_dir_name
            )));
        }
        if c.document_extension.len() < 2 || !c.document_extension.starts_with('.') {
            return Err(Word2MdError::InvalidConfig(format!(
                "document extension must look like '.docx', got '{}'",
                c.document_extension
            )));
        }
        if c.default_image_extension.is_empty()
            || !c
                .default_image_extension
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric())
        {
            return Err(Word2MdError::InvalidConfig(format!(
                "default image extension must be alphanumeric, got '{}'",
                c.default_image_extension
            )));
        }
        if c.image_prefix.contains(['/', '\\']) {
            return Err(Word2MdError::InvalidConfig(format!(
                "image prefix must not contain path separators, got '{}'",
                c.image_prefix
            )));
        }
        Ok(self.config)
    }
}

fn is_single_component(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

//! Image extraction: write each embedded image to the images directory under
//! a fresh unique name and hand back the relative reference for the Markdown.
//!
//! ## Naming
//!
//! `<prefix>-<uuid v4>.<ext>`, where `<ext>` is the subtype of the image's
//! content type (`image/png` → `png`, `image/svg+xml` → `svg`). Names are
//! random, so converting the same document twice never overwrites the first
//! run's images, and two documents of a batch can share one images directory.

use crate::config::ConversionConfig;
use crate::error::Word2MdError;
use crate::output::WrittenImage;
use crate::pipeline::extract::{EmbeddedImage, ImageHandler, ImageReference};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

/// File extension for `content_type`: the part after `/`, without parameters
/// or a structured-syntax suffix. `default` when nothing usable is left.
pub fn extension_for_content_type(content_type: &str, default: &str) -> String {
    let subtype = content_type
        .split(';')
        .next()
        .and_then(|essence| essence.split_once('/'))
        .map(|(_, sub)| sub.split('+').next().unwrap_or(sub).trim().to_ascii_lowercase())
        .unwrap_or_default();
    if subtype.is_empty()
        || !subtype
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        default.to_string()
    } else {
        subtype
    }
}

/// [`ImageHandler`] that persists images to disk.
#[derive(Debug)]
pub struct ImageWriter {
    images_dir: PathBuf,
    images_dir_name: String,
    prefix: String,
    default_extension: String,
    written: Vec<WrittenImage>,
}

impl ImageWriter {
    /// `images_dir` must already exist.
    pub fn new(images_dir: PathBuf, config: &ConversionConfig) -> Self {
        Self {
            images_dir,
            images_dir_name: config.images_dir_name.clone(),
            prefix: config.image_prefix.clone(),
            default_extension: config.default_image_extension.clone(),
            written: Vec::new(),
        }
    }

    /// Images written so far, in document order.
    pub fn into_written(self) -> Vec<WrittenImage> {
        self.written
    }

    fn generate_name(&self, content_type: &str) -> String {
        let ext = extension_for_content_type(content_type, &self.default_extension);
        format!("{}-{}.{}", self.prefix, Uuid::new_v4(), ext)
    }
}

#[async_trait]
impl ImageHandler for ImageWriter {
    async fn on_image(&mut self, image: EmbeddedImage) -> Result<ImageReference, Word2MdError> {
        let name = self.generate_name(&image.content_type);
        let path = self.images_dir.join(&name);
        tokio::fs::write(&path, &image.bytes)
            .await
            .map_err(|source| Word2MdError::ImageWriteFailed {
                path: path.clone(),
                source,
            })?;

        let reference = format!("{}/{}", self.images_dir_name, name);
        debug!(
            "Wrote image {} ({} bytes, {})",
            path.display(),
            image.bytes.len(),
            image.content_type
        );
        self.written.push(WrittenImage {
            content_type: image.content_type,
            generated_name: name,
            reference: reference.clone(),
            path,
            size_bytes: image.bytes.len() as u64,
        });

        Ok(ImageReference {
            src: reference,
            alt: image.alt_text,
        })
    }
}

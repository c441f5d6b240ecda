//! Input resolution: classify the user-supplied path, validate it, and work
//! out where the outputs go.
//!
//! Validation happens up front so a bad path fails before any directory is
//! created. Existence is checked before the extension: a missing `notes.txt`
//! reports "not found", not "wrong type".

use crate::config::ConversionConfig;
use crate::error::Word2MdError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What the CLI's positional argument turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    Document(PathBuf),
    Directory(PathBuf),
}

/// Decide whether `path` is a single document or a directory of documents.
pub async fn classify_input(path: &Path) -> Result<InputKind, Word2MdError> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|_| Word2MdError::FileNotFound {
            path: path.to_path_buf(),
        })?;
    if meta.is_dir() {
        Ok(InputKind::Directory(path.to_path_buf()))
    } else if meta.is_file() {
        Ok(InputKind::Document(path.to_path_buf()))
    } else {
        Err(Word2MdError::UnsupportedInput {
            path: path.to_path_buf(),
        })
    }
}

/// Check that `path` is an existing regular file ending with `extension`.
pub async fn validate_document(path: &Path, extension: &str) -> Result<(), Word2MdError> {
    let is_file = tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(Word2MdError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let named_right = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(extension));
    if !named_right {
        return Err(Word2MdError::NotADocx {
            path: path.to_path_buf(),
            expected: extension.to_string(),
        });
    }
    debug!("Validated document: {}", path.display());
    Ok(())
}

/// Check that `path` is an existing directory.
pub async fn validate_input_dir(path: &Path) -> Result<(), Word2MdError> {
    match tokio::fs::metadata(path).await {
        Ok(m) if m.is_dir() => Ok(()),
        _ => Err(Word2MdError::DirectoryNotFound {
            path: path.to_path_buf(),
        }),
    }
}

/// Create `output_dir` and `output_dir/images_dir_name` if missing.
///
/// Returns the images directory path.
pub async fn ensure_output_dirs(
    output_dir: &Path,
    images_dir_name: &str,
) -> Result<PathBuf, Word2MdError> {
    let images_dir = output_dir.join(images_dir_name);
    tokio::fs::create_dir_all(&images_dir)
        .await
        .map_err(|source| Word2MdError::CreateDirFailed {
            path: images_dir.clone(),
            source,
        })?;
    Ok(images_dir)
}

/// Eligible documents directly inside `dir`, sorted by file name.
///
/// Only regular files whose name ends with the configured extension
/// (case-sensitive) are returned; subdirectories are not descended into.
pub async fn list_documents(
    dir: &Path,
    config: &ConversionConfig,
) -> Result<Vec<PathBuf>, Word2MdError> {
    let list_err = |source: std::io::Error| Word2MdError::ListDirFailed {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = tokio::fs::read_dir(dir).await.map_err(list_err)?;
    let mut documents = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !config.is_document_name(name) {
            continue;
        }
        let is_file = tokio::fs::metadata(entry.path())
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if is_file {
            documents.push(entry.path());
        }
    }
    documents.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!("Found {} documents in {}", documents.len(), dir.display());
    Ok(documents)
}

/// `<output_dir>/<stem>.md`, where `<stem>` is the file name with the
/// document extension removed.
pub fn markdown_output_path(source: &Path, output_dir: &Path, extension: &str) -> PathBuf {
    let name = display_name(source);
    let stem = name.strip_suffix(extension).unwrap_or(&name);
    output_dir.join(format!("{stem}.md"))
}

/// File name of `path` for messages; falls back to the whole path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_strips_extension() {
        assert_eq!(
            markdown_output_path(Path::new("/in/report.docx"), Path::new("/out"), ".docx"),
            PathBuf::from("/out/report.md")
        );
        assert_eq!(
            markdown_output_path(Path::new("/in/a.b.docx"), Path::new("/out"), ".docx"),
            PathBuf::from("/out/a.b.md")
        );
    }

    #[tokio::test]
    async fn missing_file_is_not_found_even_with_wrong_extension() {
        let err = validate_document(Path::new("/definitely/missing/notes.txt"), ".docx")
            .await
            .unwrap_err();
        assert!(matches!(err, Word2MdError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn existing_file_with_wrong_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hi").unwrap();
        let err = validate_document(&path, ".docx").await.unwrap_err();
        assert!(matches!(err, Word2MdError::NotADocx { .. }), "{err}");
    }

    #[tokio::test]
    async fn list_documents_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.docx", "a.docx", "c.DOCX", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("folder.docx")).unwrap();

        let docs = list_documents(dir.path(), &ConversionConfig::default())
            .await
            .unwrap();
        let names: Vec<String> = docs.iter().map(|p| display_name(p)).collect();
        assert_eq!(names, vec!["a.docx", "b.docx"]);
    }

    #[tokio::test]
    async fn classify_distinguishes_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.docx");
        std::fs::write(&file, b"x").unwrap();

        assert_eq!(
            classify_input(dir.path()).await.unwrap(),
            InputKind::Directory(dir.path().to_path_buf())
        );
        assert_eq!(classify_input(&file).await.unwrap(), InputKind::Document(file));
        assert!(matches!(
            classify_input(&dir.path().join("nope")).await,
            Err(Word2MdError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn ensure_output_dirs_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let images = ensure_output_dirs(&out, "images").await.unwrap();
        assert!(images.is_dir());
        ensure_output_dirs(&out, "images").await.unwrap();
    }
}

//! End-to-end integration tests for word2md.
//!
//! Every test builds its documents in memory (see `common/mod.rs`), writes
//! them into a fresh temp directory, and runs the real pipeline: zip parsing,
//! image extraction, HTML → Markdown, and the file layout on disk.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

mod common;

use common::{image_references, sample_docx, strip_image_names, write_file, DocxBuilder, PNG};
use std::collections::HashSet;
use std::sync::Arc;
use word2md::{
    convert_bytes, convert_directory, convert_directory_stream, convert_document,
    ConversionConfig, ConversionProgressCallback, DocumentExtractor, EmbeddedImage, ErrorKind,
    Extraction, ImageHandler, Word2MdError,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn files_in(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Assert the markdown passes basic quality checks.
fn assert_markdown_quality(md: &str, context: &str) {
    assert!(!md.trim().is_empty(), "[{context}] Markdown is empty");
    assert!(
        md.ends_with('\n') && !md.ends_with("\n\n"),
        "[{context}] Markdown must end with exactly one newline"
    );
    assert!(
        !md.contains("\n\n\n"),
        "[{context}] Markdown contains runs of blank lines"
    );
    assert!(!md.contains('\r'), "[{context}] Markdown contains CR");
}

// ── Single-document mode ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_single_document_layout() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_file(dir.path(), "report.docx", &sample_docx());

    let output = convert_document(&source, &ConversionConfig::default())
        .await
        .unwrap();

    assert_eq!(output.output_path, dir.path().join("report.md"));
    let md = std::fs::read_to_string(&output.output_path).unwrap();
    assert_markdown_quality(&md, "report");
    assert!(md.contains("Quarterly Report"));
    assert!(md.contains("Revenue grew in every region."));
    assert!(md.contains("Revenue chart"), "alt text missing:\n{md}");

    let refs = image_references(&md);
    assert_eq!(refs.len(), 2, "expected two image references:\n{md}");
    for r in &refs {
        assert!(dir.path().join(r).is_file(), "missing image file for {r}");
    }
    assert!(refs[0].ends_with(".png"));
    assert!(refs[1].ends_with(".jpeg"));
    assert_eq!(
        std::fs::read(dir.path().join(&refs[0])).unwrap(),
        PNG,
        "image bytes must be copied verbatim"
    );

    assert_eq!(output.stats.images_written, 2);
    assert!(output.warnings.is_empty(), "{:?}", output.warnings);
}

#[tokio::test]
async fn test_generated_names_unique_within_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut builder = DocxBuilder::new().heading("Gallery");
    for i in 0..8 {
        builder = builder.image(&format!("image{i}.png"), PNG, "");
    }
    let source = write_file(dir.path(), "gallery.docx", &builder.build());

    let output = convert_document(&source, &ConversionConfig::default())
        .await
        .unwrap();

    let names: HashSet<&str> = output
        .images
        .iter()
        .map(|i| i.generated_name.as_str())
        .collect();
    assert_eq!(names.len(), 8);
    assert_eq!(files_in(&dir.path().join("images")).len(), 8);
}

#[tokio::test]
async fn test_convert_twice_is_stable_apart_from_image_names() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_file(dir.path(), "report.docx", &sample_docx());
    let config = ConversionConfig::default();

    let first = convert_document(&source, &config).await.unwrap();
    let second = convert_document(&source, &config).await.unwrap();

    assert_ne!(first.markdown, second.markdown, "image names must differ");
    assert_eq!(
        strip_image_names(&first.markdown),
        strip_image_names(&second.markdown)
    );
    // Both runs' images survive side by side.
    assert_eq!(files_in(&dir.path().join("images")).len(), 4);
    // The Markdown file was overwritten with the second run.
    let on_disk = std::fs::read_to_string(dir.path().join("report.md")).unwrap();
    assert_eq!(on_disk, second.markdown);
}

#[tokio::test]
async fn test_output_dir_override() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_file(dir.path(), "report.docx", &sample_docx());
    let out = dir.path().join("nested/out");

    let config = ConversionConfig::builder().output_dir(&out).build().unwrap();
    let output = convert_document(&source, &config).await.unwrap();

    assert_eq!(output.output_path, out.join("report.md"));
    assert_eq!(files_in(&out.join("images")).len(), 2);
    assert!(!dir.path().join("images").exists());
}

#[tokio::test]
async fn test_missing_input_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let err = convert_document(dir.path().join("absent.docx"), &ConversionConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Word2MdError::FileNotFound { .. }), "{err}");
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn test_uppercase_extension_rejected_in_single_mode() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_file(dir.path(), "REPORT.DOCX", &sample_docx());

    let err = convert_document(&source, &ConversionConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Word2MdError::NotADocx { .. }), "{err}");
}

#[tokio::test]
async fn test_corrupt_document_is_conversion_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_file(dir.path(), "broken.docx", b"PK\x03\x04 not really a zip");

    let err = convert_document(&source, &ConversionConfig::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conversion, "{err}");
    assert!(!dir.path().join("broken.md").exists());
}

/// Writes one image, then fails on the second before it is handed out.
struct FailsOnSecondImage;

#[async_trait::async_trait]
impl DocumentExtractor for FailsOnSecondImage {
    async fn extract(
        &self,
        _bytes: &[u8],
        images: &mut dyn ImageHandler,
    ) -> Result<Extraction, Word2MdError> {
        images
            .on_image(EmbeddedImage {
                content_type: "image/png".into(),
                bytes: PNG.to_vec(),
                alt_text: None,
            })
            .await?;
        Err(Word2MdError::CorruptDocument {
            detail: "second image part is truncated".into(),
        })
    }
}

#[tokio::test]
async fn test_failed_document_keeps_images_already_written() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_file(dir.path(), "partial.docx", &sample_docx());
    let config = ConversionConfig::builder()
        .extractor(Arc::new(FailsOnSecondImage))
        .build()
        .unwrap();

    let err = convert_document(&source, &config).await.unwrap_err();
    assert!(matches!(err, Word2MdError::CorruptDocument { .. }), "{err}");

    let images = files_in(&dir.path().join("images"));
    assert_eq!(images.len(), 1, "{images:?}");
    assert!(images[0].starts_with("image-") && images[0].ends_with(".png"));
    assert_eq!(
        std::fs::read(dir.path().join("images").join(&images[0])).unwrap(),
        PNG
    );
    assert!(!dir.path().join("partial.md").exists());
}

#[tokio::test]
async fn test_unknown_style_warns_but_converts() {
    let dir = tempfile::tempdir().unwrap();
    let doc = DocxBuilder::new()
        .style("Fancy", "Fancy Body")
        .paragraph(Some("Fancy"), "Styled text")
        .paragraph(Some("Fancy"), "More styled text")
        .build();
    let source = write_file(dir.path(), "styled.docx", &doc);

    let output = convert_document(&source, &ConversionConfig::default())
        .await
        .unwrap();

    assert_eq!(
        output.warnings,
        vec!["Unrecognised paragraph style: 'Fancy Body' (Style ID: Fancy)".to_string()]
    );
    assert!(output.markdown.contains("Styled text"));
    assert!(output.markdown.contains("More styled text"));
}

// ── Batch mode ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_batch_extension_filter() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.docx", &sample_docx());
    write_file(dir.path(), "b.txt", b"plain text");
    write_file(dir.path(), "c.DOCX", &sample_docx());

    let report = convert_directory(dir.path(), &ConversionConfig::default())
        .await
        .unwrap();

    assert_eq!(report.found, 1);
    assert!(report.all_succeeded());
    let out = dir.path().join("output");
    assert_eq!(files_in(&out), vec!["a.md", "images"]);
}

#[tokio::test]
async fn test_batch_continues_past_corrupt_document() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.docx", &sample_docx());
    write_file(dir.path(), "b.docx", b"this is not a zip archive");
    write_file(dir.path(), "c.docx", &sample_docx());

    let report = convert_directory(dir.path(), &ConversionConfig::default())
        .await
        .unwrap();

    assert_eq!(report.found, 3);
    assert_eq!(report.converted.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].file_name, "b.docx");
    assert!(report.failed[0].to_string().contains("b.docx"));

    let out = dir.path().join("output");
    assert!(out.join("a.md").is_file());
    assert!(out.join("c.md").is_file());
    assert!(!out.join("b.md").exists());
    // Shared images directory holds both good documents' images.
    assert_eq!(files_in(&out.join("images")).len(), 4);
}

#[tokio::test]
async fn test_batch_empty_directory_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "notes.txt", b"nothing to see");

    let report = convert_directory(dir.path(), &ConversionConfig::default())
        .await
        .unwrap();

    assert!(report.is_empty());
    assert_eq!(files_in(&dir.path().join("output")), vec!["images"]);
    assert!(files_in(&dir.path().join("output/images")).is_empty());
}

#[tokio::test]
async fn test_batch_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let err = convert_directory(dir.path().join("absent"), &ConversionConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Word2MdError::DirectoryNotFound { .. }), "{err}");
    assert!(files_in(dir.path()).is_empty());
}

#[tokio::test]
async fn test_batch_rerun_into_same_output() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.docx", &sample_docx());
    let config = ConversionConfig::default();

    convert_directory(dir.path(), &config).await.unwrap();
    let report = convert_directory(dir.path(), &config).await.unwrap();

    assert!(report.all_succeeded());
    assert_eq!(files_in(&dir.path().join("output/images")).len(), 4);
}

#[tokio::test]
async fn test_batch_report_json_serialisable() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.docx", &sample_docx());
    write_file(dir.path(), "b.docx", b"garbage");

    let report = convert_directory(dir.path(), &ConversionConfig::default())
        .await
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["found"], 2);
    assert_eq!(json["failed"][0]["file_name"], "b.docx");
    assert_eq!(json["failed"][0]["kind"], "conversion");
    assert_eq!(json["converted"][0]["stats"]["images_written"], 2);
}

#[tokio::test]
async fn test_stream_matches_batch_order() {
    use futures::StreamExt;

    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "z.docx", &sample_docx());
    write_file(dir.path(), "m.docx", &sample_docx());

    let names: Vec<String> = convert_directory_stream(dir.path(), &ConversionConfig::default())
        .await
        .unwrap()
        .map(|outcome| {
            let doc = outcome.unwrap();
            doc.output_path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect()
        .await;

    assert_eq!(names, vec!["m.md", "z.md"]);
}

// ── Library-only entry points ────────────────────────────────────────────────

#[tokio::test]
async fn test_convert_bytes_in_memory() {
    let dir = tempfile::tempdir().unwrap();
    let result = convert_bytes(&sample_docx(), dir.path(), &ConversionConfig::default())
        .await
        .unwrap();

    assert_markdown_quality(&result.markdown, "bytes");
    assert_eq!(result.images.len(), 2);
    for img in &result.images {
        assert!(img.path.is_file());
        assert!(result.markdown.contains(&img.reference));
    }
    // Markdown is returned, not written.
    assert_eq!(files_in(dir.path()), vec!["images"]);
}

#[tokio::test]
async fn test_callback_send_in_tokio_spawn() {
    struct Silent;
    impl ConversionProgressCallback for Silent {}

    let dir = tempfile::tempdir().unwrap();
    let source = write_file(dir.path(), "report.docx", &sample_docx());
    let config = ConversionConfig::builder()
        .progress_callback(Arc::new(Silent))
        .build()
        .unwrap();

    let handle =
        tokio::spawn(async move { convert_document(&source, &config).await.map(|o| o.images.len()) });
    assert_eq!(handle.await.unwrap().unwrap(), 2);
}

#[test]
fn test_noop_callback_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<word2md::NoopProgressCallback>();
    assert_send_sync::<ConversionConfig>();
}

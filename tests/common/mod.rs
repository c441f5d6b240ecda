//! In-memory `.docx` fixtures shared by the integration tests.
//!
//! Packages are assembled with `zip::ZipWriter` so the tests need no binary
//! files checked into the repository.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

/// 8-byte PNG signature followed by junk; nothing decodes it.
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfixture";
pub const JPEG: &[u8] = b"\xff\xd8\xff\xe0fixture";

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Builder for a minimal but well-formed word-processing package.
#[derive(Default)]
pub struct DocxBuilder {
    body: String,
    rels: String,
    media: Vec<(String, Vec<u8>)>,
    styles: Vec<(String, String)>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paragraph with an optional paragraph style id.
    pub fn paragraph(mut self, style: Option<&str>, text: &str) -> Self {
        let ppr = style
            .map(|s| format!(r#"<w:pPr><w:pStyle w:val="{s}"/></w:pPr>"#))
            .unwrap_or_default();
        self.body.push_str(&format!(
            r#"<w:p>{ppr}<w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#
        ));
        self
    }

    pub fn heading(self, text: &str) -> Self {
        self.paragraph(Some("Heading1"), text)
    }

    /// Declare a paragraph style in `word/styles.xml`.
    pub fn style(mut self, id: &str, name: &str) -> Self {
        self.styles.push((id.to_string(), name.to_string()));
        self
    }

    /// Inline image in its own paragraph; the part lands in `word/media/`.
    pub fn image(mut self, file_name: &str, bytes: &[u8], alt: &str) -> Self {
        let rel_id = format!("rIdImg{}", self.media.len() + 1);
        self.rels.push_str(&format!(
            r#"<Relationship Id="{rel_id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/{file_name}"/>"#
        ));
        self.body.push_str(&format!(
            r#"<w:p><w:r><w:drawing><wp:inline><wp:docPr id="{n}" name="Picture {n}" descr="{alt}"/><a:graphic><a:graphicData><pic:pic><pic:blipFill><a:blip r:embed="{rel_id}"/></pic:blipFill></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#,
            n = self.media.len() + 1
        ));
        self.media
            .push((format!("word/media/{file_name}"), bytes.to_vec()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut zw = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let opts = SimpleFileOptions::default();
        let mut put = |name: &str, bytes: &[u8]| {
            zw.start_file(name, opts).unwrap();
            zw.write_all(bytes).unwrap();
        };

        put(
            "[Content_Types].xml",
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Default Extension="jpeg" ContentType="image/jpeg"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#,
        );
        put(
            "_rels/.rels",
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#,
        );
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{W_NS}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><w:body>{}</w:body></w:document>"#,
            self.body
        );
        put("word/document.xml", document.as_bytes());
        let rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rIdStyles" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>{}</Relationships>"#,
            self.rels
        );
        put("word/_rels/document.xml.rels", rels.as_bytes());

        let mut styles = String::from(
            r#"<w:style w:type="paragraph" w:styleId="Normal"><w:name w:val="Normal"/></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>"#,
        );
        for (id, name) in &self.styles {
            styles.push_str(&format!(
                r#"<w:style w:type="paragraph" w:styleId="{id}"><w:name w:val="{name}"/></w:style>"#
            ));
        }
        put(
            "word/styles.xml",
            format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:styles xmlns:w="{W_NS}">{styles}</w:styles>"#).as_bytes(),
        );

        for (name, bytes) in &self.media {
            put(name, bytes);
        }
        drop(put);
        zw.finish().unwrap().into_inner()
    }
}

/// A report-like document: heading, text, two images.
pub fn sample_docx() -> Vec<u8> {
    DocxBuilder::new()
        .heading("Quarterly Report")
        .paragraph(None, "Revenue grew in every region.")
        .image("image1.png", PNG, "Revenue chart")
        .paragraph(None, "Costs stayed flat.")
        .image("image2.jpeg", JPEG, "")
        .build()
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Every `images/...` reference in `markdown`, in order.
pub fn image_references(markdown: &str) -> Vec<String> {
    let re = regex::Regex::new(r"images/image-[0-9a-f-]{36}\.[a-z0-9-]+").unwrap();
    re.find_iter(markdown).map(|m| m.as_str().to_string()).collect()
}

/// `markdown` with every generated image name replaced by a placeholder.
pub fn strip_image_names(markdown: &str) -> String {
    let re = regex::Regex::new(r"image-[0-9a-f-]{36}").unwrap();
    re.replace_all(markdown, "image-<id>").to_string()
}

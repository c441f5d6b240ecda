//! Default [`DocumentExtractor`]: Office Open XML (`.docx`) → HTML.
//!
//! ## Two phases
//!
//! 1. **Parse** (blocking, runs on `spawn_blocking`): open the zip container,
//!    follow the package relationships to the main document part, and walk
//!    its XML into a small block tree. Styles, numbering, relationships, and
//!    content types are read from their own parts. Every image occurrence is
//!    recorded as a slot naming its zip entry and content type.
//! 2. **Emit** (async): read each image slot from the package and hand it to
//!    the [`ImageHandler`] in document order, then render the block tree to
//!    HTML using the returned references. Only one image is held in memory
//!    at a time.
//!
//! Elements are matched on their qualified names (`w:p`, `a:blip`, …). Word
//! always writes these prefixes; matching on local names alone would confuse
//! `w:t` with DrawingML's `a:t`.
//!
//! What is mapped: headings (`Heading 1`–`6`, `Title`, `Subtitle`), quotes,
//! bullet and numbered lists (nested by level), bold / italic / strikethrough
//! / super- and subscript runs, line breaks, hyperlinks, tables (with
//! `colspan`), and images (DrawingML and legacy VML). Anything else
//! degrades to a plain paragraph; unknown styles raise a warning.

use crate::error::Word2MdError;
use crate::pipeline::extract::{
    DocumentExtractor, EmbeddedImage, Extraction, ImageHandler, ImageReference,
};
use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use tracing::debug;
use zip::ZipArchive;

const ROOT_RELS: &str = "_rels/.rels";
const CONTENT_TYPES: &str = "[Content_Types].xml";
const DEFAULT_DOCUMENT_PART: &str = "word/document.xml";
const DEFAULT_STYLES_PART: &str = "word/styles.xml";
const DEFAULT_NUMBERING_PART: &str = "word/numbering.xml";

/// Upper bound on the buffer reserved up front for one zip entry. The
/// declared size comes from the archive and is not trusted.
const MAX_PREALLOC: u64 = 8 << 20;

/// Content types mainstream browsers render inline.
const BROWSER_IMAGE_TYPES: &[&str] = &[
    "image/png",
    "image/gif",
    "image/jpeg",
    "image/svg+xml",
    "image/tiff",
    "image/webp",
];

/// Structure extractor for `.docx` files built on `zip` + `quick-xml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxExtractor;

#[async_trait]
impl DocumentExtractor for DocxExtractor {
    async fn extract(
        &self,
        bytes: &[u8],
        images: &mut dyn ImageHandler,
    ) -> Result<Extraction, Word2MdError> {
        let owned = bytes.to_vec();
        let (mut archive, parsed) = tokio::task::spawn_blocking(move || parse_package(owned))
            .await
            .map_err(|e| Word2MdError::Internal(format!("docx parser task failed: {e}")))??;

        let ParsedDocument {
            blocks,
            images: slots,
            styles,
            numbering,
            warnings,
        } = parsed;
        debug!(
            "Parsed {} top-level blocks, {} image slots",
            blocks.len(),
            slots.len()
        );

        let mut references = Vec::with_capacity(slots.len());
        for slot in slots {
            let Some(PendingImage {
                index,
                part,
                content_type,
                alt_text,
            }) = slot
            else {
                references.push(None);
                continue;
            };
            let (returned, bytes) = tokio::task::spawn_blocking(move || {
                let bytes = read_entry(&mut archive, index, &part);
                (archive, bytes)
            })
            .await
            .map_err(|e| Word2MdError::Internal(format!("docx image read task failed: {e}")))?;
            archive = returned;

            let image = EmbeddedImage {
                content_type,
                bytes: bytes?,
                alt_text,
            };
            references.push(Some(images.on_image(image).await?));
        }

        let html = HtmlWriter {
            styles: &styles,
            numbering: &numbering,
            images: &references,
            out: String::new(),
        }
        .render(&blocks);

        Ok(Extraction { html, warnings })
    }
}

// ── Document model ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Block {
    Paragraph(Paragraph),
    Table(Vec<Vec<Cell>>),
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Paragraph {
    style_id: Option<String>,
    num_id: Option<String>,
    level: u32,
    inlines: Vec<Inline>,
}

impl Paragraph {
    fn numbering(&self) -> Option<(&str, u32)> {
        match self.num_id.as_deref() {
            None | Some("0") => None,
            Some(id) => Some((id, self.level)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Cell {
    colspan: u32,
    blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
struct Inline {
    link: Option<String>,
    kind: InlineKind,
}

#[derive(Debug, Clone, PartialEq)]
enum InlineKind {
    Text { text: String, format: RunFormat },
    Break,
    Image { slot: usize },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum VertAlign {
    #[default]
    Baseline,
    Superscript,
    Subscript,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RunFormat {
    bold: bool,
    italic: bool,
    strike: bool,
    vert: VertAlign,
    style_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum StyleType {
    Paragraph,
    Run,
}

/// An image occurrence whose bytes are still inside the package.
#[derive(Debug)]
struct PendingImage {
    index: usize,
    part: String,
    content_type: String,
    alt_text: Option<String>,
}

type Package = ZipArchive<Cursor<Vec<u8>>>;

struct ParsedDocument {
    blocks: Vec<Block>,
    images: Vec<Option<PendingImage>>,
    styles: Styles,
    numbering: Numbering,
    warnings: Vec<String>,
}

// ── Package ─────────────────────────────────────────────────────────────────

fn parse_package(bytes: Vec<u8>) -> Result<(Package, ParsedDocument), Word2MdError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let root_rels = match read_part_text(&mut archive, ROOT_RELS)? {
        Some(xml) => Relationships::parse(&xml, "")?,
        None => Relationships::default(),
    };
    let document_part = root_rels
        .target_of_type("/officeDocument")
        .unwrap_or_else(|| DEFAULT_DOCUMENT_PART.to_string());
    let document_xml = read_part_text(&mut archive, &document_part)?.ok_or_else(|| {
        Word2MdError::MissingPart {
            part: document_part.clone(),
        }
    })?;

    let rels = match read_part_text(&mut archive, &rels_path_for(&document_part))? {
        Some(xml) => Relationships::parse(&xml, parent_of(&document_part))?,
        None => Relationships::default(),
    };
    let content_types = match read_part_text(&mut archive, CONTENT_TYPES)? {
        Some(xml) => ContentTypes::parse(&xml)?,
        None => ContentTypes::default(),
    };
    let styles_part = rels
        .target_of_type("/styles")
        .unwrap_or_else(|| DEFAULT_STYLES_PART.to_string());
    let styles = match read_part_text(&mut archive, &styles_part)? {
        Some(xml) => Styles::parse(&xml)?,
        None => Styles::default(),
    };
    let numbering_part = rels
        .target_of_type("/numbering")
        .unwrap_or_else(|| DEFAULT_NUMBERING_PART.to_string());
    let numbering = match read_part_text(&mut archive, &numbering_part)? {
        Some(xml) => Numbering::parse(&xml)?,
        None => Numbering::default(),
    };

    let mut body = BodyParser::new(&rels);
    walk_xml(&document_xml, &mut body)?;
    let BodyParser {
        blocks,
        images: raw_images,
        used_styles,
        ..
    } = body;

    let mut warnings = Vec::new();
    for (style_type, id) in &used_styles {
        if let Some(w) = styles.warning_for(*style_type, id) {
            warnings.push(w);
        }
    }

    let mut images = Vec::with_capacity(raw_images.len());
    for raw in raw_images {
        let slot = match raw.source {
            ImageSource::Part(part) => match archive.index_for_name(&part) {
                Some(index) => {
                    let content_type = content_types.lookup(&part);
                    if !BROWSER_IMAGE_TYPES.contains(&content_type.as_str()) {
                        push_unique(
                            &mut warnings,
                            format!(
                                "Image of type {} is unlikely to display in web browsers",
                                if content_type.is_empty() {
                                    "(unknown)"
                                } else {
                                    content_type.as_str()
                                }
                            ),
                        );
                    }
                    Some(PendingImage {
                        index,
                        part,
                        content_type,
                        alt_text: raw.alt,
                    })
                }
                None => {
                    push_unique(&mut warnings, format!("Could not find image file: {part}"));
                    None
                }
            },
            ImageSource::External(target) => {
                push_unique(
                    &mut warnings,
                    format!("Linked image is not embedded and was skipped: {target}"),
                );
                None
            }
            ImageSource::Unresolved(rel_id) => {
                push_unique(
                    &mut warnings,
                    format!("Could not resolve image relationship '{rel_id}'"),
                );
                None
            }
        };
        images.push(slot);
    }

    Ok((
        archive,
        ParsedDocument {
            blocks,
            images,
            styles,
            numbering,
            warnings,
        },
    ))
}

fn push_unique(warnings: &mut Vec<String>, message: String) {
    if !warnings.contains(&message) {
        warnings.push(message);
    }
}

fn read_part_bytes<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>, Word2MdError> {
    match archive.index_for_name(name) {
        Some(index) => read_entry(archive, index, name).map(Some),
        None => Ok(None),
    }
}

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
    name: &str,
) -> Result<Vec<u8>, Word2MdError> {
    let mut file = archive.by_index(index)?;
    let mut buf = Vec::with_capacity(file.size().min(MAX_PREALLOC) as usize);
    file.read_to_end(&mut buf)
        .map_err(|e| Word2MdError::CorruptDocument {
            detail: format!("reading part '{name}': {e}"),
        })?;
    Ok(buf)
}

fn read_part_text<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, Word2MdError> {
    Ok(read_part_bytes(archive, name)?.map(|bytes| {
        let text = String::from_utf8_lossy(&bytes);
        text.strip_prefix('\u{feff}').unwrap_or(&text).to_string()
    }))
}

/// `word/document.xml` → `word/_rels/document.xml.rels`.
fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

fn parent_of(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_part_path(base: &str, target: &str) -> String {
    let joined = match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None if base.is_empty() => target.to_string(),
        None => format!("{base}/{target}"),
    };
    let mut segments: Vec<&str> = Vec::new();
    for seg in joined.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

// ── XML walking ─────────────────────────────────────────────────────────────

trait PartVisitor {
    fn open(&mut self, e: &BytesStart<'_>);
    fn close(&mut self, name: &[u8]);
    fn text(&mut self, _text: &str) {}
}

/// Feed every element of `xml` to `visitor`. Self-closing elements are
/// reported as an open immediately followed by a close.
fn walk_xml<V: PartVisitor>(xml: &str, visitor: &mut V) -> Result<(), Word2MdError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) => visitor.open(&e),
            Event::Empty(e) => {
                visitor.open(&e);
                visitor.close(e.name().as_ref());
            }
            Event::End(e) => visitor.close(e.name().as_ref()),
            Event::Text(t) => visitor.text(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(())
}

/// Value of the attribute whose local name is `key` (`w:val` → `val`).
fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

/// OOXML on/off property: present means on unless `val` says otherwise.
fn toggle(e: &BytesStart<'_>) -> bool {
    !matches!(
        attr(e, b"val").as_deref(),
        Some("0") | Some("false") | Some("off") | Some("none")
    )
}

// ── Relationships & content types ───────────────────────────────────────────

#[derive(Debug, Clone)]
struct Relationship {
    rel_type: String,
    target: String,
    external: bool,
}

#[derive(Debug, Default)]
struct Relationships {
    base: String,
    by_id: HashMap<String, Relationship>,
    order: Vec<String>,
}

impl Relationships {
    fn parse(xml: &str, base: &str) -> Result<Self, Word2MdError> {
        let mut rels = Self {
            base: base.to_string(),
            ..Self::default()
        };
        walk_xml(xml, &mut rels)?;
        Ok(rels)
    }

    fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// Part path of the first internal relationship whose type ends with `suffix`.
    fn target_of_type(&self, suffix: &str) -> Option<String> {
        self.order
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .find(|r| !r.external && r.rel_type.ends_with(suffix))
            .map(|r| resolve_part_path(&self.base, &r.target))
    }

    fn part_path(&self, rel: &Relationship) -> String {
        resolve_part_path(&self.base, &rel.target)
    }
}

impl PartVisitor for Relationships {
    fn open(&mut self, e: &BytesStart<'_>) {
        if e.local_name().as_ref() != b"Relationship" {
            return;
        }
        let (Some(id), Some(target)) = (attr(e, b"Id"), attr(e, b"Target")) else {
            return;
        };
        let rel = Relationship {
            rel_type: attr(e, b"Type").unwrap_or_default(),
            target,
            external: attr(e, b"TargetMode").as_deref() == Some("External"),
        };
        self.order.push(id.clone());
        self.by_id.insert(id, rel);
    }

    fn close(&mut self, _name: &[u8]) {}
}

#[derive(Debug, Default)]
struct ContentTypes {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    fn parse(xml: &str) -> Result<Self, Word2MdError> {
        let mut types = Self::default();
        walk_xml(xml, &mut types)?;
        Ok(types)
    }

    /// Declared type of `part`, falling back to a guess from its extension.
    /// Empty when nothing is known.
    fn lookup(&self, part: &str) -> String {
        if let Some(t) = self.overrides.get(&format!("/{part}")) {
            return t.clone();
        }
        let ext = part
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if let Some(t) = self.defaults.get(&ext) {
            return t.clone();
        }
        guess_content_type(&ext).unwrap_or_default().to_string()
    }
}

impl PartVisitor for ContentTypes {
    fn open(&mut self, e: &BytesStart<'_>) {
        let Some(content_type) = attr(e, b"ContentType") else {
            return;
        };
        match e.local_name().as_ref() {
            b"Default" => {
                if let Some(ext) = attr(e, b"Extension") {
                    self.defaults.insert(ext.to_ascii_lowercase(), content_type);
                }
            }
            b"Override" => {
                if let Some(part) = attr(e, b"PartName") {
                    self.overrides.insert(part, content_type);
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, _name: &[u8]) {}
}

fn guess_content_type(ext: &str) -> Option<&'static str> {
    Some(match ext {
        "png" => "image/png",
        "jpg" | "jpeg" | "jpe" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        _ => return None,
    })
}

// ── Styles ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParagraphKind {
    Plain,
    Heading(u8),
    Quote,
}

#[derive(Debug, Default)]
struct Styles {
    names: HashMap<(StyleType, String), String>,
    current: Option<(StyleType, String)>,
}

impl Styles {
    fn parse(xml: &str) -> Result<Self, Word2MdError> {
        let mut styles = Self::default();
        walk_xml(xml, &mut styles)?;
        Ok(styles)
    }

    fn name_of<'a>(&'a self, style_type: StyleType, id: &'a str) -> &'a str {
        self.names
            .get(&(style_type, id.to_string()))
            .map(String::as_str)
            .unwrap_or(id)
    }

    fn paragraph_kind(&self, id: Option<&str>) -> ParagraphKind {
        id.and_then(|id| classify_paragraph(self.name_of(StyleType::Paragraph, id)))
            .unwrap_or(ParagraphKind::Plain)
    }

    /// `(bold, italic)` implied by a character style.
    fn run_emphasis(&self, id: Option<&str>) -> (bool, bool) {
        match id.map(|id| compact(self.name_of(StyleType::Run, id))).as_deref() {
            Some("strong") => (true, false),
            Some("emphasis") => (false, true),
            _ => (false, false),
        }
    }

    fn warning_for(&self, style_type: StyleType, id: &str) -> Option<String> {
        let name = self.name_of(style_type, id);
        let recognised = match style_type {
            StyleType::Paragraph => classify_paragraph(name).is_some(),
            StyleType::Run => classify_run(name),
        };
        if recognised {
            return None;
        }
        let kind = match style_type {
            StyleType::Paragraph => "paragraph",
            StyleType::Run => "run",
        };
        Some(format!(
            "Unrecognised {kind} style: '{name}' (Style ID: {id})"
        ))
    }
}

impl PartVisitor for Styles {
    fn open(&mut self, e: &BytesStart<'_>) {
        match e.name().as_ref() {
            b"w:style" => {
                let style_type = match attr(e, b"type").as_deref() {
                    Some("paragraph") => StyleType::Paragraph,
                    Some("character") => StyleType::Run,
                    _ => return,
                };
                self.current = attr(e, b"styleId").map(|id| (style_type, id));
            }
            b"w:name" => {
                if let (Some(key), Some(name)) = (self.current.clone(), attr(e, b"val")) {
                    self.names.insert(key, name);
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        if name == b"w:style" {
            self.current = None;
        }
    }
}

/// Lowercased style name with whitespace removed: `Heading 1` → `heading1`.
fn compact(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn classify_paragraph(name: &str) -> Option<ParagraphKind> {
    let name = compact(name);
    if let Some(level) = name
        .strip_prefix("heading")
        .and_then(|l| l.parse::<u8>().ok())
        .filter(|l| (1..=6).contains(l))
    {
        return Some(ParagraphKind::Heading(level));
    }
    match name.as_str() {
        "title" => Some(ParagraphKind::Heading(1)),
        "subtitle" => Some(ParagraphKind::Heading(2)),
        "quote" | "intensequote" => Some(ParagraphKind::Quote),
        "normal" | "normal(web)" | "listparagraph" | "bodytext" | "nospacing" | "caption"
        | "footnotetext" | "endnotetext" | "tocheading" => Some(ParagraphKind::Plain),
        n if n.starts_with("toc") => Some(ParagraphKind::Plain),
        _ => None,
    }
}

fn classify_run(name: &str) -> bool {
    matches!(
        compact(name).as_str(),
        "strong"
            | "emphasis"
            | "hyperlink"
            | "followedhyperlink"
            | "defaultparagraphfont"
            | "footnotereference"
            | "endnotereference"
            | "placeholdertext"
    )
}

// ── Numbering ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

#[derive(Debug, Default)]
struct Numbering {
    /// `numId` → `abstractNumId`.
    nums: HashMap<String, String>,
    /// `(abstractNumId, ilvl)` → `numFmt`.
    formats: HashMap<(String, u32), String>,
    current_abstract: Option<String>,
    current_level: Option<u32>,
    current_num: Option<String>,
}

impl Numbering {
    fn parse(xml: &str) -> Result<Self, Word2MdError> {
        let mut numbering = Self::default();
        walk_xml(xml, &mut numbering)?;
        Ok(numbering)
    }

    fn kind(&self, num_id: &str, level: u32) -> ListKind {
        let format = self
            .nums
            .get(num_id)
            .and_then(|abs| self.formats.get(&(abs.clone(), level)));
        match format.map(String::as_str) {
            None | Some("bullet") | Some("none") => ListKind::Unordered,
            Some(_) => ListKind::Ordered,
        }
    }
}

impl PartVisitor for Numbering {
    fn open(&mut self, e: &BytesStart<'_>) {
        match e.name().as_ref() {
            b"w:abstractNum" => self.current_abstract = attr(e, b"abstractNumId"),
            b"w:lvl" if self.current_abstract.is_some() => {
                self.current_level = attr(e, b"ilvl").and_then(|l| l.parse().ok());
            }
            b"w:numFmt" => {
                if let (Some(abs), Some(level), Some(fmt)) = (
                    self.current_abstract.clone(),
                    self.current_level,
                    attr(e, b"val"),
                ) {
                    self.formats.insert((abs, level), fmt);
                }
            }
            b"w:num" => self.current_num = attr(e, b"numId"),
            b"w:abstractNumId" => {
                if let (Some(num), Some(abs)) = (self.current_num.clone(), attr(e, b"val")) {
                    self.nums.insert(num, abs);
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"w:abstractNum" => self.current_abstract = None,
            b"w:lvl" => self.current_level = None,
            b"w:num" => self.current_num = None,
            _ => {}
        }
    }
}

// ── Body ────────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum ImageSource {
    Part(String),
    External(String),
    Unresolved(String),
}

#[derive(Debug)]
struct RawImage {
    source: ImageSource,
    alt: Option<String>,
}

#[derive(Debug, Default)]
struct TableBuilder {
    rows: Vec<Vec<Cell>>,
    row: Option<Vec<Cell>>,
    cell: Option<Cell>,
}

struct BodyParser<'r> {
    rels: &'r Relationships,
    blocks: Vec<Block>,
    tables: Vec<TableBuilder>,
    /// Open paragraphs; more than one only inside text boxes.
    paragraphs: Vec<Paragraph>,
    /// Open hyperlinks; `None` for links whose target could not be resolved.
    links: Vec<Option<String>>,
    run: Option<RunFormat>,
    in_ppr: bool,
    in_rpr: bool,
    in_text: bool,
    /// Depth inside a subtree whose content must be ignored.
    skip_depth: usize,
    drawing_alt: Option<String>,
    images: Vec<RawImage>,
    used_styles: Vec<(StyleType, String)>,
}

impl<'r> BodyParser<'r> {
    fn new(rels: &'r Relationships) -> Self {
        Self {
            rels,
            blocks: Vec::new(),
            tables: Vec::new(),
            paragraphs: Vec::new(),
            links: Vec::new(),
            run: None,
            in_ppr: false,
            in_rpr: false,
            in_text: false,
            skip_depth: 0,
            drawing_alt: None,
            images: Vec::new(),
            used_styles: Vec::new(),
        }
    }

    fn push_block(&mut self, block: Block) {
        if let Some(cell) = self.tables.last_mut().and_then(|t| t.cell.as_mut()) {
            cell.blocks.push(block);
        } else {
            self.blocks.push(block);
        }
    }

    fn current_link(&self) -> Option<String> {
        self.links.last().cloned().flatten()
    }

    fn push_inline(&mut self, kind: InlineKind) {
        let link = self.current_link();
        if let Some(p) = self.paragraphs.last_mut() {
            p.inlines.push(Inline { link, kind });
        }
    }

    fn push_text(&mut self, text: &str) {
        let format = self.run.clone().unwrap_or_default();
        let link = self.current_link();
        let Some(p) = self.paragraphs.last_mut() else {
            return;
        };
        if let Some(Inline {
            link: last_link,
            kind:
                InlineKind::Text {
                    text: last_text,
                    format: last_format,
                },
        }) = p.inlines.last_mut()
        {
            if *last_link == link && *last_format == format {
                last_text.push_str(text);
                return;
            }
        }
        p.inlines.push(Inline {
            link,
            kind: InlineKind::Text {
                text: text.to_string(),
                format,
            },
        });
    }

    fn push_image(&mut self, rel_id: String, alt: Option<String>) {
        let source = match self.rels.get(&rel_id) {
            Some(rel) if rel.external => ImageSource::External(rel.target.clone()),
            Some(rel) => ImageSource::Part(self.rels.part_path(rel)),
            None => ImageSource::Unresolved(rel_id),
        };
        let slot = self.images.len();
        self.images.push(RawImage { source, alt });
        self.push_inline(InlineKind::Image { slot });
    }

    fn note_style(&mut self, style_type: StyleType, id: &str) {
        if !self
            .used_styles
            .iter()
            .any(|(t, s)| *t == style_type && s == id)
        {
            self.used_styles.push((style_type, id.to_string()));
        }
    }

    fn hyperlink_target(&self, e: &BytesStart<'_>) -> Option<String> {
        if let Some(rel) = attr(e, b"id").and_then(|id| self.rels.get(&id)) {
            return Some(rel.target.clone());
        }
        attr(e, b"anchor").map(|anchor| format!("#{anchor}"))
    }

    fn apply_run_property(&mut self, name: &[u8], e: &BytesStart<'_>) {
        let mut style = None;
        if let Some(run) = self.run.as_mut() {
            match name {
                b"w:b" => run.bold = toggle(e),
                b"w:i" => run.italic = toggle(e),
                b"w:strike" | b"w:dstrike" => run.strike = toggle(e),
                b"w:vertAlign" => {
                    run.vert = match attr(e, b"val").as_deref() {
                        Some("superscript") => VertAlign::Superscript,
                        Some("subscript") => VertAlign::Subscript,
                        _ => VertAlign::Baseline,
                    }
                }
                b"w:rStyle" => {
                    run.style_id = attr(e, b"val");
                    style = run.style_id.clone();
                }
                _ => {}
            }
        }
        if let Some(id) = style {
            self.note_style(StyleType::Run, &id);
        }
    }
}

impl PartVisitor for BodyParser<'_> {
    fn open(&mut self, e: &BytesStart<'_>) {
        if self.skip_depth > 0 {
            self.skip_depth += 1;
            return;
        }
        let qname = e.name();
        let name = qname.as_ref();
        match name {
            // Fallback duplicates the preceding mc:Choice; tracked deletions
            // and property-change history are not part of the current text.
            b"mc:Fallback" | b"w:del" | b"w:rPrChange" | b"w:pPrChange" => self.skip_depth = 1,
            b"w:p" => self.paragraphs.push(Paragraph::default()),
            b"w:pPr" => self.in_ppr = true,
            b"w:pStyle" if self.in_ppr => {
                if let Some(id) = attr(e, b"val") {
                    self.note_style(StyleType::Paragraph, &id);
                    if let Some(p) = self.paragraphs.last_mut() {
                        p.style_id = Some(id);
                    }
                }
            }
            b"w:numId" if self.in_ppr => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.num_id = attr(e, b"val");
                }
            }
            b"w:ilvl" if self.in_ppr => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.level = attr(e, b"val").and_then(|l| l.parse().ok()).unwrap_or(0);
                }
            }
            b"w:r" => self.run = Some(RunFormat::default()),
            b"w:rPr" if !self.in_ppr => self.in_rpr = self.run.is_some(),
            b"w:b" | b"w:i" | b"w:strike" | b"w:dstrike" | b"w:vertAlign" | b"w:rStyle"
                if self.in_rpr =>
            {
                self.apply_run_property(name, e)
            }
            b"w:t" if self.run.is_some() => self.in_text = true,
            b"w:tab" if self.run.is_some() && !self.in_ppr => self.push_text("\t"),
            b"w:br" | b"w:cr" if self.run.is_some() => {
                if !matches!(attr(e, b"type").as_deref(), Some("page") | Some("column")) {
                    self.push_inline(InlineKind::Break);
                }
            }
            b"w:hyperlink" => {
                let target = self.hyperlink_target(e);
                self.links.push(target);
            }
            b"w:drawing" | b"w:pict" => self.drawing_alt = None,
            b"wp:docPr" => {
                self.drawing_alt = attr(e, b"descr")
                    .filter(|d| !d.trim().is_empty())
                    .or_else(|| attr(e, b"title").filter(|t| !t.trim().is_empty()));
            }
            b"a:blip" => {
                if let Some(id) = attr(e, b"embed") {
                    let alt = self.drawing_alt.clone();
                    self.push_image(id, alt);
                }
            }
            b"v:imagedata" => {
                if let Some(id) = attr(e, b"id") {
                    let alt = attr(e, b"title").filter(|t| !t.trim().is_empty());
                    self.push_image(id, alt);
                }
            }
            b"w:tbl" => self.tables.push(TableBuilder::default()),
            b"w:tr" => {
                if let Some(t) = self.tables.last_mut() {
                    t.row = Some(Vec::new());
                }
            }
            b"w:tc" => {
                if let Some(t) = self.tables.last_mut() {
                    t.cell = Some(Cell {
                        colspan: 1,
                        blocks: Vec::new(),
                    });
                }
            }
            b"w:gridSpan" => {
                if let Some(cell) = self.tables.last_mut().and_then(|t| t.cell.as_mut()) {
                    cell.colspan = attr(e, b"val")
                        .and_then(|v| v.parse().ok())
                        .filter(|&n| n >= 1)
                        .unwrap_or(1);
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        if self.skip_depth > 0 {
            self.skip_depth -= 1;
            return;
        }
        match name {
            b"w:p" => {
                if let Some(p) = self.paragraphs.pop() {
                    self.push_block(Block::Paragraph(p));
                }
            }
            b"w:pPr" => self.in_ppr = false,
            b"w:r" => {
                self.run = None;
                self.in_rpr = false;
                self.in_text = false;
            }
            b"w:rPr" => self.in_rpr = false,
            b"w:t" => self.in_text = false,
            b"w:hyperlink" => {
                self.links.pop();
            }
            b"w:drawing" | b"w:pict" => self.drawing_alt = None,
            b"w:tc" => {
                if let Some(t) = self.tables.last_mut() {
                    if let Some(cell) = t.cell.take() {
                        t.row.get_or_insert_with(Vec::new).push(cell);
                    }
                }
            }
            b"w:tr" => {
                if let Some(t) = self.tables.last_mut() {
                    if let Some(row) = t.row.take() {
                        t.rows.push(row);
                    }
                }
            }
            b"w:tbl" => {
                if let Some(t) = self.tables.pop() {
                    self.push_block(Block::Table(t.rows));
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_text && self.skip_depth == 0 {
            self.push_text(text);
        }
    }
}

// ── HTML ────────────────────────────────────────────────────────────────────

struct HtmlWriter<'a> {
    styles: &'a Styles,
    numbering: &'a Numbering,
    images: &'a [Option<ImageReference>],
    out: String,
}

impl HtmlWriter<'_> {
    fn render(mut self, blocks: &[Block]) -> String {
        self.blocks(blocks);
        self.out
    }

    fn blocks(&mut self, blocks: &[Block]) {
        let mut lists: Vec<ListKind> = Vec::new();
        for block in blocks {
            match block {
                Block::Paragraph(p) if p.inlines.is_empty() => {}
                Block::Paragraph(p) => match self.list_numbering(p) {
                    Some((num_id, level)) => self.list_item(&mut lists, num_id, level, p),
                    None => {
                        self.close_lists(&mut lists, 0);
                        self.paragraph(p);
                    }
                },
                Block::Table(rows) => {
                    self.close_lists(&mut lists, 0);
                    self.table(rows);
                }
            }
        }
        self.close_lists(&mut lists, 0);
    }

    /// A heading style outranks direct list numbering on the same paragraph.
    fn list_numbering<'p>(&self, p: &'p Paragraph) -> Option<(&'p str, u32)> {
        match self.styles.paragraph_kind(p.style_id.as_deref()) {
            ParagraphKind::Heading(_) => None,
            _ => p.numbering(),
        }
    }

    /// Every list on the stack has an open `<li>`; closing one closes both.
    fn close_lists(&mut self, lists: &mut Vec<ListKind>, keep: usize) {
        while lists.len() > keep {
            if let Some(kind) = lists.pop() {
                self.out.push_str("</li></");
                self.out.push_str(kind.tag());
                self.out.push('>');
            }
        }
    }

    fn list_item(&mut self, lists: &mut Vec<ListKind>, num_id: &str, level: u32, p: &Paragraph) {
        let depth = level.min(8) as usize + 1;
        let kind = self.numbering.kind(num_id, level);

        self.close_lists(lists, depth);
        if lists.len() == depth {
            if lists.last() == Some(&kind) {
                self.out.push_str("</li>");
            } else {
                self.close_lists(lists, depth - 1);
            }
        }
        while lists.len() < depth {
            self.out.push('<');
            self.out.push_str(kind.tag());
            self.out.push('>');
            lists.push(kind);
            if lists.len() < depth {
                self.out.push_str("<li>");
            }
        }
        self.out.push_str("<li>");
        self.inlines(&p.inlines);
    }

    fn paragraph(&mut self, p: &Paragraph) {
        match self.styles.paragraph_kind(p.style_id.as_deref()) {
            ParagraphKind::Heading(level) => {
                self.out.push_str(&format!("<h{level}>"));
                self.inlines(&p.inlines);
                self.out.push_str(&format!("</h{level}>"));
            }
            ParagraphKind::Quote => {
                self.out.push_str("<blockquote><p>");
                self.inlines(&p.inlines);
                self.out.push_str("</p></blockquote>");
            }
            ParagraphKind::Plain => {
                self.out.push_str("<p>");
                self.inlines(&p.inlines);
                self.out.push_str("</p>");
            }
        }
    }

    fn table(&mut self, rows: &[Vec<Cell>]) {
        self.out.push_str("<table>");
        for row in rows {
            self.out.push_str("<tr>");
            for cell in row {
                if cell.colspan > 1 {
                    self.out
                        .push_str(&format!("<td colspan=\"{}\">", cell.colspan));
                } else {
                    self.out.push_str("<td>");
                }
                self.blocks(&cell.blocks);
                self.out.push_str("</td>");
            }
            self.out.push_str("</tr>");
        }
        self.out.push_str("</table>");
    }

    fn inlines(&mut self, inlines: &[Inline]) {
        let mut open_link: Option<&str> = None;
        for inline in inlines {
            let link = inline.link.as_deref();
            if link != open_link {
                if open_link.is_some() {
                    self.out.push_str("</a>");
                }
                if let Some(href) = link {
                    self.out.push_str("<a href=\"");
                    self.out
                        .push_str(&html_escape::encode_double_quoted_attribute(href));
                    self.out.push_str("\">");
                }
                open_link = link;
            }
            match &inline.kind {
                InlineKind::Text { text, format } => self.text(text, format),
                InlineKind::Break => self.out.push_str("<br />"),
                InlineKind::Image { slot } => {
                    if let Some(Some(reference)) = self.images.get(*slot) {
                        self.image(reference);
                    }
                }
            }
        }
        if open_link.is_some() {
            self.out.push_str("</a>");
        }
    }

    fn text(&mut self, text: &str, format: &RunFormat) {
        let (style_bold, style_italic) = self.styles.run_emphasis(format.style_id.as_deref());
        let mut tags: Vec<&str> = Vec::new();
        if format.bold || style_bold {
            tags.push("strong");
        }
        if format.italic || style_italic {
            tags.push("em");
        }
        if format.strike {
            tags.push("s");
        }
        match format.vert {
            VertAlign::Superscript => tags.push("sup"),
            VertAlign::Subscript => tags.push("sub"),
            VertAlign::Baseline => {}
        }
        for tag in &tags {
            self.out.push_str(&format!("<{tag}>"));
        }
        self.out.push_str(&html_escape::encode_text(text));
        for tag in tags.iter().rev() {
            self.out.push_str(&format!("</{tag}>"));
        }
    }

    fn image(&mut self, reference: &ImageReference) {
        self.out.push_str("<img src=\"");
        self.out
            .push_str(&html_escape::encode_double_quoted_attribute(&reference.src));
        self.out.push('"');
        if let Some(alt) = &reference.alt {
            self.out.push_str(" alt=\"");
            self.out
                .push_str(&html_escape::encode_double_quoted_attribute(alt));
            self.out.push('"');
        }
        self.out.push_str(" />");
    }
}

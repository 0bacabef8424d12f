//! DOCX document store
//!
//! This crate loads `.docx` packages into an ordered paragraph model and
//! writes them back. It covers what structured editing needs: paragraph text,
//! named styles, runs with character formatting, and paragraph formatting.
//!
//! Paragraphs are addressed by index in reading order. Content that is not a
//! top-level paragraph (tables, section properties) is preserved verbatim and
//! is not addressable.

pub mod error;
pub mod model;
mod package;
pub mod styles;
mod xml;

pub use error::StoreError;
pub use model::{Alignment, Paragraph, ParagraphFormat, RgbColor, Run, RunFormat, DEFAULT_STYLE};
pub use styles::StyleCatalog;

use package::{Package, BLANK_HEAD, BLANK_SECTION, BLANK_TAIL, DOCUMENT_PART, STYLES_PART};
use std::path::Path;
use xml::{Body, BodyNode};

/// An opened word-processing document
#[derive(Debug, Clone)]
pub struct Document {
    package: Package,
    catalog: StyleCatalog,
    body: Body,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with the default style set
    pub fn new() -> Self {
        Self {
            package: Package::blank(),
            catalog: StyleCatalog::default(),
            body: Body {
                head: BLANK_HEAD.to_string(),
                nodes: vec![BodyNode::Other(BLANK_SECTION.to_string())],
                tail: BLANK_TAIL.to_string(),
            },
        }
    }

    /// Open a `.docx` file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let doc = Self::from_bytes(&bytes)?;
        tracing::debug!(
            path = %path.display(),
            paragraphs = doc.paragraph_count(),
            "Opened document"
        );
        Ok(doc)
    }

    /// Parse a `.docx` package held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        Self::from_package(Package::read(bytes)?)
    }

    fn from_package(package: Package) -> Result<Self, StoreError> {
        let catalog = match package.part_str(STYLES_PART)? {
            Some(xml) => StyleCatalog::parse(&xml)?,
            None => StyleCatalog::default(),
        };
        let document_xml = package
            .part_str(DOCUMENT_PART)?
            .ok_or_else(|| StoreError::MissingPart(DOCUMENT_PART.to_string()))?;
        let body = xml::parse_body(&document_xml, &catalog)?;
        Ok(Self {
            package,
            catalog,
            body,
        })
    }

    /// Serialize the package
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        let mut package = self.package.clone();
        package.set_part(
            DOCUMENT_PART,
            self.body.to_xml(&self.catalog).into_bytes(),
        );
        package.write()
    }

    /// Write the document to `path`, replacing any existing file
    ///
    /// The archive is built in memory first, so a failed save leaves the
    /// previous file intact.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, &bytes)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Saved document");
        Ok(())
    }

    pub fn styles(&self) -> &StyleCatalog {
        &self.catalog
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraph_count() == 0
    }

    /// Paragraphs in reading order
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.nodes.iter().filter_map(|node| match node {
            BodyNode::Paragraph(p) => Some(p),
            BodyNode::Other(_) => None,
        })
    }

    pub fn paragraph(&self, index: usize) -> Option<&Paragraph> {
        self.paragraphs().nth(index)
    }

    pub fn paragraph_mut(&mut self, index: usize) -> Option<&mut Paragraph> {
        self.body
            .nodes
            .iter_mut()
            .filter_map(|node| match node {
                BodyNode::Paragraph(p) => Some(p),
                BodyNode::Other(_) => None,
            })
            .nth(index)
    }

    /// Texts of all paragraphs
    pub fn texts(&self) -> Vec<String> {
        self.paragraphs().map(Paragraph::text).collect()
    }

    /// All paragraph texts joined with `separator`
    pub fn full_text(&self, separator: &str) -> String {
        self.texts().join(separator)
    }

    /// Position in the body of the paragraph with the given index
    fn node_position(&self, index: usize) -> Option<usize> {
        self.body
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node, BodyNode::Paragraph(_)))
            .nth(index)
            .map(|(pos, _)| pos)
    }

    /// Position where an appended paragraph goes: before trailing section properties
    fn append_position(&self) -> usize {
        match self.body.nodes.last() {
            Some(node) if node.is_section_properties() => self.body.nodes.len() - 1,
            _ => self.body.nodes.len(),
        }
    }

    /// Insert `paragraph` so that it ends up at paragraph index `index`
    ///
    /// `index == paragraph_count()` appends after the last paragraph.
    pub fn insert_paragraph(&mut self, index: usize, paragraph: Paragraph) -> Result<(), StoreError> {
        let count = self.paragraph_count();
        let position = if index == count {
            self.append_position()
        } else {
            self.node_position(index)
                .ok_or(StoreError::IndexOutOfRange { index, count })?
        };
        self.body
            .nodes
            .insert(position, BodyNode::Paragraph(paragraph));
        Ok(())
    }

    pub fn push_paragraph(&mut self, paragraph: Paragraph) {
        let position = self.append_position();
        self.body
            .nodes
            .insert(position, BodyNode::Paragraph(paragraph));
    }

    /// Detach the paragraph at `index`; later paragraphs shift down by one
    pub fn remove_paragraph(&mut self, index: usize) -> Result<Paragraph, StoreError> {
        let count = self.paragraph_count();
        let position = self
            .node_position(index)
            .ok_or(StoreError::IndexOutOfRange { index, count })?;
        match self.body.nodes.remove(position) {
            BodyNode::Paragraph(p) => Ok(p),
            other => {
                self.body.nodes.insert(position, other);
                Err(StoreError::IndexOutOfRange { index, count })
            }
        }
    }
}

impl FromIterator<Paragraph> for Document {
    fn from_iter<I: IntoIterator<Item = Paragraph>>(iter: I) -> Self {
        let mut doc = Document::new();
        for paragraph in iter {
            doc.push_paragraph(paragraph);
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Document {
        vec![
            Paragraph::with_style("Agreement", "Title"),
            Paragraph::with_style("1. Definitions", "Heading 1"),
            Paragraph::new("Terms have meanings."),
            Paragraph::new("2. Payment"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_new_document_is_empty() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.full_text(" "), "");
    }

    #[test]
    fn test_insert_and_remove_shift_indices() {
        let mut doc = sample();
        doc.insert_paragraph(2, Paragraph::new("Inserted")).unwrap();
        assert_eq!(
            doc.texts(),
            vec![
                "Agreement",
                "1. Definitions",
                "Inserted",
                "Terms have meanings.",
                "2. Payment"
            ]
        );

        let removed = doc.remove_paragraph(0).unwrap();
        assert_eq!(removed.text(), "Agreement");
        assert_eq!(doc.paragraph(0).unwrap().text(), "1. Definitions");
        assert_eq!(doc.paragraph_count(), 4);
    }

    #[test]
    fn test_insert_at_count_appends() {
        let mut doc = sample();
        doc.insert_paragraph(4, Paragraph::new("Last")).unwrap();
        assert_eq!(doc.paragraph(4).unwrap().text(), "Last");

        let err = doc.insert_paragraph(9, Paragraph::new("x")).unwrap_err();
        assert!(matches!(
            err,
            StoreError::IndexOutOfRange { index: 9, count: 5 }
        ));
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut doc = sample();
        assert!(doc.remove_paragraph(4).is_err());
        assert_eq!(doc.paragraph_count(), 4);
    }

    #[test]
    fn test_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.docx");

        let doc = sample();
        doc.save(&path).unwrap();

        let reopened = Document::open(&path).unwrap();
        assert_eq!(reopened.texts(), doc.texts());
        assert_eq!(reopened.paragraph(1).unwrap().style_name(), "Heading 1");
        assert_eq!(reopened.paragraph(0).unwrap().style_name(), "Title");
        assert_eq!(reopened.paragraph(2).unwrap().style_name(), "Normal");
        assert!(reopened.paragraphs().all(Paragraph::is_pristine));
    }

    #[test]
    fn test_untouched_paragraphs_survive_edits_byte_for_byte() {
        let doc = sample();
        let bytes = doc.to_bytes().unwrap();
        let mut reopened = Document::from_bytes(&bytes).unwrap();
        let before = reopened.body.to_xml(&reopened.catalog);

        reopened.paragraph_mut(2).unwrap().set_text("Changed.");
        let after = reopened.body.to_xml(&reopened.catalog);

        assert!(after.contains("Changed."));
        assert!(!after.contains("Terms have meanings."));
        // the other paragraphs and the section properties are untouched
        let unchanged: Vec<&str> = before
            .split("</w:p>")
            .filter(|chunk| !chunk.contains("Terms have meanings."))
            .collect();
        for chunk in unchanged {
            assert!(after.contains(chunk), "lost chunk: {}", chunk);
        }
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Document::open(dir.path().join("missing.docx")).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }

    #[test]
    fn test_package_without_document_part() {
        let mut package = Package::default();
        package.set_part(STYLES_PART, b"<w:styles/>".to_vec());
        let bytes = package.write().unwrap();
        let err = Document::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, StoreError::MissingPart(_)));
    }
}

//! Location resolution
//!
//! Maps a [`LocationTarget`] onto a paragraph index of the current document.
//! Indices are only valid until the next insert or delete, so every command
//! resolves its location afresh.

use crate::command::{LocationTarget, SectionNumber, TextLocator};
use docx_store::Document;

/// Style name prefix that marks heading paragraphs
pub const DEFAULT_HEADING_PREFIX: &str = "Heading";

/// Finds paragraphs by heading text, section number, or contained text
pub struct LocationResolver<'a> {
    doc: &'a Document,
    heading_prefix: &'a str,
}

impl<'a> LocationResolver<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self {
            doc,
            heading_prefix: DEFAULT_HEADING_PREFIX,
        }
    }

    pub fn with_heading_prefix(mut self, prefix: &'a str) -> Self {
        self.heading_prefix = prefix;
        self
    }

    /// Resolve a location to a paragraph index
    pub fn resolve(&self, target: &LocationTarget) -> Option<usize> {
        let index = match target {
            LocationTarget::Heading { value } => {
                value.as_deref().and_then(|text| self.find_heading(text))
            }
            LocationTarget::Section { number } => self.find_section(number),
            LocationTarget::Sentence(locator) | LocationTarget::Paragraph(locator) => {
                self.find_text(locator)
            }
        };
        tracing::debug!(kind = target.kind(), ?index, "Resolved location");
        index
    }

    /// First heading-styled paragraph whose trimmed text equals `text` trimmed
    pub fn find_heading(&self, text: &str) -> Option<usize> {
        let wanted = text.trim();
        self.doc.paragraphs().position(|p| {
            p.style_name().starts_with(self.heading_prefix) && p.text().trim() == wanted
        })
    }

    /// First paragraph whose text starts with `"<number>."`
    pub fn find_section(&self, number: &SectionNumber) -> Option<usize> {
        let prefix = format!("{}.", number);
        self.doc
            .paragraphs()
            .position(|p| p.text().starts_with(&prefix))
    }

    /// Index just past the body of the section whose heading is at `start`
    ///
    /// The body runs until the next paragraph that starts with a digit, or to
    /// the end of the document.
    pub fn section_end(&self, start: usize) -> usize {
        self.doc
            .paragraphs()
            .enumerate()
            .skip(start + 1)
            .find(|(_, p)| p.text().starts_with(|c: char| c.is_ascii_digit()))
            .map(|(index, _)| index)
            .unwrap_or_else(|| self.doc.paragraph_count())
    }

    /// Scan forward from the optional section scope
    ///
    /// A paragraph matches when it contains `match_text`, or, failing that,
    /// when splitting it on `". "` yields at least `sentence_number` pieces.
    /// With neither set, `paragraph_number` picks a paragraph relative to the
    /// scope start.
    pub fn find_text(&self, locator: &TextLocator) -> Option<usize> {
        let start = locator
            .section
            .as_ref()
            .filter(|section| !section.is_empty())
            .and_then(|section| self.find_section(section))
            .unwrap_or(0);

        let match_text = locator.match_text.as_deref().filter(|t| !t.is_empty());
        let sentence_number = locator.sentence_number.filter(|&n| n > 0);

        if match_text.is_none() && sentence_number.is_none() {
            return locator
                .paragraph_number
                .filter(|&n| n > 0)
                .map(|n| start + n as usize - 1)
                .filter(|&index| index < self.doc.paragraph_count());
        }

        for (index, paragraph) in self.doc.paragraphs().enumerate().skip(start) {
            let text = paragraph.text();
            if match_text.is_some_and(|needle| text.contains(needle)) {
                return Some(index);
            }
            if let Some(n) = sentence_number {
                // naive sentence count, not real segmentation
                if text.split(". ").count() >= n as usize {
                    return Some(index);
                }
            }
        }
        None
    }
}

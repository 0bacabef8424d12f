//! Paragraph and run model
//!
//! A [`Paragraph`] owns an ordered list of [`Run`]s. Paragraphs read from a
//! package remember their original XML so that untouched paragraphs are
//! written back exactly as they were found. Every mutating accessor drops
//! that copy, and the paragraph is re-serialized from the model on save.
//! Paragraph properties the model does not interpret (numbering, borders,
//! tabs, the paragraph mark's run properties) survive that re-serialization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Style name used when a paragraph carries no explicit style
pub const DEFAULT_STYLE: &str = "Normal";

/// Paragraph alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// Look up an alignment by its command-level name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "left" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }

    /// Map a `w:jc` value; unsupported values (distribute, thaiDistribute, ...) yield `None`
    pub(crate) fn from_jc(value: &str) -> Option<Self> {
        match value {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "both" => Some(Alignment::Justify),
            _ => None,
        }
    }

    pub(crate) fn jc(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 24-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgbColor(pub u8, pub u8, pub u8);

impl RgbColor {
    /// Parse exactly six hex digits (`RRGGBB`, no prefix)
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(RgbColor(r, g, b))
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Character formatting of a single run. `None` means "inherited".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunFormat {
    pub font: Option<String>,
    /// Size in points
    pub size: Option<f64>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub color: Option<RgbColor>,
}

impl RunFormat {
    pub fn is_plain(&self) -> bool {
        *self == RunFormat::default()
    }
}

/// A span of text sharing one formatting set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    pub text: String,
    pub format: RunFormat,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: RunFormat::default(),
        }
    }
}

/// Paragraph-level formatting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParagraphFormat {
    pub alignment: Option<Alignment>,
    /// Line spacing as a multiple of single spacing
    pub line_spacing: Option<f64>,
    /// Points
    pub space_before: Option<f64>,
    /// Points
    pub space_after: Option<f64>,
    /// First-line indent in points (negative for hanging indents)
    pub first_line_indent: Option<f64>,
}

impl ParagraphFormat {
    pub fn is_empty(&self) -> bool {
        *self == ParagraphFormat::default()
    }
}

/// Parts of a loaded paragraph that are carried through without interpretation
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RetainedProperties {
    /// Attributes of the `w:p` element (rsids, paragraph ids)
    pub(crate) paragraph_attrs: Vec<(String, String)>,
    /// `w:pPr` children outside the model as `(local name, raw XML)`
    pub(crate) children: Vec<(String, String)>,
    /// `w:spacing` attributes outside the model
    pub(crate) spacing_attrs: Vec<(String, String)>,
    /// `w:ind` attributes outside the model
    pub(crate) ind_attrs: Vec<(String, String)>,
}

/// A block-level text unit
#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    style: Option<String>,
    runs: Vec<Run>,
    format: ParagraphFormat,
    retained: RetainedProperties,
    /// Original XML, kept until the paragraph is mutated
    source: Option<String>,
}

impl PartialEq for Paragraph {
    fn eq(&self, other: &Self) -> bool {
        self.style_name() == other.style_name()
            && self.runs == other.runs
            && self.format == other.format
    }
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let runs = if text.is_empty() {
            Vec::new()
        } else {
            vec![Run::new(text)]
        };
        Self {
            runs,
            ..Self::default()
        }
    }

    pub fn with_style(text: impl Into<String>, style: impl Into<String>) -> Self {
        let mut paragraph = Self::new(text);
        paragraph.style = Some(style.into());
        paragraph
    }

    pub(crate) fn from_parts(
        style: Option<String>,
        runs: Vec<Run>,
        format: ParagraphFormat,
        retained: RetainedProperties,
        source: String,
    ) -> Self {
        Self {
            style,
            runs,
            format,
            retained,
            source: Some(source),
        }
    }

    /// Concatenated text of all runs
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Replace the content with a single unformatted run
    ///
    /// Paragraph properties are kept.
    pub fn set_text(&mut self, text: &str) {
        self.source = None;
        self.runs = vec![Run::new(text)];
    }

    pub fn style_name(&self) -> &str {
        self.style.as_deref().unwrap_or(DEFAULT_STYLE)
    }

    pub fn set_style(&mut self, name: impl Into<String>) {
        self.source = None;
        self.style = Some(name.into());
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn runs_mut(&mut self) -> &mut [Run] {
        self.source = None;
        &mut self.runs
    }

    pub fn push_run(&mut self, run: Run) -> &mut Run {
        self.source = None;
        self.runs.push(run);
        let last = self.runs.len() - 1;
        &mut self.runs[last]
    }

    pub fn format(&self) -> &ParagraphFormat {
        &self.format
    }

    pub fn format_mut(&mut self) -> &mut ParagraphFormat {
        self.source = None;
        &mut self.format
    }

    /// Whether the paragraph still matches the XML it was loaded from
    pub fn is_pristine(&self) -> bool {
        self.source.is_some()
    }

    pub(crate) fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub(crate) fn retained(&self) -> &RetainedProperties {
        &self.retained
    }
}

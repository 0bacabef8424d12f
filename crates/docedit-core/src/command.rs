//! Document command schema
//!
//! Commands arrive as JSON with camelCase keys:
//!
//! ```json
//! {
//!   "documentId": "contract.docx",
//!   "action": "insert",
//!   "location": { "type": "section", "number": "2", "position": "after" },
//!   "content": { "text": "New clause.", "style": { "matchSource": true } },
//!   "validation": { "postConditions": { "shouldExist": ["New clause."] } }
//! }
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single edit to apply to one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentCommand {
    /// Opaque identifier of the target document
    #[serde(default)]
    pub document_id: String,
    pub action: Action,
    pub location: LocationSpec,
    /// Required for insert and modify
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
}

impl DocumentCommand {
    /// Parse a command from its JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Insert,
    Modify,
    Delete,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Insert => "insert",
            Action::Modify => "modify",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a command applies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSpec {
    #[serde(flatten)]
    pub target: LocationTarget,
    /// Only `before` changes where an insert lands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl LocationSpec {
    pub fn new(target: LocationTarget) -> Self {
        Self {
            target,
            position: None,
        }
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

impl fmt::Display for LocationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LocationTarget {
    /// A heading-styled paragraph with exactly this text
    Heading {
        #[serde(default)]
        value: Option<String>,
    },
    /// The first paragraph starting with `"<number>."`
    Section { number: SectionNumber },
    Sentence(TextLocator),
    Paragraph(TextLocator),
}

impl LocationTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            LocationTarget::Heading { .. } => "heading",
            LocationTarget::Section { .. } => "section",
            LocationTarget::Sentence(_) => "sentence",
            LocationTarget::Paragraph(_) => "paragraph",
        }
    }
}

/// Text-based lookup used by sentence and paragraph locations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLocator {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence_number: Option<u32>,
    /// 1-based, relative to the section scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_number: Option<u32>,
    /// Section whose heading paragraph starts the scan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<SectionNumber>,
}

/// Section label given either as `"11.2"` or `11`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionNumber {
    Number(i64),
    Text(String),
}

impl SectionNumber {
    pub fn is_empty(&self) -> bool {
        matches!(self, SectionNumber::Text(s) if s.is_empty())
    }
}

impl fmt::Display for SectionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionNumber::Number(n) => write!(f, "{}", n),
            SectionNumber::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for SectionNumber {
    fn from(value: &str) -> Self {
        SectionNumber::Text(value.to_string())
    }
}

impl From<i64> for SectionNumber {
    fn from(value: i64) -> Self {
        SectionNumber::Number(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Before,
    After,
    Replace,
    Start,
    End,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSpec {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleRequirements>,
}

impl ContentSpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRequirements {
    /// Copy the named style of the paragraph the location resolved to
    #[serde(default)]
    pub match_source: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specific: Option<StyleSpec>,
}

/// Explicit formatting; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    /// Points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    /// Hex RGB, with or without a leading `#`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Named paragraph style
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing: Option<Spacing>,
    /// Kept as a string so unknown values surface as a style error, not a parse error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spacing {
    /// Points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<f64>,
    /// Points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<f64>,
    /// Multiple of single spacing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_conditions: Option<PreConditions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_conditions: Option<PostConditions>,
}

/// Checked against the document before anything changes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreConditions {
    #[serde(default)]
    pub must_exist: Vec<String>,
    #[serde(default)]
    pub must_not_exist: Vec<String>,
}

/// Checked against the document after it has been saved
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostConditions {
    #[serde(default)]
    pub should_exist: Vec<String>,
    #[serde(default)]
    pub should_not_exist: Vec<String>,
}

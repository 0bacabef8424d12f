//! Instructions document parser
//!
//! An instructions document lists contracts, each followed by an instruction
//! paragraph and a clause paragraph:
//!
//! ```text
//! Contract 1 Replace the late fee clause     <- title and instruction share a paragraph
//! The late fee is $50.                        <- clause
//! Contract 2                                  <- title
//! Delete the pet clause                       <- instruction
//! Pets are not allowed.                       <- clause
//! ```
//!
//! Paragraphs are fed through a three-state machine in document order;
//! whitespace-only paragraphs are skipped.

use crate::error::Result;
use docx_store::{Document, Paragraph, Run};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

lazy_static! {
    /// First number in a contract label
    static ref CONTRACT_NUMBER: Regex = Regex::new(r"\d+").unwrap();
}

/// One parsed `(contract, instruction, clause)` record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub contract: String,
    pub instruction: String,
    pub clause: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserOptions {
    /// Prefix paragraphs and runs with `[p:...]` / `[...]` formatting annotations
    #[serde(default)]
    pub include_formatting_annotations: bool,
    /// Rewrite contract labels to `<prefix><first number in the label>`
    #[serde(default)]
    pub normalize_contract_label: bool,
    /// Marks the contract whose instruction shares the title paragraph
    #[serde(default = "default_first_contract_marker")]
    pub first_contract_marker: String,
    /// Only treat the marker as such when no digit follows it
    /// (`Contract 10` is then an ordinary contract title)
    #[serde(default)]
    pub exact_first_contract_marker: bool,
    /// Starts every other contract title
    #[serde(default = "default_contract_prefix")]
    pub contract_prefix: String,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            include_formatting_annotations: false,
            normalize_contract_label: false,
            exact_first_contract_marker: false,
            first_contract_marker: default_first_contract_marker(),
            contract_prefix: default_contract_prefix(),
        }
    }
}

fn default_first_contract_marker() -> String {
    "Contract 1".to_string()
}

fn default_contract_prefix() -> String {
    "Contract ".to_string()
}

/// What the parser expects next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    SeekContract,
    SeekInstruction,
    SeekClause,
}

/// Incremental parser: feed paragraphs in order, then call [`finish`](Self::finish)
pub struct InstructionParser<'a> {
    options: &'a ParserOptions,
    state: ParseState,
    current: Option<Instruction>,
    records: Vec<Instruction>,
}

impl<'a> InstructionParser<'a> {
    pub fn new(options: &'a ParserOptions) -> Self {
        Self {
            options,
            state: ParseState::SeekContract,
            current: None,
            records: Vec::new(),
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Records completed so far, not counting the one in progress
    pub fn records(&self) -> &[Instruction] {
        &self.records
    }

    pub fn feed(&mut self, paragraph: &Paragraph) {
        let raw = paragraph.text();
        let plain = raw.trim();
        if plain.is_empty() {
            return;
        }
        let options = self.options;
        let formatted = formatted_text(paragraph, options.include_formatting_annotations);
        let marker = options.first_contract_marker.as_str();

        if starts_with_marker(plain, marker, options.exact_first_contract_marker) {
            self.flush();
            let contract = match formatted.find(marker) {
                Some(pos) => formatted[..pos + marker.len()].to_string(),
                None => format!("{}{}", formatted, marker),
            };
            self.current = Some(Instruction {
                contract: self.label(contract, marker),
                instruction: plain[marker.len()..].trim().to_string(),
                clause: String::new(),
            });
            self.transition(ParseState::SeekClause);
        } else if plain.starts_with(options.contract_prefix.as_str()) {
            self.flush();
            self.current = Some(Instruction {
                contract: self.label(formatted, plain),
                ..Default::default()
            });
            self.transition(ParseState::SeekInstruction);
        } else if let Some(current) = self.current.as_mut() {
            match self.state {
                ParseState::SeekInstruction => {
                    current.instruction = formatted;
                    self.transition(ParseState::SeekClause);
                }
                ParseState::SeekClause => {
                    current.clause = formatted;
                    self.transition(ParseState::SeekContract);
                }
                ParseState::SeekContract => {}
            }
        }
    }

    /// Flush the record in progress and return everything parsed
    pub fn finish(mut self) -> Vec<Instruction> {
        self.flush();
        self.records
    }

    fn flush(&mut self) {
        if let Some(record) = self.current.take() {
            self.records.push(record);
        }
    }

    fn transition(&mut self, next: ParseState) {
        tracing::debug!(from = ?self.state, to = ?next, "Instruction parser transition");
        self.state = next;
    }

    fn label(&self, formatted: String, plain: &str) -> String {
        if !self.options.normalize_contract_label {
            return formatted;
        }
        match CONTRACT_NUMBER.find(plain) {
            Some(number) => format!("{}{}", self.options.contract_prefix, number.as_str()),
            None => formatted,
        }
    }
}

/// `marker` at the start of `text`; when `exact`, not followed by another digit
fn starts_with_marker(text: &str, marker: &str, exact: bool) -> bool {
    text.strip_prefix(marker)
        .is_some_and(|rest| !exact || !rest.starts_with(|c: char| c.is_ascii_digit()))
}

/// Parse the paragraphs of an opened document
pub fn parse_instructions(doc: &Document, options: &ParserOptions) -> Vec<Instruction> {
    let mut parser = InstructionParser::new(options);
    for paragraph in doc.paragraphs() {
        parser.feed(paragraph);
    }
    let records = parser.finish();
    tracing::info!(records = records.len(), "Parsed instructions");
    records
}

/// Open a `.docx` file and parse it
pub fn parse_instructions_file<P: AsRef<Path>>(
    path: P,
    options: &ParserOptions,
) -> Result<Vec<Instruction>> {
    let doc = Document::open(path)?;
    Ok(parse_instructions(&doc, options))
}

/// Paragraph text, optionally with formatting annotations
pub fn formatted_text(paragraph: &Paragraph, annotate: bool) -> String {
    if !annotate {
        return paragraph.text();
    }
    let mut out = paragraph_annotation(paragraph);
    for run in paragraph.runs() {
        out.push_str(&run_annotation(run));
        out.push_str(&run.text);
    }
    out
}

fn paragraph_annotation(paragraph: &Paragraph) -> String {
    let format = paragraph.format();
    let mut props = vec![format!("style={}", paragraph.style_name())];
    if let Some(alignment) = format.alignment {
        props.push(format!("align={}", alignment));
    }
    if let Some(line) = format.line_spacing.filter(|v| *v != 0.0) {
        props.push(format!("line_spacing={}", line));
    }
    if let Some(before) = format.space_before.filter(|v| *v != 0.0) {
        props.push(format!("space_before={}pt", before));
    }
    if let Some(after) = format.space_after.filter(|v| *v != 0.0) {
        props.push(format!("space_after={}pt", after));
    }
    if let Some(indent) = format.first_line_indent.filter(|v| *v != 0.0) {
        props.push(format!("indent={}pt", indent));
    }
    format!("[p:{}]", props.join(","))
}

fn run_annotation(run: &Run) -> String {
    let format = &run.format;
    let mut props = Vec::new();
    if format.bold == Some(true) {
        props.push("bold".to_string());
    }
    if format.italic == Some(true) {
        props.push("italic".to_string());
    }
    if format.underline == Some(true) {
        props.push("underline".to_string());
    }
    if let Some(font) = &format.font {
        props.push(format!("font={}", font));
    }
    if let Some(size) = format.size {
        props.push(format!("size={}pt", size));
    }
    if let Some(color) = format.color {
        props.push(format!("color={}", color));
    }
    if props.is_empty() {
        String::new()
    } else {
        format!("[{}]", props.join(","))
    }
}

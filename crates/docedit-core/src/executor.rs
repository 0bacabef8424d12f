//! Command execution
//!
//! A command runs as a fixed sequence of stages:
//!
//! ```text
//! ValidatePre -> Resolve -> Mutate -> Style -> Persist -> ValidatePost -> Done
//! ```
//!
//! An insert at the `end` of a section lands after the section's last
//! paragraph rather than after its heading.
//!
//! Any stage may fail, which moves the execution to [`Stage::Failed`]. There
//! is no rollback: a post-condition failure is reported after the document
//! has already been saved.

use crate::command::{Action, DocumentCommand, LocationTarget, Position};
use crate::conditions::validate_conditions;
use crate::config::EditorConfig;
use crate::error::{DocEditError, Result};
use crate::locate::LocationResolver;
use crate::style::apply_style;
use docx_store::{Document, Paragraph};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ValidatePre,
    Resolve,
    Mutate,
    Style,
    Persist,
    ValidatePost,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Add,
    Replace,
    Remove,
}

/// What a successful command did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub kind: ChangeKind,
    /// Index of the affected paragraph after the change
    pub index: usize,
    /// New paragraph text; empty for removals
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_text: Option<String>,
    /// Section label when the location was a section
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

/// Applies commands to one document
pub struct CommandProcessor {
    doc: Document,
    path: Option<PathBuf>,
    config: EditorConfig,
}

impl CommandProcessor {
    /// Open the document at `path`; successful commands save back to it
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let doc = Document::open(path)?;
        Ok(Self {
            doc,
            path: Some(path.to_path_buf()),
            config: EditorConfig::default(),
        })
    }

    /// Work on an in-memory document; the persist stage is skipped
    pub fn from_document(doc: Document) -> Self {
        Self {
            doc,
            path: None,
            config: EditorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    /// Run `command` through every stage
    pub fn process(&mut self, command: &DocumentCommand) -> Result<Change> {
        self.execution(command).run()
    }

    /// Stage-by-stage execution of `command`
    pub fn execution<'a>(&'a mut self, command: &'a DocumentCommand) -> Execution<'a> {
        Execution {
            doc: &mut self.doc,
            path: self.path.as_deref(),
            heading_prefix: &self.config.heading_style_prefix,
            command,
            stage: Stage::ValidatePre,
            anchor: None,
            anchor_style: None,
            target: None,
            previous_text: None,
            change: None,
        }
    }
}

/// One command in flight
pub struct Execution<'a> {
    doc: &'a mut Document,
    path: Option<&'a Path>,
    heading_prefix: &'a str,
    command: &'a DocumentCommand,
    stage: Stage,
    /// Paragraph the location resolved to, before any mutation
    anchor: Option<usize>,
    anchor_style: Option<String>,
    /// Paragraph that receives the content
    target: Option<usize>,
    previous_text: Option<String>,
    change: Option<Change>,
}

impl<'a> Execution<'a> {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    pub fn document(&self) -> &Document {
        &*self.doc
    }

    /// Run the current stage and move to the next one
    ///
    /// Returns the stage now current. Once failed, every further call errors.
    pub fn advance(&mut self) -> Result<Stage> {
        let next = match self.stage {
            Stage::ValidatePre => self.validate_pre().map(|_| Stage::Resolve),
            Stage::Resolve => self.resolve().map(|_| Stage::Mutate),
            Stage::Mutate => self.mutate().map(|_| Stage::Style),
            Stage::Style => self.style().map(|_| Stage::Persist),
            Stage::Persist => self.persist().map(|_| Stage::ValidatePost),
            Stage::ValidatePost => self.validate_post().map(|_| Stage::Done),
            Stage::Done => Ok(Stage::Done),
            Stage::Failed => Err(DocEditError::Unexpected(
                "command execution already failed".into(),
            )),
        };

        match next {
            Ok(stage) => {
                if stage != self.stage {
                    tracing::debug!(from = ?self.stage, to = ?stage, "Command stage");
                }
                self.stage = stage;
                Ok(stage)
            }
            Err(err) => {
                tracing::debug!(stage = ?self.stage, error = %err, "Command failed");
                self.stage = Stage::Failed;
                Err(err)
            }
        }
    }

    /// Advance until done and return the change summary
    pub fn run(mut self) -> Result<Change> {
        while self.advance()? != Stage::Done {}
        let change = self
            .change
            .take()
            .ok_or_else(|| DocEditError::Unexpected("command finished without a change".into()))?;
        tracing::info!(
            action = %self.command.action,
            kind = ?change.kind,
            index = change.index,
            "Command applied"
        );
        Ok(change)
    }

    fn validate_pre(&mut self) -> Result<()> {
        let pre = self
            .command
            .validation
            .as_ref()
            .and_then(|v| v.pre_conditions.as_ref());
        match pre {
            Some(conditions) if !validate_conditions(self.doc, conditions) => {
                Err(DocEditError::PreconditionFailed)
            }
            _ => Ok(()),
        }
    }

    fn resolve(&mut self) -> Result<()> {
        let location = &self.command.location;
        let index = LocationResolver::new(self.doc)
            .with_heading_prefix(self.heading_prefix)
            .resolve(&location.target)
            .ok_or_else(|| DocEditError::LocationNotFound(location.to_string()))?;
        let anchor = self
            .doc
            .paragraph(index)
            .ok_or_else(|| DocEditError::Unexpected(format!("resolved index {} is out of range", index)))?;
        self.anchor_style = Some(anchor.style_name().to_string());
        self.anchor = Some(index);
        Ok(())
    }

    fn anchor_index(&self) -> Result<usize> {
        self.anchor
            .ok_or_else(|| DocEditError::Unexpected("location was not resolved".into()))
    }

    fn require_content(&self) -> Result<()> {
        match self.command.content {
            Some(_) => Ok(()),
            None => Err(DocEditError::MissingContent(
                self.command.action.name().to_string(),
            )),
        }
    }

    fn mutate(&mut self) -> Result<()> {
        let anchor = self.anchor_index()?;
        match self.command.action {
            Action::Delete => {
                let removed = self.doc.remove_paragraph(anchor)?;
                self.previous_text = Some(removed.text());
            }
            Action::Insert => {
                self.require_content()?;
                // insert directly after paragraph k; k = -1 puts it first
                let index = match (self.command.location.position, &self.command.location.target) {
                    (Some(Position::Before), _) => anchor,
                    (Some(Position::End), LocationTarget::Section { .. }) => {
                        LocationResolver::new(self.doc).section_end(anchor)
                    }
                    _ => anchor + 1,
                };
                let paragraph = Paragraph::with_style("", self.doc.styles().default_name());
                self.doc.insert_paragraph(index, paragraph)?;
                self.target = Some(index);
            }
            Action::Modify => {
                self.require_content()?;
                self.previous_text = self.doc.paragraph(anchor).map(Paragraph::text);
                self.target = Some(anchor);
            }
        }
        Ok(())
    }

    fn style(&mut self) -> Result<()> {
        let (content, target) = match (&self.command.content, self.target) {
            (Some(content), Some(target)) => (content, target),
            // deletions carry no content
            _ => return Ok(()),
        };
        let paragraph = self
            .doc
            .paragraph_mut(target)
            .ok_or_else(|| DocEditError::Unexpected(format!("target index {} is out of range", target)))?;

        paragraph.set_text(&content.text);
        if let Some(style) = &content.style {
            if style.match_source {
                if let Some(name) = &self.anchor_style {
                    paragraph.set_style(name.clone());
                }
            }
            if let Some(spec) = &style.specific {
                apply_style(paragraph, spec)?;
            }
        }
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        match self.path {
            Some(path) => self.doc.save(path)?,
            None => tracing::debug!("In-memory document, skipping save"),
        }
        Ok(())
    }

    fn validate_post(&mut self) -> Result<()> {
        let post = self
            .command
            .validation
            .as_ref()
            .and_then(|v| v.post_conditions.as_ref());
        if let Some(conditions) = post {
            if !validate_conditions(self.doc, conditions) {
                tracing::warn!("Post-conditions failed after the document was saved");
                return Err(DocEditError::PostconditionFailed);
            }
        }
        self.change = Some(self.summarize()?);
        Ok(())
    }

    fn summarize(&self) -> Result<Change> {
        let section = match &self.command.location.target {
            LocationTarget::Section { number } => Some(number.to_string()),
            _ => None,
        };
        let change = match self.command.action {
            Action::Delete => Change {
                kind: ChangeKind::Remove,
                index: self.anchor_index()?,
                text: String::new(),
                previous_text: self.previous_text.clone(),
                section,
            },
            Action::Insert | Action::Modify => {
                let index = self
                    .target
                    .ok_or_else(|| DocEditError::Unexpected("no target paragraph".into()))?;
                Change {
                    kind: if self.command.action == Action::Insert {
                        ChangeKind::Add
                    } else {
                        ChangeKind::Replace
                    },
                    index,
                    text: self.doc.paragraph(index).map(Paragraph::text).unwrap_or_default(),
                    previous_text: self.previous_text.clone(),
                    section,
                }
            }
        };
        Ok(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{ContentSpec, LocationSpec, SectionNumber, StyleRequirements};
    use pretty_assertions::assert_eq;

    fn agreement() -> Document {
        vec![
            Paragraph::with_style("Agreement", "Title"),
            Paragraph::with_style("Rent", "Heading 1"),
            Paragraph::new("1. Rent is due on the first."),
            Paragraph::new("2. Deposit"),
            Paragraph::new("The deposit is refundable."),
        ]
        .into_iter()
        .collect()
    }

    fn command(action: Action, target: LocationTarget, text: Option<&str>) -> DocumentCommand {
        DocumentCommand {
            document_id: "agreement.docx".into(),
            action,
            location: LocationSpec::new(target),
            content: text.map(ContentSpec::new),
            validation: None,
        }
    }

    fn section(number: i64) -> LocationTarget {
        LocationTarget::Section {
            number: SectionNumber::Number(number),
        }
    }

    #[test]
    fn test_stages_advance_in_order() {
        let mut processor = CommandProcessor::from_document(agreement());
        let cmd = command(Action::Modify, section(2), Some("2. Security Deposit"));
        let mut execution = processor.execution(&cmd);

        let mut seen = vec![execution.stage()];
        while execution.stage() != Stage::Done {
            seen.push(execution.advance().unwrap());
        }
        assert_eq!(
            seen,
            vec![
                Stage::ValidatePre,
                Stage::Resolve,
                Stage::Mutate,
                Stage::Style,
                Stage::Persist,
                Stage::ValidatePost,
                Stage::Done,
            ]
        );
        assert_eq!(execution.anchor(), Some(3));
        assert_eq!(execution.advance().unwrap(), Stage::Done);
    }

    #[test]
    fn test_failure_is_absorbing() {
        let mut processor = CommandProcessor::from_document(agreement());
        let cmd = command(Action::Delete, section(99), None);
        let mut execution = processor.execution(&cmd);

        assert_eq!(execution.advance().unwrap(), Stage::Resolve);
        let err = execution.advance().unwrap_err();
        assert!(matches!(err, DocEditError::LocationNotFound(_)));
        assert_eq!(execution.stage(), Stage::Failed);
        assert!(matches!(
            execution.advance(),
            Err(DocEditError::Unexpected(_))
        ));
    }

    #[test]
    fn test_insert_lands_after_anchor() {
        let mut processor = CommandProcessor::from_document(agreement());
        let cmd = command(Action::Insert, section(1), Some("Late fees apply."));
        let change = processor.process(&cmd).unwrap();

        assert_eq!(change.kind, ChangeKind::Add);
        assert_eq!(change.index, 3);
        assert_eq!(change.section.as_deref(), Some("1"));
        assert_eq!(
            processor.document().paragraph(3).unwrap().text(),
            "Late fees apply."
        );
        assert_eq!(processor.document().paragraph_count(), 6);
    }

    #[test]
    fn test_insert_before_first_paragraph() {
        let mut processor = CommandProcessor::from_document(agreement());
        let mut cmd = command(
            Action::Insert,
            LocationTarget::Heading {
                value: Some("Rent".into()),
            },
            Some("Preface"),
        );
        cmd.location.position = Some(Position::Before);
        processor.process(&cmd).unwrap();
        assert_eq!(processor.document().paragraph(1).unwrap().text(), "Preface");

        let mut first = command(
            Action::Insert,
            LocationTarget::Paragraph(crate::command::TextLocator {
                match_text: Some("Agreement".into()),
                ..Default::default()
            }),
            Some("Draft"),
        );
        first.location.position = Some(Position::Before);
        let change = processor.process(&first).unwrap();
        assert_eq!(change.index, 0);
        assert_eq!(processor.document().paragraph(0).unwrap().text(), "Draft");
        assert_eq!(processor.document().paragraph(1).unwrap().text(), "Agreement");
    }

    #[test]
    fn test_insert_after_last_paragraph_appends() {
        let mut processor = CommandProcessor::from_document(agreement());
        let cmd = command(
            Action::Insert,
            LocationTarget::Sentence(crate::command::TextLocator {
                match_text: Some("refundable".into()),
                ..Default::default()
            }),
            Some("Signed."),
        );
        let change = processor.process(&cmd).unwrap();
        assert_eq!(change.index, 5);
        assert_eq!(processor.document().paragraph(5).unwrap().text(), "Signed.");
    }

    #[test]
    fn test_match_source_copies_anchor_style_even_before() {
        let mut processor = CommandProcessor::from_document(agreement());
        let mut cmd = command(
            Action::Insert,
            LocationTarget::Heading {
                value: Some("Rent".into()),
            },
            Some("Parties"),
        );
        cmd.location.position = Some(Position::Before);
        if let Some(content) = cmd.content.as_mut() {
            content.style = Some(StyleRequirements {
                match_source: true,
                specific: None,
            });
        }
        processor.process(&cmd).unwrap();

        let inserted = processor.document().paragraph(1).unwrap();
        assert_eq!(inserted.text(), "Parties");
        // the anchor is the heading, not the title paragraph before it
        assert_eq!(inserted.style_name(), "Heading 1");
    }

    #[test]
    fn test_modify_and_delete_report_previous_text() {
        let mut processor = CommandProcessor::from_document(agreement());
        let change = processor
            .process(&command(Action::Modify, section(1), Some("1. Rent is due weekly.")))
            .unwrap();
        assert_eq!(change.kind, ChangeKind::Replace);
        assert_eq!(change.previous_text.as_deref(), Some("1. Rent is due on the first."));

        let change = processor.process(&command(Action::Delete, section(2), None)).unwrap();
        assert_eq!(change.kind, ChangeKind::Remove);
        assert_eq!(change.index, 3);
        assert_eq!(change.previous_text.as_deref(), Some("2. Deposit"));
        assert_eq!(processor.document().paragraph_count(), 4);
    }

    #[test]
    fn test_missing_content_leaves_document_unchanged() {
        let mut processor = CommandProcessor::from_document(agreement());
        let err = processor
            .process(&command(Action::Insert, section(1), None))
            .unwrap_err();
        assert!(matches!(err, DocEditError::MissingContent(ref a) if a == "insert"));
        assert_eq!(processor.into_document().texts(), agreement().texts());
    }

    #[test]
    fn test_custom_heading_prefix() {
        let config = EditorConfig {
            heading_style_prefix: "Title".into(),
        };
        let mut processor = CommandProcessor::from_document(agreement()).with_config(config);
        let cmd = command(
            Action::Modify,
            LocationTarget::Heading {
                value: Some("Agreement".into()),
            },
            Some("Lease Agreement"),
        );
        processor.process(&cmd).unwrap();
        assert_eq!(
            processor.document().paragraph(0).unwrap().text(),
            "Lease Agreement"
        );
    }

    #[test]
    fn test_insert_at_section_end() {
        let mut processor = CommandProcessor::from_document(agreement());
        let mut cmd = command(Action::Insert, section(1), Some("Rent may be paid online."));
        cmd.location.position = Some(Position::End);
        let change = processor.process(&cmd).unwrap();

        // section 1 is "1. Rent ..." alone; section 2 starts at index 3
        assert_eq!(change.index, 3);
        assert_eq!(
            processor.document().texts(),
            vec![
                "Agreement",
                "Rent",
                "1. Rent is due on the first.",
                "Rent may be paid online.",
                "2. Deposit",
                "The deposit is refundable.",
            ]
        );

        let mut last = command(Action::Insert, section(2), Some("Deposits earn no interest."));
        last.location.position = Some(Position::End);
        let change = processor.process(&last).unwrap();
        assert_eq!(change.index, 6);
        assert_eq!(
            processor.document().paragraph(6).unwrap().text(),
            "Deposits earn no interest."
        );
    }

    #[test]
    fn test_end_on_other_locations_inserts_after() {
        let mut processor = CommandProcessor::from_document(agreement());
        let mut cmd = command(
            Action::Insert,
            LocationTarget::Heading {
                value: Some("Rent".into()),
            },
            Some("Summary"),
        );
        cmd.location.position = Some(Position::End);
        let change = processor.process(&cmd).unwrap();
        assert_eq!(change.index, 2);
    }

    #[test]
    fn test_inserted_paragraph_takes_the_document_default_style() {
        let mut processor = CommandProcessor::from_document(agreement());
        let cmd = command(Action::Insert, section(1), Some("Plain"));
        processor.process(&cmd).unwrap();
        let inserted = processor.document().paragraph(3).unwrap();
        assert_eq!(
            inserted.style_name(),
            processor.document().styles().default_name()
        );
    }
}

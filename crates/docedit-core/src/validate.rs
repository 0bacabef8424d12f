//! Structural checks on a command before it runs

use crate::command::{Action, DocumentCommand, LocationTarget, StyleSpec, TextLocator};
use crate::error::{DocEditError, Result};
use crate::style::{parse_alignment, parse_hex_color};

fn invalid(message: impl Into<String>) -> DocEditError {
    DocEditError::InvalidCommand(message.into())
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.is_empty())
}

fn has_number(value: Option<u32>) -> bool {
    value.is_some_and(|n| n > 0)
}

/// Reject commands that cannot be executed meaningfully
///
/// Color and alignment problems are reported as
/// [`DocEditError::InvalidStyle`]; everything else as
/// [`DocEditError::InvalidCommand`].
pub fn validate_command(command: &DocumentCommand) -> Result<()> {
    if command.document_id.is_empty() {
        return Err(invalid("command must specify documentId"));
    }

    if command.location.position.is_none() {
        return Err(invalid("location must specify position"));
    }
    validate_location(&command.location.target)?;

    match (&command.content, command.action) {
        (None, Action::Insert | Action::Modify) => {
            return Err(invalid(format!("{} action requires content", command.action)));
        }
        (Some(content), Action::Insert | Action::Modify) if content.text.is_empty() => {
            return Err(invalid("content must specify text"));
        }
        _ => {}
    }

    if let Some(spec) = command
        .content
        .as_ref()
        .and_then(|c| c.style.as_ref())
        .and_then(|s| s.specific.as_ref())
    {
        validate_style(spec)?;
    }

    Ok(())
}

fn validate_location(target: &LocationTarget) -> Result<()> {
    match target {
        LocationTarget::Heading { value } if !has_text(value) => {
            Err(invalid("heading location must specify value"))
        }
        LocationTarget::Section { number } if number.is_empty() => {
            Err(invalid("section location must specify number"))
        }
        LocationTarget::Sentence(TextLocator {
            match_text,
            sentence_number,
            ..
        }) if !has_text(match_text) && !has_number(*sentence_number) => Err(invalid(
            "sentence location must specify either matchText or sentenceNumber",
        )),
        LocationTarget::Paragraph(TextLocator {
            match_text,
            paragraph_number,
            ..
        }) if !has_text(match_text) && !has_number(*paragraph_number) => Err(invalid(
            "paragraph location must specify either matchText or paragraphNumber",
        )),
        _ => Ok(()),
    }
}

fn validate_style(spec: &StyleSpec) -> Result<()> {
    if let Some(spacing) = &spec.spacing {
        for (name, value) in [
            ("before", spacing.before),
            ("after", spacing.after),
            ("line", spacing.line),
        ] {
            if value.is_some_and(|v| v < 0.0) {
                return Err(invalid(format!("spacing {} must be non-negative", name)));
            }
        }
    }
    if let Some(color) = spec.color.as_deref().filter(|c| !c.is_empty()) {
        parse_hex_color(color)?;
    }
    if let Some(alignment) = spec.alignment.as_deref().filter(|a| !a.is_empty()) {
        parse_alignment(alignment)?;
    }
    Ok(())
}

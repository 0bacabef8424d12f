//! Applying explicit formatting to a paragraph

use crate::command::StyleSpec;
use crate::error::{DocEditError, Result};
use docx_store::{Alignment, Paragraph, RgbColor, Run};

/// Parse a hex color string to RGB
///
/// Accepts `RRGGBB` with an optional leading `#`.
pub fn parse_hex_color(value: &str) -> Result<RgbColor> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    RgbColor::from_hex(hex).ok_or_else(|| {
        DocEditError::InvalidStyle(format!(
            "color '{}' must be six hex digits, e.g. #FF0000",
            value
        ))
    })
}

pub fn parse_alignment(value: &str) -> Result<Alignment> {
    Alignment::from_name(value).ok_or_else(|| {
        DocEditError::InvalidStyle(format!(
            "alignment '{}' must be one of left, center, right, justify",
            value
        ))
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Apply `spec` to `paragraph`
///
/// Character formatting goes to the first run, which is created when the
/// paragraph has none. Applying the same spec twice yields the same
/// paragraph. Color and alignment are checked before anything changes, so a
/// rejected spec leaves the paragraph untouched.
pub fn apply_style(paragraph: &mut Paragraph, spec: &StyleSpec) -> Result<()> {
    let color = non_empty(&spec.color).map(parse_hex_color).transpose()?;
    let alignment = non_empty(&spec.alignment)
        .map(parse_alignment)
        .transpose()?;

    if let Some(style) = non_empty(&spec.style) {
        paragraph.set_style(style);
    }

    if paragraph.runs().is_empty() {
        paragraph.push_run(Run::default());
    }
    if let Some(run) = paragraph.runs_mut().first_mut() {
        let format = &mut run.format;
        if let Some(font) = non_empty(&spec.font) {
            format.font = Some(font.to_string());
        }
        if let Some(size) = spec.size.filter(|&s| s != 0.0) {
            format.size = Some(size);
        }
        if let Some(bold) = spec.bold {
            format.bold = Some(bold);
        }
        if let Some(italic) = spec.italic {
            format.italic = Some(italic);
        }
        if let Some(underline) = spec.underline {
            format.underline = Some(underline);
        }
        if color.is_some() {
            format.color = color;
        }
    }

    if let Some(spacing) = &spec.spacing {
        let format = paragraph.format_mut();
        if let Some(before) = spacing.before {
            format.space_before = Some(before);
        }
        if let Some(after) = spacing.after {
            format.space_after = Some(after);
        }
        if let Some(line) = spacing.line {
            format.line_spacing = Some(line);
        }
    }

    if alignment.is_some() {
        paragraph.format_mut().alignment = alignment;
    }

    Ok(())
}

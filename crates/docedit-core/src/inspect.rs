//! Paragraph listing for checking a document's structure by eye

use docx_store::{Document, Paragraph};
use serde::{Deserialize, Serialize};

/// Characters of paragraph text shown per line
const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphSummary {
    /// 1-based position among all paragraphs, blank ones included
    pub index: usize,
    /// Any run is bold
    pub bold: bool,
    /// Any run is underlined
    pub underline: bool,
    pub style: String,
    /// First 100 characters of the text
    pub text: String,
}

impl ParagraphSummary {
    fn from_paragraph(index: usize, paragraph: &Paragraph) -> Self {
        Self {
            index,
            bold: paragraph.runs().iter().any(|r| r.format.bold == Some(true)),
            underline: paragraph
                .runs()
                .iter()
                .any(|r| r.format.underline == Some(true)),
            style: paragraph.style_name().to_string(),
            text: paragraph.text().chars().take(PREVIEW_CHARS).collect(),
        }
    }
}

/// Summarize every non-blank paragraph
pub fn inspect(doc: &Document) -> Vec<ParagraphSummary> {
    doc.paragraphs()
        .enumerate()
        .filter(|(_, p)| !p.text().trim().is_empty())
        .map(|(i, p)| ParagraphSummary::from_paragraph(i + 1, p))
        .collect()
}

/// Fixed-width listing, one paragraph per line
pub fn render_text(summaries: &[ParagraphSummary]) -> String {
    let mut out = String::new();
    for s in summaries {
        out.push_str(&format!(
            "{:3}. {} {} {:12} | {}\n",
            s.index,
            if s.bold { "[BOLD]" } else { "      " },
            if s.underline { "[UNDERLINE]" } else { "           " },
            s.style,
            s.text
        ));
    }
    out
}

//! Textual pre- and post-condition checks

use crate::command::{PostConditions, PreConditions};
use docx_store::Document;

/// A set of substrings that must be present and substrings that must be absent
pub trait ConditionSet {
    fn required(&self) -> &[String];
    fn forbidden(&self) -> &[String];
}

impl ConditionSet for PreConditions {
    fn required(&self) -> &[String] {
        &self.must_exist
    }

    fn forbidden(&self) -> &[String] {
        &self.must_not_exist
    }
}

impl ConditionSet for PostConditions {
    fn required(&self) -> &[String] {
        &self.should_exist
    }

    fn forbidden(&self) -> &[String] {
        &self.should_not_exist
    }
}

/// Check literal substring presence and absence in `text`
pub fn conditions_hold(text: &str, required: &[String], forbidden: &[String]) -> bool {
    if let Some(missing) = required.iter().find(|s| !text.contains(s.as_str())) {
        tracing::debug!(%missing, "Required text not found");
        return false;
    }
    if let Some(present) = forbidden.iter().find(|s| text.contains(s.as_str())) {
        tracing::debug!(%present, "Forbidden text found");
        return false;
    }
    true
}

/// Evaluate `conditions` against the paragraph texts joined by a single space
pub fn validate_conditions<C: ConditionSet>(doc: &Document, conditions: &C) -> bool {
    let text = doc.full_text(" ");
    conditions_hold(&text, conditions.required(), conditions.forbidden())
}

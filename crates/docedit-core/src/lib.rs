//! Structured editing of word-processing documents
//!
//! A [`DocumentCommand`] names a location (heading, numbered section, or
//! contained text), an action (insert, modify, delete), optional content with
//! formatting, and optional textual pre/post conditions. The
//! [`CommandProcessor`] resolves the location, applies the change, saves the
//! document and checks the conditions.
//!
//! Separately, [`parse_instructions`] turns an instructions document into
//! `(contract, instruction, clause)` records.
//!
//! ```no_run
//! use docedit_core::{CommandProcessor, DocumentCommand};
//!
//! # fn example() -> docedit_core::Result<()> {
//! let command = DocumentCommand::from_json(
//!     r#"{"documentId": "lease.docx", "action": "delete",
//!         "location": {"type": "section", "number": 7}}"#,
//! )?;
//! let change = CommandProcessor::open("lease.docx")?.process(&command)?;
//! println!("removed paragraph {}", change.index);
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod conditions;
pub mod config;
pub mod error;
pub mod executor;
pub mod inspect;
pub mod instructions;
pub mod locate;
pub mod style;
pub mod validate;

pub use command::{
    Action, ContentSpec, DocumentCommand, LocationSpec, LocationTarget, Position, PostConditions,
    PreConditions, SectionNumber, Spacing, StyleRequirements, StyleSpec, TextLocator, Validation,
};
pub use conditions::{conditions_hold, validate_conditions, ConditionSet};
pub use config::{Config, EditorConfig};
pub use error::{DocEditError, Result};
pub use executor::{Change, ChangeKind, CommandProcessor, Execution, Stage};
pub use inspect::{inspect, render_text, ParagraphSummary};
pub use instructions::{
    formatted_text, parse_instructions, parse_instructions_file, Instruction, InstructionParser,
    ParseState, ParserOptions,
};
pub use locate::LocationResolver;
pub use style::{apply_style, parse_alignment, parse_hex_color};
pub use validate::validate_command;

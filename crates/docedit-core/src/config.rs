//! TOML configuration
//!
//! Every section and key is optional:
//!
//! ```toml
//! [editor]
//! heading_style_prefix = "Heading"
//!
//! [instructions]
//! include_formatting_annotations = false
//! normalize_contract_label = false
//! first_contract_marker = "Contract 1"
//! exact_first_contract_marker = false
//! contract_prefix = "Contract "
//! ```

use crate::instructions::ParserOptions;
use crate::locate::DEFAULT_HEADING_PREFIX;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Command execution settings
    #[serde(default)]
    pub editor: EditorConfig,
    /// Instruction parser settings
    #[serde(default)]
    pub instructions: ParserOptions,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML is malformed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Style-name prefix that identifies heading paragraphs (default: "Heading")
    #[serde(default = "default_heading_style_prefix")]
    pub heading_style_prefix: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            heading_style_prefix: default_heading_style_prefix(),
        }
    }
}

fn default_heading_style_prefix() -> String {
    DEFAULT_HEADING_PREFIX.to_string()
}

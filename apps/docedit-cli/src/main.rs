//! docedit binary
//!
//! Applies one JSON command to a `.docx` file, parses instructions documents,
//! and lists document structure. Results go to stdout as JSON; logs go to
//! stderr.

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use docedit_core::{
    inspect, parse_instructions_file, render_text, validate_command, Change, CommandProcessor,
    Config, DocumentCommand, EditorConfig, ParserOptions,
};
use docx_store::Document;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "docedit")]
#[command(version, about = "Structured editing of .docx documents")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a JSON command to a document, overwriting it
    Process {
        /// Document to edit
        document: PathBuf,
        /// Command as a JSON string
        command: String,
        /// Reject structurally invalid commands before touching the document
        #[arg(long)]
        strict: bool,
    },
    /// Parse an instructions document into contract/instruction/clause records
    ParseInstructions {
        document: PathBuf,
        /// Include paragraph and run formatting annotations
        #[arg(long)]
        annotate: bool,
        /// Rewrite contract labels to "Contract N"
        #[arg(long)]
        normalize_labels: bool,
    },
    /// List the non-empty paragraphs of a document
    Inspect {
        document: PathBuf,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            let rendered = err.to_string();
            let summary = rendered
                .lines()
                .next()
                .unwrap_or_default()
                .trim_start_matches("error: ");
            println!(
                "{}",
                json!({"status": "error", "message": format!("Invalid arguments: {}", summary)})
            );
            return ExitCode::from(1);
        }
    };

    // stdout carries only JSON results
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            println!("{}", json!({"status": "error", "message": format!("{:#}", err)}));
            return ExitCode::from(1);
        }
    };

    match cli.command {
        Command::Process {
            document,
            command,
            strict,
        } => {
            // business failures are reported in the JSON body, not the exit code
            let response = match process(&document, &command, strict, config.editor) {
                Ok(change) => {
                    tracing::info!(
                        document = %document.display(),
                        kind = ?change.kind,
                        index = change.index,
                        "Document updated"
                    );
                    json!({"status": "success"})
                }
                Err(err) => {
                    tracing::warn!(document = %document.display(), error = %err, "Command failed");
                    json!({"status": "error", "message": err.to_string()})
                }
            };
            println!("{}", response);
            ExitCode::SUCCESS
        }
        Command::ParseInstructions {
            document,
            annotate,
            normalize_labels,
        } => {
            let mut options: ParserOptions = config.instructions;
            options.include_formatting_annotations |= annotate;
            options.normalize_contract_label |= normalize_labels;
            let output = parse_instructions_file(&document, &options)
                .map_err(anyhow::Error::from)
                .and_then(|records| {
                    serde_json::to_string_pretty(&records).context("Failed to serialize instructions")
                });
            emit(output)
        }
        Command::Inspect { document, json } => {
            let output = Document::open(&document)
                .with_context(|| format!("Failed to open {}", document.display()))
                .and_then(|doc| {
                    let summaries = inspect(&doc);
                    if json {
                        serde_json::to_string_pretty(&summaries).context("Failed to serialize report")
                    } else {
                        Ok(format!(
                            "Checking document: {}\n\n{}",
                            document.display(),
                            render_text(&summaries)
                        ))
                    }
                });
            emit(output)
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Ok(Config::default()),
    }
}

fn process(
    document: &Path,
    command: &str,
    strict: bool,
    editor: EditorConfig,
) -> docedit_core::Result<Change> {
    let command = DocumentCommand::from_json(command)?;
    if strict {
        validate_command(&command)?;
    }
    CommandProcessor::open(document)?
        .with_config(editor)
        .process(&command)
}

/// Print a result, or `{"error": ...}` with exit code 1
fn emit(output: anyhow::Result<String>) -> ExitCode {
    match output {
        Ok(text) => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
        Err(err) => {
            println!("{}", json!({"error": format!("{:#}", err)}));
            ExitCode::from(1)
        }
    }
}

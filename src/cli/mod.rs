//! CLI module for convgen
//!
//! This module provides the command-line interface for the generator.
//!
//! ## Commands
//!
//! - `generate <manifest>` - Synthesize converters and write the rendered source
//! - `check <manifest>` - Synthesize converters and report errors only
//! - `dump-ir <manifest>` - Print the synthesized IR as JSON
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::version::CONVGEN_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// Synthesis failed, or the output could not be written.
    pub const FAILURE: ExitCode = ExitCode(1);
    /// The manifest could not be read or is invalid.
    pub const CONFIG: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Synthesize conversion functions between declared types
#[derive(Parser, Debug)]
#[command(name = "convgen")]
#[command(version = CONVGEN_VERSION)]
#[command(about = "Synthesize conversion functions between declared types", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate converter implementations
    Generate {
        /// Manifest describing types and converters
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,
        /// Write the output to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Omit the "generated code" header
        #[arg(long)]
        no_header: bool,
    },

    /// Run synthesis and report errors without writing output
    Check {
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,
    },

    /// Print the synthesized IR as JSON (debug)
    DumpIr {
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Generate {
            manifest,
            output,
            no_header,
        } => commands::generate(&manifest, output.as_deref(), no_header),
        Command::Check { manifest } => commands::check(&manifest),
        Command::DumpIr { manifest } => commands::dump_ir(&manifest),
    }
}

// ============================================================================
// Tests
// ============================================================================

//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::path::Path;

use crate::backend::ir::{GenerationError, Generator, IrProgram, TextEmitter};
use crate::config::{ConfigError, Manifest};

use super::{CliError, CliResult, ExitCode};

/// Manifests larger than this are rejected before reading.
const MAX_MANIFEST_SIZE: u64 = 16 * 1024 * 1024;

// ============================================================================
// Input / diagnostics
// ============================================================================

/// Read and parse a manifest file.
///
/// Returns an error if:
/// - The file cannot be read (I/O error)
/// - The file exceeds `MAX_MANIFEST_SIZE` (16 MB)
/// - The content is not a valid manifest
pub fn load_manifest(path: &Path) -> CliResult<Manifest> {
    let metadata = fs::metadata(path)
        .map_err(|e| CliError::new(format!("Cannot access file '{}': {}", path.display(), e), ExitCode::CONFIG))?;

    if metadata.len() > MAX_MANIFEST_SIZE {
        return Err(CliError::new(
            format!(
                "Manifest '{}' is too large ({} bytes, max {} bytes)",
                path.display(),
                metadata.len(),
                MAX_MANIFEST_SIZE
            ),
            ExitCode::CONFIG,
        ));
    }

    Manifest::load(path).map_err(config_error)
}

fn config_error(err: ConfigError) -> CliError {
    CliError::new(render(err), ExitCode::CONFIG)
}

fn generation_error(err: GenerationError) -> CliError {
    let exit_code = match err {
        GenerationError::Config(_) => ExitCode::CONFIG,
        GenerationError::Conversion(_) | GenerationError::Emission(_) => ExitCode::FAILURE,
    };
    CliError::new(render(err), exit_code)
}

/// Render a diagnostic with its code, help and source chain.
fn render<E>(err: E) -> String
where
    E: miette::Diagnostic + Send + Sync + 'static,
{
    format!("{:?}", miette::Report::new(err))
}

fn synthesize(path: &Path) -> CliResult<(Manifest, IrProgram)> {
    let manifest = load_manifest(path)?;
    let program = Generator::new(&manifest).generate().map_err(generation_error)?;
    Ok((manifest, program))
}

// ============================================================================
// Commands
// ============================================================================

/// Generate converter implementations and write them to `output` (stdout when absent).
pub fn generate(path: &Path, output: Option<&Path>, no_header: bool) -> CliResult<ExitCode> {
    let manifest = load_manifest(path)?;
    let emitter = if no_header {
        TextEmitter::new().without_header()
    } else {
        TextEmitter::new()
    };
    let text = Generator::new(&manifest)
        .render(&emitter)
        .map_err(generation_error)?;

    match output {
        Some(output) => {
            fs::write(output, &text)
                .map_err(|e| CliError::failure(format!("Error writing {}: {}", output.display(), e)))?;
            tracing::info!(output = %output.display(), bytes = text.len(), "converters written");
        }
        None => print!("{}", text),
    }
    Ok(ExitCode::SUCCESS)
}

/// Run synthesis and report the outcome.
pub fn check(path: &Path) -> CliResult<ExitCode> {
    let (_, program) = synthesize(path)?;
    let methods: usize = program.converters.iter().map(|c| c.methods.len()).sum();
    println!(
        "✓ {}: {} converter(s), {} method(s)",
        path.display(),
        program.converters.len(),
        methods
    );
    Ok(ExitCode::SUCCESS)
}

/// Print the synthesized IR as pretty JSON.
pub fn dump_ir(path: &Path) -> CliResult<ExitCode> {
    let (_, program) = synthesize(path)?;
    let json = serde_json::to_string_pretty(&program)
        .map_err(|e| CliError::failure(format!("Error serializing IR: {}", e)))?;
    println!("{}", json);
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// Tests
// ============================================================================

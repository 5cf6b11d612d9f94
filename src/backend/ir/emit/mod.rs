//! Emit source code from the IR.
//!
//! This module defines the [`CodeEmitter`] seam and the reference [`TextEmitter`]. The synthesizer never
//! produces text itself; anything that can render an [`IrProgram`] can serve as a backend.
//!
//! ## Notes
//! - Output is deterministic: converters and methods are emitted in the order the IR lists them, and the
//!   synthesizer sorts methods by name.
//! - Type names from the output package are written unqualified.
//!
//! ## See also
//! - [`statements`]: function and statement emission
//! - [`expressions`]: expression rendering
//! - [`writer`]: indentation-aware buffer

mod errors;
mod expressions;
mod statements;
mod types;
mod writer;

pub use errors::EmitError;
pub use writer::SourceWriter;

use super::decl::IrProgram;
use crate::version::CONVGEN_VERSION;

/// Render a program as source text.
pub trait CodeEmitter {
    fn emit_program(&self, program: &IrProgram) -> Result<String, EmitError>;
}

/// Reference emitter with a Go-like surface syntax.
#[derive(Debug, Clone)]
pub struct TextEmitter {
    header: bool,
}

impl Default for TextEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEmitter {
    pub fn new() -> Self {
        Self { header: true }
    }

    /// Omit the "generated code" header comment.
    pub fn without_header(mut self) -> Self {
        self.header = false;
        self
    }
}

impl CodeEmitter for TextEmitter {
    #[tracing::instrument(skip_all, fields(converters = program.converters.len()))]
    fn emit_program(&self, program: &IrProgram) -> Result<String, EmitError> {
        if program.package.is_empty() {
            return Err(EmitError::MissingPackage);
        }
        let mut w = SourceWriter::new();
        if self.header {
            w.comment(&format!("Code generated by convgen v{}, DO NOT EDIT.", CONVGEN_VERSION));
            w.blank_line();
        }
        w.linef(format_args!("package {}", program.package));

        for converter in &program.converters {
            w.blank_line();
            w.linef(format_args!("type {} struct{{}}", converter.name));
            for method in &converter.methods {
                w.blank_line();
                statements::emit_function(&mut w, &converter.name, method, &program.package)?;
            }
        }
        Ok(w.finish())
    }
}

// ============================================================================
// Tests
// ============================================================================

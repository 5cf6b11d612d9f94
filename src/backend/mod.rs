//! convgen backend
//!
//! This module turns a parsed manifest into source code.
//!
//! The pipeline is:
//! 1. [`ir::Generator`] runs the synthesizer for every converter and collects an [`ir::IrProgram`]
//! 2. A [`ir::CodeEmitter`] renders the program as text
//!
//! ## Module Organization
//!
//! - `ir/` - The abstract code tree and everything around it
//!   - `codegen.rs` - Manifest → IR entrypoint
//!   - `types.rs`, `expr.rs`, `stmt.rs`, `decl.rs` - IR node definitions
//!   - `emit/` - IR → source text

#![deny(clippy::unwrap_used)]

pub mod ir;

pub use ir::{CodeEmitter, GenerationError, Generator, IrProgram, TextEmitter};

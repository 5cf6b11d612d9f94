#![forbid(unsafe_code)]
//! convgen: conversion function synthesis
//!
//! Given a set of declared types and converter interfaces, convgen synthesizes the bodies of the
//! conversion methods: field-by-field struct copies, nil-safe pointer handling, loops over lists and
//! maps, calls into user-supplied extend functions and error propagation for fallible conversions.
//!
//! ```text
//! manifest (JSON) → config → synth::Engine → backend::ir → CodeEmitter → source
//! ```
//!
//! The type model lives in the `convgen_types` crate; this crate holds the synthesizer, the IR and
//! its emitter, and the CLI.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` and `backend` modules
//!   enforce `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **True invariants**: If a panic represents a synthesizer bug (logic error), use `.expect("INVARIANT: reason")`
//!   with a clear explanation.

pub mod backend;
pub mod cli;
pub mod config;
pub mod synth;
pub mod version;

pub use backend::ir::{GenerationError, Generator};
pub use config::{ConfigError, Manifest};
pub use synth::Engine;

pub use convgen_types as types;

//! convgen version information.
//!
//! This module exposes the version as a single constant so the CLI and the generated-code header agree on the
//! same value.

/// The convgen version string (for example, `0.1.0`).
pub const CONVGEN_VERSION: &str = env!("CARGO_PKG_VERSION");

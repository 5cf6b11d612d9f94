//! Structural type model for the convgen conversion synthesizer.
//!
//! This crate owns everything the synthesizer needs to know about types, and nothing about code:
//!
//! - [`RawType`]: unresolved type expressions and their parser
//! - [`TypeArena`]: interned [`TypeDescriptor`]s addressed by [`TypeId`]
//! - field lookup with tag, exact and case-insensitive matching, plus embedded-field promotion
//! - deterministic identifiers derived from types, used to name variables and methods
//!
//! ## Notes
//!
//! - The arena is the only mutable piece of state. It grows when pointer types are created on demand.
//! - Everything here is deterministic: the same declarations always produce the same ids and names.

#![forbid(unsafe_code)]

pub mod arena;
pub mod fields;
pub mod parse;
pub mod raw;
pub mod tags;

pub use arena::{
    ERROR_TYPE, FieldDef, NamedIdent, Shape, TypeArena, TypeDescriptor, TypeError, TypeId, is_exported,
    title,
};
pub use fields::{EmbeddedField, FieldLookupError, FieldMatch, FieldQuery, MAX_EMBEDDED_VISITS};
pub use parse::{MAX_TYPE_DEPTH, ParseTypeError};
pub use raw::{BasicFamily, BasicKind, RawField, RawType};

//! Abstract code tree produced by the synthesizer.
//!
//! The IR is deliberately small: just enough statements and expressions to express field copies,
//! nil guards, loops over lists and maps, calls into other conversions and error propagation. It is
//! independent of any output syntax; [`emit`] turns it into source text.
//!
//! ## Pipeline
//!
//! ```text
//! manifest → config → synth::Engine → IR → CodeEmitter → source
//! ```
//!
//! All IR nodes implement `serde::Serialize` so the tree can be inspected with `convgen dump-ir`.

pub mod codegen;
pub mod decl;
pub mod emit;
pub mod expr;
pub mod stmt;
pub mod types;

pub use codegen::{GenerationError, Generator};
pub use decl::{FunctionParam, IrConverter, IrFunction, IrProgram};
pub use emit::{CodeEmitter, EmitError, TextEmitter};
pub use expr::{BinOp, Callee, IrExpr};
pub use stmt::IrStmt;
pub use types::TypeRef;

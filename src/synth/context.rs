//! Build contexts.
//!
//! Configuration that never changes while a method is built lives in [`MethodPolicy`] and is shared
//! by reference with every nested build. Per-body state (local names, the convention the caller
//! wants, the recorded calls) lives in [`MethodContext`] and is created fresh for each method body.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use convgen_types::TypeId;

use super::extend::ExtendTable;
use super::namer::Namer;
use super::registry::{Convention, ObservedCall, Signature};
use crate::backend::ir::{IrExpr, IrStmt};

/// Receiver variable of every converter method.
pub const THIS: &str = "c";
/// Source parameter name.
pub const IN: &str = "in";
/// Out-parameter name.
pub const OUT: &str = "out";

/// Per-method settings resolved from configuration.
#[derive(Debug, Clone, Default)]
pub struct MethodPolicy {
    /// Converter interface name, for diagnostics.
    pub converter: String,
    /// Declared method the policy belongs to, for diagnostics.
    pub method: String,
    /// Struct whose fields the explicit mappings, ignores and identities refer to.
    pub scope_target: Option<TypeId>,
    /// target field → dotted source path
    pub field_map: HashMap<String, String>,
    pub ignored: HashSet<String>,
    pub identity: HashSet<String>,
    pub case_insensitive: bool,
    /// Skip unmatched and unexported target fields instead of failing.
    pub lenient: bool,
    /// Skip unexported target fields without a warning.
    pub silent_unexported: bool,
    pub tag_search: Vec<String>,
    pub method_extends: Rc<ExtendTable>,
    pub global_extends: Rc<ExtendTable>,
}

impl MethodPolicy {
    /// Whether the field-level settings apply to the struct `target`.
    pub fn applies_to(&self, target: TypeId) -> bool {
        self.scope_target == Some(target)
    }

    pub fn ignored_for(&self, target: TypeId) -> Option<&HashSet<String>> {
        self.applies_to(target).then_some(&self.ignored)
    }
}

/// A reference to a value produced or consumed by generated code.
#[derive(Debug, Clone, PartialEq)]
pub struct Handle {
    pub expr: IrExpr,
    /// The expression names storage and may be addressed (`&x`), as opposed to a call result.
    pub variable: bool,
    /// A pointer already checked against nil by the enclosing code.
    pub non_nil: bool,
}

impl Handle {
    pub fn variable(expr: IrExpr) -> Self {
        Self {
            expr,
            variable: true,
            non_nil: false,
        }
    }

    pub fn other(expr: IrExpr) -> Self {
        Self {
            expr,
            variable: false,
            non_nil: false,
        }
    }

    pub fn checked(self) -> Self {
        Self { non_nil: true, ..self }
    }

    /// Whether dereferencing this pointer needs a nil guard first.
    pub fn may_be_nil(&self) -> bool {
        !self.non_nil && !self.expr.is_addr_of()
    }
}

/// Result of a build: statements to splice in, plus the produced value for value-returning builds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Built {
    pub stmts: Vec<IrStmt>,
    pub handle: Option<Handle>,
}

impl Built {
    pub fn value(stmts: Vec<IrStmt>, handle: Handle) -> Self {
        Self {
            stmts,
            handle: Some(handle),
        }
    }

    pub fn in_place(stmts: Vec<IrStmt>) -> Self {
        Self { stmts, handle: None }
    }
}

/// What the caller of a build wants back.
///
/// For in-place builds `target` designates the target: the pointer to populate when the target
/// type is a pointer, an addressable value otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Want {
    pub convention: Convention,
    pub target: Option<IrExpr>,
}

impl Want {
    pub fn value() -> Self {
        Self {
            convention: Convention::ValueReturn,
            target: None,
        }
    }

    pub fn in_place(target: IrExpr) -> Self {
        Self {
            convention: Convention::OutParam,
            target: Some(target),
        }
    }
}

/// State of the method body currently being built.
#[derive(Debug)]
pub struct MethodContext {
    pub policy: Rc<MethodPolicy>,
    /// The method whose body is being built.
    pub signature: Signature,
    pub namer: Namer,
    pub want: Want,
    pub calls: Vec<ObservedCall>,
}

impl MethodContext {
    pub fn new(policy: Rc<MethodPolicy>, signature: Signature) -> Self {
        Self {
            policy,
            signature,
            namer: Namer::with_reserved([THIS, IN, OUT]),
            want: Want::value(),
            calls: Vec::new(),
        }
    }

    /// Replace the wanted result, returning the previous one for [`MethodContext::restore`].
    pub fn set_want(&mut self, want: Want) -> Want {
        std::mem::replace(&mut self.want, want)
    }

    pub fn restore(&mut self, previous: Want) {
        self.want = previous;
    }
}

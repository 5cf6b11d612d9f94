//! Method registry: every conversion method of one converter, keyed by signature.

use std::collections::HashMap;
use std::rc::Rc;

use convgen_types::TypeId;
use serde::Serialize;

use super::context::MethodPolicy;
use crate::backend::ir::{Callee, IrFunction};

/// Calling convention of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Convention {
    /// `(source) target[, error]`
    ValueReturn,
    /// `(source, *target) [error]`: populates an existing target in place.
    OutParam,
}

/// Registry key. For in-place methods source and target are the structs behind the pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature {
    pub source: TypeId,
    pub target: TypeId,
    pub convention: Convention,
}

impl Signature {
    pub fn new(source: TypeId, target: TypeId, convention: Convention) -> Self {
        Self {
            source,
            target,
            convention,
        }
    }
}

/// A parsed function declaration: a converter method or an extend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredFunction {
    /// Method name, or the qualified function name for extends.
    pub name: String,
    pub source: TypeId,
    /// Result type, or the out-parameter pointer type for in-place declarations.
    pub target: TypeId,
    pub convention: Convention,
    pub fallible: bool,
    pub self_as_first_param: bool,
}

impl DeclaredFunction {
    /// Call spec for using this declaration as an extend.
    pub fn into_extend(self) -> CallSpec {
        CallSpec {
            id: self.name.clone(),
            callee: Callee::Function(self.name),
            source: self.source,
            target: self.target,
            convention: self.convention,
            fallible: self.fallible,
            self_as_first_param: self.self_as_first_param,
            origin: CallOrigin::Extend,
        }
    }
}

/// Where a callable comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOrigin {
    /// A method registered under this signature.
    Method(Signature),
    /// A user-supplied extend function.
    Extend,
}

/// Everything needed to emit a call to a conversion.
#[derive(Debug, Clone)]
pub struct CallSpec {
    /// Human-readable identity used in errors, e.g. `Converter.Convert` or `pkg.ParseId`.
    pub id: String,
    pub callee: Callee,
    /// Declared parameter type.
    pub source: TypeId,
    /// Declared result type (value return) or out-parameter pointer type (in place).
    pub target: TypeId,
    pub convention: Convention,
    pub fallible: bool,
    /// The converter itself is passed as the first argument.
    pub self_as_first_param: bool,
    pub origin: CallOrigin,
}

/// A call recorded while building a body, with the callee's fallibility at that moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedCall {
    Method { signature: Signature, fallible: bool },
    Extend { id: String, fallible: bool },
}

#[derive(Debug, Clone)]
pub struct MethodDefinition {
    pub spec: CallSpec,
    /// Declared by the user, as opposed to synthesized.
    pub explicit: bool,
    /// Static policy the body is built with.
    pub policy: Rc<MethodPolicy>,
    pub body: Option<IrFunction>,
    /// The body is stale and must be rebuilt.
    pub dirty: bool,
    /// Callee that made this method fallible, when it was not declared fallible.
    pub fallibility_origin: Option<String>,
    pub calls: Vec<ObservedCall>,
}

impl MethodDefinition {
    pub fn new(spec: CallSpec, explicit: bool, policy: Rc<MethodPolicy>) -> Self {
        Self {
            spec,
            explicit,
            policy,
            body: None,
            dirty: false,
            fallibility_origin: None,
            calls: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.spec.callee.name()
    }
}

#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: HashMap<Signature, MethodDefinition>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a method. Returns the previous definition if the signature was taken.
    pub fn insert(&mut self, signature: Signature, method: MethodDefinition) -> Option<MethodDefinition> {
        self.methods.insert(signature, method)
    }

    pub fn get(&self, signature: &Signature) -> Option<&MethodDefinition> {
        self.methods.get(signature)
    }

    pub fn get_mut(&mut self, signature: &Signature) -> Option<&mut MethodDefinition> {
        self.methods.get_mut(signature)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// All signatures, ordered by method name.
    pub fn signatures(&self) -> Vec<Signature> {
        let mut entries: Vec<_> = self.methods.iter().map(|(sig, m)| (m.name(), *sig)).collect();
        entries.sort();
        entries.into_iter().map(|(_, sig)| sig).collect()
    }
}

//! User-supplied conversion functions ("extends") and their lookup.
//!
//! An extend matches a requested pair when its declared parameter and result types match one of the
//! source and target variants below. The search order is fixed:
//!
//! 1. source as is, then by reference (`&src`, only for addressable sources), then dereferenced (`*src`)
//! 2. for each source variant, target deliveries in the caller's preferred convention first
//! 3. for each combination, the method-scoped table before the converter-wide one
//!
//! The first hit wins.

use std::collections::HashMap;

use convgen_types::{TypeArena, TypeId};

use super::context::{Handle, MethodPolicy, Want};
use super::registry::{CallSpec, Convention, Signature};
use crate::backend::ir::IrExpr;

/// Extends keyed by their declared `(parameter, result, convention)`.
#[derive(Debug, Default)]
pub struct ExtendTable {
    entries: HashMap<Signature, CallSpec>,
}

impl ExtendTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an extend. A later extend for the same signature replaces the earlier one.
    pub fn insert(&mut self, spec: CallSpec) -> Option<CallSpec> {
        let key = Signature::new(spec.source, spec.target, spec.convention);
        self.entries.insert(key, spec)
    }

    pub fn get(&self, signature: &Signature) -> Option<&CallSpec> {
        self.entries.get(signature)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How the result of a matched extend reaches the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// The call returns the target value.
    Value,
    /// In-place call populating the wanted target pointer.
    Into(IrExpr),
    /// Value call whose result is stored through the wanted target pointer.
    StoreThrough(IrExpr),
    /// In-place call into a fresh zero-valued local of the target type.
    TempValue,
    /// In-place call into a freshly allocated pointee of the pointer target type.
    TempAlloc,
}

#[derive(Debug, Clone)]
pub struct ExtendHit {
    pub spec: CallSpec,
    pub source_arg: IrExpr,
    /// Condition that must hold before the call, when the source was dereferenced.
    pub guard: Option<IrExpr>,
    pub delivery: Delivery,
}

/// Find the extend to use for `source_ty → target_ty`, if any.
pub fn resolve(
    types: &TypeArena,
    policy: &MethodPolicy,
    want: &Want,
    source: &Handle,
    source_ty: TypeId,
    target_ty: TypeId,
) -> Option<ExtendHit> {
    if policy.method_extends.is_empty() && policy.global_extends.is_empty() {
        return None;
    }

    let mut sources = vec![(source_ty, source.expr.clone(), None)];
    if source.variable {
        if let Some(ptr) = types.find_pointer_to(source_ty) {
            sources.push((ptr, source.expr.clone().addr(), None));
        }
    }
    if let Some(inner) = types.deref(source_ty) {
        let guard = source.may_be_nil().then(|| source.expr.clone().not_nil());
        sources.push((inner, source.expr.clone().deref(), guard));
    }

    let mut targets = Vec::new();
    match (&want.convention, &want.target) {
        // `place` is the target itself: the pointer to populate, or an addressable struct value.
        (Convention::OutParam, Some(place)) => match types.deref(target_ty) {
            Some(inner) => {
                targets.push((target_ty, Convention::OutParam, Delivery::Into(place.clone())));
                targets.push((inner, Convention::ValueReturn, Delivery::StoreThrough(place.clone())));
            }
            None => {
                if let Some(ptr) = types.find_pointer_to(target_ty) {
                    targets.push((ptr, Convention::OutParam, Delivery::Into(place.clone().addr())));
                }
                targets.push((target_ty, Convention::ValueReturn, Delivery::StoreThrough(place.clone().addr())));
            }
        },
        _ => {
            targets.push((target_ty, Convention::ValueReturn, Delivery::Value));
            if let Some(ptr) = types.find_pointer_to(target_ty) {
                targets.push((ptr, Convention::OutParam, Delivery::TempValue));
            }
            if types.is_pointer(target_ty) {
                targets.push((target_ty, Convention::OutParam, Delivery::TempAlloc));
            }
        }
    }

    for (param, source_arg, guard) in &sources {
        for (result, convention, delivery) in &targets {
            let key = Signature::new(*param, *result, *convention);
            for table in [&policy.method_extends, &policy.global_extends] {
                if let Some(spec) = table.get(&key) {
                    tracing::trace!(extend = %spec.id, "matched extend");
                    return Some(ExtendHit {
                        spec: spec.clone(),
                        source_arg: source_arg.clone(),
                        guard: guard.clone(),
                        delivery: delivery.clone(),
                    });
                }
            }
        }
    }
    None
}

// ============================================================================
// Tests
// ============================================================================

//! Conversion synthesis.
//!
//! The [`Engine`] turns the declared methods of one converter into method bodies. It owns the type
//! arena and a [`MethodRegistry`], and grows the registry on demand: whenever a nested conversion
//! involves named or in-place struct types, a helper method is synthesized, registered *before* its
//! body is built (so recursive types terminate) and then called.
//!
//! ## Build order
//!
//! [`Engine::build`] resolves a `(source, target)` pair as follows:
//!
//! 1. a matching extend function
//! 2. a registered method for the normalized signature
//! 3. a newly synthesized method, when the pair is nameable
//! 4. the structural rules in [`rules`]
//!
//! ## Fallibility
//!
//! Method bodies are built first, recording every call and the callee fallibility seen at that time.
//! Fallibility is then propagated to a fixed point over the recorded call graph, and only methods whose
//! own fallibility or any observed callee fallibility changed are rebuilt.

pub mod context;
pub mod errors;
pub mod extend;
pub mod fields;
pub mod namer;
pub mod registry;
pub mod rules;

use std::rc::Rc;

use convgen_types::{ERROR_TYPE, TypeArena, TypeId, title};

pub use context::{Built, Handle, IN, MethodContext, MethodPolicy, OUT, THIS, Want};
pub use errors::{ConversionError, DuplicateSignature, ErrorCause, MethodError, PathHop};
pub use extend::{Delivery, ExtendHit, ExtendTable};
pub use namer::Namer;
pub use registry::{
    CallOrigin, CallSpec, Convention, DeclaredFunction, MethodDefinition, MethodRegistry, ObservedCall, Signature,
};

use crate::backend::ir::{Callee, FunctionParam, IrExpr, IrFunction, IrStmt, TypeRef};
use rules::Rule;

/// Synthesizer for the methods of one converter.
#[derive(Debug)]
pub struct Engine {
    types: TypeArena,
    registry: MethodRegistry,
    method_names: Namer,
    impl_name: String,
}

impl Engine {
    pub fn new(types: TypeArena, impl_name: impl Into<String>) -> Self {
        Self {
            types,
            registry: MethodRegistry::new(),
            method_names: Namer::new(),
            impl_name: impl_name.into(),
        }
    }

    pub fn types(&self) -> &TypeArena {
        &self.types
    }

    pub fn types_mut(&mut self) -> &mut TypeArena {
        &mut self.types
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    pub fn impl_name(&self) -> &str {
        &self.impl_name
    }

    pub(crate) fn type_ref(&self, id: TypeId) -> TypeRef {
        TypeRef::new(self.types.key(id))
    }

    /// Register a declared method of interface `interface`.
    ///
    /// In-place methods are keyed by the structs behind their pointers, so `Fill(in A, out *B)` and a
    /// nested in-place need for `*A → *B` share one method. The policy's field-level settings are scoped
    /// to the struct behind the declared target.
    pub fn register_explicit(
        &mut self,
        interface: &str,
        decl: DeclaredFunction,
        mut policy: MethodPolicy,
    ) -> Result<Signature, DuplicateSignature> {
        let signature = match decl.convention {
            Convention::OutParam => match (self.types.struct_of(decl.source), self.types.struct_of(decl.target)) {
                (Some(source), Some(target)) => Signature::new(source, target, Convention::OutParam),
                _ => Signature::new(decl.source, decl.target, Convention::OutParam),
            },
            Convention::ValueReturn => Signature::new(decl.source, decl.target, Convention::ValueReturn),
        };
        let id = format!("{interface}.{}", decl.name);
        if let Some(existing) = self.registry.get(&signature) {
            return Err(DuplicateSignature {
                first: existing.spec.id.clone(),
                second: id,
            });
        }

        policy.scope_target = self.types.struct_of(decl.target);
        self.method_names.reserve(&decl.name);
        let spec = CallSpec {
            id,
            callee: Callee::Method {
                receiver: THIS.to_string(),
                name: decl.name,
            },
            source: decl.source,
            target: decl.target,
            convention: decl.convention,
            fallible: decl.fallible,
            self_as_first_param: false,
            origin: CallOrigin::Method(signature),
        };
        tracing::debug!(method = %spec.id, "registered declared method");
        self.registry
            .insert(signature, MethodDefinition::new(spec, true, Rc::new(policy)));
        Ok(signature)
    }

    /// Build every registered method and return them ordered by name.
    #[tracing::instrument(skip_all, fields(converter = %self.impl_name, declared = self.registry.len()))]
    pub fn create_methods(&mut self) -> Result<Vec<IrFunction>, MethodError> {
        if self.registry.is_empty() {
            tracing::debug!("converter declares no methods");
            return Ok(Vec::new());
        }
        let mut pass = 0usize;
        loop {
            pass += 1;
            for signature in self.registry.signatures() {
                let pending = self
                    .registry
                    .get(&signature)
                    .is_some_and(|m| m.body.is_none() || m.dirty);
                if pending {
                    self.build_method(signature)
                        .map_err(|err| self.method_error(signature, err))?;
                }
            }
            let dirty = self.propagate_fallibility();
            tracing::debug!(pass, dirty, methods = self.registry.len(), "codegen pass finished");
            if dirty == 0 {
                break;
            }
        }

        Ok(self
            .registry
            .signatures()
            .iter()
            .filter_map(|sig| self.registry.get(sig).and_then(|m| m.body.clone()))
            .collect())
    }

    fn method_error(&self, signature: Signature, error: ConversionError) -> MethodError {
        let Some(method) = self.registry.get(&signature) else {
            return MethodError {
                method: self.impl_name.clone(),
                error,
            };
        };
        let hop = PathHop::new(
            "source",
            self.types.key(method.spec.source),
            "target",
            self.types.key(method.spec.target),
        );
        MethodError {
            method: method.spec.id.clone(),
            error: error.lift(hop),
        }
    }

    /// Build (or rebuild) the body of the method registered under `signature`.
    fn build_method(&mut self, signature: Signature) -> Result<(), ConversionError> {
        let Some(method) = self.registry.get(&signature) else {
            return Ok(());
        };
        let spec = method.spec.clone();
        let mut ctx = MethodContext::new(Rc::clone(&method.policy), signature);
        tracing::debug!(method = %spec.id, fallible = spec.fallible, "building method");

        let mut params = vec![FunctionParam::new(IN, self.type_ref(spec.source))];
        let mut results = Vec::new();
        let mut body = Vec::new();
        match spec.convention {
            Convention::ValueReturn => {
                let built = self.build_no_lookup(&mut ctx, Handle::variable(IrExpr::ident(IN)), spec.source, spec.target)?;
                let (stmts, value) = self.expect_value(built, spec.source, spec.target)?;
                body.extend(stmts);
                let mut returned = vec![value.expr];
                if spec.fallible {
                    returned.push(IrExpr::Nil);
                }
                body.push(IrStmt::Return(returned));
                results.push(self.type_ref(spec.target));
            }
            Convention::OutParam => {
                params.push(FunctionParam::new(OUT, self.type_ref(spec.target)));
                body.extend(self.build_in_place_body(&mut ctx, &spec)?);
                if spec.fallible {
                    body.push(IrStmt::Return(vec![IrExpr::Nil]));
                }
            }
        }
        if spec.fallible {
            results.push(TypeRef::new(ERROR_TYPE));
        }

        let function = IrFunction {
            name: spec.callee.name().to_string(),
            receiver: THIS.to_string(),
            params,
            results,
            body,
        };
        if let Some(method) = self.registry.get_mut(&signature) {
            method.body = Some(function);
            method.dirty = false;
            method.calls = ctx.calls;
        }
        Ok(())
    }

    fn build_in_place_body(&mut self, ctx: &mut MethodContext, spec: &CallSpec) -> Result<Vec<IrStmt>, ConversionError> {
        let out = IrExpr::ident(OUT);
        if self.types.struct_of(spec.source).is_some() && self.types.struct_of(spec.target).is_some() {
            let (source, source_ty) = if self.types.is_pointer(spec.source) {
                (Handle::variable(IrExpr::ident(IN)), spec.source)
            } else {
                (Handle::other(IrExpr::ident(IN).addr()), self.types.pointer_to(spec.source))
            };
            ctx.set_want(Want::in_place(out));
            return Ok(self.build_no_lookup(ctx, source, source_ty, spec.target)?.stmts);
        }

        let Some(inner) = self.types.deref(spec.target) else {
            return Err(ConversionError::type_mismatch(
                self.types.key(spec.source),
                self.types.key(spec.target),
            ));
        };
        let (mut stmts, value) = self.build_value(ctx, Handle::variable(IrExpr::ident(IN)), spec.source, inner)?;
        stmts.push(IrStmt::assign(out.deref(), value.expr));
        Ok(stmts)
    }

    /// Produce code converting `source` (of `source_ty`) to `target_ty` as wanted by `ctx.want`.
    pub fn build(
        &mut self,
        ctx: &mut MethodContext,
        source: Handle,
        source_ty: TypeId,
        target_ty: TypeId,
    ) -> Result<Built, ConversionError> {
        if let Some(hit) = extend::resolve(&self.types, &ctx.policy, &ctx.want, &source, source_ty, target_ty) {
            return self.emit_extend(ctx, hit, target_ty);
        }

        let (signature, source_arg, target_arg) = self.normalize(ctx, &source, source_ty, target_ty);
        let spec = match self.registry.get(&signature) {
            Some(method) => method.spec.clone(),
            None if self.is_nameable(&signature) => self.synthesize(ctx, signature, source_ty, target_ty)?,
            None => return self.build_no_lookup(ctx, source, source_ty, target_ty),
        };
        let guard = self.deref_guard(&spec, &source, source_ty);
        let built = self.emit_call(ctx, &spec, source_arg, target_arg)?;
        Ok(match guard {
            Some(guard) => Built::in_place(vec![IrStmt::if_then(guard, built.stmts)]),
            None => built,
        })
    }

    /// Nil guard for a pointer source passed by value to an in-place method.
    fn deref_guard(&self, spec: &CallSpec, source: &Handle, source_ty: TypeId) -> Option<IrExpr> {
        let derefs = matches!(spec.origin, CallOrigin::Method(_))
            && spec.convention == Convention::OutParam
            && !self.types.is_pointer(spec.source);
        (derefs && self.types.is_pointer(source_ty) && source.may_be_nil()).then(|| source.expr.clone().not_nil())
    }

    /// Apply the structural rules directly, without consulting extends or the registry.
    pub fn build_no_lookup(
        &mut self,
        ctx: &mut MethodContext,
        source: Handle,
        source_ty: TypeId,
        target_ty: TypeId,
    ) -> Result<Built, ConversionError> {
        match Rule::select(&self.types, source_ty, target_ty, ctx.want.convention) {
            Some(rule) => {
                tracing::trace!(
                    ?rule,
                    source = self.types.key(source_ty),
                    target = self.types.key(target_ty),
                    "applying rule"
                );
                rule.build(self, ctx, source, source_ty, target_ty)
            }
            None => Err(ConversionError::type_mismatch(
                self.types.key(source_ty),
                self.types.key(target_ty),
            )),
        }
    }

    /// Build with a value wanted, returning the statements and the produced value.
    pub(crate) fn build_value(
        &mut self,
        ctx: &mut MethodContext,
        source: Handle,
        source_ty: TypeId,
        target_ty: TypeId,
    ) -> Result<(Vec<IrStmt>, Handle), ConversionError> {
        let previous = ctx.set_want(Want::value());
        let built = self.build(ctx, source, source_ty, target_ty);
        ctx.restore(previous);
        self.expect_value(built?, source_ty, target_ty)
    }

    /// Build with `place` (a pointer to the target) populated in place.
    pub(crate) fn build_into(
        &mut self,
        ctx: &mut MethodContext,
        source: Handle,
        source_ty: TypeId,
        target_ty: TypeId,
        place: IrExpr,
    ) -> Result<Vec<IrStmt>, ConversionError> {
        let previous = ctx.set_want(Want::in_place(place));
        let built = self.build(ctx, source, source_ty, target_ty);
        ctx.restore(previous);
        Ok(built?.stmts)
    }

    pub(crate) fn expect_value(
        &self,
        built: Built,
        source_ty: TypeId,
        target_ty: TypeId,
    ) -> Result<(Vec<IrStmt>, Handle), ConversionError> {
        match built.handle {
            Some(handle) => Ok((built.stmts, handle)),
            None => Err(ConversionError::type_mismatch(
                self.types.key(source_ty),
                self.types.key(target_ty),
            )),
        }
    }

    /// Registry key and call arguments for a pair. In-place struct pairs are keyed by the structs.
    fn normalize(
        &self,
        ctx: &MethodContext,
        source: &Handle,
        source_ty: TypeId,
        target_ty: TypeId,
    ) -> (Signature, IrExpr, Option<IrExpr>) {
        if ctx.want.convention == Convention::OutParam {
            if let (Some(s), Some(t), Some(place)) = (
                self.types.struct_of(source_ty),
                self.types.struct_of(target_ty),
                ctx.want.target.clone(),
            ) {
                let source_arg = if self.types.is_pointer(source_ty) {
                    source.expr.clone()
                } else {
                    source.expr.clone().addr()
                };
                let target_arg = if self.types.is_pointer(target_ty) { place } else { place.addr() };
                return (Signature::new(s, t, Convention::OutParam), source_arg, Some(target_arg));
            }
        }
        (
            Signature::new(source_ty, target_ty, Convention::ValueReturn),
            source.expr.clone(),
            None,
        )
    }

    /// Whether a missing conversion for `signature` gets its own helper method.
    fn is_nameable(&self, signature: &Signature) -> bool {
        if signature.convention == Convention::OutParam {
            return true;
        }
        let named = |id: TypeId| {
            let descriptor = self.types.get(id);
            descriptor.is_named() && !descriptor.is_basic() && !descriptor.is_interface()
        };
        named(signature.source)
            || named(signature.target)
            || (self.types.is_pointer_to_struct(signature.source) && self.types.is_pointer_to_struct(signature.target))
    }

    fn synthesize(
        &mut self,
        ctx: &MethodContext,
        signature: Signature,
        source_ty: TypeId,
        target_ty: TypeId,
    ) -> Result<CallSpec, ConversionError> {
        let (source, target, verb) = match signature.convention {
            Convention::OutParam => (
                self.types.pointer_to(signature.source),
                self.types.pointer_to(signature.target),
                "Into",
            ),
            Convention::ValueReturn => (source_ty, target_ty, "To"),
        };
        let base = format!(
            "{}{}{}",
            self.types.unescaped_ident(signature.source),
            verb,
            title(&self.types.unescaped_ident(signature.target))
        );
        let name = self.method_names.name(&base);
        let spec = CallSpec {
            id: format!("{}.{}", self.impl_name, name),
            callee: Callee::Method {
                receiver: THIS.to_string(),
                name,
            },
            source,
            target,
            convention: signature.convention,
            fallible: false,
            self_as_first_param: false,
            origin: CallOrigin::Method(signature),
        };
        tracing::debug!(method = %spec.id, "synthesizing method");
        self.registry
            .insert(signature, MethodDefinition::new(spec.clone(), false, Rc::clone(&ctx.policy)));
        self.build_method(signature)?;
        Ok(spec)
    }

    fn emit_extend(&mut self, ctx: &mut MethodContext, hit: ExtendHit, target_ty: TypeId) -> Result<Built, ConversionError> {
        let ExtendHit {
            spec,
            source_arg,
            guard,
            delivery,
        } = hit;
        let built = match delivery {
            Delivery::Value => self.emit_call(ctx, &spec, source_arg, None)?,
            Delivery::Into(place) => self.emit_call(ctx, &spec, source_arg, Some(place))?,
            Delivery::StoreThrough(place) => {
                let built = self.emit_call(ctx, &spec, source_arg, None)?;
                let (mut stmts, value) = self.expect_value(built, spec.source, spec.target)?;
                stmts.push(IrStmt::assign(place.deref(), value.expr));
                Built::in_place(stmts)
            }
            Delivery::TempValue => {
                let name = ctx.namer.name(&self.types.ident(target_ty));
                let mut stmts = vec![IrStmt::var(name.clone(), self.type_ref(target_ty))];
                let call = self.emit_call(ctx, &spec, source_arg, Some(IrExpr::ident(&name).addr()))?;
                stmts.extend(call.stmts);
                Built::value(stmts, Handle::variable(IrExpr::ident(name)))
            }
            Delivery::TempAlloc => {
                let Some(inner) = self.types.deref(target_ty) else {
                    return Err(ConversionError::type_mismatch(
                        self.types.key(spec.source),
                        self.types.key(target_ty),
                    ));
                };
                let name = ctx.namer.name(&self.types.ident(target_ty));
                let mut stmts = vec![IrStmt::define(vec![name.clone()], IrExpr::New(self.type_ref(inner)))];
                let call = self.emit_call(ctx, &spec, source_arg, Some(IrExpr::ident(&name)))?;
                stmts.extend(call.stmts);
                Built::value(stmts, Handle::variable(IrExpr::ident(name)))
            }
        };

        let Some(guard) = guard else {
            return Ok(built);
        };
        match built.handle {
            None => Ok(Built::in_place(vec![IrStmt::if_then(guard, built.stmts)])),
            Some(handle) => {
                let name = ctx.namer.name(&self.types.ident(target_ty));
                let mut guarded = built.stmts;
                guarded.push(IrStmt::assign(IrExpr::ident(&name), handle.expr));
                Ok(Built::value(
                    vec![
                        IrStmt::var(name.clone(), self.type_ref(target_ty)),
                        IrStmt::if_then(guard, guarded),
                    ],
                    Handle::variable(IrExpr::ident(name)),
                ))
            }
        }
    }

    /// Emit a call to `spec`, with error propagation when it is fallible.
    fn emit_call(
        &mut self,
        ctx: &mut MethodContext,
        spec: &CallSpec,
        source_arg: IrExpr,
        target_arg: Option<IrExpr>,
    ) -> Result<Built, ConversionError> {
        if spec.fallible {
            self.check_fallible_call(ctx, spec)?;
        }
        ctx.calls.push(match spec.origin {
            CallOrigin::Method(signature) => ObservedCall::Method {
                signature,
                fallible: spec.fallible,
            },
            CallOrigin::Extend => ObservedCall::Extend {
                id: spec.id.clone(),
                fallible: spec.fallible,
            },
        });

        let in_place = spec.convention == Convention::OutParam;
        let source_arg = match spec.origin {
            CallOrigin::Method(_) if in_place && !self.types.is_pointer(spec.source) => source_arg.deref(),
            _ => source_arg,
        };
        let mut args = Vec::with_capacity(3);
        if spec.self_as_first_param {
            args.push(IrExpr::ident(THIS));
        }
        args.push(source_arg);
        if in_place {
            let Some(target_arg) = target_arg else {
                return Err(ConversionError::type_mismatch(
                    self.types.key(spec.source),
                    self.types.key(spec.target),
                ));
            };
            args.push(target_arg);
        }
        let call = IrExpr::call(spec.callee.clone(), args);

        match (in_place, spec.fallible) {
            (true, false) => Ok(Built::in_place(vec![IrStmt::Expr(call)])),
            (false, false) => Ok(Built::value(Vec::new(), Handle::other(call))),
            (true, true) => {
                let err = ctx.namer.name("err");
                let on_error = self.error_return(ctx, &err);
                Ok(Built::in_place(vec![
                    IrStmt::define(vec![err.clone()], call),
                    IrStmt::if_then(IrExpr::ident(err).not_nil(), on_error),
                ]))
            }
            (false, true) => {
                let value = ctx.namer.name(&self.types.ident(spec.target));
                let err = ctx.namer.name("err");
                let on_error = self.error_return(ctx, &err);
                Ok(Built::value(
                    vec![
                        IrStmt::define(vec![value.clone(), err.clone()], call),
                        IrStmt::if_then(IrExpr::ident(err).not_nil(), on_error),
                    ],
                    Handle::variable(IrExpr::ident(value)),
                ))
            }
        }
    }

    /// A declared method without an error result must not call anything fallible.
    fn check_fallible_call(&self, ctx: &MethodContext, callee: &CallSpec) -> Result<(), ConversionError> {
        let Some(current) = self.registry.get(&ctx.signature) else {
            return Ok(());
        };
        if !current.explicit || current.spec.fallible {
            return Ok(());
        }
        let origin = match callee.origin {
            CallOrigin::Method(signature) => self
                .registry
                .get(&signature)
                .and_then(|m| m.fallibility_origin.clone()),
            CallOrigin::Extend => None,
        }
        .unwrap_or_else(|| callee.id.clone());
        Err(ErrorCause::ReturnTypeMismatch {
            callee: callee.id.clone(),
            method: current.spec.id.clone(),
            origin,
        }
        .into())
    }

    /// Statements returning `err` from the method being built.
    fn error_return(&self, ctx: &mut MethodContext, err: &str) -> Vec<IrStmt> {
        let value_target = self
            .registry
            .get(&ctx.signature)
            .filter(|m| m.spec.convention == Convention::ValueReturn)
            .map(|m| m.spec.target);
        match value_target {
            Some(target) => {
                let zero = ctx.namer.name("errValue");
                vec![
                    IrStmt::var(zero.clone(), self.type_ref(target)),
                    IrStmt::Return(vec![IrExpr::ident(zero), IrExpr::ident(err)]),
                ]
            }
            None => vec![IrStmt::Return(vec![IrExpr::ident(err)])],
        }
    }

    /// Return statement leaving an in-place method early without an error.
    pub(crate) fn early_return(&self, ctx: &MethodContext) -> IrStmt {
        let fallible = self
            .registry
            .get(&ctx.signature)
            .is_some_and(|m| m.spec.fallible);
        if fallible {
            IrStmt::Return(vec![IrExpr::Nil])
        } else {
            IrStmt::Return(Vec::new())
        }
    }

    /// Propagate fallibility to a fixed point and mark stale bodies dirty. Returns the dirty count.
    fn propagate_fallibility(&mut self) -> usize {
        let signatures = self.registry.signatures();
        for _ in 0..=signatures.len() {
            let mut changed = false;
            for signature in &signatures {
                let Some(method) = self.registry.get(signature) else {
                    continue;
                };
                if method.explicit || method.spec.fallible {
                    continue;
                }
                let origin = method.calls.iter().find_map(|call| match call {
                    ObservedCall::Method { signature: callee, .. } => self
                        .registry
                        .get(callee)
                        .filter(|m| m.spec.fallible)
                        .map(|m| m.fallibility_origin.clone().unwrap_or_else(|| m.spec.id.clone())),
                    ObservedCall::Extend { id, fallible: true } => Some(id.clone()),
                    ObservedCall::Extend { .. } => None,
                });
                let Some(origin) = origin else {
                    continue;
                };
                if let Some(method) = self.registry.get_mut(signature) {
                    tracing::debug!(method = %method.spec.id, origin = %origin, "method became fallible");
                    method.spec.fallible = true;
                    method.fallibility_origin = Some(origin);
                    method.dirty = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        let stale: Vec<Signature> = signatures
            .iter()
            .copied()
            .filter(|signature| {
                self.registry.get(signature).is_some_and(|method| {
                    method.calls.iter().any(|call| match call {
                        ObservedCall::Method { signature, fallible } => self
                            .registry
                            .get(signature)
                            .is_some_and(|callee| callee.spec.fallible != *fallible),
                        ObservedCall::Extend { .. } => false,
                    })
                })
            })
            .collect();
        for signature in &stale {
            if let Some(method) = self.registry.get_mut(signature) {
                method.dirty = true;
            }
        }

        signatures
            .iter()
            .filter(|signature| self.registry.get(signature).is_some_and(|m| m.dirty))
            .count()
    }
}

// ============================================================================
// Tests
// ============================================================================

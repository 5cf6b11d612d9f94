//! Structural conversion rules.
//!
//! [`Rule::select`] is a closed dispatch over the shapes of the pair and the wanted convention; the
//! first arm that matches wins. Rules never consult extends or the registry themselves: every
//! nested conversion goes back through [`Engine::build`].

mod basic;
mod list;
mod map;
mod pointer;
mod structs;

use convgen_types::{Shape, TypeArena, TypeId};

use super::Engine;
use super::context::{Built, Handle, MethodContext, Want};
use super::errors::{ConversionError, PathHop};
use super::extend;
use super::registry::Convention;
use crate::backend::ir::{IrExpr, IrStmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// `*S → *T` structs, populating the wanted target in place.
    InPlaceStruct,
    /// `S → T` structs by value.
    Struct,
    /// `*S → T` structs; a nil source yields the zero target.
    TargetStruct,
    /// `*S → T` for anything else; a nil source yields the zero target.
    SourcePointer,
    /// `*S → *T`; a nil source yields a nil target.
    Pointer,
    /// `S → *T`
    TargetPointer,
    /// Compatible basic kinds, and identical interfaces.
    Basic,
    /// Slices and arrays into slices.
    List,
    Map,
}

impl Rule {
    pub fn select(types: &TypeArena, source: TypeId, target: TypeId, convention: Convention) -> Option<Rule> {
        if convention == Convention::OutParam && types.is_pointer_to_struct(source) && types.is_pointer_to_struct(target) {
            return Some(Rule::InPlaceStruct);
        }
        let rule = match (types.get(source).shape(), types.get(target).shape()) {
            (Shape::Struct(_), Shape::Struct(_)) => Rule::Struct,
            (Shape::Pointer(_), Shape::Struct(_)) if types.is_pointer_to_struct(source) => Rule::TargetStruct,
            (Shape::Pointer(_), Shape::Pointer(_)) => Rule::Pointer,
            (Shape::Pointer(_), _) => Rule::SourcePointer,
            (_, Shape::Pointer(_)) => Rule::TargetPointer,
            (Shape::Basic(from), Shape::Basic(to)) if from.convertible_to(*to) => Rule::Basic,
            (Shape::Interface, Shape::Interface) if source == target => Rule::Basic,
            (Shape::List { .. }, Shape::List { len: None, .. }) => Rule::List,
            (Shape::Map { .. }, Shape::Map { .. }) => Rule::Map,
            _ => return None,
        };
        Some(rule)
    }

    pub fn build(
        self,
        engine: &mut Engine,
        ctx: &mut MethodContext,
        source: Handle,
        source_ty: TypeId,
        target_ty: TypeId,
    ) -> Result<Built, ConversionError> {
        match self {
            Rule::InPlaceStruct => structs::build_in_place(engine, ctx, source, source_ty, target_ty),
            Rule::Struct => structs::build_struct(engine, ctx, source, source_ty, target_ty),
            Rule::TargetStruct => structs::build_target_struct(engine, ctx, source, source_ty, target_ty),
            Rule::SourcePointer => pointer::build_source_pointer(engine, ctx, source, source_ty, target_ty),
            Rule::Pointer => pointer::build_pointer(engine, ctx, source, source_ty, target_ty),
            Rule::TargetPointer => pointer::build_target_pointer(engine, ctx, source, source_ty, target_ty),
            Rule::Basic => Ok(basic::build(engine, source, source_ty, target_ty)),
            Rule::List => list::build(engine, ctx, source, source_ty, target_ty),
            Rule::Map => map::build(engine, ctx, source, source_ty, target_ty),
        }
    }
}

/// Convert `source` and store the result in `place`, an lvalue of `target_ty`.
///
/// Struct targets are populated in place. Pointer-to-struct targets are allocated and then
/// populated in place, inside a nil guard when the source is a pointer, unless an extend
/// produces the pointer directly.
pub(crate) fn assign_into(
    engine: &mut Engine,
    ctx: &mut MethodContext,
    source: Handle,
    source_ty: TypeId,
    target_ty: TypeId,
    place: IrExpr,
) -> Result<Vec<IrStmt>, ConversionError> {
    let types = engine.types();
    let source_is_struct = types.struct_of(source_ty).is_some();

    if source_is_struct && types.is_struct(target_ty) {
        return engine.build_into(ctx, source, source_ty, target_ty, place);
    }

    if source_is_struct
        && types.is_pointer_to_struct(target_ty)
        && extend::resolve(types, &ctx.policy, &Want::value(), &source, source_ty, target_ty).is_none()
    {
        let inner_ty = types.deref(target_ty);
        let guard = (types.is_pointer(source_ty) && source.may_be_nil()).then(|| source.expr.clone().not_nil());
        let Some(inner_ty) = inner_ty else {
            return Err(mismatch(engine, source_ty, target_ty));
        };
        let mut stmts = vec![IrStmt::assign(place.clone(), IrExpr::New(engine.type_ref(inner_ty)))];
        stmts.extend(engine.build_into(ctx, source, source_ty, target_ty, place)?);
        return Ok(match guard {
            Some(guard) => vec![IrStmt::if_then(guard, stmts)],
            None => stmts,
        });
    }

    let (mut stmts, value) = engine.build_value(ctx, source, source_ty, target_ty)?;
    stmts.push(IrStmt::assign(place, value.expr));
    Ok(stmts)
}

/// An expression that may be addressed, copying non-addressable values into a temporary.
pub(crate) fn addressable(engine: &Engine, ctx: &mut MethodContext, value: Handle, ty: TypeId) -> (Vec<IrStmt>, IrExpr) {
    if value.variable {
        return (Vec::new(), value.expr);
    }
    let temp = ctx.namer.name(&engine.types().ident(ty));
    (
        vec![IrStmt::define(vec![temp.clone()], value.expr)],
        IrExpr::ident(temp),
    )
}

pub(crate) fn mismatch(engine: &Engine, source_ty: TypeId, target_ty: TypeId) -> ConversionError {
    ConversionError::type_mismatch(engine.types().key(source_ty), engine.types().key(target_ty))
}

/// Hop for a nested conversion whose accessors are the same on both sides (`*`, `[]`, ...).
pub(crate) fn hop(engine: &Engine, accessor: &str, source_ty: TypeId, target_ty: TypeId) -> PathHop {
    PathHop::new(
        accessor,
        engine.types().key(source_ty),
        accessor,
        engine.types().key(target_ty),
    )
}

// ============================================================================
// Tests
// ============================================================================

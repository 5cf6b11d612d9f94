//! Pointer rules. A nil source never allocates.

use convgen_types::TypeId;

use super::{hop, mismatch};
use crate::backend::ir::{IrExpr, IrStmt};
use crate::synth::Engine;
use crate::synth::context::{Built, Handle, MethodContext};
use crate::synth::errors::ConversionError;

/// `*S → *T`
pub(super) fn build_pointer(
    engine: &mut Engine,
    ctx: &mut MethodContext,
    source: Handle,
    source_ty: TypeId,
    target_ty: TypeId,
) -> Result<Built, ConversionError> {
    let types = engine.types();
    let (Some(source_inner), Some(target_inner)) = (types.deref(source_ty), types.deref(target_ty)) else {
        return Err(mismatch(engine, source_ty, target_ty));
    };
    let both_structs = types.is_struct(source_inner) && types.is_struct(target_inner);

    let name = ctx.namer.name(&engine.types().ident(target_ty));
    let target = IrExpr::ident(&name);
    let mut guarded = Vec::new();
    if both_structs {
        guarded.push(IrStmt::assign(target.clone(), IrExpr::New(engine.type_ref(target_inner))));
        guarded.extend(
            engine
                .build_into(ctx, source.clone().checked(), source_ty, target_ty, target.clone())
                .map_err(|err| err.lift(hop(engine, "*", source_ty, target_ty)))?,
        );
    } else {
        let deref = source.expr.clone().deref();
        let (stmts, value) = engine
            .build_value(ctx, Handle::variable(deref.clone()), source_inner, target_inner)
            .map_err(|err| err.lift(hop(engine, "*", source_inner, target_inner)))?;
        guarded.extend(stmts);
        let (copy, addr) = fresh_address(engine, ctx, value, &deref, target_inner);
        guarded.extend(copy);
        guarded.push(IrStmt::assign(target.clone(), addr));
    }

    let stmts = vec![
        IrStmt::var(name, engine.type_ref(target_ty)),
        IrStmt::if_then(source.expr.not_nil(), guarded),
    ];
    Ok(Built::value(stmts, Handle::variable(target)))
}

/// `S → *T`
pub(super) fn build_target_pointer(
    engine: &mut Engine,
    ctx: &mut MethodContext,
    source: Handle,
    source_ty: TypeId,
    target_ty: TypeId,
) -> Result<Built, ConversionError> {
    let Some(target_inner) = engine.types().deref(target_ty) else {
        return Err(mismatch(engine, source_ty, target_ty));
    };

    if engine.types().is_struct(source_ty) && engine.types().is_struct(target_inner) {
        let name = ctx.namer.name(&engine.types().ident(target_ty));
        let target = IrExpr::ident(&name);
        let mut stmts = vec![IrStmt::define(
            vec![name],
            IrExpr::New(engine.type_ref(target_inner)),
        )];
        stmts.extend(
            engine
                .build_into(ctx, source, source_ty, target_ty, target.clone())
                .map_err(|err| err.lift(hop(engine, "*", source_ty, target_ty)))?,
        );
        return Ok(Built::value(stmts, Handle::variable(target)));
    }

    let input = source.expr.clone();
    let (mut stmts, value) = engine
        .build_value(ctx, source, source_ty, target_inner)
        .map_err(|err| err.lift(hop(engine, "*", source_ty, target_inner)))?;
    let (copy, addr) = fresh_address(engine, ctx, value, &input, target_inner);
    stmts.extend(copy);
    Ok(Built::value(stmts, Handle::other(addr)))
}

/// `*S → T`: the zero target unless the source is non-nil.
pub(super) fn build_source_pointer(
    engine: &mut Engine,
    ctx: &mut MethodContext,
    source: Handle,
    source_ty: TypeId,
    target_ty: TypeId,
) -> Result<Built, ConversionError> {
    let Some(source_inner) = engine.types().deref(source_ty) else {
        return Err(mismatch(engine, source_ty, target_ty));
    };
    let name = ctx.namer.name(&engine.types().ident(target_ty));
    let target = IrExpr::ident(&name);

    let deref = Handle::variable(source.expr.clone().deref());
    let (mut guarded, value) = engine
        .build_value(ctx, deref, source_inner, target_ty)
        .map_err(|err| err.lift(hop(engine, "*", source_inner, target_ty)))?;
    guarded.push(IrStmt::assign(target.clone(), value.expr));

    let stmts = vec![
        IrStmt::var(name, engine.type_ref(target_ty)),
        IrStmt::if_then(source.expr.not_nil(), guarded),
    ];
    Ok(Built::value(stmts, Handle::variable(target)))
}

/// The address of a copy of `value`, so the target never aliases source memory.
///
/// A local computed by the nested build (anything but the `input` passed through) is addressed
/// directly.
fn fresh_address(
    engine: &Engine,
    ctx: &mut MethodContext,
    value: Handle,
    input: &IrExpr,
    ty: TypeId,
) -> (Vec<IrStmt>, IrExpr) {
    if matches!(value.expr, IrExpr::Ident(_)) && value.expr != *input {
        return (Vec::new(), value.expr.addr());
    }
    let temp = ctx.namer.name(&engine.types().ident(ty));
    (
        vec![IrStmt::define(vec![temp.clone()], value.expr)],
        IrExpr::ident(temp).addr(),
    )
}

// ============================================================================
// Tests
// ============================================================================

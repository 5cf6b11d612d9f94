//! Struct population.

use std::rc::Rc;

use convgen_types::{FieldDef, TypeId};

use super::{addressable, assign_into, mismatch};
use crate::backend::ir::{IrExpr, IrStmt};
use crate::synth::Engine;
use crate::synth::context::{Built, Handle, MethodContext};
use crate::synth::errors::{ConversionError, ErrorCause, PathHop};
use crate::synth::fields::{MappedField, map_field, member};

/// Populate the wanted target pointer field by field.
///
/// Only reached at the top of an in-place method body, so a nil source or target returns early.
pub(super) fn build_in_place(
    engine: &mut Engine,
    ctx: &mut MethodContext,
    source: Handle,
    source_ty: TypeId,
    target_ty: TypeId,
) -> Result<Built, ConversionError> {
    let types = engine.types();
    let (Some(target), Some(_), Some(target_struct)) = (
        ctx.want.target.clone(),
        types.struct_of(source_ty),
        types.struct_of(target_ty),
    ) else {
        return Err(mismatch(engine, source_ty, target_ty));
    };
    let source_key = types.key(source_ty).to_string();
    let target_key = types.key(target_struct).to_string();
    let fields: Vec<FieldDef> = types.struct_fields(target_struct).map(<[FieldDef]>::to_vec).unwrap_or_default();

    let mut stmts = Vec::new();
    let nil_check = [&source.expr, &target]
        .into_iter()
        .filter(|expr| !expr.is_addr_of())
        .map(|expr| expr.clone().is_nil())
        .reduce(IrExpr::or);
    if let Some(nil_check) = nil_check {
        stmts.push(IrStmt::if_then(nil_check, vec![engine.early_return(ctx)]));
    }
    let source = source.checked();

    let policy = Rc::clone(&ctx.policy);
    let scoped = policy.applies_to(target_struct);
    for field in &fields {
        if scoped && policy.ignored.contains(&field.name) {
            continue;
        }
        let field_key = engine.types().key(field.ty).to_string();

        if !field.is_exported() {
            if policy.silent_unexported {
                continue;
            }
            if policy.lenient {
                tracing::warn!(
                    converter = %policy.converter,
                    method = %policy.method,
                    field = %field.name,
                    target = %target_key,
                    "skipping unexported target field"
                );
                continue;
            }
            return Err(ConversionError::from(ErrorCause::UnexportedField {
                field: field.name.clone(),
                target_type: target_key,
            })
            .lift(PathHop::new("???", source_key, format!(".{}", field.name), field_key)));
        }

        let whole_source = || MappedField {
            stmts: Vec::new(),
            access: source.clone(),
            ty: source_ty,
            label: String::new(),
        };
        let mapped = if scoped && policy.identity.contains(&field.name) {
            whole_source()
        } else {
            match map_field(engine, ctx, field, target_struct, &source, source_ty) {
                Ok(mapped) => mapped,
                Err(err) if field.embedded && err.is_skippable() => whole_source(),
                Err(err) if policy.lenient && err.is_skippable() => {
                    tracing::warn!(
                        converter = %policy.converter,
                        method = %policy.method,
                        field = %field.name,
                        target = %target_key,
                        error = %err.cause,
                        "skipping unmatched target field"
                    );
                    continue;
                }
                Err(err) => {
                    return Err(err.lift(PathHop::new(
                        "???",
                        source_key,
                        format!(".{}", field.name),
                        field_key,
                    )));
                }
            }
        };

        let hop = PathHop::new(
            mapped.label.clone(),
            engine.types().key(mapped.ty),
            format!(".{}", field.name),
            field_key,
        );
        stmts.extend(mapped.stmts);
        let place = member(&target, &field.name);
        let assigned =
            assign_into(engine, ctx, mapped.access, mapped.ty, field.ty, place).map_err(|err| err.lift(hop))?;
        stmts.extend(assigned);
    }
    Ok(Built::in_place(stmts))
}

/// `S → T`: a zero target populated in place through its address.
pub(super) fn build_struct(
    engine: &mut Engine,
    ctx: &mut MethodContext,
    source: Handle,
    source_ty: TypeId,
    target_ty: TypeId,
) -> Result<Built, ConversionError> {
    let (mut stmts, source_expr) = addressable(engine, ctx, source, source_ty);
    let source_ptr = engine.types_mut().pointer_to(source_ty);
    let source = Handle::other(source_expr.addr());
    let (decl, target) = zero_target(engine, ctx, target_ty);
    stmts.push(decl);
    stmts.extend(populate(engine, ctx, source, source_ptr, target_ty, &target)?);
    Ok(Built::value(stmts, Handle::variable(target)))
}

/// `*S → T`: like [`build_struct`]; the in-place method leaves the target zero for a nil source.
pub(super) fn build_target_struct(
    engine: &mut Engine,
    ctx: &mut MethodContext,
    source: Handle,
    source_ty: TypeId,
    target_ty: TypeId,
) -> Result<Built, ConversionError> {
    let (decl, target) = zero_target(engine, ctx, target_ty);
    let mut stmts = vec![decl];
    stmts.extend(populate(engine, ctx, source, source_ty, target_ty, &target)?);
    Ok(Built::value(stmts, Handle::variable(target)))
}

fn zero_target(engine: &Engine, ctx: &mut MethodContext, target_ty: TypeId) -> (IrStmt, IrExpr) {
    let name = ctx.namer.name(&engine.types().ident(target_ty));
    (IrStmt::var(name.clone(), engine.type_ref(target_ty)), IrExpr::ident(name))
}

fn populate(
    engine: &mut Engine,
    ctx: &mut MethodContext,
    source: Handle,
    source_ty: TypeId,
    target_ty: TypeId,
    target: &IrExpr,
) -> Result<Vec<IrStmt>, ConversionError> {
    let target_ptr = engine.types_mut().pointer_to(target_ty);
    engine.build_into(ctx, source, source_ty, target_ptr, target.clone().addr())
}

//! Slices and arrays.

use convgen_types::{Shape, TypeId};

use super::{addressable, assign_into, hop, mismatch};
use crate::backend::ir::{IrExpr, IrStmt};
use crate::synth::Engine;
use crate::synth::context::{Built, Handle, MethodContext};
use crate::synth::errors::ConversionError;

/// `[]S → []T` (or `[N]S → []T`): a slice of the same length, converted element by element.
///
/// A nil source slice stays nil.
pub(super) fn build(
    engine: &mut Engine,
    ctx: &mut MethodContext,
    source: Handle,
    source_ty: TypeId,
    target_ty: TypeId,
) -> Result<Built, ConversionError> {
    let types = engine.types();
    let (Shape::List { elem: source_elem, len }, Shape::List { elem: target_elem, .. }) =
        (types.get(source_ty).shape(), types.get(target_ty).shape())
    else {
        return Err(mismatch(engine, source_ty, target_ty));
    };
    let (source_elem, target_elem, is_array) = (*source_elem, *target_elem, len.is_some());

    let (mut stmts, list) = addressable(engine, ctx, source, source_ty);
    let name = ctx.namer.name(&engine.types().ident(target_ty));
    let index = ctx.namer.index();
    let target = IrExpr::ident(&name);

    let element = Handle::variable(list.clone().index(IrExpr::ident(&index)));
    let place = target.clone().index(IrExpr::ident(&index));
    let body = assign_into(engine, ctx, element, source_elem, target_elem, place)
        .map_err(|err| err.lift(hop(engine, "[]", source_elem, target_elem)))?;

    let fill = vec![
        IrStmt::assign(
            target.clone(),
            IrExpr::MakeList {
                ty: engine.type_ref(target_ty),
                len: Box::new(IrExpr::len(list.clone())),
            },
        ),
        IrStmt::ForIndex {
            index,
            bound: IrExpr::len(list.clone()),
            body,
        },
    ];

    stmts.push(IrStmt::var(name, engine.type_ref(target_ty)));
    if is_array {
        stmts.extend(fill);
    } else {
        stmts.push(IrStmt::if_then(list.not_nil(), fill));
    }
    Ok(Built::value(stmts, Handle::variable(target)))
}

// ============================================================================
// Tests
// ============================================================================

use convgen_types::{Shape, TypeId};

use super::{addressable, assign_into, hop, mismatch};
use crate::backend::ir::{IrExpr, IrStmt};
use crate::synth::Engine;
use crate::synth::context::{Built, Handle, MethodContext};
use crate::synth::errors::ConversionError;

/// `map[K]V → map[K2]V2`, entry by entry. A nil source map stays nil.
pub(super) fn build(
    engine: &mut Engine,
    ctx: &mut MethodContext,
    source: Handle,
    source_ty: TypeId,
    target_ty: TypeId,
) -> Result<Built, ConversionError> {
    let types = engine.types();
    let (
        Shape::Map {
            key: source_key,
            value: source_value,
        },
        Shape::Map {
            key: target_key,
            value: target_value,
        },
    ) = (types.get(source_ty).shape(), types.get(target_ty).shape())
    else {
        return Err(mismatch(engine, source_ty, target_ty));
    };
    let (source_key, source_value, target_key, target_value) = (*source_key, *source_value, *target_key, *target_value);
    let value_is_struct = types.is_struct(target_value);

    let (mut stmts, map) = addressable(engine, ctx, source, source_ty);
    let name = ctx.namer.name(&engine.types().ident(target_ty));
    let key = ctx.namer.name("key");
    let value = ctx.namer.name("value");
    let target = IrExpr::ident(&name);

    let key_hop = hop(engine, "[key]", source_key, target_key);
    let (mut body, converted_key) = engine
        .build_value(ctx, Handle::variable(IrExpr::ident(&key)), source_key, target_key)
        .map_err(|err| err.lift(key_hop))?;

    let value_hop = hop(engine, "[value]", source_value, target_value);
    let source_value_handle = Handle::variable(IrExpr::ident(&value));
    let entry = target.clone().index(converted_key.expr);
    if value_is_struct {
        // map entries are not addressable, populate a local first
        let temp = ctx.namer.name(&engine.types().ident(target_value));
        body.push(IrStmt::var(temp.clone(), engine.type_ref(target_value)));
        body.extend(
            assign_into(engine, ctx, source_value_handle, source_value, target_value, IrExpr::ident(&temp))
                .map_err(|err| err.lift(value_hop))?,
        );
        body.push(IrStmt::assign(entry, IrExpr::ident(temp)));
    } else {
        body.extend(
            assign_into(engine, ctx, source_value_handle, source_value, target_value, entry)
                .map_err(|err| err.lift(value_hop))?,
        );
    }

    stmts.push(IrStmt::var(name, engine.type_ref(target_ty)));
    stmts.push(IrStmt::if_then(
        map.clone().not_nil(),
        vec![
            IrStmt::assign(
                target.clone(),
                IrExpr::MakeMap {
                    ty: engine.type_ref(target_ty),
                    capacity: Box::new(IrExpr::len(map.clone())),
                },
            ),
            IrStmt::ForRange {
                key,
                value,
                iterable: map,
                body,
            },
        ],
    ));
    Ok(Built::value(stmts, Handle::variable(target)))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use convgen_types::TypeArena;

    use super::*;
    use crate::synth::context::{IN, MethodPolicy};
    use crate::synth::registry::{Convention, Signature};

    #[test]
    fn test_map_entries_are_converted() {
        let mut types = TypeArena::new();
        let s = types.parse("map[string]int32").unwrap();
        let t = types.parse("map[string]int64").unwrap();
        let mut ctx = MethodContext::new(
            Rc::new(MethodPolicy::default()),
            Signature::new(s, t, Convention::ValueReturn),
        );
        let mut engine = Engine::new(types, "ConverterImpl");
        let built = build(&mut engine, &mut ctx, Handle::variable(IrExpr::ident(IN)), s, t).unwrap();

        let int64 = engine.types().lookup("int64").unwrap();
        let [IrStmt::Var { name, .. }, IrStmt::If { then_branch, .. }] = built.stmts.as_slice() else {
            panic!("unexpected statements: {:?}", built.stmts);
        };
        assert_eq!(name, "mapStringInt64");
        let IrStmt::ForRange { key, value, body, .. } = &then_branch[1] else {
            panic!("expected range loop");
        };
        assert_eq!((key.as_str(), value.as_str()), ("key", "value"));
        assert_eq!(
            body,
            &vec![IrStmt::assign(
                IrExpr::ident("mapStringInt64").index(IrExpr::ident("key")),
                IrExpr::convert(engine.type_ref(int64), IrExpr::ident("value")),
            )]
        );
    }
}

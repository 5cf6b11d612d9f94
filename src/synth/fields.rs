//! Target field → source access resolution.
//!
//! A target field is matched, in order, by an explicit dotted mapping (only for the struct the
//! declared method populates), by the default lookup on the source struct, and finally through the
//! source's embedded members. Paths that cross pointers are guarded: the access is materialized
//! into a pointer temporary that stays nil unless every pointer on the way is non-nil.

use std::rc::Rc;

use convgen_types::{FieldDef, FieldLookupError, FieldQuery, TypeId};

use super::Engine;
use super::context::{Handle, MethodContext};
use super::errors::{ConversionError, ErrorCause};
use crate::backend::ir::{IrExpr, IrStmt};

/// A resolved source access for one target field.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedField {
    /// Statements that must run before `access` is read.
    pub stmts: Vec<IrStmt>,
    pub access: Handle,
    pub ty: TypeId,
    /// Source side of the path hop, e.g. `.Profile.Name`.
    pub label: String,
}

/// `base.name`, reading through an address-of so `(&x).F` is spelled `x.F`.
pub(crate) fn member(base: &IrExpr, name: &str) -> IrExpr {
    match base {
        IrExpr::AddrOf(inner) => inner.as_ref().clone().field(name),
        other => other.clone().field(name),
    }
}

/// Resolve the source access for `target_field` of `target_struct`.
///
/// `source` is a struct or a pointer to one that is known to be non-nil.
pub fn map_field(
    engine: &mut Engine,
    ctx: &mut MethodContext,
    target_field: &FieldDef,
    target_struct: TypeId,
    source: &Handle,
    source_ty: TypeId,
) -> Result<MappedField, ConversionError> {
    let policy = Rc::clone(&ctx.policy);
    let field = target_field.name.as_str();
    let types = engine.types();

    if policy.applies_to(target_struct) {
        if let Some(path) = policy.field_map.get(field) {
            let segments: Vec<&str> = path.split('.').collect();
            return walk(engine, ctx, field, path, &segments, source, source_ty);
        }
    }

    let source_key = types.key(source_ty).to_string();
    let query = FieldQuery {
        name: field,
        tag: &target_field.tag,
        case_insensitive: policy.case_insensitive,
        ignored: policy.ignored_for(target_struct),
        tag_search: &policy.tag_search,
    };
    let direct = types.field_lookup(source_ty, &query);
    match direct {
        Ok(found) => {
            let segments = [found.name.as_str()];
            walk(engine, ctx, field, &found.name, &segments, source, source_ty)
        }
        Err(FieldLookupError::NotFound { .. }) => match types.promoted_lookup(source_ty, &query) {
            Ok((mut path, found)) => {
                path.push(found.name);
                let joined = path.join(".");
                let segments: Vec<&str> = path.iter().map(String::as_str).collect();
                tracing::trace!(field, path = %joined, "matched promoted field");
                walk(engine, ctx, field, &joined, &segments, source, source_ty)
            }
            Err(err) => Err(lookup_error(field, source_key, err)),
        },
        Err(err) => Err(lookup_error(field, source_key, err)),
    }
}

fn lookup_error(field: &str, source_type: String, err: FieldLookupError) -> ConversionError {
    let detail = err.to_string();
    let cause = match err {
        FieldLookupError::Ambiguous { .. } => ErrorCause::AmbiguousField {
            field: field.to_string(),
            source_type,
            detail,
        },
        FieldLookupError::NotFound { .. } | FieldLookupError::NotAStruct { .. } => ErrorCause::UnresolvedField {
            field: field.to_string(),
            source_type,
            detail,
        },
    };
    cause.into()
}

/// Follow `segments` from `source`, guarding every pointer crossed after the first segment.
fn walk(
    engine: &mut Engine,
    ctx: &mut MethodContext,
    field: &str,
    path: &str,
    segments: &[&str],
    source: &Handle,
    source_ty: TypeId,
) -> Result<MappedField, ConversionError> {
    let mut expr = source.expr.clone();
    let mut ty = source_ty;
    let mut guard: Option<IrExpr> = None;

    for (index, name) in segments.iter().enumerate() {
        let types = engine.types();
        if let Some(inner) = types.deref(ty) {
            if index > 0 {
                let check = expr.clone().not_nil();
                guard = Some(match guard {
                    Some(previous) => previous.and(check),
                    None => check,
                });
            }
            ty = inner;
        }
        let unresolved = |reason: String| {
            ConversionError::from(ErrorCause::UnresolvedPath {
                field: field.to_string(),
                path: path.to_string(),
                segment: index + 1,
                name: name.to_string(),
                reason,
            })
        };
        if !types.is_struct(ty) {
            return Err(unresolved(format!("cannot be read from non-struct type {}", types.key(ty))));
        }
        let found = types
            .field_lookup(ty, &FieldQuery::exact(name))
            .map_err(|err| unresolved(err.to_string()))?;
        expr = member(&expr, &found.name);
        ty = found.ty;
    }

    let label = format!(".{path}");
    let Some(guard) = guard else {
        return Ok(MappedField {
            stmts: Vec::new(),
            access: Handle::variable(expr),
            ty,
            label,
        });
    };

    let (pointer_ty, value) = if engine.types().is_pointer(ty) {
        (ty, expr)
    } else {
        (engine.types_mut().pointer_to(ty), expr.addr())
    };
    let temp = ctx.namer.name(&engine.types().ident(pointer_ty));
    let stmts = vec![
        IrStmt::var(temp.clone(), engine.type_ref(pointer_ty)),
        IrStmt::if_then(guard, vec![IrStmt::assign(IrExpr::ident(&temp), value)]),
    ];
    Ok(MappedField {
        stmts,
        access: Handle::variable(IrExpr::ident(temp)),
        ty: pointer_ty,
        label,
    })
}

// ============================================================================
// Tests
// ============================================================================

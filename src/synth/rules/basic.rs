use convgen_types::TypeId;

use crate::backend::ir::IrExpr;
use crate::synth::Engine;
use crate::synth::context::{Built, Handle};

/// Identical types pass through; other compatible kinds get an explicit conversion.
pub(super) fn build(engine: &Engine, source: Handle, source_ty: TypeId, target_ty: TypeId) -> Built {
    if source_ty == target_ty {
        return Built::value(Vec::new(), source);
    }
    Built::value(
        Vec::new(),
        Handle::other(IrExpr::convert(engine.type_ref(target_ty), source.expr)),
    )
}

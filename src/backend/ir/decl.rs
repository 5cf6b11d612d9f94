//! IR declaration definitions

use serde::Serialize;

use super::{IrStmt, TypeRef};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionParam {
    pub name: String,
    pub ty: TypeRef,
}

impl FunctionParam {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self { name: name.into(), ty }
    }
}

/// A method on the converter implementation type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrFunction {
    pub name: String,
    /// Receiver variable, bound to the converter implementation
    pub receiver: String,
    pub params: Vec<FunctionParam>,
    pub results: Vec<TypeRef>,
    pub body: Vec<IrStmt>,
}

/// One converter: an implementation type and its methods, sorted by name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrConverter {
    /// Name of the declared converter interface
    pub interface: String,
    /// Name of the generated implementation type
    pub name: String,
    pub methods: Vec<IrFunction>,
}

/// Everything generated for one manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrProgram {
    pub package: String,
    pub converters: Vec<IrConverter>,
}

//! IR statement definitions

use serde::Serialize;

use super::{IrExpr, TypeRef};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IrStmt {
    /// Zero-valued declaration (`var name T`)
    Var { name: String, ty: TypeRef },

    /// Short declaration of one or more names (`a, err := value`)
    Define { names: Vec<String>, value: IrExpr },

    /// Assignment to an existing place (`out.Name = value`)
    Assign { target: IrExpr, value: IrExpr },

    /// Expression statement, typically a call whose result is unused
    Expr(IrExpr),

    If { condition: IrExpr, then_branch: Vec<IrStmt> },

    /// Counted loop (`for i := 0; i < bound; i++`)
    ForIndex {
        index: String,
        bound: IrExpr,
        body: Vec<IrStmt>,
    },

    /// Key/value iteration over a map (`for key, value := range iterable`)
    ForRange {
        key: String,
        value: String,
        iterable: IrExpr,
        body: Vec<IrStmt>,
    },

    Return(Vec<IrExpr>),
}

impl IrStmt {
    pub fn var(name: impl Into<String>, ty: TypeRef) -> Self {
        IrStmt::Var { name: name.into(), ty }
    }

    pub fn define(names: Vec<String>, value: IrExpr) -> Self {
        IrStmt::Define { names, value }
    }

    pub fn assign(target: IrExpr, value: IrExpr) -> Self {
        IrStmt::Assign { target, value }
    }

    pub fn if_then(condition: IrExpr, then_branch: Vec<IrStmt>) -> Self {
        IrStmt::If { condition, then_branch }
    }

    /// Names this statement binds in its own scope (not in nested blocks).
    pub fn declared_names(&self) -> &[String] {
        match self {
            IrStmt::Var { name, .. } => std::slice::from_ref(name),
            IrStmt::Define { names, .. } => names,
            _ => &[],
        }
    }
}

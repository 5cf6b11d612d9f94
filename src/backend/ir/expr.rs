//! IR expression definitions.
//!
//! Expressions are small and value-like. The constructors below fold trivial redundancy at build
//! time (`*&x` becomes `x`, `&*p` becomes `p`) so emitters never see it.

use serde::Serialize;

use super::TypeRef;

/// Binary operators used by synthesized code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Eq,
    Ne,
    Lt,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

/// What a call invokes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Callee {
    /// A method on the converter receiver, `c.name(..)`.
    Method { receiver: String, name: String },
    /// A free function, possibly package-qualified (`pkg.Func`).
    Function(String),
}

impl Callee {
    pub fn name(&self) -> &str {
        match self {
            Callee::Method { name, .. } => name,
            Callee::Function(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IrExpr {
    Ident(String),
    Nil,
    Int(i64),
    Field {
        object: Box<IrExpr>,
        field: String,
    },
    Index {
        object: Box<IrExpr>,
        index: Box<IrExpr>,
    },
    AddrOf(Box<IrExpr>),
    Deref(Box<IrExpr>),
    Call {
        callee: Callee,
        args: Vec<IrExpr>,
    },
    /// Explicit conversion between compatible basic types, `T(value)`.
    Convert {
        ty: TypeRef,
        value: Box<IrExpr>,
    },
    Len(Box<IrExpr>),
    MakeList {
        ty: TypeRef,
        len: Box<IrExpr>,
    },
    MakeMap {
        ty: TypeRef,
        capacity: Box<IrExpr>,
    },
    /// Allocation of a zero value, `new(T)`.
    New(TypeRef),
    Binary {
        op: BinOp,
        left: Box<IrExpr>,
        right: Box<IrExpr>,
    },
}

impl IrExpr {
    pub fn ident(name: impl Into<String>) -> Self {
        IrExpr::Ident(name.into())
    }

    pub fn field(self, field: impl Into<String>) -> Self {
        IrExpr::Field {
            object: Box::new(self),
            field: field.into(),
        }
    }

    pub fn index(self, index: IrExpr) -> Self {
        IrExpr::Index {
            object: Box::new(self),
            index: Box::new(index),
        }
    }

    pub fn addr(self) -> Self {
        match self {
            IrExpr::Deref(inner) => *inner,
            other => IrExpr::AddrOf(Box::new(other)),
        }
    }

    pub fn deref(self) -> Self {
        match self {
            IrExpr::AddrOf(inner) => *inner,
            other => IrExpr::Deref(Box::new(other)),
        }
    }

    pub fn call(callee: Callee, args: Vec<IrExpr>) -> Self {
        IrExpr::Call { callee, args }
    }

    pub fn convert(ty: TypeRef, value: IrExpr) -> Self {
        IrExpr::Convert {
            ty,
            value: Box::new(value),
        }
    }

    pub fn len(value: IrExpr) -> Self {
        IrExpr::Len(Box::new(value))
    }

    pub fn binary(op: BinOp, left: IrExpr, right: IrExpr) -> Self {
        IrExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// `self != nil`
    pub fn not_nil(self) -> Self {
        IrExpr::binary(BinOp::Ne, self, IrExpr::Nil)
    }

    /// `self == nil`
    pub fn is_nil(self) -> Self {
        IrExpr::binary(BinOp::Eq, self, IrExpr::Nil)
    }

    pub fn and(self, other: IrExpr) -> Self {
        IrExpr::binary(BinOp::And, self, other)
    }

    pub fn or(self, other: IrExpr) -> Self {
        IrExpr::binary(BinOp::Or, self, other)
    }

    pub fn is_addr_of(&self) -> bool {
        matches!(self, IrExpr::AddrOf(_))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addr_and_deref_cancel_out() {
        let x = IrExpr::ident("x");
        assert_eq!(x.clone().addr().deref(), x);
        assert_eq!(x.clone().deref().addr(), x);
        assert_eq!(
            x.clone().field("Name").addr(),
            IrExpr::AddrOf(Box::new(IrExpr::ident("x").field("Name")))
        );
    }

    #[test]
    fn test_nil_checks() {
        let check = IrExpr::ident("in").is_nil().or(IrExpr::ident("out").is_nil());
        let IrExpr::Binary { op, .. } = check else {
            panic!("expected binary");
        };
        assert_eq!(op, BinOp::Or);
    }
}

//! Expression rendering.

use super::super::expr::{BinOp, Callee, IrExpr};
use super::types::local_type;

fn precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Or => 1,
        BinOp::And => 2,
        BinOp::Eq | BinOp::Ne | BinOp::Lt => 3,
    }
}

pub(super) fn render_expr(expr: &IrExpr, package: &str) -> String {
    match expr {
        IrExpr::Ident(name) => name.clone(),
        IrExpr::Nil => "nil".to_string(),
        IrExpr::Int(value) => value.to_string(),
        IrExpr::Field { object, field } => format!("{}.{}", render_operand(object, package), field),
        IrExpr::Index { object, index } => {
            format!("{}[{}]", render_operand(object, package), render_expr(index, package))
        }
        IrExpr::AddrOf(inner) => format!("&{}", render_unary_operand(inner, package)),
        IrExpr::Deref(inner) => format!("*{}", render_unary_operand(inner, package)),
        IrExpr::Call { callee, args } => {
            let args: Vec<_> = args.iter().map(|arg| render_expr(arg, package)).collect();
            match callee {
                Callee::Method { receiver, name } => format!("{}.{}({})", receiver, name, args.join(", ")),
                Callee::Function(name) => format!("{}({})", local_type(name, package), args.join(", ")),
            }
        }
        IrExpr::Convert { ty, value } => {
            let ty = local_type(ty.as_str(), package);
            let ty = if ty.starts_with('*') { format!("({ty})") } else { ty };
            format!("{}({})", ty, render_expr(value, package))
        }
        IrExpr::Len(inner) => format!("len({})", render_expr(inner, package)),
        IrExpr::MakeList { ty, len } => {
            format!("make({}, {})", local_type(ty.as_str(), package), render_expr(len, package))
        }
        IrExpr::MakeMap { ty, capacity } => {
            format!("make({}, {})", local_type(ty.as_str(), package), render_expr(capacity, package))
        }
        IrExpr::New(ty) => format!("new({})", local_type(ty.as_str(), package)),
        IrExpr::Binary { op, left, right } => format!(
            "{} {} {}",
            render_binary_side(left, *op, package),
            op.symbol(),
            render_binary_side(right, *op, package)
        ),
    }
}

/// Operand of a selector or index expression; unary operators need parentheses there.
fn render_operand(expr: &IrExpr, package: &str) -> String {
    match expr {
        IrExpr::AddrOf(_) | IrExpr::Deref(_) | IrExpr::Binary { .. } => format!("({})", render_expr(expr, package)),
        _ => render_expr(expr, package),
    }
}

fn render_unary_operand(expr: &IrExpr, package: &str) -> String {
    match expr {
        IrExpr::Binary { .. } => format!("({})", render_expr(expr, package)),
        _ => render_expr(expr, package),
    }
}

fn render_binary_side(expr: &IrExpr, parent: BinOp, package: &str) -> String {
    match expr {
        IrExpr::Binary { op, .. } if precedence(*op) < precedence(parent) => {
            format!("({})", render_expr(expr, package))
        }
        _ => render_expr(expr, package),
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Statement and function emission.

use super::super::decl::IrFunction;
use super::super::stmt::IrStmt;
use super::expressions::render_expr;
use super::types::local_type;
use super::writer::SourceWriter;
use super::EmitError;

pub(super) fn emit_function(
    w: &mut SourceWriter,
    receiver_type: &str,
    function: &IrFunction,
    package: &str,
) -> Result<(), EmitError> {
    let params: Vec<_> = function
        .params
        .iter()
        .map(|p| format!("{} {}", p.name, local_type(p.ty.as_str(), package)))
        .collect();
    let results: Vec<_> = function
        .results
        .iter()
        .map(|ty| local_type(ty.as_str(), package))
        .collect();
    let results = match results.as_slice() {
        [] => String::new(),
        [single] => format!(" {single}"),
        many => format!(" ({})", many.join(", ")),
    };
    let header = format!(
        "func ({} *{}) {}({}){}",
        function.receiver,
        receiver_type,
        function.name,
        params.join(", "),
        results
    );
    w.block(&header, |w| emit_block(w, &function.body, package))
}

fn emit_block(w: &mut SourceWriter, body: &[IrStmt], package: &str) -> Result<(), EmitError> {
    for stmt in body {
        emit_stmt(w, stmt, package)?;
    }
    Ok(())
}

fn emit_stmt(w: &mut SourceWriter, stmt: &IrStmt, package: &str) -> Result<(), EmitError> {
    match stmt {
        IrStmt::Var { name, ty } => w.linef(format_args!("var {} {}", name, local_type(ty.as_str(), package))),
        IrStmt::Define { names, value } => {
            if names.is_empty() {
                return Err(EmitError::Unsupported("short declaration without names".to_string()));
            }
            w.linef(format_args!("{} := {}", names.join(", "), render_expr(value, package)))
        }
        IrStmt::Assign { target, value } => w.linef(format_args!(
            "{} = {}",
            render_expr(target, package),
            render_expr(value, package)
        )),
        IrStmt::Expr(expr) => w.line(&render_expr(expr, package)),
        IrStmt::If { condition, then_branch } => {
            let header = format!("if {}", render_expr(condition, package));
            w.block(&header, |w| emit_block(w, then_branch, package))?;
        }
        IrStmt::ForIndex { index, bound, body } => {
            let header = format!(
                "for {index} := 0; {index} < {}; {index}++",
                render_expr(bound, package)
            );
            w.block(&header, |w| emit_block(w, body, package))?;
        }
        IrStmt::ForRange {
            key,
            value,
            iterable,
            body,
        } => {
            let header = format!("for {key}, {value} := range {}", render_expr(iterable, package));
            w.block(&header, |w| emit_block(w, body, package))?;
        }
        IrStmt::Return(values) => {
            if values.is_empty() {
                w.line("return");
            } else {
                let values: Vec<_> = values.iter().map(|v| render_expr(v, package)).collect();
                w.linef(format_args!("return {}", values.join(", ")));
            }
        }
    }
    Ok(())
}

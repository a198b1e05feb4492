//! Abstract syntax tree.
//!
//! Printing a [`Program`] yields valid source; reparsing and reprinting it
//! produces the identical string, which the tests rely on.

mod expr;
mod span;

pub use expr::{BinOp, Expr, IncDecOp, UnOp};
pub use span::{Span, Spanned};

use std::fmt;

/// A parsed source file or REPL line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// Declaration flavor of a variable statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Let,
    Const,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr {
        expr: Spanned<Expr>,
    },
    Var {
        kind: VarKind,
        name: Spanned<String>,
        value: Spanned<Expr>,
    },
    Return {
        span: Span,
        value: Spanned<Expr>,
    },
    While {
        cond: Spanned<Expr>,
        body: Block,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Spanned<Expr>>,
        update: Option<Spanned<Expr>>,
        body: Block,
    },
    Function {
        name: Spanned<String>,
        params: Vec<Spanned<String>>,
        body: Block,
    },
}

/// A braced statement list; anchored at its opening brace.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

fn write_statements(f: &mut fmt::Formatter<'_>, statements: &[Stmt]) -> fmt::Result {
    for (i, stmt) in statements.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{stmt}")?;
    }
    Ok(())
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_statements(f, &self.statements)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{ ")?;
        write_statements(f, &self.statements)?;
        f.write_str(" }")
    }
}

impl fmt::Display for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarKind::Let => f.write_str("let"),
            VarKind::Const => f.write_str("const"),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expr { expr } => write!(f, "{expr}"),
            Stmt::Var { kind, name, value } => write!(f, "{kind} {} = {value};", name.node),
            Stmt::Return { value, .. } => write!(f, "return {value};"),
            Stmt::While { cond, body } => write!(f, "while ({cond}) {body}"),
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                f.write_str("for (")?;
                match init {
                    Some(stmt) => write!(f, "{stmt} ")?,
                    None => f.write_str("; ")?,
                }
                if let Some(cond) = cond {
                    write!(f, "{cond}")?;
                }
                f.write_str(";")?;
                if let Some(update) = update {
                    write!(f, " {update}")?;
                }
                write!(f, ") {body}")
            }
            Stmt::Function { name, params, body } => {
                write!(f, "func {}(", name.node)?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&p.node)?;
                }
                write!(f, ") {body}")
            }
        }
    }
}

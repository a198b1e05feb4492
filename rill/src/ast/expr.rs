//! Expression nodes.

use std::fmt;

use super::span::{Span, Spanned};
use super::Block;

/// Expressions. Infix and assignment nodes are anchored at their operator
/// token, calls at the opening parenthesis, chains at the dot.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    IntLit(i64),
    FloatLit(f64),
    BoolLit(bool),
    NullLit,
    StringLit(String),
    Array(Vec<Spanned<Expr>>),
    Hash(Vec<(Spanned<Expr>, Spanned<Expr>)>),
    Function {
        params: Vec<Spanned<String>>,
        body: Block,
    },
    Prefix {
        op: UnOp,
        right: Box<Spanned<Expr>>,
    },
    Infix {
        op: BinOp,
        left: Box<Spanned<Expr>>,
        right: Box<Spanned<Expr>>,
    },
    If {
        cond: Box<Spanned<Expr>>,
        consequence: Block,
        alternative: Option<Block>,
    },
    Call {
        func: Box<Spanned<Expr>>,
        args: Vec<Spanned<Expr>>,
    },
    Index {
        left: Box<Spanned<Expr>>,
        index: Box<Spanned<Expr>>,
    },
    Chain {
        left: Box<Spanned<Expr>>,
        right: Box<Spanned<Expr>>,
    },
    Assign {
        name: Spanned<String>,
        value: Box<Spanned<Expr>>,
    },
    IncDec {
        name: Spanned<String>,
        op: IncDecOp,
        prefix: bool,
    },
    Break,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncDecOp {
    Inc,
    Dec,
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnOp::Neg => "-",
            UnOp::Not => "!",
            UnOp::BitNot => "~",
        };
        f.write_str(s)
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
        };
        f.write_str(s)
    }
}

impl fmt::Display for IncDecOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncDecOp::Inc => f.write_str("++"),
            IncDecOp::Dec => f.write_str("--"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Spanned<Expr>]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &[Spanned<String>]) -> fmt::Result {
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        f.write_str(&p.node)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(name) => f.write_str(name),
            Expr::IntLit(n) => write!(f, "{n}"),
            Expr::FloatLit(x) => write!(f, "{x}"),
            Expr::BoolLit(b) => write!(f, "{b}"),
            Expr::NullLit => f.write_str("null"),
            Expr::StringLit(s) => write!(f, "\"{s}\""),
            Expr::Array(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            Expr::Hash(pairs) => {
                f.write_str("{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Expr::Function { params, body } => {
                f.write_str("func(")?;
                write_params(f, params)?;
                write!(f, ") {body}")
            }
            Expr::Prefix { op, right } => write!(f, "({op}{right})"),
            Expr::Infix { op, left, right } => write!(f, "({left} {op} {right})"),
            Expr::If {
                cond,
                consequence,
                alternative,
            } => {
                write!(f, "if ({cond}) {consequence}")?;
                if let Some(alt) = alternative {
                    write!(f, " else {alt}")?;
                }
                Ok(())
            }
            Expr::Call { func, args } => {
                write!(f, "{func}(")?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Expr::Index { left, index } => write!(f, "({left}[{index}])"),
            Expr::Chain { left, right } => write!(f, "({left}.{right})"),
            Expr::Assign { name, value } => write!(f, "({} = {value})", name.node),
            Expr::IncDec { name, op, prefix } => {
                if *prefix {
                    write!(f, "({op}{})", name.node)
                } else {
                    write!(f, "({}{op})", name.node)
                }
            }
            Expr::Break => f.write_str("break"),
            Expr::Continue => f.write_str("continue"),
        }
    }
}

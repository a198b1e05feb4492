//! Hand-written Pratt parser.
//!
//! The parser collects every error it can find in one pass, synchronizing at
//! statement boundaries. Scope rules that can be decided statically are
//! checked here: redeclaring a name in the same scope and reassigning a
//! `const` binding are parse errors, not runtime errors.


use std::collections::HashMap;

use crate::ast::{BinOp, Block, Expr, IncDecOp, Program, Span, Spanned, Stmt, UnOp, VarKind};
use crate::error::ParseError;
use crate::lexer::{tokenize, Token, TokenKind};

/// Binding powers, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Equality,
    Relational,
    Shift,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
    Chain,
}

fn precedence_of(kind: TokenKind) -> Precedence {
    use TokenKind::*;
    match kind {
        PipePipe => Precedence::Or,
        AmpAmp => Precedence::And,
        Pipe => Precedence::BitOr,
        Caret => Precedence::BitXor,
        Amp => Precedence::BitAnd,
        Eq | NotEq => Precedence::Equality,
        Lt | Le | Gt | Ge => Precedence::Relational,
        Shl | Shr => Precedence::Shift,
        Plus | Minus => Precedence::Sum,
        Star | Slash | Percent => Precedence::Product,
        PlusPlus | MinusMinus | LParen => Precedence::Call,
        LBracket => Precedence::Index,
        Dot => Precedence::Chain,
        _ => Precedence::Lowest,
    }
}

fn binop_for(kind: TokenKind) -> Option<BinOp> {
    use TokenKind::*;
    let op = match kind {
        Plus => BinOp::Add,
        Minus => BinOp::Sub,
        Star => BinOp::Mul,
        Slash => BinOp::Div,
        Percent => BinOp::Mod,
        Lt => BinOp::Lt,
        Le => BinOp::Le,
        Gt => BinOp::Gt,
        Ge => BinOp::Ge,
        Eq => BinOp::Eq,
        NotEq => BinOp::Ne,
        AmpAmp => BinOp::And,
        PipePipe => BinOp::Or,
        Amp => BinOp::BitAnd,
        Pipe => BinOp::BitOr,
        Caret => BinOp::BitXor,
        Shl => BinOp::Shl,
        Shr => BinOp::Shr,
        _ => return None,
    };
    Some(op)
}

/// `x op= e` desugars to `x = (x op e)`.
fn compound_binop(kind: TokenKind) -> Option<BinOp> {
    use TokenKind::*;
    let op = match kind {
        PlusAssign => BinOp::Add,
        MinusAssign => BinOp::Sub,
        StarAssign => BinOp::Mul,
        SlashAssign => BinOp::Div,
        PercentAssign => BinOp::Mod,
        AmpAssign => BinOp::BitAnd,
        PipeAssign => BinOp::BitOr,
        CaretAssign => BinOp::BitXor,
        ShlAssign => BinOp::Shl,
        ShrAssign => BinOp::Shr,
        _ => return None,
    };
    Some(op)
}

/// Lex and parse a complete program.
pub fn parse(source: &str) -> Result<Program, Vec<ParseError>> {
    let (program, errors) = Parser::new(tokenize(source)).parse_program();
    if errors.is_empty() {
        Ok(program)
    } else {
        Err(errors)
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
    scopes: Vec<HashMap<String, VarKind>>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            scopes: vec![HashMap::new()],
        }
    }

    pub fn parse_program(mut self) -> (Program, Vec<ParseError>) {
        let mut statements = Vec::new();
        while self.cur().is_some() {
            if self.cur_is(TokenKind::Semicolon) {
                self.bump();
                continue;
            }
            match self.parse_statement() {
                Some(stmt) => statements.push(stmt),
                None => self.synchronize(),
            }
        }
        (Program { statements }, self.errors)
    }

    // Cursor helpers

    fn cur(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn cur_kind(&self) -> Option<TokenKind> {
        self.cur().map(|t| t.kind)
    }

    fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur_kind() == Some(kind)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| t.kind)
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn cur_span(&self) -> Span {
        match self.cur() {
            Some(token) => token.span,
            None => self.eof_span(),
        }
    }

    fn eof_span(&self) -> Span {
        match self.tokens.last() {
            Some(token) => token.span,
            None => Span::dummy(),
        }
    }

    fn error_at(&mut self, span: Span, message: impl Into<String>) {
        self.errors.push(ParseError::new(message, span));
    }

    /// Consume `kind` or record an error.
    fn expect(&mut self, kind: TokenKind) -> bool {
        match self.cur() {
            Some(token) if token.kind == kind => {
                self.bump();
                true
            }
            Some(token) => {
                let (literal, span) = (token.literal.clone(), token.span);
                self.error_at(span, format!("expected `{kind}`, found `{literal}`"));
                false
            }
            None => {
                let span = self.eof_span();
                self.error_at(span, format!("unexpected end of input, expected `{kind}`"));
                false
            }
        }
    }

    fn eat_semicolon(&mut self) {
        if self.cur_is(TokenKind::Semicolon) {
            self.bump();
        }
    }

    /// Skip to the next statement boundary after an error.
    fn synchronize(&mut self) {
        while let Some(kind) = self.cur_kind() {
            match kind {
                TokenKind::Semicolon => {
                    self.bump();
                    return;
                }
                TokenKind::RBrace => return,
                _ => self.bump(),
            }
        }
    }

    // Scope bookkeeping

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &str, kind: VarKind, span: Span) {
        let duplicate = self
            .scopes
            .last()
            .is_some_and(|scope| scope.contains_key(name));
        if duplicate {
            self.error_at(span, format!("can not redefine variable {name}."));
        } else if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), kind);
        }
    }

    /// Walk outward from the innermost scope; the nearest binding decides,
    /// so a `let` shadowing an outer `const` is assignable.
    fn check_const_reassign(&mut self, name: &str, span: Span) {
        let mut is_const = false;
        for scope in self.scopes.iter().rev() {
            match scope.get(name) {
                Some(VarKind::Const) => {
                    is_const = true;
                    break;
                }
                Some(VarKind::Let) => break,
                None => {}
            }
        }
        if is_const {
            self.error_at(span, format!("can not reassign constant {name}."));
        }
    }

    // Statements

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.cur_kind() {
            Some(TokenKind::Let) | Some(TokenKind::Const) => self.parse_var_statement(),
            Some(TokenKind::Return) => self.parse_return_statement(),
            Some(TokenKind::While) => self.parse_while_statement(),
            Some(TokenKind::For) => self.parse_for_statement(),
            Some(TokenKind::Function) if self.peek_kind() == Some(TokenKind::Ident) => {
                self.parse_function_statement()
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_var_statement(&mut self) -> Option<Stmt> {
        let kind = if self.cur_is(TokenKind::Let) {
            VarKind::Let
        } else {
            VarKind::Const
        };
        self.bump();
        let name = self.parse_ident()?;
        self.declare(&name.node, kind, name.span);
        if !self.expect(TokenKind::Assign) {
            return None;
        }
        let value = self.parse_expression(Precedence::Lowest)?;
        self.eat_semicolon();
        Some(Stmt::Var { kind, name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Stmt> {
        let span = self.cur_span();
        self.bump();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.eat_semicolon();
        Some(Stmt::Return { span, value })
    }

    fn parse_while_statement(&mut self) -> Option<Stmt> {
        self.bump();
        if !self.expect(TokenKind::LParen) {
            return None;
        }
        let cond = self.parse_expression(Precedence::Lowest)?;
        if !self.expect(TokenKind::RParen) {
            return None;
        }
        let body = self.parse_block()?;
        Some(Stmt::While { cond, body })
    }

    fn parse_for_statement(&mut self) -> Option<Stmt> {
        self.bump();
        if !self.expect(TokenKind::LParen) {
            return None;
        }
        // The init clause lives in its own scope enclosing the body.
        self.push_scope();
        let stmt = self.parse_for_clauses();
        self.pop_scope();
        stmt
    }

    fn parse_for_clauses(&mut self) -> Option<Stmt> {
        let init = match self.cur_kind() {
            Some(TokenKind::Semicolon) => {
                self.bump();
                None
            }
            Some(TokenKind::Let) | Some(TokenKind::Const) => {
                Some(Box::new(self.parse_var_statement()?))
            }
            _ => {
                let expr = self.parse_expression(Precedence::Lowest)?;
                if !self.expect(TokenKind::Semicolon) {
                    return None;
                }
                Some(Box::new(Stmt::Expr { expr }))
            }
        };
        let cond = if self.cur_is(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression(Precedence::Lowest)?)
        };
        if !self.expect(TokenKind::Semicolon) {
            return None;
        }
        let update = if self.cur_is(TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression(Precedence::Lowest)?)
        };
        if !self.expect(TokenKind::RParen) {
            return None;
        }
        let body = self.parse_block()?;
        Some(Stmt::For {
            init,
            cond,
            update,
            body,
        })
    }

    fn parse_function_statement(&mut self) -> Option<Stmt> {
        self.bump();
        let name = self.parse_ident()?;
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Some(Stmt::Function { name, params, body })
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.eat_semicolon();
        Some(Stmt::Expr { expr })
    }

    fn parse_ident(&mut self) -> Option<Spanned<String>> {
        match self.cur() {
            Some(token) if token.kind == TokenKind::Ident => {
                let ident = Spanned::new(token.literal.clone(), token.span);
                self.bump();
                Some(ident)
            }
            Some(token) => {
                let (literal, span) = (token.literal.clone(), token.span);
                self.error_at(span, format!("expected identifier, found `{literal}`"));
                None
            }
            None => {
                let span = self.eof_span();
                self.error_at(span, "unexpected end of input, expected identifier");
                None
            }
        }
    }

    fn parse_params(&mut self) -> Option<Vec<Spanned<String>>> {
        if !self.expect(TokenKind::LParen) {
            return None;
        }
        let mut params = Vec::new();
        if self.cur_is(TokenKind::RParen) {
            self.bump();
            return Some(params);
        }
        loop {
            params.push(self.parse_ident()?);
            if self.cur_is(TokenKind::Comma) {
                self.bump();
                continue;
            }
            if !self.expect(TokenKind::RParen) {
                return None;
            }
            return Some(params);
        }
    }

    fn parse_block(&mut self) -> Option<Block> {
        let span = self.cur_span();
        if !self.expect(TokenKind::LBrace) {
            return None;
        }
        self.push_scope();
        let mut statements = Vec::new();
        loop {
            match self.cur_kind() {
                None => {
                    let span = self.eof_span();
                    self.error_at(span, "unexpected end of input, expected `}`");
                    break;
                }
                Some(TokenKind::RBrace) => {
                    self.bump();
                    break;
                }
                Some(TokenKind::Semicolon) => self.bump(),
                _ => match self.parse_statement() {
                    Some(stmt) => statements.push(stmt),
                    None => self.synchronize(),
                },
            }
        }
        self.pop_scope();
        Some(Block { statements, span })
    }

    // Expressions

    fn parse_expression(&mut self, prec: Precedence) -> Option<Spanned<Expr>> {
        let mut left = self.parse_prefix()?;
        while let Some(kind) = self.cur_kind() {
            if prec >= precedence_of(kind) {
                break;
            }
            left = self.parse_infix(left)?;
        }
        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Spanned<Expr>> {
        let token = match self.cur() {
            Some(token) => token.clone(),
            None => {
                let span = self.eof_span();
                self.error_at(span, "unexpected end of input");
                return None;
            }
        };
        self.bump();
        match token.kind {
            TokenKind::Ident => self.parse_identifier_expression(token),
            TokenKind::Int => match token.literal.parse::<i64>() {
                Ok(n) => Some(Spanned::new(Expr::IntLit(n), token.span)),
                Err(_) => {
                    self.error_at(
                        token.span,
                        format!("could not parse `{}` as integer", token.literal),
                    );
                    None
                }
            },
            TokenKind::Float => match token.literal.parse::<f64>() {
                Ok(x) => Some(Spanned::new(Expr::FloatLit(x), token.span)),
                Err(_) => {
                    self.error_at(
                        token.span,
                        format!("could not parse `{}` as float", token.literal),
                    );
                    None
                }
            },
            TokenKind::Str => Some(Spanned::new(Expr::StringLit(token.literal), token.span)),
            TokenKind::True => Some(Spanned::new(Expr::BoolLit(true), token.span)),
            TokenKind::False => Some(Spanned::new(Expr::BoolLit(false), token.span)),
            TokenKind::Null => Some(Spanned::new(Expr::NullLit, token.span)),
            TokenKind::Minus => self.parse_prefix_op(UnOp::Neg, token.span),
            TokenKind::Bang => self.parse_prefix_op(UnOp::Not, token.span),
            TokenKind::Tilde => self.parse_prefix_op(UnOp::BitNot, token.span),
            TokenKind::PlusPlus => self.parse_prefix_incdec(IncDecOp::Inc, token.span),
            TokenKind::MinusMinus => self.parse_prefix_incdec(IncDecOp::Dec, token.span),
            TokenKind::LParen => {
                let expr = self.parse_expression(Precedence::Lowest)?;
                if !self.expect(TokenKind::RParen) {
                    return None;
                }
                Some(expr)
            }
            TokenKind::LBracket => {
                let items = self.parse_expression_list(TokenKind::RBracket)?;
                Some(Spanned::new(Expr::Array(items), token.span))
            }
            TokenKind::LBrace => self.parse_hash_literal(token.span),
            TokenKind::If => self.parse_if_expression(token.span),
            TokenKind::Function => {
                let params = self.parse_params()?;
                let body = self.parse_block()?;
                Some(Spanned::new(Expr::Function { params, body }, token.span))
            }
            TokenKind::Break => Some(Spanned::new(Expr::Break, token.span)),
            TokenKind::Continue => Some(Spanned::new(Expr::Continue, token.span)),
            _ => {
                self.error_at(token.span, format!("unexpected token {}", token.literal));
                None
            }
        }
    }

    /// A leading identifier may open a plain reference or an assignment;
    /// compound assignments desugar to `name = (name op rhs)`.
    fn parse_identifier_expression(&mut self, token: Token) -> Option<Spanned<Expr>> {
        let name = Spanned::new(token.literal, token.span);
        match self.cur_kind() {
            Some(TokenKind::Assign) => {
                let op_span = self.cur_span();
                self.bump();
                self.check_const_reassign(&name.node, op_span);
                let value = self.parse_expression(Precedence::Lowest)?;
                Some(Spanned::new(
                    Expr::Assign {
                        name,
                        value: Box::new(value),
                    },
                    op_span,
                ))
            }
            Some(kind) => match compound_binop(kind) {
                Some(op) => {
                    let op_span = self.cur_span();
                    self.bump();
                    self.check_const_reassign(&name.node, op_span);
                    let rhs = self.parse_expression(Precedence::Lowest)?;
                    let lhs = Spanned::new(Expr::Ident(name.node.clone()), name.span);
                    let value = Spanned::new(
                        Expr::Infix {
                            op,
                            left: Box::new(lhs),
                            right: Box::new(rhs),
                        },
                        op_span,
                    );
                    Some(Spanned::new(
                        Expr::Assign {
                            name,
                            value: Box::new(value),
                        },
                        op_span,
                    ))
                }
                None => Some(Spanned::new(Expr::Ident(name.node), name.span)),
            },
            None => Some(Spanned::new(Expr::Ident(name.node), name.span)),
        }
    }

    fn parse_prefix_op(&mut self, op: UnOp, span: Span) -> Option<Spanned<Expr>> {
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Spanned::new(
            Expr::Prefix {
                op,
                right: Box::new(right),
            },
            span,
        ))
    }

    fn parse_prefix_incdec(&mut self, op: IncDecOp, span: Span) -> Option<Spanned<Expr>> {
        let name = self.parse_ident()?;
        Some(Spanned::new(
            Expr::IncDec {
                name,
                op,
                prefix: true,
            },
            span,
        ))
    }

    fn parse_if_expression(&mut self, span: Span) -> Option<Spanned<Expr>> {
        if !self.expect(TokenKind::LParen) {
            return None;
        }
        let cond = self.parse_expression(Precedence::Lowest)?;
        if !self.expect(TokenKind::RParen) {
            return None;
        }
        let consequence = self.parse_block()?;
        let alternative = if self.cur_is(TokenKind::Else) {
            self.bump();
            Some(self.parse_block()?)
        } else {
            None
        };
        Some(Spanned::new(
            Expr::If {
                cond: Box::new(cond),
                consequence,
                alternative,
            },
            span,
        ))
    }

    fn parse_hash_literal(&mut self, span: Span) -> Option<Spanned<Expr>> {
        let mut pairs = Vec::new();
        if self.cur_is(TokenKind::RBrace) {
            self.bump();
            return Some(Spanned::new(Expr::Hash(pairs), span));
        }
        loop {
            let key = self.parse_expression(Precedence::Lowest)?;
            if !self.expect(TokenKind::Colon) {
                return None;
            }
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));
            if self.cur_is(TokenKind::Comma) {
                self.bump();
                if self.cur_is(TokenKind::RBrace) {
                    break;
                }
                continue;
            }
            break;
        }
        if !self.expect(TokenKind::RBrace) {
            return None;
        }
        Some(Spanned::new(Expr::Hash(pairs), span))
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Spanned<Expr>>> {
        let mut items = Vec::new();
        if self.cur_is(end) {
            self.bump();
            return Some(items);
        }
        items.push(self.parse_expression(Precedence::Lowest)?);
        while self.cur_is(TokenKind::Comma) {
            self.bump();
            if self.cur_is(end) {
                break;
            }
            items.push(self.parse_expression(Precedence::Lowest)?);
        }
        if !self.expect(end) {
            return None;
        }
        Some(items)
    }

    fn parse_infix(&mut self, left: Spanned<Expr>) -> Option<Spanned<Expr>> {
        let token = match self.cur() {
            Some(token) => token.clone(),
            None => return Some(left),
        };
        match token.kind {
            TokenKind::LParen => {
                self.bump();
                let args = self.parse_expression_list(TokenKind::RParen)?;
                Some(Spanned::new(
                    Expr::Call {
                        func: Box::new(left),
                        args,
                    },
                    token.span,
                ))
            }
            TokenKind::LBracket => {
                self.bump();
                let index = self.parse_expression(Precedence::Lowest)?;
                if !self.expect(TokenKind::RBracket) {
                    return None;
                }
                Some(Spanned::new(
                    Expr::Index {
                        left: Box::new(left),
                        index: Box::new(index),
                    },
                    token.span,
                ))
            }
            TokenKind::Dot => {
                self.bump();
                self.parse_chain(left, token.span)
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let op = if token.kind == TokenKind::PlusPlus {
                    IncDecOp::Inc
                } else {
                    IncDecOp::Dec
                };
                self.bump();
                match left.node {
                    Expr::Ident(name) => Some(Spanned::new(
                        Expr::IncDec {
                            name: Spanned::new(name, left.span),
                            op,
                            prefix: false,
                        },
                        token.span,
                    )),
                    _ => {
                        self.error_at(token.span, format!("invalid target for {op}"));
                        None
                    }
                }
            }
            kind => match binop_for(kind) {
                Some(op) => {
                    self.bump();
                    let right = self.parse_expression(precedence_of(kind))?;
                    Some(Spanned::new(
                        Expr::Infix {
                            op,
                            left: Box::new(left),
                            right: Box::new(right),
                        },
                        token.span,
                    ))
                }
                None => {
                    self.bump();
                    self.error_at(token.span, format!("unexpected token {}", token.literal));
                    None
                }
            },
        }
    }

    /// After a `.` only a method call or a bare name may follow.
    fn parse_chain(&mut self, left: Spanned<Expr>, dot_span: Span) -> Option<Spanned<Expr>> {
        let name = self.parse_ident()?;
        let right = if self.cur_is(TokenKind::LParen) {
            let call_span = self.cur_span();
            self.bump();
            let args = self.parse_expression_list(TokenKind::RParen)?;
            let func = Spanned::new(Expr::Ident(name.node), name.span);
            Spanned::new(
                Expr::Call {
                    func: Box::new(func),
                    args,
                },
                call_span,
            )
        } else {
            Spanned::new(Expr::Ident(name.node), name.span)
        };
        Some(Spanned::new(
            Expr::Chain {
                left: Box::new(left),
                right: Box::new(right),
            },
            dot_span,
        ))
    }
}

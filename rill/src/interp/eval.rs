//! The tree-walking evaluator.
//!
//! Errors travel as [`Value::Error`] and short-circuit everything they pass
//! through; `return`, `break` and `continue` travel the same way and are
//! intercepted at the call and loop boundaries they belong to.

use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use crate::ast::{BinOp, Block, Expr, Program, Span, Spanned, Stmt, UnOp};

use super::builtins;
use super::env::{child_env, EnvRef};
use super::methods;
use super::value::{BuiltinFn, Function, Value};

// Recursive evaluation grows the stack on demand instead of overflowing it
// on deeply nested programs.
const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW: usize = 4 * 1024 * 1024;

pub struct Interpreter {
    builtins: HashMap<&'static str, BuiltinFn>,
    out: Box<dyn Write>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Build an interpreter whose `print` output goes to `out`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        let mut interp = Self {
            builtins: HashMap::new(),
            out,
        };
        builtins::register(&mut interp.builtins);
        interp
    }

    pub(crate) fn write_line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
    }

    /// Evaluate a whole program. A top-level `return` stops execution and
    /// unwraps to its value; an error stops execution; otherwise the value
    /// of the last statement is returned.
    pub fn eval_program(&mut self, program: &Program, env: &EnvRef) -> Value {
        let mut result = Value::Null;
        for stmt in &program.statements {
            result = self.eval_stmt(stmt, env);
            match result {
                Value::Return(value) => return *value,
                Value::Error { .. } => return result,
                _ => {}
            }
        }
        result
    }

    fn eval_stmt(&mut self, stmt: &Stmt, env: &EnvRef) -> Value {
        match stmt {
            Stmt::Expr { expr } => self.eval_expr(expr, env),
            Stmt::Var { name, value, .. } => self.eval_var_stmt(name, value, env),
            Stmt::Return { value, .. } => {
                let v = self.eval_expr(value, env);
                if v.is_error() {
                    return v;
                }
                Value::Return(Box::new(v))
            }
            Stmt::While { cond, body } => self.eval_while(cond, body, env),
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => self.eval_for(init.as_deref(), cond.as_ref(), update.as_ref(), body, env),
            Stmt::Function { name, params, body } => {
                let func = Value::Function(Rc::new(Function {
                    params: params.clone(),
                    body: body.clone(),
                    env: Rc::clone(env),
                }));
                env.borrow_mut().define(name.node.clone(), func);
                Value::Null
            }
        }
    }

    fn eval_var_stmt(
        &mut self,
        name: &Spanned<String>,
        value: &Spanned<Expr>,
        env: &EnvRef,
    ) -> Value {
        let already = env.borrow().get_local(&name.node).is_some();
        if already {
            return Value::error(
                name.span,
                format!("variable already defined: {}", name.node),
            );
        }
        let v = self.eval_expr(value, env);
        if v.is_error() {
            return v;
        }
        env.borrow_mut().define(name.node.clone(), v);
        Value::Null
    }

    fn eval_while(&mut self, cond: &Spanned<Expr>, body: &Block, env: &EnvRef) -> Value {
        loop {
            let c = self.eval_expr(cond, env);
            if c.is_error() {
                return c;
            }
            if !c.is_truthy() {
                break;
            }
            match self.eval_block(body, env) {
                Value::Break => break,
                Value::Continue => continue,
                signal @ (Value::Return(_) | Value::Error { .. }) => return signal,
                _ => {}
            }
        }
        Value::Null
    }

    fn eval_for(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&Spanned<Expr>>,
        update: Option<&Spanned<Expr>>,
        body: &Block,
        env: &EnvRef,
    ) -> Value {
        // The init binding lives in a scope wrapped around every iteration.
        let scope = child_env(env);
        if let Some(init) = init {
            let v = self.eval_stmt(init, &scope);
            if v.is_error() {
                return v;
            }
        }
        loop {
            if let Some(cond) = cond {
                let c = self.eval_expr(cond, &scope);
                if c.is_error() {
                    return c;
                }
                if !c.is_truthy() {
                    break;
                }
            }
            match self.eval_block(body, &scope) {
                Value::Break => break,
                // continue still runs the update clause
                Value::Continue => {}
                signal @ (Value::Return(_) | Value::Error { .. }) => return signal,
                _ => {}
            }
            if let Some(update) = update {
                let u = self.eval_expr(update, &scope);
                if u.is_error() {
                    return u;
                }
            }
        }
        Value::Null
    }

    /// A block runs in a fresh child scope and yields `null` unless a
    /// signal escapes it.
    fn eval_block(&mut self, block: &Block, env: &EnvRef) -> Value {
        let scope = child_env(env);
        self.eval_statements(&block.statements, &scope)
    }

    fn eval_statements(&mut self, statements: &[Stmt], env: &EnvRef) -> Value {
        for stmt in statements {
            let v = self.eval_stmt(stmt, env);
            match v {
                Value::Return(_) | Value::Break | Value::Continue | Value::Error { .. } => {
                    return v;
                }
                _ => {}
            }
        }
        Value::Null
    }

    pub(crate) fn eval_expr(&mut self, expr: &Spanned<Expr>, env: &EnvRef) -> Value {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW, || self.eval_expr_inner(expr, env))
    }

    fn eval_expr_inner(&mut self, expr: &Spanned<Expr>, env: &EnvRef) -> Value {
        let span = expr.span;
        match &expr.node {
            Expr::IntLit(n) => Value::Int(*n),
            Expr::FloatLit(x) => Value::Float(*x),
            Expr::BoolLit(b) => Value::Bool(*b),
            Expr::NullLit => Value::Null,
            Expr::StringLit(s) => Value::string(s.clone()),
            Expr::Ident(name) => self.eval_ident(name, span, env),
            Expr::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    let v = self.eval_expr(item, env);
                    if v.is_error() {
                        return v;
                    }
                    values.push(v);
                }
                Value::array(values)
            }
            Expr::Hash(pairs) => self.eval_hash_literal(pairs, env),
            Expr::Function { params, body } => Value::Function(Rc::new(Function {
                params: params.clone(),
                body: body.clone(),
                env: Rc::clone(env),
            })),
            Expr::Prefix { op, right } => {
                let v = self.eval_expr(right, env);
                if v.is_error() {
                    return v;
                }
                eval_prefix(span, *op, v)
            }
            Expr::Infix { op, left, right } => match op {
                BinOp::And | BinOp::Or => self.eval_logical(*op, left, right, env),
                _ => {
                    let l = self.eval_expr(left, env);
                    if l.is_error() {
                        return l;
                    }
                    let r = self.eval_expr(right, env);
                    if r.is_error() {
                        return r;
                    }
                    eval_infix(span, *op, l, r)
                }
            },
            Expr::If {
                cond,
                consequence,
                alternative,
            } => {
                let c = self.eval_expr(cond, env);
                if c.is_error() {
                    return c;
                }
                if c.is_truthy() {
                    self.eval_block(consequence, env)
                } else if let Some(alt) = alternative {
                    self.eval_block(alt, env)
                } else {
                    Value::Null
                }
            }
            Expr::Call { func, args } => {
                let callee = self.eval_expr(func, env);
                if callee.is_error() {
                    return callee;
                }
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    let v = self.eval_expr(arg, env);
                    if v.is_error() {
                        return v;
                    }
                    values.push(v);
                }
                self.apply_function(span, &callee, values)
            }
            Expr::Index { left, index } => {
                let l = self.eval_expr(left, env);
                if l.is_error() {
                    return l;
                }
                let i = self.eval_expr(index, env);
                if i.is_error() {
                    return i;
                }
                eval_index(span, &l, &i)
            }
            Expr::Chain { left, right } => self.eval_chain(span, left, right, env),
            Expr::Assign { name, value } => self.eval_assign(span, name, value, env),
            Expr::IncDec { name, op, prefix } => {
                self.eval_incdec(span, name, *op, *prefix, env)
            }
            Expr::Break => Value::Break,
            Expr::Continue => Value::Continue,
        }
    }

    fn eval_ident(&mut self, name: &str, span: Span, env: &EnvRef) -> Value {
        let bound = env.borrow().get(name);
        if let Some(value) = bound {
            return value;
        }
        match self.builtins.get_key_value(name) {
            Some((key, func)) => Value::Builtin {
                name: key,
                func: *func,
            },
            None => Value::error(span, format!("identifier not found: {name}")),
        }
    }

    fn eval_hash_literal(
        &mut self,
        pairs: &[(Spanned<Expr>, Spanned<Expr>)],
        env: &EnvRef,
    ) -> Value {
        let mut map = HashMap::with_capacity(pairs.len());
        for (key_expr, value_expr) in pairs {
            let key = self.eval_expr(key_expr, env);
            if key.is_error() {
                return key;
            }
            let hash_key = match key.hash_key() {
                Some(hk) => hk,
                None => {
                    return Value::error(
                        key_expr.span,
                        format!("unusable as hash key: {}", key.type_name()),
                    );
                }
            };
            let value = self.eval_expr(value_expr, env);
            if value.is_error() {
                return value;
            }
            map.insert(hash_key, (key, value));
        }
        Value::Hash(Rc::new(std::cell::RefCell::new(map)))
    }

    fn eval_logical(
        &mut self,
        op: BinOp,
        left: &Spanned<Expr>,
        right: &Spanned<Expr>,
        env: &EnvRef,
    ) -> Value {
        let l = self.eval_expr(left, env);
        if l.is_error() {
            return l;
        }
        // Short-circuit on truthiness; the result is always a coerced Boolean.
        match op {
            BinOp::And if !l.is_truthy() => return Value::Bool(false),
            BinOp::Or if l.is_truthy() => return Value::Bool(true),
            _ => {}
        }
        let r = self.eval_expr(right, env);
        if r.is_error() {
            return r;
        }
        Value::Bool(r.is_truthy())
    }

    fn eval_assign(
        &mut self,
        span: Span,
        name: &Spanned<String>,
        value: &Spanned<Expr>,
        env: &EnvRef,
    ) -> Value {
        let bound = env.borrow().contains(&name.node);
        if !bound {
            return Value::error(
                span,
                format!("variable {} has not been initialized.", name.node),
            );
        }
        let v = self.eval_expr(value, env);
        if v.is_error() {
            return v;
        }
        env.borrow_mut().assign(&name.node, v.clone());
        v
    }

    fn eval_incdec(
        &mut self,
        span: Span,
        name: &Spanned<String>,
        op: crate::ast::IncDecOp,
        prefix: bool,
        env: &EnvRef,
    ) -> Value {
        use crate::ast::IncDecOp;
        let current = env.borrow().get(&name.node);
        let current = match current {
            Some(value) => value,
            None => {
                return Value::error(span, format!("identifier not found: {}", name.node));
            }
        };
        let step = match op {
            IncDecOp::Inc => 1,
            IncDecOp::Dec => -1,
        };
        let updated = match &current {
            Value::Int(n) => Value::Int(n + i64::from(step)),
            Value::Float(x) => Value::Float(x + f64::from(step)),
            other => {
                let message = if prefix {
                    format!("unknown operator: {op}{}", other.type_name())
                } else {
                    format!("unknown operator: {}{op}", other.type_name())
                };
                return Value::error(span, message);
            }
        };
        env.borrow_mut().assign(&name.node, updated.clone());
        if prefix {
            updated
        } else {
            current
        }
    }

    fn eval_chain(
        &mut self,
        span: Span,
        left: &Spanned<Expr>,
        right: &Spanned<Expr>,
        env: &EnvRef,
    ) -> Value {
        let receiver = self.eval_expr(left, env);
        if receiver.is_error() {
            return receiver;
        }
        match &right.node {
            Expr::Call { func, args } => match &func.node {
                Expr::Ident(name) => self.eval_method_call(right.span, receiver, name, args, env),
                other => Value::error(
                    span,
                    format!(
                        "chaining operator not supported: {}.{other}",
                        receiver.type_name()
                    ),
                ),
            },
            // Bare property access is not part of the language.
            other => Value::error(
                span,
                format!(
                    "chaining operator not supported: {}.{other}",
                    receiver.type_name()
                ),
            ),
        }
    }

    fn eval_method_call(
        &mut self,
        span: Span,
        receiver: Value,
        name: &str,
        args: &[Spanned<Expr>],
        env: &EnvRef,
    ) -> Value {
        let method = match &receiver {
            Value::Array(_) => methods::array_method(name),
            Value::Str(_) => methods::string_method(name),
            other => {
                return Value::error(
                    span,
                    format!("chaining operator not supported: {}.{name}", other.type_name()),
                );
            }
        };
        let method = match method {
            Some(method) => method,
            None => {
                return Value::error(
                    span,
                    format!("{} has no method {name}", receiver.type_name()),
                );
            }
        };
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            let v = self.eval_expr(arg, env);
            if v.is_error() {
                return v;
            }
            values.push(v);
        }
        method(self, span, &receiver, &values)
    }

    /// Call a function or builtin with already-evaluated arguments. User
    /// functions check exact arity, bind parameters in a child of the
    /// captured environment and unwrap one layer of `Return`.
    pub(crate) fn apply_function(&mut self, span: Span, callee: &Value, args: Vec<Value>) -> Value {
        match callee {
            Value::Function(func) => {
                if args.len() != func.params.len() {
                    return Value::error(
                        span,
                        format!(
                            "wrong number of arguments: want={}, got={}",
                            func.params.len(),
                            args.len()
                        ),
                    );
                }
                let scope = child_env(&func.env);
                for (param, arg) in func.params.iter().zip(args) {
                    scope.borrow_mut().define(param.node.clone(), arg);
                }
                match self.eval_statements(&func.body.statements, &scope) {
                    Value::Return(value) => *value,
                    other => other,
                }
            }
            Value::Builtin { func, .. } => func(self, span, &args),
            other => Value::error(span, format!("not a function: {}", other.type_name())),
        }
    }

    /// Invoke a map/filter/reduce-style callback. User callbacks may declare
    /// fewer parameters than are offered; builtins receive `builtin_arity`.
    pub(crate) fn call_callback(
        &mut self,
        span: Span,
        callee: &Value,
        args: &[Value],
        builtin_arity: usize,
    ) -> Value {
        let take = match callee {
            Value::Function(func) => func.params.len().min(args.len()),
            Value::Builtin { .. } => builtin_arity.min(args.len()),
            other => {
                return Value::error(span, format!("not a function: {}", other.type_name()));
            }
        };
        self.apply_function(span, callee, args[..take].to_vec())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn eval_prefix(span: Span, op: UnOp, value: Value) -> Value {
    match op {
        UnOp::Not => Value::Bool(!value.is_truthy()),
        UnOp::Neg => match value {
            Value::Int(n) => Value::Int(n.wrapping_neg()),
            Value::Float(x) => Value::Float(-x),
            other => Value::error(span, format!("unknown operator: -{}", other.type_name())),
        },
        UnOp::BitNot => match value {
            Value::Int(n) => Value::Int(!n),
            other => Value::error(span, format!("unknown operator: ~{}", other.type_name())),
        },
    }
}

fn eval_infix(span: Span, op: BinOp, left: Value, right: Value) -> Value {
    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => eval_int_infix(span, op, *a, *b),
        (Value::Float(a), Value::Float(b)) => eval_float_infix(span, op, *a, *b),
        (Value::Int(a), Value::Float(b)) => eval_float_infix(span, op, *a as f64, *b),
        (Value::Float(a), Value::Int(b)) => eval_float_infix(span, op, *a, *b as f64),
        (Value::Str(a), Value::Str(b)) => match op {
            BinOp::Add => Value::string(format!("{a}{b}")),
            BinOp::Eq => Value::Bool(a == b),
            BinOp::Ne => Value::Bool(a != b),
            _ => Value::error(span, format!("unknown operator: STRING {op} STRING")),
        },
        _ => match op {
            BinOp::Eq => Value::Bool(values_equal(&left, &right)),
            BinOp::Ne => Value::Bool(!values_equal(&left, &right)),
            _ if left.type_name() == right.type_name() => Value::error(
                span,
                format!(
                    "unknown operator: {} {op} {}",
                    left.type_name(),
                    right.type_name()
                ),
            ),
            _ => Value::error(
                span,
                format!(
                    "type mismatch: {} {op} {}",
                    left.type_name(),
                    right.type_name()
                ),
            ),
        },
    }
}

/// The `==`/`!=` rules for non-numeric operands: primitives by value,
/// arrays, hashes and functions by reference, mixed kinds never equal.
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
        (Value::Hash(a), Value::Hash(b)) => Rc::ptr_eq(a, b),
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

fn eval_int_infix(span: Span, op: BinOp, a: i64, b: i64) -> Value {
    match op {
        BinOp::Add => Value::Int(a.wrapping_add(b)),
        BinOp::Sub => Value::Int(a.wrapping_sub(b)),
        BinOp::Mul => Value::Int(a.wrapping_mul(b)),
        // Integer division always promotes, so x / 0 follows IEEE 754.
        BinOp::Div => Value::Float(a as f64 / b as f64),
        BinOp::Mod => {
            if b == 0 {
                Value::error(span, "division by zero")
            } else {
                Value::Int(a.wrapping_rem(b))
            }
        }
        BinOp::BitAnd => Value::Int(a & b),
        BinOp::BitOr => Value::Int(a | b),
        BinOp::BitXor => Value::Int(a ^ b),
        // Shift counts are masked mod 64.
        BinOp::Shl => Value::Int(a.wrapping_shl(b as u32)),
        BinOp::Shr => Value::Int(a.wrapping_shr(b as u32)),
        BinOp::Lt => Value::Bool(a < b),
        BinOp::Le => Value::Bool(a <= b),
        BinOp::Gt => Value::Bool(a > b),
        BinOp::Ge => Value::Bool(a >= b),
        BinOp::Eq => Value::Bool(a == b),
        BinOp::Ne => Value::Bool(a != b),
        BinOp::And | BinOp::Or => {
            Value::error(span, format!("unknown operator: INTEGER {op} INTEGER"))
        }
    }
}

fn eval_float_infix(span: Span, op: BinOp, a: f64, b: f64) -> Value {
    match op {
        BinOp::Add => Value::Float(a + b),
        BinOp::Sub => Value::Float(a - b),
        BinOp::Mul => Value::Float(a * b),
        BinOp::Div => Value::Float(a / b),
        BinOp::Mod => Value::Float(a % b),
        BinOp::Lt => Value::Bool(a < b),
        BinOp::Le => Value::Bool(a <= b),
        BinOp::Gt => Value::Bool(a > b),
        BinOp::Ge => Value::Bool(a >= b),
        BinOp::Eq => Value::Bool(a == b),
        BinOp::Ne => Value::Bool(a != b),
        _ => Value::error(span, format!("unknown operator: FLOAT {op} FLOAT")),
    }
}

fn eval_index(span: Span, left: &Value, index: &Value) -> Value {
    match (left, index) {
        (Value::Array(items), Value::Int(i)) => {
            let items = items.borrow();
            let len = items.len() as i64;
            // Negative indices count from the end; an offset too large to
            // normalize is out of range.
            let i = if *i < 0 {
                match len.checked_add(*i) {
                    Some(i) => i,
                    None => return Value::Null,
                }
            } else {
                *i
            };
            if i < 0 || i >= len {
                Value::Null
            } else {
                items[i as usize].clone()
            }
        }
        (Value::Hash(map), key) => match key.hash_key() {
            Some(hash_key) => {
                let map = map.borrow();
                match map.get(&hash_key) {
                    // A hit must still match the stored key; FNV collisions
                    // land here and miss.
                    Some((stored, value)) if stored == key => value.clone(),
                    _ => Value::Null,
                }
            }
            None => Value::error(span, format!("unusable as hash key: {}", key.type_name())),
        },
        _ => Value::error(
            span,
            format!("index operator not supported: {}", left.type_name()),
        ),
    }
}

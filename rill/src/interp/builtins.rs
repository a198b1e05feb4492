//! Global builtin functions.
//!
//! The array builtins here are non-mutating: `push` and `pop` return new
//! arrays and leave the argument untouched. The mutating variants live on
//! the chaining method tables in [`methods`](super::methods).

use std::collections::HashMap;

use crate::ast::Span;

use super::methods;
use super::value::{BuiltinFn, Value};
use super::Interpreter;

pub(crate) fn register(table: &mut HashMap<&'static str, BuiltinFn>) {
    table.insert("len", builtin_len as BuiltinFn);
    table.insert("first", builtin_first);
    table.insert("last", builtin_last);
    table.insert("rest", builtin_rest);
    table.insert("push", builtin_push);
    table.insert("pop", builtin_pop);
    table.insert("map", builtin_map);
    table.insert("filter", builtin_filter);
    table.insert("reduce", builtin_reduce);
    table.insert("print", builtin_print);
    table.insert("pow", builtin_pow);
    table.insert("sqrt", builtin_sqrt);
    table.insert("abs", builtin_abs);
    table.insert("type", builtin_type);
    table.insert("range", builtin_range);
    table.insert("int", builtin_int);
    table.insert("float", builtin_float);
    table.insert("string", builtin_string);
    table.insert("bool", builtin_bool);
}

fn wrong_args(span: Span, got: usize, want: &str) -> Value {
    Value::error(span, format!("wrong number of arguments. got={got}, want={want}"))
}

fn builtin_len(_interp: &mut Interpreter, span: Span, args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_args(span, args.len(), "1");
    }
    match &args[0] {
        Value::Str(s) => Value::Int(s.chars().count() as i64),
        Value::Array(items) => Value::Int(items.borrow().len() as i64),
        Value::Hash(map) => Value::Int(map.borrow().len() as i64),
        other => Value::error(
            span,
            format!("argument to `len` not supported, got {}", other.type_name()),
        ),
    }
}

fn builtin_first(_interp: &mut Interpreter, span: Span, args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_args(span, args.len(), "1");
    }
    match &args[0] {
        Value::Array(items) => items.borrow().first().cloned().unwrap_or(Value::Null),
        other => Value::error(
            span,
            format!("argument to `first` must be ARRAY, got {}", other.type_name()),
        ),
    }
}

fn builtin_last(_interp: &mut Interpreter, span: Span, args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_args(span, args.len(), "1");
    }
    match &args[0] {
        Value::Array(items) => items.borrow().last().cloned().unwrap_or(Value::Null),
        other => Value::error(
            span,
            format!("argument to `last` must be ARRAY, got {}", other.type_name()),
        ),
    }
}

fn builtin_rest(_interp: &mut Interpreter, span: Span, args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_args(span, args.len(), "1");
    }
    match &args[0] {
        Value::Array(items) => {
            let items = items.borrow();
            if items.is_empty() {
                Value::Null
            } else {
                Value::array(items[1..].to_vec())
            }
        }
        other => Value::error(
            span,
            format!("argument to `rest` must be ARRAY, got {}", other.type_name()),
        ),
    }
}

fn builtin_push(_interp: &mut Interpreter, span: Span, args: &[Value]) -> Value {
    if args.len() != 2 {
        return wrong_args(span, args.len(), "2");
    }
    match &args[0] {
        Value::Array(items) => {
            let mut copy = items.borrow().clone();
            copy.push(args[1].clone());
            Value::array(copy)
        }
        other => Value::error(
            span,
            format!("argument to `push` must be ARRAY, got {}", other.type_name()),
        ),
    }
}

fn builtin_pop(_interp: &mut Interpreter, span: Span, args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_args(span, args.len(), "1");
    }
    match &args[0] {
        Value::Array(items) => {
            let items = items.borrow();
            if items.is_empty() {
                Value::Null
            } else {
                Value::array(items[..items.len() - 1].to_vec())
            }
        }
        other => Value::error(
            span,
            format!("argument to `pop` must be ARRAY, got {}", other.type_name()),
        ),
    }
}

fn builtin_map(interp: &mut Interpreter, span: Span, args: &[Value]) -> Value {
    if args.len() != 2 {
        return wrong_args(span, args.len(), "2");
    }
    if !matches!(args[0], Value::Array(_)) {
        return Value::error(
            span,
            format!("argument to `map` must be ARRAY, got {}", args[0].type_name()),
        );
    }
    methods::map_values(interp, span, &args[0], &args[1])
}

fn builtin_filter(interp: &mut Interpreter, span: Span, args: &[Value]) -> Value {
    if args.len() != 2 {
        return wrong_args(span, args.len(), "2");
    }
    if !matches!(args[0], Value::Array(_)) {
        return Value::error(
            span,
            format!(
                "argument to `filter` must be ARRAY, got {}",
                args[0].type_name()
            ),
        );
    }
    methods::filter_values(interp, span, &args[0], &args[1])
}

// Global order is (array, init, callback); the chaining method takes
// (callback, init).
fn builtin_reduce(interp: &mut Interpreter, span: Span, args: &[Value]) -> Value {
    if args.len() != 3 {
        return wrong_args(span, args.len(), "3");
    }
    if !matches!(args[0], Value::Array(_)) {
        return Value::error(
            span,
            format!(
                "argument to `reduce` must be ARRAY, got {}",
                args[0].type_name()
            ),
        );
    }
    methods::reduce_values(interp, span, &args[0], &args[2], args[1].clone())
}

fn builtin_print(interp: &mut Interpreter, _span: Span, args: &[Value]) -> Value {
    for arg in args {
        let line = arg.to_string();
        interp.write_line(&line);
    }
    Value::Null
}

fn builtin_pow(_interp: &mut Interpreter, span: Span, args: &[Value]) -> Value {
    if args.len() != 2 {
        return wrong_args(span, args.len(), "2");
    }
    match (&args[0], &args[1]) {
        (Value::Int(base), Value::Int(exp)) if *exp >= 0 => {
            let fits = u32::try_from(*exp).ok();
            match fits.and_then(|e| base.checked_pow(e)) {
                Some(n) => Value::Int(n),
                None => Value::Float((*base as f64).powf(*exp as f64)),
            }
        }
        _ => match (args[0].as_f64(), args[1].as_f64()) {
            (Some(base), Some(exp)) => Value::Float(base.powf(exp)),
            _ => Value::error(
                span,
                format!(
                    "arguments to `pow` must be INTEGER or FLOAT, got {} and {}",
                    args[0].type_name(),
                    args[1].type_name()
                ),
            ),
        },
    }
}

fn builtin_sqrt(_interp: &mut Interpreter, span: Span, args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_args(span, args.len(), "1");
    }
    match args[0].as_f64() {
        Some(x) if x < 0.0 => Value::error(span, "sqrt of negative number"),
        Some(x) => Value::Float(x.sqrt()),
        None => Value::error(
            span,
            format!(
                "argument to `sqrt` must be INTEGER or FLOAT, got {}",
                args[0].type_name()
            ),
        ),
    }
}

fn builtin_abs(_interp: &mut Interpreter, span: Span, args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_args(span, args.len(), "1");
    }
    match &args[0] {
        Value::Int(n) => Value::Int(n.wrapping_abs()),
        Value::Float(x) => Value::Float(x.abs()),
        other => Value::error(
            span,
            format!(
                "argument to `abs` must be INTEGER or FLOAT, got {}",
                other.type_name()
            ),
        ),
    }
}

fn builtin_type(_interp: &mut Interpreter, span: Span, args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_args(span, args.len(), "1");
    }
    Value::string(args[0].type_name())
}

fn builtin_range(_interp: &mut Interpreter, span: Span, args: &[Value]) -> Value {
    let (from, to) = match args {
        [Value::Int(to)] => (0, *to),
        [Value::Int(from), Value::Int(to)] => (*from, *to),
        [_] | [_, _] => {
            return Value::error(span, "arguments to `range` must be INTEGER");
        }
        _ => return wrong_args(span, args.len(), "1 or 2"),
    };
    let step = if to >= from { 1 } else { -1 };
    let mut items = Vec::new();
    let mut i = from;
    while i != to {
        items.push(Value::Int(i));
        i += step;
    }
    Value::array(items)
}

fn builtin_int(_interp: &mut Interpreter, span: Span, args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_args(span, args.len(), "1");
    }
    match &args[0] {
        Value::Int(n) => Value::Int(*n),
        Value::Float(x) => Value::Int(*x as i64),
        Value::Bool(b) => Value::Int(i64::from(*b)),
        Value::Str(s) => {
            let trimmed = s.trim();
            match trimmed.parse::<i64>() {
                Ok(n) => Value::Int(n),
                Err(_) => match trimmed.parse::<f64>() {
                    Ok(x) => Value::Int(x as i64),
                    Err(_) => Value::error(span, "cannot convert STRING to INTEGER"),
                },
            }
        }
        other => Value::error(
            span,
            format!("cannot convert {} to INTEGER", other.type_name()),
        ),
    }
}

fn builtin_float(_interp: &mut Interpreter, span: Span, args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_args(span, args.len(), "1");
    }
    match &args[0] {
        Value::Int(n) => Value::Float(*n as f64),
        Value::Float(x) => Value::Float(*x),
        Value::Bool(b) => Value::Float(f64::from(u8::from(*b))),
        Value::Str(s) => match s.trim().parse::<f64>() {
            Ok(x) => Value::Float(x),
            Err(_) => Value::error(span, "cannot convert STRING to FLOAT"),
        },
        other => Value::error(
            span,
            format!("cannot convert {} to FLOAT", other.type_name()),
        ),
    }
}

fn builtin_string(_interp: &mut Interpreter, span: Span, args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_args(span, args.len(), "1");
    }
    Value::string(args[0].to_string())
}

fn builtin_bool(_interp: &mut Interpreter, span: Span, args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_args(span, args.len(), "1");
    }
    match args[0].coerce_bool() {
        Ok(b) => Value::Bool(b),
        Err(type_name) => {
            Value::error(span, format!("cannot convert {type_name} to BOOLEAN"))
        }
    }
}

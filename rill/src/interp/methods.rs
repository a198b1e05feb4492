//! Chaining method tables for arrays and strings.
//!
//! `recv.push(v)` and `recv.pop()` mutate the receiver in place, which is
//! what makes `arr.push(4).length()` observe the new element; the global
//! `push`/`pop` builtins are the non-mutating counterparts. The iteration
//! methods snapshot the elements up front so callbacks may touch the
//! receiver without upsetting the borrow.

use crate::ast::Span;

use super::value::Value;
use super::Interpreter;

pub(crate) type MethodFn = fn(&mut Interpreter, Span, &Value, &[Value]) -> Value;

pub(crate) fn array_method(name: &str) -> Option<MethodFn> {
    let method: MethodFn = match name {
        "length" => array_length,
        "push" => array_push,
        "pop" => array_pop,
        "map" => array_map,
        "filter" => array_filter,
        "reduce" => array_reduce,
        _ => return None,
    };
    Some(method)
}

pub(crate) fn string_method(name: &str) -> Option<MethodFn> {
    let method: MethodFn = match name {
        "length" => string_length,
        "upper" => string_upper,
        "lower" => string_lower,
        "split" => string_split,
        _ => return None,
    };
    Some(method)
}

fn wrong_args(span: Span, got: usize, want: &str) -> Value {
    Value::error(span, format!("wrong number of arguments. got={got}, want={want}"))
}

fn no_such_method(span: Span, receiver: &Value, name: &str) -> Value {
    Value::error(span, format!("{} has no method {name}", receiver.type_name()))
}

// Array methods

fn array_length(_interp: &mut Interpreter, span: Span, receiver: &Value, args: &[Value]) -> Value {
    if !args.is_empty() {
        return wrong_args(span, args.len(), "0");
    }
    match receiver {
        Value::Array(items) => Value::Int(items.borrow().len() as i64),
        other => no_such_method(span, other, "length"),
    }
}

/// Appends in place and returns the receiver, so pushes chain.
fn array_push(_interp: &mut Interpreter, span: Span, receiver: &Value, args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_args(span, args.len(), "1");
    }
    match receiver {
        Value::Array(items) => {
            items.borrow_mut().push(args[0].clone());
            receiver.clone()
        }
        other => no_such_method(span, other, "push"),
    }
}

/// Removes and returns the last element, or the element at the given index.
fn array_pop(_interp: &mut Interpreter, span: Span, receiver: &Value, args: &[Value]) -> Value {
    let items = match receiver {
        Value::Array(items) => items,
        other => return no_such_method(span, other, "pop"),
    };
    let mut items = items.borrow_mut();
    match args {
        [] => match items.pop() {
            Some(value) => value,
            None => Value::error(span, "pop from empty array"),
        },
        [Value::Int(i)] => {
            if items.is_empty() {
                return Value::error(span, "pop from empty array");
            }
            if *i < 0 || *i >= items.len() as i64 {
                return Value::error(span, format!("pop index out of range: {i}"));
            }
            items.remove(*i as usize)
        }
        [other] => Value::error(
            span,
            format!("argument to `pop` must be INTEGER, got {}", other.type_name()),
        ),
        _ => wrong_args(span, args.len(), "0 or 1"),
    }
}

fn array_map(interp: &mut Interpreter, span: Span, receiver: &Value, args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_args(span, args.len(), "1");
    }
    map_values(interp, span, receiver, &args[0])
}

fn array_filter(interp: &mut Interpreter, span: Span, receiver: &Value, args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_args(span, args.len(), "1");
    }
    filter_values(interp, span, receiver, &args[0])
}

/// Chaining order is (callback, init).
fn array_reduce(interp: &mut Interpreter, span: Span, receiver: &Value, args: &[Value]) -> Value {
    if args.len() != 2 {
        return wrong_args(span, args.len(), "2");
    }
    reduce_values(interp, span, receiver, &args[0], args[1].clone())
}

fn snapshot(receiver: &Value) -> Vec<Value> {
    match receiver {
        Value::Array(items) => items.borrow().clone(),
        _ => Vec::new(),
    }
}

/// Shared by the `map` builtin and `Array.map`. Callbacks are offered
/// `(element, index, array)` and may declare any prefix of that.
pub(crate) fn map_values(
    interp: &mut Interpreter,
    span: Span,
    receiver: &Value,
    callback: &Value,
) -> Value {
    let items = snapshot(receiver);
    let mut mapped = Vec::with_capacity(items.len());
    for (i, element) in items.into_iter().enumerate() {
        let offered = [element, Value::Int(i as i64), receiver.clone()];
        let v = interp.call_callback(span, callback, &offered, 1);
        if v.is_error() {
            return v;
        }
        mapped.push(v);
    }
    Value::array(mapped)
}

pub(crate) fn filter_values(
    interp: &mut Interpreter,
    span: Span,
    receiver: &Value,
    callback: &Value,
) -> Value {
    let items = snapshot(receiver);
    let mut kept = Vec::new();
    for (i, element) in items.into_iter().enumerate() {
        let offered = [element.clone(), Value::Int(i as i64), receiver.clone()];
        let verdict = interp.call_callback(span, callback, &offered, 1);
        if verdict.is_error() {
            return verdict;
        }
        match verdict.coerce_bool() {
            Ok(true) => kept.push(element),
            Ok(false) => {}
            Err(type_name) => {
                return Value::error(span, format!("cannot convert {type_name} to BOOLEAN"));
            }
        }
    }
    Value::array(kept)
}

/// Callbacks are offered `(accumulator, element, index, array)`.
pub(crate) fn reduce_values(
    interp: &mut Interpreter,
    span: Span,
    receiver: &Value,
    callback: &Value,
    init: Value,
) -> Value {
    let items = snapshot(receiver);
    let mut acc = init;
    for (i, element) in items.into_iter().enumerate() {
        let offered = [acc, element, Value::Int(i as i64), receiver.clone()];
        let v = interp.call_callback(span, callback, &offered, 2);
        if v.is_error() {
            return v;
        }
        acc = v;
    }
    acc
}

// String methods

fn string_chars(receiver: &Value) -> Option<&str> {
    match receiver {
        Value::Str(s) => Some(s.as_str()),
        _ => None,
    }
}

fn string_length(_interp: &mut Interpreter, span: Span, receiver: &Value, args: &[Value]) -> Value {
    if !args.is_empty() {
        return wrong_args(span, args.len(), "0");
    }
    match string_chars(receiver) {
        Some(s) => Value::Int(s.chars().count() as i64),
        None => no_such_method(span, receiver, "length"),
    }
}

fn string_upper(_interp: &mut Interpreter, span: Span, receiver: &Value, args: &[Value]) -> Value {
    if !args.is_empty() {
        return wrong_args(span, args.len(), "0");
    }
    match string_chars(receiver) {
        Some(s) => Value::string(s.to_uppercase()),
        None => no_such_method(span, receiver, "upper"),
    }
}

fn string_lower(_interp: &mut Interpreter, span: Span, receiver: &Value, args: &[Value]) -> Value {
    if !args.is_empty() {
        return wrong_args(span, args.len(), "0");
    }
    match string_chars(receiver) {
        Some(s) => Value::string(s.to_lowercase()),
        None => no_such_method(span, receiver, "lower"),
    }
}

/// `split()` splits on a single space; `split("")` splits per character.
fn string_split(_interp: &mut Interpreter, span: Span, receiver: &Value, args: &[Value]) -> Value {
    let s = match string_chars(receiver) {
        Some(s) => s,
        None => return no_such_method(span, receiver, "split"),
    };
    let separator = match args {
        [] => " ".to_string(),
        [Value::Str(sep)] => sep.to_string(),
        [other] => {
            return Value::error(
                span,
                format!(
                    "argument to `split` must be STRING, got {}",
                    other.type_name()
                ),
            );
        }
        _ => return wrong_args(span, args.len(), "0 or 1"),
    };
    let parts: Vec<Value> = if separator.is_empty() {
        s.chars().map(|c| Value::string(c.to_string())).collect()
    } else {
        s.split(separator.as_str()).map(Value::string).collect()
    };
    Value::array(parts)
}

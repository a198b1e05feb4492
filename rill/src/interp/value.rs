//! Runtime values.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::{Block, Span, Spanned};

use super::env::EnvRef;
use super::Interpreter;

/// Signature shared by every builtin: the interpreter (for output and
/// callbacks), the span of the call site, and the evaluated arguments.
pub type BuiltinFn = fn(&mut Interpreter, Span, &[Value]) -> Value;

/// A user function together with its captured environment.
#[derive(Clone)]
pub struct Function {
    pub params: Vec<Spanned<String>>,
    pub body: Block,
    pub env: EnvRef,
}

impl fmt::Debug for Function {
    // The captured environment may contain the function itself, so it is
    // left out of the debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Every value the evaluator produces. Errors and the control-flow signals
/// (`Return`, `Break`, `Continue`) travel as values and are intercepted at
/// block, loop and call boundaries.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(Rc<String>),
    Array(Rc<RefCell<Vec<Value>>>),
    Hash(Rc<RefCell<HashMap<HashKey, (Value, Value)>>>),
    Function(Rc<Function>),
    Builtin { name: &'static str, func: BuiltinFn },
    Return(Box<Value>),
    Break,
    Continue,
    Error { message: String },
}

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(Rc::new(s.into()))
    }

    /// A runtime error carrying its `[line:column]` prefix.
    pub fn error(span: Span, message: impl fmt::Display) -> Self {
        Value::Error {
            message: format!("{span} {message}"),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error { .. })
    }

    /// Only `null` and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Int(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::Bool(_) => "BOOLEAN",
            Value::Str(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
            Value::Function(_) => "FUNCTION",
            Value::Builtin { .. } => "BUILTIN",
            Value::Return(_) => "RETURN_VALUE",
            Value::Break => "BREAK",
            Value::Continue => "CONTINUE",
            Value::Error { .. } => "ERROR",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// The conversion table behind `bool(x)` and filter predicates.
    /// `Err` carries the type name of an inconvertible value.
    pub fn coerce_bool(&self) -> Result<bool, &'static str> {
        match self {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(*b),
            Value::Int(n) => Ok(*n != 0),
            Value::Float(x) => Ok(*x != 0.0),
            Value::Str(s) => Ok(!s.is_empty()),
            Value::Array(items) => Ok(!items.borrow().is_empty()),
            Value::Hash(map) => Ok(!map.borrow().is_empty()),
            other => Err(other.type_name()),
        }
    }

    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Int(n) => Some(HashKey {
                tag: HashTag::Int,
                value: *n as u64,
            }),
            Value::Bool(b) => Some(HashKey {
                tag: HashTag::Bool,
                value: *b as u64,
            }),
            Value::Str(s) => Some(HashKey {
                tag: HashTag::Str,
                value: fnv1a(s.as_bytes()),
            }),
            _ => None,
        }
    }

    /// Rendering for values nested inside arrays and hashes, where strings
    /// keep their quotes.
    fn write_quoted(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "\"{s}\""),
            other => write!(f, "{other}"),
        }
    }
}

/// Precomputed key for hash storage: a type tag plus a 64-bit payload.
/// String payloads are FNV-1a hashes, so lookups confirm the stored key
/// still equals the probe before trusting a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    tag: HashTag,
    value: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum HashTag {
    Int,
    Bool,
    Str,
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

// Arrays and hashes can contain themselves; rendering such a value would
// recurse forever, so nesting past this depth prints as a placeholder.
const MAX_DISPLAY_DEPTH: usize = 64;

thread_local! {
    static DISPLAY_DEPTH: Cell<usize> = const { Cell::new(0) };
}

struct DepthGuard;

impl DepthGuard {
    fn enter() -> Option<DepthGuard> {
        DISPLAY_DEPTH.with(|depth| {
            if depth.get() >= MAX_DISPLAY_DEPTH {
                None
            } else {
                depth.set(depth.get() + 1);
                Some(DepthGuard)
            }
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DISPLAY_DEPTH.with(|depth| depth.set(depth.get() - 1));
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => f.write_str(s),
            Value::Array(items) => {
                let _guard = match DepthGuard::enter() {
                    Some(guard) => guard,
                    None => return f.write_str("[...]"),
                };
                f.write_str("[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.write_quoted(f)?;
                }
                f.write_str("]")
            }
            Value::Hash(map) => {
                let _guard = match DepthGuard::enter() {
                    Some(guard) => guard,
                    None => return f.write_str("{...}"),
                };
                f.write_str("{")?;
                for (i, (key, value)) in map.borrow().values().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    key.write_quoted(f)?;
                    f.write_str(": ")?;
                    value.write_quoted(f)?;
                }
                f.write_str("}")
            }
            Value::Function(func) => {
                f.write_str("func(")?;
                for (i, p) in func.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&p.node)?;
                }
                write!(f, ") {}", func.body)
            }
            Value::Builtin { name, .. } => write!(f, "builtin function {name}"),
            Value::Return(v) => v.fmt(f),
            Value::Break => f.write_str("break"),
            Value::Continue => f.write_str("continue"),
            Value::Error { message } => f.write_str(message),
        }
    }
}

/// Structural equality, used by the tests and internally; the language's
/// `==` operator has its own rules in the evaluator (reference semantics
/// for arrays and hashes).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::Hash(a), Value::Hash(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin { name: a, .. }, Value::Builtin { name: b, .. }) => a == b,
            (Value::Return(a), Value::Return(b)) => a == b,
            (Value::Break, Value::Break) => true,
            (Value::Continue, Value::Continue) => true,
            (Value::Error { message: a }, Value::Error { message: b }) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Int(0).is_truthy());
        assert!(Value::string("").is_truthy());
    }

    #[test]
    fn bool_coercion_table() {
        assert_eq!(Value::Null.coerce_bool(), Ok(false));
        assert_eq!(Value::Int(0).coerce_bool(), Ok(false));
        assert_eq!(Value::Int(-3).coerce_bool(), Ok(true));
        assert_eq!(Value::Float(0.0).coerce_bool(), Ok(false));
        assert_eq!(Value::string("").coerce_bool(), Ok(false));
        assert_eq!(Value::string("x").coerce_bool(), Ok(true));
        assert_eq!(Value::array(vec![]).coerce_bool(), Ok(false));
        assert_eq!(Value::array(vec![Value::Null]).coerce_bool(), Ok(true));
        assert_eq!(Value::Break.coerce_bool(), Err("BREAK"));
    }

    #[test]
    fn hash_keys_distinguish_types() {
        let one = Value::Int(1).hash_key().unwrap();
        let yes = Value::Bool(true).hash_key().unwrap();
        assert_ne!(one, yes);
        assert_eq!(Value::string("a").hash_key(), Value::string("a").hash_key());
        assert!(Value::array(vec![]).hash_key().is_none());
        assert!(Value::Null.hash_key().is_none());
    }

    #[test]
    fn display_quotes_strings_inside_containers() {
        let arr = Value::array(vec![Value::string("hello"), Value::Int(2)]);
        assert_eq!(arr.to_string(), "[\"hello\", 2]");
        assert_eq!(Value::string("hello").to_string(), "hello");
    }

    #[test]
    fn display_of_cyclic_containers_is_bounded() {
        let arr = Value::array(vec![Value::Int(1)]);
        if let Value::Array(items) = &arr {
            items.borrow_mut().push(arr.clone());
        }
        let rendered = arr.to_string();
        assert!(rendered.starts_with("[1, "), "{rendered}");
        assert!(rendered.contains("[...]"), "{rendered}");

        let map = Value::Hash(Rc::new(RefCell::new(HashMap::new())));
        if let Value::Hash(pairs) = &map {
            let key = Value::string("a");
            let hk = key.hash_key().unwrap();
            pairs.borrow_mut().insert(hk, (key, arr));
        }
        assert!(map.to_string().contains("[...]"), "{map}");
    }

    #[test]
    fn error_carries_position_prefix() {
        let err = Value::error(Span::new(2, 3, 1, 4), "type mismatch: INTEGER + BOOLEAN");
        assert_eq!(err.to_string(), "[1:4] type mismatch: INTEGER + BOOLEAN");
    }

    #[test]
    fn type_names_are_uppercase() {
        assert_eq!(Value::Int(1).type_name(), "INTEGER");
        assert_eq!(Value::Float(1.0).type_name(), "FLOAT");
        assert_eq!(Value::array(vec![]).type_name(), "ARRAY");
        assert_eq!(Value::Null.type_name(), "NULL");
    }
}

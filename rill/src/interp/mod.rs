//! The tree-walking interpreter: values, environments, evaluation,
//! builtins and chaining methods.

mod builtins;
mod env;
mod eval;
mod methods;
mod value;

pub use env::{child_env, EnvRef, Environment};
pub use eval::Interpreter;
pub use value::{BuiltinFn, Function, HashKey, Value};

//! Rill: a small dynamically-typed scripting language.
//!
//! The pipeline is the classic one: [`lexer::tokenize`] produces tokens,
//! [`parser::parse`] builds an AST (collecting every error it can find),
//! and [`interp::Interpreter`] walks the tree. Runtime errors are values,
//! prefixed with their `[line:column]` position.

pub mod ast;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod repl;

pub use ast::Span;
pub use error::ParseError;

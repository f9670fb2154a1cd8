//! Spreadsheet-style formula language.
//!
//! Formulas such as `IF({order.total} > 100, {order.total} * 0.9, 0)` are
//! tokenized, parsed into a tree and then either evaluated against a map
//! of inputs ([`FormulaEngine`]) or type-checked against declared field
//! types ([`CheckEngine`]).

#[cfg(feature = "cli")]
pub mod cli;

pub mod ast;
pub mod checker;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod references;
pub mod types;
pub mod value;
pub mod visitor;

pub use ast::{Expression, Token, TokenKind};
pub use checker::TypeChecker;
pub use engine::{
    Check, CheckEngine, Engine, EngineOptions, Evaluate, FormulaEngine, Mode, ReferenceResolver,
};
pub use error::{
    CheckError, ErrorKind, ErrorPayload, EvalError, FormulaError, FormulaResult, FunctionFailure,
    LexError, ParseError, ResolveError,
};
pub use evaluator::Interpreter;
pub use functions::{CheckFn, EvalFn, FunctionDef, FunctionRegistry, Signature};
pub use lexer::{Lexer, tokenize};
pub use parser::{Parser, parse};
pub use types::{TypeMap, ValueType};
pub use value::Value;
pub use visitor::Visitor;

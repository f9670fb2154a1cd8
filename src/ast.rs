//! # Formula Language - Parse Tree
//!
//! This module defines the tokens and the parse tree of the formula
//! language, a spreadsheet-style expression language evaluated against a
//! map of named inputs.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[operators]** - Operators and the grammar levels they are legal at
//! - **[nodes]** - Parse tree nodes, one per grammar rule
//!
//! ## Quick Start
//!
//! ```text
//! IF({order.total} > 100, {order.total} * 0.9, {order.total})
//! ```
//!
//! This formula reads the `order.total` field and applies a discount above
//! a threshold.
//!
//! ## Grammar
//!
//! From loosest to tightest binding:
//!
//! ```text
//! expression     := comma_group
//! comma_group    := logical ("," logical)*
//! logical        := comparison (("&&" | "||") comparison)*
//! comparison     := additive (("==" | "!=" | "===" | "!==" | ">" | ">=" | "<" | "<=" | "&" | "|") additive)*
//! additive       := multiplicative (("+" | "-") multiplicative)*
//! multiplicative := atomic (("*" | "/") atomic)*
//! atomic         := primary ("[" expression "]")* ("++" | "--")?
//! primary        := array | call | "(" expression ")" | reference | literal
//!                 | ("!" | "+" | "-" | "++" | "--") atomic
//! ```
//!
//! Every binary level is a left-associative [`Chain`]. `&` and `|` sit at
//! the comparison level, so `1 + 2 & 3 + 4` is `(1 + 2) & (3 + 4)`.
//!
//! ## Literals
//!
//! - Numbers: `1`, `2.5`, `1e3`
//! - Strings: `"text"`, `'text'`
//! - Dates: `2024-03-05T10:00:00.000Z`
//! - Keywords: `true`, `false`, `null`, `undefined`, `NaN`
//!
//! Literals keep their raw lexeme in the tree. Conversion to runtime values
//! happens in the evaluator.
//!
//! ## Examples
//!
//! ### Field references
//!
//! ```text
//! {price} * {quantity}
//! {customer.address.city}
//! ```
//!
//! ### Arrays and indexing
//!
//! ```text
//! SUM([1, 2, 3])
//! [10, 20, 30][1]
//! ```
//!
//! ### Comma groups
//!
//! ```text
//! ({a}, {b}, {a} + {b})   // value of the last item
//! ```

pub mod nodes;
pub mod operators;
pub mod tokens;

pub use nodes::{
    Additive, ArrayLiteral, Atomic, Chain, CommaGroup, Comparison, Expression, Fixity,
    FunctionCall, Group, Literal, LiteralKind, Logical, Multiplicative, Primary, Reference, Unary,
};
pub use operators::{Level, Operator};
pub use tokens::{Token, TokenKind};

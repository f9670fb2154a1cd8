use crate::ast::{Operator, Token};

/// Root of a parsed formula.
///
/// The tree is concrete: one node per grammar rule, binary levels kept as
/// left-associative chains rather than nested binary nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub group: CommaGroup,
}

/// Comma separated sequence of logical expressions; evaluates to the last one.
///
/// # Examples
/// ```text
/// 1 + 2
/// {a}, {b}, {a} * {b}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CommaGroup {
    /// Never empty
    pub items: Vec<Logical>,
}

/// One precedence level: a head operand followed by `(operator, operand)`
/// pairs, folded left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain<T> {
    pub head: T,
    pub rest: Vec<(Token, T)>,
}

impl<T> Chain<T> {
    pub fn single(head: T) -> Self {
        Chain {
            head,
            rest: Vec::new(),
        }
    }

    /// Operators of the chain, in source order.
    pub fn operators(&self) -> impl Iterator<Item = &Token> {
        self.rest.iter().map(|(token, _)| token)
    }

    /// All operands, head first.
    pub fn operands(&self) -> impl Iterator<Item = &T> {
        std::iter::once(&self.head).chain(self.rest.iter().map(|(_, operand)| operand))
    }
}

/// `&&` / `||`
pub type Logical = Chain<Comparison>;

/// `==`, `!=`, `===`, `!==`, `>`, `>=`, `<`, `<=`, `&`, `|`
pub type Comparison = Chain<Additive>;

/// `+`, `-`
pub type Additive = Chain<Multiplicative>;

/// `*`, `/`
pub type Multiplicative = Chain<Atomic>;

/// A primary operand with optional trailing index brackets.
///
/// # Examples
/// ```text
/// {items}[0]
/// SPLIT("a,b", ",")[1]
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Atomic {
    pub base: Primary,
    pub indexes: Vec<Expression>,
}

impl Atomic {
    pub fn new(base: Primary) -> Self {
        Atomic {
            base,
            indexes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Primary {
    /// `[e, e, ...]`
    Array(ArrayLiteral),
    /// `NAME(arg, ...)`
    Call(FunctionCall),
    /// `( ... )`
    Group(Group),
    Literal(Literal),
    /// `{a.b.c}`
    Reference(Reference),
    Unary(Unary),
}

/// Array literal, elements are logical-level expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLiteral {
    pub open: Token,
    pub elements: Vec<Logical>,
}

/// Function call.
///
/// Arguments are logical-level expressions, so a comma always separates
/// arguments and never forms a comma group.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// The `Func` token; its text is the function name
    pub name: Token,
    pub args: Vec<Logical>,
}

impl FunctionCall {
    pub fn name(&self) -> &str {
        &self.name.text
    }
}

/// Parenthesised expression, possibly a comma group.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub inner: Box<Expression>,
}

/// Field reference; `path` is the token text without braces.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub path: String,
    pub token: Token,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixity {
    Prefix,
    Postfix,
}

/// Unary operator applied to a single atomic operand.
///
/// # Examples
/// ```text
/// !{done}
/// -3
/// ++{count}
/// {count}--
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Unary {
    pub operator: Token,
    pub operand: Box<Atomic>,
    pub fixity: Fixity,
}

impl Unary {
    /// The operator; always present because the parser only builds unary
    /// nodes from operator tokens.
    pub fn op(&self) -> Option<Operator> {
        self.operator.operator()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    String,
    Date,
    Number,
    Boolean,
    Null,
    Undefined,
    NaN,
}

/// Literal with its raw lexeme; conversion to a value happens at visit time.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub kind: LiteralKind,
    pub token: Token,
}

impl Literal {
    pub fn raw(&self) -> &str {
        &self.token.text
    }
}

use std::fmt;

use crate::ast::Operator;

/// A token produced by the lexer.
///
/// Tokens keep their raw lexeme; turning a literal into a runtime value is
/// the evaluator's job, never the lexer's or the parser's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// What kind of token this is
    pub kind: TokenKind,
    /// The exact source text that was matched
    pub text: String,
    /// Byte offset of the first character in the formula
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, offset: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            offset,
        }
    }

    /// The operator this token stands for, if it is one.
    pub fn operator(&self) -> Option<Operator> {
        self.kind.operator()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// The closed set of token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Delimiters
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[` - array literals and index access
    LSquare,
    /// `]`
    RSquare,
    /// `,` - separates arguments, array elements and comma groups
    Comma,

    // Names
    /// Function name, upper case letters, digits and underscores
    ///
    /// # Examples
    /// ```text
    /// SUM
    /// DATEDIF
    /// ```
    Func,

    /// Field reference, a dotted path in braces
    ///
    /// # Examples
    /// ```text
    /// {price}
    /// {order.items.0}
    /// ```
    Reference,

    // Literals
    /// Single or double quoted string, escapes kept verbatim
    StringLiteral,

    /// ISO-like timestamp
    ///
    /// # Examples
    /// ```text
    /// 2023-01-01T00:00:00Z
    /// 2023-01-01T08:30:00.000Z
    /// ```
    DateLiteral,

    /// Decimal number with optional fraction and exponent
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 3.14
    /// 1e5
    /// ```
    NumberLiteral,

    /// `true` or `false`
    BooleanLiteral,

    /// `null`
    NullLiteral,

    /// `undefined`
    UndefinedLiteral,

    /// `NaN`
    NaNLiteral,

    // Additive
    /// `+`
    Plus,
    /// `-`
    Minus,

    // Multiplicative
    /// `*`
    Star,
    /// `/`
    Slash,

    // Comparison
    /// `==`
    EqualLoose,
    /// `!=`
    NotEqualLoose,
    /// `===`
    EqualStrict,
    /// `!==`
    NotEqualStrict,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,

    // Bitwise
    /// `&`
    BitwiseAnd,
    /// `|`
    BitwiseOr,

    // Logical
    /// `&&`
    LogicalAnd,
    /// `||`
    LogicalOr,

    // Unary only
    /// `++`
    Increment,
    /// `--`
    Decrement,
    /// `!`
    LogicalNot,
}

impl TokenKind {
    /// Maps operator tokens to their [`Operator`]; delimiters, names and
    /// literals yield `None`.
    pub fn operator(self) -> Option<Operator> {
        use TokenKind::*;
        let op = match self {
            Plus => Operator::Add,
            Minus => Operator::Subtract,
            Star => Operator::Multiply,
            Slash => Operator::Divide,
            EqualLoose => Operator::EqualLoose,
            NotEqualLoose => Operator::NotEqualLoose,
            EqualStrict => Operator::EqualStrict,
            NotEqualStrict => Operator::NotEqualStrict,
            Greater => Operator::Greater,
            GreaterOrEqual => Operator::GreaterOrEqual,
            Less => Operator::Less,
            LessOrEqual => Operator::LessOrEqual,
            BitwiseAnd => Operator::BitwiseAnd,
            BitwiseOr => Operator::BitwiseOr,
            LogicalAnd => Operator::LogicalAnd,
            LogicalOr => Operator::LogicalOr,
            Increment => Operator::Increment,
            Decrement => Operator::Decrement,
            LogicalNot => Operator::LogicalNot,
            _ => return None,
        };
        Some(op)
    }

    /// Whether this kind is one of the literal kinds.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::StringLiteral
                | TokenKind::DateLiteral
                | TokenKind::NumberLiteral
                | TokenKind::BooleanLiteral
                | TokenKind::NullLiteral
                | TokenKind::UndefinedLiteral
                | TokenKind::NaNLiteral
        )
    }
}

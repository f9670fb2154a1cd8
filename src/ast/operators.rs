use std::fmt;

/// Formula operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // Additive (also unary prefix)
    /// Addition or string concatenation (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,

    // Multiplicative
    /// Multiplication (`*`)
    Multiply,
    /// Division (`/`)
    Divide,

    // Comparison
    /// Loose equality (`==`)
    EqualLoose,
    /// Loose inequality (`!=`)
    NotEqualLoose,
    /// Strict equality (`===`)
    EqualStrict,
    /// Strict inequality (`!==`)
    NotEqualStrict,
    /// Greater than (`>`)
    Greater,
    /// Greater than or equal (`>=`)
    GreaterOrEqual,
    /// Less than (`<`)
    Less,
    /// Less than or equal (`<=`)
    LessOrEqual,

    // Bitwise, comparison level
    /// Bitwise AND (`&`)
    BitwiseAnd,
    /// Bitwise OR (`|`)
    BitwiseOr,

    // Logical
    /// Logical AND (`&&`)
    LogicalAnd,
    /// Logical OR (`||`)
    LogicalOr,

    // Unary only
    /// Increment (`++`)
    Increment,
    /// Decrement (`--`)
    Decrement,
    /// Logical negation (`!`)
    LogicalNot,
}

/// Grammar levels that consume operators, loosest binding first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Logical,
    Comparison,
    Additive,
    Multiplicative,
    /// Prefix position in front of an atomic operand
    UnaryPrefix,
    /// Postfix position after an atomic operand
    UnaryPostfix,
}

use Level::*;

/// Operator → the grammar levels at which it is accepted.
///
/// A single operator may be legal at several levels: `+` and `-` are both
/// additive and unary prefix.
const LEVELS: &[(Operator, &[Level])] = &[
    (Operator::Add, &[Additive, UnaryPrefix]),
    (Operator::Subtract, &[Additive, UnaryPrefix]),
    (Operator::Multiply, &[Multiplicative]),
    (Operator::Divide, &[Multiplicative]),
    (Operator::EqualLoose, &[Comparison]),
    (Operator::NotEqualLoose, &[Comparison]),
    (Operator::EqualStrict, &[Comparison]),
    (Operator::NotEqualStrict, &[Comparison]),
    (Operator::Greater, &[Comparison]),
    (Operator::GreaterOrEqual, &[Comparison]),
    (Operator::Less, &[Comparison]),
    (Operator::LessOrEqual, &[Comparison]),
    (Operator::BitwiseAnd, &[Comparison]),
    (Operator::BitwiseOr, &[Comparison]),
    (Operator::LogicalAnd, &[Logical]),
    (Operator::LogicalOr, &[Logical]),
    (Operator::Increment, &[UnaryPrefix, UnaryPostfix]),
    (Operator::Decrement, &[UnaryPrefix, UnaryPostfix]),
    (Operator::LogicalNot, &[UnaryPrefix]),
];

impl Operator {
    /// The grammar levels at which this operator may appear.
    pub fn levels(self) -> &'static [Level] {
        LEVELS
            .iter()
            .find(|(op, _)| *op == self)
            .map(|(_, levels)| *levels)
            .unwrap_or(&[])
    }

    /// Whether the operator may appear at `level`.
    pub fn is_legal_at(self, level: Level) -> bool {
        self.levels().contains(&level)
    }

    /// Source spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::EqualLoose => "==",
            Operator::NotEqualLoose => "!=",
            Operator::EqualStrict => "===",
            Operator::NotEqualStrict => "!==",
            Operator::Greater => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::Less => "<",
            Operator::LessOrEqual => "<=",
            Operator::BitwiseAnd => "&",
            Operator::BitwiseOr => "|",
            Operator::LogicalAnd => "&&",
            Operator::LogicalOr => "||",
            Operator::Increment => "++",
            Operator::Decrement => "--",
            Operator::LogicalNot => "!",
        }
    }

    pub fn is_bitwise(self) -> bool {
        matches!(self, Operator::BitwiseAnd | Operator::BitwiseOr)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitwise_operators_bind_at_comparison_level() {
        for op in [Operator::BitwiseAnd, Operator::BitwiseOr] {
            assert!(!op.is_legal_at(Level::Additive));
            assert!(op.is_legal_at(Level::Comparison));
            assert!(!op.is_legal_at(Level::Logical));
        }
    }

    #[test]
    fn plus_and_minus_double_as_prefix_operators() {
        assert!(Operator::Add.is_legal_at(Level::UnaryPrefix));
        assert!(Operator::Subtract.is_legal_at(Level::UnaryPrefix));
        assert!(!Operator::Add.is_legal_at(Level::UnaryPostfix));
        assert!(!Operator::Multiply.is_legal_at(Level::UnaryPrefix));
    }

    #[test]
    fn every_operator_has_a_level() {
        for (op, levels) in LEVELS {
            assert!(!levels.is_empty(), "{op} has no level");
            assert_eq!(op.levels(), *levels);
        }
    }
}

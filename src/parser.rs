use crate::ast::{
    Additive, ArrayLiteral, Atomic, Chain, CommaGroup, Comparison, Expression, Fixity,
    FunctionCall, Group, Level, Literal, LiteralKind, Logical, Multiplicative, Primary, Reference,
    Token, TokenKind, Unary,
};
use crate::error::ParseError;

/// Recursive-descent parser, one rule per precedence level.
///
/// Loosest to tightest: comma group, logical, comparison, additive,
/// multiplicative, atomic. Every binary level is parsed into a [`Chain`] so
/// that operators associate strictly left to right.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
    max_depth: Option<usize>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            position: 0,
            depth: 0,
            max_depth: None,
        }
    }

    /// Bound the nesting of groups, calls, arrays, indexes and unary operators.
    pub fn with_max_depth(mut self, limit: Option<usize>) -> Self {
        self.max_depth = limit;
        self
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().is_some_and(|t| t.kind == kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.current() {
            Some(token) => ParseError::UnexpectedToken {
                expected,
                found: token.text.clone(),
                offset: token.offset,
            },
            None => ParseError::UnexpectedEnd { expected },
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token, ParseError> {
        if self.check(kind) {
            self.advance().ok_or(ParseError::UnexpectedEnd { expected })
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Tokens not consumed so far.
    pub fn remaining(&self) -> &[Token] {
        &self.tokens[self.position.min(self.tokens.len())..]
    }

    /// Parse the whole token stream; leftover tokens are an error.
    pub fn parse(&mut self) -> Result<Expression, ParseError> {
        let expression = self.parse_prefix()?;
        if let Some(token) = self.current() {
            return Err(ParseError::TrailingInput {
                found: token.text.clone(),
                offset: token.offset,
            });
        }
        Ok(expression)
    }

    /// Parse the longest expression at the start of the stream and stop.
    pub fn parse_prefix(&mut self) -> Result<Expression, ParseError> {
        let expression = self.parse_expression()?;
        tracing::trace!(
            consumed = self.position,
            remaining = self.remaining().len(),
            "parsed expression"
        );
        Ok(expression)
    }

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        Ok(Expression {
            group: self.parse_comma_group()?,
        })
    }

    fn parse_comma_group(&mut self) -> Result<CommaGroup, ParseError> {
        let mut items = vec![self.parse_logical()?];
        while self.check(TokenKind::Comma) {
            self.advance();
            items.push(self.parse_logical()?);
        }
        Ok(CommaGroup { items })
    }

    fn parse_chain<T>(
        &mut self,
        level: Level,
        operand: fn(&mut Self) -> Result<T, ParseError>,
    ) -> Result<Chain<T>, ParseError> {
        let head = operand(self)?;
        let mut rest = Vec::new();
        while self
            .current()
            .and_then(Token::operator)
            .is_some_and(|op| op.is_legal_at(level))
        {
            let Some(token) = self.advance() else { break };
            rest.push((token, operand(self)?));
        }
        Ok(Chain { head, rest })
    }

    fn parse_logical(&mut self) -> Result<Logical, ParseError> {
        self.parse_chain(Level::Logical, Self::parse_comparison)
    }

    fn parse_comparison(&mut self) -> Result<Comparison, ParseError> {
        self.parse_chain(Level::Comparison, Self::parse_additive)
    }

    fn parse_additive(&mut self) -> Result<Additive, ParseError> {
        self.parse_chain(Level::Additive, Self::parse_multiplicative)
    }

    fn parse_multiplicative(&mut self) -> Result<Multiplicative, ParseError> {
        self.parse_chain(Level::Multiplicative, Self::parse_atomic)
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if let Some(limit) = self.max_depth
            && self.depth > limit
        {
            let offset = self.current().map(|t| t.offset).unwrap_or_default();
            return Err(ParseError::TooDeep { limit, offset });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Primary operand, trailing `[index]` accesses, then an optional postfix
    /// `++` / `--`.
    fn parse_atomic(&mut self) -> Result<Atomic, ParseError> {
        self.enter()?;
        let atomic = self.parse_atomic_inner();
        self.leave();
        atomic
    }

    fn parse_atomic_inner(&mut self) -> Result<Atomic, ParseError> {
        let base = self.parse_primary()?;
        let mut atomic = Atomic::new(base);

        while self.check(TokenKind::LSquare) {
            self.advance();
            let index = self.parse_expression()?;
            self.expect(TokenKind::RSquare, "']'")?;
            atomic.indexes.push(index);
        }

        if let Some(token) = self.current()
            && token
                .operator()
                .is_some_and(|op| op.is_legal_at(Level::UnaryPostfix))
        {
            let operator = token.clone();
            self.advance();
            atomic = Atomic::new(Primary::Unary(Unary {
                operator,
                operand: Box::new(atomic),
                fixity: Fixity::Postfix,
            }));
        }

        Ok(atomic)
    }

    fn parse_primary(&mut self) -> Result<Primary, ParseError> {
        let Some(token) = self.current() else {
            return Err(self.unexpected("an operand"));
        };

        match token.kind {
            TokenKind::LSquare => self.parse_array().map(Primary::Array),
            TokenKind::Func => self.parse_call().map(Primary::Call),
            TokenKind::LParen => self.parse_group().map(Primary::Group),
            TokenKind::Reference => {
                let token = token.clone();
                self.advance();
                let path = token.text[1..token.text.len() - 1].to_string();
                Ok(Primary::Reference(Reference { path, token }))
            }
            kind if kind.is_literal() => {
                let token = token.clone();
                self.advance();
                Ok(Primary::Literal(Literal {
                    kind: literal_kind(kind),
                    token,
                }))
            }
            _ if token
                .operator()
                .is_some_and(|op| op.is_legal_at(Level::UnaryPrefix)) =>
            {
                let operator = token.clone();
                self.advance();
                let operand = self.parse_atomic()?;
                Ok(Primary::Unary(Unary {
                    operator,
                    operand: Box::new(operand),
                    fixity: Fixity::Prefix,
                }))
            }
            _ => Err(self.unexpected("an operand")),
        }
    }

    fn parse_array(&mut self) -> Result<ArrayLiteral, ParseError> {
        let open = self.expect(TokenKind::LSquare, "'['")?;
        let mut elements = Vec::new();
        if !self.check(TokenKind::RSquare) {
            elements.push(self.parse_logical()?);
            while self.check(TokenKind::Comma) {
                self.advance();
                elements.push(self.parse_logical()?);
            }
        }
        self.expect(TokenKind::RSquare, "']'")?;
        Ok(ArrayLiteral { open, elements })
    }

    /// `NAME(arg, arg, ...)`, a single trailing comma is allowed.
    fn parse_call(&mut self) -> Result<FunctionCall, ParseError> {
        let name = self.expect(TokenKind::Func, "a function name")?;
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            args.push(self.parse_logical()?);
            while self.check(TokenKind::Comma) {
                self.advance();
                if self.check(TokenKind::RParen) {
                    break;
                }
                args.push(self.parse_logical()?);
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(FunctionCall { name, args })
    }

    fn parse_group(&mut self) -> Result<Group, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;
        let inner = self.parse_expression()?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(Group {
            inner: Box::new(inner),
        })
    }
}

fn literal_kind(kind: TokenKind) -> LiteralKind {
    match kind {
        TokenKind::StringLiteral => LiteralKind::String,
        TokenKind::DateLiteral => LiteralKind::Date,
        TokenKind::BooleanLiteral => LiteralKind::Boolean,
        TokenKind::NullLiteral => LiteralKind::Null,
        TokenKind::UndefinedLiteral => LiteralKind::Undefined,
        TokenKind::NaNLiteral => LiteralKind::NaN,
        _ => LiteralKind::Number,
    }
}

/// Parses a complete token list.
pub fn parse(tokens: Vec<Token>) -> Result<Expression, ParseError> {
    Parser::new(tokens).parse()
}

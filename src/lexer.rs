use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{Token, TokenKind};
use crate::error::LexError;

static DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\d+-]+T[\d:.]+Z").unwrap());
static STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:"(?:\\\\|\\"|[^"])*"|'(?:\\\\|\\'|[^'])*')"#).unwrap()
});
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(?:\.[0-9]+)?(?:e[+-]?[0-9]+)?").unwrap());
static FUNC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z0-9_]+").unwrap());
static REFERENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\{[A-Za-z_0-9.]+\}").unwrap());

/// Fixed spellings, tried in order; longer operators precede their prefixes.
const OPERATORS: &[(&str, TokenKind)] = &[
    ("++", TokenKind::Increment),
    ("--", TokenKind::Decrement),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("===", TokenKind::EqualStrict),
    ("!==", TokenKind::NotEqualStrict),
    ("==", TokenKind::EqualLoose),
    ("!=", TokenKind::NotEqualLoose),
    (">=", TokenKind::GreaterOrEqual),
    (">", TokenKind::Greater),
    ("<=", TokenKind::LessOrEqual),
    ("<", TokenKind::Less),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("[", TokenKind::LSquare),
    ("]", TokenKind::RSquare),
];

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("true", TokenKind::BooleanLiteral),
    ("false", TokenKind::BooleanLiteral),
    ("undefined", TokenKind::UndefinedLiteral),
    ("null", TokenKind::NullLiteral),
    ("NaN", TokenKind::NaNLiteral),
];

const LOGICAL: &[(&str, TokenKind)] = &[
    ("&&", TokenKind::LogicalAnd),
    ("||", TokenKind::LogicalOr),
    ("&", TokenKind::BitwiseAnd),
    ("|", TokenKind::BitwiseOr),
    ("!", TokenKind::LogicalNot),
];

/// Output of [`tokenize`]: every token that could be scanned plus one error
/// per character that could not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

impl Lexed {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Scans a formula into tokens.
///
/// Iterating yields `Err` for a character no token kind matches; the lexer
/// then skips that single character and carries on, so callers can decide
/// whether one bad character is fatal.
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, position: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn current_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(&mut self, len: usize) {
        self.position += len;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance(ch.len_utf8());
            } else {
                break;
            }
        }
    }

    fn emit(&mut self, kind: TokenKind, len: usize) -> Token {
        let start = self.position;
        self.advance(len);
        Token::new(kind, &self.input[start..self.position], start)
    }

    fn match_fixed(&self, table: &[(&str, TokenKind)]) -> Option<(TokenKind, usize)> {
        let rest = self.rest();
        table
            .iter()
            .find(|(text, _)| rest.starts_with(text))
            .map(|(text, kind)| (*kind, text.len()))
    }

    fn match_pattern(&self, pattern: &Regex, kind: TokenKind) -> Option<(TokenKind, usize)> {
        pattern.find(self.rest()).map(|m| (kind, m.end()))
    }

    pub fn next_token(&mut self) -> Option<Result<Token, LexError>> {
        self.skip_whitespace();
        let ch = self.current_char()?;

        let matched = self
            .match_fixed(OPERATORS)
            .or_else(|| self.match_pattern(&DATE, TokenKind::DateLiteral))
            .or_else(|| self.match_pattern(&STRING, TokenKind::StringLiteral))
            .or_else(|| self.match_fixed(KEYWORDS))
            .or_else(|| self.match_pattern(&NUMBER, TokenKind::NumberLiteral))
            .or_else(|| self.match_fixed(LOGICAL))
            .or_else(|| self.match_pattern(&FUNC, TokenKind::Func))
            .or_else(|| self.match_pattern(&REFERENCE, TokenKind::Reference))
            .or_else(|| (ch == ',').then_some((TokenKind::Comma, 1)));

        match matched {
            Some((kind, len)) => Some(Ok(self.emit(kind, len))),
            None => {
                let offset = self.position;
                self.advance(ch.len_utf8());
                Some(Err(LexError { ch, offset }))
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Tokenizes a whole formula, collecting every lex error.
pub fn tokenize(input: &str) -> Lexed {
    let mut lexed = Lexed::default();
    for item in Lexer::new(input) {
        match item {
            Ok(token) => lexed.tokens.push(token),
            Err(error) => lexed.errors.push(error),
        }
    }
    tracing::trace!(
        tokens = lexed.tokens.len(),
        errors = lexed.errors.len(),
        "tokenized formula"
    );
    lexed
}

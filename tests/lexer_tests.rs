// tests/lexer_tests.rs

use formula_lang::ast::TokenKind;
use formula_lang::lexer::{Lexer, tokenize};

fn kinds(input: &str) -> Vec<TokenKind> {
    let lexed = tokenize(input);
    assert!(lexed.is_clean(), "Unexpected lex errors for {input}: {:?}", lexed.errors);
    lexed.tokens.iter().map(|t| t.kind).collect()
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_operator_tokens() {
    let test_cases = vec![
        ("+", TokenKind::Plus),
        ("-", TokenKind::Minus),
        ("*", TokenKind::Star),
        ("/", TokenKind::Slash),
        ("++", TokenKind::Increment),
        ("--", TokenKind::Decrement),
        ("==", TokenKind::EqualLoose),
        ("!=", TokenKind::NotEqualLoose),
        ("===", TokenKind::EqualStrict),
        ("!==", TokenKind::NotEqualStrict),
        (">", TokenKind::Greater),
        (">=", TokenKind::GreaterOrEqual),
        ("<", TokenKind::Less),
        ("<=", TokenKind::LessOrEqual),
        ("&", TokenKind::BitwiseAnd),
        ("|", TokenKind::BitwiseOr),
        ("&&", TokenKind::LogicalAnd),
        ("||", TokenKind::LogicalOr),
        ("!", TokenKind::LogicalNot),
        ("(", TokenKind::LParen),
        (")", TokenKind::RParen),
        ("[", TokenKind::LSquare),
        ("]", TokenKind::RSquare),
        (",", TokenKind::Comma),
    ];

    for (input, expected) in test_cases {
        assert_eq!(kinds(input), vec![expected], "Failed for input: {}", input);
    }
}

#[test]
fn test_longest_operator_wins() {
    assert_eq!(
        kinds("1 !== 2 != 3"),
        vec![
            TokenKind::NumberLiteral,
            TokenKind::NotEqualStrict,
            TokenKind::NumberLiteral,
            TokenKind::NotEqualLoose,
            TokenKind::NumberLiteral,
        ]
    );
    assert_eq!(
        kinds("{a}++ + 1"),
        vec![
            TokenKind::Reference,
            TokenKind::Increment,
            TokenKind::Plus,
            TokenKind::NumberLiteral,
        ]
    );
}

// ============================================================================
// Literals and names
// ============================================================================

#[test]
fn test_literal_tokens() {
    let test_cases = vec![
        ("42", TokenKind::NumberLiteral),
        ("3.14", TokenKind::NumberLiteral),
        ("1e5", TokenKind::NumberLiteral),
        ("'text'", TokenKind::StringLiteral),
        ("\"text\"", TokenKind::StringLiteral),
        (r#""say \"hi\"""#, TokenKind::StringLiteral),
        ("2024-03-05T10:00:00.000Z", TokenKind::DateLiteral),
        ("true", TokenKind::BooleanLiteral),
        ("false", TokenKind::BooleanLiteral),
        ("null", TokenKind::NullLiteral),
        ("undefined", TokenKind::UndefinedLiteral),
        ("NaN", TokenKind::NaNLiteral),
        ("SUM", TokenKind::Func),
        ("DATE_2", TokenKind::Func),
        ("{order.total}", TokenKind::Reference),
    ];

    for (input, expected) in test_cases {
        let lexed = tokenize(input);
        assert!(lexed.is_clean(), "Failed for input: {}", input);
        assert_eq!(lexed.tokens.len(), 1, "Failed for input: {}", input);
        assert_eq!(lexed.tokens[0].kind, expected, "Failed for input: {}", input);
        assert_eq!(lexed.tokens[0].text, input, "Lexeme must be kept raw");
    }
}

#[test]
fn test_string_escapes_are_kept_raw() {
    let lexed = tokenize(r"'it\'s'");
    assert_eq!(lexed.tokens[0].text, r"'it\'s'");
}

// ============================================================================
// Offsets and errors
// ============================================================================

#[test]
fn test_offsets_are_byte_positions() {
    let lexed = tokenize("SUM( {a} ,  2)");
    let offsets: Vec<usize> = lexed.tokens.iter().map(|t| t.offset).collect();
    assert_eq!(offsets, vec![0, 3, 5, 9, 12, 13]);
}

#[test]
fn test_unknown_character_is_an_error() {
    let lexed = tokenize("1 = 2");
    assert_eq!(lexed.errors.len(), 1);
    assert_eq!(lexed.errors[0].ch, '=');
    assert_eq!(lexed.errors[0].offset, 2);
    // Scanning resumes after the bad character.
    assert_eq!(lexed.tokens.len(), 2);
}

#[test]
fn test_lexer_iterator_reports_each_error() {
    let items: Vec<_> = Lexer::new("# 1 @").collect();
    assert_eq!(items.len(), 3);
    assert!(items[0].is_err());
    assert!(items[1].is_ok());
    assert!(items[2].is_err());
}

#[test]
fn test_whitespace_only_yields_nothing() {
    let lexed = tokenize("  \t\n ");
    assert!(lexed.tokens.is_empty());
    assert!(lexed.is_clean());
}

//! Error types for every stage and the structured payload they map to.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ValueType;

/// Result type for engine operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// A character no token kind matches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected character '{ch}' at offset {offset}")]
pub struct LexError {
    pub ch: char,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected {expected} but found '{found}' at offset {offset}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        offset: usize,
    },

    #[error("expected {expected} but the formula ended")]
    UnexpectedEnd { expected: &'static str },

    /// A complete expression was parsed but tokens remain.
    #[error("unexpected '{found}' at offset {offset} after a complete expression")]
    TrailingInput { found: String, offset: usize },

    #[error("formula nests deeper than {limit} levels at offset {offset}")]
    TooDeep { limit: usize, offset: usize },
}

impl ParseError {
    /// Text of the offending token, if there is one.
    pub fn token(&self) -> Option<&str> {
        match self {
            ParseError::UnexpectedToken { found, .. } | ParseError::TrailingInput { found, .. } => {
                Some(found)
            }
            ParseError::UnexpectedEnd { .. } | ParseError::TooDeep { .. } => None,
        }
    }

    pub fn offset(&self) -> Option<usize> {
        match self {
            ParseError::UnexpectedToken { offset, .. }
            | ParseError::TrailingInput { offset, .. }
            | ParseError::TooDeep { offset, .. } => Some(*offset),
            ParseError::UnexpectedEnd { .. } => None,
        }
    }
}

/// Failure raised by a built-in function body.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FunctionFailure {
    #[error("argument {index} must be {expected}, got {found}")]
    Argument {
        /// 1-based
        index: usize,
        expected: &'static str,
        found: String,
    },

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Grammar and interpreter disagree about an operator.
    #[error("unknown operator: {operator} at {offset}")]
    UnknownOperator { operator: String, offset: usize },

    #[error("unknown function: {name} at {offset}")]
    UnknownFunction { name: String, offset: usize },

    #[error("function {name} at {offset} raised an error: {source}")]
    Function {
        name: String,
        offset: usize,
        #[source]
        source: FunctionFailure,
    },

    #[error("division by zero at {offset}")]
    DivisionByZero { offset: usize },
}

/// Contract violation reported by a check-mode function stub.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("expects at least {0} arguments")]
    MinParamCount(usize),

    #[error("expects at most {0} arguments")]
    MaxParamCount(usize),

    #[error("argument {index} must be one of {expected:?}")]
    ParamType {
        /// 0-based
        index: usize,
        expected: Vec<ValueType>,
    },
}

/// Which operand of a binary operator was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("{name} at {offset} expects at least {count} arguments")]
    MinParamCount {
        name: String,
        count: usize,
        offset: usize,
    },

    #[error("{name} at {offset} expects at most {count} arguments")]
    MaxParamCount {
        name: String,
        count: usize,
        offset: usize,
    },

    #[error("argument {index} of {name} at {offset} must be one of {expected:?}, got {found}")]
    ParamType {
        name: String,
        /// 1-based
        index: usize,
        expected: Vec<ValueType>,
        found: ValueType,
        offset: usize,
    },

    #[error("unknown function: {name} at {offset}")]
    UnknownFunction { name: String, offset: usize },

    #[error("{side} operand of '{operator}' at {offset} must be one of {expected:?}, got {found}")]
    Operand {
        operator: String,
        side: Side,
        expected: Vec<ValueType>,
        found: ValueType,
        offset: usize,
    },
}

impl CheckError {
    /// Attach function name and call site to a stub's contract violation.
    pub fn from_signature(
        name: &str,
        offset: usize,
        args: &[ValueType],
        error: SignatureError,
    ) -> Self {
        let name = name.to_string();
        match error {
            SignatureError::MinParamCount(count) => CheckError::MinParamCount {
                name,
                count,
                offset,
            },
            SignatureError::MaxParamCount(count) => CheckError::MaxParamCount {
                name,
                count,
                offset,
            },
            SignatureError::ParamType { index, expected } => CheckError::ParamType {
                name,
                index: index + 1,
                found: args.get(index).cloned().unwrap_or(ValueType::Undefined),
                expected,
                offset,
            },
        }
    }
}

/// Failure reported by an asynchronous reference resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ResolveError {
    pub message: String,
}

impl ResolveError {
    pub fn new(message: impl Into<String>) -> Self {
        ResolveError {
            message: message.into(),
        }
    }
}

/// Any failure of a single `exec` call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Check(#[from] CheckError),

    #[error("failed to resolve references: {0}")]
    Resolve(#[from] ResolveError),

    #[error("formula is {length} bytes long, the limit is {limit}")]
    TooLong { length: usize, limit: usize },
}

/// Payload category, serialized as the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Lexer,
    Parser,
    Function,
    Execution,
    Operand,
    Resolve,
}

/// Structured, serializable description of a failure.
///
/// ```json
/// {"type":"function","name":"SUM","paramIndex":1,"paramType":["number","string","array"],"errorType":"paramType"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    /// Function name for function errors, the message otherwise
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param_type: Option<Vec<ValueType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl ErrorPayload {
    fn new(kind: ErrorKind, name: impl Into<String>) -> Self {
        ErrorPayload {
            kind,
            name: name.into(),
            token: None,
            offset: None,
            param_count: None,
            param_index: None,
            param_type: None,
            error_type: None,
        }
    }

    fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn at(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    fn error_type(mut self, error_type: &str) -> Self {
        self.error_type = Some(error_type.to_string());
        self
    }
}

impl FormulaError {
    /// Payload describing this failure.
    pub fn payload(&self) -> ErrorPayload {
        let message = self.to_string();
        match self {
            FormulaError::Lex(e) => ErrorPayload::new(ErrorKind::Lexer, message)
                .with_token(e.ch)
                .at(e.offset),
            FormulaError::Parse(e) => {
                let mut payload = ErrorPayload::new(ErrorKind::Parser, message);
                payload.token = e.token().map(str::to_string);
                payload.offset = e.offset();
                payload
            }
            FormulaError::Eval(e) => match e {
                EvalError::UnknownOperator { operator, offset } => {
                    ErrorPayload::new(ErrorKind::Execution, message)
                        .with_token(operator.as_str())
                        .at(*offset)
                }
                EvalError::DivisionByZero { offset } => {
                    ErrorPayload::new(ErrorKind::Execution, message)
                        .with_token("/")
                        .at(*offset)
                }
                EvalError::UnknownFunction { name, offset } => {
                    ErrorPayload::new(ErrorKind::Function, name.as_str())
                        .at(*offset)
                        .error_type("unknownFunction")
                }
                EvalError::Function { name, offset, .. } => {
                    ErrorPayload::new(ErrorKind::Function, name.as_str())
                        .with_token(message)
                        .at(*offset)
                        .error_type("functionError")
                }
            },
            FormulaError::Check(e) => match e {
                CheckError::MinParamCount {
                    name,
                    count,
                    offset,
                } => {
                    let mut payload = ErrorPayload::new(ErrorKind::Function, name.as_str())
                        .at(*offset)
                        .error_type("minParamCount");
                    payload.param_count = Some(*count);
                    payload
                }
                CheckError::MaxParamCount {
                    name,
                    count,
                    offset,
                } => {
                    let mut payload = ErrorPayload::new(ErrorKind::Function, name.as_str())
                        .at(*offset)
                        .error_type("maxParamCount");
                    payload.param_count = Some(*count);
                    payload
                }
                CheckError::ParamType {
                    name,
                    index,
                    expected,
                    offset,
                    ..
                } => {
                    let mut payload = ErrorPayload::new(ErrorKind::Function, name.as_str())
                        .at(*offset)
                        .error_type("paramType");
                    payload.param_index = Some(*index);
                    payload.param_type = (!expected.is_empty()).then(|| expected.clone());
                    payload
                }
                CheckError::UnknownFunction { name, offset } => {
                    ErrorPayload::new(ErrorKind::Function, name.as_str())
                        .at(*offset)
                        .error_type("unknownFunction")
                }
                CheckError::Operand {
                    operator,
                    expected,
                    offset,
                    ..
                } => {
                    let mut payload = ErrorPayload::new(ErrorKind::Operand, message)
                        .with_token(operator.as_str())
                        .at(*offset);
                    payload.param_type = (!expected.is_empty()).then(|| expected.clone());
                    payload
                }
            },
            FormulaError::Resolve(_) => ErrorPayload::new(ErrorKind::Resolve, message),
            FormulaError::TooLong { .. } => {
                ErrorPayload::new(ErrorKind::Execution, message).error_type("tooLong")
            }
        }
    }

    /// Payload rendered as JSON text.
    pub fn to_json(&self) -> String {
        // Only strings, integers and enums are serialized; this cannot fail.
        serde_json::to_string(&self.payload()).unwrap_or_default()
    }
}

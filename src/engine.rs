//! The engine façade: tokenize, parse and visit in one call.
//!
//! An [`Engine`] is immutable configuration (mode, function registry and
//! [`EngineOptions`]); every `exec` builds its tokens and tree afresh, so one
//! engine can serve any number of callers at once.

use std::future::{self, Future};
use std::marker::PhantomData;

use crate::{
    Value,
    ast::Expression,
    checker::TypeChecker,
    error::{FormulaError, FormulaResult, ResolveError},
    evaluator::Interpreter,
    functions::{CheckFn, EvalFn, FunctionRegistry},
    lexer::tokenize,
    parser::Parser,
    references,
    types::{TypeMap, ValueType},
    visitor::Visitor,
};

/// Limits and strictness of an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Check mode only: when false, unscannable characters are skipped and
    /// tokens left after a complete expression are ignored.
    pub strict: bool,
    /// Longest accepted formula, in bytes
    pub max_length: Option<usize>,
    /// Deepest accepted nesting of groups, calls, arrays and unary operators
    pub max_depth: Option<usize>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            strict: true,
            max_length: None,
            max_depth: None,
        }
    }
}

impl EngineOptions {
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn max_length(mut self, limit: usize) -> Self {
        self.max_length = Some(limit);
        self
    }

    pub fn max_depth(mut self, limit: usize) -> Self {
        self.max_depth = Some(limit);
        self
    }
}

/// What an engine does with a parsed formula.
pub trait Mode {
    /// Callable stored in the registry
    type Function;
    /// Inputs a formula is run against
    type Variables: ?Sized;
    type Output;

    const NAME: &'static str;

    fn builtin() -> FunctionRegistry<Self::Function>;

    /// Whether lexer errors and trailing tokens are fatal.
    fn is_strict(options: &EngineOptions) -> bool;

    fn run(
        functions: &FunctionRegistry<Self::Function>,
        variables: &Self::Variables,
        tree: &Expression,
    ) -> FormulaResult<Self::Output>;
}

/// Evaluation mode: produces a [`Value`].
#[derive(Debug, Clone, Copy)]
pub struct Evaluate;

/// Check mode: produces the [`ValueType`] a formula would have.
#[derive(Debug, Clone, Copy)]
pub struct Check;

impl Mode for Evaluate {
    type Function = EvalFn;
    type Variables = Value;
    type Output = Value;

    const NAME: &'static str = "eval";

    fn builtin() -> FunctionRegistry<EvalFn> {
        FunctionRegistry::<EvalFn>::builtin()
    }

    fn is_strict(_options: &EngineOptions) -> bool {
        true
    }

    fn run(
        functions: &FunctionRegistry<EvalFn>,
        variables: &Value,
        tree: &Expression,
    ) -> FormulaResult<Value> {
        Ok(Interpreter::new(functions, variables).visit_expression(tree)?)
    }
}

impl Mode for Check {
    type Function = CheckFn;
    type Variables = TypeMap;
    type Output = ValueType;

    const NAME: &'static str = "check";

    fn builtin() -> FunctionRegistry<CheckFn> {
        FunctionRegistry::<CheckFn>::builtin()
    }

    fn is_strict(options: &EngineOptions) -> bool {
        options.strict
    }

    fn run(
        functions: &FunctionRegistry<CheckFn>,
        types: &TypeMap,
        tree: &Expression,
    ) -> FormulaResult<ValueType> {
        Ok(TypeChecker::new(functions, types).visit_expression(tree)?)
    }
}

/// Supplies the values of the references a formula reads, possibly from a
/// remote source.
pub trait ReferenceResolver {
    /// Resolve `paths` into a value that [`Value::get_path`] can walk,
    /// normally an object keyed by the top-level names.
    fn resolve(&self, paths: &[String]) -> impl Future<Output = Result<Value, ResolveError>>;
}

/// An already known set of variables.
impl ReferenceResolver for Value {
    fn resolve(&self, _paths: &[String]) -> impl Future<Output = Result<Value, ResolveError>> {
        future::ready(Ok(self.clone()))
    }
}

/// Formula engine for one [`Mode`].
///
/// # Examples
///
/// ```
/// use formula_lang::{CheckEngine, FormulaEngine, Value, ValueType};
/// use formula_lang::types::TypeMap;
///
/// let engine = FormulaEngine::new();
/// assert_eq!(engine.exec_empty("1 + 2 * 3").unwrap(), Value::Number(7.0));
///
/// let checker = CheckEngine::new();
/// let types = TypeMap::from([("age".to_string(), ValueType::Number)]);
/// assert_eq!(checker.exec("{age} >= 18", &types).unwrap(), ValueType::Boolean);
/// ```
pub struct Engine<M: Mode> {
    functions: FunctionRegistry<M::Function>,
    options: EngineOptions,
    mode: PhantomData<M>,
}

/// Engine producing values
pub type FormulaEngine = Engine<Evaluate>;

/// Engine producing type tags
pub type CheckEngine = Engine<Check>;

impl<M: Mode> Default for Engine<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Mode> Engine<M> {
    /// Engine with every built-in function and default options.
    pub fn new() -> Self {
        Self::with_functions(M::builtin())
    }

    pub fn with_functions(functions: FunctionRegistry<M::Function>) -> Self {
        Engine {
            functions,
            options: EngineOptions::default(),
            mode: PhantomData,
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn functions(&self) -> &FunctionRegistry<M::Function> {
        &self.functions
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Parse `formula` and run it against `variables`.
    #[tracing::instrument(
        level = "debug",
        skip(self, formula, variables),
        fields(mode = M::NAME, length = formula.len())
    )]
    pub fn exec(&self, formula: &str, variables: &M::Variables) -> FormulaResult<M::Output> {
        let tree = self.build(formula)?;
        M::run(&self.functions, variables, &tree)
    }

    /// Tokens and tree for `formula`, honoring the engine's limits and
    /// strictness.
    pub fn build(&self, formula: &str) -> FormulaResult<Expression> {
        if let Some(limit) = self.options.max_length
            && formula.len() > limit
        {
            return Err(FormulaError::TooLong {
                length: formula.len(),
                limit,
            });
        }

        let strict = M::is_strict(&self.options);
        let lexed = tokenize(formula);
        if let Some(error) = lexed.errors.first() {
            if strict {
                return Err(error.clone().into());
            }
            tracing::warn!(
                skipped = lexed.errors.len(),
                first = %error,
                "ignoring unscannable characters"
            );
        }

        let mut parser = Parser::new(lexed.tokens).with_max_depth(self.options.max_depth);
        if strict {
            return Ok(parser.parse()?);
        }
        let tree = parser.parse_prefix()?;
        if let Some(token) = parser.remaining().first() {
            tracing::warn!(
                token = %token,
                offset = token.offset,
                "ignoring tokens after a complete expression"
            );
        }
        Ok(tree)
    }
}

impl Engine<Evaluate> {
    /// Evaluate a formula that reads no references.
    pub fn exec_empty(&self, formula: &str) -> FormulaResult<Value> {
        self.exec(formula, &Value::Undefined)
    }

    /// Evaluate `formula`, fetching the values it references from
    /// `resolver` first.
    ///
    /// The resolver is awaited once with every distinct reference path; the
    /// tree walk itself is synchronous.
    pub async fn exec_async<R>(&self, formula: &str, resolver: &R) -> FormulaResult<Value>
    where
        R: ReferenceResolver + ?Sized,
    {
        let tree = self.build(formula)?;
        let paths = references::collect(&tree);
        tracing::debug!(references = paths.len(), "resolving references");
        let variables = resolver.resolve(&paths).await?;
        Evaluate::run(&self.functions, &variables, &tree)
    }
}

impl Engine<Check> {
    /// Check a formula that reads no references.
    pub fn exec_empty(&self, formula: &str) -> FormulaResult<ValueType> {
        self.exec(formula, &TypeMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ParseError};
    use pretty_assertions::assert_eq;

    #[test]
    fn evaluation_is_always_strict() {
        let engine = FormulaEngine::new().with_options(EngineOptions::default().strict(false));
        assert!(matches!(
            engine.exec_empty("1 + 1 = 2"),
            Err(FormulaError::Lex(_))
        ));
        assert!(matches!(
            engine.exec_empty("1 2"),
            Err(FormulaError::Parse(ParseError::TrailingInput { .. }))
        ));
    }

    #[test]
    fn lenient_check_skips_lexer_errors_and_trailing_tokens() {
        let engine = CheckEngine::new().with_options(EngineOptions::default().strict(false));
        assert_eq!(engine.exec_empty("1 + 2 # note"), Ok(ValueType::Number));
        assert_eq!(engine.exec_empty("1 2"), Ok(ValueType::Number));

        let strict = CheckEngine::new();
        let err = strict.exec_empty("1 + 2 # note").unwrap_err();
        assert_eq!(err.payload().kind, ErrorKind::Lexer);
    }

    #[test]
    fn limits() {
        let engine = FormulaEngine::new().with_options(EngineOptions::default().max_length(5));
        assert_eq!(
            engine.exec_empty("1 + 2 + 3"),
            Err(FormulaError::TooLong {
                length: 9,
                limit: 5
            })
        );

        let engine = FormulaEngine::new().with_options(EngineOptions::default().max_depth(3));
        assert_eq!(engine.exec_empty("((1))"), Ok(Value::Number(1.0)));
        assert!(matches!(
            engine.exec_empty("((((1))))"),
            Err(FormulaError::Parse(ParseError::TooDeep { limit: 3, .. }))
        ));
    }

    #[test]
    fn custom_registry() {
        fn double(args: &[Value]) -> Result<Value, crate::error::FunctionFailure> {
            Ok(Value::Number(args.first().map_or(0.0, Value::to_number) * 2.0))
        }
        let functions = FunctionRegistry::empty().with(crate::functions::FunctionDef {
            name: "DOUBLE",
            signature: crate::functions::Signature::returning(ValueType::Number),
            implementation: double as EvalFn,
        });
        let engine = FormulaEngine::with_functions(functions);
        assert_eq!(engine.exec_empty("DOUBLE(21)"), Ok(Value::Number(42.0)));
        assert!(engine.exec_empty("SUM(1)").is_err());
    }
}

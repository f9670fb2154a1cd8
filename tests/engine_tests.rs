// tests/engine_tests.rs

use formula_lang::error::{ErrorKind, FormulaError, ParseError, ResolveError};
use formula_lang::{
    CheckEngine, EngineOptions, FormulaEngine, ReferenceResolver, TypeMap, Value, ValueType,
};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Mutex;

fn object(pairs: Vec<(&str, Value)>) -> Value {
    Value::Object(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

/// Serves fields from memory after yielding once, recording every request.
struct Store {
    fields: HashMap<String, Value>,
    requests: Mutex<Vec<Vec<String>>>,
}

impl Store {
    fn new(pairs: Vec<(&str, Value)>) -> Self {
        Store {
            fields: pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl ReferenceResolver for Store {
    async fn resolve(&self, paths: &[String]) -> Result<Value, ResolveError> {
        tokio::task::yield_now().await;
        self.requests
            .lock()
            .map_err(|_| ResolveError::new("poisoned"))?
            .push(paths.to_vec());
        let mut resolved = HashMap::new();
        for path in paths {
            let value = self
                .fields
                .get(path)
                .cloned()
                .ok_or_else(|| ResolveError::new(format!("no field {path}")))?;
            resolved.insert(path.clone(), value);
        }
        Ok(Value::Object(resolved))
    }
}

// ============================================================================
// Synchronous execution
// ============================================================================

#[test]
fn test_exec_and_exec_empty() {
    let engine = FormulaEngine::new();
    assert_eq!(engine.exec_empty("UPPER('abc')"), Ok(Value::from("ABC")));
    assert_eq!(
        engine.exec("{x} * 2", &object(vec![("x", Value::Number(21.0))])),
        Ok(Value::Number(42.0))
    );
}

#[test]
fn test_empty_formula_is_a_parse_error() {
    let engine = FormulaEngine::new();
    assert!(matches!(
        engine.exec_empty(""),
        Err(FormulaError::Parse(ParseError::UnexpectedEnd { .. }))
    ));
    assert!(matches!(
        engine.exec_empty("   "),
        Err(FormulaError::Parse(ParseError::UnexpectedEnd { .. }))
    ));
}

#[test]
fn test_error_payloads() {
    let engine = FormulaEngine::new();

    let payload = engine.exec_empty("1 $ 2").unwrap_err().payload();
    assert_eq!(payload.kind, ErrorKind::Lexer);
    assert_eq!(payload.token.as_deref(), Some("$"));
    assert_eq!(payload.offset, Some(2));

    let payload = engine.exec_empty("(1 + 2").unwrap_err().payload();
    assert_eq!(payload.kind, ErrorKind::Parser);
    assert_eq!(payload.token, None);

    let payload = engine.exec_empty("1 + * 2").unwrap_err().payload();
    assert_eq!(payload.kind, ErrorKind::Parser);
    assert_eq!(payload.token.as_deref(), Some("*"));

    let payload = engine.exec_empty("MISSING(1)").unwrap_err().payload();
    assert_eq!(payload.kind, ErrorKind::Function);
    assert_eq!(payload.error_type.as_deref(), Some("unknownFunction"));

    let payload = engine.exec_empty("1 / 0").unwrap_err().payload();
    assert_eq!(payload.kind, ErrorKind::Execution);
}

#[test]
fn test_payload_json_shape() {
    let err = FormulaEngine::new().exec_empty("1 = 1").unwrap_err();
    let json: serde_json::Value = serde_json::from_str(&err.to_json()).unwrap();
    assert_eq!(json["type"], "lexer");
    assert_eq!(json["token"], "=");
    assert_eq!(json["offset"], 2);
    assert!(json.get("paramCount").is_none());
}

#[test]
fn test_engines_share_nothing_between_calls() {
    let engine = FormulaEngine::new();
    let checker = CheckEngine::new();
    let types: TypeMap = [("n".to_string(), ValueType::Number)].into();

    std::thread::scope(|scope| {
        for i in 0..4 {
            let engine = &engine;
            let checker = &checker;
            let types = &types;
            scope.spawn(move || {
                let vars = object(vec![("n", Value::Number(f64::from(i)))]);
                for _ in 0..50 {
                    assert_eq!(
                        engine.exec("{n} * 10", &vars),
                        Ok(Value::Number(f64::from(i * 10)))
                    );
                    assert_eq!(checker.exec("{n} * 10", types), Ok(ValueType::Number));
                }
            });
        }
    });
}

#[test]
fn test_options_are_kept() {
    let options = EngineOptions::default().max_length(100).max_depth(8);
    let engine = FormulaEngine::new().with_options(options.clone());
    assert_eq!(engine.options(), &options);
    assert!(engine.functions().contains("SUM"));
}

#[test]
fn test_length_limit_payload() {
    let engine = CheckEngine::new().with_options(EngineOptions::default().max_length(3));
    let payload = engine.exec_empty("1 + 2").unwrap_err().payload();
    assert_eq!(payload.kind, ErrorKind::Execution);
    assert_eq!(payload.error_type.as_deref(), Some("tooLong"));
}

// ============================================================================
// Asynchronous execution
// ============================================================================

#[tokio::test]
async fn test_exec_async_with_known_variables() {
    let engine = FormulaEngine::new();
    let vars = object(vec![("a", Value::Number(2.0)), ("b", Value::Number(3.0))]);
    assert_eq!(
        engine.exec_async("{a} * {b}", &vars).await,
        Ok(Value::Number(6.0))
    );
}

#[tokio::test]
async fn test_exec_async_requests_each_reference_once() {
    let engine = FormulaEngine::new();
    let store = Store::new(vec![
        ("price", Value::Number(10.0)),
        ("qty", Value::Number(3.0)),
        ("unused", Value::Number(99.0)),
    ]);

    let result = engine
        .exec_async("{price} * {qty} + {price}", &store)
        .await;
    assert_eq!(result, Ok(Value::Number(40.0)));

    let requests = store.requests.lock().unwrap();
    assert_eq!(
        *requests,
        vec![vec!["price".to_string(), "qty".to_string()]]
    );
}

#[tokio::test]
async fn test_exec_async_matches_exec() {
    let engine = FormulaEngine::new();
    let vars = object(vec![
        ("a", Value::Number(1.0)),
        ("b", Value::Number(2.0)),
        ("c", Value::Number(3.0)),
        ("d", Value::Number(4.0)),
        ("e", Value::Number(5.0)),
    ]);
    let formula = "{a} + {b} * {c} - {d} / {e}";
    assert_eq!(
        engine.exec_async(formula, &vars).await,
        engine.exec(formula, &vars)
    );
}

#[tokio::test]
async fn test_resolver_failure() {
    let engine = FormulaEngine::new();
    let store = Store::new(vec![]);

    let err = engine.exec_async("{missing} + 1", &store).await.unwrap_err();
    assert_eq!(
        err,
        FormulaError::Resolve(ResolveError::new("no field missing"))
    );
    assert_eq!(err.payload().kind, ErrorKind::Resolve);
}

#[tokio::test]
async fn test_exec_async_reports_parse_errors_before_resolving() {
    let engine = FormulaEngine::new();
    let store = Store::new(vec![("a", Value::Number(1.0))]);

    let err = engine.exec_async("{a} +", &store).await.unwrap_err();
    assert!(matches!(err, FormulaError::Parse(_)));
    assert!(store.requests.lock().unwrap().is_empty());
}

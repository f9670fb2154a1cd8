// tests/function_tests.rs

use formula_lang::error::{CheckError, EvalError, SignatureError};
use formula_lang::functions::{
    Accepts, Builtin, CheckFn, EvalFn, FunctionDef, FunctionRegistry, ParamTypes, Signature,
    builtins, check_signature,
};
use formula_lang::{CheckEngine, FormulaEngine, FormulaError, TypeMap, Value, ValueType};
use pretty_assertions::assert_eq;

fn eval(formula: &str) -> Value {
    FormulaEngine::new()
        .exec_empty(formula)
        .unwrap_or_else(|e| panic!("Failed to evaluate {formula}: {e}"))
}

fn check(formula: &str) -> Result<ValueType, FormulaError> {
    CheckEngine::new().exec_empty(formula)
}

// ============================================================================
// Registries
// ============================================================================

#[test]
fn test_eval_and_check_registries_list_the_same_functions() {
    let eval = FunctionRegistry::<EvalFn>::builtin();
    let check = FunctionRegistry::<CheckFn>::builtin();
    let eval_names: Vec<&str> = eval.iter().map(|f| f.name).collect();
    let check_names: Vec<&str> = check.iter().map(|f| f.name).collect();
    assert_eq!(eval_names, check_names);
    assert_eq!(eval.len(), builtins().len());

    let mut sorted = eval_names.clone();
    sorted.sort();
    assert_eq!(eval_names, sorted, "Registry iterates in name order");
}

#[test]
fn test_every_builtin_is_upper_case() {
    for builtin in builtins() {
        assert!(
            builtin
                .name
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'),
            "Not a function token: {}",
            builtin.name
        );
    }
}

#[test]
fn test_register_replaces_existing_definition() {
    fn always_seven(_: &[Value]) -> Result<Value, formula_lang::FunctionFailure> {
        Ok(Value::Number(7.0))
    }
    let mut functions = FunctionRegistry::<EvalFn>::builtin();
    let previous = functions.register(FunctionDef {
        name: "SUM",
        signature: Signature::returning(ValueType::Number),
        implementation: always_seven as EvalFn,
    });
    assert!(previous.is_some());

    let engine = FormulaEngine::with_functions(functions);
    assert_eq!(engine.exec_empty("SUM(1, 2)"), Ok(Value::Number(7.0)));
}

#[test]
fn test_custom_check_stub() {
    fn strings_only(signature: &Signature, args: &[ValueType]) -> Result<ValueType, SignatureError> {
        check_signature(signature, args)?;
        Ok(ValueType::String)
    }
    let builtin = Builtin::new(
        "SHOUT",
        Signature::returning(ValueType::Any).exactly(1).uniform(&[ValueType::String]),
        |args| Ok(Value::String(args.first().map(|v| v.to_string()).unwrap_or_default())),
    )
    .check_with(strings_only);

    let functions = FunctionRegistry::empty().with(FunctionDef {
        name: builtin.name,
        signature: builtin.signature.clone(),
        implementation: builtin.check,
    });
    let engine = CheckEngine::with_functions(functions);
    assert_eq!(engine.exec_empty("SHOUT('a')"), Ok(ValueType::String));
    assert!(engine.exec_empty("SHOUT(1)").is_err());
}

// ============================================================================
// Signatures
// ============================================================================

#[test]
fn test_signature_arity() {
    let test_cases = vec![
        (Signature::returning(ValueType::Any), "0.."),
        (Signature::returning(ValueType::Any).min(1), "1.."),
        (Signature::returning(ValueType::Any).exactly(2), "2"),
        (Signature::returning(ValueType::Any).min(1).optional(2), "1..3"),
    ];

    for (signature, expected) in test_cases {
        assert_eq!(signature.arity(), expected);
    }
}

#[test]
fn test_check_signature_positions() {
    let signature = Signature::returning(ValueType::Number).params(ParamTypes::Alternating {
        even: Accepts::one_of(&[ValueType::Boolean]),
        odd: Accepts::Any,
    });
    let args = [ValueType::Boolean, ValueType::Date, ValueType::String];
    assert_eq!(
        check_signature(&signature, &args),
        Err(SignatureError::ParamType {
            index: 2,
            expected: vec![ValueType::Boolean],
        })
    );

    let signature = Signature::returning(ValueType::Number).params(ParamTypes::Positional {
        leading: vec![Accepts::one_of(&[ValueType::String])],
        rest: Accepts::AnyExcept(vec![ValueType::Boolean]),
    });
    assert_eq!(
        check_signature(&signature, &[ValueType::String, ValueType::Date]),
        Ok(ValueType::Number)
    );
    assert!(check_signature(&signature, &[ValueType::String, ValueType::Boolean]).is_err());
}

// ============================================================================
// Library behavior through formulas
// ============================================================================

#[test]
fn test_math_functions() {
    let test_cases = vec![
        ("ABS(-2.5)", 2.5),
        ("SUM([1, 2], '3', 'x')", 6.0),
        ("AVERAGE(1, 2, 3, 4)", 2.5),
        ("MAX([3, 9], 4)", 9.0),
        ("MIN([3, 9], 4)", 3.0),
        ("PRODUCT(2, 3, 0.5)", 3.0),
        ("POWER(2, 10)", 1024.0),
        ("SQRT(16)", 4.0),
        ("INT(-2.5)", -3.0),
        ("MOD(-7, 3)", 2.0),
        ("ROUND(2.345, 2)", 2.35),
        ("CEILING(10, 3)", 12.0),
        ("FLOOR(-10, 3)", -12.0),
        ("COUNT(1, 'a', [2, 3])", 3.0),
        ("COUNTIF([1, 5, 10], '>=5')", 2.0),
        ("SUMIF([1, 5, 10], '>2')", 15.0),
        ("LARGE([1, 3, 2], 1)", 3.0),
        ("SMALL([1, 3, 2], 1)", 1.0),
        ("INDEX([10, 20, 30], 1)", 20.0),
        ("SIN(30)", 0.5),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval(input), Value::Number(expected), "Failed for input: {}", input);
    }
    assert_eq!(eval("FIXED(1.005, 2)"), Value::from("1.01"));
}

#[test]
fn test_logic_functions() {
    assert_eq!(eval("IF(1 > 2, 'a', 'b')"), Value::from("b"));
    assert_eq!(eval("IFS(false, 1, true, 2)"), Value::Number(2.0));
    assert_eq!(eval("AND(true, 1)"), Value::Boolean(true));
    assert_eq!(eval("OR(false, 0)"), Value::Boolean(false));
    assert_eq!(eval("NOT(0)"), Value::Boolean(true));
    assert_eq!(eval("XOR(true, true, true)"), Value::Boolean(true));
    assert_eq!(eval("TRUE()"), Value::Boolean(true));
    assert_eq!(eval("FALSE()"), Value::Boolean(false));
}

#[test]
fn test_text_functions() {
    let test_cases = vec![
        ("CONCATENATE('a', true, 1.5)", "aTRUE1.5"),
        ("LEFT('hello', 2)", "he"),
        ("RIGHT('hello', 3)", "llo"),
        ("MID('abcdef', 1, 3)", "bcd"),
        ("REPLACE('abcdef', 1, 2, 'XY')", "aXYdef"),
        ("LOWER('ABC')", "abc"),
        ("UPPER('abc')", "ABC"),
        ("REPT('ab', 3)", "ababab"),
        ("TRIM('  x  ')", "x"),
        ("CHAR(65)", "A"),
        ("JOIN([1, 2, 3], '-')", "1-2-3"),
    ];

    for (input, expected) in test_cases {
        assert_eq!(eval(input), Value::from(expected), "Failed for input: {}", input);
    }
    assert_eq!(eval("LEN('héllo')"), Value::Number(5.0));
    assert_eq!(eval("SEARCH('B', 'abc')"), Value::Number(2.0));
    assert_eq!(eval("VALUE('12.5')"), Value::Number(12.5));
    assert_eq!(eval("EXACT('a', 'a')"), Value::Boolean(true));
    assert_eq!(eval("ISEMPTY('')"), Value::Boolean(true));
    assert_eq!(eval("SPLIT('a,b', ',')"), Value::from(vec!["a", "b"]));
    assert_eq!(eval("UNION(2, 3, 2)"), Value::from(vec![2.0, 3.0]));
}

#[test]
fn test_rept_rejects_oversized_results() {
    for input in [
        "REPT('ab', 10000000000000000000)",
        "REPT('ab', 1e12)",
        "REPT('x', 16777217)",
    ] {
        match FormulaEngine::new().exec_empty(input) {
            Err(FormulaError::Eval(EvalError::Function { name, offset, .. })) => {
                assert_eq!(name, "REPT", "Failed for input: {}", input);
                assert_eq!(offset, 0, "Failed for input: {}", input);
            }
            other => panic!("Expected a REPT failure for {input}, got {other:?}"),
        }
    }
    assert_eq!(eval("REPT('', 1e19)"), Value::from(""));
    assert_eq!(eval("LEN(REPT('x', 16777216))"), Value::Number(16_777_216.0));
}

#[test]
fn test_date_functions() {
    assert_eq!(eval("YEAR(2024-03-10T08:30:15Z)"), Value::Number(2024.0));
    assert_eq!(eval("MONTH(DATE(2024, 13, 1))"), Value::Number(1.0));
    assert_eq!(eval("DAY(DATE(2024, 3, 0))"), Value::Number(29.0));
    assert_eq!(eval("WEEKDAY(2024-03-10T00:00:00Z)"), Value::Number(0.0));
    assert_eq!(
        eval("DAYS(DATE('2024-03-10'), DATE('2024-03-01'))"),
        Value::Number(9.0)
    );
    assert_eq!(
        eval("DATEDIF(2024-01-02T00:00:00Z, 2024-01-01T00:00:00Z, 'h')"),
        Value::Number(24.0)
    );
    assert_eq!(
        eval("TIMESTAMP(DATEDELTA(DATE(0), 1))"),
        Value::Number(86_400_000.0)
    );
}

#[test]
fn test_evaluation_does_not_enforce_arity() {
    assert_eq!(eval("UPPER()"), Value::from(""));
    assert_eq!(eval("ABS(-1, 'ignored')"), Value::Number(1.0));
    assert!(check("UPPER()").is_err());
}

// ============================================================================
// Check stubs
// ============================================================================

#[test]
fn test_check_stubs_return_declared_types() {
    let test_cases = vec![
        ("SUM(1, 2)", ValueType::Number),
        ("CONCATENATE('a', 1)", ValueType::String),
        ("AND(true, false)", ValueType::Boolean),
        ("DATE(2024, 1, 1)", ValueType::Date),
        ("SPLIT('a,b', ',')", ValueType::Array),
        ("INDEX([1], 0)", ValueType::Any),
    ];

    for (input, expected) in test_cases {
        assert_eq!(check(input), Ok(expected), "Failed for input: {}", input);
    }
}

#[test]
fn test_exact_requires_matching_types() {
    assert_eq!(check("EXACT('a', 'b')"), Ok(ValueType::Boolean));
    assert_eq!(
        check("EXACT('a', 1)"),
        Err(FormulaError::Check(CheckError::ParamType {
            name: "EXACT".into(),
            index: 2,
            expected: vec![ValueType::String],
            found: ValueType::Number,
            offset: 0,
        }))
    );
}

#[test]
fn test_ifs_alternates_conditions_and_values() {
    let types: TypeMap = [("d".to_string(), ValueType::Date)].into();
    let engine = CheckEngine::new();
    assert_eq!(engine.exec("IFS(true, {d}, false, 1)", &types), Ok(ValueType::Any));
    assert!(engine.exec("IFS({d}, 1)", &types).is_err());
}

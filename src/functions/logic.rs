//! Logical functions

use super::{Accepts, Builtin, ParamTypes, Signature, arg};
use crate::Value;
use crate::error::FunctionFailure;
use crate::types::ValueType::{self, Any, Boolean, Number};

type FnResult = Result<Value, FunctionFailure>;

/// AND: true when every argument is truthy.
pub fn fn_and(args: &[Value]) -> FnResult {
    Ok(Value::Boolean(args.iter().all(Value::is_truthy)))
}

/// OR: true when any argument is truthy.
pub fn fn_or(args: &[Value]) -> FnResult {
    Ok(Value::Boolean(args.iter().any(Value::is_truthy)))
}

/// NOT
pub fn fn_not(args: &[Value]) -> FnResult {
    Ok(Value::Boolean(!arg(args, 0).is_truthy()))
}

/// XOR: true when an odd number of arguments are truthy.
pub fn fn_xor(args: &[Value]) -> FnResult {
    let truthy = args.iter().filter(|v| v.is_truthy()).count();
    Ok(Value::Boolean(truthy % 2 == 1))
}

/// IF(condition, when_true, when_false)
pub fn fn_if(args: &[Value]) -> FnResult {
    let branch = if arg(args, 0).is_truthy() { 1 } else { 2 };
    Ok(arg(args, branch).clone())
}

/// IFS(condition, value, condition, value, ...): value of the first truthy
/// condition, `undefined` when none is.
pub fn fn_ifs(args: &[Value]) -> FnResult {
    Ok(args
        .chunks(2)
        .find(|pair| pair[0].is_truthy())
        .map(|pair| arg(pair, 1).clone())
        .unwrap_or_default())
}

pub fn fn_true(_args: &[Value]) -> FnResult {
    Ok(Value::Boolean(true))
}

pub fn fn_false(_args: &[Value]) -> FnResult {
    Ok(Value::Boolean(false))
}

const CONDITION: &[ValueType] = &[Boolean, Number];

pub fn builtins() -> Vec<Builtin> {
    vec![
        Builtin::new(
            "AND",
            Signature::returning(Boolean).min(2).uniform(CONDITION),
            fn_and,
        ),
        Builtin::new(
            "OR",
            Signature::returning(Boolean).min(2).uniform(CONDITION),
            fn_or,
        ),
        Builtin::new(
            "NOT",
            Signature::returning(Boolean).exactly(1).uniform(&[Boolean]),
            fn_not,
        ),
        Builtin::new(
            "XOR",
            Signature::returning(Boolean).min(2).uniform(CONDITION),
            fn_xor,
        ),
        Builtin::new(
            "IF",
            Signature::returning(Any)
                .exactly(3)
                .params(ParamTypes::Positional {
                    leading: vec![Accepts::one_of(CONDITION)],
                    rest: Accepts::Any,
                }),
            fn_if,
        ),
        Builtin::new(
            "IFS",
            Signature::returning(Any)
                .min(2)
                .optional(252)
                .params(ParamTypes::Alternating {
                    even: Accepts::one_of(CONDITION),
                    odd: Accepts::Any,
                }),
            fn_ifs,
        ),
        Builtin::new("TRUE", Signature::returning(Boolean).max(0), fn_true),
        Builtin::new("FALSE", Signature::returning(Boolean).max(0), fn_false),
    ]
}

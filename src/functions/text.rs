//! Text functions
//!
//! Character positions count Unicode scalar values. `MID` and `REPLACE`
//! take 0-based offsets; `SEARCH` reports a 1-based position with `0` for
//! "not found".

use super::{Accepts, Builtin, ParamTypes, Signature, arg, check_signature};
use crate::Value;
use crate::error::{FunctionFailure, SignatureError};
use crate::types::ValueType::{self, Array, Boolean, Named, Number, String as Str};

type FnResult = Result<Value, FunctionFailure>;

/// Longest string REPT may build, in bytes.
const MAX_REPEAT_LEN: usize = 1 << 24;

/// Text of a value, `""` for `undefined` and `null`.
fn text(value: &Value) -> String {
    if value.is_nullish() {
        String::new()
    } else {
        value.to_string()
    }
}

/// Non-negative whole count; `NaN` and negatives clamp to zero.
fn count(value: &Value, default: usize) -> usize {
    if value.is_nullish() {
        return default;
    }
    let n = value.to_number();
    if n.is_nan() || n <= 0.0 {
        0
    } else {
        n.trunc() as usize
    }
}

fn char_slice(s: &str, start: usize, len: usize) -> String {
    s.chars().skip(start).take(len).collect()
}

/// CONCATENATE: joins arguments, skipping `undefined`/`null`; booleans are
/// written `TRUE`/`FALSE`.
pub fn fn_concatenate(args: &[Value]) -> FnResult {
    let joined = args
        .iter()
        .filter(|v| !v.is_nullish())
        .map(|v| match v {
            Value::Boolean(true) => "TRUE".to_string(),
            Value::Boolean(false) => "FALSE".to_string(),
            other => other.to_string(),
        })
        .collect::<String>();
    Ok(Value::String(joined))
}

/// CHAR: character for a code point, `""` when there is none.
pub fn fn_char(args: &[Value]) -> FnResult {
    let n = arg(args, 0).to_number();
    let ch = (n.is_finite() && n >= 0.0 && n.fract() == 0.0)
        .then(|| char::from_u32(n as u32))
        .flatten();
    Ok(Value::String(ch.map(String::from).unwrap_or_default()))
}

/// EXACT: strict equality of the first two arguments.
pub fn fn_exact(args: &[Value]) -> FnResult {
    Ok(Value::Boolean(arg(args, 0).strict_eq(arg(args, 1))))
}

/// ISEMPTY: `undefined`, `null`, `""`, `[]` and `{}` are empty.
pub fn fn_isempty(args: &[Value]) -> FnResult {
    let empty = match arg(args, 0) {
        Value::Undefined | Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    Ok(Value::Boolean(empty))
}

/// JOIN(array, separator)
pub fn fn_join(args: &[Value]) -> FnResult {
    let joined = match (arg(args, 0), arg(args, 1)) {
        (Value::Array(items), Value::String(sep)) => {
            items.iter().map(text).collect::<Vec<_>>().join(sep)
        }
        _ => String::new(),
    };
    Ok(Value::String(joined))
}

/// LEFT(text, [count = 1])
pub fn fn_left(args: &[Value]) -> FnResult {
    let s = text(arg(args, 0));
    Ok(Value::String(char_slice(&s, 0, count(arg(args, 1), 1))))
}

/// RIGHT(text, [count = 1])
pub fn fn_right(args: &[Value]) -> FnResult {
    let s = text(arg(args, 0));
    let len = s.chars().count();
    let n = count(arg(args, 1), 1).min(len);
    Ok(Value::String(char_slice(&s, len - n, n)))
}

/// MID(text, start, count), `start` is 0-based.
pub fn fn_mid(args: &[Value]) -> FnResult {
    let s = text(arg(args, 0));
    let start = count(arg(args, 1), 0);
    let len = count(arg(args, 2), 0);
    Ok(Value::String(char_slice(&s, start, len)))
}

/// LEN: characters of a string, elements of an array, otherwise 0.
pub fn fn_len(args: &[Value]) -> FnResult {
    let len = match arg(args, 0) {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        _ => 0,
    };
    Ok(Value::Number(len as f64))
}

pub fn fn_lower(args: &[Value]) -> FnResult {
    Ok(Value::String(
        arg(args, 0).as_str().map(str::to_lowercase).unwrap_or_default(),
    ))
}

pub fn fn_upper(args: &[Value]) -> FnResult {
    Ok(Value::String(
        arg(args, 0).as_str().map(str::to_uppercase).unwrap_or_default(),
    ))
}

/// REPLACE(text, start, count, replacement), `start` is 0-based.
pub fn fn_replace(args: &[Value]) -> FnResult {
    let s = text(arg(args, 0));
    let start = count(arg(args, 1), 0);
    let len = count(arg(args, 2), 0);
    let mut out: String = s.chars().take(start).collect();
    out.push_str(&text(arg(args, 3)));
    out.extend(s.chars().skip(start.saturating_add(len)));
    Ok(Value::String(out))
}

/// REPT(text, times)
pub fn fn_rept(args: &[Value]) -> FnResult {
    let s = text(arg(args, 0));
    let times = count(arg(args, 1), 0);
    match s.len().checked_mul(times) {
        Some(len) if len <= MAX_REPEAT_LEN => Ok(Value::String(s.repeat(times))),
        _ => Err(FunctionFailure::Invalid(format!("cannot repeat text {times} times"))),
    }
}

/// SEARCH(find, within, [start = 1]): case-insensitive, 1-based result.
pub fn fn_search(args: &[Value]) -> FnResult {
    let (Value::String(find), Value::String(within)) = (arg(args, 0), arg(args, 1)) else {
        return Ok(Value::Number(0.0));
    };
    let skip = count(arg(args, 2), 1).saturating_sub(1);
    let haystack: Vec<char> = within.to_lowercase().chars().collect();
    let needle: Vec<char> = find.to_lowercase().chars().collect();

    let position = if needle.is_empty() {
        (skip <= haystack.len()).then_some(skip)
    } else {
        haystack
            .windows(needle.len())
            .enumerate()
            .skip(skip)
            .find(|(_, window)| *window == needle.as_slice())
            .map(|(i, _)| i)
    };
    Ok(Value::Number(position.map_or(0.0, |i| (i + 1) as f64)))
}

/// SPLIT(text, separator); an empty separator splits into characters.
pub fn fn_split(args: &[Value]) -> FnResult {
    let s = text(arg(args, 0));
    let sep = text(arg(args, 1));
    let parts: Vec<Value> = if sep.is_empty() {
        s.chars().map(|c| Value::String(c.to_string())).collect()
    } else {
        s.split(sep.as_str()).map(Value::from).collect()
    };
    Ok(Value::Array(parts))
}

pub fn fn_trim(args: &[Value]) -> FnResult {
    Ok(Value::String(text(arg(args, 0)).trim().to_string()))
}

/// UNION: distinct values in first-seen order. A single array argument is
/// deduplicated itself.
pub fn fn_union(args: &[Value]) -> FnResult {
    let source: Vec<&Value> = match args {
        [Value::Array(items)] => items.iter().collect(),
        _ => args.iter().collect(),
    };
    let mut distinct: Vec<Value> = Vec::with_capacity(source.len());
    for value in source {
        if !distinct.iter().any(|seen| seen.strict_eq(value)) {
            distinct.push(value.clone());
        }
    }
    Ok(Value::Array(distinct))
}

/// VALUE: number in a text, 0 when there is none.
pub fn fn_value(args: &[Value]) -> FnResult {
    let n = arg(args, 0).to_number();
    Ok(Value::Number(if n.is_nan() { 0.0 } else { n }))
}

/// EXACT only compares arguments of one type, and only strings or numbers.
fn check_exact(signature: &Signature, args: &[ValueType]) -> Result<ValueType, SignatureError> {
    let returns = check_signature(signature, args)?;
    if let [first, second, ..] = args
        && !first.is_any()
        && !second.is_any()
        && first != second
    {
        return Err(SignatureError::ParamType {
            index: 1,
            expected: vec![first.clone()],
        });
    }
    Ok(returns)
}

pub fn builtins() -> Vec<Builtin> {
    let text_then = |rest: &[ValueType]| ParamTypes::Positional {
        leading: vec![Accepts::one_of(&[Str])],
        rest: Accepts::one_of(rest),
    };

    vec![
        Builtin::new(
            "CONCATENATE",
            Signature::returning(Str).min(1).uniform(&[Str, Number, Array]),
            fn_concatenate,
        ),
        Builtin::new(
            "CHAR",
            Signature::returning(Str).exactly(1).uniform(&[Number]),
            fn_char,
        ),
        Builtin::new(
            "EXACT",
            Signature::returning(Boolean).exactly(2).uniform(&[Str, Number]),
            fn_exact,
        )
        .check_with(check_exact),
        Builtin::new(
            "ISEMPTY",
            Signature::returning(Boolean)
                .exactly(1)
                .params(ParamTypes::Uniform(Accepts::AnyExcept(vec![Boolean]))),
            fn_isempty,
        ),
        Builtin::new(
            "JOIN",
            Signature::returning(Str)
                .exactly(2)
                .params(ParamTypes::Positional {
                    leading: vec![Accepts::Any],
                    rest: Accepts::one_of(&[Str]),
                }),
            fn_join,
        ),
        Builtin::new(
            "LEFT",
            Signature::returning(Str)
                .min(1)
                .optional(1)
                .params(text_then(&[Number, Str])),
            fn_left,
        ),
        Builtin::new(
            "RIGHT",
            Signature::returning(Str)
                .min(1)
                .optional(1)
                .params(text_then(&[Number, Str])),
            fn_right,
        ),
        Builtin::new(
            "MID",
            Signature::returning(Str)
                .exactly(3)
                .params(text_then(&[Number, Str])),
            fn_mid,
        ),
        Builtin::new(
            "LEN",
            Signature::returning(Number).exactly(1).uniform(&[
                Str,
                Array,
                Named("idarray".into()),
                Named("didarray".into()),
            ]),
            fn_len,
        ),
        Builtin::new(
            "LOWER",
            Signature::returning(Str).exactly(1).uniform(&[Str]),
            fn_lower,
        ),
        Builtin::new(
            "UPPER",
            Signature::returning(Str).exactly(1).uniform(&[Str]),
            fn_upper,
        ),
        Builtin::new(
            "REPLACE",
            Signature::returning(Str)
                .exactly(4)
                .params(ParamTypes::Positional {
                    leading: vec![
                        Accepts::one_of(&[Str]),
                        Accepts::one_of(&[Number]),
                        Accepts::one_of(&[Number]),
                        Accepts::one_of(&[Str]),
                    ],
                    rest: Accepts::Any,
                }),
            fn_replace,
        ),
        Builtin::new(
            "REPT",
            Signature::returning(Str)
                .exactly(2)
                .params(text_then(&[Number, Str])),
            fn_rept,
        ),
        Builtin::new(
            "SEARCH",
            Signature::returning(Number)
                .min(2)
                .optional(1)
                .params(ParamTypes::Positional {
                    leading: vec![Accepts::one_of(&[Str]), Accepts::one_of(&[Str])],
                    rest: Accepts::one_of(&[Str, Number]),
                }),
            fn_search,
        ),
        Builtin::new(
            "SPLIT",
            Signature::returning(Array)
                .exactly(2)
                .params(text_then(&[Str, Number])),
            fn_split,
        ),
        Builtin::new(
            "TRIM",
            Signature::returning(Str).exactly(1).uniform(&[Str]),
            fn_trim,
        ),
        Builtin::new(
            "UNION",
            Signature::returning(Array).min(1).uniform(&[Str, Number, Array]),
            fn_union,
        ),
        Builtin::new(
            "VALUE",
            Signature::returning(Number).exactly(1).uniform(&[Str]),
            fn_value,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn s(v: &str) -> Value {
        Value::from(v)
    }

    fn n(v: f64) -> Value {
        Value::Number(v)
    }

    #[test]
    fn concatenate_spells_booleans() {
        assert_eq!(
            fn_concatenate(&[s("a"), Value::Boolean(true), Value::Null, n(1.5)]),
            Ok(s("aTRUE1.5"))
        );
    }

    #[test]
    fn left_right_default_to_one_character() {
        assert_eq!(fn_left(&[s("héllo")]), Ok(s("h")));
        assert_eq!(fn_left(&[s("héllo"), n(2.0)]), Ok(s("hé")));
        assert_eq!(fn_right(&[s("héllo"), n(3.0)]), Ok(s("llo")));
        assert_eq!(fn_right(&[s("ab"), n(10.0)]), Ok(s("ab")));
    }

    #[test]
    fn mid_and_replace_use_zero_based_offsets() {
        assert_eq!(fn_mid(&[s("abcdef"), n(1.0), n(3.0)]), Ok(s("bcd")));
        assert_eq!(
            fn_replace(&[s("abcdef"), n(1.0), n(2.0), s("XY")]),
            Ok(s("aXYdef"))
        );
    }

    #[test]
    fn search_is_case_insensitive_and_one_based() {
        assert_eq!(fn_search(&[s("B"), s("abc")]), Ok(n(2.0)));
        assert_eq!(fn_search(&[s("z"), s("abc")]), Ok(n(0.0)));
        assert_eq!(fn_search(&[s("a"), s("abca"), n(2.0)]), Ok(n(4.0)));
    }

    #[test]
    fn union_keeps_first_occurrence() {
        assert_eq!(
            fn_union(&[n(2.0), n(3.0), n(4.0), n(3.0)]),
            Ok(Value::from(vec![2.0, 3.0, 4.0]))
        );
        assert_eq!(
            fn_union(&[Value::from(vec!["a", "a", "b"])]),
            Ok(Value::from(vec!["a", "b"]))
        );
        assert_eq!(fn_union(&[]), Ok(Value::Array(vec![])));
    }

    #[test]
    fn join_requires_array_and_text_separator() {
        assert_eq!(
            fn_join(&[Value::from(vec![1.0, 2.0, 3.0]), s("-")]),
            Ok(s("1-2-3"))
        );
        assert_eq!(fn_join(&[Value::from(vec![1.0]), n(1.0)]), Ok(s("")));
    }

    #[test]
    fn split_and_len() {
        assert_eq!(
            fn_split(&[s("a,b"), s(",")]),
            Ok(Value::from(vec!["a", "b"]))
        );
        assert_eq!(fn_len(&[s("héllo")]), Ok(n(5.0)));
        assert_eq!(fn_len(&[Value::Null]), Ok(n(0.0)));
    }
}

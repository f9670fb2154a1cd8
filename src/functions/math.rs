//! Math and aggregation functions
//!
//! Sums, averages and products accumulate in `Decimal` so that
//! `SUM(0.1, 0.2)` is `0.3`. Trigonometric functions take degrees and round
//! their result to 8 decimals.

use rust_decimal::prelude::*;

use super::{Accepts, Builtin, EvalFn, ParamTypes, Signature, arg, flatten, numeric};
use crate::Value;
use crate::error::FunctionFailure;
use crate::types::ValueType::{self, Any, Array, Number, String as Str};
use crate::value::{from_decimal, parse_numeric, to_decimal};

type FnResult = Result<Value, FunctionFailure>;

const NUMERIC: &[ValueType] = &[Number, Str];
const AGGREGATE: &[ValueType] = &[Number, Str, Array];

/// Exact sum, `f64` once a term has no decimal form.
fn decimal_sum(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut exact = Some(Decimal::ZERO);
    let mut approx = 0.0;
    for n in values {
        approx += n;
        exact = exact.zip(to_decimal(n)).and_then(|(acc, d)| acc.checked_add(d));
    }
    exact.map_or(approx, from_decimal)
}

/// Numeric value of an argument, `0` when it has none.
fn number_or_zero(value: &Value) -> f64 {
    numeric(value).unwrap_or(0.0)
}

fn round_to(n: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places as i32);
    (n * scale).round() / scale
}

/// Values of an argument that may be a single value or an array.
fn as_list(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

pub fn fn_abs(args: &[Value]) -> FnResult {
    Ok(Value::Number(arg(args, 0).as_number().map_or(0.0, f64::abs)))
}

/// AVERAGE: mean of the numbers among the flattened arguments, 0 when none.
pub fn fn_average(args: &[Value]) -> FnResult {
    let numbers: Vec<f64> = flatten(args)
        .into_iter()
        .filter_map(Value::as_number)
        .filter(|n| n.is_finite())
        .collect();
    if numbers.is_empty() {
        return Ok(Value::Number(0.0));
    }
    let count = numbers.len();
    let total = decimal_sum(numbers);
    let mean = to_decimal(total)
        .and_then(|d| d.checked_div(Decimal::from(count)))
        .map_or(total / count as f64, from_decimal);
    Ok(Value::Number(mean))
}

/// Shared by CEILING and FLOOR: rounds away from or toward zero to a
/// multiple of `significance`. `up` selects CEILING.
fn to_multiple(args: &[Value], up: bool) -> FnResult {
    let number = number_or_zero(arg(args, 0));
    let significance = match arg(args, 1) {
        Value::Undefined => 1.0,
        other => number_or_zero(other),
    };
    if significance == 0.0 {
        return Ok(Value::Number(0.0));
    }
    let both_negative = number < 0.0 && significance < 0.0;
    let step = significance.abs();
    let ratio = number.abs() / step;
    let result = if number >= 0.0 {
        if up {
            (number / step).ceil() * step
        } else {
            (number / step).floor() * step
        }
    } else if up != both_negative {
        -ratio.floor() * step
    } else {
        -ratio.ceil() * step
    };
    Ok(Value::Number(result))
}

/// CEILING(number, significance)
pub fn fn_ceiling(args: &[Value]) -> FnResult {
    to_multiple(args, true)
}

/// FLOOR(number, significance)
pub fn fn_floor(args: &[Value]) -> FnResult {
    to_multiple(args, false)
}

/// COUNT: the number of arguments, or of flattened elements when a single
/// argument is given.
pub fn fn_count(args: &[Value]) -> FnResult {
    let count = if args.len() > 1 {
        args.len()
    } else {
        flatten(args).len()
    };
    Ok(Value::Number(count as f64))
}

/// COUNTIF(range, criteria)
pub fn fn_countif(args: &[Value]) -> FnResult {
    let criteria = Criteria::new(arg(args, 1));
    let count = as_list(arg(args, 0))
        .into_iter()
        .filter(|v| criteria.matches(v))
        .count();
    Ok(Value::Number(count as f64))
}

/// FIXED(number, [decimals = 0]): text with exactly `decimals` places.
pub fn fn_fixed(args: &[Value]) -> FnResult {
    let Some(n) = numeric(arg(args, 0)) else {
        return Ok(Value::Number(f64::NAN));
    };
    let places = number_or_zero(arg(args, 1)).clamp(0.0, 28.0) as u32;
    let text = match to_decimal(n) {
        Some(d) => {
            let rounded = d.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
            format!("{:.*}", places as usize, rounded)
        }
        None => format!("{:.*}", places as usize, n),
    };
    Ok(Value::String(text))
}

pub fn fn_int(args: &[Value]) -> FnResult {
    Ok(Value::Number(arg(args, 0).as_number().map_or(0.0, f64::floor)))
}

/// k-th element of the numbers in `args[0]` after sorting with `order`.
fn kth(args: &[Value], descending: bool) -> FnResult {
    let mut numbers: Vec<f64> = as_list(arg(args, 0))
        .into_iter()
        .filter_map(Value::as_number)
        .filter(|n| !n.is_nan())
        .collect();
    numbers.sort_by(|a, b| if descending { b.total_cmp(a) } else { a.total_cmp(b) });

    let k = arg(args, 1).to_number();
    if numbers.is_empty() || !k.is_finite() || k < 1.0 {
        return Ok(Value::Undefined);
    }
    let index = (k.trunc() as usize - 1) % numbers.len();
    Ok(Value::Number(numbers[index]))
}

/// LARGE(array, k): k-th largest number, wrapping around past the end.
pub fn fn_large(args: &[Value]) -> FnResult {
    kth(args, true)
}

/// SMALL(array, k): k-th smallest number, wrapping around past the end.
pub fn fn_small(args: &[Value]) -> FnResult {
    kth(args, false)
}

/// LOG(number, [base = 10])
pub fn fn_log(args: &[Value]) -> FnResult {
    let n = number_or_zero(arg(args, 0));
    let result = match arg(args, 1) {
        Value::Undefined => n.log10(),
        base => n.ln() / number_or_zero(base).ln(),
    };
    Ok(Value::Number(result))
}

/// MOD(dividend, divisor): result has the sign of the divisor; `NaN` for a
/// zero divisor.
pub fn fn_mod(args: &[Value]) -> FnResult {
    let a = number_or_zero(arg(args, 0));
    let b = number_or_zero(arg(args, 1));
    if b == 0.0 {
        return Ok(Value::Number(f64::NAN));
    }
    let exact = to_decimal(a)
        .zip(to_decimal(b))
        .and_then(|(a, b)| Some(a - b * (a.checked_div(b)?).floor()));
    Ok(Value::Number(
        exact.map_or_else(|| a - b * (a / b).floor(), from_decimal),
    ))
}

fn extremum(args: &[Value], pick: fn(f64, f64) -> f64) -> FnResult {
    let result = flatten(args)
        .into_iter()
        .filter_map(Value::as_number)
        .reduce(pick)
        .unwrap_or(0.0);
    Ok(Value::Number(result))
}

pub fn fn_max(args: &[Value]) -> FnResult {
    extremum(args, f64::max)
}

pub fn fn_min(args: &[Value]) -> FnResult {
    extremum(args, f64::min)
}

pub fn fn_power(args: &[Value]) -> FnResult {
    let base = number_or_zero(arg(args, 0));
    let exponent = number_or_zero(arg(args, 1));
    Ok(Value::Number(base.powf(exponent)))
}

/// PRODUCT: product of the flattened numbers, 0 when there are none.
pub fn fn_product(args: &[Value]) -> FnResult {
    let numbers: Vec<f64> = flatten(args).into_iter().filter_map(Value::as_number).collect();
    if numbers.is_empty() {
        return Ok(Value::Number(0.0));
    }
    let exact = numbers.iter().try_fold(Decimal::ONE, |acc, n| {
        to_decimal(*n).and_then(|d| acc.checked_mul(d))
    });
    Ok(Value::Number(
        exact.map_or_else(|| numbers.iter().product(), from_decimal),
    ))
}

/// ROUND(number, digits): half away from zero; negative digits round to
/// tens, hundreds and so on.
pub fn fn_round(args: &[Value]) -> FnResult {
    let n = number_or_zero(arg(args, 0));
    let digits = number_or_zero(arg(args, 1)).trunc();
    if digits >= 0.0 {
        let places = digits.min(28.0) as u32;
        if let Some(d) = to_decimal(n) {
            let rounded = d.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
            return Ok(Value::Number(from_decimal(rounded)));
        }
        return Ok(Value::Number(round_to(n, places)));
    }
    let scale = 10f64.powf(-digits);
    Ok(Value::Number((n / scale).round() * scale))
}

/// SQRT: negative input yields 0.
pub fn fn_sqrt(args: &[Value]) -> FnResult {
    let n = number_or_zero(arg(args, 0));
    Ok(Value::Number(if n < 0.0 { 0.0 } else { n.sqrt() }))
}

/// SUM: numbers and numeric strings among the flattened arguments.
pub fn fn_sum(args: &[Value]) -> FnResult {
    let total = decimal_sum(flatten(args).into_iter().filter_map(numeric));
    Ok(Value::Number(total))
}

/// SUMIF(range, criteria, [sum_range = range]); `null` when the ranges
/// differ in length.
pub fn fn_sumif(args: &[Value]) -> FnResult {
    let range = as_list(arg(args, 0));
    let sum_range = match arg(args, 2) {
        Value::Undefined | Value::Null => range.clone(),
        other => as_list(other),
    };
    if range.len() != sum_range.len() {
        return Ok(Value::Null);
    }
    let criteria = arg(args, 1);
    if criteria.is_nullish() || criteria.as_str() == Some("") {
        return Ok(Value::Number(0.0));
    }
    let criteria = Criteria::new(criteria);
    let total = decimal_sum(
        range
            .iter()
            .zip(sum_range)
            .filter(|(cell, _)| criteria.matches(cell))
            .filter_map(|(_, value)| numeric(value)),
    );
    Ok(Value::Number(total))
}

/// SUMIFS(sum_range, range1, criteria1, range2, criteria2, ...)
pub fn fn_sumifs(args: &[Value]) -> FnResult {
    let sum_range = as_list(arg(args, 0));
    let conditions: Vec<(Vec<&Value>, Criteria)> = args
        .get(1..)
        .unwrap_or_default()
        .chunks(2)
        .map(|pair| (as_list(arg(pair, 0)), Criteria::new(arg(pair, 1))))
        .collect();

    let total = decimal_sum(sum_range.iter().enumerate().filter_map(|(i, value)| {
        let matched = conditions
            .iter()
            .all(|(range, criteria)| range.get(i).is_some_and(|cell| criteria.matches(cell)));
        if matched { numeric(value) } else { None }
    }));
    Ok(Value::Number(total))
}

/// SUMPRODUCT: sum over positions of the product of the numbers found at
/// that position; positions without any number contribute 0.
pub fn fn_sumproduct(args: &[Value]) -> FnResult {
    let columns: Vec<Vec<&Value>> = args.iter().map(as_list).collect();
    let longest = columns.iter().map(Vec::len).max().unwrap_or(0);

    let products = (0..longest).map(|i| {
        columns
            .iter()
            .filter_map(|column| column.get(i).and_then(|v| v.as_number()))
            .reduce(|acc, n| {
                to_decimal(acc)
                    .zip(to_decimal(n))
                    .and_then(|(a, b)| a.checked_mul(b))
                    .map_or(acc * n, from_decimal)
            })
            .unwrap_or(0.0)
    });
    Ok(Value::Number(decimal_sum(products)))
}

fn degrees(args: &[Value]) -> f64 {
    number_or_zero(arg(args, 0)).to_radians()
}

pub fn fn_sin(args: &[Value]) -> FnResult {
    Ok(Value::Number(round_to(degrees(args).sin(), 8)))
}

pub fn fn_cos(args: &[Value]) -> FnResult {
    Ok(Value::Number(round_to(degrees(args).cos(), 8)))
}

pub fn fn_tan(args: &[Value]) -> FnResult {
    Ok(Value::Number(round_to(degrees(args).tan(), 8)))
}

pub fn fn_cot(args: &[Value]) -> FnResult {
    Ok(Value::Number(round_to(1.0 / degrees(args).tan(), 8)))
}

pub fn fn_radians(args: &[Value]) -> FnResult {
    Ok(Value::Number(round_to(degrees(args), 8)))
}

/// INDEX(collection, position): element at a 0-based position or key.
pub fn fn_index(args: &[Value]) -> FnResult {
    Ok(arg(args, 0).index(arg(args, 1)))
}

/// Condition of COUNTIF/SUMIF/SUMIFS.
///
/// A text criterion may start with a comparison operator (`>=`, `<=`, `!=`,
/// `<>`, `==`, `=`, `>`, `<`); the rest is compared numerically when it is a
/// number and as text otherwise. Without an operator the criterion must
/// equal the cell.
#[derive(Debug)]
struct Criteria {
    op: CompareOp,
    operand: Operand,
}

#[derive(Debug, Clone, Copy)]
enum CompareOp {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

#[derive(Debug)]
enum Operand {
    Number(f64),
    Text(String),
    Value(Value),
}

impl Criteria {
    fn new(criteria: &Value) -> Self {
        match criteria {
            Value::String(s) => Self::parse(s),
            Value::Number(n) => Criteria {
                op: CompareOp::Equal,
                operand: Operand::Number(*n),
            },
            other => Criteria {
                op: CompareOp::Equal,
                operand: Operand::Value(other.clone()),
            },
        }
    }

    fn parse(s: &str) -> Self {
        const PREFIXES: &[(&str, CompareOp)] = &[
            (">=", CompareOp::GreaterEqual),
            ("<=", CompareOp::LessEqual),
            ("!=", CompareOp::NotEqual),
            ("<>", CompareOp::NotEqual),
            ("==", CompareOp::Equal),
            ("=", CompareOp::Equal),
            (">", CompareOp::Greater),
            ("<", CompareOp::Less),
        ];

        let Some((op, rest)) = PREFIXES
            .iter()
            .find_map(|(prefix, op)| s.strip_prefix(prefix).map(|rest| (*op, rest)))
        else {
            return Criteria {
                op: CompareOp::Equal,
                operand: Operand::Text(s.to_string()),
            };
        };

        let rest = rest.trim();
        let unquoted = ['"', '\'']
            .iter()
            .find_map(|q| rest.strip_prefix(*q).and_then(|r| r.strip_suffix(*q)));
        let operand = match unquoted {
            Some(text) => Operand::Text(text.to_string()),
            None if !rest.is_empty() && parse_numeric(rest).is_finite() => {
                Operand::Number(parse_numeric(rest))
            }
            None => Operand::Text(rest.to_string()),
        };
        Criteria { op, operand }
    }

    fn matches(&self, cell: &Value) -> bool {
        let ordering = match &self.operand {
            Operand::Number(n) => match numeric(cell) {
                Some(value) => value.partial_cmp(n),
                None => return matches!(self.op, CompareOp::NotEqual),
            },
            Operand::Text(text) => {
                if cell.is_nullish() {
                    return matches!(self.op, CompareOp::NotEqual);
                }
                Some(cell.to_string().as_str().cmp(text.as_str()))
            }
            Operand::Value(value) => {
                let equal = cell.strict_eq(value);
                return match self.op {
                    CompareOp::NotEqual => !equal,
                    _ => equal,
                };
            }
        };
        let Some(ordering) = ordering else {
            return false;
        };
        match self.op {
            CompareOp::Equal => ordering.is_eq(),
            CompareOp::NotEqual => ordering.is_ne(),
            CompareOp::Less => ordering.is_lt(),
            CompareOp::LessEqual => ordering.is_le(),
            CompareOp::Greater => ordering.is_gt(),
            CompareOp::GreaterEqual => ordering.is_ge(),
        }
    }
}

pub fn builtins() -> Vec<Builtin> {
    let one = |name: &'static str, f: EvalFn| {
        Builtin::new(name, Signature::returning(Number).exactly(1).uniform(NUMERIC), f)
    };
    let two = |name: &'static str, f: EvalFn| {
        Builtin::new(name, Signature::returning(Number).exactly(2).uniform(NUMERIC), f)
    };
    let aggregate = |name: &'static str, f: EvalFn| {
        Builtin::new(name, Signature::returning(Number).min(1).uniform(AGGREGATE), f)
    };
    let angle = |name: &'static str, f: EvalFn| {
        Builtin::new(name, Signature::returning(Number).exactly(1).uniform(&[Number]), f)
    };
    let ranked = |name: &'static str, f: EvalFn| {
        Builtin::new(
            name,
            Signature::returning(Number)
                .exactly(2)
                .params(ParamTypes::Positional {
                    leading: vec![Accepts::one_of(AGGREGATE)],
                    rest: Accepts::one_of(NUMERIC),
                }),
            f,
        )
    };

    vec![
        one("ABS", fn_abs),
        aggregate("AVERAGE", fn_average),
        two("CEILING", fn_ceiling),
        Builtin::new("COUNT", Signature::returning(Number).min(1), fn_count),
        Builtin::new(
            "COUNTIF",
            Signature::returning(Number).exactly(2).uniform(AGGREGATE),
            fn_countif,
        ),
        two("FLOOR", fn_floor),
        Builtin::new(
            "FIXED",
            Signature::returning(Str).min(1).optional(1).uniform(NUMERIC),
            fn_fixed,
        ),
        one("INT", fn_int),
        ranked("LARGE", fn_large),
        ranked("SMALL", fn_small),
        Builtin::new(
            "LOG",
            Signature::returning(Number).min(1).optional(1).uniform(NUMERIC),
            fn_log,
        ),
        two("MOD", fn_mod),
        aggregate("MAX", fn_max),
        aggregate("MIN", fn_min),
        two("POWER", fn_power),
        aggregate("PRODUCT", fn_product),
        two("ROUND", fn_round),
        one("SQRT", fn_sqrt),
        aggregate("SUM", fn_sum),
        Builtin::new(
            "SUMIF",
            Signature::returning(Number).min(2).optional(1).uniform(&[Str, Number, Array]),
            fn_sumif,
        ),
        Builtin::new(
            "SUMIFS",
            Signature::returning(Number).min(3).optional(252).uniform(&[Str, Number, Array]),
            fn_sumifs,
        ),
        aggregate("SUMPRODUCT", fn_sumproduct),
        angle("SIN", fn_sin),
        angle("COS", fn_cos),
        angle("TAN", fn_tan),
        angle("COT", fn_cot),
        angle("RADIANS", fn_radians),
        Builtin::new(
            "INDEX",
            Signature::returning(Any)
                .exactly(2)
                .params(ParamTypes::Positional {
                    leading: vec![Accepts::Any],
                    rest: Accepts::one_of(&[Number]),
                }),
            fn_index,
        ),
    ]
}

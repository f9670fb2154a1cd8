use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// A runtime value produced by evaluating a formula.
///
/// The value model follows the dynamic semantics formulas are written
/// against: there is a single number type, `undefined` is distinct from
/// `null`, and every value has a truthiness and a string and number
/// coercion.
///
/// # Examples
///
/// ```
/// use formula_lang::Value;
///
/// assert!(Value::Number(1.0).is_truthy());
/// assert!(!Value::String(String::new()).is_truthy());
/// assert_eq!(Value::String(" 42 ".into()).to_number(), 42.0);
/// assert_eq!(Value::Number(0.5).to_string(), "0.5");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value, e.g. a reference that resolves to nothing
    #[default]
    Undefined,

    Null,

    Boolean(bool),

    /// Double precision number; arithmetic chains go through decimals
    Number(f64),

    String(String),

    /// Point in time, always UTC
    Date(DateTime<Utc>),

    Array(Vec<Value>),

    Object(HashMap<String, Value>),
}

impl Value {
    /// `undefined`, `null`, `false`, `0`, `NaN` and `""` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Date(_) | Value::Array(_) | Value::Object(_) => true,
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Scalars other than dates; `+` concatenates as soon as one side is not
    /// primitive or is a string.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Value::Date(_) | Value::Array(_) | Value::Object(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Numeric coercion.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => parse_numeric(s),
            Value::Date(d) => d.timestamp_millis() as f64,
            Value::Array(items) => match items.as_slice() {
                [] => 0.0,
                [single] => parse_numeric(&single.to_string()),
                _ => f64::NAN,
            },
            Value::Object(_) => f64::NAN,
        }
    }

    /// 32-bit integer coercion used by `&` and `|`.
    pub fn to_int32(&self) -> i32 {
        let n = self.to_number();
        if !n.is_finite() {
            return 0;
        }
        let wrapped = n.trunc().rem_euclid(4_294_967_296.0);
        wrapped as u32 as i32
    }

    /// `==` / `!=`.
    pub fn loose_eq(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Undefined | Null, Undefined | Null) => true,
            (Undefined | Null, _) | (_, Undefined | Null) => false,
            (Number(_), String(_)) | (String(_), Number(_)) => {
                self.to_number() == other.to_number()
            }
            (Boolean(_), _) => Number(self.to_number()).loose_eq(other),
            (_, Boolean(_)) => self.loose_eq(&Number(other.to_number())),
            (Date(_) | Array(_) | Object(_), Number(_) | String(_)) => {
                other.loose_eq(&self.to_primitive())
            }
            (Number(_) | String(_), Date(_) | Array(_) | Object(_)) => {
                self.loose_eq(&other.to_primitive())
            }
            _ => self.strict_eq(other),
        }
    }

    /// `===` / `!==`. Composite values compare structurally.
    pub fn strict_eq(&self, other: &Value) -> bool {
        self == other
    }

    /// Ordering used by `<`, `<=`, `>`, `>=`.
    ///
    /// Two strings compare lexicographically, everything else numerically.
    /// `None` when either side is `NaN` after coercion, which makes every
    /// ordering comparison false.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        if let (Value::String(a), Value::String(b)) = (self, other) {
            return Some(a.cmp(b));
        }
        let a = self.to_number();
        let b = other.to_number();
        a.partial_cmp(&b)
    }

    fn to_primitive(&self) -> Value {
        match self {
            Value::Date(d) => Value::String(format_date(d)),
            Value::Array(_) | Value::Object(_) => Value::String(self.to_string()),
            other => other.clone(),
        }
    }

    /// Index access, `value[index]`.
    pub fn index(&self, index: &Value) -> Value {
        match self {
            Value::Array(items) => array_position(index)
                .and_then(|i| items.get(i))
                .cloned()
                .unwrap_or(Value::Undefined),
            Value::Object(map) => map.get(&index.to_string()).cloned().unwrap_or_default(),
            Value::String(s) => array_position(index)
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::String(c.to_string()))
                .unwrap_or_default(),
            _ => Value::Undefined,
        }
    }

    /// Walks a dotted path; numeric segments index into arrays.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(self, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }
}

fn array_position(index: &Value) -> Option<usize> {
    let n = match index {
        Value::Number(n) => *n,
        Value::String(s) => parse_numeric(s),
        _ => return None,
    };
    if n.fract() == 0.0 && n >= 0.0 && n.is_finite() {
        Some(n as usize)
    } else {
        None
    }
}

/// Exact decimal for the shortest text form of `n`; `None` for `NaN`,
/// infinities and magnitudes beyond 28 significant digits.
pub fn to_decimal(n: f64) -> Option<Decimal> {
    if !n.is_finite() {
        return None;
    }
    Decimal::from_str(&n.to_string())
        .or_else(|_| Decimal::from_scientific(&format!("{n:e}")))
        .ok()
}

pub fn from_decimal(d: Decimal) -> f64 {
    d.normalize().to_f64().unwrap_or(f64::NAN)
}

/// String to number: surrounding whitespace ignored, empty is zero,
/// anything unparsable is `NaN`.
pub fn parse_numeric(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => {
            f64::NAN
        }
        _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// Number to text the way formulas print numbers: integral values without
/// a fraction, `NaN` and `Infinity` spelled out.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

pub fn format_date(d: &DateTime<Utc>) -> String {
    d.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Date(d) => f.write_str(&format_date(d)),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_nullish() {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            Value::Object(_) => f.write_str("[object Object]"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

//! Built-in formula functions and the registries the engine consults.
//!
//! Every function is described once by a [`Builtin`]: its name, its
//! [`Signature`] and two callables. The evaluation registry keeps the value
//! implementation, the check registry keeps the signature stub. Both are
//! [`FunctionRegistry`] instances with the same descriptor shape, built once
//! and read-only afterwards.

pub mod date;
pub mod logic;
pub mod math;
pub mod text;

use std::collections::BTreeMap;

use crate::Value;
use crate::error::{FunctionFailure, SignatureError};
use crate::types::ValueType;

/// Evaluation-mode implementation.
pub type EvalFn = fn(&[Value]) -> Result<Value, FunctionFailure>;

/// Check-mode stub: validates argument types and returns the result type.
pub type CheckFn = fn(&Signature, &[ValueType]) -> Result<ValueType, SignatureError>;

/// Types admitted at one parameter position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accepts {
    Any,
    OneOf(Vec<ValueType>),
    AnyExcept(Vec<ValueType>),
}

impl Accepts {
    pub fn one_of(types: &[ValueType]) -> Self {
        Accepts::OneOf(types.to_vec())
    }

    /// `any` arguments are always admitted.
    pub fn admits(&self, ty: &ValueType) -> bool {
        match self {
            Accepts::Any => true,
            Accepts::OneOf(types) => ty.satisfies(types),
            Accepts::AnyExcept(types) => ty.is_any() || !types.contains(ty),
        }
    }

    /// Types listed in error reports.
    pub fn listed(&self) -> Vec<ValueType> {
        match self {
            Accepts::Any => vec![ValueType::Any],
            Accepts::OneOf(types) => types.clone(),
            Accepts::AnyExcept(_) => Vec::new(),
        }
    }
}

/// Per-position parameter constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamTypes {
    /// Same constraint for every argument
    Uniform(Accepts),
    /// Explicit constraints for the first arguments, `rest` for the others
    Positional { leading: Vec<Accepts>, rest: Accepts },
    /// Alternating constraints, e.g. condition/value pairs
    Alternating { even: Accepts, odd: Accepts },
}

impl ParamTypes {
    pub fn at(&self, index: usize) -> &Accepts {
        match self {
            ParamTypes::Uniform(accepts) => accepts,
            ParamTypes::Positional { leading, rest } => leading.get(index).unwrap_or(rest),
            ParamTypes::Alternating { even, odd } => {
                if index % 2 == 0 {
                    even
                } else {
                    odd
                }
            }
        }
    }
}

/// Arity and type contract of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub min_args: usize,
    /// `None` = unlimited
    pub max_args: Option<usize>,
    pub params: ParamTypes,
    pub returns: ValueType,
}

impl Signature {
    /// Any number of arguments of any type.
    pub fn returning(returns: ValueType) -> Self {
        Signature {
            min_args: 0,
            max_args: None,
            params: ParamTypes::Uniform(Accepts::Any),
            returns,
        }
    }

    pub fn min(mut self, count: usize) -> Self {
        self.min_args = count;
        self
    }

    pub fn max(mut self, count: usize) -> Self {
        self.max_args = Some(count);
        self
    }

    /// Exactly `count` arguments.
    pub fn exactly(self, count: usize) -> Self {
        self.min(count).max(count)
    }

    /// Up to `count` arguments beyond the minimum.
    pub fn optional(self, count: usize) -> Self {
        let max = self.min_args + count;
        self.max(max)
    }

    pub fn uniform(mut self, types: &[ValueType]) -> Self {
        self.params = ParamTypes::Uniform(Accepts::one_of(types));
        self
    }

    pub fn params(mut self, params: ParamTypes) -> Self {
        self.params = params;
        self
    }

    /// Human readable arity, e.g. `1..`, `2..3`, `0`.
    pub fn arity(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => max.to_string(),
            Some(max) => format!("{}..{}", self.min_args, max),
            None => format!("{}..", self.min_args),
        }
    }
}

/// Default check-mode stub: arity, then each argument against its position.
pub fn check_signature(
    signature: &Signature,
    args: &[ValueType],
) -> Result<ValueType, SignatureError> {
    if args.len() < signature.min_args {
        return Err(SignatureError::MinParamCount(signature.min_args));
    }
    if let Some(max) = signature.max_args
        && args.len() > max
    {
        return Err(SignatureError::MaxParamCount(max));
    }
    for (index, arg) in args.iter().enumerate() {
        let accepts = signature.params.at(index);
        if !accepts.admits(arg) {
            return Err(SignatureError::ParamType {
                index,
                expected: accepts.listed(),
            });
        }
    }
    Ok(signature.returns.clone())
}

/// A registered function.
#[derive(Debug, Clone)]
pub struct FunctionDef<F> {
    /// Upper case name as written in formulas
    pub name: &'static str,
    pub signature: Signature,
    pub implementation: F,
}

/// Name-ordered function table.
#[derive(Debug, Clone)]
pub struct FunctionRegistry<F> {
    functions: BTreeMap<&'static str, FunctionDef<F>>,
}

impl<F> Default for FunctionRegistry<F> {
    fn default() -> Self {
        FunctionRegistry {
            functions: BTreeMap::new(),
        }
    }
}

impl<F> FunctionRegistry<F> {
    /// Registry without any function.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDef<F>> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Adds or replaces a function, returning the one it replaced.
    pub fn register(&mut self, def: FunctionDef<F>) -> Option<FunctionDef<F>> {
        self.functions.insert(def.name, def)
    }

    pub fn with(mut self, def: FunctionDef<F>) -> Self {
        self.register(def);
        self
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Functions in name order.
    pub fn iter(&self) -> impl Iterator<Item = &FunctionDef<F>> {
        self.functions.values()
    }
}

impl<F> FromIterator<FunctionDef<F>> for FunctionRegistry<F> {
    fn from_iter<I: IntoIterator<Item = FunctionDef<F>>>(iter: I) -> Self {
        let mut registry = FunctionRegistry::empty();
        for def in iter {
            registry.register(def);
        }
        registry
    }
}

impl FunctionRegistry<EvalFn> {
    /// Evaluation registry with every built-in function.
    pub fn builtin() -> Self {
        builtins()
            .into_iter()
            .map(|b| FunctionDef {
                name: b.name,
                signature: b.signature,
                implementation: b.eval,
            })
            .collect()
    }
}

impl FunctionRegistry<CheckFn> {
    /// Check registry with a stub for every built-in function.
    pub fn builtin() -> Self {
        builtins()
            .into_iter()
            .map(|b| FunctionDef {
                name: b.name,
                signature: b.signature,
                implementation: b.check,
            })
            .collect()
    }
}

/// Descriptor of a built-in function.
#[derive(Debug, Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub signature: Signature,
    pub eval: EvalFn,
    pub check: CheckFn,
}

impl Builtin {
    pub fn new(name: &'static str, signature: Signature, eval: EvalFn) -> Self {
        Builtin {
            name,
            signature,
            eval,
            check: check_signature,
        }
    }

    /// Replace the default check stub.
    pub fn check_with(mut self, check: CheckFn) -> Self {
        self.check = check;
        self
    }
}

/// Every built-in function.
pub fn builtins() -> Vec<Builtin> {
    let mut all = logic::builtins();
    all.extend(text::builtins());
    all.extend(math::builtins());
    all.extend(date::builtins());
    all
}

static UNDEFINED: Value = Value::Undefined;

/// Argument at `index`, `undefined` when absent.
pub(crate) fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&UNDEFINED)
}

/// Arguments with nested arrays flattened, in order.
pub(crate) fn flatten(args: &[Value]) -> Vec<&Value> {
    let mut out = Vec::with_capacity(args.len());
    for value in args {
        match value {
            Value::Array(items) => out.extend(flatten(items)),
            other => out.push(other),
        }
    }
    out
}

/// Numbers and numeric strings as `f64`; everything else is not numeric.
pub(crate) fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::String(s) if !s.trim().is_empty() => {
            let n = crate::value::parse_numeric(s);
            n.is_finite().then_some(n)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ValueType::*;

    #[test]
    fn registries_share_one_descriptor_list() {
        let eval = FunctionRegistry::<EvalFn>::builtin();
        let check = FunctionRegistry::<CheckFn>::builtin();
        assert_eq!(eval.len(), builtins().len());
        let eval_names: Vec<_> = eval.iter().map(|f| f.name).collect();
        let check_names: Vec<_> = check.iter().map(|f| f.name).collect();
        assert_eq!(eval_names, check_names);
        assert!(eval_names.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn check_signature_reports_arity_then_types() {
        let sig = Signature::returning(Number).min(1).optional(1).uniform(&[Number]);
        assert_eq!(
            check_signature(&sig, &[]),
            Err(SignatureError::MinParamCount(1))
        );
        assert_eq!(
            check_signature(&sig, &[Number, Number, Number]),
            Err(SignatureError::MaxParamCount(2))
        );
        assert_eq!(
            check_signature(&sig, &[Number, String]),
            Err(SignatureError::ParamType {
                index: 1,
                expected: vec![Number]
            })
        );
        assert_eq!(check_signature(&sig, &[Any, Number]), Ok(Number));
    }

    #[test]
    fn positional_and_alternating_constraints() {
        let positional = ParamTypes::Positional {
            leading: vec![Accepts::one_of(&[String])],
            rest: Accepts::one_of(&[Number]),
        };
        assert_eq!(positional.at(0), &Accepts::one_of(&[String]));
        assert_eq!(positional.at(5), &Accepts::one_of(&[Number]));

        let alternating = ParamTypes::Alternating {
            even: Accepts::one_of(&[Boolean]),
            odd: Accepts::Any,
        };
        assert_eq!(alternating.at(2), &Accepts::one_of(&[Boolean]));
        assert_eq!(alternating.at(3), &Accepts::Any);
    }

    #[test]
    fn flatten_nested_arrays() {
        let args = vec![
            Value::Number(1.0),
            Value::from(vec![Value::Number(2.0), Value::from(vec![3.0])]),
        ];
        let flat: Vec<f64> = flatten(&args).into_iter().filter_map(numeric).collect();
        assert_eq!(flat, vec![1.0, 2.0, 3.0]);
    }
}

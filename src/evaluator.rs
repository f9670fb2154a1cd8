use rust_decimal::Decimal;

use crate::{
    ast::{
        Additive, ArrayLiteral, Atomic, CommaGroup, Comparison, Fixity, FunctionCall, Literal,
        LiteralKind, Logical, Multiplicative, Operator, Reference, Token, Unary,
    },
    error::EvalError,
    functions::{EvalFn, FunctionRegistry, date::to_datetime, numeric},
    value::{Value, from_decimal, parse_numeric, to_decimal},
    visitor::Visitor,
};

/// Evaluation-mode visitor.
///
/// Walks a parsed formula and produces its value. Field references are
/// looked up in `variables` by dotted path; function calls go to the
/// evaluation registry.
///
/// # Examples
///
/// ```
/// use formula_lang::evaluator::Interpreter;
/// use formula_lang::functions::{EvalFn, FunctionRegistry};
/// use formula_lang::lexer::tokenize;
/// use formula_lang::parser::parse;
/// use formula_lang::visitor::Visitor;
/// use formula_lang::Value;
///
/// let functions = FunctionRegistry::<EvalFn>::builtin();
/// let variables = Value::Object([("price".to_string(), Value::Number(120.0))].into());
///
/// let tree = parse(tokenize("SUM({price}, 0.5) * 2").tokens).unwrap();
/// let mut interpreter = Interpreter::new(&functions, &variables);
/// assert_eq!(interpreter.visit_expression(&tree), Ok(Value::Number(241.0)));
/// ```
pub struct Interpreter<'a> {
    functions: &'a FunctionRegistry<EvalFn>,
    variables: &'a Value,
}

impl<'a> Interpreter<'a> {
    pub fn new(functions: &'a FunctionRegistry<EvalFn>, variables: &'a Value) -> Self {
        Interpreter {
            functions,
            variables,
        }
    }
}

/// Exact arithmetic on two numbers, falling back to `f64` when either side
/// or the result has no decimal form.
fn arithmetic(op: Operator, a: f64, b: f64) -> f64 {
    if let Some(ad) = to_decimal(a)
        && let Some(bd) = to_decimal(b)
    {
        let exact: Option<Decimal> = match op {
            Operator::Add => ad.checked_add(bd),
            Operator::Subtract => ad.checked_sub(bd),
            Operator::Multiply => ad.checked_mul(bd),
            Operator::Divide => ad.checked_div(bd),
            _ => None,
        };
        if let Some(rd) = exact {
            return from_decimal(rd);
        }
    }
    match op {
        Operator::Add => a + b,
        Operator::Subtract => a - b,
        Operator::Multiply => a * b,
        _ => a / b,
    }
}

/// `+`: concatenation when either side is a string or not primitive,
/// numeric addition otherwise.
fn add(left: &Value, right: &Value) -> Value {
    let concatenates = |v: &Value| matches!(v, Value::String(_)) || !v.is_primitive();
    if concatenates(left) || concatenates(right) {
        Value::String(format!("{left}{right}"))
    } else {
        Value::Number(arithmetic(
            Operator::Add,
            left.to_number(),
            right.to_number(),
        ))
    }
}

fn bitwise(op: Operator, left: &Value, right: &Value) -> Value {
    let (a, b) = (left.to_int32(), right.to_int32());
    let result = if op == Operator::BitwiseAnd { a & b } else { a | b };
    Value::Number(f64::from(result))
}

fn unknown_operator(token: &Token) -> EvalError {
    EvalError::UnknownOperator {
        operator: token.text.clone(),
        offset: token.offset,
    }
}

/// Starting value of a chain fold: a falsy head counts as `0`.
fn seed(head: Value) -> Value {
    if head.is_truthy() {
        head
    } else {
        Value::Number(0.0)
    }
}

impl Visitor for Interpreter<'_> {
    type Output = Value;
    type Error = EvalError;

    fn visit_comma_group(&mut self, node: &CommaGroup) -> Result<Value, EvalError> {
        let mut last = Value::Undefined;
        for item in &node.items {
            last = self.visit_logical(item)?;
        }
        Ok(last)
    }

    /// Both operands are always evaluated; the result is the deciding
    /// operand, not a boolean.
    fn visit_logical(&mut self, node: &Logical) -> Result<Value, EvalError> {
        let head = self.visit_comparison(&node.head)?;
        if node.rest.is_empty() {
            return Ok(head);
        }
        let mut acc = seed(head);
        for (token, operand) in &node.rest {
            let right = self.visit_comparison(operand)?;
            acc = match token.operator() {
                Some(Operator::LogicalAnd) => {
                    if acc.is_truthy() {
                        right
                    } else {
                        acc
                    }
                }
                Some(Operator::LogicalOr) => {
                    if acc.is_truthy() {
                        acc
                    } else {
                        right
                    }
                }
                _ => return Err(unknown_operator(token)),
            };
        }
        Ok(acc)
    }

    fn visit_comparison(&mut self, node: &Comparison) -> Result<Value, EvalError> {
        let head = self.visit_additive(&node.head)?;
        if node.rest.is_empty() {
            return Ok(head);
        }
        let mut acc = seed(head);
        for (token, operand) in &node.rest {
            let right = self.visit_additive(operand)?;
            let ordering = acc.compare(&right);
            acc = match token.operator() {
                Some(Operator::EqualLoose) => Value::Boolean(acc.loose_eq(&right)),
                Some(Operator::NotEqualLoose) => Value::Boolean(!acc.loose_eq(&right)),
                Some(Operator::EqualStrict) => Value::Boolean(acc.strict_eq(&right)),
                Some(Operator::NotEqualStrict) => Value::Boolean(!acc.strict_eq(&right)),
                Some(Operator::Greater) => Value::Boolean(ordering.is_some_and(|o| o.is_gt())),
                Some(Operator::GreaterOrEqual) => {
                    Value::Boolean(ordering.is_some_and(|o| o.is_ge()))
                }
                Some(Operator::Less) => Value::Boolean(ordering.is_some_and(|o| o.is_lt())),
                Some(Operator::LessOrEqual) => Value::Boolean(ordering.is_some_and(|o| o.is_le())),
                Some(op @ (Operator::BitwiseAnd | Operator::BitwiseOr)) => {
                    bitwise(op, &acc, &right)
                }
                _ => return Err(unknown_operator(token)),
            };
        }
        Ok(acc)
    }

    fn visit_additive(&mut self, node: &Additive) -> Result<Value, EvalError> {
        let head = self.visit_multiplicative(&node.head)?;
        if node.rest.is_empty() {
            return Ok(head);
        }
        let mut acc = seed(head);
        for (token, operand) in &node.rest {
            let right = self.visit_multiplicative(operand)?;
            acc = match token.operator() {
                Some(Operator::Add) => add(&acc, &right),
                Some(Operator::Subtract) => Value::Number(arithmetic(
                    Operator::Subtract,
                    acc.to_number(),
                    right.to_number(),
                )),
                Some(op @ (Operator::BitwiseAnd | Operator::BitwiseOr)) => {
                    bitwise(op, &acc, &right)
                }
                _ => return Err(unknown_operator(token)),
            };
        }
        Ok(acc)
    }

    /// Operands that are neither numbers nor numeric strings count as `0`.
    fn visit_multiplicative(&mut self, node: &Multiplicative) -> Result<Value, EvalError> {
        let head = self.visit_atomic(&node.head)?;
        if node.rest.is_empty() {
            return Ok(head);
        }
        let mut acc = numeric(&seed(head)).unwrap_or(0.0);
        for (token, operand) in &node.rest {
            let right = numeric(&self.visit_atomic(operand)?).unwrap_or(0.0);
            acc = match token.operator() {
                Some(Operator::Multiply) => arithmetic(Operator::Multiply, acc, right),
                Some(Operator::Divide) => {
                    if right == 0.0 {
                        return Err(EvalError::DivisionByZero {
                            offset: token.offset,
                        });
                    }
                    arithmetic(Operator::Divide, acc, right)
                }
                _ => return Err(unknown_operator(token)),
            };
        }
        Ok(Value::Number(acc))
    }

    fn visit_atomic(&mut self, node: &Atomic) -> Result<Value, EvalError> {
        let mut value = self.visit_primary(&node.base)?;
        for index in &node.indexes {
            let key = self.visit_expression(index)?;
            value = value.index(&key);
        }
        Ok(value)
    }

    fn visit_array(&mut self, node: &ArrayLiteral) -> Result<Value, EvalError> {
        node.elements
            .iter()
            .map(|element| self.visit_logical(element))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    fn visit_call(&mut self, node: &FunctionCall) -> Result<Value, EvalError> {
        let name = node.name();
        let offset = node.name.offset;
        let Some(function) = self.functions.get(name) else {
            return Err(EvalError::UnknownFunction {
                name: name.to_string(),
                offset,
            });
        };

        let args = node
            .args
            .iter()
            .map(|arg| self.visit_logical(arg))
            .collect::<Result<Vec<_>, _>>()?;

        (function.implementation)(&args).map_err(|source| {
            tracing::debug!(function = name, offset, error = %source, "function failed");
            EvalError::Function {
                name: name.to_string(),
                offset,
                source,
            }
        })
    }

    fn visit_literal(&mut self, node: &Literal) -> Result<Value, EvalError> {
        let raw = node.raw();
        let value = match node.kind {
            // Quotes are dropped, escapes are kept as written.
            LiteralKind::String => Value::String(
                raw.get(1..raw.len().saturating_sub(1))
                    .unwrap_or_default()
                    .to_string(),
            ),
            LiteralKind::Date => to_datetime(&Value::String(raw.to_string()))
                .map_or(Value::Number(f64::NAN), Value::Date),
            LiteralKind::Number => Value::Number(parse_numeric(raw)),
            LiteralKind::Boolean => Value::Boolean(raw == "true"),
            LiteralKind::Null => Value::Null,
            LiteralKind::Undefined => Value::Undefined,
            LiteralKind::NaN => Value::Number(f64::NAN),
        };
        Ok(value)
    }

    fn visit_reference(&mut self, node: &Reference) -> Result<Value, EvalError> {
        Ok(self
            .variables
            .get_path(&node.path)
            .cloned()
            .unwrap_or_default())
    }

    /// Postfix `++`/`--` yield the operand unchanged; prefix forms add or
    /// subtract one.
    fn visit_unary(&mut self, node: &Unary) -> Result<Value, EvalError> {
        let operand = self.visit_atomic(&node.operand)?;
        let value = match (node.op(), node.fixity) {
            (Some(Operator::Increment | Operator::Decrement), Fixity::Postfix) => operand,
            (Some(Operator::LogicalNot), _) => Value::Boolean(!operand.is_truthy()),
            (Some(Operator::Add), _) => Value::Number(operand.to_number()),
            (Some(Operator::Subtract), _) => Value::Number(-operand.to_number()),
            (Some(Operator::Increment), Fixity::Prefix) => add(&operand, &Value::Number(1.0)),
            (Some(Operator::Decrement), Fixity::Prefix) => Value::Number(arithmetic(
                Operator::Subtract,
                operand.to_number(),
                1.0,
            )),
            _ => return Err(unknown_operator(&node.operator)),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn eval_with(formula: &str, variables: &Value) -> Result<Value, EvalError> {
        let functions = FunctionRegistry::<EvalFn>::builtin();
        let lexed = tokenize(formula);
        assert!(lexed.is_clean(), "lex errors in {formula}: {:?}", lexed.errors);
        let tree = parse(lexed.tokens).expect("formula parses");
        Interpreter::new(&functions, variables).visit_expression(&tree)
    }

    fn eval(formula: &str) -> Value {
        eval_with(formula, &Value::Undefined).expect("formula evaluates")
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(eval("20 + 10 * 2 / 2 - 10"), Value::Number(20.0));
        assert_eq!(eval("10 - 2 - 3"), Value::Number(5.0));
        assert_eq!(eval("2 * (3 + 4)"), Value::Number(14.0));
        assert_eq!(
            eval("1 + !2 * 3 / 4 & 5 !== 6 && 1 * 2 + 3"),
            Value::Number(5.0)
        );
    }

    #[test]
    fn decimal_accumulation() {
        assert_eq!(eval("0.1 + 0.2"), Value::Number(0.3));
        assert_eq!(eval("0.3 - 0.1"), Value::Number(0.2));
        assert_eq!(eval("1.1 * 3"), Value::Number(3.3));
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(eval("'a' + 1"), Value::from("a1"));
        assert_eq!(eval("1 + 2 + 'x'"), Value::from("3x"));
        assert!(eval("'x' - 1").to_number().is_nan());
    }

    #[test]
    fn falsy_left_operand_starts_at_zero() {
        assert_eq!(eval("null + 2"), Value::Number(2.0));
        assert_eq!(eval("undefined + 2"), Value::Number(2.0));
        assert_eq!(eval("'' + 1"), Value::Number(1.0));
        assert_eq!(eval("NaN + 1"), Value::Number(1.0));
        assert_eq!(eval("null * 2"), Value::Number(0.0));
        assert_eq!(eval("false && true"), Value::Number(0.0));
        assert_eq!(eval("null == undefined"), Value::Boolean(false));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(
            eval_with("1 / 0", &Value::Undefined),
            Err(EvalError::DivisionByZero { offset: 2 })
        );
    }

    #[test]
    fn logical_returns_deciding_operand() {
        assert_eq!(eval("0 || 'fallback'"), Value::from("fallback"));
        assert_eq!(eval("1 && 2"), Value::Number(2.0));
        assert_eq!(eval("'' && 2"), Value::Number(0.0));
        assert_eq!(eval("1 > 2 && 3"), Value::Number(0.0));
    }

    #[test]
    fn comparisons() {
        assert_eq!(eval("1 == '1'"), Value::Boolean(true));
        assert_eq!(eval("1 === '1'"), Value::Boolean(false));
        assert_eq!(eval("'b' > 'a'"), Value::Boolean(true));
        assert_eq!(eval("1 >= NaN"), Value::Boolean(false));
        assert_eq!(eval("2 > 1 > 0"), Value::Boolean(true));
    }

    #[test]
    fn increment_and_decrement() {
        assert_eq!(eval("++1"), Value::Number(2.0));
        assert_eq!(eval("--1"), Value::Number(0.0));
        assert_eq!(eval("1++"), Value::Number(1.0));
        assert_eq!(eval("1--"), Value::Number(1.0));
        assert_eq!(eval("++1 + ++1"), Value::Number(4.0));
    }

    #[test]
    fn references_and_indexing() {
        let variables = Value::Object(
            [
                ("a".to_string(), Value::from(vec![1.0, 2.0, 3.0])),
                (
                    "b".to_string(),
                    Value::Object([("c".to_string(), Value::from("deep"))].into()),
                ),
            ]
            .into(),
        );
        assert_eq!(eval_with("{a}[1]", &variables), Ok(Value::Number(2.0)));
        assert_eq!(eval_with("{b.c}", &variables), Ok(Value::from("deep")));
        assert_eq!(eval_with("{missing}", &variables), Ok(Value::Undefined));
    }

    #[test]
    fn comma_group_yields_last_item() {
        assert_eq!(eval("(1, 2, 3)"), Value::Number(3.0));
    }

    #[test]
    fn literals() {
        assert_eq!(eval("'single'"), Value::from("single"));
        assert_eq!(eval(r#""a\"b""#), Value::from(r#"a\"b"#));
        assert!(matches!(eval("2024-03-05T10:00:00.000Z"), Value::Date(_)));
        assert!(eval("NaN").to_number().is_nan());
    }

    #[test]
    fn function_failures_carry_name_and_offset() {
        let err = eval_with("1 + DATE('x')", &Value::Undefined).unwrap_err();
        assert!(matches!(
            err,
            EvalError::Function { ref name, offset: 4, .. } if name == "DATE"
        ));
        assert_eq!(
            eval_with("NOPE(1)", &Value::Undefined),
            Err(EvalError::UnknownFunction {
                name: "NOPE".into(),
                offset: 0
            })
        );
    }
}

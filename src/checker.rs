//! Check mode: the same tree walk as the interpreter, over type tags.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    ast::{
        Additive, ArrayLiteral, Atomic, Chain, CommaGroup, Comparison, FunctionCall, Literal,
        LiteralKind, Logical, Multiplicative, Operator, Reference, Token, Unary,
    },
    error::{CheckError, Side},
    functions::{CheckFn, FunctionRegistry},
    types::{TypeMap, ValueType},
    visitor::Visitor,
};

/// `"${name}"` declares a placeholder of type `name`.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\{([a-z]+)\}$").unwrap());

const NUMBER: &[ValueType] = &[ValueType::Number];
const NUMBER_OR_STRING: &[ValueType] = &[ValueType::Number, ValueType::String];

/// Check-mode visitor.
///
/// Propagates [`ValueType`] tags instead of values. References resolve
/// against declared types, function calls against the check registry.
/// Operators enforce their operand contracts:
///
/// - `+` takes numbers or strings and yields `string` if either side is one
/// - `-`, `*`, `/` and the unary arithmetic operators take numbers
/// - comparison and logical chains accept anything
pub struct TypeChecker<'a> {
    functions: &'a FunctionRegistry<CheckFn>,
    types: &'a TypeMap,
}

impl<'a> TypeChecker<'a> {
    pub fn new(functions: &'a FunctionRegistry<CheckFn>, types: &'a TypeMap) -> Self {
        TypeChecker { functions, types }
    }

    fn operands<T>(
        &mut self,
        chain: &Chain<T>,
        visit: fn(&mut Self, &T) -> Result<ValueType, CheckError>,
    ) -> Result<Vec<ValueType>, CheckError> {
        chain.operands().map(|operand| visit(self, operand)).collect()
    }
}

fn require(
    ty: &ValueType,
    expected: &[ValueType],
    token: &Token,
    side: Side,
) -> Result<(), CheckError> {
    if ty.satisfies(expected) {
        Ok(())
    } else {
        Err(CheckError::Operand {
            operator: token.text.clone(),
            side,
            expected: expected.to_vec(),
            found: ty.clone(),
            offset: token.offset,
        })
    }
}

impl Visitor for TypeChecker<'_> {
    type Output = ValueType;
    type Error = CheckError;

    fn visit_comma_group(&mut self, node: &CommaGroup) -> Result<ValueType, CheckError> {
        let mut last = ValueType::Undefined;
        for item in &node.items {
            last = self.visit_logical(item)?;
        }
        Ok(last)
    }

    fn visit_logical(&mut self, node: &Logical) -> Result<ValueType, CheckError> {
        let mut types = self.operands(node, Self::visit_comparison)?;
        if node.rest.is_empty() {
            return Ok(types.remove(0));
        }
        Ok(ValueType::Boolean)
    }

    fn visit_comparison(&mut self, node: &Comparison) -> Result<ValueType, CheckError> {
        let mut types = self.operands(node, Self::visit_additive)?;
        let Some((last, _)) = node.rest.last() else {
            return Ok(types.remove(0));
        };
        if last.operator().is_some_and(|op| op.is_bitwise()) {
            Ok(ValueType::Number)
        } else {
            Ok(ValueType::Boolean)
        }
    }

    fn visit_additive(&mut self, node: &Additive) -> Result<ValueType, CheckError> {
        let mut acc = self.visit_multiplicative(&node.head)?;
        if node.rest.is_empty() {
            return Ok(acc);
        }
        for (token, operand) in &node.rest {
            let right = self.visit_multiplicative(operand)?;
            acc = match token.operator() {
                Some(Operator::Add) => {
                    require(&acc, NUMBER_OR_STRING, token, Side::Left)?;
                    require(&right, NUMBER_OR_STRING, token, Side::Right)?;
                    if acc == ValueType::String || right == ValueType::String {
                        ValueType::String
                    } else {
                        ValueType::Number
                    }
                }
                Some(Operator::Subtract) => {
                    require(&acc, NUMBER, token, Side::Left)?;
                    require(&right, NUMBER, token, Side::Right)?;
                    ValueType::Number
                }
                Some(Operator::BitwiseAnd | Operator::BitwiseOr) => {
                    require(&acc, NUMBER_OR_STRING, token, Side::Left)?;
                    require(&right, NUMBER_OR_STRING, token, Side::Right)?;
                    ValueType::Number
                }
                _ => {
                    return Err(CheckError::Operand {
                        operator: token.text.clone(),
                        side: Side::Left,
                        expected: Vec::new(),
                        found: acc,
                        offset: token.offset,
                    });
                }
            };
        }
        Ok(acc)
    }

    fn visit_multiplicative(&mut self, node: &Multiplicative) -> Result<ValueType, CheckError> {
        let head = self.visit_atomic(&node.head)?;
        let Some((first, _)) = node.rest.first() else {
            return Ok(head);
        };
        require(&head, NUMBER, first, Side::Left)?;
        for (token, operand) in &node.rest {
            let right = self.visit_atomic(operand)?;
            require(&right, NUMBER, token, Side::Right)?;
        }
        Ok(ValueType::Number)
    }

    /// Indexing into a value yields `any`: element types are not tracked.
    fn visit_atomic(&mut self, node: &Atomic) -> Result<ValueType, CheckError> {
        let base = self.visit_primary(&node.base)?;
        if node.indexes.is_empty() {
            return Ok(base);
        }
        for index in &node.indexes {
            self.visit_expression(index)?;
        }
        Ok(ValueType::Any)
    }

    fn visit_array(&mut self, node: &ArrayLiteral) -> Result<ValueType, CheckError> {
        for element in &node.elements {
            self.visit_logical(element)?;
        }
        Ok(ValueType::Array)
    }

    fn visit_call(&mut self, node: &FunctionCall) -> Result<ValueType, CheckError> {
        let name = node.name();
        let offset = node.name.offset;
        let Some(function) = self.functions.get(name) else {
            return Err(CheckError::UnknownFunction {
                name: name.to_string(),
                offset,
            });
        };

        let args = node
            .args
            .iter()
            .map(|arg| self.visit_logical(arg))
            .collect::<Result<Vec<_>, _>>()?;

        (function.implementation)(&function.signature, &args)
            .map_err(|error| CheckError::from_signature(name, offset, &args, error))
    }

    fn visit_literal(&mut self, node: &Literal) -> Result<ValueType, CheckError> {
        let ty = match node.kind {
            LiteralKind::String => {
                let raw = node.raw();
                let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or_default();
                match PLACEHOLDER.captures(inner).and_then(|c| c.get(1)) {
                    Some(name) => ValueType::from(name.as_str()),
                    None => ValueType::String,
                }
            }
            LiteralKind::Date => ValueType::Date,
            LiteralKind::Number | LiteralKind::NaN => ValueType::Number,
            LiteralKind::Boolean => ValueType::Boolean,
            LiteralKind::Null => ValueType::Null,
            LiteralKind::Undefined => ValueType::Undefined,
        };
        Ok(ty)
    }

    fn visit_reference(&mut self, node: &Reference) -> Result<ValueType, CheckError> {
        Ok(self
            .types
            .get(&node.path)
            .cloned()
            .unwrap_or(ValueType::Undefined))
    }

    fn visit_unary(&mut self, node: &Unary) -> Result<ValueType, CheckError> {
        let operand = self.visit_atomic(&node.operand)?;
        if node.op() == Some(Operator::LogicalNot) {
            return Ok(ValueType::Boolean);
        }
        require(&operand, NUMBER, &node.operator, Side::Right)?;
        Ok(ValueType::Number)
    }
}

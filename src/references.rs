//! Collects the field references a formula reads.

use std::convert::Infallible;

use crate::ast::{
    Additive, ArrayLiteral, Atomic, Chain, CommaGroup, Comparison, Expression, FunctionCall,
    Literal, Logical, Multiplicative, Reference, Unary,
};
use crate::visitor::Visitor;

/// Reference paths in first-use order, each listed once.
#[derive(Debug, Default)]
pub struct ReferenceCollector {
    paths: Vec<String>,
}

impl ReferenceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_paths(self) -> Vec<String> {
        self.paths
    }

    fn chain<T>(
        &mut self,
        chain: &Chain<T>,
        visit: fn(&mut Self, &T) -> Result<(), Infallible>,
    ) -> Result<(), Infallible> {
        chain.operands().try_for_each(|operand| visit(self, operand))
    }
}

/// Paths referenced by `expression`.
///
/// # Examples
///
/// ```
/// use formula_lang::lexer::tokenize;
/// use formula_lang::parser::parse;
/// use formula_lang::references::collect;
///
/// let tree = parse(tokenize("{a} + SUM({b.c}, {a})").tokens).unwrap();
/// assert_eq!(collect(&tree), vec!["a".to_string(), "b.c".to_string()]);
/// ```
pub fn collect(expression: &Expression) -> Vec<String> {
    let mut collector = ReferenceCollector::new();
    let Ok(()) = collector.visit_expression(expression);
    collector.into_paths()
}

impl Visitor for ReferenceCollector {
    type Output = ();
    type Error = Infallible;

    fn visit_comma_group(&mut self, node: &CommaGroup) -> Result<(), Infallible> {
        node.items
            .iter()
            .try_for_each(|item| self.visit_logical(item))
    }

    fn visit_logical(&mut self, node: &Logical) -> Result<(), Infallible> {
        self.chain(node, Self::visit_comparison)
    }

    fn visit_comparison(&mut self, node: &Comparison) -> Result<(), Infallible> {
        self.chain(node, Self::visit_additive)
    }

    fn visit_additive(&mut self, node: &Additive) -> Result<(), Infallible> {
        self.chain(node, Self::visit_multiplicative)
    }

    fn visit_multiplicative(&mut self, node: &Multiplicative) -> Result<(), Infallible> {
        self.chain(node, Self::visit_atomic)
    }

    fn visit_atomic(&mut self, node: &Atomic) -> Result<(), Infallible> {
        self.visit_primary(&node.base)?;
        node.indexes
            .iter()
            .try_for_each(|index| self.visit_expression(index))
    }

    fn visit_array(&mut self, node: &ArrayLiteral) -> Result<(), Infallible> {
        node.elements
            .iter()
            .try_for_each(|element| self.visit_logical(element))
    }

    fn visit_call(&mut self, node: &FunctionCall) -> Result<(), Infallible> {
        node.args.iter().try_for_each(|arg| self.visit_logical(arg))
    }

    fn visit_literal(&mut self, _node: &Literal) -> Result<(), Infallible> {
        Ok(())
    }

    fn visit_reference(&mut self, node: &Reference) -> Result<(), Infallible> {
        if !self.paths.contains(&node.path) {
            self.paths.push(node.path.clone());
        }
        Ok(())
    }

    fn visit_unary(&mut self, node: &Unary) -> Result<(), Infallible> {
        self.visit_atomic(&node.operand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn paths(formula: &str) -> Vec<String> {
        collect(&parse(tokenize(formula).tokens).expect("formula parses"))
    }

    #[test]
    fn walks_every_node_kind() {
        assert_eq!(
            paths("IF(!{a}, [{b}][{c}], ({d}, -{e}++))"),
            vec!["a", "b", "c", "d", "e"]
        );
    }

    #[test]
    fn duplicates_are_listed_once() {
        assert_eq!(paths("{x} * {x} + {y.z}"), vec!["x", "y.z"]);
        assert!(paths("1 + 2").is_empty());
    }
}

//! Tree walking interface shared by the interpreter, the type checker and
//! the reference collector.
//!
//! Each implementation gives every node kind its own handler; nothing in the
//! tree knows which walk is running.

use crate::ast::{
    Additive, ArrayLiteral, Atomic, CommaGroup, Comparison, Expression, FunctionCall, Group,
    Literal, Logical, Multiplicative, Primary, Reference, Unary,
};

pub trait Visitor {
    type Output;
    type Error;

    fn visit_expression(&mut self, node: &Expression) -> Result<Self::Output, Self::Error> {
        self.visit_comma_group(&node.group)
    }

    fn visit_comma_group(&mut self, node: &CommaGroup) -> Result<Self::Output, Self::Error>;

    fn visit_logical(&mut self, node: &Logical) -> Result<Self::Output, Self::Error>;

    fn visit_comparison(&mut self, node: &Comparison) -> Result<Self::Output, Self::Error>;

    fn visit_additive(&mut self, node: &Additive) -> Result<Self::Output, Self::Error>;

    fn visit_multiplicative(&mut self, node: &Multiplicative)
    -> Result<Self::Output, Self::Error>;

    fn visit_atomic(&mut self, node: &Atomic) -> Result<Self::Output, Self::Error>;

    fn visit_primary(&mut self, node: &Primary) -> Result<Self::Output, Self::Error> {
        match node {
            Primary::Array(array) => self.visit_array(array),
            Primary::Call(call) => self.visit_call(call),
            Primary::Group(group) => self.visit_group(group),
            Primary::Literal(literal) => self.visit_literal(literal),
            Primary::Reference(reference) => self.visit_reference(reference),
            Primary::Unary(unary) => self.visit_unary(unary),
        }
    }

    fn visit_array(&mut self, node: &ArrayLiteral) -> Result<Self::Output, Self::Error>;

    fn visit_call(&mut self, node: &FunctionCall) -> Result<Self::Output, Self::Error>;

    fn visit_group(&mut self, node: &Group) -> Result<Self::Output, Self::Error> {
        self.visit_expression(&node.inner)
    }

    fn visit_literal(&mut self, node: &Literal) -> Result<Self::Output, Self::Error>;

    fn visit_reference(&mut self, node: &Reference) -> Result<Self::Output, Self::Error>;

    fn visit_unary(&mut self, node: &Unary) -> Result<Self::Output, Self::Error>;
}

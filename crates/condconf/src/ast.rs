//! syntax tree of a conditional config
//!
//! Built once by the [crate::parser::Parser] and never modified afterwards.
use crate::token::{Position, VariableToken};
use crate::value::Value;
use crate::visit::VisitVariables;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    Variable(VariableToken),
    List(Vec<Expression>),
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
        /// position of the operator
        position: Position,
    },
    Binary {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
        /// position of the operator
        position: Position,
    },
}

impl Expression {
    /// All variable occurrences that are not in `defined`, in source order
    pub fn undefined_variables(&self, defined: &BTreeSet<String>) -> Vec<VariableToken> {
        let mut undefined = vec![];
        let mut collect = |variable: &VariableToken| {
            if !defined.contains(&variable.name) {
                undefined.push(variable.clone());
            }
        };
        self.visit_variables(&mut collect);
        undefined
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Neg,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Not => f.write_str("not"),
            UnaryOperator::Neg => f.write_str("-"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    In,
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::In => "in",
        })
    }
}

/// `target = expression` inside the assignment block
#[derive(Debug, Clone, PartialEq, derive_new::new)]
pub struct AssignmentStatement {
    pub target: VariableToken,
    pub expression: Expression,
}

/// Raw lines guarded by a predicate header
#[derive(Debug, Clone, PartialEq, derive_new::new)]
pub struct Section {
    /// position of the opening `[` of the header
    pub start: Position,
    pub predicate: Expression,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedConfig {
    /// in source order, which is also evaluation order
    pub assignments: Vec<AssignmentStatement>,
    /// lines before the first predicate header, always included
    pub default_lines: Vec<String>,
    pub sections: Vec<Section>,
}

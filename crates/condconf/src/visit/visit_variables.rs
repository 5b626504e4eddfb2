use super::Visit;
use crate::ast::Expression;
use crate::token::VariableToken;

/// Recursively visit all [VariableToken]s, in source order
pub trait VisitVariables {
    fn visit_variables(&self, visitor: &mut dyn Visit<VariableToken>);
}

impl VisitVariables for Expression {
    fn visit_variables(&self, visitor: &mut dyn Visit<VariableToken>) {
        match self {
            Expression::Literal(_) => {}
            Expression::Variable(variable) => visitor.visit(variable),
            Expression::List(elements) => {
                for element in elements {
                    element.visit_variables(visitor);
                }
            }
            Expression::Unary { operand, .. } => operand.visit_variables(visitor),
            Expression::Binary { left, right, .. } => {
                left.visit_variables(visitor);
                right.visit_variables(visitor);
            }
        }
    }
}

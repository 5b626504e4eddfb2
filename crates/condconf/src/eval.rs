//! tree-walking evaluation of [Expression]s
use crate::ast::{BinaryOperator, Expression, UnaryOperator};
use crate::error::{EvalError, TypeMismatch};
use crate::token::Position;
use crate::value::{Value, Variables};

impl Expression {
    /// Evaluate against `env`
    ///
    /// `and`/`or` short-circuit and return one of their operands (like `a or b` returns `a` when `a` is truthy),
    /// every other operator requires operands of compatible kinds.
    pub fn evaluate(&self, env: &Variables) -> Result<Value, EvalError> {
        match self {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Variable(variable) => env.get(&variable.name).cloned().ok_or_else(|| {
                tracing::error!(%variable, "variable has no value, validation missed it");
                EvalError::UndefinedVariable {
                    variable: variable.clone(),
                }
            }),
            Expression::List(elements) => elements
                .iter()
                .map(|element| element.evaluate(env))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Expression::Unary {
                op,
                operand,
                position,
            } => {
                let operand = operand.evaluate(env)?;
                match op {
                    UnaryOperator::Not => Ok(Value::Boolean(!operand.is_truthy())),
                    UnaryOperator::Neg => negate(operand, *position),
                }
            }
            Expression::Binary {
                op,
                left,
                right,
                position,
            } => {
                let left = left.evaluate(env)?;
                match op {
                    BinaryOperator::And if !left.is_truthy() => Ok(left),
                    BinaryOperator::Or if left.is_truthy() => Ok(left),
                    BinaryOperator::And | BinaryOperator::Or => right.evaluate(env),
                    _ => strict(*op, left, right.evaluate(env)?, *position),
                }
            }
        }
    }
}

/// Strict binary operators, both operands already evaluated
///
/// `and`/`or` never get here, [Expression::evaluate] short-circuits them.
fn strict(
    op: BinaryOperator,
    left: Value,
    right: Value,
    position: Position,
) -> Result<Value, EvalError> {
    match op {
        BinaryOperator::And | BinaryOperator::Or => {
            unreachable!("`{op}` is evaluated lazily")
        }
        BinaryOperator::Eq => Ok(Value::Boolean(left == right)),
        BinaryOperator::Ne => Ok(Value::Boolean(left != right)),
        BinaryOperator::Lt | BinaryOperator::Le | BinaryOperator::Gt | BinaryOperator::Ge => {
            let ordering = left.partial_cmp(&right).ok_or_else(|| EvalError::Type {
                position,
                message: format!(
                    "`{op}` cannot compare {} with {}",
                    left.kind(),
                    right.kind()
                ),
            })?;

            Ok(Value::Boolean(match op {
                BinaryOperator::Lt => ordering.is_lt(),
                BinaryOperator::Le => ordering.is_le(),
                BinaryOperator::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
        BinaryOperator::In => contains(&right, &left)
            .map(Value::Boolean)
            .map_err(|cause| EvalError::InTest { position, cause }),
        BinaryOperator::Add => match (left, right) {
            (Value::String(mut left), Value::String(right)) => {
                left.push_str(&right);
                Ok(Value::String(left))
            }
            (Value::List(mut left), Value::List(right)) => {
                left.extend(right);
                Ok(Value::List(left))
            }
            (left, right) => arithmetic(op, left, right, position, i64::checked_add, |a, b| a + b),
        },
        BinaryOperator::Sub => {
            arithmetic(op, left, right, position, i64::checked_sub, |a, b| a - b)
        }
        BinaryOperator::Mul => {
            arithmetic(op, left, right, position, i64::checked_mul, |a, b| a * b)
        }
    }
}

/// Membership of `element` in `container`
fn contains(container: &Value, element: &Value) -> Result<bool, TypeMismatch> {
    match (container, element) {
        (Value::String(haystack), Value::String(needle)) => Ok(haystack.contains(needle.as_str())),
        (Value::List(values), element) => Ok(values.contains(element)),
        (container, element) => Err(TypeMismatch::new(element.kind(), container.kind())),
    }
}

/// Numeric operation, integers stay integers unless mixed with a decimal
fn arithmetic(
    op: BinaryOperator,
    left: Value,
    right: Value,
    position: Position,
    integer: fn(i64, i64) -> Option<i64>,
    decimal: fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    let (a, b) = match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => {
            return integer(*a, *b).map(Value::Integer).ok_or_else(|| EvalError::Type {
                position,
                message: format!("integer overflow in `{left} {op} {right}`"),
            });
        }
        (Value::Integer(a), Value::Decimal(b)) => (*a as f64, *b),
        (Value::Decimal(a), Value::Integer(b)) => (*a, *b as f64),
        (Value::Decimal(a), Value::Decimal(b)) => (*a, *b),
        _ => {
            return Err(EvalError::Type {
                position,
                message: format!(
                    "`{op}` is not supported between {} and {}",
                    left.kind(),
                    right.kind()
                ),
            })
        }
    };

    Ok(Value::Decimal(decimal(a, b)))
}

fn negate(operand: Value, position: Position) -> Result<Value, EvalError> {
    match operand {
        Value::Integer(value) => value
            .checked_neg()
            .map(Value::Integer)
            .ok_or_else(|| EvalError::Type {
                position,
                message: format!("integer overflow in `-{value}`"),
            }),
        Value::Decimal(value) => Ok(Value::Decimal(-value)),
        other => Err(EvalError::Type {
            position,
            message: format!("cannot negate {}", other.kind()),
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::parse;
    use crate::value::ValueKind;
    use pretty_assertions::assert_eq;

    /// Evaluate the predicate of a single-header source
    fn eval_with(expression: &str, env: &Variables) -> Result<Value, EvalError> {
        let parsed = parse(&format!("[{expression}]")).expect("must parse");
        parsed.sections[0].predicate.evaluate(env)
    }

    fn eval(expression: &str) -> Value {
        eval_with(expression, &Variables::new()).expect("must evaluate")
    }

    fn eval_err(expression: &str) -> EvalError {
        eval_with(expression, &Variables::new()).expect_err("must fail")
    }

    #[test]
    fn literals() {
        assert_eq!(eval("1"), Value::Integer(1));
        assert_eq!(eval("'a' + \"b\""), Value::from("ab"));
        assert_eq!(
            eval("[1, [True, 'x']]"),
            Value::List(vec![1.into(), Value::List(vec![true.into(), "x".into()])])
        );
    }

    #[test]
    fn short_circuit_returns_operands() {
        assert_eq!(eval("0 or 'x'"), Value::from("x"));
        assert_eq!(eval("'a' or 'x'"), Value::from("a"));
        assert_eq!(eval("[] and 'x'"), Value::List(vec![]));
        assert_eq!(eval("1 and 'x'"), Value::from("x"));
        assert_eq!(eval("not []"), Value::Boolean(true));
        assert_eq!(eval("not 'a'"), Value::Boolean(false));

        // the right operand would fail, it is never evaluated
        assert_eq!(eval("False and 1 in 2"), Value::Boolean(false));
        assert_eq!(eval("True or -'a'"), Value::Boolean(true));
    }

    #[test]
    fn comparisons() {
        assert_eq!(eval("1 == 1.0"), Value::Boolean(true));
        assert_eq!(eval("True == 1"), Value::Boolean(false));
        assert_eq!(eval("[1, 'a'] == [1, 'a']"), Value::Boolean(true));
        assert_eq!(eval("[1, 'a'] != [1, 'b']"), Value::Boolean(true));
        assert_eq!(eval("'abc' < 'abd'"), Value::Boolean(true));
        assert_eq!(eval("2 >= 2.5"), Value::Boolean(false));
        assert_eq!(eval("[1, 2] <= [1, 2]"), Value::Boolean(true));
        assert_eq!(eval("False < True"), Value::Boolean(true));
        assert_eq!(eval("(1 == 1) == (2 == 2)"), Value::Boolean(true));

        assert_eq!(
            eval_err("'a' < 1"),
            EvalError::Type {
                position: Position::new(1, 6),
                message: "`<` cannot compare string with integer".into()
            }
        );
    }

    #[test]
    fn membership() {
        assert_eq!(eval("'bc' in 'abcd'"), Value::Boolean(true));
        assert_eq!(eval("'x' in 'abcd'"), Value::Boolean(false));
        assert_eq!(eval("[False, 'def'] in [12, 'abc', [False, 'def']]"), Value::Boolean(true));
        assert_eq!(eval("1.0 in [1]"), Value::Boolean(true));
        assert_eq!(eval("not 'z' in ['a']"), Value::Boolean(true));
    }

    #[test]
    fn membership_type_mismatch() {
        assert_eq!(
            eval_err("[] in 'abcd'"),
            EvalError::InTest {
                position: Position::new(1, 5),
                cause: TypeMismatch::new(ValueKind::List, ValueKind::String)
            }
        );

        let env: Variables = [
            ("s".to_string(), Value::from("abcd")),
            ("l".to_string(), Value::List(vec![])),
        ]
        .into_iter()
        .collect();

        assert!(matches!(
            eval_with("[] in s", &env),
            Err(EvalError::InTest { .. })
        ));
        assert!(matches!(
            eval_with("l in 'abcd'", &env),
            Err(EvalError::InTest { .. })
        ));
        assert_eq!(
            eval_with("1 in 2", &env),
            Err(EvalError::InTest {
                position: Position::new(1, 4),
                cause: TypeMismatch::new(ValueKind::Integer, ValueKind::Integer)
            })
        );
    }

    #[test]
    fn arithmetic() {
        assert_eq!(eval("1 + 2 * 3"), Value::Integer(7));
        assert_eq!(eval("1 - 2 - 3"), Value::Integer(-4));
        assert_eq!(eval("1 + 0.5"), Value::Decimal(1.5));
        assert_eq!(eval("-2 * 1.5"), Value::Decimal(-3.0));
        assert_eq!(eval("--3"), Value::Integer(3));
        assert_eq!(eval("[1] + [2, 3]"), Value::from(vec![1, 2, 3]));
    }

    #[test]
    fn smallest_integer_needs_arithmetic() {
        assert!(matches!(
            parse("[-9223372036854775808]").unwrap_err().kind,
            crate::error::ParseErrorKind::IntegerOverflow(_)
        ));
        assert_eq!(eval("-9223372036854775807 - 1"), Value::Integer(i64::MIN));
    }

    #[test]
    fn booleans_are_not_numbers() {
        assert_eq!(eval("True in [1]"), Value::Boolean(false));
        assert_eq!(eval("1 in [True]"), Value::Boolean(false));
        assert_eq!(eval("0 == False"), Value::Boolean(false));
    }

    #[test]
    fn arithmetic_type_errors() {
        assert_eq!(
            eval_err("'a' - 'b'"),
            EvalError::Type {
                position: Position::new(1, 6),
                message: "`-` is not supported between string and string".into()
            }
        );
        assert!(matches!(eval_err("'a' + 1"), EvalError::Type { .. }));
        assert!(matches!(eval_err("[1] * 2"), EvalError::Type { .. }));
        assert!(matches!(eval_err("True + 1"), EvalError::Type { .. }));
        assert_eq!(
            eval_err("-'a'"),
            EvalError::Type {
                position: Position::new(1, 2),
                message: "cannot negate string".into()
            }
        );
        assert_eq!(
            eval_err("9223372036854775807 + 1"),
            EvalError::Type {
                position: Position::new(1, 22),
                message: "integer overflow in `9223372036854775807 + 1`".into()
            }
        );
    }

    #[test]
    fn missing_variable_is_reported() {
        assert_eq!(
            eval_err("x or y"),
            EvalError::UndefinedVariable {
                variable: crate::token::VariableToken::new("x", Position::new(1, 2))
            }
        );
    }
}

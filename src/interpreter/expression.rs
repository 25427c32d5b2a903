use super::environment::Environment;
use super::error::{RuntimeError, RuntimeErrorKind};
use super::executor;
use super::value::Value;
use super::SystemContext;
use crate::parser::expression::{BinaryOperator, Expr, ExprKind, Literal};

pub fn evaluate(
    expr: &Expr,
    environment: &Environment,
    context: &mut dyn SystemContext,
) -> Result<Value, RuntimeError> {
    match &expr.kind {
        ExprKind::Literal(literal) => Ok(match literal {
            Literal::Number(v) => Value::Number(*v),
            Literal::String(v) => Value::String(v.clone()),
            Literal::Bool(v) => Value::Bool(*v),
            Literal::Nil => Value::Nil,
        }),
        ExprKind::Var(name) => environment.read(name).ok_or_else(|| RuntimeError {
            kind: RuntimeErrorKind::UndefinedVariable(name.clone()),
            span: expr.span,
        }),
        ExprKind::Unary { operand } => {
            let value = evaluate(operand, environment, context)?;
            value.numeric_negate().map_err(|kind| RuntimeError {
                kind,
                span: expr.span,
            })
        }
        ExprKind::Binary { operator, lhs, rhs } => {
            let lhs = evaluate(lhs, environment, context)?;
            let rhs = evaluate(rhs, environment, context)?;
            let result = match operator {
                BinaryOperator::Add => lhs.add(&rhs),
                BinaryOperator::Subtract => lhs.subtract(&rhs),
                BinaryOperator::Multiply => lhs.multiply(&rhs),
                BinaryOperator::Divide => lhs.divide(&rhs),
                BinaryOperator::Modulo => lhs.modulo(&rhs),
                BinaryOperator::EqualEqual => Ok(Value::Bool(lhs.is_equal(&rhs))),
                BinaryOperator::LessThan => lhs.less_than(&rhs),
                BinaryOperator::LessThanEqual => lhs.less_than_or_equal(&rhs),
            };
            result.map_err(|kind| RuntimeError {
                kind,
                span: expr.span,
            })
        }
        ExprKind::Call { callee, arguments } => {
            let target = environment.read(callee).ok_or_else(|| RuntimeError {
                kind: RuntimeErrorKind::UndefinedVariable(callee.clone()),
                span: expr.span,
            })?;
            let mut evaluated = Vec::with_capacity(arguments.len());
            for argument in arguments {
                evaluated.push(evaluate(argument, environment, context)?);
            }
            match target {
                Value::Function(function) => {
                    executor::call_function(&function, evaluated, expr.span, context)
                }
                Value::NativeFunction(function) => function.call(evaluated, expr.span, context),
                _ => Err(RuntimeError {
                    kind: RuntimeErrorKind::NotCallable(callee.clone()),
                    span: expr.span,
                }),
            }
        }
    }
}

use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::{One, Signed};

use crate::{
    error::RuntimeError,
    interpreter::{
        bound::{BoundExpression, BoundLine, BoundProgram, BoundStatement},
        engine::{Line, Runtime},
        value::Value,
    },
    symbols::{BuiltinFunction, TypeSymbol},
};

/// Compiles a bound program into schedulable lines.
///
/// Each line becomes a closure over its shared bound statements; nothing
/// is interpreted until the executor actually selects the line. Every
/// line starts with a count of one.
#[must_use]
pub fn evaluate(program: &BoundProgram) -> Vec<Line> {
    program.lines
           .iter()
           .map(|line| {
               let bound = Rc::clone(line);
               let code = move |runtime: &mut dyn Runtime| evaluate_line(&bound, runtime);
               Line::new(line.number.clone(), BigInt::one(), Rc::new(code))
           })
           .collect()
}

fn evaluate_line(line: &BoundLine, runtime: &mut dyn Runtime) -> Result<(), RuntimeError> {
    for statement in &line.statements {
        // defer(true) forfeits the rest of the line.
        if runtime.deferred() {
            break;
        }
        let BoundStatement::Expression(expression) = statement;
        evaluate_expression(expression, runtime)?;
    }
    Ok(())
}

fn evaluate_expression(expression: &BoundExpression,
                       runtime: &mut dyn Runtime)
                       -> Result<Value, RuntimeError> {
    if let Some(constant) = expression.constant_value() {
        return Ok(constant.clone());
    }

    match expression {
        BoundExpression::Literal { value } => Ok(value.clone()),
        BoundExpression::Unary { operator, operand, .. } => {
            let operand = evaluate_expression(operand, runtime)?;
            operator.kind.apply(&operand)
        },
        BoundExpression::Binary { operator, left, right, .. } => {
            use crate::interpreter::bound::BoundBinaryOperatorKind as Kind;
            // Logical operators evaluate the right side only when the
            // left has not already decided the answer.
            match operator.kind {
                Kind::LogicalAnd => {
                    if !evaluate_expression(left, runtime)?.into_boolean() {
                        return Ok(Value::Boolean(false));
                    }
                    evaluate_expression(right, runtime)
                },
                Kind::LogicalOr => {
                    if evaluate_expression(left, runtime)?.into_boolean() {
                        return Ok(Value::Boolean(true));
                    }
                    evaluate_expression(right, runtime)
                },
                _ => {
                    let left = evaluate_expression(left, runtime)?;
                    let right = evaluate_expression(right, runtime)?;
                    operator.kind.apply(&left, &right)
                },
            }
        },
        BoundExpression::Call { function, arguments } => {
            evaluate_call(*function, arguments, runtime)
        },
        BoundExpression::Conversion { to, expression } => {
            let value = evaluate_expression(expression, runtime)?;
            convert_value(value, *to)
        },
        BoundExpression::UpdateLineCount { left, right } => {
            let number = evaluate_expression(left, runtime)?.into_integer();
            let delta = evaluate_expression(right, runtime)?.into_integer();
            runtime.update_count(&number, &delta);
            Ok(Value::Void)
        },
        BoundExpression::UnaryUpdateLineCount { operand } => {
            let value = evaluate_expression(operand, runtime)?.into_integer();
            if value.is_negative() {
                runtime.update_count(&value.abs(), &BigInt::from(-1));
            } else {
                runtime.update_count(&value, &BigInt::one());
            }
            Ok(Value::Void)
        },
        BoundExpression::Error => {
            unreachable!("error expressions never survive a successful binding")
        },
    }
}

fn evaluate_call(function: BuiltinFunction,
                 arguments: &[BoundExpression],
                 runtime: &mut dyn Runtime)
                 -> Result<Value, RuntimeError> {
    match function {
        BuiltinFunction::Again => {
            let keep = evaluate_expression(&arguments[0], runtime)?.into_boolean();
            runtime.again(keep);
            Ok(Value::Void)
        },
        BuiltinFunction::Defer => {
            let defer = evaluate_expression(&arguments[0], runtime)?.into_boolean();
            runtime.defer(defer);
            Ok(Value::Void)
        },
        BuiltinFunction::Exists => {
            let number = evaluate_expression(&arguments[0], runtime)?.into_integer();
            Ok(Value::Boolean(runtime.line_exists(&number)))
        },
        BuiltinFunction::Count => {
            let number = evaluate_expression(&arguments[0], runtime)?.into_integer();
            Ok(Value::Integer(runtime.count(&number)))
        },
        BuiltinFunction::Print => {
            let value = evaluate_expression(&arguments[0], runtime)?;
            runtime.print(&value)?;
            Ok(Value::Void)
        },
        BuiltinFunction::Random => {
            let max = evaluate_expression(&arguments[0], runtime)?.into_integer();
            Ok(Value::Integer(runtime.random(&max)?))
        },
        BuiltinFunction::Read => Ok(Value::String(runtime.read()?)),
        BuiltinFunction::Unicode => {
            let code = evaluate_expression(&arguments[0], runtime)?.into_integer();
            Ok(Value::String(runtime.unicode(&code)?))
        },
    }
}

/// Applies a conversion to a runtime value.
///
/// Implicit conversions cannot fail; explicit ones can, because whether a
/// string parses as an integer or a boolean depends on its contents.
fn convert_value(value: Value, to: TypeSymbol) -> Result<Value, RuntimeError> {
    if to == TypeSymbol::Any || value.type_symbol() == to {
        return Ok(value);
    }
    let from = value.type_symbol();
    match (value, to) {
        (Value::Integer(n), TypeSymbol::String) => Ok(Value::String(n.to_string())),
        (Value::Boolean(b), TypeSymbol::String) => Ok(Value::String(b.to_string())),
        (Value::String(s), TypeSymbol::Integer) => {
            s.parse::<BigInt>()
             .map(Value::Integer)
             .map_err(|_| RuntimeError::InvalidCast { from, to })
        },
        (Value::String(s), TypeSymbol::Boolean) => match s.as_str() {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            _ => Err(RuntimeError::InvalidCast { from, to }),
        },
        _ => Err(RuntimeError::InvalidCast { from, to }),
    }
}

mod environment;

use std::{cell::RefCell, fmt::Debug, io::Write, rc::Rc};

use crate::{
    ast::{Expression, InfixOperator, Operator, UnaryOperator},
    builtin::Arity,
    value::{Value, ValueType},
};

pub use self::environment::Environment;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Variable {0} is not defined.")]
    UndefinedVariable(String),
    #[error("Expected identifier for the left hand side of assignment expression.")]
    InvalidAssignmentTarget,
    #[error("Operand types do not match for {operator} operation: {left} and {right}.")]
    MismatchedOperands {
        operator: InfixOperator,
        left: ValueType,
        right: ValueType,
    },
    #[error("Operator {operator} cannot be applied to {operand} operands.")]
    UnsupportedOperands {
        operator: InfixOperator,
        operand: ValueType,
    },
    #[error("Operand of - must be a Number, found {0}.")]
    InvalidNegate(ValueType),
    #[error("Operand of ! must be a Boolean, found {0}.")]
    InvalidNot(ValueType),
    #[error("Condition must be a Boolean, found {0}.")]
    NonBooleanCondition(ValueType),
    #[error("Operator {operator} expects {expected} operand(s) but received {received}.")]
    OperandCount {
        operator: Operator,
        expected: usize,
        received: usize,
    },
    #[error("Argument {position} of {function} must not be nya.")]
    NilArgument {
        function: &'static str,
        position: usize,
    },
    #[error("Argument {position} of {function} must be {expected}, found {found}.")]
    InvalidArgumentType {
        function: &'static str,
        position: usize,
        expected: String,
        found: ValueType,
    },
    #[error("Function {function} expects {expected} but received {received}.")]
    WrongArgumentCount {
        function: &'static str,
        expected: Arity,
        received: usize,
    },
}

/// Tree-walking evaluator.
///
/// Owns the environment for the whole run; `print` and the fatal error line
/// are written to `output`.
pub struct Evaluator {
    environment: Environment,
    output: Rc<RefCell<dyn Write>>,
}

impl Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("environment", &self.environment)
            .finish()
    }
}

impl Evaluator {
    pub fn new(output: Rc<RefCell<dyn Write>>) -> Self {
        Self {
            environment: Environment::new(),
            output,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Evaluates every expression in order, stopping at the first failure.
    ///
    /// The failure is written to the output as `FATAL ERROR: <message>` and
    /// returned. Effects of earlier expressions are kept.
    pub fn process(&mut self, expressions: &[Expression]) -> Result<(), RuntimeError> {
        for expression in expressions {
            tracing::trace!(%expression, "evaluating statement");
            if let Err(error) = self.process_expression(expression) {
                tracing::debug!(%error, "evaluation stopped");
                writeln!(self.output.borrow_mut(), "FATAL ERROR: {error}")?;
                return Err(error);
            }
        }

        Ok(())
    }

    pub fn process_expression(&mut self, expression: &Expression) -> Result<Value, RuntimeError> {
        match expression {
            Expression::Literal(literal) => Ok(Value::from(literal)),
            Expression::Identifier(name) => self
                .environment
                .get(name)
                .cloned()
                .ok_or_else(|| RuntimeError::UndefinedVariable(name.clone())),
            Expression::Operation { operator, operands } => self.operation(*operator, operands),
            Expression::Conditional {
                condition,
                then_block,
                else_block,
            } => self.conditional(condition, then_block, else_block.as_deref()),
        }
    }

    fn operation(&mut self, operator: Operator, operands: &[Expression]) -> Result<Value, RuntimeError> {
        match operator {
            Operator::Group => {
                let [inner] = operands else {
                    return Err(operand_count(operator, 1, operands));
                };
                self.process_expression(inner)
            }
            Operator::Unary(op) => {
                let [operand] = operands else {
                    return Err(operand_count(operator, 1, operands));
                };
                let value = self.process_expression(operand)?;
                unary(op, value)
            }
            Operator::Infix(InfixOperator::Assign) => {
                let [target, value] = operands else {
                    return Err(operand_count(operator, 2, operands));
                };
                let Expression::Identifier(name) = target else {
                    return Err(RuntimeError::InvalidAssignmentTarget);
                };
                let value = self.process_expression(value)?;
                tracing::trace!(%name, %value, "assign");
                Ok(self.environment.assign(name, value).clone())
            }
            Operator::Infix(op) => {
                let [left, right] = operands else {
                    return Err(operand_count(operator, 2, operands));
                };
                let left = self.process_expression(left)?;
                let right = self.process_expression(right)?;
                binary(op, left, right)
            }
            Operator::Print => {
                let values = self.evaluate_all(operands)?;
                let mut output = self.output.borrow_mut();
                for value in &values {
                    write!(output, "{}", value)?;
                }
                writeln!(output)?;
                Ok(Value::Nil)
            }
            Operator::Builtin(builtin) => {
                let arguments = self.evaluate_all(operands)?;
                builtin.function().call(&arguments)
            }
        }
    }

    fn evaluate_all(&mut self, expressions: &[Expression]) -> Result<Vec<Value>, RuntimeError> {
        expressions
            .iter()
            .map(|expression| self.process_expression(expression))
            .collect()
    }

    fn conditional(
        &mut self,
        condition: &Expression,
        then_block: &[Expression],
        else_block: Option<&[Expression]>,
    ) -> Result<Value, RuntimeError> {
        let condition = match self.process_expression(condition)? {
            Value::Boolean(b) => b,
            other => return Err(RuntimeError::NonBooleanCondition(other.value_type())),
        };

        let block = if condition { then_block } else { else_block.unwrap_or(&[]) };

        let mut result = Value::Nil;
        for expression in block {
            result = self.process_expression(expression)?;
        }
        Ok(result)
    }
}

fn operand_count(operator: Operator, expected: usize, operands: &[Expression]) -> RuntimeError {
    RuntimeError::OperandCount {
        operator,
        expected,
        received: operands.len(),
    }
}

fn unary(op: UnaryOperator, value: Value) -> Result<Value, RuntimeError> {
    match op {
        UnaryOperator::Negate => match value {
            Value::Number(n) => Ok(Value::Number(-n)),
            x => Err(RuntimeError::InvalidNegate(x.value_type())),
        },
        UnaryOperator::Not => match value {
            Value::Boolean(b) => Ok(Value::Boolean(!b)),
            x => Err(RuntimeError::InvalidNot(x.value_type())),
        },
    }
}

fn binary(op: InfixOperator, left: Value, right: Value) -> Result<Value, RuntimeError> {
    let (left_type, right_type) = (left.value_type(), right.value_type());
    if left_type != right_type {
        return Err(RuntimeError::MismatchedOperands {
            operator: op,
            left: left_type,
            right: right_type,
        });
    }

    match (op, left, right) {
        (InfixOperator::Plus, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (InfixOperator::Plus, Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
        (InfixOperator::Minus, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
        (InfixOperator::Multiply, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
        (InfixOperator::Divide, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
        (InfixOperator::Equal, a, b) => Ok(Value::Boolean(a == b)),
        (InfixOperator::NotEqual, a, b) => Ok(Value::Boolean(a != b)),
        (InfixOperator::LessThan, Value::Number(a), Value::Number(b)) => Ok(Value::Boolean(a < b)),
        (InfixOperator::LessThan, Value::String(a), Value::String(b)) => Ok(Value::Boolean(a < b)),
        (InfixOperator::LessThanOrEqual, Value::Number(a), Value::Number(b)) => {
            Ok(Value::Boolean(a <= b))
        }
        (InfixOperator::LessThanOrEqual, Value::String(a), Value::String(b)) => {
            Ok(Value::Boolean(a <= b))
        }
        (InfixOperator::GreaterThan, Value::Number(a), Value::Number(b)) => {
            Ok(Value::Boolean(a > b))
        }
        (InfixOperator::GreaterThan, Value::String(a), Value::String(b)) => {
            Ok(Value::Boolean(a > b))
        }
        (InfixOperator::GreaterThanOrEqual, Value::Number(a), Value::Number(b)) => {
            Ok(Value::Boolean(a >= b))
        }
        (InfixOperator::GreaterThanOrEqual, Value::String(a), Value::String(b)) => {
            Ok(Value::Boolean(a >= b))
        }
        (InfixOperator::And, Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(a && b)),
        (InfixOperator::Or, Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(a || b)),
        (op, operand, _) => Err(RuntimeError::UnsupportedOperands {
            operator: op,
            operand: operand.value_type(),
        }),
    }
}

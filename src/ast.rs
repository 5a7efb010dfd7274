use std::fmt::Display;

use crate::builtin::Builtin;

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    Identifier(String),
    Operation {
        operator: Operator,
        operands: Vec<Expression>,
    },
    Conditional {
        condition: Box<Expression>,
        then_block: Vec<Expression>,
        else_block: Option<Vec<Expression>>,
    },
}

impl Expression {
    pub fn nil() -> Self {
        Expression::Literal(Literal::Nil)
    }

    pub fn operation(operator: Operator, operands: Vec<Expression>) -> Self {
        Expression::Operation { operator, operands }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Expression::Literal(Literal::Nil))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
    Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Group,
    Unary(UnaryOperator),
    Infix(InfixOperator),
    Print,
    Builtin(Builtin),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOperator {
    Assign,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Plus,
    Minus,
    Multiply,
    Divide,
    And,
    Or,
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Literal(literal) => write!(f, "{}", literal),
            Expression::Identifier(name) => write!(f, "{}", name),
            Expression::Operation { operator, operands } => {
                write!(f, "({}", operator)?;
                for operand in operands {
                    write!(f, " {}", operand)?;
                }
                write!(f, ")")
            }
            Expression::Conditional {
                condition,
                then_block,
                else_block,
            } => {
                write!(f, "(si {} {{", condition)?;
                for expression in then_block {
                    write!(f, " {} .", expression)?;
                }
                write!(f, " }}")?;
                if let Some(else_block) = else_block {
                    write!(f, " sino {{")?;
                    for expression in else_block {
                        write!(f, " {} .", expression)?;
                    }
                    write!(f, " }}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::String(s) => write!(f, "{}", s),
            Literal::Boolean(true) => write!(f, "verdadero"),
            Literal::Boolean(false) => write!(f, "falso"),
            Literal::Nil => write!(f, "nya"),
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operator::Group => write!(f, "group"),
            Operator::Unary(op) => write!(f, "{}", op),
            Operator::Infix(op) => write!(f, "{}", op),
            Operator::Print => write!(f, "print"),
            Operator::Builtin(builtin) => write!(f, "{}", builtin.name()),
        }
    }
}

impl Display for InfixOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InfixOperator::Assign => write!(f, "="),
            InfixOperator::Equal => write!(f, "=="),
            InfixOperator::NotEqual => write!(f, "!="),
            InfixOperator::LessThan => write!(f, "<"),
            InfixOperator::LessThanOrEqual => write!(f, "<="),
            InfixOperator::GreaterThan => write!(f, ">"),
            InfixOperator::GreaterThanOrEqual => write!(f, ">="),
            InfixOperator::Plus => write!(f, "+"),
            InfixOperator::Minus => write!(f, "-"),
            InfixOperator::Multiply => write!(f, "*"),
            InfixOperator::Divide => write!(f, "/"),
            InfixOperator::And => write!(f, "y"),
            InfixOperator::Or => write!(f, "o"),
        }
    }
}

impl Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOperator::Negate => write!(f, "-"),
            UnaryOperator::Not => write!(f, "!"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_display_operation() {
        let expr = Expression::operation(
            Operator::Infix(InfixOperator::Plus),
            vec![
                Expression::Literal(Literal::Number(1.0)),
                Expression::operation(
                    Operator::Group,
                    vec![Expression::operation(
                        Operator::Unary(UnaryOperator::Negate),
                        vec![Expression::Identifier("x".to_string())],
                    )],
                ),
            ],
        );
        assert_eq!(expr.to_string(), "(+ 1 (group (- x)))");
    }

    #[test]
    fn test_display_conditional() {
        let expr = Expression::Conditional {
            condition: Box::new(Expression::Literal(Literal::Boolean(true))),
            then_block: vec![Expression::Literal(Literal::String("a".to_string()))],
            else_block: Some(vec![Expression::nil(), Expression::Literal(Literal::Number(2.5))]),
        };
        assert_eq!(expr.to_string(), "(si verdadero { a . } sino { nya . 2.5 . })");
    }
}

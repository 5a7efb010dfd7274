use crate::{
    ast::{Expression, InfixOperator, Literal, Operator, UnaryOperator},
    builtin::{Arity, Builtin},
    tokenizer::{Keyword, Token, TokenKind},
};

/// Prefix operators bind tighter than every infix operator.
const PREFIX_BINDING_POWER: u8 = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Unexpected end of line in expression.")]
    UnexpectedEndOfLine,
    #[error("Expected an expression.")]
    ExpectedExpression,
    #[error("Expected \"}}\" to close block.")]
    UnclosedBlock,
    #[error("Unexpected token \"{lexeme}\" on line {line}.")]
    Unexpected { lexeme: String, line: usize },
    #[error("Expected \"{expected}\" {context}.")]
    Expected {
        expected: &'static str,
        context: &'static str,
    },
    #[error("Function {function} expects {expected} argument(s) but received {received}.")]
    WrongArgumentCount {
        function: &'static str,
        expected: usize,
        received: usize,
    },
}

impl ParseError {
    fn unexpected(token: &Token) -> Self {
        ParseError::Unexpected {
            lexeme: token.lexeme.clone(),
            line: token.line,
        }
    }
}

/// Precedence-climbing parser over a tokenized source.
///
/// Every top-level statement produces its own result; a statement that fails
/// to parse is skipped and parsing resumes with the next one.
pub struct Parser<'a> {
    tokens: &'a [Token],
}

pub fn program(tokens: &[Token]) -> Vec<Result<Expression, ParseError>> {
    Parser::new(tokens).process()
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens }
    }

    pub fn process(mut self) -> Vec<Result<Expression, ParseError>> {
        let mut results = Vec::new();

        loop {
            self.skip_line_ends();
            if self.tokens.is_empty() {
                break;
            }

            let start = self.tokens;
            let result = self.statement(false);
            if let Err(error) = &result {
                tracing::debug!(%error, "skipping statement");
                self.tokens = consume_until_after_statement(start);
            }
            results.push(result);
        }

        tracing::debug!(
            statements = results.len(),
            errors = results.iter().filter(|r| r.is_err()).count(),
            "parsed program"
        );

        results
    }

    /// Parses one expression and requires the statement to end after it.
    fn statement(&mut self, in_block: bool) -> Result<Expression, ParseError> {
        let expression = self.process_expression(0, false, false, in_block)?;
        match self.peek() {
            None => Ok(expression),
            Some(token) => match token.kind {
                TokenKind::Eol => Ok(expression),
                TokenKind::RightBrace if in_block => Ok(expression),
                _ => Err(ParseError::unexpected(token)),
            },
        }
    }

    pub fn process_expression(
        &mut self,
        min_precedence: u8,
        parenthesized: bool,
        in_argument_list: bool,
        in_block: bool,
    ) -> Result<Expression, ParseError> {
        while let Some(TokenKind::Eol) = self.peek_kind() {
            if !parenthesized && min_precedence > 0 {
                return Err(ParseError::UnexpectedEndOfLine);
            }
            self.advance();
        }

        let Some(token) = self.peek() else {
            return Err(if in_block {
                ParseError::UnclosedBlock
            } else {
                ParseError::ExpectedExpression
            });
        };

        if token.kind == TokenKind::RightBrace {
            if in_block {
                // Blank statement before the end of a block
                return Ok(Expression::nil());
            }
            self.advance();
            return Err(ParseError::unexpected(token));
        }
        self.advance();

        let mut left = match &token.kind {
            TokenKind::Keyword(keyword) => match keyword {
                Keyword::Verdadero => Expression::Literal(Literal::Boolean(true)),
                Keyword::Falso => Expression::Literal(Literal::Boolean(false)),
                Keyword::Nya => Expression::nil(),
                Keyword::Print => Expression::operation(Operator::Print, self.arguments(parenthesized)?),
                Keyword::Builtin(builtin) => self.builtin_call(*builtin, parenthesized)?,
                Keyword::Si => return self.conditional(),
                Keyword::No => self.unary(UnaryOperator::Not, parenthesized, in_argument_list)?,
                Keyword::Sino | Keyword::Y | Keyword::O => return Err(ParseError::unexpected(token)),
            },
            TokenKind::Number | TokenKind::String => match &token.literal {
                Some(literal) => Expression::Literal(literal.clone()),
                None => return Err(ParseError::unexpected(token)),
            },
            TokenKind::Identifier => Expression::Identifier(token.lexeme.clone()),
            TokenKind::LeftParen => {
                let inner = self.process_expression(0, true, false, false)?;
                self.consume(TokenKind::RightParen, ")", "after parenthesized expression")?;
                Expression::operation(Operator::Group, vec![inner])
            }
            TokenKind::Bang => self.unary(UnaryOperator::Not, parenthesized, in_argument_list)?,
            TokenKind::Minus => self.unary(UnaryOperator::Negate, parenthesized, in_argument_list)?,
            _ => return Err(ParseError::unexpected(token)),
        };

        while let Some(token) = self.peek() {
            let operator = match &token.kind {
                TokenKind::Eol if parenthesized => {
                    self.advance();
                    continue;
                }
                TokenKind::Eol
                | TokenKind::LeftBrace
                | TokenKind::RightParen
                | TokenKind::RightBrace
                | TokenKind::Comma => break,
                kind => match infix_operator(kind) {
                    Some(operator) => operator,
                    None if in_argument_list => break,
                    None => return Err(ParseError::unexpected(token)),
                },
            };

            let (left_power, right_power) = binding_power(operator);
            if left_power < min_precedence {
                break;
            }
            self.advance();

            let right = self.process_expression(right_power, parenthesized, in_argument_list, false)?;
            left = Expression::operation(Operator::Infix(operator), vec![left, right]);
        }

        Ok(left)
    }

    fn unary(
        &mut self,
        operator: UnaryOperator,
        parenthesized: bool,
        in_argument_list: bool,
    ) -> Result<Expression, ParseError> {
        let operand = self.process_expression(PREFIX_BINDING_POWER, parenthesized, in_argument_list, false)?;
        Ok(Expression::operation(Operator::Unary(operator), vec![operand]))
    }

    fn builtin_call(&mut self, builtin: Builtin, parenthesized: bool) -> Result<Expression, ParseError> {
        let arguments = self.arguments(parenthesized)?;
        let function = builtin.function();
        if let Arity::Fixed(expected) = function.arity {
            if arguments.len() != expected {
                return Err(ParseError::WrongArgumentCount {
                    function: function.name,
                    expected,
                    received: arguments.len(),
                });
            }
        }
        Ok(Expression::operation(Operator::Builtin(builtin), arguments))
    }

    /// Either `name(a, b)` or the bare `name a b` form that runs to the end
    /// of the line. A bare list may start with a parenthesized group, as in
    /// `print (1 + 2) * 3`.
    fn arguments(&mut self, parenthesized: bool) -> Result<Vec<Expression>, ParseError> {
        let mut arguments = Vec::new();

        if self.at_call_arguments(parenthesized) {
            self.advance();
            loop {
                self.skip_line_ends();
                if let Some(TokenKind::RightParen) = self.peek_kind() {
                    self.advance();
                    break;
                }

                arguments.push(self.process_expression(0, true, true, false)?);

                match self.peek_kind() {
                    Some(TokenKind::Comma) => self.advance(),
                    Some(TokenKind::RightParen) => {
                        self.advance();
                        break;
                    }
                    _ => return Err(ParseError::Expected {
                        expected: ")",
                        context: "after arguments",
                    }),
                }
            }
        } else {
            while let Some(kind) = self.peek_kind() {
                if matches!(
                    kind,
                    TokenKind::Eol | TokenKind::LeftBrace | TokenKind::RightParen | TokenKind::RightBrace
                ) {
                    break;
                }
                arguments.push(self.process_expression(0, parenthesized, true, false)?);
                if let Some(TokenKind::Comma) = self.peek_kind() {
                    self.advance();
                }
            }
        }

        Ok(arguments)
    }

    /// A `(` opens a call argument list when it holds a top-level comma, is
    /// empty, or its matching `)` closes the enclosing expression. Inside
    /// parentheses a following `,` also closes it.
    fn at_call_arguments(&self, parenthesized: bool) -> bool {
        if self.peek_kind() != Some(&TokenKind::LeftParen) {
            return false;
        }

        let mut depth = 0usize;
        for (index, token) in self.tokens.iter().enumerate() {
            match token.kind {
                TokenKind::LeftParen | TokenKind::LeftBrace => depth += 1,
                TokenKind::RightParen | TokenKind::RightBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return index == 1
                            || match self.tokens.get(index + 1).map(|t| &t.kind) {
                                None
                                | Some(
                                    TokenKind::Eol
                                    | TokenKind::LeftBrace
                                    | TokenKind::RightParen
                                    | TokenKind::RightBrace
                                ) => true,
                                Some(TokenKind::Comma) => parenthesized,
                                Some(_) => false,
                            };
                    }
                }
                TokenKind::Comma if depth == 1 => return true,
                _ => {}
            }
        }

        // Unclosed, reported by the call form
        true
    }

    fn conditional(&mut self) -> Result<Expression, ParseError> {
        let condition = self.process_expression(0, false, false, false)?;
        self.consume(TokenKind::LeftBrace, "{", "after \"si\" condition")?;
        let then_block = self.block()?;

        let else_block = if self.match_else() {
            self.consume(TokenKind::LeftBrace, "{", "after \"sino\"")?;
            Some(self.block()?)
        } else {
            None
        };

        Ok(Expression::Conditional {
            condition: Box::new(condition),
            then_block,
            else_block,
        })
    }

    /// Parses statements up to and including the closing brace.
    ///
    /// An empty block holds a single nil expression so it always has a value.
    fn block(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut expressions = Vec::new();

        loop {
            match self.peek_kind() {
                None => return Err(ParseError::UnclosedBlock),
                Some(TokenKind::RightBrace) => {
                    self.advance();
                    break;
                }
                Some(_) => {
                    let expression = self.statement(true)?;
                    if !expression.is_nil() {
                        expressions.push(expression);
                    }
                }
            }
        }

        if expressions.is_empty() {
            expressions.push(Expression::nil());
        }

        Ok(expressions)
    }

    /// Consumes `sino`, along with the line ends before it, if it comes next.
    fn match_else(&mut self) -> bool {
        let next = self.tokens.iter().position(|t| t.kind != TokenKind::Eol);
        match next {
            Some(index) if self.tokens[index].kind == TokenKind::Keyword(Keyword::Sino) => {
                self.tokens = &self.tokens[index + 1..];
                true
            }
            _ => false,
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.first()
    }

    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.peek().map(|token| &token.kind)
    }

    fn advance(&mut self) {
        if let Some((_, rest)) = self.tokens.split_first() {
            self.tokens = rest;
        }
    }

    fn skip_line_ends(&mut self) {
        while let Some(TokenKind::Eol) = self.peek_kind() {
            self.advance();
        }
    }

    fn consume(
        &mut self,
        kind: TokenKind,
        expected: &'static str,
        context: &'static str,
    ) -> Result<&'a Token, ParseError> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                self.advance();
                Ok(token)
            }
            _ => Err(ParseError::Expected { expected, context }),
        }
    }
}

/// Skips past the line end that closes the statement starting at `tokens`,
/// stepping over line ends nested inside braces or parentheses.
fn consume_until_after_statement(tokens: &[Token]) -> &[Token] {
    let mut depth = 0i32;
    for (index, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LeftParen | TokenKind::LeftBrace => depth += 1,
            TokenKind::RightParen | TokenKind::RightBrace => depth -= 1,
            TokenKind::Eol if depth <= 0 => return &tokens[index + 1..],
            _ => {}
        }
    }
    &[]
}

fn infix_operator(kind: &TokenKind) -> Option<InfixOperator> {
    let operator = match kind {
        TokenKind::Equal => InfixOperator::Assign,
        TokenKind::EqualEqual => InfixOperator::Equal,
        TokenKind::BangEqual => InfixOperator::NotEqual,
        TokenKind::Less => InfixOperator::LessThan,
        TokenKind::LessEqual => InfixOperator::LessThanOrEqual,
        TokenKind::Greater => InfixOperator::GreaterThan,
        TokenKind::GreaterEqual => InfixOperator::GreaterThanOrEqual,
        TokenKind::Plus => InfixOperator::Plus,
        TokenKind::Minus => InfixOperator::Minus,
        TokenKind::Star => InfixOperator::Multiply,
        TokenKind::Slash => InfixOperator::Divide,
        TokenKind::Keyword(Keyword::Y) => InfixOperator::And,
        TokenKind::Keyword(Keyword::O) => InfixOperator::Or,
        _ => return None,
    };
    Some(operator)
}

/// `(left, right)` binding powers. A right power lower than the left one
/// makes the operator right-associative.
fn binding_power(operator: InfixOperator) -> (u8, u8) {
    match operator {
        InfixOperator::Assign => (2, 1),
        InfixOperator::And | InfixOperator::Or => (2, 3),
        InfixOperator::Equal
        | InfixOperator::NotEqual
        | InfixOperator::LessThan
        | InfixOperator::LessThanOrEqual
        | InfixOperator::GreaterThan
        | InfixOperator::GreaterThanOrEqual => (4, 3),
        InfixOperator::Plus | InfixOperator::Minus => (5, 6),
        InfixOperator::Multiply | InfixOperator::Divide => (7, 8),
    }
}

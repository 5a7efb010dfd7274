use std::fmt::Display;

use crate::{ast::Literal, builtin::Builtin};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Si,
    Sino,
    Verdadero,
    Falso,
    Nya,
    Y,
    O,
    No,
    Print,
    Builtin(Builtin),
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Keyword> {
        let keyword = match word {
            "si" => Keyword::Si,
            "sino" => Keyword::Sino,
            "verdadero" => Keyword::Verdadero,
            "falso" => Keyword::Falso,
            "nya" => Keyword::Nya,
            "y" => Keyword::Y,
            "o" => Keyword::O,
            "no" => Keyword::No,
            "print" => Keyword::Print,
            _ => Keyword::Builtin(Builtin::from_name(word)?),
        };
        Some(keyword)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Si => "si",
            Keyword::Sino => "sino",
            Keyword::Verdadero => "verdadero",
            Keyword::Falso => "falso",
            Keyword::Nya => "nya",
            Keyword::Y => "y",
            Keyword::O => "o",
            Keyword::No => "no",
            Keyword::Print => "print",
            Keyword::Builtin(builtin) => builtin.name(),
        }
    }

    /// Boolean and nil keywords carry their value as a literal payload.
    fn literal(&self) -> Option<Literal> {
        match self {
            Keyword::Verdadero => Some(Literal::Boolean(true)),
            Keyword::Falso => Some(Literal::Boolean(false)),
            Keyword::Nya => Some(Literal::Nil),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,

    // One or two character tokens
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals
    Identifier,
    String,
    Number,

    Keyword(Keyword),

    // End of line, statements need no terminator character
    Eol,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::LeftParen => "LEFT_PAREN",
            TokenKind::RightParen => "RIGHT_PAREN",
            TokenKind::LeftBrace => "LEFT_BRACE",
            TokenKind::RightBrace => "RIGHT_BRACE",
            TokenKind::Comma => "COMMA",
            TokenKind::Dot => "DOT",
            TokenKind::Minus => "MINUS",
            TokenKind::Plus => "PLUS",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Slash => "SLASH",
            TokenKind::Star => "STAR",
            TokenKind::Bang => "BANG",
            TokenKind::BangEqual => "BANG_EQUAL",
            TokenKind::Equal => "EQUAL",
            TokenKind::EqualEqual => "EQUAL_EQUAL",
            TokenKind::Greater => "GREATER",
            TokenKind::GreaterEqual => "GREATER_EQUAL",
            TokenKind::Less => "LESS",
            TokenKind::LessEqual => "LESS_EQUAL",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::String => "STRING",
            TokenKind::Number => "NUMBER",
            TokenKind::Keyword(keyword) => return write!(f, "{}", keyword.as_str().to_uppercase()),
            TokenKind::Eol => "EOL",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: &str, literal: Option<Literal>, line: usize) -> Self {
        Self {
            kind,
            lexeme: lexeme.to_string(),
            literal,
            line,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lexeme = match self.kind {
            TokenKind::Eol => "\\n",
            _ => self.lexeme.as_str(),
        };
        write!(f, "{} {} ", self.kind, lexeme)?;
        match &self.literal {
            Some(Literal::Number(n)) if n.fract() == 0.0 && n.is_finite() => write!(f, "{n:.1}"),
            Some(literal) => write!(f, "{literal}"),
            None => write!(f, "null"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[line {line}] Error: {message}")]
pub struct TokenizeError {
    pub line: usize,
    pub message: String,
}

impl TokenizeError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Single pass scanner over one source text.
///
/// Lexical faults are reported in place of the offending token and never stop
/// the scan. `process` consumes the tokenizer, so every source needs its own.
pub struct Tokenizer<'a> {
    source: &'a str,
    position: usize,
    line: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
            line: 0,
        }
    }

    pub fn process(mut self) -> Vec<Result<Token, TokenizeError>> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek() {
            let start = self.position;
            let line = self.line;
            self.advance();

            let lexeme = self.lexeme(start);
            let token = |kind| Some(Ok(Token::new(kind, lexeme, None, line)));
            let result = match c {
                '\n' => {
                    self.line += 1;
                    token(TokenKind::Eol)
                }
                c if c.is_whitespace() => None,
                '(' => token(TokenKind::LeftParen),
                ')' => token(TokenKind::RightParen),
                '{' => token(TokenKind::LeftBrace),
                '}' => token(TokenKind::RightBrace),
                ',' => token(TokenKind::Comma),
                '.' => token(TokenKind::Dot),
                '-' => token(TokenKind::Minus),
                '+' => token(TokenKind::Plus),
                ';' => token(TokenKind::Semicolon),
                '*' => token(TokenKind::Star),
                '/' => {
                    if self.peek() == Some('/') {
                        self.skip_comment();
                        None
                    } else {
                        token(TokenKind::Slash)
                    }
                }
                '!' => Some(Ok(self.one_or_two(start, line, TokenKind::Bang, TokenKind::BangEqual))),
                '=' => Some(Ok(self.one_or_two(start, line, TokenKind::Equal, TokenKind::EqualEqual))),
                '>' => Some(Ok(self.one_or_two(start, line, TokenKind::Greater, TokenKind::GreaterEqual))),
                '<' => Some(Ok(self.one_or_two(start, line, TokenKind::Less, TokenKind::LessEqual))),
                '"' => Some(self.string(start, line)),
                c if c.is_ascii_digit() => Some(Ok(self.number(start, line))),
                c if c.is_alphabetic() || c == '_' => Some(Ok(self.word(start, line))),
                c => Some(Err(TokenizeError::new(
                    line,
                    format!("Unexpected character: {c}"),
                ))),
            };

            if let Some(result) = result {
                tokens.push(result);
            }
        }

        tracing::debug!(
            results = tokens.len(),
            errors = tokens.iter().filter(|t| t.is_err()).count(),
            lines = self.line + 1,
            "tokenized source"
        );

        tokens
    }

    fn peek(&self) -> Option<char> {
        self.source[self.position..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        self.source[self.position..].chars().nth(1)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.position += c.len_utf8();
        }
    }

    fn lexeme(&self, start: usize) -> &'a str {
        &self.source[start..self.position]
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn one_or_two(&mut self, start: usize, line: usize, single: TokenKind, double: TokenKind) -> Token {
        let kind = if self.peek() == Some('=') {
            self.advance();
            double
        } else {
            single
        };
        Token::new(kind, self.lexeme(start), None, line)
    }

    fn string(&mut self, start: usize, line: usize) -> Result<Token, TokenizeError> {
        while let Some(c) = self.peek() {
            self.advance();
            match c {
                '"' => {
                    let value = &self.source[start + 1..self.position - 1];
                    return Ok(Token::new(
                        TokenKind::String,
                        self.lexeme(start),
                        Some(Literal::String(value.to_string())),
                        line,
                    ));
                }
                '\n' => self.line += 1,
                _ => {}
            }
        }

        Err(TokenizeError::new(line, "Unterminated string."))
    }

    fn number(&mut self, start: usize, line: usize) -> Token {
        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' | '_' => self.advance(),
                // A trailing dot is left for the next token
                '.' if !seen_dot && self.peek_next().is_some_and(|n| n.is_ascii_digit()) => {
                    seen_dot = true;
                    self.advance();
                }
                _ => break,
            }
        }

        let lexeme = self.lexeme(start);
        Token::new(
            TokenKind::Number,
            lexeme,
            Some(Literal::Number(parse_number(lexeme))),
            line,
        )
    }

    fn word(&mut self, start: usize, line: usize) -> Token {
        while let Some(c) = self.peek() {
            if !c.is_alphanumeric() && c != '_' {
                break;
            }
            self.advance();
        }

        let lexeme = self.lexeme(start);
        match Keyword::from_word(lexeme) {
            Some(keyword) => Token::new(TokenKind::Keyword(keyword), lexeme, keyword.literal(), line),
            None => Token::new(TokenKind::Identifier, lexeme, None, line),
        }
    }
}

pub fn tokens(source: &str) -> Vec<Result<Token, TokenizeError>> {
    Tokenizer::new(source).process()
}

/// Computes the value of a number lexeme from right to left.
///
/// Underscores are separators, the position of the decimal point gives the
/// power of ten the accumulated digits are scaled down by.
pub fn parse_number(lexeme: &str) -> f64 {
    let mut value = 0.0;
    let mut exponent = 0;
    let mut scale = 0;

    for c in lexeme.chars().rev() {
        match c {
            '.' => scale = exponent,
            '_' => {}
            c => {
                if let Some(digit) = c.to_digit(10) {
                    value += f64::from(digit) * 10f64.powi(exponent);
                    exponent += 1;
                }
            }
        }
    }

    value / 10f64.powi(scale)
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokens(source)
            .into_iter()
            .map(|t| t.expect("source should tokenize").kind)
            .collect()
    }

    #[test]
    fn test_tokens() {
        let expected = vec![
            TokenKind::Identifier,
            TokenKind::Equal,
            TokenKind::Number,
            TokenKind::Plus,
            TokenKind::Number,
        ];
        assert_eq!(kinds("x = 1 + 2"), expected);
    }

    #[test]
    fn test_newline_emits_eol_and_counts_lines() {
        let tokens: Vec<_> = tokens("a\nb\n").into_iter().map(Result::unwrap).collect();
        let lines: Vec<_> = tokens.iter().map(|t| (t.kind.clone(), t.line)).collect();
        assert_eq!(
            lines,
            vec![
                (TokenKind::Identifier, 0),
                (TokenKind::Eol, 0),
                (TokenKind::Identifier, 1),
                (TokenKind::Eol, 1),
            ]
        );
    }

    #[test]
    fn test_comment_runs_to_end_of_line() {
        assert_eq!(
            kinds("1 // comment = 2\n3"),
            vec![TokenKind::Number, TokenKind::Eol, TokenKind::Number]
        );
    }

    #[test]
    fn test_whitespace_and_comments_only() {
        let kinds = kinds("  \t// nothing\n\n   // more\n");
        assert!(kinds.iter().all(|k| *k == TokenKind::Eol));
    }

    #[test]
    fn test_two_character_operators() {
        assert_eq!(
            kinds("== != >= <= = ! > < /"),
            vec![
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::GreaterEqual,
                TokenKind::LessEqual,
                TokenKind::Equal,
                TokenKind::Bang,
                TokenKind::Greater,
                TokenKind::Less,
                TokenKind::Slash,
            ]
        );
    }

    #[test]
    fn test_number_with_separators() {
        let token = tokens("1_000.50").remove(0).unwrap();
        assert_eq!(token.lexeme, "1_000.50");
        assert_eq!(token.literal, Some(Literal::Number(1000.5)));
    }

    #[test]
    fn test_trailing_decimal_point_is_not_part_of_number() {
        let tokens: Vec<_> = tokens("12.").into_iter().map(Result::unwrap).collect();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].lexeme, "12");
        assert_eq!(tokens[0].literal, Some(Literal::Number(12.0)));
        assert_eq!(tokens[1].kind, TokenKind::Dot);
        assert_eq!(tokens[0].to_string(), "NUMBER 12 12.0");
        assert_eq!(tokens[1].to_string(), "DOT . null");
    }

    #[test]
    fn test_second_decimal_point_ends_number() {
        let tokens: Vec<_> = tokens("12.5.3").into_iter().map(Result::unwrap).collect();
        let literals: Vec<_> = tokens.iter().map(|t| t.literal.clone()).collect();
        assert_eq!(
            literals,
            vec![
                Some(Literal::Number(12.5)),
                None,
                Some(Literal::Number(3.0)),
            ]
        );
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let tokens: Vec<_> = tokens("si sino verdadero nya maximo _x print")
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Si));
        assert_eq!(tokens[1].kind, TokenKind::Keyword(Keyword::Sino));
        assert_eq!(tokens[2].literal, Some(Literal::Boolean(true)));
        assert_eq!(tokens[3].literal, Some(Literal::Nil));
        assert_eq!(tokens[4].kind, TokenKind::Keyword(Keyword::Builtin(Builtin::Maximum)));
        assert_eq!(tokens[5].kind, TokenKind::Identifier);
        assert_eq!(tokens[6].kind, TokenKind::Keyword(Keyword::Print));
    }

    #[test]
    fn test_identifiers_accept_unicode_letters() {
        let tokens: Vec<_> = tokens("año = ÉXITO2")
            .into_iter()
            .map(Result::unwrap)
            .collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].lexeme, "año");
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
        assert_eq!(tokens[2].lexeme, "ÉXITO2");
    }

    #[test]
    fn test_string() {
        let token = tokens("\"hello world\"").remove(0).unwrap();
        assert_eq!(token.kind, TokenKind::String);
        assert_eq!(token.literal, Some(Literal::String("hello world".to_string())));
        assert_eq!(token.to_string(), "STRING \"hello world\" hello world");
    }

    #[test]
    fn test_unterminated_string() {
        let results = tokens("x = \"abc");
        assert_eq!(results.len(), 3);
        assert_eq!(
            results[2],
            Err(TokenizeError::new(0, "Unterminated string."))
        );
        assert_eq!(
            results[2].as_ref().unwrap_err().to_string(),
            "[line 0] Error: Unterminated string."
        );
    }

    #[test]
    fn test_unexpected_character_does_not_stop_scan() {
        let results = tokens("1 @\n# 2");
        let errors: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].to_string(), "[line 0] Error: Unexpected character: @");
        assert_eq!(errors[1].line, 1);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 3);
    }

    #[test]
    fn test_token_display() {
        let rendered: Vec<_> = tokens("(x >= 3)\nfalso")
            .into_iter()
            .map(|t| t.unwrap().to_string())
            .collect();
        assert_eq!(
            rendered,
            vec![
                "LEFT_PAREN ( null",
                "IDENTIFIER x null",
                "GREATER_EQUAL >= null",
                "NUMBER 3 3.0",
                "RIGHT_PAREN ) null",
                "EOL \\n null",
                "FALSO falso falso",
            ]
        );
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("0"), 0.0);
        assert_eq!(parse_number("42"), 42.0);
        assert_eq!(parse_number("3.25"), 3.25);
        assert_eq!(parse_number("1_000_000"), 1_000_000.0);
        assert_eq!(parse_number("0.5"), 0.5);
    }
}

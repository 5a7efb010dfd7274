use std::{cell::RefCell, io::Write, rc::Rc};

use crate::{
    evaluator::{Evaluator, RuntimeError},
    parser::{self, ParseError},
    tokenizer::{self, TokenizeError},
};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("{} lexical error(s)", .0.len())]
    Lexical(Vec<TokenizeError>),
    #[error("{} syntax error(s)", .0.len())]
    Syntax(Vec<ParseError>),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunError {
    /// Process exit status for this failure, following the sysexits values.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Lexical(_) | RunError::Syntax(_) => 65,
            RunError::Runtime(RuntimeError::IO(_)) | RunError::Io(_) => 74,
            RunError::Runtime(_) => 70,
        }
    }
}

/// Sends source through tokenizing, parsing and evaluation.
///
/// One evaluator lives as long as the runner, so variables assigned by one
/// `run` are visible to the next.
pub struct Runner {
    evaluator: Evaluator,
    output: Rc<RefCell<dyn Write>>,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(Rc::new(RefCell::new(std::io::stdout())))
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("evaluator", &self.evaluator)
            .finish()
    }
}

impl Runner {
    pub fn new(output: Rc<RefCell<dyn Write>>) -> Self {
        Self {
            evaluator: Evaluator::new(output.clone()),
            output,
        }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn run(&mut self, source: &str) -> Result<(), RunError> {
        let (tokens, errors): (Vec<_>, Vec<_>) = tokenizer::tokens(source)
            .into_iter()
            .partition(|result| result.is_ok());
        let errors: Vec<TokenizeError> = errors.into_iter().filter_map(Result::err).collect();
        if !errors.is_empty() {
            let mut output = self.output.borrow_mut();
            for error in &errors {
                writeln!(output, "{error}")?;
            }
            return Err(RunError::Lexical(errors));
        }
        let tokens: Vec<_> = tokens.into_iter().filter_map(Result::ok).collect();

        let (expressions, errors): (Vec<_>, Vec<_>) = parser::program(&tokens)
            .into_iter()
            .partition(|result| result.is_ok());
        let errors: Vec<ParseError> = errors.into_iter().filter_map(Result::err).collect();
        if !errors.is_empty() {
            let mut output = self.output.borrow_mut();
            for error in &errors {
                writeln!(output, "{error}")?;
            }
            return Err(RunError::Syntax(errors));
        }
        let expressions: Vec<_> = expressions.into_iter().filter_map(Result::ok).collect();

        tracing::debug!(
            tokens = tokens.len(),
            statements = expressions.len(),
            "running program"
        );
        self.evaluator.process(&expressions)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Value;

    fn runner() -> (Runner, Rc<RefCell<Vec<u8>>>) {
        let output = Rc::new(RefCell::new(Vec::new()));
        (Runner::new(output.clone()), output)
    }

    fn take(output: &Rc<RefCell<Vec<u8>>>) -> String {
        String::from_utf8(output.take()).expect("output should be UTF-8")
    }

    #[test]
    fn test_runs_program() {
        let (mut runner, output) = runner();
        runner.run("x = 3\nprint(x)").expect("program should run");
        assert_eq!(take(&output), "3\n");
    }

    #[test]
    fn test_lexical_errors_are_all_reported() {
        let (mut runner, output) = runner();
        let error = runner.run("print(1)\n@\n\"abc").unwrap_err();
        assert!(matches!(&error, RunError::Lexical(errors) if errors.len() == 2));
        assert_eq!(error.exit_code(), 65);
        assert_eq!(
            take(&output),
            "[line 1] Error: Unexpected character: @\n[line 2] Error: Unterminated string.\n"
        );
    }

    #[test]
    fn test_syntax_errors_stop_evaluation() {
        let (mut runner, output) = runner();
        let error = runner.run("print(1)\n1 2").unwrap_err();
        assert!(matches!(error, RunError::Syntax(_)));
        assert_eq!(error.exit_code(), 65);
        assert_eq!(take(&output), "Unexpected token \"2\" on line 1.\n");
    }

    #[test]
    fn test_runtime_error_keeps_earlier_output() {
        let (mut runner, output) = runner();
        let error = runner.run("print(\"a\")\nprint(y)\nprint(\"b\")").unwrap_err();
        assert_eq!(error.exit_code(), 70);
        assert_eq!(
            take(&output),
            "a\nFATAL ERROR: Variable y is not defined.\n"
        );
    }

    #[test]
    fn test_environment_persists_between_runs() {
        let (mut runner, output) = runner();
        runner.run("x = 2").expect("assignment should run");
        runner.run("x = x * 5").expect("reassignment should run");
        runner.run("print(x)").expect("print should run");
        assert_eq!(take(&output), "10\n");
        assert_eq!(
            runner.evaluator().environment().get("x"),
            Some(&Value::Number(10.0))
        );
    }
}

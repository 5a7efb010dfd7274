use std::fmt::Display;

use crate::{
    evaluator::RuntimeError,
    value::{Value, ValueType},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Reverse,
    Power,
    Absolute,
    Maximum,
    Minimum,
    Ceiling,
    Floor,
    Average,
    Sum,
    Palindrome,
    Anagram,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Builtin> {
        BUILTINS
            .iter()
            .find(|function| function.name == name)
            .map(|function| function.builtin)
    }

    pub fn function(self) -> &'static BuiltinFunction {
        // BUILTINS is laid out in declaration order
        &BUILTINS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.function().name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    Variadic { min: usize },
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Fixed(n) => count == n,
            Arity::Variadic { min } => count >= min,
        }
    }
}

impl Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Fixed(1) => write!(f, "1 argument"),
            Arity::Fixed(n) => write!(f, "{n} arguments"),
            Arity::Variadic { min } => write!(f, "at least {min} arguments"),
        }
    }
}

/// The pure part of a built-in, applied to already validated payloads.
#[derive(Clone, Copy)]
pub enum Computation {
    NumberOrString {
        number: fn(f64) -> f64,
        string: fn(&str) -> String,
    },
    Unary(fn(f64) -> f64),
    Binary(fn(f64, f64) -> f64),
    Fold(fn(&[f64]) -> f64),
    Predicate(fn(&str) -> bool),
    Relation(fn(&str, &str) -> bool),
}

pub struct BuiltinFunction {
    pub builtin: Builtin,
    pub name: &'static str,
    pub arity: Arity,
    pub accepts: &'static [ValueType],
    pub computation: Computation,
}

const NUMBER: &[ValueType] = &[ValueType::Number];
const STRING: &[ValueType] = &[ValueType::String];
const NUMBER_OR_STRING: &[ValueType] = &[ValueType::Number, ValueType::String];

pub static BUILTINS: [BuiltinFunction; 11] = [
    BuiltinFunction {
        builtin: Builtin::Reverse,
        name: "reversa",
        arity: Arity::Fixed(1),
        accepts: NUMBER_OR_STRING,
        computation: Computation::NumberOrString {
            number: reverse_number,
            string: reverse_string,
        },
    },
    BuiltinFunction {
        builtin: Builtin::Power,
        name: "potencia",
        arity: Arity::Fixed(2),
        accepts: NUMBER,
        computation: Computation::Binary(f64::powf),
    },
    BuiltinFunction {
        builtin: Builtin::Absolute,
        name: "absoluto",
        arity: Arity::Fixed(1),
        accepts: NUMBER,
        computation: Computation::Unary(f64::abs),
    },
    BuiltinFunction {
        builtin: Builtin::Maximum,
        name: "maximo",
        arity: Arity::Variadic { min: 2 },
        accepts: NUMBER,
        computation: Computation::Fold(maximum),
    },
    BuiltinFunction {
        builtin: Builtin::Minimum,
        name: "minimo",
        arity: Arity::Variadic { min: 2 },
        accepts: NUMBER,
        computation: Computation::Fold(minimum),
    },
    BuiltinFunction {
        builtin: Builtin::Ceiling,
        name: "cima",
        arity: Arity::Fixed(1),
        accepts: NUMBER,
        computation: Computation::Unary(f64::ceil),
    },
    BuiltinFunction {
        builtin: Builtin::Floor,
        name: "suelo",
        arity: Arity::Fixed(1),
        accepts: NUMBER,
        computation: Computation::Unary(f64::floor),
    },
    BuiltinFunction {
        builtin: Builtin::Average,
        name: "media",
        arity: Arity::Variadic { min: 2 },
        accepts: NUMBER,
        computation: Computation::Fold(average),
    },
    BuiltinFunction {
        builtin: Builtin::Sum,
        name: "suma",
        arity: Arity::Variadic { min: 2 },
        accepts: NUMBER,
        computation: Computation::Fold(sum),
    },
    BuiltinFunction {
        builtin: Builtin::Palindrome,
        name: "palindromo",
        arity: Arity::Fixed(1),
        accepts: STRING,
        computation: Computation::Predicate(is_palindrome),
    },
    BuiltinFunction {
        builtin: Builtin::Anagram,
        name: "anagrama",
        arity: Arity::Fixed(2),
        accepts: STRING,
        computation: Computation::Relation(is_anagram),
    },
];

impl BuiltinFunction {
    /// Validates the evaluated arguments and applies the computation.
    ///
    /// Nil is never a valid argument. Every other argument must be one of the
    /// accepted types, and the count must satisfy the arity.
    pub fn call(&self, arguments: &[Value]) -> Result<Value, RuntimeError> {
        for (index, argument) in arguments.iter().enumerate() {
            let found = argument.value_type();
            if found == ValueType::Nil {
                return Err(RuntimeError::NilArgument {
                    function: self.name,
                    position: index + 1,
                });
            }
            if !self.accepts.contains(&found) {
                return Err(self.type_error(index, found));
            }
        }

        if !self.arity.accepts(arguments.len()) {
            return Err(self.arity_error(arguments.len()));
        }

        let value = match self.computation {
            Computation::NumberOrString { number, string } => match arguments {
                [Value::Number(n)] => Value::Number(number(*n)),
                [Value::String(s)] => Value::String(string(s)),
                _ => return Err(self.arity_error(arguments.len())),
            },
            Computation::Unary(f) => match self.numbers(arguments)?.as_slice() {
                [n] => Value::Number(f(*n)),
                _ => return Err(self.arity_error(arguments.len())),
            },
            Computation::Binary(f) => match self.numbers(arguments)?.as_slice() {
                [a, b] => Value::Number(f(*a, *b)),
                _ => return Err(self.arity_error(arguments.len())),
            },
            Computation::Fold(f) => Value::Number(f(&self.numbers(arguments)?)),
            Computation::Predicate(f) => match self.strings(arguments)?.as_slice() {
                [s] => Value::Boolean(f(s)),
                _ => return Err(self.arity_error(arguments.len())),
            },
            Computation::Relation(f) => match self.strings(arguments)?.as_slice() {
                [a, b] => Value::Boolean(f(a, b)),
                _ => return Err(self.arity_error(arguments.len())),
            },
        };

        Ok(value)
    }

    fn numbers(&self, arguments: &[Value]) -> Result<Vec<f64>, RuntimeError> {
        arguments
            .iter()
            .enumerate()
            .map(|(index, argument)| match argument {
                Value::Number(n) => Ok(*n),
                other => Err(self.type_error(index, other.value_type())),
            })
            .collect()
    }

    fn strings<'v>(&self, arguments: &'v [Value]) -> Result<Vec<&'v str>, RuntimeError> {
        arguments
            .iter()
            .enumerate()
            .map(|(index, argument)| match argument {
                Value::String(s) => Ok(s.as_str()),
                other => Err(self.type_error(index, other.value_type())),
            })
            .collect()
    }

    fn type_error(&self, index: usize, found: ValueType) -> RuntimeError {
        let expected = self
            .accepts
            .iter()
            .map(ValueType::to_string)
            .collect::<Vec<_>>()
            .join(" or ");
        RuntimeError::InvalidArgumentType {
            function: self.name,
            position: index + 1,
            expected,
            found,
        }
    }

    fn arity_error(&self, received: usize) -> RuntimeError {
        RuntimeError::WrongArgumentCount {
            function: self.name,
            expected: self.arity,
            received,
        }
    }
}

fn reverse_number(n: f64) -> f64 {
    let digits: String = n.abs().to_string().chars().rev().collect();
    digits.parse::<f64>().unwrap_or(f64::NAN).copysign(n)
}

fn reverse_string(s: &str) -> String {
    s.chars().rev().collect()
}

fn maximum(numbers: &[f64]) -> f64 {
    numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn minimum(numbers: &[f64]) -> f64 {
    numbers.iter().copied().fold(f64::INFINITY, f64::min)
}

fn sum(numbers: &[f64]) -> f64 {
    numbers.iter().sum()
}

fn average(numbers: &[f64]) -> f64 {
    sum(numbers) / numbers.len() as f64
}

/// Lowercases per character so that reversing before or after folding agrees.
fn folded(s: &str) -> Vec<String> {
    s.chars().map(|c| c.to_lowercase().collect()).collect()
}

fn is_palindrome(s: &str) -> bool {
    let folded = folded(s);
    folded.iter().eq(folded.iter().rev())
}

fn is_anagram(a: &str, b: &str) -> bool {
    let mut a = folded(a);
    let mut b = folded(b);
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

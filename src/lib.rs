pub mod ast;
pub mod builtin;
pub mod evaluator;
pub mod parser;
pub mod runner;
pub mod tokenizer;
pub mod value;

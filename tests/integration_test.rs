use std::{cell::RefCell, rc::Rc};

use nya::{
    runner::{RunError, Runner},
    value::Value,
};
use rstest::rstest;

fn run(source: &str) -> (Result<(), RunError>, String) {
    let output = Rc::new(RefCell::new(Vec::new()));
    let mut runner = Runner::new(output.clone());
    let result = runner.run(source);
    let output = String::from_utf8(output.take()).expect("Output should be valid UTF-8");
    (result, output)
}

fn test_valid_program(source: &str, expected_output: &str) {
    let (result, output) = run(source);
    result.expect("Run should work on valid program");
    assert_eq!(output, expected_output);
}

fn render(source: &str) -> Vec<String> {
    let tokens: Vec<_> = nya::tokenizer::tokens(source)
        .into_iter()
        .collect::<Result<_, _>>()
        .expect("Tokenize should work on valid program");
    nya::parser::program(&tokens)
        .into_iter()
        .map(|result| result.expect("Parse should work on valid program").to_string())
        .collect()
}

#[test]
fn test_expression_statement_prints_nothing() {
    assert_eq!(render("1 + 2"), vec!["(+ 1 2)"]);
    test_valid_program("1 + 2", "");
}

#[rstest]
#[case::assignment("x = 3\nprint(x)", "3\n")]
#[case::conditional("si (1 < 2) { print(\"yes\") } sino { print(\"no\") }", "yes\n")]
#[case::else_branch("si 2 <= 1 {\n print(\"yes\")\n}\nsino {\n print(\"no\")\n}", "no\n")]
#[case::builtin_call("print(maximo(3, 7, 2))", "7\n")]
#[case::builtin_bare("print minimo 4, 1, 9", "1\n")]
#[case::arithmetic("print((1 + 2) * 3 - 10 / 4)", "6.5\n")]
#[case::bare_leading_group("print (1 + 2) * 3\nprint maximo (1) 2", "9\n2\n")]
#[case::unicode_identifier("año = 2026\nprint(año)", "2026\n")]
#[case::concatenation("saludo = \"ho\" + \"la\"\nprint(saludo)", "hola\n")]
#[case::logic("print(verdadero y no falso, 1 == 2 o falso)", "verdaderofalso\n")]
#[case::nil("print(nya)\nprint(nya == nya)", "nya\nverdadero\n")]
#[case::reversal("print(reversa(\"gato\"), reversa(120))", "otag21\n")]
#[case::palindrome("print(palindromo(\"Reconocer\"))", "verdadero\n")]
#[case::anagram("print(anagrama(\"Amor\", \"Roma\"))", "verdadero\n")]
#[case::numeric("print(potencia(2, 10), absoluto(-3), cima(1.2), suelo(1.8))", "1024321\n")]
#[case::aggregates("print(suma(1, 2, 3), media(2, 4))", "63\n")]
#[case::number_separators("print(1_000.5 + 0.5)", "1001\n")]
#[case::comments("x = 1 // uno\n// nada\nprint(x)", "1\n")]
#[case::chained_assignment("a = b = 4\nprint(a + b)", "8\n")]
#[case::nested_conditional(
    "n = 5\nsi n > 3 {\n si n > 4 { print(\"grande\") }\n}",
    "grande\n"
)]
fn test_programs(#[case] source: &str, #[case] expected_output: &str) {
    test_valid_program(source, expected_output);
}

#[rstest]
#[case::type_mismatch(
    "print(1 + \"a\")",
    "FATAL ERROR: Operand types do not match for + operation: Number and String.\n",
    70
)]
#[case::undefined("print(\"antes\")\nprint(x)", "antes\nFATAL ERROR: Variable x is not defined.\n", 70)]
#[case::nil_argument("maximo(1, nya)", "FATAL ERROR: Argument 2 of maximo must not be nya.\n", 70)]
#[case::unterminated_string("\"abc", "[line 0] Error: Unterminated string.\n", 65)]
#[case::arity(
    "anagrama(\"a\")",
    "Function anagrama expects 2 argument(s) but received 1.\n",
    65
)]
#[case::stray_token("x = 1 1", "Unexpected token \"1\" on line 0.\n", 65)]
fn test_failing_programs(#[case] source: &str, #[case] expected_output: &str, #[case] exit_code: u8) {
    let (result, output) = run(source);
    let error = result.expect_err("Program should fail");
    assert_eq!(error.exit_code(), exit_code);
    assert_eq!(output, expected_output);
}

#[test]
fn test_unterminated_string_yields_no_token() {
    let results = nya::tokenizer::tokens("\"abc");
    assert!(results.iter().all(|result| result.is_err()));
    assert_eq!(
        results[0].as_ref().unwrap_err().to_string(),
        "[line 0] Error: Unterminated string."
    );
}

#[test]
fn test_runtime_error_keeps_assignments() {
    let output = Rc::new(RefCell::new(Vec::new()));
    let mut runner = Runner::new(output.clone());
    runner
        .run("x = 1\ny = x + verdadero\nz = 3")
        .expect_err("Mismatched addition should fail");

    let environment = runner.evaluator().environment();
    assert_eq!(environment.get("x"), Some(&Value::Number(1.0)));
    assert_eq!(environment.get("y"), None);
    assert_eq!(environment.get("z"), None);
}

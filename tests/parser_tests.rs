// tests/parser_tests.rs

use sexp_lang::ast::Expr;
use sexp_lang::lexer::Lexer;
use sexp_lang::parser::{parse_str, Parser};
use sexp_lang::printer::{to_text, to_text_pretty};

fn parse_program(text: &str) -> Vec<Expr> {
    Parser::new(Lexer::new(text)).unwrap().parse_program().unwrap()
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_parse_integer_literal() {
    assert_eq!(parse_str("42").unwrap(), Expr::Integer(42));
    assert_eq!(parse_str("-7").unwrap(), Expr::Integer(-7));
}

#[test]
fn test_parse_float_literal() {
    assert_eq!(parse_str("3.5").unwrap(), Expr::Float(3.5));
}

#[test]
fn test_parse_string_literal() {
    assert_eq!(
        parse_str("\"Alpha 1\"").unwrap(),
        Expr::String("Alpha 1".to_string())
    );
}

#[test]
fn test_parse_boolean_literals() {
    assert_eq!(parse_str("true").unwrap(), Expr::Boolean(true));
    assert_eq!(parse_str("false").unwrap(), Expr::Boolean(false));
}

#[test]
fn test_parse_variable_reference() {
    assert_eq!(parse_str("@kills").unwrap(), Expr::variable("kills"));
}

// ============================================================================
// Operator Calls
// ============================================================================

#[test]
fn test_parse_simple_call() {
    assert_eq!(
        parse_str("(+ 1 2)").unwrap(),
        Expr::call("+", vec![Expr::Integer(1), Expr::Integer(2)])
    );
}

#[test]
fn test_parse_zero_argument_call() {
    assert_eq!(parse_str("(true)").unwrap(), Expr::call("true", vec![]));
}

#[test]
fn test_parse_nested_calls() {
    assert_eq!(
        parse_str("(and (> @kills 5) (not (is-variable-defined \"done\")))").unwrap(),
        Expr::call(
            "and",
            vec![
                Expr::call(">", vec![Expr::variable("kills"), Expr::Integer(5)]),
                Expr::call(
                    "not",
                    vec![Expr::call(
                        "is-variable-defined",
                        vec![Expr::String("done".to_string())]
                    )]
                ),
            ]
        )
    );
}

#[test]
fn test_parse_mixed_argument_types() {
    assert_eq!(
        parse_str("(string-concat \"wave \" 3 true)").unwrap(),
        Expr::call(
            "string-concat",
            vec![
                Expr::String("wave ".to_string()),
                Expr::Integer(3),
                Expr::Boolean(true)
            ]
        )
    );
}

#[test]
fn test_call_positions_are_recorded() {
    let expr = parse_str("\n  (+ 1 2)").unwrap();
    match expr {
        Expr::OperatorCall { line, column, .. } => {
            assert_eq!((line, column), (2, 3));
        }
        other => panic!("expected an operator call, got {:?}", other),
    }
}

// ============================================================================
// Multiple Top-Level Forms
// ============================================================================

#[test]
fn test_parse_program_multiple_forms() {
    let forms = parse_program("(+ 1 2) (not (true)) 42");
    assert_eq!(forms.len(), 3);
    assert_eq!(forms[2], Expr::Integer(42));
}

#[test]
fn test_parse_program_empty_input() {
    assert!(parse_program("").is_empty());
    assert!(parse_program("; just a comment").is_empty());
}

#[test]
fn test_parse_rejects_trailing_input() {
    let result = parse_str("(+ 1 2) leftover");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("trailing"));
}

// ============================================================================
// Error Cases
// ============================================================================

#[test]
fn test_unmatched_opening_paren() {
    let result = parse_str("(and (true) (= 1");
    assert!(result.is_err());
    let message = result.unwrap_err().to_string().to_lowercase();
    assert!(message.contains("parenthes"), "message was: {}", message);
    assert!(message.contains("opening"));
}

#[test]
fn test_unmatched_closing_paren() {
    let result = parse_str(")");
    assert!(result.is_err());
    let message = result.unwrap_err().to_string().to_lowercase();
    assert!(message.contains("parenthes"));
    assert!(message.contains("closing"));
}

#[test]
fn test_empty_call_is_an_error() {
    let result = parse_str("()");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("operator name"));
}

#[test]
fn test_bare_atom_is_an_error() {
    let result = parse_str("and");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Bare atom"));
}

#[test]
fn test_literal_in_head_position_is_an_error() {
    let result = parse_str("(42 1 2)");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("operator name"));
}

#[test]
fn test_error_carries_position() {
    let err = parse_str("(+ 1\n  ]").unwrap_err();
    assert_eq!(err.line, 2);
    assert_eq!(err.column, 3);
}

// ============================================================================
// Round-Trip Law
// ============================================================================

#[test]
fn test_round_trip_simple() {
    let original = parse_str("(+ 1 2)").unwrap();
    let reparsed = parse_str(&to_text(&original)).unwrap();
    assert_eq!(original, reparsed);
}

#[test]
fn test_round_trip_survives_odd_whitespace() {
    let original = parse_str("( and\n\t(>=\n@hull   25)  ( true )\n)").unwrap();
    let printed = to_text(&original);
    assert_eq!(printed, "(and (>= @hull 25) (true))");
    assert_eq!(parse_str(&printed).unwrap(), original);
}

#[test]
fn test_round_trip_floats_stay_floats() {
    let original = parse_str("(+ 2.0 0.5)").unwrap();
    let reparsed = parse_str(&to_text(&original)).unwrap();
    assert_eq!(original, reparsed);
    assert!(matches!(
        &reparsed,
        Expr::OperatorCall { args, .. } if args[0] == Expr::Float(2.0)
    ));
}

#[test]
fn test_round_trip_string_escapes() {
    let original = parse_str(r#"(string-contains "line\nbreak \"quoted\"" "\\")"#).unwrap();
    let reparsed = parse_str(&to_text(&original)).unwrap();
    assert_eq!(original, reparsed);
}

#[test]
fn test_round_trip_pretty_printer() {
    let original = parse_str(
        "(and (> @player-kills 5) (is-variable-defined \"bonus_unlocked\") (or (true) (false)))",
    )
    .unwrap();
    let reparsed = parse_str(&to_text_pretty(&original)).unwrap();
    assert_eq!(original, reparsed);
}

#[test]
fn test_round_trip_many_forms() {
    let cases = [
        "42",
        "-3.5",
        "true",
        "@wing-status",
        "(true)",
        "(mod 7 3)",
        "(modify-variable @kills (+ @kills 1))",
        "(string-matches @callsign \"^Alpha\")",
    ];
    for case in cases {
        let original = parse_str(case).unwrap();
        let reparsed = parse_str(&to_text(&original)).unwrap();
        assert_eq!(original, reparsed, "round trip failed for: {}", case);
    }
}

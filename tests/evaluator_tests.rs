// tests/evaluator_tests.rs

use sexp_lang::builtins::standard_registry;
use sexp_lang::evaluator::{EvalError, Evaluator};
use sexp_lang::parser::parse_str;
use sexp_lang::registry::{FunctionDescriptor, FunctionRegistry};
use sexp_lang::value::{Value, ValueType};
use sexp_lang::variables::{Scope, VariableStore};

fn eval(expr_str: &str) -> Result<Value, EvalError> {
    let registry = standard_registry();
    let mut store = VariableStore::new();
    eval_with(&registry, &mut store, expr_str)
}

fn eval_with(
    registry: &FunctionRegistry,
    store: &mut VariableStore,
    expr_str: &str,
) -> Result<Value, EvalError> {
    let expr = parse_str(expr_str).unwrap_or_else(|e| panic!("parse failed: {}", e));
    Evaluator::new(registry).evaluate(&expr, store)
}

// ============================================================================
// Literals and Variables
// ============================================================================

#[test]
fn test_literals_evaluate_to_themselves() {
    assert_eq!(eval("42").unwrap(), Value::Integer(42));
    assert_eq!(eval("3.5").unwrap(), Value::Float(3.5));
    assert_eq!(eval("\"Alpha\"").unwrap(), Value::String("Alpha".to_string()));
    assert_eq!(eval("true").unwrap(), Value::Boolean(true));
}

#[test]
fn test_variable_resolution() {
    let registry = standard_registry();
    let mut store = VariableStore::new();
    store.set(Scope::Campaign, "kills", Value::Integer(7)).unwrap();

    assert_eq!(
        eval_with(&registry, &mut store, "@kills").unwrap(),
        Value::Integer(7)
    );
}

#[test]
fn test_undefined_variable_error() {
    let result = eval("@never_set");
    assert!(matches!(
        result,
        Err(EvalError::UndefinedVariable { ref name, .. }) if name == "never_set"
    ));
}

#[test]
fn test_variable_resolution_prefers_local_scope() {
    let registry = standard_registry();
    let mut store = VariableStore::new();
    store.set(Scope::Global, "difficulty", Value::Integer(3)).unwrap();
    store.set(Scope::Campaign, "difficulty", Value::Integer(2)).unwrap();
    store.set(Scope::Local, "difficulty", Value::Integer(1)).unwrap();

    assert_eq!(
        eval_with(&registry, &mut store, "@difficulty").unwrap(),
        Value::Integer(1)
    );
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_addition() {
    assert_eq!(eval("(+ 1 1)").unwrap(), Value::Integer(2));
    assert_eq!(eval("(+ 1 2 3 4)").unwrap(), Value::Integer(10));
}

#[test]
fn test_mixed_arithmetic_preserves_integers_when_whole() {
    assert_eq!(eval("(+ 1.5 0.5)").unwrap(), Value::Float(2.0));
    assert_eq!(eval("(+ 1 0.5)").unwrap(), Value::Float(1.5));
    assert_eq!(eval("(* 2 1.5)").unwrap(), Value::Integer(3));
}

#[test]
fn test_subtraction_and_negation() {
    assert_eq!(eval("(- 10 3 2)").unwrap(), Value::Integer(5));
    assert_eq!(eval("(- 4)").unwrap(), Value::Integer(-4));
}

#[test]
fn test_division() {
    assert_eq!(eval("(/ 6 3)").unwrap(), Value::Integer(2));
    assert_eq!(eval("(/ 7 2)").unwrap(), Value::Float(3.5));
}

#[test]
fn test_division_by_zero() {
    assert!(matches!(eval("(/ 1 0)"), Err(EvalError::DivisionByZero { .. })));
    assert!(matches!(eval("(mod 5 0)"), Err(EvalError::DivisionByZero { .. })));
}

#[test]
fn test_mod_abs_min_max() {
    assert_eq!(eval("(mod 7 3)").unwrap(), Value::Integer(1));
    assert_eq!(eval("(abs -9)").unwrap(), Value::Integer(9));
    assert_eq!(eval("(min 4 2 8)").unwrap(), Value::Integer(2));
    assert_eq!(eval("(max 4 2 8)").unwrap(), Value::Integer(8));
}

// ============================================================================
// Comparison
// ============================================================================

#[test]
fn test_numeric_equality_spans_integer_and_float() {
    assert_eq!(eval("(= 2 2.0)").unwrap(), Value::Boolean(true));
    assert_eq!(eval("(= 2 3)").unwrap(), Value::Boolean(false));
    assert_eq!(eval("(!= 2 3)").unwrap(), Value::Boolean(true));
}

#[test]
fn test_string_equality_is_strict() {
    assert_eq!(eval("(= \"a\" \"a\")").unwrap(), Value::Boolean(true));
    assert_eq!(eval("(= \"1\" 1)").unwrap(), Value::Boolean(false));
}

#[test]
fn test_ordered_comparisons_chain() {
    assert_eq!(eval("(< 1 2 3)").unwrap(), Value::Boolean(true));
    assert_eq!(eval("(< 1 3 2)").unwrap(), Value::Boolean(false));
    assert_eq!(eval("(>= 3 3 2)").unwrap(), Value::Boolean(true));
}

// ============================================================================
// Logic and Short-Circuiting
// ============================================================================

/// Registry whose `side-effect` operator records its firing in the store.
fn registry_with_side_effect() -> FunctionRegistry {
    let mut registry = standard_registry();
    registry
        .register(FunctionDescriptor::new(
            "side-effect",
            0,
            Some(0),
            vec![],
            |ctx, _| {
                ctx.store
                    .set(Scope::Local, "fired", Value::Boolean(true))
                    .map_err(|e| EvalError::type_error(e.to_string()))?;
                Ok(Value::Boolean(true))
            },
        ))
        .unwrap();
    registry
}

#[test]
fn test_and_or_basics() {
    assert_eq!(eval("(and (true) (false))").unwrap(), Value::Boolean(false));
    assert_eq!(eval("(and (true) (true))").unwrap(), Value::Boolean(true));
    assert_eq!(eval("(or (false) (true))").unwrap(), Value::Boolean(true));
    assert_eq!(eval("(not (true))").unwrap(), Value::Boolean(false));
}

#[test]
fn test_and_short_circuits_past_false() {
    let registry = registry_with_side_effect();
    let mut store = VariableStore::new();

    let result = eval_with(&registry, &mut store, "(and (false) (side-effect))").unwrap();
    assert_eq!(result, Value::Boolean(false));
    assert!(!store.is_defined("fired"), "side effect must not fire");
}

#[test]
fn test_and_evaluates_up_to_the_deciding_argument() {
    let registry = registry_with_side_effect();
    let mut store = VariableStore::new();

    let result = eval_with(&registry, &mut store, "(and (true) (side-effect))").unwrap();
    assert_eq!(result, Value::Boolean(true));
    assert!(store.is_defined("fired"));
}

#[test]
fn test_or_short_circuits_past_true() {
    let registry = registry_with_side_effect();
    let mut store = VariableStore::new();

    let result = eval_with(&registry, &mut store, "(or (true) (side-effect))").unwrap();
    assert_eq!(result, Value::Boolean(true));
    assert!(!store.is_defined("fired"), "side effect must not fire");
}

// ============================================================================
// Operator Dispatch Errors
// ============================================================================

#[test]
fn test_unknown_operator() {
    let result = eval("(no-such-operator 1)");
    assert!(matches!(
        result,
        Err(EvalError::UnknownOperator { ref name, .. }) if name == "no-such-operator"
    ));
}

#[test]
fn test_operator_lookup_is_case_insensitive() {
    assert_eq!(eval("(MOD 7 3)").unwrap(), Value::Integer(1));
}

#[test]
fn test_arity_error() {
    let result = eval("(not (true) (false))");
    assert!(matches!(result, Err(EvalError::Arity { got: 2, .. })));
}

#[test]
fn test_literal_type_mismatch_is_an_error() {
    let result = eval("(+ 1 \"x\")");
    assert!(matches!(result, Err(EvalError::TypeError { .. })));
}

#[test]
fn test_error_reports_source_position() {
    let err = eval("(and (true) (no-such-operator))").unwrap_err();
    match err {
        EvalError::UnknownOperator { line, column, .. } => {
            assert_eq!((line, column), (1, 13));
        }
        other => panic!("expected UnknownOperator, got {:?}", other),
    }
}

// ============================================================================
// Variable-Value Coercion
// ============================================================================

#[test]
fn test_string_variable_coerces_to_number() {
    let registry = standard_registry();
    let mut store = VariableStore::new();
    store
        .set(Scope::Local, "count", Value::String("5".to_string()))
        .unwrap();

    assert_eq!(
        eval_with(&registry, &mut store, "(+ 1 @count)").unwrap(),
        Value::Integer(6)
    );
}

#[test]
fn test_unparseable_string_variable_coerces_to_zero() {
    let registry = standard_registry();
    let mut store = VariableStore::new();
    store
        .set(Scope::Local, "count", Value::String("garbage".to_string()))
        .unwrap();

    assert_eq!(
        eval_with(&registry, &mut store, "(+ 1 @count)").unwrap(),
        Value::Integer(1)
    );
}

#[test]
fn test_boolean_variable_coerces_to_number() {
    let registry = standard_registry();
    let mut store = VariableStore::new();
    store.set(Scope::Local, "armed", Value::Boolean(true)).unwrap();

    assert_eq!(
        eval_with(&registry, &mut store, "(+ 10 @armed)").unwrap(),
        Value::Integer(11)
    );
}

#[test]
fn test_number_variable_coerces_to_boolean() {
    let registry = standard_registry();
    let mut store = VariableStore::new();
    store.set(Scope::Local, "flag", Value::Integer(2)).unwrap();

    assert_eq!(
        eval_with(&registry, &mut store, "(not @flag)").unwrap(),
        Value::Boolean(false)
    );
}

// ============================================================================
// modify-variable
// ============================================================================

#[test]
fn test_modify_variable_creates_in_local_scope() {
    let registry = standard_registry();
    let mut store = VariableStore::new();

    let result = eval_with(&registry, &mut store, "(modify-variable @score 100)").unwrap();
    assert_eq!(result, Value::Integer(100));
    assert_eq!(store.get(Scope::Local, "score").unwrap(), Value::Integer(100));
}

#[test]
fn test_modify_variable_writes_through_existing_scope() {
    let registry = standard_registry();
    let mut store = VariableStore::new();
    store.set(Scope::Campaign, "score", Value::Integer(1)).unwrap();

    eval_with(&registry, &mut store, "(modify-variable @score (+ @score 9))").unwrap();
    assert_eq!(store.get(Scope::Campaign, "score").unwrap(), Value::Integer(10));
    assert!(store.get(Scope::Local, "score").is_err());
}

#[test]
fn test_modify_variable_requires_a_reference() {
    let result = eval("(modify-variable \"score\" 1)");
    assert!(matches!(result, Err(EvalError::TypeError { .. })));
}

#[test]
fn test_modify_variable_respects_type_locks() {
    use sexp_lang::variables::Variable;

    let registry = standard_registry();
    let mut store = VariableStore::new();
    store.define(
        Scope::Local,
        Variable::new("score", Value::Integer(5)).with_type_lock(ValueType::Number),
    );

    let result = eval_with(&registry, &mut store, "(modify-variable @score \"oops\")");
    assert!(matches!(result, Err(EvalError::Store { .. })));
    assert_eq!(store.get(Scope::Local, "score").unwrap(), Value::Integer(5));
}

// ============================================================================
// Argument Evaluation Order and Depth Limit
// ============================================================================

#[test]
fn test_arguments_evaluate_left_to_right() {
    let registry = standard_registry();
    let mut store = VariableStore::new();
    store.set(Scope::Local, "x", Value::Integer(1)).unwrap();

    // The first argument doubles @x; the second observes the new value.
    let result = eval_with(
        &registry,
        &mut store,
        "(+ (modify-variable @x (* @x 2)) @x)",
    )
    .unwrap();
    assert_eq!(result, Value::Integer(4));
}

#[test]
fn test_recursion_depth_limit() {
    let registry = standard_registry();
    let mut store = VariableStore::new();

    let mut text = String::from("1");
    for _ in 0..40 {
        text = format!("(+ 1 {})", text);
    }
    let expr = parse_str(&text).unwrap();

    let shallow = Evaluator::new(&registry).with_max_depth(10);
    assert!(matches!(
        shallow.evaluate(&expr, &mut store),
        Err(EvalError::RecursionLimit { limit: 10, .. })
    ));

    let deep = Evaluator::new(&registry).with_max_depth(100);
    assert_eq!(deep.evaluate(&expr, &mut store).unwrap(), Value::Integer(41));
}

// ============================================================================
// Host-Registered Operators
// ============================================================================

#[test]
fn test_host_operator_receives_evaluated_values() {
    let mut registry = standard_registry();
    registry
        .register(FunctionDescriptor::new(
            "is-ship-visible",
            1,
            Some(1),
            vec![ValueType::String],
            |_, args| Ok(Value::Boolean(args[0].as_string() == "Alpha 1")),
        ))
        .unwrap();

    let mut store = VariableStore::new();
    assert_eq!(
        eval_with(&registry, &mut store, "(is-ship-visible (string-concat \"Alpha\" \" 1\"))")
            .unwrap(),
        Value::Boolean(true)
    );
}

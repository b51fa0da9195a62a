// tests/registry_tests.rs

use sexp_lang::builtins::standard_registry;
use sexp_lang::registry::{
    DuplicatePolicy, FunctionDescriptor, FunctionRegistry, RegistryError,
};
use sexp_lang::value::{Value, ValueType};

fn descriptor(name: &str) -> FunctionDescriptor {
    FunctionDescriptor::new(name, 0, Some(0), vec![], |_, _| Ok(Value::Boolean(true)))
}

// ============================================================================
// Registration and Lookup
// ============================================================================

#[test]
fn test_register_and_lookup() {
    let mut registry = FunctionRegistry::new();
    registry.register(descriptor("is-ship-visible")).unwrap();

    assert!(registry.contains("is-ship-visible"));
    assert_eq!(registry.lookup("is-ship-visible").unwrap().name, "is-ship-visible");
    assert!(registry.lookup("is-ship-cloaked").is_none());
}

#[test]
fn test_lookup_is_case_insensitive() {
    let mut registry = FunctionRegistry::new();
    registry.register(descriptor("Is-Ship-Visible")).unwrap();

    assert!(registry.lookup("is-ship-visible").is_some());
    assert!(registry.lookup("IS-SHIP-VISIBLE").is_some());
    // The display name keeps its registered casing
    assert_eq!(registry.lookup("is-ship-visible").unwrap().name, "Is-Ship-Visible");
}

#[test]
fn test_incremental_registration_from_groups() {
    // The builtin groups register through the same boundary hosts use
    let registry = standard_registry();
    for name in ["+", "=", "and", "string-concat", "modify-variable"] {
        assert!(registry.contains(name), "missing builtin: {}", name);
    }
    assert!(registry.len() > 20);
}

// ============================================================================
// Duplicate Policy
// ============================================================================

#[test]
fn test_reject_policy_is_the_default() {
    let mut registry = FunctionRegistry::new();
    registry.register(descriptor("twice")).unwrap();

    let result = registry.register(descriptor("twice"));
    assert!(matches!(result, Err(RegistryError::DuplicateFunction(_))));
}

#[test]
fn test_reject_policy_is_case_insensitive() {
    let mut registry = FunctionRegistry::new();
    registry.register(descriptor("Twice")).unwrap();
    assert!(registry.register(descriptor("TWICE")).is_err());
}

#[test]
fn test_overwrite_policy_replaces() {
    let mut registry = FunctionRegistry::with_policy(DuplicatePolicy::Overwrite);
    registry.register(descriptor("shadowed")).unwrap();
    registry
        .register(FunctionDescriptor::new(
            "shadowed",
            2,
            Some(2),
            vec![ValueType::Number],
            |_, _| Ok(Value::Integer(0)),
        ))
        .unwrap();

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.lookup("shadowed").unwrap().min_args, 2);
}

// ============================================================================
// Arity and Signature Helpers
// ============================================================================

#[test]
fn test_accepts_arity_bounds() {
    let fixed = FunctionDescriptor::new("f", 2, Some(2), vec![ValueType::Any], |_, _| {
        Ok(Value::Boolean(true))
    });
    assert!(!fixed.accepts_arity(1));
    assert!(fixed.accepts_arity(2));
    assert!(!fixed.accepts_arity(3));

    let variadic = FunctionDescriptor::new("v", 1, None, vec![ValueType::Any], |_, _| {
        Ok(Value::Boolean(true))
    });
    assert!(!variadic.accepts_arity(0));
    assert!(variadic.accepts_arity(100));
}

#[test]
fn test_variadic_tail_repeats_last_type() {
    let desc = FunctionDescriptor::new(
        "f",
        2,
        None,
        vec![ValueType::String, ValueType::Number],
        |_, _| Ok(Value::Boolean(true)),
    );
    assert_eq!(desc.arg_type_at(0), ValueType::String);
    assert_eq!(desc.arg_type_at(1), ValueType::Number);
    assert_eq!(desc.arg_type_at(7), ValueType::Number);
}

// ============================================================================
// Search
// ============================================================================

#[test]
fn test_search_exact_match_ranks_first() {
    let registry = standard_registry();
    let matches = registry.search("mod", 5);
    assert!(!matches.is_empty());
    assert_eq!(matches[0].descriptor.name, "mod");
    assert_eq!(matches[0].score, 0);
}

#[test]
fn test_search_prefix_beats_substring() {
    let mut registry = FunctionRegistry::new();
    registry.register(descriptor("ship-destroyed")).unwrap();
    registry.register(descriptor("is-ship-visible")).unwrap();

    let matches = registry.search("ship", 5);
    assert_eq!(matches[0].descriptor.name, "ship-destroyed");
    assert_eq!(matches[1].descriptor.name, "is-ship-visible");
    assert!(matches[0].score < matches[1].score);
}

#[test]
fn test_search_tolerates_typos() {
    let registry = standard_registry();
    let matches = registry.search("strng-concat", 3);
    assert!(matches.iter().any(|m| m.descriptor.name == "string-concat"));
}

#[test]
fn test_search_respects_limit_and_ignores_noise() {
    let registry = standard_registry();
    assert!(registry.search("string", 2).len() <= 2);
    assert!(registry.search("zzzzzzzzzz", 5).is_empty());
}

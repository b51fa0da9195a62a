//! Operator registry for the SEXP language.
//!
//! Every operator callable from an expression - builtin or host-provided -
//! is described by a [`FunctionDescriptor`] and registered here. The
//! evaluator and validator both consult the registry; neither hardcodes an
//! operator table. Registries are plain values constructed by the host and
//! passed in explicitly, so independent instances (one per test, per
//! mission, per editor tab) never interfere.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::evaluator::{EvalError, OpContext};
use crate::value::{Value, ValueType};

/// Evaluation routine for an operator.
///
/// Receives already-evaluated, type-checked argument values plus an
/// [`OpContext`] exposing the variable store for side-effecting operators.
/// Routines never see raw expression nodes.
pub type EvalFn = Arc<dyn Fn(&mut OpContext<'_>, &[Value]) -> Result<Value, EvalError> + Send + Sync>;

/// Metadata and evaluation routine for one operator.
///
/// Argument types are positional; when a call supplies more arguments than
/// there are listed types, the last type repeats as a variadic tail.
#[derive(Clone)]
pub struct FunctionDescriptor {
    /// Display name. Lookup is case-insensitive.
    pub name: String,
    /// Minimum number of arguments.
    pub min_args: usize,
    /// Maximum number of arguments; `None` means unbounded.
    pub max_args: Option<usize>,
    /// Positional argument types, last entry covering the variadic tail.
    pub arg_types: Vec<ValueType>,
    /// The evaluation routine.
    pub eval: EvalFn,
}

impl fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDescriptor")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .field("arg_types", &self.arg_types)
            .finish_non_exhaustive()
    }
}

impl FunctionDescriptor {
    pub fn new(
        name: impl Into<String>,
        min_args: usize,
        max_args: Option<usize>,
        arg_types: Vec<ValueType>,
        eval: impl Fn(&mut OpContext<'_>, &[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) -> Self {
        FunctionDescriptor {
            name: name.into(),
            min_args,
            max_args,
            arg_types,
            eval: Arc::new(eval),
        }
    }

    /// Expected type for the argument at `index`, with the last listed type
    /// acting as the variadic tail.
    pub fn arg_type_at(&self, index: usize) -> ValueType {
        self.arg_types
            .get(index)
            .or_else(|| self.arg_types.last())
            .copied()
            .unwrap_or(ValueType::Any)
    }

    /// Whether `count` arguments satisfy this descriptor's arity bounds.
    pub fn accepts_arity(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.is_none_or(|max| count <= max)
    }

    /// Human-readable arity description for error messages.
    pub fn arity_text(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => format!("{}", self.min_args),
            Some(max) => format!("{} to {}", self.min_args, max),
            None => format!("at least {}", self.min_args),
        }
    }
}

/// What to do when a name is registered twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Fail with [`RegistryError::DuplicateFunction`]. The default:
    /// registering the same name twice is almost always a wiring bug.
    #[default]
    Reject,
    /// Replace the existing descriptor. Opt-in for hosts that intentionally
    /// shadow builtins.
    Overwrite,
}

/// Errors raised by registry mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// A descriptor with this (case-insensitive) name already exists and the
    /// registry's policy is [`DuplicatePolicy::Reject`].
    DuplicateFunction(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateFunction(name) => {
                write!(f, "Operator '{}' is already registered", name)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// A ranked match returned by [`FunctionRegistry::search`].
#[derive(Debug, Clone)]
pub struct SearchMatch<'a> {
    pub descriptor: &'a FunctionDescriptor,
    /// Lower is better: 0 exact, 1 prefix, 2 substring, 3+ edit distance.
    pub score: u32,
}

/// Registry of operators, keyed case-insensitively by name.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    funcs: HashMap<String, FunctionDescriptor>,
    policy: DuplicatePolicy,
}

impl FunctionRegistry {
    /// Creates an empty registry with the default [`DuplicatePolicy::Reject`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with an explicit duplicate policy.
    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        FunctionRegistry {
            funcs: HashMap::new(),
            policy,
        }
    }

    /// Registers a descriptor. Duplicate names are rejected or overwritten
    /// per the registry's policy.
    pub fn register(&mut self, descriptor: FunctionDescriptor) -> Result<(), RegistryError> {
        let key = descriptor.name.to_lowercase();
        if self.policy == DuplicatePolicy::Reject && self.funcs.contains_key(&key) {
            return Err(RegistryError::DuplicateFunction(descriptor.name));
        }
        self.funcs.insert(key, descriptor);
        Ok(())
    }

    /// Case-insensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.funcs.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(&name.to_lowercase())
    }

    /// Number of registered operators.
    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }

    /// Iterator over all registered descriptors, unordered.
    pub fn descriptors(&self) -> impl Iterator<Item = &FunctionDescriptor> {
        self.funcs.values()
    }

    /// Fuzzy name search, ranked exact > prefix > substring > edit distance.
    ///
    /// Edit-distance matches are admitted only within a small threshold so a
    /// typo finds its neighbor without dragging in the whole registry. The
    /// linear scan stays fast enough for per-keystroke use with a few
    /// hundred descriptors registered.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchMatch<'_>> {
        let query = query.to_lowercase();
        let mut matches: Vec<SearchMatch<'_>> = Vec::new();

        for (key, descriptor) in &self.funcs {
            let score = if *key == query {
                0
            } else if key.starts_with(&query) {
                1
            } else if key.contains(&query) {
                2
            } else {
                let distance = edit_distance(key, &query);
                let threshold = (query.len() / 3).max(2);
                if distance as usize > threshold {
                    continue;
                }
                2 + distance
            };
            matches.push(SearchMatch { descriptor, score });
        }

        matches.sort_by(|a, b| {
            a.score
                .cmp(&b.score)
                .then_with(|| a.descriptor.name.cmp(&b.descriptor.name))
        });
        matches.truncate(limit);
        matches
    }
}

/// Levenshtein distance between two strings.
fn edit_distance(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev: Vec<u32> = (0..=b.len() as u32).collect();
    let mut current = vec![0u32; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i as u32 + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + u32::from(ca != cb);
            current[j + 1] = substitution.min(prev[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut prev, &mut current);
    }

    prev[b.len()]
}

#[test]
fn test_edit_distance() {
    assert_eq!(edit_distance("and", "and"), 0);
    assert_eq!(edit_distance("adn", "and"), 2);
    assert_eq!(edit_distance("mod", "nod"), 1);
}

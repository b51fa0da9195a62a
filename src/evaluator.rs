use std::fmt;

use crate::{
    ast::Expr,
    registry::FunctionRegistry,
    value::Value,
    variables::{Scope, StoreError, VariableStore},
};

/// Default recursion-depth ceiling. Mission expressions are shallow; the
/// limit exists to bound evaluation of untrusted content.
const DEFAULT_MAX_DEPTH: usize = 128;

/// Context handed to operator evaluation routines.
///
/// Exposes the variable store so side-effecting operators can read and
/// write variables; routines never receive raw expression nodes.
pub struct OpContext<'a> {
    pub store: &'a mut VariableStore,
}

/// Errors that can occur during expression evaluation.
///
/// Every error carries the source position of the expression that produced
/// it. Errors propagate up the tree immediately; there are no partial
/// results.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Operator call whose name is not in the registry.
    UnknownOperator {
        name: String,
        line: usize,
        column: usize,
    },

    /// Argument count outside the operator's arity bounds.
    Arity {
        operator: String,
        expected: String,
        got: usize,
        line: usize,
        column: usize,
    },

    /// Type mismatch or invalid operation for the given type.
    TypeError {
        message: String,
        line: usize,
        column: usize,
    },

    /// Reference to a variable not defined in any scope.
    UndefinedVariable {
        name: String,
        line: usize,
        column: usize,
    },

    /// Division or modulo by zero.
    DivisionByZero { line: usize, column: usize },

    /// Variable store rejected a mutation (read-only, type lock, constraint).
    Store {
        source: StoreError,
        line: usize,
        column: usize,
    },

    /// Expression nesting exceeded the evaluator's depth limit.
    RecursionLimit {
        limit: usize,
        line: usize,
        column: usize,
    },
}

impl EvalError {
    /// TypeError without a position; the evaluator attaches one as the
    /// error propagates out of an operator routine.
    pub fn type_error(message: impl Into<String>) -> Self {
        EvalError::TypeError {
            message: message.into(),
            line: 0,
            column: 0,
        }
    }

    /// DivisionByZero without a position, for operator routines.
    pub fn division_by_zero() -> Self {
        EvalError::DivisionByZero { line: 0, column: 0 }
    }

    /// Attach a position if the error does not already carry one.
    fn or_at(mut self, at_line: usize, at_column: usize) -> Self {
        let (line, column) = match &mut self {
            EvalError::UnknownOperator { line, column, .. }
            | EvalError::Arity { line, column, .. }
            | EvalError::TypeError { line, column, .. }
            | EvalError::UndefinedVariable { line, column, .. }
            | EvalError::DivisionByZero { line, column }
            | EvalError::Store { line, column, .. }
            | EvalError::RecursionLimit { line, column, .. } => (line, column),
        };
        if *line == 0 {
            *line = at_line;
            *column = at_column;
        }
        self
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (message, line, column) = match self {
            EvalError::UnknownOperator { name, line, column } => {
                (format!("Unknown operator '{}'", name), line, column)
            }
            EvalError::Arity {
                operator,
                expected,
                got,
                line,
                column,
            } => (
                format!(
                    "Operator '{}' expects {} argument(s), got {}",
                    operator, expected, got
                ),
                line,
                column,
            ),
            EvalError::TypeError {
                message,
                line,
                column,
            } => (format!("Type error: {}", message), line, column),
            EvalError::UndefinedVariable { name, line, column } => {
                (format!("Undefined variable: @{}", name), line, column)
            }
            EvalError::DivisionByZero { line, column } => {
                ("Division by zero".to_string(), line, column)
            }
            EvalError::Store {
                source,
                line,
                column,
            } => (source.to_string(), line, column),
            EvalError::RecursionLimit {
                limit,
                line,
                column,
            } => (
                format!("Expression nesting exceeds the depth limit of {}", limit),
                line,
                column,
            ),
        };
        if *line > 0 {
            write!(f, "{} (line {}, column {})", message, line, column)
        } else {
            f.write_str(&message)
        }
    }
}

impl std::error::Error for EvalError {}

/// The expression evaluator.
///
/// A synchronous, single-threaded tree walk over a parsed [`Expr`].
/// Literals yield their value; variable references resolve through the
/// store's Local/Campaign/Global search; operator calls dispatch through
/// the registry. The registry is injected at construction and the store at
/// each call, so independent instances never share state.
pub struct Evaluator<'a> {
    registry: &'a FunctionRegistry,
    max_depth: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(registry: &'a FunctionRegistry) -> Self {
        Evaluator {
            registry,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Replace the recursion-depth ceiling (hardening for untrusted
    /// mission content).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Evaluate an expression against a variable store.
    pub fn evaluate(&self, expr: &Expr, store: &mut VariableStore) -> Result<Value, EvalError> {
        self.eval_expr(expr, store, 0)
    }

    fn eval_expr(
        &self,
        expr: &Expr,
        store: &mut VariableStore,
        depth: usize,
    ) -> Result<Value, EvalError> {
        match expr {
            Expr::Integer(n) => Ok(Value::Integer(*n)),
            Expr::Float(n) => Ok(Value::Float(*n)),
            Expr::String(s) => Ok(Value::String(s.clone())),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::VariableRef { name, line, column } => match store.find(name) {
                Some((_, variable)) => Ok(variable.value.clone()),
                None => Err(EvalError::UndefinedVariable {
                    name: name.clone(),
                    line: *line,
                    column: *column,
                }),
            },
            Expr::OperatorCall {
                name,
                args,
                line,
                column,
            } => {
                if depth >= self.max_depth {
                    return Err(EvalError::RecursionLimit {
                        limit: self.max_depth,
                        line: *line,
                        column: *column,
                    });
                }
                self.eval_call(name, args, store, depth, *line, *column)
            }
        }
    }

    fn eval_call(
        &self,
        name: &str,
        args: &[Expr],
        store: &mut VariableStore,
        depth: usize,
        line: usize,
        column: usize,
    ) -> Result<Value, EvalError> {
        // Special forms control their own argument evaluation and cannot be
        // expressed as registry routines (which receive evaluated values).
        match name.to_lowercase().as_str() {
            "and" => return self.eval_short_circuit(name, args, store, depth, line, column, false),
            "or" => return self.eval_short_circuit(name, args, store, depth, line, column, true),
            "modify-variable" => {
                return self.eval_modify_variable(args, store, depth, line, column);
            }
            _ => {}
        }

        let descriptor =
            self.registry
                .lookup(name)
                .ok_or_else(|| EvalError::UnknownOperator {
                    name: name.to_string(),
                    line,
                    column,
                })?;

        if !descriptor.accepts_arity(args.len()) {
            return Err(EvalError::Arity {
                operator: descriptor.name.clone(),
                expected: descriptor.arity_text(),
                got: args.len(),
                line,
                column,
            });
        }

        // Arguments evaluate left to right; side effects are ordered.
        let mut values = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().enumerate() {
            let value = self.eval_expr(arg, store, depth + 1)?;
            let expected = descriptor.arg_type_at(index);
            let value = if value.matches(expected) {
                value
            } else if matches!(arg, Expr::VariableRef { .. }) {
                // The conversion rules apply to variable-sourced values;
                // a mistyped literal or computed argument is a hard error.
                value.coerce_to(expected)
            } else {
                return Err(EvalError::TypeError {
                    message: format!(
                        "Operator '{}' expects {} for argument {}, got {}",
                        descriptor.name,
                        expected.name(),
                        index + 1,
                        value.type_name()
                    ),
                    line,
                    column,
                });
            };
            values.push(value);
        }

        let mut ctx = OpContext { store };
        (descriptor.eval)(&mut ctx, &values).map_err(|e| e.or_at(line, column))
    }

    /// `and` / `or`: evaluate arguments left to right, stop at the first
    /// decisive one. Trailing side-effecting arguments do not run.
    #[allow(clippy::too_many_arguments)]
    fn eval_short_circuit(
        &self,
        name: &str,
        args: &[Expr],
        store: &mut VariableStore,
        depth: usize,
        line: usize,
        column: usize,
        stop_on: bool,
    ) -> Result<Value, EvalError> {
        if args.is_empty() {
            return Err(EvalError::Arity {
                operator: name.to_string(),
                expected: "at least 1".to_string(),
                got: 0,
                line,
                column,
            });
        }
        for arg in args {
            let value = self.eval_expr(arg, store, depth + 1)?;
            if value.as_bool() == stop_on {
                return Ok(Value::Boolean(stop_on));
            }
        }
        Ok(Value::Boolean(!stop_on))
    }

    /// `modify-variable`: the first argument is a variable *reference*, not
    /// an evaluated value. Writes through the scope the variable lives in,
    /// creating it in Local scope when absent. Yields the assigned value.
    fn eval_modify_variable(
        &self,
        args: &[Expr],
        store: &mut VariableStore,
        depth: usize,
        line: usize,
        column: usize,
    ) -> Result<Value, EvalError> {
        if args.len() != 2 {
            return Err(EvalError::Arity {
                operator: "modify-variable".to_string(),
                expected: "2".to_string(),
                got: args.len(),
                line,
                column,
            });
        }

        let name = match &args[0] {
            Expr::VariableRef { name, .. } => name.clone(),
            other => {
                return Err(EvalError::TypeError {
                    message: format!(
                        "modify-variable expects a variable reference as its first argument, got {}",
                        describe_expr(other)
                    ),
                    line,
                    column,
                });
            }
        };

        let value = self.eval_expr(&args[1], store, depth + 1)?;
        let scope = store.find(&name).map(|(scope, _)| scope).unwrap_or(Scope::Local);
        store
            .set(scope, &name, value.clone())
            .map_err(|source| EvalError::Store {
                source,
                line,
                column,
            })?;
        Ok(value)
    }
}

fn describe_expr(expr: &Expr) -> &'static str {
    match expr {
        Expr::Integer(_) => "an integer literal",
        Expr::Float(_) => "a float literal",
        Expr::String(_) => "a string literal",
        Expr::Boolean(_) => "a boolean literal",
        Expr::VariableRef { .. } => "a variable reference",
        Expr::OperatorCall { .. } => "an operator call",
    }
}

pub mod ast;
pub mod builtins;
pub mod evaluator;
pub mod fs2;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod registry;
pub mod validator;
pub mod value;
pub mod variables;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{Expr, Token, TokenKind};
pub use builtins::{register_builtins, standard_registry};
pub use evaluator::{EvalError, Evaluator, OpContext};
pub use lexer::{LexError, Lexer};
pub use parser::{parse_str, ParseError, Parser};
pub use printer::{to_text, to_text_pretty};
pub use registry::{DuplicatePolicy, FunctionDescriptor, FunctionRegistry, RegistryError};
pub use validator::{FixSuggestion, ValidationLevel, ValidationReport, Validator};
pub use value::{Value, ValueType};
pub use variables::{Constraint, Scope, StoreError, Variable, VariableEvent, VariableStore};

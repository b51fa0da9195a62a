/// Abstract Syntax Tree node representing a parsed SEXP expression.
///
/// The tree owns its children exclusively; there are no cycles. Nodes are
/// immutable after construction. `OperatorCall` and `VariableRef` carry the
/// source position of their introducing token for error reporting.
///
/// Equality ignores source positions: a pretty-printed and re-parsed tree
/// compares equal to the original even though its tokens moved.
#[derive(Debug, Clone)]
pub enum Expr {
    // Literals
    /// Literal integer
    ///
    /// # Example
    /// ```text
    /// 42
    /// ```
    Integer(i64),

    /// Literal floating point number
    ///
    /// # Example
    /// ```text
    /// 3.5
    /// ```
    Float(f64),

    /// String literal
    ///
    /// # Example
    /// ```text
    /// "Alpha 1"
    /// ```
    String(String),

    /// Boolean literal
    Boolean(bool),

    /// Variable reference (`@name`)
    ///
    /// Resolved through the variable store: Local, then Campaign, then
    /// Global scope, first match wins.
    VariableRef {
        name: String,
        line: usize,
        column: usize,
    },

    /// Operator call: `(name arg1 arg2 ...)`
    ///
    /// The operator name is looked up case-insensitively in the function
    /// registry. Arguments are evaluated left to right.
    ///
    /// # Examples
    /// ```text
    /// (+ 1 2)
    /// (and (true) (> @kills 5))
    /// ```
    OperatorCall {
        name: String,
        args: Vec<Expr>,
        line: usize,
        column: usize,
    },
}

impl Expr {
    /// Convenience constructor for tests and programmatic tree building.
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::OperatorCall {
            name: name.into(),
            args,
            line: 0,
            column: 0,
        }
    }

    /// Convenience constructor for a variable reference without position.
    pub fn variable(name: impl Into<String>) -> Self {
        Expr::VariableRef {
            name: name.into(),
            line: 0,
            column: 0,
        }
    }

    /// Number of nodes in this subtree, counting the root.
    pub fn node_count(&self) -> usize {
        match self {
            Expr::OperatorCall { args, .. } => {
                1 + args.iter().map(Expr::node_count).sum::<usize>()
            }
            _ => 1,
        }
    }

    /// Maximum nesting depth of this subtree (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        match self {
            Expr::OperatorCall { args, .. } => {
                1 + args.iter().map(Expr::depth).max().unwrap_or(0)
            }
            _ => 1,
        }
    }
}

// Structural equality only: positions are bookkeeping for diagnostics and
// must not affect round-trip comparisons.
impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expr::Integer(a), Expr::Integer(b)) => a == b,
            (Expr::Float(a), Expr::Float(b)) => a == b,
            (Expr::String(a), Expr::String(b)) => a == b,
            (Expr::Boolean(a), Expr::Boolean(b)) => a == b,
            (
                Expr::VariableRef { name: a, .. },
                Expr::VariableRef { name: b, .. },
            ) => a == b,
            (
                Expr::OperatorCall { name: a, args: xs, .. },
                Expr::OperatorCall { name: b, args: ys, .. },
            ) => a == b && xs == ys,
            _ => false,
        }
    }
}

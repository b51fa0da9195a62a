/// A runtime value in the SEXP language.
///
/// The value set is closed: numbers (with the integer/float distinction
/// preserved), strings, and booleans. Every stage of the pipeline - literal
/// payloads, variable values, evaluation results - uses this one type.
///
/// # Type Preservation
///
/// The language keeps integers and floats apart:
/// - Arithmetic maintains integer types when results are whole
/// - Mixed integer/float operations return integers when mathematically exact
///
/// # Examples
///
/// ```
/// use sexp_lang::Value;
///
/// let n = Value::Integer(42);
/// let f = Value::Float(3.5);
/// let s = Value::String("Alpha 1".to_string());
/// let b = Value::Boolean(true);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer number (preserved separately from floats)
    Integer(i64),

    /// Floating-point number
    Float(f64),

    /// UTF-8 string
    String(String),

    /// Boolean (true/false)
    Boolean(bool),
}

/// The coarse type of a [`Value`], used in operator signatures and variable
/// type locks. Integers and floats are both `Number`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Number,
    String,
    Boolean,
    /// Matches any value; used for operators that accept mixed arguments.
    Any,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Boolean => "boolean",
            ValueType::Any => "any",
        }
    }
}

impl Value {
    /// The coarse type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Integer(_) | Value::Float(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::Boolean(_) => ValueType::Boolean,
        }
    }

    /// Human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
        }
    }

    /// Whether this value satisfies the given signature type.
    pub fn matches(&self, expected: ValueType) -> bool {
        expected == ValueType::Any || self.value_type() == expected
    }

    /// Numeric view of this value, applying the conversion rules:
    /// strings parse as numbers (parse failure yields 0), `true` is 1 and
    /// `false` is 0.
    pub fn as_float(&self) -> f64 {
        match self {
            Value::Integer(n) => *n as f64,
            Value::Float(n) => *n,
            Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Integer view of this value, under the same conversion rules as
    /// [`Value::as_float`]. Floats truncate toward zero.
    pub fn as_int(&self) -> i64 {
        match self {
            Value::Integer(n) => *n,
            Value::Float(n) => *n as i64,
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .unwrap_or_else(|_| s.trim().parse::<f64>().unwrap_or(0.0) as i64),
            Value::Boolean(b) => {
                if *b {
                    1
                } else {
                    0
                }
            }
        }
    }

    /// Boolean view of this value: nonzero numbers are true; the empty
    /// string and the literal `"0"` are false, every other string is true.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::String(s) => !(s.is_empty() || s == "0"),
        }
    }

    /// String view of this value.
    pub fn as_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(n) => n.to_string(),
            Value::Float(n) => n.to_string(),
            Value::Boolean(b) => b.to_string(),
        }
    }

    /// Convert to the given type using the conversion rules. Conversions are
    /// total over the closed value set; `Any` returns the value unchanged.
    /// Number conversions preserve the integer/float split where possible.
    pub fn coerce_to(&self, target: ValueType) -> Value {
        if self.matches(target) {
            return self.clone();
        }
        match target {
            ValueType::Number => match self {
                Value::String(s) => {
                    let trimmed = s.trim();
                    if let Ok(i) = trimmed.parse::<i64>() {
                        Value::Integer(i)
                    } else {
                        Value::Float(trimmed.parse::<f64>().unwrap_or(0.0))
                    }
                }
                Value::Boolean(b) => Value::Integer(if *b { 1 } else { 0 }),
                other => other.clone(),
            },
            ValueType::String => Value::String(self.as_string()),
            ValueType::Boolean => Value::Boolean(self.as_bool()),
            ValueType::Any => self.clone(),
        }
    }
}

//! Scoped variable storage for mission scripting.
//!
//! Variables live in one of three scopes searched in priority order:
//! Local (mission lifetime), Campaign (persists across missions), Global
//! (persists across campaigns). Each variable carries a typed value and
//! optional guard rails: a type lock, a numeric-range or allowed-string
//! constraint, and a read-only flag. Mutation happens only through
//! [`VariableStore::set`], which enforces the guards and notifies
//! registered observers; there is no polling.
//!
//! Campaign and Global scopes serialize to a flat record format
//! (`{name, type, value}` plus any guard flags) for an external persistence
//! collaborator; the store itself never touches disk.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::SystemTime;

use crate::value::{Value, ValueType};

/// Variable scope, in lookup priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Mission-lifetime; cleared at mission end.
    Local,
    /// Persists across missions within one campaign.
    Campaign,
    /// Persists across all campaigns.
    Global,
}

impl Scope {
    /// All scopes in lookup priority order: Local, Campaign, Global.
    pub const ALL: [Scope; 3] = [Scope::Local, Scope::Campaign, Scope::Global];

    pub fn name(&self) -> &'static str {
        match self {
            Scope::Local => "local",
            Scope::Campaign => "campaign",
            Scope::Global => "global",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value constraint checked on every `set`.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Numeric values must fall within `[min, max]` inclusive.
    NumericRange { min: f64, max: f64 },
    /// String values must be one of the listed options.
    AllowedStrings(Vec<String>),
}

impl Constraint {
    /// Whether `value` satisfies this constraint.
    pub fn allows(&self, value: &Value) -> bool {
        match self {
            Constraint::NumericRange { min, max } => {
                let n = value.as_float();
                n >= *min && n <= *max
            }
            Constraint::AllowedStrings(options) => match value {
                Value::String(s) => options.iter().any(|o| o == s),
                _ => false,
            },
        }
    }

    fn describe(&self) -> String {
        match self {
            Constraint::NumericRange { min, max } => format!("range [{}, {}]", min, max),
            Constraint::AllowedStrings(options) => {
                format!("one of [{}]", options.join(", "))
            }
        }
    }
}

/// A typed variable owned by exactly one scope.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub value: Value,
    /// When set, new values must match this type.
    pub type_lock: Option<ValueType>,
    /// When set, new values must satisfy this constraint.
    pub constraint: Option<Constraint>,
    pub read_only: bool,
    pub created_at: SystemTime,
    pub modified_at: SystemTime,
    pub access_count: u64,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        let now = SystemTime::now();
        Variable {
            name: name.into(),
            value,
            type_lock: None,
            constraint: None,
            read_only: false,
            created_at: now,
            modified_at: now,
            access_count: 0,
        }
    }

    pub fn with_type_lock(mut self, lock: ValueType) -> Self {
        self.type_lock = Some(lock);
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// Errors raised by store mutation and lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Attempt to set a read-only variable.
    ReadOnlyViolation(String),
    /// New value's type does not match the variable's type lock.
    TypeLockViolation {
        name: String,
        expected: ValueType,
        got: ValueType,
    },
    /// New value violates the variable's range or allowed-set constraint.
    ConstraintViolation { name: String, detail: String },
    /// Lookup of a name not present in the requested scope.
    UnknownVariable { scope: Scope, name: String },
    /// Malformed persistence record during import.
    InvalidRecord(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::ReadOnlyViolation(name) => {
                write!(f, "Variable '{}' is read-only", name)
            }
            StoreError::TypeLockViolation {
                name,
                expected,
                got,
            } => write!(
                f,
                "Variable '{}' is locked to type {}, got {}",
                name,
                expected.name(),
                got.name()
            ),
            StoreError::ConstraintViolation { name, detail } => {
                write!(f, "Variable '{}' constraint violated: {}", name, detail)
            }
            StoreError::UnknownVariable { scope, name } => {
                write!(f, "No variable '{}' in {} scope", name, scope)
            }
            StoreError::InvalidRecord(detail) => {
                write!(f, "Invalid variable record: {}", detail)
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Change notification delivered synchronously to observers after every
/// successful mutation. This is the only channel by which other components
/// learn of variable changes.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableEvent {
    Created {
        scope: Scope,
        name: String,
        value: Value,
    },
    Modified {
        scope: Scope,
        name: String,
        old: Value,
        new: Value,
    },
    ScopeCleared(Scope),
}

type Observer = Box<dyn Fn(&VariableEvent)>;

/// Bounded name-to-scope cache with least-recently-used eviction.
///
/// Purely a fast path for [`VariableStore::find`]: the scope maps stay
/// authoritative, so a stale or evicted entry can never change a result.
struct LookupCache {
    capacity: usize,
    map: HashMap<String, Scope>,
    order: VecDeque<String>,
}

impl LookupCache {
    fn new(capacity: usize) -> Self {
        LookupCache {
            capacity,
            map: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&mut self, name: &str) -> Option<Scope> {
        let scope = self.map.get(name).copied()?;
        self.touch(name);
        Some(scope)
    }

    fn insert(&mut self, name: &str, scope: Scope) {
        if self.map.insert(name.to_string(), scope).is_none() {
            self.order.push_back(name.to_string());
            if self.order.len() > self.capacity
                && let Some(evicted) = self.order.pop_front()
            {
                self.map.remove(&evicted);
            }
        } else {
            self.touch(name);
        }
    }

    fn touch(&mut self, name: &str) {
        if let Some(idx) = self.order.iter().position(|n| n == name) {
            self.order.remove(idx);
            self.order.push_back(name.to_string());
        }
    }

    fn invalidate(&mut self, name: &str) {
        if self.map.remove(name).is_some()
            && let Some(idx) = self.order.iter().position(|n| n == name)
        {
            self.order.remove(idx);
        }
    }

    fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

const LOOKUP_CACHE_CAPACITY: usize = 64;

/// The three-scope variable store.
pub struct VariableStore {
    local: HashMap<String, Variable>,
    campaign: HashMap<String, Variable>,
    global: HashMap<String, Variable>,
    cache: LookupCache,
    observers: Vec<Observer>,
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableStore {
    pub fn new() -> Self {
        VariableStore {
            local: HashMap::new(),
            campaign: HashMap::new(),
            global: HashMap::new(),
            cache: LookupCache::new(LOOKUP_CACHE_CAPACITY),
            observers: Vec::new(),
        }
    }

    fn scope_map(&self, scope: Scope) -> &HashMap<String, Variable> {
        match scope {
            Scope::Local => &self.local,
            Scope::Campaign => &self.campaign,
            Scope::Global => &self.global,
        }
    }

    fn scope_map_mut(&mut self, scope: Scope) -> &mut HashMap<String, Variable> {
        match scope {
            Scope::Local => &mut self.local,
            Scope::Campaign => &mut self.campaign,
            Scope::Global => &mut self.global,
        }
    }

    /// Register an observer invoked synchronously after every successful
    /// mutation.
    pub fn subscribe(&mut self, observer: impl Fn(&VariableEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn emit(&self, event: VariableEvent) {
        for observer in &self.observers {
            observer(&event);
        }
    }

    /// Set a variable's value, creating it on first use.
    ///
    /// Enforces read-only flags, type locks and constraints; a failed set
    /// leaves the prior value untouched.
    pub fn set(&mut self, scope: Scope, name: &str, value: Value) -> Result<(), StoreError> {
        let event = match self.scope_map_mut(scope).get_mut(name) {
            Some(variable) => {
                if variable.read_only {
                    return Err(StoreError::ReadOnlyViolation(name.to_string()));
                }
                if let Some(lock) = variable.type_lock
                    && !value.matches(lock)
                {
                    return Err(StoreError::TypeLockViolation {
                        name: name.to_string(),
                        expected: lock,
                        got: value.value_type(),
                    });
                }
                if let Some(constraint) = &variable.constraint
                    && !constraint.allows(&value)
                {
                    return Err(StoreError::ConstraintViolation {
                        name: name.to_string(),
                        detail: constraint.describe(),
                    });
                }
                let old = std::mem::replace(&mut variable.value, value.clone());
                variable.modified_at = SystemTime::now();
                VariableEvent::Modified {
                    scope,
                    name: name.to_string(),
                    old,
                    new: value,
                }
            }
            None => {
                self.scope_map_mut(scope)
                    .insert(name.to_string(), Variable::new(name, value.clone()));
                self.cache.invalidate(name);
                VariableEvent::Created {
                    scope,
                    name: name.to_string(),
                    value,
                }
            }
        };
        self.emit(event);
        Ok(())
    }

    /// Insert a fully-configured variable (type lock, constraint, read-only
    /// flag), replacing any existing entry in that scope.
    pub fn define(&mut self, scope: Scope, variable: Variable) {
        let name = variable.name.clone();
        let value = variable.value.clone();
        self.scope_map_mut(scope).insert(name.clone(), variable);
        self.cache.invalidate(&name);
        self.emit(VariableEvent::Created { scope, name, value });
    }

    /// Read a variable's value from a specific scope.
    pub fn get(&mut self, scope: Scope, name: &str) -> Result<Value, StoreError> {
        match self.scope_map_mut(scope).get_mut(name) {
            Some(variable) => {
                variable.access_count += 1;
                Ok(variable.value.clone())
            }
            None => Err(StoreError::UnknownVariable {
                scope,
                name: name.to_string(),
            }),
        }
    }

    /// Inspect a variable without touching its access counter.
    pub fn get_variable(&self, scope: Scope, name: &str) -> Option<&Variable> {
        self.scope_map(scope).get(name)
    }

    /// Locate a variable by name, searching Local, then Campaign, then
    /// Global; first match wins. Bumps the access counter and warms the
    /// lookup cache.
    pub fn find(&mut self, name: &str) -> Option<(Scope, &Variable)> {
        let scope = match self.cache.get(name) {
            // The cache is advisory: verify before trusting it.
            Some(cached) if self.scope_map(cached).contains_key(name) => cached,
            _ => {
                let found = Scope::ALL
                    .into_iter()
                    .find(|s| self.scope_map(*s).contains_key(name))?;
                self.cache.insert(name, found);
                found
            }
        };

        let variable = self.scope_map_mut(scope).get_mut(name)?;
        variable.access_count += 1;
        Some((scope, &*variable))
    }

    /// Whether any scope defines `name`.
    pub fn is_defined(&self, name: &str) -> bool {
        Scope::ALL
            .into_iter()
            .any(|s| self.scope_map(s).contains_key(name))
    }

    /// Remove a single variable. Returns whether it existed.
    pub fn remove(&mut self, scope: Scope, name: &str) -> bool {
        self.cache.invalidate(name);
        self.scope_map_mut(scope).remove(name).is_some()
    }

    /// Clear an entire scope (mission end for Local; explicit host action
    /// for Campaign/Global).
    pub fn clear(&mut self, scope: Scope) {
        self.scope_map_mut(scope).clear();
        self.cache.clear();
        self.emit(VariableEvent::ScopeCleared(scope));
    }

    /// Names defined in a scope, sorted for deterministic output.
    pub fn names(&self, scope: Scope) -> Vec<String> {
        let mut names: Vec<String> = self.scope_map(scope).keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self, scope: Scope) -> usize {
        self.scope_map(scope).len()
    }

    pub fn is_empty(&self, scope: Scope) -> bool {
        self.scope_map(scope).is_empty()
    }

    #[cfg(test)]
    pub(crate) fn cache_len(&self) -> usize {
        self.cache.len()
    }

    // ========================================
    // Persistence records
    // ========================================

    /// Serialize a scope to an array of `{name, type, value}` records,
    /// sorted by name. Guard flags are included only when set.
    pub fn export_scope(&self, scope: Scope) -> serde_json::Value {
        let mut names: Vec<&String> = self.scope_map(scope).keys().collect();
        names.sort();

        let records: Vec<serde_json::Value> = names
            .into_iter()
            .map(|name| variable_to_record(&self.scope_map(scope)[name]))
            .collect();
        serde_json::Value::Array(records)
    }

    /// Load records produced by [`VariableStore::export_scope`] into a
    /// scope, replacing same-named entries. Returns the number of variables
    /// imported. Emits a Created event per variable.
    pub fn import_scope(
        &mut self,
        scope: Scope,
        records: &serde_json::Value,
    ) -> Result<usize, StoreError> {
        let records = records
            .as_array()
            .ok_or_else(|| StoreError::InvalidRecord("expected a JSON array".to_string()))?;

        let mut count = 0;
        for record in records {
            let variable = record_to_variable(record)?;
            self.define(scope, variable);
            count += 1;
        }
        Ok(count)
    }
}

fn variable_to_record(variable: &Variable) -> serde_json::Value {
    let mut record = serde_json::Map::new();
    record.insert(
        "name".to_string(),
        serde_json::Value::String(variable.name.clone()),
    );
    record.insert(
        "type".to_string(),
        serde_json::Value::String(variable.value.type_name().to_string()),
    );
    record.insert("value".to_string(), value_to_json(&variable.value));

    if variable.read_only {
        record.insert("read_only".to_string(), serde_json::Value::Bool(true));
    }
    if let Some(lock) = variable.type_lock {
        record.insert(
            "type_lock".to_string(),
            serde_json::Value::String(lock.name().to_string()),
        );
    }
    if let Some(constraint) = &variable.constraint {
        record.insert("constraint".to_string(), constraint_to_json(constraint));
    }

    serde_json::Value::Object(record)
}

fn record_to_variable(record: &serde_json::Value) -> Result<Variable, StoreError> {
    let obj = record
        .as_object()
        .ok_or_else(|| StoreError::InvalidRecord("expected a JSON object".to_string()))?;

    let name = obj
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| StoreError::InvalidRecord("missing 'name'".to_string()))?;
    let type_tag = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| StoreError::InvalidRecord(format!("missing 'type' for '{}'", name)))?;
    let raw = obj
        .get("value")
        .ok_or_else(|| StoreError::InvalidRecord(format!("missing 'value' for '{}'", name)))?;

    let value = json_to_value(type_tag, raw)
        .ok_or_else(|| StoreError::InvalidRecord(format!("bad {} value for '{}'", type_tag, name)))?;

    let mut variable = Variable::new(name, value);
    if obj.get("read_only").and_then(|v| v.as_bool()) == Some(true) {
        variable.read_only = true;
    }
    if let Some(lock) = obj.get("type_lock").and_then(|v| v.as_str()) {
        variable.type_lock = Some(match lock {
            "number" => ValueType::Number,
            "string" => ValueType::String,
            "boolean" => ValueType::Boolean,
            other => {
                return Err(StoreError::InvalidRecord(format!(
                    "unknown type lock '{}' for '{}'",
                    other, name
                )));
            }
        });
    }
    if let Some(constraint) = obj.get("constraint") {
        variable.constraint = Some(json_to_constraint(constraint, name)?);
    }
    Ok(variable)
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Integer(n) => serde_json::Value::Number((*n).into()),
        Value::Float(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Boolean(b) => serde_json::Value::Bool(*b),
    }
}

fn json_to_value(type_tag: &str, raw: &serde_json::Value) -> Option<Value> {
    match type_tag {
        "integer" => raw.as_i64().map(Value::Integer),
        "float" => raw.as_f64().map(Value::Float),
        "string" => raw.as_str().map(|s| Value::String(s.to_string())),
        "boolean" => raw.as_bool().map(Value::Boolean),
        _ => None,
    }
}

fn constraint_to_json(constraint: &Constraint) -> serde_json::Value {
    let mut obj = serde_json::Map::new();
    match constraint {
        Constraint::NumericRange { min, max } => {
            obj.insert("kind".to_string(), "range".into());
            obj.insert(
                "min".to_string(),
                serde_json::Number::from_f64(*min)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
            );
            obj.insert(
                "max".to_string(),
                serde_json::Number::from_f64(*max)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
            );
        }
        Constraint::AllowedStrings(options) => {
            obj.insert("kind".to_string(), "allowed".into());
            obj.insert(
                "options".to_string(),
                serde_json::Value::Array(
                    options
                        .iter()
                        .map(|o| serde_json::Value::String(o.clone()))
                        .collect(),
                ),
            );
        }
    }
    serde_json::Value::Object(obj)
}

#[test]
fn test_lookup_cache_is_bounded() {
    let mut store = VariableStore::new();
    for i in 0..(LOOKUP_CACHE_CAPACITY * 2) {
        let name = format!("var_{}", i);
        store.set(Scope::Local, &name, Value::Integer(i as i64)).unwrap();
        assert!(store.find(&name).is_some());
    }
    assert!(store.cache_len() <= LOOKUP_CACHE_CAPACITY);
    // Evicted entries still resolve through the authoritative maps
    assert!(store.find("var_0").is_some());
}

#[test]
fn test_stale_cache_entry_never_wins() {
    let mut store = VariableStore::new();
    store.set(Scope::Global, "shadowed", Value::Integer(1)).unwrap();
    assert_eq!(store.find("shadowed").unwrap().0, Scope::Global);

    // A Local variable now outranks the cached Global hit
    store.set(Scope::Local, "shadowed", Value::Integer(2)).unwrap();
    let (scope, variable) = store.find("shadowed").unwrap();
    assert_eq!(scope, Scope::Local);
    assert_eq!(variable.value, Value::Integer(2));
}

fn json_to_constraint(raw: &serde_json::Value, name: &str) -> Result<Constraint, StoreError> {
    let kind = raw.get("kind").and_then(|v| v.as_str());
    match kind {
        Some("range") => {
            let min = raw.get("min").and_then(|v| v.as_f64());
            let max = raw.get("max").and_then(|v| v.as_f64());
            match (min, max) {
                (Some(min), Some(max)) => Ok(Constraint::NumericRange { min, max }),
                _ => Err(StoreError::InvalidRecord(format!(
                    "bad range constraint for '{}'",
                    name
                ))),
            }
        }
        Some("allowed") => {
            let options = raw
                .get("options")
                .and_then(|v| v.as_array())
                .ok_or_else(|| {
                    StoreError::InvalidRecord(format!("bad allowed constraint for '{}'", name))
                })?;
            Ok(Constraint::AllowedStrings(
                options
                    .iter()
                    .filter_map(|o| o.as_str().map(str::to_string))
                    .collect(),
            ))
        }
        _ => Err(StoreError::InvalidRecord(format!(
            "unknown constraint kind for '{}'",
            name
        ))),
    }
}

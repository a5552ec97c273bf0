//! Live Values
//!
//! [`Value`] is a materialized value: a scalar, an enum member, a container
//! or a live instance. Instances are reference-counted [`Reflect`] trait
//! objects, compared by identity.
//!
//! [`DynObject`] is the attribute-map backed instance produced by classes
//! registered with `ClassSpec::dynamic`.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::types::{ClassId, Constant, Parameter};

/// Runtime view of a live instance
pub trait Reflect: Send + Sync + fmt::Debug {
    /// Qualified name of the instance's class (`<module>.<name>`)
    fn type_name(&self) -> &str;

    /// Read an attribute; `None` when missing or unreadable
    fn attribute(&self, name: &str) -> Option<Value>;

    /// Downcasting support for getters
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a live instance
pub type Instance = Arc<dyn Reflect>;

/// Identity comparison of two instances
pub fn same_instance(a: &Instance, b: &Instance) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Address used as the identity key of an instance
pub(crate) fn instance_addr(instance: &Instance) -> usize {
    Arc::as_ptr(instance) as *const () as usize
}

/// Enum member (or flag combination) of a registered enum class
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumMember {
    /// Enum class
    pub class: ClassId,
    /// Underlying value
    pub value: Constant,
}

impl EnumMember {
    /// Create a member handle
    pub fn new(class: ClassId, value: impl Into<Constant>) -> Self {
        Self {
            class,
            value: value.into(),
        }
    }
}

/// Materialized value
#[derive(Debug, Clone)]
pub enum Value {
    /// `None`
    None,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// String
    Str(String),
    /// Enum member
    Enum(EnumMember),
    /// Sequence (list, tuple or set)
    List(Vec<Value>),
    /// Keyword mapping
    Dict(IndexMap<String, Value>),
    /// Live instance
    Object(Instance),
}

impl Value {
    /// Wrap a [`Reflect`] implementation
    pub fn object<T: Reflect + 'static>(instance: T) -> Self {
        Value::Object(Arc::new(instance))
    }

    /// Short description of the variant
    pub fn type_label(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Enum(_) => "enum",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Object(_) => "object",
        }
    }

    /// Check if value is `None`
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as float, widening integers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get as list items
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get as live instance
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// Convert parsed JSON into a value; objects become dicts
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::None,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => Value::Dict(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_eq(*a, *b),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => same_instance(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::None => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => hash_float(*f, state),
            Value::Str(s) => s.hash(state),
            Value::Enum(e) => e.hash(state),
            Value::List(items) => items.hash(state),
            Value::Dict(map) => {
                // Order-insensitive, matching IndexMap equality
                let mut acc = 0u64;
                for (k, v) in map {
                    let mut entry = rustc_hash::FxHasher::default();
                    k.hash(&mut entry);
                    v.hash(&mut entry);
                    acc = acc.wrapping_add(entry.finish());
                }
                acc.hash(state);
            }
            Value::Object(instance) => instance_addr(instance).hash(state),
        }
    }
}

/// Float equality for keys: `0.0 == -0.0` and every NaN equals every NaN
pub(crate) fn float_eq(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// Hash consistent with [`float_eq`]
pub(crate) fn hash_float<H: Hasher>(f: f64, state: &mut H) {
    let normalized = if f == 0.0 {
        0.0f64
    } else if f.is_nan() {
        f64::NAN
    } else {
        f
    };
    normalized.to_bits().hash(state);
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<EnumMember> for Value {
    fn from(value: EnumMember) -> Self {
        Value::Enum(value)
    }
}

impl From<Instance> for Value {
    fn from(value: Instance) -> Self {
        Value::Object(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

/// Keyword arguments handed to a constructor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: IndexMap<String, Value>,
}

impl Arguments {
    /// Create empty arguments
    pub fn new() -> Self {
        Self::default()
    }

    /// Arguments holding a single keyword
    pub fn single(name: impl Into<String>, value: Value) -> Self {
        let mut args = Self::new();
        args.insert(name, value);
        args
    }

    /// Add a keyword argument
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Get an argument
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Remove and return an argument
    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.values.shift_remove(name)
    }

    /// Remove a required argument
    pub fn require(&mut self, name: &str) -> Result<Value, String> {
        self.take(name)
            .ok_or_else(|| format!("missing required argument '{name}'"))
    }

    /// Remove an optional integer argument
    pub fn take_int(&mut self, name: &str) -> Result<Option<i64>, String> {
        match self.take(name) {
            None | Some(Value::None) => Ok(None),
            Some(Value::Int(i)) => Ok(Some(i)),
            Some(other) => Err(format!("'{name}' must be an integer, got {}", other.type_label())),
        }
    }

    /// Remove an optional numeric argument
    pub fn take_float(&mut self, name: &str) -> Result<Option<f64>, String> {
        match self.take(name) {
            None | Some(Value::None) => Ok(None),
            Some(v) => v
                .as_float()
                .map(Some)
                .ok_or_else(|| format!("'{name}' must be a number, got {}", v.type_label())),
        }
    }

    /// Remove an optional string argument
    pub fn take_str(&mut self, name: &str) -> Result<Option<String>, String> {
        match self.take(name) {
            None | Some(Value::None) => Ok(None),
            Some(Value::Str(s)) => Ok(Some(s)),
            Some(other) => Err(format!("'{name}' must be a string, got {}", other.type_label())),
        }
    }

    /// Fail on any argument that is still present
    pub fn finish(&self) -> Result<(), String> {
        match self.values.keys().next() {
            Some(name) => Err(format!("unexpected keyword argument '{name}'")),
            None => Ok(()),
        }
    }

    /// Reject unknown keywords and missing required parameters
    pub fn check_signature(&self, signature: &[Parameter]) -> Result<(), String> {
        if let Some(unknown) = self
            .values
            .keys()
            .find(|name| !signature.iter().any(|p| &p.name == *name))
        {
            return Err(format!("unexpected keyword argument '{unknown}'"));
        }
        if let Some(missing) = signature
            .iter()
            .find(|p| p.required && !self.values.contains_key(&p.name))
        {
            return Err(format!("missing required argument '{}'", missing.name));
        }
        Ok(())
    }

    /// Argument names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no arguments
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Underlying map
    pub fn into_inner(self) -> IndexMap<String, Value> {
        self.values
    }
}

impl FromIterator<(String, Value)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Instance backed by a mutable attribute map
pub struct DynObject {
    type_name: String,
    fields: RwLock<IndexMap<String, Value>>,
}

impl DynObject {
    /// Create an instance of `type_name` with the given attributes
    pub fn new(type_name: impl Into<String>, fields: IndexMap<String, Value>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: RwLock::new(fields),
        }
    }

    /// Set an attribute (may create reference cycles)
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.fields.write().insert(name.into(), value);
    }

    /// Remove an attribute
    pub fn remove(&self, name: &str) -> Option<Value> {
        self.fields.write().shift_remove(name)
    }

    /// Attribute names
    pub fn field_names(&self) -> Vec<String> {
        self.fields.read().keys().cloned().collect()
    }

    /// Wrap into a shared instance
    pub fn into_instance(self) -> Instance {
        Arc::new(self)
    }

    /// Wrap into a value
    pub fn into_value(self) -> Value {
        Value::Object(self.into_instance())
    }
}

impl Reflect for DynObject {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        self.fields.read().get(name).cloned()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for DynObject {
    // Attribute values are not printed: instances may reference themselves.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynObject")
            .field("type_name", &self.type_name)
            .field("fields", &self.field_names())
            .finish()
    }
}

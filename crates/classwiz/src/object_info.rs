//! Object Info
//!
//! [`ObjectInfo`] is a not-yet-materialized instance: the class to build,
//! the keyword arguments to build it with and an optional nickname.
//! Argument values are [`InfoValue`]s: scalars, enum members, sequences,
//! nested object infos, or (for cyclic and unknown objects) the raw live
//! instance.
//!
//! Equality compares the class and the data, never the nickname. The hash
//! is computed once; data holding live instances is unhashable and hashes to
//! a shared sentinel, so callers fall back to full equality.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use rustc_hash::FxHasher;

use crate::types::ClassId;
use crate::value::{float_eq, hash_float, instance_addr, same_instance, EnumMember, Instance};

/// Keyword arguments of an object info, in declaration order
pub type ObjectData = IndexMap<String, InfoValue>;

/// Hash written for values holding live instances
const UNHASHABLE: u64 = u64::MAX;

/// Value stored in an object info
#[derive(Debug, Clone)]
pub enum InfoValue {
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
    /// Sequence of values
    List(Vec<InfoValue>),
    /// Nested object info
    Info(Arc<ObjectInfo>),
    /// Raw live instance, kept as-is
    Live(Instance),
}

impl InfoValue {
    /// Short description of the variant
    pub fn type_label(&self) -> &'static str {
        match self {
            InfoValue::None => "None",
            InfoValue::Bool(_) => "bool",
            InfoValue::Int(_) => "int",
            InfoValue::Float(_) => "float",
            InfoValue::Str(_) => "str",
            InfoValue::Enum(_) => "enum",
            InfoValue::List(_) => "list",
            InfoValue::Info(_) => "object info",
            InfoValue::Live(_) => "live object",
        }
    }

    /// Get as nested object info
    pub fn as_info(&self) -> Option<&ObjectInfo> {
        match self {
            InfoValue::Info(info) => Some(info),
            _ => None,
        }
    }

    /// Get as sequence items
    pub fn as_list(&self) -> Option<&[InfoValue]> {
        match self {
            InfoValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            InfoValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            InfoValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Equality that also compares nicknames of nested object infos
    pub fn identical(&self, other: &Self) -> bool {
        match (self, other) {
            (InfoValue::List(a), InfoValue::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.identical(y))
            }
            (InfoValue::Info(a), InfoValue::Info(b)) => a.identical(b),
            _ => self == other,
        }
    }

    /// Whether the value (transitively) holds a live instance
    pub fn contains_live(&self) -> bool {
        self.fingerprint().is_none()
    }

    /// Order-independent content hash; `None` when unhashable
    pub fn fingerprint(&self) -> Option<u64> {
        let mut hasher = FxHasher::default();
        std::mem::discriminant(self).hash(&mut hasher);
        match self {
            InfoValue::None => {}
            InfoValue::Bool(b) => b.hash(&mut hasher),
            InfoValue::Int(i) => i.hash(&mut hasher),
            InfoValue::Float(f) => hash_float(*f, &mut hasher),
            InfoValue::Str(s) => s.hash(&mut hasher),
            InfoValue::Enum(e) => e.hash(&mut hasher),
            InfoValue::List(items) => {
                for item in items {
                    item.fingerprint()?.hash(&mut hasher);
                }
            }
            InfoValue::Info(info) => info.fingerprint()?.hash(&mut hasher),
            InfoValue::Live(_) => return None,
        }
        Some(hasher.finish())
    }
}

impl PartialEq for InfoValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (InfoValue::None, InfoValue::None) => true,
            (InfoValue::Bool(a), InfoValue::Bool(b)) => a == b,
            (InfoValue::Int(a), InfoValue::Int(b)) => a == b,
            (InfoValue::Float(a), InfoValue::Float(b)) => float_eq(*a, *b),
            (InfoValue::Str(a), InfoValue::Str(b)) => a == b,
            (InfoValue::Enum(a), InfoValue::Enum(b)) => a == b,
            (InfoValue::List(a), InfoValue::List(b)) => a == b,
            (InfoValue::Info(a), InfoValue::Info(b)) => Arc::ptr_eq(a, b) || a == b,
            (InfoValue::Live(a), InfoValue::Live(b)) => same_instance(a, b),
            _ => false,
        }
    }
}

impl Eq for InfoValue {}

impl Hash for InfoValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            InfoValue::Live(instance) => instance_addr(instance).hash(state),
            _ => self.fingerprint().unwrap_or(UNHASHABLE).hash(state),
        }
    }
}

impl From<bool> for InfoValue {
    fn from(value: bool) -> Self {
        InfoValue::Bool(value)
    }
}

impl From<i64> for InfoValue {
    fn from(value: i64) -> Self {
        InfoValue::Int(value)
    }
}

impl From<f64> for InfoValue {
    fn from(value: f64) -> Self {
        InfoValue::Float(value)
    }
}

impl From<&str> for InfoValue {
    fn from(value: &str) -> Self {
        InfoValue::Str(value.to_string())
    }
}

impl From<String> for InfoValue {
    fn from(value: String) -> Self {
        InfoValue::Str(value)
    }
}

impl From<EnumMember> for InfoValue {
    fn from(value: EnumMember) -> Self {
        InfoValue::Enum(value)
    }
}

impl From<ObjectInfo> for InfoValue {
    fn from(value: ObjectInfo) -> Self {
        InfoValue::Info(Arc::new(value))
    }
}

impl From<Vec<InfoValue>> for InfoValue {
    fn from(value: Vec<InfoValue>) -> Self {
        InfoValue::List(value)
    }
}

/// Not-yet-materialized instance
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    class: ClassId,
    data: ObjectData,
    nickname: Option<String>,
    fingerprint: OnceCell<Option<u64>>,
    label: OnceCell<String>,
}

impl ObjectInfo {
    /// Object info for `class` built from `data`
    pub fn new(class: ClassId, data: ObjectData) -> Self {
        Self {
            class,
            data,
            nickname: None,
            fingerprint: OnceCell::new(),
            label: OnceCell::new(),
        }
    }

    /// Object info from `(name, value)` pairs
    pub fn from_fields<S, V, I>(class: ClassId, fields: I) -> Self
    where
        S: Into<String>,
        V: Into<InfoValue>,
        I: IntoIterator<Item = (S, V)>,
    {
        let data = fields
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        Self::new(class, data)
    }

    /// Attach a nickname
    pub fn with_nickname(mut self, nickname: Option<String>) -> Self {
        self.nickname = nickname.filter(|n| !n.is_empty());
        self.label = OnceCell::new();
        self
    }

    /// Class to construct
    pub fn class(&self) -> ClassId {
        self.class
    }

    /// Keyword arguments
    pub fn data(&self) -> &ObjectData {
        &self.data
    }

    /// Consume into keyword arguments
    pub fn into_data(self) -> ObjectData {
        self.data
    }

    /// User label
    pub fn nickname(&self) -> Option<&str> {
        self.nickname.as_deref()
    }

    /// One keyword argument
    pub fn get(&self, name: &str) -> Option<&InfoValue> {
        self.data.get(name)
    }

    /// Memoized content hash; `None` when the data holds live instances
    pub fn fingerprint(&self) -> Option<u64> {
        *self.fingerprint.get_or_init(|| {
            let mut acc = 0u64;
            for (name, value) in &self.data {
                let mut entry = FxHasher::default();
                name.hash(&mut entry);
                value.fingerprint()?.hash(&mut entry);
                acc = acc.wrapping_add(entry.finish());
            }
            let mut hasher = FxHasher::default();
            self.class.hash(&mut hasher);
            acc.hash(&mut hasher);
            Some(hasher.finish())
        })
    }

    /// Equality including the nickname, at every level
    pub fn identical(&self, other: &Self) -> bool {
        self.class == other.class
            && self.nickname == other.nickname
            && self.data.len() == other.data.len()
            && self
                .data
                .iter()
                .all(|(name, value)| other.data.get(name).is_some_and(|o| value.identical(o)))
    }

    /// Whether the object info can be used as a cache key
    pub fn is_hashable(&self) -> bool {
        self.fingerprint().is_some()
    }

    pub(crate) fn label_cell(&self) -> &OnceCell<String> {
        &self.label
    }

    /// Wrap into a shared value
    pub fn into_value(self) -> InfoValue {
        InfoValue::Info(Arc::new(self))
    }
}

impl PartialEq for ObjectInfo {
    fn eq(&self, other: &Self) -> bool {
        if self.class != other.class {
            return false;
        }
        if let (Some(a), Some(b)) = (self.fingerprint(), other.fingerprint()) {
            if a != b {
                return false;
            }
        }
        self.data == other.data
    }
}

impl Eq for ObjectInfo {}

impl Hash for ObjectInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint().unwrap_or(UNHASHABLE).hash(state);
    }
}

//! Type Model
//!
//! Classes are described by [`ClassDescriptor`]s stored in a [`TypeRegistry`]
//! and referred to by [`ClassId`] handles. Constructor parameters are
//! annotated with [`TypeExpr`]s, which the [`Resolver`] expands into the
//! concrete [`TypeSet`] a value for that parameter may take.
//!
//! There is no runtime reflection: subclass relationships come from the base
//! classes declared when a class is registered (or from explicit
//! implementation registrations), and constructors are plain callbacks.

mod registry;
mod resolver;

pub use registry::TypeRegistry;
pub use resolver::{Resolver, TypeSet};

use std::fmt;
use std::sync::Arc;

use crate::value::{Arguments, Value};

/// Handle of a registered class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    /// `builtins.int`
    pub const INT: ClassId = ClassId(0);
    /// `builtins.float`
    pub const FLOAT: ClassId = ClassId(1);
    /// `builtins.str`
    pub const STR: ClassId = ClassId(2);
    /// `builtins.bool`
    pub const BOOL: ClassId = ClassId(3);
    /// `builtins.NoneType`
    pub const NONE: ClassId = ClassId(4);
    /// `builtins.dict`
    pub const DICT: ClassId = ClassId(5);
    /// `builtins.list`
    pub const LIST: ClassId = ClassId(6);
    /// `builtins.tuple`
    pub const TUPLE: ClassId = ClassId(7);
    /// `builtins.set`
    pub const SET: ClassId = ClassId(8);

    /// Position of the class in its registry
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Constant usable as a literal annotation member or enum value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Constant {
    /// Boolean constant
    Bool(bool),
    /// Integer constant
    Int(i64),
    /// String constant
    Str(String),
}

impl Constant {
    /// Integer payload, if any
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Constant::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Bool(b) => write!(f, "{b}"),
            Constant::Int(i) => write!(f, "{i}"),
            Constant::Str(s) => write!(f, "'{s}'"),
        }
    }
}

impl From<i64> for Constant {
    fn from(value: i64) -> Self {
        Constant::Int(value)
    }
}

impl From<bool> for Constant {
    fn from(value: bool) -> Self {
        Constant::Bool(value)
    }
}

impl From<&str> for Constant {
    fn from(value: &str) -> Self {
        Constant::Str(value.to_string())
    }
}

/// Declared type of a constructor parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// Plain class (including builtins and bare containers)
    Class(ClassId),
    /// Parameterized generic, e.g. `list[int]` or `Box[T]`
    Generic {
        /// Unparameterized class
        origin: ClassId,
        /// Type arguments in declaration order
        args: Vec<TypeExpr>,
    },
    /// Any of the members
    Union(Vec<TypeExpr>),
    /// One of a fixed set of constants
    Literal(Vec<Constant>),
    /// Generic type variable, substituted by parameterization
    Var(String),
    /// Unresolved forward reference; always rejected by the resolver
    Forward(String),
}

impl TypeExpr {
    /// `int`
    pub const INT: TypeExpr = TypeExpr::Class(ClassId::INT);
    /// `float`
    pub const FLOAT: TypeExpr = TypeExpr::Class(ClassId::FLOAT);
    /// `str`
    pub const STR: TypeExpr = TypeExpr::Class(ClassId::STR);
    /// `bool`
    pub const BOOL: TypeExpr = TypeExpr::Class(ClassId::BOOL);
    /// `NoneType`
    pub const NONE: TypeExpr = TypeExpr::Class(ClassId::NONE);
    /// `dict`
    pub const DICT: TypeExpr = TypeExpr::Class(ClassId::DICT);

    /// Plain class annotation
    pub fn class(id: ClassId) -> Self {
        TypeExpr::Class(id)
    }

    /// `Union[...]` of the given members
    pub fn union(members: impl IntoIterator<Item = TypeExpr>) -> Self {
        TypeExpr::Union(members.into_iter().collect())
    }

    /// `Union[inner, None]`
    pub fn optional(inner: TypeExpr) -> Self {
        TypeExpr::Union(vec![inner, TypeExpr::NONE])
    }

    /// `list[item]`
    pub fn list_of(item: TypeExpr) -> Self {
        TypeExpr::generic(ClassId::LIST, [item])
    }

    /// `origin[args...]`
    pub fn generic(origin: ClassId, args: impl IntoIterator<Item = TypeExpr>) -> Self {
        TypeExpr::Generic {
            origin,
            args: args.into_iter().collect(),
        }
    }

    /// `Literal[...]`
    pub fn literal(values: impl IntoIterator<Item = Constant>) -> Self {
        TypeExpr::Literal(values.into_iter().collect())
    }

    /// Type variable `name`
    pub fn var(name: impl Into<String>) -> Self {
        TypeExpr::Var(name.into())
    }

    /// String annotation
    pub fn forward(name: impl Into<String>) -> Self {
        TypeExpr::Forward(name.into())
    }

    /// Class behind a plain or generic annotation
    pub fn origin(&self) -> Option<ClassId> {
        match self {
            TypeExpr::Class(id) => Some(*id),
            TypeExpr::Generic { origin, .. } => Some(*origin),
            _ => None,
        }
    }

    /// Type arguments of a generic annotation (empty otherwise)
    pub fn args(&self) -> &[TypeExpr] {
        match self {
            TypeExpr::Generic { args, .. } => args,
            _ => &[],
        }
    }

    /// Replace type variables using `lookup`
    pub fn substitute(&self, lookup: &dyn Fn(&str) -> Option<TypeExpr>) -> TypeExpr {
        match self {
            TypeExpr::Var(name) => lookup(name).unwrap_or_else(|| self.clone()),
            TypeExpr::Generic { origin, args } => TypeExpr::Generic {
                origin: *origin,
                args: args.iter().map(|a| a.substitute(lookup)).collect(),
            },
            TypeExpr::Union(members) => {
                TypeExpr::Union(members.iter().map(|m| m.substitute(lookup)).collect())
            }
            _ => self.clone(),
        }
    }
}

impl From<ClassId> for TypeExpr {
    fn from(id: ClassId) -> Self {
        TypeExpr::Class(id)
    }
}

/// Enum members and flag semantics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    /// `(name, value)` pairs in declaration order
    pub members: Vec<(String, Constant)>,
    /// Members are bit flags that combine with `|`
    pub flag: bool,
}

impl EnumDescriptor {
    /// Name of the member carrying `value`
    pub fn member_name(&self, value: &Constant) -> Option<&str> {
        self.members
            .iter()
            .find(|(_, v)| v == value)
            .map(|(name, _)| name.as_str())
    }

    /// Value of the member called `name`
    pub fn member_value(&self, name: &str) -> Option<&Constant> {
        self.members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Union of all flag bits
    pub fn flag_mask(&self) -> i64 {
        self.members
            .iter()
            .filter_map(|(_, v)| v.as_int())
            .fold(0, |acc, bits| acc | bits)
    }

    /// Whether `value` is a member value (or, for flags, a combination of them)
    pub fn accepts(&self, value: &Constant) -> bool {
        if self.flag {
            match value {
                Constant::Int(bits) => bits & !self.flag_mask() == 0,
                _ => false,
            }
        } else {
            self.member_name(value).is_some()
        }
    }

    /// Names of the flags whose bits are all set in `bits`
    pub fn flag_names(&self, bits: i64) -> Vec<&str> {
        self.members
            .iter()
            .filter_map(|(name, v)| {
                let member = v.as_int()?;
                (member != 0 && bits & member == member).then_some(name.as_str())
            })
            .collect()
    }
}

/// What sort of thing a class is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassKind {
    /// Scalar builtin (`int`, `float`, `str`, `bool`, `NoneType`)
    Primitive,
    /// Keyword mapping (`dict`)
    Mapping,
    /// Iterable container; its type arguments are element alternatives
    Sequence,
    /// Ordinary class built from keyword arguments
    Struct,
    /// Callable whose keyword arguments are edited like a class
    Function,
    /// Enumeration
    Enum(EnumDescriptor),
}

/// One constructor parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Declared type
    pub annotation: TypeExpr,
    /// Whether construction fails without it
    pub required: bool,
}

/// Constructor callback; the error string is reported to the user
pub type Constructor = Arc<dyn Fn(Arguments) -> Result<Value, String> + Send + Sync>;

/// Registered class
#[derive(Clone)]
pub struct ClassDescriptor {
    /// Handle inside the owning registry
    pub id: ClassId,
    /// Defining module, e.g. `shapes` or `app.models`
    pub module: String,
    /// Class name inside the module
    pub name: String,
    /// Kind of class
    pub kind: ClassKind,
    /// Cannot be instantiated directly
    pub is_abstract: bool,
    /// Part of the builtin set; never expanded polymorphically
    pub builtin: bool,
    /// Class this one transparently wraps
    pub wraps: Option<ClassId>,
    /// Declared base classes
    pub bases: Vec<ClassId>,
    /// Reflected constructor signature; `None` when not introspectable
    pub signature: Option<Vec<Parameter>>,
    /// Generic type parameter names, in order
    pub type_params: Vec<String>,
    /// Parameters whose values are masked in displays
    pub passwords: Vec<String>,
    pub(crate) constructor: Option<Constructor>,
}

impl ClassDescriptor {
    /// `<module>.<name>`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }

    /// Has generic type parameters
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    /// Enum description, if this is an enum
    pub fn enum_descriptor(&self) -> Option<&EnumDescriptor> {
        match &self.kind {
            ClassKind::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Non-builtin class whose constructor takes no arguments.
    ///
    /// Only the signature is checked; [`Registry::is_singleton`] also
    /// consults registered annotations.
    ///
    /// [`Registry::is_singleton`]: crate::registry::Registry::is_singleton
    pub fn is_singleton(&self) -> bool {
        !self.builtin
            && matches!(self.kind, ClassKind::Struct)
            && self.signature.as_ref().is_some_and(|s| s.is_empty())
    }

    /// Whether a constructor is attached
    pub fn is_constructible(&self) -> bool {
        self.constructor.is_some()
    }

    /// Invoke the constructor
    pub fn construct(&self, args: Arguments) -> Result<Value, String> {
        match &self.constructor {
            Some(constructor) => constructor(args),
            None => Err(format!("{} has no constructor", self.qualified_name())),
        }
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("id", &self.id)
            .field("module", &self.module)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("is_abstract", &self.is_abstract)
            .field("builtin", &self.builtin)
            .field("wraps", &self.wraps)
            .field("bases", &self.bases)
            .field("signature", &self.signature)
            .field("type_params", &self.type_params)
            .finish_non_exhaustive()
    }
}

/// How a registered class gets constructed
#[derive(Clone, Default)]
pub(crate) enum ConstructorSpec {
    #[default]
    None,
    /// Check the arguments against the signature and build a `DynObject`
    Dynamic,
    Custom(Constructor),
}

/// Builder describing a class to register
#[derive(Clone)]
pub struct ClassSpec {
    pub(crate) module: String,
    pub(crate) name: String,
    pub(crate) kind: ClassKind,
    pub(crate) is_abstract: bool,
    pub(crate) builtin: bool,
    pub(crate) wraps: Option<ClassId>,
    pub(crate) bases: Vec<ClassId>,
    pub(crate) signature: Option<Vec<Parameter>>,
    pub(crate) type_params: Vec<String>,
    pub(crate) passwords: Vec<String>,
    pub(crate) constructor: ConstructorSpec,
}

impl ClassSpec {
    fn with_kind(module: &str, name: &str, kind: ClassKind) -> Self {
        Self {
            module: module.to_string(),
            name: name.to_string(),
            kind,
            is_abstract: false,
            builtin: false,
            wraps: None,
            bases: Vec::new(),
            signature: Some(Vec::new()),
            type_params: Vec::new(),
            passwords: Vec::new(),
            constructor: ConstructorSpec::None,
        }
    }

    /// Ordinary class
    pub fn structure(module: &str, name: &str) -> Self {
        Self::with_kind(module, name, ClassKind::Struct)
    }

    /// Callable edited through its keyword arguments
    pub fn function(module: &str, name: &str) -> Self {
        Self::with_kind(module, name, ClassKind::Function)
    }

    /// Iterable container class
    pub fn sequence(module: &str, name: &str) -> Self {
        Self::with_kind(module, name, ClassKind::Sequence).no_signature()
    }

    /// Enumeration with the given `(name, value)` members
    pub fn enumeration<N, V>(module: &str, name: &str, members: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<Constant>,
    {
        let members = members
            .into_iter()
            .map(|(n, v)| (n.into(), v.into()))
            .collect();
        Self::with_kind(
            module,
            name,
            ClassKind::Enum(EnumDescriptor {
                members,
                flag: false,
            }),
        )
        .no_signature()
    }

    /// Bit-flag enumeration
    pub fn flags<N: Into<String>>(module: &str, name: &str, members: impl IntoIterator<Item = (N, i64)>) -> Self {
        let members = members
            .into_iter()
            .map(|(n, v)| (n.into(), Constant::Int(v)))
            .collect();
        Self::with_kind(
            module,
            name,
            ClassKind::Enum(EnumDescriptor {
                members,
                flag: true,
            }),
        )
        .no_signature()
    }

    pub(crate) fn builtin(name: &str, kind: ClassKind) -> Self {
        let mut spec = Self::with_kind("builtins", name, kind).no_signature();
        spec.builtin = true;
        spec
    }

    /// Add a required parameter
    pub fn param(mut self, name: &str, annotation: TypeExpr) -> Self {
        self.signature.get_or_insert_with(Vec::new).push(Parameter {
            name: name.to_string(),
            annotation,
            required: true,
        });
        self
    }

    /// Add a parameter that has a default
    pub fn optional_param(mut self, name: &str, annotation: TypeExpr) -> Self {
        self.signature.get_or_insert_with(Vec::new).push(Parameter {
            name: name.to_string(),
            annotation,
            required: false,
        });
        self
    }

    /// Mark the signature as not introspectable
    pub fn no_signature(mut self) -> Self {
        self.signature = None;
        self
    }

    /// Declare a base class
    pub fn extends(mut self, base: ClassId) -> Self {
        self.bases.push(base);
        self
    }

    /// Declare the class abstract
    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Declare this class a transparent wrapper of `inner`
    pub fn wraps(mut self, inner: ClassId) -> Self {
        self.wraps = Some(inner);
        self
    }

    /// Generic type parameters
    pub fn type_params<S: Into<String>>(mut self, params: impl IntoIterator<Item = S>) -> Self {
        self.type_params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Parameters to mask when displaying
    pub fn passwords<S: Into<String>>(mut self, params: impl IntoIterator<Item = S>) -> Self {
        self.passwords = params.into_iter().map(Into::into).collect();
        self
    }

    /// Build instances as `DynObject`s after checking the signature
    pub fn dynamic(mut self) -> Self {
        self.constructor = ConstructorSpec::Dynamic;
        self
    }

    /// Custom constructor
    pub fn constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn(Arguments) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.constructor = ConstructorSpec::Custom(Arc::new(constructor));
        self
    }

    /// `<module>.<name>`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_nested_vars() {
        let expr = TypeExpr::union([TypeExpr::list_of(TypeExpr::var("T")), TypeExpr::var("U")]);
        let out = expr.substitute(&|name| (name == "T").then_some(TypeExpr::INT));
        assert_eq!(
            out,
            TypeExpr::union([TypeExpr::list_of(TypeExpr::INT), TypeExpr::var("U")])
        );
    }

    #[test]
    fn test_flag_descriptor() {
        let desc = EnumDescriptor {
            members: vec![
                ("READ".to_string(), Constant::Int(1)),
                ("WRITE".to_string(), Constant::Int(2)),
                ("EXEC".to_string(), Constant::Int(4)),
            ],
            flag: true,
        };
        assert_eq!(desc.flag_mask(), 7);
        assert!(desc.accepts(&Constant::Int(3)));
        assert!(!desc.accepts(&Constant::Int(8)));
        assert_eq!(desc.flag_names(5), vec!["READ", "EXEC"]);
    }

    #[test]
    fn test_singleton_detection() {
        let marker = ClassDescriptor {
            id: ClassId(42),
            module: "app".into(),
            name: "Missing".into(),
            kind: ClassKind::Struct,
            is_abstract: false,
            builtin: false,
            wraps: None,
            bases: vec![],
            signature: Some(vec![]),
            type_params: vec![],
            passwords: vec![],
            constructor: None,
        };
        assert!(marker.is_singleton());

        let opaque = ClassDescriptor {
            signature: None,
            ..marker.clone()
        };
        assert!(!opaque.is_singleton());
        assert!(marker.construct(Arguments::new()).is_err());
    }
}

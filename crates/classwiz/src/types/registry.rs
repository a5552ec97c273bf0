//! Class Registry
//!
//! Owns every [`ClassDescriptor`] and the implementations index used for
//! polymorphism expansion. Builtins occupy the fixed ids declared on
//! [`ClassId`].

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::{ClassDescriptor, ClassId, ClassKind, ClassSpec, Constructor, ConstructorSpec, Parameter};
use crate::value::{Arguments, DynObject, Value};

/// Registry of class descriptors
#[derive(Debug)]
pub struct TypeRegistry {
    /// Descriptors indexed by class ID
    classes: Vec<Arc<ClassDescriptor>>,
    /// Qualified name to class ID
    by_name: FxHashMap<String, ClassId>,
    /// Base class ID to the classes declaring themselves implementations of it
    implementations: FxHashMap<ClassId, Vec<ClassId>>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create a registry holding only the builtin classes
    pub fn new() -> Self {
        let mut registry = Self {
            classes: Vec::new(),
            by_name: FxHashMap::default(),
            implementations: FxHashMap::default(),
        };

        let builtins = [
            (ClassId::INT, "int", ClassKind::Primitive),
            (ClassId::FLOAT, "float", ClassKind::Primitive),
            (ClassId::STR, "str", ClassKind::Primitive),
            (ClassId::BOOL, "bool", ClassKind::Primitive),
            (ClassId::NONE, "NoneType", ClassKind::Primitive),
            (ClassId::DICT, "dict", ClassKind::Mapping),
            (ClassId::LIST, "list", ClassKind::Sequence),
            (ClassId::TUPLE, "tuple", ClassKind::Sequence),
            (ClassId::SET, "set", ClassKind::Sequence),
        ];
        for (expected, name, kind) in builtins {
            let spec = ClassSpec::builtin(name, kind).constructor({
                let ctor = builtin_constructor(expected);
                move |args| ctor(args)
            });
            let id = registry.register(spec);
            debug_assert_eq!(id, expected);
        }

        registry
    }

    /// Register a class, returning its handle.
    ///
    /// Registering a qualified name that already exists replaces the
    /// descriptor but keeps the handle.
    pub fn register(&mut self, spec: ClassSpec) -> ClassId {
        let qualified = spec.qualified_name();
        let id = match self.by_name.get(&qualified) {
            Some(&existing) => {
                let old_bases = self.classes[existing.index()].bases.clone();
                for base in old_bases {
                    if let Some(list) = self.implementations.get_mut(&base) {
                        list.retain(|&c| c != existing);
                    }
                }
                existing
            }
            None => ClassId(self.classes.len() as u32),
        };

        let constructor = match spec.constructor {
            ConstructorSpec::None => None,
            ConstructorSpec::Custom(f) => Some(f),
            ConstructorSpec::Dynamic => Some(dynamic_constructor(
                qualified.clone(),
                spec.signature.clone().unwrap_or_default(),
            )),
        };

        let descriptor = Arc::new(ClassDescriptor {
            id,
            module: spec.module,
            name: spec.name,
            kind: spec.kind,
            is_abstract: spec.is_abstract,
            builtin: spec.builtin,
            wraps: spec.wraps,
            bases: spec.bases,
            signature: spec.signature,
            type_params: spec.type_params,
            passwords: spec.passwords,
            constructor,
        });

        for &base in &descriptor.bases {
            self.add_implementation(base, id);
        }

        if id.index() == self.classes.len() {
            self.classes.push(descriptor);
        } else {
            self.classes[id.index()] = descriptor;
        }
        self.by_name.insert(qualified, id);
        id
    }

    /// Record `implementation` as a subclass of `base`
    pub fn add_implementation(&mut self, base: ClassId, implementation: ClassId) {
        let list = self.implementations.entry(base).or_default();
        if !list.contains(&implementation) {
            list.push(implementation);
        }
    }

    /// Get a class descriptor
    pub fn get(&self, id: ClassId) -> Option<&Arc<ClassDescriptor>> {
        self.classes.get(id.index())
    }

    /// Lookup a class by `<module>.<name>`
    pub fn lookup(&self, qualified: &str) -> Option<ClassId> {
        self.by_name.get(qualified).copied()
    }

    /// Direct implementations of `base`, in registration order
    pub fn implementations(&self, base: ClassId) -> &[ClassId] {
        self.implementations
            .get(&base)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterate over all descriptors
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ClassDescriptor>> {
        self.classes.iter()
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Constructor that validates keyword arguments against `signature`
fn dynamic_constructor(qualified: String, signature: Vec<Parameter>) -> Constructor {
    Arc::new(move |args: Arguments| {
        args.check_signature(&signature)?;
        Ok(DynObject::new(qualified.clone(), args.into_inner()).into_value())
    })
}

fn builtin_constructor(id: ClassId) -> Constructor {
    Arc::new(move |mut args: Arguments| {
        if id == ClassId::DICT {
            return Ok(Value::Dict(args.into_inner()));
        }

        let value = args.take("value");
        if let Some(unexpected) = args.names().next() {
            return Err(format!("unexpected keyword argument '{unexpected}'"));
        }

        match (id, value) {
            (ClassId::INT, None) => Ok(Value::Int(0)),
            (ClassId::INT, Some(Value::Int(i))) => Ok(Value::Int(i)),
            (ClassId::INT, Some(Value::Bool(b))) => Ok(Value::Int(b as i64)),
            (ClassId::INT, Some(Value::Float(f))) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
            (ClassId::INT, Some(Value::Str(s))) => s
                .trim()
                .parse()
                .map(Value::Int)
                .map_err(|_| format!("invalid literal for int: '{s}'")),

            (ClassId::FLOAT, None) => Ok(Value::Float(0.0)),
            (ClassId::FLOAT, Some(Value::Float(f))) => Ok(Value::Float(f)),
            (ClassId::FLOAT, Some(Value::Int(i))) => Ok(Value::Float(i as f64)),
            (ClassId::FLOAT, Some(Value::Str(s))) => s
                .trim()
                .parse()
                .map(Value::Float)
                .map_err(|_| format!("could not convert string to float: '{s}'")),

            (ClassId::STR, None) => Ok(Value::Str(String::new())),
            (ClassId::STR, Some(Value::Str(s))) => Ok(Value::Str(s)),
            (ClassId::STR, Some(Value::Int(i))) => Ok(Value::Str(i.to_string())),
            (ClassId::STR, Some(Value::Float(f))) => Ok(Value::Str(f.to_string())),
            (ClassId::STR, Some(Value::Bool(b))) => Ok(Value::Str(b.to_string())),

            (ClassId::BOOL, None) => Ok(Value::Bool(false)),
            (ClassId::BOOL, Some(Value::Bool(b))) => Ok(Value::Bool(b)),
            (ClassId::BOOL, Some(Value::Int(i))) => Ok(Value::Bool(i != 0)),

            (ClassId::LIST | ClassId::TUPLE | ClassId::SET, None) => Ok(Value::List(Vec::new())),
            (ClassId::LIST | ClassId::TUPLE | ClassId::SET, Some(Value::List(items))) => {
                Ok(Value::List(items))
            }

            (_, Some(other)) => Err(format!("cannot convert {} value", other.type_label())),
            (_, None) => Err("missing argument 'value'".to_string()),
        }
    })
}

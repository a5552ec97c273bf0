//! Registry Context
//!
//! A [`Registry`] bundles every process-wide table the resolver, converter
//! and forms consult: the class registry, aliases, annotation overrides,
//! attribute-source rules, deprecation markers and custom display callbacks.
//!
//! Registries are explicit values so tests can build isolated instances;
//! [`Registry::global`] holds the default one with the standard types
//! installed. Every mutation bumps [`Registry::generation`], which converter
//! caches use to discard results computed against older registrations.

mod aliasing;
mod annotations;
mod deprecation;
mod rules;

pub use deprecation::{Deprecation, DeprecationQuery};
pub use rules::AttributeSource;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::ResolveError;
use crate::object_info::ObjectInfo;
use crate::types::{ClassDescriptor, ClassId, ClassSpec, Resolver, TypeExpr, TypeRegistry, TypeSet};
use crate::value::{EnumMember, Value};

use deprecation::DeprecationTable;

/// Custom display callback for object infos of one class
pub type ReprFn = Arc<dyn Fn(&ObjectInfo) -> String + Send + Sync>;

static GLOBAL: Lazy<Arc<Registry>> = Lazy::new(|| {
    let registry = Registry::new();
    crate::stdtypes::install(&registry);
    Arc::new(registry)
});

/// Registry context shared by the resolver, converter and forms
pub struct Registry {
    types: RwLock<TypeRegistry>,
    aliases: RwLock<FxHashMap<ClassId, String>>,
    annotations: RwLock<FxHashMap<ClassId, IndexMap<String, TypeExpr>>>,
    rules: RwLock<FxHashMap<ClassId, IndexMap<String, AttributeSource>>>,
    deprecations: RwLock<DeprecationTable>,
    reprs: RwLock<FxHashMap<ClassId, ReprFn>>,
    generation: AtomicU64,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("classes", &self.types.read().len())
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Create a registry holding only the builtin classes
    pub fn new() -> Self {
        Self {
            types: RwLock::new(TypeRegistry::new()),
            aliases: RwLock::new(FxHashMap::default()),
            annotations: RwLock::new(FxHashMap::default()),
            rules: RwLock::new(FxHashMap::default()),
            deprecations: RwLock::new(DeprecationTable::default()),
            reprs: RwLock::new(FxHashMap::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Create a registry with the standard types installed
    pub fn standard() -> Self {
        let registry = Self::new();
        crate::stdtypes::install(&registry);
        registry
    }

    /// The process-wide default registry
    pub fn global() -> Arc<Registry> {
        Arc::clone(&GLOBAL)
    }

    /// Mutation counter
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn touch(&self, what: &str) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(generation, what, "registry updated");
    }

    // ========================================================================
    // Classes
    // ========================================================================

    /// Register a class and link it below its declared bases
    pub fn register_class(&self, spec: ClassSpec) -> ClassId {
        let id = self.types.write().register(spec);
        self.touch("class");
        id
    }

    /// Declare `implementation` a subclass of `base` after the fact
    pub fn register_implementation(&self, base: ClassId, implementation: ClassId) {
        self.types.write().add_implementation(base, implementation);
        self.touch("implementation");
    }

    /// Descriptor of `id`
    pub fn class(&self, id: ClassId) -> Option<Arc<ClassDescriptor>> {
        self.types.read().get(id).cloned()
    }

    /// Lookup a class by `<module>.<name>`
    pub fn lookup(&self, qualified: &str) -> Option<ClassId> {
        self.types.read().lookup(qualified)
    }

    /// Direct implementations of `base`
    pub fn implementations(&self, base: ClassId) -> Vec<ClassId> {
        self.types.read().implementations(base).to_vec()
    }

    /// Every implementation of `base`, transitively, without `base` itself
    pub fn all_implementations(&self, base: ClassId) -> Vec<ClassId> {
        let types = self.types.read();
        let mut found = Vec::new();
        let mut stack = vec![base];
        while let Some(id) = stack.pop() {
            for &child in types.implementations(id) {
                if child != base && !found.contains(&child) {
                    found.push(child);
                    stack.push(child);
                }
            }
        }
        found
    }

    /// Snapshot of every registered class
    pub fn classes(&self) -> Vec<Arc<ClassDescriptor>> {
        self.types.read().iter().cloned().collect()
    }

    /// Class of a live value
    pub fn class_of(&self, value: &Value) -> Option<ClassId> {
        match value {
            Value::None => Some(ClassId::NONE),
            Value::Bool(_) => Some(ClassId::BOOL),
            Value::Int(_) => Some(ClassId::INT),
            Value::Float(_) => Some(ClassId::FLOAT),
            Value::Str(_) => Some(ClassId::STR),
            Value::Enum(member) => Some(member.class),
            Value::List(_) => Some(ClassId::LIST),
            Value::Dict(_) => Some(ClassId::DICT),
            Value::Object(instance) => self.lookup(instance.type_name()),
        }
    }

    /// Whether instances of `class` are singleton markers.
    ///
    /// The constructor takes no arguments and no annotations were
    /// registered for the class either.
    pub fn is_singleton(&self, class: ClassId) -> bool {
        self.class(class).is_some_and(|desc| desc.is_singleton())
            && self.annotations(&TypeExpr::class(class)).is_empty()
    }

    /// Member `name` of enum class `class`
    pub fn enum_member(&self, class: ClassId, name: &str) -> Option<EnumMember> {
        let desc = self.class(class)?;
        let value = desc.enum_descriptor()?.member_value(name)?.clone();
        Some(EnumMember { class, value })
    }

    /// Expand `annotation` into its concrete type set
    pub fn resolve(&self, annotation: &TypeExpr) -> Result<TypeSet, ResolveError> {
        Resolver::new(self).resolve(annotation)
    }

    // ========================================================================
    // Display callbacks
    // ========================================================================

    /// Register a custom display for object infos of `class`.
    ///
    /// With `inherited`, every implementation known at this point gets the
    /// same callback.
    pub fn register_repr<F>(&self, class: ClassId, repr: F, inherited: bool)
    where
        F: Fn(&ObjectInfo) -> String + Send + Sync + 'static,
    {
        let repr: ReprFn = Arc::new(repr);
        let mut targets = vec![class];
        if inherited {
            targets.extend(self.all_implementations(class));
        }

        let mut reprs = self.reprs.write();
        for target in targets {
            reprs.insert(target, Arc::clone(&repr));
        }
        drop(reprs);
        self.touch("repr");
    }

    /// Custom display registered for `class`
    pub fn custom_repr(&self, class: ClassId) -> Option<ReprFn> {
        self.reprs.read().get(&class).cloned()
    }
}

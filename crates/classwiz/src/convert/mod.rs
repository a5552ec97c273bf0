//! Converter
//!
//! Moves values between their three shapes:
//!
//! - live [`Value`]s, built by class constructors
//! - [`ObjectInfo`] trees, the form-editable intermediate representation
//! - JSON templates and reconstruction scripts
//!
//! | Operation | From | To | Memoized |
//! |-----------|------|----|----------|
//! | [`Converter::materialize`] | object info | live value | no (see [`Converter::materialize_cached`]) |
//! | [`Converter::decompose`] | live value | object info | yes |
//! | [`Converter::to_dict`] | object info | JSON | yes |
//! | [`Converter::from_dict`] | JSON | object info | yes |
//! | [`Converter::to_script`] | object info | script text | yes |
//!
//! Caches are bounded LRU maps sized by [`CacheConfig`] and are flushed when
//! the registry generation changes.

mod decompose;
mod dict;
mod materialize;
mod script;

pub use dict::Decoded;
pub use script::Script;

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::{Mutex, MutexGuard};
use tracing::debug;

use crate::cache::LruCache;
use crate::config::{CacheConfig, ClasswizConfig};
use crate::extensions::ExtensionPoint;
use crate::object_info::{InfoValue, ObjectInfo};
use crate::registry::Registry;
use crate::types::TypeExpr;
use crate::value::Value;

static GLOBAL: Lazy<Arc<Converter>> =
    Lazy::new(|| Arc::new(Converter::new(Registry::global(), ClasswizConfig::default())));

/// Extension points around converter and form operations
#[derive(Debug, Default)]
pub struct Hooks {
    /// Around [`Converter::decompose`]
    pub decompose: ExtensionPoint<Value, InfoValue>,
    /// Around loading an object info into a struct form
    pub form_load: ExtensionPoint<ObjectInfo, ()>,
    /// Around building an object info from a struct form
    pub form_commit: ExtensionPoint<TypeExpr, ObjectInfo>,
}

/// Cache key for outputs that show nicknames or field order: object infos
/// match only field by field in the same order, nicknames included
#[derive(Clone)]
struct ExactKey(InfoValue);

impl PartialEq for ExactKey {
    fn eq(&self, other: &Self) -> bool {
        same_layout(&self.0, &other.0)
    }
}

fn same_layout(a: &InfoValue, b: &InfoValue) -> bool {
    match (a, b) {
        (InfoValue::List(a), InfoValue::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_layout(x, y))
        }
        (InfoValue::Info(a), InfoValue::Info(b)) => {
            a.class() == b.class()
                && a.nickname() == b.nickname()
                && a.data().len() == b.data().len()
                && a
                    .data()
                    .iter()
                    .zip(b.data())
                    .all(|((ka, va), (kb, vb))| ka == kb && same_layout(va, vb))
        }
        _ => a == b,
    }
}

impl Eq for ExactKey {}

impl Hash for ExactKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

struct Caches {
    generation: u64,
    decompose: LruCache<Value, InfoValue>,
    to_dict: LruCache<ExactKey, serde_json::Value>,
    from_dict: LruCache<String, Decoded>,
    script: LruCache<ExactKey, Script>,
    materialize: LruCache<InfoValue, Value>,
}

impl Caches {
    fn new(config: &CacheConfig, generation: u64) -> Self {
        Self {
            generation,
            decompose: LruCache::new(config.decompose_capacity),
            to_dict: LruCache::new(config.dict_capacity),
            from_dict: LruCache::new(config.from_dict_capacity),
            script: LruCache::new(config.script_capacity),
            materialize: LruCache::new(config.materialize_capacity),
        }
    }

    fn clear(&mut self) {
        self.decompose.clear();
        self.to_dict.clear();
        self.from_dict.clear();
        self.script.clear();
        self.materialize.clear();
    }
}

/// Conversion engine bound to a registry
pub struct Converter {
    registry: Arc<Registry>,
    config: ClasswizConfig,
    caches: Mutex<Caches>,
    hooks: Hooks,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Converter {
    /// Create a converter over `registry`
    pub fn new(registry: Arc<Registry>, config: ClasswizConfig) -> Self {
        let caches = Caches::new(&config.cache, registry.generation());
        Self {
            registry,
            config,
            caches: Mutex::new(caches),
            hooks: Hooks::default(),
        }
    }

    /// Converter over the global registry with default configuration
    pub fn global() -> Arc<Converter> {
        Arc::clone(&GLOBAL)
    }

    /// Registry consulted by every operation
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Shared handle to the registry
    pub fn registry_arc(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Active configuration
    pub fn config(&self) -> &ClasswizConfig {
        &self.config
    }

    /// Extension points
    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Drop every memoized result
    pub fn clear_caches(&self) {
        self.caches.lock().clear();
    }

    /// Lock the caches, flushing them if the registry changed since they
    /// were filled. Never hold the guard across a recursive conversion.
    fn caches(&self) -> MutexGuard<'_, Caches> {
        let mut caches = self.caches.lock();
        let generation = self.registry.generation();
        if caches.generation != generation {
            debug!(
                from = caches.generation,
                to = generation,
                "registry changed, flushing converter caches"
            );
            caches.clear();
            caches.generation = generation;
        }
        caches
    }
}

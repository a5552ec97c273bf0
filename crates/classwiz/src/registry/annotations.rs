//! Annotations
//!
//! Parameter name to type mappings for a class or parameterized generic:
//! the reflected constructor signature with type variables substituted,
//! merged with overrides registered through
//! [`Registry::register_annotations`]. Overrides win on collisions.

use indexmap::IndexMap;

use super::Registry;
use crate::types::{ClassId, TypeExpr};

/// Pseudo-parameter never reported as a field
const RETURN: &str = "return";

impl Registry {
    /// Add or override parameter annotations of `class`
    pub fn register_annotations<S, I>(&self, class: ClassId, mapping: I)
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, TypeExpr)>,
    {
        let mut annotations = self.annotations.write();
        let entry = annotations.entry(class).or_default();
        for (name, ty) in mapping {
            entry.insert(name.into(), ty);
        }
        drop(annotations);
        self.touch("annotations");
    }

    /// Parameter annotations of `ty`.
    ///
    /// Empty when the type cannot be introspected; such types cannot be
    /// edited structurally.
    pub fn annotations(&self, ty: &TypeExpr) -> IndexMap<String, TypeExpr> {
        let Some(origin) = ty.origin() else {
            return IndexMap::new();
        };

        let mut out = IndexMap::new();
        if let Some(desc) = self.class(origin) {
            if let Some(signature) = &desc.signature {
                let args = ty.args();
                let lookup = |name: &str| {
                    desc.type_params
                        .iter()
                        .position(|p| p == name)
                        .and_then(|i| args.get(i).cloned())
                };
                for param in signature {
                    out.insert(param.name.clone(), param.annotation.substitute(&lookup));
                }
            }
        }

        if let Some(overrides) = self.annotations.read().get(&origin) {
            for (name, annotation) in overrides {
                out.insert(name.clone(), annotation.clone());
            }
        }

        out.shift_remove(RETURN);
        out
    }
}

//! Deprecation markers for classes, parameters and parameter types.
//!
//! Deprecated items stay fully functional; forms only list them after the
//! regular ones.

use rustc_hash::{FxHashMap, FxHashSet};

use super::Registry;
use crate::types::{ClassId, TypeExpr};

/// What to mark deprecated under a class
#[derive(Debug, Clone, PartialEq)]
pub enum Deprecation {
    /// The class itself, everywhere
    Class,
    /// One parameter of the class
    Parameter(String),
    /// Some accepted types of one parameter
    ParameterTypes(String, Vec<TypeExpr>),
}

/// What to check under a class
#[derive(Debug, Clone, Copy)]
pub enum DeprecationQuery<'a> {
    /// The class itself
    Class,
    /// One parameter
    Parameter(&'a str),
    /// One type accepted by a parameter
    ParameterType(&'a str, &'a TypeExpr),
}

#[derive(Debug, Default)]
pub(super) struct DeprecationTable {
    classes: FxHashSet<ClassId>,
    parameters: FxHashMap<ClassId, FxHashSet<String>>,
    parameter_types: FxHashMap<(ClassId, String), Vec<TypeExpr>>,
}

impl Registry {
    /// Record a deprecation marker on `class`
    pub fn register_deprecated(&self, class: ClassId, what: Deprecation) {
        let mut table = self.deprecations.write();
        match what {
            Deprecation::Class => {
                table.classes.insert(class);
            }
            Deprecation::Parameter(name) => {
                table.parameters.entry(class).or_default().insert(name);
            }
            Deprecation::ParameterTypes(name, types) => {
                let entry = table.parameter_types.entry((class, name)).or_default();
                for ty in types {
                    if !entry.contains(&ty) {
                        entry.push(ty);
                    }
                }
            }
        }
        drop(table);
        self.touch("deprecation");
    }

    /// Check a deprecation marker.
    ///
    /// A parameter type also counts as deprecated when its class is
    /// deprecated globally.
    pub fn is_deprecated(&self, class: ClassId, query: DeprecationQuery<'_>) -> bool {
        let table = self.deprecations.read();
        match query {
            DeprecationQuery::Class => table.classes.contains(&class),
            DeprecationQuery::Parameter(name) => table
                .parameters
                .get(&class)
                .is_some_and(|params| params.contains(name)),
            DeprecationQuery::ParameterType(name, ty) => {
                ty.origin().is_some_and(|origin| table.classes.contains(&origin))
                    || table
                        .parameter_types
                        .get(&(class, name.to_string()))
                        .is_some_and(|types| types.contains(ty))
            }
        }
    }

    /// Deprecated types registered for parameter `name` of `class`
    pub fn deprecated_types(&self, class: ClassId, name: &str) -> Vec<TypeExpr> {
        self.deprecations
            .read()
            .parameter_types
            .get(&(class, name.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClassSpec;

    #[test]
    fn test_class_and_parameter_markers() {
        let registry = Registry::new();
        let old = registry.register_class(ClassSpec::structure("app", "Old"));
        let client = registry.register_class(
            ClassSpec::structure("app", "Client")
                .param("token", TypeExpr::STR)
                .param("timeout", TypeExpr::INT),
        );

        registry.register_deprecated(old, Deprecation::Class);
        registry.register_deprecated(client, Deprecation::Parameter("timeout".into()));

        assert!(registry.is_deprecated(old, DeprecationQuery::Class));
        assert!(!registry.is_deprecated(client, DeprecationQuery::Class));
        assert!(registry.is_deprecated(client, DeprecationQuery::Parameter("timeout")));
        assert!(!registry.is_deprecated(client, DeprecationQuery::Parameter("token")));
    }

    #[test]
    fn test_parameter_type_markers() {
        let registry = Registry::new();
        let old = registry.register_class(ClassSpec::structure("app", "OldAuth"));
        let client = registry.register_class(ClassSpec::structure("app", "Client").param("auth", TypeExpr::STR));
        registry.register_deprecated(
            client,
            Deprecation::ParameterTypes("auth".into(), vec![TypeExpr::INT, TypeExpr::INT]),
        );

        assert!(registry.is_deprecated(client, DeprecationQuery::ParameterType("auth", &TypeExpr::INT)));
        assert!(!registry.is_deprecated(client, DeprecationQuery::ParameterType("auth", &TypeExpr::STR)));
        assert_eq!(registry.deprecated_types(client, "auth"), vec![TypeExpr::INT]);

        registry.register_deprecated(old, Deprecation::Class);
        assert!(registry.is_deprecated(
            client,
            DeprecationQuery::ParameterType("auth", &TypeExpr::class(old))
        ));
    }
}

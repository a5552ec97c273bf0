//! Type Resolver
//!
//! Expands a declared annotation into the set of concrete, instantiable
//! alternatives a value for it may take:
//!
//! - unions are flattened member by member
//! - generic and iterable annotations resolve their arguments first, then
//!   expand the origin polymorphically and re-parameterize each concrete origin
//! - ordinary classes expand to themselves plus every known implementation
//! - abstract classes and wrappers whose wrapped class is present are dropped

use indexmap::IndexSet;
use tracing::trace;

use super::{ClassId, ClassKind, TypeExpr};
use crate::error::ResolveError;
use crate::registry::Registry;

/// Deduplicated, order-preserving set of concrete types
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeSet(IndexSet<TypeExpr>);

impl TypeSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a type, keeping the first position of duplicates
    pub fn insert(&mut self, ty: TypeExpr) -> bool {
        self.0.insert(ty)
    }

    /// Append every member of `other`
    pub fn extend(&mut self, other: TypeSet) {
        self.0.extend(other.0);
    }

    /// Check membership
    pub fn contains(&self, ty: &TypeExpr) -> bool {
        self.0.contains(ty)
    }

    /// Whether any member is the plain or parameterized class `id`
    pub fn contains_class(&self, id: ClassId) -> bool {
        self.0.iter().any(|t| t.origin() == Some(id))
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &TypeExpr> {
        self.0.iter()
    }

    /// Number of types
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Literal members
    pub fn literals(&self) -> impl Iterator<Item = &TypeExpr> {
        self.0.iter().filter(|t| matches!(t, TypeExpr::Literal(_)))
    }

    /// Collapse back into a single annotation
    pub fn to_annotation(&self) -> TypeExpr {
        match self.0.len() {
            1 => self.0[0].clone(),
            _ => TypeExpr::Union(self.0.iter().cloned().collect()),
        }
    }
}

impl FromIterator<TypeExpr> for TypeSet {
    fn from_iter<I: IntoIterator<Item = TypeExpr>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for TypeSet {
    type Item = TypeExpr;
    type IntoIter = indexmap::set::IntoIter<TypeExpr>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TypeSet {
    type Item = &'a TypeExpr;
    type IntoIter = indexmap::set::Iter<'a, TypeExpr>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Annotation expander bound to a registry
pub struct Resolver<'r> {
    registry: &'r Registry,
}

impl<'r> Resolver<'r> {
    /// Create a resolver reading classes from `registry`
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Expand `annotation` into its concrete type set
    pub fn resolve(&self, annotation: &TypeExpr) -> Result<TypeSet, ResolveError> {
        match annotation {
            TypeExpr::Forward(name) => Err(ResolveError::InvalidAnnotation(name.clone())),

            TypeExpr::Union(members) => {
                let mut set = TypeSet::new();
                for member in members {
                    set.extend(self.filter(self.resolve(member)?));
                }
                Ok(set)
            }

            TypeExpr::Generic { origin, args } => self.resolve_generic(*origin, args),

            TypeExpr::Literal(_) | TypeExpr::Var(_) => Ok(std::iter::once(annotation.clone()).collect()),

            TypeExpr::Class(id) => {
                let is_sequence = self
                    .registry
                    .class(*id)
                    .is_some_and(|c| !c.builtin && matches!(c.kind, ClassKind::Sequence));
                if is_sequence {
                    // Bare non-builtin iterables expand like an unparameterized generic
                    return self.resolve_generic(*id, &[]);
                }
                Ok(self.expand_class(*id))
            }
        }
    }

    fn resolve_generic(&self, origin: ClassId, args: &[TypeExpr]) -> Result<TypeSet, ResolveError> {
        let arg_sets = args
            .iter()
            .map(|arg| self.resolve(arg).map(|set| self.filter(set)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut origins = TypeSet::new();
        for concrete in self.expand_class(origin) {
            let Some(id) = concrete.origin() else {
                continue;
            };
            let Some(desc) = self.registry.class(id) else {
                origins.insert(concrete);
                continue;
            };

            if desc.is_generic() && !arg_sets.is_empty() {
                for combination in cartesian_product(&arg_sets) {
                    origins.insert(TypeExpr::generic(id, combination));
                }
            } else if matches!(desc.kind, ClassKind::Sequence) {
                if arg_sets.is_empty() {
                    origins.insert(TypeExpr::Class(id));
                } else {
                    let flattened = arg_sets.iter().flat_map(|s| s.iter().cloned());
                    origins.insert(TypeExpr::generic(id, flattened));
                }
            } else {
                origins.insert(TypeExpr::Class(id));
            }
        }

        trace!(origin = %origin, count = origins.len(), "resolved generic annotation");
        Ok(self.filter(origins))
    }

    /// Class plus its transitive implementations, filtered
    fn expand_class(&self, id: ClassId) -> TypeSet {
        let builtin = self.registry.class(id).map_or(true, |c| c.builtin);
        if builtin {
            return std::iter::once(TypeExpr::Class(id)).collect();
        }

        let mut found = TypeSet::new();
        let mut visited = Vec::new();
        self.collect_implementations(id, &mut found, &mut visited);
        trace!(class = %id, count = found.len(), "expanded implementations");
        self.filter(found)
    }

    fn collect_implementations(&self, id: ClassId, found: &mut TypeSet, visited: &mut Vec<ClassId>) {
        if visited.contains(&id) {
            return;
        }
        visited.push(id);
        found.insert(TypeExpr::Class(id));
        for implementation in self.registry.implementations(id) {
            self.collect_implementations(implementation, found, visited);
        }
    }

    /// Drop abstract classes and wrappers whose wrapped class is present
    fn filter(&self, set: TypeSet) -> TypeSet {
        let descriptors: Vec<_> = set
            .iter()
            .map(|t| t.origin().and_then(|id| self.registry.class(id)))
            .collect();

        set.iter()
            .zip(&descriptors)
            .filter(|(_, desc)| {
                let Some(desc) = desc else {
                    return true;
                };
                if desc.is_abstract {
                    trace!(class = %desc.qualified_name(), "dropping abstract class");
                    return false;
                }
                match desc.wraps {
                    Some(inner) if set.contains_class(inner) => {
                        trace!(class = %desc.qualified_name(), "dropping wrapper of present class");
                        false
                    }
                    _ => true,
                }
            })
            .map(|(t, _)| t.clone())
            .collect()
    }
}

/// Every combination picking one member from each set, in order
fn cartesian_product(sets: &[TypeSet]) -> Vec<Vec<TypeExpr>> {
    sets.iter().fold(vec![Vec::new()], |acc, set| {
        acc.iter()
            .flat_map(|prefix| {
                set.iter().map(move |ty| {
                    let mut next = prefix.clone();
                    next.push(ty.clone());
                    next
                })
            })
            .collect()
    })
}

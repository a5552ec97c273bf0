//! Attribute-source rules used when decomposing live objects.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::Registry;
use crate::types::{ClassId, TypeExpr};
use crate::value::{Reflect, Value};

/// Where the value of a constructor parameter is read from
#[derive(Clone)]
pub enum AttributeSource {
    /// Attribute of the given name
    Attribute(String),
    /// Callback applied to the instance
    Getter(Arc<dyn Fn(&dyn Reflect) -> Option<Value> + Send + Sync>),
}

impl AttributeSource {
    /// Getter source from a closure
    pub fn getter<F>(f: F) -> Self
    where
        F: Fn(&dyn Reflect) -> Option<Value> + Send + Sync + 'static,
    {
        AttributeSource::Getter(Arc::new(f))
    }

    /// Read the source from `instance`
    pub fn read(&self, instance: &dyn Reflect) -> Option<Value> {
        match self {
            AttributeSource::Attribute(name) => instance.attribute(name),
            AttributeSource::Getter(getter) => getter(instance),
        }
    }
}

impl From<&str> for AttributeSource {
    fn from(name: &str) -> Self {
        AttributeSource::Attribute(name.to_string())
    }
}

impl fmt::Debug for AttributeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeSource::Attribute(name) => f.debug_tuple("Attribute").field(name).finish(),
            AttributeSource::Getter(_) => f.write_str("Getter(..)"),
        }
    }
}

impl Registry {
    /// Map parameters of `class` to the attributes (or getters) holding them
    pub fn register_object_objectinfo_rule<S, I>(&self, class: ClassId, mapping: I)
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, AttributeSource)>,
    {
        let mut rules = self.rules.write();
        let entry = rules.entry(class).or_default();
        for (param, source) in mapping {
            entry.insert(param.into(), source);
        }
        drop(rules);
        self.touch("rule");
    }

    /// Sources to read when decomposing an instance of `class`.
    ///
    /// Without a registered rule every annotated parameter is read from the
    /// attribute of the same name.
    pub fn attribute_sources(&self, class: ClassId) -> IndexMap<String, AttributeSource> {
        if let Some(rule) = self.rules.read().get(&class) {
            return rule.clone();
        }

        self.annotations(&TypeExpr::class(class))
            .into_keys()
            .map(|name| {
                let source = AttributeSource::Attribute(name.clone());
                (name, source)
            })
            .collect()
    }

    /// Whether `class` has a registered rule
    pub fn has_rule(&self, class: ClassId) -> bool {
        self.rules.read().contains_key(&class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClassSpec;
    use crate::value::DynObject;

    #[test]
    fn test_identity_sources_by_default() {
        let registry = Registry::new();
        let file = registry.register_class(ClassSpec::structure("io", "File").param("filename", TypeExpr::STR));
        let sources = registry.attribute_sources(file);
        assert!(matches!(&sources["filename"], AttributeSource::Attribute(a) if a == "filename"));
        assert!(!registry.has_rule(file));
    }

    #[test]
    fn test_registered_rule_replaces_identity() {
        let registry = Registry::new();
        let file = registry.register_class(ClassSpec::structure("io", "File").param("filename", TypeExpr::STR));
        registry.register_object_objectinfo_rule(file, [("filename", AttributeSource::from("fullpath"))]);

        let mut fields = IndexMap::new();
        fields.insert("fullpath".to_string(), Value::Str("/tmp/a".into()));
        let object = DynObject::new("io.File", fields);

        let sources = registry.attribute_sources(file);
        assert_eq!(sources["filename"].read(&object), Some(Value::Str("/tmp/a".into())));
    }

    #[test]
    fn test_getter_source() {
        let source = AttributeSource::getter(|obj| Some(Value::Str(obj.type_name().to_uppercase())));
        let object = DynObject::new("io.file", IndexMap::new());
        assert_eq!(source.read(&object), Some(Value::Str("IO.FILE".into())));
    }
}

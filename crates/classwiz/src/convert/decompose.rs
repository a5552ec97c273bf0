//! Live value to object info.

use tracing::{trace, warn};

use super::Converter;
use crate::object_info::{InfoValue, ObjectData, ObjectInfo};
use crate::types::ClassId;
use crate::value::{instance_addr, Instance, Value};

impl Converter {
    /// Describe a live value as an object info tree.
    ///
    /// Scalars and enum members are returned as-is, sequences element-wise
    /// and mappings as `dict` object infos. Instances are read through their
    /// class's attribute sources; unreadable attributes and non-builtin
    /// singleton values are skipped, and an instance already being
    /// decomposed further up is stored raw instead of recursing.
    pub fn decompose(&self, value: &Value) -> InfoValue {
        self.hooks.decompose.run_pre(value);

        let hit = self.caches().decompose.get(value);
        let result = match hit {
            Some(hit) => hit,
            None => {
                let computed = self.decompose_value(value, &mut Vec::new());
                self.caches().decompose.insert(value.clone(), computed.clone());
                computed
            }
        };

        self.hooks.decompose.run_post(value, result)
    }

    fn decompose_value(&self, value: &Value, in_progress: &mut Vec<usize>) -> InfoValue {
        match value {
            Value::None => InfoValue::None,
            Value::Bool(b) => InfoValue::Bool(*b),
            Value::Int(i) => InfoValue::Int(*i),
            Value::Float(f) => InfoValue::Float(*f),
            Value::Str(s) => InfoValue::Str(s.clone()),
            Value::Enum(member) => InfoValue::Enum(member.clone()),
            Value::List(items) => InfoValue::List(
                items
                    .iter()
                    .map(|item| self.decompose_value(item, in_progress))
                    .collect(),
            ),
            Value::Dict(map) => {
                let data: ObjectData = map
                    .iter()
                    .map(|(k, v)| (k.clone(), self.decompose_value(v, in_progress)))
                    .collect();
                ObjectInfo::new(ClassId::DICT, data).into_value()
            }
            Value::Object(instance) => self.decompose_instance(instance, in_progress),
        }
    }

    fn decompose_instance(&self, instance: &Instance, in_progress: &mut Vec<usize>) -> InfoValue {
        let addr = instance_addr(instance);
        if in_progress.contains(&addr) {
            return InfoValue::Live(instance.clone());
        }

        let Some(class) = self.registry.lookup(instance.type_name()) else {
            warn!(type_name = instance.type_name(), "no registered class, keeping live instance");
            return InfoValue::Live(instance.clone());
        };

        in_progress.push(addr);
        let mut data = ObjectData::new();
        for (param, source) in self.registry.attribute_sources(class) {
            let Some(read) = source.read(&**instance) else {
                trace!(param = %param, "attribute unreadable, skipping");
                continue;
            };

            if let Value::Object(child) = &read {
                let singleton = self
                    .registry
                    .lookup(child.type_name())
                    .is_some_and(|id| self.registry.is_singleton(id));
                if singleton {
                    trace!(param = %param, type_name = child.type_name(), "skipping singleton value");
                    continue;
                }
            }

            data.insert(param, self.decompose_value(&read, in_progress));
        }
        in_progress.pop();

        ObjectInfo::new(class, data).into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClasswizConfig;
    use crate::registry::{AttributeSource, Registry};
    use crate::types::{ClassSpec, TypeExpr};
    use crate::value::DynObject;
    use indexmap::IndexMap;
    use std::sync::Arc;

    fn converter() -> Converter {
        Converter::new(Arc::new(Registry::new()), ClasswizConfig::default())
    }

    fn object(type_name: &str, fields: &[(&str, Value)]) -> Arc<DynObject> {
        let fields = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<IndexMap<_, _>>();
        Arc::new(DynObject::new(type_name, fields))
    }

    #[test]
    fn test_scalars_pass_through() {
        let converter = converter();
        assert_eq!(converter.decompose(&Value::Int(5)), InfoValue::Int(5));
        assert_eq!(
            converter.decompose(&Value::List(vec![Value::Str("a".into())])),
            InfoValue::List(vec![InfoValue::Str("a".into())])
        );
    }

    #[test]
    fn test_mapping_becomes_dict_info() {
        let converter = converter();
        let mut map = IndexMap::new();
        map.insert("k".to_string(), Value::Bool(true));
        let out = converter.decompose(&Value::Dict(map));
        let info = out.as_info().unwrap();
        assert_eq!(info.class(), ClassId::DICT);
        assert_eq!(info.get("k"), Some(&InfoValue::Bool(true)));
    }

    #[test]
    fn test_missing_attributes_skipped() {
        let converter = converter();
        let point = converter.registry().register_class(
            ClassSpec::structure("geo", "Point")
                .param("x", TypeExpr::INT)
                .optional_param("label", TypeExpr::STR),
        );
        let instance = object("geo.Point", &[("x", Value::Int(3))]);

        let out = converter.decompose(&Value::Object(instance));
        let info = out.as_info().unwrap();
        assert_eq!(info.class(), point);
        assert_eq!(info.data().len(), 1);
        assert_eq!(info.get("x"), Some(&InfoValue::Int(3)));
    }

    #[test]
    fn test_singletons_skipped() {
        let converter = converter();
        converter
            .registry()
            .register_class(ClassSpec::structure("app", "Sentinel"));
        converter.registry().register_class(
            ClassSpec::structure("app", "Holder")
                .param("marker", TypeExpr::STR)
                .param("n", TypeExpr::INT),
        );

        let sentinel: Instance = object("app.Sentinel", &[]);
        let holder = object(
            "app.Holder",
            &[("marker", Value::Object(sentinel)), ("n", Value::Int(1))],
        );

        let out = converter.decompose(&Value::Object(holder));
        let info = out.as_info().unwrap();
        assert!(info.get("marker").is_none());
        assert_eq!(info.get("n"), Some(&InfoValue::Int(1)));
    }

    #[test]
    fn test_annotated_argumentless_class_not_singleton() {
        let converter = converter();
        let registry = converter.registry();
        let limits = registry.register_class(ClassSpec::structure("app", "Limits"));
        registry.register_annotations(limits, [("max", TypeExpr::INT)]);
        registry.register_class(ClassSpec::structure("app", "Holder").param("limits", TypeExpr::class(limits)));
        assert!(!registry.is_singleton(limits));

        let inner: Instance = object("app.Limits", &[("max", Value::Int(10))]);
        let holder = object("app.Holder", &[("limits", Value::Object(inner))]);

        let out = converter.decompose(&Value::Object(holder));
        let nested = out.as_info().unwrap().get("limits").unwrap().as_info().unwrap();
        assert_eq!(nested.class(), limits);
        assert_eq!(nested.get("max"), Some(&InfoValue::Int(10)));
    }

    #[test]
    fn test_rule_getter_used() {
        let converter = converter();
        let tz = converter.registry().register_class(ClassSpec::structure("app", "Zone").param("name", TypeExpr::STR));
        converter.registry().register_object_objectinfo_rule(
            tz,
            [(
                "name",
                AttributeSource::getter(|obj| obj.attribute("tz").map(|v| match v {
                    Value::Str(s) => Value::Str(s.to_uppercase()),
                    other => other,
                })),
            )],
        );

        let zone = object("app.Zone", &[("tz", Value::Str("utc".into()))]);
        let out = converter.decompose(&Value::Object(zone));
        assert_eq!(out.as_info().unwrap().get("name"), Some(&InfoValue::Str("UTC".into())));
    }

    #[test]
    fn test_unknown_class_kept_live() {
        let converter = converter();
        let stray: Instance = object("elsewhere.Thing", &[]);
        let out = converter.decompose(&Value::Object(stray.clone()));
        assert_eq!(out, InfoValue::Live(stray));
    }

    #[test]
    fn test_indirect_cycle_terminates() {
        let converter = converter();
        converter.registry().register_class(
            ClassSpec::structure("app", "Node")
                .param("next", TypeExpr::STR)
                .param("id", TypeExpr::INT),
        );
        let a = object("app.Node", &[("id", Value::Int(1))]);
        let b = object("app.Node", &[("id", Value::Int(2))]);
        let a_instance: Instance = a.clone();
        let b_instance: Instance = b.clone();
        a.set("next", Value::Object(b_instance));
        b.set("next", Value::Object(a_instance.clone()));

        let out = converter.decompose(&Value::Object(a_instance.clone()));
        let outer = out.as_info().unwrap();
        let inner = outer.get("next").unwrap().as_info().unwrap();
        assert_eq!(inner.get("id"), Some(&InfoValue::Int(2)));
        assert_eq!(inner.get("next"), Some(&InfoValue::Live(a_instance)));
    }

    #[test]
    fn test_post_hook_replaces_result() {
        let converter = converter();
        converter
            .hooks()
            .decompose
            .register_post("wrap", "1.0.0", |_, out| InfoValue::List(vec![out]));
        assert_eq!(
            converter.decompose(&Value::Int(1)),
            InfoValue::List(vec![InfoValue::Int(1)])
        );
    }
}

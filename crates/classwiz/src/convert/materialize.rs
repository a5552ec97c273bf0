//! Object info to live value.

use super::Converter;
use crate::error::ConvertError;
use crate::object_info::{InfoValue, ObjectInfo};
use crate::value::{Arguments, Value};

impl Converter {
    /// Build the live value described by `value`.
    ///
    /// Nested object infos are built first, then the class constructor is
    /// called with the finished keyword arguments. A rejected construction
    /// is reported as [`ConvertError::Construction`].
    pub fn materialize(&self, value: &InfoValue) -> Result<Value, ConvertError> {
        Ok(match value {
            InfoValue::None => Value::None,
            InfoValue::Bool(b) => Value::Bool(*b),
            InfoValue::Int(i) => Value::Int(*i),
            InfoValue::Float(f) => Value::Float(*f),
            InfoValue::Str(s) => Value::Str(s.clone()),
            InfoValue::Enum(member) => Value::Enum(member.clone()),
            InfoValue::Live(instance) => Value::Object(instance.clone()),
            InfoValue::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| self.materialize(item))
                    .collect::<Result<_, _>>()?,
            ),
            InfoValue::Info(info) => self.materialize_info(info)?,
        })
    }

    /// Build the instance described by `info`
    pub fn materialize_info(&self, info: &ObjectInfo) -> Result<Value, ConvertError> {
        let desc = self
            .registry
            .class(info.class())
            .ok_or_else(|| ConvertError::UnknownTypeReference(info.class().to_string()))?;

        let mut args = Arguments::new();
        for (name, value) in info.data() {
            args.insert(name.clone(), self.materialize(value)?);
        }

        desc.construct(args).map_err(|reason| ConvertError::Construction {
            class: desc.qualified_name(),
            reason,
        })
    }

    /// Memoized [`Converter::materialize`], for validating edits.
    ///
    /// The returned value may be shared with earlier calls; treat it as
    /// read-only.
    pub fn materialize_cached(&self, value: &InfoValue) -> Result<Value, ConvertError> {
        if value.contains_live() {
            return self.materialize(value);
        }
        if let Some(hit) = self.caches().materialize.get(value) {
            return Ok(hit);
        }

        let built = self.materialize(value)?;
        self.caches().materialize.insert(value.clone(), built.clone());
        Ok(built)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClasswizConfig;
    use crate::error::ErrorKind;
    use crate::registry::Registry;
    use crate::types::{ClassId, ClassSpec, TypeExpr};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn converter() -> Converter {
        Converter::new(Arc::new(Registry::new()), ClasswizConfig::default())
    }

    #[test]
    fn test_children_built_before_parent() {
        let converter = converter();
        let registry = converter.registry();
        let point = registry.register_class(
            ClassSpec::structure("geo", "Point")
                .param("x", TypeExpr::INT)
                .param("y", TypeExpr::INT)
                .dynamic(),
        );
        let line = registry.register_class(
            ClassSpec::structure("geo", "Line")
                .param("points", TypeExpr::list_of(TypeExpr::class(point)))
                .dynamic(),
        );

        let p = ObjectInfo::from_fields(point, [("x", 1i64), ("y", 2)]);
        let info = ObjectInfo::from_fields(line, [("points", InfoValue::List(vec![p.into_value()]))]);

        let built = converter.materialize(&info.into_value()).unwrap();
        let line = built.as_instance().unwrap();
        let points = line.attribute("points").unwrap();
        let first = points.as_list().unwrap()[0].as_instance().unwrap().clone();
        assert_eq!(first.type_name(), "geo.Point");
        assert_eq!(first.attribute("y"), Some(Value::Int(2)));
    }

    #[test]
    fn test_rejected_arguments() {
        let converter = converter();
        let point = converter.registry().register_class(
            ClassSpec::structure("geo", "Point")
                .param("x", TypeExpr::INT)
                .dynamic(),
        );

        let err = converter
            .materialize_info(&ObjectInfo::from_fields(point, [("z", 1i64)]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConstructionError);
        assert!(err.to_string().contains("geo.Point"));
    }

    #[test]
    fn test_dict_info_builds_mapping() {
        let converter = converter();
        let info = ObjectInfo::from_fields(ClassId::DICT, [("a", 1i64)]);
        let built = converter.materialize(&info.into_value()).unwrap();
        assert!(matches!(built, Value::Dict(ref map) if map["a"] == Value::Int(1)));
    }

    #[test]
    fn test_cached_materialization_reuses_result() {
        let converter = converter();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let probe = converter.registry().register_class(
            ClassSpec::structure("app", "Probe")
                .optional_param("n", TypeExpr::INT)
                .constructor(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Value::None)
                }),
        );

        let info = ObjectInfo::from_fields(probe, [("n", 1i64)]).into_value();
        converter.materialize_cached(&info).unwrap();
        converter.materialize_cached(&info).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        converter.materialize(&info).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

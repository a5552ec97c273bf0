//! Typed text to values.

use serde_json::Value as Json;

use super::{constant_value, Entry};
use crate::convert::Converter;
use crate::display::class_name;
use crate::error::FormError;
use crate::object_info::InfoValue;
use crate::types::{ClassId, ClassKind, Constant, TypeExpr, TypeSet};
use crate::value::Value;

/// Convert user text into a value of the first builtin type in `types`
/// that accepts it.
///
/// Candidates are tried in set order, so `Union[int, str]` turns `"5"` into
/// the integer `5`. Non-builtin members are ignored; they are built through
/// their own editors.
pub fn cast_type(input: &str, types: &TypeSet, converter: &Converter) -> Result<InfoValue, FormError> {
    let registry = converter.registry();
    for ty in types {
        let Some(origin) = ty.origin() else { continue };
        let Some(desc) = registry.class(origin) else { continue };
        if !desc.builtin {
            continue;
        }

        let cast = match origin {
            ClassId::INT => input.trim().parse::<i64>().ok().map(InfoValue::Int),
            ClassId::FLOAT => input.trim().parse::<f64>().ok().map(InfoValue::Float),
            ClassId::BOOL => parse_bool(input).map(InfoValue::Bool),
            ClassId::STR => Some(InfoValue::Str(input.to_string())),
            ClassId::DICT => parse_json(input, converter, Json::is_object),
            _ if matches!(desc.kind, ClassKind::Sequence) => parse_json(input, converter, Json::is_array),
            _ => None,
        };
        if let Some(value) = cast {
            return Ok(value);
        }
    }

    Err(FormError::NoMatchingType {
        input: input.to_string(),
        accepted: types
            .iter()
            .map(|ty| class_name(registry, ty, true))
            .collect::<Vec<_>>()
            .join(", "),
    })
}

fn parse_bool(input: &str) -> Option<bool> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("true") {
        Some(true)
    } else if input.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_json(input: &str, converter: &Converter, shape: fn(&Json) -> bool) -> Option<InfoValue> {
    let json: Json = serde_json::from_str(input).ok()?;
    if !shape(&json) {
        return None;
    }
    Some(converter.decompose(&Value::from_json(&json)))
}

/// Accept `input` if it is one of the string constants of `literals`
pub fn check_literal<'a>(
    input: &str,
    literals: impl IntoIterator<Item = &'a TypeExpr>,
) -> Result<InfoValue, FormError> {
    let mut allowed = Vec::new();
    for literal in literals {
        let TypeExpr::Literal(values) = literal else { continue };
        for value in values {
            if matches!(value, Constant::Str(s) if s == input) {
                return Ok(constant_value(value));
            }
            allowed.push(value.to_string());
        }
    }

    Err(FormError::InvalidLiteral {
        input: input.to_string(),
        allowed: format!("[{}]", allowed.join(", ")),
    })
}

/// Value of a field entry, `None` when it is unset.
///
/// Text is cast through [`cast_type`], falling back to the literal members
/// of `types`. Chosen strings take the same route; other chosen values are
/// kept as they are.
pub fn parse_entry(entry: &Entry, types: &TypeSet, converter: &Converter) -> Result<Option<InfoValue>, FormError> {
    let text = match entry {
        Entry::Empty => return Ok(None),
        Entry::Text(s) | Entry::Value(InfoValue::Str(s)) => s,
        Entry::Value(value) => return Ok(Some(value.clone())),
    };
    if text.is_empty() {
        return Ok(None);
    }

    match cast_type(text, types, converter) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            let mut literals = types.literals().peekable();
            if literals.peek().is_none() {
                return Err(err);
            }
            check_literal(text, literals).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClasswizConfig;
    use crate::error::ErrorKind;
    use crate::registry::Registry;
    use std::sync::Arc;

    fn converter() -> Converter {
        Converter::new(Arc::new(Registry::new()), ClasswizConfig::default())
    }

    fn set(types: impl IntoIterator<Item = TypeExpr>) -> TypeSet {
        types.into_iter().collect()
    }

    #[test]
    fn test_declaration_order_wins() {
        let converter = converter();
        let int_first = set([TypeExpr::INT, TypeExpr::STR]);
        assert_eq!(cast_type("5", &int_first, &converter).unwrap(), InfoValue::Int(5));

        let str_first = set([TypeExpr::STR, TypeExpr::INT]);
        assert_eq!(
            cast_type("5", &str_first, &converter).unwrap(),
            InfoValue::Str("5".into())
        );
    }

    #[test]
    fn test_scalar_casts() {
        let converter = converter();
        let types = set([TypeExpr::INT, TypeExpr::FLOAT, TypeExpr::BOOL]);
        assert_eq!(cast_type(" 12 ", &types, &converter).unwrap(), InfoValue::Int(12));
        assert_eq!(cast_type("1.25", &types, &converter).unwrap(), InfoValue::Float(1.25));
        assert_eq!(cast_type("TRUE", &types, &converter).unwrap(), InfoValue::Bool(true));

        let err = cast_type("abc", &types, &converter).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoMatchingType);
        assert!(err.to_string().contains("int, float, bool"));
    }

    #[test]
    fn test_json_containers() {
        let converter = converter();
        let types = set([TypeExpr::DICT, TypeExpr::list_of(TypeExpr::INT)]);

        let dict = cast_type(r#"{"a": 1}"#, &types, &converter).unwrap();
        assert_eq!(dict.as_info().unwrap().class(), ClassId::DICT);
        assert_eq!(dict.as_info().unwrap().get("a"), Some(&InfoValue::Int(1)));

        let list = cast_type("[1, 2]", &types, &converter).unwrap();
        assert_eq!(list, InfoValue::List(vec![InfoValue::Int(1), InfoValue::Int(2)]));

        assert!(cast_type("3", &types, &converter).is_err());
    }

    #[test]
    fn test_literal_fallback() {
        let converter = converter();
        let types = set([
            TypeExpr::INT,
            TypeExpr::literal([Constant::from("auto"), Constant::from("off")]),
        ]);

        let entry = Entry::Text("auto".into());
        assert_eq!(
            parse_entry(&entry, &types, &converter).unwrap(),
            Some(InfoValue::Str("auto".into()))
        );

        let err = parse_entry(&Entry::Text("manual".into()), &types, &converter).unwrap_err();
        assert_eq!(err.to_string(), "'manual' does not match any literal value; allowed literals: ['auto', 'off']");
    }

    #[test]
    fn test_empty_optional_is_unset() {
        let converter = converter();
        let types = converter
            .registry()
            .resolve(&TypeExpr::optional(TypeExpr::INT))
            .unwrap();
        assert_eq!(parse_entry(&Entry::Text(String::new()), &types, &converter).unwrap(), None);
        assert_eq!(parse_entry(&Entry::Empty, &types, &converter).unwrap(), None);
        assert_eq!(
            parse_entry(&Entry::Value(InfoValue::None), &types, &converter).unwrap(),
            Some(InfoValue::None)
        );
    }
}

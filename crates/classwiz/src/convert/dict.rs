//! JSON encoding of object info trees
//!
//! ```text
//! object info  {"type": "<module>.<name>", "data": {...}, "nickname": null}
//! enum member  {"type": "<module>.<name>", "value": <member value>}
//! sequence     [...]
//! scalar       itself
//! ```
//!
//! Decoding drops `data` keys the class no longer declares and reports each
//! one as a [`StaleField`] warning.

use serde_json::{json, Map, Value as Json};
use tracing::warn;

use super::{Converter, ExactKey};
use crate::error::{ConvertError, StaleField};
use crate::object_info::{InfoValue, ObjectData, ObjectInfo};
use crate::types::{ClassKind, Constant, TypeExpr};
use crate::value::{Arguments, EnumMember, Value};

/// Result of decoding a template
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// Decoded tree
    pub value: InfoValue,
    /// Fields dropped because the class no longer declares them
    pub warnings: Vec<StaleField>,
}

impl Decoded {
    /// Top-level object info, if the template encodes one
    pub fn info(&self) -> Option<&ObjectInfo> {
        self.value.as_info()
    }
}

impl Converter {
    /// Encode `value` as JSON
    pub fn to_dict(&self, value: &InfoValue) -> Result<Json, ConvertError> {
        if value.contains_live() {
            return self.encode(value);
        }

        let key = ExactKey(value.clone());
        let hit = self.caches().to_dict.get(&key);
        if let Some(hit) = hit {
            return Ok(hit);
        }

        let encoded = self.encode(value)?;
        self.caches().to_dict.insert(key, encoded.clone());
        Ok(encoded)
    }

    fn encode(&self, value: &InfoValue) -> Result<Json, ConvertError> {
        Ok(match value {
            InfoValue::None => Json::Null,
            InfoValue::Bool(b) => Json::Bool(*b),
            InfoValue::Int(i) => json!(i),
            InfoValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .ok_or_else(|| ConvertError::Unencodable(format!("non-finite float {f}")))?,
            InfoValue::Str(s) => Json::String(s.clone()),
            InfoValue::Enum(member) => json!({
                "type": self.qualified_name(member.class)?,
                "value": constant_to_json(&member.value),
            }),
            InfoValue::List(items) => Json::Array(
                items
                    .iter()
                    .map(|item| self.encode(item))
                    .collect::<Result<_, _>>()?,
            ),
            InfoValue::Info(info) => {
                let mut data = Map::new();
                for (name, value) in info.data() {
                    data.insert(name.clone(), self.encode(value)?);
                }
                json!({
                    "type": self.qualified_name(info.class())?,
                    "data": data,
                    "nickname": info.nickname(),
                })
            }
            InfoValue::Live(instance) => {
                return Err(ConvertError::Unencodable(format!(
                    "live {} instance",
                    instance.type_name()
                )))
            }
        })
    }

    /// Decode a JSON template
    pub fn from_dict(&self, json: &Json) -> Result<Decoded, ConvertError> {
        let key = json.to_string();
        let hit = self.caches().from_dict.get(&key);
        if let Some(hit) = hit {
            return Ok(hit);
        }

        let mut warnings = Vec::new();
        let value = self.decode(json, &mut warnings)?;
        let decoded = Decoded { value, warnings };
        self.caches().from_dict.insert(key, decoded.clone());
        Ok(decoded)
    }

    /// Decode a JSON template from text
    pub fn from_json_str(&self, text: &str) -> Result<Decoded, ConvertError> {
        let json: Json =
            serde_json::from_str(text).map_err(|e| ConvertError::Malformed(e.to_string()))?;
        self.from_dict(&json)
    }

    fn decode(&self, json: &Json, warnings: &mut Vec<StaleField>) -> Result<InfoValue, ConvertError> {
        Ok(match json {
            Json::Null => InfoValue::None,
            Json::Bool(b) => InfoValue::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => InfoValue::Int(i),
                None => n
                    .as_f64()
                    .map(InfoValue::Float)
                    .ok_or_else(|| ConvertError::Malformed(format!("unsupported number {n}")))?,
            },
            Json::String(s) => InfoValue::Str(s.clone()),
            Json::Array(items) => InfoValue::List(
                items
                    .iter()
                    .map(|item| self.decode(item, warnings))
                    .collect::<Result<_, _>>()?,
            ),
            Json::Object(map) => self.decode_object(map, warnings)?,
        })
    }

    fn decode_object(
        &self,
        map: &Map<String, Json>,
        warnings: &mut Vec<StaleField>,
    ) -> Result<InfoValue, ConvertError> {
        let type_name = map
            .get("type")
            .and_then(Json::as_str)
            .ok_or_else(|| ConvertError::Malformed("object without a string 'type'".into()))?;
        let class = self
            .registry
            .lookup(type_name)
            .ok_or_else(|| ConvertError::UnknownTypeReference(type_name.to_string()))?;
        let desc = self
            .registry
            .class(class)
            .ok_or_else(|| ConvertError::UnknownTypeReference(type_name.to_string()))?;

        if let Some(raw) = map.get("value") {
            if let Some(members) = desc.enum_descriptor() {
                let value = json_to_constant(raw)
                    .filter(|c| members.accepts(c))
                    .ok_or_else(|| {
                        ConvertError::Malformed(format!("{raw} is not a member of {type_name}"))
                    })?;
                return Ok(InfoValue::Enum(EnumMember { class, value }));
            }

            let built = desc
                .construct(Arguments::single("value", Value::from_json(raw)))
                .map_err(|reason| ConvertError::Construction {
                    class: type_name.to_string(),
                    reason,
                })?;
            return Ok(self.decompose(&built));
        }

        let fields = match map.get("data") {
            Some(Json::Object(fields)) => fields,
            Some(_) => return Err(ConvertError::Malformed("'data' must be an object".into())),
            None => return Err(ConvertError::Malformed("object without 'data' or 'value'".into())),
        };

        // Mappings accept arbitrary keys
        let keep_all = matches!(desc.kind, ClassKind::Mapping);
        let annotations = self.registry.annotations(&TypeExpr::class(class));

        let mut data = ObjectData::new();
        for (name, value) in fields {
            if keep_all || annotations.contains_key(name) {
                data.insert(name.clone(), self.decode(value, warnings)?);
            } else {
                let warning = StaleField {
                    class: type_name.to_string(),
                    field: name.clone(),
                };
                warn!("{warning}");
                warnings.push(warning);
            }
        }

        let nickname = map
            .get("nickname")
            .and_then(Json::as_str)
            .map(str::to_string);
        Ok(ObjectInfo::new(class, data).with_nickname(nickname).into_value())
    }

    fn qualified_name(&self, class: crate::types::ClassId) -> Result<String, ConvertError> {
        self.registry
            .class(class)
            .map(|desc| desc.qualified_name())
            .ok_or_else(|| ConvertError::Unencodable(format!("unregistered class {class}")))
    }
}

fn constant_to_json(constant: &Constant) -> Json {
    match constant {
        Constant::Bool(b) => Json::Bool(*b),
        Constant::Int(i) => json!(i),
        Constant::Str(s) => Json::String(s.clone()),
    }
}

fn json_to_constant(json: &Json) -> Option<Constant> {
    match json {
        Json::Bool(b) => Some(Constant::Bool(*b)),
        Json::Number(n) => n.as_i64().map(Constant::Int),
        Json::String(s) => Some(Constant::Str(s.clone())),
        _ => None,
    }
}

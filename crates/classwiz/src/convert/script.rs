//! Object info to reconstruction script.
//!
//! Renders Rust-flavoured source text:
//!
//! ```text
//! use shapes::Circle;
//!
//! Circle {
//!     radius: 2.0,
//!     tags: vec![
//!         "a",
//!     ],
//! }
//! ```

use indexmap::IndexSet;

use super::{Converter, ExactKey};
use crate::error::ConvertError;
use crate::object_info::{InfoValue, ObjectInfo};
use crate::types::{ClassDescriptor, ClassId};
use crate::value::EnumMember;

const INDENT: &str = "    ";
const HASHMAP_IMPORT: &str = "use std::collections::HashMap;";

/// Rendered script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// Source expression
    pub code: String,
    /// Deduplicated import lines, in first-use order
    pub imports: Vec<String>,
}

impl Script {
    /// Imports, a blank line, then the code
    pub fn render(&self) -> String {
        if self.imports.is_empty() {
            return self.code.clone();
        }
        format!("{}\n\n{}", self.imports.join("\n"), self.code)
    }
}

impl Converter {
    /// Render `value` as source text that rebuilds it
    pub fn to_script(&self, value: &InfoValue) -> Result<Script, ConvertError> {
        if value.contains_live() {
            return Err(ConvertError::Unencodable(
                "live instances have no script form".into(),
            ));
        }

        let key = ExactKey(value.clone());
        let hit = self.caches().script.get(&key);
        if let Some(hit) = hit {
            return Ok(hit);
        }

        let mut imports = IndexSet::new();
        let code = self.render(value, &mut imports)?;
        let script = Script {
            code,
            imports: imports.into_iter().collect(),
        };
        self.caches().script.insert(key, script.clone());
        Ok(script)
    }

    fn render(&self, value: &InfoValue, imports: &mut IndexSet<String>) -> Result<String, ConvertError> {
        Ok(match value {
            InfoValue::None => "None".to_string(),
            InfoValue::Bool(b) => b.to_string(),
            InfoValue::Int(i) => i.to_string(),
            InfoValue::Float(f) => render_float(*f)?,
            InfoValue::Str(s) => quote(s),
            InfoValue::Enum(member) => self.render_enum(member, imports)?,
            InfoValue::List(items) => {
                let rendered = items
                    .iter()
                    .map(|item| self.render(item, imports))
                    .collect::<Result<Vec<_>, _>>()?;
                block("vec![", rendered, "]")
            }
            InfoValue::Info(info) => self.render_info(info, imports)?,
            InfoValue::Live(instance) => {
                return Err(ConvertError::Unencodable(format!(
                    "live {} instance",
                    instance.type_name()
                )))
            }
        })
    }

    fn render_info(&self, info: &ObjectInfo, imports: &mut IndexSet<String>) -> Result<String, ConvertError> {
        if info.class() == ClassId::DICT {
            let mut entries = Vec::with_capacity(info.data().len());
            for (key, value) in info.data() {
                entries.push(format!("({}, {})", quote(key), self.render(value, imports)?));
            }
            imports.insert(HASHMAP_IMPORT.to_string());
            return Ok(block("HashMap::from([", entries, "])"));
        }

        let desc = self.descriptor(info.class())?;
        let mut fields = Vec::with_capacity(info.data().len());
        for (name, value) in info.data() {
            fields.push(format!("{name}: {}", self.render(value, imports)?));
        }
        add_import(&desc, imports);
        Ok(block(&format!("{} {{", desc.name), fields, "}"))
    }

    fn render_enum(&self, member: &EnumMember, imports: &mut IndexSet<String>) -> Result<String, ConvertError> {
        let desc = self.descriptor(member.class)?;
        let members = desc
            .enum_descriptor()
            .ok_or_else(|| ConvertError::Unencodable(format!("{} is not an enum", desc.qualified_name())))?;
        add_import(&desc, imports);

        if members.flag {
            let bits = member.value.as_int().unwrap_or_default();
            let names = members.flag_names(bits);
            if names.is_empty() {
                return Ok(format!("{}::from_bits({bits})", desc.name));
            }
            return Ok(names
                .iter()
                .map(|name| format!("{}::{name}", desc.name))
                .collect::<Vec<_>>()
                .join(" | "));
        }

        match members.member_name(&member.value) {
            Some(name) => Ok(format!("{}::{name}", desc.name)),
            None => Err(ConvertError::Unencodable(format!(
                "{} is not a member of {}",
                member.value,
                desc.qualified_name()
            ))),
        }
    }

    fn descriptor(&self, class: ClassId) -> Result<std::sync::Arc<ClassDescriptor>, ConvertError> {
        self.registry
            .class(class)
            .ok_or_else(|| ConvertError::Unencodable(format!("unregistered class {class}")))
    }
}

fn add_import(desc: &ClassDescriptor, imports: &mut IndexSet<String>) {
    if !desc.builtin {
        imports.insert(format!("use {}::{};", desc.module.replace('.', "::"), desc.name));
    }
}

/// `open` + one indented line per item + `close`
fn block(open: &str, items: Vec<String>, close: &str) -> String {
    if items.is_empty() {
        return format!("{open}{close}");
    }

    let mut out = String::from(open);
    for item in items {
        out.push('\n');
        out.push_str(INDENT);
        out.push_str(&item.replace('\n', &format!("\n{INDENT}")));
        out.push(',');
    }
    out.push('\n');
    out.push_str(close);
    out
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn render_float(f: f64) -> Result<String, ConvertError> {
    if !f.is_finite() {
        return Err(ConvertError::Unencodable(format!("non-finite float {f}")));
    }
    // Debug formatting always keeps a decimal point or exponent
    Ok(format!("{f:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClasswizConfig;
    use crate::registry::Registry;
    use crate::types::{ClassSpec, TypeExpr};
    use std::sync::Arc;

    fn converter() -> Converter {
        Converter::new(Arc::new(Registry::new()), ClasswizConfig::default())
    }

    #[test]
    fn test_nested_script() {
        let converter = converter();
        let registry = converter.registry();
        let point = registry.register_class(ClassSpec::structure("geo.shapes", "Point").param("x", TypeExpr::FLOAT));
        let path = registry.register_class(
            ClassSpec::structure("geo.shapes", "Path")
                .param("points", TypeExpr::list_of(TypeExpr::class(point)))
                .param("name", TypeExpr::STR),
        );

        let p = ObjectInfo::from_fields(point, [("x", 1.0f64)]);
        let info = ObjectInfo::from_fields(
            path,
            [
                ("points", InfoValue::List(vec![p.clone().into_value(), p.into_value()])),
                ("name", InfoValue::from("say \"hi\"\n")),
            ],
        );

        let script = converter.to_script(&info.into_value()).unwrap();
        assert_eq!(script.imports, vec!["use geo::shapes::Point;", "use geo::shapes::Path;"]);
        assert_eq!(
            script.code,
            "Path {\n    points: vec![\n        Point {\n            x: 1.0,\n        },\n        Point {\n            x: 1.0,\n        },\n    ],\n    name: \"say \\\"hi\\\"\\n\",\n}"
        );
    }

    #[test]
    fn test_enum_and_flags() {
        let converter = converter();
        let registry = converter.registry();
        let color = registry.register_class(ClassSpec::enumeration("paint", "Color", [("RED", 1i64)]));
        let perm = registry.register_class(ClassSpec::flags("fs", "Perm", [("READ", 1), ("WRITE", 2)]));

        let script = converter
            .to_script(&InfoValue::Enum(EnumMember::new(color, 1i64)))
            .unwrap();
        assert_eq!(script.code, "Color::RED");

        let script = converter
            .to_script(&InfoValue::Enum(EnumMember::new(perm, 3i64)))
            .unwrap();
        assert_eq!(script.code, "Perm::READ | Perm::WRITE");
        assert_eq!(script.render(), "use fs::Perm;\n\nPerm::READ | Perm::WRITE");
    }

    #[test]
    fn test_dict_and_empty_values() {
        let converter = converter();
        let info = ObjectInfo::from_fields(ClassId::DICT, [("k", InfoValue::List(vec![]))]);
        let script = converter.to_script(&info.into_value()).unwrap();
        assert_eq!(script.code, "HashMap::from([\n    (\"k\", vec![]),\n])");
        assert_eq!(script.imports, vec![HASHMAP_IMPORT]);

        let script = converter.to_script(&InfoValue::None).unwrap();
        assert_eq!(script.code, "None");
        assert!(script.imports.is_empty());
    }
}

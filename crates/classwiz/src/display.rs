//! Human-readable names and object info descriptions.

use crate::object_info::{InfoValue, ObjectInfo};
use crate::registry::Registry;
use crate::types::{ClassId, TypeExpr};

/// Display name of a type annotation.
///
/// Aliased classes render as `Alias (Name)`; with `with_args`, generic
/// arguments render as `Name[A, B]`.
pub fn class_name(registry: &Registry, ty: &TypeExpr, with_args: bool) -> String {
    match ty {
        TypeExpr::Class(id) => plain_name(registry, *id),
        TypeExpr::Generic { origin, args } => {
            let name = plain_name(registry, *origin);
            if !with_args || args.is_empty() {
                return name;
            }
            let args = args
                .iter()
                .map(|a| class_name(registry, a, true))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{name}[{args}]")
        }
        TypeExpr::Union(members) => {
            let members = members
                .iter()
                .map(|m| class_name(registry, m, with_args))
                .collect::<Vec<_>>()
                .join(", ");
            format!("Union[{members}]")
        }
        TypeExpr::Literal(values) => {
            let values = values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            format!("Literal[{values}]")
        }
        TypeExpr::Var(name) => name.clone(),
        TypeExpr::Forward(name) => format!("'{name}'"),
    }
}

fn plain_name(registry: &Registry, id: ClassId) -> String {
    let Some(desc) = registry.class(id) else {
        return format!("<unknown {id}>");
    };
    match registry.alias(id) {
        Some(alias) => format!("{alias} ({})", desc.name),
        None => desc.name.clone(),
    }
}

/// One-line description of an object info.
///
/// Uses the class's registered display callback when there is one.
/// Otherwise renders `(nickname) Name(key=value, ...)`, masking password
/// fields and cutting the text at `limit` characters. The first rendering
/// is memoized on the object info.
pub fn describe(registry: &Registry, info: &ObjectInfo, limit: usize) -> String {
    info.label_cell()
        .get_or_init(|| match registry.custom_repr(info.class()) {
            Some(repr) => repr(info),
            None => describe_default(registry, info, limit),
        })
        .clone()
}

fn describe_default(registry: &Registry, info: &ObjectInfo, limit: usize) -> String {
    let mut out = String::new();
    if let Some(nickname) = info.nickname() {
        out.push_str(&format!("({nickname}) "));
    }

    let passwords = registry
        .class(info.class())
        .map(|desc| desc.passwords.clone())
        .unwrap_or_default();

    out.push_str(&plain_name(registry, info.class()));
    out.push('(');
    let mut first = true;
    for (name, value) in info.data() {
        if out.chars().count() > limit {
            break;
        }
        if !first {
            out.push_str(", ");
        }
        first = false;

        let rendered = match value {
            InfoValue::Str(s) if passwords.contains(name) => format!("\"{}\"", "*".repeat(s.chars().count())),
            _ => describe_value(registry, value, limit),
        };
        out.push_str(&format!("{name}={rendered}"));
    }
    out.push(')');

    if out.chars().count() > limit {
        let mut cut: String = out.chars().take(limit).collect();
        cut.push_str("...)");
        return cut;
    }
    out
}

/// Short rendering of a single value
pub fn describe_value(registry: &Registry, value: &InfoValue, limit: usize) -> String {
    match value {
        InfoValue::None => "None".to_string(),
        InfoValue::Bool(b) => b.to_string(),
        InfoValue::Int(i) => i.to_string(),
        InfoValue::Float(f) => format!("{f:?}"),
        InfoValue::Str(s) => format!("\"{s}\""),
        InfoValue::Enum(member) => {
            let Some(desc) = registry.class(member.class) else {
                return member.value.to_string();
            };
            let names = match desc.enum_descriptor() {
                Some(e) if e.flag => e.flag_names(member.value.as_int().unwrap_or_default()),
                Some(e) => e.member_name(&member.value).into_iter().collect(),
                None => Vec::new(),
            };
            if names.is_empty() {
                format!("{}({})", desc.name, member.value)
            } else {
                names
                    .iter()
                    .map(|n| format!("{}.{n}", desc.name))
                    .collect::<Vec<_>>()
                    .join("|")
            }
        }
        InfoValue::List(items) => {
            let items = items
                .iter()
                .map(|item| describe_value(registry, item, limit))
                .collect::<Vec<_>>()
                .join(", ");
            format!("[{items}]")
        }
        InfoValue::Info(info) => describe(registry, info, limit),
        InfoValue::Live(instance) => format!("<{} object>", instance.type_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClassSpec, Constant};
    use crate::value::EnumMember;

    #[test]
    fn test_class_names() {
        let registry = Registry::new();
        let span = registry.register_class(ClassSpec::structure("time", "Span"));
        let boxed = registry.register_class(ClassSpec::structure("app", "Box").type_params(["T"]));
        registry.register_alias(span, "Duration");

        assert_eq!(class_name(&registry, &TypeExpr::class(span), true), "Duration (Span)");
        assert_eq!(class_name(&registry, &TypeExpr::INT, true), "int");
        let generic = TypeExpr::generic(boxed, [TypeExpr::STR]);
        assert_eq!(class_name(&registry, &generic, true), "Box[str]");
        assert_eq!(class_name(&registry, &generic, false), "Box");
        assert_eq!(
            class_name(&registry, &TypeExpr::literal([Constant::from("a")]), true),
            "Literal['a']"
        );
    }

    #[test]
    fn test_describe_masks_passwords() {
        let registry = Registry::new();
        let login = registry.register_class(
            ClassSpec::structure("auth", "Login")
                .param("user", TypeExpr::STR)
                .param("password", TypeExpr::STR)
                .passwords(["password"]),
        );
        let info = ObjectInfo::from_fields(login, [("user", "ann"), ("password", "hunter2")])
            .with_nickname(Some("main".into()));

        assert_eq!(
            describe(&registry, &info, 150),
            "(main) Login(user=\"ann\", password=\"*******\")"
        );
    }

    #[test]
    fn test_describe_truncates() {
        let registry = Registry::new();
        let note = registry.register_class(ClassSpec::structure("app", "Note").param("text", TypeExpr::STR));
        let info = ObjectInfo::from_fields(note, [("text", "x".repeat(50))]);

        let text = describe(&registry, &info, 20);
        assert_eq!(text.chars().count(), 24);
        assert!(text.ends_with("...)"));
        assert!(text.starts_with("Note(text=\"xxx"));
    }

    #[test]
    fn test_custom_repr_and_memo() {
        let registry = Registry::new();
        let tag = registry.register_class(ClassSpec::structure("app", "Tag").param("v", TypeExpr::INT));
        let info = ObjectInfo::from_fields(tag, [("v", 1i64)]);
        let first = describe(&registry, &info, 150);
        assert_eq!(first, "Tag(v=1)");

        registry.register_repr(tag, |i| format!("#{}", i.get("v").and_then(InfoValue::as_int).unwrap_or(0)), false);
        // Memoized on the existing object info
        assert_eq!(describe(&registry, &info, 150), "Tag(v=1)");
        let fresh = ObjectInfo::from_fields(tag, [("v", 7i64)]);
        assert_eq!(describe(&registry, &fresh, 150), "#7");
    }

    #[test]
    fn test_describe_enum_values() {
        let registry = Registry::new();
        let perm = registry.register_class(ClassSpec::flags("fs", "Perm", [("R", 1), ("W", 2)]));
        let value = InfoValue::Enum(EnumMember::new(perm, 3i64));
        assert_eq!(describe_value(&registry, &value, 150), "Perm.R|Perm.W");
    }
}

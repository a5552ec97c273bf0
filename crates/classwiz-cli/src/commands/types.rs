//! `classwiz types` - list registered types.

use classwiz::{ClassKind, DeprecationQuery, Registry};

pub fn execute(registry: &Registry) -> anyhow::Result<()> {
    let mut classes = registry.classes();
    classes.retain(|desc| !desc.builtin);
    classes.sort_by_key(|desc| desc.qualified_name());

    for desc in classes {
        let mut line = format!("{} ({})", desc.qualified_name(), kind_label(&desc.kind));
        if let Some(alias) = registry.alias(desc.id) {
            line.push_str(&format!(" alias \"{alias}\""));
        }
        if desc.is_abstract {
            line.push_str(" abstract");
        }
        if registry.is_deprecated(desc.id, DeprecationQuery::Class) {
            line.push_str(" deprecated");
        }
        println!("{line}");
    }
    Ok(())
}

fn kind_label(kind: &ClassKind) -> &'static str {
    match kind {
        ClassKind::Primitive => "primitive",
        ClassKind::Mapping => "mapping",
        ClassKind::Sequence => "sequence",
        ClassKind::Struct => "class",
        ClassKind::Function => "function",
        ClassKind::Enum(members) if members.flag => "flag",
        ClassKind::Enum(_) => "enum",
    }
}

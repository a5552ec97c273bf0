//! Headless edit forms
//!
//! Editors hold user input for one value while it is being built, and turn
//! it back into object info on save:
//!
//! - [`StructForm`] edits a class's constructor arguments field by field
//! - [`ListForm`] edits an ordered sequence
//! - [`ScalarForm`] edits a number or a string
//! - [`FlagForm`] edits the bits of a flag enum
//!
//! An [`EditSession`] stacks editors the way nested dialogs would: opening an
//! editor for a field pushes it, saving pops it and delivers the value into
//! the editor below.

mod cast;
mod clipboard;
mod flag;
mod list;
mod scalar;
mod session;
mod structure;
mod template;

pub use cast::{cast_type, check_literal, parse_entry};
pub use clipboard::{Clipboard, ClipboardContent};
pub use flag::FlagForm;
pub use list::ListForm;
pub use scalar::ScalarForm;
pub use session::{EditSession, Editor, Target};
pub use structure::{Field, StructForm};
pub use template::{read_template, write_template};

use indexmap::IndexMap;

use crate::object_info::InfoValue;
use crate::registry::Registry;
use crate::types::{ClassId, ClassKind, Constant, TypeExpr};

/// Which editor a type opens in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    /// Flag enum bits
    Flag,
    /// Free text
    Text,
    /// Numeric input
    Number,
    /// Ordered sequence
    Iterable,
    /// Constructor arguments
    Struct,
}

/// Pick the editor for values of `ty`
pub fn select_editor(registry: &Registry, ty: &TypeExpr) -> EditorKind {
    let Some(origin) = ty.origin() else {
        return EditorKind::Struct;
    };
    let Some(desc) = registry.class(origin) else {
        return EditorKind::Struct;
    };

    match &desc.kind {
        ClassKind::Enum(e) if e.flag => EditorKind::Flag,
        ClassKind::Sequence => EditorKind::Iterable,
        _ if origin == ClassId::STR => EditorKind::Text,
        _ if matches!(origin, ClassId::INT | ClassId::FLOAT | ClassId::BOOL) => EditorKind::Number,
        _ => EditorKind::Struct,
    }
}

/// Current input of a form field
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Entry {
    /// Nothing entered
    #[default]
    Empty,
    /// Typed text, cast on save
    Text(String),
    /// Chosen or pasted value
    Value(InfoValue),
}

impl Entry {
    /// Whether the entry counts as unset
    pub fn is_empty(&self) -> bool {
        match self {
            Entry::Empty => true,
            Entry::Text(s) => s.is_empty(),
            Entry::Value(InfoValue::Str(s)) => s.is_empty(),
            Entry::Value(_) => false,
        }
    }
}

/// Extra choices offered per field, keyed by parameter name
pub type AdditionalValues = IndexMap<String, Vec<InfoValue>>;

/// Editor construction options
#[derive(Debug, Clone)]
pub struct FormOptions {
    /// Validate by building the object on save
    pub check_parameters: bool,
    /// `false` opens a read-only view
    pub allow_save: bool,
    /// Extra choices per field
    pub additional_values: AdditionalValues,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            check_parameters: true,
            allow_save: true,
            additional_values: AdditionalValues::new(),
        }
    }
}

impl FormOptions {
    /// Read-only view options
    pub fn view() -> Self {
        Self {
            allow_save: false,
            ..Self::default()
        }
    }
}

pub(crate) fn constant_value(constant: &Constant) -> InfoValue {
    match constant {
        Constant::Bool(b) => InfoValue::Bool(*b),
        Constant::Int(i) => InfoValue::Int(*i),
        Constant::Str(s) => InfoValue::Str(s.clone()),
    }
}

/// Plain type of a stored value, `None` for unregistered live instances
pub(crate) fn value_type(registry: &Registry, value: &InfoValue) -> Option<TypeExpr> {
    Some(match value {
        InfoValue::None => TypeExpr::NONE,
        InfoValue::Bool(_) => TypeExpr::BOOL,
        InfoValue::Int(_) => TypeExpr::INT,
        InfoValue::Float(_) => TypeExpr::FLOAT,
        InfoValue::Str(_) => TypeExpr::STR,
        InfoValue::Enum(member) => TypeExpr::class(member.class),
        InfoValue::List(_) => TypeExpr::class(ClassId::LIST),
        InfoValue::Info(info) => TypeExpr::class(info.class()),
        InfoValue::Live(instance) => TypeExpr::class(registry.lookup(instance.type_name())?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClassSpec;

    #[test]
    fn test_select_editor() {
        let registry = Registry::new();
        let perm = registry.register_class(ClassSpec::flags("fs", "Perm", [("R", 1)]));
        let color = registry.register_class(ClassSpec::enumeration("paint", "Color", [("RED", 1i64)]));
        let point = registry.register_class(ClassSpec::structure("geo", "Point"));

        assert_eq!(select_editor(&registry, &TypeExpr::class(perm)), EditorKind::Flag);
        assert_eq!(select_editor(&registry, &TypeExpr::class(color)), EditorKind::Struct);
        assert_eq!(select_editor(&registry, &TypeExpr::STR), EditorKind::Text);
        assert_eq!(select_editor(&registry, &TypeExpr::FLOAT), EditorKind::Number);
        assert_eq!(
            select_editor(&registry, &TypeExpr::list_of(TypeExpr::INT)),
            EditorKind::Iterable
        );
        assert_eq!(select_editor(&registry, &TypeExpr::class(point)), EditorKind::Struct);
    }

    #[test]
    fn test_entry_emptiness() {
        assert!(Entry::Empty.is_empty());
        assert!(Entry::Text(String::new()).is_empty());
        assert!(!Entry::Text("0".into()).is_empty());
        assert!(!Entry::Value(InfoValue::None).is_empty());
    }
}

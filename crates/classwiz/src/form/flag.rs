//! Flag enum editor.

use crate::display::class_name;
use crate::error::FormError;
use crate::object_info::InfoValue;
use crate::registry::Registry;
use crate::types::{ClassId, EnumDescriptor, TypeExpr};
use crate::value::EnumMember;

/// Editor that sets and clears the bits of a flag enum
#[derive(Debug, Clone)]
pub struct FlagForm {
    class: ClassId,
    members: EnumDescriptor,
    bits: Option<i64>,
    old: Option<i64>,
}

impl FlagForm {
    /// Open an editor for flag class `class` showing `old`
    pub fn new(registry: &Registry, class: ClassId, old: Option<&InfoValue>) -> Result<Self, FormError> {
        let desc = registry
            .class(class)
            .ok_or_else(|| FormError::NotEditable(class.to_string()))?;
        let members = desc
            .enum_descriptor()
            .filter(|e| e.flag)
            .cloned()
            .ok_or_else(|| FormError::NotEditable(class_name(registry, &TypeExpr::class(class), true)))?;

        let old = match old {
            Some(InfoValue::Enum(member)) if member.class == class => member.value.as_int(),
            _ => None,
        };
        Ok(Self {
            class,
            members,
            bits: old,
            old,
        })
    }

    pub fn class(&self) -> ClassId {
        self.class
    }

    /// Member names and bit values
    pub fn members(&self) -> impl Iterator<Item = (&str, i64)> {
        self.members
            .members
            .iter()
            .filter_map(|(name, value)| Some((name.as_str(), value.as_int()?)))
    }

    /// Names of the members currently set
    pub fn current(&self) -> Vec<&str> {
        self.members.flag_names(self.bits.unwrap_or(0))
    }

    /// Set (`enabled`) or clear the bits of member `name`
    pub fn update_flag(&mut self, name: &str, enabled: bool) -> Result<(), FormError> {
        let bit = self
            .members
            .member_value(name)
            .and_then(|v| v.as_int())
            .ok_or_else(|| FormError::InvalidLiteral {
                input: name.to_string(),
                allowed: format!(
                    "[{}]",
                    self.members().map(|(n, _)| n).collect::<Vec<_>>().join(", ")
                ),
            })?;

        let bits = self.bits.unwrap_or(bit);
        self.bits = Some(if enabled { bits | bit } else { bits & !bit });
        Ok(())
    }

    pub fn is_editing(&self) -> bool {
        self.old.is_some()
    }

    pub fn modified(&self) -> bool {
        self.bits != self.old
    }

    /// The flag value; nothing set means zero
    pub fn to_value(&self) -> InfoValue {
        InfoValue::Enum(EnumMember::new(self.class, self.bits.unwrap_or(0)))
    }
}

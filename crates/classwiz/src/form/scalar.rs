//! Number and text editors.

use std::sync::Arc;

use super::{cast_type, EditorKind};
use crate::convert::Converter;
use crate::error::FormError;
use crate::object_info::InfoValue;
use crate::types::{TypeExpr, TypeSet};

/// Single-line editor for a number or a string
#[derive(Debug)]
pub struct ScalarForm {
    converter: Arc<Converter>,
    class: TypeExpr,
    kind: EditorKind,
    text: String,
    old: Option<InfoValue>,
    initial: String,
}

impl ScalarForm {
    /// Open an editor for `class` showing `old`
    pub fn new(converter: Arc<Converter>, class: TypeExpr, kind: EditorKind, old: Option<InfoValue>) -> Self {
        let initial = old.as_ref().map(render).unwrap_or_default();
        Self {
            converter,
            class,
            kind,
            text: initial.clone(),
            old,
            initial,
        }
    }

    pub fn class(&self) -> &TypeExpr {
        &self.class
    }

    /// [`EditorKind::Number`] or [`EditorKind::Text`]
    pub fn kind(&self) -> EditorKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Whether the editor changes an existing value
    pub fn is_editing(&self) -> bool {
        self.old.is_some()
    }

    pub fn modified(&self) -> bool {
        self.text != self.initial
    }

    /// The text cast to the edited type
    pub fn to_value(&self) -> Result<InfoValue, FormError> {
        if self.kind == EditorKind::Text {
            return Ok(InfoValue::Str(self.text.clone()));
        }
        let types: TypeSet = std::iter::once(self.class.clone()).collect();
        cast_type(&self.text, &types, &self.converter)
    }
}

fn render(value: &InfoValue) -> String {
    match value {
        InfoValue::Bool(b) => b.to_string(),
        InfoValue::Int(i) => i.to_string(),
        InfoValue::Float(f) => f.to_string(),
        InfoValue::Str(s) => s.clone(),
        _ => String::new(),
    }
}

//! List Form

use std::sync::Arc;

use super::clipboard::{Clipboard, ClipboardContent};
use super::{check_literal, constant_value, value_type};
use crate::convert::Converter;
use crate::error::FormError;
use crate::object_info::InfoValue;
use crate::registry::DeprecationQuery;
use crate::types::{TypeExpr, TypeSet};
use crate::value::EnumMember;

/// Editor for an ordered sequence.
///
/// Element alternatives come from the sequence's type arguments. `None`,
/// enum members and literal values can be inserted directly; every other
/// alternative is built through a nested editor.
#[derive(Debug)]
pub struct ListForm {
    converter: Arc<Converter>,
    class: TypeExpr,
    element_types: TypeSet,
    items: Vec<InfoValue>,
    selection: Vec<usize>,
    constants: Vec<InfoValue>,
    candidates: Vec<TypeExpr>,
    deprecated_candidates: Vec<TypeExpr>,
    allow_save: bool,
    old: Option<Vec<InfoValue>>,
}

impl ListForm {
    /// Open a list editor for `class`, optionally pre-filled with `old`
    pub fn new(
        converter: Arc<Converter>,
        class: TypeExpr,
        old: Option<Vec<InfoValue>>,
        allow_save: bool,
    ) -> Result<Self, FormError> {
        let registry = converter.registry();
        let mut element_types = TypeSet::new();
        for arg in class.args() {
            element_types.extend(registry.resolve(arg)?);
        }

        let mut constants = Vec::new();
        let mut candidates = Vec::new();
        let mut deprecated_candidates = Vec::new();
        for ty in &element_types {
            let desc = ty.origin().and_then(|id| registry.class(id));
            let members = desc.as_ref().and_then(|d| Some((d.id, d.enum_descriptor()?)));
            match (ty, members) {
                (TypeExpr::Literal(values), _) => constants.extend(values.iter().map(constant_value)),
                (_, Some((class, members))) => {
                    constants.extend(
                        members
                            .members
                            .iter()
                            .map(|(_, value)| InfoValue::Enum(EnumMember::new(class, value.clone()))),
                    );
                }
                _ if *ty == TypeExpr::NONE => constants.push(InfoValue::None),
                _ if !allow_save => {}
                _ => {
                    let deprecated = ty
                        .origin()
                        .is_some_and(|id| registry.is_deprecated(id, DeprecationQuery::Class));
                    if deprecated {
                        deprecated_candidates.push(ty.clone());
                    } else {
                        candidates.push(ty.clone());
                    }
                }
            }
        }

        Ok(Self {
            items: old.clone().unwrap_or_default(),
            converter,
            class,
            element_types,
            selection: Vec::new(),
            constants,
            candidates,
            deprecated_candidates,
            allow_save,
            old,
        })
    }

    /// Edited type
    pub fn class(&self) -> &TypeExpr {
        &self.class
    }

    /// Resolved element alternatives
    pub fn element_types(&self) -> &TypeSet {
        &self.element_types
    }

    pub fn items(&self) -> &[InfoValue] {
        &self.items
    }

    /// Values insertable without a nested editor
    pub fn constants(&self) -> &[InfoValue] {
        &self.constants
    }

    /// Element types built through a nested editor
    pub fn candidates(&self) -> &[TypeExpr] {
        &self.candidates
    }

    pub fn deprecated_candidates(&self) -> &[TypeExpr] {
        &self.deprecated_candidates
    }

    pub fn allow_save(&self) -> bool {
        self.allow_save
    }

    /// Whether the list edits an existing value
    pub fn is_editing(&self) -> bool {
        self.old.is_some()
    }

    /// Insert `values` at `index`, or at the end
    pub fn insert(&mut self, index: Option<usize>, values: impl IntoIterator<Item = InfoValue>) {
        let index = index.map_or(self.items.len(), |i| i.min(self.items.len()));
        self.items.splice(index..index, values);
    }

    /// Replace the item at `index`
    pub fn replace(&mut self, index: usize, value: InfoValue) -> Result<(), FormError> {
        let slot = self
            .items
            .get_mut(index)
            .ok_or_else(|| FormError::Selection(format!("no item at index {index}")))?;
        *slot = value;
        Ok(())
    }

    /// Remove the items at `indexes`
    pub fn delete(&mut self, indexes: &[usize]) {
        let mut index = 0;
        self.items.retain(|_| {
            let keep = !indexes.contains(&index);
            index += 1;
            keep
        });
        self.selection.clear();
    }

    /// Select `indexes`; out-of-range indexes are ignored
    pub fn select(&mut self, indexes: impl IntoIterator<Item = usize>) {
        let len = self.items.len();
        let mut selection: Vec<usize> = indexes.into_iter().filter(|&i| i < len).collect();
        selection.sort_unstable();
        selection.dedup();
        self.selection = selection;
    }

    pub fn selection(&self) -> &[usize] {
        &self.selection
    }

    /// Remove the selected items
    pub fn delete_selected(&mut self) -> Result<(), FormError> {
        if self.selection.is_empty() {
            return Err(FormError::Selection("select at least one item".into()));
        }
        let selection = std::mem::take(&mut self.selection);
        self.delete(&selection);
        Ok(())
    }

    /// Move the item at `index` one step up (`-1`) or down (`1`).
    ///
    /// Moving past either end does nothing. The moved item becomes the
    /// selection.
    pub fn move_item(&mut self, index: usize, direction: isize) {
        let Some(target) = index.checked_add_signed(direction) else {
            return;
        };
        if index >= self.items.len() || target >= self.items.len() {
            return;
        }
        self.items.swap(index, target);
        self.selection = vec![target];
    }

    /// Move the single selected item
    pub fn move_selection(&mut self, direction: isize) -> Result<(), FormError> {
        let index = self.selected_one()?;
        self.move_item(index, direction);
        Ok(())
    }

    /// Copy the selected run of items; a single item is copied as a value
    pub fn copy_selection(&self, clipboard: &Clipboard) -> Result<(), FormError> {
        let (Some(&first), Some(&last)) = (self.selection.first(), self.selection.last()) else {
            return Err(FormError::Selection("select at least one item".into()));
        };
        let run = self.items[first..=last].to_vec();
        let content = match <[InfoValue; 1]>::try_from(run) {
            Ok([single]) => ClipboardContent::Value(single),
            Err(run) => ClipboardContent::Values(run),
        };
        clipboard.copy(content);
        Ok(())
    }

    /// Append the clipboard content
    pub fn paste(&mut self, clipboard: &Clipboard) {
        if let Some(content) = clipboard.content() {
            self.insert(None, content.into_items());
        }
    }

    /// The sequence described by the editor.
    ///
    /// String items must match a literal alternative unless `str` itself is
    /// accepted.
    pub fn to_value(&self) -> Result<InfoValue, FormError> {
        if !self.element_types.contains(&TypeExpr::STR) {
            for item in &self.items {
                if let InfoValue::Str(s) = item {
                    check_literal(s, self.element_types.literals())?;
                }
            }
        }
        Ok(InfoValue::List(self.items.clone()))
    }

    /// Whether the items changed since the editor was opened
    pub fn modified(&self) -> bool {
        self.items != self.old.clone().unwrap_or_default()
    }

    /// Type to open a nested editor with for the item at `index`
    pub fn edit_target(&self, index: usize) -> Result<(TypeExpr, InfoValue), FormError> {
        let item = self
            .items
            .get(index)
            .ok_or_else(|| FormError::Selection(format!("no item at index {index}")))?;
        let ty = value_type(self.converter.registry(), item)
            .ok_or_else(|| FormError::NotEditable(item.type_label().to_string()))?;
        Ok((ty, item.clone()))
    }

    /// Index of the single selected item
    pub fn selected_one(&self) -> Result<usize, FormError> {
        match self.selection[..] {
            [index] => Ok(index),
            _ => Err(FormError::Selection("select one item".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClasswizConfig;
    use crate::registry::{Deprecation, Registry};
    use crate::types::{ClassSpec, Constant};

    fn converter() -> Arc<Converter> {
        Arc::new(Converter::new(Arc::new(Registry::new()), ClasswizConfig::default()))
    }

    fn ints(values: &[i64]) -> Vec<InfoValue> {
        values.iter().map(|&v| InfoValue::Int(v)).collect()
    }

    #[test]
    fn test_constants_and_candidates() {
        let converter = converter();
        let registry = converter.registry();
        let level = registry.register_class(ClassSpec::enumeration("log", "Level", [("LOW", 1i64), ("HIGH", 2)]));
        let old_sink = registry.register_class(ClassSpec::structure("log", "OldSink"));
        let sink = registry.register_class(ClassSpec::structure("log", "Sink"));
        registry.register_deprecated(old_sink, Deprecation::Class);

        let class = TypeExpr::list_of(TypeExpr::union([
            TypeExpr::class(level),
            TypeExpr::NONE,
            TypeExpr::class(sink),
            TypeExpr::class(old_sink),
        ]));
        let form = ListForm::new(converter, class, None, true).unwrap();

        assert_eq!(form.constants().len(), 3);
        assert_eq!(form.candidates(), [TypeExpr::class(sink)]);
        assert_eq!(form.deprecated_candidates(), [TypeExpr::class(old_sink)]);
    }

    #[test]
    fn test_insert_move_delete() {
        let mut form = ListForm::new(converter(), TypeExpr::list_of(TypeExpr::INT), Some(ints(&[1, 2, 3])), true).unwrap();
        assert!(!form.modified());

        form.insert(Some(1), ints(&[9]));
        assert_eq!(form.items(), ints(&[1, 9, 2, 3]));

        form.select([1]);
        form.move_selection(1).unwrap();
        assert_eq!(form.items(), ints(&[1, 2, 9, 3]));
        assert_eq!(form.selection(), [2]);

        form.move_item(0, -1);
        assert_eq!(form.items(), ints(&[1, 2, 9, 3]));

        form.select([0, 3]);
        assert!(form.move_selection(1).is_err());
        form.delete_selected().unwrap();
        assert_eq!(form.items(), ints(&[2, 9]));
        assert!(form.delete_selected().is_err());
        assert!(form.modified());
    }

    #[test]
    fn test_copy_paste_runs() {
        let clipboard = Clipboard::new();
        let mut form = ListForm::new(converter(), TypeExpr::list_of(TypeExpr::INT), Some(ints(&[1, 2, 3])), true).unwrap();

        form.select([0, 1]);
        form.copy_selection(&clipboard).unwrap();
        form.paste(&clipboard);
        assert_eq!(form.items(), ints(&[1, 2, 3, 1, 2]));

        form.select([2]);
        form.copy_selection(&clipboard).unwrap();
        assert_eq!(clipboard.content(), Some(ClipboardContent::Value(InfoValue::Int(3))));
    }

    #[test]
    fn test_literal_items_validated() {
        let class = TypeExpr::list_of(TypeExpr::literal([Constant::from("r"), Constant::from("w")]));
        let mut form = ListForm::new(converter(), class, None, true).unwrap();
        form.insert(None, [InfoValue::from("r")]);
        assert!(form.to_value().is_ok());

        form.insert(None, [InfoValue::from("x")]);
        assert!(matches!(form.to_value(), Err(FormError::InvalidLiteral { .. })));

        let mut free = ListForm::new(converter(), TypeExpr::list_of(TypeExpr::STR), None, true).unwrap();
        free.insert(None, [InfoValue::from("x")]);
        assert!(free.to_value().is_ok());
    }
}

//! Struct Form
//!
//! Edits the constructor arguments of one class. Every annotated parameter
//! becomes a [`Field`] carrying the resolved type set, the values offered
//! for direct selection, and the types a nested editor can be opened for.
//! Deprecated parameters come after the regular ones, and deprecated
//! parameter types are kept apart from the regular nested-editor
//! candidates.
//!
//! Opened read-only, the form takes its fields from the loaded data instead
//! of the class annotations, so values of classes without a signature can
//! still be inspected.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::trace;

use super::clipboard::{Clipboard, ClipboardContent};
use super::template::{read_template, write_template};
use super::{constant_value, parse_entry, value_type, Entry, FormOptions};
use crate::convert::Converter;
use crate::display::class_name;
use crate::error::{ConvertError, FormError, StaleField};
use crate::object_info::{InfoValue, ObjectData, ObjectInfo};
use crate::registry::DeprecationQuery;
use crate::types::{ClassId, ClassKind, TypeExpr, TypeSet};
use crate::value::EnumMember;

/// One editable parameter
#[derive(Debug, Clone)]
pub struct Field {
    /// Parameter name
    pub name: String,
    /// Resolved alternatives
    pub types: TypeSet,
    /// The parameter itself is deprecated
    pub deprecated: bool,
    /// Members of `types` deprecated for this parameter
    pub deprecated_types: Vec<TypeExpr>,
    /// Values offered for direct selection
    pub choices: Vec<InfoValue>,
    /// Types a nested editor can build a value for
    pub candidates: Vec<TypeExpr>,
    /// Deprecated nested-editor types
    pub deprecated_candidates: Vec<TypeExpr>,
    /// Current input
    pub entry: Entry,
}

impl Field {
    fn offer(&mut self, value: InfoValue) {
        if !self.choices.contains(&value) {
            self.choices.push(value);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    nickname: String,
    entries: Vec<(String, Entry)>,
}

/// Editor for a class's constructor arguments
pub struct StructForm {
    converter: Arc<Converter>,
    class: TypeExpr,
    origin: ClassId,
    fields: IndexMap<String, Field>,
    nickname: String,
    options: FormOptions,
    old: Option<ObjectInfo>,
    snapshot: Snapshot,
}

impl std::fmt::Debug for StructForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructForm")
            .field("class", &self.class)
            .field("fields", &self.fields)
            .field("nickname", &self.nickname)
            .finish_non_exhaustive()
    }
}

impl StructForm {
    /// Open a form for `class`, optionally pre-filled from `old`.
    ///
    /// Fails with [`FormError::NotEditable`] when the class has no
    /// annotations (or, read-only, when there is no data to show).
    pub fn new(
        converter: Arc<Converter>,
        class: TypeExpr,
        old: Option<&ObjectInfo>,
        options: FormOptions,
    ) -> Result<Self, FormError> {
        let registry = converter.registry();
        let name = class_name(registry, &class, true);
        let origin = class.origin().ok_or_else(|| FormError::NotEditable(name.clone()))?;

        let fields = if options.allow_save {
            let annotations = registry.annotations(&class);
            if annotations.is_empty() {
                return Err(FormError::NotEditable(name));
            }
            Self::build_fields(&converter, origin, annotations, &options)?
        } else {
            let old = old.ok_or_else(|| FormError::NotEditable(name))?;
            Self::view_fields(&converter, old, &options)
        };

        let mut form = Self {
            converter,
            class,
            origin,
            fields,
            nickname: String::new(),
            options,
            old: None,
            snapshot: Snapshot {
                nickname: String::new(),
                entries: Vec::new(),
            },
        };
        if let Some(old) = old {
            form.load(old);
        }
        form.snapshot = form.snapshot();
        Ok(form)
    }

    fn build_fields(
        converter: &Converter,
        origin: ClassId,
        annotations: IndexMap<String, TypeExpr>,
        options: &FormOptions,
    ) -> Result<IndexMap<String, Field>, FormError> {
        let registry = converter.registry();
        let (deprecated, regular): (Vec<_>, Vec<_>) = annotations
            .into_iter()
            .partition(|(name, _)| registry.is_deprecated(origin, DeprecationQuery::Parameter(name)));

        let mut fields = IndexMap::new();
        for (is_deprecated, (name, annotation)) in regular
            .into_iter()
            .map(|p| (false, p))
            .chain(deprecated.into_iter().map(|p| (true, p)))
        {
            let types = registry.resolve(&annotation)?;
            let deprecated_types: Vec<TypeExpr> = types
                .iter()
                .filter(|ty| registry.is_deprecated(origin, DeprecationQuery::ParameterType(&name, ty)))
                .cloned()
                .collect();

            let mut field = Field {
                name: name.clone(),
                types,
                deprecated: is_deprecated,
                deprecated_types,
                choices: Vec::new(),
                candidates: Vec::new(),
                deprecated_candidates: Vec::new(),
                entry: Entry::Empty,
            };
            Self::fill_choices(converter, &mut field, options);
            fields.insert(name, field);
        }
        Ok(fields)
    }

    fn fill_choices(converter: &Converter, field: &mut Field, options: &FormOptions) {
        let registry = converter.registry();
        let accepts_bool = field.types.contains(&TypeExpr::BOOL);
        let types: Vec<TypeExpr> = field.types.iter().cloned().collect();

        for ty in types {
            let enum_members = ty
                .origin()
                .and_then(|id| registry.class(id))
                .and_then(|desc| {
                    let members = desc.enum_descriptor()?;
                    (!members.flag).then(|| {
                        members
                            .members
                            .iter()
                            .map(|(_, value)| InfoValue::Enum(EnumMember::new(desc.id, value.clone())))
                            .collect::<Vec<_>>()
                    })
                });

            match &ty {
                TypeExpr::Literal(values) => {
                    for value in values {
                        field.offer(constant_value(value));
                    }
                }
                _ if ty == TypeExpr::BOOL => {
                    field.offer(InfoValue::Bool(true));
                    field.offer(InfoValue::Bool(false));
                }
                _ if ty == TypeExpr::NONE => {
                    if !accepts_bool {
                        field.offer(InfoValue::None);
                    }
                }
                _ if enum_members.is_some() => {
                    for member in enum_members.into_iter().flatten() {
                        field.offer(member);
                    }
                }
                _ if options.allow_save => {
                    if field.deprecated_types.contains(&ty) {
                        field.deprecated_candidates.push(ty.clone());
                    } else {
                        field.candidates.push(ty.clone());
                    }
                }
                _ => {}
            }
        }

        for value in options.additional_values.get(&field.name).into_iter().flatten() {
            field.offer(value.clone());
        }
    }

    fn view_fields(converter: &Converter, old: &ObjectInfo, options: &FormOptions) -> IndexMap<String, Field> {
        let registry = converter.registry();
        old.data()
            .iter()
            .map(|(name, value)| {
                let types: TypeSet = value_type(registry, value).into_iter().collect();
                let mut field = Field {
                    name: name.clone(),
                    types,
                    deprecated: false,
                    deprecated_types: Vec::new(),
                    choices: Vec::new(),
                    candidates: Vec::new(),
                    deprecated_candidates: Vec::new(),
                    entry: Entry::Empty,
                };
                Self::fill_choices(converter, &mut field, options);
                (name.clone(), field)
            })
            .collect()
    }

    /// Edited type
    pub fn class(&self) -> &TypeExpr {
        &self.class
    }

    /// Fields in display order
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Whether saving is enabled
    pub fn allow_save(&self) -> bool {
        self.options.allow_save
    }

    /// Whether the form edits an existing value
    pub fn is_editing(&self) -> bool {
        self.old.is_some()
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn set_nickname(&mut self, nickname: impl Into<String>) {
        self.nickname = nickname.into();
    }

    /// Replace the input of field `name`
    pub fn set_entry(&mut self, name: &str, entry: Entry) -> Result<(), FormError> {
        let field = self.field_mut(name)?;
        field.entry = entry;
        Ok(())
    }

    /// Put `value` into field `name`, adding it to the field's choices
    pub fn select_value(&mut self, name: &str, value: InfoValue) -> Result<(), FormError> {
        let field = self.field_mut(name)?;
        field.offer(value.clone());
        field.entry = Entry::Value(value);
        Ok(())
    }

    fn field_mut(&mut self, name: &str) -> Result<&mut Field, FormError> {
        self.fields
            .get_mut(name)
            .ok_or_else(|| FormError::Selection(format!("no field named '{name}'")))
    }

    /// Fill the form from `old`
    pub fn load(&mut self, old: &ObjectInfo) {
        let hooks = &self.converter.hooks().form_load;
        hooks.run_pre(old);

        for (name, field) in self.fields.iter_mut() {
            let Some(value) = old.get(name) else { continue };
            field.offer(value.clone());
            field.entry = Entry::Value(value.clone());
        }
        self.nickname = old.nickname().unwrap_or_default().to_string();
        self.old = Some(old.clone());

        hooks.run_post(old, ());
    }

    /// Build the object info described by the form.
    ///
    /// Unset fields are left out. Unless `ignore_checks` is set, or the
    /// form was opened without parameter checks, classes are validated by
    /// building them (memoized).
    pub fn to_object_info(&self, ignore_checks: bool) -> Result<ObjectInfo, FormError> {
        let hooks = &self.converter.hooks().form_commit;
        hooks.run_pre(&self.class);

        let mut data = ObjectData::new();
        for (name, field) in &self.fields {
            if let Some(value) = parse_entry(&field.entry, &field.types, &self.converter)? {
                data.insert(name.clone(), value);
            }
        }

        let nickname = Some(self.nickname.clone()).filter(|n| !n.is_empty());
        let info = ObjectInfo::new(self.origin, data).with_nickname(nickname);

        let is_class = self
            .converter
            .registry()
            .class(self.origin)
            .is_some_and(|desc| matches!(desc.kind, ClassKind::Struct));
        if !ignore_checks && self.options.check_parameters && is_class {
            self.converter.materialize_cached(&info.clone().into_value())?;
        }

        Ok(hooks.run_post(&self.class, info))
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            nickname: self.nickname.clone(),
            entries: self
                .fields
                .iter()
                .filter(|(_, field)| !field.entry.is_empty())
                .map(|(name, field)| (name.clone(), field.entry.clone()))
                .collect(),
        }
    }

    /// Whether the input changed since the form was opened
    pub fn modified(&self) -> bool {
        self.snapshot() != self.snapshot
    }

    /// Type to open a nested editor with for the current value of `name`,
    /// and that value.
    pub fn edit_target(&self, name: &str) -> Result<(TypeExpr, InfoValue), FormError> {
        let field = self
            .fields
            .get(name)
            .ok_or_else(|| FormError::Selection(format!("no field named '{name}'")))?;
        let value = parse_entry(&field.entry, &field.types, &self.converter)?
            .ok_or_else(|| FormError::Selection(format!("field '{name}' has no value")))?;

        let registry = self.converter.registry();
        if let Some(info) = value.as_info() {
            return Ok((TypeExpr::class(info.class()), value));
        }

        let plain = value_type(registry, &value)
            .ok_or_else(|| FormError::NotEditable(value.type_label().to_string()))?;
        let is_list = matches!(value, InfoValue::List(_));
        let ty = field
            .types
            .iter()
            .find(|ty| {
                ty.origin() == plain.origin()
                    || (is_list
                        && ty
                            .origin()
                            .and_then(|id| registry.class(id))
                            .is_some_and(|desc| matches!(desc.kind, ClassKind::Sequence)))
            })
            .cloned()
            .unwrap_or(plain);
        trace!(field = name, ty = ?ty, "editing selection");
        Ok((ty, value))
    }

    /// Copy the current value of `name`
    pub fn copy_field(&self, name: &str, clipboard: &Clipboard) -> Result<(), FormError> {
        let field = self
            .fields
            .get(name)
            .ok_or_else(|| FormError::Selection(format!("no field named '{name}'")))?;
        let value = match &field.entry {
            Entry::Empty => return Err(FormError::Selection(format!("field '{name}' has no value"))),
            Entry::Text(text) => InfoValue::Str(text.clone()),
            Entry::Value(value) => value.clone(),
        };
        clipboard.copy(ClipboardContent::Value(value));
        Ok(())
    }

    /// Paste the clipboard into `name`; an empty clipboard is a no-op
    pub fn paste_field(&mut self, name: &str, clipboard: &Clipboard) -> Result<(), FormError> {
        match clipboard.content() {
            Some(content) => self.select_value(name, content.into_value()),
            None => Ok(()),
        }
    }

    /// Save the current input, unchecked, as a template file
    pub fn save_template(&self, path: &Path) -> Result<PathBuf, FormError> {
        let info = self.to_object_info(true)?;
        write_template(&self.converter, &info, path)
    }

    /// Load a template file into the form.
    ///
    /// Fails with [`FormError::TemplateMismatch`] for templates of another
    /// class. Returns the fields dropped while decoding.
    pub fn load_template(&mut self, path: &Path) -> Result<Vec<StaleField>, FormError> {
        let decoded = read_template(&self.converter, path)?;
        let info = decoded
            .info()
            .ok_or_else(|| ConvertError::Malformed("template does not hold an object".into()))?
            .clone();

        if info.class() != self.origin {
            let registry = self.converter.registry();
            return Err(FormError::TemplateMismatch {
                expected: class_name(registry, &self.class, false),
                found: class_name(registry, &TypeExpr::class(info.class()), false),
            });
        }

        self.load(&info);
        Ok(decoded.warnings)
    }
}

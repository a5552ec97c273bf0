//! Edit Session
//!
//! A stack of open editors. The top editor is the one being worked on;
//! every editor below it is waiting for the value the top one will deliver.
//!
//! ```text
//! open(Server)                  [Server]
//! new_field_object("tls", Tls)  [Server, Tls -> Field("tls")]
//! save()                        [Server]        tls field now holds the Tls info
//! save()                        []              output() holds the Server info
//! ```

use std::sync::Arc;

use tracing::debug;

use super::{select_editor, EditorKind, FlagForm, FormOptions, ListForm, ScalarForm, StructForm};
use crate::convert::Converter;
use crate::display::class_name;
use crate::error::FormError;
use crate::object_info::InfoValue;
use crate::types::TypeExpr;

/// Where a saved value goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The session result
    Output,
    /// A field of the struct editor below
    Field(String),
    /// A slot of the list editor below; `None` appends
    Item(Option<usize>),
}

/// Any open editor
#[derive(Debug)]
pub enum Editor {
    Struct(StructForm),
    List(ListForm),
    Scalar(ScalarForm),
    Flag(FlagForm),
}

impl Editor {
    /// Kind of editor
    pub fn kind(&self) -> EditorKind {
        match self {
            Editor::Struct(_) => EditorKind::Struct,
            Editor::List(_) => EditorKind::Iterable,
            Editor::Scalar(form) => form.kind(),
            Editor::Flag(_) => EditorKind::Flag,
        }
    }

    /// Edited type
    pub fn class(&self) -> TypeExpr {
        match self {
            Editor::Struct(form) => form.class().clone(),
            Editor::List(form) => form.class().clone(),
            Editor::Scalar(form) => form.class().clone(),
            Editor::Flag(form) => TypeExpr::class(form.class()),
        }
    }

    /// Value described by the editor, validated
    pub fn to_value(&self) -> Result<InfoValue, FormError> {
        match self {
            Editor::Struct(form) => Ok(form.to_object_info(false)?.into_value()),
            Editor::List(form) => form.to_value(),
            Editor::Scalar(form) => form.to_value(),
            Editor::Flag(form) => Ok(form.to_value()),
        }
    }

    pub fn modified(&self) -> bool {
        match self {
            Editor::Struct(form) => form.modified(),
            Editor::List(form) => form.modified(),
            Editor::Scalar(form) => form.modified(),
            Editor::Flag(form) => form.modified(),
        }
    }

    /// Whether an existing value is being edited
    pub fn is_editing(&self) -> bool {
        match self {
            Editor::Struct(form) => form.is_editing(),
            Editor::List(form) => form.is_editing(),
            Editor::Scalar(form) => form.is_editing(),
            Editor::Flag(form) => form.is_editing(),
        }
    }

    pub fn as_struct_mut(&mut self) -> Option<&mut StructForm> {
        match self {
            Editor::Struct(form) => Some(form),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut ListForm> {
        match self {
            Editor::List(form) => Some(form),
            _ => None,
        }
    }

    pub fn as_scalar_mut(&mut self) -> Option<&mut ScalarForm> {
        match self {
            Editor::Scalar(form) => Some(form),
            _ => None,
        }
    }

    pub fn as_flag_mut(&mut self) -> Option<&mut FlagForm> {
        match self {
            Editor::Flag(form) => Some(form),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Frame {
    editor: Editor,
    target: Target,
}

/// Stack of nested editors
#[derive(Debug)]
pub struct EditSession {
    converter: Arc<Converter>,
    allow_save: bool,
    check_parameters: bool,
    frames: Vec<Frame>,
    output: Option<InfoValue>,
}

impl EditSession {
    /// Empty session; `allow_save = false` opens every editor read-only
    pub fn new(converter: Arc<Converter>, allow_save: bool) -> Self {
        Self {
            converter,
            allow_save,
            check_parameters: true,
            frames: Vec::new(),
            output: None,
        }
    }

    /// Whether struct editors validate by building the object on save
    pub fn with_check_parameters(mut self, check_parameters: bool) -> Self {
        self.check_parameters = check_parameters;
        self
    }

    /// Open an editor for `ty` on top of the stack
    pub fn open(&mut self, ty: TypeExpr, old: Option<InfoValue>, target: Target) -> Result<&mut Editor, FormError> {
        let kind = select_editor(self.converter.registry(), &ty);
        let editor = match kind {
            EditorKind::Struct => {
                let old = match &old {
                    None => None,
                    Some(InfoValue::Info(info)) => Some(&**info),
                    Some(other) => return Err(FormError::NotEditable(other.type_label().to_string())),
                };
                let options = FormOptions {
                    check_parameters: self.check_parameters,
                    allow_save: self.allow_save,
                    ..FormOptions::default()
                };
                Editor::Struct(StructForm::new(Arc::clone(&self.converter), ty, old, options)?)
            }
            EditorKind::Iterable => {
                let items = old.as_ref().and_then(|v| v.as_list()).map(<[InfoValue]>::to_vec);
                Editor::List(ListForm::new(Arc::clone(&self.converter), ty, items, self.allow_save)?)
            }
            EditorKind::Text | EditorKind::Number => {
                Editor::Scalar(ScalarForm::new(Arc::clone(&self.converter), ty, kind, old))
            }
            EditorKind::Flag => {
                let class = ty
                    .origin()
                    .ok_or_else(|| FormError::NotEditable(class_name(self.converter.registry(), &ty, true)))?;
                Editor::Flag(FlagForm::new(self.converter.registry(), class, old.as_ref())?)
            }
        };

        debug!(kind = ?kind, depth = self.frames.len() + 1, "editor opened");
        self.frames.push(Frame { editor, target });
        let frame = self.frames.last_mut().ok_or(FormError::NoFrame)?;
        Ok(&mut frame.editor)
    }

    /// Open an editor for a new `ty` value of field `name` of the top editor
    pub fn new_field_object(&mut self, name: &str, ty: TypeExpr) -> Result<&mut Editor, FormError> {
        self.open(ty, None, Target::Field(name.to_string()))
    }

    /// Open an editor for the current value of field `name` of the top editor
    pub fn edit_field(&mut self, name: &str) -> Result<&mut Editor, FormError> {
        let (ty, value) = match self.top().ok_or(FormError::NoFrame)? {
            Editor::Struct(form) => form.edit_target(name)?,
            _ => return Err(FormError::Selection("the open editor has no fields".into())),
        };
        self.open(ty, Some(value), Target::Field(name.to_string()))
    }

    /// Open an editor for a new `ty` item appended to the top list editor
    pub fn new_item(&mut self, ty: TypeExpr) -> Result<&mut Editor, FormError> {
        self.open(ty, None, Target::Item(None))
    }

    /// Open an editor for the selected item of the top list editor
    pub fn edit_item(&mut self) -> Result<&mut Editor, FormError> {
        let (index, ty, value) = match self.top().ok_or(FormError::NoFrame)? {
            Editor::List(form) => {
                let index = form.selected_one()?;
                let (ty, value) = form.edit_target(index)?;
                (index, ty, value)
            }
            _ => return Err(FormError::Selection("the open editor is not a list".into())),
        };
        self.open(ty, Some(value), Target::Item(Some(index)))
    }

    /// Editor being worked on
    pub fn top(&self) -> Option<&Editor> {
        self.frames.last().map(|f| &f.editor)
    }

    pub fn top_mut(&mut self) -> Option<&mut Editor> {
        self.frames.last_mut().map(|f| &mut f.editor)
    }

    /// Number of open editors
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether every editor has been saved or closed
    pub fn is_closed(&self) -> bool {
        self.frames.is_empty()
    }

    /// `New <type> object` / `Edit <type> object` for the top editor
    pub fn title(&self) -> Option<String> {
        let editor = self.top()?;
        let action = if editor.is_editing() { "Edit" } else { "New" };
        Some(format!(
            "{action} {} object",
            class_name(self.converter.registry(), &editor.class(), true)
        ))
    }

    /// Finish the top editor and deliver its value to its target.
    ///
    /// On failure the editor stays open.
    pub fn save(&mut self) -> Result<InfoValue, FormError> {
        if !self.allow_save {
            return Err(FormError::SaveNotAllowed);
        }
        let frame = self.frames.pop().ok_or(FormError::NoFrame)?;
        let delivered = frame
            .editor
            .to_value()
            .and_then(|value| self.deliver(&frame.target, value.clone()).map(|_| value));

        match delivered {
            Ok(value) => {
                debug!(target = ?frame.target, depth = self.frames.len(), "editor saved");
                Ok(value)
            }
            Err(err) => {
                self.frames.push(frame);
                Err(err)
            }
        }
    }

    fn deliver(&mut self, target: &Target, value: InfoValue) -> Result<(), FormError> {
        if *target == Target::Output {
            self.output = Some(value);
            return Ok(());
        }

        let parent = self.top_mut().ok_or(FormError::NoFrame)?;
        match (target, parent) {
            (Target::Field(name), Editor::Struct(form)) => form.select_value(name, value),
            (Target::Item(Some(index)), Editor::List(form)) => {
                form.replace(*index, value)?;
                form.select([*index]);
                Ok(())
            }
            (Target::Item(None), Editor::List(form)) => {
                form.insert(None, [value]);
                let last = form.items().len() - 1;
                form.select([last]);
                Ok(())
            }
            (target, _) => Err(FormError::Selection(format!(
                "the editor below cannot receive a value for {target:?}"
            ))),
        }
    }

    /// Discard the top editor
    pub fn close(&mut self) -> Result<Editor, FormError> {
        let frame = self.frames.pop().ok_or(FormError::NoFrame)?;
        debug!(depth = self.frames.len(), "editor closed");
        Ok(frame.editor)
    }

    /// Value saved into [`Target::Output`]
    pub fn output(&self) -> Option<&InfoValue> {
        self.output.as_ref()
    }

    pub fn take_output(&mut self) -> Option<InfoValue> {
        self.output.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClasswizConfig;
    use crate::form::Entry;
    use crate::object_info::ObjectInfo;
    use crate::registry::Registry;
    use crate::types::{ClassId, ClassSpec};

    fn converter() -> Arc<Converter> {
        Arc::new(Converter::new(Arc::new(Registry::new()), ClasswizConfig::default()))
    }

    fn classes(converter: &Converter) -> (ClassId, ClassId) {
        let registry = converter.registry();
        let tls = registry.register_class(ClassSpec::structure("net", "Tls").param("cert", TypeExpr::STR).dynamic());
        let server = registry.register_class(
            ClassSpec::structure("net", "Server")
                .param("host", TypeExpr::STR)
                .optional_param("tls", TypeExpr::optional(TypeExpr::class(tls)))
                .optional_param("ports", TypeExpr::list_of(TypeExpr::INT))
                .dynamic(),
        );
        (tls, server)
    }

    #[test]
    fn test_nested_save_delivers_into_parent() {
        let converter = converter();
        let (tls, server) = classes(&converter);
        let mut session = EditSession::new(converter, true);

        session.open(TypeExpr::class(server), None, Target::Output).unwrap();
        assert_eq!(session.title().unwrap(), "New Server object");
        session
            .top_mut()
            .and_then(Editor::as_struct_mut)
            .unwrap()
            .set_entry("host", Entry::Text("example.org".into()))
            .unwrap();

        let editor = session.new_field_object("tls", TypeExpr::class(tls)).unwrap();
        editor
            .as_struct_mut()
            .unwrap()
            .set_entry("cert", Entry::Text("/etc/cert.pem".into()))
            .unwrap();
        assert_eq!(session.depth(), 2);
        session.save().unwrap();
        assert_eq!(session.depth(), 1);

        let saved = session.save().unwrap();
        assert!(session.is_closed());
        assert_eq!(session.output(), Some(&saved));

        let info = saved.as_info().unwrap();
        let tls_info = info.get("tls").unwrap().as_info().unwrap();
        assert_eq!(tls_info.class(), tls);
        assert_eq!(tls_info.get("cert"), Some(&InfoValue::from("/etc/cert.pem")));
    }

    #[test]
    fn test_failed_save_keeps_editor_open() {
        let converter = converter();
        let (_, server) = classes(&converter);
        let mut session = EditSession::new(converter, true);
        session.open(TypeExpr::class(server), None, Target::Output).unwrap();

        let err = session.save().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ConstructionError);
        assert_eq!(session.depth(), 1);
        session.close().unwrap();
        assert!(matches!(session.close(), Err(FormError::NoFrame)));
    }

    #[test]
    fn test_list_item_editing() {
        let converter = converter();
        let (_, server) = classes(&converter);
        let old = ObjectInfo::from_fields(
            server,
            [
                ("host", InfoValue::from("a")),
                ("ports", InfoValue::List(vec![InfoValue::Int(80)])),
            ],
        )
        .into_value();
        let mut session = EditSession::new(converter, true);
        session.open(TypeExpr::class(server), Some(old), Target::Output).unwrap();
        assert_eq!(session.title().unwrap(), "Edit Server object");

        let editor = session.edit_field("ports").unwrap();
        assert_eq!(editor.kind(), EditorKind::Iterable);
        editor.as_list_mut().unwrap().select([0]);

        let item = session.edit_item().unwrap();
        item.as_scalar_mut().unwrap().set_text("443");
        session.save().unwrap();
        session.new_item(TypeExpr::INT).unwrap().as_scalar_mut().unwrap().set_text("8080");
        session.save().unwrap();
        session.save().unwrap();

        let saved = session.save().unwrap();
        assert_eq!(
            saved.as_info().unwrap().get("ports"),
            Some(&InfoValue::List(vec![InfoValue::Int(443), InfoValue::Int(8080)]))
        );
    }

    #[test]
    fn test_read_only_session() {
        let converter = converter();
        let (_, server) = classes(&converter);
        let old = ObjectInfo::from_fields(server, [("host", "a")]).into_value();
        let mut session = EditSession::new(converter, false);
        session.open(TypeExpr::class(server), Some(old), Target::Output).unwrap();
        assert!(matches!(session.save(), Err(FormError::SaveNotAllowed)));
        assert_eq!(session.depth(), 1);
    }
}

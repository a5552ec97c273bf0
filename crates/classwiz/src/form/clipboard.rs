//! Copy / paste slot shared by all editors.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::object_info::InfoValue;

static GLOBAL: Lazy<Arc<Clipboard>> = Lazy::new(|| Arc::new(Clipboard::new()));

/// What was copied last
#[derive(Debug, Clone, PartialEq)]
pub enum ClipboardContent {
    /// A single value
    Value(InfoValue),
    /// A run of list items
    Values(Vec<InfoValue>),
}

impl ClipboardContent {
    /// Content as one value; copied runs become a list
    pub fn into_value(self) -> InfoValue {
        match self {
            ClipboardContent::Value(value) => value,
            ClipboardContent::Values(values) => InfoValue::List(values),
        }
    }

    /// Content as list items to insert
    pub fn into_items(self) -> Vec<InfoValue> {
        match self {
            ClipboardContent::Value(value) => vec![value],
            ClipboardContent::Values(values) => values,
        }
    }
}

/// Single slot, last write wins
#[derive(Debug, Default)]
pub struct Clipboard {
    slot: Mutex<Option<ClipboardContent>>,
}

impl Clipboard {
    /// Empty clipboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide clipboard
    pub fn global() -> Arc<Clipboard> {
        Arc::clone(&GLOBAL)
    }

    /// Replace the content
    pub fn copy(&self, content: ClipboardContent) {
        *self.slot.lock() = Some(content);
    }

    /// Current content
    pub fn content(&self) -> Option<ClipboardContent> {
        self.slot.lock().clone()
    }

    pub fn clear(&self) {
        *self.slot.lock() = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let clipboard = Clipboard::new();
        assert!(clipboard.is_empty());

        clipboard.copy(ClipboardContent::Value(InfoValue::Int(1)));
        clipboard.copy(ClipboardContent::Values(vec![InfoValue::Int(2), InfoValue::Int(3)]));
        let content = clipboard.content().unwrap();
        assert_eq!(content.clone().into_items().len(), 2);
        assert_eq!(
            content.into_value(),
            InfoValue::List(vec![InfoValue::Int(2), InfoValue::Int(3)])
        );

        clipboard.clear();
        assert!(clipboard.content().is_none());
    }
}

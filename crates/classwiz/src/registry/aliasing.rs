//! Display aliases, e.g. `time.Duration` shown as "Timespan".

use super::Registry;
use crate::types::ClassId;

impl Registry {
    /// Display `class` under `alias`
    pub fn register_alias(&self, class: ClassId, alias: impl Into<String>) {
        self.aliases.write().insert(class, alias.into());
        self.touch("alias");
    }

    /// Alias registered for `class`
    pub fn alias(&self, class: ClassId) -> Option<String> {
        self.aliases.read().get(&class).cloned()
    }
}

//! Subcommand implementations.

pub mod check;
pub mod resolve;
pub mod script;
pub mod types;

use std::path::Path;

use anyhow::Context;
use classwiz::{Converter, Decoded};
use tracing::debug;

/// Read and decode a template file, printing stale-field warnings
pub(crate) fn load_template(converter: &Converter, path: &Path) -> anyhow::Result<Decoded> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read template {}", path.display()))?;
    let decoded = converter
        .from_json_str(&text)
        .with_context(|| format!("failed to decode template {}", path.display()))?;
    debug!(path = %path.display(), warnings = decoded.warnings.len(), "template decoded");
    for warning in &decoded.warnings {
        eprintln!("warning: {warning}");
    }
    Ok(decoded)
}

//! `classwiz check` - decode a template and build its object.

use std::path::Path;

use anyhow::Context;
use classwiz::display::describe_value;
use classwiz::Converter;

pub fn execute(converter: &Converter, template: &Path) -> anyhow::Result<()> {
    let decoded = super::load_template(converter, template)?;
    let limit = converter.config().display.character_limit;
    println!("{}", describe_value(converter.registry(), &decoded.value, limit));

    converter
        .materialize(&decoded.value)
        .with_context(|| format!("{} does not build", template.display()))?;

    if decoded.warnings.is_empty() {
        println!("ok");
    } else {
        println!("ok ({} stale field(s) dropped)", decoded.warnings.len());
    }
    Ok(())
}

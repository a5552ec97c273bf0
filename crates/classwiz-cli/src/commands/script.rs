//! `classwiz script` - print the reconstruction code of a template.

use std::path::Path;

use anyhow::Context;
use classwiz::Converter;

pub fn execute(converter: &Converter, template: &Path) -> anyhow::Result<()> {
    let decoded = super::load_template(converter, template)?;
    let script = converter
        .to_script(&decoded.value)
        .context("template cannot be rendered as code")?;
    println!("{}", script.render());
    Ok(())
}

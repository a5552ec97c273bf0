//! `classwiz resolve` - print the concrete types accepted for a type.

use anyhow::Context;
use classwiz::display::class_name;
use classwiz::{Registry, TypeExpr};

pub fn execute(registry: &Registry, name: &str) -> anyhow::Result<()> {
    let class = registry
        .lookup(name)
        .with_context(|| format!("unknown type '{name}'"))?;
    let types = registry
        .resolve(&TypeExpr::class(class))
        .with_context(|| format!("cannot resolve '{name}'"))?;

    for ty in &types {
        println!("{}", class_name(registry, ty, true));
    }
    Ok(())
}

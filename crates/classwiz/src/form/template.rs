//! Template files
//!
//! A template is one encoded object info stored as pretty-printed UTF-8
//! JSON. The configured extension is appended on save when the path does
//! not already end with it.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::debug;

use crate::convert::{Converter, Decoded};
use crate::error::FormError;
use crate::object_info::ObjectInfo;

/// Write `info` as a template; returns the path actually written
pub fn write_template(converter: &Converter, info: &ObjectInfo, path: &Path) -> Result<PathBuf, FormError> {
    let json = converter.to_dict(&info.clone().into_value())?;

    let config = &converter.config().template;
    let indent = vec![b' '; config.indent];
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(&indent));
    json.serialize(&mut serializer)?;

    let path = with_extension(path, converter.config().template_extension());
    fs::write(&path, buf)?;
    debug!(path = %path.display(), "template saved");
    Ok(path)
}

/// Read and decode a template file
pub fn read_template(converter: &Converter, path: &Path) -> Result<Decoded, FormError> {
    let text = fs::read_to_string(path)?;
    let json: serde_json::Value = serde_json::from_str(&text)?;
    Ok(converter.from_dict(&json)?)
}

fn with_extension(path: &Path, extension: &str) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == extension) {
        return path.to_path_buf();
    }
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

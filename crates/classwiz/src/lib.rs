//! Classwiz - Type-Driven Object Construction
//!
//! Builds and edits instances of registered classes from their constructor
//! signatures.
//!
//! This crate provides:
//! - A type model and registry replacing runtime reflection
//! - The type resolver, expanding annotations into concrete type sets
//! - Object info, the editable description of a not-yet-built instance
//! - The converter between live values, object info, JSON templates and
//!   reconstruction scripts
//! - Headless edit forms and nested edit sessions
//!
//! # Usage
//!
//! ```ignore
//! use classwiz::{ClassSpec, Converter, Registry, TypeExpr};
//!
//! let registry = Registry::global();
//! let point = registry.register_class(
//!     ClassSpec::structure("geo", "Point")
//!         .param("x", TypeExpr::FLOAT)
//!         .param("y", TypeExpr::FLOAT)
//!         .dynamic(),
//! );
//!
//! let converter = Converter::global();
//! let info = converter.from_json_str(r#"{"type": "geo.Point", "data": {"x": 1.0, "y": 2.0}}"#)?;
//! let live = converter.materialize(&info.value)?;
//! ```

#![warn(rust_2018_idioms)]

pub mod cache;
pub mod config;
pub mod convert;
pub mod display;
pub mod error;
pub mod extensions;
pub mod form;
pub mod object_info;
pub mod registry;
pub mod stdtypes;
pub mod types;
pub mod value;

pub use config::{ClasswizConfig, ConfigError};
pub use convert::{Converter, Decoded, Hooks, Script};
pub use error::{ConvertError, ErrorKind, FormError, ResolveError, StaleField};
pub use object_info::{InfoValue, ObjectData, ObjectInfo};
pub use registry::{AttributeSource, Deprecation, DeprecationQuery, Registry};
pub use types::{ClassDescriptor, ClassId, ClassKind, ClassSpec, Constant, TypeExpr, TypeSet};
pub use value::{Arguments, DynObject, EnumMember, Instance, Reflect, Value};

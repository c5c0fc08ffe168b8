//! Core shared types for Nova.
//!
//! This crate is intentionally small: Java names, modifiers and text offsets
//! used by every other crate in the workspace.

mod modifiers;
mod name;
mod text;

pub use modifiers::{Modifiers, Visibility};
pub use name::{
    is_java_identifier, is_java_keyword, is_valid_module_name, package_of, simple_name_of,
    Name, QualifiedName,
};
pub use text::{LineCol, LineIndex, TextRange, TextSize};

/// The package whose public types are implicitly visible in every compilation unit.
pub const JAVA_LANG: &str = "java.lang";

/// Fully qualified name of the root of the class hierarchy.
pub const JAVA_LANG_OBJECT: &str = "java.lang.Object";

/// Fully qualified name of the root of the exception hierarchy.
pub const JAVA_LANG_THROWABLE: &str = "java.lang.Throwable";

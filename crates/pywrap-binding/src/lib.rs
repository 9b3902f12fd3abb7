//! Binding generation engine for pywrap.
//!
//! This crate provides:
//! - C++ type descriptors and the marshalling engine
//! - Bindings for fields, methods, functions and whole types (tags)
//! - The module registry that groups bindings by namespace
//! - The printer that renders everything into C++ extension sources
//!
//! # Architecture
//!
//! ```text
//! Decl → Registry::register → Module tree → printer::print → Bindings.{h,cpp}, Extension.{h,cpp}
//! ```

mod decl;
mod error;
mod marshal;
mod registry;
mod template;
mod types;

pub mod binding;
pub mod printer;

pub use decl::{
    AccessSpecifier, ConstructorKind, Decl, DeclKind, EnumDecl, FieldDecl, FunctionDecl, MethodDecl,
    MethodKind, OperatorKind, ParamDecl, RecordDecl, TemplateDecl,
};
pub use error::{BindingError, Result};
pub use marshal::{assign, format_code, from_runtime, result_to_runtime, to_runtime};
pub use printer::Output;
pub use registry::Registry;
pub use template::{canonical_suffix, specialization_name, TemplateMap};
pub use types::{strip_inline_namespaces, CppType, StdKind};

/// Register every declaration in order and render the result.
///
/// Stops at the first declaration the generator cannot represent.
pub fn generate<'a>(extension: &str, decls: impl IntoIterator<Item = &'a Decl>) -> Result<Output> {
    let mut registry = Registry::new(extension);
    for decl in decls {
        registry.register(decl)?;
    }
    Ok(printer::print(&registry))
}

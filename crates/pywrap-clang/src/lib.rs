//! Discovery of annotated C++ declarations for pywrap.
//!
//! This crate provides:
//! - C++ source parsing via libclang
//! - Detection of declarations annotated with `annotate("pyspot")`
//! - Conversion of those cursors into owned [`pywrap_binding::Decl`] values
//!
//! # Architecture
//!
//! ```text
//! C++ Source → libclang → annotated cursors → Vec<Decl>
//! ```

mod cursor;
mod discover;
mod location;
mod parse;
mod types;

pub use cursor::SourceLocation;
pub use discover::ANNOTATION;
pub use location::IncludeResolver;
pub use parse::Discovery;

use miette::Result;
use pywrap_binding::Decl;
use std::path::Path;

/// Discover the annotated declarations of every file, in order.
pub fn discover_files<'a>(
    files: impl IntoIterator<Item = &'a Path>,
    args: &[String],
    include_roots: &[String],
) -> Result<Vec<Decl>> {
    let discovery = Discovery::new()?.with_include_roots(include_roots);
    let mut decls = Vec::new();
    for file in files {
        decls.extend(discovery.parse_file(file, args)?);
    }
    Ok(decls)
}

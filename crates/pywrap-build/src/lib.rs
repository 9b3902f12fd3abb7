//! Project configuration for pywrap.
//!
//! This crate provides:
//! - Project configuration format (`pywrap.toml`)
//! - compile_commands.json parsing
//! - The libclang argument list derived from both
//!
//! # Example
//!
//! ```toml
//! # pywrap.toml
//! sources = ["include/shapes.h"]
//! compile_commands = "build/compile_commands.json"
//!
//! [extension]
//! name = "shapes"
//! output = "generated"
//!
//! [compiler]
//! std = "c++17"
//! includes = ["include"]
//! defines = ["NDEBUG"]
//! ```

mod compile_commands;
mod config;
mod error;

pub use compile_commands::{CompileCommand, CompileCommands};
pub use config::{CompilerConfig, ConfigOverrides, ExtensionConfig, ProjectConfig, DEFAULT_STD};
pub use error::{BuildError, Result};

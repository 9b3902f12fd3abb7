//! Concatenates the module tree into the four generated files.

use crate::error::Result;
use crate::registry::Registry;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const BINDINGS_HEADER: &str = "include/pyspot/Bindings.h";
pub const BINDINGS_SOURCE: &str = "src/pyspot/Bindings.cpp";
pub const EXTENSION_HEADER: &str = "include/pyspot/Extension.h";
pub const EXTENSION_SOURCE: &str = "src/pyspot/Extension.cpp";

/// Generated sources, ready to be written below an output directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    pub bindings_header: String,
    pub bindings_source: String,
    pub extension_header: String,
    pub extension_source: String,
}

impl Output {
    /// Pairs of relative path and contents.
    pub fn files(&self) -> [(&'static str, &str); 4] {
        [
            (BINDINGS_HEADER, &self.bindings_header),
            (BINDINGS_SOURCE, &self.bindings_source),
            (EXTENSION_HEADER, &self.extension_header),
            (EXTENSION_SOURCE, &self.extension_source),
        ]
    }

    /// Write every file below `dir`, creating directories as needed.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for (relative, contents) in self.files() {
            let path = dir.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, contents)?;
            tracing::info!(path = %path.display(), bytes = contents.len(), "wrote");
            written.push(path);
        }
        Ok(written)
    }
}

/// Text writer in the style of a code generator.
struct Writer {
    output: String,
}

impl Writer {
    fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    fn writeln(&mut self, s: &str) {
        self.output.push_str(s);
        self.output.push('\n');
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn open_guard(&mut self, guard: &str) {
        self.writeln(&format!("#ifndef {}", guard));
        self.writeln(&format!("#define {}", guard));
        self.writeln("");
    }

    fn close_guard(&mut self, guard: &str) {
        self.writeln(&format!("#endif // {}", guard));
    }

    fn open_extern_c(&mut self) {
        self.writeln("#ifdef __cplusplus");
        self.writeln("extern \"C\" {");
        self.writeln("#endif");
        self.writeln("");
    }

    fn close_extern_c(&mut self) {
        self.writeln("#ifdef __cplusplus");
        self.writeln("} // extern \"C\"");
        self.writeln("#endif");
        self.writeln("");
    }

    fn finish(self) -> String {
        self.output
    }
}

/// Render the registry into the generated files.
pub fn print(registry: &Registry) -> Output {
    Output {
        bindings_header: bindings_header(registry),
        bindings_source: bindings_source(registry),
        extension_header: extension_header(registry),
        extension_source: extension_source(registry),
    }
}

fn bindings_header(registry: &Registry) -> String {
    let guard = "PYSPOT_BINDINGS_H_";
    let mut w = Writer::new();
    w.open_guard(guard);

    let includes: BTreeSet<&str> = registry.modules().flat_map(|m| m.includes()).collect();
    for include in &includes {
        w.writeln(&format!("#include \"{}\"", include));
    }
    w.writeln("#include <pyspot/Wrapper.h>");
    w.writeln("#include <structmember.h>");
    w.writeln("");

    w.open_extern_c();
    for module in registry.modules() {
        w.write(&module.bindings_decl());
    }
    w.close_extern_c();

    for module in registry.modules() {
        w.write(&module.wrappers_decl());
    }

    w.close_guard(guard);
    w.finish()
}

fn bindings_source(registry: &Registry) -> String {
    let mut w = Writer::new();
    w.writeln("#include \"pyspot/Bindings.h\"");
    w.writeln("");
    w.writeln("#include <Python.h>");
    w.writeln("#include <pyspot/String.h>");
    w.writeln("");

    for module in registry.modules() {
        w.write(&module.bindings_def());
    }
    for module in registry.modules() {
        w.write(&module.wrappers_def());
    }
    w.finish()
}

fn extension_header(registry: &Registry) -> String {
    let guard = "PYSPOT_EXTENSION_H_";
    let mut w = Writer::new();
    w.open_guard(guard);
    w.writeln("#include <Python.h>");
    w.writeln("");

    w.open_extern_c();
    w.writeln("struct ModuleState");
    w.writeln("{");
    w.writeln("\tPyObject* error;");
    w.writeln("};");
    w.writeln("");
    for module in registry.modules() {
        w.write(&module.decl());
    }
    w.close_extern_c();

    for root in registry.roots() {
        if let Some(sign) = root.init_sign() {
            w.writeln(&format!("{};", sign));
        }
    }
    w.writeln("");

    w.close_guard(guard);
    w.finish()
}

fn extension_source(registry: &Registry) -> String {
    let mut w = Writer::new();
    w.writeln("#include \"pyspot/Extension.h\"");
    w.writeln("#include \"pyspot/Bindings.h\"");
    w.writeln("");

    for id in registry.module_ids() {
        w.write(&registry.definition(id));
    }
    w.finish()
}

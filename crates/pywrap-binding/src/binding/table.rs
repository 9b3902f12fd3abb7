//! Null-terminated definition tables: methods, members and accessors.

use super::{Binding, Generate};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Methods,
    Members,
    Accessors,
}

impl TableKind {
    fn element(self) -> &'static str {
        match self {
            TableKind::Methods => "PyMethodDef",
            TableKind::Members => "PyMemberDef",
            TableKind::Accessors => "PyGetSetDef",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            TableKind::Methods => "methods",
            TableKind::Members => "members",
            TableKind::Accessors => "accessors",
        }
    }

    fn sentinel(self) -> &'static str {
        match self {
            TableKind::Methods => "\t{ NULL, NULL, 0, NULL } // sentinel\n",
            TableKind::Members | TableKind::Accessors => "\t{ NULL } // sentinel\n",
        }
    }
}

/// A table whose entries are appended while its owner is being built.
#[derive(Debug, Clone)]
pub struct Table {
    binding: Binding,
    kind: TableKind,
    entries: Vec<String>,
}

impl Table {
    /// An empty table owned by the tag or module `owner`.
    pub fn new(owner: &Binding, kind: TableKind) -> Result<Self> {
        Ok(Self {
            binding: TableGen { owner, kind }.init()?,
            kind,
            entries: Vec::new(),
        })
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn push(&mut self, entry: String) {
        self.entries.push(entry);
    }

    pub fn decl(&self) -> &str {
        self.binding.decl()
    }

    /// Opening line, every entry in insertion order, then the sentinel.
    pub fn def(&self) -> String {
        let mut def = self.binding.def().to_string();
        for entry in &self.entries {
            def.push_str(entry);
        }
        def.push_str(self.kind.sentinel());
        def.push_str("};\n\n");
        def
    }
}

/// One `PyMethodDef` row.
pub(crate) fn method_entry(name: &str, py_name: &str, flags: &str) -> String {
    format!(
        "\t{{ \"{name}\", reinterpret_cast<PyCFunction>( {py_name} ), {flags}, \"{name}\" }},\n"
    )
}

pub struct TableGen<'a> {
    pub owner: &'a Binding,
    pub kind: TableKind,
}

impl Generate for TableGen<'_> {
    fn id(&self) -> String {
        format!("{}::{}", self.owner.id(), self.kind.suffix())
    }

    fn gen_name(&self, _binding: &Binding) -> String {
        self.kind.suffix().to_string()
    }

    fn gen_py_name(&self, binding: &Binding) -> String {
        format!("{}_{}", self.owner.py_name(), binding.name())
    }

    fn gen_sign(&self, binding: &Binding) -> String {
        format!("{} {}[]", self.kind.element(), binding.py_name())
    }

    fn gen_decl(&self, binding: &Binding) -> String {
        format!("extern {};\n\n", binding.sign())
    }

    fn gen_def(&self, binding: &Binding) -> Result<String> {
        Ok(format!("{} = {{\n", binding.sign()))
    }
}

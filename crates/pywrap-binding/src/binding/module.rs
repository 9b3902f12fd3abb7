//! Modules: one per namespace, plus a global one named after the extension.

use super::{simple_name, Binding, Function, Generate, Table, TableKind, Tag, TagKind};
use crate::error::Result;

/// Index of a [`Module`] in the registry's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(pub(crate) usize);

#[derive(Debug, Clone)]
pub struct Module {
    binding: Binding,
    /// Dotted runtime path, e.g. `geo.shapes`
    path: String,
    parent: Option<ModuleId>,
    children: Vec<ModuleId>,
    functions: Vec<Function>,
    enums: Vec<Tag>,
    records: Vec<Tag>,
    templates: Vec<Tag>,
    specializations: Vec<Tag>,
    methods: Table,
    /// Registration statements of every tag, in insertion order
    regs: Vec<String>,
}

impl Module {
    /// A module for the namespace `id` (e.g. `geo::shapes`).
    ///
    /// Root modules are registered as extensions under their own name; nested
    /// ones are reached through the dotted path of their enclosing modules.
    pub fn new(id: &str, parent: Option<ModuleId>) -> Result<Self> {
        let binding = ModuleGen { id }.init()?;
        let methods = Table::new(&binding, TableKind::Methods)?;
        Ok(Self {
            path: id.replace("::", "."),
            binding,
            parent,
            children: Vec::new(),
            functions: Vec::new(),
            enums: Vec::new(),
            records: Vec::new(),
            templates: Vec::new(),
            specializations: Vec::new(),
            methods,
            regs: Vec::new(),
        })
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn id(&self) -> &str {
        self.binding.id()
    }

    pub fn name(&self) -> &str {
        self.binding.name()
    }

    pub fn py_name(&self) -> &str {
        self.binding.py_name()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parent(&self) -> Option<ModuleId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn children(&self) -> &[ModuleId] {
        &self.children
    }

    pub(crate) fn add_child(&mut self, child: ModuleId) {
        self.children.push(child);
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn enums(&self) -> &[Tag] {
        &self.enums
    }

    pub fn records(&self) -> &[Tag] {
        &self.records
    }

    pub fn templates(&self) -> &[Tag] {
        &self.templates
    }

    pub fn specializations(&self) -> &[Tag] {
        &self.specializations
    }

    pub fn add_function(&mut self, function: Function) {
        self.methods.push(function.entry());
        self.functions.push(function);
    }

    pub fn add_tag(&mut self, tag: Tag) {
        self.regs.push(tag.registration(self.py_name()));
        match tag.kind() {
            TagKind::Record => self.records.push(tag),
            TagKind::Enum { .. } => self.enums.push(tag),
            TagKind::Template { .. } => self.templates.push(tag),
            TagKind::Specialization { .. } => self.specializations.push(tag),
        }
    }

    /// Whether a function or tag with identity `id` is already here.
    pub fn contains(&self, id: &str) -> bool {
        self.functions.iter().any(|f| f.binding().id() == id) || self.tags().any(|t| t.id() == id)
    }

    /// Every tag, grouped by kind. Specializations precede their templates.
    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.enums
            .iter()
            .chain(&self.records)
            .chain(&self.specializations)
            .chain(&self.templates)
    }

    /// Headers the declarations of this module come from.
    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.functions
            .iter()
            .map(|f| f.include())
            .chain(self.tags().map(|t| t.include()))
            .filter(|i| !i.is_empty())
    }

    /// Declarations of every function and tag.
    pub fn bindings_decl(&self) -> String {
        let mut decl: String = self.functions.iter().map(|f| f.binding().decl()).collect();
        for tag in self.tags() {
            decl.push_str(&tag.decl());
        }
        decl
    }

    pub fn bindings_def(&self) -> String {
        let mut def: String = self.functions.iter().map(|f| f.binding().def()).collect();
        for tag in self.tags() {
            def.push_str(&tag.def());
        }
        def
    }

    /// `pyspot::Wrapper` specializations; these live outside the C linkage block.
    pub fn wrappers_decl(&self) -> String {
        self.tags().filter_map(|t| t.wrapper()).map(|w| w.decl()).collect()
    }

    pub fn wrappers_def(&self) -> String {
        self.tags().filter_map(|t| t.wrapper()).map(|w| w.def()).collect()
    }

    pub fn module_def_name(&self) -> String {
        format!("{}_module_def", self.py_name())
    }

    /// Declarations of the methods table and the module definition.
    pub fn decl(&self) -> String {
        format!(
            "{}extern PyModuleDef {};\n\n",
            self.methods.decl(),
            self.module_def_name()
        )
    }

    /// Module name, methods table and module definition.
    pub fn def(&self) -> String {
        let py = self.py_name();
        format!(
            "char {py}_name[] = \"{path}\";\n\n\
             {methods}\
             PyModuleDef {module_def} {{\n\
             \tPyModuleDef_HEAD_INIT,\n\
             \t{py}_name,\n\
             \tnullptr,\n\
             \tsizeof( ModuleState ),\n\
             \t{methods_name},\n\
             \tnullptr,\n\
             \tnullptr,\n\
             \tnullptr,\n\
             \tnullptr,\n\
             }};\n\n",
            path = self.path,
            methods = self.methods.def(),
            module_def = self.module_def_name(),
            methods_name = self.methods.binding().py_name(),
        )
    }

    /// Signature of the extension entry point, for root modules.
    pub fn init_sign(&self) -> Option<String> {
        self.is_root()
            .then(|| format!("PyMODINIT_FUNC PyInit_{}()", self.name()))
    }

    /// Statements creating the module object and its exception.
    pub(crate) fn create(&self) -> String {
        let py = self.py_name();
        format!(
            "\tauto {py} = PyModule_Create( &{module_def} );\n\n\
             \tstatic char {py}_exception_name[] = {{ \"{path}.exception\" }};\n\
             \tauto {py}_exception = PyErr_NewException( {py}_exception_name, NULL, NULL );\n\
             \tPy_INCREF( {py}_exception );\n\
             \tPyModule_AddObject( {py}, \"exception\", {py}_exception );\n\n",
            module_def = self.module_def_name(),
            path = self.path,
        )
    }

    /// Registration statements of this module's own tags.
    pub(crate) fn regs(&self) -> String {
        self.regs.concat()
    }
}

pub struct ModuleGen<'a> {
    pub id: &'a str,
}

impl Generate for ModuleGen<'_> {
    fn id(&self) -> String {
        self.id.to_string()
    }

    fn gen_name(&self, binding: &Binding) -> String {
        simple_name(binding.id()).to_string()
    }

    fn gen_decl(&self, _binding: &Binding) -> String {
        String::new()
    }

    fn gen_def(&self, _binding: &Binding) -> Result<String> {
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{Decl, DeclKind, ParamDecl};
    use crate::types::CppType;

    #[test]
    fn test_names() {
        let module = Module::new("geo::shapes", Some(ModuleId(0))).unwrap();
        assert_eq!(module.name(), "shapes");
        assert_eq!(module.py_name(), "py_geo__shapes");
        assert_eq!(module.path(), "geo.shapes");
        assert!(!module.is_root());
        assert!(module.init_sign().is_none());
    }

    #[test]
    fn test_module_def() {
        let mut module = Module::new("ns", None).unwrap();
        let decl = Decl::function(
            "ns::add",
            vec![
                ParamDecl::new("a", CppType::int()),
                ParamDecl::new("b", CppType::int()),
            ],
            CppType::int(),
        )
        .with_include("ns/math.h");
        let DeclKind::Function(f) = &decl.kind else {
            unreachable!()
        };
        module.add_function(Function::new(&decl, f).unwrap());

        assert!(module.contains("ns::add"));
        assert_eq!(module.includes().collect::<Vec<_>>(), vec!["ns/math.h"]);
        assert_eq!(
            module.decl(),
            "extern PyMethodDef py_ns_methods[];\n\nextern PyModuleDef py_ns_module_def;\n\n"
        );
        assert_eq!(module.init_sign().as_deref(), Some("PyMODINIT_FUNC PyInit_ns()"));

        insta::assert_snapshot!(module.def(), @r###"
        char py_ns_name[] = "ns";

        PyMethodDef py_ns_methods[] = {
        	{ "add", reinterpret_cast<PyCFunction>( py_ns__add ), METH_VARARGS | METH_KEYWORDS, "add" },
        	{ NULL, NULL, 0, NULL } // sentinel
        };

        PyModuleDef py_ns_module_def {
        	PyModuleDef_HEAD_INIT,
        	py_ns_name,
        	nullptr,
        	sizeof( ModuleState ),
        	py_ns_methods,
        	nullptr,
        	nullptr,
        	nullptr,
        	nullptr,
        };
        "###);
    }

    #[test]
    fn test_tags_grouped_by_kind() {
        let mut module = Module::new("paint", None).unwrap();
        let color = Decl::enumeration("paint::Color", &["Red"], false);
        let DeclKind::Enum(e) = &color.kind else {
            unreachable!()
        };
        module.add_tag(Tag::enumeration(&color, e).unwrap());

        assert_eq!(module.enums().len(), 1);
        assert!(module.contains("paint::Color"));
        assert!(module.regs().contains("PyModule_AddObject( py_paint, \"Color\""));
        assert!(module.wrappers_decl().contains("pyspot::Wrapper<paint::Color>::Wrapper( paint::Color* v );"));
    }
}

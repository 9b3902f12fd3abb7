//! The module registry: the single mutable structure of a generation pass.
//!
//! Modules live in an arena and refer to each other by [`ModuleId`], so
//! growing the tree never invalidates a parent or child link.

use crate::binding::{Function, Module, ModuleId, Tag};
use crate::decl::{AccessSpecifier, Decl, DeclKind, RecordDecl, TemplateDecl};
use crate::error::Result;
use indexmap::IndexMap;
use rustc_hash::FxHashSet;

pub struct Registry {
    /// Name of the extension; global-scope declarations go in a root
    /// module with this name.
    extension: String,
    modules: Vec<Module>,
    roots: IndexMap<String, ModuleId>,
    /// Records whose field types are being registered
    pending: FxHashSet<String>,
}

impl Registry {
    pub fn new(extension: &str) -> Self {
        Self {
            extension: extension.to_string(),
            modules: Vec::new(),
            roots: IndexMap::new(),
            pending: FxHashSet::default(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.0]
    }

    /// Every module, in creation order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }

    /// Root modules, in creation order.
    pub fn roots(&self) -> impl Iterator<Item = &Module> {
        self.roots.values().map(|&id| self.module(id))
    }

    /// Look up a module by its namespace identity.
    pub fn find_module(&self, id: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.id() == id)
    }

    /// The module for `namespace` (outermost first), creating it and any
    /// missing ancestors.
    pub fn get_or_create_module(&mut self, namespace: &[String]) -> Result<ModuleId> {
        let Some((name, outer)) = namespace.split_last() else {
            let global = [self.extension.clone()];
            return self.get_or_create_module(&global);
        };

        if outer.is_empty() {
            if let Some(&id) = self.roots.get(name) {
                return Ok(id);
            }
            let id = self.push(Module::new(name, None)?);
            self.roots.insert(name.clone(), id);
            tracing::debug!(module = %name, "created root module");
            return Ok(id);
        }

        let parent = self.get_or_create_module(outer)?;
        let qualified = namespace.join("::");
        let existing = self
            .module(parent)
            .children()
            .iter()
            .copied()
            .find(|&child| self.module(child).id() == qualified);
        if let Some(id) = existing {
            return Ok(id);
        }

        let id = self.push(Module::new(&qualified, Some(parent))?);
        self.module_mut(parent).add_child(id);
        tracing::debug!(module = %qualified, "created nested module");
        Ok(id)
    }

    fn push(&mut self, module: Module) -> ModuleId {
        self.modules.push(module);
        ModuleId(self.modules.len() - 1)
    }

    /// Register an annotated declaration.
    ///
    /// Registering the same declaration twice is a no-op. Records also
    /// register the user types of their public fields first, so a wrapped
    /// field type is always ready before the record that exposes it.
    pub fn register(&mut self, decl: &Decl) -> Result<()> {
        let module = self.get_or_create_module(&decl.namespace)?;
        if self.module(module).contains(&decl.qualified_name) || self.pending.contains(&decl.qualified_name) {
            tracing::debug!(decl = %decl.qualified_name, "already registered");
            return Ok(());
        }

        match &decl.kind {
            DeclKind::Function(function) => {
                let function = Function::new(decl, function)?;
                self.module_mut(module).add_function(function);
            }
            DeclKind::Enum(enumeration) => {
                let tag = Tag::enumeration(decl, enumeration)?;
                self.module_mut(module).add_tag(tag);
            }
            DeclKind::Record(record) => match &record.template {
                Some(template) => self.register_template(module, decl, record, template)?,
                None => {
                    self.pending.insert(decl.qualified_name.clone());
                    let registered = self.register_field_types(record);
                    self.pending.remove(&decl.qualified_name);
                    registered?;
                    let tag = Tag::record(decl, record)?;
                    self.module_mut(module).add_tag(tag);
                }
            },
        }
        tracing::debug!(decl = %decl.qualified_name, "registered");
        Ok(())
    }

    fn register_field_types(&mut self, record: &RecordDecl) -> Result<()> {
        let field_decls = record
            .fields
            .iter()
            .filter(|f| f.access == AccessSpecifier::Public)
            .filter_map(|f| f.type_decl.as_deref())
            .filter(|d| !d.namespace.first().is_some_and(|ns| ns == "std"));
        for field_decl in field_decls {
            self.register(field_decl)?;
        }
        Ok(())
    }

    /// Register a class template and one specialization per instantiation.
    fn register_template(
        &mut self,
        module: ModuleId,
        decl: &Decl,
        record: &RecordDecl,
        template: &TemplateDecl,
    ) -> Result<()> {
        let mut tag = Tag::template(decl)?;
        let mut specializations: Vec<Tag> = Vec::new();

        for args in &template.specializations {
            let instance = Tag::specialization(decl, record, template, args)?;
            if specializations.iter().any(|s| s.id() == instance.id()) {
                tracing::debug!(specialization = %instance.id(), "duplicate instantiation");
                continue;
            }
            tag.add_specialization(&instance)?;
            tracing::debug!(specialization = %instance.id(), "created specialization");
            specializations.push(instance);
        }

        let module = self.module_mut(module);
        for instance in specializations {
            module.add_tag(instance);
        }
        module.add_tag(tag);
        Ok(())
    }

    /// Registration statements of the nested module `id`: create it, fill
    /// it, then attach it to its parent.
    pub fn registration(&self, id: ModuleId) -> String {
        let module = self.module(id);
        let mut reg = module.create();
        reg.push_str(&module.regs());
        for &child in module.children() {
            reg.push_str(&self.registration(child));
        }
        if let Some(parent) = module.parent() {
            reg.push_str(&format!(
                "\tPyModule_AddObject( {}, \"{}\", {} );\n\n",
                self.module(parent).py_name(),
                module.name(),
                module.py_name()
            ));
        }
        reg
    }

    /// Module definition text; for a root module this includes its
    /// extension entry point.
    pub fn definition(&self, id: ModuleId) -> String {
        let module = self.module(id);
        let mut def = module.def();
        if let Some(sign) = module.init_sign() {
            def.push_str(&format!("{}\n{{\n", sign));
            def.push_str(&module.create());
            def.push_str(&module.regs());
            for &child in module.children() {
                def.push_str(&self.registration(child));
            }
            def.push_str(&format!("\treturn {};\n}}\n\n", module.py_name()));
        }
        def
    }

    /// Module ids in creation order, for callers that walk the arena.
    pub fn module_ids(&self) -> impl Iterator<Item = ModuleId> {
        (0..self.modules.len()).map(ModuleId)
    }
}

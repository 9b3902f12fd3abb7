use super::params::{call_body, method_flags};
use super::table::method_entry;
use super::{Binding, Generate};
use crate::decl::MethodDecl;
use crate::error::Result;
use crate::template::TemplateMap;

/// A wrapped public member function of a Tag.
#[derive(Debug, Clone)]
pub struct Method {
    binding: Binding,
    flags: String,
}

impl Method {
    pub fn new(tag: &Binding, method: &MethodDecl, map: &TemplateMap) -> Result<Self> {
        Ok(Self {
            binding: MethodGen { tag, method, map }.init()?,
            flags: method_flags(&method.params, method.is_static),
        })
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Entry of the owning tag's methods table.
    pub fn entry(&self) -> String {
        method_entry(self.binding.name(), self.binding.py_name(), &self.flags)
    }
}

pub struct MethodGen<'a> {
    pub tag: &'a Binding,
    pub method: &'a MethodDecl,
    pub map: &'a TemplateMap,
}

impl Generate for MethodGen<'_> {
    fn id(&self) -> String {
        format!("{}::{}", self.tag.id(), self.method.name)
    }

    fn gen_name(&self, _binding: &Binding) -> String {
        self.method.name.clone()
    }

    fn gen_py_name(&self, binding: &Binding) -> String {
        format!("{}_method_{}", self.tag.py_name(), binding.name())
    }

    fn gen_sign(&self, binding: &Binding) -> String {
        format!(
            "PyObject* {}( _PyspotWrapper* self, PyObject* args, PyObject* kwds )",
            binding.py_name()
        )
    }

    fn gen_def(&self, binding: &Binding) -> Result<String> {
        let ty = self.tag.id();
        let mut def = format!("{}\n{{\n", binding.sign());
        let callee = if self.method.is_static {
            format!("{}::{}", ty, self.method.name)
        } else {
            def.push_str(&format!(
                "\tauto data = reinterpret_cast<{}*>( self->data );\n",
                ty
            ));
            format!("data->{}", self.method.name)
        };

        def.push_str(&call_body(
            &self.method.params,
            &self.method.return_type,
            &callee,
            self.map,
        )?);
        def.push_str("}\n\n");
        Ok(def)
    }
}

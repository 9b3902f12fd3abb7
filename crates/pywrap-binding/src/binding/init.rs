use super::params::param_block;
use super::{Binding, Generate};
use crate::decl::MethodDecl;
use crate::error::Result;
use crate::template::TemplateMap;

/// Generates `tp_init`, dispatching on the number of supplied arguments.
///
/// A wrapper that already points at native data (one created from C++) is
/// left untouched. Otherwise the default constructor handles the empty call
/// and every other public constructor gets one block keyed on its arity.
/// Two constructors with the same arity share a count, so the first one whose
/// arguments parse wins.
pub struct InitGen<'a> {
    pub tag: &'a Binding,
    pub ctors: Vec<&'a MethodDecl>,
    pub has_default_ctor: bool,
    /// False for class templates, which are never instantiated directly
    pub holds_value: bool,
    pub map: &'a TemplateMap,
}

impl Generate for InitGen<'_> {
    fn id(&self) -> String {
        format!("{}::init", self.tag.id())
    }

    fn gen_name(&self, _binding: &Binding) -> String {
        "init".to_string()
    }

    fn gen_py_name(&self, binding: &Binding) -> String {
        format!("{}_{}", self.tag.py_name(), binding.name())
    }

    fn gen_sign(&self, binding: &Binding) -> String {
        format!(
            "int {}( _PyspotWrapper* self, PyObject* args, PyObject* kwds )",
            binding.py_name()
        )
    }

    fn gen_def(&self, binding: &Binding) -> Result<String> {
        let mut def = format!("{}\n{{\n", binding.sign());
        if !self.holds_value {
            def.push_str("\treturn 0;\n}\n\n");
            return Ok(def);
        }

        let ty = self.tag.id();
        def.push_str(
            "\tif ( self->data )\n\t{\n\t\treturn 0;\n\t}\n\n\
             \tauto args_size = args ? PyTuple_Size( args ) : 0;\n\
             \tauto kwds_size = kwds ? PyDict_Size( kwds ) : 0;\n\n",
        );

        if self.has_default_ctor {
            def.push_str(&format!(
                "\tif ( args_size == 0 && kwds_size == 0 )\n\t{{\n\
                 \t\tself->data = new {ty}{{}};\n\
                 \t\tself->own_data = true;\n\
                 \t\treturn 0;\n\
                 \t}}\n\n"
            ));
        }

        for ctor in &self.ctors {
            let block = param_block(&ctor.params, self.map, 2, "")?;
            def.push_str(&format!(
                "\tif ( ( args_size + kwds_size ) == {count} )\n\t{{\n\
                 {statements}\
                 \t\tif ( PyArg_ParseTupleAndKeywords( args, kwds, fmt, kwlist{parse_args} ) )\n\t\t{{\n\
                 \t\t\tself->data = new {ty}{{ {call_args} }};\n\
                 \t\t\tself->own_data = true;\n\
                 \t\t\treturn 0;\n\
                 \t\t}}\n\
                 \t}}\n\n",
                count = ctor.params.len(),
                statements = block.statements,
                parse_args = block.parse_args,
                call_args = block.call_args,
            ));
        }

        def.push_str("\treturn -1;\n}\n\n");
        Ok(def)
    }
}

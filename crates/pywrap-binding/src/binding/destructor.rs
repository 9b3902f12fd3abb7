use super::{Binding, Generate};
use crate::error::Result;

/// Generates `tp_dealloc`: deletes the native value when the wrapper owns it.
pub struct DestructorGen<'a> {
    pub tag: &'a Binding,
    /// False for class templates, which never hold a value
    pub holds_value: bool,
}

impl Generate for DestructorGen<'_> {
    fn id(&self) -> String {
        format!("{}::dealloc", self.tag.id())
    }

    fn gen_name(&self, _binding: &Binding) -> String {
        "dealloc".to_string()
    }

    fn gen_py_name(&self, binding: &Binding) -> String {
        format!("{}_{}", self.tag.py_name(), binding.name())
    }

    fn gen_sign(&self, binding: &Binding) -> String {
        format!("void {}( _PyspotWrapper* self )", binding.py_name())
    }

    fn gen_def(&self, binding: &Binding) -> Result<String> {
        let mut def = format!("{}\n{{\n", binding.sign());
        if self.holds_value {
            def.push_str(&format!(
                "\tif ( self->own_data )\n\t{{\n\
                 \t\tdelete reinterpret_cast<{}*>( self->data );\n\
                 \t}}\n",
                self.tag.id()
            ));
        }
        def.push_str("\tPy_TYPE( self )->tp_free( reinterpret_cast<PyObject*>( self ) );\n}\n\n");
        Ok(def)
    }
}

use super::{Binding, Generate};
use crate::error::Result;

/// Generates the static `PyTypeObject` of a Tag.
///
/// Every hook is referenced by the runtime name of an already initialized
/// sibling binding, so this runs last among a Tag's type-level bindings.
pub struct TypeObjectGen<'a> {
    pub tag: &'a Binding,
    pub destructor: &'a Binding,
    pub compare: &'a Binding,
    pub methods: &'a Binding,
    pub members: &'a Binding,
    pub accessors: &'a Binding,
    pub init: &'a Binding,
}

impl Generate for TypeObjectGen<'_> {
    fn id(&self) -> String {
        format!("{}::type_object", self.tag.id())
    }

    fn gen_name(&self, _binding: &Binding) -> String {
        format!("{}_type_object", self.tag.py_name())
    }

    fn gen_py_name(&self, binding: &Binding) -> String {
        binding.name().to_string()
    }

    fn gen_sign(&self, binding: &Binding) -> String {
        format!("PyTypeObject {}", binding.py_name())
    }

    fn gen_decl(&self, binding: &Binding) -> String {
        format!("extern {};\n\n", binding.sign())
    }

    fn gen_def(&self, binding: &Binding) -> Result<String> {
        let name = self.tag.id();
        Ok(format!(
            "{sign} = {{\n\
             \tPyVarObject_HEAD_INIT( NULL, 0 )\n\n\
             \t\"{name}\", // name\n\
             \tsizeof( _PyspotWrapper ), // basicsize\n\
             \t0, // itemsize\n\n\
             \treinterpret_cast<destructor>( {dealloc} ), // dealloc\n\
             \t0, // print\n\
             \t0, // getattr\n\
             \t0, // setattr\n\
             \t0, // compare\n\
             \t0, // repr\n\n\
             \t0, // as_number\n\
             \t0, // as_sequence\n\
             \t0, // as_mapping\n\n\
             \t0, // hash\n\
             \t0, // call\n\
             \t0, // str\n\
             \t0, // getattro\n\
             \t0, // setattro\n\n\
             \t0, // as_buffer\n\n\
             \tPy_TPFLAGS_DEFAULT | Py_TPFLAGS_BASETYPE, // flags\n\n\
             \t\"{name}\", // doc\n\n\
             \t0, // traverse\n\n\
             \t0, // clear\n\n\
             \treinterpret_cast<richcmpfunc>( {cmp} ), // richcompare\n\n\
             \t0, // weaklistoffset\n\n\
             \t0, // iter\n\
             \t0, // iternext\n\n\
             \t{methods}, // methods\n\
             \t{members}, // members\n\
             \t{accessors}, // getset\n\
             \t0, // base\n\
             \t0, // dict\n\
             \t0, // descr_get\n\
             \t0, // descr_set\n\
             \t0, // dictoffset\n\
             \treinterpret_cast<initproc>( {init} ), // init\n\
             \t0, // alloc\n\
             \tPyspotWrapper_New, // new\n\
             }};\n\n",
            sign = binding.sign(),
            dealloc = self.destructor.py_name(),
            cmp = self.compare.py_name(),
            methods = self.methods.py_name(),
            members = self.members.py_name(),
            accessors = self.accessors.py_name(),
            init = self.init.py_name(),
        ))
    }
}

//! `__class_getitem__` for class templates: `Box[int]` yields the type
//! object of `Box<int>`.

use super::{Binding, Generate};
use crate::error::{BindingError, Result};
use crate::types::{CppType, StdKind};

#[derive(Debug, Clone)]
pub struct ClassGetitem {
    binding: Binding,
    /// Runtime type name each branch matches, parallel to `branches`
    keys: Vec<String>,
    branches: Vec<String>,
}

impl ClassGetitem {
    pub fn new(template: &Binding) -> Result<Self> {
        Ok(Self {
            binding: ClassGetitemGen { template }.init()?,
            keys: Vec::new(),
            branches: Vec::new(),
        })
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Add a branch returning `type_object` when subscripted with `args`.
    ///
    /// Only single-argument instantiations can be matched. Arguments that
    /// share a runtime type (`float` and `double`) keep the first branch.
    pub fn add(&mut self, args: &[CppType], type_object: &str) -> Result<()> {
        let [arg] = args else {
            return Err(BindingError::MultipleTemplateArguments {
                template: self.binding.id().to_string(),
                count: args.len(),
            });
        };

        let key = runtime_type_name(arg);
        if self.keys.contains(&key) {
            tracing::warn!(
                template = %self.binding.id(),
                key = %key,
                skipped = %type_object,
                "subscript already dispatched for this runtime type"
            );
            return Ok(());
        }

        self.branches.push(format!(
            "\tif ( item_type->tp_name == \"{key}\"s )\n\t{{\n\
             \t\tPy_INCREF( &{type_object} );\n\
             \t\treturn reinterpret_cast<PyObject*>( &{type_object} );\n\
             \t}}\n\n"
        ));
        self.keys.push(key);
        Ok(())
    }

    /// Entry of the template's methods table.
    pub fn entry(&self) -> String {
        format!(
            "\t{{ \"__class_getitem__\", reinterpret_cast<PyCFunction>( {} ), METH_O | METH_CLASS, \"__class_getitem__\" }},\n",
            self.binding.py_name()
        )
    }

    pub fn decl(&self) -> &str {
        self.binding.decl()
    }

    pub fn def(&self) -> String {
        let mut def = self.binding.def().to_string();
        for branch in &self.branches {
            def.push_str(branch);
        }
        def.push_str("\treturn nullptr;\n}\n\n");
        def
    }
}

/// `tp_name` of the runtime type a native argument corresponds to.
fn runtime_type_name(ty: &CppType) -> String {
    if ty.is_boolean() {
        "bool".to_string()
    } else if ty.is_integer() {
        "int".to_string()
    } else if ty.is_floating() {
        "float".to_string()
    } else if ty.is_char_pointer() || ty.std_kind() == Some(StdKind::String) {
        "str".to_string()
    } else {
        ty.spelling()
    }
}

pub struct ClassGetitemGen<'a> {
    pub template: &'a Binding,
}

impl Generate for ClassGetitemGen<'_> {
    fn id(&self) -> String {
        format!("{}::__class_getitem__", self.template.id())
    }

    fn gen_name(&self, _binding: &Binding) -> String {
        "__class_getitem__".to_string()
    }

    fn gen_py_name(&self, _binding: &Binding) -> String {
        format!("{}_class_getitem", self.template.py_name())
    }

    fn gen_sign(&self, binding: &Binding) -> String {
        format!("PyObject* {}( PyObject* type, PyObject* item )", binding.py_name())
    }

    fn gen_def(&self, binding: &Binding) -> Result<String> {
        Ok(format!(
            "{}\n{{\n\
             \tusing namespace std::literals;\n\
             \tauto item_type = reinterpret_cast<PyTypeObject*>( item );\n\n",
            binding.sign()
        ))
    }
}

use super::{Binding, Generate};
use crate::error::Result;

/// Generates the `pyspot::Wrapper<T>` constructor specializations that lift a
/// native value into a fresh runtime object.
///
/// The pointer form never takes ownership. The copy and move forms allocate
/// a new value that the wrapper owns, and are emitted only when the native
/// type supports the operation.
pub struct WrapperGen<'a> {
    pub tag: &'a Binding,
    pub type_object: &'a Binding,
    pub copyable: bool,
    pub movable: bool,
}

#[derive(Clone, Copy)]
enum Form {
    Pointer,
    Copy,
    Move,
}

impl WrapperGen<'_> {
    fn forms(&self) -> Vec<Form> {
        let mut forms = vec![Form::Pointer];
        if self.copyable {
            forms.push(Form::Copy);
        }
        if self.movable {
            forms.push(Form::Move);
        }
        forms
    }

    fn param(&self, form: Form) -> String {
        let ty = self.tag.id();
        match form {
            Form::Pointer => format!("{}* v", ty),
            Form::Copy => format!("const {}& v", ty),
            Form::Move => format!("{}&& v", ty),
        }
    }

    fn constructor(&self, sign: &str, form: Form) -> String {
        let ty = self.tag.id();
        let type_object = self.type_object.py_name();
        let (payload, owns) = match form {
            Form::Pointer => ("v".to_string(), ""),
            Form::Copy => (format!("new {} {{ v }}", ty), "\twrapper->own_data = true;\n"),
            Form::Move => (
                format!("new {} {{ std::move( v ) }}", ty),
                "\twrapper->own_data = true;\n",
            ),
        };

        format!(
            "{sign}{param} )\n\
             :\tpyspot::Object {{\n\t\t(\n\
             \t\t\tPyType_Ready( &{type_object} ),\n\
             \t\t\tPyspotWrapper_New( &{type_object}, nullptr, nullptr )\n\
             \t\t)\n\t}}\n\
             ,\tpayload {{ {payload} }}\n{{\n\
             \tauto wrapper = reinterpret_cast<_PyspotWrapper*>( object );\n\
             \twrapper->data = payload;\n\
             {owns}\
             }}\n\n",
            param = self.param(form),
        )
    }
}

impl Generate for WrapperGen<'_> {
    fn id(&self) -> String {
        format!("pyspot::Wrapper<{}>", self.tag.id())
    }

    fn gen_name(&self, _binding: &Binding) -> String {
        "Wrapper".to_string()
    }

    fn gen_sign(&self, binding: &Binding) -> String {
        format!("template<>\n{}::Wrapper( ", binding.id())
    }

    fn gen_decl(&self, binding: &Binding) -> String {
        self.forms()
            .into_iter()
            .map(|form| format!("{}{} );\n\n", binding.sign(), self.param(form)))
            .collect()
    }

    fn gen_def(&self, binding: &Binding) -> Result<String> {
        Ok(self
            .forms()
            .into_iter()
            .map(|form| self.constructor(binding.sign(), form))
            .collect())
    }
}

use super::params::{call_body, method_flags};
use super::table::method_entry;
use super::{simple_name, Binding, Generate};
use crate::decl::{Decl, FunctionDecl};
use crate::error::Result;
use crate::template::TemplateMap;

/// A wrapped free function, exposed through its module's methods table.
#[derive(Debug, Clone)]
pub struct Function {
    binding: Binding,
    include: String,
    flags: String,
}

impl Function {
    pub fn new(decl: &Decl, function: &FunctionDecl) -> Result<Self> {
        Ok(Self {
            binding: FunctionGen { decl, function }.init()?,
            include: decl.include.clone(),
            flags: method_flags(&function.params, false),
        })
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn include(&self) -> &str {
        &self.include
    }

    /// Entry of the owning module's methods table.
    pub fn entry(&self) -> String {
        method_entry(self.binding.name(), self.binding.py_name(), &self.flags)
    }
}

pub struct FunctionGen<'a> {
    pub decl: &'a Decl,
    pub function: &'a FunctionDecl,
}

impl Generate for FunctionGen<'_> {
    fn id(&self) -> String {
        self.decl.qualified_name.clone()
    }

    fn gen_name(&self, binding: &Binding) -> String {
        simple_name(binding.id()).to_string()
    }

    fn gen_sign(&self, binding: &Binding) -> String {
        format!(
            "PyObject* {}( PyObject* self, PyObject* args, PyObject* kwds )",
            binding.py_name()
        )
    }

    fn gen_def(&self, binding: &Binding) -> Result<String> {
        let body = call_body(
            &self.function.params,
            &self.function.return_type,
            binding.id(),
            &TemplateMap::new(),
        )?;
        Ok(format!("{}\n{{\n{}}}\n\n", binding.sign(), body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{DeclKind, ParamDecl};
    use crate::types::CppType;

    fn function(decl: &Decl) -> Function {
        let DeclKind::Function(f) = &decl.kind else {
            panic!("not a function");
        };
        Function::new(decl, f).unwrap()
    }

    #[test]
    fn test_add() {
        let decl = Decl::function(
            "ns::add",
            vec![
                ParamDecl::new("a", CppType::int()),
                ParamDecl::new("b", CppType::int()),
            ],
            CppType::int(),
        );
        let f = function(&decl);

        assert_eq!(f.binding().name(), "add");
        assert_eq!(f.binding().py_name(), "py_ns__add");
        assert_eq!(
            f.binding().decl(),
            "PyObject* py_ns__add( PyObject* self, PyObject* args, PyObject* kwds );\n\n"
        );
        insta::assert_snapshot!(f.binding().def(), @r###"
        PyObject* py_ns__add( PyObject* self, PyObject* args, PyObject* kwds )
        {
        	static char a_name[] { "a" };
        	static char b_name[] { "b" };
        	static char* kwlist[] { a_name, b_name, nullptr };
        	static const char* fmt { "ii|" };

        	int arg_a {};
        	int arg_b {};

        	if ( !PyArg_ParseTupleAndKeywords( args, kwds, fmt, kwlist, &arg_a, &arg_b ) )
        	{
        		return nullptr;
        	}

        	return PyLong_FromLong( static_cast<long>( ns::add( arg_a, arg_b ) ) );
        }
        "###);
        assert_eq!(
            f.entry(),
            "\t{ \"add\", reinterpret_cast<PyCFunction>( py_ns__add ), METH_VARARGS | METH_KEYWORDS, \"add\" },\n"
        );
    }

    #[test]
    fn test_void_without_params() {
        let decl = Decl::function("reset", vec![], CppType::Void);
        let f = function(&decl);

        assert!(!f.binding().def().contains("PyArg_ParseTupleAndKeywords"));
        assert!(f.binding().def().contains("\treset();\n\tPy_INCREF( Py_None );\n\treturn Py_None;\n"));
        assert!(f.entry().contains("METH_NOARGS"));
    }
}

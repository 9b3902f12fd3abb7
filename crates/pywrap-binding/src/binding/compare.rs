use super::{Binding, Generate};
use crate::error::Result;

/// Generates `tp_richcompare`.
///
/// Only equality is supported, and only when the native type can be
/// compared with `==`; every other case answers `NotImplemented`.
pub struct CompareGen<'a> {
    pub tag: &'a Binding,
    pub has_equality: bool,
}

impl Generate for CompareGen<'_> {
    fn id(&self) -> String {
        format!("{}::cmp", self.tag.id())
    }

    fn gen_name(&self, _binding: &Binding) -> String {
        "cmp".to_string()
    }

    fn gen_py_name(&self, binding: &Binding) -> String {
        format!("{}_{}", self.tag.py_name(), binding.name())
    }

    fn gen_sign(&self, binding: &Binding) -> String {
        format!(
            "PyObject* {}( _PyspotWrapper* lhs, _PyspotWrapper* rhs, int op )",
            binding.py_name()
        )
    }

    fn gen_def(&self, binding: &Binding) -> Result<String> {
        let mut def = format!("{}\n{{\n", binding.sign());
        if self.has_equality {
            let ty = self.tag.id();
            def.push_str(&format!(
                "\tif ( op == Py_EQ )\n\t{{\n\
                 \t\tauto& l = *reinterpret_cast<{ty}*>( lhs->data );\n\
                 \t\tauto& r = *reinterpret_cast<{ty}*>( rhs->data );\n\
                 \t\tif ( l == r )\n\t\t{{\n\
                 \t\t\tPy_INCREF( Py_True );\n\
                 \t\t\treturn Py_True;\n\
                 \t\t}}\n\
                 \t\telse\n\t\t{{\n\
                 \t\t\tPy_INCREF( Py_False );\n\
                 \t\t\treturn Py_False;\n\
                 \t\t}}\n\
                 \t}}\n\n"
            ));
        }
        def.push_str("\tPy_INCREF( Py_NotImplemented );\n\treturn Py_NotImplemented;\n}\n\n");
        Ok(def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::tag::TagGen;

    #[test]
    fn test_equality() {
        let tag = TagGen::new("Color").init().unwrap();
        let cmp = CompareGen {
            tag: &tag,
            has_equality: true,
        }
        .init()
        .unwrap();

        assert_eq!(
            cmp.sign(),
            "PyObject* py_Color_cmp( _PyspotWrapper* lhs, _PyspotWrapper* rhs, int op )"
        );
        let def = cmp.def();
        assert!(def.contains("if ( op == Py_EQ )"));
        assert!(def.contains("auto& l = *reinterpret_cast<Color*>( lhs->data );"));
        assert!(def.contains("auto& r = *reinterpret_cast<Color*>( rhs->data );"));
        assert!(def.ends_with("\tPy_INCREF( Py_NotImplemented );\n\treturn Py_NotImplemented;\n}\n\n"));
    }

    #[test]
    fn test_without_equality() {
        let tag = TagGen::new("geo::Point").init().unwrap();
        let cmp = CompareGen {
            tag: &tag,
            has_equality: false,
        }
        .init()
        .unwrap();

        assert!(!cmp.def().contains("Py_EQ"));
        assert!(cmp.def().contains("return Py_NotImplemented;"));
    }
}

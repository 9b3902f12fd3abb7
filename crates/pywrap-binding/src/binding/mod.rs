//! Bindings: generated text for one wrapped declaration.
//!
//! Every node of the tree is built in two phases. A generator struct records
//! identity and borrows whatever sibling bindings it depends on; then
//! [`Generate::init`] runs name, runtime name, signature, declaration and
//! definition in that fixed order, each stage reading what the previous ones
//! produced. The result is an immutable [`Binding`].

mod class_getitem;
mod compare;
mod destructor;
mod field;
mod function;
mod init;
mod method;
mod module;
mod params;
mod table;
mod tag;
mod type_object;
mod wrapper;

pub use class_getitem::{ClassGetitem, ClassGetitemGen};
pub use compare::CompareGen;
pub use destructor::DestructorGen;
pub use field::{Field, FieldGen, GetterGen, SetterGen};
pub use function::{Function, FunctionGen};
pub use init::InitGen;
pub use method::{Method, MethodGen};
pub use module::{Module, ModuleGen, ModuleId};
pub use table::{Table, TableGen, TableKind};
pub use tag::{Tag, TagKind};
pub use type_object::TypeObjectGen;
pub use wrapper::WrapperGen;

use crate::error::Result;

/// Generated text for one declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binding {
    id: String,
    name: String,
    py_name: String,
    sign: String,
    decl: String,
    def: String,
}

impl Binding {
    /// Qualified identity, used for deduplication.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Short name as seen from the runtime (attribute or method name).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier of the generated C++ entity.
    pub fn py_name(&self) -> &str {
        &self.py_name
    }

    pub fn sign(&self) -> &str {
        &self.sign
    }

    pub fn decl(&self) -> &str {
        &self.decl
    }

    pub fn def(&self) -> &str {
        &self.def
    }
}

/// A generator producing one [`Binding`].
pub trait Generate {
    /// Qualified identity of the generated binding.
    fn id(&self) -> String;

    fn gen_name(&self, binding: &Binding) -> String;

    fn gen_py_name(&self, binding: &Binding) -> String {
        to_pyspot_name(binding.id())
    }

    fn gen_sign(&self, _binding: &Binding) -> String {
        String::new()
    }

    fn gen_decl(&self, binding: &Binding) -> String {
        format!("{};\n\n", binding.sign())
    }

    fn gen_def(&self, binding: &Binding) -> Result<String>;

    /// Run every stage in order.
    fn init(&self) -> Result<Binding> {
        let mut binding = Binding {
            id: self.id(),
            ..Binding::default()
        };
        binding.name = self.gen_name(&binding);
        binding.py_name = self.gen_py_name(&binding);
        binding.sign = self.gen_sign(&binding);
        binding.decl = self.gen_decl(&binding);
        binding.def = self.gen_def(&binding)?;
        Ok(binding)
    }
}

/// Flatten a qualified C++ name into an identifier: every character that
/// cannot appear in one becomes `_`, and the result is prefixed with `py_`.
///
/// `geo::Box<unsigned int>` becomes `py_geo__Box_unsigned_int_`.
pub fn to_pyspot_name(name: &str) -> String {
    let flat: String = name
        .chars()
        .map(|c| match c {
            ':' | ',' | '<' | '>' | ' ' | '*' | '&' => '_',
            c => c,
        })
        .collect();
    format!("py_{}", flat)
}

/// Last component of a qualified name, ignoring `::` inside template arguments.
pub fn simple_name(qualified: &str) -> &str {
    let mut depth = 0usize;
    let mut start = 0;
    let bytes = qualified.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' => depth += 1,
            b'>' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                start = i + 2;
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    &qualified[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe;

    impl Generate for Probe {
        fn id(&self) -> String {
            "geo::Point".to_string()
        }

        fn gen_name(&self, binding: &Binding) -> String {
            simple_name(binding.id()).to_string()
        }

        fn gen_sign(&self, binding: &Binding) -> String {
            format!("void {}()", binding.py_name())
        }

        fn gen_def(&self, binding: &Binding) -> Result<String> {
            Ok(format!("{}\n{{\n}}\n\n", binding.sign()))
        }
    }

    #[test]
    fn test_init_runs_stages_in_order() {
        let binding = Probe.init().unwrap();
        assert_eq!(binding.id(), "geo::Point");
        assert_eq!(binding.name(), "Point");
        assert_eq!(binding.py_name(), "py_geo__Point");
        assert_eq!(binding.sign(), "void py_geo__Point()");
        assert_eq!(binding.decl(), "void py_geo__Point();\n\n");
        assert_eq!(binding.def(), "void py_geo__Point()\n{\n}\n\n");
    }

    #[test]
    fn test_to_pyspot_name() {
        assert_eq!(to_pyspot_name("Point"), "py_Point");
        assert_eq!(to_pyspot_name("geo::Box<int>"), "py_geo__Box_int_");
        assert_eq!(to_pyspot_name("Pair<int,float>"), "py_Pair_int_float_");
        assert_eq!(to_pyspot_name("Box<unsigned int>"), "py_Box_unsigned_int_");
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(simple_name("Point"), "Point");
        assert_eq!(simple_name("geo::shapes::Point"), "Point");
        assert_eq!(simple_name("geo::Box<std::string>"), "Box<std::string>");
    }
}

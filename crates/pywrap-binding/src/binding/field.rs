//! Field accessors: a name constant plus a getter/setter pair.

use super::{Binding, Generate};
use crate::decl::FieldDecl;
use crate::error::Result;
use crate::marshal::{assign, to_runtime};
use crate::template::TemplateMap;
use crate::types::{CppType, StdKind};

/// A wrapped public field of a Tag.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    ty: CppType,
    binding: Binding,
    getter: Binding,
    setter: Binding,
}

impl Field {
    /// Generate the bindings of `field` on the tag described by `tag`.
    ///
    /// Template parameters in the field's type are resolved through `map`.
    pub fn new(tag: &Binding, field: &FieldDecl, map: &TemplateMap) -> Result<Self> {
        let ty = field.ty.substitute(map)?;
        let binding = FieldGen { tag, field }.init()?;
        let getter = GetterGen {
            tag,
            field,
            ty: &ty,
        }
        .init()?;
        let setter = SetterGen {
            tag,
            field,
            ty: &ty,
        }
        .init()?;

        Ok(Self {
            name: field.name.clone(),
            ty,
            binding,
            getter,
            setter,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field type with template parameters resolved.
    pub fn ty(&self) -> &CppType {
        &self.ty
    }

    /// The field-name constant.
    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn getter(&self) -> &Binding {
        &self.getter
    }

    pub fn setter(&self) -> &Binding {
        &self.setter
    }

    /// Entry of the owning tag's accessors table.
    pub fn accessor_entry(&self) -> String {
        format!(
            "\t{{ {name}, reinterpret_cast<getter>( {get} ), reinterpret_cast<setter>( {set} ), {name}, nullptr }},\n",
            name = self.binding.py_name(),
            get = self.getter.py_name(),
            set = self.setter.py_name(),
        )
    }

    pub fn decl(&self) -> String {
        format!(
            "{}{}{}",
            self.binding.decl(),
            self.getter.decl(),
            self.setter.decl()
        )
    }

    pub fn def(&self) -> String {
        format!(
            "{}{}{}",
            self.binding.def(),
            self.getter.def(),
            self.setter.def()
        )
    }
}

/// Generates the `char <py>[]` constant holding the field name.
pub struct FieldGen<'a> {
    pub tag: &'a Binding,
    pub field: &'a FieldDecl,
}

impl Generate for FieldGen<'_> {
    fn id(&self) -> String {
        format!("{}::{}", self.tag.id(), self.field.name)
    }

    fn gen_name(&self, _binding: &Binding) -> String {
        self.field.name.clone()
    }

    fn gen_py_name(&self, binding: &Binding) -> String {
        format!("{}_{}", self.tag.py_name(), binding.name())
    }

    fn gen_sign(&self, binding: &Binding) -> String {
        format!("char {}[{}]", binding.py_name(), binding.name().len() + 1)
    }

    fn gen_decl(&self, binding: &Binding) -> String {
        format!("extern {};\n\n", binding.sign())
    }

    fn gen_def(&self, binding: &Binding) -> Result<String> {
        Ok(format!("{} {{ \"{}\" }};\n\n", binding.sign(), binding.name()))
    }
}

pub struct GetterGen<'a> {
    pub tag: &'a Binding,
    pub field: &'a FieldDecl,
    /// Resolved field type
    pub ty: &'a CppType,
}

impl Generate for GetterGen<'_> {
    fn id(&self) -> String {
        format!("{}::{}::get", self.tag.id(), self.field.name)
    }

    fn gen_name(&self, _binding: &Binding) -> String {
        self.field.name.clone()
    }

    fn gen_py_name(&self, binding: &Binding) -> String {
        format!("{}_get_{}", self.tag.py_name(), binding.name())
    }

    fn gen_sign(&self, binding: &Binding) -> String {
        format!(
            "PyObject* {}( _PyspotWrapper* self, void* /*closure*/ )",
            binding.py_name()
        )
    }

    fn gen_def(&self, binding: &Binding) -> Result<String> {
        let value = to_runtime(
            self.ty,
            &format!("data->{}", self.field.name),
            &TemplateMap::new(),
        )?;
        Ok(format!(
            "{sign}\n{{\n\
             \tauto data = reinterpret_cast<{tag}*>( self->data );\n\
             \tauto ret = {value};\n\
             \treturn ret;\n\
             }}\n\n",
            sign = binding.sign(),
            tag = self.tag.id(),
        ))
    }
}

pub struct SetterGen<'a> {
    pub tag: &'a Binding,
    pub field: &'a FieldDecl,
    /// Resolved field type
    pub ty: &'a CppType,
}

impl SetterGen<'_> {
    fn expects_string(&self) -> bool {
        self.ty.is_char_pointer() || self.ty.value_type().std_kind() == Some(StdKind::String)
    }
}

impl Generate for SetterGen<'_> {
    fn id(&self) -> String {
        format!("{}::{}::set", self.tag.id(), self.field.name)
    }

    fn gen_name(&self, _binding: &Binding) -> String {
        self.field.name.clone()
    }

    fn gen_py_name(&self, binding: &Binding) -> String {
        format!("{}_set_{}", self.tag.py_name(), binding.name())
    }

    fn gen_sign(&self, binding: &Binding) -> String {
        format!(
            "int {}( _PyspotWrapper* self, PyObject* value, void* /*closure*/ )",
            binding.py_name()
        )
    }

    fn gen_def(&self, binding: &Binding) -> Result<String> {
        let name = &self.field.name;
        let mut def = format!(
            "{}\n{{\n\
             \tif ( !value )\n\t{{\n\
             \t\tPyErr_SetString( PyExc_TypeError, \"Cannot delete {}\" );\n\
             \t\treturn -1;\n\t}}\n\n",
            binding.sign(),
            binding.py_name()
        );

        if self.expects_string() {
            def.push_str(&format!(
                "\tif ( !PyUnicode_Check( value ) )\n\t{{\n\
                 \t\tPyErr_SetString( PyExc_TypeError, \"Field {} expects a string\" );\n\
                 \t\treturn -1;\n\t}}\n\n",
                name
            ));
        }

        def.push_str(&format!(
            "\tauto data = reinterpret_cast<{}*>( self->data );\n",
            self.tag.id()
        ));
        def.push_str(&assign(
            self.ty,
            &format!("data->{}", name),
            "value",
            &TemplateMap::new(),
            1,
        )?);
        def.push_str("\treturn 0;\n}\n\n");
        Ok(def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::tag::TagGen;

    fn point() -> Binding {
        TagGen::new("geo::Point").init().unwrap()
    }

    #[test]
    fn test_name_constant() {
        let tag = point();
        let field = Field::new(&tag, &FieldDecl::new("x", CppType::int()), &TemplateMap::new()).unwrap();

        assert_eq!(field.binding().py_name(), "py_geo__Point_x");
        assert_eq!(field.binding().decl(), "extern char py_geo__Point_x[2];\n\n");
        assert_eq!(field.binding().def(), "char py_geo__Point_x[2] { \"x\" };\n\n");
    }

    #[test]
    fn test_getter() {
        let tag = point();
        let field = Field::new(&tag, &FieldDecl::new("x", CppType::int()), &TemplateMap::new()).unwrap();

        assert_eq!(field.getter().py_name(), "py_geo__Point_get_x");
        assert_eq!(
            field.getter().def(),
            "PyObject* py_geo__Point_get_x( _PyspotWrapper* self, void* /*closure*/ )\n{\n\
             \tauto data = reinterpret_cast<geo::Point*>( self->data );\n\
             \tauto ret = PyLong_FromLong( static_cast<long>( data->x ) );\n\
             \treturn ret;\n\
             }\n\n"
        );
    }

    #[test]
    fn test_setter() {
        let tag = point();
        let field = Field::new(&tag, &FieldDecl::new("y", CppType::Double), &TemplateMap::new()).unwrap();
        let def = field.setter().def();

        assert!(def.starts_with(
            "int py_geo__Point_set_y( _PyspotWrapper* self, PyObject* value, void* /*closure*/ )"
        ));
        assert!(def.contains("PyErr_SetString( PyExc_TypeError, \"Cannot delete py_geo__Point_set_y\" );\n\t\treturn -1;"));
        assert!(def.contains("\tdata->y = PyFloat_AsDouble( value );\n\treturn 0;\n}"));
        assert!(!def.contains("PyUnicode_Check"));
    }

    #[test]
    fn test_string_setter_checks_type() {
        let tag = point();
        let field = Field::new(
            &tag,
            &FieldDecl::new("label", CppType::named("std::string")),
            &TemplateMap::new(),
        )
        .unwrap();

        let def = field.setter().def();
        assert!(def.contains("if ( !PyUnicode_Check( value ) )"));
        assert!(def.contains("\"Field label expects a string\""));
        assert!(def.contains("data->label = pyspot::String{ value }.ToCString();"));
    }

    #[test]
    fn test_accessor_entry() {
        let tag = point();
        let field = Field::new(&tag, &FieldDecl::new("x", CppType::int()), &TemplateMap::new()).unwrap();

        assert_eq!(
            field.accessor_entry(),
            "\t{ py_geo__Point_x, reinterpret_cast<getter>( py_geo__Point_get_x ), \
             reinterpret_cast<setter>( py_geo__Point_set_x ), py_geo__Point_x, nullptr },\n"
        );
    }

    #[test]
    fn test_template_field_resolved() {
        let tag = TagGen::new("Box<float>").init().unwrap();
        let mut map = TemplateMap::new();
        map.insert("T", CppType::Float);

        let field = Field::new(
            &tag,
            &FieldDecl::new("value", CppType::template_param("T", 0, 0)),
            &map,
        )
        .unwrap();

        assert_eq!(field.ty(), &CppType::Float);
        assert_eq!(field.getter().py_name(), "py_Box_float__get_value");
        assert!(field.setter().def().contains("reinterpret_cast<Box<float>*>( self->data )"));
    }
}

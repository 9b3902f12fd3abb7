//! Tags: the runtime type generated for a record, enum, class template or
//! template instantiation.

use super::{
    simple_name, to_pyspot_name, Binding, ClassGetitem, CompareGen, DestructorGen, Field,
    Generate, InitGen, Method, Table, TableKind, TypeObjectGen, WrapperGen,
};
use crate::decl::{AccessSpecifier, Decl, EnumDecl, MethodKind, RecordDecl, TemplateDecl};
use crate::error::Result;
use crate::template::{specialization_name, TemplateMap};
use crate::types::CppType;

/// Capabilities that differ between Tag variants.
#[derive(Debug, Clone)]
pub enum TagKind {
    Record,
    Enum {
        enumerators: Vec<String>,
    },
    /// Never instantiated itself; subscripting yields a specialization.
    Template {
        class_getitem: ClassGetitem,
        /// Identities of the specializations added so far
        specializations: Vec<String>,
    },
    Specialization {
        /// Identity of the template this instantiates
        template: String,
        args: Vec<CppType>,
    },
}

/// A wrapped type with all of its sub-bindings.
#[derive(Debug, Clone)]
pub struct Tag {
    head: Binding,
    include: String,
    kind: TagKind,
    destructor: Binding,
    fields: Vec<Field>,
    methods: Vec<Method>,
    init: Binding,
    compare: Binding,
    method_table: Table,
    members: Table,
    accessors: Table,
    type_object: Binding,
    wrapper: Option<Binding>,
}

/// Identity of a Tag: its qualified name, with the canonical argument
/// suffix for specializations.
pub struct TagGen {
    id: String,
}

impl TagGen {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}

impl Generate for TagGen {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn gen_name(&self, binding: &Binding) -> String {
        simple_name(binding.id()).to_string()
    }

    fn gen_py_name(&self, binding: &Binding) -> String {
        to_pyspot_name(binding.id())
    }

    fn gen_decl(&self, _binding: &Binding) -> String {
        String::new()
    }

    fn gen_def(&self, _binding: &Binding) -> Result<String> {
        Ok(String::new())
    }
}

/// What the sub-binding generators need to know about the native type.
struct Shape<'a> {
    record: Option<&'a RecordDecl>,
    has_default_ctor: bool,
    has_equality: bool,
    copyable: bool,
    movable: bool,
}

impl Tag {
    /// A plain struct or class.
    pub fn record(decl: &Decl, record: &RecordDecl) -> Result<Self> {
        Self::build(
            decl,
            decl.qualified_name.clone(),
            TagKind::Record,
            Self::record_shape(record),
            &TemplateMap::new(),
        )
    }

    /// An enumeration. Enums are always default constructible, comparable,
    /// copyable and movable.
    pub fn enumeration(decl: &Decl, enumeration: &EnumDecl) -> Result<Self> {
        let shape = Shape {
            record: None,
            has_default_ctor: true,
            has_equality: true,
            copyable: true,
            movable: true,
        };
        Self::build(
            decl,
            decl.qualified_name.clone(),
            TagKind::Enum {
                enumerators: enumeration.enumerators.clone(),
            },
            shape,
            &TemplateMap::new(),
        )
    }

    /// A class template. Its specializations are attached with
    /// [`Tag::add_specialization`].
    pub fn template(decl: &Decl) -> Result<Self> {
        let head = TagGen::new(&decl.qualified_name).init()?;
        let shape = Shape {
            record: None,
            has_default_ctor: false,
            has_equality: false,
            copyable: false,
            movable: false,
        };
        let kind = TagKind::Template {
            class_getitem: ClassGetitem::new(&head)?,
            specializations: Vec::new(),
        };
        Self::build(
            decl,
            decl.qualified_name.clone(),
            kind,
            shape,
            &TemplateMap::new(),
        )
    }

    /// One instantiation of the class template `decl` with `args`.
    pub fn specialization(
        decl: &Decl,
        record: &RecordDecl,
        template: &TemplateDecl,
        args: &[CppType],
    ) -> Result<Self> {
        let map = TemplateMap::build(&decl.qualified_name, &template.params, args)?;
        Self::build(
            decl,
            specialization_name(&decl.qualified_name, args),
            TagKind::Specialization {
                template: decl.qualified_name.clone(),
                args: args.to_vec(),
            },
            Self::record_shape(record),
            &map,
        )
    }

    fn record_shape(record: &RecordDecl) -> Shape<'_> {
        Shape {
            record: Some(record),
            has_default_ctor: record.has_default_ctor,
            has_equality: record.has_equality(),
            copyable: record.has_copy_ctor,
            movable: record.has_move_ctor,
        }
    }

    fn build(decl: &Decl, id: String, kind: TagKind, shape: Shape<'_>, map: &TemplateMap) -> Result<Self> {
        let head = TagGen::new(&id).init()?;
        let holds_value = !matches!(kind, TagKind::Template { .. });
        tracing::debug!(tag = %id, "generating tag");

        let destructor = DestructorGen {
            tag: &head,
            holds_value,
        }
        .init()?;

        let mut fields = Vec::new();
        let mut methods: Vec<Method> = Vec::new();
        let mut ctors = Vec::new();
        if let Some(record) = shape.record {
            for field in record.fields.iter().filter(|f| f.access == AccessSpecifier::Public) {
                fields.push(Field::new(&head, field, map)?);
            }

            let wrapped = record
                .methods
                .iter()
                .filter(|m| m.is_public() && m.kind == MethodKind::Method);
            for method in wrapped {
                if methods.iter().any(|m| m.binding().name() == method.name) {
                    tracing::warn!(
                        tag = %id,
                        method = %method.name,
                        "overloaded method, only the first declaration is wrapped"
                    );
                    continue;
                }
                methods.push(Method::new(&head, method, map)?);
            }

            ctors.extend(record.dispatch_constructors());
        }

        let init = InitGen {
            tag: &head,
            ctors,
            has_default_ctor: shape.has_default_ctor,
            holds_value,
            map,
        }
        .init()?;

        let compare = CompareGen {
            tag: &head,
            has_equality: shape.has_equality,
        }
        .init()?;

        let mut method_table = Table::new(&head, TableKind::Methods)?;
        for method in &methods {
            method_table.push(method.entry());
        }
        if let TagKind::Template { class_getitem, .. } = &kind {
            method_table.push(class_getitem.entry());
        }

        let members = Table::new(&head, TableKind::Members)?;
        let mut accessors = Table::new(&head, TableKind::Accessors)?;
        for field in &fields {
            accessors.push(field.accessor_entry());
        }

        let type_object = TypeObjectGen {
            tag: &head,
            destructor: &destructor,
            compare: &compare,
            methods: method_table.binding(),
            members: members.binding(),
            accessors: accessors.binding(),
            init: &init,
        }
        .init()?;

        let wrapper = if holds_value {
            Some(
                WrapperGen {
                    tag: &head,
                    type_object: &type_object,
                    copyable: shape.copyable,
                    movable: shape.movable,
                }
                .init()?,
            )
        } else {
            None
        };

        Ok(Self {
            head,
            include: decl.include.clone(),
            kind,
            destructor,
            fields,
            methods,
            init,
            compare,
            method_table,
            members,
            accessors,
            type_object,
            wrapper,
        })
    }

    /// Attach `other` to this template's subscript hook.
    ///
    /// Fails for instantiations with more than one argument. Does nothing
    /// unless `self` is a template and `other` a specialization.
    pub fn add_specialization(&mut self, other: &Tag) -> Result<()> {
        let (
            TagKind::Template {
                class_getitem,
                specializations,
            },
            TagKind::Specialization { args, .. },
        ) = (&mut self.kind, &other.kind)
        else {
            return Ok(());
        };

        class_getitem.add(args, other.type_object.py_name())?;
        specializations.push(other.id().to_string());
        Ok(())
    }

    pub fn head(&self) -> &Binding {
        &self.head
    }

    /// Qualified identity (e.g. `geo::Box<int>`).
    pub fn id(&self) -> &str {
        self.head.id()
    }

    /// Name the type is registered under in its module.
    pub fn name(&self) -> &str {
        self.head.name()
    }

    pub fn py_name(&self) -> &str {
        self.head.py_name()
    }

    pub fn include(&self) -> &str {
        &self.include
    }

    pub fn kind(&self) -> &TagKind {
        &self.kind
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn init(&self) -> &Binding {
        &self.init
    }

    pub fn compare(&self) -> &Binding {
        &self.compare
    }

    pub fn destructor(&self) -> &Binding {
        &self.destructor
    }

    pub fn method_table(&self) -> &Table {
        &self.method_table
    }

    pub fn accessors(&self) -> &Table {
        &self.accessors
    }

    pub fn type_object(&self) -> &Binding {
        &self.type_object
    }

    pub fn wrapper(&self) -> Option<&Binding> {
        self.wrapper.as_ref()
    }

    fn class_getitem(&self) -> Option<&ClassGetitem> {
        match &self.kind {
            TagKind::Template { class_getitem, .. } => Some(class_getitem),
            _ => None,
        }
    }

    pub fn decl(&self) -> String {
        let mut decl = self.destructor.decl().to_string();
        for field in &self.fields {
            decl.push_str(&field.decl());
        }
        for method in &self.methods {
            decl.push_str(method.binding().decl());
        }
        decl.push_str(self.init.decl());
        decl.push_str(self.compare.decl());
        if let Some(class_getitem) = self.class_getitem() {
            decl.push_str(class_getitem.decl());
        }
        decl.push_str(self.method_table.decl());
        decl.push_str(self.members.decl());
        decl.push_str(self.accessors.decl());
        decl.push_str(self.type_object.decl());
        decl
    }

    pub fn def(&self) -> String {
        let mut def = self.destructor.def().to_string();
        for field in &self.fields {
            def.push_str(&field.def());
        }
        for method in &self.methods {
            def.push_str(method.binding().def());
        }
        def.push_str(self.init.def());
        def.push_str(self.compare.def());
        if let Some(class_getitem) = self.class_getitem() {
            def.push_str(&class_getitem.def());
        }
        def.push_str(&self.method_table.def());
        def.push_str(&self.members.def());
        def.push_str(&self.accessors.def());
        def.push_str(self.type_object.def());
        def
    }

    /// Statements adding the type to the module object `module`.
    pub fn registration(&self, module: &str) -> String {
        let type_object = self.type_object.py_name();
        let name = self.name();
        let mut reg = format!(
            "\t// Register {name}\n\
             \tif ( PyType_Ready( &{type_object} ) < 0 )\n\t{{\n\
             \t\treturn nullptr;\n\t}}\n\
             \tPy_INCREF( &{type_object} );\n\
             \tPyModule_AddObject( {module}, \"{name}\", reinterpret_cast<PyObject*>( &{type_object} ) );\n\n"
        );

        if let TagKind::Enum { enumerators } = &self.kind {
            let id = self.id();
            for value in enumerators {
                reg.push_str(&format!(
                    "\tPyDict_SetItemString( {type_object}.tp_dict, \"{value}\", pyspot::Wrapper<{id}>{{ {id}::{value} }}.GetIncref() );\n"
                ));
            }
            if !enumerators.is_empty() {
                reg.push('\n');
            }
        }
        reg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{ConstructorKind, DeclKind, FieldDecl, MethodDecl, ParamDecl};
    use crate::error::BindingError;

    fn point() -> (Decl, RecordDecl) {
        let record = RecordDecl {
            fields: vec![
                FieldDecl::new("x", CppType::int()),
                FieldDecl::new("y", CppType::int()),
                FieldDecl::new("secret", CppType::int()).with_access(AccessSpecifier::Private),
            ],
            methods: vec![
                MethodDecl::constructor("Point", ConstructorKind::Default, vec![]),
                MethodDecl::constructor(
                    "Point",
                    ConstructorKind::Other,
                    vec![
                        ParamDecl::new("x", CppType::int()),
                        ParamDecl::new("y", CppType::int()),
                    ],
                ),
            ],
            has_default_ctor: true,
            has_copy_ctor: true,
            has_move_ctor: true,
            ..RecordDecl::default()
        };
        (Decl::record("Point", record.clone()).with_include("geo/point.h"), record)
    }

    fn boxed() -> (Decl, RecordDecl, TemplateDecl) {
        let template = TemplateDecl {
            params: vec!["T".to_string()],
            specializations: vec![vec![CppType::int()], vec![CppType::Float]],
        };
        let record = RecordDecl {
            fields: vec![FieldDecl::new("value", CppType::template_param("T", 0, 0))],
            template: Some(template.clone()),
            has_default_ctor: true,
            has_copy_ctor: true,
            has_move_ctor: true,
            ..RecordDecl::default()
        };
        (Decl::record("Box", record.clone()), record, template)
    }

    #[test]
    fn test_record_exposes_public_fields() {
        let (decl, record) = point();
        let tag = Tag::record(&decl, &record).unwrap();

        assert_eq!(tag.id(), "Point");
        assert_eq!(tag.include(), "geo/point.h");
        let names: Vec<_> = tag.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert!(tag.accessors().def().contains("py_Point_get_x"));
        assert!(!tag.def().contains("secret"));
    }

    #[test]
    fn test_record_sub_bindings() {
        let (decl, record) = point();
        let tag = Tag::record(&decl, &record).unwrap();

        let def = tag.def();
        assert!(def.contains("void py_Point_dealloc( _PyspotWrapper* self )"));
        assert!(def.contains("int py_Point_init( _PyspotWrapper* self, PyObject* args, PyObject* kwds )"));
        assert!(def.contains("if ( ( args_size + kwds_size ) == 2 )"));
        assert!(!def.contains("if ( op == Py_EQ )"));
        assert!(def.contains("PyTypeObject py_Point_type_object = {"));

        let wrapper = tag.wrapper().unwrap();
        assert!(wrapper.def().contains("payload { new Point { std::move( v ) } }"));
    }

    #[test]
    fn test_decl_and_def_order() {
        let (decl, record) = point();
        let tag = Tag::record(&decl, &record).unwrap();
        let def = tag.def();

        let position = |needle: &str| def.find(needle).unwrap();
        assert!(position("py_Point_dealloc(") < position("char py_Point_x[2]"));
        assert!(position("char py_Point_x[2]") < position("py_Point_init("));
        assert!(position("py_Point_init(") < position("py_Point_cmp("));
        assert!(position("py_Point_cmp(") < position("PyMethodDef py_Point_methods[]"));
        assert!(position("PyGetSetDef py_Point_accessors[]") < position("PyTypeObject py_Point_type_object"));
    }

    #[test]
    fn test_equality_operator_enables_compare() {
        let (_, mut record) = point();
        record.methods.push(MethodDecl::equality("Point"));
        let decl = Decl::record("Point", record.clone());

        let tag = Tag::record(&decl, &record).unwrap();
        assert!(tag.compare().def().contains("if ( op == Py_EQ )"));
    }

    #[test]
    fn test_first_overload_wins() {
        let (_, mut record) = point();
        record.methods.push(MethodDecl::method("Point", "scale", vec![], CppType::Void));
        record.methods.push(MethodDecl::method(
            "Point",
            "scale",
            vec![ParamDecl::new("factor", CppType::int())],
            CppType::Void,
        ));
        let decl = Decl::record("Point", record.clone());

        let tag = Tag::record(&decl, &record).unwrap();
        assert_eq!(tag.methods().len(), 1);
        assert!(tag.method_table().def().contains("METH_NOARGS"));
    }

    #[test]
    fn test_enum_registration() {
        let decl = Decl::enumeration("Color", &["Red", "Green"], false);
        let DeclKind::Enum(e) = &decl.kind else {
            unreachable!()
        };
        let tag = Tag::enumeration(&decl, e).unwrap();

        assert!(tag.compare().def().contains("if ( op == Py_EQ )"));
        assert!(tag.init().def().contains("self->data = new Color{};"));
        let wrapper = tag.wrapper().unwrap();
        assert!(wrapper.decl().contains("Wrapper( const Color& v );"));
        assert!(wrapper.decl().contains("Wrapper( Color&& v );"));

        assert_eq!(
            tag.registration("py_shapes"),
            "\t// Register Color\n\
             \tif ( PyType_Ready( &py_Color_type_object ) < 0 )\n\t{\n\t\treturn nullptr;\n\t}\n\
             \tPy_INCREF( &py_Color_type_object );\n\
             \tPyModule_AddObject( py_shapes, \"Color\", reinterpret_cast<PyObject*>( &py_Color_type_object ) );\n\n\
             \tPyDict_SetItemString( py_Color_type_object.tp_dict, \"Red\", pyspot::Wrapper<Color>{ Color::Red }.GetIncref() );\n\
             \tPyDict_SetItemString( py_Color_type_object.tp_dict, \"Green\", pyspot::Wrapper<Color>{ Color::Green }.GetIncref() );\n\n"
        );
    }

    #[test]
    fn test_specialization_names() {
        let (decl, record, template) = boxed();
        let float_box = Tag::specialization(&decl, &record, &template, &[CppType::Float]).unwrap();

        assert_eq!(float_box.id(), "Box<float>");
        assert_eq!(float_box.name(), "Box<float>");
        assert_eq!(float_box.py_name(), "py_Box_float_");
        assert_eq!(float_box.fields()[0].ty(), &CppType::Float);
        assert!(float_box
            .def()
            .contains("PyFloat_FromDouble( static_cast<double>( data->value ) )"));
    }

    #[test]
    fn test_template_dispatches_to_specializations() {
        let (decl, record, template) = boxed();
        let mut tag = Tag::template(&decl).unwrap();
        for args in &template.specializations {
            let specialization = Tag::specialization(&decl, &record, &template, args).unwrap();
            tag.add_specialization(&specialization).unwrap();
        }

        let TagKind::Template { specializations, .. } = tag.kind() else {
            panic!("not a template");
        };
        assert_eq!(specializations, &vec!["Box<int>".to_string(), "Box<float>".to_string()]);

        assert!(tag.wrapper().is_none());
        assert!(tag.fields().is_empty());
        assert!(tag.init().def().contains("\treturn 0;\n}"));
        assert!(!tag.destructor().def().contains("delete"));

        let def = tag.def();
        assert!(def.contains("return reinterpret_cast<PyObject*>( &py_Box_int__type_object );"));
        assert!(def.contains("return reinterpret_cast<PyObject*>( &py_Box_float__type_object );"));
        assert!(tag.method_table().def().contains("\"__class_getitem__\""));
    }

    #[test]
    fn test_unbound_template_parameter() {
        let (decl, mut record, template) = boxed();
        record
            .fields
            .push(FieldDecl::new("other", CppType::template_param("U", 0, 1)));

        let err = Tag::specialization(&decl, &record, &template, &[CppType::int()]).unwrap_err();
        assert!(matches!(
            err,
            BindingError::UnresolvedTemplateParameter { ref param, .. } if param == "U"
        ));
    }

    #[test]
    fn test_multi_argument_specialization_rejected() {
        let template = TemplateDecl {
            params: vec!["K".to_string(), "V".to_string()],
            specializations: vec![vec![CppType::int(), CppType::Float]],
        };
        let record = RecordDecl {
            template: Some(template.clone()),
            ..RecordDecl::default()
        };
        let decl = Decl::record("Pair", record.clone());

        let mut tag = Tag::template(&decl).unwrap();
        let specialization = Tag::specialization(&decl, &record, &template, &template.specializations[0]).unwrap();
        assert_eq!(specialization.id(), "Pair<int,float>");

        let err = tag.add_specialization(&specialization).unwrap_err();
        assert!(matches!(err, BindingError::MultipleTemplateArguments { .. }));
    }
}

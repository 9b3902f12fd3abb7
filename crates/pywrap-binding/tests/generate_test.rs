//! End-to-end tests: register declarations, render, inspect the generated text.

use pywrap_binding::binding::TagKind;
use pywrap_binding::{
    from_runtime, generate, printer, to_runtime, ConstructorKind, CppType, Decl, DeclKind, FieldDecl,
    MethodDecl, ParamDecl, RecordDecl, Registry, TemplateDecl, TemplateMap,
};

fn point_record() -> RecordDecl {
    RecordDecl {
        fields: vec![
            FieldDecl::new("x", CppType::int()),
            FieldDecl::new("y", CppType::int()),
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
    }
}

fn point() -> Decl {
    Decl::record("Point", point_record()).with_include("point.h")
}

fn color() -> Decl {
    Decl::enumeration("Color", &["Red", "Green"], false).with_include("color.h")
}

fn add() -> Decl {
    Decl::function(
        "ns::add",
        vec![
            ParamDecl::new("a", CppType::int()),
            ParamDecl::new("b", CppType::int()),
        ],
        CppType::int(),
    )
    .with_include("ns/add.h")
}

fn boxed() -> Decl {
    let template = TemplateDecl {
        params: vec!["T".to_string()],
        specializations: vec![vec![CppType::int()], vec![CppType::Float]],
    };
    Decl::record(
        "Box",
        RecordDecl {
            fields: vec![FieldDecl::new("value", CppType::template_param("T", 0, 0))],
            template: Some(template),
            has_default_ctor: true,
            has_copy_ctor: true,
            has_move_ctor: true,
            ..RecordDecl::default()
        },
    )
    .with_include("box.h")
}

#[test]
fn test_point_init_and_accessors() {
    let output = generate("ext", [&point()]).expect("generation failed");
    let source = &output.bindings_source;

    assert_eq!(source.matches("if ( args_size == 0 && kwds_size == 0 )").count(), 1);
    assert_eq!(source.matches("if ( ( args_size + kwds_size ) ==").count(), 1);
    assert!(source.contains("if ( ( args_size + kwds_size ) == 2 )"));

    assert_eq!(source.matches("reinterpret_cast<getter>(").count(), 2);
    assert!(source.contains("\t{ py_Point_x, reinterpret_cast<getter>( py_Point_get_x ), reinterpret_cast<setter>( py_Point_set_x ), py_Point_x, nullptr },\n"));
    assert!(source.contains("\t{ py_Point_y, reinterpret_cast<getter>( py_Point_get_y ), reinterpret_cast<setter>( py_Point_set_y ), py_Point_y, nullptr },\n"));
}

#[test]
fn test_no_default_constructor_no_fast_path() {
    let mut record = point_record();
    record.has_default_ctor = false;
    record.methods.remove(0);

    let output = generate("ext", [&Decl::record("Point", record)]).expect("generation failed");
    assert!(!output
        .bindings_source
        .contains("args_size == 0 && kwds_size == 0"));
}

#[test]
fn test_color_enum() {
    let output = generate("ext", [&color()]).expect("generation failed");

    let source = &output.bindings_source;
    assert_eq!(source.matches("if ( op == Py_EQ )").count(), 1);

    let extension = &output.extension_source;
    assert_eq!(extension.matches("PyDict_SetItemString( py_Color_type_object.tp_dict").count(), 2);
    assert!(extension.contains("\"Red\", pyspot::Wrapper<Color>{ Color::Red }.GetIncref()"));
    assert!(extension.contains("\"Green\", pyspot::Wrapper<Color>{ Color::Green }.GetIncref()"));
}

#[test]
fn test_compare_follows_equality_operator() {
    let mut record = point_record();
    record.methods.push(MethodDecl::equality("Point"));
    let with_eq = generate("ext", [&Decl::record("Point", record)]).expect("generation failed");
    assert!(with_eq.bindings_source.contains("if ( op == Py_EQ )"));

    let without_eq = generate("ext", [&point()]).expect("generation failed");
    assert!(!without_eq.bindings_source.contains("Py_EQ"));
    assert!(without_eq
        .bindings_source
        .contains("PyObject* py_Point_cmp( _PyspotWrapper* lhs, _PyspotWrapper* rhs, int op )\n{\n\tPy_INCREF( Py_NotImplemented );\n\treturn Py_NotImplemented;\n}\n"));
}

#[test]
fn test_function_module_created_once() {
    let sub = Decl::function("ns::sub", vec![], CppType::int());
    let mut registry = Registry::new("ext");
    registry.register(&add()).unwrap();
    registry.register(&sub).unwrap();

    assert_eq!(registry.modules().filter(|m| m.id() == "ns").count(), 1);

    let output = printer::print(&registry);
    assert!(output.extension_source.contains(
        "\t{ \"add\", reinterpret_cast<PyCFunction>( py_ns__add ), METH_VARARGS | METH_KEYWORDS, \"add\" },\n"
    ));
    assert!(output.extension_source.contains("PyMODINIT_FUNC PyInit_ns()"));
}

#[test]
fn test_idempotent_registration() {
    let once = generate("ext", [&point(), &color(), &add(), &boxed()]).expect("generation failed");
    let twice = generate(
        "ext",
        [&point(), &color(), &add(), &boxed(), &point(), &color(), &add(), &boxed()],
    )
    .expect("generation failed");

    assert_eq!(once, twice);
}

#[test]
fn test_ownership() {
    let output = generate("ext", [&point()]).expect("generation failed");
    let source = &output.bindings_source;

    let pointer = source
        .split("template<>\n")
        .find(|c| c.starts_with("pyspot::Wrapper<Point>::Wrapper( Point* v )"))
        .expect("pointer constructor");
    assert!(!pointer.contains("own_data = true"));

    for form in ["( const Point& v )", "( Point&& v )"] {
        let ctor = source
            .split("template<>\n")
            .find(|c| c.starts_with(&format!("pyspot::Wrapper<Point>::Wrapper{}", form)))
            .expect("owning constructor");
        assert!(ctor.contains("\twrapper->own_data = true;\n"));
    }

    assert!(source.contains("\tif ( self->own_data )\n\t{\n\t\tdelete reinterpret_cast<Point*>( self->data );\n\t}\n\tPy_TYPE( self )->tp_free"));
}

#[test]
fn test_specialization_names_share_prefix() {
    let mut registry = Registry::new("ext");
    registry.register(&boxed()).unwrap();

    let module = registry.roots().next().unwrap();
    let names: Vec<_> = module.specializations().iter().map(|s| s.py_name()).collect();
    assert_eq!(names, vec!["py_Box_int_", "py_Box_float_"]);
    assert!(names.iter().all(|n| n.starts_with("py_Box")));

    let template = &module.templates()[0];
    let TagKind::Template { specializations, .. } = template.kind() else {
        panic!("expected a template");
    };
    assert_eq!(specializations.len(), 2);

    let output = printer::print(&registry);
    let extension = &output.extension_source;
    let int_reg = extension.find("\"Box<int>\"").unwrap();
    let float_reg = extension.find("\"Box<float>\"").unwrap();
    let template_reg = extension.find("// Register Box\n").unwrap();
    assert!(int_reg < float_reg && float_reg < template_reg);
    assert!(output.bindings_source.contains("if ( item_type->tp_name == \"float\"s )"));
}

#[test]
fn test_builtin_round_trip_pairs() {
    let map = TemplateMap::new();
    let cases = [
        (
            CppType::Bool,
            "PyBool_FromLong( static_cast<long>( value ) )",
            "static_cast<bool>( PyLong_AsLong( object ) )",
        ),
        (
            CppType::int(),
            "PyLong_FromLong( static_cast<long>( value ) )",
            "static_cast<int>( PyLong_AsLong( object ) )",
        ),
        (
            CppType::Char { signed: true },
            "PyLong_FromLong( static_cast<long>( value ) )",
            "PyLong_AsLong( object )",
        ),
        (
            CppType::Float,
            "PyFloat_FromDouble( static_cast<double>( value ) )",
            "static_cast<float>( PyFloat_AsDouble( object ) )",
        ),
        (
            CppType::Double,
            "PyFloat_FromDouble( static_cast<double>( value ) )",
            "PyFloat_AsDouble( object )",
        ),
    ];

    for (ty, lift, extract) in cases {
        assert_eq!(to_runtime(&ty, "value", &map).unwrap(), lift, "{:?}", ty);
        assert_eq!(from_runtime(&ty, "object", &map).unwrap(), extract, "{:?}", ty);
    }
}

#[test]
fn test_defaulted_constructor_dispatched_by_arity() {
    let mut record = point_record();
    record.methods = vec![MethodDecl::constructor(
        "Point",
        ConstructorKind::Default,
        vec![
            ParamDecl::new("x", CppType::int()).with_default(),
            ParamDecl::new("y", CppType::int()).with_default(),
        ],
    )];

    let output = generate("ext", [&Decl::record("Point", record)]).expect("generation failed");
    let source = &output.bindings_source;

    assert_eq!(source.matches("if ( args_size == 0 && kwds_size == 0 )").count(), 1);
    assert_eq!(source.matches("if ( ( args_size + kwds_size ) == 2 )").count(), 1);
    assert!(source.contains("const char* fmt { \"|ii\" };"));
    assert!(source.contains("\t\t\tself->data = new Point{ arg_x, arg_y };\n"));
}

#[test]
fn test_specializations_sharing_runtime_type() {
    let mut decl = boxed();
    if let DeclKind::Record(record) = &mut decl.kind {
        if let Some(template) = &mut record.template {
            template.specializations = vec![vec![CppType::Float], vec![CppType::Double]];
        }
    }

    let output = generate("ext", [&decl]).expect("generation failed");
    let source = &output.bindings_source;

    assert_eq!(source.matches("if ( item_type->tp_name == \"float\"s )").count(), 1);
    assert!(source.contains("return reinterpret_cast<PyObject*>( &py_Box_float__type_object );"));
    assert!(!source.contains("return reinterpret_cast<PyObject*>( &py_Box_double__type_object );"));
    // The second instantiation is still exposed under its own name
    assert!(output.extension_source.contains("\"Box<double>\""));
}

#[test]
fn test_write_generated_tree() {
    let dir = tempfile::tempdir().unwrap();
    let output = generate("ext", [&point(), &color()]).expect("generation failed");
    output.write_to(dir.path()).expect("write failed");

    let header = std::fs::read_to_string(dir.path().join(printer::BINDINGS_HEADER)).unwrap();
    assert!(header.contains("#include \"color.h\"\n#include \"point.h\"\n"));
}

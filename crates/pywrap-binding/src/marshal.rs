//! Conversion expressions between native values and runtime objects.
//!
//! Every function here is pure: it takes a type, the text of a C++ expression
//! and the template map of the instantiation being generated, and returns
//! C++ source text. Classification order is significant and mirrors the
//! order in which C++ type predicates overlap (bool is an integer, char is an
//! integer, and so on).

use crate::error::{BindingError, Result};
use crate::template::TemplateMap;
use crate::types::{CppType, StdKind};

/// Expression lifting the native value `expr` of type `ty` into a new
/// runtime object reference.
pub fn to_runtime(ty: &CppType, expr: &str, map: &TemplateMap) -> Result<String> {
    let ty = ty.substitute(map)?;
    tracing::trace!(ty = %ty.spelling(), expr, "to_runtime");
    lift(&ty, expr)
}

/// Like [`to_runtime`], for the result of a call.
///
/// A record returned by value is a temporary, so it is moved into an owning
/// wrapper instead of having its address taken.
pub fn result_to_runtime(ty: &CppType, call: &str, map: &TemplateMap) -> Result<String> {
    let ty = ty.substitute(map)?;
    if is_wrapped_object(&ty) {
        return Ok(format!(
            "pyspot::Wrapper<{}>{{ {} }}.GetIncref()",
            ty.spelling(),
            call
        ));
    }
    lift(&ty, call)
}

fn lift(ty: &CppType, expr: &str) -> Result<String> {
    if ty.is_char_pointer() {
        return Ok(format!("PyUnicode_FromString( {} )", expr));
    }

    let (value, value_expr, pointer_expr) = match ty {
        CppType::Pointer { pointee, .. } => (pointee.as_ref(), format!("( *{} )", expr), Some(expr)),
        CppType::Reference { referent, .. } => (referent.as_ref(), expr.to_string(), None),
        _ => (ty, expr.to_string(), None),
    };

    if value.is_boolean() {
        Ok(format!("PyBool_FromLong( static_cast<long>( {} ) )", value_expr))
    } else if value.is_integer() {
        Ok(format!("PyLong_FromLong( static_cast<long>( {} ) )", value_expr))
    } else if value.is_floating() {
        Ok(format!("PyFloat_FromDouble( static_cast<double>( {} ) )", value_expr))
    } else if let CppType::Array { element, .. } = value {
        let size = "sizeof( seq ) / sizeof( seq[0] )";
        Ok(list_from(size, &lift(element, "element")?, &value_expr))
    } else if let Some(kind) = value.std_kind() {
        match kind {
            StdKind::String => Ok(format!("PyUnicode_FromString( {}.c_str() )", value_expr)),
            StdKind::Vector(element) => {
                Ok(list_from("seq.size()", &lift(element, "element")?, &value_expr))
            }
            StdKind::Map(key, val) => Ok(dict_from(
                &lift(key, "pair.first")?,
                &lift(val, "pair.second")?,
                &value_expr,
            )),
        }
    } else if is_wrapped_object(value) {
        let name = value.spelling();
        let address = match pointer_expr {
            Some(pointer) => pointer.to_string(),
            None => format!("&{}", value_expr),
        };
        Ok(format!(
            "pyspot::Wrapper<{}>{{ const_cast<{}*>( {} ) }}.GetIncref()",
            name, name, address
        ))
    } else {
        Err(BindingError::UnsupportedType { ty: ty.spelling() })
    }
}

/// Records, scoped enums and non-std instantiations are lifted as opaque
/// wrapped objects.
fn is_wrapped_object(ty: &CppType) -> bool {
    match ty {
        CppType::Named(_) | CppType::Specialization { .. } => ty.std_kind().is_none(),
        CppType::Enum { scoped, .. } => *scoped,
        _ => false,
    }
}

fn list_from(size: &str, py_element: &str, seq: &str) -> String {
    format!(
        "[]( const auto& seq ) {{\n\
         \t\tauto ret = PyList_New( {size} );\n\
         \t\tfor ( size_t i = 0; i < {size}; ++i )\n\
         \t\t{{\n\
         \t\t\tauto& element = seq[i];\n\
         \t\t\tauto py_element = {py_element};\n\
         \t\t\tPyList_SET_ITEM( ret, i, py_element );\n\
         \t\t}}\n\
         \t\treturn ret;\n\
         \t}}( {seq} )"
    )
}

fn dict_from(py_key: &str, py_val: &str, map: &str) -> String {
    format!(
        "[]( const auto& map ) {{\n\
         \t\tauto ret = PyDict_New();\n\
         \t\tfor ( auto& pair : map )\n\
         \t\t{{\n\
         \t\t\tauto py_key = {py_key};\n\
         \t\t\tauto py_val = {py_val};\n\
         \t\t\tPyDict_SetItem( ret, py_key, py_val );\n\
         \t\t}}\n\
         \t\treturn ret;\n\
         \t}}( {map} )"
    )
}

/// Expression extracting a native value of type `ty` from the runtime
/// object `expr`.
pub fn from_runtime(ty: &CppType, expr: &str, map: &TemplateMap) -> Result<String> {
    let ty = ty.substitute(map)?;
    tracing::trace!(ty = %ty.spelling(), expr, "from_runtime");
    extract(&ty, expr)
}

fn extract(ty: &CppType, expr: &str) -> Result<String> {
    if ty.is_char_pointer() {
        return Ok(format!("pyspot::String{{ {} }}.ToCString()", expr));
    }

    let (value, wants_pointer) = match ty {
        CppType::Pointer { pointee, .. } => (pointee.as_ref(), true),
        CppType::Reference { referent, .. } => (referent.as_ref(), false),
        _ => (ty, false),
    };

    if value.is_boolean() {
        return Ok(format!("static_cast<bool>( PyLong_AsLong( {} ) )", expr));
    }
    if value.is_integer() {
        return Ok(match value {
            CppType::Int { signed: true } => format!("static_cast<int>( PyLong_AsLong( {} ) )", expr),
            CppType::Enum { name, .. } => format!("static_cast<{}>( PyLong_AsLong( {} ) )", name, expr),
            _ => format!("PyLong_AsLong( {} )", expr),
        });
    }
    match value {
        CppType::Float => return Ok(format!("static_cast<float>( PyFloat_AsDouble( {} ) )", expr)),
        CppType::Double | CppType::LongDouble => return Ok(format!("PyFloat_AsDouble( {} )", expr)),
        CppType::Array { .. } => return Err(BindingError::UnsupportedType { ty: ty.spelling() }),
        _ => {}
    }

    match value.std_kind() {
        Some(StdKind::String) => Ok(format!("pyspot::String{{ {} }}.ToCString()", expr)),
        // TODO: populate from the runtime sequence once the intended decoding is settled.
        Some(StdKind::Vector(_)) => Ok(format!("{}{{}}", value.spelling())),
        Some(StdKind::Map(key, val)) => Ok(dict_to(
            &value.spelling(),
            &extract(key, "py_key")?,
            &extract(val, "py_val")?,
            expr,
        )),
        None if is_wrapped_object(value) => {
            let deref = if wants_pointer { "" } else { "*" };
            Ok(format!(
                "{}reinterpret_cast<{}*>( reinterpret_cast<_PyspotWrapper*>( {} )->data )",
                deref,
                value.spelling(),
                expr
            ))
        }
        None => Err(BindingError::UnsupportedType { ty: ty.spelling() }),
    }
}

fn dict_to(map_type: &str, key: &str, val: &str, dict: &str) -> String {
    format!(
        "[]( PyObject* dict ) {{\n\
         \t\t{map_type} ret;\n\
         \t\tPyObject* py_key;\n\
         \t\tPyObject* py_val;\n\
         \t\tPy_ssize_t pos = 0;\n\
         \t\twhile ( PyDict_Next( dict, &pos, &py_key, &py_val ) )\n\
         \t\t{{\n\
         \t\t\tauto key = {key};\n\
         \t\t\tauto val = {val};\n\
         \t\t\tret[key] = val;\n\
         \t\t}}\n\
         \t\treturn ret;\n\
         \t}}( {dict} )"
    )
}

/// Statements storing the runtime object `src` into the native lvalue `dest`.
///
/// Arrays cannot be assigned as a whole, so they are filled element by
/// element from a runtime list. Every emitted line is prefixed with `indent`
/// tabs.
pub fn assign(ty: &CppType, dest: &str, src: &str, map: &TemplateMap, indent: usize) -> Result<String> {
    let ty = ty.substitute(map)?;
    assign_at(&ty, dest, src, indent, 0)
}

fn assign_at(ty: &CppType, dest: &str, src: &str, indent: usize, depth: usize) -> Result<String> {
    let tabs = "\t".repeat(indent);
    let CppType::Array { element, .. } = ty else {
        return Ok(format!("{}{} = {};\n", tabs, dest, extract(ty, src)?));
    };

    let index = if depth == 0 {
        "i".to_string()
    } else {
        format!("i{}", depth)
    };
    let item = format!("element{}", depth);
    let inner = assign_at(
        element,
        &format!("{}[{}]", dest, index),
        &item,
        indent + 1,
        depth + 1,
    )?;

    Ok(format!(
        "{tabs}for ( size_t {index} = 0; {index} < sizeof( {dest} ) / sizeof( {dest}[0] ); ++{index} )\n\
         {tabs}{{\n\
         {tabs}\tauto {item} = PyList_GetItem( {src}, {index} );\n\
         {inner}\
         {tabs}}}\n"
    ))
}

/// One-character argument-format code used by the runtime's argument parser.
pub fn format_code(ty: &CppType) -> char {
    if ty.is_integer() {
        'i'
    } else if ty.is_floating() {
        'f'
    } else if ty.is_unsigned_or_enum() {
        'I'
    } else if ty.is_real_floating() {
        // Shadowed by the floating branch above.
        'd'
    } else {
        'O'
    }
}

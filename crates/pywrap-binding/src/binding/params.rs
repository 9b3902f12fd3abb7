//! Keyword-argument parsing shared by constructors, methods and functions.

use crate::decl::ParamDecl;
use crate::error::Result;
use crate::marshal::{format_code, from_runtime, result_to_runtime};
use crate::template::TemplateMap;
use crate::types::CppType;

/// Text needed to parse one parameter list with `PyArg_ParseTupleAndKeywords`.
#[derive(Debug, Default)]
pub(crate) struct ParamBlock {
    /// Keyword names, kwlist, format string and output locals
    pub statements: String,
    /// `, &arg_a, &arg_b`
    pub parse_args: String,
    /// Native call arguments, comma separated
    pub call_args: String,
}

/// Native type `PyArg_ParseTupleAndKeywords` writes for a format code.
fn local_type(code: char) -> &'static str {
    match code {
        'i' => "int",
        'I' => "unsigned int",
        'f' => "float",
        'd' => "double",
        _ => "PyObject*",
    }
}

/// Build the parsing block for `params`.
///
/// The format string lists required parameters, then `|`, then defaultable
/// ones. `storage` prefixes every array declaration (`"static "` inside
/// functions that may run more than once per module).
pub(crate) fn param_block(
    params: &[ParamDecl],
    map: &TemplateMap,
    indent: usize,
    storage: &str,
) -> Result<ParamBlock> {
    let tabs = "\t".repeat(indent);
    let required = params.iter().filter(|p| !p.has_default).count();

    let mut names = String::new();
    let mut kwlist = Vec::new();
    let mut fmt = String::new();
    let mut locals = String::new();
    let mut parse_args = String::new();
    let mut call_args = Vec::new();

    for (i, param) in params.iter().enumerate() {
        let name = if param.name.is_empty() {
            format!("arg{}", i)
        } else {
            param.name.clone()
        };
        let ty = param.ty.substitute(map)?;

        names.push_str(&format!("{}{}char {}_name[] {{ \"{}\" }};\n", tabs, storage, name, name));
        kwlist.push(format!("{}_name", name));

        if i == required {
            fmt.push('|');
        }
        let code = format_code(&ty);
        fmt.push(code);

        let local = format!("arg_{}", name);
        let local_ty = local_type(code);
        locals.push_str(&format!("{}{} {} {{}};\n", tabs, local_ty, local));
        parse_args.push_str(&format!(", &{}", local));

        let arg = if code == 'O' {
            from_runtime(&ty, &local, map)?
        } else if ty.spelling() == local_ty {
            local
        } else {
            format!("static_cast<{}>( {} )", ty.spelling(), local)
        };
        call_args.push(arg);
    }
    if required == params.len() {
        fmt.push('|');
    }

    kwlist.push("nullptr".to_string());
    let statements = format!(
        "{names}{tabs}{storage}char* kwlist[] {{ {kwlist} }};\n\
         {tabs}{storage}const char* fmt {{ \"{fmt}\" }};\n\n\
         {locals}\n",
        kwlist = kwlist.join(", "),
    );

    Ok(ParamBlock {
        statements,
        parse_args,
        call_args: call_args.join(", "),
    })
}

/// Flags of a `PyMethodDef` entry for a callable taking `params`.
pub(crate) fn method_flags(params: &[ParamDecl], is_static: bool) -> String {
    let mut flags = if params.is_empty() {
        "METH_NOARGS".to_string()
    } else {
        "METH_VARARGS | METH_KEYWORDS".to_string()
    };
    if is_static {
        flags.push_str(" | METH_STATIC");
    }
    flags
}

/// Body statements of a wrapped callable: parse the arguments, call
/// `callee`, and convert what it returns.
///
/// A parse failure returns `nullptr` with the runtime error already set.
pub(crate) fn call_body(
    params: &[ParamDecl],
    return_type: &CppType,
    callee: &str,
    map: &TemplateMap,
) -> Result<String> {
    let mut body = String::new();
    let mut call_args = String::new();

    if !params.is_empty() {
        let block = param_block(params, map, 1, "static ")?;
        body.push_str(&block.statements);
        body.push_str(&format!(
            "\tif ( !PyArg_ParseTupleAndKeywords( args, kwds, fmt, kwlist{} ) )\n\t{{\n\
             \t\treturn nullptr;\n\t}}\n\n",
            block.parse_args
        ));
        call_args = block.call_args;
    }

    let call = if call_args.is_empty() {
        format!("{}()", callee)
    } else {
        format!("{}( {} )", callee, call_args)
    };

    if return_type.substitute(map)?.is_void() {
        body.push_str(&format!(
            "\t{};\n\tPy_INCREF( Py_None );\n\treturn Py_None;\n",
            call
        ));
    } else {
        body.push_str(&format!(
            "\treturn {};\n",
            result_to_runtime(return_type, &call, map)?
        ));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CppType;

    #[test]
    fn test_required_params() {
        let params = vec![
            ParamDecl::new("a", CppType::int()),
            ParamDecl::new("b", CppType::int()),
        ];
        let block = param_block(&params, &TemplateMap::new(), 1, "static ").unwrap();

        assert_eq!(
            block.statements,
            "\tstatic char a_name[] { \"a\" };\n\
             \tstatic char b_name[] { \"b\" };\n\
             \tstatic char* kwlist[] { a_name, b_name, nullptr };\n\
             \tstatic const char* fmt { \"ii|\" };\n\n\
             \tint arg_a {};\n\
             \tint arg_b {};\n\n"
        );
        assert_eq!(block.parse_args, ", &arg_a, &arg_b");
        assert_eq!(block.call_args, "arg_a, arg_b");
    }

    #[test]
    fn test_defaultable_params_follow_separator() {
        let params = vec![
            ParamDecl::new("x", CppType::Double),
            ParamDecl::new("label", CppType::named("std::string").const_ref()).with_default(),
        ];
        let block = param_block(&params, &TemplateMap::new(), 2, "").unwrap();

        assert!(block.statements.contains("\t\tconst char* fmt { \"f|O\" };\n"));
        assert!(block.statements.contains("\t\tfloat arg_x {};\n"));
        assert!(block.statements.contains("\t\tPyObject* arg_label {};\n"));
        assert_eq!(
            block.call_args,
            "static_cast<double>( arg_x ), pyspot::String{ arg_label }.ToCString()"
        );
    }

    #[test]
    fn test_unnamed_and_enum_params() {
        let params = vec![
            ParamDecl::new("", CppType::Bool),
            ParamDecl::new(
                "mode",
                CppType::Enum {
                    name: "io::Mode".into(),
                    scoped: true,
                },
            ),
        ];
        let block = param_block(&params, &TemplateMap::new(), 1, "").unwrap();

        assert!(block.statements.contains("char arg0_name[] { \"arg0\" };"));
        assert!(block.statements.contains("const char* fmt { \"iI|\" };"));
        assert_eq!(
            block.call_args,
            "static_cast<bool>( arg_arg0 ), static_cast<io::Mode>( arg_mode )"
        );
    }

    #[test]
    fn test_no_params() {
        let block = param_block(&[], &TemplateMap::new(), 1, "").unwrap();
        assert!(block.statements.contains("char* kwlist[] { nullptr };"));
        assert!(block.statements.contains("const char* fmt { \"|\" };"));
        assert!(block.call_args.is_empty());
    }

    #[test]
    fn test_method_flags() {
        assert_eq!(method_flags(&[], false), "METH_NOARGS");
        let params = vec![ParamDecl::new("a", CppType::int())];
        assert_eq!(method_flags(&params, false), "METH_VARARGS | METH_KEYWORDS");
        assert_eq!(method_flags(&params, true), "METH_VARARGS | METH_KEYWORDS | METH_STATIC");
    }

    #[test]
    fn test_call_body_void() {
        let body = call_body(&[], &CppType::Void, "data->reset", &TemplateMap::new()).unwrap();
        assert_eq!(body, "\tdata->reset();\n\tPy_INCREF( Py_None );\n\treturn Py_None;\n");
    }

    #[test]
    fn test_call_body_parses_then_converts() {
        let params = vec![
            ParamDecl::new("a", CppType::int()),
            ParamDecl::new("b", CppType::int()),
        ];
        let body = call_body(&params, &CppType::int(), "ns::add", &TemplateMap::new()).unwrap();

        assert!(body.contains(
            "\tif ( !PyArg_ParseTupleAndKeywords( args, kwds, fmt, kwlist, &arg_a, &arg_b ) )\n\t{\n\t\treturn nullptr;\n\t}\n\n"
        ));
        assert!(body.ends_with("\treturn PyLong_FromLong( static_cast<long>( ns::add( arg_a, arg_b ) ) );\n"));
    }
}

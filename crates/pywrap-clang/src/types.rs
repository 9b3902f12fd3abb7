//! Conversion of libclang types into [`CppType`] descriptors.

use crate::cursor::{self, cx_string_to_string};
use clang_sys::*;
use pywrap_binding::CppType;

/// Convert a libclang type.
///
/// `params` are the type parameters in scope, so that `T` inside a class
/// template becomes [`CppType::TemplateParam`].
pub(crate) fn convert_type(ty: CXType, params: &[String]) -> CppType {
    unsafe {
        match ty.kind {
            CXType_Pointer => {
                let pointee = clang_getPointeeType(ty);
                CppType::Pointer {
                    is_const: clang_isConstQualifiedType(pointee) != 0,
                    pointee: Box::new(convert_type(pointee, params)),
                }
            }
            CXType_LValueReference | CXType_RValueReference => {
                let referent = clang_getPointeeType(ty);
                CppType::Reference {
                    is_const: clang_isConstQualifiedType(referent) != 0,
                    is_rvalue: ty.kind == CXType_RValueReference,
                    referent: Box::new(convert_type(referent, params)),
                }
            }
            CXType_ConstantArray => {
                let element = clang_getArrayElementType(ty);
                let size = clang_getArraySize(ty);
                CppType::Array {
                    element: Box::new(convert_type(element, params)),
                    size: usize::try_from(size).ok(),
                }
            }
            CXType_IncompleteArray => {
                let element = clang_getArrayElementType(ty);
                CppType::Array {
                    element: Box::new(convert_type(element, params)),
                    size: None,
                }
            }
            _ => match template_param(ty, params) {
                Some(param) => param,
                None => convert_value_type(ty, params),
            },
        }
    }
}

fn convert_value_type(ty: CXType, params: &[String]) -> CppType {
    unsafe {
        match ty.kind {
            CXType_Void => CppType::Void,
            CXType_Bool => CppType::Bool,
            // Plain char, whatever its signedness on the target
            CXType_Char_S | CXType_Char_U | CXType_SChar => CppType::Char { signed: true },
            CXType_UChar => CppType::Char { signed: false },
            CXType_Short => CppType::Short { signed: true },
            CXType_UShort => CppType::Short { signed: false },
            CXType_Int => CppType::Int { signed: true },
            CXType_UInt => CppType::Int { signed: false },
            CXType_Long => CppType::Long { signed: true },
            CXType_ULong => CppType::Long { signed: false },
            CXType_LongLong => CppType::LongLong { signed: true },
            CXType_ULongLong => CppType::LongLong { signed: false },
            CXType_Float => CppType::Float,
            CXType_Double => CppType::Double,
            CXType_LongDouble => CppType::LongDouble,
            CXType_Elaborated => convert_type(clang_Type_getNamedType(ty), params),
            CXType_Typedef => {
                let decl = clang_getTypeDeclaration(ty);
                let name = cursor::qualified_name(decl);
                let canonical = clang_getCanonicalType(ty);
                let builtin = (CXType_Void..=CXType_LongDouble).contains(&canonical.kind);
                // std typedefs of class types (std::string) keep their short name
                if name.starts_with("std::") && !builtin {
                    CppType::Named(name)
                } else {
                    convert_type(canonical, params)
                }
            }
            CXType_Enum => {
                let decl = clang_getTypeDeclaration(ty);
                CppType::Enum {
                    name: cursor::qualified_name(decl),
                    scoped: clang_EnumDecl_isScoped(decl) != 0,
                }
            }
            CXType_Record => {
                let decl = clang_getTypeDeclaration(ty);
                match template_args(ty, params) {
                    Some(args) => {
                        let template = clang_getSpecializedCursorTemplate(decl);
                        let name = if cursor::is_null(template) {
                            cursor::qualified_name(decl)
                        } else {
                            cursor::qualified_name(template)
                        };
                        CppType::Specialization { name, args }
                    }
                    None => CppType::Named(cursor::qualified_name(decl)),
                }
            }
            _ => {
                let spelling = type_spelling(ty);
                match template_args(ty, params) {
                    // Dependent instantiation such as std::vector<T>
                    Some(args) => CppType::Specialization {
                        name: spelling.split('<').next().unwrap_or_default().trim().to_string(),
                        args,
                    },
                    None => CppType::Named(spelling),
                }
            }
        }
    }
}

fn template_param(ty: CXType, params: &[String]) -> Option<CppType> {
    if params.is_empty() {
        return None;
    }
    let spelling = type_spelling(ty);
    let index = params.iter().position(|p| *p == spelling)?;
    Some(CppType::template_param(&spelling, 0, index as u32))
}

/// Type arguments of a template instantiation, if `ty` is one.
///
/// Non-type arguments have no type; they show up as `CXType_Invalid` and
/// are skipped.
pub(crate) fn template_args(ty: CXType, params: &[String]) -> Option<Vec<CppType>> {
    unsafe {
        let count = clang_Type_getNumTemplateArguments(ty);
        if count <= 0 {
            return None;
        }
        let mut args = Vec::new();
        for i in 0..count as u32 {
            let arg = clang_Type_getTemplateArgumentAsType(ty, i);
            if arg.kind == CXType_Invalid {
                tracing::warn!(ty = %type_spelling(ty), index = i, "skipping non-type template argument");
                continue;
            }
            args.push(convert_type(arg, params));
        }
        Some(args)
    }
}

/// Type spelling without qualifiers and elaboration keywords.
pub(crate) fn type_spelling(ty: CXType) -> String {
    let spelling = unsafe { cx_string_to_string(clang_getTypeSpelling(ty)) };
    let mut s = spelling.as_str();
    for prefix in ["const ", "volatile ", "struct ", "class ", "enum ", "union "] {
        s = s.trim_start_matches(prefix);
    }
    s.to_string()
}

/// Strip pointers and references.
pub(crate) fn value_type(mut ty: CXType) -> CXType {
    unsafe {
        while matches!(
            ty.kind,
            CXType_Pointer | CXType_LValueReference | CXType_RValueReference
        ) {
            ty = clang_getPointeeType(ty);
        }
        ty
    }
}

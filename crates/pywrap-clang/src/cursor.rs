//! Thin helpers over raw libclang cursors.

use clang_sys::*;
use pywrap_binding::{AccessSpecifier, ConstructorKind};
use std::ffi::CStr;
use std::ptr;

/// Source location of a cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: Option<String>,
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file, self.line, self.column),
            None => write!(f, "<unknown>"),
        }
    }
}

/// Direct children of `cursor`, in source order.
pub(crate) fn children(cursor: CXCursor) -> Vec<CXCursor> {
    extern "C" fn visitor(
        child: CXCursor,
        _parent: CXCursor,
        data: CXClientData,
    ) -> CXChildVisitResult {
        unsafe {
            let children = &mut *(data as *mut Vec<CXCursor>);
            if clang_Cursor_isNull(child) == 0 {
                children.push(child);
            }
        }
        CXChildVisit_Continue
    }

    let mut children: Vec<CXCursor> = Vec::new();
    unsafe {
        clang_visitChildren(
            cursor,
            visitor,
            &mut children as *mut Vec<CXCursor> as CXClientData,
        );
    }
    children
}

pub(crate) fn kind(cursor: CXCursor) -> CXCursorKind {
    unsafe { clang_getCursorKind(cursor) }
}

pub(crate) fn is_null(cursor: CXCursor) -> bool {
    unsafe { clang_Cursor_isNull(cursor) != 0 }
}

/// Whether the cursor carries `__attribute__((annotate("pyspot")))`.
pub(crate) fn is_annotated(cursor: CXCursor, annotation: &str) -> bool {
    children(cursor)
        .into_iter()
        .any(|child| kind(child) == CXCursor_AnnotateAttr && spelling(child) == annotation)
}

pub(crate) fn is_definition(cursor: CXCursor) -> bool {
    unsafe { clang_isCursorDefinition(cursor) != 0 }
}

pub(crate) fn in_system_header(cursor: CXCursor) -> bool {
    unsafe { clang_Location_isInSystemHeader(clang_getCursorLocation(cursor)) != 0 }
}

/// Unified symbol resolution, stable across redeclarations.
pub(crate) fn usr(cursor: CXCursor) -> String {
    unsafe { cx_string_to_string(clang_getCursorUSR(clang_getCanonicalCursor(cursor))) }
}

pub(crate) fn spelling(cursor: CXCursor) -> String {
    unsafe { cx_string_to_string(clang_getCursorSpelling(cursor)) }
}

/// Qualified name through namespaces and enclosing records.
///
/// Anonymous and inline namespaces are left out, so `std::__1::string`
/// and `std::__cxx11::basic_string` come out as plain `std::` names.
pub(crate) fn qualified_name(cursor: CXCursor) -> String {
    let mut parts = vec![spelling(cursor)];
    let mut current = semantic_parent(cursor);
    while let Some(parent) = current {
        match kind(parent) {
            CXCursor_Namespace => {
                let name = spelling(parent);
                let inline = unsafe { clang_Cursor_isInlineNamespace(parent) != 0 };
                if !name.is_empty() && !inline {
                    parts.push(name);
                }
            }
            CXCursor_StructDecl | CXCursor_ClassDecl | CXCursor_UnionDecl
            | CXCursor_ClassTemplate | CXCursor_EnumDecl => {
                let name = spelling(parent);
                if !name.is_empty() {
                    parts.push(name);
                }
            }
            _ => {}
        }
        current = semantic_parent(parent);
    }
    parts.reverse();
    parts.join("::")
}

/// Enclosing named namespaces, outermost first.
pub(crate) fn namespace_path(cursor: CXCursor) -> Vec<String> {
    let mut path = Vec::new();
    let mut current = semantic_parent(cursor);
    while let Some(parent) = current {
        if kind(parent) == CXCursor_Namespace {
            let name = spelling(parent);
            let inline = unsafe { clang_Cursor_isInlineNamespace(parent) != 0 };
            if !name.is_empty() && !inline {
                path.push(name);
            }
        }
        current = semantic_parent(parent);
    }
    path.reverse();
    path
}

fn semantic_parent(cursor: CXCursor) -> Option<CXCursor> {
    unsafe {
        let parent = clang_getCursorSemanticParent(cursor);
        if clang_Cursor_isNull(parent) != 0
            || clang_getCursorKind(parent) == CXCursor_TranslationUnit
            || clang_equalCursors(parent, cursor) != 0
        {
            None
        } else {
            Some(parent)
        }
    }
}

/// Get access specifier for a cursor (for class members).
///
/// Declarations outside a class report no specifier; they are public.
pub(crate) fn access_specifier(cursor: CXCursor) -> AccessSpecifier {
    unsafe {
        match clang_getCXXAccessSpecifier(cursor) {
            CX_CXXProtected => AccessSpecifier::Protected,
            CX_CXXPrivate => AccessSpecifier::Private,
            _ => AccessSpecifier::Public,
        }
    }
}

/// Get constructor kind for a constructor cursor.
pub(crate) fn constructor_kind(cursor: CXCursor) -> ConstructorKind {
    unsafe {
        if clang_CXXConstructor_isDefaultConstructor(cursor) != 0 {
            ConstructorKind::Default
        } else if clang_CXXConstructor_isCopyConstructor(cursor) != 0 {
            ConstructorKind::Copy
        } else if clang_CXXConstructor_isMoveConstructor(cursor) != 0 {
            ConstructorKind::Move
        } else {
            ConstructorKind::Other
        }
    }
}

pub(crate) fn is_deleted(cursor: CXCursor) -> bool {
    unsafe { clang_CXXMethod_isDeleted(cursor) != 0 }
}

pub(crate) fn is_static(cursor: CXCursor) -> bool {
    unsafe { clang_CXXMethod_isStatic(cursor) != 0 }
}

/// Whether a parameter declaration spells a default argument.
///
/// Expression children alone are not enough: the size of an array
/// parameter (`int a[4]`) is one too. The `=` token is.
pub(crate) fn has_default_argument(param: CXCursor) -> bool {
    unsafe {
        let tu = clang_Cursor_getTranslationUnit(param);
        let mut tokens: *mut CXToken = ptr::null_mut();
        let mut count: u32 = 0;
        clang_tokenize(tu, clang_getCursorExtent(param), &mut tokens, &mut count);
        if tokens.is_null() {
            return false;
        }

        let found = std::slice::from_raw_parts(tokens, count as usize)
            .iter()
            .any(|&token| {
                clang_getTokenKind(token) == CXToken_Punctuation
                    && cx_string_to_string(clang_getTokenSpelling(tu, token)) == "="
            });
        clang_disposeTokens(tu, tokens, count);
        found
    }
}

pub(crate) fn location(cursor: CXCursor) -> SourceLocation {
    unsafe {
        let loc = clang_getCursorLocation(cursor);
        let mut file: CXFile = ptr::null_mut();
        let mut line: u32 = 0;
        let mut column: u32 = 0;

        clang_getSpellingLocation(loc, &mut file, &mut line, &mut column, ptr::null_mut());

        let file = if !file.is_null() {
            Some(cx_string_to_string(clang_getFileName(file)))
        } else {
            None
        };

        SourceLocation { file, line, column }
    }
}

/// Convert a CXString to a Rust String, disposing the CXString.
pub(crate) unsafe fn cx_string_to_string(s: CXString) -> String {
    let c_str = clang_getCString(s);
    let result = if c_str.is_null() {
        String::new()
    } else {
        CStr::from_ptr(c_str).to_string_lossy().into_owned()
    };
    clang_disposeString(s);
    result
}

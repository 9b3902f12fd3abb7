//! Walks a translation unit and converts annotated cursors into [`Decl`]s.

use crate::cursor::{self, SourceLocation};
use crate::location::IncludeResolver;
use crate::types::{convert_type, template_args, type_spelling, value_type};
use clang_sys::*;
use pywrap_binding::{
    AccessSpecifier, ConstructorKind, CppType, Decl, DeclKind, EnumDecl, FieldDecl, FunctionDecl,
    MethodDecl, MethodKind, OperatorKind, ParamDecl, RecordDecl, TemplateDecl,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// Annotation marking a declaration for wrapping.
pub const ANNOTATION: &str = "pyspot";

/// How deep field types are followed into their own declarations.
const MAX_FIELD_DEPTH: usize = 8;

pub(crate) struct Collector<'a> {
    resolver: &'a IncludeResolver,
    decls: Vec<Decl>,
    seen: FxHashSet<String>,
    /// Annotated class templates: USR to index in `decls`
    templates: FxHashMap<String, usize>,
    /// Completed instantiations per template USR, in first-seen order
    instantiations: FxHashMap<String, Vec<Vec<CppType>>>,
}

impl<'a> Collector<'a> {
    pub(crate) fn new(resolver: &'a IncludeResolver) -> Self {
        Self {
            resolver,
            decls: Vec::new(),
            seen: FxHashSet::default(),
            templates: FxHashMap::default(),
            instantiations: FxHashMap::default(),
        }
    }

    /// Walk everything below the translation unit cursor.
    pub(crate) fn collect(mut self, root: CXCursor) -> Vec<Decl> {
        self.walk(root);

        for (usr, index) in &self.templates {
            let Some(found) = self.instantiations.remove(usr) else {
                continue;
            };
            if let DeclKind::Record(RecordDecl {
                template: Some(template),
                ..
            }) = &mut self.decls[*index].kind
            {
                template.specializations = found;
            }
        }
        self.decls
    }

    fn walk(&mut self, parent: CXCursor) {
        for child in cursor::children(parent) {
            if cursor::in_system_header(child) {
                continue;
            }
            self.note_instantiation(child);

            match cursor::kind(child) {
                CXCursor_FunctionDecl
                | CXCursor_EnumDecl
                | CXCursor_StructDecl
                | CXCursor_ClassDecl
                | CXCursor_ClassTemplate
                    if cursor::is_annotated(child, ANNOTATION) =>
                {
                    self.visit_annotated(child);
                }
                _ => {}
            }
            self.walk(child);
        }
    }

    fn visit_annotated(&mut self, cursor: CXCursor) {
        let kind = cursor::kind(cursor);
        if kind != CXCursor_FunctionDecl && !cursor::is_definition(cursor) {
            return;
        }
        let usr = cursor::usr(cursor);
        if !self.seen.insert(usr.clone()) {
            return;
        }

        let decl = convert_decl(cursor, self.resolver, 0);
        tracing::debug!(decl = %decl.qualified_name, location = %cursor::location(cursor), "discovered");
        if kind == CXCursor_ClassTemplate {
            self.templates.insert(usr, self.decls.len());
        }
        self.decls.push(decl);
    }

    /// Record `cursor`'s type if it is a completed class template instantiation.
    fn note_instantiation(&mut self, cursor: CXCursor) {
        unsafe {
            let ty = value_type(clang_getCursorType(cursor));
            if ty.kind == CXType_Invalid || clang_Type_getNumTemplateArguments(ty) <= 0 {
                return;
            }
            // Incomplete and dependent types have no size
            if clang_Type_getSizeOf(ty) < 0 {
                return;
            }
            let decl = clang_getTypeDeclaration(ty);
            let template = clang_getSpecializedCursorTemplate(decl);
            if cursor::is_null(template) {
                return;
            }

            let Some(args) = template_args(ty, &[]) else {
                return;
            };
            let usr = cursor::usr(template);
            let found = self.instantiations.entry(usr).or_default();
            let key = spelling_of(&args);
            if !found.iter().any(|a| spelling_of(a) == key) {
                tracing::trace!(instantiation = %type_spelling(ty), "found instantiation");
                found.push(args);
            }
        }
    }
}

fn spelling_of(args: &[CppType]) -> String {
    args.iter().map(|a| a.spelling()).collect::<Vec<_>>().join(",")
}

/// Convert a declaration cursor; `depth` counts field-type recursion.
fn convert_decl(cursor: CXCursor, resolver: &IncludeResolver, depth: usize) -> Decl {
    let location = cursor::location(cursor);
    let kind = match cursor::kind(cursor) {
        CXCursor_FunctionDecl => DeclKind::Function(convert_function(cursor)),
        CXCursor_EnumDecl => DeclKind::Enum(convert_enum(cursor)),
        CXCursor_ClassTemplate => {
            let params = template_params(cursor);
            let mut record = convert_record(cursor, &params, resolver, depth);
            record.template = Some(TemplateDecl {
                params,
                specializations: Vec::new(),
            });
            DeclKind::Record(record)
        }
        _ => DeclKind::Record(convert_record(cursor, &[], resolver, depth)),
    };

    Decl {
        name: cursor::spelling(cursor),
        qualified_name: cursor::qualified_name(cursor),
        namespace: cursor::namespace_path(cursor),
        access: cursor::access_specifier(cursor),
        include: include_path(&location, resolver),
        kind,
    }
}

fn include_path(location: &SourceLocation, resolver: &IncludeResolver) -> String {
    match &location.file {
        Some(_) => resolver.resolve(&location.to_string()),
        None => String::new(),
    }
}

fn convert_function(cursor: CXCursor) -> FunctionDecl {
    let return_type = unsafe { convert_type(clang_getCursorResultType(cursor), &[]) };
    FunctionDecl {
        params: extract_params(cursor, &[]),
        return_type,
    }
}

fn convert_enum(cursor: CXCursor) -> EnumDecl {
    let enumerators = cursor::children(cursor)
        .into_iter()
        .filter(|c| cursor::kind(*c) == CXCursor_EnumConstantDecl)
        .map(cursor::spelling)
        .collect();
    EnumDecl {
        enumerators,
        scoped: unsafe { clang_EnumDecl_isScoped(cursor) != 0 },
    }
}

fn template_params(cursor: CXCursor) -> Vec<String> {
    let mut params = Vec::new();
    for child in cursor::children(cursor) {
        match cursor::kind(child) {
            CXCursor_TemplateTypeParameter => params.push(cursor::spelling(child)),
            CXCursor_NonTypeTemplateParameter | CXCursor_TemplateTemplateParameter => {
                tracing::warn!(
                    template = %cursor::qualified_name(cursor),
                    param = %cursor::spelling(child),
                    "skipping non-type template parameter"
                );
            }
            _ => {}
        }
    }
    params
}

fn convert_record(
    cursor: CXCursor,
    params: &[String],
    resolver: &IncludeResolver,
    depth: usize,
) -> RecordDecl {
    let owner = cursor::qualified_name(cursor);
    let mut record = RecordDecl::default();
    let mut has_destructor = false;

    for child in cursor::children(cursor) {
        match cursor::kind(child) {
            CXCursor_FieldDecl => record.fields.push(convert_field(child, params, resolver, depth)),
            CXCursor_CXXMethod => {
                if cursor::is_deleted(child) {
                    continue;
                }
                let name = cursor::spelling(child);
                let kind = match name.as_str() {
                    "operator==" => MethodKind::Operator(OperatorKind::EqualEqual),
                    n if n.starts_with("operator") => MethodKind::Operator(OperatorKind::Other),
                    _ => MethodKind::Method,
                };
                let return_type = unsafe { convert_type(clang_getCursorResultType(child), params) };
                record.methods.push(MethodDecl {
                    qualified_name: format!("{}::{}", owner, name),
                    name,
                    params: extract_params(child, params),
                    return_type,
                    access: cursor::access_specifier(child),
                    kind,
                    is_static: cursor::is_static(child),
                });
            }
            CXCursor_Constructor => {
                let name = cursor::spelling(child);
                // Deleted constructors still suppress the implicit ones
                let access = if cursor::is_deleted(child) {
                    AccessSpecifier::Private
                } else {
                    cursor::access_specifier(child)
                };
                record.methods.push(MethodDecl {
                    qualified_name: format!("{}::{}", owner, name),
                    name,
                    params: extract_params(child, params),
                    return_type: CppType::Void,
                    access,
                    kind: MethodKind::Constructor(cursor::constructor_kind(child)),
                    is_static: false,
                });
            }
            CXCursor_Destructor => {
                has_destructor = true;
                let name = cursor::spelling(child);
                record.methods.push(MethodDecl {
                    qualified_name: format!("{}::{}", owner, name),
                    name,
                    params: Vec::new(),
                    return_type: CppType::Void,
                    access: cursor::access_specifier(child),
                    kind: MethodKind::Destructor,
                    is_static: false,
                });
            }
            _ => {}
        }
    }

    special_members(&mut record, has_destructor);
    record
}

/// Work out which special constructors the wrapper can call, declared or
/// implicit.
fn special_members(record: &mut RecordDecl, has_destructor: bool) {
    let ctors: Vec<(ConstructorKind, bool)> = record
        .methods
        .iter()
        .filter_map(|m| match m.kind {
            MethodKind::Constructor(kind) => Some((kind, m.is_public())),
            _ => None,
        })
        .collect();
    let declared = |kind: ConstructorKind| ctors.iter().any(|(k, _)| *k == kind);
    let usable = |kind: ConstructorKind| ctors.iter().any(|(k, public)| *k == kind && *public);

    let implicit_copy = !declared(ConstructorKind::Copy) && !declared(ConstructorKind::Move);
    record.has_default_ctor = ctors.is_empty() || usable(ConstructorKind::Default);
    record.has_copy_ctor = usable(ConstructorKind::Copy) || implicit_copy;
    record.has_move_ctor = usable(ConstructorKind::Move) || (implicit_copy && !has_destructor);
}

fn convert_field(
    cursor: CXCursor,
    params: &[String],
    resolver: &IncludeResolver,
    depth: usize,
) -> FieldDecl {
    let ty = unsafe { clang_getCursorType(cursor) };
    let mut field = FieldDecl::new(&cursor::spelling(cursor), convert_type(ty, params))
        .with_access(cursor::access_specifier(cursor));
    field.type_decl = field_type_decl(ty, resolver, depth);
    field
}

/// Declaration of a record or enum a field holds by value.
fn field_type_decl(ty: CXType, resolver: &IncludeResolver, depth: usize) -> Option<Box<Decl>> {
    if depth >= MAX_FIELD_DEPTH {
        tracing::warn!(ty = %type_spelling(ty), "field types nested too deep, not following");
        return None;
    }
    unsafe {
        let canonical = clang_getCanonicalType(ty);
        if !matches!(canonical.kind, CXType_Record | CXType_Enum) {
            return None;
        }
        if clang_Type_getNumTemplateArguments(canonical) > 0 {
            return None;
        }
        let decl = clang_getTypeDeclaration(canonical);
        let definition = clang_getCursorDefinition(decl);
        if cursor::is_null(definition) || cursor::in_system_header(definition) {
            return None;
        }
        Some(Box::new(convert_decl(definition, resolver, depth + 1)))
    }
}

/// Extract parameters from a function or method cursor.
fn extract_params(cursor: CXCursor, params: &[String]) -> Vec<ParamDecl> {
    let mut result = Vec::new();
    unsafe {
        let num_args = clang_Cursor_getNumArguments(cursor);
        for i in 0..num_args.max(0) as u32 {
            let arg = clang_Cursor_getArgument(cursor, i);
            let ty = convert_type(clang_getCursorType(arg), params);
            let mut param = ParamDecl::new(&cursor::spelling(arg), ty);
            if cursor::has_default_argument(arg) {
                param = param.with_default();
            }
            result.push(param);
        }
    }
    result
}

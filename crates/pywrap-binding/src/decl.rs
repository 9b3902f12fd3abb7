//! Owned declaration model handed over by the discovery pass.
//!
//! These values hold copies of everything the generator needs; nothing in
//! here refers back into a parsed translation unit.

use crate::types::CppType;

/// C++ access specifier for class members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessSpecifier {
    /// Public access - accessible from anywhere
    Public,
    /// Private access - accessible only from within the class
    #[default]
    Private,
    /// Protected access - accessible from class and derived classes
    Protected,
}

/// C++ constructor kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstructorKind {
    /// Default constructor (no parameters or all defaulted)
    Default,
    /// Copy constructor (takes const T&)
    Copy,
    /// Move constructor (takes T&&)
    Move,
    /// Other constructor (parameterized, converting, etc.)
    #[default]
    Other,
}

/// Overloaded operators the generator distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    EqualEqual,
    Other,
}

/// One annotated declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    /// Simple name (e.g. "Point")
    pub name: String,
    /// Qualified name (e.g. "geo::Point")
    pub qualified_name: String,
    /// Enclosing namespaces, outermost first
    pub namespace: Vec<String>,
    pub access: AccessSpecifier,
    /// Header to include, relative to the configured include roots
    pub include: String,
    pub kind: DeclKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    Function(FunctionDecl),
    Enum(EnumDecl),
    Record(RecordDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub params: Vec<ParamDecl>,
    pub return_type: CppType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: String,
    pub ty: CppType,
    pub has_default: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnumDecl {
    pub enumerators: Vec<String>,
    pub scoped: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordDecl {
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    /// Present when the record is a class template
    pub template: Option<TemplateDecl>,
    pub has_default_ctor: bool,
    pub has_copy_ctor: bool,
    pub has_move_ctor: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: CppType,
    pub access: AccessSpecifier,
    /// Declaration of the user type this field refers to, if any
    pub type_decl: Option<Box<Decl>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    pub qualified_name: String,
    pub params: Vec<ParamDecl>,
    pub return_type: CppType,
    pub access: AccessSpecifier,
    pub kind: MethodKind,
    pub is_static: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Constructor(ConstructorKind),
    Destructor,
    Operator(OperatorKind),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemplateDecl {
    /// Type parameter names, in declaration order
    pub params: Vec<String>,
    /// Argument lists of every completed instantiation, in discovery order
    pub specializations: Vec<Vec<CppType>>,
}

impl Decl {
    /// A free function at `qualified_name`.
    pub fn function(qualified_name: &str, params: Vec<ParamDecl>, return_type: CppType) -> Self {
        Self::new(
            qualified_name,
            DeclKind::Function(FunctionDecl {
                params,
                return_type,
            }),
        )
    }

    /// An enumeration at `qualified_name`.
    pub fn enumeration(qualified_name: &str, enumerators: &[&str], scoped: bool) -> Self {
        Self::new(
            qualified_name,
            DeclKind::Enum(EnumDecl {
                enumerators: enumerators.iter().map(|e| e.to_string()).collect(),
                scoped,
            }),
        )
    }

    /// A struct/class at `qualified_name`.
    pub fn record(qualified_name: &str, record: RecordDecl) -> Self {
        Self::new(qualified_name, DeclKind::Record(record))
    }

    fn new(qualified_name: &str, kind: DeclKind) -> Self {
        let mut namespace: Vec<String> = qualified_name.split("::").map(str::to_string).collect();
        let name = namespace.pop().unwrap_or_default();
        Self {
            name,
            qualified_name: qualified_name.to_string(),
            namespace,
            access: AccessSpecifier::Public,
            include: String::new(),
            kind,
        }
    }

    /// Set the header this declaration comes from.
    pub fn with_include(mut self, include: &str) -> Self {
        self.include = include.to_string();
        self
    }

    /// The type naming this declaration, for fields that refer to it.
    pub fn as_type(&self) -> Option<CppType> {
        match &self.kind {
            DeclKind::Function(_) => None,
            DeclKind::Enum(e) => Some(CppType::Enum {
                name: self.qualified_name.clone(),
                scoped: e.scoped,
            }),
            DeclKind::Record(_) => Some(CppType::Named(self.qualified_name.clone())),
        }
    }
}

impl ParamDecl {
    pub fn new(name: &str, ty: CppType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            has_default: false,
        }
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }
}

impl FieldDecl {
    /// A public field.
    pub fn new(name: &str, ty: CppType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            access: AccessSpecifier::Public,
            type_decl: None,
        }
    }

    pub fn with_access(mut self, access: AccessSpecifier) -> Self {
        self.access = access;
        self
    }

    /// A public field whose type is the user declaration `decl`.
    pub fn of_decl(name: &str, decl: Decl) -> Self {
        let ty = decl
            .as_type()
            .unwrap_or_else(|| CppType::Named(decl.qualified_name.clone()));
        Self {
            name: name.to_string(),
            ty,
            access: AccessSpecifier::Public,
            type_decl: Some(Box::new(decl)),
        }
    }
}

impl MethodDecl {
    /// A public instance method of `owner`.
    pub fn method(owner: &str, name: &str, params: Vec<ParamDecl>, return_type: CppType) -> Self {
        Self {
            name: name.to_string(),
            qualified_name: format!("{}::{}", owner, name),
            params,
            return_type,
            access: AccessSpecifier::Public,
            kind: MethodKind::Method,
            is_static: false,
        }
    }

    /// A public constructor of `owner`.
    pub fn constructor(owner: &str, kind: ConstructorKind, params: Vec<ParamDecl>) -> Self {
        let name = owner.rsplit("::").next().unwrap_or(owner).to_string();
        Self {
            qualified_name: format!("{}::{}", owner, name),
            name,
            params,
            return_type: CppType::Void,
            access: AccessSpecifier::Public,
            kind: MethodKind::Constructor(kind),
            is_static: false,
        }
    }

    /// A public `operator==` of `owner`.
    pub fn equality(owner: &str) -> Self {
        let other = CppType::Named(owner.to_string()).const_ref();
        Self {
            name: "operator==".to_string(),
            qualified_name: format!("{}::operator==", owner),
            params: vec![ParamDecl::new("other", other)],
            return_type: CppType::Bool,
            access: AccessSpecifier::Public,
            kind: MethodKind::Operator(OperatorKind::EqualEqual),
            is_static: false,
        }
    }

    pub fn is_public(&self) -> bool {
        self.access == AccessSpecifier::Public
    }
}

impl RecordDecl {
    /// Whether the record declares `operator==`.
    pub fn has_equality(&self) -> bool {
        self.methods
            .iter()
            .any(|m| m.kind == MethodKind::Operator(OperatorKind::EqualEqual))
    }

    /// Constructors the dispatcher tries by arity, in declaration order.
    ///
    /// Copy and move constructors are left to the wrapper. A default
    /// constructor only needs a block when it takes (defaulted) parameters;
    /// the empty call has its own fast path.
    pub fn dispatch_constructors(&self) -> impl Iterator<Item = &MethodDecl> {
        self.methods.iter().filter(|m| {
            m.is_public()
                && match m.kind {
                    MethodKind::Constructor(ConstructorKind::Default) => !m.params.is_empty(),
                    MethodKind::Constructor(kind) => {
                        !matches!(kind, ConstructorKind::Copy | ConstructorKind::Move)
                    }
                    _ => false,
                }
        })
    }
}

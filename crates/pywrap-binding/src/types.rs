//! C++ type descriptors.
//!
//! A [`CppType`] is fully owned: discovery copies every fact out of libclang
//! before the cursor it came from goes away, so descriptors can outlive the
//! translation unit they were extracted from.

use crate::error::Result;
use crate::template::TemplateMap;

/// A C++ type as seen by the marshalling engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CppType {
    /// void
    Void,
    /// bool
    Bool,
    /// char, unsigned char
    Char { signed: bool },
    /// short, unsigned short
    Short { signed: bool },
    /// int, unsigned int
    Int { signed: bool },
    /// long, unsigned long
    Long { signed: bool },
    /// long long, unsigned long long
    LongLong { signed: bool },
    /// float
    Float,
    /// double
    Double,
    /// long double
    LongDouble,
    /// Pointer type: T*
    Pointer {
        pointee: Box<CppType>,
        is_const: bool,
    },
    /// Reference type: T& (lvalue) or T&& (rvalue)
    Reference {
        referent: Box<CppType>,
        is_const: bool,
        is_rvalue: bool,
    },
    /// Array type: T[N]
    Array {
        element: Box<CppType>,
        size: Option<usize>,
    },
    /// Record or typedef, by fully qualified spelling (e.g. "geo::Point", "std::string")
    Named(String),
    /// Enumeration, by fully qualified spelling
    Enum { name: String, scoped: bool },
    /// Class template instantiation: `name<args...>`
    Specialization { name: String, args: Vec<CppType> },
    /// Template type parameter (e.g. "T")
    TemplateParam { name: String, depth: u32, index: u32 },
}

/// Standard library types the marshalling engine converts structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdKind<'a> {
    String,
    Vector(&'a CppType),
    Map(&'a CppType, &'a CppType),
}

impl CppType {
    /// Create a signed int type.
    pub fn int() -> Self {
        CppType::Int { signed: true }
    }

    /// Create a record type from its qualified spelling.
    pub fn named(name: &str) -> Self {
        CppType::Named(name.to_string())
    }

    /// Create a template parameter type.
    pub fn template_param(name: &str, depth: u32, index: u32) -> Self {
        CppType::TemplateParam {
            name: name.to_string(),
            depth,
            index,
        }
    }

    /// Create a class template instantiation.
    pub fn specialization(name: &str, args: Vec<CppType>) -> Self {
        CppType::Specialization {
            name: name.to_string(),
            args,
        }
    }

    /// Create a pointer to this type.
    pub fn ptr(self) -> Self {
        CppType::Pointer {
            pointee: Box::new(self),
            is_const: false,
        }
    }

    /// Create a const pointer to this type.
    pub fn const_ptr(self) -> Self {
        CppType::Pointer {
            pointee: Box::new(self),
            is_const: true,
        }
    }

    /// Create a const lvalue reference to this type.
    pub fn const_ref(self) -> Self {
        CppType::Reference {
            referent: Box::new(self),
            is_const: true,
            is_rvalue: false,
        }
    }

    /// The C++ spelling of this type, suitable for emitting into generated source.
    pub fn spelling(&self) -> String {
        fn sign(signed: bool, base: &str) -> String {
            if signed {
                base.to_string()
            } else {
                format!("unsigned {}", base)
            }
        }

        match self {
            CppType::Void => "void".to_string(),
            CppType::Bool => "bool".to_string(),
            CppType::Char { signed } => sign(*signed, "char"),
            CppType::Short { signed } => sign(*signed, "short"),
            CppType::Int { signed } => sign(*signed, "int"),
            CppType::Long { signed } => sign(*signed, "long"),
            CppType::LongLong { signed } => sign(*signed, "long long"),
            CppType::Float => "float".to_string(),
            CppType::Double => "double".to_string(),
            CppType::LongDouble => "long double".to_string(),
            CppType::Pointer { pointee, is_const } => {
                let prefix = if *is_const { "const " } else { "" };
                format!("{}{}*", prefix, pointee.spelling())
            }
            CppType::Reference {
                referent,
                is_const,
                is_rvalue,
            } => {
                let prefix = if *is_const { "const " } else { "" };
                let suffix = if *is_rvalue { "&&" } else { "&" };
                format!("{}{}{}", prefix, referent.spelling(), suffix)
            }
            CppType::Array { element, size } => match size {
                Some(n) => format!("{}[{}]", element.spelling(), n),
                None => format!("{}[]", element.spelling()),
            },
            CppType::Named(name) => name.clone(),
            CppType::Enum { name, .. } => name.clone(),
            CppType::Specialization { name, args } => {
                let args: Vec<String> = args.iter().map(|a| a.spelling()).collect();
                format!("{}<{}>", name, args.join(", "))
            }
            CppType::TemplateParam { name, .. } => name.clone(),
        }
    }

    /// Check if this is a builtin (non-class, non-compound) type.
    pub fn is_builtin(&self) -> bool {
        matches!(
            self,
            CppType::Void
                | CppType::Bool
                | CppType::Char { .. }
                | CppType::Short { .. }
                | CppType::Int { .. }
                | CppType::Long { .. }
                | CppType::LongLong { .. }
                | CppType::Float
                | CppType::Double
                | CppType::LongDouble
        )
    }

    pub fn is_void(&self) -> bool {
        matches!(self, CppType::Void)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, CppType::Bool)
    }

    /// Integer in the C++ sense: bool, the character types, the integral
    /// builtins and unscoped enumerations.
    pub fn is_integer(&self) -> bool {
        match self {
            CppType::Bool
            | CppType::Char { .. }
            | CppType::Short { .. }
            | CppType::Int { .. }
            | CppType::Long { .. }
            | CppType::LongLong { .. } => true,
            CppType::Enum { scoped, .. } => !scoped,
            _ => false,
        }
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, CppType::Float | CppType::Double | CppType::LongDouble)
    }

    /// Only the real (non-complex) floating types; identical to
    /// [`CppType::is_floating`] since complex types are never extracted.
    pub fn is_real_floating(&self) -> bool {
        self.is_floating()
    }

    pub fn is_char(&self) -> bool {
        matches!(self, CppType::Char { .. })
    }

    /// Unsigned integers (bool included) and every enumeration.
    pub fn is_unsigned_or_enum(&self) -> bool {
        match self {
            CppType::Bool => true,
            CppType::Char { signed }
            | CppType::Short { signed }
            | CppType::Int { signed }
            | CppType::Long { signed }
            | CppType::LongLong { signed } => !signed,
            CppType::Enum { .. } => true,
            _ => false,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, CppType::Pointer { .. })
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, CppType::Reference { .. })
    }

    /// `char*` or `const char*`.
    pub fn is_char_pointer(&self) -> bool {
        matches!(self, CppType::Pointer { pointee, .. } if pointee.is_char())
    }

    /// Get the pointee of a pointer or the referent of a reference.
    pub fn pointee(&self) -> Option<&CppType> {
        match self {
            CppType::Pointer { pointee, .. } => Some(pointee),
            CppType::Reference { referent, .. } => Some(referent),
            _ => None,
        }
    }

    /// Strip references and pointers down to the value type.
    pub fn value_type(&self) -> &CppType {
        match self.pointee() {
            Some(inner) => inner.value_type(),
            None => self,
        }
    }

    /// Check if this type is or contains template parameters.
    pub fn is_dependent(&self) -> bool {
        match self {
            CppType::TemplateParam { .. } => true,
            CppType::Pointer { pointee, .. } => pointee.is_dependent(),
            CppType::Reference { referent, .. } => referent.is_dependent(),
            CppType::Array { element, .. } => element.is_dependent(),
            CppType::Specialization { args, .. } => args.iter().any(|a| a.is_dependent()),
            _ => false,
        }
    }

    /// Classify standard library strings, vectors and maps.
    pub fn std_kind(&self) -> Option<StdKind<'_>> {
        match self {
            CppType::Named(name) => match strip_inline_namespaces(name).as_str() {
                "std::string" | "std::basic_string<char>" => Some(StdKind::String),
                _ => None,
            },
            CppType::Specialization { name, args } => {
                match (strip_inline_namespaces(name).as_str(), args.as_slice()) {
                    ("std::basic_string", [CppType::Char { .. }, ..]) => Some(StdKind::String),
                    ("std::vector", [element, ..]) => Some(StdKind::Vector(element)),
                    ("std::map", [key, value, ..]) => Some(StdKind::Map(key, value)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Whether this names something from namespace `std`.
    pub fn is_std(&self) -> bool {
        match self {
            CppType::Named(name)
            | CppType::Enum { name, .. }
            | CppType::Specialization { name, .. } => name.starts_with("std::"),
            _ => false,
        }
    }

    /// Substitute template parameters with the concrete types bound in `map`.
    ///
    /// Fails if a template parameter is not bound.
    pub fn substitute(&self, map: &TemplateMap) -> Result<CppType> {
        Ok(match self {
            CppType::TemplateParam { name, .. } => map.resolve(name)?.clone(),
            CppType::Pointer { pointee, is_const } => CppType::Pointer {
                pointee: Box::new(pointee.substitute(map)?),
                is_const: *is_const,
            },
            CppType::Reference {
                referent,
                is_const,
                is_rvalue,
            } => CppType::Reference {
                referent: Box::new(referent.substitute(map)?),
                is_const: *is_const,
                is_rvalue: *is_rvalue,
            },
            CppType::Array { element, size } => CppType::Array {
                element: Box::new(element.substitute(map)?),
                size: *size,
            },
            CppType::Specialization { name, args } => CppType::Specialization {
                name: name.clone(),
                args: args
                    .iter()
                    .map(|a| a.substitute(map))
                    .collect::<Result<Vec<_>>>()?,
            },
            _ => self.clone(),
        })
    }
}

/// Strip inline namespace versioning used by libc++ (e.g., std::__1:: -> std::).
pub fn strip_inline_namespaces(name: &str) -> String {
    name.replace("::__1::", "::")
        .replace("::__2::", "::")
        .replace("::__ndk1::", "::")
}

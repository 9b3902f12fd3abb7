//! Error types for binding generation.
//!
//! Every variant except [`BindingError::Io`] is a declaration-shape error:
//! the generator cannot represent the construct and the whole pass aborts.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for binding generation.
pub type Result<T> = std::result::Result<T, BindingError>;

/// Errors that abort a generation pass.
#[derive(Debug, Error, Diagnostic)]
pub enum BindingError {
    /// A member refers to a template parameter the specialization does not bind.
    #[error("Template parameter not found: `{param}` in `{owner}`")]
    #[diagnostic(
        code(pywrap::template::unresolved),
        help("every template parameter used by a wrapped member must be bound by the instantiation")
    )]
    UnresolvedTemplateParameter { param: String, owner: String },

    /// `__class_getitem__` dispatch only knows how to match a single argument.
    #[error("Multiple template arguments not supported yet: `{template}` has {count}")]
    #[diagnostic(
        code(pywrap::template::arity),
        help("only class templates with exactly one type parameter can be subscripted")
    )]
    MultipleTemplateArguments { template: String, count: usize },

    /// An instantiation supplies fewer arguments than the template declares.
    #[error("Instantiation of `{template}` binds {given} argument(s), expected {expected}")]
    #[diagnostic(code(pywrap::template::missing_argument))]
    MissingTemplateArgument {
        template: String,
        expected: usize,
        given: usize,
    },

    /// The marshalling engine has no conversion for this type.
    #[error("Cannot marshal values of type `{ty}`")]
    #[diagnostic(code(pywrap::marshal::unsupported))]
    UnsupportedType { ty: String },

    /// Writing generated files failed.
    #[error("Failed to write bindings: {0}")]
    #[diagnostic(code(pywrap::io))]
    Io(#[from] std::io::Error),
}

//! Template parameter resolution and specialization naming.

use crate::error::{BindingError, Result};
use crate::types::CppType;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// Maps template parameter names to the concrete types of one instantiation.
#[derive(Debug, Clone, Default)]
pub struct TemplateMap {
    owner: SmolStr,
    bindings: FxHashMap<SmolStr, CppType>,
}

impl TemplateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `params` positionally to `args`.
    ///
    /// Extra arguments (defaulted ones clang reports) are ignored; missing
    /// arguments are an error.
    pub fn build(template: &str, params: &[String], args: &[CppType]) -> Result<Self> {
        if args.len() < params.len() {
            return Err(BindingError::MissingTemplateArgument {
                template: template.to_string(),
                expected: params.len(),
                given: args.len(),
            });
        }

        let mut map = Self {
            owner: SmolStr::new(template),
            bindings: FxHashMap::default(),
        };
        for (param, arg) in params.iter().zip(args) {
            map.insert(param, arg.clone());
        }
        Ok(map)
    }

    pub fn insert(&mut self, param: &str, ty: CppType) {
        self.bindings.insert(SmolStr::new(param), ty);
    }

    pub fn get(&self, param: &str) -> Option<&CppType> {
        self.bindings.get(param)
    }

    /// Look up a parameter, failing if this instantiation does not bind it.
    pub fn resolve(&self, param: &str) -> Result<&CppType> {
        self.get(param)
            .ok_or_else(|| BindingError::UnresolvedTemplateParameter {
                param: param.to_string(),
                owner: self.owner.to_string(),
            })
    }

    /// The template this map instantiates, empty outside templates.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// The canonical `<Arg1,Arg2,...>` suffix naming one instantiation.
pub fn canonical_suffix(args: &[CppType]) -> String {
    let args: Vec<String> = args.iter().map(|a| a.spelling()).collect();
    format!("<{}>", args.join(","))
}

/// Qualified identity of an instantiation, e.g. `geo::Box<int>`.
pub fn specialization_name(template: &str, args: &[CppType]) -> String {
    format!("{}{}", template, canonical_suffix(args))
}

//! Parsing with libclang.

use crate::cursor::cx_string_to_string;
use crate::discover::Collector;
use crate::location::IncludeResolver;
use clang_sys::*;
use miette::{miette, Result};
use pywrap_binding::Decl;
use std::ffi::CString;
use std::os::raw::c_char;
use std::path::Path;
use std::ptr;

/// Finds annotated declarations in C++ sources.
pub struct Discovery {
    index: CXIndex,
    resolver: IncludeResolver,
}

/// Owned translation unit, disposed on drop.
struct TranslationUnit(CXTranslationUnit);

impl Drop for TranslationUnit {
    fn drop(&mut self) {
        unsafe {
            clang_disposeTranslationUnit(self.0);
        }
    }
}

impl Discovery {
    /// Create a new discovery pass with its own clang index.
    pub fn new() -> Result<Self> {
        unsafe {
            let index = clang_createIndex(0, 0);
            if index.is_null() {
                return Err(miette!("Failed to create clang index"));
            }
            Ok(Self {
                index,
                resolver: IncludeResolver::default(),
            })
        }
    }

    /// Strip these directories from the include paths of discovered declarations.
    pub fn with_include_roots<I, S>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.resolver = IncludeResolver::new(roots);
        self
    }

    pub fn resolver(&self) -> &IncludeResolver {
        &self.resolver
    }

    /// Parse a C++ file and return its annotated declarations in traversal order.
    pub fn parse_file(&self, path: &Path, args: &[String]) -> Result<Vec<Decl>> {
        let path_str = path.to_string_lossy();
        let c_path =
            CString::new(path_str.as_ref()).map_err(|_| miette!("Invalid path: {}", path_str))?;

        let tu = self.parse(&c_path, args, &mut [])?;
        tracing::info!(file = %path_str, "parsed");
        Ok(self.collect(&tu))
    }

    /// Parse C++ source code from a string.
    pub fn parse_string(&self, source: &str, filename: &str, args: &[String]) -> Result<Vec<Decl>> {
        let c_filename =
            CString::new(filename).map_err(|_| miette!("Invalid file name: {}", filename))?;
        let c_source =
            CString::new(source).map_err(|_| miette!("Source of {} contains a NUL byte", filename))?;

        let mut unsaved = [CXUnsavedFile {
            Filename: c_filename.as_ptr(),
            Contents: c_source.as_ptr(),
            Length: source.len() as _,
        }];

        let tu = self.parse(&c_filename, args, &mut unsaved)?;
        Ok(self.collect(&tu))
    }

    fn parse(
        &self,
        filename: &CString,
        args: &[String],
        unsaved: &mut [CXUnsavedFile],
    ) -> Result<TranslationUnit> {
        let args = compiler_args(args)?;
        let c_args: Vec<*const c_char> = args.iter().map(|s| s.as_ptr()).collect();

        unsafe {
            let tu = clang_parseTranslationUnit(
                self.index,
                filename.as_ptr(),
                c_args.as_ptr(),
                c_args.len() as i32,
                if unsaved.is_empty() {
                    ptr::null_mut()
                } else {
                    unsaved.as_mut_ptr()
                },
                unsaved.len() as u32,
                CXTranslationUnit_None,
            );

            if tu.is_null() {
                return Err(miette!(
                    "Failed to parse file: {}",
                    filename.to_string_lossy()
                ));
            }
            let tu = TranslationUnit(tu);

            // Check for errors
            let num_diagnostics = clang_getNumDiagnostics(tu.0);
            for i in 0..num_diagnostics {
                let diag = clang_getDiagnostic(tu.0, i);
                let severity = clang_getDiagnosticSeverity(diag);

                if severity >= CXDiagnostic_Error {
                    let formatted =
                        clang_formatDiagnostic(diag, clang_defaultDiagnosticDisplayOptions());
                    let msg = cx_string_to_string(formatted);
                    clang_disposeDiagnostic(diag);
                    return Err(miette!("Clang error: {}", msg));
                }
                clang_disposeDiagnostic(diag);
            }

            Ok(tu)
        }
    }

    fn collect(&self, tu: &TranslationUnit) -> Vec<Decl> {
        let root = unsafe { clang_getTranslationUnitCursor(tu.0) };
        let decls = Collector::new(&self.resolver).collect(root);
        tracing::debug!(count = decls.len(), "annotated declarations");
        decls
    }
}

impl Drop for Discovery {
    fn drop(&mut self) {
        unsafe {
            clang_disposeIndex(self.index);
        }
    }
}

/// `-x c++`, a default standard unless one is given, then the caller's flags.
fn compiler_args(args: &[String]) -> Result<Vec<CString>> {
    let mut all = vec!["-x".to_string(), "c++".to_string()];
    if !args.iter().any(|a| a.starts_with("-std=")) {
        all.push("-std=c++17".to_string());
    }
    all.extend(args.iter().cloned());

    all.into_iter()
        .map(|a| CString::new(a.as_str()).map_err(|_| miette!("Invalid compiler argument: {}", a)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_standard() {
        let args = compiler_args(&["-Iinclude".to_string()]).unwrap();
        let args: Vec<_> = args.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(args, vec!["-x", "c++", "-std=c++17", "-Iinclude"]);
    }

    #[test]
    fn test_explicit_standard_kept() {
        let args = compiler_args(&["-std=c++20".to_string()]).unwrap();
        let args: Vec<_> = args.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(args, vec!["-x", "c++", "-std=c++20"]);
    }

    #[test]
    fn test_syntax_error_reported() {
        let discovery = Discovery::new().unwrap();
        let result = discovery.parse_string("struct {", "broken.cpp", &[]);
        assert!(result.is_err());
    }
}

//! Project configuration (`pywrap.toml`).

use crate::compile_commands::CompileCommands;
use crate::error::{BuildError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Language standard used when neither the file nor the command line names one.
pub const DEFAULT_STD: &str = "c++17";

/// Root project configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Headers or sources scanned for annotated declarations.
    #[serde(default)]
    pub sources: Vec<String>,

    /// Optional compilation database to borrow flags from.
    #[serde(default)]
    pub compile_commands: Option<PathBuf>,

    #[serde(default)]
    pub extension: ExtensionConfig,

    #[serde(default)]
    pub compiler: CompilerConfig,
}

/// The generated extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionConfig {
    /// Name of the global module and its init function.
    #[serde(default = "default_name")]
    pub name: String,

    /// Directory the generated tree is written below.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            output: default_output(),
        }
    }
}

fn default_name() -> String {
    "extension".to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from(".")
}

/// Flags handed to libclang.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// C++ standard (e.g., "c++17", "c++20").
    #[serde(default)]
    pub std: Option<String>,

    /// Include directories; also stripped from generated include paths.
    #[serde(default)]
    pub includes: Vec<String>,

    /// Preprocessor definitions.
    #[serde(default)]
    pub defines: Vec<String>,

    /// Additional compiler flags.
    #[serde(default)]
    pub cflags: Vec<String>,
}

/// Command-line values layered over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub name: Option<String>,
    pub output: Option<PathBuf>,
    pub std: Option<String>,
    pub includes: Vec<String>,
    pub defines: Vec<String>,
    /// Replace the configured sources when non-empty
    pub sources: Vec<String>,
}

impl ProjectConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_str(&content)?;
        tracing::debug!(path = %path.display(), sources = config.sources.len(), "loaded config");
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply command-line values on top of the file.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(name) = overrides.name {
            self.extension.name = name;
        }
        if let Some(output) = overrides.output {
            self.extension.output = output;
        }
        if let Some(std) = overrides.std {
            self.compiler.std = Some(std);
        }
        extend_unique(&mut self.compiler.includes, overrides.includes);
        extend_unique(&mut self.compiler.defines, overrides.defines);
        if !overrides.sources.is_empty() {
            self.sources = overrides.sources;
        }
    }

    /// Borrow includes, defines and the standard from each source's command.
    ///
    /// Values already configured take precedence over the database.
    pub fn merge_compile_commands(&mut self, commands: &CompileCommands) {
        for source in &self.sources {
            let Some(cmd) = commands.find_command(Path::new(source)) else {
                tracing::debug!(source = %source, "no compile command");
                continue;
            };
            let includes = cmd
                .includes()
                .into_iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            extend_unique(&mut self.compiler.includes, includes);
            extend_unique(&mut self.compiler.defines, cmd.defines());
            if self.compiler.std.is_none() {
                self.compiler.std = cmd.std();
            }
        }
    }

    /// Load and merge the configured compilation database, if any.
    pub fn load_compile_commands(&mut self) -> Result<()> {
        if let Some(path) = self.compile_commands.clone() {
            let commands = CompileCommands::from_file(&path)?;
            tracing::info!(path = %path.display(), entries = commands.commands().len(), "loaded compile commands");
            self.merge_compile_commands(&commands);
        }
        Ok(())
    }

    /// The effective language standard.
    pub fn std(&self) -> &str {
        self.compiler.std.as_deref().unwrap_or(DEFAULT_STD)
    }

    /// Arguments for libclang, after the implicit `-x c++`.
    pub fn clang_args(&self) -> Vec<String> {
        let mut args = vec![format!("-std={}", self.std())];
        args.extend(self.compiler.includes.iter().map(|i| format!("-I{}", i)));
        args.extend(self.compiler.defines.iter().map(|d| format!("-D{}", d)));
        args.extend(self.compiler.cflags.iter().cloned());
        args
    }

    /// Reject a configuration with nothing to scan.
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(BuildError::Validation("no sources to scan".to_string()));
        }
        if self.extension.name.is_empty() {
            return Err(BuildError::Validation("extension name is empty".to_string()));
        }
        for source in &self.sources {
            if !Path::new(source).exists() {
                return Err(BuildError::SourceNotFound(source.clone()));
            }
        }
        Ok(())
    }
}

fn extend_unique(target: &mut Vec<String>, values: Vec<String>) {
    for value in values {
        if !target.contains(&value) {
            target.push(value);
        }
    }
}

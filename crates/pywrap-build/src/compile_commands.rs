//! compile_commands.json ingestion.
//!
//! CMake and other build systems can emit a compilation database with the
//! exact command used for each source. pywrap borrows the include
//! directories, definitions and language standard from it so that headers
//! parse the same way they do in the real build.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// A single entry of compile_commands.json.
#[derive(Debug, Clone, Deserialize)]
pub struct CompileCommand {
    /// The working directory of the compilation.
    pub directory: PathBuf,

    /// The source file path, absolute or relative to `directory`.
    pub file: PathBuf,

    /// The full compilation command as one string.
    #[serde(default)]
    pub command: Option<String>,

    /// The compilation arguments (array form).
    #[serde(default)]
    pub arguments: Option<Vec<String>>,
}

impl CompileCommand {
    /// The compiler arguments, preferring the array form.
    pub fn args(&self) -> Vec<String> {
        match (&self.arguments, &self.command) {
            (Some(args), _) => args.clone(),
            (None, Some(cmd)) => split_command(cmd),
            (None, None) => Vec::new(),
        }
    }

    /// Include directories (`-I`, `-isystem`), resolved against `directory`.
    pub fn includes(&self) -> Vec<PathBuf> {
        let args = self.args();
        let mut includes = flag_values(&args, "-I");
        includes.extend(flag_values(&args, "-isystem"));
        includes
            .into_iter()
            .map(|dir| self.directory.join(dir))
            .collect()
    }

    /// Preprocessor definitions (`-D`).
    pub fn defines(&self) -> Vec<String> {
        flag_values(&self.args(), "-D")
    }

    /// The language standard, e.g. `c++20` for `-std=c++20`.
    pub fn std(&self) -> Option<String> {
        self.args()
            .iter()
            .rev()
            .find_map(|arg| arg.strip_prefix("-std=").map(str::to_string))
    }

    /// The source path with `directory` applied.
    pub fn source_path(&self) -> PathBuf {
        self.directory.join(&self.file)
    }
}

/// Values of a flag given either joined (`-Ifoo`) or separate (`-I foo`).
fn flag_values(args: &[String], flag: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == flag {
            if let Some(value) = iter.next() {
                values.push(value.clone());
            }
        } else if let Some(value) = arg.strip_prefix(flag) {
            values.push(value.to_string());
        }
    }
    values
}

/// Split a command line on whitespace, honouring double quotes.
fn split_command(command: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;

    for c in command.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    args.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if pending {
        args.push(current);
    }
    args
}

/// A loaded compilation database.
#[derive(Debug, Clone, Default)]
pub struct CompileCommands {
    commands: Vec<CompileCommand>,
}

impl CompileCommands {
    /// Load compile commands from a JSON file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse compile commands from a JSON string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> crate::Result<Self> {
        let commands: Vec<CompileCommand> = serde_json::from_str(json)?;
        Ok(Self { commands })
    }

    pub fn commands(&self) -> &[CompileCommand] {
        &self.commands
    }

    /// Find the command compiling `source`.
    pub fn find_command(&self, source: &Path) -> Option<&CompileCommand> {
        self.commands.iter().find(|cmd| {
            cmd.file == source || cmd.file.ends_with(source) || cmd.source_path() == source
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATABASE: &str = r#"[
        {
            "directory": "/work/build",
            "file": "/work/src/shapes.cpp",
            "command": "c++ -I../include -I /opt/geo/include -DNDEBUG -D \"NAME=a b\" -std=c++20 -c shapes.cpp"
        },
        {
            "directory": "/work/build",
            "file": "../src/paint.cpp",
            "arguments": ["c++", "-isystem", "/usr/local/include", "-DPAINT=1", "-c", "paint.cpp"]
        }
    ]"#;

    #[test]
    fn test_command_flags() {
        let cmds = CompileCommands::from_str(DATABASE).unwrap();
        assert_eq!(cmds.commands().len(), 2);

        let shapes = &cmds.commands()[0];
        assert_eq!(shapes.std().as_deref(), Some("c++20"));
        assert_eq!(
            shapes.includes(),
            vec![
                PathBuf::from("/work/build/../include"),
                PathBuf::from("/opt/geo/include")
            ]
        );
        assert_eq!(shapes.defines(), vec!["NDEBUG", "NAME=a b"]);
    }

    #[test]
    fn test_arguments_form() {
        let cmds = CompileCommands::from_str(DATABASE).unwrap();
        let paint = &cmds.commands()[1];

        assert_eq!(paint.includes(), vec![PathBuf::from("/usr/local/include")]);
        assert_eq!(paint.defines(), vec!["PAINT=1"]);
        assert!(paint.std().is_none());
    }

    #[test]
    fn test_find_command() {
        let cmds = CompileCommands::from_str(DATABASE).unwrap();

        assert!(cmds.find_command(Path::new("/work/src/shapes.cpp")).is_some());
        assert!(cmds.find_command(Path::new("src/shapes.cpp")).is_some());
        assert!(cmds.find_command(Path::new("/work/build/../src/paint.cpp")).is_some());
        assert!(cmds.find_command(Path::new("src/other.cpp")).is_none());
    }

    #[test]
    fn test_split_command_quotes() {
        assert_eq!(
            split_command(r#"c++  -D"X=1 2" "" -c"#),
            vec!["c++", "-DX=1 2", "", "-c"]
        );
    }
}

//! Compilation database lookup
//!
//! Finds the compiler invocation used to build each source file, from
//! `compile_commands.json`, `compile_flags.txt`, or a fixed flag list given
//! on the command line after `--`.

use crate::error::{ErrorContext, ShowCallError, ShowCallResult};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

const COMPILE_COMMANDS: &str = "compile_commands.json";
const COMPILE_FLAGS: &str = "compile_flags.txt";

/// How one source file is compiled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileCommand {
    /// Working directory of the compiler invocation
    pub directory: PathBuf,
    /// Main source file, absolute
    pub file: PathBuf,
    /// Full command line, compiler first
    pub arguments: Vec<String>,
}

/// Source of compile commands
pub trait CompilationDatabase {
    /// The command used to compile `file`, if the database knows it.
    fn compile_command(&self, file: &Path) -> Option<CompileCommand>;

    /// Where the database came from, for diagnostics
    fn origin(&self) -> String;
}

/// One entry of `compile_commands.json`
#[derive(Debug, Deserialize)]
struct RawEntry {
    directory: PathBuf,
    file: PathBuf,
    #[serde(default)]
    arguments: Option<Vec<String>>,
    #[serde(default)]
    command: Option<String>,
}

/// Database loaded from a `compile_commands.json` file
#[derive(Debug, Clone)]
pub struct JsonCompilationDatabase {
    path: PathBuf,
    commands: Vec<CompileCommand>,
}

impl JsonCompilationDatabase {
    pub fn load(path: &Path) -> ShowCallResult<Self> {
        let content = std::fs::read_to_string(path).read_context(path)?;
        Self::parse(&content, path)
    }

    pub fn parse(content: &str, path: &Path) -> ShowCallResult<Self> {
        let entries: Vec<RawEntry> =
            serde_json::from_str(content).map_err(|e| ShowCallError::Configuration {
                reason: format!("{} is not a valid compilation database: {e}", path.display()),
            })?;

        let commands = entries
            .into_iter()
            .filter_map(|entry| {
                let arguments = match (entry.arguments, entry.command) {
                    (Some(arguments), _) => arguments,
                    (None, Some(command)) => split_command_line(&command),
                    (None, None) => return None,
                };
                let file = normalize_path(&entry.directory.join(&entry.file));
                Some(CompileCommand {
                    directory: entry.directory,
                    file,
                    arguments,
                })
            })
            .collect::<Vec<_>>();

        debug!("loaded {} compile commands from {}", commands.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            commands,
        })
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl CompilationDatabase for JsonCompilationDatabase {
    fn compile_command(&self, file: &Path) -> Option<CompileCommand> {
        let wanted = absolute(file);
        if let Some(command) = self.commands.iter().find(|c| c.file == wanted) {
            return Some(command.clone());
        }
        if file.is_absolute() {
            return None;
        }

        // A relative input may name a file relative to the source tree
        // rather than the current directory.
        let suffix = normalize_path(file);
        let mut matches = self.commands.iter().filter(|c| c.file.ends_with(&suffix));
        match (matches.next(), matches.next()) {
            (Some(command), None) => Some(command.clone()),
            (Some(_), Some(_)) => {
                debug!("'{}' matches several compile commands", file.display());
                None
            }
            _ => None,
        }
    }

    fn origin(&self) -> String {
        self.path.display().to_string()
    }
}

/// The same flags for every file: `compile_flags.txt` or `-- <flags>`
#[derive(Debug, Clone)]
pub struct FixedCompilationDatabase {
    directory: PathBuf,
    flags: Vec<String>,
    origin: String,
}

impl FixedCompilationDatabase {
    pub fn new(directory: impl Into<PathBuf>, flags: Vec<String>) -> Self {
        Self {
            directory: directory.into(),
            flags,
            origin: "command line".to_string(),
        }
    }

    /// Read `compile_flags.txt`: one flag per line, relative to its directory.
    pub fn load(path: &Path) -> ShowCallResult<Self> {
        let content = std::fs::read_to_string(path).read_context(path)?;
        let flags = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self {
            directory,
            flags,
            origin: path.display().to_string(),
        })
    }
}

impl CompilationDatabase for FixedCompilationDatabase {
    fn compile_command(&self, file: &Path) -> Option<CompileCommand> {
        let file = absolute(file);
        let mut arguments = Vec::with_capacity(self.flags.len() + 2);
        arguments.push("clang-tool".to_string());
        arguments.extend(self.flags.iter().cloned());
        arguments.push(file.display().to_string());
        Some(CompileCommand {
            directory: self.directory.clone(),
            file,
            arguments,
        })
    }

    fn origin(&self) -> String {
        self.origin.clone()
    }
}

/// Look for a database directly inside `directory`.
pub fn auto_detect_from_directory(
    directory: &Path,
) -> ShowCallResult<Option<Box<dyn CompilationDatabase>>> {
    let commands = directory.join(COMPILE_COMMANDS);
    if commands.is_file() {
        return Ok(Some(Box::new(JsonCompilationDatabase::load(&commands)?)));
    }
    let flags = directory.join(COMPILE_FLAGS);
    if flags.is_file() {
        return Ok(Some(Box::new(FixedCompilationDatabase::load(&flags)?)));
    }
    Ok(None)
}

/// Look for a database in the directory of `source` and each of its parents.
pub fn auto_detect_from_source(
    source: &Path,
) -> ShowCallResult<Option<Box<dyn CompilationDatabase>>> {
    let source = absolute(source);
    for ancestor in source.ancestors().skip(1) {
        if let Some(database) = auto_detect_from_directory(ancestor)? {
            return Ok(Some(database));
        }
    }
    Ok(None)
}

/// Establish the compilation context of a run.
///
/// Fixed flags win; otherwise the build path is searched, or, when it is
/// empty, the parents of the first source. Finding nothing is fatal.
pub fn load_database(
    build_path: Option<&Path>,
    sources: &[PathBuf],
    fixed_flags: Option<Vec<String>>,
) -> ShowCallResult<Box<dyn CompilationDatabase>> {
    if let Some(flags) = fixed_flags {
        let directory = std::env::current_dir().read_context(Path::new("."))?;
        return Ok(Box::new(FixedCompilationDatabase::new(directory, flags)));
    }

    let detected = match build_path.filter(|p| !p.as_os_str().is_empty()) {
        Some(build_path) => auto_detect_from_directory(build_path)?,
        None => match sources.first() {
            Some(source) => auto_detect_from_source(source)?,
            None => None,
        },
    };

    detected.ok_or_else(|| ShowCallError::Configuration {
        reason: match build_path.filter(|p| !p.as_os_str().is_empty()) {
            Some(build_path) => format!(
                "no {COMPILE_COMMANDS} or {COMPILE_FLAGS} found in '{}'",
                build_path.display()
            ),
            None => format!("no {COMPILE_COMMANDS} or {COMPILE_FLAGS} found above the sources"),
        },
    })
}

/// Split a shell-like command string into arguments.
///
/// Handles single quotes, double quotes with backslash escapes, and
/// backslash escapes outside quotes.
pub fn split_command_line(command: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut chars = command.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_arg = true;
                for q in chars.by_ref() {
                    if q == '\'' {
                        break;
                    }
                    current.push(q);
                }
            }
            '"' => {
                in_arg = true;
                while let Some(q) = chars.next() {
                    match q {
                        '"' => break,
                        '\\' => match chars.next() {
                            Some(e @ ('"' | '\\' | '$' | '`')) => current.push(e),
                            Some(e) => {
                                current.push('\\');
                                current.push(e);
                            }
                            None => current.push('\\'),
                        },
                        _ => current.push(q),
                    }
                }
            }
            '\\' => {
                in_arg = true;
                if let Some(e) = chars.next() {
                    current.push(e);
                }
            }
            c if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            c => {
                in_arg = true;
                current.push(c);
            }
        }
    }
    if in_arg {
        args.push(current);
    }
    args
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        let cwd = std::env::current_dir().unwrap_or_default();
        normalize_path(&cwd.join(path))
    }
}

/// Remove `.` and resolve `..` without touching the file system.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

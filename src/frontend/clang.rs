//! Front end backed by the clang driver's JSON semantic tree dump.

use super::{FrontEnd, TranslationUnit};
use crate::compilation::CompileCommand;
use crate::config::FrontEndConfig;
use crate::error::{ShowCallError, ShowCallResult};
use std::process::{Command, Stdio};
use tracing::debug;

/// Runs `clang -fsyntax-only -Xclang -ast-dump=json` for each compile command
#[derive(Debug, Clone)]
pub struct ClangFrontEnd {
    program: String,
    extra_args: Vec<String>,
}

impl ClangFrontEnd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    pub fn from_config(config: &FrontEndConfig) -> Self {
        Self {
            program: config.clang.clone(),
            extra_args: config.extra_args.clone(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Compiler flags for a syntax-only semantic dump of `command`.
    ///
    /// The original compiler (first argument) is dropped and every flag that
    /// names or selects an output is removed.
    pub fn syntax_only_arguments(&self, command: &CompileCommand) -> Vec<String> {
        let mut args = Vec::with_capacity(command.arguments.len() + 4);
        let mut iter = command.arguments.iter().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-o" | "-MF" | "-MT" | "-MQ" => {
                    iter.next();
                }
                "-c" | "-S" | "-E" | "-M" | "-MM" | "-MD" | "-MMD" | "-MG" | "-MP"
                | "-fsyntax-only" | "-save-temps" => {}
                joined
                    if is_joined_output(joined)
                        || joined.starts_with("-MF")
                        || joined.starts_with("-MT")
                        || joined.starts_with("-MQ")
                        || joined.starts_with("-save-temps=") => {}
                _ => args.push(arg.clone()),
            }
        }
        args.extend(self.extra_args.iter().cloned());
        args.extend(
            ["-fsyntax-only", "-Xclang", "-ast-dump=json"]
                .into_iter()
                .map(String::from),
        );
        args
    }
}

/// Driver options spelled like a joined `-o<path>`
const O_PREFIXED_OPTIONS: [&str; 2] = ["-objc", "-object"];

fn is_joined_output(arg: &str) -> bool {
    arg.len() > 2
        && arg.starts_with("-o")
        && !O_PREFIXED_OPTIONS
            .iter()
            .any(|option| arg.starts_with(option))
}

impl Default for ClangFrontEnd {
    fn default() -> Self {
        Self::new("clang")
    }
}

impl FrontEnd for ClangFrontEnd {
    fn parse(&self, command: &CompileCommand) -> ShowCallResult<TranslationUnit> {
        let args = self.syntax_only_arguments(command);
        debug!(
            "running {} {} in {}",
            self.program,
            args.join(" "),
            command.directory.display()
        );

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(&command.directory)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| ShowCallError::FrontEndSpawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ShowCallError::Parse {
                path: command.file.clone(),
                reason: format!("{} exited with {}", self.program, output.status),
            });
        }

        let json = String::from_utf8_lossy(&output.stdout);
        TranslationUnit::from_json(&json, command.file.clone(), command.directory.clone())
    }
}

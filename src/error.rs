//! Error types for call-site resolution runs
//!
//! This module provides structured error types using thiserror. Errors that
//! end a run (or a translation unit) live in [`ShowCallError`]; the per call
//! site and per edit failures have their own enums because they never abort
//! the walk.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for a showcall run
#[derive(Error, Debug)]
pub enum ShowCallError {
    /// No compilation context could be established
    #[error("Invalid compilation context: {reason}")]
    Configuration { reason: String },

    /// The database exists but has no entry for a source file
    #[error("No compile command found for '{path}'")]
    MissingCompileCommand { path: PathBuf },

    /// File system errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The front end could not be started
    #[error("Failed to run '{program}': {source}")]
    FrontEndSpawn {
        program: String,
        source: std::io::Error,
    },

    /// The front end rejected the translation unit
    #[error("Failed to parse '{path}': {reason}")]
    Parse { path: PathBuf, reason: String },

    /// The semantic tree could not be decoded
    #[error("Failed to decode the semantic tree of '{path}': {source}")]
    AstDecode {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Settings could not be loaded
    #[error("Invalid settings: {0}")]
    Settings(#[from] Box<figment::Error>),

    /// Annotation edits could not be committed
    #[error(transparent)]
    Annotation(#[from] AnnotationError),
}

impl ShowCallError {
    /// Get a stable status code for this error type.
    pub fn status_code(&self) -> String {
        match self {
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::MissingCompileCommand { .. } => "MISSING_COMPILE_COMMAND",
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::FileWrite { .. } => "FILE_WRITE_ERROR",
            Self::FrontEndSpawn { .. } => "FRONT_END_SPAWN_ERROR",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::AstDecode { .. } => "AST_DECODE_ERROR",
            Self::Settings(_) => "SETTINGS_ERROR",
            Self::Annotation(_) => "ANNOTATION_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Configuration { .. } => vec![
                "Configure the build with -DCMAKE_EXPORT_COMPILE_COMMANDS=ON to get compile_commands.json",
                "Or pass the compiler flags directly after '--'",
            ],
            Self::MissingCompileCommand { .. } => vec![
                "Relative source paths must be a suffix of a path in the compilation database",
                "Check that the file is part of the build",
            ],
            Self::FrontEndSpawn { .. } => vec![
                "Install clang or point --clang at a clang++ binary",
                "The binary can also be set with SHOWCALL_FRONTEND__CLANG",
            ],
            Self::Parse { .. } => vec![
                "Fix the compiler errors reported above and run again",
            ],
            Self::AstDecode { .. } => vec![
                "Make sure the configured compiler is clang, other drivers do not support -ast-dump=json",
            ],
            Self::FileRead { .. } => vec![
                "Check that the file exists and you have read permissions",
            ],
            Self::FileWrite { .. } | Self::Annotation(_) => vec![
                "Check write permissions on the annotated files",
                "Files whose content changed during the run are left untouched",
            ],
            Self::Settings(_) => vec!["Check .showcall/settings.toml and SHOWCALL_* variables"],
        }
    }
}

/// A visited call site whose bound declaration is not a resolvable callable.
///
/// Never aborts the walk; the call site is skipped with a diagnostic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedCallError {
    #[error("call has no bound declaration (type-dependent or indirect callee)")]
    NoBoundDeclaration,

    #[error("callee '{name}' is a {kind}, not a callable declaration")]
    NotCallable { name: String, kind: String },

    #[error("callee declaration {id} is not part of the translation unit")]
    UnknownDeclaration { id: String },
}

/// Errors raised while computing or applying annotation edits
#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error("call at {file}:{line} has no usable end location")]
    NoAnchor { file: String, line: u32 },

    #[error("edit at byte {offset} is outside of '{path}'")]
    OffsetOutOfRange { path: PathBuf, offset: usize },

    #[error("'{path}' changed since it was parsed (byte {offset} is no longer '{expected}')")]
    AnchorMismatch {
        path: PathBuf,
        offset: usize,
        expected: char,
    },

    #[error("edits for '{path}' were dropped because one of them could not be computed")]
    FileRejected { path: PathBuf },

    #[error("Failed to write annotated file '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type alias for run level operations
pub type ShowCallResult<T> = Result<T, ShowCallError>;

/// Result type alias for callee resolution
pub type ResolveResult<T> = Result<T, UnresolvedCallError>;

/// Result type alias for annotation operations
pub type AnnotationResult<T> = Result<T, AnnotationError>;

/// Helper trait for attaching a path to I/O errors
pub trait ErrorContext<T> {
    /// Wrap a read failure
    fn read_context(self, path: &std::path::Path) -> ShowCallResult<T>;

    /// Wrap a write failure
    fn write_context(self, path: &std::path::Path) -> ShowCallResult<T>;
}

impl<T> ErrorContext<T> for Result<T, std::io::Error> {
    fn read_context(self, path: &std::path::Path) -> ShowCallResult<T> {
        self.map_err(|source| ShowCallError::FileRead {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_context(self, path: &std::path::Path) -> ShowCallResult<T> {
        self.map_err(|source| ShowCallError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

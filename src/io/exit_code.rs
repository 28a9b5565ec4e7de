//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success - every requested file was processed
//! - `1`: General error - unspecified failure
//! - `3-6`: Specific recoverable errors
//! - `126-255`: Reserved by shell

use crate::error::{AnnotationError, ShowCallError};

/// Standard exit codes for CLI operations.
///
/// These codes follow Unix conventions where 0 indicates success,
/// and non-zero values indicate various error conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// A source file has no compile command (code 3)
    NotFound = 3,

    /// The front end rejected a translation unit (code 4)
    ParseError = 4,

    /// File I/O error (code 5)
    IoError = 5,

    /// No compilation context, or invalid settings (code 6)
    ConfigError = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl ExitCode {
    /// Convert a `ShowCallError` to the appropriate exit code.
    ///
    /// Maps specific error types to semantic exit codes that scripts
    /// can use to determine appropriate recovery actions.
    pub fn from_error(error: &ShowCallError) -> Self {
        match error {
            ShowCallError::MissingCompileCommand { .. } => ExitCode::NotFound,

            ShowCallError::Parse { .. } | ShowCallError::AstDecode { .. } => ExitCode::ParseError,

            ShowCallError::FileRead { .. }
            | ShowCallError::FileWrite { .. }
            | ShowCallError::Annotation(AnnotationError::Write { .. }) => ExitCode::IoError,

            ShowCallError::Configuration { .. } | ShowCallError::Settings(_) => {
                ExitCode::ConfigError
            }

            // Everything else is a general error
            _ => ExitCode::GeneralError,
        }
    }

    /// The most severe of two codes, so a run reports its worst failure
    #[must_use]
    pub fn worst(self, other: ExitCode) -> ExitCode {
        if self.severity() >= other.severity() {
            self
        } else {
            other
        }
    }

    fn severity(&self) -> u8 {
        match self {
            ExitCode::Success => 0,
            ExitCode::NotFound => 1,
            ExitCode::ParseError => 2,
            ExitCode::GeneralError => 3,
            ExitCode::IoError => 4,
            ExitCode::ConfigError => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success as u8, 0);
        assert_eq!(ExitCode::GeneralError as u8, 1);
        assert_eq!(ExitCode::NotFound as u8, 3);
        assert_eq!(ExitCode::ParseError as u8, 4);
        assert_eq!(ExitCode::ConfigError as u8, 6);
    }

    #[test]
    fn test_from_error() {
        let err = ShowCallError::Configuration {
            reason: "no database".to_string(),
        };
        assert_eq!(ExitCode::from_error(&err), ExitCode::ConfigError);

        let err = ShowCallError::Parse {
            path: PathBuf::from("a.cpp"),
            reason: "exit status 1".to_string(),
        };
        assert_eq!(ExitCode::from_error(&err), ExitCode::ParseError);

        let err = ShowCallError::MissingCompileCommand {
            path: PathBuf::from("b.cpp"),
        };
        assert_eq!(ExitCode::from_error(&err), ExitCode::NotFound);
    }

    #[test]
    fn test_worst() {
        assert_eq!(ExitCode::Success.worst(ExitCode::ParseError), ExitCode::ParseError);
        assert_eq!(ExitCode::IoError.worst(ExitCode::NotFound), ExitCode::IoError);
    }
}

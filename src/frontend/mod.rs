//! Parse and semantic analysis front end.
//!
//! The core never parses C++ itself. A [`FrontEnd`] turns one compile
//! command into a [`TranslationUnit`]: the fully resolved semantic tree of
//! the main file and everything it includes.

pub mod ast;
pub mod clang;

pub use ast::{AstNode, DeclRef, QualType};
pub use clang::ClangFrontEnd;

use crate::compilation::CompileCommand;
use crate::error::{ShowCallError, ShowCallResult};
use crate::locator::normalize_locations;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Produces the semantic tree of a translation unit
pub trait FrontEnd {
    fn parse(&self, command: &CompileCommand) -> ShowCallResult<TranslationUnit>;
}

/// A parsed translation unit
#[derive(Debug)]
pub struct TranslationUnit {
    /// Main source file
    pub path: PathBuf,
    /// Directory the front end ran in; relative buffer names resolve here
    pub directory: PathBuf,
    pub root: AstNode,
}

impl TranslationUnit {
    /// Decode clang's `-ast-dump=json` output.
    pub fn from_json(
        json: &str,
        path: impl Into<PathBuf>,
        directory: impl Into<PathBuf>,
    ) -> ShowCallResult<Self> {
        let path = path.into();
        let decode_error = |source| ShowCallError::AstDecode {
            path: path.clone(),
            source,
        };

        let mut deserializer = serde_json::Deserializer::from_str(json);
        deserializer.disable_recursion_limit();
        let mut value = serde_json::Value::deserialize(&mut deserializer).map_err(decode_error)?;
        deserializer.end().map_err(decode_error)?;

        normalize_locations(&mut value);
        let root: AstNode = serde_json::from_value(value).map_err(decode_error)?;

        Ok(Self {
            path,
            directory: directory.into(),
            root,
        })
    }

    /// Load a recorded dump from disk.
    pub fn from_file(
        dump: &Path,
        path: impl Into<PathBuf>,
        directory: impl Into<PathBuf>,
    ) -> ShowCallResult<Self> {
        use crate::error::ErrorContext;
        let json = std::fs::read_to_string(dump).read_context(dump)?;
        Self::from_json(&json, path, directory)
    }
}

/// The main library module for showcall
pub mod annotate;
pub mod classify;
pub mod compilation;
pub mod config;
pub mod display;
pub mod driver;
pub mod error;
pub mod filter;
pub mod frontend;
pub mod io;
pub mod locator;
pub mod logging;
pub mod record;
pub mod report;
pub mod resolver;
pub mod rewrite;
pub mod walker;

// Explicit exports for better API clarity
pub use annotate::{EditSet, PendingEdit, Registration, annotate, annotation_comment};
pub use classify::{CallKind, classify};
pub use compilation::{
    CompilationDatabase, CompileCommand, FixedCompilationDatabase, JsonCompilationDatabase,
};
pub use config::Settings;
pub use driver::{RunOptions, RunSummary, ShowCallTool};
pub use error::{
    AnnotationError, AnnotationResult, ResolveResult, ShowCallError, ShowCallResult,
    UnresolvedCallError,
};
pub use filter::{CallMatcher, MatchCriteria, MatchFilter, NamePattern};
pub use frontend::{AstNode, ClangFrontEnd, FrontEnd, TranslationUnit};
pub use io::ExitCode;
pub use locator::{DeclPosition, SourcePosition};
pub use record::ResolutionRecord;
pub use report::{ReportEmitter, ReportOptions};
pub use resolver::{DeclIndex, ResolvedCallee};
pub use walker::{WalkOutcome, WalkStats, walk_translation_unit};

//! Run driver
//!
//! Processes the requested sources one translation unit at a time, merges
//! their edits, and commits the annotations once every unit succeeded.

use crate::annotate::EditSet;
use crate::compilation::CompilationDatabase;
use crate::error::ShowCallError;
use crate::filter::{MatchCriteria, MatchFilter};
use crate::frontend::FrontEnd;
use crate::io::ExitCode;
use crate::report::{ReportEmitter, ReportOptions};
use crate::rewrite::{CommitSummary, commit};
use crate::walker::{WalkStats, walk_translation_unit};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Everything a run needs besides the compilation database
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub sources: Vec<PathBuf>,
    pub criteria: MatchCriteria,
    pub report: ReportOptions,
    pub annotate: bool,
}

/// A source that could not be processed, or a file that could not be annotated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub code: ExitCode,
    pub message: String,
}

/// Outcome of a whole run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub files_processed: usize,
    pub stats: WalkStats,
    pub failures: Vec<FileFailure>,
    /// Present when annotations were committed
    pub commit: Option<CommitSummary>,
}

impl RunSummary {
    /// Success only when every file was processed (and annotated, if asked).
    pub fn exit_code(&self) -> ExitCode {
        self.failures
            .iter()
            .fold(ExitCode::Success, |code, failure| code.worst(failure.code))
    }

    fn fail(&mut self, path: PathBuf, error: &ShowCallError) {
        error!("{error}");
        self.failures.push(FileFailure {
            path,
            code: ExitCode::from_error(error),
            message: error.to_string(),
        });
    }
}

/// Runs the call-site report over a list of sources
pub struct ShowCallTool<F: FrontEnd> {
    front_end: F,
    options: RunOptions,
}

impl<F: FrontEnd> ShowCallTool<F> {
    pub fn new(front_end: F, options: RunOptions) -> Self {
        Self { front_end, options }
    }

    /// Process every source, writing report blocks to `out`.
    pub fn run<W: Write>(&self, database: &dyn CompilationDatabase, out: W) -> RunSummary {
        let filter = MatchFilter::new(self.options.criteria.clone());
        let mut emitter = ReportEmitter::new(out, self.options.report);
        let mut edits = EditSet::new();
        let mut summary = RunSummary::default();

        debug!("compile commands from {}", database.origin());

        for source in &self.options.sources {
            let Some(command) = database.compile_command(source) else {
                let err = ShowCallError::MissingCompileCommand {
                    path: source.clone(),
                };
                summary.fail(source.clone(), &err);
                continue;
            };

            info!("processing {}", command.file.display());
            let unit = match self.front_end.parse(&command) {
                Ok(unit) => unit,
                Err(e) => {
                    summary.fail(source.clone(), &e);
                    continue;
                }
            };

            match walk_translation_unit(&unit, &filter, &mut emitter, self.options.annotate) {
                Ok(outcome) => {
                    summary.files_processed += 1;
                    summary.stats.add(&outcome.stats);
                    edits.merge(outcome.edits);
                }
                Err(e) => summary.fail(source.clone(), &e),
            }
        }

        if let Err(e) = emitter.flush() {
            warn!("failed to flush report: {e}");
        }

        if self.options.annotate {
            if summary.failures.is_empty() {
                let committed = commit(&edits);
                for (path, message) in &committed.files_failed {
                    let code = if edits.is_rejected(path) {
                        ExitCode::GeneralError
                    } else {
                        ExitCode::IoError
                    };
                    summary.failures.push(FileFailure {
                        path: path.clone(),
                        code,
                        message: message.clone(),
                    });
                }
                summary.commit = Some(committed);
            } else {
                warn!(
                    "{} file(s) failed, no annotations were written",
                    summary.failures.len()
                );
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compilation::{CompileCommand, FixedCompilationDatabase};
    use crate::error::ShowCallResult;
    use crate::frontend::TranslationUnit;

    struct FailingFrontEnd;

    impl FrontEnd for FailingFrontEnd {
        fn parse(&self, command: &CompileCommand) -> ShowCallResult<TranslationUnit> {
            Err(ShowCallError::Parse {
                path: command.file.clone(),
                reason: "exit status 1".to_string(),
            })
        }
    }

    #[test]
    fn test_parse_failure_continues_and_sets_exit_code() {
        let options = RunOptions {
            sources: vec![PathBuf::from("/src/a.cpp"), PathBuf::from("/src/b.cpp")],
            annotate: true,
            ..Default::default()
        };
        let tool = ShowCallTool::new(FailingFrontEnd, options);
        let database = FixedCompilationDatabase::new("/src", Vec::new());

        let summary = tool.run(&database, Vec::new());
        assert_eq!(summary.failures.len(), 2);
        assert_eq!(summary.files_processed, 0);
        assert_eq!(summary.exit_code(), ExitCode::ParseError);
        assert!(summary.commit.is_none());
    }

    #[test]
    fn test_empty_run_succeeds() {
        let tool = ShowCallTool::new(FailingFrontEnd, RunOptions::default());
        let database = FixedCompilationDatabase::new("/src", Vec::new());
        let summary = tool.run(&database, Vec::new());
        assert_eq!(summary.exit_code(), ExitCode::Success);
    }
}

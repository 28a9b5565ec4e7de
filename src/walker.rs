//! Tree walk over one translation unit
//!
//! Visits every call expression once in document order and runs it through
//! filter, locator, resolver, report and, when enabled, annotation.

use crate::annotate::{EditSet, Registration, annotate};
use crate::classify::{CallKind, classify};
use crate::error::{ErrorContext, ShowCallResult, UnresolvedCallError};
use crate::filter::MatchFilter;
use crate::frontend::{AstNode, TranslationUnit};
use crate::locator::{SourceMap, file_extent, locate};
use crate::record::ResolutionRecord;
use crate::report::ReportEmitter;
use crate::resolver::{DeclIndex, is_callable, is_record};
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Counters of one walk
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkStats {
    /// Call expressions encountered, before any filtering
    pub call_sites: usize,
    pub reported: usize,
    /// Selected calls whose callee could not be resolved
    pub unresolved: usize,
    /// Edits newly registered
    pub annotated: usize,
}

impl WalkStats {
    pub fn add(&mut self, other: &WalkStats) {
        self.call_sites += other.call_sites;
        self.reported += other.reported;
        self.unresolved += other.unresolved;
        self.annotated += other.annotated;
    }
}

/// Result of walking one unit
#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub stats: WalkStats,
    pub edits: EditSet,
}

/// Implicit functions have synthesized bodies and the implicit closure
/// class of a lambda repeats the lambda body. Implicit variables such as
/// the `__begin1` of a range-based for hold real calls and are walked.
fn skips_subtree(node: &AstNode) -> bool {
    node.is_implicit && (is_callable(&node.kind) || is_record(&node.kind))
}

/// Pre-order walk over every call expression.
fn for_each_call<'a>(
    root: &'a AstNode,
    mut visit: impl FnMut(&'a AstNode, CallKind) -> ShowCallResult<()>,
) -> ShowCallResult<()> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if skips_subtree(node) {
            continue;
        }
        if let Some(kind) = classify(node) {
            visit(node, kind)?;
        }
        stack.extend(node.inner.iter().rev());
    }
    Ok(())
}

/// Walk a translation unit, emitting a report block per selected call.
pub fn walk_translation_unit<W: Write>(
    unit: &TranslationUnit,
    filter: &MatchFilter,
    emitter: &mut ReportEmitter<W>,
    annotation_enabled: bool,
) -> ShowCallResult<WalkOutcome> {
    let index = DeclIndex::build(&unit.root);
    debug!(
        "{}: {} callable declarations",
        unit.path.display(),
        index.callable_count()
    );

    let mut sources = SourceMap::new(&unit.directory);
    let mut outcome = WalkOutcome::default();

    for_each_call(&unit.root, |call, kind| {
        let stats = &mut outcome.stats;
        stats.call_sites += 1;

        let Some(position) = locate(call) else {
            debug!("skipping {} {} without a valid location", call.kind, call.id);
            return Ok(());
        };
        if !filter.should_visit(call, &index, position.line) {
            return Ok(());
        }

        let callee = match index.resolve(call) {
            Ok(callee) => callee,
            Err(e) => {
                stats.unresolved += 1;
                match e {
                    UnresolvedCallError::NoBoundDeclaration => debug!("{position}: {e}"),
                    _ => warn!("{position}: {e}"),
                }
                return Ok(());
            }
        };

        let extent = file_extent(call).and_then(|extent| sources.invocation_extent(extent));
        let source_text = extent
            .as_ref()
            .and_then(|extent| sources.source_text(extent))
            .unwrap_or_default();
        let anchor = extent.as_ref().and_then(|extent| sources.anchor(extent));

        let record = ResolutionRecord {
            kind,
            position,
            source_text,
            anchor,
            callee,
            call,
        };
        emitter.emit(&record).write_context(Path::new("<stdout>"))?;
        stats.reported += 1;

        if annotation_enabled {
            match annotate(&record) {
                Ok(edit) => {
                    if outcome.edits.register(edit) == Registration::Added {
                        stats.annotated += 1;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                    let path = sources.canonical_path(&record.position.file);
                    outcome.edits.reject_file(&path);
                }
            }
        }
        Ok(())
    })?;

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::MatchCriteria;
    use crate::report::ReportOptions;
    use serde_json::json;

    fn unit(value: serde_json::Value) -> TranslationUnit {
        TranslationUnit::from_json(&value.to_string(), "t.cpp", "/nonexistent").unwrap()
    }

    #[test]
    fn test_implicit_declarations_are_not_walked() {
        let unit = unit(json!({
            "id": "0x1", "kind": "TranslationUnitDecl",
            "inner": [
                {"id": "0x2", "kind": "FunctionDecl", "name": "f", "type": {"qualType": "void ()"},
                 "range": {"begin": {"offset": 0, "file": "t.cpp", "line": 1, "col": 1, "tokLen": 4},
                           "end": {"offset": 9, "col": 10, "tokLen": 1}}},
                {"id": "0x3", "kind": "CXXMethodDecl", "isImplicit": true, "name": "g", "inner": [
                    {"id": "0x4", "kind": "CallExpr", "inner": [
                        {"id": "0x5", "kind": "DeclRefExpr",
                         "referencedDecl": {"id": "0x2", "kind": "FunctionDecl", "name": "f"}}
                    ]}
                ]},
                {"id": "0x6", "kind": "CallExpr",
                 "range": {"begin": {"offset": 20, "line": 3, "col": 1, "tokLen": 1},
                           "end": {"offset": 22, "col": 3, "tokLen": 1}},
                 "inner": [{"id": "0x7", "kind": "DeclRefExpr",
                            "referencedDecl": {"id": "0x2", "kind": "FunctionDecl", "name": "f"}}]}
            ]
        }));

        let mut emitter = ReportEmitter::new(Vec::new(), ReportOptions::default());
        let outcome =
            walk_translation_unit(&unit, &MatchFilter::new(MatchCriteria::default()), &mut emitter, true)
                .unwrap();

        assert_eq!(outcome.stats.call_sites, 1);
        assert_eq!(outcome.stats.reported, 1);
        let report = String::from_utf8(emitter.into_inner()).unwrap();
        assert_eq!(
            report,
            "Call site [Function]:  @ t.cpp:3:1\nCallee: f void () @ t.cpp:1\n\n"
        );
        // the source file cannot be read, so no anchor and the file is rejected
        assert!(outcome.edits.is_empty());
        assert_eq!(outcome.edits.rejected_files().count(), 1);
    }
}

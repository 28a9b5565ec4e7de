//! Annotating sources with the resolved callee of each call.

use showcall::compilation::CompileCommand;
use showcall::rewrite::commit;
use showcall::{
    ExitCode, FixedCompilationDatabase, FrontEnd, MatchCriteria, MatchFilter, ReportEmitter,
    ReportOptions, RunOptions, ShowCallResult, ShowCallTool, TranslationUnit,
    walk_translation_unit,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Copy the fixture sources into a scratch directory that can be rewritten.
fn scratch_sources() -> TempDir {
    let dir = TempDir::new().unwrap();
    for name in ["overloads.cpp", "helpers.h"] {
        fs::copy(fixtures().join(name), dir.path().join(name)).unwrap();
    }
    dir
}

fn load_unit(directory: &Path) -> TranslationUnit {
    TranslationUnit::from_file(
        &fixtures().join("overloads.ast.json"),
        "overloads.cpp",
        directory,
    )
    .unwrap()
}

fn strip_annotations(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(" /* ") {
        out.push_str(&rest[..start]);
        let end = rest[start..].find(" */").unwrap() + start + 3;
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}

const ANNOTATED_HELPERS_LINE: &str = "inline int quad(int v) { return twice(twice(v) /* twice int (int) @ ./helpers.h:3 */) /* twice int (int) @ ./helpers.h:3 */; }";

const ANNOTATED_MAIN_LINES: [(usize, &str); 6] = [
    (30, "  c.f(1) /* Z::C::f void (int) @ overloads.cpp:16 */;"),
    (31, "  e = c /* Z::C::operator= C &(const C &) noexcept (defaulted) */;"),
    (34, "  d->f(2) /* N::C::f void (double) @ overloads.cpp:7 */;"),
    (38, "  N::g(3.14) /* N::g int (double) @ overloads.cpp:9 */;"),
    (39, "  int t = TWICE(N::g(1.0) /* N::g int (double) @ overloads.cpp:9 */);"),
    (41, "  int q = quad(t) /* quad int (int) @ ./helpers.h:5 */;"),
];

fn assert_annotated(dir: &Path) {
    let helpers = fs::read_to_string(dir.join("helpers.h")).unwrap();
    assert_eq!(helpers.lines().nth(4), Some(ANNOTATED_HELPERS_LINE));

    let main = fs::read_to_string(dir.join("overloads.cpp")).unwrap();
    let lines: Vec<&str> = main.lines().collect();
    for (line, expected) in ANNOTATED_MAIN_LINES {
        assert_eq!(lines[line - 1], expected, "line {line}");
    }
    // the call through a function pointer has no callee to name
    assert_eq!(lines[39], "  fp(2.0);");
}

#[test]
fn test_annotate_every_call() {
    let dir = scratch_sources();
    let unit = load_unit(dir.path());

    let mut emitter = ReportEmitter::new(Vec::new(), ReportOptions::default());
    let outcome = walk_translation_unit(
        &unit,
        &MatchFilter::new(MatchCriteria::default()),
        &mut emitter,
        true,
    )
    .unwrap();

    // both expansions of the TWICE argument land on the same byte
    assert_eq!(outcome.stats.reported, 9);
    assert_eq!(outcome.stats.annotated, 8);
    assert_eq!(outcome.edits.len(), 8);

    let summary = commit(&outcome.edits);
    assert!(summary.is_clean());
    assert_eq!(summary.edits_applied, 8);
    assert_eq!(summary.files_written.len(), 2);

    assert_annotated(dir.path());
}

#[test]
fn test_annotations_only_insert_comments() {
    let dir = scratch_sources();
    let unit = load_unit(dir.path());

    let mut emitter = ReportEmitter::new(Vec::new(), ReportOptions::default());
    let outcome = walk_translation_unit(
        &unit,
        &MatchFilter::new(MatchCriteria::default()),
        &mut emitter,
        true,
    )
    .unwrap();
    commit(&outcome.edits);

    for name in ["overloads.cpp", "helpers.h"] {
        let original = fs::read_to_string(fixtures().join(name)).unwrap();
        let annotated = fs::read_to_string(dir.path().join(name)).unwrap();
        assert_ne!(original, annotated);
        assert_eq!(strip_annotations(&annotated), original, "{name}");
    }
}

#[test]
fn test_filtered_annotation_touches_one_file() {
    let dir = scratch_sources();
    let unit = load_unit(dir.path());

    let mut emitter = ReportEmitter::new(Vec::new(), ReportOptions::default());
    let outcome = walk_translation_unit(
        &unit,
        &MatchFilter::new(MatchCriteria::new(31, "")),
        &mut emitter,
        true,
    )
    .unwrap();
    let summary = commit(&outcome.edits);

    assert_eq!(summary.edits_applied, 1);
    assert_eq!(summary.files_written.len(), 1);
    let helpers = fs::read_to_string(dir.path().join("helpers.h")).unwrap();
    assert_eq!(helpers, fs::read_to_string(fixtures().join("helpers.h")).unwrap());
}

#[test]
fn test_changed_source_is_left_untouched() {
    let dir = scratch_sources();
    let unit = load_unit(dir.path());

    let mut emitter = ReportEmitter::new(Vec::new(), ReportOptions::default());
    let outcome = walk_translation_unit(
        &unit,
        &MatchFilter::new(MatchCriteria::default()),
        &mut emitter,
        true,
    )
    .unwrap();

    // shift every offset of overloads.cpp after the walk
    let main = dir.path().join("overloads.cpp");
    let changed = format!("\n{}", fs::read_to_string(&main).unwrap());
    fs::write(&main, &changed).unwrap();

    let summary = commit(&outcome.edits);
    assert_eq!(summary.files_failed.len(), 1);
    assert!(summary.files_failed[0].0.ends_with("overloads.cpp"));
    assert_eq!(summary.edits_applied, 2);
    assert_eq!(fs::read_to_string(&main).unwrap(), changed);

    let helpers = fs::read_to_string(dir.path().join("helpers.h")).unwrap();
    assert_eq!(helpers.lines().nth(4), Some(ANNOTATED_HELPERS_LINE));
}

/// Front end replaying the recorded dump for every source
struct RecordedFrontEnd {
    directory: PathBuf,
}

impl FrontEnd for RecordedFrontEnd {
    fn parse(&self, command: &CompileCommand) -> ShowCallResult<TranslationUnit> {
        TranslationUnit::from_file(
            &fixtures().join("overloads.ast.json"),
            command.file.clone(),
            &self.directory,
        )
    }
}

#[test]
fn test_run_annotates_shared_header_once() {
    let dir = scratch_sources();
    let options = RunOptions {
        sources: vec![
            dir.path().join("overloads.cpp"),
            dir.path().join("overloads.cpp"),
        ],
        annotate: true,
        ..Default::default()
    };
    let tool = ShowCallTool::new(
        RecordedFrontEnd {
            directory: dir.path().to_path_buf(),
        },
        options,
    );
    let database = FixedCompilationDatabase::new(dir.path(), vec!["-std=c++17".to_string()]);

    let mut out = Vec::new();
    let summary = tool.run(&database, &mut out);

    assert_eq!(summary.exit_code(), ExitCode::Success);
    assert_eq!(summary.files_processed, 2);
    assert_eq!(summary.stats.reported, 18);
    let commit = summary.commit.unwrap();
    assert_eq!(commit.edits_applied, 8);

    let report = String::from_utf8(out).unwrap();
    assert_eq!(report.matches("Call site [").count(), 18);
    assert_annotated(dir.path());
}

#[test]
fn test_run_without_annotate_leaves_sources() {
    let dir = scratch_sources();
    let options = RunOptions {
        sources: vec![dir.path().join("overloads.cpp")],
        criteria: MatchCriteria::new(0, "g"),
        ..Default::default()
    };
    let tool = ShowCallTool::new(
        RecordedFrontEnd {
            directory: dir.path().to_path_buf(),
        },
        options,
    );
    let database = FixedCompilationDatabase::new(dir.path(), Vec::new());

    let summary = tool.run(&database, Vec::new());
    assert_eq!(summary.exit_code(), ExitCode::Success);
    assert_eq!(summary.stats.reported, 3);
    assert!(summary.commit.is_none());
    assert_eq!(
        fs::read_to_string(dir.path().join("overloads.cpp")).unwrap(),
        fs::read_to_string(fixtures().join("overloads.cpp")).unwrap()
    );
}

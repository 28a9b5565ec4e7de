//! Commit of annotation edits to disk
//!
//! Each file is rewritten in a single ascending pass over its edits and then
//! replaced atomically, so a failure never leaves a half-annotated file.

use crate::annotate::{EditSet, PendingEdit};
use crate::error::{AnnotationError, AnnotationResult};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// What a commit did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub files_written: Vec<PathBuf>,
    pub edits_applied: usize,
    /// Files left untouched, with the reason
    pub files_failed: Vec<(PathBuf, String)>,
}

impl CommitSummary {
    pub fn is_clean(&self) -> bool {
        self.files_failed.is_empty()
    }
}

/// Apply edits (ascending offsets) to a file's bytes.
///
/// Every anchor byte is checked against the content; any mismatch rejects
/// the whole file.
pub fn apply_edits(path: &Path, original: &[u8], edits: &[&PendingEdit]) -> AnnotationResult<Vec<u8>> {
    let extra: usize = edits.iter().map(|e| e.text.len()).sum();
    let mut out = Vec::with_capacity(original.len() + extra);
    let mut copied = 0;

    for edit in edits {
        let Some(&byte) = original.get(edit.offset) else {
            return Err(AnnotationError::OffsetOutOfRange {
                path: path.to_path_buf(),
                offset: edit.offset,
            });
        };
        if byte != edit.anchor || edit.offset < copied {
            return Err(AnnotationError::AnchorMismatch {
                path: path.to_path_buf(),
                offset: edit.offset,
                expected: char::from(edit.anchor),
            });
        }
        out.extend_from_slice(&original[copied..edit.offset]);
        out.extend_from_slice(&edit.replacement());
        copied = edit.offset + 1;
    }
    out.extend_from_slice(&original[copied..]);
    Ok(out)
}

/// Replace `path` with `content` through a temporary file beside it.
fn write_atomically(path: &Path, content: &[u8]) -> AnnotationResult<()> {
    let write_error = |source| AnnotationError::Write {
        path: path.to_path_buf(),
        source,
    };
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut temp = NamedTempFile::new_in(parent).map_err(write_error)?;
    temp.write_all(content).map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;
    if let Ok(metadata) = std::fs::metadata(path) {
        std::fs::set_permissions(temp.path(), metadata.permissions()).map_err(write_error)?;
    }
    temp.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}

fn commit_file(path: &Path, edits: &[&PendingEdit]) -> AnnotationResult<()> {
    let original = std::fs::read(path).map_err(|source| AnnotationError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    let annotated = apply_edits(path, &original, edits)?;
    write_atomically(path, &annotated)
}

/// Write every non-rejected file of the set.
///
/// Files are independent: one failing does not stop the others.
pub fn commit(edits: &EditSet) -> CommitSummary {
    let mut summary = CommitSummary::default();

    for path in edits.rejected_files() {
        let reason = AnnotationError::FileRejected {
            path: path.to_path_buf(),
        };
        warn!("{reason}");
        summary.files_failed.push((path.to_path_buf(), reason.to_string()));
    }

    for (path, file_edits) in edits.files() {
        match commit_file(path, &file_edits) {
            Ok(()) => {
                debug!("annotated '{}' with {} edits", path.display(), file_edits.len());
                summary.edits_applied += file_edits.len();
                summary.files_written.push(path.to_path_buf());
            }
            Err(e) => {
                warn!("{e}");
                summary.files_failed.push((path.to_path_buf(), e.to_string()));
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn edit(path: &Path, offset: usize, anchor: u8, text: &str) -> PendingEdit {
        PendingEdit {
            path: path.to_path_buf(),
            offset,
            anchor,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_apply_edits_in_one_pass() {
        let path = Path::new("a.cpp");
        let source = b"f(g(1));\n";
        let inner = edit(path, 5, b')', " /* g */");
        let outer = edit(path, 6, b')', " /* f */");

        let out = apply_edits(path, source, &[&inner, &outer]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "f(g(1) /* g */) /* f */;\n"
        );
    }

    #[test]
    fn test_anchor_mismatch_rejects_file() {
        let path = Path::new("a.cpp");
        let err = apply_edits(path, b"f(1);", &[&edit(path, 2, b')', " /* f */")]).unwrap_err();
        assert!(matches!(err, AnnotationError::AnchorMismatch { offset: 2, .. }));

        let err = apply_edits(path, b"f(1);", &[&edit(path, 40, b')', " /* f */")]).unwrap_err();
        assert!(matches!(err, AnnotationError::OffsetOutOfRange { offset: 40, .. }));
    }

    #[test]
    fn test_commit_writes_and_reports() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.cpp");
        let stale = dir.path().join("stale.cpp");
        std::fs::write(&good, "h(2);\n").unwrap();
        std::fs::write(&stale, "h(2);\n").unwrap();

        let mut edits = EditSet::new();
        edits.register(edit(&good, 3, b')', " /* h */"));
        edits.register(edit(&stale, 1, b')', " /* h */"));

        let summary = commit(&edits);
        assert_eq!(summary.files_written, vec![good.clone()]);
        assert_eq!(summary.edits_applied, 1);
        assert_eq!(summary.files_failed.len(), 1);
        assert_eq!(std::fs::read_to_string(&good).unwrap(), "h(2) /* h */;\n");
        assert_eq!(std::fs::read_to_string(&stale).unwrap(), "h(2);\n");
    }
}

//! Annotation writer
//!
//! Turns a resolution record into a [`PendingEdit`] placed right after the
//! call's last token and collects edits per file in an [`EditSet`]. Nothing
//! here touches the disk; see [`crate::rewrite`] for the commit.

use crate::error::{AnnotationError, AnnotationResult};
use crate::record::ResolutionRecord;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// An insertion after the byte at `offset` of `path`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub path: PathBuf,
    /// Position of the call's last byte
    pub offset: usize,
    /// The byte expected at `offset`, re-emitted ahead of `text`
    pub anchor: u8,
    pub text: String,
}

impl PendingEdit {
    /// Bytes that replace the anchor byte
    pub fn replacement(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.text.len() + 1);
        bytes.push(self.anchor);
        bytes.extend_from_slice(self.text.as_bytes());
        bytes
    }
}

/// ` /* <summary> */`, with any `*/` inside the summary broken up.
pub fn annotation_comment(summary: &str) -> String {
    format!(" /* {} */", summary.replace("*/", "* /"))
}

/// Compute the edit annotating one call site.
pub fn annotate(record: &ResolutionRecord<'_>) -> AnnotationResult<PendingEdit> {
    let anchor = record.anchor.as_ref().ok_or_else(|| AnnotationError::NoAnchor {
        file: record.position.file.clone(),
        line: record.position.line,
    })?;
    Ok(PendingEdit {
        path: anchor.path.clone(),
        offset: anchor.offset,
        anchor: anchor.byte,
        text: annotation_comment(&record.summary()),
    })
}

/// Outcome of [`EditSet::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    /// Same edit already present, e.g. a header seen by two units
    Duplicate,
    /// A different edit already owns the offset; the first one stays
    Conflict,
    /// The file already failed and takes no more edits
    Rejected,
}

/// Edits of a run, ordered by file and offset.
///
/// A file is rejected as a whole once any of its edits cannot be computed.
#[derive(Debug, Clone, Default)]
pub struct EditSet {
    files: BTreeMap<PathBuf, BTreeMap<usize, PendingEdit>>,
    rejected: BTreeSet<PathBuf>,
}

impl EditSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, edit: PendingEdit) -> Registration {
        if self.rejected.contains(&edit.path) {
            return Registration::Rejected;
        }
        let edits = self.files.entry(edit.path.clone()).or_default();
        match edits.get(&edit.offset) {
            None => {
                edits.insert(edit.offset, edit);
                Registration::Added
            }
            Some(existing) if *existing == edit => Registration::Duplicate,
            Some(existing) => {
                warn!(
                    "conflicting annotations at byte {} of '{}', keeping '{}'",
                    edit.offset,
                    edit.path.display(),
                    existing.text
                );
                Registration::Conflict
            }
        }
    }

    /// Drop every edit of `path` and refuse later ones.
    pub fn reject_file(&mut self, path: &Path) {
        if self.rejected.insert(path.to_path_buf()) {
            debug!("annotations for '{}' rejected", path.display());
        }
        self.files.remove(path);
    }

    pub fn merge(&mut self, other: EditSet) {
        for path in other.rejected {
            self.reject_file(&path);
        }
        for edit in other.files.into_values().flat_map(BTreeMap::into_values) {
            self.register(edit);
        }
    }

    /// Files with edits, each with its edits in ascending offset order
    pub fn files(&self) -> impl Iterator<Item = (&Path, Vec<&PendingEdit>)> {
        self.files
            .iter()
            .filter(|(_, edits)| !edits.is_empty())
            .map(|(path, edits)| (path.as_path(), edits.values().collect()))
    }

    pub fn rejected_files(&self) -> impl Iterator<Item = &Path> {
        self.rejected.iter().map(PathBuf::as_path)
    }

    pub fn is_rejected(&self, path: &Path) -> bool {
        self.rejected.contains(path)
    }

    /// Total number of edits
    pub fn len(&self) -> usize {
        self.files.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

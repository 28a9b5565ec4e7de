//! Source locations of semantic tree nodes
//!
//! Everything that knows how clang encodes positions lives here: the
//! incremental `file`/`line` elision of the JSON dump, spelling versus
//! expansion locations of macro tokens, and the buffer names of included
//! files. The rest of the crate only sees resolved [`SourcePosition`],
//! [`DeclPosition`], [`FileExtent`] and [`Anchor`] values.

use crate::frontend::AstNode;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A location exactly as the front end wrote it.
///
/// Either a bare location (`offset`, `file`, `line`, `col`, `tokLen`) or a
/// macro location carrying a spelling/expansion pair. An empty object is an
/// invalid location.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RawLocation {
    #[serde(default)]
    offset: Option<usize>,
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    line: Option<u32>,
    #[serde(default)]
    col: Option<u32>,
    #[serde(default)]
    tok_len: Option<usize>,
    #[serde(default)]
    spelling_loc: Option<Box<RawLocation>>,
    #[serde(default)]
    expansion_loc: Option<Box<RawLocation>>,
    #[serde(default)]
    is_macro_arg_expansion: bool,
}

/// Begin and end token locations of a node
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RawRange {
    #[serde(default)]
    begin: RawLocation,
    #[serde(default)]
    end: RawLocation,
}

impl RawLocation {
    /// Where the token appears in the file being compiled.
    fn expansion(&self) -> &RawLocation {
        self.expansion_loc.as_deref().unwrap_or(self)
    }

    /// Where the characters of the token are written.
    fn spelling(&self) -> &RawLocation {
        self.spelling_loc.as_deref().unwrap_or(self)
    }

    fn is_macro(&self) -> bool {
        self.expansion_loc.is_some()
    }

    fn is_macro_arg(&self) -> bool {
        self.expansion_loc
            .as_ref()
            .is_some_and(|expansion| expansion.is_macro_arg_expansion)
    }

    fn is_valid(&self) -> bool {
        self.offset.is_some() && self.file.is_some() && self.line.is_some()
    }
}

/// Call-site position: (filename, line, column)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Declaration position: (filename, line)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclPosition {
    pub file: String,
    pub line: u32,
}

impl fmt::Display for DeclPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Byte range `[begin, end)` of a node's tokens inside one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileExtent {
    pub file: String,
    pub begin: usize,
    pub end: usize,
    /// The last token comes from a macro body, so `end` only covers the
    /// macro name and [`SourceMap::invocation_extent`] must widen it.
    pub ends_in_macro: bool,
}

/// The last byte of a call expression, where annotations are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub path: PathBuf,
    pub offset: usize,
    pub byte: u8,
}

/// Start of `node` as (filename, line, column), resolved through macro
/// expansion. `None` for nodes without a valid location.
pub fn locate(node: &AstNode) -> Option<SourcePosition> {
    let loc = node.range.begin.expansion();
    if !loc.is_valid() {
        return None;
    }
    Some(SourcePosition {
        file: loc.file.clone()?,
        line: loc.line?,
        column: loc.col.unwrap_or(0),
    })
}

/// Start of `node` as (filename, line), for declaration sites.
pub fn locate_line(node: &AstNode) -> Option<DeclPosition> {
    let loc = node.range.begin.expansion();
    if !loc.is_valid() {
        return None;
    }
    Some(DeclPosition {
        file: loc.file.clone()?,
        line: loc.line?,
    })
}

/// Byte extent of `node`'s tokens, from the first byte of its first token
/// to the last byte of its last token. Both ends must land in one file.
///
/// When both ends are macro arguments their characters are read where the
/// argument is written. Otherwise macro tokens stand for the whole macro
/// invocation, which starts at the macro name.
pub fn file_extent(node: &AstNode) -> Option<FileExtent> {
    let (first, last) = (&node.range.begin, &node.range.end);
    let (begin, end) = if first.is_macro_arg() && last.is_macro_arg() {
        (first.spelling(), last.spelling())
    } else {
        (first.expansion(), last.expansion())
    };
    if !begin.is_valid() || !end.is_valid() || begin.file != end.file {
        return None;
    }
    let start = begin.offset?;
    let stop = end.offset? + end.tok_len.unwrap_or(1).max(1);
    if stop <= start {
        return None;
    }
    Some(FileExtent {
        file: begin.file.clone()?,
        begin: start,
        end: stop,
        ends_in_macro: last.is_macro() && !(first.is_macro_arg() && last.is_macro_arg()),
    })
}

/// End of a function-like macro invocation whose name ends at `from`: one
/// past its closing parenthesis. An object-like use ends at `from` itself.
fn invocation_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut pos = from;
    while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
        pos += 1;
    }
    if bytes.get(pos) != Some(&b'(') {
        return Some(from);
    }

    let mut depth = 0usize;
    while let Some(&byte) = bytes.get(pos) {
        match byte {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(pos + 1);
                }
            }
            b'"' | b'\'' => pos = skip_literal(bytes, pos)?,
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                pos += bytes[pos..].iter().position(|&b| b == b'\n')?;
            }
            b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                pos += 2 + bytes[pos + 2..].windows(2).position(|w| w == b"*/")? + 1;
            }
            _ => {}
        }
        pos += 1;
    }
    None
}

/// Position of the quote closing the literal opened at `open`.
fn skip_literal(bytes: &[u8], open: usize) -> Option<usize> {
    let quote = bytes[open];
    let mut pos = open + 1;
    loop {
        match *bytes.get(pos)? {
            b'\\' => pos += 2,
            b'\n' => return None,
            byte if byte == quote => return Some(pos),
            _ => pos += 1,
        }
    }
}

/// Render a node's range the way clang's text dumper does:
/// `<file:line:col, line:col>`, eliding what did not change.
pub fn describe_range(range: &RawRange) -> String {
    let begin = range.begin.expansion();
    let end = range.end.expansion();
    match (begin.is_valid(), end.is_valid()) {
        (false, _) => "<invalid sloc>".to_string(),
        (true, false) => format!("<{}>", describe_full(begin)),
        (true, true) if begin == end => format!("<{}>", describe_full(begin)),
        (true, true) => {
            let tail = if begin.file != end.file {
                describe_full(end)
            } else if begin.line != end.line {
                format!("line:{}:{}", end.line.unwrap_or(0), end.col.unwrap_or(0))
            } else {
                format!("col:{}", end.col.unwrap_or(0))
            };
            format!("<{}, {}>", describe_full(begin), tail)
        }
    }
}

fn describe_full(loc: &RawLocation) -> String {
    format!(
        "{}:{}:{}",
        loc.file.as_deref().unwrap_or("<unknown>"),
        loc.line.unwrap_or(0),
        loc.col.unwrap_or(0)
    )
}

/// Fill in the `file` and `line` keys clang leaves out when they repeat
/// the previously written location.
///
/// Must run on the raw JSON value before it is deserialized, walking keys
/// in the order they were written.
pub fn normalize_locations(root: &mut Value) {
    LocationReplay::default().visit(root);
}

#[derive(Default)]
struct LocationReplay {
    last_file: Option<String>,
    last_line: Option<u64>,
}

impl LocationReplay {
    fn visit(&mut self, value: &mut Value) {
        match value {
            Value::Object(map) => {
                if map.contains_key("offset") && map.contains_key("col") {
                    self.fill(map);
                    return;
                }
                for (_, child) in map.iter_mut() {
                    self.visit(child);
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.visit(item);
                }
            }
            _ => {}
        }
    }

    fn fill(&mut self, location: &mut Map<String, Value>) {
        match location.get("file").and_then(Value::as_str) {
            Some(file) => self.last_file = Some(file.to_string()),
            None => {
                if let Some(file) = &self.last_file {
                    location.insert("file".to_string(), Value::String(file.clone()));
                }
            }
        }
        match location.get("line").and_then(Value::as_u64) {
            Some(line) => self.last_line = Some(line),
            None => {
                if let Some(line) = self.last_line {
                    location.insert("line".to_string(), Value::from(line));
                }
            }
        }
    }
}

/// Source bytes of the files a translation unit was built from.
///
/// Buffer names are resolved against the directory the front end ran in.
/// Each file is read at most once.
#[derive(Debug)]
pub struct SourceMap {
    directory: PathBuf,
    files: HashMap<String, Option<Vec<u8>>>,
}

impl SourceMap {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            files: HashMap::new(),
        }
    }

    /// Path of a buffer name as seen from the current process.
    pub fn resolve_path(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.directory.join(path)
        }
    }

    /// Canonical path of a buffer, used to key edits so that one header
    /// reached under two spellings collects a single set of edits.
    pub fn canonical_path(&self, file: &str) -> PathBuf {
        let path = self.resolve_path(file);
        std::fs::canonicalize(&path).unwrap_or(path)
    }

    fn contents(&mut self, file: &str) -> Option<&[u8]> {
        let path = self.resolve_path(file);
        self.files
            .entry(file.to_string())
            .or_insert_with(|| match std::fs::read(&path) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    debug!("cannot read source '{}': {e}", path.display());
                    None
                }
            })
            .as_deref()
    }

    /// Widen an extent ending in a macro body to the end of the macro
    /// invocation. `None` when the invocation cannot be read or matched.
    pub fn invocation_extent(&mut self, extent: FileExtent) -> Option<FileExtent> {
        if !extent.ends_in_macro {
            return Some(extent);
        }
        let end = invocation_end(self.contents(&extent.file)?, extent.end)?;
        Some(FileExtent {
            end,
            ends_in_macro: false,
            ..extent
        })
    }

    /// Literal text of an extent, original spacing included.
    pub fn source_text(&mut self, extent: &FileExtent) -> Option<String> {
        let bytes = self.contents(&extent.file)?.get(extent.begin..extent.end)?;
        Some(String::from_utf8_lossy(bytes).into_owned())
    }

    /// The last byte of an extent together with the canonical path of its file.
    pub fn anchor(&mut self, extent: &FileExtent) -> Option<Anchor> {
        let offset = extent.end.checked_sub(1)?;
        let byte = *self.contents(&extent.file)?.get(offset)?;
        Some(Anchor {
            path: self.canonical_path(&extent.file),
            offset,
            byte,
        })
    }
}

//! Per call-site join of location, kind, source text and callee

use crate::classify::CallKind;
use crate::frontend::AstNode;
use crate::locator::{Anchor, SourcePosition};
use crate::resolver::ResolvedCallee;

/// Everything known about one surviving call site.
///
/// Built by the walk, handed to the report emitter and the annotation
/// writer, then dropped.
#[derive(Debug, Clone)]
pub struct ResolutionRecord<'a> {
    pub kind: CallKind,
    pub position: SourcePosition,
    /// Literal text of the call, empty when its extent spans files
    pub source_text: String,
    /// Last byte of the call; `None` when it cannot be located in a file
    pub anchor: Option<Anchor>,
    pub callee: ResolvedCallee<'a>,
    pub call: &'a AstNode,
}

impl ResolutionRecord<'_> {
    /// Callee line of the report, also the body of the annotation
    pub fn summary(&self) -> String {
        self.callee.summary()
    }
}

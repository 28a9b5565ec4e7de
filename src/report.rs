//! Report emitter
//!
//! Writes one block per call site:
//!
//! ```text
//! Call site [Member]: c.f(1) @ overloads.cpp:30:3
//! Callee: Z::C::f void (int) @ overloads.cpp:16
//!
//! ```
//!
//! optionally followed by indented dumps of the call and callee subtrees.

use crate::frontend::AstNode;
use crate::locator::describe_range;
use crate::record::ResolutionRecord;
use std::io::{self, Write};

/// Which subtree dumps accompany each block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    pub show_call_ast: bool,
    pub show_callee_ast: bool,
}

/// Writes report blocks to a sink (stdout in the binary)
pub struct ReportEmitter<W: Write> {
    writer: W,
    options: ReportOptions,
}

impl<W: Write> ReportEmitter<W> {
    pub fn new(writer: W, options: ReportOptions) -> Self {
        Self { writer, options }
    }

    pub fn emit(&mut self, record: &ResolutionRecord<'_>) -> io::Result<()> {
        writeln!(
            self.writer,
            "Call site [{}]: {} @ {}",
            record.kind, record.source_text, record.position
        )?;
        if self.options.show_call_ast {
            self.writer.write_all(dump_tree(record.call).as_bytes())?;
        }

        writeln!(self.writer, "Callee: {}", record.summary())?;
        if self.options.show_callee_ast {
            self.writer
                .write_all(dump_tree(record.callee.declaration).as_bytes())?;
        }

        writeln!(self.writer)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Render a subtree as an indented text tree, one node per line.
pub fn dump_tree(node: &AstNode) -> String {
    let mut out = String::new();
    out.push_str(&describe_node(node));
    out.push('\n');
    dump_children(node, "", &mut out);
    out
}

fn dump_children(node: &AstNode, prefix: &str, out: &mut String) {
    let count = node.inner.len();
    for (i, child) in node.inner.iter().enumerate() {
        let last = i + 1 == count;
        out.push_str(prefix);
        out.push_str(if last { "`-" } else { "|-" });
        out.push_str(&describe_node(child));
        out.push('\n');
        let child_prefix = format!("{prefix}{}", if last { "  " } else { "| " });
        dump_children(child, &child_prefix, out);
    }
}

fn describe_node(node: &AstNode) -> String {
    let mut line = node.kind.clone();
    if !node.id.is_empty() {
        line.push(' ');
        line.push_str(&node.id);
    }
    if node.kind != "TemplateArgument" {
        line.push(' ');
        line.push_str(&describe_range(&node.range));
    }
    if node.is_implicit {
        line.push_str(" implicit");
    }
    if let Some(name) = node.name() {
        line.push(' ');
        if node.kind == "MemberExpr" {
            line.push('.');
        }
        line.push_str(name);
    }
    let ty = node.type_name();
    if !ty.is_empty() {
        line.push_str(&format!(" '{ty}'"));
    }
    if let Some(cast) = &node.cast_kind {
        line.push_str(&format!(" <{cast}>"));
    }
    if let Some(opcode) = &node.opcode {
        line.push_str(&format!(" '{opcode}'"));
    }
    if let Some(value) = &node.value {
        match value {
            serde_json::Value::String(value) => line.push_str(&format!(" {value}")),
            other => line.push_str(&format!(" {other}")),
        }
    }
    if let Some(decl) = &node.referenced_decl {
        line.push_str(&format!(" {} {}", decl.kind.trim_end_matches("Decl"), decl.id));
        if let Some(name) = &decl.name {
            line.push_str(&format!(" '{name}'"));
        }
        if let Some(ty) = &decl.ty {
            line.push_str(&format!(" '{}'", ty.qual_type));
        }
    }
    if let Some(member) = &node.referenced_member_decl {
        line.push_str(&format!(" {member}"));
    }
    if let Some(defaulted) = &node.explicitly_defaulted {
        line.push_str(&format!(" {defaulted}"));
    }
    line
}

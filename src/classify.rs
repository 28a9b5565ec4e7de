//! Call kind classification

use crate::frontend::AstNode;
use std::fmt;

/// How a call site invokes its callee, decided by the node's tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// Free function, static member, or anything not covered below
    Function,
    /// `obj.f()` / `ptr->f()`, including explicit `a.operator=(b)`
    Member,
    /// Overloaded operator written with operator syntax, member or not
    Operator,
}

impl CallKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallKind::Function => "Function",
            CallKind::Member => "Member",
            CallKind::Operator => "Operator",
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const OPERATOR_CALL: &str = "CXXOperatorCallExpr";
const MEMBER_CALL: &str = "CXXMemberCallExpr";
const FUNCTION_CALLS: [&str; 3] = ["CallExpr", "CUDAKernelCallExpr", "UserDefinedLiteral"];

/// Whether `node` is one of the call expression forms
pub fn is_call_site(node: &AstNode) -> bool {
    classify(node).is_some()
}

/// Call kind of a call site, `None` for any other node.
///
/// An operator implemented as a member function is still `Operator`, so the
/// operator tag is checked first.
pub fn classify(node: &AstNode) -> Option<CallKind> {
    let kind = node.kind.as_str();
    if kind == OPERATOR_CALL {
        Some(CallKind::Operator)
    } else if kind == MEMBER_CALL {
        Some(CallKind::Member)
    } else if FUNCTION_CALLS.contains(&kind) {
        Some(CallKind::Function)
    } else {
        None
    }
}

//! Owned semantic tree decoded from clang's JSON dump.
//!
//! Only the attributes the resolver, locator and report dumps read are kept;
//! everything else in the dump is ignored during deserialization.

use crate::locator::{RawLocation, RawRange};
use serde::Deserialize;
use serde_json::Value;

/// One node of the semantic tree (declaration, statement, expression, type)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AstNode {
    /// Pointer identity of the node inside the front end, unique per unit
    #[serde(default)]
    pub id: String,

    /// Node tag, e.g. `CXXMemberCallExpr` or `FunctionDecl`
    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub loc: RawLocation,

    #[serde(default)]
    pub range: RawRange,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, rename = "type")]
    pub ty: Option<QualType>,

    #[serde(default)]
    pub is_implicit: bool,

    /// Inline namespaces do not contribute to qualified names
    #[serde(default)]
    pub is_inline: bool,

    /// `struct`, `class` or `union` for record declarations
    #[serde(default)]
    pub tag_used: Option<String>,

    /// `"default"` or `"delete"` for `= default` / `= delete` members
    #[serde(default)]
    pub explicitly_defaulted: Option<String>,

    /// Semantic context of an out-of-line declaration
    #[serde(default)]
    pub parent_decl_context_id: Option<String>,

    /// Declaration a `DeclRefExpr` is bound to
    #[serde(default)]
    pub referenced_decl: Option<DeclRef>,

    /// Member a `MemberExpr` is bound to
    #[serde(default)]
    pub referenced_member_decl: Option<String>,

    /// Literal value or template argument spelling
    #[serde(default)]
    pub value: Option<Value>,

    #[serde(default)]
    pub opcode: Option<String>,

    #[serde(default)]
    pub cast_kind: Option<String>,

    #[serde(default)]
    pub inner: Vec<AstNode>,
}

/// Printable type of a node as spelled by the front end
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QualType {
    pub qual_type: String,
}

/// Abbreviated declaration written inline where an expression refers to it
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct DeclRef {
    pub id: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub ty: Option<QualType>,
}

impl AstNode {
    /// The printable type, empty when the node has none
    pub fn type_name(&self) -> &str {
        self.ty.as_ref().map(|t| t.qual_type.as_str()).unwrap_or("")
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }

    pub fn is_decl(&self) -> bool {
        self.kind.ends_with("Decl")
    }

    /// The first child, which for call expressions is the callee expression
    pub fn first_child(&self) -> Option<&AstNode> {
        self.inner.first()
    }

    /// Visit this node and all descendants in pre-order
    pub fn for_each<'a>(&'a self, visit: &mut impl FnMut(&'a AstNode)) {
        visit(self);
        for child in &self.inner {
            child.for_each(visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_member_and_decl_references() {
        let node: AstNode = serde_json::from_value(json!({
            "id": "0x1",
            "kind": "CXXMemberCallExpr",
            "type": {"qualType": "void"},
            "inner": [{
                "id": "0x2",
                "kind": "MemberExpr",
                "name": "f",
                "isArrow": false,
                "referencedMemberDecl": "0x10",
                "inner": [{
                    "id": "0x3",
                    "kind": "DeclRefExpr",
                    "referencedDecl": {"id": "0x20", "kind": "VarDecl", "name": "c", "type": {"qualType": "C"}}
                }]
            }]
        }))
        .unwrap();

        assert_eq!(node.type_name(), "void");
        let member = node.first_child().unwrap();
        assert_eq!(member.referenced_member_decl.as_deref(), Some("0x10"));
        let object = member.first_child().unwrap();
        let decl = object.referenced_decl.as_ref().unwrap();
        assert_eq!(decl.kind, "VarDecl");
        assert_eq!(decl.name.as_deref(), Some("c"));
    }

    #[test]
    fn test_pre_order_visit() {
        let node: AstNode = serde_json::from_value(json!({
            "kind": "A",
            "inner": [{"kind": "B", "inner": [{"kind": "C"}]}, {"kind": "D"}]
        }))
        .unwrap();
        let mut kinds = Vec::new();
        node.for_each(&mut |n| kinds.push(n.kind.clone()));
        assert_eq!(kinds, ["A", "B", "C", "D"]);
    }
}

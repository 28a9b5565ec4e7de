//! Callee resolution
//!
//! Recovers the callable the front end bound a call site to. The call's
//! callee expression only carries the id of the selected declaration, so a
//! [`DeclIndex`] built once per translation unit maps ids back to
//! declaration nodes and knows the scope each declaration lives in.

use crate::error::{ResolveResult, UnresolvedCallError};
use crate::frontend::AstNode;
use crate::locator::{DeclPosition, locate, locate_line};
use std::collections::HashMap;

/// Declaration kinds a call can be bound to
pub const CALLABLE_KINDS: [&str; 6] = [
    "FunctionDecl",
    "CXXMethodDecl",
    "CXXConstructorDecl",
    "CXXDestructorDecl",
    "CXXConversionDecl",
    "CXXDeductionGuideDecl",
];

/// Members the compiler synthesizes when they are used but not declared
const SPECIAL_MEMBER_KINDS: [&str; 3] = ["CXXMethodDecl", "CXXConstructorDecl", "CXXDestructorDecl"];

const RECORD_KINDS: [&str; 4] = [
    "CXXRecordDecl",
    "RecordDecl",
    "ClassTemplateSpecializationDecl",
    "ClassTemplatePartialSpecializationDecl",
];

/// Wrappers between a call and the expression naming its callee
const TRANSPARENT_KINDS: [&str; 3] = ["ImplicitCastExpr", "ParenExpr", "SubstNonTypeTemplateParmExpr"];

pub(crate) fn is_callable(kind: &str) -> bool {
    CALLABLE_KINDS.contains(&kind)
}

pub(crate) fn is_record(kind: &str) -> bool {
    RECORD_KINDS.contains(&kind)
}

/// Declarations of one translation unit, by id
#[derive(Debug, Default)]
pub struct DeclIndex<'a> {
    callables: HashMap<&'a str, &'a AstNode>,
    kinds: HashMap<&'a str, &'a str>,
    /// Qualified name of every namespace and record, by id
    contexts: HashMap<&'a str, String>,
    /// Qualified name of the lexical scope enclosing each callable
    scopes: HashMap<&'a str, String>,
}

impl<'a> DeclIndex<'a> {
    pub fn build(root: &'a AstNode) -> Self {
        let mut index = Self::default();
        let mut scope = Vec::new();
        index.visit(root, None, &mut scope);
        index
    }

    /// `scope` holds the qualified name of every enclosing context, innermost last.
    fn visit(&mut self, node: &'a AstNode, parent: Option<&'a AstNode>, scope: &mut Vec<String>) {
        if node.is_decl() && !node.id.is_empty() {
            self.kinds.entry(node.id.as_str()).or_insert(node.kind.as_str());
        }

        let current = scope.last().cloned().unwrap_or_default();
        if is_callable(&node.kind) && !node.id.is_empty() {
            self.insert_callable(node, current.clone());
        }

        let qualified = match scope_segment(node, parent) {
            ScopeSegment::Opaque => return,
            ScopeSegment::Transparent => None,
            ScopeSegment::Named(segment) => Some(join_scope(&current, &segment)),
            ScopeSegment::Function(segment) => {
                // local entities of an out-of-line definition live in its class
                let semantic = node
                    .parent_decl_context_id
                    .as_deref()
                    .and_then(|parent| self.contexts.get(parent))
                    .unwrap_or(&current);
                Some(join_scope(semantic, &segment))
            }
        };

        let pushed = qualified.is_some();
        if let Some(qualified) = qualified {
            if !node.id.is_empty() {
                self.contexts
                    .entry(node.id.as_str())
                    .or_insert_with(|| qualified.clone());
            }
            scope.push(qualified);
        } else if node.kind == "NamespaceDecl" && !node.id.is_empty() {
            // inline namespace: same name as its parent
            self.contexts.entry(node.id.as_str()).or_insert(current);
        }

        for child in &node.inner {
            self.visit(child, Some(node), scope);
        }

        if pushed {
            scope.pop();
        }
    }

    fn insert_callable(&mut self, node: &'a AstNode, scope: String) {
        let id = node.id.as_str();
        let replace = match self.callables.get(id) {
            None => true,
            Some(existing) => locate(existing).is_none() && locate(node).is_some(),
        };
        if replace {
            self.callables.insert(id, node);
            self.scopes.insert(id, scope);
        }
    }

    /// Callable declaration with this id
    pub fn callable(&self, id: &str) -> Option<&'a AstNode> {
        self.callables.get(id).copied()
    }

    /// Kind of any declaration in the unit
    pub fn kind_of(&self, id: &str) -> Option<&'a str> {
        self.kinds.get(id).copied()
    }

    pub fn callable_count(&self) -> usize {
        self.callables.len()
    }

    /// Fully qualified name, e.g. `Z::C::f`.
    ///
    /// Out-of-line definitions are named after their semantic context.
    pub fn qualified_name(&self, decl: &AstNode) -> String {
        let name = decl.name().unwrap_or("");
        let semantic = decl
            .parent_decl_context_id
            .as_deref()
            .and_then(|parent| self.contexts.get(parent));
        let scope = semantic.or_else(|| self.scopes.get(decl.id.as_str()));
        match scope {
            Some(scope) if !scope.is_empty() => format!("{scope}::{name}"),
            _ => name.to_string(),
        }
    }

    /// The declaration a call expression is bound to.
    pub fn bound_declaration(&self, call: &AstNode) -> ResolveResult<&'a AstNode> {
        let callee = call
            .first_child()
            .map(strip_transparent)
            .ok_or(UnresolvedCallError::NoBoundDeclaration)?;

        match callee.kind.as_str() {
            "DeclRefExpr" => {
                let decl = callee
                    .referenced_decl
                    .as_ref()
                    .ok_or(UnresolvedCallError::NoBoundDeclaration)?;
                if !is_callable(&decl.kind) {
                    return Err(UnresolvedCallError::NotCallable {
                        name: decl.name.clone().unwrap_or_default(),
                        kind: decl.kind.clone(),
                    });
                }
                self.callable(&decl.id)
                    .ok_or_else(|| UnresolvedCallError::UnknownDeclaration {
                        id: decl.id.clone(),
                    })
            }
            "MemberExpr" => {
                let id = callee
                    .referenced_member_decl
                    .as_deref()
                    .ok_or(UnresolvedCallError::NoBoundDeclaration)?;
                if let Some(decl) = self.callable(id) {
                    return Ok(decl);
                }
                match self.kind_of(id) {
                    Some(kind) => Err(UnresolvedCallError::NotCallable {
                        name: callee.name().unwrap_or("").to_string(),
                        kind: kind.to_string(),
                    }),
                    None => Err(UnresolvedCallError::UnknownDeclaration { id: id.to_string() }),
                }
            }
            _ => Err(UnresolvedCallError::NoBoundDeclaration),
        }
    }

    /// Resolve a call site to its callee.
    pub fn resolve(&self, call: &AstNode) -> ResolveResult<ResolvedCallee<'a>> {
        let declaration = self.bound_declaration(call)?;
        let defaulted = is_defaulted(declaration);
        let declared_at = if defaulted {
            None
        } else {
            locate_line(declaration)
        };
        Ok(ResolvedCallee {
            qualified_name: self.qualified_name(declaration),
            signature: declaration.type_name().to_string(),
            declared_at,
            defaulted,
            declaration,
        })
    }
}

/// The callable a call site was resolved to
#[derive(Debug, Clone)]
pub struct ResolvedCallee<'a> {
    pub qualified_name: String,
    /// Function type as the front end prints it, e.g. `void (int)`
    pub signature: String,
    /// Absent for compiler-synthesized callees
    pub declared_at: Option<DeclPosition>,
    pub defaulted: bool,
    pub declaration: &'a AstNode,
}

impl ResolvedCallee<'_> {
    /// `<qualified> <signature> @ <file>:<line>`, or `(defaulted)` in place
    /// of the location when there is none.
    pub fn summary(&self) -> String {
        match &self.declared_at {
            Some(position) if !self.defaulted => {
                format!("{} {} @ {position}", self.qualified_name, self.signature)
            }
            _ => format!("{} {} (defaulted)", self.qualified_name, self.signature),
        }
    }

    /// Unqualified name of the callee
    pub fn simple_name(&self) -> &str {
        self.declaration.name().unwrap_or("")
    }
}

/// `= default` members and members the compiler generated implicitly
pub fn is_defaulted(decl: &AstNode) -> bool {
    decl.explicitly_defaulted.as_deref() == Some("default")
        || (decl.is_implicit && SPECIAL_MEMBER_KINDS.contains(&decl.kind.as_str()))
}

fn strip_transparent(mut node: &AstNode) -> &AstNode {
    while TRANSPARENT_KINDS.contains(&node.kind.as_str()) {
        match node.first_child() {
            Some(child) => node = child,
            None => break,
        }
    }
    node
}

fn join_scope(scope: &str, segment: &str) -> String {
    if scope.is_empty() {
        segment.to_string()
    } else {
        format!("{scope}::{segment}")
    }
}

enum ScopeSegment {
    /// Contributes a name component
    Named(String),
    /// A function as the context of its local entities: `f(int, char **)`
    Function(String),
    /// Children share the parent's scope
    Transparent,
    /// Nothing inside is visited
    Opaque,
}

fn scope_segment(node: &AstNode, parent: Option<&AstNode>) -> ScopeSegment {
    let kind = node.kind.as_str();
    if kind == "NamespaceDecl" {
        if node.is_inline {
            return ScopeSegment::Transparent;
        }
        return ScopeSegment::Named(
            node.name()
                .unwrap_or("(anonymous namespace)")
                .to_string(),
        );
    }

    if is_callable(kind) {
        return ScopeSegment::Function(function_context(node));
    }

    if !is_record(kind) {
        return ScopeSegment::Transparent;
    }

    if parent.is_some_and(|p| p.kind == "LambdaExpr") {
        return ScopeSegment::Named(match locate(node) {
            Some(position) => format!("(lambda at {position})"),
            None => "(lambda)".to_string(),
        });
    }
    // the injected class name repeats the enclosing record
    if node.is_implicit && node.name().is_some() {
        return ScopeSegment::Opaque;
    }

    match node.name() {
        Some(name) if kind.starts_with("ClassTemplate") => {
            ScopeSegment::Named(format!("{name}<{}>", template_arguments(node).join(", ")))
        }
        Some(name) => ScopeSegment::Named(name.to_string()),
        None => ScopeSegment::Named(format!(
            "(anonymous {})",
            node.tag_used.as_deref().unwrap_or("struct")
        )),
    }
}

/// Name and parameter types, the way clang prints a function context.
fn function_context(function: &AstNode) -> String {
    let mut params: Vec<&str> = function
        .inner
        .iter()
        .filter(|child| child.kind == "ParmVarDecl")
        .map(|param| param.type_name())
        .collect();
    if function
        .ty
        .as_ref()
        .is_some_and(|ty| ty.qual_type.contains("...)"))
    {
        params.push("...");
    }
    format!("{}({})", function.name().unwrap_or(""), params.join(", "))
}

fn template_arguments(specialization: &AstNode) -> Vec<String> {
    specialization
        .inner
        .iter()
        .filter(|child| child.kind == "TemplateArgument")
        .map(|argument| {
            if let Some(ty) = &argument.ty {
                return ty.qual_type.clone();
            }
            match &argument.value {
                Some(serde_json::Value::String(value)) => value.clone(),
                Some(value) => value.to_string(),
                None => "...".to_string(),
            }
        })
        .collect()
}

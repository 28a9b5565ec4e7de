//! Call-site selection by source line and callee name

use crate::frontend::AstNode;
use crate::resolver::DeclIndex;

/// What the user asked to see, fixed for the whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchCriteria {
    /// Only calls starting on this line; 0 disables the check
    pub call_at_line: u32,
    /// Only calls bound to a callee with this name
    pub callee_name: Option<String>,
}

impl MatchCriteria {
    pub fn new(call_at_line: u32, callee_name: impl Into<String>) -> Self {
        let callee_name = callee_name.into();
        Self {
            call_at_line,
            callee_name: (!callee_name.is_empty()).then_some(callee_name),
        }
    }
}

/// A declaration name pattern.
///
/// `f` matches any declaration named `f`; `C::f` matches qualified names
/// ending in `::C::f` (or equal to it); `::N::f` matches only `N::f`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePattern {
    Simple(String),
    QualifiedSuffix(String),
    FullyQualified(String),
}

impl NamePattern {
    pub fn parse(pattern: &str) -> Self {
        if let Some(full) = pattern.strip_prefix("::") {
            NamePattern::FullyQualified(full.to_string())
        } else if pattern.contains("::") {
            NamePattern::QualifiedSuffix(pattern.to_string())
        } else {
            NamePattern::Simple(pattern.to_string())
        }
    }

    pub fn matches(&self, qualified_name: &str, simple_name: &str) -> bool {
        match self {
            NamePattern::Simple(name) => name == simple_name,
            NamePattern::FullyQualified(name) => name == qualified_name,
            NamePattern::QualifiedSuffix(suffix) => {
                qualified_name == suffix
                    || qualified_name
                        .strip_suffix(suffix.as_str())
                        .is_some_and(|head| head.ends_with("::"))
            }
        }
    }
}

/// Which call expressions the walk registers for visiting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallMatcher {
    AnyCall,
    /// Calls whose bound declaration matches the pattern
    CalleeNamed(NamePattern),
}

impl CallMatcher {
    pub fn from_criteria(criteria: &MatchCriteria) -> Self {
        match &criteria.callee_name {
            Some(name) => CallMatcher::CalleeNamed(NamePattern::parse(name)),
            None => CallMatcher::AnyCall,
        }
    }

    /// Calls without a bound declaration never match a name.
    pub fn matches(&self, call: &AstNode, index: &DeclIndex<'_>) -> bool {
        match self {
            CallMatcher::AnyCall => true,
            CallMatcher::CalleeNamed(pattern) => match index.bound_declaration(call) {
                Ok(decl) => pattern.matches(&index.qualified_name(decl), decl.name().unwrap_or("")),
                Err(_) => false,
            },
        }
    }
}

/// Both checks of [`MatchCriteria`], combined with AND
#[derive(Debug, Clone)]
pub struct MatchFilter {
    criteria: MatchCriteria,
    matcher: CallMatcher,
}

impl MatchFilter {
    pub fn new(criteria: MatchCriteria) -> Self {
        let matcher = CallMatcher::from_criteria(&criteria);
        Self { criteria, matcher }
    }

    /// Whether a call starting on `line` is reported.
    ///
    /// The line is compared first since it needs no lookup.
    pub fn should_visit(&self, call: &AstNode, index: &DeclIndex<'_>, line: u32) -> bool {
        self.line_matches(line) && self.matcher.matches(call, index)
    }

    fn line_matches(&self, line: u32) -> bool {
        self.criteria.call_at_line == 0 || self.criteria.call_at_line == line
    }
}

impl Default for MatchFilter {
    fn default() -> Self {
        Self::new(MatchCriteria::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_name_disables_name_check() {
        let criteria = MatchCriteria::new(0, "");
        assert_eq!(criteria, MatchCriteria::default());
        assert_eq!(CallMatcher::from_criteria(&criteria), CallMatcher::AnyCall);
    }

    #[test]
    fn test_name_patterns() {
        let simple = NamePattern::parse("f");
        assert!(simple.matches("Z::C::f", "f"));
        assert!(!simple.matches("Z::C::g", "g"));

        let suffix = NamePattern::parse("C::f");
        assert!(suffix.matches("Z::C::f", "f"));
        assert!(suffix.matches("C::f", "f"));
        assert!(!suffix.matches("Z::BC::f", "f"));

        let full = NamePattern::parse("::N::g");
        assert!(full.matches("N::g", "g"));
        assert!(!full.matches("M::N::g", "g"));
    }

    #[test]
    fn test_line_filter() {
        let filter = MatchFilter::new(MatchCriteria::new(30, ""));
        assert!(filter.line_matches(30));
        assert!(!filter.line_matches(31));
        assert!(MatchFilter::default().line_matches(7));
    }
}

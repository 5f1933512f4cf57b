//! Structural comparison that ignores formatting.
//!
//! Trivia never takes part, except directives, whose structures are compared
//! like any other node. In top-level mode the contents of executable bodies
//! are skipped and literals are compared by value instead of spelling.

use crate::green::{GreenElement, GreenNode, GreenToken, GreenTrivia, NodeFlags, TriviaKind};
use crate::{Language, NodeOrToken, SyntaxKind, SyntaxNode, SyntaxToken, SyntaxTree};

struct Equivalence<'a> {
    language: &'static dyn Language,
    ignore_child_node: Option<&'a dyn Fn(SyntaxKind) -> bool>,
}

impl Equivalence<'_> {
    fn ignores(&self, kind: SyntaxKind) -> bool {
        self.ignore_child_node.is_some_and(|ignore| ignore(kind))
    }

    fn nodes(&self, before: &GreenNode, after: &GreenNode, top_level: bool) -> bool {
        if before.ptr_eq(after) {
            return true;
        }
        if before.kind() != after.kind() {
            return false;
        }
        let kind = before.kind();
        let top_level = top_level && !self.language.is_always_significant(kind);
        if top_level && self.language.is_executable_body(kind) {
            return true;
        }

        if self.ignore_child_node.is_some() {
            let before = self.children(before);
            let after = self.children(after);
            return before.len() == after.len()
                && before.iter().zip(&after).all(|(b, a)| self.elements(b, a, top_level));
        }

        before.slot_count() == after.slot_count()
            && before.slots().iter().zip(after.slots()).all(|pair| match pair {
                (None, None) => true,
                (Some(b), Some(a)) => self.elements(b, a, top_level),
                _ => false,
            })
    }

    /// Present children, without the ones the caller wants ignored.
    fn children<'n>(&self, node: &'n GreenNode) -> Vec<&'n GreenElement> {
        node.slots()
            .iter()
            .flatten()
            .filter(|child| !matches!(child, NodeOrToken::Node(n) if self.ignores(n.kind())))
            .collect()
    }

    fn elements(&self, before: &GreenElement, after: &GreenElement, top_level: bool) -> bool {
        match (before, after) {
            (NodeOrToken::Node(b), NodeOrToken::Node(a)) => self.nodes(b, a, top_level),
            (NodeOrToken::Token(b), NodeOrToken::Token(a)) => self.tokens(b, a, top_level),
            _ => false,
        }
    }

    fn tokens(&self, before: &GreenToken, after: &GreenToken, top_level: bool) -> bool {
        if before.ptr_eq(after) {
            return true;
        }
        if before.kind() != after.kind() || before.is_missing() != after.is_missing() {
            return false;
        }
        let same_text = if top_level {
            before.value_text() == after.value_text()
        } else {
            before.text() == after.text()
        };
        same_text && self.directives(before, after, top_level)
    }

    fn directives(&self, before: &GreenToken, after: &GreenToken, top_level: bool) -> bool {
        let has_directives = |token: &GreenToken| {
            token.leading().flags().contains(NodeFlags::CONTAINS_DIRECTIVES)
                || token.trailing().flags().contains(NodeFlags::CONTAINS_DIRECTIVES)
        };
        if !has_directives(before) && !has_directives(after) {
            return true;
        }
        let before = self.directive_structures(before);
        let after = self.directive_structures(after);
        before.len() == after.len()
            && before.iter().zip(&after).all(|(b, a)| self.nodes(b, a, top_level))
    }

    fn directive_structures<'t>(&self, token: &'t GreenToken) -> Vec<&'t GreenNode> {
        token
            .leading()
            .pieces()
            .iter()
            .chain(token.trailing().pieces())
            .filter(|piece| piece.kind() == TriviaKind::Directive)
            .filter_map(GreenTrivia::structure)
            .filter(|structure| !self.ignores(structure.kind()))
            .collect()
    }
}

/// Whether two subtrees have the same shape and the same significant text.
pub fn are_equivalent(before: &SyntaxNode, after: &SyntaxNode, top_level: bool) -> bool {
    are_equivalent_with(before, after, top_level, None)
}

/// [`are_equivalent`] with subtrees of the kinds `ignore_child_node` accepts left
/// out on both sides.
pub fn are_equivalent_with(
    before: &SyntaxNode,
    after: &SyntaxNode,
    top_level: bool,
    ignore_child_node: Option<&dyn Fn(SyntaxKind) -> bool>,
) -> bool {
    let equivalence = Equivalence { language: before.language(), ignore_child_node };
    equivalence.nodes(before.green(), after.green(), top_level)
}

/// Token equivalence: same kind, same text, same directives.
pub fn are_tokens_equivalent(before: &SyntaxToken, after: &SyntaxToken, top_level: bool) -> bool {
    let equivalence = Equivalence { language: before.language(), ignore_child_node: None };
    equivalence.tokens(before.green(), after.green(), top_level)
}

impl SyntaxNode {
    pub fn is_equivalent_to(&self, other: &Self, top_level: bool) -> bool {
        are_equivalent(self, other, top_level)
    }
}

impl SyntaxTree {
    pub fn is_equivalent_to(&self, other: &Self, top_level: bool) -> bool {
        are_equivalent(self.root(), other.root(), top_level)
    }
}

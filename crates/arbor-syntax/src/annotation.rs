//! Identity-keyed markers that ride along with green elements.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::green::{GreenNode, GreenToken, GreenTrivia, GreenTriviaList, NodeFlags, Slot};
use crate::{NodeOrToken, SyntaxNode, SyntaxNodeOrToken, SyntaxToken, SyntaxTrivia};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

struct AnnotationData {
    id: u64,
    kind: Option<Box<str>>,
    data: Option<Box<str>>,
}

/// A marker compared by identity. Clones share the identity; two
/// annotations created separately never compare equal, whatever their kind
/// and data.
#[derive(Clone)]
pub struct SyntaxAnnotation(Arc<AnnotationData>);

impl SyntaxAnnotation {
    pub fn new() -> Self {
        Self::alloc(None, None)
    }

    pub fn with_kind(kind: impl Into<Box<str>>) -> Self {
        Self::alloc(Some(kind.into()), None)
    }

    pub fn with_data(kind: impl Into<Box<str>>, data: impl Into<Box<str>>) -> Self {
        Self::alloc(Some(kind.into()), Some(data.into()))
    }

    fn alloc(kind: Option<Box<str>>, data: Option<Box<str>>) -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        Self(Arc::new(AnnotationData { id, kind, data }))
    }

    /// Rebuilds an annotation read back from a stream, keeping its identity.
    pub(crate) fn from_parts(id: u64, kind: Option<Box<str>>, data: Option<Box<str>>) -> Self {
        NEXT_ID.fetch_max(id + 1, Ordering::Relaxed);
        Self(Arc::new(AnnotationData { id, kind, data }))
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn kind(&self) -> Option<&str> {
        self.0.kind.as_deref()
    }

    pub fn data(&self) -> Option<&str> {
        self.0.data.as_deref()
    }
}

impl Default for SyntaxAnnotation {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for SyntaxAnnotation {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for SyntaxAnnotation {}

impl std::hash::Hash for SyntaxAnnotation {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for SyntaxAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxAnnotation")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("data", &self.data())
            .finish()
    }
}

/// Elements that can carry annotations. Every method returns a new value and
/// leaves the receiver untouched; red elements come back as detached roots.
pub trait Annotatable: Sized {
    /// The annotations on this element itself, not its descendants.
    fn annotations(&self) -> Vec<SyntaxAnnotation>;

    /// This element with exactly `annotations`.
    #[must_use]
    fn with_annotations(&self, annotations: Vec<SyntaxAnnotation>) -> Self;

    #[must_use]
    fn with_additional_annotations(
        &self,
        annotations: impl IntoIterator<Item = SyntaxAnnotation>,
    ) -> Self {
        let mut all = self.annotations();
        all.extend(annotations);
        self.with_annotations(all)
    }

    #[must_use]
    fn without_annotations<'a>(
        &self,
        annotations: impl IntoIterator<Item = &'a SyntaxAnnotation>,
    ) -> Self {
        let removed: Vec<&SyntaxAnnotation> = annotations.into_iter().collect();
        let mut kept = self.annotations();
        kept.retain(|annotation| !removed.contains(&annotation));
        self.with_annotations(kept)
    }

    #[must_use]
    fn without_annotations_of_kind(&self, kind: &str) -> Self {
        let mut kept = self.annotations();
        kept.retain(|annotation| annotation.kind() != Some(kind));
        self.with_annotations(kept)
    }

    fn has_annotation(&self, annotation: &SyntaxAnnotation) -> bool {
        self.annotations().contains(annotation)
    }

    fn has_annotations_of_kind(&self, kind: &str) -> bool {
        self.annotations().iter().any(|annotation| annotation.kind() == Some(kind))
    }

    fn annotations_of_kind(&self, kind: &str) -> Vec<SyntaxAnnotation> {
        let mut matching = self.annotations();
        matching.retain(|annotation| annotation.kind() == Some(kind));
        matching
    }
}

impl Annotatable for GreenNode {
    fn annotations(&self) -> Vec<SyntaxAnnotation> {
        Self::annotations(self).to_vec()
    }

    fn with_annotations(&self, annotations: Vec<SyntaxAnnotation>) -> Self {
        Self::with_annotations(self, annotations)
    }
}

impl Annotatable for GreenToken {
    fn annotations(&self) -> Vec<SyntaxAnnotation> {
        Self::annotations(self).to_vec()
    }

    fn with_annotations(&self, annotations: Vec<SyntaxAnnotation>) -> Self {
        Self::with_annotations(self, annotations)
    }
}

impl Annotatable for GreenTrivia {
    fn annotations(&self) -> Vec<SyntaxAnnotation> {
        Self::annotations(self).to_vec()
    }

    fn with_annotations(&self, annotations: Vec<SyntaxAnnotation>) -> Self {
        Self::with_annotations(self, annotations)
    }
}

impl Annotatable for SyntaxNode {
    fn annotations(&self) -> Vec<SyntaxAnnotation> {
        self.green().annotations().to_vec()
    }

    fn with_annotations(&self, annotations: Vec<SyntaxAnnotation>) -> Self {
        self.new_root_like(self.green().with_annotations(annotations))
    }
}

impl Annotatable for SyntaxToken {
    fn annotations(&self) -> Vec<SyntaxAnnotation> {
        self.green().annotations().to_vec()
    }

    fn with_annotations(&self, annotations: Vec<SyntaxAnnotation>) -> Self {
        Self::detached(self.green().with_annotations(annotations))
    }
}

impl Annotatable for SyntaxTrivia {
    fn annotations(&self) -> Vec<SyntaxAnnotation> {
        self.green().annotations().to_vec()
    }

    fn with_annotations(&self, annotations: Vec<SyntaxAnnotation>) -> Self {
        Self::detached(self.green().with_annotations(annotations))
    }
}

impl Annotatable for SyntaxNodeOrToken {
    fn annotations(&self) -> Vec<SyntaxAnnotation> {
        match self {
            Self::Node(node) => node.annotations(),
            Self::Token(token) => token.annotations(),
        }
    }

    fn with_annotations(&self, annotations: Vec<SyntaxAnnotation>) -> Self {
        match self {
            Self::Node(node) => Self::Node(node.with_annotations(annotations)),
            Self::Token(token) => Self::Token(token.with_annotations(annotations)),
        }
    }
}

/// An absent element stays absent.
impl<T: Annotatable> Annotatable for Option<T> {
    fn annotations(&self) -> Vec<SyntaxAnnotation> {
        self.as_ref().map(T::annotations).unwrap_or_default()
    }

    fn with_annotations(&self, annotations: Vec<SyntaxAnnotation>) -> Self {
        self.as_ref().map(|element| element.with_annotations(annotations))
    }
}

impl SyntaxNode {
    /// Nodes and tokens at or below this node carrying `annotation`, in order.
    pub fn annotated_nodes_and_tokens(
        &self,
        annotation: &SyntaxAnnotation,
    ) -> Vec<SyntaxNodeOrToken> {
        self.annotated_where(&|element| element.green().annotations().contains(annotation))
    }

    pub fn annotated_nodes_and_tokens_of_kind(&self, kind: &str) -> Vec<SyntaxNodeOrToken> {
        self.annotated_where(&|element| {
            element.green().annotations().iter().any(|annotation| annotation.kind() == Some(kind))
        })
    }

    pub fn annotated_nodes(&self, annotation: &SyntaxAnnotation) -> Vec<Self> {
        let found = self.annotated_nodes_and_tokens(annotation);
        found.into_iter().filter_map(NodeOrToken::into_node).collect()
    }

    pub fn annotated_tokens(&self, annotation: &SyntaxAnnotation) -> Vec<SyntaxToken> {
        let found = self.annotated_nodes_and_tokens(annotation);
        found.into_iter().filter_map(NodeOrToken::into_token).collect()
    }

    /// Trivia at or below this node carrying `annotation`, structured trivia included.
    pub fn annotated_trivia(&self, annotation: &SyntaxAnnotation) -> Vec<SyntaxTrivia> {
        let mut found = Vec::new();
        let mut tokens = Vec::new();
        for element in self.walk_annotated() {
            if let NodeOrToken::Token(token) = element {
                tokens.push(token);
            }
        }
        for token in tokens {
            for trivia in token.leading_trivia().iter().chain(token.trailing_trivia().iter()) {
                if !trivia.green().flags().contains(NodeFlags::CONTAINS_ANNOTATIONS) {
                    continue;
                }
                if trivia.green().annotations().contains(annotation) {
                    found.push(trivia.clone());
                }
                if let Some(structure) = trivia.structure() {
                    found.extend(structure.annotated_trivia(annotation));
                }
            }
        }
        found
    }

    fn annotated_where(
        &self,
        matches: &dyn Fn(&SyntaxNodeOrToken) -> bool,
    ) -> Vec<SyntaxNodeOrToken> {
        let mut found = Vec::new();
        for element in self.walk_annotated() {
            if matches(&element) {
                found.push(element.clone());
            }
            if let NodeOrToken::Token(token) = &element {
                for trivia in token.leading_trivia().iter().chain(token.trailing_trivia().iter()) {
                    if let Some(structure) = trivia.structure()
                        && structure.contains_annotations()
                    {
                        found.extend(structure.annotated_where(matches));
                    }
                }
            }
        }
        found
    }

    /// Pre-order over elements, skipping subtrees with no annotations at all.
    fn walk_annotated(&self) -> Vec<SyntaxNodeOrToken> {
        let mut out = Vec::new();
        let mut stack = vec![NodeOrToken::Node(self.clone())];
        while let Some(element) = stack.pop() {
            if !element.flags().contains(NodeFlags::CONTAINS_ANNOTATIONS) {
                continue;
            }
            if let NodeOrToken::Node(node) = &element {
                let start = stack.len();
                stack.extend(node.children_with_tokens());
                stack[start..].reverse();
            }
            out.push(element);
        }
        out
    }

    /// `target` with the annotations of this tree copied onto it, pairing
    /// elements by their position in a full-fidelity walk of both trees.
    pub fn copy_annotations_to(&self, target: &Self) -> Self {
        let green = copy_node(self.green(), target.green());
        if green.ptr_eq(target.green()) {
            return target.clone();
        }
        target.new_root_like(green)
    }
}

impl SyntaxToken {
    pub fn copy_annotations_to(&self, target: &Self) -> Self {
        let green = copy_token(self.green(), target.green());
        if green.ptr_eq(target.green()) {
            return target.clone();
        }
        Self::detached(green)
    }
}

fn merged<T: Annotatable>(from: &T, to: &T) -> Option<T> {
    let annotations = from.annotations();
    if annotations.is_empty() {
        return None;
    }
    Some(to.with_additional_annotations(annotations))
}

fn copy_node(from: &GreenNode, to: &GreenNode) -> GreenNode {
    if !from.flags().contains(NodeFlags::CONTAINS_ANNOTATIONS) {
        return to.clone();
    }
    let mut changed = false;
    let slots: Vec<Slot> = to
        .slots()
        .iter()
        .enumerate()
        .map(|(index, slot)| {
            let copied = match (from.slot(index), slot) {
                (Some(NodeOrToken::Node(from)), Some(NodeOrToken::Node(to))) => {
                    Some(NodeOrToken::Node(copy_node(from, to)))
                }
                (Some(NodeOrToken::Token(from)), Some(NodeOrToken::Token(to))) => {
                    Some(NodeOrToken::Token(copy_token(from, to)))
                }
                _ => slot.clone(),
            };
            changed |= !crate::green::slot_ptr_eq(&copied, slot);
            copied
        })
        .collect();
    let rebuilt = if changed { to.with_slots(slots) } else { to.clone() };
    merged(from, &rebuilt).unwrap_or(rebuilt)
}

fn copy_token(from: &GreenToken, to: &GreenToken) -> GreenToken {
    if !from.flags().contains(NodeFlags::CONTAINS_ANNOTATIONS) {
        return to.clone();
    }
    let leading = copy_trivia(from.leading(), to.leading());
    let trailing = copy_trivia(from.trailing(), to.trailing());
    let rebuilt = if leading.ptr_eq(to.leading()) && trailing.ptr_eq(to.trailing()) {
        to.clone()
    } else {
        to.with_trivia(leading, trailing)
    };
    merged(from, &rebuilt).unwrap_or(rebuilt)
}

fn copy_trivia(from: &GreenTriviaList, to: &GreenTriviaList) -> GreenTriviaList {
    if !from.flags().contains(NodeFlags::CONTAINS_ANNOTATIONS) {
        return to.clone();
    }
    let pieces = to.pieces().iter().enumerate().map(|(index, to)| {
        let Some(from) = from.pieces().get(index) else {
            return to.clone();
        };
        let to = match (from.structure(), to.structure()) {
            (Some(from), Some(structure)) => to.with_structure(copy_node(from, structure)),
            _ => to.clone(),
        };
        merged(from, &to).unwrap_or(to)
    });
    GreenTriviaList::new(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SyntaxKind;

    const NAME: SyntaxKind = SyntaxKind(20);
    const ROOT: SyntaxKind = SyntaxKind(21);

    fn tree() -> SyntaxNode {
        let a = GreenToken::new(NAME, "a");
        let b = GreenToken::new(NAME, "b");
        let green = GreenNode::new(ROOT, [Some(a.into()), Some(b.into())]);
        SyntaxNode::new_root(green, &crate::PlainLanguage)
    }

    #[test]
    fn identity_not_content() {
        let first = SyntaxAnnotation::with_data("rename", "x");
        let second = SyntaxAnnotation::with_data("rename", "x");
        assert_ne!(first, second);
        assert_eq!(first, first.clone());
    }

    #[test]
    fn add_and_remove() {
        let annotation = SyntaxAnnotation::new();
        let root = tree();
        let annotated = root.with_additional_annotations([annotation.clone()]);
        assert!(annotated.has_annotation(&annotation));
        assert!(!root.has_annotation(&annotation));
        assert!(annotated.contains_annotations());

        let removed = annotated.without_annotations([&annotation]);
        assert!(!removed.has_annotation(&annotation));
        assert!(!removed.contains_annotations());
        assert_eq!(removed.text(), "ab");
    }

    #[test]
    fn absent_stays_absent() {
        let none: Option<SyntaxNode> = None;
        assert!(none.with_additional_annotations([SyntaxAnnotation::new()]).is_none());
    }

    #[test]
    fn query_finds_tokens() {
        let annotation = SyntaxAnnotation::with_kind("marker");
        let root = tree();
        let b = root.descendant_tokens().nth(1).unwrap();
        let b = b.green().with_annotations(vec![annotation.clone()]);
        let green = root.green().with_slot(1, Some(b.into()));
        let root = SyntaxNode::new_root(green, &crate::PlainLanguage);

        let found = root.annotated_tokens(&annotation);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text(), "b");
        assert_eq!(root.annotated_nodes_and_tokens_of_kind("marker").len(), 1);
        assert!(root.annotated_nodes(&annotation).is_empty());
    }

    #[test]
    fn copy_pairs_by_position() {
        let annotation = SyntaxAnnotation::new();
        let source = tree();
        let a = source.first_token().unwrap();
        let a = a.green().with_annotations(vec![annotation.clone()]);
        let green = source.green().with_slot(0, Some(a.into()));
        let source = SyntaxNode::new_root(green, &crate::PlainLanguage);

        let target = tree();
        let copied = source.copy_annotations_to(&target);
        let first = copied.first_token().unwrap();
        assert!(first.has_annotation(&annotation));
        assert!(target.copy_annotations_to(&source).ptr_eq(&source));
    }
}

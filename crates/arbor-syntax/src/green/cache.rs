//! Bounded interning of small green elements.
//!
//! The table is advisory: a miss only forgoes reuse. Slots are guarded by
//! individual locks taken with `try_lock`, so a contended slot is skipped
//! rather than waited on, and a hash collision simply evicts the old entry.
//! Entries are weak, so the cache never keeps a dead tree's elements alive.

use std::hash::{Hash as _, Hasher as _};
use std::sync::LazyLock;

use parking_lot::Mutex;
use rustc_hash::FxHasher;

use super::node::WeakGreenNode;
use super::token::WeakGreenToken;
use super::trivia::WeakGreenTrivia;
use super::{
    GreenNode, GreenToken, GreenTrivia, GreenTriviaList, NodeFlags, Slot, TriviaKind, slot_ptr_eq,
};
use crate::SyntaxKind;

const MAX_CACHED_CHILDREN: usize = 3;
const MAX_CACHED_TEXT_LEN: usize = 32;
const MAX_CACHED_TRIVIA: usize = 2;

pub const DEFAULT_CAPACITY_BITS: u32 = 16;

static SHARED: LazyLock<NodeCache> =
    LazyLock::new(|| NodeCache::with_capacity_bits(DEFAULT_CAPACITY_BITS));

/// Result of probing the cache for a node.
#[derive(Debug)]
pub enum CacheLookup {
    Hit(GreenNode),
    /// Not present; pass the hash back to [`NodeCache::add_node`].
    Miss(u64),
    Uncacheable,
}

struct Entry<T> {
    hash: u64,
    value: T,
}

type Table<T> = Box<[Mutex<Option<Entry<T>>>]>;

pub struct NodeCache {
    nodes: Table<WeakGreenNode>,
    tokens: Table<WeakGreenToken>,
    trivia: Table<WeakGreenTrivia>,
    mask: u64,
}

impl NodeCache {
    /// The process-wide cache shared by every parser.
    pub fn shared() -> &'static Self {
        &SHARED
    }

    pub fn with_capacity_bits(bits: u32) -> Self {
        let capacity = 1usize << bits.clamp(1, 24);
        Self {
            nodes: new_table(capacity),
            tokens: new_table(capacity),
            trivia: new_table(capacity),
            mask: capacity as u64 - 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Looks up a node by kind and the identity of its children.
    ///
    /// Children are compared by reference, so hits are only possible when the
    /// children themselves came out of the cache.
    pub fn try_get_node(&self, kind: SyntaxKind, children: &[Slot]) -> CacheLookup {
        if !are_children_cacheable(children) {
            return CacheLookup::Uncacheable;
        }

        let hash = node_hash(kind, children);
        let Some(guard) = self.slot(&self.nodes, hash).try_lock() else {
            tracing::trace!(target: "arbor_syntax::cache", "contended node slot");
            return CacheLookup::Miss(hash);
        };

        let cached = guard.as_ref().filter(|entry| entry.hash == hash);
        match cached.and_then(|entry| entry.value.upgrade()) {
            Some(node)
                if node.kind() == kind
                    && node.slot_count() == children.len()
                    && node.slots().iter().zip(children).all(|(a, b)| slot_ptr_eq(a, b)) =>
            {
                CacheLookup::Hit(node)
            }
            _ => CacheLookup::Miss(hash),
        }
    }

    /// Stores an eligible node under a hash obtained from [`Self::try_get_node`].
    pub fn add_node(&self, node: &GreenNode, hash: u64) {
        if !is_node_cacheable(node) {
            return;
        }
        self.insert(&self.nodes, hash, node.downgrade());
    }

    /// Returns a cached node with the same kind and children, creating it if needed.
    pub fn node(&self, kind: SyntaxKind, children: Vec<Slot>) -> GreenNode {
        match self.try_get_node(kind, &children) {
            CacheLookup::Hit(node) => node,
            CacheLookup::Miss(hash) => {
                let node = GreenNode::new(kind, children);
                self.add_node(&node, hash);
                node
            }
            CacheLookup::Uncacheable => GreenNode::new(kind, children),
        }
    }

    pub fn token(
        &self,
        kind: SyntaxKind,
        text: &str,
        leading: GreenTriviaList,
        trailing: GreenTriviaList,
    ) -> GreenToken {
        let cacheable = text.len() <= MAX_CACHED_TEXT_LEN
            && leading.len() + trailing.len() <= MAX_CACHED_TRIVIA
            && leading.pieces().iter().chain(trailing.pieces()).all(is_trivia_cacheable);
        if !cacheable {
            return GreenToken::with_parts(kind, text.into(), None, leading, trailing);
        }

        let mut hasher = FxHasher::default();
        kind.hash(&mut hasher);
        text.hash(&mut hasher);
        hash_trivia(&mut hasher, &leading);
        hash_trivia(&mut hasher, &trailing);
        let hash = hasher.finish();

        if let Some(guard) = self.slot(&self.tokens, hash).try_lock()
            && let Some(entry) = &*guard
            && entry.hash == hash
            && let Some(cached) = entry.value.upgrade()
            && cached.kind() == kind
            && cached.text() == text
            && cached.value().is_none()
            && same_trivia(cached.leading(), &leading)
            && same_trivia(cached.trailing(), &trailing)
            && cached.annotations().is_empty()
            && cached.diagnostics().is_empty()
        {
            return cached;
        }

        let token = GreenToken::with_parts(kind, text.into(), None, leading, trailing);
        self.insert(&self.tokens, hash, token.downgrade());
        token
    }

    pub fn trivia(&self, kind: TriviaKind, text: &str) -> GreenTrivia {
        if text.len() > MAX_CACHED_TEXT_LEN
            || !matches!(kind, TriviaKind::Whitespace | TriviaKind::EndOfLine)
        {
            return GreenTrivia::new(kind, text);
        }

        let mut hasher = FxHasher::default();
        kind.hash(&mut hasher);
        text.hash(&mut hasher);
        let hash = hasher.finish();

        if let Some(guard) = self.slot(&self.trivia, hash).try_lock()
            && let Some(entry) = &*guard
            && entry.hash == hash
            && let Some(cached) = entry.value.upgrade()
            && cached.kind() == kind
            && cached.text() == Some(text)
        {
            return cached;
        }

        let trivia = GreenTrivia::new(kind, text);
        self.insert(&self.trivia, hash, trivia.downgrade());
        trivia
    }

    fn slot<'a, T>(&self, table: &'a Table<T>, hash: u64) -> &'a Mutex<Option<Entry<T>>> {
        &table[(hash & self.mask) as usize]
    }

    fn insert<T>(&self, table: &Table<T>, hash: u64, value: T) {
        let Some(mut guard) = self.slot(table, hash).try_lock() else {
            tracing::trace!(target: "arbor_syntax::cache", "contended slot, not inserting");
            return;
        };
        if guard.as_ref().is_some_and(|entry| entry.hash != hash) {
            tracing::trace!(target: "arbor_syntax::cache", hash, "evicting entry");
        }
        *guard = Some(Entry { hash, value });
    }
}

impl Default for NodeCache {
    fn default() -> Self {
        Self::with_capacity_bits(DEFAULT_CAPACITY_BITS)
    }
}

impl std::fmt::Debug for NodeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeCache").field("capacity", &self.capacity()).finish_non_exhaustive()
    }
}

fn new_table<T>(capacity: usize) -> Table<T> {
    (0..capacity).map(|_| Mutex::new(None)).collect()
}

fn node_hash(kind: SyntaxKind, children: &[Slot]) -> u64 {
    let mut hasher = FxHasher::default();
    kind.hash(&mut hasher);
    children.len().hash(&mut hasher);
    for child in children {
        child.as_ref().map_or(0, |child| child.addr()).hash(&mut hasher);
    }
    hasher.finish()
}

/// Flags that keep an element, and every node above it, out of the cache.
const UNCACHEABLE_FLAGS: NodeFlags = NodeFlags::CONTAINS_DIAGNOSTICS
    .union(NodeFlags::CONTAINS_ANNOTATIONS)
    .union(NodeFlags::CONTAINS_SKIPPED_TEXT)
    .union(NodeFlags::CONTAINS_STRUCTURED_TRIVIA);

fn are_children_cacheable(children: &[Slot]) -> bool {
    children.len() <= MAX_CACHED_CHILDREN
        && children.iter().flatten().all(|child| {
            !child.is_missing() && !child.flags().intersects(UNCACHEABLE_FLAGS)
        })
}

fn is_node_cacheable(node: &GreenNode) -> bool {
    are_children_cacheable(node.slots())
        && !node.is_missing()
        && !node.flags().intersects(UNCACHEABLE_FLAGS)
        && node.diagnostics().is_empty()
        && node.annotations().is_empty()
}

fn is_trivia_cacheable(trivia: &GreenTrivia) -> bool {
    trivia.text().is_some_and(|text| text.len() <= MAX_CACHED_TEXT_LEN)
        && !trivia.flags().intersects(UNCACHEABLE_FLAGS)
        && trivia.annotations().is_empty()
        && trivia.diagnostics().is_empty()
}

fn hash_trivia(hasher: &mut FxHasher, trivia: &GreenTriviaList) {
    trivia.len().hash(hasher);
    for piece in trivia.pieces() {
        piece.kind().hash(hasher);
        piece.text().hash(hasher);
    }
}

fn same_trivia(left: &GreenTriviaList, right: &GreenTriviaList) -> bool {
    left.ptr_eq(right)
        || (left.len() == right.len()
            && left.pieces().iter().zip(right.pieces()).all(|(a, b)| {
                a.kind() == b.kind() && a.text() == b.text() && a.annotations().is_empty()
            }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeOrToken;

    const NAME: SyntaxKind = SyntaxKind(20);
    const PAIR: SyntaxKind = SyntaxKind(30);

    fn token(cache: &NodeCache, text: &str) -> Slot {
        let space = GreenTriviaList::new([cache.trivia(TriviaKind::Whitespace, " ")]);
        Some(NodeOrToken::Token(cache.token(NAME, text, GreenTriviaList::empty(), space)))
    }

    #[test]
    fn interning_is_transitive() {
        let cache = NodeCache::with_capacity_bits(8);

        let first = cache.node(PAIR, vec![token(&cache, "a"), token(&cache, "b")]);
        let second = cache.node(PAIR, vec![token(&cache, "a"), token(&cache, "b")]);
        assert!(first.ptr_eq(&second));

        let outer_first = cache.node(PAIR, vec![Some(first.into()), None]);
        let outer_second = cache.node(PAIR, vec![Some(second.into()), None]);
        assert!(outer_first.ptr_eq(&outer_second));
    }

    #[test]
    fn lookup_is_by_child_identity() {
        let cache = NodeCache::with_capacity_bits(8);
        let fresh = |text: &str| Some(NodeOrToken::Token(GreenToken::new(NAME, text)));

        let first = cache.node(PAIR, vec![fresh("a")]);
        let second = cache.node(PAIR, vec![fresh("a")]);
        assert!(!first.ptr_eq(&second));
        assert_eq!(first.full_text(), second.full_text());
    }

    #[test]
    fn wide_and_annotated_nodes_are_not_cached() {
        let cache = NodeCache::with_capacity_bits(8);
        let children: Vec<Slot> = (0..4).map(|_| token(&cache, "x")).collect();
        assert!(matches!(cache.try_get_node(PAIR, &children), CacheLookup::Uncacheable));

        let node = GreenNode::new(PAIR, [token(&cache, "y")])
            .with_annotations(vec![crate::SyntaxAnnotation::new()]);
        let CacheLookup::Miss(hash) = cache.try_get_node(PAIR, node.slots()) else {
            panic!("expected a miss");
        };
        cache.add_node(&node, hash);
        assert!(matches!(cache.try_get_node(PAIR, node.slots()), CacheLookup::Miss(_)));
    }

    #[test]
    fn missing_and_skipped_content_is_not_cached() {
        let cache = NodeCache::with_capacity_bits(8);
        let missing = Some(NodeOrToken::Token(GreenToken::missing(NAME)));
        let children = vec![token(&cache, "a"), missing];
        assert!(matches!(cache.try_get_node(PAIR, &children), CacheLookup::Uncacheable));
        let first = cache.node(PAIR, children.clone());
        assert!(!first.ptr_eq(&cache.node(PAIR, children)));

        let skipped = GreenTriviaList::new([GreenTrivia::new(TriviaKind::SkippedTokens, "@")]);
        let name = cache.token(NAME, "b", skipped, GreenTriviaList::empty());
        assert!(name.flags().contains(NodeFlags::CONTAINS_SKIPPED_TEXT));
        let children = vec![Some(NodeOrToken::Token(name))];
        assert!(matches!(cache.try_get_node(PAIR, &children), CacheLookup::Uncacheable));
    }

    #[test]
    fn cached_elements_die_with_their_trees() {
        let cache = NodeCache::with_capacity_bits(8);
        let node = cache.node(PAIR, vec![token(&cache, "a"), None]);
        let weak = node.downgrade();
        let children = node.slots().to_vec();
        assert!(matches!(cache.try_get_node(PAIR, &children), CacheLookup::Hit(_)));

        drop(node);
        assert!(weak.upgrade().is_none());
        assert!(matches!(cache.try_get_node(PAIR, &children), CacheLookup::Miss(_)));

        let space = cache.trivia(TriviaKind::Whitespace, "  ");
        let weak_space = space.downgrade();
        drop(space);
        assert!(weak_space.upgrade().is_none());
        let again = cache.trivia(TriviaKind::Whitespace, "  ");
        assert_eq!(again.text(), Some("  "));
    }

    #[test]
    fn concurrent_use_never_corrupts_entries() {
        let cache = NodeCache::with_capacity_bits(4);
        std::thread::scope(|scope| {
            for thread in 0..4 {
                let cache = &cache;
                scope.spawn(move || {
                    for i in 0..500 {
                        let text = format!("t{}", (i + thread) % 37);
                        let node = cache.node(PAIR, vec![token(cache, &text), None]);
                        assert_eq!(node.full_text(), format!("{text} "));
                    }
                });
            }
        });
    }
}

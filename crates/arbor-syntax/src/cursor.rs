//! Iterative traversals over the red tree. None of these recurse, so they
//! are safe on arbitrarily deep trees.

use crate::NodeOrToken;
use crate::red::{SyntaxNode, SyntaxNodeOrToken, SyntaxToken, SyntaxTrivia};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEvent<T> {
    Enter(T),
    Leave(T),
}

impl<T> WalkEvent<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WalkEvent<U> {
        match self {
            Self::Enter(it) => WalkEvent::Enter(f(it)),
            Self::Leave(it) => WalkEvent::Leave(f(it)),
        }
    }
}

struct Frame {
    node: SyntaxNode,
    next_slot: usize,
    transparent: bool,
}

/// Enter and leave events for a node and its descendant nodes. List nodes
/// below the start are walked through without events of their own.
pub struct Preorder {
    stack: Vec<Frame>,
    start: Option<SyntaxNode>,
    skip_subtree: bool,
}

impl Preorder {
    pub(crate) fn new(start: SyntaxNode) -> Self {
        Self { stack: Vec::new(), start: Some(start), skip_subtree: false }
    }

    /// Do not descend into the node most recently entered.
    pub fn skip_subtree(&mut self) {
        self.skip_subtree = true;
    }
}

impl Iterator for Preorder {
    type Item = WalkEvent<SyntaxNode>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(start) = self.start.take() {
            self.stack.push(Frame { node: start.clone(), next_slot: 0, transparent: false });
            return Some(WalkEvent::Enter(start));
        }

        if std::mem::take(&mut self.skip_subtree) {
            let frame = self.stack.pop()?;
            return Some(WalkEvent::Leave(frame.node));
        }

        loop {
            let frame = self.stack.last_mut()?;
            if frame.next_slot >= frame.node.slot_count() {
                let frame = self.stack.pop()?;
                if frame.transparent {
                    continue;
                }
                return Some(WalkEvent::Leave(frame.node));
            }

            let slot = frame.next_slot;
            frame.next_slot += 1;
            let Some(child) = frame.node.slot_node(slot) else {
                continue;
            };
            let transparent = child.is_list();
            self.stack.push(Frame { node: child.clone(), next_slot: 0, transparent });
            if !transparent {
                return Some(WalkEvent::Enter(child));
            }
        }
    }
}

/// Every node and token below a node, in pre-order, lists flattened.
pub struct DescendantsWithTokens {
    stack: Vec<(SyntaxNode, usize)>,
}

impl DescendantsWithTokens {
    pub(crate) fn new(start: SyntaxNode) -> Self {
        Self { stack: vec![(start, 0)] }
    }
}

impl Iterator for DescendantsWithTokens {
    type Item = SyntaxNodeOrToken;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, next_slot) = self.stack.last_mut()?;
            if *next_slot >= node.slot_count() {
                self.stack.pop();
                continue;
            }
            let slot = *next_slot;
            *next_slot += 1;
            match node.slot(slot) {
                None => {}
                Some(NodeOrToken::Token(token)) => return Some(NodeOrToken::Token(token)),
                Some(NodeOrToken::Node(child)) => {
                    self.stack.push((child.clone(), 0));
                    if !child.is_list() {
                        return Some(NodeOrToken::Node(child));
                    }
                }
            }
        }
    }
}

pub struct DescendantTokens {
    inner: DescendantsWithTokens,
}

impl DescendantTokens {
    pub(crate) fn new(start: SyntaxNode) -> Self {
        Self { inner: DescendantsWithTokens::new(start) }
    }
}

impl Iterator for DescendantTokens {
    type Item = SyntaxToken;

    fn next(&mut self) -> Option<SyntaxToken> {
        self.inner.by_ref().find_map(NodeOrToken::into_token)
    }
}

/// Trivia of every token below a node. With `descend_into_trivia` the trivia
/// inside structured trivia follows the piece that holds it.
pub struct DescendantTrivia {
    stack: Vec<TriviaSource>,
    descend_into_trivia: bool,
}

enum TriviaSource {
    Tokens(DescendantTokens),
    Pieces(std::collections::VecDeque<SyntaxTrivia>),
}

impl DescendantTrivia {
    pub(crate) fn new(start: SyntaxNode, descend_into_trivia: bool) -> Self {
        let stack = vec![TriviaSource::Tokens(DescendantTokens::new(start))];
        Self { stack, descend_into_trivia }
    }
}

impl Iterator for DescendantTrivia {
    type Item = SyntaxTrivia;

    fn next(&mut self) -> Option<SyntaxTrivia> {
        loop {
            match self.stack.last_mut()? {
                TriviaSource::Pieces(pieces) => {
                    let Some(trivia) = pieces.pop_front() else {
                        self.stack.pop();
                        continue;
                    };
                    if self.descend_into_trivia
                        && let Some(structure) = trivia.structure()
                    {
                        self.stack.push(TriviaSource::Tokens(DescendantTokens::new(structure)));
                    }
                    return Some(trivia);
                }
                TriviaSource::Tokens(tokens) => match tokens.next() {
                    Some(token) => {
                        let pieces =
                            token.leading_trivia().iter().chain(token.trailing_trivia().iter());
                        self.stack.push(TriviaSource::Pieces(pieces.collect()));
                    }
                    None => {
                        self.stack.pop();
                    }
                },
            }
        }
    }
}

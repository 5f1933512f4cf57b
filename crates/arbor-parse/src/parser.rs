use arbor_errors::Diagnostic;
use arbor_syntax::{GreenNode, GreenToken, NodeCache, NodeOrToken, Slot, SyntaxKind, SyntaxSet};
use arbor_tokenizer::Tokenizer;
use arbor_tokenizer::kinds::{EOF, ERROR};
use drop_bomb::DropBomb;
use text_size::{TextRange, TextSize};

use crate::codes;

pub(crate) struct Parser<'a> {
    tokenizer: Tokenizer<'a>,
    events: Vec<Event>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(text: &'a str, cache: &'a NodeCache, symbols: &[Box<str>]) -> Self {
        Self { tokenizer: Tokenizer::with_cache(text, cache, symbols), events: Vec::new() }
    }

    pub(crate) fn peek_kind(&self) -> SyntaxKind {
        self.tokenizer.peek().kind
    }

    pub(crate) fn at(&self, kind: SyntaxKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn at_set(&self, set: &SyntaxSet) -> bool {
        set.contains(self.peek_kind())
    }

    /// Consumes the current token. The end-of-file token is only consumed by [`Self::eof`].
    pub(crate) fn advance(&mut self) {
        if self.at(EOF) {
            return;
        }
        self.bump();
    }

    pub(crate) fn eof(&mut self) {
        debug_assert!(self.at(EOF));
        self.bump();
    }

    fn bump(&mut self) {
        let token = self.tokenizer.next_token();
        let green = self.tokenizer.green(token);
        self.events.push(Event::Token(green));
    }

    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> bool {
        let at = self.at(kind);
        if at {
            self.advance();
        }
        at
    }

    /// Consumes a `kind` token, or records a missing one.
    pub(crate) fn expect(&mut self, kind: SyntaxKind, message: &'static str) {
        if !self.eat(kind) {
            self.missing(kind, Some(message));
        }
    }

    pub(crate) fn missing(&mut self, kind: SyntaxKind, message: Option<&'static str>) {
        self.events.push(Event::Missing { kind, message });
    }

    /// Leaves the next slot of the current node empty.
    pub(crate) fn empty(&mut self) {
        self.events.push(Event::Empty);
    }

    /// Wraps the current token in an error node.
    pub(crate) fn error_recover(&mut self, message: &'static str) {
        let m = self.start();
        self.advance();
        m.complete_with_error(self, ERROR, message);
    }

    pub(crate) fn start(&mut self) -> Marker {
        let pos = self.events.len() as u32;
        self.events.push(Event::TOMBSTONE);
        Marker::new(pos)
    }

    pub(crate) fn finish(self, cache: &NodeCache) -> GreenNode {
        let Self { tokenizer: _, mut events } = self;
        let mut stack: Vec<(SyntaxKind, Vec<Slot>)> = Vec::new();
        let mut forward_parents = Vec::new();
        let mut root = None;

        for i in 0..events.len() {
            match std::mem::replace(&mut events[i], Event::TOMBSTONE) {
                Event::Start { kind, forward_parent } => {
                    if kind == SyntaxKind::TOMBSTONE {
                        continue;
                    }

                    forward_parents.push(kind);
                    let mut idx = i;
                    let mut fp = forward_parent;
                    while let Some(fwd) = fp {
                        idx += fwd as usize;

                        fp = match std::mem::replace(&mut events[idx], Event::TOMBSTONE) {
                            Event::Start { kind, forward_parent } => {
                                if kind != SyntaxKind::TOMBSTONE {
                                    forward_parents.push(kind);
                                }
                                forward_parent
                            }
                            _ => unreachable!(),
                        };
                    }

                    for kind in forward_parents.drain(..).rev() {
                        stack.push((kind, Vec::new()));
                    }
                }
                Event::Finish { error } => {
                    let Some((kind, slots)) = stack.pop() else { unreachable!() };
                    let node = close(cache, kind, slots, error);
                    match stack.last_mut() {
                        Some((_, parent)) => parent.push(node),
                        None => root = node,
                    }
                }
                Event::Token(token) => push(&mut stack, Some(token.into())),
                Event::Missing { kind, message } => {
                    let mut token = GreenToken::missing(kind);
                    if let Some(message) = message {
                        let range = TextRange::empty(TextSize::new(0));
                        let diagnostic = Diagnostic::error(codes::EXPECTED, message, range);
                        token = token.with_diagnostics(vec![diagnostic]);
                    }
                    push(&mut stack, Some(token.into()));
                }
                Event::Empty => push(&mut stack, None),
            }
        }

        match root {
            Some(NodeOrToken::Node(root)) => root,
            _ => unreachable!("the grammar always completes a root node"),
        }
    }
}

fn push(stack: &mut [(SyntaxKind, Vec<Slot>)], slot: Slot) {
    if let Some((_, slots)) = stack.last_mut() {
        slots.push(slot);
    }
}

/// Builds a completed node; a list with no elements becomes an empty slot.
fn close(
    cache: &NodeCache,
    kind: SyntaxKind,
    slots: Vec<Slot>,
    error: Option<&'static str>,
) -> Slot {
    if kind.is_list() && slots.is_empty() {
        return None;
    }
    let mut node = cache.node(kind, slots);
    if let Some(message) = error {
        let range = TextRange::at(node.leading_width(), node.width());
        node = node.with_diagnostics(vec![Diagnostic::error(codes::UNEXPECTED, message, range)]);
    }
    Some(node.into())
}

enum Event {
    Start { kind: SyntaxKind, forward_parent: Option<u32> },
    Token(GreenToken),
    Missing { kind: SyntaxKind, message: Option<&'static str> },
    Empty,
    Finish { error: Option<&'static str> },
}

impl Event {
    const TOMBSTONE: Self = Self::Start { kind: SyntaxKind::TOMBSTONE, forward_parent: None };
}

pub(crate) struct Marker {
    position: u32,
    bomb: DropBomb,
}

impl Marker {
    fn new(pos: u32) -> Self {
        Self { position: pos, bomb: DropBomb::new("Marker must be completed") }
    }

    pub(crate) fn complete(self, p: &mut Parser<'_>, kind: SyntaxKind) -> CompletedMarker {
        self.finish(p, kind, None)
    }

    pub(crate) fn complete_with_error(
        self,
        p: &mut Parser<'_>,
        kind: SyntaxKind,
        message: &'static str,
    ) -> CompletedMarker {
        self.finish(p, kind, Some(message))
    }

    fn finish(
        mut self,
        p: &mut Parser<'_>,
        kind: SyntaxKind,
        error: Option<&'static str>,
    ) -> CompletedMarker {
        self.bomb.defuse();

        match &mut p.events[self.position as usize] {
            Event::Start { kind: slot, .. } => {
                *slot = kind;
            }
            _ => unreachable!(),
        }

        p.events.push(Event::Finish { error });
        CompletedMarker::new(self.position)
    }
}

pub(crate) struct CompletedMarker {
    pos: u32,
}

impl CompletedMarker {
    fn new(pos: u32) -> Self {
        Self { pos }
    }

    pub(crate) fn precede(self, p: &mut Parser<'_>) -> Marker {
        let new_pos = p.start();

        match &mut p.events[self.pos as usize] {
            Event::Start { forward_parent, .. } => {
                *forward_parent = Some(new_pos.position - self.pos);
            }
            _ => unreachable!(),
        }

        new_pos
    }
}

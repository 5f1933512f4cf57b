use std::fmt::{self, Write as _};
use std::sync::{Arc, Weak};

use arbor_errors::Diagnostic;
use text_size::TextSize;

use super::{GreenElement, GreenExtra, GreenToken, NodeFlags, Slot};
use crate::annotation::SyntaxAnnotation;
use crate::{Language, NodeOrToken, SyntaxKind};

/// Child storage specialised by arity.
///
/// Most nodes have three children or fewer; only wide nodes pay for the
/// boxed slice and its prefix offsets.
pub(crate) enum Slots {
    Empty,
    One([Slot; 1]),
    Two([Slot; 2]),
    Three([Slot; 3]),
    Many { slots: Box<[Slot]>, offsets: Box<[TextSize]> },
}

impl Slots {
    fn new(mut slots: Vec<Slot>) -> Self {
        match slots.len() {
            0 => Self::Empty,
            1 => Self::One([slots.pop().flatten()]),
            2 => {
                let second = slots.pop().flatten();
                Self::Two([slots.pop().flatten(), second])
            }
            3 => {
                let third = slots.pop().flatten();
                let second = slots.pop().flatten();
                Self::Three([slots.pop().flatten(), second, third])
            }
            _ => {
                let mut offsets = Vec::with_capacity(slots.len());
                let mut offset = TextSize::new(0);
                for slot in &slots {
                    offsets.push(offset);
                    offset += slot.as_ref().map_or(TextSize::new(0), GreenElement::full_width);
                }
                Self::Many { slots: slots.into_boxed_slice(), offsets: offsets.into_boxed_slice() }
            }
        }
    }

    #[inline]
    fn as_slice(&self) -> &[Slot] {
        match self {
            Self::Empty => &[],
            Self::One(slots) => slots,
            Self::Two(slots) => slots,
            Self::Three(slots) => slots,
            Self::Many { slots, .. } => slots,
        }
    }
}

struct GreenNodeData {
    kind: SyntaxKind,
    flags: NodeFlags,
    full_width: TextSize,
    present: usize,
    slots: Slots,
    extra: Option<Box<GreenExtra>>,
}

/// An immutable, position-free interior node.
///
/// Equality is identity: two nodes with the same text are only equal when
/// they are the same allocation, which is what the node cache provides.
#[derive(Clone)]
pub struct GreenNode {
    ptr: Arc<GreenNodeData>,
}

impl GreenNode {
    pub fn new(kind: SyntaxKind, slots: impl IntoIterator<Item = Slot>) -> Self {
        Self::alloc(kind, slots.into_iter().collect(), None)
    }

    fn alloc(kind: SyntaxKind, slots: Vec<Slot>, extra: Option<Box<GreenExtra>>) -> Self {
        let mut flags = NodeFlags::NONE;
        let mut full_width = TextSize::new(0);
        let mut present = 0;
        for slot in slots.iter().flatten() {
            flags |= slot.flags();
            full_width += slot.full_width();
            present += 1;
        }
        if let Some(extra) = &extra {
            flags |= extra.flags();
        }
        Self {
            ptr: Arc::new(GreenNodeData {
                kind,
                flags,
                full_width,
                present,
                slots: Slots::new(slots),
                extra,
            }),
        }
    }

    /// A list node over the given elements.
    pub fn list(elements: impl IntoIterator<Item = GreenElement>) -> Self {
        Self::new(SyntaxKind::LIST, elements.into_iter().map(Some))
    }

    /// A separated list over interleaved elements and separators.
    pub fn separated_list(elements: impl IntoIterator<Item = Slot>) -> Self {
        Self::new(SyntaxKind::SEPARATED_LIST, elements)
    }

    #[inline]
    pub fn kind(&self) -> SyntaxKind {
        self.ptr.kind
    }

    #[inline]
    pub fn flags(&self) -> NodeFlags {
        self.ptr.flags
    }

    #[inline]
    pub fn full_width(&self) -> TextSize {
        self.ptr.full_width
    }

    #[inline]
    pub fn is_list(&self) -> bool {
        self.kind().is_list()
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        !self.flags().contains(NodeFlags::IS_NOT_MISSING)
    }

    #[inline]
    pub fn slots(&self) -> &[Slot] {
        self.ptr.slots.as_slice()
    }

    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots().len()
    }

    /// Number of slots that hold an element.
    #[inline]
    pub fn present_count(&self) -> usize {
        self.ptr.present
    }

    #[inline]
    pub fn slot(&self, index: usize) -> Option<&GreenElement> {
        self.slots().get(index)?.as_ref()
    }

    /// Offset of `index` relative to the start of this node.
    pub fn slot_offset(&self, index: usize) -> TextSize {
        match &self.ptr.slots {
            Slots::Many { offsets, .. } => offsets[index],
            slots => slots.as_slice()[..index]
                .iter()
                .flatten()
                .map(GreenElement::full_width)
                .sum(),
        }
    }

    /// The slot whose full span covers `offset`, relative to this node.
    pub fn slot_index_at(&self, offset: TextSize) -> Option<usize> {
        if offset >= self.full_width() {
            return None;
        }
        match &self.ptr.slots {
            Slots::Many { offsets, .. } => {
                Some(offsets.partition_point(|&start| start <= offset).saturating_sub(1))
            }
            slots => {
                let mut start = TextSize::new(0);
                for (index, slot) in slots.as_slice().iter().enumerate() {
                    let width = slot.as_ref().map_or(TextSize::new(0), GreenElement::full_width);
                    if offset < start + width {
                        return Some(index);
                    }
                    start += width;
                }
                None
            }
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        GreenExtra::diagnostics_of(&self.ptr.extra)
    }

    pub fn annotations(&self) -> &[SyntaxAnnotation] {
        GreenExtra::annotations_of(&self.ptr.extra)
    }

    #[must_use]
    pub fn with_diagnostics(&self, diagnostics: Vec<Diagnostic>) -> Self {
        let extra = GreenExtra::new(diagnostics, self.annotations().to_vec());
        Self::alloc(self.kind(), self.slots().to_vec(), extra)
    }

    #[must_use]
    pub fn with_annotations(&self, annotations: Vec<SyntaxAnnotation>) -> Self {
        let extra = GreenExtra::new(self.diagnostics().to_vec(), annotations);
        Self::alloc(self.kind(), self.slots().to_vec(), extra)
    }

    /// A node of the same kind over new slots, keeping diagnostics and annotations.
    #[must_use]
    pub fn with_slots(&self, slots: Vec<Slot>) -> Self {
        Self::alloc(self.kind(), slots, self.ptr.extra.clone())
    }

    #[must_use]
    pub fn with_slot(&self, index: usize, slot: Slot) -> Self {
        let mut slots = self.slots().to_vec();
        slots[index] = slot;
        self.with_slots(slots)
    }

    /// The first token with a non-zero width.
    pub fn first_token(&self) -> Option<&GreenToken> {
        let mut node = self;
        loop {
            let child = node.slots().iter().flatten().find(|child| !child.is_empty())?;
            match child {
                NodeOrToken::Node(child) => node = child,
                NodeOrToken::Token(token) => return Some(token),
            }
        }
    }

    /// The last token with a non-zero width.
    pub fn last_token(&self) -> Option<&GreenToken> {
        let mut node = self;
        loop {
            let child = node.slots().iter().rev().flatten().find(|child| !child.is_empty())?;
            match child {
                NodeOrToken::Node(child) => node = child,
                NodeOrToken::Token(token) => return Some(token),
            }
        }
    }

    pub fn leading_width(&self) -> TextSize {
        self.first_token().map_or(TextSize::new(0), |token| token.leading().width())
    }

    pub fn trailing_width(&self) -> TextSize {
        self.last_token().map_or(TextSize::new(0), |token| token.trailing().width())
    }

    /// Width without the leading trivia of the first token and the trailing trivia of the last.
    pub fn width(&self) -> TextSize {
        self.full_width() - self.leading_width() - self.trailing_width()
    }

    pub fn write_text(&self, out: &mut String) {
        let mut stack: Vec<&GreenElement> = self.slots().iter().rev().flatten().collect();
        while let Some(element) = stack.pop() {
            match element {
                NodeOrToken::Node(node) => stack.extend(node.slots().iter().rev().flatten()),
                NodeOrToken::Token(token) => token.write_text(out),
            }
        }
    }

    pub fn full_text(&self) -> String {
        let mut text = String::with_capacity(u32::from(self.full_width()) as usize);
        self.write_text(&mut text);
        text
    }

    /// An indented dump of kinds, widths and token texts.
    pub fn debug_dump(&self, language: &dyn Language) -> String {
        let mut out = String::new();
        let mut stack: Vec<(usize, TextSize, &GreenElement)> = Vec::new();
        let root_end = u32::from(self.full_width());
        let _ = writeln!(out, "{}@0..{root_end}", language.kind_name(self.kind()));
        push_children(&mut stack, self, 1, TextSize::new(0));

        while let Some((depth, offset, element)) = stack.pop() {
            let end = u32::from(offset + element.full_width());
            let indent = "  ".repeat(depth);
            match element {
                NodeOrToken::Node(node) => {
                    let _ = writeln!(
                        out,
                        "{indent}{}@{}..{end}",
                        language.kind_name(node.kind()),
                        u32::from(offset)
                    );
                    push_children(&mut stack, node, depth + 1, offset);
                }
                NodeOrToken::Token(token) => {
                    let missing = if token.is_missing() { " (missing)" } else { "" };
                    let _ = writeln!(
                        out,
                        "{indent}{}@{}..{end} {:?}{missing}",
                        language.kind_name(token.kind()),
                        u32::from(offset),
                        token.text(),
                    );
                }
            }
        }

        out
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.ptr, &other.ptr)
    }

    #[inline]
    pub(crate) fn addr(&self) -> usize {
        &*self.ptr as *const GreenNodeData as usize
    }

    pub(crate) fn downgrade(&self) -> WeakGreenNode {
        WeakGreenNode { ptr: Arc::downgrade(&self.ptr) }
    }
}

/// A handle that does not keep its element alive.
pub(crate) struct WeakGreenNode {
    ptr: Weak<GreenNodeData>,
}

impl WeakGreenNode {
    pub(crate) fn upgrade(&self) -> Option<GreenNode> {
        self.ptr.upgrade().map(|ptr| GreenNode { ptr })
    }
}

fn push_children<'a>(
    stack: &mut Vec<(usize, TextSize, &'a GreenElement)>,
    node: &'a GreenNode,
    depth: usize,
    offset: TextSize,
) {
    let start = stack.len();
    let mut child_offset = offset;
    for child in node.slots().iter().flatten() {
        stack.push((depth, child_offset, child));
        child_offset += child.full_width();
    }
    stack[start..].reverse();
}

impl PartialEq for GreenNode {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for GreenNode {}

impl std::hash::Hash for GreenNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for GreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenNode")
            .field("kind", &self.kind())
            .field("full_width", &self.full_width())
            .field("slots", &self.slot_count())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for GreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_text())
    }
}

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use arbor_errors::Diagnostic;
use text_size::{TextRange, TextSize};

use super::{
    ChildSyntaxList, ParseOptions, SyntaxNodeOrToken, SyntaxToken, SyntaxTree, SyntaxTrivia,
};
use crate::annotation::SyntaxAnnotation;
use crate::cursor::{
    DescendantTokens, DescendantTrivia, DescendantsWithTokens, Preorder, WalkEvent,
};
use crate::green::{GreenElement, GreenNode, NodeFlags};
use crate::kind::PLAIN;
use crate::list::SyntaxTriviaList;
use crate::tracking::TRACKING_KIND;
use crate::{Language, NodeOrToken, SyntaxError, SyntaxKind, SyntaxResult};

pub(crate) struct RootInfo {
    language: &'static dyn Language,
    options: Option<Arc<ParseOptions>>,
    parent_trivia: Option<SyntaxTrivia>,
}

pub(crate) struct NodeData {
    green: GreenNode,
    offset: TextSize,
    index: u32,
    parent: Option<Weak<NodeData>>,
    children: Box<[OnceLock<Arc<NodeData>>]>,
    root: Option<Box<RootInfo>>,
    tracking: OnceLock<SyntaxAnnotation>,
}

impl NodeData {
    fn new(
        green: GreenNode,
        offset: TextSize,
        index: u32,
        parent: Option<Weak<Self>>,
        root: Option<Box<RootInfo>>,
    ) -> Arc<Self> {
        let children = std::iter::repeat_with(OnceLock::new).take(green.slot_count()).collect();
        let tracking = OnceLock::new();
        Arc::new(Self { green, offset, index, parent, children, root, tracking })
    }
}

/// A positioned node: a green node plus its absolute offset and parent.
///
/// Children are materialised on first access and cached in their parent, so
/// asking for the same child twice returns the same node. Equality is
/// identity of that cached node.
#[derive(Clone)]
pub struct SyntaxNode {
    root: Arc<NodeData>,
    data: Arc<NodeData>,
}

impl SyntaxNode {
    /// A detached root with no tree options.
    pub fn new_root(green: GreenNode, language: &'static dyn Language) -> Self {
        Self::with_root_info(green, TextSize::new(0), language, None, None)
    }

    pub(crate) fn with_root_info(
        green: GreenNode,
        offset: TextSize,
        language: &'static dyn Language,
        options: Option<Arc<ParseOptions>>,
        parent_trivia: Option<SyntaxTrivia>,
    ) -> Self {
        let info = RootInfo { language, options, parent_trivia };
        let data = NodeData::new(green, offset, 0, None, Some(Box::new(info)));
        Self { root: data.clone(), data }
    }

    /// A new root for `green` that keeps this tree's language and options.
    pub(crate) fn new_root_like(&self, green: GreenNode) -> Self {
        let info = self.root_info();
        Self::with_root_info(green, TextSize::new(0), info.language, info.options.clone(), None)
    }

    fn root_info(&self) -> &RootInfo {
        match &self.root.root {
            Some(info) => info,
            None => unreachable!("tree root without root info"),
        }
    }

    #[inline]
    pub fn kind(&self) -> SyntaxKind {
        self.data.green.kind()
    }

    #[inline]
    pub fn green(&self) -> &GreenNode {
        &self.data.green
    }

    #[inline]
    pub fn offset(&self) -> TextSize {
        self.data.offset
    }

    /// Range including leading and trailing trivia.
    #[inline]
    pub fn full_span(&self) -> TextRange {
        TextRange::at(self.offset(), self.green().full_width())
    }

    /// Range excluding the leading trivia of the first token and the trailing trivia of the last.
    pub fn span(&self) -> TextRange {
        let green = self.green();
        let start = self.offset() + green.leading_width();
        TextRange::at(start, green.width())
    }

    pub fn language(&self) -> &'static dyn Language {
        self.root_info().language
    }

    pub fn options(&self) -> Option<&ParseOptions> {
        self.root_info().options.as_deref()
    }

    pub(crate) fn options_arc(&self) -> Option<Arc<ParseOptions>> {
        self.root_info().options.clone()
    }

    #[inline]
    pub fn is_list(&self) -> bool {
        self.kind().is_list()
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        self.green().is_missing()
    }

    #[inline]
    pub fn flags(&self) -> NodeFlags {
        self.green().flags()
    }

    pub fn contains_diagnostics(&self) -> bool {
        self.flags().contains(NodeFlags::CONTAINS_DIAGNOSTICS)
    }

    pub fn contains_annotations(&self) -> bool {
        self.flags().contains(NodeFlags::CONTAINS_ANNOTATIONS)
    }

    pub fn contains_directives(&self) -> bool {
        self.flags().contains(NodeFlags::CONTAINS_DIRECTIVES)
    }

    pub fn contains_structured_trivia(&self) -> bool {
        self.flags().contains(NodeFlags::CONTAINS_STRUCTURED_TRIVIA)
    }

    /// The slot index of this node in its immediate holder.
    #[inline]
    pub fn index(&self) -> usize {
        self.data.index as usize
    }

    /// The immediate holder of this node, which may be a list.
    pub(crate) fn raw_parent(&self) -> Option<Self> {
        let parent = self.data.parent.as_ref()?.upgrade()?;
        Some(Self { root: self.root.clone(), data: parent })
    }

    /// The parent node, looking through any list holding this node.
    pub fn parent(&self) -> Option<Self> {
        let parent = self.raw_parent()?;
        if parent.is_list() { parent.raw_parent() } else { Some(parent) }
    }

    /// This node followed by each of its parents.
    pub fn ancestors(&self) -> impl Iterator<Item = Self> + use<> {
        std::iter::successors(Some(self.clone()), Self::parent)
    }

    /// The root of the tree this node is in.
    pub fn root(&self) -> Self {
        Self { root: self.root.clone(), data: self.root.clone() }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.data.parent.is_none()
    }

    /// The tree this node belongs to, if it was parsed or derived from a parsed tree.
    pub fn syntax_tree(&self) -> Option<SyntaxTree> {
        let info = self.root_info();
        if let Some(trivia) = &info.parent_trivia {
            return trivia.token()?.parent()?.syntax_tree();
        }
        info.options.as_ref()?;
        Some(SyntaxTree::from_root(self.root()))
    }

    /// For the root of structured trivia, the trivia it was parsed from.
    pub fn parent_trivia(&self) -> Option<&SyntaxTrivia> {
        if !self.is_root() {
            return None;
        }
        self.root_info().parent_trivia.as_ref()
    }

    pub fn is_structured_trivia(&self) -> bool {
        self.parent_trivia().is_some()
    }

    /// Whether this node is inside structured trivia.
    pub fn is_part_of_structured_trivia(&self) -> bool {
        self.root_info().parent_trivia.is_some()
    }

    fn child_data(&self, slot: usize) -> Option<Arc<NodeData>> {
        let NodeOrToken::Node(green) = self.green().slot(slot)? else {
            return None;
        };
        let cell = &self.data.children[slot];
        let data = cell.get_or_init(|| {
            let offset = self.offset() + self.green().slot_offset(slot);
            let parent = Some(Arc::downgrade(&self.data));
            NodeData::new(green.clone(), offset, slot as u32, parent, None)
        });
        Some(data.clone())
    }

    /// The node in `slot`, materialising it on first access.
    pub fn slot_node(&self, slot: usize) -> Option<Self> {
        Some(Self { root: self.root.clone(), data: self.child_data(slot)? })
    }

    pub fn slot_token(&self, slot: usize) -> Option<SyntaxToken> {
        let NodeOrToken::Token(green) = self.green().slot(slot)? else {
            return None;
        };
        let offset = self.offset() + self.green().slot_offset(slot);
        Some(SyntaxToken::new(Some(self.clone()), green.clone(), offset, slot))
    }

    /// The element in `slot`. List slots come back as list nodes.
    pub fn slot(&self, slot: usize) -> Option<SyntaxNodeOrToken> {
        match self.green().slot(slot)? {
            NodeOrToken::Node(_) => self.slot_node(slot).map(NodeOrToken::Node),
            NodeOrToken::Token(_) => self.slot_token(slot).map(NodeOrToken::Token),
        }
    }

    pub fn slot_count(&self) -> usize {
        self.green().slot_count()
    }

    /// Children with lists flattened into their elements.
    pub fn children_with_tokens(&self) -> ChildSyntaxList {
        ChildSyntaxList::new(self.clone())
    }

    pub fn children(&self) -> impl DoubleEndedIterator<Item = Self> + use<> {
        self.children_with_tokens().into_iter().filter_map(NodeOrToken::into_node)
    }

    pub fn first_child(&self) -> Option<Self> {
        self.children().next()
    }

    /// Pre-order enter and leave events for this node and its descendant nodes.
    pub fn preorder(&self) -> Preorder {
        Preorder::new(self.clone())
    }

    /// This node and all nodes below it in pre-order.
    pub fn descendants(&self) -> impl Iterator<Item = Self> + use<> {
        self.preorder().filter_map(|event| match event {
            WalkEvent::Enter(node) => Some(node),
            WalkEvent::Leave(_) => None,
        })
    }

    /// All nodes and tokens below this node in pre-order.
    pub fn descendants_with_tokens(&self) -> DescendantsWithTokens {
        DescendantsWithTokens::new(self.clone())
    }

    pub fn descendant_tokens(&self) -> DescendantTokens {
        DescendantTokens::new(self.clone())
    }

    /// Trivia of every descendant token, optionally including trivia nested in structured trivia.
    pub fn descendant_trivia(&self, descend_into_trivia: bool) -> DescendantTrivia {
        DescendantTrivia::new(self.clone(), descend_into_trivia)
    }

    /// The first token with a non-zero width.
    pub fn first_token(&self) -> Option<SyntaxToken> {
        self.first_token_where(|token| !token.green().width().eq(&TextSize::new(0)))
    }

    /// The last token with a non-zero width.
    pub fn last_token(&self) -> Option<SyntaxToken> {
        self.last_token_where(|token| !token.green().width().eq(&TextSize::new(0)))
    }

    /// The first token, zero-width tokens included.
    pub fn first_token_including_empty(&self) -> Option<SyntaxToken> {
        self.first_token_where(|_| true)
    }

    /// The last token, zero-width tokens such as end of file included.
    pub fn last_token_including_empty(&self) -> Option<SyntaxToken> {
        self.last_token_where(|_| true)
    }

    pub(crate) fn first_token_where(
        &self,
        predicate: impl Fn(&SyntaxToken) -> bool,
    ) -> Option<SyntaxToken> {
        self.descendant_tokens().find(|token| predicate(token))
    }

    pub(crate) fn last_token_where(
        &self,
        predicate: impl Fn(&SyntaxToken) -> bool,
    ) -> Option<SyntaxToken> {
        let mut stack = vec![self.children_with_tokens().into_iter()];
        while let Some(top) = stack.last_mut() {
            match top.next_back() {
                None => {
                    stack.pop();
                }
                Some(NodeOrToken::Token(token)) => {
                    if predicate(&token) {
                        return Some(token);
                    }
                }
                Some(NodeOrToken::Node(node)) => {
                    stack.push(node.children_with_tokens().into_iter());
                }
            }
        }
        None
    }

    pub fn leading_trivia(&self) -> SyntaxTriviaList {
        self.first_token().map(|token| token.leading_trivia()).unwrap_or_default()
    }

    pub fn trailing_trivia(&self) -> SyntaxTriviaList {
        self.last_token().map(|token| token.trailing_trivia()).unwrap_or_default()
    }

    /// The direct child whose full span covers `position`.
    pub fn child_that_contains_position(
        &self,
        position: TextSize,
    ) -> SyntaxResult<SyntaxNodeOrToken> {
        let span = self.full_span();
        if !span.contains(position) {
            return Err(SyntaxError::out_of_range(
                "position",
                u32::from(position) as usize,
                u32::from(span.end()) as usize,
            ));
        }

        let slot = self
            .green()
            .slot_index_at(position - self.offset())
            .ok_or_else(|| SyntaxError::structure("no child covers the position"))?;
        match self.slot(slot) {
            Some(NodeOrToken::Node(list)) if list.is_list() => {
                let inner = list
                    .green()
                    .slot_index_at(position - list.offset())
                    .ok_or_else(|| SyntaxError::structure("no list element covers the position"))?;
                list.slot(inner).ok_or_else(|| SyntaxError::structure("empty list slot"))
            }
            Some(element) => Ok(element),
            None => Err(SyntaxError::structure("empty slot covers the position")),
        }
    }

    /// The token whose full span covers `position`.
    ///
    /// At the end of a root the last token is returned; any other position
    /// outside the full span is out of range.
    pub fn find_token(
        &self,
        position: TextSize,
        find_inside_trivia: bool,
    ) -> SyntaxResult<SyntaxToken> {
        if self.is_root() && position == self.full_span().end() {
            if let Some(token) = self.last_token_including_empty() {
                return Ok(token);
            }
        }

        let mut node = self.clone();
        let token = loop {
            match node.child_that_contains_position(position)? {
                NodeOrToken::Node(child) => node = child,
                NodeOrToken::Token(token) => break token,
            }
        };

        if find_inside_trivia && !token.span().contains(position) {
            let trivia = token.trivia_at(position);
            if let Some(structure) = trivia.as_ref().and_then(SyntaxTrivia::structure) {
                return structure.find_token(position, true);
            }
        }
        Ok(token)
    }

    /// The trivia covering `position`, if the position falls inside trivia.
    pub fn find_trivia(
        &self,
        position: TextSize,
        find_inside_trivia: bool,
    ) -> Option<SyntaxTrivia> {
        let token = self.find_token(position, find_inside_trivia).ok()?;
        token.trivia_at(position)
    }

    /// The smallest node whose full span contains `range`.
    ///
    /// When several nested nodes share that span the outermost one is returned
    /// unless `innermost` is set.
    pub fn find_node(
        &self,
        range: TextRange,
        find_inside_trivia: bool,
        innermost: bool,
    ) -> SyntaxResult<Self> {
        let span = self.full_span();
        if !span.contains_range(range) {
            return Err(SyntaxError::out_of_range(
                "range",
                u32::from(range.start()) as usize,
                u32::from(span.end()) as usize,
            ));
        }

        let token = self.find_token(range.start(), find_inside_trivia)?;
        let start = match token.parent() {
            Some(parent) => parent,
            None => return Ok(self.clone()),
        };
        let mut node = start
            .ancestors()
            .find(|node| node.full_span().contains_range(range))
            .unwrap_or_else(|| self.clone());

        if !innermost {
            while node != *self {
                match node.parent() {
                    Some(parent) if parent.green().full_width() == node.green().full_width() => {
                        node = parent;
                    }
                    _ => break,
                }
            }
        }
        Ok(node)
    }

    /// Diagnostics attached anywhere under this node, with absolute ranges.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        if self.contains_diagnostics() {
            collect_diagnostics(self.green(), self.offset(), &mut out);
        }
        out
    }

    /// Directive trivia under this node, in order.
    pub fn directives(&self) -> Vec<SyntaxTrivia> {
        if !self.contains_directives() {
            return Vec::new();
        }
        self.descendant_trivia(false).filter(SyntaxTrivia::is_directive).collect()
    }

    /// Full text, trivia included.
    pub fn text(&self) -> String {
        self.green().full_text()
    }

    pub fn text_trimmed(&self) -> String {
        let full = self.text();
        let span = self.span() - self.offset();
        full[span].to_owned()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// The tracking marker of this red node, created on first request.
    pub(crate) fn tracking_marker(&self) -> &SyntaxAnnotation {
        self.data.tracking.get_or_init(|| SyntaxAnnotation::with_kind(TRACKING_KIND))
    }

    pub(crate) fn existing_tracking_marker(&self) -> Option<&SyntaxAnnotation> {
        self.data.tracking.get()
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.data) as usize
    }
}

fn collect_diagnostics(root: &GreenNode, offset: TextSize, out: &mut Vec<Diagnostic>) {
    let mut stack: Vec<(TextSize, &GreenElement)> = Vec::new();
    push_with_diagnostics(root, offset, out, &mut stack);

    while let Some((offset, element)) = stack.pop() {
        match element {
            NodeOrToken::Node(node) => push_with_diagnostics(node, offset, out, &mut stack),
            NodeOrToken::Token(token) => {
                let mut trivia_offset = offset;
                for trivia in token.leading().pieces() {
                    absolute(trivia.diagnostics(), trivia_offset, out);
                    if let Some(structure) = trivia.structure() {
                        collect_diagnostics(structure, trivia_offset, out);
                    }
                    trivia_offset += trivia.width();
                }
                absolute(token.diagnostics(), offset, out);
                trivia_offset += token.width();
                for trivia in token.trailing().pieces() {
                    absolute(trivia.diagnostics(), trivia_offset, out);
                    if let Some(structure) = trivia.structure() {
                        collect_diagnostics(structure, trivia_offset, out);
                    }
                    trivia_offset += trivia.width();
                }
            }
        }
    }
}

fn push_with_diagnostics<'a>(
    node: &'a GreenNode,
    offset: TextSize,
    out: &mut Vec<Diagnostic>,
    stack: &mut Vec<(TextSize, &'a GreenElement)>,
) {
    absolute(node.diagnostics(), offset, out);
    let start = stack.len();
    let mut child_offset = offset;
    for child in node.slots().iter().flatten() {
        if child.flags().contains(NodeFlags::CONTAINS_DIAGNOSTICS) {
            stack.push((child_offset, child));
        }
        child_offset += child.full_width();
    }
    stack[start..].reverse();
}

fn absolute(diagnostics: &[Diagnostic], offset: TextSize, out: &mut Vec<Diagnostic>) {
    out.extend(diagnostics.iter().map(|d| d.with_range(d.range() + offset)));
}

impl PartialEq for SyntaxNode {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for SyntaxNode {}

impl std::hash::Hash for SyntaxNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:?}", self.language().kind_name(self.kind()), self.full_span())
    }
}

impl fmt::Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

impl From<&SyntaxNode> for GreenNode {
    fn from(node: &SyntaxNode) -> Self {
        node.green().clone()
    }
}

impl From<SyntaxNode> for GreenNode {
    fn from(node: SyntaxNode) -> Self {
        node.green().clone()
    }
}

pub(crate) fn plain_language() -> &'static dyn Language {
    &PLAIN
}

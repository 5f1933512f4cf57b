use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use text_size::TextRange;

use super::{ElementKey, Targets};
use crate::green::{
    GreenNode, GreenToken, GreenTrivia, GreenTriviaList, Slot, TriviaKind, slot_ptr_eq,
};
use crate::kind::DirectiveRole;
use crate::visit::{SyntaxRewriter, rewrite, walk_list, walk_node, walk_token};
use crate::{NodeOrToken, SyntaxError, SyntaxNode, SyntaxResult, SyntaxToken, SyntaxTrivia};

/// What survives of a removed node's trivia.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RemoveOptions(u8);

impl RemoveOptions {
    pub const KEEP_NO_TRIVIA: Self = Self(0);
    pub const KEEP_LEADING_TRIVIA: Self = Self(1 << 0);
    pub const KEEP_TRAILING_TRIVIA: Self = Self(1 << 1);
    pub const KEEP_EXTERIOR_TRIVIA: Self =
        Self(Self::KEEP_LEADING_TRIVIA.0 | Self::KEEP_TRAILING_TRIVIA.0);
    /// Every directive inside the removed text is kept.
    pub const KEEP_DIRECTIVES: Self = Self(1 << 2);
    /// Only directives whose partner lies outside the removed text are kept,
    /// along with definitions.
    pub const KEEP_UNBALANCED_DIRECTIVES: Self = Self(1 << 3);
    /// A line break in the dropped trivia leaves one line break behind.
    pub const KEEP_END_OF_LINE: Self = Self(1 << 4);

    const NAMES: [(Self, &'static str); 5] = [
        (Self::KEEP_LEADING_TRIVIA, "KEEP_LEADING_TRIVIA"),
        (Self::KEEP_TRAILING_TRIVIA, "KEEP_TRAILING_TRIVIA"),
        (Self::KEEP_DIRECTIVES, "KEEP_DIRECTIVES"),
        (Self::KEEP_UNBALANCED_DIRECTIVES, "KEEP_UNBALANCED_DIRECTIVES"),
        (Self::KEEP_END_OF_LINE, "KEEP_END_OF_LINE"),
    ];

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for RemoveOptions {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for RemoveOptions {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for RemoveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                set.entry(&format_args!("{name}"));
            }
        }
        set.finish()
    }
}

/// Trivia that outlives a removed node waits here until the next token
/// takes it as leading trivia.
struct Remover {
    targets: Targets,
    options: RemoveOptions,
    residual: Vec<GreenTrivia>,
}

impl Remover {
    fn is_target(&self, node: &SyntaxNode) -> bool {
        self.targets.contains(&ElementKey::node(node))
    }

    fn should_visit(&self, span: TextRange) -> bool {
        !self.residual.is_empty() || self.targets.should_visit(span)
    }

    fn keeps(&self, option: RemoveOptions) -> bool {
        self.options.contains(option)
    }

    fn keeps_directives(&self) -> bool {
        self.options.intersects(
            RemoveOptions::KEEP_DIRECTIVES | RemoveOptions::KEEP_UNBALANCED_DIRECTIVES,
        )
    }

    fn add_residual(&mut self, trivia: &GreenTriviaList) {
        self.residual.extend(trivia.pieces().iter().cloned());
    }

    fn add_end_of_line(&mut self, end_of_line: Option<GreenTrivia>) {
        let Some(end_of_line) = end_of_line else {
            return;
        };
        if self.residual.last().is_none_or(|last| !ends_line(last)) {
            self.residual.push(end_of_line);
        }
    }

    /// The text a removal takes away, given the element's span and full span.
    fn removed_span(&self, span: TextRange, full_span: TextRange) -> TextRange {
        let mut removed = full_span;
        if self.keeps(RemoveOptions::KEEP_LEADING_TRIVIA) {
            removed = TextRange::new(span.start(), removed.end());
        }
        if self.keeps(RemoveOptions::KEEP_TRAILING_TRIVIA) {
            removed = TextRange::new(removed.start(), span.end());
        }
        removed
    }

    fn remove_alone(&mut self, node: &SyntaxNode) {
        let leading = node.leading_trivia();
        let trailing = node.trailing_trivia();
        if self.keeps(RemoveOptions::KEEP_LEADING_TRIVIA) {
            self.add_residual(leading.green());
        } else if self.keeps(RemoveOptions::KEEP_END_OF_LINE) {
            self.add_end_of_line(end_of_line_in(leading.green()));
        }

        if self.keeps_directives() {
            let removed = self.removed_span(node.span(), node.full_span());
            self.add_directives(node, removed);
        }

        if self.keeps(RemoveOptions::KEEP_TRAILING_TRIVIA) {
            self.add_residual(trailing.green());
        } else if self.keeps(RemoveOptions::KEEP_END_OF_LINE) {
            self.add_end_of_line(end_of_line_in(trailing.green()));
        }
    }

    /// Removes `node` together with the separator in front of it.
    fn remove_after_separator(
        &mut self,
        separator: &GreenToken,
        separator_span: (TextRange, TextRange),
        node: &SyntaxNode,
        list: &SyntaxNode,
    ) {
        let leading = node.leading_trivia();
        if self.keeps(RemoveOptions::KEEP_LEADING_TRIVIA) {
            self.add_residual(separator.leading());
            self.add_residual(separator.trailing());
            self.add_residual(leading.green());
        } else if self.keeps(RemoveOptions::KEEP_END_OF_LINE) {
            let end_of_line = end_of_line_in(separator.leading())
                .or_else(|| end_of_line_in(separator.trailing()));
            self.add_end_of_line(end_of_line);
        }

        if self.keeps_directives() {
            let (span, full_span) = separator_span;
            let span = TextRange::new(span.start(), node.span().end());
            let full_span = TextRange::new(full_span.start(), node.full_span().end());
            let removed = self.removed_span(span, full_span);
            self.add_directives(list, removed);
        }

        let trailing = node.trailing_trivia();
        if self.keeps(RemoveOptions::KEEP_TRAILING_TRIVIA) {
            self.add_residual(trailing.green());
        } else if self.keeps(RemoveOptions::KEEP_END_OF_LINE) {
            self.add_end_of_line(end_of_line_in(trailing.green()));
        }
    }

    /// Removes `node` together with the separator after it.
    fn remove_before_separator(
        &mut self,
        node: &SyntaxNode,
        separator: &SyntaxToken,
        list: &SyntaxNode,
    ) {
        let leading = node.leading_trivia();
        if self.keeps(RemoveOptions::KEEP_LEADING_TRIVIA) {
            self.add_residual(leading.green());
        } else if self.keeps(RemoveOptions::KEEP_END_OF_LINE) {
            self.add_end_of_line(end_of_line_in(leading.green()));
        }

        if self.keeps_directives() {
            let span = TextRange::new(node.span().start(), separator.span().end());
            let full_span = TextRange::new(node.full_span().start(), separator.full_span().end());
            let removed = self.removed_span(span, full_span);
            self.add_directives(list, removed);
        }

        let trailing = node.trailing_trivia();
        let separator = separator.green();
        if self.keeps(RemoveOptions::KEEP_TRAILING_TRIVIA) {
            self.add_residual(trailing.green());
            self.add_residual(separator.leading());
            self.add_residual(separator.trailing());
        } else if self.keeps(RemoveOptions::KEEP_END_OF_LINE) {
            let end_of_line =
                end_of_line_in(trailing.green()).or_else(|| end_of_line_in(separator.trailing()));
            self.add_end_of_line(end_of_line);
        }
    }

    /// Keeps the directives of `removed` under `node` that the options ask for.
    fn add_directives(&mut self, node: &SyntaxNode, removed: TextRange) {
        if !node.contains_directives() {
            return;
        }
        let language = node.language();
        let directives: Vec<SyntaxTrivia> = node
            .descendant_trivia(true)
            .filter(|trivia| trivia.is_directive() && removed.contains_range(trivia.span()))
            .collect();
        let roles: Vec<DirectiveRole> = directives
            .iter()
            .map(|trivia| {
                trivia.green().structure().map_or(DirectiveRole::Other, |structure| {
                    language.directive_role(structure.kind())
                })
            })
            .collect();

        let mut keep = vec![self.keeps(RemoveOptions::KEEP_DIRECTIVES); directives.len()];
        if !self.keeps(RemoveOptions::KEEP_DIRECTIVES) {
            let mut open = Vec::new();
            for (index, role) in roles.iter().enumerate() {
                match role {
                    DirectiveRole::Definition => keep[index] = true,
                    DirectiveRole::Open => open.push(index),
                    DirectiveRole::Close => {
                        if open.pop().is_none() {
                            keep[index] = true;
                        }
                    }
                    DirectiveRole::Other => {}
                }
            }
            open.into_iter().for_each(|index| keep[index] = true);
        }

        for (directive, keep) in directives.iter().zip(keep) {
            if keep {
                let end_of_line = end_of_line_in(&GreenTriviaList::new([directive.green().clone()]))
                    .unwrap_or_else(|| language.end_of_line());
                self.add_end_of_line(Some(end_of_line));
                self.residual.push(directive.green().clone());
            }
        }
    }

    fn visit_separated_list(&mut self, list: &SyntaxNode) -> SyntaxResult<Option<GreenNode>> {
        let green = list.green();
        let mut rebuilt: Option<Vec<Slot>> = None;
        let mut drop_next_separator = false;

        for index in 0..green.slot_count() {
            let original = &green.slots()[index];
            let visited: Slot = match list.slot(index) {
                None => None,
                Some(NodeOrToken::Token(separator)) => {
                    if drop_next_separator {
                        drop_next_separator = false;
                        None
                    } else {
                        self.visit_list_separator(&separator)?.map(NodeOrToken::Token)
                    }
                }
                Some(NodeOrToken::Node(node)) if self.is_target(&node) => {
                    let slots = rebuilt.get_or_insert_with(|| green.slots()[..index].to_vec());
                    let next_separator = list.slot_token(index + 1);
                    let separator_belongs = next_separator
                        .as_ref()
                        .is_some_and(|separator| separator_belongs_to(&node, separator));
                    let previous = match slots.last() {
                        Some(Some(NodeOrToken::Token(previous))) if !separator_belongs => {
                            list.slot_token(index - 1).map(|red| (previous.clone(), red))
                        }
                        _ => None,
                    };
                    if let Some((previous, red)) = previous {
                        slots.pop();
                        let spans = (red.span(), red.full_span());
                        self.remove_after_separator(&previous, spans, &node, list);
                    } else if let Some(separator) = next_separator {
                        self.remove_before_separator(&node, &separator, list);
                        drop_next_separator = true;
                    } else {
                        self.remove_alone(&node);
                    }
                    continue;
                }
                Some(NodeOrToken::Node(node)) => {
                    self.visit_list_element(&node)?.map(NodeOrToken::Node)
                }
            };

            if rebuilt.is_none() && !slot_ptr_eq(original, &visited) {
                rebuilt = Some(green.slots()[..index].to_vec());
            }
            if let Some(slots) = &mut rebuilt
                && (visited.is_some() || original.is_none())
            {
                slots.push(visited);
            }
        }

        let Some(slots) = rebuilt else {
            return Ok(Some(green.clone()));
        };
        if slots.is_empty() {
            return Ok(None);
        }
        Ok(Some(green.with_slots(slots)))
    }
}

impl SyntaxRewriter for Remover {
    fn visit_into_structured_trivia(&self) -> bool {
        self.targets.visits_structured_trivia()
    }

    fn visit_node(&mut self, node: &SyntaxNode) -> SyntaxResult<Option<GreenNode>> {
        if self.is_target(node) {
            self.remove_alone(node);
            return Ok(None);
        }
        if !self.should_visit(node.full_span()) {
            return Ok(Some(node.green().clone()));
        }
        walk_node(self, node)
    }

    fn visit_list(&mut self, list: &SyntaxNode) -> SyntaxResult<Option<GreenNode>> {
        if !self.should_visit(list.full_span()) {
            return Ok(Some(list.green().clone()));
        }
        if list.kind().is_separated_list() {
            return self.visit_separated_list(list);
        }
        walk_list(self, list)
    }

    fn visit_token(&mut self, token: &SyntaxToken) -> SyntaxResult<Option<GreenToken>> {
        let visited = if self.targets.visits_structured_trivia() {
            walk_token(self, token)?
        } else {
            Some(token.green().clone())
        };
        let Some(visited) = visited else {
            return Ok(None);
        };
        if self.residual.is_empty() {
            return Ok(Some(visited));
        }
        let mut leading = std::mem::take(&mut self.residual);
        leading.extend(visited.leading().pieces().iter().cloned());
        Ok(Some(visited.with_leading(GreenTriviaList::new(leading))))
    }
}

/// Whether a separator following `node` goes with it on removal: it ends the
/// line `node` is on.
fn separator_belongs_to(node: &SyntaxNode, separator: &SyntaxToken) -> bool {
    let has_end_of_line = |list: &GreenTriviaList| {
        list.pieces().iter().any(|piece| piece.kind() == TriviaKind::EndOfLine)
    };
    !separator.has_leading_trivia()
        && !has_end_of_line(node.trailing_trivia().green())
        && has_end_of_line(separator.green().trailing())
}

fn ends_line(trivia: &GreenTrivia) -> bool {
    matches!(
        trivia.kind(),
        TriviaKind::EndOfLine | TriviaKind::SingleLineComment | TriviaKind::Directive
    )
}

/// The first line break in `trivia`, looking through directives.
fn end_of_line_in(trivia: &GreenTriviaList) -> Option<GreenTrivia> {
    for piece in trivia.pieces() {
        if piece.kind() == TriviaKind::EndOfLine {
            return Some(piece.clone());
        }
        if piece.kind() == TriviaKind::Directive
            && let Some(structure) = piece.structure()
        {
            return structure.last_token().and_then(|token| end_of_line_in(token.trailing()));
        }
    }
    None
}

/// Whether `node` sits somewhere under `root`, structured trivia included.
fn is_within(node: &SyntaxNode, root: &SyntaxNode) -> bool {
    let target = ElementKey::node(root);
    let mut current = Some(node.clone());
    while let Some(node) = current {
        if std::iter::successors(Some(node.clone()), SyntaxNode::raw_parent)
            .any(|ancestor| ElementKey::node(&ancestor) == target)
        {
            return true;
        }
        current = node
            .root()
            .parent_trivia()
            .and_then(SyntaxTrivia::token)
            .and_then(SyntaxToken::raw_parent)
            .cloned();
    }
    false
}

impl SyntaxNode {
    /// Removes `node` from this tree. `Ok(None)` when this node itself is removed.
    pub fn remove_node(
        &self,
        node: &Self,
        options: RemoveOptions,
    ) -> SyntaxResult<Option<Self>> {
        self.remove_nodes([node.clone()], options)
    }

    /// Removes every node in one pass. Trivia kept from a removed node moves to
    /// the next token, or to the end of the tree when no token follows.
    pub fn remove_nodes(
        &self,
        nodes: impl IntoIterator<Item = Self>,
        options: RemoveOptions,
    ) -> SyntaxResult<Option<Self>> {
        let mut targets = Targets::default();
        for node in nodes {
            if !is_within(&node, self) {
                return Err(SyntaxError::contract("the node to remove is not part of this tree"));
            }
            targets.add_node(&node);
        }
        if targets.is_empty() {
            return Ok(Some(self.clone()));
        }
        if targets.contains(&ElementKey::node(self)) {
            return Ok(None);
        }

        let mut remover = Remover { targets, options, residual: Vec::new() };
        let result = rewrite(&mut remover, self)?;
        if remover.residual.is_empty() {
            return Ok(Some(result));
        }
        let Some(last) = result.last_token_including_empty() else {
            return Ok(Some(result));
        };
        let trailing = last.green().trailing().concat(&GreenTriviaList::new(remover.residual));
        let token = SyntaxToken::detached(last.green().with_trailing(trailing));
        result.replace_token(&last, &token).map(Some)
    }
}

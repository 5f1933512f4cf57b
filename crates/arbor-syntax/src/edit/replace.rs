use super::{ElementKey, Targets};
use crate::green::{GreenNode, GreenToken, GreenTrivia, GreenTriviaList, Slot};
use crate::list::{insert_elements, remove_element};
use crate::visit::{SyntaxRewriter, rewrite, walk_list, walk_node, walk_token, walk_trivia};
use crate::{NodeOrToken, SyntaxError, SyntaxNode, SyntaxResult, SyntaxToken, SyntaxTrivia};

/// Replaces every target in one pass. Each callback gets the original element
/// and the element as rewritten so far, which differs from the original when
/// a target sat inside it.
struct Replacer<N, T, V> {
    targets: Targets,
    node: N,
    token: T,
    trivia: V,
}

impl<N, T, V> SyntaxRewriter for Replacer<N, T, V>
where
    N: FnMut(&SyntaxNode, SyntaxNode) -> SyntaxNode,
    T: FnMut(&SyntaxToken, SyntaxToken) -> SyntaxToken,
    V: FnMut(&SyntaxTrivia, SyntaxTrivia) -> SyntaxTrivia,
{
    fn visit_into_structured_trivia(&self) -> bool {
        self.targets.visits_structured_trivia()
    }

    fn visit_node(&mut self, node: &SyntaxNode) -> SyntaxResult<Option<GreenNode>> {
        if !self.targets.should_visit(node.full_span()) {
            return Ok(Some(node.green().clone()));
        }
        let Some(rewritten) = walk_node(self, node)? else {
            return Ok(None);
        };
        if !self.targets.contains(&ElementKey::node(node)) {
            return Ok(Some(rewritten));
        }
        let rewritten = if rewritten.ptr_eq(node.green()) {
            node.clone()
        } else {
            node.new_root_like(rewritten)
        };
        Ok(Some((self.node)(node, rewritten).green().clone()))
    }

    fn visit_list(&mut self, list: &SyntaxNode) -> SyntaxResult<Option<GreenNode>> {
        if !self.targets.should_visit(list.full_span()) {
            return Ok(Some(list.green().clone()));
        }
        walk_list(self, list)
    }

    fn visit_token(&mut self, token: &SyntaxToken) -> SyntaxResult<Option<GreenToken>> {
        if !self.targets.should_visit(token.full_span()) {
            return Ok(Some(token.green().clone()));
        }
        let Some(rewritten) = walk_token(self, token)? else {
            return Ok(None);
        };
        if !self.targets.contains(&ElementKey::token(token)) {
            return Ok(Some(rewritten));
        }
        let rewritten = if rewritten.ptr_eq(token.green()) {
            token.clone()
        } else {
            SyntaxToken::detached(rewritten)
        };
        Ok(Some((self.token)(token, rewritten).green().clone()))
    }

    fn visit_trivia(&mut self, trivia: &SyntaxTrivia) -> SyntaxResult<Option<GreenTrivia>> {
        if !self.targets.should_visit(trivia.full_span()) {
            return Ok(Some(trivia.green().clone()));
        }
        let Some(rewritten) = walk_trivia(self, trivia)? else {
            return Ok(None);
        };
        if !self.targets.contains(&ElementKey::trivia(trivia)) {
            return Ok(Some(rewritten));
        }
        let rewritten = if rewritten.ptr_eq(trivia.green()) {
            trivia.clone()
        } else {
            SyntaxTrivia::detached(rewritten)
        };
        Ok(Some((self.trivia)(trivia, rewritten).green().clone()))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ListEdit {
    Replace,
    InsertBefore,
    InsertAfter,
}

enum NewElements {
    Nodes(Vec<GreenNode>),
    Tokens(Vec<GreenToken>),
    Trivia(Vec<GreenTrivia>),
}

/// Splices a run of new elements into the list that holds the target.
struct ListEditor {
    targets: Targets,
    target: ElementKey,
    edit: ListEdit,
    new: NewElements,
    applied: bool,
}

impl ListEditor {
    fn new(targets: Targets, target: ElementKey, edit: ListEdit, new: NewElements) -> Self {
        Self { targets, target, edit, new, applied: false }
    }

    fn run(mut self, root: &SyntaxNode) -> SyntaxResult<SyntaxNode> {
        let result = rewrite(&mut self, root)?;
        if !self.applied {
            return Err(SyntaxError::contract("the edited element is not part of this tree"));
        }
        Ok(result)
    }

    fn not_in_list(&self) -> SyntaxError {
        let what = match self.new {
            NewElements::Nodes(_) => "node",
            NewElements::Tokens(_) => "token",
            NewElements::Trivia(_) => "trivia",
        };
        SyntaxError::contract(format!("the {what} being edited is not an element of a list"))
    }

    /// The slots the edit at `slot` overwrites.
    fn splice_range(&self, slot: usize) -> std::ops::Range<usize> {
        match self.edit {
            ListEdit::Replace => slot..slot + 1,
            ListEdit::InsertBefore => slot..slot,
            ListEdit::InsertAfter => slot + 1..slot + 1,
        }
    }

    fn edit_list(&mut self, list: &SyntaxNode, slot: usize) -> SyntaxResult<Option<GreenNode>> {
        let green = list.green();
        let mut slots: Vec<Slot> = green.slots().to_vec();
        let range = self.splice_range(slot);
        match &self.new {
            NewElements::Nodes(nodes) if list.kind().is_separated_list() => {
                if slot % 2 == 1 {
                    return Err(self.not_in_list());
                }
                let index = slot / 2;
                let language = list.language();
                match self.edit {
                    ListEdit::Replace => match nodes.split_first() {
                        None => remove_element(&mut slots, index),
                        Some((first, rest)) => {
                            slots[slot] = Some(NodeOrToken::Node(first.clone()));
                            insert_elements(&mut slots, index + 1, rest.to_vec(), language)?;
                        }
                    },
                    ListEdit::InsertBefore => {
                        insert_elements(&mut slots, index, nodes.clone(), language)?;
                    }
                    ListEdit::InsertAfter => {
                        insert_elements(&mut slots, index + 1, nodes.clone(), language)?;
                    }
                }
            }
            NewElements::Nodes(nodes) => {
                let new = nodes.iter().map(|node| Some(NodeOrToken::Node(node.clone())));
                slots.splice(range, new);
            }
            NewElements::Tokens(tokens) => {
                if list.kind().is_separated_list() {
                    return Err(self.not_in_list());
                }
                let new = tokens.iter().map(|token| Some(NodeOrToken::Token(token.clone())));
                slots.splice(range, new);
            }
            NewElements::Trivia(_) => return Err(self.not_in_list()),
        }
        self.applied = true;
        if slots.is_empty() {
            return Ok(None);
        }
        Ok(Some(green.with_slots(slots)))
    }

    fn edit_trivia(&mut self, token: &SyntaxToken) -> Option<GreenToken> {
        let NewElements::Trivia(new) = &self.new else {
            return None;
        };
        let green = token.green();
        let (leading, trailing) = (token.leading_trivia(), token.trailing_trivia());
        let is_target = |trivia: SyntaxTrivia| ElementKey::trivia(&trivia) == self.target;
        let in_leading = leading.iter().position(is_target);
        let in_trailing = trailing.iter().position(is_target);
        let splice = |list: &GreenTriviaList, at: usize| {
            let mut pieces = list.pieces().to_vec();
            pieces.splice(self.splice_range(at), new.iter().cloned());
            GreenTriviaList::new(pieces)
        };
        let edited = match (in_leading, in_trailing) {
            (Some(at), _) => green.with_leading(splice(green.leading(), at)),
            (None, Some(at)) => green.with_trailing(splice(green.trailing(), at)),
            (None, None) => return None,
        };
        self.applied = true;
        Some(edited)
    }
}

impl SyntaxRewriter for ListEditor {
    fn visit_into_structured_trivia(&self) -> bool {
        self.targets.visits_structured_trivia()
    }

    fn visit_node(&mut self, node: &SyntaxNode) -> SyntaxResult<Option<GreenNode>> {
        if !self.targets.should_visit(node.full_span()) {
            return Ok(Some(node.green().clone()));
        }
        if ElementKey::node(node) == self.target {
            return Err(self.not_in_list());
        }
        walk_node(self, node)
    }

    fn visit_list(&mut self, list: &SyntaxNode) -> SyntaxResult<Option<GreenNode>> {
        if !self.targets.should_visit(list.full_span()) {
            return Ok(Some(list.green().clone()));
        }
        let slot = (0..list.slot_count()).find(|&slot| {
            list.slot(slot).is_some_and(|element| match element {
                NodeOrToken::Node(node) => ElementKey::node(&node) == self.target,
                NodeOrToken::Token(token) => ElementKey::token(&token) == self.target,
            })
        });
        match slot {
            Some(slot) => self.edit_list(list, slot),
            None => walk_list(self, list),
        }
    }

    fn visit_token(&mut self, token: &SyntaxToken) -> SyntaxResult<Option<GreenToken>> {
        if !self.targets.should_visit(token.full_span()) {
            return Ok(Some(token.green().clone()));
        }
        if ElementKey::token(token) == self.target {
            return Err(self.not_in_list());
        }
        if let Some(edited) = self.edit_trivia(token) {
            return Ok(Some(edited));
        }
        walk_token(self, token)
    }
}

fn node_greens(nodes: impl IntoIterator<Item = SyntaxNode>) -> Vec<GreenNode> {
    nodes.into_iter().map(|node| node.green().clone()).collect()
}

fn token_greens(tokens: impl IntoIterator<Item = SyntaxToken>) -> Vec<GreenToken> {
    tokens.into_iter().map(|token| token.green().clone()).collect()
}

impl SyntaxNode {
    /// Replaces nodes, tokens and trivia of this tree in a single pass.
    pub fn replace_syntax<N, T, V>(
        &self,
        nodes: impl IntoIterator<Item = Self>,
        compute_node: N,
        tokens: impl IntoIterator<Item = SyntaxToken>,
        compute_token: T,
        trivia: impl IntoIterator<Item = SyntaxTrivia>,
        compute_trivia: V,
    ) -> SyntaxResult<Self>
    where
        N: FnMut(&Self, Self) -> Self,
        T: FnMut(&SyntaxToken, SyntaxToken) -> SyntaxToken,
        V: FnMut(&SyntaxTrivia, SyntaxTrivia) -> SyntaxTrivia,
    {
        let mut targets = Targets::default();
        nodes.into_iter().for_each(|node| targets.add_node(&node));
        tokens.into_iter().for_each(|token| targets.add_token(&token));
        trivia.into_iter().for_each(|trivia| targets.add_trivia(&trivia));
        if targets.is_empty() {
            return Ok(self.clone());
        }
        let mut replacer =
            Replacer { targets, node: compute_node, token: compute_token, trivia: compute_trivia };
        rewrite(&mut replacer, self)
    }

    pub fn replace_nodes<F>(
        &self,
        nodes: impl IntoIterator<Item = Self>,
        compute: F,
    ) -> SyntaxResult<Self>
    where
        F: FnMut(&Self, Self) -> Self,
    {
        self.replace_syntax(nodes, compute, [], |_, token| token, [], |_, trivia| trivia)
    }

    pub fn replace_node(&self, old: &Self, new: &Self) -> SyntaxResult<Self> {
        self.replace_nodes([old.clone()], |_, _| new.clone())
    }

    /// Replaces a list element with any number of nodes; none removes it.
    pub fn replace_node_with_many(
        &self,
        old: &Self,
        new: impl IntoIterator<Item = Self>,
    ) -> SyntaxResult<Self> {
        self.edit_node_list(old, ListEdit::Replace, node_greens(new))
    }

    pub fn insert_nodes_before(
        &self,
        anchor: &Self,
        new: impl IntoIterator<Item = Self>,
    ) -> SyntaxResult<Self> {
        self.edit_node_list(anchor, ListEdit::InsertBefore, node_greens(new))
    }

    pub fn insert_nodes_after(
        &self,
        anchor: &Self,
        new: impl IntoIterator<Item = Self>,
    ) -> SyntaxResult<Self> {
        self.edit_node_list(anchor, ListEdit::InsertAfter, node_greens(new))
    }

    fn edit_node_list(
        &self,
        target: &Self,
        edit: ListEdit,
        new: Vec<GreenNode>,
    ) -> SyntaxResult<Self> {
        let mut targets = Targets::default();
        targets.add_node(target);
        let key = ElementKey::node(target);
        ListEditor::new(targets, key, edit, NewElements::Nodes(new)).run(self)
    }

    pub fn replace_tokens<F>(
        &self,
        tokens: impl IntoIterator<Item = SyntaxToken>,
        compute: F,
    ) -> SyntaxResult<Self>
    where
        F: FnMut(&SyntaxToken, SyntaxToken) -> SyntaxToken,
    {
        self.replace_syntax([], |_, node| node, tokens, compute, [], |_, trivia| trivia)
    }

    pub fn replace_token(&self, old: &SyntaxToken, new: &SyntaxToken) -> SyntaxResult<Self> {
        self.replace_tokens([old.clone()], |_, _| new.clone())
    }

    /// Replaces a token held in a token list; an empty `new` removes it.
    pub fn replace_token_with_many(
        &self,
        old: &SyntaxToken,
        new: impl IntoIterator<Item = SyntaxToken>,
    ) -> SyntaxResult<Self> {
        self.edit_token_list(old, ListEdit::Replace, token_greens(new))
    }

    pub fn insert_tokens_before(
        &self,
        anchor: &SyntaxToken,
        new: impl IntoIterator<Item = SyntaxToken>,
    ) -> SyntaxResult<Self> {
        self.edit_token_list(anchor, ListEdit::InsertBefore, token_greens(new))
    }

    pub fn insert_tokens_after(
        &self,
        anchor: &SyntaxToken,
        new: impl IntoIterator<Item = SyntaxToken>,
    ) -> SyntaxResult<Self> {
        self.edit_token_list(anchor, ListEdit::InsertAfter, token_greens(new))
    }

    fn edit_token_list(
        &self,
        target: &SyntaxToken,
        edit: ListEdit,
        new: Vec<GreenToken>,
    ) -> SyntaxResult<Self> {
        let mut targets = Targets::default();
        targets.add_token(target);
        let key = ElementKey::token(target);
        ListEditor::new(targets, key, edit, NewElements::Tokens(new)).run(self)
    }

    pub fn replace_trivia<F>(
        &self,
        trivia: impl IntoIterator<Item = SyntaxTrivia>,
        compute: F,
    ) -> SyntaxResult<Self>
    where
        F: FnMut(&SyntaxTrivia, SyntaxTrivia) -> SyntaxTrivia,
    {
        self.replace_syntax([], |_, node| node, [], |_, token| token, trivia, compute)
    }

    /// Replaces one trivia piece with any number of pieces; none removes it.
    pub fn replace_trivia_with_many(
        &self,
        old: &SyntaxTrivia,
        new: impl IntoIterator<Item = GreenTrivia>,
    ) -> SyntaxResult<Self> {
        self.edit_trivia_list(old, ListEdit::Replace, new.into_iter().collect())
    }

    pub fn insert_trivia_before(
        &self,
        anchor: &SyntaxTrivia,
        new: impl IntoIterator<Item = GreenTrivia>,
    ) -> SyntaxResult<Self> {
        self.edit_trivia_list(anchor, ListEdit::InsertBefore, new.into_iter().collect())
    }

    pub fn insert_trivia_after(
        &self,
        anchor: &SyntaxTrivia,
        new: impl IntoIterator<Item = GreenTrivia>,
    ) -> SyntaxResult<Self> {
        self.edit_trivia_list(anchor, ListEdit::InsertAfter, new.into_iter().collect())
    }

    fn edit_trivia_list(
        &self,
        target: &SyntaxTrivia,
        edit: ListEdit,
        new: Vec<GreenTrivia>,
    ) -> SyntaxResult<Self> {
        let mut targets = Targets::default();
        targets.add_trivia(target);
        let key = ElementKey::trivia(target);
        ListEditor::new(targets, key, edit, NewElements::Trivia(new)).run(self)
    }
}

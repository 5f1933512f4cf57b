use crate::green::{GreenNode, GreenToken, GreenTrivia, GreenTriviaList, Slot, slot_ptr_eq};
use crate::{NodeOrToken, SyntaxError, SyntaxNode, SyntaxResult, SyntaxToken, SyntaxTrivia};

/// Rebuilds a tree in one pass. Each hook returns the green replacement for
/// what it was given, or `None` to delete it.
///
/// Deleting a list element removes it from the list, together with its
/// separator in a separated list. Deleting anything held in a plain slot
/// empties the slot when the language allows that and is a structural error
/// otherwise.
pub trait SyntaxRewriter {
    /// Whether structured trivia is rewritten as well.
    fn visit_into_structured_trivia(&self) -> bool {
        false
    }

    fn visit_node(&mut self, node: &SyntaxNode) -> SyntaxResult<Option<GreenNode>> {
        walk_node(self, node)
    }

    fn visit_token(&mut self, token: &SyntaxToken) -> SyntaxResult<Option<GreenToken>> {
        walk_token(self, token)
    }

    fn visit_trivia(&mut self, trivia: &SyntaxTrivia) -> SyntaxResult<Option<GreenTrivia>> {
        walk_trivia(self, trivia)
    }

    /// Both plain and separated lists arrive here. `None` empties the slot.
    fn visit_list(&mut self, list: &SyntaxNode) -> SyntaxResult<Option<GreenNode>> {
        walk_list(self, list)
    }

    fn visit_list_element(&mut self, node: &SyntaxNode) -> SyntaxResult<Option<GreenNode>> {
        self.visit_node(node)
    }

    fn visit_list_separator(&mut self, token: &SyntaxToken) -> SyntaxResult<Option<GreenToken>> {
        self.visit_token(token)
    }
}

/// Rewrites `node` and returns the new root. When nothing changed the
/// original node comes back as is; otherwise the result is a new root with
/// the language and options of `node`'s tree.
pub fn rewrite<R: SyntaxRewriter + ?Sized>(
    rewriter: &mut R,
    node: &SyntaxNode,
) -> SyntaxResult<SyntaxNode> {
    let _span = tracing::debug_span!("rewrite", kind = node.kind().0).entered();
    let green = if node.is_list() {
        rewriter.visit_list(node)?
    } else {
        rewriter.visit_node(node)?
    };
    let Some(green) = green else {
        return Err(SyntaxError::structure("the rewritten node itself cannot be deleted"));
    };
    if green.ptr_eq(node.green()) {
        return Ok(node.clone());
    }
    Ok(node.new_root_like(green))
}

/// Rewrites the children of `node`, rebuilding it only if one of them changed.
pub fn walk_node<R: SyntaxRewriter + ?Sized>(
    rewriter: &mut R,
    node: &SyntaxNode,
) -> SyntaxResult<Option<GreenNode>> {
    let green = node.green();
    let language = node.language();
    let mut rebuilt: Option<Vec<Slot>> = None;

    for index in 0..green.slot_count() {
        let visited: Slot = match node.slot(index) {
            None => None,
            Some(NodeOrToken::Node(child)) if child.is_list() => {
                rewriter.visit_list(&child)?.map(NodeOrToken::Node)
            }
            Some(NodeOrToken::Node(child)) => rewriter.visit_node(&child)?.map(NodeOrToken::Node),
            Some(NodeOrToken::Token(token)) => {
                rewriter.visit_token(&token)?.map(NodeOrToken::Token)
            }
        };

        let original = &green.slots()[index];
        if original.is_some()
            && visited.is_none()
            && !language.is_optional_slot(green.kind(), index)
        {
            return Err(SyntaxError::structure(format!(
                "slot {index} of {} is required and cannot be deleted",
                language.kind_name(green.kind())
            )));
        }
        if rebuilt.is_none() && !slot_ptr_eq(original, &visited) {
            rebuilt = Some(green.slots()[..index].to_vec());
        }
        if let Some(slots) = &mut rebuilt {
            slots.push(visited);
        }
    }

    Ok(Some(match rebuilt {
        Some(slots) => green.with_slots(slots),
        None => green.clone(),
    }))
}

/// Rewrites the elements of a list node. An element visited to `None` is
/// dropped; in a separated list it takes the separator after it along.
pub fn walk_list<R: SyntaxRewriter + ?Sized>(
    rewriter: &mut R,
    list: &SyntaxNode,
) -> SyntaxResult<Option<GreenNode>> {
    let green = list.green();
    let separated = list.kind().is_separated_list();
    let mut rebuilt: Option<Vec<Slot>> = None;
    let mut dropped_element = false;

    for index in 0..green.slot_count() {
        let original = &green.slots()[index];
        let is_separator = separated && index % 2 == 1;
        let visited: Slot = match list.slot(index) {
            None => None,
            Some(NodeOrToken::Node(node)) => {
                rewriter.visit_list_element(&node)?.map(NodeOrToken::Node)
            }
            Some(NodeOrToken::Token(token)) if is_separator => {
                let visited = rewriter.visit_list_separator(&token)?;
                Some(NodeOrToken::Token(visited.ok_or_else(|| {
                    SyntaxError::structure("a separator cannot be deleted from its list")
                })?))
            }
            Some(NodeOrToken::Token(token)) => {
                rewriter.visit_token(&token)?.map(NodeOrToken::Token)
            }
        };

        let deleted = original.is_some() && visited.is_none();
        if rebuilt.is_none() && !slot_ptr_eq(original, &visited) {
            rebuilt = Some(green.slots()[..index].to_vec());
        }
        let Some(slots) = &mut rebuilt else {
            continue;
        };
        if is_separator && dropped_element {
            dropped_element = false;
            continue;
        }
        dropped_element = separated && deleted && !is_separator;
        if !deleted {
            slots.push(visited);
        }
    }

    let Some(mut slots) = rebuilt else {
        return Ok(Some(green.clone()));
    };
    if separated && slots.len() % 2 == 0 && green.slot_count() % 2 == 1 {
        slots.pop();
    }
    if slots.is_empty() {
        return Ok(None);
    }
    Ok(Some(green.with_slots(slots)))
}

/// Rewrites the trivia on both sides of a token.
pub fn walk_token<R: SyntaxRewriter + ?Sized>(
    rewriter: &mut R,
    token: &SyntaxToken,
) -> SyntaxResult<Option<GreenToken>> {
    let green = token.green();
    let leading = rewrite_trivia(rewriter, token.leading_trivia().iter(), green.leading())?;
    let trailing = rewrite_trivia(rewriter, token.trailing_trivia().iter(), green.trailing())?;
    if leading.ptr_eq(green.leading()) && trailing.ptr_eq(green.trailing()) {
        return Ok(Some(green.clone()));
    }
    Ok(Some(green.with_trivia(leading, trailing)))
}

fn rewrite_trivia<R: SyntaxRewriter + ?Sized>(
    rewriter: &mut R,
    pieces: impl Iterator<Item = SyntaxTrivia>,
    original: &GreenTriviaList,
) -> SyntaxResult<GreenTriviaList> {
    let mut rebuilt: Option<Vec<GreenTrivia>> = None;
    for (index, trivia) in pieces.enumerate() {
        let visited = rewriter.visit_trivia(&trivia)?;
        let unchanged = visited.as_ref().is_some_and(|visited| visited.ptr_eq(trivia.green()));
        if rebuilt.is_none() && !unchanged {
            rebuilt = Some(original.pieces()[..index].to_vec());
        }
        if let (Some(pieces), Some(visited)) = (&mut rebuilt, visited) {
            pieces.push(visited);
        }
    }
    Ok(match rebuilt {
        Some(pieces) => GreenTriviaList::new(pieces),
        None => original.clone(),
    })
}

/// Descends into the structure of `trivia` when the rewriter asks for it.
pub fn walk_trivia<R: SyntaxRewriter + ?Sized>(
    rewriter: &mut R,
    trivia: &SyntaxTrivia,
) -> SyntaxResult<Option<GreenTrivia>> {
    let green = trivia.green();
    if !rewriter.visit_into_structured_trivia() {
        return Ok(Some(green.clone()));
    }
    let Some(structure) = trivia.structure() else {
        return Ok(Some(green.clone()));
    };
    Ok(match rewriter.visit_node(&structure)? {
        None => None,
        Some(new) if new.ptr_eq(structure.green()) => Some(green.clone()),
        Some(new) => Some(green.with_structure(new)),
    })
}

impl SyntaxNode {
    /// Shorthand for [`rewrite`].
    pub fn rewrite_with<R: SyntaxRewriter + ?Sized>(&self, rewriter: &mut R) -> SyntaxResult<Self> {
        rewrite(rewriter, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::green::TriviaKind;
    use crate::{PlainLanguage, SyntaxKind};

    const WORD: SyntaxKind = SyntaxKind(40);
    const PUNCT: SyntaxKind = SyntaxKind(41);
    const ARG: SyntaxKind = SyntaxKind(42);
    const CALL: SyntaxKind = SyntaxKind(43);

    fn word(text: &str) -> GreenToken {
        GreenToken::new(WORD, text)
    }

    fn arg(text: &str) -> Slot {
        Some(GreenNode::new(ARG, [Some(word(text).into())]).into())
    }

    fn call() -> SyntaxNode {
        let space = GreenTriviaList::new([GreenTrivia::new(TriviaKind::Whitespace, " ")]);
        let comma = GreenToken::new(PUNCT, ",").with_trailing(space);
        let args = GreenNode::separated_list([arg("a"), Some(comma.into()), arg("b")]);
        let green = GreenNode::new(
            CALL,
            [
                Some(word("m").into()),
                Some(GreenToken::new(PUNCT, "(").into()),
                Some(args.into()),
                Some(GreenToken::new(PUNCT, ")").into()),
            ],
        );
        SyntaxNode::new_root(green, &PlainLanguage)
    }

    struct DropArg(&'static str);

    impl SyntaxRewriter for DropArg {
        fn visit_node(&mut self, node: &SyntaxNode) -> SyntaxResult<Option<GreenNode>> {
            if node.kind() == ARG && node.text() == self.0 {
                return Ok(None);
            }
            walk_node(self, node)
        }
    }

    struct Rename;

    impl SyntaxRewriter for Rename {
        fn visit_token(&mut self, token: &SyntaxToken) -> SyntaxResult<Option<GreenToken>> {
            if token.text() == "a" {
                return Ok(Some(word("c")));
            }
            walk_token(self, token)
        }
    }

    struct Identity;

    impl SyntaxRewriter for Identity {}

    #[test]
    fn unchanged_tree_is_returned_as_is() {
        let root = call();
        let rewritten = rewrite(&mut Identity, &root).unwrap();
        assert_eq!(rewritten, root);
    }

    #[test]
    fn token_replacement() {
        let rewritten = call().rewrite_with(&mut Rename).unwrap();
        assert_eq!(rewritten.to_string(), "m(c, b)");
        assert!(rewritten.is_root());
    }

    #[test]
    fn deleted_element_takes_its_separator() {
        assert_eq!(call().rewrite_with(&mut DropArg("a")).unwrap().to_string(), "m(b)");
        assert_eq!(call().rewrite_with(&mut DropArg("b")).unwrap().to_string(), "m(a)");
        assert_eq!(call().rewrite_with(&mut DropArg("x")).unwrap().to_string(), "m(a, b)");
    }

    #[test]
    fn deleting_the_root_fails() {
        let root = call();
        let args = root.slot_node(2).unwrap();
        let first = args.first_child().unwrap();
        let err = rewrite(&mut DropArg("a"), &first).unwrap_err();
        assert!(err.is_structure());
    }

    struct DropSeparators;

    impl SyntaxRewriter for DropSeparators {
        fn visit_list_separator(
            &mut self,
            _token: &SyntaxToken,
        ) -> SyntaxResult<Option<GreenToken>> {
            Ok(None)
        }
    }

    #[test]
    fn separators_cannot_be_deleted() {
        assert!(call().rewrite_with(&mut DropSeparators).unwrap_err().is_structure());
    }
}

use crate::{SyntaxError, SyntaxNode, SyntaxResult};

/// Single dispatch over node kinds. Implementors match on
/// [`SyntaxNode::kind`] in [`SyntaxVisitor::visit_node`] and leave the rest
/// to [`SyntaxVisitor::default_visit`].
pub trait SyntaxVisitor {
    type Output: Default;

    /// Visiting nothing yields the default output.
    fn visit(&mut self, node: Option<&SyntaxNode>) -> Self::Output {
        match node {
            Some(node) => self.visit_node(node),
            None => Self::Output::default(),
        }
    }

    fn visit_node(&mut self, node: &SyntaxNode) -> Self::Output {
        self.default_visit(node)
    }

    fn default_visit(&mut self, _node: &SyntaxNode) -> Self::Output {
        Self::Output::default()
    }
}

/// A visitor threading an argument through the traversal. It is stricter
/// than [`SyntaxVisitor`]: visiting nothing is a null argument.
pub trait SyntaxVisitorWithArg<A> {
    type Output;

    fn visit(&mut self, node: Option<&SyntaxNode>, arg: A) -> SyntaxResult<Self::Output> {
        let node = node.ok_or(SyntaxError::NullArgument("node"))?;
        Ok(self.visit_node(node, arg))
    }

    fn visit_node(&mut self, node: &SyntaxNode, arg: A) -> Self::Output {
        self.default_visit(node, arg)
    }

    fn default_visit(&mut self, node: &SyntaxNode, arg: A) -> Self::Output;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::green::{GreenNode, GreenToken};
    use crate::{PlainLanguage, SyntaxKind};

    const LEAF: SyntaxKind = SyntaxKind(30);
    const PAIR: SyntaxKind = SyntaxKind(31);

    struct CountPairs;

    impl SyntaxVisitor for CountPairs {
        type Output = usize;

        fn visit_node(&mut self, node: &SyntaxNode) -> usize {
            match node.kind() {
                PAIR => 1 + node.children().map(|child| self.visit_node(&child)).sum::<usize>(),
                _ => self.default_visit(node),
            }
        }
    }

    struct Depth;

    impl SyntaxVisitorWithArg<usize> for Depth {
        type Output = usize;

        fn default_visit(&mut self, node: &SyntaxNode, depth: usize) -> usize {
            let children = node.children().map(|child| self.default_visit(&child, depth + 1));
            children.max().unwrap_or(depth)
        }
    }

    fn tree() -> SyntaxNode {
        let leaf = GreenToken::new(LEAF, "x");
        let inner = GreenNode::new(PAIR, [Some(leaf.clone().into()), Some(leaf.clone().into())]);
        let green = GreenNode::new(PAIR, [Some(inner.into()), Some(leaf.into())]);
        SyntaxNode::new_root(green, &PlainLanguage)
    }

    #[test]
    fn dispatch_by_kind() {
        assert_eq!(CountPairs.visit(Some(&tree())), 2);
    }

    #[test]
    fn null_visit() {
        assert_eq!(CountPairs.visit(None), 0);
        let err = Depth.visit(None, 0).unwrap_err();
        assert!(err.is_null_argument());
        assert_eq!(Depth.visit(Some(&tree()), 0).unwrap(), 1);
    }
}

use crate::{NodeOrToken, SyntaxNode, SyntaxToken, SyntaxTrivia};

/// How far a walker descends. Levels are cumulative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WalkDepth(i8);

impl WalkDepth {
    /// Visit the starting node only.
    pub const ROOT: Self = Self(-1);
    pub const NODE: Self = Self(0);
    pub const TOKEN: Self = Self(1);
    pub const TRIVIA: Self = Self(2);
    pub const STRUCTURED_TRIVIA: Self = Self(3);

    /// Any negative level visits only the root; levels past the deepest are clamped.
    pub fn from_level(level: i8) -> Self {
        Self(level.clamp(Self::ROOT.0, Self::STRUCTURED_TRIVIA.0))
    }

    pub fn level(self) -> i8 {
        self.0
    }
}

impl Default for WalkDepth {
    fn default() -> Self {
        Self::NODE
    }
}

/// A read-only pre-order traversal. A token is visited before its trivia.
pub trait SyntaxWalker {
    fn depth(&self) -> WalkDepth {
        WalkDepth::NODE
    }

    fn visit_node(&mut self, _node: &SyntaxNode) {}

    fn leave_node(&mut self, _node: &SyntaxNode) {}

    fn visit_token(&mut self, _token: &SyntaxToken) {}

    fn visit_trivia(&mut self, _trivia: &SyntaxTrivia) {}
}

enum Step {
    Enter(SyntaxNode),
    Leave(SyntaxNode),
    Token(SyntaxToken),
    Trivia(SyntaxTrivia),
}

/// Walks `root` with an explicit stack, so depth is not limited by the call stack.
pub fn walk<W: SyntaxWalker + ?Sized>(walker: &mut W, root: &SyntaxNode) {
    let depth = walker.depth();
    let mut stack = vec![Step::Enter(root.clone())];

    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(node) => {
                walker.visit_node(&node);
                stack.push(Step::Leave(node.clone()));
                if depth < WalkDepth::NODE {
                    continue;
                }
                let start = stack.len();
                for child in node.children_with_tokens() {
                    match child {
                        NodeOrToken::Node(child) => stack.push(Step::Enter(child)),
                        NodeOrToken::Token(token) if depth >= WalkDepth::TOKEN => {
                            stack.push(Step::Token(token));
                        }
                        NodeOrToken::Token(_) => {}
                    }
                }
                stack[start..].reverse();
            }
            Step::Leave(node) => walker.leave_node(&node),
            Step::Token(token) => {
                walker.visit_token(&token);
                if depth >= WalkDepth::TRIVIA {
                    let start = stack.len();
                    stack.extend(token.leading_trivia().iter().map(Step::Trivia));
                    stack.extend(token.trailing_trivia().iter().map(Step::Trivia));
                    stack[start..].reverse();
                }
            }
            Step::Trivia(trivia) => {
                walker.visit_trivia(&trivia);
                if depth >= WalkDepth::STRUCTURED_TRIVIA
                    && let Some(structure) = trivia.structure()
                {
                    stack.push(Step::Enter(structure));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::green::{GreenNode, GreenToken, GreenTrivia, GreenTriviaList, TriviaKind};
    use crate::{PlainLanguage, SyntaxKind};

    const WORD: SyntaxKind = SyntaxKind(40);
    const GROUP: SyntaxKind = SyntaxKind(41);
    const DIRECTIVE: SyntaxKind = SyntaxKind(42);

    #[derive(Default)]
    struct Recorder {
        depth: WalkDepth,
        text: String,
        nodes: usize,
    }

    impl SyntaxWalker for Recorder {
        fn depth(&self) -> WalkDepth {
            self.depth
        }

        fn visit_node(&mut self, _node: &SyntaxNode) {
            self.nodes += 1;
        }

        fn visit_token(&mut self, token: &SyntaxToken) {
            self.text.push_str(token.text());
        }

        fn visit_trivia(&mut self, trivia: &SyntaxTrivia) {
            if !trivia.has_structure() {
                self.text.push_str(&trivia.text());
            }
        }
    }

    fn tree() -> SyntaxNode {
        let hash = GreenToken::new(WORD, "#x");
        let directive = GreenNode::new(DIRECTIVE, [Some(hash.into())]);
        let directive = GreenTrivia::structured(TriviaKind::Directive, directive);
        let leading = GreenTriviaList::new([directive]);
        let trailing = GreenTriviaList::new([GreenTrivia::new(TriviaKind::Whitespace, " ")]);
        let a = GreenToken::with_parts(WORD, "a".into(), None, leading, trailing);
        let b = GreenToken::new(WORD, "b");
        let inner = GreenNode::new(GROUP, [Some(b.into())]);
        let green = GreenNode::new(GROUP, [Some(a.into()), Some(inner.into())]);
        SyntaxNode::new_root(green, &PlainLanguage)
    }

    fn record(level: i8) -> Recorder {
        let mut recorder = Recorder { depth: WalkDepth::from_level(level), ..Recorder::default() };
        walk(&mut recorder, &tree());
        recorder
    }

    #[test]
    fn depth_is_cumulative() {
        let root_only = record(-5);
        assert_eq!((root_only.nodes, root_only.text.as_str()), (1, ""));

        let nodes = record(0);
        assert_eq!((nodes.nodes, nodes.text.as_str()), (2, ""));

        let tokens = record(1);
        assert_eq!(tokens.text, "ab");

        let trivia = record(2);
        assert_eq!(trivia.text, "a b");

        let structured = record(3);
        assert_eq!((structured.nodes, structured.text.as_str()), (3, "a#x b"));

        assert_eq!(record(100).text, structured.text);
    }
}

use text_size::TextRange;

use super::SyntaxNode;
use crate::SyntaxKind;

/// Stable identifier for a node by kind and trimmed range, resolvable
/// against any root with the same text.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SyntaxNodePtr {
    pub kind: SyntaxKind,
    pub range: TextRange,
}

impl SyntaxNodePtr {
    pub fn new(node: &SyntaxNode) -> Self {
        Self { kind: node.kind(), range: node.span() }
    }

    pub fn try_to_node(&self, root: &SyntaxNode) -> Option<SyntaxNode> {
        if !root.is_root() {
            return None;
        }
        let start = root.find_node(self.range, false, true).ok()?;
        start.ancestors().find(|node| node.kind() == self.kind && node.span() == self.range)
    }

    #[track_caller]
    pub fn to_node(&self, root: &SyntaxNode) -> SyntaxNode {
        self.try_to_node(root).unwrap()
    }
}

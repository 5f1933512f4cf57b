//! Following nodes across edits.
//!
//! Tracking a node stamps it with a marker annotation owned by the original
//! red node. Later trees are searched for whatever now carries the marker.

use rustc_hash::FxHashMap;

use crate::annotation::{Annotatable, SyntaxAnnotation};
use crate::edit::ElementKey;
use crate::{NodeOrToken, SyntaxError, SyntaxNode, SyntaxResult};

/// Annotation kind of tracking markers.
pub const TRACKING_KIND: &str = "arbor.tracking";

impl SyntaxNode {
    /// A copy of this tree in which every node of `nodes` is tracked.
    pub fn track_nodes(&self, nodes: impl IntoIterator<Item = Self>) -> SyntaxResult<Self> {
        let mut markers = FxHashMap::default();
        let mut tracked = Vec::new();
        for node in nodes {
            if node.root() != self.root() {
                return Err(SyntaxError::contract("tracked nodes must belong to this tree"));
            }
            markers.insert(ElementKey::node(&node), node.tracking_marker().clone());
            tracked.push(node);
        }
        self.replace_nodes(tracked, |original, rewritten| {
            match markers.get(&ElementKey::node(original)) {
                Some(marker) => rewritten.with_additional_annotations([marker.clone()]),
                None => rewritten,
            }
        })
    }

    /// The nodes of this tree that `original` has become, in tree order.
    ///
    /// `original` may come from the tree that was tracked or from any tree
    /// derived from it.
    pub fn current_nodes(&self, original: &Self) -> Vec<Self> {
        let markers = tracking_markers(original);
        if markers.is_empty() {
            return Vec::new();
        }
        self.annotated_nodes_and_tokens_of_kind(TRACKING_KIND)
            .into_iter()
            .filter_map(NodeOrToken::into_node)
            .filter(|node| markers.iter().any(|marker| node.has_annotation(marker)))
            .collect()
    }

    /// The single node `original` has become, `None` if it is gone.
    /// Several candidates are a contract error.
    pub fn current_node(&self, original: &Self) -> SyntaxResult<Option<Self>> {
        let mut nodes = self.current_nodes(original);
        if nodes.len() > 1 {
            return Err(SyntaxError::contract(format!(
                "the tracked node now appears {} times",
                nodes.len()
            )));
        }
        Ok(nodes.pop())
    }

    /// Whether this node carries a tracking marker.
    pub fn is_tracked(&self) -> bool {
        let annotations = self.green().annotations();
        annotations.iter().any(|annotation| annotation.kind() == Some(TRACKING_KIND))
    }
}

fn tracking_markers(node: &SyntaxNode) -> Vec<SyntaxAnnotation> {
    if let Some(marker) = node.existing_tracking_marker() {
        return vec![marker.clone()];
    }
    node.green()
        .annotations()
        .iter()
        .filter(|annotation| annotation.kind() == Some(TRACKING_KIND))
        .cloned()
        .collect()
}

//! A compact binary encoding of green trees.
//!
//! The stream starts with a header (magic, version, strategy, nesting depth
//! and the tree's parse options) followed by the root node in preorder.
//! Nodes and tokens are numbered as they are first written; a repeat
//! occurrence is written as a back reference to that number. Integers are
//! unsigned LEB128.
//!
//! Trees nested deeper than [`SerializeOptions::recursion_limit`] are written
//! and read with an explicit stack instead of recursion. Both strategies
//! produce the same element stream. The reader only recurses when the depth
//! declared in the header is within its own limit.

mod reader;
mod writer;

use std::io::{self, Read, Write};

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::green::{GreenNode, NodeFlags};
use crate::{Language, NodeOrToken, SyntaxNode, SyntaxTree};

const MAGIC: [u8; 4] = *b"ARBR";
const VERSION: u8 = 1;

const TAG_EMPTY: u8 = 0;
const TAG_NODE: u8 = 1;
const TAG_TOKEN: u8 = 2;
const TAG_BACK_REF: u8 = 3;

const TOKEN_MISSING: u8 = 1 << 0;
const TOKEN_HAS_VALUE: u8 = 1 << 1;

const TRIVIA_TEXT: u8 = 0;
const TRIVIA_STRUCTURE: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Strategy {
    Recursive = 0,
    Iterative = 1,
}

impl Strategy {
    fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Recursive),
            1 => Some(Self::Iterative),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Deepest nesting written and read by plain recursion.
    pub recursion_limit: usize,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self { recursion_limit: 512 }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("not a serialized syntax tree")]
    BadMagic,
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),
    #[error("unknown encoding strategy {0}")]
    UnknownStrategy(u8),
    #[error("malformed tree data: {0}")]
    Malformed(&'static str),
    #[error("back reference to element {0}, which has not been read yet")]
    BadBackReference(u32),
}

/// Depth of the deepest element under `root`, counting structured trivia.
fn nesting_depth(root: &GreenNode) -> usize {
    let mut deepest = 0;
    let mut seen: FxHashMap<usize, usize> = FxHashMap::default();
    let mut stack = vec![(root, 1)];
    while let Some((node, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        let shallower = seen.get(&node.addr()).is_some_and(|&before| before >= depth);
        if shallower {
            continue;
        }
        seen.insert(node.addr(), depth);
        for slot in node.slots().iter().flatten() {
            match slot {
                NodeOrToken::Node(child) => stack.push((child, depth + 1)),
                NodeOrToken::Token(token) => {
                    if !token.flags().contains(NodeFlags::CONTAINS_STRUCTURED_TRIVIA) {
                        deepest = deepest.max(depth + 1);
                        continue;
                    }
                    let pieces = token.leading().pieces().iter().chain(token.trailing().pieces());
                    for structure in pieces.filter_map(|piece| piece.structure()) {
                        stack.push((structure, depth + 2));
                    }
                }
            }
        }
    }
    deepest
}

impl SyntaxNode {
    /// Writes the subtree under this node along with its tree's parse options.
    pub fn serialize_to(&self, writer: impl Write) -> io::Result<()> {
        self.serialize_with(writer, SerializeOptions::default())
    }

    pub fn serialize_with(&self, writer: impl Write, options: SerializeOptions) -> io::Result<()> {
        let depth = nesting_depth(self.green());
        let strategy = if depth > options.recursion_limit {
            tracing::debug!(depth, limit = options.recursion_limit, "serializing iteratively");
            Strategy::Iterative
        } else {
            Strategy::Recursive
        };
        let parse_options = self.options().cloned().unwrap_or_default();
        let mut encoder = writer::Encoder::new(writer);
        encoder.header(strategy, depth, &parse_options)?;
        match strategy {
            Strategy::Recursive => encoder.node(self.green())?,
            Strategy::Iterative => encoder.node_iterative(self.green())?,
        }
        encoder.finish()
    }
}

impl SyntaxTree {
    pub fn serialize_to(&self, writer: impl Write) -> io::Result<()> {
        self.root().serialize_to(writer)
    }

    pub fn serialize_with(&self, writer: impl Write, options: SerializeOptions) -> io::Result<()> {
        self.root().serialize_with(writer, options)
    }
}

/// Reads a tree written by [`SyntaxNode::serialize_to`].
///
/// Diagnostics and annotations come back with the same contents. Annotations
/// keep their identity within this process.
pub fn deserialize_from(
    reader: impl Read,
    language: &'static dyn Language,
) -> Result<SyntaxTree, DecodeError> {
    deserialize_with(reader, language, SerializeOptions::default())
}

/// Reads a tree, recursing only when the declared depth is within `options`.
pub fn deserialize_with(
    reader: impl Read,
    language: &'static dyn Language,
    options: SerializeOptions,
) -> Result<SyntaxTree, DecodeError> {
    let mut decoder = reader::Decoder::new(reader);
    let header = decoder.header()?;
    let root = match header.strategy {
        Strategy::Recursive if header.depth <= options.recursion_limit => {
            decoder.root(header.depth)?
        }
        Strategy::Recursive => {
            tracing::debug!(
                depth = header.depth,
                limit = options.recursion_limit,
                "declared depth over the limit, reading iteratively"
            );
            decoder.root_iterative()?
        }
        Strategy::Iterative => decoder.root_iterative()?,
    };
    Ok(SyntaxTree::new(root, language, header.options))
}

#[cfg(test)]
mod tests {
    use arbor_errors::Diagnostic;
    use text_size::{TextRange, TextSize};

    use super::*;
    use crate::annotation::SyntaxAnnotation;
    use crate::green::{GreenElement, GreenToken, GreenTrivia, GreenTriviaList, TriviaKind};
    use crate::red::{ParseOptions, SourceKind};
    use crate::{PlainLanguage, SyntaxKind};

    const WORD: SyntaxKind = SyntaxKind(40);
    const HASH: SyntaxKind = SyntaxKind(41);
    const DIRECTIVE: SyntaxKind = SyntaxKind(42);
    const ITEM: SyntaxKind = SyntaxKind(43);

    fn word(text: &str) -> GreenElement {
        let space = GreenTriviaList::new([GreenTrivia::new(TriviaKind::Whitespace, " ")]);
        GreenToken::new(WORD, text).with_trailing(space).into()
    }

    fn sample() -> GreenNode {
        let directive = GreenNode::new(
            DIRECTIVE,
            [Some(GreenToken::new(HASH, "#").into()), Some(word("region"))],
        );
        let leading = GreenTriviaList::new([
            GreenTrivia::structured(TriviaKind::Directive, directive),
            GreenTrivia::new(TriviaKind::EndOfLine, "\n"),
        ]);
        let first = GreenToken::new(WORD, "a").with_leading(leading).with_value("A");
        let diagnostic =
            Diagnostic::error(7, "expected a word", TextRange::empty(TextSize::new(0)));
        let missing = GreenToken::missing(WORD).with_diagnostics(vec![diagnostic]);
        GreenNode::new(
            ITEM,
            [Some(first.into()), None, Some(missing.into()), Some(word("b"))],
        )
    }

    #[track_caller]
    fn round_trip(node: &SyntaxNode, options: SerializeOptions) -> SyntaxTree {
        let mut bytes = Vec::new();
        node.serialize_with(&mut bytes, options).unwrap();
        deserialize_from(bytes.as_slice(), &PlainLanguage).unwrap()
    }

    #[test]
    fn round_trip_keeps_everything() {
        let annotation = SyntaxAnnotation::with_data("rename", "x");
        let green = sample().with_annotations(vec![annotation.clone()]);
        let options = ParseOptions::default()
            .with_kind(SourceKind::Script)
            .with_language_version(3)
            .with_preprocessor_symbols(["DEBUG"]);
        let tree = SyntaxTree::new(green, &PlainLanguage, options.clone());

        let copy = round_trip(tree.root(), SerializeOptions::default());
        assert_eq!(copy.text(), "#region \na b ");
        assert_eq!(copy.options(), &options);
        assert!(copy.is_equivalent_to(&tree, false));
        assert_eq!(
            copy.root().green().debug_dump(&PlainLanguage),
            tree.root().green().debug_dump(&PlainLanguage)
        );

        let root = copy.root().green();
        assert_eq!(root.annotations(), &[annotation]);
        assert!(root.slot(1).is_none());
        assert!(root.slot(2).unwrap().is_missing());
        assert_eq!(root.slot(2).unwrap().diagnostics()[0].message(), "expected a word");
        let first = root.slot(0).unwrap().as_token().unwrap();
        assert_eq!(first.value(), Some("A"));
        assert!(first.leading().pieces()[0].has_structure());
    }

    #[test]
    fn shared_elements_stay_shared() {
        let shared = word("x");
        let green = GreenNode::new(ITEM, [Some(shared.clone()), Some(shared)]);
        let node = SyntaxNode::new_root(green, &PlainLanguage);

        let copy = round_trip(&node, SerializeOptions::default());
        let root = copy.root().green();
        assert!(root.slot(0).unwrap().ptr_eq(root.slot(1).unwrap()));
    }

    #[test]
    fn deep_trees_are_written_iteratively() {
        let mut green = GreenNode::new(ITEM, [Some(word("leaf"))]);
        for _ in 0..1000 {
            green = GreenNode::new(ITEM, [Some(green.into()), Some(word("x"))]);
        }
        let node = SyntaxNode::new_root(green, &PlainLanguage);

        let mut bytes = Vec::new();
        node.serialize_to(&mut bytes).unwrap();
        assert_eq!(bytes[5], Strategy::Iterative as u8);

        let copy = deserialize_from(bytes.as_slice(), &PlainLanguage).unwrap();
        assert_eq!(copy.text(), node.text());
        assert!(copy.root().is_equivalent_to(&node, false));
    }

    #[test]
    fn declared_depth_over_the_reader_limit_reads_iteratively() {
        let mut green = GreenNode::new(ITEM, [Some(word("leaf"))]);
        for _ in 0..300 {
            green = GreenNode::new(ITEM, [Some(green.into()), Some(word("x"))]);
        }
        let node = SyntaxNode::new_root(green, &PlainLanguage);

        let mut bytes = Vec::new();
        node.serialize_with(&mut bytes, SerializeOptions { recursion_limit: 10_000 }).unwrap();
        assert_eq!(bytes[5], Strategy::Recursive as u8);

        let strict = SerializeOptions { recursion_limit: 16 };
        let copy = deserialize_with(bytes.as_slice(), &PlainLanguage, strict).unwrap();
        assert!(copy.root().is_equivalent_to(&node, false));
    }

    #[test]
    fn nesting_depth_visits_shared_subtrees_once() {
        let mut green = GreenNode::new(ITEM, [Some(word("leaf"))]);
        for _ in 0..64 {
            green = GreenNode::new(ITEM, [Some(green.clone().into()), Some(green.into())]);
        }
        assert_eq!(nesting_depth(&green), 66);
    }

    #[test]
    fn both_strategies_read_structured_trivia() {
        let node = SyntaxNode::new_root(sample(), &PlainLanguage);
        let iterative = round_trip(&node, SerializeOptions { recursion_limit: 1 });
        let recursive = round_trip(&node, SerializeOptions::default());
        assert_eq!(iterative.text(), recursive.text());
        assert!(iterative.is_equivalent_to(&recursive, false));
    }

    #[test]
    fn rejects_foreign_data() {
        let error = deserialize_from(&b"NOPE\x01"[..], &PlainLanguage).unwrap_err();
        assert!(matches!(error, DecodeError::BadMagic));

        let error = deserialize_from(&b"ARBR\x09"[..], &PlainLanguage).unwrap_err();
        assert!(matches!(error, DecodeError::UnsupportedVersion(9)));

        let error = deserialize_from(&b"ARBR\x01\x07"[..], &PlainLanguage).unwrap_err();
        assert!(matches!(error, DecodeError::UnknownStrategy(7)));
    }

    #[test]
    fn rejects_dangling_back_references() {
        // header: recursive, depth 2, regular source, version 0, no symbols
        let mut bytes = b"ARBR\x01\x00\x02\x00\x00\x00".to_vec();
        // a node with one slot holding a reference to element 5
        bytes.extend_from_slice(&[TAG_NODE, 43, 1, 0, 0, TAG_BACK_REF, 5]);
        let error = deserialize_from(bytes.as_slice(), &PlainLanguage).unwrap_err();
        assert!(matches!(error, DecodeError::BadBackReference(5)));
    }

    #[test]
    fn truncated_input_is_an_io_error() {
        let node = SyntaxNode::new_root(sample(), &PlainLanguage);
        let mut bytes = Vec::new();
        node.serialize_to(&mut bytes).unwrap();
        bytes.truncate(bytes.len() - 3);
        let error = deserialize_from(bytes.as_slice(), &PlainLanguage).unwrap_err();
        assert!(matches!(error, DecodeError::Io(_)));
    }
}

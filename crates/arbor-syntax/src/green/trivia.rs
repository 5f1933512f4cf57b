use std::fmt;
use std::sync::{Arc, Weak};

use arbor_errors::Diagnostic;
use text_size::{TextLen, TextSize};
use triomphe::ThinArc;

use super::{GreenExtra, GreenNode, NodeFlags};
use crate::annotation::SyntaxAnnotation;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TriviaKind {
    Whitespace,
    EndOfLine,
    SingleLineComment,
    MultiLineComment,
    DocComment,
    Directive,
    SkippedTokens,
    DisabledText,
}

impl TriviaKind {
    pub const ALL: [Self; 8] = [
        Self::Whitespace,
        Self::EndOfLine,
        Self::SingleLineComment,
        Self::MultiLineComment,
        Self::DocComment,
        Self::Directive,
        Self::SkippedTokens,
        Self::DisabledText,
    ];

    pub fn from_u8(raw: u8) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Trivia that ends the line it is on.
    pub fn ends_line(self) -> bool {
        matches!(self, Self::EndOfLine | Self::SingleLineComment)
    }

    pub fn is_comment(self) -> bool {
        matches!(self, Self::SingleLineComment | Self::MultiLineComment | Self::DocComment)
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub enum TriviaContent {
    Text(Box<str>),
    Structure(GreenNode),
}

struct GreenTriviaData {
    kind: TriviaKind,
    width: TextSize,
    flags: NodeFlags,
    content: TriviaContent,
    extra: Option<Box<GreenExtra>>,
}

/// A single piece of trivia, either plain text or a parsed structure.
#[derive(Clone)]
pub struct GreenTrivia {
    ptr: Arc<GreenTriviaData>,
}

impl GreenTrivia {
    pub fn new(kind: TriviaKind, text: impl Into<Box<str>>) -> Self {
        let text = text.into();
        Self::alloc(kind, text.text_len(), TriviaContent::Text(text), None)
    }

    pub fn structured(kind: TriviaKind, structure: GreenNode) -> Self {
        Self::alloc(kind, structure.full_width(), TriviaContent::Structure(structure), None)
    }

    fn alloc(
        kind: TriviaKind,
        width: TextSize,
        content: TriviaContent,
        extra: Option<Box<GreenExtra>>,
    ) -> Self {
        let mut flags = match &content {
            TriviaContent::Text(_) => NodeFlags::NONE,
            TriviaContent::Structure(node) => node.flags() | NodeFlags::CONTAINS_STRUCTURED_TRIVIA,
        };
        flags.set(NodeFlags::CONTAINS_DIRECTIVES, kind == TriviaKind::Directive);
        flags.set(NodeFlags::CONTAINS_SKIPPED_TEXT, kind == TriviaKind::SkippedTokens);
        if let Some(extra) = &extra {
            flags |= extra.flags();
        }
        Self { ptr: Arc::new(GreenTriviaData { kind, width, flags, content, extra }) }
    }

    #[inline]
    pub fn kind(&self) -> TriviaKind {
        self.ptr.kind
    }

    #[inline]
    pub fn width(&self) -> TextSize {
        self.ptr.width
    }

    #[inline]
    pub fn flags(&self) -> NodeFlags {
        self.ptr.flags
    }

    #[inline]
    pub fn content(&self) -> &TriviaContent {
        &self.ptr.content
    }

    /// The text of an unstructured trivia.
    pub fn text(&self) -> Option<&str> {
        match &self.ptr.content {
            TriviaContent::Text(text) => Some(text),
            TriviaContent::Structure(_) => None,
        }
    }

    pub fn structure(&self) -> Option<&GreenNode> {
        match &self.ptr.content {
            TriviaContent::Text(_) => None,
            TriviaContent::Structure(node) => Some(node),
        }
    }

    #[inline]
    pub fn has_structure(&self) -> bool {
        self.structure().is_some()
    }

    pub fn write_text(&self, out: &mut String) {
        match &self.ptr.content {
            TriviaContent::Text(text) => out.push_str(text),
            TriviaContent::Structure(node) => node.write_text(out),
        }
    }

    pub fn full_text(&self) -> String {
        let mut text = String::new();
        self.write_text(&mut text);
        text
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
        Self::alloc(self.kind(), self.width(), self.ptr.content.clone(), extra)
    }

    #[must_use]
    pub fn with_annotations(&self, annotations: Vec<SyntaxAnnotation>) -> Self {
        let extra = GreenExtra::new(self.diagnostics().to_vec(), annotations);
        Self::alloc(self.kind(), self.width(), self.ptr.content.clone(), extra)
    }

    #[must_use]
    pub fn with_structure(&self, structure: GreenNode) -> Self {
        let extra = self.ptr.extra.clone();
        Self::alloc(self.kind(), structure.full_width(), TriviaContent::Structure(structure), extra)
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.ptr, &other.ptr)
    }

    #[inline]
    pub(crate) fn addr(&self) -> usize {
        &*self.ptr as *const GreenTriviaData as usize
    }

    pub(crate) fn downgrade(&self) -> WeakGreenTrivia {
        WeakGreenTrivia { ptr: Arc::downgrade(&self.ptr) }
    }
}

/// A handle that does not keep its element alive.
pub(crate) struct WeakGreenTrivia {
    ptr: Weak<GreenTriviaData>,
}

impl WeakGreenTrivia {
    pub(crate) fn upgrade(&self) -> Option<GreenTrivia> {
        self.ptr.upgrade().map(|ptr| GreenTrivia { ptr })
    }
}

impl PartialEq for GreenTrivia {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for GreenTrivia {}

impl std::hash::Hash for GreenTrivia {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for GreenTrivia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenTrivia")
            .field("kind", &self.kind())
            .field("text", &self.full_text())
            .finish()
    }
}

/// An immutable run of trivia stored behind a single thin pointer.
#[derive(Clone, Default)]
pub struct GreenTriviaList {
    ptr: Option<ThinArc<TextSize, GreenTrivia>>,
}

impl GreenTriviaList {
    pub fn new(pieces: impl IntoIterator<Item = GreenTrivia>) -> Self {
        let pieces: Vec<GreenTrivia> = pieces.into_iter().collect();
        if pieces.is_empty() {
            return Self::empty();
        }
        let total_len = pieces.iter().map(GreenTrivia::width).sum();
        Self { ptr: Some(ThinArc::from_header_and_iter(total_len, pieces.into_iter())) }
    }

    pub const fn empty() -> Self {
        Self { ptr: None }
    }

    pub fn width(&self) -> TextSize {
        match self.ptr {
            None => TextSize::new(0),
            Some(ref ptr) => ptr.header.header,
        }
    }

    pub fn pieces(&self) -> &[GreenTrivia] {
        match &self.ptr {
            None => &[],
            Some(ptr) => &ptr.slice,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pieces().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    pub fn flags(&self) -> NodeFlags {
        self.pieces().iter().fold(NodeFlags::NONE, |flags, piece| flags | piece.flags())
    }

    pub fn contains_end_of_line(&self) -> bool {
        self.pieces().iter().any(|piece| piece.kind().ends_line())
    }

    pub fn write_text(&self, out: &mut String) {
        for piece in self.pieces() {
            piece.write_text(out);
        }
    }

    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        match (self.is_empty(), other.is_empty()) {
            (true, _) => other.clone(),
            (_, true) => self.clone(),
            _ => Self::new(self.pieces().iter().chain(other.pieces()).cloned()),
        }
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.ptr, &other.ptr) {
            (None, None) => true,
            (Some(this), Some(other)) => std::ptr::eq(&this.header, &other.header),
            _ => false,
        }
    }
}

impl PartialEq for GreenTriviaList {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for GreenTriviaList {}

impl fmt::Debug for GreenTriviaList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenTriviaList")
            .field("pieces", &self.pieces())
            .field("width", &self.width())
            .finish()
    }
}

impl FromIterator<GreenTrivia> for GreenTriviaList {
    fn from_iter<I: IntoIterator<Item = GreenTrivia>>(iter: I) -> Self {
        Self::new(iter)
    }
}

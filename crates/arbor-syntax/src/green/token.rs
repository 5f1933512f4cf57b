use std::fmt;
use std::sync::{Arc, Weak};

use arbor_errors::Diagnostic;
use text_size::{TextLen, TextSize};

use super::{GreenExtra, GreenTriviaList, NodeFlags};
use crate::SyntaxKind;
use crate::annotation::SyntaxAnnotation;

struct GreenTokenData {
    kind: SyntaxKind,
    flags: NodeFlags,
    text: Box<str>,
    value: Option<Box<str>>,
    leading: GreenTriviaList,
    trailing: GreenTriviaList,
    extra: Option<Box<GreenExtra>>,
}

/// A leaf: token text plus the trivia on either side of it.
#[derive(Clone)]
pub struct GreenToken {
    ptr: Arc<GreenTokenData>,
}

impl GreenToken {
    pub fn new(kind: SyntaxKind, text: impl Into<Box<str>>) -> Self {
        let empty = GreenTriviaList::empty();
        Self::with_parts(kind, text.into(), None, empty.clone(), empty)
    }

    /// A zero-width placeholder for a token the parser expected but did not find.
    pub fn missing(kind: SyntaxKind) -> Self {
        Self::alloc(
            GreenTokenData {
                kind,
                flags: NodeFlags::NONE,
                text: "".into(),
                value: None,
                leading: GreenTriviaList::empty(),
                trailing: GreenTriviaList::empty(),
                extra: None,
            },
            false,
        )
    }

    pub fn with_parts(
        kind: SyntaxKind,
        text: Box<str>,
        value: Option<Box<str>>,
        leading: GreenTriviaList,
        trailing: GreenTriviaList,
    ) -> Self {
        Self::alloc(
            GreenTokenData {
                kind,
                flags: NodeFlags::NONE,
                text,
                value,
                leading,
                trailing,
                extra: None,
            },
            true,
        )
    }

    fn alloc(mut data: GreenTokenData, present: bool) -> Self {
        let mut flags = data.leading.flags() | data.trailing.flags();
        flags.set(NodeFlags::IS_NOT_MISSING, present);
        if let Some(extra) = &data.extra {
            flags |= extra.flags();
        }
        data.flags = flags;
        Self { ptr: Arc::new(data) }
    }

    fn rebuild(&self, f: impl FnOnce(&mut GreenTokenData)) -> Self {
        let mut data = GreenTokenData {
            kind: self.ptr.kind,
            flags: NodeFlags::NONE,
            text: self.ptr.text.clone(),
            value: self.ptr.value.clone(),
            leading: self.ptr.leading.clone(),
            trailing: self.ptr.trailing.clone(),
            extra: self.ptr.extra.clone(),
        };
        f(&mut data);
        Self::alloc(data, !self.is_missing())
    }

    #[inline]
    pub fn kind(&self) -> SyntaxKind {
        self.ptr.kind
    }

    #[inline]
    pub fn flags(&self) -> NodeFlags {
        self.ptr.flags
    }

    /// The token text without trivia.
    #[inline]
    pub fn text(&self) -> &str {
        &self.ptr.text
    }

    /// The decoded value of a literal, when it differs from the text.
    #[inline]
    pub fn value(&self) -> Option<&str> {
        self.ptr.value.as_deref()
    }

    /// The value if one was decoded, the text otherwise.
    pub fn value_text(&self) -> &str {
        self.value().unwrap_or_else(|| self.text())
    }

    #[inline]
    pub fn leading(&self) -> &GreenTriviaList {
        &self.ptr.leading
    }

    #[inline]
    pub fn trailing(&self) -> &GreenTriviaList {
        &self.ptr.trailing
    }

    #[inline]
    pub fn width(&self) -> TextSize {
        self.ptr.text.text_len()
    }

    #[inline]
    pub fn full_width(&self) -> TextSize {
        self.leading().width() + self.width() + self.trailing().width()
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        !self.flags().contains(NodeFlags::IS_NOT_MISSING)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        GreenExtra::diagnostics_of(&self.ptr.extra)
    }

    pub fn annotations(&self) -> &[SyntaxAnnotation] {
        GreenExtra::annotations_of(&self.ptr.extra)
    }

    #[must_use]
    pub fn with_leading(&self, leading: GreenTriviaList) -> Self {
        self.rebuild(|data| data.leading = leading)
    }

    #[must_use]
    pub fn with_trailing(&self, trailing: GreenTriviaList) -> Self {
        self.rebuild(|data| data.trailing = trailing)
    }

    #[must_use]
    pub fn with_trivia(&self, leading: GreenTriviaList, trailing: GreenTriviaList) -> Self {
        self.rebuild(|data| {
            data.leading = leading;
            data.trailing = trailing;
        })
    }

    #[must_use]
    pub fn with_value(&self, value: impl Into<Box<str>>) -> Self {
        let value = value.into();
        self.rebuild(|data| data.value = Some(value))
    }

    #[must_use]
    pub fn with_diagnostics(&self, diagnostics: Vec<Diagnostic>) -> Self {
        let annotations = self.annotations().to_vec();
        self.rebuild(|data| data.extra = GreenExtra::new(diagnostics, annotations))
    }

    #[must_use]
    pub fn with_annotations(&self, annotations: Vec<SyntaxAnnotation>) -> Self {
        let diagnostics = self.diagnostics().to_vec();
        self.rebuild(|data| data.extra = GreenExtra::new(diagnostics, annotations))
    }

    pub fn write_text(&self, out: &mut String) {
        self.leading().write_text(out);
        out.push_str(self.text());
        self.trailing().write_text(out);
    }

    pub fn full_text(&self) -> String {
        let mut text = String::new();
        self.write_text(&mut text);
        text
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.ptr, &other.ptr)
    }

    #[inline]
    pub(crate) fn addr(&self) -> usize {
        &*self.ptr as *const GreenTokenData as usize
    }

    pub(crate) fn downgrade(&self) -> WeakGreenToken {
        WeakGreenToken { ptr: Arc::downgrade(&self.ptr) }
    }
}

/// A handle that does not keep its element alive.
pub(crate) struct WeakGreenToken {
    ptr: Weak<GreenTokenData>,
}

impl WeakGreenToken {
    pub(crate) fn upgrade(&self) -> Option<GreenToken> {
        self.ptr.upgrade().map(|ptr| GreenToken { ptr })
    }
}

impl PartialEq for GreenToken {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for GreenToken {}

impl std::hash::Hash for GreenToken {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for GreenToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenToken")
            .field("kind", &self.kind())
            .field("text", &self.text())
            .field("full_width", &self.full_width())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::green::{GreenTrivia, TriviaKind};

    fn whitespace(text: &str) -> GreenTriviaList {
        GreenTriviaList::new([GreenTrivia::new(TriviaKind::Whitespace, text)])
    }

    #[test]
    fn token_text() {
        let token = GreenToken::new(SyntaxKind(20), "val")
            .with_trivia(whitespace("\n\t "), whitespace(" \t\t"));

        assert_eq!("\n\t val \t\t", token.full_text());
        assert_eq!("val", token.text());
        assert_eq!(u32::from(token.full_width()), 9);
        assert_eq!(u32::from(token.width()), 3);
    }

    #[test]
    fn missing_tokens_have_no_width() {
        let token = GreenToken::missing(SyntaxKind(20));
        assert!(token.is_missing());
        assert_eq!(token.full_width(), TextSize::new(0));

        let present = GreenToken::new(SyntaxKind(20), "");
        assert!(!present.is_missing());
    }

    #[test]
    fn literal_value_overrides_text() {
        let token = GreenToken::new(SyntaxKind(21), "10L").with_value("10l");
        assert_eq!(token.text(), "10L");
        assert_eq!(token.value_text(), "10l");
        assert!(!token.with_leading(whitespace(" ")).is_missing());
    }
}

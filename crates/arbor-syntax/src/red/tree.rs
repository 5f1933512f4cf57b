use std::fmt;
use std::sync::Arc;

use arbor_errors::Diagnostic;
use text_size::TextSize;

use super::SyntaxNode;
use crate::Language;
use crate::green::GreenNode;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SourceKind {
    #[default]
    Regular,
    Script,
    Interactive,
}

impl SourceKind {
    pub fn from_u8(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => Self::Regular,
            1 => Self::Script,
            2 => Self::Interactive,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Options a tree was parsed with. Derived trees carry the same options.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ParseOptions {
    pub kind: SourceKind,
    pub language_version: u16,
    pub preprocessor_symbols: Vec<Box<str>>,
}

impl ParseOptions {
    #[must_use]
    pub fn with_kind(mut self, kind: SourceKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_language_version(mut self, version: u16) -> Self {
        self.language_version = version;
        self
    }

    #[must_use]
    pub fn with_preprocessor_symbols<S: Into<Box<str>>>(
        mut self,
        symbols: impl IntoIterator<Item = S>,
    ) -> Self {
        self.preprocessor_symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_defined(&self, symbol: &str) -> bool {
        self.preprocessor_symbols.iter().any(|defined| &**defined == symbol)
    }
}

/// A parsed root together with the options it was parsed with.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SyntaxTree {
    root: SyntaxNode,
}

impl SyntaxTree {
    pub fn new(green: GreenNode, language: &'static dyn Language, options: ParseOptions) -> Self {
        let root = SyntaxNode::with_root_info(
            green,
            TextSize::new(0),
            language,
            Some(Arc::new(options)),
            None,
        );
        Self { root }
    }

    pub(crate) fn from_root(root: SyntaxNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }

    pub fn language(&self) -> &'static dyn Language {
        self.root.language()
    }

    pub fn options(&self) -> &ParseOptions {
        static DEFAULT: std::sync::LazyLock<ParseOptions> =
            std::sync::LazyLock::new(ParseOptions::default);
        self.root.options().unwrap_or(&DEFAULT)
    }

    /// A new tree for `green` sharing this tree's language and options.
    #[must_use]
    pub fn with_root(&self, green: GreenNode) -> Self {
        Self { root: self.root.new_root_like(green) }
    }

    /// Same root, different options.
    #[must_use]
    pub fn with_options(&self, options: ParseOptions) -> Self {
        Self::new(self.root.green().clone(), self.language(), options)
    }

    pub fn text(&self) -> String {
        self.root.text()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.root.diagnostics()
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("root", &self.root)
            .field("options", self.options())
            .finish()
    }
}

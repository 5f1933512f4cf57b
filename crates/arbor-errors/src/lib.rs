use std::fmt::{self, Display};

pub use annotate_snippets::Renderer;
use annotate_snippets::{Level, Snippet};
pub use text_size::TextRange;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Hidden,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn from_u8(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => Self::Hidden,
            1 => Self::Info,
            2 => Self::Warning,
            3 => Self::Error,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    fn level(self) -> Level {
        match self {
            Self::Hidden => Level::Note,
            Self::Info => Level::Info,
            Self::Warning => Level::Warning,
            Self::Error => Level::Error,
        }
    }
}

/// A diagnostic attached to a syntax element.
///
/// The range is relative to the start of the element's full span while the
/// diagnostic rides on a green element, and absolute once it is reported
/// from a positioned node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    severity: Severity,
    code: u32,
    message: Box<str>,
    range: TextRange,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        code: u32,
        message: impl Into<Box<str>>,
        range: TextRange,
    ) -> Self {
        Self { severity, code, message: message.into(), range }
    }

    pub fn error(code: u32, message: impl Into<Box<str>>, range: TextRange) -> Self {
        Self::new(Severity::Error, code, message, range)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    #[must_use]
    pub fn with_range(&self, range: TextRange) -> Self {
        Self { range, ..self.clone() }
    }

    pub fn render(&self, renderer: &Renderer, path: &str, text: &str) -> String {
        let level = self.severity.level();
        let code = format!("AR{:04}", self.code);
        let message = level.title(&self.message).id(&code).snippet(
            Snippet::source(text)
                .origin(path)
                .annotation(level.span(self.range.into()).label("here"))
                .fold(true),
        );
        renderer.render(message).to_string()
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AR{:04} {:?}: {}", self.code, self.range, self.message)
    }
}

#[cfg(test)]
mod tests {
    use text_size::TextSize;

    use super::*;

    #[test]
    fn display_uses_code_and_range() {
        let range = TextRange::at(TextSize::new(3), TextSize::new(1));
        let diagnostic = Diagnostic::error(7, "expected ';'", range);
        assert_eq!(diagnostic.to_string(), "AR0007 3..4: expected ';'");
    }

    #[test]
    fn render_points_at_range() {
        let text = "val x = \n";
        let range = TextRange::at(TextSize::new(8), TextSize::new(1));
        let diagnostic = Diagnostic::error(1, "expected expression", range);
        let rendered = diagnostic.render(&Renderer::plain(), "main.ar", text);

        assert!(rendered.contains("error[AR0001]: expected expression"), "{rendered}");
        assert!(rendered.contains("main.ar"), "{rendered}");
    }

    #[test]
    fn severity_round_trips_through_u8() {
        for severity in [Severity::Hidden, Severity::Info, Severity::Warning, Severity::Error] {
            assert_eq!(Severity::from_u8(severity.as_u8()), Some(severity));
        }
        assert_eq!(Severity::from_u8(9), None);
    }
}

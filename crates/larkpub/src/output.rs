//! Terminal output for CLI commands.
//!
//! Status lines go to stderr; stdout carries only machine-readable data, so
//! `larkpub blocks` can be piped.

use console::{Style, Term};

/// Kind of status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Plain,
    Success,
    Warning,
    Error,
    Heading,
}

impl Tone {
    fn style(self) -> Option<Style> {
        match self {
            Self::Plain => None,
            Self::Success => Some(Style::new().green()),
            Self::Warning => Some(Style::new().yellow()),
            Self::Error => Some(Style::new().red()),
            Self::Heading => Some(Style::new().cyan().bold()),
        }
    }
}

/// Status and data writer.
pub(crate) struct Output {
    status: Term,
    data: Term,
}

impl Output {
    pub(crate) fn new() -> Self {
        Self {
            status: Term::stderr(),
            data: Term::stdout(),
        }
    }

    fn line(&self, tone: Tone, msg: &str) {
        let line = match tone.style() {
            Some(style) => style.apply_to(msg).to_string(),
            None => msg.to_owned(),
        };
        // Best effort.
        let _ = self.status.write_line(&line);
    }

    pub(crate) fn info(&self, msg: &str) {
        self.line(Tone::Plain, msg);
    }

    pub(crate) fn success(&self, msg: &str) {
        self.line(Tone::Success, msg);
    }

    pub(crate) fn warning(&self, msg: &str) {
        self.line(Tone::Warning, msg);
    }

    pub(crate) fn error(&self, msg: &str) {
        self.line(Tone::Error, msg);
    }

    /// Section heading, e.g. a dry-run banner.
    pub(crate) fn highlight(&self, msg: &str) {
        self.line(Tone::Heading, msg);
    }

    /// Write `text` to stdout, uncolored.
    pub(crate) fn data(&self, text: &str) -> std::io::Result<()> {
        self.data.write_line(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_lines_are_unstyled() {
        assert!(Tone::Plain.style().is_none());
        assert!(Tone::Error.style().is_some());
    }
}

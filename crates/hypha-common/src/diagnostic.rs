use serde::Serialize;
use std::fmt;

use crate::location::SourceLocation;

/// How serious a diagnostic is. Errors disqualify whatever they attach to
/// (a parse, an analysis pass) from further use; warnings never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single diagnostic: the one shape used by every producer in the
/// pipeline (lexer, parser, analyzer, interpreter). What distinguishes a
/// lex/parse error from a semantic error from a runtime fault is which
/// stage produced it, not a different Rust type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: SourceLocation,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, location: SourceLocation) -> Self {
        Diagnostic { severity: Severity::Error, message: message.into(), location }
    }

    pub fn warning(message: impl Into<String>, location: SourceLocation) -> Self {
        Diagnostic { severity: Severity::Warning, message: message.into(), location }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} at {}", self.severity, self.message, self.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::error("unexpected token", SourceLocation::new(None, 3, 9));
        assert_eq!(d.to_string(), "error: unexpected token at 3:9");
    }

    #[test]
    fn severity_distinguishes_error_from_warning() {
        let e = Diagnostic::error("x", SourceLocation::synthetic());
        let w = Diagnostic::warning("y", SourceLocation::synthetic());
        assert!(e.is_error());
        assert!(!w.is_error());
    }
}

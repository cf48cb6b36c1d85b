//! The diagnostic sink.
//!
//! Diagnostics are additive: compilation continues past recoverable errors,
//! substituting an `unreachable` node for the failed expression so the emitted
//! block structure stays well-formed. Consumers should treat the presence of
//! any error diagnostic as compilation failure.

/// Broad category of a [`Diagnostic`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum DiagnosticKind {
    /// A named file or element could not be found.
    Lookup,
    /// The program shape is invalid (missing body, misplaced `break`, ...).
    Structure,
    /// An operation is invalid for the types involved.
    Types,
    /// A construct whose lowering is not implemented.
    Unsupported,
    /// A legal but dangerous operation.
    Unsafe,
}

/// Severity of a [`Diagnostic`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Severity {
    /// The output module should not be used.
    Error,
    /// Informational only.
    Warning,
}

/// A single message produced during compilation.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// The category of the message.
    pub kind: DiagnosticKind,
    /// Whether the message invalidates the output.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{severity}: {}", self.message)
    }
}

/// An ordered collection of [`Diagnostic`]s.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub(crate) fn error(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        log::debug!("error: {message}");
        self.items.push(Diagnostic {
            kind,
            severity: Severity::Error,
            message,
        });
    }

    pub(crate) fn warning(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        log::debug!("warning: {message}");
        self.items.push(Diagnostic {
            kind,
            severity: Severity::Warning,
            message,
        });
    }

    /// Whether any error-severity diagnostic was recorded.
    pub fn has_errors(&self) -> bool {
        self.items
            .iter()
            .any(|d| matches!(d.severity, Severity::Error))
    }

    /// The recorded diagnostics, in emission order.
    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    /// Number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no diagnostic was recorded.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

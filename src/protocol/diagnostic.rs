//! Side-channel notices for recoverable stream anomalies.

use std::fmt::{Display, Formatter};

/// How urgently a [`Diagnostic`] should be looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Input was skipped or degraded; the stream stays in sync.
    Warning,
    /// The gateway reported a resource failure.
    Critical,
}

/// A recoverable anomaly observed while parsing.
///
/// Diagnostics never interrupt the stream: the next well-formed line parses
/// normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity of the anomaly.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Offending input text, for inspection.
    pub raw: String,
}

impl Diagnostic {
    /// Build a [`Severity::Warning`] diagnostic.
    #[must_use]
    pub fn warning(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// Build a [`Severity::Critical`] diagnostic.
    #[must_use]
    pub fn critical(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            severity: Severity::Critical,
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// Emit this diagnostic through `tracing` at the matching level.
    pub(crate) fn log(&self, source: &'static str) {
        match self.severity {
            Severity::Warning => {
                tracing::warn!(source, raw = %self.raw, "{}", self.message);
            }
            Severity::Critical => {
                tracing::error!(source, raw = %self.raw, "{}", self.message);
            }
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        write!(f, "{level}: {}", self.message)
    }
}

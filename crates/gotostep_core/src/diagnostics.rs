//! Structured diagnostics and the sinks that receive them.
//!
//! Nothing in the core prints or logs directly. Components describe what they
//! skipped or guessed as a [`Diagnostic`] and hand it to whatever
//! [`DiagnosticSink`] the caller supplied.

use serde::Serialize;
use std::fmt;
use std::sync::Mutex;

use crate::config::Config;
use crate::step::KindFilter;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Warning,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Diagnostic {
    /// A declaration whose argument list never closed.
    UnbalancedDeclaration { file: String, line: usize },
    /// A declaration with no usable quoted pattern.
    MissingPattern { file: String, line: usize },
    /// No `def` within the lookahead window below a declaration.
    MissingFunction { file: String, line: usize },
    UnreadableFile { file: String, reason: String },
    PatternCompile { pattern: String, reason: String },
    UnknownStepKind { keyword: String },
    NoMatch {
        text: String,
        kind: KindFilter,
        checked: usize,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::UnknownStepKind { .. } | Diagnostic::UnreadableFile { .. } => {
                Severity::Warning
            }
            _ => Severity::Debug,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnbalancedDeclaration { file, line } => write!(
                f,
                "could not extract balanced parentheses from declaration at {file}:{line}"
            ),
            Diagnostic::MissingPattern { file, line } => {
                write!(f, "could not extract step pattern at {file}:{line}")
            }
            Diagnostic::MissingFunction { file, line } => {
                write!(f, "no function follows declaration at {file}:{line}")
            }
            Diagnostic::UnreadableFile { file, reason } => {
                write!(f, "skipping {file}: {reason}")
            }
            Diagnostic::PatternCompile { pattern, reason } => {
                write!(f, "pattern {pattern:?} skipped for template matching: {reason}")
            }
            Diagnostic::UnknownStepKind { keyword } => {
                write!(f, "unknown step type {keyword:?}, defaulting to \"given\"")
            }
            Diagnostic::NoMatch {
                text,
                kind,
                checked,
            } => write!(
                f,
                "no matching step definition for {text:?} (step type: {kind}, checked {checked} definitions)"
            ),
        }
    }
}

/// Receives diagnostics emitted by the indexer, matcher and resolver.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`. Debug-level ones are dropped unless
/// debug logs are enabled in the [`Config`].
#[derive(Clone, Debug, Default)]
pub struct TracingSink {
    show_debug_logs: bool,
}

impl TracingSink {
    pub fn new(config: &Config) -> Self {
        TracingSink {
            show_debug_logs: config.show_debug_logs,
        }
    }
}

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Warning => tracing::warn!("{diagnostic}"),
            Severity::Debug if self.show_debug_logs => tracing::debug!("{diagnostic}"),
            Severity::Debug => {}
        }
    }
}

/// Keeps diagnostics in memory so a host can display them later.
#[derive(Debug, Default)]
pub struct CollectingSink {
    show_debug_logs: bool,
    collected: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new(config: &Config) -> Self {
        CollectingSink {
            show_debug_logs: config.show_debug_logs,
            collected: Mutex::new(Vec::new()),
        }
    }

    /// Collects every diagnostic regardless of severity.
    pub fn verbose() -> Self {
        CollectingSink {
            show_debug_logs: true,
            collected: Mutex::new(Vec::new()),
        }
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        match self.collected.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        if diagnostic.severity() == Severity::Debug && !self.show_debug_logs {
            return;
        }
        match self.collected.lock() {
            Ok(mut guard) => guard.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&self, _diagnostic: Diagnostic) {}
}

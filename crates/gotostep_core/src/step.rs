use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declaration-time step type. `And`/`But` never appear here.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Given,
    When,
    Then,
}

impl StepKind {
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "given" => Some(StepKind::Given),
            "when" => Some(StepKind::When),
            "then" => Some(StepKind::Then),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Given => "given",
            StepKind::When => "when",
            StepKind::Then => "then",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind a query is allowed to match after normalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindFilter {
    /// Only definitions declared with this kind are eligible.
    Only(StepKind),
    /// `And`/`But`: any definition kind is eligible.
    Any,
}

impl KindFilter {
    pub fn admits(&self, kind: StepKind) -> bool {
        match self {
            KindFilter::Any => true,
            KindFilter::Only(k) => *k == kind,
        }
    }

    /// True when the filter names `kind` itself rather than the wildcard.
    pub fn is_exact(&self, kind: StepKind) -> bool {
        matches!(self, KindFilter::Only(k) if *k == kind)
    }
}

impl fmt::Display for KindFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KindFilter::Only(k) => k.fmt(f),
            KindFilter::Any => f.write_str("and"),
        }
    }
}

impl Serialize for KindFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One discovered step implementation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    pub kind: StepKind,
    /// Pattern as declared, with wrapper escapes already removed.
    pub pattern: String,
    pub file: String,
    /// Zero-based line of the implementing `def`.
    pub line: usize,
    pub function: String,
    /// Set only on the scored copies handed out by the matcher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_quality: Option<f64>,
}

impl StepDefinition {
    pub fn scored(&self, quality: f64) -> Self {
        StepDefinition {
            match_quality: Some(quality),
            ..self.clone()
        }
    }
}

/// A definition file's content, as handed over by the host.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        SourceFile {
            path: path.into(),
            text: text.into(),
        }
    }
}

static FEATURE_STEP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(given|when|then|and|but)\s+(.+)$").unwrap());

/// A single feature-file step to resolve.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepQuery {
    /// Keyword as written (`Given`, `and`, ...). Normalized by the matcher.
    pub keyword: String,
    pub text: String,
}

impl StepQuery {
    pub fn new(keyword: impl Into<String>, text: impl Into<String>) -> Self {
        StepQuery {
            keyword: keyword.into(),
            text: text.into(),
        }
    }

    /// Parses a feature-file line such as `  And the user logs in`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let cap = FEATURE_STEP_RE.captures(line.trim_end_matches('\r'))?;
        Some(StepQuery {
            keyword: cap[1].to_string(),
            text: cap[2].to_string(),
        })
    }
}

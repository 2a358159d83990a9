//! Ranks step definitions against a feature step.
//!
//! Each eligible definition is scored by the first strategy that accepts it:
//!
//! | strategy        | quality            |
//! |-----------------|--------------------|
//! | exact           | [`EXACT_QUALITY`]  |
//! | templated regex | [`TEMPLATE_QUALITY`] |
//! | token similarity| `similarity * 3`   |
//!
//! Candidates are ordered by kind (exact kind before wildcard eligibility),
//! then quality. The sort is stable, so index order breaks remaining ties.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;

use crate::config::Config;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{Error, Result};
use crate::step::{KindFilter, StepDefinition, StepKind};

pub const EXACT_QUALITY: f64 = 5.0;
pub const TEMPLATE_QUALITY: f64 = 4.0;
pub const SIMILARITY_WEIGHT: f64 = 3.0;

// `{name}`, `{name:d}`, `{:d}`; optionally wrapped in matching quotes.
static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""\{[^{}\s]*\}"|'\{[^{}\s]*\}'|\{[^{}\s]*\}|\s+"#).unwrap());

static PLACEHOLDER_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^}]+\}").unwrap());

const WILDCARD: &str = ".*";

/// Maps a written keyword to the kinds it may match.
///
/// `and`/`but` match any kind. Anything unrecognised is treated as `given`
/// after a warning.
pub fn normalize_kind(keyword: &str, sink: &dyn DiagnosticSink) -> KindFilter {
    let lower = keyword.trim().to_lowercase();
    if lower == "and" || lower == "but" {
        return KindFilter::Any;
    }
    if let Some(kind) = StepKind::from_keyword(&lower) {
        return KindFilter::Only(kind);
    }
    sink.emit(Diagnostic::UnknownStepKind {
        keyword: keyword.to_string(),
    });
    KindFilter::Only(StepKind::Given)
}

/// Compiles a templated pattern into an anchored, case-insensitive regex.
pub fn compile_template(pattern: &str) -> Result<Regex> {
    let mut re = String::from("^");
    let mut last = 0;
    for m in PLACEHOLDER_RE.find_iter(pattern) {
        re.push_str(&regex::escape(&pattern[last..m.start()]));
        let token = m.as_str();
        if token.starts_with('"') {
            re.push_str(r#""([^"]*)""#);
        } else if token.starts_with('\'') {
            re.push_str(r"'([^']*)'");
        } else if token.starts_with('{') {
            re.push_str(r"([\w.-]+)");
        } else {
            re.push_str(r"\s+");
        }
        last = m.end();
    }
    re.push_str(&regex::escape(&pattern[last..]));
    re.push('$');

    RegexBuilder::new(&re)
        .case_insensitive(true)
        .build()
        .map_err(|source| Error::PatternCompile {
            pattern: pattern.to_string(),
            source,
        })
}

/// Token overlap between a step's text and a pattern, in `0.0..=1.0`.
///
/// Placeholders are rewritten to `.*` before tokenizing. Only a token that is
/// exactly `.*` acts as a wildcard; `"{name}"` or `{x},` are compared as
/// literal text like any other token.
pub fn token_similarity(text: &str, pattern: &str) -> f64 {
    let text = text.trim().to_lowercase();
    let pattern = pattern.trim().to_lowercase();
    let pattern = PLACEHOLDER_TOKEN_RE.replace_all(&pattern, WILDCARD);
    let text_tokens: Vec<&str> = text.split_whitespace().collect();
    let pattern_tokens: Vec<&str> = pattern.split_whitespace().collect();

    let max = text_tokens.len().max(pattern_tokens.len());
    if max == 0 {
        return 0.0;
    }

    let mut matches = 0usize;
    let mut cursor = 0usize;
    for p in &pattern_tokens {
        let Some(t) = text_tokens.get(cursor) else {
            break;
        };
        cursor += 1;
        if *p == WILDCARD || t == p || t.contains(p) || p.contains(t) {
            matches += 1;
        }
    }
    matches as f64 / max as f64
}

/// Scores one definition against `text`, or `None` if no strategy accepts it.
pub fn score(
    text: &str,
    def: &StepDefinition,
    config: &Config,
    sink: &dyn DiagnosticSink,
) -> Option<f64> {
    if text.to_lowercase() == def.pattern.to_lowercase() {
        return Some(EXACT_QUALITY);
    }

    match compile_template(&def.pattern) {
        Ok(re) if re.is_match(text) => return Some(TEMPLATE_QUALITY),
        Ok(_) => {}
        Err(e) => sink.emit(Diagnostic::PatternCompile {
            pattern: def.pattern.clone(),
            reason: e.to_string(),
        }),
    }

    let similarity = token_similarity(text, &def.pattern);
    (similarity >= config.similarity_threshold).then_some(similarity * SIMILARITY_WEIGHT)
}

/// Returns scored copies of every definition matching `text`, best first.
pub fn rank(
    text: &str,
    filter: KindFilter,
    definitions: &[StepDefinition],
    config: &Config,
    sink: &dyn DiagnosticSink,
) -> Vec<StepDefinition> {
    let mut pool: Vec<StepDefinition> = definitions
        .iter()
        .filter(|d| filter.admits(d.kind))
        .filter_map(|d| score(text, d, config, sink).map(|q| d.scored(q)))
        .collect();

    pool.sort_by(|a, b| {
        let kind_a = filter.is_exact(a.kind);
        let kind_b = filter.is_exact(b.kind);
        kind_b.cmp(&kind_a).then_with(|| {
            let qa = a.match_quality.unwrap_or(0.0);
            let qb = b.match_quality.unwrap_or(0.0);
            qb.partial_cmp(&qa).unwrap_or(Ordering::Equal)
        })
    });
    pool
}

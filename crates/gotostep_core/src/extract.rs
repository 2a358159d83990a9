//! Pulls step patterns out of Python decorator source text.
//!
//! This is not a Python parser. It recovers just enough structure from
//! `@given(...)`/`@when(...)`/`@then(...)` lines to index them: the argument
//! text between the balanced parentheses and the first quoted literal in it.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::step::StepKind;

/// `@given(`, `@When (` ... at the start of a line.
pub(crate) static DECLARATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*@(given|when|then)\s*\(").unwrap());

static WRAPPER_CALL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"parse\s*\(").unwrap());

// First single- or double-quoted argument right after `parse(`, escapes allowed.
static WRAPPER_LITERAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)parse\s*\(\s*(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)')"#).unwrap()
});

static DOUBLE_QUOTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)"((?:[^"\\]|\\.)*)""#).unwrap());

static SINGLE_QUOTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)'((?:[^'\\]|\\.)*)'").unwrap());

static ANY_QUOTED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)"([^"]*)"|'([^']*)'"#).unwrap());

/// A step declaration recovered from source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub kind: StepKind,
    pub pattern: String,
    /// The pattern came from a `parse(...)` wrapper call.
    pub wrapped: bool,
}

/// Returns the text between the parenthesis at `open_paren` on
/// `lines[start_line]` and its matching close.
///
/// Continuation lines are trimmed and joined with a single space. Returns
/// `None` when the input ends before the parentheses balance.
pub fn extract_balanced_argument(
    lines: &[&str],
    start_line: usize,
    open_paren: usize,
) -> Option<String> {
    let mut segment = lines.get(start_line)?.get(open_paren + 1..)?;
    let mut line = start_line;
    let mut depth = 1usize;
    let mut text = String::new();

    loop {
        for (i, c) in segment.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        text.push_str(&segment[..i]);
                        return Some(text);
                    }
                }
                _ => {}
            }
        }
        text.push_str(segment);
        line += 1;
        segment = lines.get(line)?.trim();
        text.push(' ');
    }
}

/// True when the argument text contains a `parse(...)`-style wrapper call.
pub fn is_wrapper_call(text: &str) -> bool {
    WRAPPER_CALL_RE.is_match(text)
}

/// Returns the first quoted literal in `text`, escapes left intact.
///
/// Inside a `parse(...)` wrapper the call's first argument wins even when the
/// literal mixes quote styles. An empty string means nothing was quotable.
pub fn extract_first_quoted_literal(text: &str) -> String {
    if is_wrapper_call(text) {
        if let Some(cap) = WRAPPER_LITERAL_RE.captures(text) {
            if let Some(m) = cap.get(1).or_else(|| cap.get(2)) {
                return m.as_str().to_string();
            }
        }
    }

    for re in [&*DOUBLE_QUOTED_RE, &*SINGLE_QUOTED_RE] {
        if let Some(cap) = re.captures(text) {
            return cap[1].to_string();
        }
    }

    ANY_QUOTED_RE
        .captures(text)
        .and_then(|cap| cap.get(1).or_else(|| cap.get(2)))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Undoes the `\"`, `\'`, `\{` and `\}` escapes used inside wrapper patterns.
pub fn normalize_pattern_escapes(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if matches!(next, '"' | '\'' | '{' | '}') {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Extracts the declaration starting on `lines[line]`.
///
/// Returns `Ok(None)` when the line is not a step declaration at all.
pub fn extract_declaration(lines: &[&str], line: usize) -> Result<Option<Declaration>> {
    let Some(source) = lines.get(line) else {
        return Ok(None);
    };
    let Some(cap) = DECLARATION_RE.captures(source) else {
        return Ok(None);
    };
    let Some(kind) = StepKind::from_keyword(&cap[1]) else {
        return Ok(None);
    };
    // The marker regex ends on the open parenthesis.
    let open_paren = cap.get(0).map_or(0, |m| m.end() - 1);

    let argument = extract_balanced_argument(lines, line, open_paren)
        .ok_or(Error::UnbalancedArgument { line })?;

    let wrapped = is_wrapper_call(&argument);
    let mut pattern = extract_first_quoted_literal(&argument);
    if pattern.is_empty() {
        return Err(Error::MissingPattern { line });
    }
    if wrapped {
        pattern = normalize_pattern_escapes(&pattern);
    }

    Ok(Some(Declaration {
        kind,
        pattern,
        wrapped,
    }))
}

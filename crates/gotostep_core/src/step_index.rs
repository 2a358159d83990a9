use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::Config;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::Error;
use crate::extract::{extract_declaration, DECLARATION_RE};
use crate::step::{SourceFile, StepDefinition, StepKind};

static FUNCTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"def\s+([a-zA-Z0-9_]+)\s*\(").unwrap());

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total: usize,
    pub by_kind: ByKind,
    pub ambiguous: usize,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ByKind {
    pub given: usize,
    pub when: usize,
    pub then: usize,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StepIndex {
    pub steps: Vec<StepDefinition>,
    pub stats: Stats,
}

impl StepIndex {
    /// Builds an index over `steps` without reordering them: enumeration
    /// order is the final tie-break when ranking.
    pub fn from_steps(steps: Vec<StepDefinition>) -> Self {
        let mut stats = Stats {
            total: steps.len(),
            ..Stats::default()
        };
        for s in &steps {
            match s.kind {
                StepKind::Given => stats.by_kind.given += 1,
                StepKind::When => stats.by_kind.when += 1,
                StepKind::Then => stats.by_kind.then += 1,
            }
        }
        // Ambiguity: same (kind, pattern) appears more than once
        let mut map: HashMap<(StepKind, &str), usize> = HashMap::new();
        for s in &steps {
            *map.entry((s.kind, s.pattern.as_str())).or_insert(0) += 1;
        }
        stats.ambiguous = map.values().filter(|&&c| c > 1).count();
        StepIndex { steps, stats }
    }

    pub fn definitions(&self) -> &[StepDefinition] {
        &self.steps
    }
}

/// Indexes every step declaration in `files`, in file order then line order.
pub fn build_index(files: &[SourceFile], config: &Config, sink: &dyn DiagnosticSink) -> StepIndex {
    let mut out = Vec::new();
    for sf in files {
        index_file(sf, config, sink, &mut out);
    }
    StepIndex::from_steps(out)
}

/// Appends the definitions declared in one file to `out`.
pub fn index_file(
    sf: &SourceFile,
    config: &Config,
    sink: &dyn DiagnosticSink,
    out: &mut Vec<StepDefinition>,
) {
    let lines: Vec<&str> = sf.text.lines().collect();

    for (i, line) in lines.iter().enumerate() {
        if !DECLARATION_RE.is_match(line) {
            continue;
        }
        let decl = match extract_declaration(&lines, i) {
            Ok(Some(decl)) => decl,
            Ok(None) => continue,
            Err(Error::UnbalancedArgument { line }) => {
                sink.emit(Diagnostic::UnbalancedDeclaration {
                    file: sf.path.clone(),
                    line,
                });
                continue;
            }
            Err(_) => {
                sink.emit(Diagnostic::MissingPattern {
                    file: sf.path.clone(),
                    line: i,
                });
                continue;
            }
        };

        let Some((function, line)) = find_function_after(&lines, i, config.lookahead_lines)
        else {
            sink.emit(Diagnostic::MissingFunction {
                file: sf.path.clone(),
                line: i,
            });
            continue;
        };

        out.push(StepDefinition {
            kind: decl.kind,
            pattern: decl.pattern,
            file: sf.path.clone(),
            line,
            function,
            match_quality: None,
        });
    }
}

/// Finds the first `def name(` within `window` lines below `decl_line`,
/// skipping blanks, comments and docstring openers.
fn find_function_after(lines: &[&str], decl_line: usize, window: usize) -> Option<(String, usize)> {
    let end = lines.len().min(decl_line.saturating_add(window));
    for (j, raw) in lines.iter().enumerate().take(end).skip(decl_line + 1) {
        let line = raw.trim();
        if line.is_empty()
            || line.starts_with('#')
            || line.starts_with("\"\"\"")
            || line.starts_with("'''")
        {
            continue;
        }
        if let Some(cap) = FUNCTION_RE.captures(line) {
            return Some((cap[1].to_string(), j));
        }
    }
    None
}

/// Locates `def <function>` in live file content.
///
/// `hint` is the indexed line and is kept while it still declares the
/// function. Otherwise the file is searched again by name, first for
/// `def name(` and then for any line containing `def name`, taking the match
/// closest to `hint` so that repeated names such as `step_impl` stay put.
pub fn locate_function_line(text: &str, function: &str, hint: usize) -> Option<usize> {
    let lines: Vec<&str> = text.lines().collect();
    [format!("def {function}("), format!("def {function}")]
        .iter()
        .find_map(|needle| {
            if lines.get(hint).is_some_and(|l| l.contains(needle.as_str())) {
                Some(hint)
            } else {
                nearest(&lines, needle, hint)
            }
        })
}

fn nearest(lines: &[&str], needle: &str, hint: usize) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.contains(needle))
        .map(|(i, _)| i)
        .min_by_key(|&i| i.abs_diff(hint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{CollectingSink, NullSink};
    use pretty_assertions::assert_eq;

    fn index(text: &str) -> StepIndex {
        build_index(&[SourceFile::new("steps/demo.py", text)], &Config::default(), &NullSink)
    }

    #[test]
    fn indexes_plain_and_wrapped_declarations() {
        let idx = index(
            r#"from pytest_bdd import given, when, then, parsers

@given("a user is logged in")
def user_is_logged_in():
    pass

@when(parsers.parse("the user uploads a file \"{filename}\" of size {size:d} KB"))
def user_uploads_file(filename, size):
    pass
"#,
        );
        assert_eq!(idx.stats.total, 2);
        assert_eq!(idx.steps[0].kind, StepKind::Given);
        assert_eq!(idx.steps[0].pattern, "a user is logged in");
        assert_eq!(idx.steps[0].function, "user_is_logged_in");
        assert_eq!(idx.steps[0].line, 3);
        assert_eq!(idx.steps[1].pattern, "the user uploads a file \"{filename}\" of size {size:d} KB");
        assert_eq!(idx.steps[1].line, 7);
    }

    #[test]
    fn stacked_declarations_share_a_function() {
        let idx = index(
            r#"@then("the file is processed successfully")
@then("the file is processed successfully")
def file_processed_successfully():
    pass
"#,
        );
        assert_eq!(idx.stats.total, 2);
        assert_eq!(idx.stats.ambiguous, 1);
        assert!(idx.steps.iter().all(|s| s.line == 2));
    }

    #[test]
    fn multi_line_declaration_and_skipped_lines() {
        let idx = index(
            r#"@when(
    parsers.parse(
        "they log in as {name}"
    )
)
# a comment

"""docstring opener"""
async def log_in(name):
    pass
"#,
        );
        assert_eq!(idx.stats.total, 1);
        assert_eq!(idx.steps[0].pattern, "they log in as {name}");
        assert_eq!(idx.steps[0].function, "log_in");
        assert_eq!(idx.steps[0].line, 8);
    }

    #[test]
    fn declarations_without_function_in_window_are_dropped() {
        let mut text = String::from("@given(\"far away\")\n");
        for _ in 0..25 {
            text.push_str("x = 1\n");
        }
        text.push_str("def too_late():\n    pass\n");
        let sink = CollectingSink::verbose();
        let idx = build_index(&[SourceFile::new("a.py", text)], &Config::default(), &sink);
        assert_eq!(idx.stats.total, 0);
        assert_eq!(
            sink.take(),
            vec![Diagnostic::MissingFunction {
                file: "a.py".into(),
                line: 0
            }]
        );
    }

    #[test]
    fn bad_declarations_are_skipped_not_fatal() {
        let sink = CollectingSink::verbose();
        let files = [
            SourceFile::new("a.py", "@given(PATTERN)\ndef a():\n    pass\n"),
            SourceFile::new("b.py", "@when(\"unclosed\"\n"),
            SourceFile::new("c.py", "@then(\"fine\")\ndef c():\n    pass\n"),
        ];
        let idx = build_index(&files, &Config::default(), &sink);
        assert_eq!(idx.stats.total, 1);
        assert_eq!(idx.steps[0].function, "c");
        let diags = sink.take();
        assert_eq!(diags.len(), 2);
        assert!(matches!(diags[0], Diagnostic::MissingPattern { .. }));
        assert!(matches!(diags[1], Diagnostic::UnbalancedDeclaration { .. }));
    }

    #[test]
    fn order_follows_file_enumeration() {
        let files = [
            SourceFile::new("z.py", "@given(\"z\")\ndef z():\n    pass\n"),
            SourceFile::new("a.py", "@given(\"a\")\ndef a():\n    pass\n"),
        ];
        let idx = build_index(&files, &Config::default(), &NullSink);
        let order: Vec<&str> = idx.steps.iter().map(|s| s.file.as_str()).collect();
        assert_eq!(order, vec!["z.py", "a.py"]);
    }

    #[test]
    fn locate_function_line_prefers_call_form() {
        let text = "def step_loginator():\n    pass\ndef step_login(ctx):\n    pass\n";
        assert_eq!(locate_function_line(text, "step_login", 0), Some(2));
        assert_eq!(locate_function_line("def step_login :\n", "step_login", 5), Some(0));
        assert_eq!(locate_function_line(text, "missing", 0), None);
    }

    #[test]
    fn locate_function_line_keeps_a_valid_hint() {
        let text = "@given(\"a\")\ndef step_impl(context):\n    pass\n\n@when(\"b\")\ndef step_impl(context):\n    pass\n";
        assert_eq!(locate_function_line(text, "step_impl", 5), Some(5));
        assert_eq!(locate_function_line(text, "step_impl", 1), Some(1));
        // A line inserted above: the nearest `step_impl` wins.
        let shifted = format!("import os\n{text}");
        assert_eq!(locate_function_line(&shifted, "step_impl", 5), Some(6));
    }
}

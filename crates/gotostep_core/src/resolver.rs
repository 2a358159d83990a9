use serde::Serialize;

use crate::config::Config;
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::error::Result;
use crate::matcher::{normalize_kind, rank};
use crate::step::{KindFilter, SourceFile, StepDefinition, StepQuery};
use crate::step_index::{build_index, index_file, locate_function_line, StepIndex};
use crate::workspace::Workspace;

/// Details of a query that matched nothing, for display by the host.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NoMatch {
    pub text: String,
    pub kind: KindFilter,
    /// Number of definitions in the index that was searched.
    pub checked: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    Found(StepDefinition),
    NoMatch(NoMatch),
}

impl Resolution {
    pub fn into_definition(self) -> Option<StepDefinition> {
        match self {
            Resolution::Found(def) => Some(def),
            Resolution::NoMatch(_) => None,
        }
    }

    pub fn definition(&self) -> Option<&StepDefinition> {
        match self {
            Resolution::Found(def) => Some(def),
            Resolution::NoMatch(_) => None,
        }
    }
}

/// A resolved step line in a feature document.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct StepAnnotation {
    /// Zero-based line in the feature document.
    pub line: usize,
    pub definition: StepDefinition,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Navigation {
    /// The host was asked to reveal `file:line`.
    Revealed { definition: StepDefinition, line: usize },
    /// The requested feature line is not a step.
    NotAStep,
    NoMatch(NoMatch),
}

/// Ties the indexer and matcher together for a host.
///
/// Holds no index of its own: every call works only from its arguments.
#[derive(Debug)]
pub struct Resolver<S = TracingSink> {
    config: Config,
    sink: S,
}

impl Resolver<TracingSink> {
    pub fn new(config: Config) -> Self {
        let sink = TracingSink::new(&config);
        Resolver { config, sink }
    }
}

impl Default for Resolver<TracingSink> {
    fn default() -> Self {
        Resolver::new(Config::default())
    }
}

impl<S: DiagnosticSink> Resolver<S> {
    pub fn with_sink(config: Config, sink: S) -> Self {
        Resolver { config, sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn build_index(&self, files: &[SourceFile]) -> StepIndex {
        build_index(files, &self.config, &self.sink)
    }

    /// Indexes the workspace's files in enumeration order. Files that cannot
    /// be read are reported and skipped.
    pub fn build_index_from_workspace(&self, workspace: &dyn Workspace) -> Result<StepIndex> {
        let mut steps = Vec::new();
        for path in workspace.enumerate_files()? {
            match workspace.read_file(&path) {
                Ok(text) => {
                    let sf = SourceFile { path, text };
                    index_file(&sf, &self.config, &self.sink, &mut steps);
                }
                Err(e) => self.sink.emit(Diagnostic::UnreadableFile {
                    file: path,
                    reason: e.to_string(),
                }),
            }
        }
        tracing::debug!(steps = steps.len(), "built step index");
        Ok(StepIndex::from_steps(steps))
    }

    /// All candidates for `query`, best first.
    pub fn rank(
        &self,
        query: &StepQuery,
        definitions: &[StepDefinition],
    ) -> Vec<StepDefinition> {
        let filter = normalize_kind(&query.keyword, &self.sink);
        rank(&query.text, filter, definitions, &self.config, &self.sink)
    }

    pub fn resolve(&self, query: &StepQuery, definitions: &[StepDefinition]) -> Resolution {
        let filter = normalize_kind(&query.keyword, &self.sink);
        let best = rank(&query.text, filter, definitions, &self.config, &self.sink)
            .into_iter()
            .next();
        match best {
            Some(def) => Resolution::Found(def),
            None => {
                let miss = NoMatch {
                    text: query.text.clone(),
                    kind: filter,
                    checked: definitions.len(),
                };
                self.sink.emit(Diagnostic::NoMatch {
                    text: miss.text.clone(),
                    kind: miss.kind,
                    checked: miss.checked,
                });
                Resolution::NoMatch(miss)
            }
        }
    }

    /// Resolves a raw feature line; `None` when it is not a step line.
    pub fn resolve_line(
        &self,
        line: &str,
        definitions: &[StepDefinition],
    ) -> Option<Resolution> {
        StepQuery::parse_line(line).map(|q| self.resolve(&q, definitions))
    }

    /// One annotation per step line of `document` that resolves.
    pub fn annotate_document(
        &self,
        document: &str,
        definitions: &[StepDefinition],
    ) -> Vec<StepAnnotation> {
        document
            .lines()
            .enumerate()
            .filter_map(|(line, text)| {
                let definition = self.resolve_line(text, definitions)?.into_definition()?;
                Some(StepAnnotation { line, definition })
            })
            .collect()
    }

    /// Resolves line `line` of `feature` and asks the workspace to reveal the
    /// implementing function.
    ///
    /// The indexed line is checked against the file's current content and
    /// looked up again by name when it no longer declares the function. It is
    /// used unchanged when the name is not found at all.
    pub fn navigate(
        &self,
        workspace: &dyn Workspace,
        feature: &str,
        line: usize,
    ) -> Result<Navigation> {
        let Some(query) = feature.lines().nth(line).and_then(StepQuery::parse_line) else {
            return Ok(Navigation::NotAStep);
        };

        let index = self.build_index_from_workspace(workspace)?;
        let definition = match self.resolve(&query, index.definitions()) {
            Resolution::Found(def) => def,
            Resolution::NoMatch(miss) => return Ok(Navigation::NoMatch(miss)),
        };

        let current = workspace.read_file(&definition.file)?;
        let target = locate_function_line(&current, &definition.function, definition.line)
            .unwrap_or(definition.line);
        workspace.reveal_location(&definition.file, target)?;
        tracing::debug!(
            file = %definition.file,
            line = target,
            function = %definition.function,
            "revealed step definition"
        );

        Ok(Navigation::Revealed {
            definition,
            line: target,
        })
    }
}

/// Resolves `query` against `definitions` with the default configuration.
pub fn resolve(query: &StepQuery, definitions: &[StepDefinition]) -> Option<StepDefinition> {
    Resolver::new(Config::default()).resolve(query, definitions).into_definition()
}

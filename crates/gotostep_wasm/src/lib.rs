//! JSON-in / JSON-out bindings for editor hosts running gotostep as WASM.
//!
//! Every entry point returns a JSON string. Malformed input produces
//! `{"error": "..."}` instead of trapping.

use gotostep_core::{
    CollectingSink, Config, Diagnostic, NoMatch, Resolution, Resolver, SourceFile, StepAnnotation,
    StepDefinition, StepIndex, StepQuery,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct IndexRequest {
    files: Vec<SourceFile>,
    #[serde(default)]
    config: Config,
}

#[derive(Serialize)]
struct IndexResponse {
    #[serde(flatten)]
    index: StepIndex,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Deserialize)]
struct ResolveRequest {
    /// A raw feature line such as `And the user logs in`.
    #[serde(default)]
    line: Option<String>,
    #[serde(default)]
    keyword: Option<String>,
    #[serde(default)]
    text: Option<String>,
    steps: Vec<StepDefinition>,
    #[serde(default)]
    config: Config,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveResponse {
    definition: Option<StepDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    no_match: Option<NoMatch>,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Deserialize)]
struct AnnotateRequest {
    feature: String,
    steps: Vec<StepDefinition>,
    #[serde(default)]
    config: Config,
}

#[derive(Serialize)]
struct AnnotateResponse {
    annotations: Vec<StepAnnotation>,
    diagnostics: Vec<Diagnostic>,
}

fn resolver(config: Config) -> Resolver<CollectingSink> {
    let sink = CollectingSink::new(&config);
    Resolver::with_sink(config, sink)
}

fn error_json(message: impl std::fmt::Display) -> String {
    serde_json::json!({ "error": message.to_string() }).to_string()
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| error_json(e))
}

/// Builds a step index from `{"files": [{"path", "text"}], "config"?}`.
#[wasm_bindgen]
pub fn build_step_index(input: &str) -> String {
    let req: IndexRequest = match serde_json::from_str(input) {
        Ok(r) => r,
        Err(e) => return error_json(e),
    };
    let r = resolver(req.config);
    let index = r.build_index(&req.files);
    to_json(&IndexResponse {
        index,
        diagnostics: r.sink().take(),
    })
}

/// Resolves one step against previously indexed `steps`.
#[wasm_bindgen]
pub fn resolve_step(input: &str) -> String {
    let req: ResolveRequest = match serde_json::from_str(input) {
        Ok(r) => r,
        Err(e) => return error_json(e),
    };
    let query = match (req.line, req.keyword, req.text) {
        (Some(line), _, _) => match StepQuery::parse_line(&line) {
            Some(q) => q,
            None => return error_json(format!("not a step line: {line:?}")),
        },
        (None, Some(keyword), Some(text)) => StepQuery::new(keyword, text),
        _ => return error_json("expected \"line\" or both \"keyword\" and \"text\""),
    };

    let r = resolver(req.config);
    let (definition, no_match) = match r.resolve(&query, &req.steps) {
        Resolution::Found(def) => (Some(def), None),
        Resolution::NoMatch(miss) => (None, Some(miss)),
    };
    to_json(&ResolveResponse {
        definition,
        no_match,
        diagnostics: r.sink().take(),
    })
}

/// Resolves every step line of a feature document, for inline annotations.
#[wasm_bindgen]
pub fn annotate_feature(input: &str) -> String {
    let req: AnnotateRequest = match serde_json::from_str(input) {
        Ok(r) => r,
        Err(e) => return error_json(e),
    };
    let r = resolver(req.config);
    let annotations = r.annotate_document(&req.feature, &req.steps);
    to_json(&AnnotateResponse {
        annotations,
        diagnostics: r.sink().take(),
    })
}

/// Returns the core crate version.
#[wasm_bindgen]
pub fn version() -> String {
    gotostep_core::version().to_string()
}

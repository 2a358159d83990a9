use cucumber::gherkin::Step;
use cucumber::{given, then, when};
use gotostep_core::{build_index, Config, NullSink, SourceFile, StepKind};

use super::docstring;
use crate::CoreWorld;

fn kind(s: &str) -> StepKind {
    StepKind::from_keyword(s).expect("given, when or then")
}

#[given(regex = r#"^a step file "([^"]+)" with content:$"#)]
async fn a_step_file_with_content(world: &mut CoreWorld, path: String, step: &Step) {
    world.files.push(SourceFile::new(path, docstring(step)));
}

#[when("the step index is built")]
async fn the_step_index_is_built(world: &mut CoreWorld) {
    world.index = Some(build_index(&world.files, &Config::default(), &NullSink));
}

#[then(regex = r"^the index contains (\d+) steps?$")]
async fn index_contains(world: &mut CoreWorld, n: usize) {
    let idx = world.index.as_ref().expect("index built");
    assert_eq!(idx.stats.total, n);
}

#[then(regex = r"^the index ambiguous count is (\d+)$")]
async fn ambiguous_count(world: &mut CoreWorld, n: usize) {
    let idx = world.index.as_ref().expect("index built");
    assert_eq!(idx.stats.ambiguous, n);
}

#[then(regex = r#"^there is a "(given|when|then)" step "(.*)" implemented by "([^"]+)" at line (\d+)$"#)]
async fn there_is_step(world: &mut CoreWorld, k: String, pattern: String, function: String, line: usize) {
    let idx = world.index.as_ref().expect("index built");
    let target = kind(&k);
    let found = idx
        .steps
        .iter()
        .any(|s| s.kind == target && s.pattern == pattern && s.function == function && s.line == line);
    assert!(found, "expected step not found: {k} {pattern:?} {function}@{line} in {:#?}", idx.steps);
}

#[then(regex = r#"^step (\d+) is implemented by "([^"]+)"$"#)]
async fn step_n_is_implemented_by(world: &mut CoreWorld, n: usize, function: String) {
    let idx = world.index.as_ref().expect("index built");
    assert_eq!(idx.steps[n - 1].function, function);
}

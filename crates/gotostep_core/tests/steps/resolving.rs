use cucumber::gherkin::Step;
use cucumber::{then, when};
use gotostep_core::{Config, NullSink, Resolution, Resolver};

use super::docstring;
use crate::CoreWorld;

fn resolver() -> Resolver<NullSink> {
    Resolver::with_sink(Config::default(), NullSink)
}

#[when(regex = r#"^I resolve "(.*)"$"#)]
async fn i_resolve(world: &mut CoreWorld, line: String) {
    let idx = world.index.as_ref().expect("index built");
    world.resolution = resolver().resolve_line(&line, &idx.steps);
}

#[when("the feature is annotated:")]
async fn the_feature_is_annotated(world: &mut CoreWorld, step: &Step) {
    let idx = world.index.as_ref().expect("index built");
    let feature = docstring(step);
    world.annotations = resolver().annotate_document(&feature, &idx.steps);
}

#[then(regex = r#"^it resolves to "([^"]+)" at line (\d+)$"#)]
async fn it_resolves_to(world: &mut CoreWorld, function: String, line: usize) {
    match world.resolution.as_ref().expect("resolved") {
        Resolution::Found(def) => {
            assert_eq!(def.function, function);
            assert_eq!(def.line, line);
        }
        Resolution::NoMatch(miss) => panic!("expected {function}, got no match: {miss:?}"),
    }
}

#[then(regex = r"^the match quality is ([\d.]+)$")]
async fn the_match_quality_is(world: &mut CoreWorld, quality: f64) {
    let def = world
        .resolution
        .as_ref()
        .and_then(Resolution::definition)
        .expect("a match");
    assert_eq!(def.match_quality, Some(quality));
}

#[then(regex = r"^it resolves to nothing after checking (\d+) definitions$")]
async fn it_resolves_to_nothing(world: &mut CoreWorld, checked: usize) {
    match world.resolution.as_ref().expect("resolved") {
        Resolution::NoMatch(miss) => assert_eq!(miss.checked, checked),
        Resolution::Found(def) => panic!("expected no match, got {def:?}"),
    }
}

#[then("the line is not a step")]
async fn the_line_is_not_a_step(world: &mut CoreWorld) {
    assert!(world.resolution.is_none());
}

#[then(regex = r"^there are (\d+) annotations$")]
async fn there_are_n_annotations(world: &mut CoreWorld, n: usize) {
    assert_eq!(world.annotations.len(), n);
}

#[then(regex = r#"^line (\d+) is annotated with "([^"]+)"$"#)]
async fn line_is_annotated_with(world: &mut CoreWorld, line: usize, function: String) {
    let found = world
        .annotations
        .iter()
        .any(|a| a.line == line && a.definition.function == function);
    assert!(found, "no annotation {function}@{line} in {:#?}", world.annotations);
}

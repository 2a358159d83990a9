use cucumber::gherkin::Step;

mod indexing;
mod resolving;

/// Doc string text, without the leading newline some gherkin versions keep.
pub(crate) fn docstring(step: &Step) -> String {
    let text = step.docstring.clone().unwrap_or_default();
    text.strip_prefix('\n').map(str::to_string).unwrap_or(text)
}

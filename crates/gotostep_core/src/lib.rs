//! gotostep_core: resolves Gherkin steps to the Python step functions that
//! implement them (pytest-bdd / behave decorators).
//! Keep this crate platform-agnostic and free of I/O; hosts supply files
//! through [`workspace::Workspace`].

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod matcher;
pub mod resolver;
pub mod step;
pub mod step_index;
pub mod workspace;

pub use config::Config;
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, NullSink, TracingSink};
pub use error::{Error, Result};
pub use resolver::{resolve, Navigation, NoMatch, Resolution, Resolver, StepAnnotation};
pub use step::{KindFilter, SourceFile, StepDefinition, StepKind, StepQuery};
pub use step_index::{build_index, locate_function_line, StepIndex};
pub use workspace::{MemoryWorkspace, Workspace};

/// Returns the crate version at compile time (useful for debugging).
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

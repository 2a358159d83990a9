use thiserror::Error;

/// Result type for gotostep operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while extracting, compiling or reading step definitions.
///
/// None of these are fatal to indexing or ranking: callers turn them into
/// [`crate::diagnostics::Diagnostic`]s and move on to the next declaration,
/// definition or file.
#[derive(Error, Debug)]
pub enum Error {
    /// The declaration's argument list never closed before input ran out
    #[error("unbalanced parentheses in declaration at line {line}")]
    UnbalancedArgument { line: usize },

    /// The declaration's argument text held no quoted pattern
    #[error("no quoted pattern in declaration at line {line}")]
    MissingPattern { line: usize },

    /// A templated pattern could not be turned into a regex
    #[error("pattern {pattern:?} does not compile: {source}")]
    PatternCompile {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The workspace could not read or reveal a file
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },
}

impl Error {
    /// Creates an I/O error for `path`
    pub fn io(path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

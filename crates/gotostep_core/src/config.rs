use serde::{Deserialize, Serialize};

/// Default number of lines scanned after a declaration for its `def`.
pub const DEFAULT_LOOKAHEAD_LINES: usize = 20;

/// Default minimum token similarity for a fuzzy candidate.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// Resolver settings, passed explicitly to everything that needs them.
///
/// Every field has a default so hosts can send a partial JSON object.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Emit debug-level diagnostics (skipped declarations, misses).
    pub show_debug_logs: bool,
    /// How far below a declaration to look for the implementing function.
    pub lookahead_lines: usize,
    /// Token similarity needed before a fuzzy match counts as a candidate.
    pub similarity_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            show_debug_logs: false,
            lookahead_lines: DEFAULT_LOOKAHEAD_LINES,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl Config {
    pub fn with_debug_logs(mut self, enabled: bool) -> Self {
        self.show_debug_logs = enabled;
        self
    }
}

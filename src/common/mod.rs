// Shared error types for Mr. Magpie.

use thiserror::Error;

/// Faults surfaced by the analysis pipeline. The run halts on the first one;
/// no partial call graph is ever produced.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Unrecognized strategy name. Rejected before any analysis runs.
    #[error("unknown strategy '{0}' (expected NONE, ONESHOT, DEMAND or FULL)")]
    UnknownStrategy(String),

    /// A syntax error in an input file. The analysis only runs on fully
    /// parsed input.
    #[error("syntax error in {file} at line {line}")]
    Parse { file: String, line: u32 },

    /// An identifier reference reached the flow graph builder without a
    /// binding. The binder is required to classify every reference, so this
    /// is a programming error in the frontend, not a user fault.
    #[error("unbound reference '{name}' at {pos}")]
    UnboundReference { name: String, pos: String },

    /// A bound-program invariant did not hold (e.g. a declaration or call
    /// site the binder never numbered).
    #[error("bound-program invariant violated: {0}")]
    Invariant(String),
}

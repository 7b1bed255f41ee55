#[derive(Debug, thiserror::Error)]
pub enum TailError {
    #[error("no matching log groups found for: {fragment}")]
    NoMatchingGroup { fragment: String },

    #[error("multiple log groups match '{fragment}' ({}), try narrowing down the search", .matches.join(", "))]
    AmbiguousGroup {
        fragment: String,
        matches: Vec<String>,
    },

    #[error("{operation} failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("failed to resolve AWS credentials: {0}")]
    Credentials(String),

    #[error("stopped following: {reason}")]
    Stopped { reason: String },

    #[error("failed to write output")]
    Output(#[from] std::io::Error),
}

impl TailError {
    pub fn transport(operation: &'static str, err: impl std::fmt::Display) -> Self {
        TailError::Transport {
            operation,
            message: err.to_string(),
        }
    }

    /// Errors the follow loop rides out and retries on its next tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, TailError::Transport { .. })
    }
}

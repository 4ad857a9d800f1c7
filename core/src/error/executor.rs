use thiserror::Error;

/// Failure surfaced by a traversal.
///
/// A failure is created once, at the node whose work failed, and reaches the
/// caller of the top-level run unchanged: ancestors never re-wrap it.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("work failed on node '{node}': {source}")]
    WorkFailed {
        node: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ExecutorError {
    pub fn work_failed(node: impl Into<String>, source: anyhow::Error) -> Self {
        Self::WorkFailed {
            node: node.into(),
            source,
        }
    }

    /// Id of the node whose work produced this failure
    pub fn node(&self) -> &str {
        match self {
            Self::WorkFailed { node, .. } => node,
        }
    }

    /// The error value returned by the failing work
    pub fn work_error(&self) -> &anyhow::Error {
        match self {
            Self::WorkFailed { source, .. } => source,
        }
    }
}

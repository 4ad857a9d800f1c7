use serde::Serialize;

/// Summary of one top-level traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Identifier shared by every event of this traversal
    pub run_id: String,

    /// Nodes the scheduler entered, pass-through nodes included
    pub nodes_visited: usize,

    /// Nodes whose own work was invoked
    pub work_invoked: usize,

    /// Wall-clock duration of the traversal in milliseconds
    pub duration_ms: u64,
}

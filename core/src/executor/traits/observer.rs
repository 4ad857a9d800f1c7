use std::sync::Arc;

use crate::executor::types::RunReport;

/// Observer plugin notified of every scheduling step.
///
/// Called inline from the traversal, so implementations must not block.
pub trait RunObserver: Send + Sync {
    fn name(&self) -> &str;
    fn on_event(&self, event: &RunEvent);
}

/// Traversal event (unified event type)
#[derive(Debug, Clone)]
pub enum RunEvent {
    RunStart {
        run_id: String,
        root: String,
    },
    NodeStart {
        run_id: String,
        node: String,
        depth: usize,
        has_work: bool,
    },
    NodeCommitted {
        run_id: String,
        node: String,
        children: Vec<String>,
        parallel: bool,
    },
    NodeComplete {
        run_id: String,
        node: String,
        duration_ms: u64,
    },
    NodeFailed {
        run_id: String,
        node: String,
        error: String,
    },
    RunEnd {
        run_id: String,
        report: RunReport,
        error: Option<String>,
    },
}

impl RunEvent {
    pub fn run_id(&self) -> &str {
        match self {
            Self::RunStart { run_id, .. }
            | Self::NodeStart { run_id, .. }
            | Self::NodeCommitted { run_id, .. }
            | Self::NodeComplete { run_id, .. }
            | Self::NodeFailed { run_id, .. }
            | Self::RunEnd { run_id, .. } => run_id,
        }
    }

    /// Node the event is about; `None` for run-level events
    pub fn node(&self) -> Option<&str> {
        match self {
            Self::NodeStart { node, .. }
            | Self::NodeCommitted { node, .. }
            | Self::NodeComplete { node, .. }
            | Self::NodeFailed { node, .. } => Some(node),
            Self::RunStart { .. } | Self::RunEnd { .. } => None,
        }
    }

    /// Dotted event type, as written to JSONL output
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RunStart { .. } => "run.start",
            Self::NodeStart { .. } => "node.start",
            Self::NodeCommitted { .. } => "node.committed",
            Self::NodeComplete { .. } => "node.end",
            Self::NodeFailed { .. } => "node.failed",
            Self::RunEnd { .. } => "run.end",
        }
    }
}

/// Fans every event out to several observers, in registration order.
#[derive(Default, Clone)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn RunObserver>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl RunObserver for CompositeObserver {
    fn name(&self) -> &str {
        "composite"
    }

    fn on_event(&self, event: &RunEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}

use std::io::Write;
use std::sync::Mutex;

use chrono::Local;
use serde::Serialize;

use super::traits::{RunEvent, RunObserver};

#[derive(Debug, Clone, Serialize)]
pub struct JsonlEvent {
    pub v: i32,
    #[serde(rename = "type")]
    pub event_type: String,
    pub ts: String,
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl JsonlEvent {
    pub fn from_run_event(event: &RunEvent) -> Self {
        let (error, metadata) = match event {
            RunEvent::RunStart { root, .. } => (None, Some(serde_json::json!({ "root": root }))),
            RunEvent::NodeStart {
                depth, has_work, ..
            } => (
                None,
                Some(serde_json::json!({ "depth": depth, "has_work": has_work })),
            ),
            RunEvent::NodeCommitted {
                children, parallel, ..
            } => (
                None,
                Some(serde_json::json!({ "children": children, "parallel": parallel })),
            ),
            RunEvent::NodeComplete { duration_ms, .. } => (
                None,
                Some(serde_json::json!({ "duration_ms": duration_ms })),
            ),
            RunEvent::NodeFailed { error, .. } => (Some(error.clone()), None),
            RunEvent::RunEnd { report, error, .. } => {
                (error.clone(), serde_json::to_value(report).ok())
            }
        };

        Self {
            v: 1,
            event_type: event.event_type().to_string(),
            ts: Local::now().to_rfc3339(),
            run_id: event.run_id().to_string(),
            node_id: event.node().map(str::to_string),
            error,
            metadata,
        }
    }
}

/// Writes every event as one JSON line.
pub struct JsonlObserver {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl JsonlObserver {
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }
}

impl RunObserver for JsonlObserver {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn on_event(&self, event: &RunEvent) {
        let Ok(line) = serde_json::to_string(&JsonlEvent::from_run_event(event)) else {
            return;
        };
        if let Ok(mut sink) = self.sink.lock() {
            if let Err(e) = writeln!(sink, "{line}").and_then(|()| sink.flush()) {
                tracing::debug!(error = %e, "jsonl sink write failed");
            }
        }
    }
}

/// Mirrors events into the `tracing` pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn name(&self) -> &str {
        "tracing"
    }

    fn on_event(&self, event: &RunEvent) {
        match event {
            RunEvent::RunStart { run_id, root } => {
                tracing::info!(target: "pipeline.events", %run_id, %root, "run.start");
            }
            RunEvent::NodeStart {
                run_id,
                node,
                depth,
                has_work,
            } => {
                tracing::debug!(
                    target: "pipeline.events",
                    %run_id,
                    %node,
                    depth,
                    has_work,
                    "node.start"
                );
            }
            RunEvent::NodeCommitted {
                run_id,
                node,
                children,
                parallel,
            } => {
                tracing::debug!(
                    target: "pipeline.events",
                    %run_id,
                    %node,
                    children = ?children,
                    parallel,
                    "node.committed"
                );
            }
            RunEvent::NodeComplete {
                run_id,
                node,
                duration_ms,
            } => {
                tracing::debug!(
                    target: "pipeline.events",
                    %run_id,
                    %node,
                    duration_ms,
                    "node.end"
                );
            }
            RunEvent::NodeFailed {
                run_id,
                node,
                error,
            } => {
                tracing::warn!(target: "pipeline.events", %run_id, %node, %error, "node.failed");
            }
            RunEvent::RunEnd {
                run_id,
                report,
                error,
            } => match error {
                Some(error) => {
                    tracing::warn!(target: "pipeline.events", %run_id, %error, "run.end");
                }
                None => {
                    tracing::info!(
                        target: "pipeline.events",
                        %run_id,
                        nodes = report.nodes_visited,
                        duration_ms = report.duration_ms,
                        "run.end"
                    );
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::types::RunReport;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_jsonl_observer_writes_one_line_per_event() {
        let buf = SharedBuf::default();
        let observer = JsonlObserver::new(Box::new(buf.clone()));

        observer.on_event(&RunEvent::NodeCommitted {
            run_id: "r1".into(),
            node: "root".into(),
            children: vec!["a".into(), "b".into()],
            parallel: true,
        });
        observer.on_event(&RunEvent::RunEnd {
            run_id: "r1".into(),
            report: RunReport {
                run_id: "r1".into(),
                nodes_visited: 3,
                work_invoked: 2,
                duration_ms: 5,
            },
            error: Some("boom".into()),
        });

        let out = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);

        assert_eq!(lines[0]["v"], 1);
        assert_eq!(lines[0]["type"], "node.committed");
        assert_eq!(lines[0]["node_id"], "root");
        assert_eq!(lines[0]["metadata"]["children"][1], "b");
        assert!(lines[0].get("error").is_none());

        assert_eq!(lines[1]["type"], "run.end");
        assert!(lines[1].get("node_id").is_none());
        assert_eq!(lines[1]["error"], "boom");
        assert_eq!(lines[1]["metadata"]["nodes_visited"], 3);
    }

    #[test]
    fn test_tracing_observer_handles_every_event() {
        let observer = TracingObserver;
        for event in [
            RunEvent::RunStart {
                run_id: "r".into(),
                root: "root".into(),
            },
            RunEvent::NodeFailed {
                run_id: "r".into(),
                node: "n".into(),
                error: "e".into(),
            },
        ] {
            observer.on_event(&event);
        }
        assert_eq!(observer.name(), "tracing");
    }
}

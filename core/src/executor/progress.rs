use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use super::traits::{RunEvent, RunObserver};

/// Visual progress for a traversal
///
/// The tree is revealed while it runs, so the overall bar is a counter of
/// finished nodes rather than a percentage. Nodes carrying work get their own
/// spinner while they run.
pub struct ProgressObserver {
    /// Multi-progress container
    multi: MultiProgress,
    /// Overall node counter
    overall: ProgressBar,
    /// Per-node spinners, keyed by node id
    node_bars: Mutex<HashMap<String, ProgressBar>>,
    /// Whether monitoring is enabled
    enabled: bool,
}

impl ProgressObserver {
    /// Create a new progress observer
    ///
    /// * `enabled` - Whether to draw anything (disable for jsonl output)
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            return Self {
                multi: MultiProgress::new(),
                overall: ProgressBar::hidden(),
                node_bars: Mutex::new(HashMap::new()),
                enabled: false,
            };
        }

        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new_spinner());

        if let Ok(style) =
            ProgressStyle::default_spinner().template("[{elapsed_precise}] {pos} nodes {msg}")
        {
            overall.set_style(style);
        }
        overall.set_message("Starting...");

        Self {
            multi,
            overall,
            node_bars: Mutex::new(HashMap::new()),
            enabled: true,
        }
    }

    /// Number of nodes finished so far (successfully or not)
    pub fn finished_nodes(&self) -> u64 {
        self.overall.position()
    }

    fn add_node(&self, node: &str) {
        let bar = self.multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("  {spinner:.green} {msg}")
            .map(|s| s.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]))
        {
            bar.set_style(style);
        }
        bar.set_message(format!("⏳ {}", node));
        bar.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut bars) = self.node_bars.lock() {
            if let Some(previous) = bars.insert(node.to_string(), bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn complete_node(&self, node: &str, success: bool, duration_ms: Option<u64>) {
        let bar = self
            .node_bars
            .lock()
            .ok()
            .and_then(|mut bars| bars.remove(node));

        if let Some(bar) = bar {
            let icon = if success { "✅" } else { "❌" };
            match duration_ms {
                Some(ms) => bar.finish_with_message(format!("{} {} ({}ms)", icon, node, ms)),
                None => bar.finish_with_message(format!("{} {}", icon, node)),
            }
        }
    }
}

impl RunObserver for ProgressObserver {
    fn name(&self) -> &str {
        "progress"
    }

    fn on_event(&self, event: &RunEvent) {
        match event {
            RunEvent::RunStart { root, .. } => {
                if self.enabled {
                    self.overall.set_message(format!("running {}", root));
                }
            }
            RunEvent::NodeStart { node, has_work, .. } => {
                if self.enabled && *has_work {
                    self.add_node(node);
                }
            }
            RunEvent::NodeCommitted { .. } => {}
            RunEvent::NodeComplete {
                node, duration_ms, ..
            } => {
                self.complete_node(node, true, Some(*duration_ms));
                self.overall.inc(1);
            }
            RunEvent::NodeFailed { node, .. } => {
                self.complete_node(node, false, None);
                self.overall.inc(1);
            }
            RunEvent::RunEnd { error, .. } => {
                if !self.enabled {
                    return;
                }
                let msg = if error.is_none() {
                    "✅ All nodes completed"
                } else {
                    "❌ Run failed"
                };
                self.overall.finish_with_message(msg);
            }
        }
    }
}

impl Drop for ProgressObserver {
    fn drop(&mut self) {
        // Ensure all spinners are cleaned up
        if let Ok(mut bars) = self.node_bars.lock() {
            for (_, bar) in bars.drain() {
                bar.finish_and_clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::types::RunReport;

    fn node_events(node: &str) -> [RunEvent; 2] {
        [
            RunEvent::NodeStart {
                run_id: "r".into(),
                node: node.into(),
                depth: 1,
                has_work: true,
            },
            RunEvent::NodeComplete {
                run_id: "r".into(),
                node: node.into(),
                duration_ms: 3,
            },
        ]
    }

    #[test]
    fn test_progress_observer_disabled() {
        let observer = ProgressObserver::new(false);

        // Should not panic when disabled
        for event in node_events("a") {
            observer.on_event(&event);
        }
        assert_eq!(observer.finished_nodes(), 1);
    }

    #[test]
    fn test_progress_observer_enabled() {
        let observer = ProgressObserver::new(true);

        for event in node_events("a").into_iter().chain(node_events("b")) {
            observer.on_event(&event);
        }
        observer.on_event(&RunEvent::NodeFailed {
            run_id: "r".into(),
            node: "c".into(),
            error: "boom".into(),
        });
        observer.on_event(&RunEvent::RunEnd {
            run_id: "r".into(),
            report: RunReport {
                run_id: "r".into(),
                nodes_visited: 3,
                work_invoked: 3,
                duration_ms: 9,
            },
            error: Some("boom".into()),
        });

        assert_eq!(observer.finished_nodes(), 3);
        assert!(observer.node_bars.lock().unwrap().is_empty());
    }
}

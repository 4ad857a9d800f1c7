#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pipeline_core::executor::{RunEvent, RunObserver};
use pipeline_core::{NodeBehavior, TaskNode};

/// Ordered log of lifecycle steps ("pre:a", "start:a", "end:a", "commit:a", "post:a").
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, entry: &str) -> usize {
        self.entries()
            .iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("missing entry {entry}: {:?}", self.entries()))
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries().iter().any(|e| e == entry)
    }

    pub fn assert_before(&self, first: &str, second: &str) {
        assert!(
            self.position(first) < self.position(second),
            "expected {first} before {second}: {:?}",
            self.entries()
        );
    }
}

/// Behavior whose hooks and work write to `rec`. "start" is recorded when
/// the work is invoked; the work then sleeps `delay_ms` (never suspending
/// when it is 0) and fails with "<id> failed" when `fail` is set.
pub fn recording_behavior(
    rec: &Recorder,
    id: &str,
    delay_ms: u64,
    fail: bool,
    parallel: bool,
) -> NodeBehavior {
    let (pre, work, post) = (rec.clone(), rec.clone(), rec.clone());
    let (pre_id, work_id, post_id) = (id.to_string(), id.to_string(), id.to_string());

    NodeBehavior::builder()
        .pre_hook(move || pre.push(format!("pre:{pre_id}")))
        .work(move || {
            let rec = work.clone();
            let id = work_id.clone();
            rec.push(format!("start:{id}"));
            async move {
                if delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                rec.push(format!("end:{id}"));
                if fail {
                    anyhow::bail!("{id} failed");
                }
                Ok(())
            }
        })
        .post_hook(move || post.push(format!("post:{post_id}")))
        .parallel(parallel)
        .build()
}

fn recording_node(rec: &Recorder, id: &str, behavior: NodeBehavior) -> TaskNode {
    let rec = rec.clone();
    let commit_id = id.to_string();
    TaskNode::with_behavior(id, behavior).on_commit(move |_| {
        let rec = rec.clone();
        let id = commit_id.clone();
        async move { rec.push(format!("commit:{id}")) }
    })
}

pub fn task(rec: &Recorder, id: &str, delay_ms: u64) -> TaskNode {
    recording_node(rec, id, recording_behavior(rec, id, delay_ms, false, false))
}

pub fn parallel_task(rec: &Recorder, id: &str, delay_ms: u64) -> TaskNode {
    recording_node(rec, id, recording_behavior(rec, id, delay_ms, false, true))
}

pub fn failing_task(rec: &Recorder, id: &str, delay_ms: u64) -> TaskNode {
    recording_node(rec, id, recording_behavior(rec, id, delay_ms, true, false))
}

/// Observer keeping every event it sees.
#[derive(Default)]
pub struct EventLog(Mutex<Vec<RunEvent>>);

impl EventLog {
    pub fn events(&self) -> Vec<RunEvent> {
        self.0.lock().unwrap().clone()
    }

    /// (node, depth) of every node the scheduler entered, in order
    pub fn starts(&self) -> Vec<(String, usize)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RunEvent::NodeStart { node, depth, .. } => Some((node, depth)),
                _ => None,
            })
            .collect()
    }
}

impl RunObserver for EventLog {
    fn name(&self) -> &str {
        "event-log"
    }

    fn on_event(&self, event: &RunEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

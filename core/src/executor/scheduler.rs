use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::error::ExecutorError;

use super::children::effective_children;
use super::traits::{RunEvent, RunObserver};
use super::types::{NodeBehavior, NodeRef, RunReport, TreeNode};

/// Per-call traversal state, passed explicitly down the recursion.
struct RunContext {
    run_id: String,
    nodes_visited: AtomicUsize,
    work_invoked: AtomicUsize,
}

impl RunContext {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            nodes_visited: AtomicUsize::new(0),
            work_invoked: AtomicUsize::new(0),
        }
    }

    fn report(&self, started: Instant) -> RunReport {
        RunReport {
            run_id: self.run_id.clone(),
            nodes_visited: self.nodes_visited.load(Ordering::Relaxed),
            work_invoked: self.work_invoked.load(Ordering::Relaxed),
            duration_ms: elapsed_ms(started),
        }
    }
}

/// Milliseconds since `started`, saturating at `u64::MAX`.
fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Walks a task tree, running each node's work before its children.
///
/// The scheduler keeps no state between runs: every call to [`Scheduler::run`]
/// is a fresh traversal and repeats all hooks, work and commits.
#[derive(Clone, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
    observer: Option<Arc<dyn RunObserver>>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Runs `root` and every effective descendant.
    ///
    /// Resolves once all of them completed; fails with the first work error
    /// encountered.
    pub async fn run(&self, root: NodeRef) -> Result<(), ExecutorError> {
        self.run_with_report(root).await.map(|_| ())
    }

    #[tracing::instrument(skip_all, fields(root = %root.id()))]
    pub async fn run_with_report(&self, root: NodeRef) -> Result<RunReport, ExecutorError> {
        let started = Instant::now();
        let ctx = RunContext::new();

        tracing::info!(run_id = %ctx.run_id, "run start");
        self.emit(|| RunEvent::RunStart {
            run_id: ctx.run_id.clone(),
            root: root.id().to_string(),
        });

        let result = self.run_node(root, &ctx, 0).await;
        let report = ctx.report(started);

        match &result {
            Ok(()) => tracing::info!(
                run_id = %ctx.run_id,
                nodes = report.nodes_visited,
                work = report.work_invoked,
                duration_ms = report.duration_ms,
                "run complete"
            ),
            Err(e) => tracing::warn!(run_id = %ctx.run_id, error = %e, "run failed"),
        }

        self.emit(|| RunEvent::RunEnd {
            run_id: ctx.run_id.clone(),
            report: report.clone(),
            error: result.as_ref().err().map(ToString::to_string),
        });

        result.map(|()| report)
    }

    /// Per-node lifecycle: pre-hook, work, commit, children, post-hook.
    ///
    /// The pre-hook and the work are started when this is called, not when
    /// the returned future is first polled, so building the futures of a
    /// parallel fan-out dispatches every child before any of them completes.
    fn run_node<'a>(
        &'a self,
        node: NodeRef,
        ctx: &'a RunContext,
        depth: usize,
    ) -> BoxFuture<'a, Result<(), ExecutorError>> {
        let started = Instant::now();
        let has_work = node.has_work();

        ctx.nodes_visited.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(run_id = %ctx.run_id, node = node.id(), depth, has_work, "node start");
        self.emit(|| RunEvent::NodeStart {
            run_id: ctx.run_id.clone(),
            node: node.id().to_string(),
            depth,
            has_work,
        });

        let work = match node.instance() {
            Some(behavior) => {
                behavior.invoke_pre_hook();
                behavior.start_work()
            }
            None => futures::future::ready(Ok(())).boxed(),
        };
        if has_work {
            ctx.work_invoked.fetch_add(1, Ordering::Relaxed);
        }

        async move {
            if let Err(source) = work.await {
                let err = ExecutorError::work_failed(node.id(), source);
                return Err(self.node_failed(node.as_ref(), ctx, err));
            }

            node.commit().await;

            let behavior = node.instance();
            let children = effective_children(node.as_ref());
            let parallel = behavior.is_some_and(NodeBehavior::runs_children_in_parallel);

            tracing::debug!(
                run_id = %ctx.run_id,
                node = node.id(),
                children = children.len(),
                parallel,
                "node committed"
            );
            self.emit(|| RunEvent::NodeCommitted {
                run_id: ctx.run_id.clone(),
                node: node.id().to_string(),
                children: children.iter().map(|c| c.id().to_string()).collect(),
                parallel,
            });

            let outcome = if children.is_empty() {
                Ok(())
            } else if parallel {
                self.run_parallel(children, ctx, depth + 1).await
            } else {
                self.run_sequential(children, ctx, depth + 1).await
            };

            if let Err(err) = outcome {
                return Err(self.node_failed(node.as_ref(), ctx, err));
            }

            if let Some(behavior) = behavior {
                behavior.invoke_post_hook();
            }

            let duration_ms = elapsed_ms(started);
            tracing::debug!(run_id = %ctx.run_id, node = node.id(), duration_ms, "node complete");
            self.emit(|| RunEvent::NodeComplete {
                run_id: ctx.run_id.clone(),
                node: node.id().to_string(),
                duration_ms,
            });

            Ok(())
        }
        .boxed()
    }

    /// Child i+1 starts only after child i resolved; the first failure stops
    /// the loop and later siblings never start.
    async fn run_sequential(
        &self,
        children: Vec<NodeRef>,
        ctx: &RunContext,
        depth: usize,
    ) -> Result<(), ExecutorError> {
        for child in children {
            self.run_node(child, ctx, depth).await?;
        }
        Ok(())
    }

    /// Dispatches every child before awaiting any, lets all of them settle,
    /// then reports the first failure observed. Nothing is cancelled.
    ///
    /// With `max_parallel` set, children beyond the limit are dispatched as
    /// permits free up.
    async fn run_parallel(
        &self,
        children: Vec<NodeRef>,
        ctx: &RunContext,
        depth: usize,
    ) -> Result<(), ExecutorError> {
        // Per fan-out, never global: a nested fan-out must not wait on
        // permits held by its ancestors.
        let limit = self
            .config
            .fan_out_limit()
            .map(|n| Arc::new(Semaphore::new(n)));

        let mut futs: FuturesUnordered<BoxFuture<'_, Result<(), ExecutorError>>> =
            FuturesUnordered::new();
        for child in children {
            match &limit {
                None => futs.push(self.run_node(child, ctx, depth)),
                Some(sem) => {
                    // A bounded child starts once it holds a permit. The
                    // semaphore is never closed, so acquire cannot fail.
                    let sem = Arc::clone(sem);
                    futs.push(
                        async move {
                            let _permit = sem.acquire_owned().await.ok();
                            self.run_node(child, ctx, depth).await
                        }
                        .boxed(),
                    );
                }
            }
        }

        let mut first_error = None;

        while let Some(res) = futs.next().await {
            if let Err(err) = res {
                if first_error.is_none() {
                    first_error = Some(err);
                } else {
                    tracing::debug!(
                        run_id = %ctx.run_id,
                        node = err.node(),
                        error = %err,
                        "sibling failure suppressed"
                    );
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn node_failed(
        &self,
        node: &dyn TreeNode,
        ctx: &RunContext,
        err: ExecutorError,
    ) -> ExecutorError {
        tracing::warn!(run_id = %ctx.run_id, node = node.id(), error = %err, "node failed");
        self.emit(|| RunEvent::NodeFailed {
            run_id: ctx.run_id.clone(),
            node: node.id().to_string(),
            error: err.to_string(),
        });
        err
    }

    fn emit<F>(&self, event: F)
    where
        F: FnOnce() -> RunEvent,
    {
        if let Some(observer) = &self.observer {
            observer.on_event(&event());
        }
    }
}

/// Runs `root` with a default [`Scheduler`].
pub async fn run(root: NodeRef) -> Result<(), ExecutorError> {
    Scheduler::default().run(root).await
}

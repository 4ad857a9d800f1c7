use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

/// Synchronous lifecycle hook (`pre_hook` / `post_hook`).
pub type Hook = Arc<dyn Fn() + Send + Sync>;

/// Asynchronous unit of work attached to a node.
pub type WorkFn = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Capability bag attached to a node.
///
/// Every capability is optional and its presence is fixed when the behavior
/// is built, so the scheduler never has to probe for it while walking the tree.
/// A node without a behavior (or with an empty one) is a pass-through.
#[derive(Clone, Default)]
pub struct NodeBehavior {
    pre_hook: Option<Hook>,
    work: Option<WorkFn>,
    post_hook: Option<Hook>,
    parallel: bool,
}

impl NodeBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> NodeBehaviorBuilder {
        NodeBehaviorBuilder::default()
    }

    pub fn has_pre_hook(&self) -> bool {
        self.pre_hook.is_some()
    }

    pub fn has_work(&self) -> bool {
        self.work.is_some()
    }

    pub fn has_post_hook(&self) -> bool {
        self.post_hook.is_some()
    }

    /// Whether effective children run concurrently (default: sequentially).
    pub fn runs_children_in_parallel(&self) -> bool {
        self.parallel
    }

    pub(crate) fn invoke_pre_hook(&self) {
        if let Some(hook) = &self.pre_hook {
            hook();
        }
    }

    pub(crate) fn invoke_post_hook(&self) {
        if let Some(hook) = &self.post_hook {
            hook();
        }
    }

    /// Starts the work, or an immediately-ready no-op when there is none.
    pub(crate) fn start_work(&self) -> BoxFuture<'static, anyhow::Result<()>> {
        match &self.work {
            Some(work) => work(),
            None => futures::future::ready(Ok(())).boxed(),
        }
    }
}

impl fmt::Debug for NodeBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeBehavior")
            .field("pre_hook", &self.has_pre_hook())
            .field("work", &self.has_work())
            .field("post_hook", &self.has_post_hook())
            .field("parallel", &self.parallel)
            .finish()
    }
}

#[derive(Default)]
pub struct NodeBehaviorBuilder {
    inner: NodeBehavior,
}

impl NodeBehaviorBuilder {
    pub fn pre_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.pre_hook = Some(Arc::new(hook));
        self
    }

    pub fn work<F, Fut>(mut self, work: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.inner.work = Some(Arc::new(move || work().boxed()));
        self
    }

    pub fn post_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.post_hook = Some(Arc::new(hook));
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.inner.parallel = parallel;
        self
    }

    pub fn build(self) -> NodeBehavior {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_empty_behavior_has_no_capabilities() {
        let behavior = NodeBehavior::new();
        assert!(!behavior.has_pre_hook());
        assert!(!behavior.has_work());
        assert!(!behavior.has_post_hook());
        assert!(!behavior.runs_children_in_parallel());
    }

    #[tokio::test]
    async fn test_missing_work_resolves_immediately() {
        let behavior = NodeBehavior::builder().parallel(true).build();
        assert!(behavior.start_work().await.is_ok());
        assert!(behavior.runs_children_in_parallel());
    }

    #[tokio::test]
    async fn test_builder_wires_every_capability() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (pre, work, post) = (calls.clone(), calls.clone(), calls.clone());

        let behavior = NodeBehavior::builder()
            .pre_hook(move || {
                pre.fetch_add(1, Ordering::SeqCst);
            })
            .work(move || {
                let work = work.clone();
                async move {
                    work.fetch_add(10, Ordering::SeqCst);
                    Ok(())
                }
            })
            .post_hook(move || {
                post.fetch_add(100, Ordering::SeqCst);
            })
            .build();

        behavior.invoke_pre_hook();
        behavior.start_work().await.unwrap();
        behavior.invoke_post_hook();

        assert_eq!(calls.load(Ordering::SeqCst), 111);
        assert_eq!(
            format!("{behavior:?}"),
            "NodeBehavior { pre_hook: true, work: true, post_hook: true, parallel: false }"
        );
    }
}

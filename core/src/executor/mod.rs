//! Hierarchical task executor
//!
//! Walks a tree of nodes and runs the asynchronous work attached to each one:
//! - a node's own work (and its commit) always precedes its children
//! - children run one after another, or all at once when the node asks for it
//! - nodes without work are traversed only to reach their descendants
//! - optional pre/post hooks bracket the node and its whole subtree
//!
//! # Per-node lifecycle
//!
//! ```text
//! pre_hook()
//!   ↓
//! work().await          (no-op when the node has no work)
//!   ↓
//! commit().await        (children may change here)
//!   ↓
//! effective_children()  (flattens work-less delegates)
//!   ↓
//! run(child) ...        (sequential, or dispatched together when parallel)
//!   ↓
//! post_hook()           (only when every child succeeded)
//! ```

mod children;
mod output;
mod progress;
mod scheduler;
pub mod traits;
mod tree;
pub mod types;

pub use children::effective_children;
pub use output::{JsonlEvent, JsonlObserver, TracingObserver};
pub use progress::ProgressObserver;
pub use scheduler::{run, Scheduler};
pub use traits::{CompositeObserver, RunEvent, RunObserver};
pub use tree::{ChildSlots, TaskNode};
pub use types::{
    Hook, KeyedChildren, NodeBehavior, NodeBehaviorBuilder, NodeRef, RunReport, TreeNode, WorkFn,
};

//! Hierarchical async task executor.
//!
//! See [`executor`] for the traversal rules.

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;

pub use error::{ExecutorError, LoggingError};
pub use executor::{run, NodeBehavior, NodeRef, RunReport, Scheduler, TaskNode, TreeNode};

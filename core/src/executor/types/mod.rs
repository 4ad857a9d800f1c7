pub mod behavior;
pub mod node;
pub mod report;

pub use behavior::*;
pub use node::*;
pub use report::*;

pub mod executor;
pub mod logging;

pub use executor::ExecutorError;
pub use logging::LoggingError;

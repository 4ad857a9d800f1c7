mod load;
mod types;

pub use load::{
    apply_env_overrides, load_default, load_from_path, parse, CONFIG_ENV, LOCAL_CONFIG_FILE,
};
pub use types::{FileLogConfig, LogRotation, LoggingConfig, PipelineConfig, SchedulerConfig};

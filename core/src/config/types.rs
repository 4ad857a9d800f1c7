use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Subscriber settings for hosts that let the library install one.
///
/// The defaults stay quiet about everything but this crate and never touch
/// the filesystem; file output only exists once a `[logging.file]` table is
/// configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// EnvFilter directives. `RUST_LOG` takes precedence when set.
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Write human-readable events to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// Force ANSI colors on stderr; unset means only when stderr is a TTY.
    #[serde(default)]
    pub ansi: Option<bool>,

    #[serde(default)]
    pub file: Option<FileLogConfig>,
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "warn,pipeline_core=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_logging_level(),
            console: default_logging_console(),
            ansi: None,
            file: None,
        }
    }
}

/// Plain-text log files written through a non-blocking appender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileLogConfig {
    pub directory: String,

    /// File name prefix; rotated files get a date suffix.
    #[serde(default = "default_file_prefix")]
    pub prefix: String,

    #[serde(default)]
    pub rotation: LogRotation,
}

fn default_file_prefix() -> String {
    "pipeline.log".to_string()
}

impl FileLogConfig {
    pub fn new(directory: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            prefix: default_file_prefix(),
            rotation: LogRotation::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Never,
    Hourly,
    #[default]
    Daily,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Upper bound on concurrently running child subtrees per parallel
    /// fan-out. Unset means every child runs at once.
    #[serde(default)]
    pub max_parallel: Option<usize>,
}

impl SchedulerConfig {
    /// Effective per-fan-out limit; zero is clamped to one.
    pub fn fan_out_limit(&self) -> Option<usize> {
        self.max_parallel.map(|n| n.max(1))
    }
}

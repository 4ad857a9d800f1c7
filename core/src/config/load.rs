use std::path::Path;

use anyhow::Context;

use super::types::{FileLogConfig, PipelineConfig};

pub const CONFIG_ENV: &str = "PIPELINE_CONFIG";
pub const LOCAL_CONFIG_FILE: &str = "pipeline.toml";

pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<PipelineConfig> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    parse(&s).with_context(|| format!("parse config {}", path.display()))
}

pub fn parse(s: &str) -> anyhow::Result<PipelineConfig> {
    Ok(toml::from_str::<PipelineConfig>(s)?)
}

pub fn load_default() -> anyhow::Result<PipelineConfig> {
    // Priority 1: $PIPELINE_CONFIG (highest)
    // Priority 2: ./pipeline.toml (current directory)
    let mut cfg = match std::env::var(CONFIG_ENV) {
        Ok(p) if !p.trim().is_empty() => load_from_path(p.trim())?,
        _ => {
            let local_config = Path::new(LOCAL_CONFIG_FILE);
            if local_config.exists() {
                load_from_path(local_config)?
            } else {
                PipelineConfig::default()
            }
        }
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;

    Ok(cfg)
}

/// Environment variable overrides (Priority 0: highest)
pub fn apply_env_overrides<F>(cfg: &mut PipelineConfig, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("PIPELINE_MAX_PARALLEL") {
        let v = v.trim();
        if !v.is_empty() {
            let n = v
                .parse::<usize>()
                .with_context(|| format!("PIPELINE_MAX_PARALLEL is not a number: {v}"))?;
            cfg.scheduler.max_parallel = Some(n);
        }
    }

    if let Some(v) = lookup("PIPELINE_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.logging.level = v.trim().to_string();
        }
    }

    // Turns file logging on, keeping any configured prefix and rotation.
    if let Some(v) = lookup("PIPELINE_LOG_DIR") {
        let v = v.trim();
        if !v.is_empty() {
            match cfg.logging.file.as_mut() {
                Some(file) => file.directory = v.to_string(),
                None => cfg.logging.file = Some(FileLogConfig::new(v)),
            }
        }
    }

    Ok(())
}

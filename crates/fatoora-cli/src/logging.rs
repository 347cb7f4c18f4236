// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Builds the filter from a directive string such as `info` or
/// `fatoora_api=debug,warn`.
pub fn env_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level).with_context(|| {
        format!("invalid log level {level:?}; use e.g. info, debug, or fatoora_api=debug")
    })
}

/// Routes tracing output to `path`. The terminal belongs to the TUI, so
/// nothing is written to stdout or stderr.
pub fn init_logging(level: &str, path: &Path) -> Result<()> {
    let filter = env_filter(level)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| {
            format!(
                "open log file {} -- set [log].path to a writable location",
                path.display()
            )
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;

    debug!(log_path = %path.display(), "logging initialised");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::env_filter;

    #[test]
    fn env_filter_accepts_levels_and_targets() {
        assert!(env_filter("info").is_ok());
        assert!(env_filter("fatoora_api=debug,warn").is_ok());
    }

    #[test]
    fn env_filter_rejects_garbage() {
        let error = env_filter("fatoora_api=loud").expect_err("bad level should fail");
        assert!(error.to_string().contains("invalid log level"));
    }
}

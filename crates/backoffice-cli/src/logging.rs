// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::config::Config;
use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "BACKOFFICE_LOG";

/// Sends `tracing` output to the configured log file. The terminal belongs
/// to the console, so nothing is written to stderr. Keep the guard alive
/// until exit or buffered lines are lost.
pub fn init(config: &Config) -> Result<WorkerGuard> {
    let path = config.log_file()?;
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(directory)
        .with_context(|| format!("create log directory {}", directory.display()))?;
    let file_name = path.file_name().ok_or_else(|| {
        anyhow!(
            "log file {} has no file name; set [log].file to a file path",
            path.display()
        )
    })?;

    let directive = filter_directive(config.log_level(), env::var(LOG_ENV).ok());
    let filter = EnvFilter::try_new(&directive).with_context(|| {
        format!("invalid log filter {directive:?}; fix [log].level or {LOG_ENV}")
    })?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))?;
    Ok(guard)
}

fn filter_directive(configured: &str, env_override: Option<String>) -> String {
    env_override
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| configured.to_ascii_lowercase())
}

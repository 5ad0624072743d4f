use std::{collections::HashMap, fs, io};

use anyhow::Context;
use control_tree::{layouts::Layout, DEFAULT_EVENT_CAPACITY};

const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server_bind: String,
    pub layout: Layout,
    pub event_buffer: usize,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            layout: Layout::FolderTree,
            event_buffer: DEFAULT_EVENT_CAPACITY,
            log_filter: "info".into(),
        }
    }
}

/// Defaults, then `server.toml` in the working directory, then the environment.
pub fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(SETTINGS_FILE) {
        Ok(raw) => apply_file_overrides(&mut settings, &raw)
            .with_context(|| format!("invalid settings in {SETTINGS_FILE}"))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {SETTINGS_FILE}"));
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

pub(crate) fn apply_file_overrides(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: HashMap<String, String> =
        toml::from_str(raw).context("expected a flat table of string values")?;

    if let Some(v) = file_cfg.get("bind_addr") {
        settings.server_bind = v.clone();
    }
    if let Some(v) = file_cfg.get("layout") {
        settings.layout = v.parse()?;
    }
    if let Some(v) = file_cfg.get("event_buffer") {
        settings.event_buffer = parse_event_buffer(v)?;
    }
    if let Some(v) = file_cfg.get("log_filter") {
        settings.log_filter = v.clone();
    }
    Ok(())
}

/// Later keys win: `APP__*` overrides the legacy unprefixed names.
pub(crate) fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = lookup("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = lookup("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = lookup("APP__LAYOUT") {
        settings.layout = v.parse().context("APP__LAYOUT")?;
    }

    if let Some(v) = lookup("APP__EVENT_BUFFER") {
        settings.event_buffer = parse_event_buffer(&v).context("APP__EVENT_BUFFER")?;
    }

    if let Some(v) = lookup("RUST_LOG") {
        settings.log_filter = v;
    }
    if let Some(v) = lookup("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
    Ok(())
}

fn parse_event_buffer(raw: &str) -> anyhow::Result<usize> {
    let value: usize = raw
        .trim()
        .parse()
        .with_context(|| format!("event buffer `{raw}` is not a number"))?;
    anyhow::ensure!(value > 0, "event buffer must be at least 1");
    Ok(value)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

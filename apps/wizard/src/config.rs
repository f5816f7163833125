use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

use crate::{
    backend_bridge::runtime::{BridgeOptions, DEFAULT_POLL_INTERVAL},
    controller::reducer::{ControllerOptions, DEFAULT_PREVIEW_FADE, DEFAULT_STATUS_WORD_PREVIEW},
};

pub const DEFAULT_CONFIG_FILE: &str = "wizard.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub poll_interval: Duration,
    pub preview_fade: Duration,
    pub status_word_preview: usize,
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            preview_fade: DEFAULT_PREVIEW_FADE,
            status_word_preview: DEFAULT_STATUS_WORD_PREVIEW,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Settings {
    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            preview_fade: self.preview_fade,
            status_word_preview: self.status_word_preview,
        }
    }

    pub fn bridge_options(&self) -> BridgeOptions {
        BridgeOptions {
            poll_interval: self.poll_interval,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    poll_interval_ms: Option<u64>,
    preview_fade_ms: Option<u64>,
    status_word_preview: Option<usize>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then the TOML file (when `path` exists), then environment overrides.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let file_cfg = parse_file_settings(&raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
        apply_file_settings(&mut settings, file_cfg);
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn parse_file_settings(raw: &str) -> anyhow::Result<FileSettings> {
    Ok(toml::from_str(raw)?)
}

fn apply_file_settings(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.poll_interval_ms.filter(|ms| *ms > 0) {
        settings.poll_interval = Duration::from_millis(v);
    }
    if let Some(v) = file_cfg.preview_fade_ms {
        settings.preview_fade = Duration::from_millis(v);
    }
    if let Some(v) = file_cfg.status_word_preview {
        settings.status_word_preview = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs.filter(|secs| *secs > 0) {
        settings.request_timeout = Duration::from_secs(v);
    }
}

fn apply_env_overrides(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("WIZARD_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(ms) = parse_var(&var, "APP__POLL_INTERVAL_MS").filter(|ms| *ms > 0) {
        settings.poll_interval = Duration::from_millis(ms);
    }
    if let Some(ms) = parse_var(&var, "APP__PREVIEW_FADE_MS") {
        settings.preview_fade = Duration::from_millis(ms);
    }
    if let Some(count) = parse_var(&var, "APP__STATUS_WORD_PREVIEW") {
        settings.status_word_preview = count as usize;
    }
    if let Some(secs) = parse_var(&var, "APP__REQUEST_TIMEOUT_SECS").filter(|secs| *secs > 0) {
        settings.request_timeout = Duration::from_secs(secs);
    }
}

/// Unparseable values are ignored.
fn parse_var(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    var(key).and_then(|v| v.trim().parse::<u64>().ok())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

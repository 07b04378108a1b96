use std::{collections::HashMap, fs, io, path::Path, time::Duration};

use anyhow::Context;

pub const DEFAULT_CONFIG_FILE: &str = "imagegen.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub endpoint: String,
    pub refresh_url: Option<String>,
    pub timeout_seconds: u64,
    pub surface_failures: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:3000/api/image".into(),
            refresh_url: None,
            timeout_seconds: 60,
            surface_failures: false,
        }
    }
}

impl Settings {
    /// `None` when the timeout is disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }
}

pub fn load_settings(config_path: &Path) -> anyhow::Result<Settings> {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

/// Defaults, then the config file if present, then environment variables.
pub fn load_settings_with(
    config_path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(config_path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse '{}'", config_path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", config_path.display()))
        }
    }

    apply_env(&mut settings, env);
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<HashMap<String, String>>(raw)?;
    if let Some(v) = file_cfg.get("endpoint") {
        settings.endpoint = v.clone();
    }
    if let Some(v) = file_cfg.get("refresh_url") {
        settings.refresh_url = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("timeout_seconds") {
        settings.timeout_seconds = v
            .parse()
            .with_context(|| format!("timeout_seconds must be a whole number, got '{v}'"))?;
    }
    if let Some(v) = file_cfg.get("surface_failures") {
        settings.surface_failures = parse_flag(v);
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("IMAGEGEN_ENDPOINT") {
        settings.endpoint = v;
    }
    if let Some(v) = env("APP__ENDPOINT") {
        settings.endpoint = v;
    }

    if let Some(v) = env("IMAGEGEN_REFRESH_URL") {
        settings.refresh_url = Some(v);
    }
    if let Some(v) = env("APP__REFRESH_URL") {
        settings.refresh_url = Some(v);
    }

    if let Some(v) = env("APP__TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.timeout_seconds = parsed;
        }
    }

    if let Some(v) = env("APP__SURFACE_FAILURES") {
        settings.surface_failures = parse_flag(&v);
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;

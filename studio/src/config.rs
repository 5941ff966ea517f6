use std::{env, path::PathBuf, time::Duration};

use anyhow::Context;

pub struct AppConfig {
    pub storage: StorageConfig,
    pub panels: PanelStoreConfig,
    pub mock: MockConfig,
    pub log: LogConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source, `from_env` being the usual one.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            storage: StorageConfig::from_lookup(&lookup),
            panels: PanelStoreConfig::from_lookup(&lookup),
            mock: MockConfig::from_lookup(&lookup)?,
            log: LogConfig::from_lookup(&lookup),
        })
    }
}

/// Where the key-value store (user, theme, fun mode, settings) lives.
pub struct StorageConfig {
    pub path: PathBuf,
}

impl StorageConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        Self {
            path: lookup("STUDIO_STORAGE_PATH")
                .unwrap_or_else(|| "./.shikimanga/storage.json".to_string())
                .into(),
        }
    }
}

pub struct PanelStoreConfig {
    pub dir: PathBuf,
}

impl PanelStoreConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        Self {
            dir: lookup("STUDIO_PANEL_DIR")
                .unwrap_or_else(|| "./.shikimanga/panels".to_string())
                .into(),
        }
    }
}

/// Artificial delays standing in for network calls.
pub struct MockConfig {
    pub auth_delay: Duration,
    pub colorize_delay: Duration,
}

impl MockConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            auth_delay: millis(lookup, "STUDIO_AUTH_DELAY_MS", 800)?,
            colorize_delay: millis(lookup, "STUDIO_COLORIZE_DELAY_MS", 2000)?,
        })
    }
}

pub struct LogConfig {
    pub level: String,
}

impl LogConfig {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        Self {
            level: lookup("STUDIO_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
) -> anyhow::Result<Duration> {
    let ms = match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Environment variable {name} is not a number: {raw}"))?,
        None => default,
    };
    Ok(Duration::from_millis(ms))
}

// src/config/mod.rs
pub mod settings;

pub use settings::{ClientSettings, MetricsSettings, ReporterSettings, ServerSettings, Settings};

use anyhow::{anyhow, Context, Result};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

pub const ENV_CONFIG_PATH: &str = "NEWS_ANALYZER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/news_analyzer.toml";

pub const ENV_SERVER_HOST: &str = "NEWS_SERVER_HOST";
pub const ENV_SERVER_PORT: &str = "NEWS_SERVER_PORT";
pub const ENV_SERVER_POOL_SIZE: &str = "NEWS_SERVER_POOL_SIZE";
pub const ENV_REPORT_PERIOD_SECS: &str = "NEWS_REPORT_PERIOD_SECS";
pub const ENV_CLIENT_HOST: &str = "NEWS_CLIENT_HOST";
pub const ENV_CLIENT_PORT: &str = "NEWS_CLIENT_PORT";
pub const ENV_CLIENT_INTERVAL_MS: &str = "NEWS_CLIENT_INTERVAL_MS";
pub const ENV_METRICS_ADDR: &str = "NEWS_METRICS_ADDR";

impl Settings {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: Settings = toml::from_str(s).context("parsing settings TOML")?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Load settings from an explicit TOML file (no env overrides).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Resolve settings using env var + fallbacks, then apply env overrides:
    /// 1) $NEWS_ANALYZER_CONFIG
    /// 2) config/news_analyzer.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            info!(path = %pb.display(), "loaded settings");
            Self::load_from(&pb)?
        } else {
            let pb = PathBuf::from(DEFAULT_CONFIG_PATH);
            if pb.exists() {
                info!(path = %pb.display(), "loaded settings");
                Self::load_from(&pb)?
            } else {
                Settings::default()
            }
        };

        cfg.apply_env_overrides()?;
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var(ENV_SERVER_HOST) {
            self.server.host = host;
        }
        if let Some(port) = env_parse(ENV_SERVER_PORT)? {
            self.server.port = port;
        }
        if let Some(size) = env_parse(ENV_SERVER_POOL_SIZE)? {
            self.server.connections_pool_size = size;
        }
        if let Some(secs) = env_parse(ENV_REPORT_PERIOD_SECS)? {
            self.reporter.period_secs = secs;
        }
        if let Ok(host) = std::env::var(ENV_CLIENT_HOST) {
            self.client.server_host = host;
        }
        if let Some(port) = env_parse(ENV_CLIENT_PORT)? {
            self.client.server_port = port;
        }
        if let Some(ms) = env_parse(ENV_CLIENT_INTERVAL_MS)? {
            self.client.message_interval_ms = ms;
        }
        if let Some(addr) = env_parse(ENV_METRICS_ADDR)? {
            self.metrics.addr = Some(addr);
        }
        Ok(())
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("invalid {key}={raw:?}: {e}")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = Settings::from_toml_str(
            r#"
[server]
port = 6000

[reporter]
period_secs = 30
"#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 6000);
        assert_eq!(cfg.server.connections_pool_size, 10);
        assert_eq!(cfg.reporter.period_secs, 30);
        assert_eq!(cfg.reporter.initial_delay_secs, 10);
        assert_eq!(cfg.client, ClientSettings::default());
        assert!(cfg.metrics.addr.is_none());
    }

    #[test]
    fn zero_values_are_sanitized() {
        let cfg = Settings::from_toml_str(
            "[server]\nconnections_pool_size = 0\n[reporter]\nperiod_secs = 0\n",
        )
        .unwrap();
        assert_eq!(cfg.server.connections_pool_size, 10);
        assert_eq!(cfg.reporter.period_secs, 10);
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        // Isolate CWD so a real config/ directory in the repo is not read.
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_CONFIG_PATH);
        env::remove_var(ENV_SERVER_PORT);

        assert_eq!(Settings::load_default().unwrap(), Settings::default());

        fs::create_dir_all(tmp.path().join("config")).unwrap();
        fs::write(tmp.path().join(DEFAULT_CONFIG_PATH), "[server]\nport = 7000\n").unwrap();
        assert_eq!(Settings::load_default().unwrap().server.port, 7000);

        let p_env = tmp.path().join("other.toml");
        fs::write(&p_env, "[server]\nport = 7100\n").unwrap();
        env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
        assert_eq!(Settings::load_default().unwrap().server.port, 7100);

        env::set_var(ENV_SERVER_PORT, "7200");
        assert_eq!(Settings::load_default().unwrap().server.port, 7200);

        env::set_var(ENV_SERVER_PORT, "not-a-port");
        assert!(Settings::load_default().is_err());

        env::remove_var(ENV_SERVER_PORT);
        env::remove_var(ENV_CONFIG_PATH);
        env::set_current_dir(&old).unwrap();
    }
}

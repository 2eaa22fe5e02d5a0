// src/config/app.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

pub const DEFAULT_CONFIG_PATH: &str = "config/sadhana.toml";

pub const ENV_CONFIG_PATH: &str = "SADHANA_CONFIG_PATH";
pub const ENV_STORE_PATH: &str = "SADHANA_STORE_PATH";
pub const ENV_HISTORY_LIMIT: &str = "SADHANA_HISTORY_LIMIT";
pub const ENV_TREND_DAYS: &str = "SADHANA_TREND_DAYS";
pub const ENV_MENTOR_WINDOW_DAYS: &str = "SADHANA_MENTOR_WINDOW_DAYS";
pub const ENV_HIGH_TARGET: &str = "SADHANA_HIGH_TARGET";
pub const ENV_METRICS: &str = "SADHANA_METRICS";

/// Upper bound for any `limit`/`days` request parameter.
pub const MAX_QUERY_DAYS: usize = 365;

fn default_history_limit() -> usize {
    30
}
fn default_trend_days() -> usize {
    7
}
fn default_mentor_window_days() -> u32 {
    30
}
fn default_high_target() -> u32 {
    150
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// JSON snapshot for the file store; `None` keeps everything in memory.
    pub store_path: Option<PathBuf>,
    /// Rows returned by the history view when no `limit` is given.
    pub history_limit: usize,
    /// Points in the dashboard trend.
    pub trend_days: usize,
    /// Default window of the mentor overview.
    pub mentor_window_days: u32,
    /// Totals at or above this count as target days in the mentor overview.
    pub high_target: u32,
    /// Expose `/metrics`.
    pub metrics_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            history_limit: default_history_limit(),
            trend_days: default_trend_days(),
            mentor_window_days: default_mentor_window_days(),
            high_target: default_high_target(),
            metrics_enabled: false,
        }
    }
}

impl AppConfig {
    /// Resolve config the usual way:
    /// 1) TOML at $SADHANA_CONFIG_PATH, else `config/sadhana.toml` if present, else defaults
    /// 2) env overrides on top
    pub fn load() -> Result<Self> {
        let mut cfg = match env::var(ENV_CONFIG_PATH) {
            Ok(p) => Self::load_from_file(Path::new(&p))?,
            Err(_) => {
                let p = PathBuf::from(DEFAULT_CONFIG_PATH);
                if p.exists() {
                    Self::load_from_file(&p)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env();
        Ok(cfg.sanitized())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading app config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing app config at {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(s)?;
        Ok(cfg.sanitized())
    }

    fn apply_env(&mut self) {
        if let Ok(p) = env::var(ENV_STORE_PATH) {
            let p = p.trim();
            self.store_path = (!p.is_empty()).then(|| PathBuf::from(p));
        }
        override_from_env(ENV_HISTORY_LIMIT, &mut self.history_limit);
        override_from_env(ENV_TREND_DAYS, &mut self.trend_days);
        override_from_env(ENV_MENTOR_WINDOW_DAYS, &mut self.mentor_window_days);
        override_from_env(ENV_HIGH_TARGET, &mut self.high_target);
        if let Ok(v) = env::var(ENV_METRICS) {
            self.metrics_enabled = matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
    }

    /// Keep windows within `1..=MAX_QUERY_DAYS`.
    fn sanitized(mut self) -> Self {
        self.history_limit = self.history_limit.clamp(1, MAX_QUERY_DAYS);
        self.trend_days = self.trend_days.clamp(1, MAX_QUERY_DAYS);
        self.mentor_window_days = self.mentor_window_days.clamp(1, MAX_QUERY_DAYS as u32);
        self
    }
}

/// Parse `key` into `slot`; unparsable values are logged and ignored.
fn override_from_env<T: FromStr>(key: &str, slot: &mut T) {
    let Ok(raw) = env::var(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(v) => *slot = v,
        Err(_) => tracing::warn!(key, value = %raw, "ignoring invalid config override"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KEYS: &[&str] = &[
        ENV_CONFIG_PATH,
        ENV_STORE_PATH,
        ENV_HISTORY_LIMIT,
        ENV_TREND_DAYS,
        ENV_MENTOR_WINDOW_DAYS,
        ENV_HIGH_TARGET,
        ENV_METRICS,
    ];

    fn clear_env() {
        for k in ALL_KEYS {
            env::remove_var(k);
        }
    }

    #[test]
    fn toml_fills_missing_fields_with_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
store_path = "data/sadhana.json"
trend_days = 14
"#,
        )
        .unwrap();
        assert_eq!(cfg.store_path, Some(PathBuf::from("data/sadhana.json")));
        assert_eq!(cfg.trend_days, 14);
        assert_eq!(cfg.history_limit, 30);
        assert_eq!(cfg.high_target, 150);
        assert!(!cfg.metrics_enabled);
    }

    #[test]
    fn out_of_range_windows_are_clamped() {
        let cfg = AppConfig::from_toml_str("history_limit = 0\nmentor_window_days = 9999").unwrap();
        assert_eq!(cfg.history_limit, 1);
        assert_eq!(cfg.mentor_window_days, 365);
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_file_and_ignores_garbage() {
        clear_env();
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("sadhana.toml");
        fs::write(&p, "history_limit = 10\nhigh_target = 140\n").unwrap();

        env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        env::set_var(ENV_HISTORY_LIMIT, "20");
        env::set_var(ENV_HIGH_TARGET, "not-a-number");
        env::set_var(ENV_METRICS, "1");

        let cfg = AppConfig::load().unwrap();
        assert_eq!(cfg.history_limit, 20);
        assert_eq!(cfg.high_target, 140);
        assert!(cfg.metrics_enabled);

        clear_env();
    }

    #[serial_test::serial]
    #[test]
    fn missing_explicit_config_is_an_error() {
        clear_env();
        env::set_var(ENV_CONFIG_PATH, "/definitely/not/here.toml");
        assert!(AppConfig::load().is_err());
        clear_env();
    }
}

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bls_api_key: Option<String>,
    pub census_api_key: Option<String>,
    pub bls_base_url: String,
    pub census_base_url: String,
    pub geocoder_base_url: String,
    pub fips_base_url: String,
    pub user_agent: String,
    pub database_path: String,
    pub fast_cache_ttl_seconds: u64,
    /// Live entries the in-process fast tier will hold.
    pub fast_cache_max_entries: usize,
    pub upstream_timeout_seconds: u64,
    /// Latest ACS 5-year vintage considered reliable.
    pub acs_latest_year: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bls_api_key: None,
            census_api_key: None,
            bls_base_url: "https://api.bls.gov/publicAPI/v2/timeseries/data/".into(),
            census_base_url: "https://api.census.gov/data".into(),
            geocoder_base_url: "https://nominatim.openstreetmap.org".into(),
            fips_base_url: "https://geo.fcc.gov/api/census".into(),
            user_agent: "labor-pulse/0.1".into(),
            database_path: "labor_pulse.db".into(),
            fast_cache_ttl_seconds: 3600,
            fast_cache_max_entries: 10_000,
            upstream_timeout_seconds: 20,
            acs_latest_year: 2023,
        }
    }
}

impl AppConfig {
    pub fn fast_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.fast_cache_ttl_seconds)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_seconds)
    }

    /// Fills unset API keys from `BLS_API_KEY` / `CENSUS_API_KEY`.
    fn apply_env(mut self) -> Self {
        if self.bls_api_key.is_none() {
            self.bls_api_key = std::env::var("BLS_API_KEY").ok().filter(|k| !k.is_empty());
        }
        if self.census_api_key.is_none() {
            self.census_api_key = std::env::var("CENSUS_API_KEY").ok().filter(|k| !k.is_empty());
        }
        self
    }
}

/// Loads the config file; a missing file yields defaults.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    if !Path::new(path).exists() {
        return Ok(AppConfig::default().apply_env());
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    Ok(config.apply_env())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg = parse_config(r#"{ "database_path": "/tmp/x.db", "acs_latest_year": 2022 }"#).unwrap();
        assert_eq!(cfg.database_path, "/tmp/x.db");
        assert_eq!(cfg.acs_latest_year, 2022);
        assert_eq!(cfg.fast_cache_ttl_seconds, 3600);
        assert_eq!(cfg.fast_cache_max_entries, 10_000);
        assert_eq!(cfg.upstream_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn explicit_key_wins_over_env() {
        let cfg = parse_config(r#"{ "bls_api_key": "abc" }"#).unwrap();
        assert_eq!(cfg.bls_api_key.as_deref(), Some("abc"));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(parse_config("{ nope"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = load_config("/definitely/not/here/config.json").unwrap();
        assert_eq!(cfg.fast_cache_ttl_seconds, 3600);
    }
}

use crate::error::{IngestError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

// Environment overrides, applied after the file
pub const ENV_API_URL: &str = "SENSOR_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "SENSOR_TIMEOUT_SECS";
pub const ENV_SERVER_PORT: &str = "SENSOR_SERVER_PORT";
pub const ENV_LOG_DIR: &str = "SENSOR_LOG_DIR";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    /// Used when the caller does not pass a source location
    pub api_url: Option<String>,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            timeout_secs: 30,
            user_agent: concat!("sensor-analytics/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8501,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { dir: "logs".to_string() }
    }
}

impl Config {
    /// Load `path` (a missing file means defaults), then apply the
    /// `SENSOR_*` environment overrides. `.env` is read first if present.
    pub fn load(path: &Path) -> Result<Self> {
        let _ = dotenv::dotenv();
        let mut config = Self::load_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let config_content = fs::read_to_string(path).map_err(|e| {
            IngestError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.source.api_url = Some(url);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.source.timeout_secs = parse_env(ENV_TIMEOUT_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_SERVER_PORT) {
            self.server.port = parse_env(ENV_SERVER_PORT, &raw)?;
        }
        if let Some(dir) = lookup(ENV_LOG_DIR).filter(|v| !v.trim().is_empty()) {
            self.logging.dir = dir;
        }
        self.check()
    }

    fn check(&self) -> Result<()> {
        if self.source.timeout_secs == 0 {
            return Err(IngestError::Config(
                "source.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| IngestError::Config(format!("Invalid value for {key}: '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.source.timeout_secs, 30);
        assert_eq!(config.server.port, 8501);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[source]\napi_url = \"http://sensors.local/readings\"\ntimeout_secs = 5\n"
        )
        .unwrap();

        let config = Config::load_file(file.path()).unwrap();
        assert_eq!(config.source.api_url.as_deref(), Some("http://sensors.local/readings"));
        assert_eq!(config.source.timeout_secs, 5);
        assert_eq!(config.logging.dir, "logs");
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let err = Config::from_toml("[source]\ntimeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, IngestError::Config(_)));
    }

    #[test]
    fn test_bad_toml_is_reported() {
        let err = Config::from_toml("[source\n").unwrap_err();
        assert!(matches!(err, IngestError::Toml(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_API_URL, "http://override/readings"),
            (ENV_TIMEOUT_SECS, "12"),
            (ENV_SERVER_PORT, "9000"),
        ]);
        let mut config = Config::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.source.api_url.as_deref(), Some("http://override/readings"));
        assert_eq!(config.source.timeout_secs, 12);
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|k| (k == ENV_SERVER_PORT).then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_SERVER_PORT));
    }
}

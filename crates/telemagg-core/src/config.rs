//! telemagg.toml configuration.
//!
//! Every field has a documented fallback so an empty file (or no file at
//! all) yields a runnable configuration; command-line flags are applied on
//! top by the daemon before [`AggregatorConfig::validate`] runs.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_SOURCE_URL: &str = "http://127.0.0.1:9001/counters";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
pub const DEFAULT_POLL_INTERVAL_SECS: f64 = 10.0;
pub const DEFAULT_FETCH_TIMEOUT_SECS: f64 = 8.0;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_BASE_SECS: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Upstream endpoint returning delimited tabular text.
    pub source_url: String,
    /// Address the read API binds to.
    pub listen: String,
    /// Sleep between ingestion cycles.
    pub poll_interval_secs: f64,
    /// Upper bound on a single fetch, connect through body.
    pub fetch_timeout_secs: f64,
    /// Total fetch attempts per cycle, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each attempt after.
    pub backoff_base_secs: f64,
    pub parser: ParserConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Field separator. Must be a single character.
    pub delimiter: char,
    /// Header names accepted as the identifier column; the first present wins.
    pub id_columns: Vec<String>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            listen: DEFAULT_LISTEN.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base_secs: DEFAULT_BACKOFF_BASE_SECS,
            parser: ParserConfig::default(),
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            id_columns: vec!["entity_id".to_string(), "switch_id".to_string()],
        }
    }
}

impl AggregatorConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reject values the ingestion worker cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.source_url.starts_with("http://") {
            return Err(ConfigError::Invalid(format!(
                "source_url must be an http:// URL, got {:?}",
                self.source_url
            )));
        }
        positive("poll_interval_secs", self.poll_interval_secs)?;
        positive("fetch_timeout_secs", self.fetch_timeout_secs)?;
        if !(self.backoff_base_secs.is_finite() && self.backoff_base_secs >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "backoff_base_secs must be >= 0, got {}",
                self.backoff_base_secs
            )));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".into()));
        }
        if self.parser.id_columns.is_empty() {
            return Err(ConfigError::Invalid(
                "parser.id_columns must name at least one column".into(),
            ));
        }
        delimiter_byte(self.parser.delimiter)?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        secs(self.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS)
    }

    pub fn fetch_timeout(&self) -> Duration {
        secs(self.fetch_timeout_secs, DEFAULT_FETCH_TIMEOUT_SECS)
    }

    pub fn backoff_base(&self) -> Duration {
        secs(self.backoff_base_secs, DEFAULT_BACKOFF_BASE_SECS)
    }
}

fn positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{field} must be > 0, got {value}")))
    }
}

/// The delimiter as the single byte the record reader splits on.
pub(crate) fn delimiter_byte(delimiter: char) -> Result<u8, ConfigError> {
    match u8::try_from(delimiter) {
        Ok(b) if b.is_ascii() && !matches!(b, b'"' | b'\n' | b'\r') => Ok(b),
        _ => Err(ConfigError::Invalid(format!(
            "parser.delimiter {delimiter:?} must be an ASCII character other than a quote or line break"
        ))),
    }
}

fn secs(value: f64, fallback: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_else(|_| Duration::from_secs_f64(fallback))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_fallbacks() {
        let config = AggregatorConfig::from_toml_str("").unwrap();
        assert_eq!(config, AggregatorConfig::default());
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(8));
        assert_eq!(config.backoff_base(), Duration::from_secs(1));
        config.validate().unwrap();
    }

    #[test]
    fn parse_full_file() {
        let toml_str = r#"
source_url = "http://upstream:9001/counters"
listen = "0.0.0.0:9090"
poll_interval_secs = 30
fetch_timeout_secs = 2.5
max_attempts = 5
backoff_base_secs = 0.25

[parser]
delimiter = ";"
id_columns = ["host"]
"#;
        let config = AggregatorConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.source_url, "http://upstream:9001/counters");
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.fetch_timeout(), Duration::from_millis(2500));
        assert_eq!(config.backoff_base(), Duration::from_millis(250));
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.parser.delimiter, ';');
        assert_eq!(config.parser.id_columns, vec!["host".to_string()]);
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_https_source() {
        let config = AggregatorConfig {
            source_url: "https://upstream/counters".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn validate_rejects_zero_values() {
        let zero_attempts = AggregatorConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(zero_attempts.validate().is_err());

        let zero_interval = AggregatorConfig {
            poll_interval_secs: 0.0,
            ..Default::default()
        };
        assert!(zero_interval.validate().is_err());

        let negative_backoff = AggregatorConfig {
            backoff_base_secs: -1.0,
            ..Default::default()
        };
        assert!(negative_backoff.validate().is_err());
    }

    #[test]
    fn validate_requires_ascii_delimiter() {
        for delimiter in ['"', '\n', '\r', '§', '→'] {
            let config = AggregatorConfig {
                parser: ParserConfig {
                    delimiter,
                    ..Default::default()
                },
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{delimiter:?}");
        }

        let tab = AggregatorConfig {
            parser: ParserConfig {
                delimiter: '\t',
                ..Default::default()
            },
            ..Default::default()
        };
        tab.validate().unwrap();
    }

    #[test]
    fn unknown_toml_is_an_error() {
        assert!(matches!(
            AggregatorConfig::from_toml_str("max_attempts = \"three\""),
            Err(ConfigError::Toml(_))
        ));
    }
}

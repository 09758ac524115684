use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Runtime settings, read once from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    /// Remote alert feed. The simulated feed is used when unset.
    pub alerts_url: Option<String>,
    pub poll_interval: Duration,
    pub mock_latency: Duration,
    pub data_dir: PathBuf,
    /// Zone used to display "last updated" times.
    pub timezone: Tz,
    pub operator_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            alerts_url: None,
            poll_interval: Duration::from_secs(60),
            mock_latency: Duration::from_millis(500),
            data_dir: PathBuf::from("./data"),
            timezone: chrono_tz::America::Bogota,
            operator_name: "Metro de Medellín".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let poll_secs: u64 = parse_or(get("POLL_INTERVAL_SECS"), "POLL_INTERVAL_SECS", 60)?;
        if poll_secs == 0 {
            return Err(anyhow!("POLL_INTERVAL_SECS must be positive"));
        }
        let latency_ms: u64 = parse_or(get("MOCK_LATENCY_MS"), "MOCK_LATENCY_MS", 500)?;

        let timezone = match get("TIMEZONE") {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|e| anyhow!("Invalid TIMEZONE {}: {}", name, e))?,
            None => defaults.timezone,
        };

        Ok(Self {
            port: parse_or(get("PORT"), "PORT", defaults.port)?,
            alerts_url: get("ALERTS_URL"),
            poll_interval: Duration::from_secs(poll_secs),
            mock_latency: Duration::from_millis(latency_ms),
            data_dir: get("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            timezone,
            operator_name: get("OPERATOR_NAME").unwrap_or(defaults.operator_name),
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v
            .trim()
            .parse()
            .with_context(|| format!("Invalid {} variable: {:?}", key, v)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.mock_latency, Duration::from_millis(500));
        assert!(config.alerts_url.is_none());
        assert_eq!(config.timezone, chrono_tz::America::Bogota);
        assert_eq!(config.operator_name, "Metro de Medellín");
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("PORT", "8080"),
            ("ALERTS_URL", "http://feed.local/alerts"),
            ("POLL_INTERVAL_SECS", "15"),
            ("TIMEZONE", "Europe/London"),
            ("DATA_DIR", "/tmp/metro"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.alerts_url.as_deref(), Some("http://feed.local/alerts"));
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.timezone, chrono_tz::Europe::London);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/metro"));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = config(&[("PORT", "  "), ("ALERTS_URL", "")]).unwrap();
        assert_eq!(config.port, 3000);
        assert!(config.alerts_url.is_none());
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(config(&[("PORT", "http")]).is_err());
        assert!(config(&[("POLL_INTERVAL_SECS", "0")]).is_err());
        assert!(config(&[("TIMEZONE", "Mars/Olympus")]).is_err());
    }
}

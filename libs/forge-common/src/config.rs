// Service configuration, read from the environment

use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub redis_url: String,
    pub judge_url: String,
    pub judge_timeout_seconds: u64,
    pub bind_addr: String,
    pub languages_config: PathBuf,
    /// None keeps submissions forever
    pub submission_ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid value for {var}: '{value}'")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            judge_url: "http://127.0.0.1:2358".to_string(),
            judge_timeout_seconds: 30,
            bind_addr: "0.0.0.0:3000".to_string(),
            languages_config: PathBuf::from("config/languages.json"),
            submission_ttl_seconds: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; unset variables keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let ttl: u64 = parse_or(&lookup, "SUBMISSION_TTL_SECONDS", 0)?;

        Ok(Self {
            redis_url: lookup("REDIS_URL").unwrap_or(defaults.redis_url),
            judge_url: lookup("JUDGE_URL").unwrap_or(defaults.judge_url),
            judge_timeout_seconds: parse_or(
                &lookup,
                "JUDGE_TIMEOUT_SECONDS",
                defaults.judge_timeout_seconds,
            )?,
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            languages_config: lookup("LANGUAGES_CONFIG")
                .map(PathBuf::from)
                .unwrap_or(defaults.languages_config),
            submission_ttl_seconds: (ttl > 0).then_some(ttl),
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.submission_ttl_seconds, None);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("REDIS_URL", "redis://cache:6379"),
            ("JUDGE_URL", "http://judge:8080"),
            ("JUDGE_TIMEOUT_SECONDS", "12"),
            ("SUBMISSION_TTL_SECONDS", "3600"),
        ]))
        .unwrap();

        assert_eq!(config.redis_url, "redis://cache:6379");
        assert_eq!(config.judge_url, "http://judge:8080");
        assert_eq!(config.judge_timeout_seconds, 12);
        assert_eq!(config.submission_ttl_seconds, Some(3600));
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn test_invalid_number() {
        let err = Config::from_lookup(lookup_from(&[("JUDGE_TIMEOUT_SECONDS", "soon")])).unwrap_err();
        assert_eq!(err.var, "JUDGE_TIMEOUT_SECONDS");
        assert_eq!(err.to_string(), "Invalid value for JUDGE_TIMEOUT_SECONDS: 'soon'");
    }
}

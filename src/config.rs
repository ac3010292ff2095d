//! Client configuration from environment variables
//!
//! Variables:
//! - `STATBANK_API_URL`: API base URL (default `https://api.statbank.dk/v1`)
//! - `API_TIMEOUT`: request timeout in seconds (default 30)
//! - `DEFAULT_LANGUAGE`: `en` or `da` (default `en`)
//! - `STATBANK_FETCH_WORKERS`: worker threads for bulk lookups (0/1 = sequential)
//! - `LOG_LEVEL`: tracing filter (default `info`)
//! - `DEBUG`: `true` forces the `debug` log level
//!
//! A `.env` file in the working directory is read first; variables already
//! set in the process environment take precedence over it.
//!
//! Empty values count as unset. Invalid values are reported and replaced by
//! the default; configuration never fails to load.

use crate::statbank::models::SUPPORTED_LANGUAGES;
use crate::statbank::{FetchStrategy, Language};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.statbank.dk/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DOTENV_FILE: &str = ".env";

/// Reads configuration values with type-safe conversions and explicit defaults
pub struct EnvReader {
    vars: HashMap<String, String>,
}

impl EnvReader {
    /// Process environment layered over `.env` in the working directory
    pub fn from_env() -> Self {
        Self::from_env_with_file(DOTENV_FILE)
    }

    /// Process environment layered over the given dotenv file
    pub fn from_env_with_file(path: impl AsRef<Path>) -> Self {
        let mut reader = Self::from_dotenv_file(path);
        reader.vars.extend(std::env::vars());
        reader
    }

    /// Variables of a dotenv file; a missing file yields none
    pub fn from_dotenv_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let iter = match dotenvy::from_path_iter(path) {
            Ok(iter) => iter,
            Err(e) => {
                if !e.not_found() {
                    tracing::warn!("Failed to read '{}': {}", path.display(), e);
                }
                return Self::from_pairs(std::iter::empty::<(String, String)>());
            }
        };

        let mut vars = HashMap::new();
        for item in iter {
            match item {
                Ok((key, value)) => {
                    vars.insert(key, value);
                }
                Err(e) => tracing::warn!("Skipping line in '{}': {}", path.display(), e),
            }
        }
        EnvReader { vars }
    }

    /// Build from explicit key/value pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        EnvReader {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Get raw value (None if not set or empty)
    fn get_raw(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Get string value with explicit default
    pub fn get_string(&self, name: &str, default: &str) -> String {
        self.get_raw(name).unwrap_or(default).to_string()
    }

    /// Get positive integer value with validation and explicit default
    pub fn get_u64(&self, name: &str, default: u64) -> u64 {
        match self.get_raw(name) {
            None => default,
            Some(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
                tracing::warn!(
                    "Invalid integer value for '{}': '{}', using default: {}",
                    name,
                    raw,
                    default
                );
                default
            }),
        }
    }

    /// Get boolean value (case-insensitive "true"/"false") with explicit default
    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        match self.get_raw(name) {
            Some(raw) if raw.eq_ignore_ascii_case("true") => true,
            Some(raw) if raw.eq_ignore_ascii_case("false") => false,
            Some(other) => {
                tracing::warn!(
                    "Invalid boolean value for '{}': '{}', using default: {}",
                    name,
                    other,
                    default
                );
                default
            }
            None => default,
        }
    }

    /// Get a value restricted to `allowed` (case-insensitive), else the default
    pub fn get_enum(&self, name: &str, allowed: &[&str], default: &str) -> String {
        match self.get_raw(name) {
            None => default.to_string(),
            Some(raw) => match allowed.iter().find(|a| a.eq_ignore_ascii_case(raw)) {
                Some(value) => value.to_string(),
                None => {
                    tracing::warn!(
                        "Invalid value for '{}': '{}' (expected one of {:?}), using default: {}",
                        name,
                        raw,
                        allowed,
                        default
                    );
                    default.to_string()
                }
            },
        }
    }
}

/// Settings the client is built from
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL, without trailing slash
    pub base_url: String,

    /// Global per-request timeout
    pub timeout: Duration,

    /// Language used when the caller does not pick one
    pub default_language: Language,

    /// Execution of per-variable lookups in bulk operations
    pub fetch_strategy: FetchStrategy,

    /// tracing filter directive, e.g. "info" or "statbank_explorer=debug"
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_language: Language::new(DEFAULT_LANGUAGE),
            fetch_strategy: FetchStrategy::Sequential,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_reader(&EnvReader::from_env())
    }

    /// Load configuration from a reader
    pub fn from_reader(env: &EnvReader) -> Self {
        let base_url = env
            .get_string("STATBANK_API_URL", DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();

        // Zero would disable the timeout entirely
        let timeout_secs = match env.get_u64("API_TIMEOUT", DEFAULT_TIMEOUT_SECS) {
            0 => {
                tracing::warn!(
                    "API_TIMEOUT must be positive, using default: {}",
                    DEFAULT_TIMEOUT_SECS
                );
                DEFAULT_TIMEOUT_SECS
            }
            secs => secs,
        };

        let default_language = Language::new(env.get_enum(
            "DEFAULT_LANGUAGE",
            SUPPORTED_LANGUAGES,
            DEFAULT_LANGUAGE,
        ));

        let workers = env.get_u64("STATBANK_FETCH_WORKERS", 0);
        let fetch_strategy = FetchStrategy::with_workers(workers as usize);

        let log_level = if env.get_bool("DEBUG", false) {
            "debug".to_string()
        } else {
            env.get_string("LOG_LEVEL", DEFAULT_LOG_LEVEL).to_lowercase()
        };

        Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            default_language,
            fetch_strategy,
            log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> ClientConfig {
        ClientConfig::from_reader(&EnvReader::from_pairs(pairs.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg.base_url, DEFAULT_API_URL);
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.default_language.as_str(), "en");
        assert_eq!(cfg.fetch_strategy, FetchStrategy::Sequential);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("STATBANK_API_URL", "http://localhost:8080/v1/"),
            ("API_TIMEOUT", "5"),
            ("DEFAULT_LANGUAGE", "DA"),
            ("STATBANK_FETCH_WORKERS", "4"),
            ("LOG_LEVEL", "WARN"),
        ]);
        assert_eq!(cfg.base_url, "http://localhost:8080/v1");
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(cfg.default_language.as_str(), "da");
        assert_eq!(cfg.fetch_strategy, FetchStrategy::Concurrent { workers: 4 });
        assert_eq!(cfg.log_level, "warn");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let cfg = config(&[
            ("API_TIMEOUT", "soon"),
            ("DEFAULT_LANGUAGE", "de"),
            ("STATBANK_FETCH_WORKERS", "-2"),
        ]);
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.default_language.as_str(), "en");
        assert_eq!(cfg.fetch_strategy, FetchStrategy::Sequential);

        assert_eq!(config(&[("API_TIMEOUT", "0")]).timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_empty_counts_as_unset() {
        let cfg = config(&[("STATBANK_API_URL", "  "), ("LOG_LEVEL", "")]);
        assert_eq!(cfg.base_url, DEFAULT_API_URL);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_debug_flag_forces_debug_level() {
        let cfg = config(&[("DEBUG", "True"), ("LOG_LEVEL", "error")]);
        assert_eq!(cfg.log_level, "debug");

        let cfg = config(&[("DEBUG", "maybe"), ("LOG_LEVEL", "error")]);
        assert_eq!(cfg.log_level, "error");
    }

    fn dotenv_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("statbank-{}-{}.env", name, std::process::id()))
    }

    #[test]
    fn test_dotenv_file_is_read() {
        let path = dotenv_path("read");
        std::fs::write(
            &path,
            "# local settings\nSTATBANK_API_URL=http://localhost:9000/v1\nAPI_TIMEOUT=\"12\"\n",
        )
        .unwrap();

        let cfg = ClientConfig::from_reader(&EnvReader::from_dotenv_file(&path));
        std::fs::remove_file(&path).unwrap();

        assert_eq!(cfg.base_url, "http://localhost:9000/v1");
        assert_eq!(cfg.timeout, Duration::from_secs(12));
    }

    #[test]
    fn test_missing_dotenv_file_is_empty() {
        let reader = EnvReader::from_dotenv_file(dotenv_path("missing"));
        assert_eq!(reader.get_string("STATBANK_API_URL", "unset"), "unset");
    }

    #[test]
    fn test_process_env_wins_over_dotenv() {
        std::env::set_var("STATBANK_LAYER_CHECK", "process");
        let path = dotenv_path("layered");
        std::fs::write(&path, "STATBANK_LAYER_CHECK=file\nSTATBANK_DOTENV_ONLY=yes\n").unwrap();

        let reader = EnvReader::from_env_with_file(&path);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(reader.get_string("STATBANK_DOTENV_ONLY", "no"), "yes");
        assert_eq!(reader.get_string("STATBANK_LAYER_CHECK", ""), "process");
    }
}

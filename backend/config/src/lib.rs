//! Environment-driven configuration.
//!
//! Required credentials are validated here, at startup: a missing
//! `OCR_ENDPOINT`, `OCR_KEY`, or `CHAT_API_KEY` is a configuration error
//! before the first request, never a per-request failure. Secret values are
//! redacted in Debug output so the config can be logged safely.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use finsight_core::FinsightError;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DB_PATH: &str = "finsight.db";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Runtime configuration for finsight.
#[derive(Clone)]
pub struct Config {
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// SQLite database path
    pub db_path: String,
    /// Azure Document Intelligence endpoint
    pub ocr_endpoint: String,
    /// Azure Document Intelligence key
    pub ocr_key: String,
    /// Override for the analyze API version
    pub ocr_api_version: Option<String>,
    /// Gemini API key
    pub chat_api_key: String,
    /// Gemini model id
    pub chat_model: String,
    /// Timeout applied to outbound OCR and chat calls
    pub request_timeout_secs: u64,
    /// Log level
    pub log_level: String,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, FinsightError> {
        Self::from_vars(&std::env::vars().collect())
    }

    /// Load configuration from an explicit variable map (used by tests).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, FinsightError> {
        Ok(Self {
            bind_address: optional(vars, "FINSIGHT_BIND").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(vars, "FINSIGHT_PORT", DEFAULT_PORT)?,
            db_path: optional(vars, "FINSIGHT_DB").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            ocr_endpoint: required(vars, "OCR_ENDPOINT")?,
            ocr_key: required(vars, "OCR_KEY")?,
            ocr_api_version: optional(vars, "OCR_MODEL_API_VERSION"),
            chat_api_key: required(vars, "CHAT_API_KEY")?,
            chat_model: optional(vars, "CHAT_MODEL")
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            request_timeout_secs: parse_or(vars, "REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            log_level: optional(vars, "RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Bounded timeout for outbound OCR and chat calls.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("port", &self.port)
            .field("db_path", &self.db_path)
            .field("ocr_endpoint", &self.ocr_endpoint)
            .field("ocr_key", &redact(&self.ocr_key))
            .field("ocr_api_version", &self.ocr_api_version)
            .field("chat_api_key", &redact(&self.chat_api_key))
            .field("chat_model", &self.chat_model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Keep a short prefix so operators can tell keys apart in logs.
fn redact(secret: &str) -> String {
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        let prefix: String = secret.chars().take(4).collect();
        format!("{prefix}****")
    }
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, FinsightError> {
    match vars.get(name) {
        Some(value) if !value.trim().is_empty() => Ok(value.clone()),
        _ => Err(FinsightError::Config(format!(
            "required environment variable {name} is not set"
        ))),
    }
}

fn optional(vars: &HashMap<String, String>, name: &str) -> Option<String> {
    vars.get(name).filter(|v| !v.trim().is_empty()).cloned()
}

fn parse_or<T>(vars: &HashMap<String, String>, name: &str, default: T) -> Result<T, FinsightError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match optional(vars, name) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| FinsightError::Config(format!("invalid value for {name}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn minimal() -> HashMap<String, String> {
        vars(&[
            ("OCR_ENDPOINT", "https://example.cognitiveservices.azure.com"),
            ("OCR_KEY", "azure-key-12345"),
            ("CHAT_API_KEY", "gemini-key-67890"),
        ])
    }

    #[test]
    fn minimal_env_applies_defaults() {
        let config = Config::from_vars(&minimal()).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.db_path, DEFAULT_DB_PATH);
        assert_eq!(config.chat_model, DEFAULT_CHAT_MODEL);
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.ocr_api_version, None);
    }

    #[test]
    fn missing_required_var_fails_at_load() {
        for name in ["OCR_ENDPOINT", "OCR_KEY", "CHAT_API_KEY"] {
            let mut env = minimal();
            env.remove(name);
            let err = Config::from_vars(&env).unwrap_err();
            match err {
                FinsightError::Config(message) => assert!(message.contains(name)),
                other => panic!("expected Config error, got {other:?}"),
            }
        }
    }

    #[test]
    fn blank_required_var_counts_as_missing() {
        let mut env = minimal();
        env.insert("OCR_KEY".into(), "   ".into());
        assert!(Config::from_vars(&env).is_err());
    }

    #[test]
    fn overrides_are_honored() {
        let mut env = minimal();
        env.insert("FINSIGHT_PORT".into(), "9090".into());
        env.insert("CHAT_MODEL".into(), "gemini-2.5-pro".into());
        env.insert("REQUEST_TIMEOUT_SECS".into(), "15".into());
        let config = Config::from_vars(&env).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.chat_model, "gemini-2.5-pro");
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn invalid_port_is_a_config_error() {
        let mut env = minimal();
        env.insert("FINSIGHT_PORT".into(), "not-a-port".into());
        assert!(matches!(
            Config::from_vars(&env),
            Err(FinsightError::Config(_))
        ));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = Config::from_vars(&minimal()).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("azure-key-12345"));
        assert!(!debug.contains("gemini-key-67890"));
        assert!(debug.contains("azur****"));
    }
}

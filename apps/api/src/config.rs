use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Optional at startup. Routes that need the model report a configuration
    /// error per request when it is absent.
    pub gemini_api_key: Option<String>,
    /// Overrides the Gemini models endpoint, e.g. for a regional proxy.
    pub gemini_api_base: Option<String>,
    pub llm_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_api_base: optional_env("GEMINI_API_BASE"),
            llm_timeout_secs: std::env::var("LLM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Blank values count as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_env_blank_is_none() {
        std::env::set_var("FEEDBACK_API_TEST_BLANK", "   ");
        assert_eq!(optional_env("FEEDBACK_API_TEST_BLANK"), None);
    }

    #[test]
    fn test_optional_env_trims_value() {
        std::env::set_var("FEEDBACK_API_TEST_KEY", " abc123 ");
        assert_eq!(
            optional_env("FEEDBACK_API_TEST_KEY"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_require_env_missing_names_variable() {
        let err = require_env("FEEDBACK_API_TEST_DEFINITELY_UNSET").unwrap_err();
        assert!(err.to_string().contains("FEEDBACK_API_TEST_DEFINITELY_UNSET"));
    }
}

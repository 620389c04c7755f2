//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which generative model backend produces recipes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AiProvider {
    Gemini,
    OpenAi,
    /// Canned replies, for local development without credentials.
    Fake,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub cors_origin: String,
    pub ai_provider: AiProvider,
    pub google_ai_model: String,
    pub gemini_api_key: Option<String>,
    pub google_cloud_project: Option<String>,
    pub google_cloud_location: String,
    pub google_access_token: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub ai_timeout: Duration,
    pub ai_max_attempts: u32,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str = match std::env::var("BIND_ADDRESS") {
            Ok(addr) => addr,
            Err(_) => format!(
                "0.0.0.0:{}",
                std::env::var("PORT").unwrap_or_else(|_| "3000".to_string())
            ),
        };
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = required("DATABASE_URL")?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        // --- Load Auth Settings ---
        let jwt_secret = required("JWT_SECRET")?;
        let token_ttl = Duration::from_secs(parse_or("TOKEN_TTL_HOURS", 24u64)? * 60 * 60);

        // --- Load Generation Settings ---
        let ai_provider = match std::env::var("AI_PROVIDER")
            .unwrap_or_else(|_| "gemini".to_string())
            .to_lowercase()
            .as_str()
        {
            "gemini" => AiProvider::Gemini,
            "openai" => AiProvider::OpenAi,
            "fake" => AiProvider::Fake,
            other => {
                return Err(ConfigError::InvalidValue(
                    "AI_PROVIDER".to_string(),
                    format!("'{}' is not one of gemini, openai, fake", other),
                ))
            }
        };

        let google_ai_model =
            std::env::var("GOOGLE_AI_MODEL").unwrap_or_else(|_| "gemini-1.5-pro".to_string());
        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok();
        let google_cloud_project = std::env::var("GOOGLE_CLOUD_PROJECT")
            .ok()
            .filter(|p| !p.is_empty());
        let google_cloud_location =
            std::env::var("GOOGLE_CLOUD_LOCATION").unwrap_or_else(|_| "us-west1".to_string());
        let google_access_token = std::env::var("GOOGLE_ACCESS_TOKEN").ok();

        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let openai_model =
            std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let ai_timeout = Duration::from_secs(parse_or("AI_TIMEOUT_SECS", 30u64)?);
        let ai_max_attempts = parse_or("AI_MAX_ATTEMPTS", 2u32)?.max(1);

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            jwt_secret,
            token_ttl,
            cors_origin,
            ai_provider,
            google_ai_model,
            gemini_api_key,
            google_cloud_project,
            google_cloud_location,
            google_access_token,
            openai_api_key,
            openai_model,
            ai_timeout,
            ai_max_attempts,
        })
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

fn parse_or<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

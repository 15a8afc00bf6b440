//! services/app/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use dream_path_core::imagery::DEFAULT_IMAGE_BASE_URL;
use dream_path_core::{AugmentStrategy, DecodePolicy, OrchestratorSettings};
use std::path::PathBuf;
use tracing::Level;

pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-001";
pub const DEFAULT_APP_TITLE: &str = "Dream Path Education App";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub log_level: Level,
    pub provider_api_key: Option<String>,
    pub provider_base_url: String,
    pub model: String,
    pub app_title: String,
    pub app_referer: String,
    /// `None` selects the local fallback store.
    pub database_url: Option<String>,
    pub data_dir: PathBuf,
    pub image_base_url: String,
    pub strict_decoding: bool,
    pub image_concurrency: usize,
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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Provider Settings ---
        let provider_api_key = lookup("OPENROUTER_API_KEY");
        let provider_base_url = lookup("OPENROUTER_BASE_URL")
            .unwrap_or_else(|| DEFAULT_PROVIDER_BASE_URL.to_string());
        let model = lookup("GENERATION_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let app_title = lookup("APP_TITLE").unwrap_or_else(|| DEFAULT_APP_TITLE.to_string());
        let app_referer =
            lookup("APP_REFERER").unwrap_or_else(|| "http://localhost".to_string());

        // --- Storage Settings ---
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let data_dir = lookup("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".dreampath"));

        // --- Generation Settings ---
        let image_base_url =
            lookup("IMAGE_BASE_URL").unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string());
        let strict_decoding = match lookup("STRICT_DECODING") {
            Some(value) => parse_bool("STRICT_DECODING", &value)?,
            None => false,
        };
        let image_concurrency = match lookup("IMAGE_CONCURRENCY") {
            Some(value) => value.trim().parse::<usize>().map_err(|e| {
                ConfigError::InvalidValue("IMAGE_CONCURRENCY".to_string(), e.to_string())
            })?,
            None => 1,
        };

        Ok(Self {
            log_level,
            provider_api_key,
            provider_base_url,
            model,
            app_title,
            app_referer,
            database_url,
            data_dir,
            image_base_url,
            strict_decoding,
            image_concurrency,
        })
    }

    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            decode_policy: if self.strict_decoding {
                DecodePolicy::Strict
            } else {
                DecodePolicy::Lenient
            },
            augment_strategy: AugmentStrategy::from_concurrency(self.image_concurrency),
        }
    }

    /// Only postgres URLs select the remote backend.
    pub fn has_valid_database_url(&self) -> bool {
        self.database_url.as_deref().is_some_and(|url| {
            url.starts_with("postgres://") || url.starts_with("postgresql://")
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{}' is not a boolean", other),
        )),
    }
}

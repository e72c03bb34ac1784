use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Credential baked in at build time, used when nothing is stored locally.
const BUILD_DEFAULT_API_KEY: Option<&str> = option_env!("FINAURA_GROQ_API_KEY");

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LLMConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Clone, Deserialize)]
pub struct LLMConfig {
    pub provider: String,
    pub api_base: Option<String>,
    pub model: String,
    pub default_api_key: Option<String>,
    pub analysis_temperature: f32,
    pub chat_temperature: f32,
    pub chat_history_limit: usize,
}

impl std::fmt::Debug for LLMConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LLMConfig")
            .field("provider", &self.provider)
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("default_api_key", &self.default_api_key.as_ref().map(|_| "<redacted>"))
            .field("analysis_temperature", &self.analysis_temperature)
            .field("chat_temperature", &self.chat_temperature)
            .field("chat_history_limit", &self.chat_history_limit)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub settings_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            server: ServerConfig {
                port: parse_var("PORT", &var("PORT", "3000"))?,
                host: var("HOST", "0.0.0.0"),
                cors_allowed_origins: var(
                    "ALLOWED_ORIGINS",
                    "http://localhost:3000,http://localhost:5173",
                )
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            },
            llm: LLMConfig {
                provider: var("LLM_PROVIDER", "groq").to_lowercase(),
                api_base: lookup("LLM_API_BASE").filter(|s| !s.trim().is_empty()),
                model: var("LLM_MODEL", "llama-3.3-70b-versatile"),
                default_api_key: lookup("GROQ_API_KEY")
                    .or_else(|| BUILD_DEFAULT_API_KEY.map(str::to_string))
                    .filter(|s| !s.trim().is_empty()),
                analysis_temperature: parse_var(
                    "ANALYSIS_TEMPERATURE",
                    &var("ANALYSIS_TEMPERATURE", "0.15"),
                )?,
                chat_temperature: parse_var("CHAT_TEMPERATURE", &var("CHAT_TEMPERATURE", "0.4"))?,
                chat_history_limit: parse_var(
                    "CHAT_HISTORY_LIMIT",
                    &var("CHAT_HISTORY_LIMIT", "20"),
                )?,
            },
            storage: StorageConfig {
                settings_dir: lookup("FINAURA_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| default_data_dir(&lookup)),
            },
        })
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("invalid value for {key}: {raw:?}"))
}

// XDG data directory, falling back to ~/.local/share, then the working directory
fn default_data_dir<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|| lookup("HOME").map(|h| PathBuf::from(h).join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("finaura")
}

//! Configuration types, loaded once from the environment at startup.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};
use crate::plan::{GeneratorConfig, RoadmapSchema};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_PATH: &str = "./data/career-guide.db";
const DEFAULT_TIMEOUT_SECS: u64 = 45;

/// Hosted auth service used to verify access tokens.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub url: String,
    pub anon_key: SecretString,
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP listen port.
    pub port: u16,
    /// libSQL database file.
    pub db_path: PathBuf,
    /// Model settings; `None` when no credential is set for the selected backend.
    pub llm: Option<LlmConfig>,
    pub generator: GeneratorConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = parse_or(&get, "CAREER_GUIDE_PORT", DEFAULT_PORT)?;
        let db_path = get("CAREER_GUIDE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let backend: LlmBackend = parse_or(&get, "CAREER_GUIDE_LLM_BACKEND", LlmBackend::OpenAi)?;
        let llm = get(backend.api_key_var()).map(|key| LlmConfig {
            backend,
            api_key: SecretString::from(key),
            model: get("CAREER_GUIDE_MODEL")
                .unwrap_or_else(|| backend.default_model().to_string()),
        });

        let timeout_secs: u64 =
            parse_or(&get, "CAREER_GUIDE_GENERATION_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CAREER_GUIDE_GENERATION_TIMEOUT_SECS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        let roadmap_schema: RoadmapSchema =
            parse_or(&get, "CAREER_GUIDE_ROADMAP_SCHEMA", RoadmapSchema::default())?;

        let generator = GeneratorConfig {
            timeout: Duration::from_secs(timeout_secs),
            roadmap_schema,
            ..Default::default()
        };

        let auth = AuthConfig {
            url: get("AUTH_URL").ok_or_else(|| ConfigError::MissingEnvVar("AUTH_URL".to_string()))?,
            anon_key: get("AUTH_ANON_KEY")
                .map(SecretString::from)
                .ok_or_else(|| ConfigError::MissingEnvVar("AUTH_ANON_KEY".to_string()))?,
        };

        Ok(Self {
            port,
            db_path,
            llm,
            generator,
            auth,
        })
    }
}

fn parse_or<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

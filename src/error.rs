//! Error types for the career guide service.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Intake error: {0}")]
    Intake(#[from] IntakeError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Identity verification errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No access token supplied")]
    MissingToken,

    #[error("Access token rejected (status {status})")]
    Rejected { status: u16 },

    #[error("Identity service unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed identity response: {0}")]
    MalformedResponse(String),
}

/// Plan generation errors.
///
/// Summary generation swallows every variant and substitutes the fallback
/// plan; roadmap generation propagates them.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("No model credential configured")]
    Unavailable,

    #[error("Model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Model returned malformed JSON: {0}")]
    MalformedJson(String),

    #[error("Model output does not match the plan schema: {0}")]
    SchemaMismatch(String),
}

/// Caller-facing errors of the intake and roadmap operations.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("not authenticated")]
    Unauthorized,

    #[error("failed to create session: {0}")]
    SessionCreateFailed(DatabaseError),

    #[error("{0}")]
    Validation(String),

    #[error("plan generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("storage error: {0}")]
    Storage(DatabaseError),
}

impl From<axum::extract::rejection::JsonRejection> for IntakeError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;

impl IntakeError {
    /// HTTP status this error is reported with.
    pub fn status(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::SessionCreateFailed(_) | Self::Generation(_) | Self::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl axum::response::IntoResponse for IntakeError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (
            status,
            axum::Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

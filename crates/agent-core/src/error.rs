//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Model id is not in the catalog
    #[error("Model {0} not supported")]
    UnsupportedModel(String),

    /// Vendor credential absent from process configuration
    #[error("{provider} API key not found")]
    MissingCredential { provider: String },

    /// Catalog names a provider no adapter is registered for
    #[error("Provider {0} not supported")]
    UnsupportedProvider(String),

    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Model step exceeded its deadline
    #[error("Model call timed out after {0}s")]
    Timeout(u64),

    /// Tool not found in the resolved tool set
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool validation failed
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Caller may not access the requested resource
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// A reasoning run aborted on a model step
    #[error("Agent run failed: {0}")]
    RunFailed(#[source] Box<AgentError>),

    /// Agent id unknown to the history store
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Wrap a model-step failure as an aborted run.
    pub fn run_failed(cause: AgentError) -> Self {
        match cause {
            already @ AgentError::RunFailed(_) => already,
            other => AgentError::RunFailed(Box::new(other)),
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            AgentError::RunFailed(cause) => cause.is_retryable(),
            _ => matches!(
                self,
                AgentError::ProviderUnavailable(_)
                    | AgentError::RateLimited(_)
                    | AgentError::Timeout(_)
                    | AgentError::Io(_)
            ),
        }
    }

    /// Errors that come from static configuration and will fail identically on retry.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AgentError::UnsupportedModel(_)
                | AgentError::MissingCredential { .. }
                | AgentError::UnsupportedProvider(_)
                | AgentError::Config(_)
        )
    }

    /// Short machine-readable code for error payloads
    pub fn code(&self) -> &'static str {
        match self {
            AgentError::UnsupportedModel(_) => "UNSUPPORTED_MODEL",
            AgentError::MissingCredential { .. } => "MISSING_CREDENTIAL",
            AgentError::UnsupportedProvider(_) => "UNSUPPORTED_PROVIDER",
            AgentError::Unauthorized(_) => "UNAUTHORIZED",
            AgentError::AgentNotFound(_) => "AGENT_NOT_FOUND",
            AgentError::RunFailed(_) => "AGENT_RUN_FAILED",
            AgentError::Timeout(_) => "TIMEOUT",
            AgentError::RateLimited(_) => "RATE_LIMITED",
            _ => "AGENT_ERROR",
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AgentError::UnsupportedModel(id) => format!("Model {} not supported", id),
            AgentError::MissingCredential { provider } => {
                format!("The {} provider is not configured on this server.", provider)
            }
            AgentError::UnsupportedProvider(p) => format!("Provider {} not supported", p),
            AgentError::Provider(msg) => format!("The AI service encountered an error: {}", msg),
            AgentError::ProviderUnavailable(_) => "The AI service is currently unavailable. Please try again.".into(),
            AgentError::Timeout(_) => "The AI service took too long to respond. Please try again.".into(),
            AgentError::ToolNotFound(name) => format!("The tool '{}' is not available.", name),
            AgentError::ToolValidation(msg) => format!("Invalid tool input: {}", msg),
            AgentError::ToolExecution(msg) => format!("Tool error: {}", msg),
            AgentError::Unauthorized(_) => "You are not allowed to access this agent.".into(),
            AgentError::RunFailed(cause) => format!("Failed to process query: {}", cause.user_message()),
            AgentError::AgentNotFound(_) => "Agent not found".into(),
            AgentError::RateLimited(_) => "You've made too many requests. Please wait a moment.".into(),
            AgentError::Auth(_) => "Authentication failed. Please check your credentials.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_failed_delegates_retryability() {
        let err = AgentError::run_failed(AgentError::Timeout(30));
        assert!(err.is_retryable());
        assert!(matches!(err, AgentError::RunFailed(_)));

        let err = AgentError::run_failed(AgentError::Provider("bad request".into()));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_run_failed_is_not_nested() {
        let inner = AgentError::run_failed(AgentError::Timeout(1));
        let outer = AgentError::run_failed(inner);
        match outer {
            AgentError::RunFailed(cause) => assert!(matches!(*cause, AgentError::Timeout(1))),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_configuration_errors() {
        assert!(AgentError::UnsupportedModel("x".into()).is_configuration());
        assert!(AgentError::MissingCredential { provider: "openai".into() }.is_configuration());
        assert!(!AgentError::Provider("x".into()).is_configuration());
    }
}

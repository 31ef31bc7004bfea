//! Shared request plumbing for the HTTP vendor adapters.

use agent_core::error::{AgentError, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

/// Send a JSON request and decode the JSON reply, mapping transport and
/// status failures onto the engine's error taxonomy.
pub(crate) async fn send_json<T: DeserializeOwned>(provider: &str, request: RequestBuilder) -> Result<T> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            AgentError::ProviderUnavailable(format!("{provider}: request timed out"))
        } else {
            AgentError::ProviderUnavailable(format!("{provider}: {e}"))
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(provider, status, &body));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| AgentError::Provider(format!("{provider}: invalid response body: {e}")))
}

fn status_error(provider: &str, status: StatusCode, body: &str) -> AgentError {
    let detail = format!("{provider} ({status}): {}", body.trim());
    match status {
        StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(detail),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(detail),
        s if s.is_server_error() => AgentError::ProviderUnavailable(detail),
        _ => AgentError::Provider(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error("openai", StatusCode::TOO_MANY_REQUESTS, ""),
            AgentError::RateLimited(_)
        ));
        assert!(matches!(
            status_error("openai", StatusCode::UNAUTHORIZED, "bad key"),
            AgentError::Auth(_)
        ));
        assert!(status_error("openai", StatusCode::BAD_GATEWAY, "").is_retryable());
        assert!(matches!(
            status_error("openai", StatusCode::BAD_REQUEST, "nope"),
            AgentError::Provider(_)
        ));
    }
}

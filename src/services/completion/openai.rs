/// OpenAI-compatible chat-completion backend
///
/// API Flow:
/// 1. POST {api_url}/v1/chat/completions with a bearer key
/// 2. Read choices[0].message.content from the JSON response
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    services::completion::{CompletionClient, CompletionRequest},
};

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Clone)]
pub struct OpenAiClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl OpenAiClient {
    /// Creates a client whose every call is bounded by `timeout`
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.api_url)
    }
}

/// Pulls the first choice's text out of a raw response body
fn first_choice_content(body: &str) -> AppResult<String> {
    let parsed: CompletionResponse = serde_json::from_str(body).map_err(|e| {
        AppError::ExternalApi(format!("Invalid completion response format: {}", e))
    })?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AppError::ExternalApi("Completion response has no content".to_string()))
}

#[async_trait::async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> AppResult<String> {
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, timeout = e.is_timeout(), "Completion request failed");
                AppError::ExternalApi("Failed to reach completion service".to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to read completion response body");
            AppError::ExternalApi("Failed to read completion response".to_string())
        })?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body,
                "Completion service returned an error status"
            );
            return Err(AppError::ExternalApi(format!(
                "Completion service returned status {}",
                status
            )));
        }

        first_choice_content(&body)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_choice_content_success() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "[{\"id\": 1, \"comment\": \"ok\"}]"}}
            ]
        }"#;

        let content = first_choice_content(body).unwrap();
        assert_eq!(content, r#"[{"id": 1, "comment": "ok"}]"#);
    }

    #[test]
    fn test_first_choice_content_no_choices() {
        let err = first_choice_content(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, AppError::ExternalApi(_)));
    }

    #[test]
    fn test_first_choice_content_null_content() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        assert!(first_choice_content(body).is_err());
    }

    #[test]
    fn test_first_choice_content_not_json() {
        let err = first_choice_content("<html>gateway timeout</html>").unwrap_err();
        assert!(matches!(err, AppError::ExternalApi(_)));
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let client = OpenAiClient::new(
            "sk-test".to_string(),
            "https://api.example.com/".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.endpoint(), "https://api.example.com/v1/chat/completions");
        assert_eq!(client.name(), "openai");
    }
}

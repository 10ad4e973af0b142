use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct ChatRequest {
    message: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: String,
}

/// Outcome of a completed chat exchange. A backend-reported error is still a
/// completed exchange; transport failures surface as `Err` from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    Response(String),
    Error(String),
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Send one user message. The server answers `{"response": ...}` on
    /// success and `{"error": ...}` on failure; error bodies may arrive with
    /// a non-2xx status, so the body is parsed before the status is judged.
    pub async fn send_message(&self, message: &str) -> Result<ChatReply> {
        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest {
            message: message.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("chat request could not be sent")?;

        let status = response.status();
        let body: ChatResponse = response
            .json()
            .await
            .with_context(|| format!("unreadable chat response (status {})", status))?;

        if let Some(detail) = body.error {
            return Ok(ChatReply::Error(detail));
        }
        match body.response {
            Some(text) => Ok(ChatReply::Response(text)),
            None => Err(anyhow!("chat response carried neither response nor error (status {})", status)),
        }
    }

    /// Probe backend availability. Returns the reported status string;
    /// anything other than "connected" is non-nominal.
    pub async fn status(&self) -> Result<String> {
        let url = format!("{}/api/status", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("status probe could not be sent")?;

        if !response.status().is_success() {
            return Err(anyhow!("status probe failed with status: {}", response.status()));
        }

        let body: StatusResponse = response.json().await.context("unreadable status response")?;
        Ok(body.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_success_body() {
        let body: ChatResponse = serde_json::from_str(r#"{"response": "hello"}"#).unwrap();
        assert_eq!(body.response.as_deref(), Some("hello"));
        assert!(body.error.is_none());
    }

    #[test]
    fn parses_error_body() {
        let body: ChatResponse = serde_json::from_str(r#"{"error": "Response timeout"}"#).unwrap();
        assert_eq!(body.error.as_deref(), Some("Response timeout"));
        assert!(body.response.is_none());
    }

    #[test]
    fn parses_status_body() {
        let body: StatusResponse = serde_json::from_str(r#"{"status": "connected"}"#).unwrap();
        assert_eq!(body.status, "connected");
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = BackendClient::new("http://localhost:5000/");
        assert_eq!(client.base_url, "http://localhost:5000");
    }
}

//! HTTP client for the chat backend

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::Message;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid backend url: {0}")]
    InvalidUrl(String),

    #[error("backend returned status {0}")]
    Status(StatusCode),

    #[error("request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Body of `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<String>,
}

/// Successful reply from `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub response: String,
}

/// Stored conversation as served by `GET /api/conversations/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationRecord {
    pub conversation_id: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Anything that can answer a chat turn.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, request: ChatRequest) -> Result<ChatResponse, ClientError>;

    async fn fetch_conversation(&self, conversation_id: &str) -> Result<ConversationRecord, ClientError>;
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL with `segments` appended, each percent-encoded as a single
    /// path segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn send(&self, request: ChatRequest) -> Result<ChatResponse, ClientError> {
        let url = self.endpoint(&["api", "chat"])?;
        tracing::debug!(%url, has_conversation = request.conversation_id.is_some(), "sending chat request");

        let response = self.client.post(url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }

        let chat_response: ChatResponse = response.json().await?;
        Ok(chat_response)
    }

    async fn fetch_conversation(&self, conversation_id: &str) -> Result<ConversationRecord, ClientError> {
        let url = self.endpoint(&["api", "conversations", conversation_id])?;
        tracing::debug!(%url, "fetching conversation history");

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }

        let record: ConversationRecord = response.json().await?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_missing_id_as_null() {
        let request = ChatRequest {
            message: "Hello".to_string(),
            conversation_id: None,
        };
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value, serde_json::json!({ "message": "Hello", "conversation_id": null }));
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let client = ChatClient::new("http://localhost:8001/");
        assert_eq!(client.base_url(), "http://localhost:8001");
    }

    #[test]
    fn endpoint_escapes_each_segment() {
        let client = ChatClient::new("http://localhost:8001/");

        let url = client.endpoint(&["api", "chat"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8001/api/chat");

        let url = client.endpoint(&["api", "conversations", "a/b?c#d"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8001/api/conversations/a%2Fb%3Fc%23d");
    }

    #[test]
    fn endpoint_keeps_a_base_path() {
        let client = ChatClient::new("http://example.test/chatbot/");
        let url = client.endpoint(&["api", "chat"]).unwrap();
        assert_eq!(url.as_str(), "http://example.test/chatbot/api/chat");
    }

    #[test]
    fn unparseable_base_url_is_an_error() {
        let client = ChatClient::new("not a url");
        assert!(matches!(client.endpoint(&["api", "chat"]), Err(ClientError::InvalidUrl(_))));
    }

    #[test]
    fn conversation_record_ignores_extra_fields() {
        let raw = r#"{
            "_id": "665f0c",
            "conversation_id": "abc123",
            "messages": [
                {"role": "user", "content": "Hello", "timestamp": "2024-05-01T12:30:00+00:00"},
                {"role": "assistant", "content": "Hi there!", "timestamp": "2024-05-01T12:30:02+00:00"}
            ],
            "created_at": "2024-05-01T12:30:00+00:00",
            "updated_at": "2024-05-01T12:30:02+00:00"
        }"#;
        let record: ConversationRecord = serde_json::from_str(raw).unwrap();

        assert_eq!(record.conversation_id, "abc123");
        assert_eq!(record.messages.len(), 2);
    }
}

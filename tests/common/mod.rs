#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::Notify;

use smartspark::{ChatBackend, ChatRequest, ChatResponse, ClientError, ConversationRecord};

/// Scripted backend that records every request it sees
#[derive(Default)]
pub struct FakeBackend {
    replies: Mutex<VecDeque<Result<ChatResponse, ClientError>>>,
    requests: Mutex<Vec<ChatRequest>>,
    history: Mutex<Option<ConversationRecord>>,
    gate: Option<Arc<Notify>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replies wait until the returned `Notify` is signalled once per request
    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let backend = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (backend, gate)
    }

    pub fn reply(self, conversation_id: &str, response: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(ChatResponse {
            conversation_id: conversation_id.to_string(),
            response: response.to_string(),
        }));
        self
    }

    pub fn fail(self, status: StatusCode) -> Self {
        self.replies.lock().unwrap().push_back(Err(ClientError::Status(status)));
        self
    }

    pub fn with_history(self, record: ConversationRecord) -> Self {
        *self.history.lock().unwrap() = Some(record);
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn send(&self, request: ChatRequest) -> Result<ChatResponse, ClientError> {
        self.requests.lock().unwrap().push(request);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ClientError::Status(StatusCode::INTERNAL_SERVER_ERROR)))
    }

    async fn fetch_conversation(&self, _conversation_id: &str) -> Result<ConversationRecord, ClientError> {
        self.history
            .lock()
            .unwrap()
            .clone()
            .ok_or(ClientError::Status(StatusCode::NOT_FOUND))
    }
}

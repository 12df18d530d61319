use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Model options forwarded to the endpoint with each request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatOptions {
    /// Context window, in tokens, requested from the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,
}

/// Parameters for a `/api/chat` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    /// The model to generate with.
    pub model: String,

    /// The full conversation so far, oldest first.
    pub messages: Vec<Message>,

    /// Whether the endpoint should stream partial frames.
    pub stream: bool,

    /// Model options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<ChatOptions>,
}

impl ChatRequest {
    /// Create a new streaming `ChatRequest` for the given model and messages.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: true,
            options: None,
        }
    }

    /// Sets the requested context window.
    pub fn with_num_ctx(mut self, num_ctx: u32) -> Self {
        self.options.get_or_insert_with(ChatOptions::default).num_ctx = Some(num_ctx);
        self
    }
}

//! Wire and data-model types for the confab client.

mod chat_request;
mod chat_response;
mod message;

pub use chat_request::{ChatOptions, ChatRequest};
pub use chat_response::{ChatChunk, ChunkMessage};
pub use message::{Message, Role};

// Public modules
pub mod chat;
pub mod client;
pub mod error;
pub mod ndjson;
pub mod sessions;
pub mod transcript;
pub mod types;

// Re-exports
pub use client::Ollama;
pub use error::{Error, Result};
pub use sessions::SessionStore;
pub use transcript::Transcript;
pub use types::*;

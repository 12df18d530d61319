use serde::Deserialize;

use crate::types::Role;

/// The message portion of a streamed frame.
///
/// Every field is optional: the endpoint owns the frame format, and frames
/// lacking an expected field are skipped rather than rejected.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ChunkMessage {
    /// The role of the partial message, when present.
    #[serde(default)]
    pub role: Option<Role>,

    /// An incremental content fragment, when present.
    #[serde(default)]
    pub content: Option<String>,
}

/// One frame of a streamed `/api/chat` response.
///
/// The transport closing the stream, not the `done` flag, is what terminates
/// assembly; `done` is parsed only so terminal frames decode cleanly.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ChatChunk {
    /// The partial message carried by this frame, when present.
    #[serde(default)]
    pub message: Option<ChunkMessage>,

    /// Set by the endpoint on its final frame.
    #[serde(default)]
    pub done: bool,
}

impl ChatChunk {
    /// Returns the content fragment carried by this frame, if any.
    pub fn fragment(&self) -> Option<&str> {
        self.message.as_ref()?.content.as_deref()
    }
}

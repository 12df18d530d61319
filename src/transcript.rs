//! The in-memory conversation transcript.
//!
//! A transcript is an ordered, append-only sequence of messages. The one
//! structural invariant is that a system message, if present, is unique and
//! sits at position 0; `clear` and `set_system_prompt` maintain it.

use crate::types::{Message, Role};

/// An ordered sequence of conversation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transcript holding a single system message.
    pub fn with_system(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(prompt)],
        }
    }

    /// Wraps messages loaded from a session file.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Returns the messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if the transcript holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the active system prompt, if one is set.
    pub fn system_prompt(&self) -> Option<&str> {
        match self.messages.first() {
            Some(message) if message.role == Role::System => Some(&message.content),
            _ => None,
        }
    }

    /// Appends a message to the end of the transcript.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Resets the transcript to a single system message.
    ///
    /// The prior system message's content is kept if one existed; otherwise
    /// `default_prompt` is used.
    pub fn clear(&mut self, default_prompt: &str) {
        let system = match self.messages.first() {
            Some(message) if message.role == Role::System => message.clone(),
            _ => Message::system(default_prompt),
        };
        self.messages = vec![system];
    }

    /// Replaces or installs the system prompt.
    ///
    /// Empty text is a no-op; returns whether the transcript changed.
    pub fn set_system_prompt(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        match self.messages.first_mut() {
            Some(message) if message.role == Role::System => {
                message.content = text.to_string();
            }
            _ => self.messages.insert(0, Message::system(text)),
        }
        true
    }
}

//! Chat application module for interactive conversations with a local model.
//!
//! This module provides a streaming REPL chat interface built on top of the
//! confab client library. It supports:
//!
//! - Streaming responses with real-time token display
//! - Ctrl-C cancellation of in-flight output
//! - Slash commands for clearing, saving, and loading sessions
//! - Configurable endpoint, model, and system prompt
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: Conversation state, persistence, and the send path
//! - [`commands`]: Slash command parsing
//! - [`render`]: Output rendering

mod commands;
mod config;
mod render;
mod session;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use render::{PlainTextRenderer, Renderer};
pub use session::{ChatSession, assemble_response};

//! Configuration types for the chat application.
//!
//! Values resolve in order: command-line flag, then environment variable,
//! then built-in default. The core only ever sees the resolved `ChatConfig`.

use std::env;
use std::path::PathBuf;

use arrrg_derive::CommandLine;

/// Default chat endpoint.
const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:11434/";

/// Default model identifier.
const DEFAULT_MODEL: &str = "llama3.2";

/// Default system prompt for fresh conversations.
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Default directory for saved sessions.
const DEFAULT_SESSIONS_DIR: &str = "sessions";

/// Default context window requested from the model.
const DEFAULT_NUM_CTX: u32 = 32768;

/// Command-line arguments for the confab-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the chat endpoint.
    #[arrrg(optional, "Base URL of the chat endpoint (default: http://127.0.0.1:11434/)", "URL")]
    pub url: Option<String>,

    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: llama3.2)", "MODEL")]
    pub model: Option<String>,

    /// Default system prompt for new conversations.
    #[arrrg(optional, "Default system prompt for new conversations", "PROMPT")]
    pub system: Option<String>,

    /// Directory holding saved sessions.
    #[arrrg(optional, "Directory for saved sessions (default: sessions)", "DIR")]
    pub sessions: Option<String>,

    /// Context window requested from the model.
    #[arrrg(optional, "Context window in tokens (default: 32768)", "TOKENS")]
    pub num_ctx: Option<u32>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Resolved configuration for a chat session.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Base URL of the chat endpoint.
    pub endpoint: String,

    /// The model to use for generating responses.
    pub model: String,

    /// System prompt installed in fresh conversations.
    pub default_system_prompt: String,

    /// Directory the session repository lives in.
    pub sessions_dir: PathBuf,

    /// Context window requested from the model on every call.
    pub num_ctx: u32,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with built-in defaults.
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            default_system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            sessions_dir: PathBuf::from(DEFAULT_SESSIONS_DIR),
            num_ctx: DEFAULT_NUM_CTX,
            use_color: true,
        }
    }

    /// Sets the endpoint base URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the default system prompt.
    pub fn with_default_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.default_system_prompt = prompt.into();
        self
    }

    /// Sets the sessions directory.
    pub fn with_sessions_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sessions_dir = dir.into();
        self
    }

    /// Sets the requested context window.
    pub fn with_num_ctx(mut self, num_ctx: u32) -> Self {
        self.num_ctx = num_ctx;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let from_env = |key: &str| env::var(key).ok().filter(|value| !value.is_empty());

        ChatConfig {
            endpoint: args
                .url
                .or_else(|| from_env("CONFAB_URL"))
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            model: args
                .model
                .or_else(|| from_env("CONFAB_MODEL"))
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            default_system_prompt: args
                .system
                .or_else(|| from_env("CONFAB_SYSTEM"))
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            sessions_dir: args
                .sessions
                .or_else(|| from_env("CONFAB_SESSIONS"))
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSIONS_DIR)),
            num_ctx: args
                .num_ctx
                .or_else(|| from_env("CONFAB_NUM_CTX").and_then(|value| value.parse().ok()))
                .unwrap_or(DEFAULT_NUM_CTX),
            use_color: !args.no_color,
        }
    }
}

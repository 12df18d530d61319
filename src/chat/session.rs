//! Core chat session management.
//!
//! `ChatSession` owns the conversation transcript, the binding to the
//! currently loaded session, and the send path: append the user's message,
//! stream the model's reply through the assembler, append the result.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::{Stream, StreamExt};

use crate::chat::config::ChatConfig;
use crate::chat::render::Renderer;
use crate::client::Ollama;
use crate::error::{Error, Result};
use crate::sessions::SessionStore;
use crate::transcript::Transcript;
use crate::types::{ChatChunk, ChatRequest, Message};

/// How often the assembler re-checks the cancel flag while waiting on the
/// transport for the next frame.
const FRAME_POLL: Duration = Duration::from_millis(100);

/// Consumes a frame stream, echoing each content fragment as it arrives and
/// accumulating the full response.
///
/// Returns `None` if the user canceled mid-stream; the partial accumulator is
/// dropped, and dropping the stream closes the transport. Per-frame decode
/// errors are reported and skipped.
pub async fn assemble_response<S>(
    frames: S,
    renderer: &mut dyn Renderer,
    interrupted: &AtomicBool,
) -> Option<String>
where
    S: Stream<Item = Result<ChatChunk>>,
{
    let mut frames = Box::pin(frames);
    let mut accumulated = String::new();

    loop {
        if interrupted.load(Ordering::Relaxed) {
            renderer.print_canceled();
            return None;
        }
        // Bound the wait so a cancel can't deadlock on a silent connection.
        match tokio::time::timeout(FRAME_POLL, frames.next()).await {
            Err(_) => continue,
            Ok(None) => break,
            Ok(Some(Ok(chunk))) => {
                if let Some(fragment) = chunk.fragment() {
                    renderer.print_text(fragment);
                    accumulated.push_str(fragment);
                }
            }
            Ok(Some(Err(err))) => renderer.print_error(&err.to_string()),
        }
    }

    Some(accumulated)
}

/// A chat session that manages conversation state, persistence, and the
/// streaming send path.
pub struct ChatSession {
    client: Ollama,
    config: ChatConfig,
    transcript: Transcript,
    store: SessionStore,
    current: Option<String>,
}

impl ChatSession {
    /// Creates a new chat session with the given client and configuration.
    ///
    /// The transcript starts with the configured default system prompt and no
    /// session bound.
    pub fn new(client: Ollama, config: ChatConfig) -> Self {
        let transcript = Transcript::with_system(&config.default_system_prompt);
        let store = SessionStore::new(&config.sessions_dir);
        Self {
            client,
            config,
            transcript,
            store,
            current: None,
        }
    }

    /// Returns the current model.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Returns the name of the bound session, if any.
    pub fn current_session(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Returns the conversation transcript.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns the number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.transcript.len()
    }

    /// Sends a user message and streams the response.
    ///
    /// This method:
    /// 1. Adds the user message to the transcript
    /// 2. Sends a streaming request to the endpoint
    /// 3. Echoes response fragments as they arrive
    /// 4. Adds the complete assistant response to the transcript
    ///
    /// A cancel (Ctrl-C) mid-stream drops the partial response; the user
    /// message stays. A transport failure also leaves the user message in
    /// place — only that turn's assistant reply is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the endpoint answers non-2xx.
    pub async fn send_streaming(
        &mut self,
        user_input: &str,
        renderer: &mut dyn Renderer,
        interrupted: Arc<AtomicBool>,
    ) -> Result<()> {
        self.transcript.append(Message::user(user_input));

        let request = ChatRequest::new(&self.config.model, self.transcript.messages().to_vec())
            .with_num_ctx(self.config.num_ctx);
        let frames = self.client.stream(request).await?;

        if let Some(response) = assemble_response(frames, renderer, interrupted.as_ref()).await {
            renderer.finish_response();
            self.transcript.append(Message::assistant(response));
        }
        Ok(())
    }

    /// Resets the conversation to its system message and unbinds the current
    /// session: clearing starts a new conversation, so the next `/save`
    /// prompts for a name instead of overwriting the old session.
    pub fn clear(&mut self) {
        self.transcript.clear(&self.config.default_system_prompt);
        self.current = None;
    }

    /// Replaces or installs the system prompt; empty text is a no-op.
    /// Returns whether the transcript changed.
    pub fn set_system_prompt(&mut self, text: &str) -> bool {
        self.transcript.set_system_prompt(text)
    }

    /// Persists the transcript.
    ///
    /// With `requested` set, the name is sanitized (blank or all-invalid
    /// input falls back to a timestamped default) and becomes the bound
    /// session. With `requested` unset, the bound session is overwritten in
    /// place. Returns the name saved under.
    pub fn save(&mut self, requested: Option<&str>) -> Result<String> {
        let name = match requested {
            Some(input) => {
                let sanitized = SessionStore::sanitize_name(input);
                if sanitized.is_empty() {
                    SessionStore::default_name()
                } else {
                    sanitized
                }
            }
            None => self.current.clone().ok_or_else(|| {
                Error::validation("no session bound; a name is required", None)
            })?,
        };

        self.store.save(&name, &self.transcript)?;
        self.current = Some(name.clone());
        Ok(name)
    }

    /// Lists saved session names.
    pub fn list_sessions(&self) -> Result<Vec<String>> {
        self.store.list()
    }

    /// Loads a saved session, replacing the in-memory transcript wholesale
    /// and rebinding the current session.
    ///
    /// On failure the transcript and binding are left untouched.
    pub fn load_session(&mut self, name: &str) -> Result<()> {
        let transcript = self.store.load(name)?;
        self.transcript = transcript;
        self.current = Some(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use futures::stream;
    use tempfile::TempDir;

    /// Renderer that records calls instead of printing.
    #[derive(Default)]
    struct CaptureRenderer {
        text: String,
        fragments: Vec<String>,
        errors: Vec<String>,
        canceled: bool,
    }

    impl Renderer for CaptureRenderer {
        fn print_text(&mut self, text: &str) {
            self.text.push_str(text);
            self.fragments.push(text.to_string());
        }

        fn print_error(&mut self, error: &str) {
            self.errors.push(error.to_string());
        }

        fn print_info(&mut self, _info: &str) {}

        fn finish_response(&mut self) {}

        fn print_canceled(&mut self) {
            self.canceled = true;
        }
    }

    fn frame(content: &str) -> Result<ChatChunk> {
        Ok(serde_json::from_str(&format!(
            "{{\"message\":{{\"content\":{}}}}}",
            serde_json::to_string(content).unwrap()
        ))
        .unwrap())
    }

    fn test_session(dir: &TempDir) -> ChatSession {
        let config = ChatConfig::new()
            .with_default_system_prompt("Be helpful.")
            .with_sessions_dir(dir.path());
        let client = Ollama::new(Some(config.endpoint.clone())).unwrap();
        ChatSession::new(client, config)
    }

    #[tokio::test]
    async fn assemble_echoes_and_accumulates_in_order() {
        let frames = stream::iter(vec![frame("Hel"), frame("lo")]);
        let mut renderer = CaptureRenderer::default();
        let interrupted = AtomicBool::new(false);

        let response = assemble_response(frames, &mut renderer, &interrupted).await;

        assert_eq!(response.as_deref(), Some("Hello"));
        assert_eq!(renderer.fragments, vec!["Hel".to_string(), "lo".to_string()]);
    }

    #[tokio::test]
    async fn assemble_skips_bad_frames() {
        let frames = stream::iter(vec![
            frame("a"),
            Err(Error::serialization("malformed frame", None)),
            frame("b"),
        ]);
        let mut renderer = CaptureRenderer::default();
        let interrupted = AtomicBool::new(false);

        let response = assemble_response(frames, &mut renderer, &interrupted).await;

        assert_eq!(response.as_deref(), Some("ab"));
        assert_eq!(renderer.errors.len(), 1);
    }

    #[tokio::test]
    async fn assemble_cancel_drops_partial() {
        let frames = stream::iter(vec![frame("partial")]);
        let mut renderer = CaptureRenderer::default();
        let interrupted = AtomicBool::new(true);

        let response = assemble_response(frames, &mut renderer, &interrupted).await;

        assert!(response.is_none());
        assert!(renderer.canceled);
    }

    #[test]
    fn new_session_has_system_message_and_no_binding() {
        let dir = TempDir::new().unwrap();
        let session = test_session(&dir);
        assert_eq!(session.message_count(), 1);
        assert_eq!(session.transcript().system_prompt(), Some("Be helpful."));
        assert!(session.current_session().is_none());
    }

    #[test]
    fn clear_unbinds_session() {
        let dir = TempDir::new().unwrap();
        let mut session = test_session(&dir);
        session.transcript.append(Message::user("hi"));
        session.save(Some("bound")).unwrap();
        assert_eq!(session.current_session(), Some("bound"));

        session.clear();

        assert_eq!(session.message_count(), 1);
        assert!(session.current_session().is_none());
    }

    #[test]
    fn save_sanitizes_and_binds() {
        let dir = TempDir::new().unwrap();
        let mut session = test_session(&dir);
        session.transcript.append(Message::user("hi"));

        let name = session.save(Some("my session!!")).unwrap();
        assert_eq!(name, "mysession");
        assert_eq!(session.current_session(), Some("mysession"));
        assert_eq!(session.list_sessions().unwrap(), vec!["mysession".to_string()]);
    }

    #[test]
    fn save_blank_name_gets_timestamp_default() {
        let dir = TempDir::new().unwrap();
        let mut session = test_session(&dir);

        let name = session.save(Some("  ")).unwrap();
        assert!(name.starts_with("default_"));
        assert_eq!(session.current_session(), Some(name.as_str()));
    }

    #[test]
    fn save_without_binding_requires_name() {
        let dir = TempDir::new().unwrap();
        let mut session = test_session(&dir);
        assert!(session.save(None).is_err());
    }

    #[test]
    fn save_overwrites_bound_session_without_rename() {
        let dir = TempDir::new().unwrap();
        let mut session = test_session(&dir);
        session.save(Some("keep")).unwrap();

        session.transcript.append(Message::user("more"));
        let name = session.save(None).unwrap();

        assert_eq!(name, "keep");
        assert_eq!(session.list_sessions().unwrap(), vec!["keep".to_string()]);
        let loaded = session.store.load("keep").unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn save_load_round_trips_transcript() {
        let dir = TempDir::new().unwrap();
        let mut session = test_session(&dir);
        session.transcript.append(Message::user("ping"));
        session.transcript.append(Message::assistant("pong"));
        session.save(Some("trip")).unwrap();

        let saved = session.transcript().clone();
        session.clear();
        session.load_session("trip").unwrap();

        assert_eq!(session.transcript(), &saved);
        assert_eq!(session.current_session(), Some("trip"));
    }

    #[test]
    fn load_missing_session_leaves_state_untouched() {
        let dir = TempDir::new().unwrap();
        let mut session = test_session(&dir);
        session.transcript.append(Message::user("precious"));
        let before = session.transcript().clone();

        assert!(session.load_session("ghost").is_err());

        assert_eq!(session.transcript(), &before);
        assert!(session.current_session().is_none());
    }

    #[test]
    fn set_system_prompt_threads_through() {
        let dir = TempDir::new().unwrap();
        let mut session = test_session(&dir);

        assert!(!session.set_system_prompt(""));
        assert_eq!(session.transcript().system_prompt(), Some("Be helpful."));

        assert!(session.set_system_prompt("Be brief."));
        assert_eq!(session.transcript().system_prompt(), Some("Be brief."));
        assert_eq!(
            session
                .transcript()
                .messages()
                .iter()
                .filter(|m| m.role == Role::System)
                .count(),
            1
        );
    }
}

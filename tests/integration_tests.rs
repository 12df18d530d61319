//! Integration tests for the confab library.
//! These tests require a live endpoint in the environment to run.

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use confab::{ChatRequest, Message, Ollama};

    /// Returns the endpoint to test against, or None to skip.
    fn live_endpoint() -> Option<String> {
        std::env::var("CONFAB_TEST_URL").ok()
    }

    fn live_model() -> String {
        std::env::var("CONFAB_TEST_MODEL").unwrap_or_else(|_| "llama3.2".to_string())
    }

    #[tokio::test]
    async fn test_streaming_response() {
        let Some(endpoint) = live_endpoint() else {
            eprintln!("Skipping test: CONFAB_TEST_URL not set");
            return;
        };

        let client = Ollama::new(Some(endpoint)).expect("Failed to create client");
        let request = ChatRequest::new(live_model(), vec![Message::user("Say 'test passed'")]);

        let frames = client.stream(request).await.expect("stream should open");
        let mut frames = Box::pin(frames);

        let mut response = String::new();
        while let Some(frame) = frames.next().await {
            let chunk = frame.expect("frames should decode");
            if let Some(fragment) = chunk.fragment() {
                response.push_str(fragment);
            }
        }

        assert!(!response.is_empty(), "should have received some content");
    }

    #[tokio::test]
    async fn test_missing_model_reports_status_and_body() {
        let Some(endpoint) = live_endpoint() else {
            eprintln!("Skipping test: CONFAB_TEST_URL not set");
            return;
        };

        let client = Ollama::new(Some(endpoint)).expect("Failed to create client");
        let request = ChatRequest::new(
            "confab-test-model-that-does-not-exist",
            vec![Message::user("hi")],
        );

        let err = client
            .stream(request)
            .await
            .err()
            .expect("unknown model should fail");
        assert!(err.status_code().is_some());
    }
}

//! LlmClient trait definition

use async_trait::async_trait;

use super::{GenerateRequest, LlmError};

/// Stateless text generator - each call is independent
///
/// The wizard renders a complete prompt for every step, so implementations
/// never carry conversation state between calls.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one request and return the generated text
    async fn generate(&self, request: GenerateRequest) -> Result<String, LlmError>;

    /// Model identifier, for logging and the status bar
    fn model(&self) -> &str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::debug;

    /// Scripted LLM client for unit tests
    ///
    /// `Err(message)` entries turn into an `ApiError` with status 500.
    pub struct MockLlmClient {
        responses: Vec<Result<String, String>>,
        call_count: AtomicUsize,
        requests: Mutex<Vec<GenerateRequest>>,
    }

    impl MockLlmClient {
        pub fn new(responses: Vec<&str>) -> Self {
            Self::scripted(responses.into_iter().map(|r| Ok(r.to_string())).collect())
        }

        pub fn scripted(responses: Vec<Result<String, String>>) -> Self {
            debug!(response_count = %responses.len(), "MockLlmClient::scripted: called");
            Self {
                responses,
                call_count: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// Requests received so far, in order
        pub fn requests(&self) -> Vec<GenerateRequest> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn generate(&self, request: GenerateRequest) -> Result<String, LlmError> {
            debug!("MockLlmClient::generate: called");
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request);
            }
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            match self.responses.get(idx) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(message)) => Err(LlmError::ApiError {
                    status: 500,
                    message: message.clone(),
                }),
                None => Err(LlmError::InvalidResponse("No more mock responses".to_string())),
            }
        }

        fn model(&self) -> &str {
            "mock"
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_client_returns_responses() {
            let client = MockLlmClient::new(vec!["Response 1", "Response 2"]);

            let resp1 = client.generate(GenerateRequest::text("a")).await.unwrap();
            assert_eq!(resp1, "Response 1");

            let resp2 = client.generate(GenerateRequest::text("b")).await.unwrap();
            assert_eq!(resp2, "Response 2");

            assert_eq!(client.call_count(), 2);
            assert_eq!(client.requests()[1].prompt_text(), "b");
        }

        #[tokio::test]
        async fn test_mock_client_scripted_failure() {
            let client = MockLlmClient::scripted(vec![Err("boom".to_string())]);
            let err = client.generate(GenerateRequest::text("a")).await.unwrap_err();
            assert!(matches!(err, LlmError::ApiError { status: 500, .. }));
        }

        #[tokio::test]
        async fn test_mock_client_errors_when_exhausted() {
            let client = MockLlmClient::new(vec![]);
            let result = client.generate(GenerateRequest::text("a")).await;
            assert!(result.is_err());
        }
    }
}

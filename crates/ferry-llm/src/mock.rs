//! Mock text generator for deterministic testing.
//!
//! Returns pre-configured completions without making any HTTP calls.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::provider::TextGenerator;
use ferry_core::{FerryError, Result};

/// A mock generator that returns pre-configured completions.
///
/// # Example
/// ```
/// use ferry_llm::MockGenerator;
/// let generator = MockGenerator::new().with_response("All systems go");
/// ```
pub struct MockGenerator {
    responses: Arc<Mutex<Vec<MockCompletion>>>,
    /// Track all prompts received (for assertions in tests).
    pub prompts: Arc<Mutex<Vec<String>>>,
}

/// A pre-configured completion from the mock generator.
#[derive(Clone, Default)]
pub struct MockCompletion {
    pub text: String,
    /// If set, the generator will return this error instead.
    pub error: Option<String>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![])),
            prompts: Arc::new(Mutex::new(vec![])),
        }
    }

    /// Queue a completion.
    pub fn with_response(self, text: &str) -> Self {
        self.responses.lock().unwrap().push(MockCompletion {
            text: text.to_string(),
            error: None,
        });
        self
    }

    /// Queue an error.
    pub fn with_error(self, error: &str) -> Self {
        self.responses.lock().unwrap().push(MockCompletion {
            text: String::new(),
            error: Some(error.to_string()),
        });
        self
    }

    /// Pop the next queued completion, or a default when the queue runs dry.
    fn next_completion(&self) -> MockCompletion {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            MockCompletion {
                text: "(mock: no more queued completions)".to_string(),
                error: None,
            }
        } else {
            responses.remove(0)
        }
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let completion = self.next_completion();

        if let Some(error) = completion.error {
            return Err(FerryError::Generation(error));
        }

        Ok(completion.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_queued_completion() {
        let generator = MockGenerator::new().with_response("All systems go");
        let completion = generator.generate("status?").await.unwrap();
        assert_eq!(completion, "All systems go");
        assert_eq!(generator.prompts.lock().unwrap().as_slice(), ["status?"]);
    }

    #[tokio::test]
    async fn test_mock_returns_queued_error() {
        let generator = MockGenerator::new().with_error("quota exceeded");
        let err = generator.generate("hi").await.unwrap_err();
        assert!(matches!(err, FerryError::Generation(_)));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_mock_responses_are_consumed_in_order() {
        let generator = MockGenerator::new()
            .with_response("first")
            .with_response("second");
        assert_eq!(generator.generate("a").await.unwrap(), "first");
        assert_eq!(generator.generate("b").await.unwrap(), "second");
    }
}

use async_trait::async_trait;

use finsight_core::{ChatProvider, DocumentRecord, FinsightError};

/// A mock chat provider that returns canned answers.
pub struct MockChatProvider {
    answer: Option<String>,
    fail_with: Option<String>,
}

impl MockChatProvider {
    pub fn new() -> Self {
        Self {
            answer: None,
            fail_with: None,
        }
    }

    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    /// Make every `ask` call fail with a chat service error.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }
}

impl Default for MockChatProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn ask(
        &self,
        _question: &str,
        _context: &[DocumentRecord],
    ) -> Result<String, FinsightError> {
        if let Some(message) = &self.fail_with {
            return Err(FinsightError::ChatService(message.clone()));
        }
        Ok(self
            .answer
            .clone()
            .unwrap_or_else(|| "Mock answer".to_string()))
    }
}

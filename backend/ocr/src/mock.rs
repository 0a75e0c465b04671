use async_trait::async_trait;

use finsight_core::{ExtractRequest, ExtractionResult, FinsightError, OcrProvider};

/// A mock OCR provider that returns canned extractions.
pub struct MockOcrProvider {
    result: Option<ExtractionResult>,
    fail_with: Option<String>,
}

impl MockOcrProvider {
    pub fn new() -> Self {
        Self {
            result: None,
            fail_with: None,
        }
    }

    pub fn with_result(mut self, result: ExtractionResult) -> Self {
        self.result = Some(result);
        self
    }

    /// Make every `extract` call fail with an OCR service error.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }
}

impl Default for MockOcrProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OcrProvider for MockOcrProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn extract(
        &self,
        _document: &[u8],
        _request: &ExtractRequest,
    ) -> Result<ExtractionResult, FinsightError> {
        if let Some(message) = &self.fail_with {
            return Err(FinsightError::OcrService(message.clone()));
        }
        Ok(self.result.clone().unwrap_or_default())
    }
}

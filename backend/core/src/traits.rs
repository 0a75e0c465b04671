use async_trait::async_trait;

use crate::error::FinsightError;
use crate::types::{DocumentRecord, ExtractRequest, ExtractionResult};

/// Trait for document extraction backends.
///
/// Implementations marshal raw document bytes to an OCR service and return
/// the normalized field extractions. They never touch the store; persistence
/// happens only after a complete successful extraction.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Provider name (e.g., "azure-document-intelligence").
    fn name(&self) -> &str;

    /// Analyze one document and return its normalized fields.
    async fn extract(
        &self,
        document: &[u8],
        request: &ExtractRequest,
    ) -> Result<ExtractionResult, FinsightError>;
}

/// Trait for chat backends answering questions over stored records.
///
/// Stateless per call: the full document context travels with every
/// question and no conversation memory is kept here.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Answer a question using the given records as context.
    async fn ask(
        &self,
        question: &str,
        context: &[DocumentRecord],
    ) -> Result<String, FinsightError>;
}

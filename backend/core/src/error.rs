use thiserror::Error;

/// Top-level error type for the finsight runtime.
///
/// Errors from external collaborators (OCR, chat, SQLite) are converted into
/// one of these variants at the boundary; raw transport errors never reach
/// the user-facing surface.
#[derive(Debug, Error)]
pub enum FinsightError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("OCR service error: {0}")]
    OcrService(String),

    #[error("chat service error: {0}")]
    ChatService(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("no document with id {0}")]
    NotFound(i64),

    #[error("export failed: {0}")]
    Export(String),

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub mod error;
pub mod traits;
pub mod types;

pub use error::FinsightError;
pub use traits::{ChatProvider, OcrProvider};
pub use types::{
    value_text, DocType, DocumentRecord, ExtractRequest, ExtractionResult, FieldMap, NewDocument,
};

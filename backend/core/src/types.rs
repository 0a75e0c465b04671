use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Extracted field names mapped to their values.
///
/// Backed by `serde_json::Map` with the `preserve_order` feature, so the
/// order in which the OCR service emitted fields survives storage and keeps
/// the export's first-seen column ordering deterministic.
pub type FieldMap = serde_json::Map<String, Value>;

/// One processed-document row as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: i64,
    pub filename: String,
    /// Set exactly once at insertion; never mutated afterwards.
    pub processed_at: DateTime<Utc>,
    pub extracted_fields: FieldMap,
    pub raw_summary: Option<String>,
}

/// A record before the store assigns its id and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub filename: String,
    pub extracted_fields: FieldMap,
    pub raw_summary: Option<String>,
}

/// Normalized output of one OCR extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    pub fields: FieldMap,
    pub summary: Option<String>,
}

/// Document-type hint forwarded to the OCR service for model selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Invoice,
    Receipt,
    #[default]
    General,
    Layout,
}

impl DocType {
    /// Azure prebuilt model id for this document type.
    pub fn model_id(&self) -> &'static str {
        match self {
            DocType::Invoice => "prebuilt-invoice",
            DocType::Receipt => "prebuilt-receipt",
            DocType::General => "prebuilt-read",
            DocType::Layout => "prebuilt-layout",
        }
    }
}

impl std::str::FromStr for DocType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "invoice" => Ok(DocType::Invoice),
            "receipt" => Ok(DocType::Receipt),
            "general" => Ok(DocType::General),
            "layout" => Ok(DocType::Layout),
            other => Err(format!(
                "unknown document type '{other}' (expected invoice, receipt, general, or layout)"
            )),
        }
    }
}

/// Metadata accompanying raw document bytes into the OCR client.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub filename: String,
    pub doc_type: DocType,
}

impl ExtractRequest {
    /// MIME type sent to the OCR service, inferred from the file extension.
    pub fn content_type(&self) -> &'static str {
        let extension = self
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => "application/pdf",
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            _ => "application/octet-stream",
        }
    }
}

/// Coerce a stored field value to display text.
///
/// Every extracted value is rendered as text in the export and in chat
/// context; null becomes the empty cell.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

//! Normalization of Azure analyze results into flat text fields.
//!
//! The analyze payload is loosely shaped: invoice/receipt models return
//! typed `documents[].fields`, while the read/layout models return only
//! page content and key-value pairs. Everything is flattened into a
//! string-to-string field map here, at the boundary, so the rest of the
//! system never deals with the vendor's field variants.

use serde::Deserialize;
use serde_json::Value;

use finsight_core::{ExtractionResult, FieldMap};

/// Character limit for the stored plain-text summary.
pub const SUMMARY_PREVIEW_CHARS: usize = 500;

/// The `analyzeResult` body of a completed analyze operation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub documents: Vec<AnalyzedDocument>,
    #[serde(default)]
    pub key_value_pairs: Vec<KeyValuePair>,
    #[serde(default)]
    pub tables: Vec<AnalyzedTable>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedTable {
    #[serde(default)]
    pub row_count: u32,
    #[serde(default)]
    pub column_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzedDocument {
    /// Field name → raw field payload; order as emitted by the service.
    #[serde(default)]
    pub fields: FieldMap,
}

#[derive(Debug, Deserialize)]
pub struct KeyValuePair {
    #[serde(default)]
    pub key: Option<KvContent>,
    #[serde(default)]
    pub value: Option<KvContent>,
}

#[derive(Debug, Deserialize)]
pub struct KvContent {
    #[serde(default)]
    pub content: String,
}

/// One typed field inside `documents[].fields`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentField {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    value_string: Option<String>,
    #[serde(default)]
    value_date: Option<String>,
    #[serde(default)]
    value_number: Option<f64>,
    #[serde(default)]
    value_currency: Option<CurrencyValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrencyValue {
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    currency_code: Option<String>,
}

/// Flatten a completed analyze result into an [`ExtractionResult`].
pub fn normalize(result: &AnalyzeResult) -> ExtractionResult {
    let mut fields = FieldMap::new();

    if let Some(doc) = result.documents.first() {
        for (name, raw) in &doc.fields {
            if let Some(text) = field_text(raw) {
                fields.insert(name.clone(), Value::String(text));
            }
        }
    }

    // Read/layout models carry no document fields; fall back to key-value pairs.
    if fields.is_empty() {
        for pair in &result.key_value_pairs {
            if let (Some(key), Some(value)) = (&pair.key, &pair.value) {
                if !key.content.is_empty() {
                    fields.insert(key.content.clone(), Value::String(value.content.clone()));
                }
            }
        }
    }

    // Layout model output may carry only tables; record their shape so the
    // extraction is not silently empty.
    if fields.is_empty() {
        for (i, table) in result.tables.iter().enumerate() {
            fields.insert(
                format!("Table_{i}_row_count"),
                Value::String(table.row_count.to_string()),
            );
            fields.insert(
                format!("Table_{i}_column_count"),
                Value::String(table.column_count.to_string()),
            );
        }
    }

    let summary = result
        .content
        .as_deref()
        .map(preview)
        .filter(|s| !s.is_empty());

    ExtractionResult { fields, summary }
}

/// Render one Azure field as display text, preferring the typed value.
fn field_text(raw: &Value) -> Option<String> {
    let field: DocumentField = serde_json::from_value(raw.clone()).ok()?;

    if let Some(currency) = &field.value_currency {
        return match (currency.amount, currency.currency_code.as_deref()) {
            (Some(amount), Some(code)) => Some(format!("{amount} {code}")),
            (Some(amount), None) => Some(amount.to_string()),
            _ => field.content,
        };
    }
    if let Some(s) = field.value_string {
        return Some(s);
    }
    if let Some(date) = field.value_date {
        return Some(date);
    }
    if let Some(number) = field.value_number {
        return Some(number.to_string());
    }
    field.content
}

/// Plain-text content truncated for storage as the record summary.
fn preview(content: &str) -> String {
    if content.chars().count() <= SUMMARY_PREVIEW_CHARS {
        content.to_string()
    } else {
        let cut: String = content.chars().take(SUMMARY_PREVIEW_CHARS).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(payload: serde_json::Value) -> AnalyzeResult {
        serde_json::from_value(payload).unwrap()
    }

    #[test]
    fn flattens_typed_invoice_fields() {
        let result = parse(json!({
            "content": "ACME invoice",
            "documents": [{
                "fields": {
                    "InvoiceTotal": {
                        "type": "currency",
                        "valueCurrency": {"amount": 120.0, "currencyCode": "USD"},
                        "content": "$120.00"
                    },
                    "InvoiceDate": {"type": "date", "valueDate": "2024-01-05"},
                    "VendorName": {"type": "string", "valueString": "ACME Corp"},
                    "ItemCount": {"type": "number", "valueNumber": 3.0}
                }
            }]
        }));

        let extraction = normalize(&result);
        assert_eq!(extraction.fields["InvoiceTotal"], "120 USD");
        assert_eq!(extraction.fields["InvoiceDate"], "2024-01-05");
        assert_eq!(extraction.fields["VendorName"], "ACME Corp");
        assert_eq!(extraction.fields["ItemCount"], "3");
        assert_eq!(extraction.summary.as_deref(), Some("ACME invoice"));
    }

    #[test]
    fn currency_without_code_falls_back_to_amount() {
        let result = parse(json!({
            "documents": [{
                "fields": {
                    "Total": {"valueCurrency": {"amount": 45.5}}
                }
            }]
        }));
        assert_eq!(normalize(&result).fields["Total"], "45.5");
    }

    #[test]
    fn untyped_field_uses_content() {
        let result = parse(json!({
            "documents": [{
                "fields": {
                    "CustomerName": {"content": "Jane Doe"}
                }
            }]
        }));
        assert_eq!(normalize(&result).fields["CustomerName"], "Jane Doe");
    }

    #[test]
    fn falls_back_to_key_value_pairs() {
        let result = parse(json!({
            "content": "Receipt text",
            "keyValuePairs": [
                {"key": {"content": "Total"}, "value": {"content": "$9.99"}},
                {"key": {"content": ""}, "value": {"content": "ignored"}},
                {"key": {"content": "Orphan"}}
            ]
        }));

        let extraction = normalize(&result);
        assert_eq!(extraction.fields.len(), 1);
        assert_eq!(extraction.fields["Total"], "$9.99");
    }

    #[test]
    fn falls_back_to_table_shapes_when_nothing_else_extracted() {
        let result = parse(json!({
            "content": "Layout text",
            "tables": [
                {"rowCount": 4, "columnCount": 3},
                {"rowCount": 2, "columnCount": 5}
            ]
        }));

        let extraction = normalize(&result);
        assert_eq!(extraction.fields["Table_0_row_count"], "4");
        assert_eq!(extraction.fields["Table_0_column_count"], "3");
        assert_eq!(extraction.fields["Table_1_row_count"], "2");
        assert_eq!(extraction.fields["Table_1_column_count"], "5");
    }

    #[test]
    fn key_value_pairs_take_precedence_over_tables() {
        let result = parse(json!({
            "keyValuePairs": [
                {"key": {"content": "Total"}, "value": {"content": "$9.99"}}
            ],
            "tables": [{"rowCount": 1, "columnCount": 1}]
        }));

        let extraction = normalize(&result);
        assert_eq!(extraction.fields.len(), 1);
        assert_eq!(extraction.fields["Total"], "$9.99");
    }

    #[test]
    fn empty_result_yields_empty_extraction() {
        let extraction = normalize(&parse(json!({})));
        assert!(extraction.fields.is_empty());
        assert_eq!(extraction.summary, None);
    }

    #[test]
    fn long_content_is_truncated_for_summary() {
        let long = "x".repeat(SUMMARY_PREVIEW_CHARS + 50);
        let result = parse(json!({ "content": long }));
        let summary = normalize(&result).summary.unwrap();
        assert_eq!(summary.chars().count(), SUMMARY_PREVIEW_CHARS + 3);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn field_order_matches_service_order() {
        let result = parse(json!({
            "documents": [{
                "fields": {
                    "Zebra": {"valueString": "1"},
                    "Apple": {"valueString": "2"}
                }
            }]
        }));
        let normalized = normalize(&result);
        let keys: Vec<&String> = normalized.fields.keys().collect();
        assert_eq!(keys, vec!["Zebra", "Apple"]);
    }
}

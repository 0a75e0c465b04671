//! Rendering of stored records into chat context text.

use finsight_core::{value_text, DocumentRecord};

/// Framing prepended to every question.
const PREAMBLE: &str = "You are an assistant answering questions about the user's \
processed financial documents. Answer using only the document data below.";

/// Render the question plus its document context into a single prompt.
pub fn render_prompt(question: &str, context: &[DocumentRecord]) -> String {
    let mut prompt = String::from(PREAMBLE);
    prompt.push_str("\n\n");

    if context.is_empty() {
        prompt.push_str("(no documents stored)\n\n");
    }

    for record in context {
        prompt.push_str(&format!(
            "Document {} — {} (processed {})\n",
            record.id,
            record.filename,
            record.processed_at.to_rfc3339()
        ));
        for (name, value) in &record.extracted_fields {
            prompt.push_str(&format!("  {name}: {}\n", value_text(value)));
        }
        if let Some(summary) = &record.raw_summary {
            prompt.push_str(&format!("  summary: {summary}\n"));
        }
        prompt.push('\n');
    }

    prompt.push_str("Question: ");
    prompt.push_str(question);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use finsight_core::FieldMap;
    use serde_json::json;

    fn record(id: i64, filename: &str) -> DocumentRecord {
        let mut fields = FieldMap::new();
        fields.insert("total".into(), json!("$120.00"));
        DocumentRecord {
            id,
            filename: filename.to_string(),
            processed_at: Utc.with_ymd_and_hms(2024, 1, 5, 9, 30, 0).unwrap(),
            extracted_fields: fields,
            raw_summary: Some("invoice from ACME".into()),
        }
    }

    #[test]
    fn prompt_contains_records_and_question() {
        let prompt = render_prompt("what was the total?", &[record(1, "invoice1.pdf")]);
        assert!(prompt.contains("Document 1 — invoice1.pdf"));
        assert!(prompt.contains("total: $120.00"));
        assert!(prompt.contains("summary: invoice from ACME"));
        assert!(prompt.ends_with("Question: what was the total?"));
    }

    #[test]
    fn empty_context_is_stated_explicitly() {
        let prompt = render_prompt("anything stored?", &[]);
        assert!(prompt.contains("(no documents stored)"));
    }
}

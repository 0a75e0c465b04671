//! CSV export of document records.
//!
//! Produces one header row and one row per record. The column set is the
//! fixed columns plus the union of all extracted field names, each exactly
//! once, in first-seen order across the record list. A pure function of its
//! input: the same records always serialize to byte-identical output.

use finsight_core::{value_text, DocumentRecord, FinsightError};

/// Columns present in every export, ahead of the extracted fields.
const FIXED_COLUMNS: [&str; 3] = ["id", "filename", "processed_at"];

/// Serialize the given records to UTF-8 CSV bytes.
///
/// Missing fields emit empty cells; values containing delimiters, quotes,
/// or line breaks are quoted by the `csv` writer. Never fails on record
/// content — only on a (practically unreachable) writer error.
pub fn export_csv(records: &[DocumentRecord]) -> Result<Vec<u8>, FinsightError> {
    let columns = field_columns(records);

    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<&str> = FIXED_COLUMNS.to_vec();
    header.extend(columns.iter().map(String::as_str));
    writer.write_record(&header).map_err(export_err)?;

    for record in records {
        let mut row = Vec::with_capacity(header.len());
        row.push(record.id.to_string());
        row.push(record.filename.clone());
        row.push(record.processed_at.to_rfc3339());
        for column in &columns {
            row.push(
                record
                    .extracted_fields
                    .get(column)
                    .map(value_text)
                    .unwrap_or_default(),
            );
        }
        writer.write_record(&row).map_err(export_err)?;
    }

    writer
        .into_inner()
        .map_err(|e| FinsightError::Export(e.to_string()))
}

/// Extracted-field column names in first-seen order across the records.
fn field_columns(records: &[DocumentRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for name in record.extracted_fields.keys() {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.clone());
            }
        }
    }
    columns
}

fn export_err(e: csv::Error) -> FinsightError {
    FinsightError::Export(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use finsight_core::FieldMap;
    use serde_json::json;

    fn record(id: i64, filename: &str, fields: &[(&str, &str)]) -> DocumentRecord {
        let mut map = FieldMap::new();
        for (name, value) in fields {
            map.insert(name.to_string(), json!(value));
        }
        DocumentRecord {
            id,
            filename: filename.to_string(),
            processed_at: Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, id as u32).unwrap(),
            extracted_fields: map,
            raw_summary: None,
        }
    }

    fn as_text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn exports_two_invoices() {
        let records = vec![
            record(1, "invoice1.pdf", &[("total", "$120.00"), ("date", "2024-01-05")]),
            record(2, "invoice2.pdf", &[("total", "$45.50")]),
        ];
        let text = as_text(export_csv(&records).unwrap());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "id,filename,processed_at,total,date");
        assert_eq!(
            lines[1],
            "1,invoice1.pdf,2024-01-05T12:00:01+00:00,$120.00,2024-01-05"
        );
        // Missing `date` on the second record becomes an empty trailing cell.
        assert_eq!(lines[2], "2,invoice2.pdf,2024-01-05T12:00:02+00:00,$45.50,");
    }

    #[test]
    fn column_order_is_first_seen_across_records() {
        let records = vec![
            record(1, "a.pdf", &[("vendor", "Acme"), ("total", "$1")]),
            record(2, "b.pdf", &[("total", "$2"), ("due_date", "2024-03-01")]),
            record(3, "c.pdf", &[("vendor", "Globex")]),
        ];
        let text = as_text(export_csv(&records).unwrap());
        let header = text.lines().next().unwrap();
        assert_eq!(header, "id,filename,processed_at,vendor,total,due_date");
    }

    #[test]
    fn quotes_values_containing_delimiters_and_breaks() {
        let records = vec![record(
            1,
            "odd.pdf",
            &[("vendor", "Acme, Inc."), ("note", "line1\nline2"), ("label", "say \"hi\"")],
        )];
        let text = as_text(export_csv(&records).unwrap());
        assert!(text.contains("\"Acme, Inc.\""));
        assert!(text.contains("\"line1\nline2\""));
        assert!(text.contains("\"say \"\"hi\"\"\""));
    }

    #[test]
    fn record_without_fields_still_exports() {
        let records = vec![record(7, "empty.pdf", &[])];
        let text = as_text(export_csv(&records).unwrap());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,filename,processed_at");
        assert_eq!(lines[1], "7,empty.pdf,2024-01-05T12:00:07+00:00");
    }

    #[test]
    fn empty_store_exports_header_only() {
        let text = as_text(export_csv(&[]).unwrap());
        assert_eq!(text, "id,filename,processed_at\n");
    }

    #[test]
    fn export_is_byte_identical_across_calls() {
        let records = vec![
            record(1, "a.pdf", &[("total", "$1.00")]),
            record(2, "b.pdf", &[("subtotal", "$0.90")]),
        ];
        assert_eq!(export_csv(&records).unwrap(), export_csv(&records).unwrap());
    }
}

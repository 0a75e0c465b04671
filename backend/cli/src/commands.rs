//! Command pipeline shared by the HTTP API and the CLI.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use finsight_config::Config;
use finsight_core::{DocType, DocumentRecord, ExtractRequest, FinsightError, NewDocument, OcrProvider};
use finsight_ocr::AzureOcrClient;
use finsight_store::DocumentStore;

/// Run one document through extraction and persist the result.
///
/// The store is only touched after a complete successful extraction, so a
/// failed OCR call leaves previously committed records untouched and the
/// upload is safe to retry.
pub async fn process_document(
    store: &mut DocumentStore,
    ocr: &dyn OcrProvider,
    document: &[u8],
    filename: &str,
    doc_type: DocType,
) -> Result<DocumentRecord, FinsightError> {
    let request = ExtractRequest {
        filename: filename.to_string(),
        doc_type,
    };
    let extraction = ocr.extract(document, &request).await?;

    let id = store.insert(&NewDocument {
        filename: filename.to_string(),
        extracted_fields: extraction.fields,
        raw_summary: extraction.summary,
    })?;

    info!(id, filename, provider = ocr.name(), "Document processed and stored");
    store.get(id)
}

/// Build the Azure OCR client from configuration.
pub fn build_ocr_client(config: &Config) -> Result<AzureOcrClient, FinsightError> {
    let client = AzureOcrClient::new(
        &config.ocr_endpoint,
        &config.ocr_key,
        config.request_timeout(),
    )?;
    Ok(match &config.ocr_api_version {
        Some(version) => client.with_api_version(version),
        None => client,
    })
}

/// `finsight ingest`: process one document from disk.
pub async fn ingest(config: &Config, path: &Path, doc_type: DocType) -> Result<()> {
    let document = std::fs::read(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();

    let mut store = DocumentStore::open(&config.db_path)?;
    let ocr = build_ocr_client(config)?;

    let record = process_document(&mut store, &ocr, &document, &filename, doc_type).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

/// `finsight export`: write the CSV export to a file or stdout.
pub fn export(config: &Config, output: Option<&Path>) -> Result<()> {
    let store = DocumentStore::open(&config.db_path)?;
    let records = store
        .list_all()
        .map_err(|e| FinsightError::Export(e.to_string()))?;
    let bytes = finsight_export::export_csv(&records)?;

    match output {
        Some(path) => {
            std::fs::write(path, &bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), records = records.len(), "Export written");
        }
        None => std::io::stdout().write_all(&bytes)?,
    }
    Ok(())
}

//! Azure Document Intelligence REST client.
//!
//! Analysis is asynchronous on the service side: the analyze POST returns
//! 202 with an `Operation-Location` URL, which is polled until the
//! operation reports `succeeded` or `failed`, bounded by the configured
//! timeout. The completed result is normalized before it leaves this crate.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use finsight_core::{ExtractRequest, ExtractionResult, FinsightError, OcrProvider};

use crate::normalize::{self, AnalyzeResult};

const DEFAULT_API_VERSION: &str = "2024-02-29-preview";
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Client for the Azure Document Intelligence analyze API.
pub struct AzureOcrClient {
    client: Client,
    endpoint: String,
    api_key: String,
    api_version: String,
    timeout: Duration,
}

impl AzureOcrClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FinsightError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FinsightError::OcrService(format!("failed to build HTTP client: {e}")))?;
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout,
        })
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    async fn poll_result(&self, operation_url: &str) -> Result<AnalyzeResult, FinsightError> {
        let deadline = Instant::now() + self.timeout;

        loop {
            let response = self
                .client
                .get(operation_url)
                .header("Ocp-Apim-Subscription-Key", &self.api_key)
                .send()
                .await
                .map_err(|e| self.transport_error("result poll", e))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(FinsightError::OcrService(format!(
                    "result poll rejected with {status}: {body}"
                )));
            }

            let operation: AnalyzeOperation = response
                .json()
                .await
                .map_err(|e| FinsightError::OcrService(format!("malformed analyze payload: {e}")))?;

            match operation.status.as_str() {
                "succeeded" => {
                    return operation.analyze_result.ok_or_else(|| {
                        FinsightError::OcrService(
                            "succeeded operation carried no analyzeResult".into(),
                        )
                    });
                }
                "failed" => {
                    let message = operation
                        .error
                        .map(|e| e.message)
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| "unspecified analysis failure".into());
                    return Err(FinsightError::OcrService(format!("analysis failed: {message}")));
                }
                // notStarted / running
                other => debug!(status = other, "Analysis still in progress"),
            }

            if Instant::now() + POLL_INTERVAL > deadline {
                return Err(FinsightError::Timeout {
                    operation: "document analysis".into(),
                    seconds: self.timeout.as_secs(),
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    fn transport_error(&self, operation: &str, err: reqwest::Error) -> FinsightError {
        if err.is_timeout() {
            FinsightError::Timeout {
                operation: format!("OCR {operation}"),
                seconds: self.timeout.as_secs(),
            }
        } else {
            FinsightError::OcrService(format!("{operation} failed: {err}"))
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOperation {
    status: String,
    #[serde(default)]
    analyze_result: Option<AnalyzeResult>,
    #[serde(default)]
    error: Option<AzureErrorBody>,
}

#[derive(Deserialize)]
struct AzureErrorBody {
    #[serde(default)]
    message: String,
}

#[async_trait]
impl OcrProvider for AzureOcrClient {
    fn name(&self) -> &str {
        "azure-document-intelligence"
    }

    async fn extract(
        &self,
        document: &[u8],
        request: &ExtractRequest,
    ) -> Result<ExtractionResult, FinsightError> {
        let model = request.doc_type.model_id();
        let url = format!(
            "{}/documentintelligence/documentModels/{}:analyze?api-version={}",
            self.endpoint, model, self.api_version
        );

        debug!(
            model,
            filename = %request.filename,
            size_bytes = document.len(),
            "Submitting document for analysis"
        );

        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Content-Type", request.content_type())
            .body(document.to_vec())
            .send()
            .await
            .map_err(|e| self.transport_error("analyze submit", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FinsightError::OcrService(format!(
                "analyze request rejected with {status}: {body}"
            )));
        }

        let operation_url = response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                FinsightError::OcrService("analyze response missing Operation-Location".into())
            })?;

        let result = self.poll_result(&operation_url).await?;
        Ok(normalize::normalize(&result))
    }
}

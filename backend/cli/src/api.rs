//! HTTP API: the upload, history, export, and chat command handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::warn;

use finsight_core::{ChatProvider, DocType, FinsightError, OcrProvider};
use finsight_store::DocumentStore;

use crate::commands;

/// Shared application state for API handlers.
///
/// The store sits behind a mutex: handlers run to completion one at a time
/// against it, which keeps inserts serialized even if clients race.
pub struct AppState {
    pub store: Mutex<DocumentStore>,
    pub ocr: Arc<dyn OcrProvider>,
    pub chat: Arc<dyn ChatProvider>,
}

/// Build the Axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/documents", get(list_documents).post(upload_document))
        .route("/api/documents/:id", get(get_document))
        .route("/api/export.csv", get(export_csv))
        .route("/api/chat", post(chat))
        .with_state(state)
}

/// Map a domain error to the HTTP response shown to the user.
///
/// `step` names the user action that failed (upload/extraction, save, chat,
/// export); error text never includes credentials or transport internals.
fn error_response(step: &str, err: FinsightError) -> Response {
    let status = match &err {
        FinsightError::NotFound(_) => StatusCode::NOT_FOUND,
        FinsightError::OcrService(_) | FinsightError::ChatService(_) => StatusCode::BAD_GATEWAY,
        FinsightError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(step, error = %err, "Request failed");
    (status, Json(json!({ "step": step, "error": err.to_string() }))).into_response()
}

/// Reject bad client input before any external call is made.
fn validation_response(step: &str, message: &str) -> Response {
    warn!(step, error = message, "Rejected invalid request");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "step": step, "error": message })),
    )
        .into_response()
}

/// Health check with the stored-record count.
async fn health(State(state): State<Arc<AppState>>) -> Response {
    let stored = match state.store.lock().await.count() {
        Ok(count) => count,
        Err(err) => return error_response("health", err),
    };
    Json(json!({
        "status": "ok",
        "service": "finsight",
        "version": env!("CARGO_PKG_VERSION"),
        "stored_documents": stored,
    }))
    .into_response()
}

#[derive(Deserialize)]
struct UploadParams {
    filename: String,
    doc_type: Option<DocType>,
}

/// Upload one document: extract, then store atomically.
async fn upload_document(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Response {
    if body.is_empty() {
        return validation_response("upload", "document body is empty");
    }

    let mut store = state.store.lock().await;
    match commands::process_document(
        &mut store,
        state.ocr.as_ref(),
        &body,
        &params.filename,
        params.doc_type.unwrap_or_default(),
    )
    .await
    {
        Ok(record) => Json(record).into_response(),
        Err(err) => error_response("extraction", err),
    }
}

/// Full processing history, oldest first.
async fn list_documents(State(state): State<Arc<AppState>>) -> Response {
    match state.store.lock().await.list_all() {
        Ok(records) => Json(json!({ "documents": records })).into_response(),
        Err(err) => error_response("history", err),
    }
}

/// One stored record by id.
async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Response {
    match state.store.lock().await.get(id) {
        Ok(record) => Json(record).into_response(),
        Err(err) => error_response("history", err),
    }
}

/// CSV download of the full store.
async fn export_csv(State(state): State<Arc<AppState>>) -> Response {
    let records = match state.store.lock().await.list_all() {
        Ok(records) => records,
        Err(err) => return error_response("export", FinsightError::Export(err.to_string())),
    };
    match finsight_export::export_csv(&records) {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"finsight_export.csv\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => error_response("export", err),
    }
}

#[derive(Deserialize)]
struct ChatRequest {
    question: String,
    /// Restrict context to these records; all records when omitted.
    document_ids: Option<Vec<i64>>,
}

/// Answer a question over stored records.
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let context = {
        let store = state.store.lock().await;
        let result = match &request.document_ids {
            Some(ids) => ids.iter().map(|id| store.get(*id)).collect(),
            None => store.list_all(),
        };
        match result {
            Ok(records) => records,
            Err(err) => return error_response("chat", err),
        }
    };

    match state.chat.ask(&request.question, &context).await {
        Ok(answer) => Json(json!({ "answer": answer })).into_response(),
        Err(err) => error_response("chat", err),
    }
}

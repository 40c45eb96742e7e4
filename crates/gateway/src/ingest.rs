//! `POST /ingest` — replace the knowledge base with an uploaded PDF.

use axum::Json;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use tribuna_ingest::{IngestError, is_pdf_filename};

use crate::{ApiError, SharedState};

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub success: bool,
    pub message: String,
    pub chunks_created: usize,
    pub filename: String,
}

fn missing_file() -> ApiError {
    ApiError::bad_request("No se recibió ningún archivo PDF")
}

fn not_pdf() -> ApiError {
    ApiError::bad_request("Solo se aceptan archivos PDF")
}

pub async fn ingest_handler(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<IngestResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        warn!(error = %e, "Rejected ingest request without multipart body");
        missing_file()
    })?;

    let mut upload = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Malformed multipart body");
                return Err(multipart_error(e.status()));
            }
        };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if !is_pdf_filename(&filename) {
            return Err(not_pdf());
        }
        let bytes = field.bytes().await.map_err(|e| {
            warn!(error = %e, filename = %filename, "Could not read uploaded file");
            multipart_error(e.status())
        })?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = upload.ok_or_else(missing_file)?;
    info!(filename = %filename, bytes = bytes.len(), "PDF upload received");

    match state.pipeline.ingest(&filename, bytes.to_vec()).await {
        Ok(report) => Ok(Json(IngestResponse {
            success: true,
            message: report.message(),
            chunks_created: report.created,
            filename: report.filename,
        })),
        Err(IngestError::NotPdf(_)) => Err(not_pdf()),
        Err(e) => {
            error!(filename = %filename, error = %e, "PDF ingestion failed");
            Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error procesando el PDF: {e}"),
            ))
        }
    }
}

fn multipart_error(status: StatusCode) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(status, "El archivo excede el tamaño máximo permitido")
    } else {
        missing_file()
    }
}

use crate::errors::{AppError, AppResult};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use scanbay_core::{Domain, TaskStatus};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SubmitScanRequest {
    pub domain: String,
}

/// POST /api/scans
///
/// Validates the domain and enqueues a scan task. Returns 202 with the
/// task handle; an invalid domain is rejected with 400 before anything
/// touches the queue.
pub async fn submit_scan_handler(
    State(state): State<AppState>,
    Json(req): Json<SubmitScanRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let domain = Domain::parse(&req.domain).map_err(|e| {
        warn!("Rejected scan submission: {e}");
        AppError::bad_request(e.to_string())
    })?;

    let task_id = state.queue.submit(&domain).await?;
    info!(task_id = %task_id, domain = %domain, "Scan submission accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "accepted",
            "task_id": task_id,
            "domain": domain.as_str(),
        })),
    ))
}

/// GET /api/scans/{task_id}
///
/// Polls the task's current state. A completed scan reports `Completed`
/// with both artifact basenames; a scan whose report could not be
/// rendered reports `Degraded` with whatever was published.
pub async fn scan_status_handler(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let status = state.queue.status(task_id).await?;

    let body = match status {
        TaskStatus::Pending => json!({
            "task_id": task_id,
            "status": "Pending",
        }),
        TaskStatus::Running => json!({
            "task_id": task_id,
            "status": "Running",
        }),
        TaskStatus::Succeeded {
            xml_file,
            html_file,
        } => json!({
            "task_id": task_id,
            "status": "Completed",
            "result": {
                "xml_file": xml_file,
                "html_file": html_file,
            },
        }),
        TaskStatus::Degraded { xml_file, detail } => json!({
            "task_id": task_id,
            "status": "Degraded",
            "result": {
                "xml_file": xml_file,
            },
            "detail": detail,
        }),
        TaskStatus::Failed { error } => json!({
            "task_id": task_id,
            "status": "Failed",
            "error": error,
        }),
        TaskStatus::Unknown => json!({
            "task_id": task_id,
            "status": "Unknown",
        }),
    };

    Ok(Json(body))
}

/// GET /api/results/{domain}
///
/// Returns download locators for a domain's artifact pair. 404 unless
/// both the structured and rendered reports are published.
pub async fn scan_results_handler(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> AppResult<Json<Value>> {
    let domain = Domain::parse(&domain).map_err(|e| AppError::bad_request(e.to_string()))?;

    let (xml_file, html_file) = state
        .store
        .published_basenames(&domain)
        .ok_or_else(|| AppError::not_found("Scan results not found."))?;

    Ok(Json(json!({
        "domain": domain.as_str(),
        "xml_url": format!("/scan_results/{xml_file}"),
        "html_url": format!("/scan_results/{html_file}"),
    })))
}

/// GET /scan_results/{filename}
///
/// Streams a published artifact as an attachment. The filename must be
/// a bare name under the result root; anything else is treated as
/// missing rather than resolved.
pub async fn download_artifact_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<Response> {
    let path = state
        .store
        .resolve_download(&filename)
        .ok_or_else(|| AppError::not_found("File not found."))?;

    let file = File::open(&path)
        .await
        .map_err(|_| AppError::not_found("File not found."))?;

    let metadata = file
        .metadata()
        .await
        .map_err(|_| AppError::internal("Failed to read file metadata"))?;

    // Opening a directory succeeds on Linux; only regular files stream.
    if !metadata.is_file() {
        return Err(AppError::not_found("File not found."));
    }

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        content_type_for(&filename).parse().unwrap(),
    );
    headers.insert(
        header::CONTENT_LENGTH,
        metadata.len().to_string().parse().unwrap(),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{filename}\"")
            .parse()
            .map_err(|_| AppError::bad_request("Filename is not header-safe"))?,
    );

    let stream = ReaderStream::new(file);

    Ok((StatusCode::OK, headers, Body::from_stream(stream)).into_response())
}

fn content_type_for(filename: &str) -> &'static str {
    if filename.ends_with(".xml") {
        "text/xml"
    } else if filename.ends_with(".html") {
        "text/html"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for("example.com_scan.xml"), "text/xml");
        assert_eq!(content_type_for("example.com_report.html"), "text/html");
        assert_eq!(content_type_for("notes.txt"), "application/octet-stream");
    }
}

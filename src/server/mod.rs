//! The user-facing JSON web server. Handlers return `RelayError` and the
//! `ResponseError` impl below turns each variant into the envelope the map UI
//! matches on; nothing escapes as an unhandled fault.

use crate::detector::DetectionClient;
use crate::error::RelayError;
use crate::store::ArtifactStore;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use serde_json::json;

pub mod protocol;
pub mod routes;

/// Shared per-worker state. Requests only read from it, so plain clones are
/// enough; the reqwest client inside `DetectionClient` pools connections.
#[derive(Clone)]
pub struct AppState {
    pub detector: DetectionClient,
    pub store: ArtifactStore,
}

/// Register the API routes. The binary adds static file serving and logging
/// on top; tests mount this directly.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::process_screenshot)
        .service(routes::process_latest_image)
        .service(routes::downloads_images)
        .service(routes::health);
}

impl actix_web::error::ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::NoFileProvided => StatusCode::BAD_REQUEST,
            RelayError::NoImagesFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            RelayError::NoFileProvided => json!({ "error": "no_file" }),
            RelayError::NoImagesFound => json!({ "error": "No images in Downloads" }),
            RelayError::ScanFailed(_) => json!({ "error": "failed" }),
            other => json!({
                "error": "processing_failed",
                "details": other.to_string(),
                "aiResponse": other.upstream_body(),
            }),
        };

        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }
}

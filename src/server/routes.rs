//! HTTP handlers for the relay pipeline: screenshot upload, latest-image
//! selection, downloads listing, and health. Each request runs the pipeline
//! independently; a request that loses its client still finishes the
//! upstream call and writes its artifact.

use super::protocol::{HealthReply, ProcessedReply};
use super::AppState;
use crate::error::RelayError;
use crate::normalize;
use crate::store::ArtifactStore;
use actix_multipart::{Field, Multipart};
use actix_web::{get, post, web, Responder};
use futures::{StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};

type Result<T> = std::result::Result<T, RelayError>;

/// A screenshot spooled to disk, multer-style, until it has been forwarded
struct SpooledUpload {
    path: PathBuf,
    filename: String,
    mime: String,
}

/// Shared tail of both processing endpoints:
/// forward -> normalize -> persist -> reply
async fn relay_image(
    state: &AppState,
    image: &[u8],
    filename: &str,
    mime: &str,
) -> Result<ProcessedReply> {
    let raw = state.detector.submit(image, filename, mime).await?;
    let reply = normalize::normalize(&raw)?;
    let artifact = state.store.save(&reply.image_bytes).await?;

    info!(
        artifact = %artifact.filename,
        detections = reply.detections.len(),
        "image processed"
    );

    Ok(ProcessedReply {
        ok: true,
        url: artifact.url,
        filename: artifact.filename,
        detections: reply.detections,
        processed_image_base64: reply.image_base64,
    })
}

/// Pull the `screenshot` file field out of the payload and spool it to disk.
/// Anything else in the payload is ignored; no file field means `no_file`.
async fn spool_screenshot(mut payload: Multipart, store: &ArtifactStore) -> Result<SpooledUpload> {
    while let Ok(Some(mut field)) = payload.try_next().await {
        if field.name() != Some("screenshot") {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(|name| name.to_string())
            .unwrap_or_else(|| "screenshot.png".to_string());
        let mime = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let path = store.spool_path();
        if let Err(e) = write_spool(&path, &mut field).await {
            // a partial spool must not outlive its failed upload
            store.discard_upload(&path).await;
            return Err(e);
        }

        return Ok(SpooledUpload {
            path,
            filename,
            mime,
        });
    }

    Err(RelayError::NoFileProvided)
}

/// Stream one multipart field into the spool file. Truncated bodies and
/// client disconnects surface here as stream errors.
async fn write_spool(path: &Path, field: &mut Field) -> Result<()> {
    let mut file = fs::File::create(path).await?;
    while let Some(chunk) = field.next().await {
        let chunk =
            chunk.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}

async fn process_spooled(state: &AppState, upload: &SpooledUpload) -> Result<ProcessedReply> {
    let image = fs::read(&upload.path).await?;
    relay_image(state, &image, &upload.filename, &upload.mime).await
}

#[post("/api/process-screenshot")]
pub async fn process_screenshot(
    payload: Multipart,
    state: web::Data<AppState>,
) -> Result<impl Responder> {
    let upload = spool_screenshot(payload, &state.store).await?;

    // the spool file is gone after this, whatever the pipeline did
    let outcome = process_spooled(&state, &upload).await;
    state.store.discard_upload(&upload.path).await;

    match outcome {
        Ok(reply) => Ok(web::Json(reply)),
        Err(e) => {
            error!(error = %e, "process-screenshot failed");
            Err(e)
        }
    }
}

#[get("/api/process-latest-image")]
pub async fn process_latest_image(state: web::Data<AppState>) -> Result<impl Responder> {
    let latest = state
        .store
        .latest_image()
        .await
        .ok_or(RelayError::NoImagesFound)?;
    let filename = latest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    let outcome = async {
        let image = fs::read(&latest).await?;
        relay_image(&state, &image, &filename, "application/octet-stream").await
    }
    .await;

    match outcome {
        Ok(reply) => Ok(web::Json(reply)),
        Err(e) => {
            error!(source = %latest.display(), error = %e, "process-latest-image failed");
            Err(e)
        }
    }
}

#[get("/api/downloads-images")]
pub async fn downloads_images(state: web::Data<AppState>) -> Result<impl Responder> {
    let listing = state.store.list_images().await?;
    Ok(web::Json(listing))
}

#[get("/api/health")]
pub async fn health(state: web::Data<AppState>) -> impl Responder {
    web::Json(HealthReply {
        status: "ok",
        downloads_path: state.store.downloads_dir().display().to_string(),
        api_endpoint: state.detector.endpoint().to_string(),
    })
}

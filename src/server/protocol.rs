//! Wire types for the relay's JSON surface. Field casing follows what the
//! map UI already parses.

use crate::normalize::Detection;
use serde::Serialize;

/// Successful pipeline outcome, returned by both processing endpoints.
/// The inline base64 and the file behind `url` are the same image.
#[derive(Debug, Serialize)]
pub struct ProcessedReply {
    pub ok: bool,
    pub url: String,
    pub filename: String,
    pub detections: Vec<Detection>,
    #[serde(rename = "processedImageBase64")]
    pub processed_image_base64: String,
}

#[derive(Debug, Serialize)]
pub struct HealthReply {
    pub status: &'static str,
    #[serde(rename = "downloadsPath")]
    pub downloads_path: String,
    #[serde(rename = "apiEndpoint")]
    pub api_endpoint: String,
}

//! Everything that can go wrong between receiving an image and responding is
//! folded into [`RelayError`]. The web layer converts each variant into the
//! JSON envelope the UI expects; nothing propagates past that boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// The screenshot endpoint was called without a `screenshot` file field
    #[error("no file provided")]
    NoFileProvided,

    /// The watched downloads directory held no image to forward
    #[error("No images in Downloads")]
    NoImagesFound,

    /// The detection API could not be reached: connect failure or timeout
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(#[source] reqwest::Error),

    /// The detection API answered with a non-2xx status
    #[error("upstream rejected request with status {status}")]
    UpstreamRejected { status: u16, body: String },

    /// The detection API replied 2xx but the body could not be decoded into
    /// the expected `{processed_image_base64, detections}` shape
    #[error("malformed upstream response: {details}")]
    MalformedUpstreamResponse {
        details: String,
        body: Option<String>,
    },

    /// A read or write in the pipeline failed
    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    /// The downloads-directory listing could not be produced
    #[error("failed to scan downloads directory: {0}")]
    ScanFailed(#[source] std::io::Error),
}

impl RelayError {
    /// Raw upstream body, when one was captured before the failure. Surfaced
    /// to the caller as `aiResponse` for post-mortems against the model API.
    pub fn upstream_body(&self) -> Option<&str> {
        match self {
            RelayError::UpstreamRejected { body, .. } => Some(body),
            RelayError::MalformedUpstreamResponse { body, .. } => body.as_deref(),
            _ => None,
        }
    }
}

//! Outbound half of the relay: forwards one image to the external detection
//! API as a multipart upload and hands back the raw reply bytes. One request,
//! one upstream call, no retries -- the UI decides whether to re-trigger.

use crate::error::RelayError;
use reqwest::multipart;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DetectionClient {
    client: reqwest::Client,
    endpoint: String,
}

impl DetectionClient {
    /// Build a client for the given endpoint. The timeout covers the whole
    /// upstream exchange; request and response sizes are unbounded.
    pub fn new(endpoint: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST the image as a single `file` multipart field and return the reply
    /// body as raw bytes, so non-UTF-8 upstream replies survive intact.
    ///
    /// Connect failures and timeouts become `UpstreamUnreachable`; a non-2xx
    /// status becomes `UpstreamRejected` carrying the body for `aiResponse`.
    pub async fn submit(
        &self,
        image: &[u8],
        filename: &str,
        mime: &str,
    ) -> Result<Vec<u8>, RelayError> {
        let part = multipart::Part::bytes(image.to_vec()).file_name(filename.to_string());
        let part = match part.mime_str(mime) {
            Ok(part) => part,
            // content type came from the client; a bad one is not worth
            // failing the request over, reqwest defaults it
            Err(_) => multipart::Part::bytes(image.to_vec()).file_name(filename.to_string()),
        };
        let form = multipart::Form::new().part("file", part);

        debug!(endpoint = %self.endpoint, filename, bytes = image.len(), "forwarding image to detection API");

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(RelayError::UpstreamUnreachable)?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(RelayError::UpstreamUnreachable)?;

        if !status.is_success() {
            return Err(RelayError::UpstreamRejected {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(body.to_vec())
    }
}

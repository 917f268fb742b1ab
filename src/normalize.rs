//! Decodes the detection API's JSON envelope into the relay's normalized
//! reply. The upstream is trusted: the annotated image is base64-decoded for
//! persistence but its pixel structure is never re-validated here.

use crate::error::RelayError;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

/// One recognized object instance, passed through in upstream order.
/// Fields the model attaches beyond the known four ride along untouched,
/// and an id the upstream never sent is not invented on the way out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub id: serde_json::Value,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Boundary polygon as ordered `[x, y]` pairs; box corners give length 4
    #[serde(default)]
    pub points: Vec<[f64; 2]>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// What the detection API actually sends back on success
#[derive(Deserialize)]
struct UpstreamEnvelope {
    processed_image_base64: String,
    #[serde(default)]
    detections: Vec<Detection>,
}

/// Fully decoded upstream reply: the annotated image both as bytes for the
/// artifact store and as the base64 string echoed back to the caller.
#[derive(Debug)]
pub struct NormalizedReply {
    pub image_bytes: Vec<u8>,
    pub image_base64: String,
    pub detections: Vec<Detection>,
}

/// Parse the raw upstream bytes. `processed_image_base64` is required;
/// `detections` defaults to empty and keeps its insertion order, which is the
/// canonical order for everything downstream.
pub fn normalize(raw: &[u8]) -> Result<NormalizedReply, RelayError> {
    let text = std::str::from_utf8(raw).map_err(|e| malformed(e, raw))?;
    let envelope: UpstreamEnvelope = serde_json::from_str(text).map_err(|e| malformed(e, raw))?;
    let image_bytes = general_purpose::STANDARD
        .decode(envelope.processed_image_base64.as_bytes())
        .map_err(|e| malformed(e, raw))?;

    Ok(NormalizedReply {
        image_bytes,
        image_base64: envelope.processed_image_base64,
        detections: envelope.detections,
    })
}

fn malformed(details: impl std::fmt::Display, raw: &[u8]) -> RelayError {
    RelayError::MalformedUpstreamResponse {
        details: details.to_string(),
        body: Some(String::from_utf8_lossy(raw).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};
    use serde_json::json;

    fn envelope(detections: serde_json::Value) -> Vec<u8> {
        json!({
            "processed_image_base64": general_purpose::STANDARD.encode(b"annotated png"),
            "detections": detections,
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn decodes_image_and_detections() {
        let raw = envelope(json!([
            {"id": 1, "category": "vehicle", "score": 0.92, "points": [[0.0,0.0],[4.0,0.0],[4.0,4.0],[0.0,4.0]]},
            {"id": 2, "category": "building", "points": [[1.0,1.0],[2.0,1.0],[2.0,2.0]]},
        ]));

        let reply = normalize(&raw).unwrap();
        assert_eq!(reply.image_bytes, b"annotated png");
        assert_eq!(reply.detections.len(), 2);
        // upstream order is preserved verbatim
        assert_eq!(reply.detections[0].category, "vehicle");
        assert_eq!(reply.detections[0].score, Some(0.92));
        assert_eq!(reply.detections[1].category, "building");
        assert_eq!(reply.detections[1].score, None);
        assert_eq!(reply.detections[1].points.len(), 3);
    }

    #[test]
    fn unknown_detection_fields_ride_along() {
        let raw = envelope(json!([
            {"id": 7, "category": "ship", "points": [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]],
             "heading_deg": 42.5, "source_model": "yolo"},
        ]));

        let reply = normalize(&raw).unwrap();
        let detection = &reply.detections[0];
        assert_eq!(detection.extra["heading_deg"], 42.5);
        assert_eq!(detection.extra["source_model"], "yolo");

        // and they survive re-serialization toward the caller
        let out = serde_json::to_value(detection).unwrap();
        assert_eq!(out["heading_deg"], 42.5);
        assert_eq!(out["source_model"], "yolo");
    }

    #[test]
    fn omitted_id_stays_omitted_on_the_way_out() {
        let raw = envelope(json!([
            {"category": "dock", "points": [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]},
        ]));

        let reply = normalize(&raw).unwrap();
        let out = serde_json::to_value(&reply.detections[0]).unwrap();
        assert!(out.get("id").is_none());
    }

    #[test]
    fn missing_detections_defaults_to_empty() {
        let raw = json!({"processed_image_base64": general_purpose::STANDARD.encode(b"x")})
            .to_string()
            .into_bytes();
        let reply = normalize(&raw).unwrap();
        assert!(reply.detections.is_empty());
    }

    #[test]
    fn missing_image_field_is_malformed() {
        let raw = json!({"detections": []}).to_string().into_bytes();
        let err = normalize(&raw).unwrap_err();
        match err {
            RelayError::MalformedUpstreamResponse { body, .. } => {
                assert!(body.unwrap().contains("detections"));
            }
            other => panic!("expected MalformedUpstreamResponse, got {other:?}"),
        }
    }

    #[test]
    fn invalid_base64_is_malformed() {
        let raw = json!({"processed_image_base64": "!!! not base64 !!!"})
            .to_string()
            .into_bytes();
        assert!(matches!(
            normalize(&raw),
            Err(RelayError::MalformedUpstreamResponse { .. })
        ));
    }

    #[test]
    fn non_utf8_body_is_malformed() {
        assert!(matches!(
            normalize(&[0xff, 0xfe, 0x00]),
            Err(RelayError::MalformedUpstreamResponse { .. })
        ));
    }

    #[test]
    fn non_json_body_is_malformed_and_captured() {
        let err = normalize(b"<html>502 Bad Gateway</html>").unwrap_err();
        assert_eq!(err.upstream_body(), Some("<html>502 Bad Gateway</html>"));
    }
}

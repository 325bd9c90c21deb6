use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request for an upload slot for one media blob, scoped to the trace
/// and observation the blob was found in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMediaRequest {
    /// The trace the blob belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// The observation the blob belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation_id: Option<String>,
    /// MIME type of the blob.
    pub content_type: String,
    /// Size of the raw bytes.
    pub content_length: usize,
    /// Base64-encoded SHA-256 of the raw bytes, for deduplication.
    pub sha_256_hash: String,
    /// Which observation field the blob was found in (`input`/`output`).
    pub field: String,
}

/// The collector's answer to a [`CreateMediaRequest`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUploadSlot {
    /// Stable identifier the message is rewritten to reference.
    pub media_id: String,
    /// Presigned URL to PUT the raw bytes to. Absent when the collector
    /// already holds a blob with the same hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,
}

/// Completion report PATCHed back after a media upload attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUploadStatus {
    /// When the upload finished.
    pub uploaded_at: DateTime<Utc>,
    /// HTTP status returned by the blob store (0 when the request never
    /// got a response).
    pub upload_http_status: u16,
    /// Error detail when the upload failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_http_error: Option<String>,
    /// Wall-clock duration of the upload in milliseconds.
    pub upload_time_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_request_wire_names() {
        let req = CreateMediaRequest {
            trace_id: Some("t".to_owned()),
            observation_id: Some("o".to_owned()),
            content_type: "image/png".to_owned(),
            content_length: 3,
            sha_256_hash: "abc=".to_owned(),
            field: "input".to_owned(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["traceId"], "t");
        assert_eq!(json["observationId"], "o");
        assert_eq!(json["contentType"], "image/png");
        assert_eq!(json["sha256Hash"], "abc=");
        assert_eq!(json["field"], "input");
    }

    #[test]
    fn test_upload_slot_without_url() {
        let slot: MediaUploadSlot =
            serde_json::from_str(r#"{"mediaId":"m-1"}"#).unwrap();
        assert_eq!(slot.media_id, "m-1");
        assert_eq!(slot.upload_url, None);
    }
}

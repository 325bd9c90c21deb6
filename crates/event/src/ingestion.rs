use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::IngestionEvent;

/// The body of a batch upload.
#[derive(Debug, Serialize)]
pub struct IngestionRequest<'a> {
    /// The events in this batch.
    pub batch: &'a [IngestionEvent],
    /// Batch-level metadata describing the sender.
    pub metadata: IngestionMetadata,
}

/// Metadata describing the SDK that produced a batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IngestionMetadata {
    /// Number of events in the batch.
    pub batch_size: usize,
    /// The integration flavor, e.g. `rust`.
    pub sdk_integration: String,
    /// Name of the SDK.
    pub sdk_name: String,
    /// Version of the SDK.
    pub sdk_version: String,
    /// The public API key the batch was sent with.
    pub public_key: String,
}

/// Per-item outcome report from the collector.
///
/// The uploader treats a batch as all-or-nothing for retry purposes;
/// this is parsed leniently and only logged.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct IngestionResponse {
    /// Items the collector accepted.
    #[serde(default)]
    pub successes: Vec<Value>,
    /// Items the collector rejected.
    #[serde(default)]
    pub errors: Vec<Value>,
}

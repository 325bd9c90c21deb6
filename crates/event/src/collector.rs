use std::error::Error;

use async_trait::async_trait;
use bytes::Bytes;

use crate::envelope::IngestionEvent;
use crate::error::ErrorKind;
use crate::media::{CreateMediaRequest, MediaUploadSlot, MediaUploadStatus};

/// The error type for a collector.
pub trait CollectorError: Error + Send + Sync + 'static {
    /// Returns the kind of this error, so the retry layer can tell
    /// transient failures from permanent rejections.
    fn kind(&self) -> ErrorKind;
}

/// A remote telemetry collector.
///
/// Once created, a collector should behave like a stateless object: the
/// pipeline may call it from several workers concurrently and never
/// relies on call ordering.
#[async_trait]
pub trait Collector: Send + Sync {
    /// The error type that may be returned by the collector.
    type Error: CollectorError;

    /// Uploads one batch of events.
    ///
    /// Partial per-item failures are the implementor's concern (log
    /// them); the pipeline retries or drops the batch as a unit based on
    /// the returned error kind.
    async fn ingest(
        &self,
        batch: &[IngestionEvent],
    ) -> Result<(), Self::Error>;

    /// Requests an upload slot for one media blob.
    async fn create_media(
        &self,
        req: &CreateMediaRequest,
    ) -> Result<MediaUploadSlot, Self::Error>;

    /// PUTs raw media bytes to a presigned URL, returning the HTTP
    /// status the blob store answered with.
    async fn upload_media(
        &self,
        upload_url: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<u16, Self::Error>;

    /// Reports the outcome of a media upload back to the collector.
    async fn patch_media(
        &self,
        media_id: &str,
        status: &MediaUploadStatus,
    ) -> Result<(), Self::Error>;
}

//! A scripted in-memory collector for testing purpose.
//!
//! `TestCollector` answers each call with the next planned HTTP status
//! (200 when the plan runs out) and records everything it receives, so
//! tests can drive the pipeline end to end and assert on what would
//! have been sent over the wire.

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tracepost_event::{
    Collector, CollectorError, CreateMediaRequest, ErrorKind, IngestionEvent,
    MediaUploadSlot, MediaUploadStatus,
};

/// Error type for [`TestCollector`].
#[derive(Debug)]
pub struct Error {
    status: u16,
    kind: ErrorKind,
}

impl Error {
    /// The planned HTTP status that produced this error.
    #[inline]
    pub fn status(&self) -> u16 {
        self.status
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "test collector answered {}", self.status)
    }
}

impl StdError for Error {}

impl CollectorError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// One recorded media upload: presigned URL, content type and byte size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedUpload {
    pub upload_url: String,
    pub content_type: String,
    pub content_length: usize,
}

#[derive(Default)]
struct Inner {
    ingest_plan: VecDeque<u16>,
    upload_plan: VecDeque<u16>,
    upload_url: Option<String>,
    next_media_id: u64,
    ingest_calls: u64,
    batches: Vec<Vec<IngestionEvent>>,
    media_requests: Vec<CreateMediaRequest>,
    media_uploads: Vec<RecordedUpload>,
    media_patches: Vec<(String, MediaUploadStatus)>,
}

/// A scripted collector. Cloning is cheap and shares the recordings.
#[derive(Clone, Default)]
pub struct TestCollector {
    inner: Arc<Mutex<Inner>>,
}

impl TestCollector {
    /// Creates a collector that accepts everything with status 200.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the status the next unplanned `ingest` call answers with.
    /// Statuses are consumed in FIFO order.
    pub fn plan_ingest_status(&self, status: u16) {
        self.inner.lock().unwrap().ingest_plan.push_back(status);
    }

    /// Queues the status the next media upload answers with.
    pub fn plan_upload_status(&self, status: u16) {
        self.inner.lock().unwrap().upload_plan.push_back(status);
    }

    /// Makes `create_media` hand out the given presigned upload URL.
    /// Without it, slots come back without an upload URL (blob already
    /// known to the collector).
    pub fn set_upload_url<S: Into<String>>(&self, url: S) {
        self.inner.lock().unwrap().upload_url = Some(url.into());
    }

    /// Total number of `ingest` calls, including failed ones.
    pub fn ingest_calls(&self) -> u64 {
        self.inner.lock().unwrap().ingest_calls
    }

    /// All successfully ingested batches, in arrival order.
    pub fn batches(&self) -> Vec<Vec<IngestionEvent>> {
        self.inner.lock().unwrap().batches.clone()
    }

    /// All media slots requested.
    pub fn media_requests(&self) -> Vec<CreateMediaRequest> {
        self.inner.lock().unwrap().media_requests.clone()
    }

    /// All media uploads performed.
    pub fn media_uploads(&self) -> Vec<RecordedUpload> {
        self.inner.lock().unwrap().media_uploads.clone()
    }

    /// All media completion reports, keyed by media id.
    pub fn media_patches(&self) -> Vec<(String, MediaUploadStatus)> {
        self.inner.lock().unwrap().media_patches.clone()
    }
}

#[async_trait]
impl Collector for TestCollector {
    type Error = Error;

    async fn ingest(
        &self,
        batch: &[IngestionEvent],
    ) -> Result<(), Self::Error> {
        let mut inner = self.inner.lock().unwrap();
        inner.ingest_calls += 1;
        let status = inner.ingest_plan.pop_front().unwrap_or(200);
        if (200..300).contains(&status) {
            inner.batches.push(batch.to_vec());
            Ok(())
        } else {
            Err(Error {
                status,
                kind: ErrorKind::from_status(status),
            })
        }
    }

    async fn create_media(
        &self,
        req: &CreateMediaRequest,
    ) -> Result<MediaUploadSlot, Self::Error> {
        let mut inner = self.inner.lock().unwrap();
        inner.media_requests.push(req.clone());
        inner.next_media_id += 1;
        Ok(MediaUploadSlot {
            media_id: format!("media-{}", inner.next_media_id),
            upload_url: inner.upload_url.clone(),
        })
    }

    async fn upload_media(
        &self,
        upload_url: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<u16, Self::Error> {
        let mut inner = self.inner.lock().unwrap();
        inner.media_uploads.push(RecordedUpload {
            upload_url: upload_url.to_owned(),
            content_type: content_type.to_owned(),
            content_length: bytes.len(),
        });
        Ok(inner.upload_plan.pop_front().unwrap_or(200))
    }

    async fn patch_media(
        &self,
        media_id: &str,
        status: &MediaUploadStatus,
    ) -> Result<(), Self::Error> {
        self.inner
            .lock()
            .unwrap()
            .media_patches
            .push((media_id.to_owned(), status.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tracepost_event::{EventBody, EventType, Trace};

    use super::*;

    fn trace_event(id: &str) -> IngestionEvent {
        IngestionEvent {
            id: format!("evt-{id}"),
            event_type: EventType::TraceCreate,
            timestamp: chrono::Utc::now(),
            metadata: None,
            body: EventBody::Trace(Trace {
                id: Some(id.to_owned()),
                ..Default::default()
            }),
        }
    }

    #[tokio::test]
    async fn test_planned_statuses_are_consumed_in_order() {
        let collector = TestCollector::new();
        collector.plan_ingest_status(503);
        collector.plan_ingest_status(200);

        let batch = vec![trace_event("a")];
        let err = collector.ingest(&batch).await.unwrap_err();
        assert_eq!(err.status(), 503);
        assert_eq!(err.kind(), ErrorKind::Other);

        collector.ingest(&batch).await.unwrap();
        // The plan ran out, further calls succeed.
        collector.ingest(&batch).await.unwrap();

        assert_eq!(collector.ingest_calls(), 3);
        assert_eq!(collector.batches().len(), 2);
    }

    #[tokio::test]
    async fn test_media_slots_are_sequential() {
        let collector = TestCollector::new();
        collector.set_upload_url("https://blobs.test/put");

        let req = CreateMediaRequest {
            trace_id: Some("t".to_owned()),
            observation_id: None,
            content_type: "image/png".to_owned(),
            content_length: 3,
            sha_256_hash: "abc=".to_owned(),
            field: "input".to_owned(),
        };
        let first = collector.create_media(&req).await.unwrap();
        let second = collector.create_media(&req).await.unwrap();
        assert_eq!(first.media_id, "media-1");
        assert_eq!(second.media_id, "media-2");
        assert_eq!(first.upload_url.as_deref(), Some("https://blobs.test/put"));
        assert_eq!(collector.media_requests().len(), 2);
    }
}

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use chrono::Utc;
use futures_util::FutureExt;
use sha2::{Digest, Sha256};
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracepost_event::{
    ChatMessage, Collector, ContentPart, CreateMediaRequest, Generation,
    MediaUploadStatus, MessageContent,
};
use tracing::Instrument;

use crate::consumer::panic_message;
use crate::retry::with_backoff;
use crate::wait_group::WaitGroup;

/// One media blob inlined as a base64 data URI.
struct InlineMedia {
    content_type: String,
    bytes: Bytes,
}

impl InlineMedia {
    /// Parses a `data:{mime};base64,{payload}` URI. Returns `None` for
    /// anything else, including data URIs without base64 encoding.
    fn from_data_uri(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix("data:")?;
        let (content_type, payload) = rest.split_once(";base64,")?;
        content_type.parse::<mime::Mime>().ok()?;
        let bytes = STANDARD.decode(payload).ok()?;
        Some(Self {
            content_type: content_type.to_owned(),
            bytes: Bytes::from(bytes),
        })
    }

    fn sha256_base64(&self) -> String {
        STANDARD.encode(Sha256::digest(&self.bytes))
    }
}

/// The token written into a message in place of the raw data URI.
fn reference_token(content_type: &str, media_id: &str) -> String {
    format!(
        "@@@media:type={content_type}|id={media_id}|source=base64_data_uri@@@"
    )
}

/// Finds inline media in generation messages, registers each blob with
/// the collector, rewrites the message to a reference token and uploads
/// the raw bytes in the background.
///
/// Registration happens on the worker so the rewritten token lands in
/// the event before it is serialized; only the byte upload is detached.
pub(crate) struct MediaExtractor<C> {
    collector: Arc<C>,
    uploads: WaitGroup,
    permits: Arc<Semaphore>,
    max_retry: u32,
}

impl<C> Clone for MediaExtractor<C> {
    fn clone(&self) -> Self {
        Self {
            collector: Arc::clone(&self.collector),
            uploads: self.uploads.clone(),
            permits: Arc::clone(&self.permits),
            max_retry: self.max_retry,
        }
    }
}

impl<C: Collector + 'static> MediaExtractor<C> {
    pub fn new(
        collector: Arc<C>,
        uploads: WaitGroup,
        permits: Arc<Semaphore>,
        max_retry: u32,
    ) -> Self {
        Self {
            collector,
            uploads,
            permits,
            max_retry,
        }
    }

    pub async fn process_generation(&self, generation: &mut Generation) {
        let trace_id = generation.trace_id.clone();
        let observation_id = generation.id.clone();
        for message in &mut generation.in_messages {
            self.process_message(message, &trace_id, &observation_id, "input")
                .await;
        }
        if let Some(message) = &mut generation.out_message {
            self.process_message(message, &trace_id, &observation_id, "output")
                .await;
        }
    }

    async fn process_message(
        &self,
        message: &mut ChatMessage,
        trace_id: &Option<String>,
        observation_id: &Option<String>,
        field: &str,
    ) {
        let MessageContent::Parts(parts) = &mut message.content else {
            return;
        };
        for part in parts {
            let url = match part {
                ContentPart::Image { url }
                | ContentPart::Audio { url }
                | ContentPart::Video { url } => url,
                ContentPart::Text { .. } => continue,
            };
            if !url.starts_with("data:") {
                continue;
            }
            let Some(media) = InlineMedia::from_data_uri(url) else {
                warn!("skipping unparsable data URI in {field} message");
                continue;
            };
            if let Some(token) =
                self.register(media, trace_id, observation_id, field).await
            {
                *url = token;
            }
        }
    }

    /// Registers one blob with the collector. On success the original
    /// data URI is replaced with the returned reference token; on
    /// failure the URI stays in place so no data is lost.
    async fn register(
        &self,
        media: InlineMedia,
        trace_id: &Option<String>,
        observation_id: &Option<String>,
        field: &str,
    ) -> Option<String> {
        let req = CreateMediaRequest {
            trace_id: trace_id.clone(),
            observation_id: observation_id.clone(),
            content_type: media.content_type.clone(),
            content_length: media.bytes.len(),
            sha_256_hash: media.sha256_base64(),
            field: field.to_owned(),
        };
        let slot = match with_backoff(self.max_retry, || {
            self.collector.create_media(&req)
        })
        .await
        {
            Ok(slot) => slot,
            Err(err) => {
                warn!("failed to register media blob: {err}");
                return None;
            }
        };

        let token = reference_token(&media.content_type, &slot.media_id);
        if let Some(upload_url) = slot.upload_url {
            self.spawn_upload(media, slot.media_id, upload_url);
        } else {
            trace!("media blob already known to the collector, skipping upload");
        }
        Some(token)
    }

    fn spawn_upload(
        &self,
        media: InlineMedia,
        media_id: String,
        upload_url: String,
    ) {
        // Take the guard before spawning, so a flush issued right after
        // the event is processed already counts this upload.
        let guard = self.uploads.guard();
        let collector = Arc::clone(&self.collector);
        let permits = Arc::clone(&self.permits);
        let task = async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            let started = Instant::now();
            let (status, error) = match collector
                .upload_media(&upload_url, &media.content_type, media.bytes)
                .await
            {
                Ok(status) => (status, None),
                Err(err) => (0, Some(err.to_string())),
            };
            let report = MediaUploadStatus {
                uploaded_at: Utc::now(),
                upload_http_status: status,
                upload_http_error: error,
                upload_time_ms: started.elapsed().as_millis() as u64,
            };
            if let Err(err) = collector.patch_media(&media_id, &report).await {
                warn!("failed to report media upload status: {err}");
            }
        };
        tokio::spawn(
            async move {
                let _guard = guard;
                if let Err(panic) = AssertUnwindSafe(task).catch_unwind().await
                {
                    error!(
                        "media upload task panicked: {}",
                        panic_message(&*panic)
                    );
                }
            }
            .instrument(trace_span!("media_upload")),
        );
    }
}

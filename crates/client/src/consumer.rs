use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::watch;
use tokio::time::Instant;
use tracepost_event::{Collector, EventBody, Generation, IngestionEvent};

use crate::media::MediaExtractor;
use crate::options::{MaskFn, Options};
use crate::queue::BoundedQueue;
use crate::retry::with_backoff;
use crate::sampler::deterministic_sample;
use crate::truncate::truncate;

/// Ceiling on the serialized size of one batch. Assembly stops early
/// once the running total crosses it.
pub(crate) const MAX_BATCH_BYTES: usize = 2_500_000;

const FAILED_MASK_MESSAGE: &str = "<masked due to failed mask function>";

/// A batch-upload worker.
///
/// Pulls events off the shared queue within a time/count/size budget,
/// preprocesses them (sampling, media extraction, masking, truncation)
/// and ships the batch with retry. Several consumers may run against the
/// same queue; each event is owned by exactly one of them.
pub(crate) struct Consumer<C> {
    queue: Arc<BoundedQueue>,
    collector: Arc<C>,
    media: MediaExtractor<C>,
    options: Arc<Options>,
    kill_rx: watch::Receiver<bool>,
}

impl<C: Collector + 'static> Consumer<C> {
    pub fn new(
        queue: Arc<BoundedQueue>,
        collector: Arc<C>,
        media: MediaExtractor<C>,
        options: Arc<Options>,
        kill_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            queue,
            collector,
            media,
            options,
            kill_rx,
        }
    }

    pub async fn run(mut self) {
        trace!("batch worker started");
        loop {
            // The kill switch is only checked between batches, so
            // shutdown latency is bounded by one flush interval. Not
            // select!-ing over it keeps the ack bookkeeping below
            // straight-line.
            if *self.kill_rx.borrow_and_update() {
                break;
            }
            let batch = self.next_batch().await;
            if batch.is_empty() {
                continue;
            }
            let upload = AssertUnwindSafe(self.upload(&batch))
                .catch_unwind()
                .await;
            if let Err(panic) = upload {
                error!("batch upload panicked: {}", panic_message(&*panic));
            }
            // Events are acked only after the upload settled, so a
            // concurrent flush cannot return while the batch is in
            // flight.
            for _ in &batch {
                self.queue.done();
            }
        }
        trace!("batch worker stopped");
    }

    /// Assembles the next batch: up to `flush_at` events, within one
    /// flush interval, below the batch byte ceiling. Events discarded
    /// during preprocessing are acked here and never reach the batch.
    async fn next_batch(&self) -> Vec<IngestionEvent> {
        let mut batch = Vec::new();
        let mut total_bytes = 0;
        let started = Instant::now();
        while batch.len() < self.options.flush_at {
            let remaining = self
                .options
                .flush_interval
                .checked_sub(started.elapsed())
                .unwrap_or_default();
            if remaining.is_zero() {
                break;
            }
            let Some(mut event) = self.queue.get(remaining).await else {
                break;
            };
            if !self.preprocess(&mut event).await {
                self.queue.done();
                continue;
            }
            match serde_json::to_vec(&event) {
                Ok(bytes) => total_bytes += bytes.len(),
                Err(err) => {
                    error!("failed to serialize event {}: {err}", event.id);
                    self.queue.done();
                    continue;
                }
            }
            batch.push(event);
            if total_bytes >= MAX_BATCH_BYTES {
                break;
            }
        }
        batch
    }

    /// Prepares one event for upload. Returns `false` when the event
    /// should be discarded instead.
    async fn preprocess(&self, event: &mut IngestionEvent) -> bool {
        let rate = self.options.sample_rate.unwrap_or(1.0);
        if let Some(trace_id) = event.body.trace_id() {
            if !deterministic_sample(trace_id, rate) {
                trace!("event {} sampled out", event.id);
                return false;
            }
        }

        if let EventBody::Generation(generation) = &mut event.body {
            self.media.process_generation(generation).await;
            if !serialize_messages(generation) {
                return false;
            }
        }

        if let Some(mask) = &self.options.mask {
            if let Some(slot) = event.body.input_mut() {
                apply_mask(mask, slot);
            }
            if let Some(slot) = event.body.output_mut() {
                apply_mask(mask, slot);
            }
        }

        truncate(&mut event.body, &self.options.cleared_message);
        true
    }

    async fn upload(&self, batch: &[IngestionEvent]) {
        let result = with_backoff(self.options.max_retry, || {
            self.collector.ingest(batch)
        })
        .await;
        match result {
            Ok(()) => debug!("uploaded a batch of {} events", batch.len()),
            Err(err) => {
                warn!(
                    "dropping a batch of {} events after retries: {err}",
                    batch.len()
                );
            }
        }
    }
}

/// Serializes a generation's structured messages into its wire-level
/// input/output fields, after media extraction rewrote them.
fn serialize_messages(generation: &mut Generation) -> bool {
    if !generation.in_messages.is_empty() {
        match serde_json::to_string(&generation.in_messages) {
            Ok(json) => generation.input = Some(json),
            Err(err) => {
                error!("failed to serialize input messages: {err}");
                return false;
            }
        }
    }
    if let Some(message) = &generation.out_message {
        match serde_json::to_string(message) {
            Ok(json) => generation.output = Some(json),
            Err(err) => {
                error!("failed to serialize output message: {err}");
                return false;
            }
        }
    }
    true
}

/// Applies the user-supplied mask to one field. The callback is foreign
/// code; if it panics, the field is fully masked rather than sent raw.
fn apply_mask(mask: &MaskFn, slot: &mut Option<String>) {
    let Some(value) = slot else {
        return;
    };
    match std::panic::catch_unwind(AssertUnwindSafe(|| mask(value))) {
        Ok(masked) => *value = masked,
        Err(panic) => {
            error!("mask callback panicked: {}", panic_message(&*panic));
            *value = FAILED_MASK_MESSAGE.to_owned();
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use tracepost_event::{ChatMessage, MessageContent};

    use super::*;

    #[test]
    fn test_serialize_messages_fills_wire_fields() {
        let mut generation = Generation {
            in_messages: vec![ChatMessage {
                role: "user".to_owned(),
                content: MessageContent::Text("hi".to_owned()),
            }],
            out_message: Some(ChatMessage {
                role: "assistant".to_owned(),
                content: MessageContent::Text("hello".to_owned()),
            }),
            ..Default::default()
        };
        assert!(serialize_messages(&mut generation));
        assert_eq!(
            generation.input.as_deref(),
            Some(r#"[{"role":"user","content":"hi"}]"#)
        );
        assert_eq!(
            generation.output.as_deref(),
            Some(r#"{"role":"assistant","content":"hello"}"#)
        );
    }

    #[test]
    fn test_serialize_messages_keeps_plain_fields_untouched() {
        let mut generation = Generation {
            input: Some("prompt".to_owned()),
            ..Default::default()
        };
        assert!(serialize_messages(&mut generation));
        assert_eq!(generation.input.as_deref(), Some("prompt"));
        assert_eq!(generation.output, None);
    }

    #[test]
    fn test_mask_is_applied_to_present_fields() {
        let mask: MaskFn = Arc::new(|_| "***".to_owned());
        let mut slot = Some("secret".to_owned());
        apply_mask(&mask, &mut slot);
        assert_eq!(slot.as_deref(), Some("***"));

        let mut empty = None;
        apply_mask(&mask, &mut empty);
        assert_eq!(empty, None);
    }

    #[test]
    fn test_panicking_mask_fully_masks_the_field() {
        let mask: MaskFn = Arc::new(|_| panic!("bad mask"));
        let mut slot = Some("secret".to_owned());
        apply_mask(&mask, &mut slot);
        assert_eq!(slot.as_deref(), Some(FAILED_MASK_MESSAGE));
    }
}

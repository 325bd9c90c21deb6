use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracepost_event::{
    Collector, Event, EventBody, EventType, Generation, IngestionEvent,
    Score, SdkLog, Span, Trace,
};
use uuid::Uuid;

use crate::options::Options;
use crate::task_manager::TaskManager;

/// The tracing client.
///
/// Every `create_*`/`end_*` call is non-blocking: it stamps the payload,
/// queues it and returns the (possibly generated) id immediately. The
/// actual upload happens on background workers; [`Client::flush`] waits
/// for it. Cloning is cheap and every clone feeds the same pipeline.
#[derive(Clone)]
pub struct Client {
    tasks: Arc<TaskManager>,
}

impl Client {
    /// Creates a client that ships telemetry to `collector` and starts
    /// its background workers.
    ///
    /// Must be called within a Tokio runtime.
    pub fn new<C: Collector + 'static>(
        collector: C,
        options: Options,
    ) -> Self {
        Self {
            tasks: Arc::new(TaskManager::new(collector, options)),
        }
    }

    /// Queues a new trace, returning its id.
    pub fn create_trace(&self, mut trace: Trace) -> String {
        let id = assign_id(&mut trace.id);
        if trace.timestamp.is_none() {
            trace.timestamp = Some(Utc::now());
        }
        self.enqueue(EventType::TraceCreate, EventBody::Trace(trace));
        id
    }

    /// Queues a new span, returning its id.
    pub fn create_span(&self, mut span: Span) -> String {
        let id = assign_id(&mut span.id);
        if span.start_time.is_none() {
            span.start_time = Some(Utc::now());
        }
        self.enqueue(EventType::SpanCreate, EventBody::Span(span));
        id
    }

    /// Queues an update that ends a span, returning its id.
    pub fn end_span(&self, mut span: Span) -> String {
        let id = assign_id(&mut span.id);
        if span.end_time.is_none() {
            span.end_time = Some(Utc::now());
        }
        self.enqueue(EventType::SpanUpdate, EventBody::Span(span));
        id
    }

    /// Queues a new generation, returning its id.
    pub fn create_generation(&self, mut generation: Generation) -> String {
        let id = assign_id(&mut generation.id);
        if generation.start_time.is_none() {
            generation.start_time = Some(Utc::now());
        }
        self.enqueue(
            EventType::GenerationCreate,
            EventBody::Generation(generation),
        );
        id
    }

    /// Queues an update that ends a generation, returning its id.
    pub fn end_generation(&self, mut generation: Generation) -> String {
        let id = assign_id(&mut generation.id);
        if generation.end_time.is_none() {
            generation.end_time = Some(Utc::now());
        }
        self.enqueue(
            EventType::GenerationUpdate,
            EventBody::Generation(generation),
        );
        id
    }

    /// Queues a new point-in-time event, returning its id.
    pub fn create_event(&self, mut event: Event) -> String {
        let id = assign_id(&mut event.id);
        if event.start_time.is_none() {
            event.start_time = Some(Utc::now());
        }
        self.enqueue(EventType::EventCreate, EventBody::Event(event));
        id
    }

    /// Queues a new score, returning its id.
    pub fn create_score(&self, mut score: Score) -> String {
        let id = assign_id(&mut score.id);
        self.enqueue(EventType::ScoreCreate, EventBody::Score(score));
        id
    }

    /// Queues a diagnostic record produced by the SDK itself.
    pub fn log_sdk(&self, log: Value) {
        self.enqueue(EventType::SdkLog, EventBody::SdkLog(SdkLog { log }));
    }

    /// Waits until everything queued so far has been uploaded or
    /// permanently dropped, including pending media uploads.
    pub async fn flush(&self) {
        self.tasks.flush().await;
    }

    /// Flushes and stops the background workers. Call once when the
    /// host application exits; later events would be queued but never
    /// uploaded.
    pub async fn shutdown(&self) {
        self.tasks.shutdown().await;
    }

    fn enqueue(&self, event_type: EventType, body: EventBody) {
        let event = IngestionEvent {
            id: Uuid::new_v4().to_string(),
            event_type,
            timestamp: Utc::now(),
            metadata: None,
            body,
        };
        if let Err(err) = self.tasks.push(event) {
            warn!("dropping {event_type:?} event: {err}");
        }
    }
}

fn assign_id(slot: &mut Option<String>) -> String {
    slot.get_or_insert_with(|| Uuid::new_v4().to_string())
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_id_generates_when_absent() {
        let mut slot = None;
        let id = assign_id(&mut slot);
        assert!(!id.is_empty());
        assert_eq!(slot.as_deref(), Some(id.as_str()));
    }

    #[test]
    fn test_assign_id_keeps_caller_supplied_ids() {
        let mut slot = Some("my-trace".to_owned());
        assert_eq!(assign_id(&mut slot), "my-trace");
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::payload::{Event, Generation, Score, SdkLog, Span, Trace};

/// The kind of a queued event, written as the `type` tag on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    /// A new trace.
    TraceCreate,
    /// A new span.
    SpanCreate,
    /// An update (typically the end) of an existing span.
    SpanUpdate,
    /// A new generation.
    GenerationCreate,
    /// An update (typically the end) of an existing generation.
    GenerationUpdate,
    /// A new point-in-time event.
    EventCreate,
    /// A new score.
    ScoreCreate,
    /// A diagnostic record from the SDK itself.
    SdkLog,
}

/// The payload of an [`IngestionEvent`].
///
/// Exactly one arm is populated; serialization inlines only that arm's
/// fields into the `body` object.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventBody {
    /// A trace payload.
    Trace(Trace),
    /// A span payload.
    Span(Span),
    /// A generation payload.
    Generation(Generation),
    /// A point-in-time event payload.
    Event(Event),
    /// A score payload.
    Score(Score),
    /// An SDK log payload.
    SdkLog(SdkLog),
}

impl EventBody {
    /// The trace this payload belongs to. For a trace payload this is
    /// its own id. Used for the deterministic sampling decision.
    pub fn trace_id(&self) -> Option<&str> {
        match self {
            EventBody::Trace(trace) => trace.id.as_deref(),
            EventBody::Span(span) => span.trace_id.as_deref(),
            EventBody::Generation(generation) => {
                generation.trace_id.as_deref()
            }
            EventBody::Event(event) => event.trace_id.as_deref(),
            EventBody::Score(score) => score.trace_id.as_deref(),
            EventBody::SdkLog(_) => None,
        }
    }

    /// The serialized input field, for payloads that carry one.
    pub fn input(&self) -> Option<&str> {
        match self {
            EventBody::Trace(trace) => trace.input.as_deref(),
            EventBody::Span(span) => span.input.as_deref(),
            EventBody::Generation(generation) => generation.input.as_deref(),
            EventBody::Event(event) => event.input.as_deref(),
            EventBody::Score(_) | EventBody::SdkLog(_) => None,
        }
    }

    /// Mutable access to the input field, for payloads that carry one.
    pub fn input_mut(&mut self) -> Option<&mut Option<String>> {
        match self {
            EventBody::Trace(trace) => Some(&mut trace.input),
            EventBody::Span(span) => Some(&mut span.input),
            EventBody::Generation(generation) => Some(&mut generation.input),
            EventBody::Event(event) => Some(&mut event.input),
            EventBody::Score(_) | EventBody::SdkLog(_) => None,
        }
    }

    /// The serialized output field, for payloads that carry one.
    pub fn output(&self) -> Option<&str> {
        match self {
            EventBody::Trace(trace) => trace.output.as_deref(),
            EventBody::Span(span) => span.output.as_deref(),
            EventBody::Generation(generation) => generation.output.as_deref(),
            EventBody::Event(event) => event.output.as_deref(),
            EventBody::Score(_) | EventBody::SdkLog(_) => None,
        }
    }

    /// Mutable access to the output field, for payloads that carry one.
    pub fn output_mut(&mut self) -> Option<&mut Option<String>> {
        match self {
            EventBody::Trace(trace) => Some(&mut trace.output),
            EventBody::Span(span) => Some(&mut span.output),
            EventBody::Generation(generation) => Some(&mut generation.output),
            EventBody::Event(event) => Some(&mut event.output),
            EventBody::Score(_) | EventBody::SdkLog(_) => None,
        }
    }

    /// The metadata field, for payloads that carry one.
    pub fn metadata(&self) -> Option<&Value> {
        match self {
            EventBody::Trace(trace) => trace.metadata.as_ref(),
            EventBody::Span(span) => span.metadata.as_ref(),
            EventBody::Generation(generation) => generation.metadata.as_ref(),
            EventBody::Event(event) => event.metadata.as_ref(),
            EventBody::Score(_) | EventBody::SdkLog(_) => None,
        }
    }

    /// Mutable access to the metadata field, for payloads that carry one.
    pub fn metadata_mut(&mut self) -> Option<&mut Option<Value>> {
        match self {
            EventBody::Trace(trace) => Some(&mut trace.metadata),
            EventBody::Span(span) => Some(&mut span.metadata),
            EventBody::Generation(generation) => {
                Some(&mut generation.metadata)
            }
            EventBody::Event(event) => Some(&mut event.metadata),
            EventBody::Score(_) | EventBody::SdkLog(_) => None,
        }
    }
}

/// The envelope queued by the facade and uploaded in batches.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IngestionEvent {
    /// Unique identifier of the envelope itself.
    pub id: String,
    /// The event kind.
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// The time the event was pushed into the pipeline.
    pub timestamp: DateTime<Utc>,
    /// Free-form envelope metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// The payload.
    pub body: EventBody,
}

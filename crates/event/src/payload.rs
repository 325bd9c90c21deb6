use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::message::ChatMessage;

/// Severity level of an observation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    /// Diagnostic detail.
    Debug,
    /// The normal level.
    #[default]
    Default,
    /// Something looks off but the operation succeeded.
    Warning,
    /// The operation failed.
    Error,
}

/// Token usage reported for a model inference call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Tokens produced by the completion.
    pub completion_tokens: u32,
    /// Total tokens for the call.
    pub total_tokens: u32,
}

/// The top-level unit of observability grouping one user-visible
/// operation, e.g. a single agent run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    /// Unique identifier; assigned by the facade when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Creation time; assigned by the facade when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Human-readable name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The end user this trace belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Serialized input of the whole operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    /// Serialized output of the whole operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Session grouping key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Release identifier of the host application.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    /// Free-form metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Tags for filtering in the collector UI.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Whether the trace is publicly shareable.
    pub public: bool,
}

/// A named sub-operation within a trace.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    /// Unique identifier; assigned by the facade when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The trace this span belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Human-readable name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Start time; assigned on creation when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// End time; assigned by `end_span` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Free-form metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Serialized input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    /// Serialized output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Severity level.
    pub level: Level,
    /// Additional status detail, e.g. an error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    /// The enclosing observation, if nested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_observation_id: Option<String>,
    /// Version of the instrumented code path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A span specialized for a model inference call.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Generation {
    /// Unique identifier; assigned by the facade when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The trace this generation belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Human-readable name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Start time; assigned on creation when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// End time; assigned by `end_generation` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Time the first completion token arrived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_start_time: Option<DateTime<Utc>>,
    /// Free-form metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Serialized input; overwritten from [`Self::in_messages`] by the
    /// pipeline when messages are present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    /// Serialized output; overwritten from [`Self::out_message`] by the
    /// pipeline when a message is present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Severity level.
    pub level: Level,
    /// Additional status detail, e.g. an error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    /// The enclosing observation, if nested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_observation_id: Option<String>,
    /// Version of the instrumented code path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// The model that served the call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Sampling parameters the call was made with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_parameters: Option<Value>,
    /// Token usage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Name of the prompt template used, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_name: Option<String>,
    /// Version of the prompt template used, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_version: Option<u32>,
    /// Structured input messages. Not sent on the wire; the pipeline
    /// extracts inline media from them and then serializes them into
    /// [`Self::input`].
    #[serde(skip)]
    pub in_messages: Vec<ChatMessage>,
    /// Structured output message, handled like [`Self::in_messages`].
    #[serde(skip)]
    pub out_message: Option<ChatMessage>,
}

/// A point-in-time observation within a trace.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unique identifier; assigned by the facade when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The trace this event belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// Human-readable name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Time the event occurred; assigned on creation when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// Free-form metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Serialized input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    /// Serialized output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Severity level.
    pub level: Level,
    /// Additional status detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    /// The enclosing observation, if nested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_observation_id: Option<String>,
    /// Version of the instrumented code path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A numeric evaluation attached to a trace or observation.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    /// Unique identifier; assigned by the facade when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The trace being scored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    /// The observation being scored, if scoping below the trace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation_id: Option<String>,
    /// Name of the metric.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The score value.
    pub value: f64,
    /// Free-form commentary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A diagnostic record emitted by the SDK itself.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkLog {
    /// The log payload.
    pub log: Value,
}

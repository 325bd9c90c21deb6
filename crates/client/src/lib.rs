//! The asynchronous ingestion pipeline and its public facade.
//!
//! Domain calls (`create_trace`, `create_span`, ...) are translated into
//! events and pushed onto a bounded queue. A pool of batch-upload
//! workers pulls events within a time/size budget, applies sampling,
//! media extraction, masking and truncation, and ships batches to a
//! [`tracepost_event::Collector`] with exponential-backoff retry.
//!
//! Telemetry must never break the host application: upload failures are
//! logged and the affected batch is dropped, and a full queue sheds new
//! events instead of blocking the producer. [`Client::flush`] is the
//! only synchronization point; once it returns, everything pushed
//! before it has been durably sent or permanently abandoned.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod client;
mod consumer;
mod media;
mod options;
mod queue;
mod retry;
mod sampler;
mod task_manager;
mod truncate;
mod wait_group;

pub use client::Client;
pub use options::{MaskFn, Options, OptionsBuilder};
pub use task_manager::QueueFullError;

//! The wire model for the telemetry ingestion pipeline.
//!
//! This crate establishes the event envelope, observation payloads and
//! media/ingestion wire types shared by the pipeline and the transports,
//! plus the [`Collector`] trait that remote backends implement.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod collector;
mod envelope;
mod error;
mod ingestion;
mod media;
mod message;
mod payload;

pub use collector::*;
pub use envelope::*;
pub use error::*;
pub use ingestion::*;
pub use media::*;
pub use message::*;
pub use payload::*;

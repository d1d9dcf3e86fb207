//! `mowerlink-runtime` – Assembly & Observability
//!
//! Wires the MowerLink components into a running client and owns process-
//! level observability.
//!
//! # Modules
//!
//! - [`link`] – [`MowerLink`]: resolve endpoints, start the stream
//!   supervisor and the state consumer, expose the store and dispatcher to
//!   the presentation shell.
//! - [`telemetry`] – `tracing` subscriber initialisation with optional
//!   OTLP span export.

pub mod link;
pub mod telemetry;

pub use link::{LinkConfig, MowerLink};

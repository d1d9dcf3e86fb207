//! `mowerlink-net` – Discovery, Stream, Dispatch
//!
//! Everything that touches the network on the mower's behalf:
//!
//! - [`discovery`] – [`EndpointResolver`]: one-shot HTTP endpoint discovery
//!   with deterministic fallback values.
//! - [`stream`] – [`StreamSupervisor`]: owns the persistent WebSocket,
//!   reconnects with bounded exponential backoff, and feeds validated
//!   inbound events into the state layer; [`OutboundLink`] is the seam the
//!   dispatcher sends through.
//! - [`dispatch`] – [`CommandDispatcher`]: validates user intents, applies
//!   the optimistic local mutation, forwards the command frame.

pub mod discovery;
pub mod dispatch;
pub mod stream;

pub use discovery::EndpointResolver;
pub use dispatch::{CommandDispatcher, DispatchError, DispatchReceipt};
pub use stream::{NullLink, OutboundLink, StreamConfig, StreamLink, StreamSupervisor};

//! `mowerlink-state` – The Reconciled State Tree
//!
//! Holds the client's single source of truth: the telemetry tree, the
//! resolved endpoint set, and the stream link status. All writes go through
//! [`StateStore`]'s mutation methods; everything else only reads.
//!
//! # Modules
//!
//! - [`store`] – [`StateStore`]: watch-channel-backed state with atomic
//!   mutations, derived values, and the dedicated inbound-event consumer
//!   task.

pub mod store;

pub use store::StateStore;

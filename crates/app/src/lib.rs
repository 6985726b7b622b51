//! # homemirror-app
//!
//! Application layer: the device mirror engine and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement or consume:
//!   - `CommandSink`: outbound, fire-and-forget requests to the remote session
//!   - `Subscriber`: receives `DevicesLoaded` / `DeviceUpdated` events
//! - Hold the **device registry** (id index, case-insensitive name index)
//! - Resolve configuration-time **bindings** to runtime ids
//! - Run the synchronous, ordered **dispatch bus**
//! - Ship the subscribers the mirror was built for: the capability bridge,
//!   the per-room aggregator and the card board
//!
//! ## Dependency rule
//! Depends on `homemirror-domain` only.
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod bridge;
pub mod capability;
pub mod event_bus;
pub mod identity;
pub mod mirror;
pub mod ports;
pub mod registry;
pub mod subscribers;

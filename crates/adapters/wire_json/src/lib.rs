//! # homemirror-adapter-wire-json
//!
//! Wire adapter: speaks the remote home session's line-delimited JSON
//! protocol.
//!
//! ## Responsibilities
//! - Decode incoming messages (`DEVICES_LIST`, `DEVICE_UPDATED`, session
//!   notices) into snapshots and updates, tolerating the loosely typed
//!   fields the server emits
//! - Encode outbound [`Command`](homemirror_domain::command::Command)s as
//!   `DEVICE_CONTROL` / `GET_DEVICES` lines
//! - Provide a [`ChannelSink`] implementing the `CommandSink` port
//! - Drive a [`Session`]: feed decoded messages into the mirror and answer
//!   the login handshake
//!
//! The socket itself stays outside this crate; lines come in as `&str` and
//! go out through a tokio channel.
//!
//! ## Dependency rule
//! Depends on `homemirror-app` and `homemirror-domain`.

pub mod codec;
pub mod error;
pub mod session;
pub mod sink;

pub use codec::{Inbound, decode, encode_command, encode_login};
pub use error::WireError;
pub use session::{Credentials, Outcome, Session};
pub use sink::ChannelSink;

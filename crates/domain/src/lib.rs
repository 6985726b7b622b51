//! # homemirror-domain
//!
//! Pure domain model for the homemirror device mirror.
//!
//! ## Responsibilities
//! - Foundational types: device identifiers, error conventions, timestamps
//! - Define **Devices** (last-known state of a remote smart-home device)
//! - Define **Changes** (per-field changed-flags between two device states)
//! - Define the **color channel** (a color value or an embedded command token)
//! - Define **Commands** (outbound requests to the remote session)
//! - Define **Events** (`DevicesLoaded`, `DeviceUpdated`)
//! - Define **Bindings** (configuration-time name → capability declarations)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod binding;
pub mod change;
pub mod color;
pub mod command;
pub mod device;
pub mod event;

//! Subscribers shipped with the mirror, each reacting to its own slice of
//! the event stream.

pub mod cards;
pub mod rooms;

pub use cards::{Card, CardBoard};
pub use rooms::{Room, RoomAggregator, RoomLighting};

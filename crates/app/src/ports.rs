//! Port definitions: traits at the boundary between the mirror and the
//! outside world.

pub mod command_sink;
pub mod subscriber;

pub use command_sink::CommandSink;
pub use subscriber::Subscriber;

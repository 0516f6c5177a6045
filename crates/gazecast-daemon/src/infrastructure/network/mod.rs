//! Network infrastructure: the gaze broadcast server.

pub mod broadcast;

pub use broadcast::{BroadcastServer, ServerError, StreamConfig};

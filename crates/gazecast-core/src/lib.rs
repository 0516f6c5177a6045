//! # gazecast-core
//!
//! Shared library for Gazecast containing the gaze fusion math, the
//! pointer-motion model used by magic pointing, and the JSON wire protocol
//! spoken between the daemon and its subscribers.
//!
//! This crate is used by both the daemon and the probe tool.
//! It has zero dependencies on OS APIs, UI frameworks, or network sockets.
//!
//! - **`domain`**: pure logic with no I/O. `fusion` turns a two-eye frame
//!   into one screen position, `motion` keeps the short rolling window of
//!   recent pointer movement, and `geometry` is the small vector/angle
//!   toolbox both of them share.
//!
//! - **`protocol`**: how samples travel over the network. Each fused
//!   sample becomes one UTF-8 JSON object with no delimiter; subscribers
//!   recover message boundaries by parsing greedily from a growing byte
//!   buffer (see [`protocol::codec::PacketDecoder`]).

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `gazecast_core::FusedSample` instead of the full module path.
pub use domain::fusion::{confidence_weight, fuse, EyeReading, FusedSample, GazeFrame};
pub use domain::geometry::{wrap_degrees, Vec2};
pub use domain::motion::{MotionHistory, MOUSE_MEMORY};
pub use protocol::codec::{encode_packet, PacketDecoder, ProtocolError};
pub use protocol::messages::{GazePacket, DEFAULT_HOST, DEFAULT_PORT};

//! Wire protocol: the JSON packet type and the stream codec.

pub mod codec;
pub mod messages;

pub use codec::{encode_packet, PacketDecoder, ProtocolError};
pub use messages::{GazePacket, DEFAULT_HOST, DEFAULT_PORT};

//! The Gazecast wire message.
//!
//! The stream protocol is deliberately primitive: one UTF-8 JSON object per
//! fused sample, written to every subscriber with no length prefix and no
//! delimiter. Subscribers recover message boundaries by parsing greedily
//! (see [`crate::protocol::codec::PacketDecoder`]); anything that fails to
//! parse is skipped.

use serde::{Deserialize, Serialize};

use crate::domain::fusion::FusedSample;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Default listen address for the broadcast server.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default TCP port for the broadcast server.
pub const DEFAULT_PORT: u16 = 8324;

// ── Message type ──────────────────────────────────────────────────────────────

/// One gaze sample as it appears on the wire.
///
/// Field names are part of the protocol; `tstamp` carries wall-clock
/// seconds since the Unix epoch as a float.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazePacket {
    pub x: f64,
    pub y: f64,
    pub tstamp: f64,
}

impl From<FusedSample> for GazePacket {
    fn from(sample: FusedSample) -> Self {
        Self {
            x: sample.x,
            y: sample.y,
            tstamp: sample.timestamp,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

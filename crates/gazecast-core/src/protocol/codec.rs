//! Encoding and stream decoding for [`GazePacket`]s.
//!
//! The server side is trivial: each packet becomes one compact JSON object
//! with no delimiter. The interesting half is the consumer side. Because
//! the stream has no framing, a subscriber may receive half a packet, three
//! packets glued together, or a packet split across two reads at any byte
//! boundary. [`PacketDecoder`] handles all of these by accumulating bytes
//! and parsing greedily from the front of the buffer:
//!
//! 1. Skip any bytes before the next `{`.
//! 2. Try to parse one JSON object from there.
//! 3. On success, consume exactly the parsed bytes and emit the packet.
//! 4. On an incomplete-input error, keep the buffer and wait for more data.
//! 5. On any other parse error, drop one byte and rescan, so garbage can
//!    never wedge the stream.

use serde_json::Deserializer;
use thiserror::Error;

use crate::protocol::messages::GazePacket;

/// Errors produced when encoding a packet for the wire.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The packet could not be serialized to JSON.
    #[error("failed to encode gaze packet: {0}")]
    Encode(#[from] serde_json::Error),
}

// ── Encoding ──────────────────────────────────────────────────────────────────

/// Encodes one packet as UTF-8 JSON bytes, ready to write to a subscriber.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails.
pub fn encode_packet(packet: &GazePacket) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(packet)?)
}

// ── Stream decoding ───────────────────────────────────────────────────────────

/// Incremental decoder for a subscriber's byte stream.
#[derive(Debug, Default)]
pub struct PacketDecoder {
    buf: Vec<u8>,
}

impl PacketDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends freshly received bytes to the internal buffer.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Attempts to decode the next packet from the buffered bytes.
    ///
    /// Returns `None` when the buffer holds no complete packet yet; call
    /// again after the next [`extend`](Self::extend). Unparseable bytes are
    /// discarded rather than reported, matching the tolerant consumer
    /// policy of the protocol.
    pub fn next_packet(&mut self) -> Option<GazePacket> {
        loop {
            // Discard anything before the next candidate object start.
            match self.buf.iter().position(|&b| b == b'{') {
                Some(0) => {}
                Some(start) => {
                    self.buf.drain(..start);
                }
                None => {
                    self.buf.clear();
                    return None;
                }
            }

            let mut stream = Deserializer::from_slice(&self.buf).into_iter::<GazePacket>();
            match stream.next() {
                Some(Ok(packet)) => {
                    let consumed = stream.byte_offset();
                    self.buf.drain(..consumed);
                    return Some(packet);
                }
                Some(Err(e)) if e.is_eof() => {
                    // Packet split across reads; wait for the rest.
                    return None;
                }
                Some(Err(_)) | None => {
                    // Garbled candidate: drop the `{` and rescan.
                    self.buf.drain(..1);
                }
            }
        }
    }

    /// Number of bytes currently buffered, for diagnostics.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(x: f64, y: f64, tstamp: f64) -> GazePacket {
        GazePacket { x, y, tstamp }
    }

    #[test]
    fn test_encode_produces_parseable_json() {
        // Arrange
        let p = packet(100.0, 200.0, 1.25);

        // Act
        let bytes = encode_packet(&p).expect("encode");
        let parsed: GazePacket = serde_json::from_slice(&bytes).expect("parse");

        // Assert
        assert_eq!(parsed, p);
    }

    #[test]
    fn test_decoder_emits_single_complete_packet() {
        // Arrange
        let mut dec = PacketDecoder::new();
        let bytes = encode_packet(&packet(1.0, 2.0, 3.0)).unwrap();

        // Act
        dec.extend(&bytes);

        // Assert
        assert_eq!(dec.next_packet(), Some(packet(1.0, 2.0, 3.0)));
        assert_eq!(dec.next_packet(), None);
    }

    #[test]
    fn test_decoder_emits_packets_glued_into_one_read() {
        // Arrange: two packets arrive in a single chunk with no delimiter
        let mut dec = PacketDecoder::new();
        let mut bytes = encode_packet(&packet(1.0, 1.0, 1.0)).unwrap();
        bytes.extend(encode_packet(&packet(2.0, 2.0, 2.0)).unwrap());

        // Act
        dec.extend(&bytes);

        // Assert: both come out, in order
        assert_eq!(dec.next_packet(), Some(packet(1.0, 1.0, 1.0)));
        assert_eq!(dec.next_packet(), Some(packet(2.0, 2.0, 2.0)));
        assert_eq!(dec.next_packet(), None);
    }

    #[test]
    fn test_decoder_reassembles_packet_split_across_reads() {
        // Arrange
        let mut dec = PacketDecoder::new();
        let bytes = encode_packet(&packet(9.5, -3.25, 7.0)).unwrap();
        let (head, tail) = bytes.split_at(bytes.len() / 2);

        // Act / Assert: nothing until the second half arrives
        dec.extend(head);
        assert_eq!(dec.next_packet(), None);

        dec.extend(tail);
        assert_eq!(dec.next_packet(), Some(packet(9.5, -3.25, 7.0)));
    }

    #[test]
    fn test_decoder_skips_garbage_between_packets() {
        // Arrange: line noise before and between valid packets
        let mut dec = PacketDecoder::new();
        dec.extend(b"!!noise!!");
        dec.extend(&encode_packet(&packet(1.0, 2.0, 3.0)).unwrap());
        dec.extend(b"{not json}");
        dec.extend(&encode_packet(&packet(4.0, 5.0, 6.0)).unwrap());

        // Act / Assert: garbage is silently discarded
        assert_eq!(dec.next_packet(), Some(packet(1.0, 2.0, 3.0)));
        assert_eq!(dec.next_packet(), Some(packet(4.0, 5.0, 6.0)));
        assert_eq!(dec.next_packet(), None);
    }

    #[test]
    fn test_decoder_skips_json_with_wrong_shape() {
        // Arrange: valid JSON that is not a gaze packet
        let mut dec = PacketDecoder::new();
        dec.extend(b"{\"hello\":\"world\"}");
        dec.extend(&encode_packet(&packet(1.0, 1.0, 1.0)).unwrap());

        // Act / Assert
        assert_eq!(dec.next_packet(), Some(packet(1.0, 1.0, 1.0)));
    }

    #[test]
    fn test_decoder_drops_pure_garbage_without_buffer_growth() {
        // Arrange
        let mut dec = PacketDecoder::new();
        dec.extend(b"complete nonsense with no braces at all");

        // Act
        let result = dec.next_packet();

        // Assert: nothing decodable and nothing retained
        assert_eq!(result, None);
        assert_eq!(dec.buffered(), 0);
    }

    #[test]
    fn test_decoder_handles_byte_at_a_time_delivery() {
        // Arrange: worst-case fragmentation
        let mut dec = PacketDecoder::new();
        let bytes = encode_packet(&packet(11.0, 22.0, 33.0)).unwrap();

        // Act
        let mut out = Vec::new();
        for b in &bytes {
            dec.extend(std::slice::from_ref(b));
            if let Some(p) = dec.next_packet() {
                out.push(p);
            }
        }

        // Assert
        assert_eq!(out, vec![packet(11.0, 22.0, 33.0)]);
    }
}

//! Criterion benchmarks for the fusion math and the wire codec.
//!
//! Both run once per sensor frame on the gaze delivery thread, so they must
//! stay far below the inter-frame budget (about 8 ms at a 120 Hz tracker).
//!
//! Run with:
//! ```bash
//! cargo bench --package gazecast-core --bench fusion_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gazecast_core::domain::fusion::{fuse, EyeReading, GazeFrame};
use gazecast_core::domain::geometry::Vec2;
use gazecast_core::protocol::codec::{encode_packet, PacketDecoder};
use gazecast_core::protocol::messages::GazePacket;

// ── Fixtures ──────────────────────────────────────────────────────────────────

fn make_two_eye_frame() -> GazeFrame {
    GazeFrame::new(
        EyeReading::new(true, Vec2::new(0.42, 0.58)),
        EyeReading::new(true, Vec2::new(0.47, 0.55)),
    )
}

fn make_one_eye_frame() -> GazeFrame {
    GazeFrame::new(EyeReading::new(true, Vec2::new(0.42, 0.58)), EyeReading::absent())
}

fn make_packet() -> GazePacket {
    GazePacket {
        x: 806.4,
        y: 626.4,
        tstamp: 1_700_000_000.125,
    }
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_fuse(c: &mut Criterion) {
    let two = make_two_eye_frame();
    let one = make_one_eye_frame();

    c.bench_function("fuse/two_eyes", |b| {
        b.iter(|| fuse(black_box(&two), (1920.0, 1080.0), 0.0))
    });
    c.bench_function("fuse/one_eye", |b| {
        b.iter(|| fuse(black_box(&one), (1920.0, 1080.0), 0.0))
    });
}

fn bench_codec(c: &mut Criterion) {
    let packet = make_packet();
    let bytes = encode_packet(&packet).expect("encode");

    c.bench_function("codec/encode_packet", |b| {
        b.iter(|| encode_packet(black_box(&packet)))
    });
    c.bench_function("codec/decode_packet", |b| {
        b.iter(|| {
            let mut dec = PacketDecoder::new();
            dec.extend(black_box(&bytes));
            dec.next_packet()
        })
    });
}

criterion_group!(benches, bench_fuse, bench_codec);
criterion_main!(benches);

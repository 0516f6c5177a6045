//! Gazecast probe, a minimal reference subscriber.
//!
//! Connects to a running Gazecast daemon, decodes the gaze stream, and
//! prints one JSON line per packet to stdout. Useful for checking that the
//! stream is alive and as a template for writing real consumers: note how
//! framing is recovered with [`PacketDecoder`] rather than by assuming one
//! packet per read.
//!
//! # Usage
//!
//! ```text
//! gazecast-probe [OPTIONS]
//!
//! Options:
//!   --host  <HOST>   Daemon hostname or IP [default: 127.0.0.1]
//!   --port  <PORT>   Gaze stream port      [default: 8324]
//!   --count <N>      Exit after N packets  [default: run forever]
//! ```
//!
//! The defaults can also be overridden with the `GAZECAST_HOST` and
//! `GAZECAST_PORT` environment variables; CLI args take precedence.

use anyhow::Context;
use clap::Parser;
use gazecast_core::protocol::codec::PacketDecoder;
use gazecast_core::protocol::messages::DEFAULT_PORT;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Subscribe to a Gazecast gaze stream and print each sample.
#[derive(Debug, Parser)]
#[command(
    name = "gazecast-probe",
    about = "Minimal Gazecast subscriber: connect, decode, print gaze packets",
    version
)]
struct Cli {
    /// Hostname or IP address of the Gazecast daemon.
    #[arg(long, default_value = "127.0.0.1", env = "GAZECAST_HOST")]
    host: String,

    /// TCP port of the gaze stream.
    #[arg(long, default_value_t = DEFAULT_PORT, env = "GAZECAST_PORT")]
    port: u16,

    /// Exit after printing this many packets; omit to run until killed.
    #[arg(long)]
    count: Option<u64>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let addr = format!("{}:{}", cli.host, cli.port);

    let mut stream = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to gaze stream at {addr}"))?;
    info!("connected to gaze stream at {addr}");

    let mut decoder = PacketDecoder::new();
    let mut buf = [0u8; 1024];
    let mut printed: u64 = 0;

    loop {
        let read = stream
            .read(&mut buf)
            .await
            .context("read from gaze stream failed")?;
        if read == 0 {
            info!("stream closed by daemon");
            break;
        }

        decoder.extend(&buf[..read]);
        while let Some(packet) = decoder.next_packet() {
            // One JSON line per sample; parse failures inside the decoder
            // are skipped silently, matching the protocol's tolerant
            // consumer policy.
            println!("{}", serde_json::to_string(&packet)?);
            printed += 1;
            if let Some(limit) = cli.count {
                if printed >= limit {
                    info!("printed {printed} packet(s), exiting");
                    return Ok(());
                }
            }
        }
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! TCP fan-out server for fused gaze samples.
//!
//! One producer, many subscribers: the tracker delivers frames on its own
//! thread, each frame is fused into a screen position, serialized, and
//! written to every connected client. The accept loop runs as a blocking
//! loop on a dedicated thread so synchronous socket polling never touches
//! the async runtime, mirroring how the rest of the daemon splits blocking
//! work from orchestration.
//!
//! # Lifecycle
//!
//! ```text
//! Stopped ──start()──► Starting (subscribe + spawn) ──► Running
//!    ▲                                                    │
//!    └────────── Stopping (unsubscribe + signal) ◄──stop()┘
//! ```
//!
//! `start()` is safe to call repeatedly: the same source is a no-op, a
//! swapped source forces an unsubscribe-then-resubscribe, and the accept
//! thread is spawned only when none is running. `stop()` signals the
//! accept loop, which observes the flag within one poll interval, and
//! closes every subscriber connection.
//!
//! # Failure semantics
//!
//! A bind failure is logged and fatal to that activation attempt; nothing
//! retries until the feature is toggled again. A failed or timed-out write
//! to one subscriber drops that subscriber and nothing else; errors never
//! escape the broadcast path into the sensor callback chain.

use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use gazecast_core::domain::fusion::{fuse, GazeFrame};
use gazecast_core::protocol::codec::encode_packet;
use gazecast_core::protocol::messages::{GazePacket, DEFAULT_HOST, DEFAULT_PORT};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::application::feature_sync::GazeFeature;
use crate::infrastructure::screen::ScreenMetrics;
use crate::infrastructure::sensor::{is_same_source, GazeListener, GazeSource};

/// Error type for broadcast server activation.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The TCP listener could not be bound or configured.
    #[error("failed to bind gaze stream listener on {addr}: {source}")]
    BindFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration for the broadcast server.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Interface to listen on.
    pub host: String,
    /// TCP port to listen on.
    pub port: u16,
    /// How long the accept loop waits between polls; bounds both accept
    /// latency and shutdown latency.
    pub accept_poll: Duration,
    /// Per-subscriber socket write timeout. A subscriber that cannot keep
    /// up within this bound is dropped rather than waited on, because the
    /// writing thread is the shared sensor delivery thread.
    pub write_timeout: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            accept_poll: Duration::from_millis(500),
            write_timeout: Duration::from_millis(200),
        }
    }
}

impl StreamConfig {
    fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The gaze broadcast server.
///
/// Shared state and its owners:
///
/// - `clients` is appended to by the accept thread and pruned by the
///   sensor delivery thread on write failure, so it sits behind a mutex.
/// - `binding` holds the currently subscribed source; it changes only
///   under its lock, and the actual subscribe/unsubscribe calls happen
///   outside the lock.
/// - `alive` is the stop signal; `listening` guards against spawning a
///   second accept loop.
pub struct BroadcastServer {
    config: StreamConfig,
    screen: Arc<dyn ScreenMetrics>,
    clients: Mutex<Vec<TcpStream>>,
    alive: AtomicBool,
    listening: AtomicBool,
    binding: Mutex<Option<Arc<dyn GazeSource>>>,
}

impl BroadcastServer {
    pub fn new(config: StreamConfig, screen: Arc<dyn ScreenMetrics>) -> Arc<Self> {
        Arc::new(Self {
            config,
            screen,
            clients: Mutex::new(Vec::new()),
            alive: AtomicBool::new(false),
            listening: AtomicBool::new(false),
            binding: Mutex::new(None),
        })
    }

    /// Activates the server against `source`.
    ///
    /// Subscribes to the source (re-subscribing if the source identity
    /// changed since the last activation) and ensures exactly one accept
    /// loop is running. Safe to call repeatedly without leaking
    /// subscriptions or sockets.
    pub fn start(self: Arc<Self>, source: Arc<dyn GazeSource>) {
        self.alive.store(true, Ordering::Relaxed);

        // Decide whether to rebind while holding the lock; the
        // subscribe/unsubscribe calls themselves run after it is released.
        let (unsubscribe_from, subscribe_to) = {
            let mut binding = self.binding.lock().expect("binding lock poisoned");
            match binding.as_ref() {
                Some(current) if is_same_source(current, &source) => (None, None),
                _ => {
                    let old = binding.take();
                    *binding = Some(Arc::clone(&source));
                    (old, Some(source))
                }
            }
        };

        if let Some(old) = unsubscribe_from {
            old.unsubscribe(self.as_ref());
            debug!("released gaze subscription on superseded source");
        }
        if let Some(new) = subscribe_to {
            new.subscribe(Arc::clone(&self) as Arc<dyn GazeListener>);
            info!("gaze stream subscribed to sensor");
        }

        if self
            .listening
            .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            let server = Arc::clone(&self);
            std::thread::Builder::new()
                .name("gazecast-accept".to_string())
                .spawn(move || server.accept_loop())
                .expect("failed to spawn accept thread");
        }
    }

    /// Deactivates the server: unsubscribes from the sensor, signals the
    /// accept loop to exit, and closes every subscriber connection.
    ///
    /// The accept loop observes the signal within one poll interval, so
    /// shutdown latency is bounded but not instant. Safe to call when
    /// already stopped.
    pub fn stop(&self) {
        self.alive.store(false, Ordering::Relaxed);

        let unsubscribe_from = {
            let mut binding = self.binding.lock().expect("binding lock poisoned");
            binding.take()
        };
        if let Some(source) = unsubscribe_from {
            source.unsubscribe(self);
            info!("gaze stream unsubscribed from sensor");
        }

        let dropped = {
            let mut clients = self.clients.lock().expect("client list lock poisoned");
            let n = clients.len();
            clients.clear();
            n
        };
        if dropped > 0 {
            info!("closed {dropped} subscriber connection(s)");
        }
    }

    /// Whether an accept loop is currently running.
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }

    /// Number of connected subscribers.
    pub fn client_count(&self) -> usize {
        self.clients.lock().expect("client list lock poisoned").len()
    }

    /// The blocking accept loop, run on its own named thread.
    fn accept_loop(self: Arc<Self>) {
        let addr = self.config.bind_addr();
        let listener = match bind_listener(&addr) {
            Ok(listener) => listener,
            Err(e) => {
                // Fatal for this activation attempt: the stream stays down
                // until the feature is toggled again.
                error!("{e}");
                self.listening.store(false, Ordering::Relaxed);
                return;
            }
        };
        info!("gaze stream listening on {addr}");

        while self.alive.load(Ordering::Relaxed) {
            match listener.accept() {
                Ok((stream, peer)) => {
                    info!("subscriber connected from {peer}");
                    self.admit(stream);
                }
                Err(e) if is_retry_error(&e) => {
                    std::thread::sleep(self.config.accept_poll);
                }
                Err(e) => {
                    // Transient accept failure (e.g. fd exhaustion); keep
                    // serving rather than tearing the stream down.
                    error!("accept error: {e}");
                    std::thread::sleep(self.config.accept_poll);
                }
            }
        }

        info!("gaze stream accept loop stopped");
        self.listening.store(false, Ordering::Relaxed);

        // A start() racing with this shutdown can find `listening` still
        // set and skip its spawn. If the server was re-activated while we
        // were winding down, hand the session to a fresh loop.
        if self.alive.load(Ordering::Relaxed)
            && self
                .listening
                .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
        {
            let server = Arc::clone(&self);
            std::thread::Builder::new()
                .name("gazecast-accept".to_string())
                .spawn(move || server.accept_loop())
                .expect("failed to spawn accept thread");
        }
    }

    /// Configures and registers a freshly accepted subscriber socket.
    fn admit(&self, stream: TcpStream) {
        // Sockets accepted from a nonblocking listener must be switched
        // back to blocking mode so the write timeout governs them.
        if let Err(e) = stream.set_nonblocking(false) {
            debug!("could not configure subscriber socket: {e}");
            return;
        }
        if let Err(e) = stream.set_write_timeout(Some(self.config.write_timeout)) {
            debug!("could not set subscriber write timeout: {e}");
        }
        stream.set_nodelay(true).ok();
        self.clients
            .lock()
            .expect("client list lock poisoned")
            .push(stream);
    }

    /// Writes `payload` to every subscriber, dropping any whose write
    /// fails. No retry, no buffering, no backpressure.
    fn broadcast(&self, payload: &[u8]) {
        let mut clients = self.clients.lock().expect("client list lock poisoned");
        clients.retain_mut(|client| match client.write_all(payload) {
            Ok(()) => true,
            Err(e) => {
                let peer = client
                    .peer_addr()
                    .map(|a| a.to_string())
                    .unwrap_or_else(|_| "unknown".to_string());
                debug!("dropping subscriber {peer}: {e}");
                false
            }
        });
    }
}

impl GazeListener for BroadcastServer {
    /// Invoked synchronously on the sensor delivery thread for every frame.
    fn on_gaze(&self, frame: &GazeFrame) {
        let timestamp = unix_timestamp();
        let Some(sample) = fuse(frame, self.screen.size_px(), timestamp) else {
            debug!("frame with no detected eyes; skipping broadcast");
            return;
        };
        match encode_packet(&GazePacket::from(sample)) {
            Ok(bytes) => self.broadcast(&bytes),
            Err(e) => error!("failed to encode gaze sample: {e}"),
        }
    }
}

impl GazeFeature for Arc<BroadcastServer> {
    fn activate(&self, source: Arc<dyn GazeSource>) {
        Arc::clone(self).start(source);
    }

    fn deactivate(&self) {
        self.stop();
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Binds the listener and puts it in nonblocking mode so the accept loop
/// can poll the stop flag between accept attempts.
fn bind_listener(addr: &str) -> Result<TcpListener, ServerError> {
    let listener = TcpListener::bind(addr).map_err(|source| ServerError::BindFailed {
        addr: addr.to_string(),
        source,
    })?;
    listener
        .set_nonblocking(true)
        .map_err(|source| ServerError::BindFailed {
            addr: addr.to_string(),
            source,
        })?;
    Ok(listener)
}

/// Returns `true` for accept results that just mean "nothing to accept yet".
fn is_retry_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

/// Wall-clock seconds since the Unix epoch.
fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

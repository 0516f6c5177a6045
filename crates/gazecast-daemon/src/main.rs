//! Gazecast daemon entry point.
//!
//! Wires together the infrastructure services and starts the Tokio runtime.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()          -- TOML config with serde defaults
//!  └─ build seams            -- screen metrics, pointer controller
//!  └─ build features
//!       ├─ BroadcastServer   -- accept loop on a dedicated thread
//!       └─ MagicPointing     -- decision engine on the sensor thread
//!  └─ FeatureSupervisors     -- reconcile {device present} x {toggle on}
//!  └─ device event pump      -- Tokio task feeding the supervisors
//!  └─ Ctrl-C handler         -- graceful shutdown
//! ```
//!
//! Pointer-movement events reach the magic-pointing engine through
//! [`MagicPointing::record_motion`]; the embedding host wires its own input
//! hook to that entry point. The headless build ships with the synthetic
//! sensor and a virtual pointer so the stream is drivable end to end
//! without tracker hardware.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gazecast_daemon::application::feature_sync::FeatureSupervisor;
use gazecast_daemon::application::magic_pointing::{MagicPointing, MagicTuning};
use gazecast_daemon::infrastructure::network::{BroadcastServer, StreamConfig};
use gazecast_daemon::infrastructure::pointer::{PointerController, VirtualPointer};
use gazecast_daemon::infrastructure::screen::{ScreenMetrics, StaticScreen};
use gazecast_daemon::infrastructure::sensor::synthetic::SyntheticGazeSource;
use gazecast_daemon::infrastructure::sensor::{DeviceEvent, GazeSource};
use gazecast_daemon::infrastructure::storage::config::{load_config, AppConfig};
use gazecast_daemon::infrastructure::ui_bridge::ToggleRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configuration first so its log level can serve as the fallback when
    // RUST_LOG is unset.
    let config = load_config().unwrap_or_else(|e| {
        eprintln!("failed to load config, using defaults: {e}");
        AppConfig::default()
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.daemon.log_level.clone())),
        )
        .init();

    info!("Gazecast daemon starting");

    // ── Seams ─────────────────────────────────────────────────────────────────
    let screen: Arc<dyn ScreenMetrics> = Arc::new(StaticScreen::new(
        config.screen.width_px,
        config.screen.height_px,
    ));
    let pointer: Arc<dyn PointerController> = Arc::new(VirtualPointer::new((
        config.screen.width_px / 2.0,
        config.screen.height_px / 2.0,
    )));

    // ── Features ──────────────────────────────────────────────────────────────
    let stream_config = StreamConfig {
        host: config.stream.host.clone(),
        port: config.stream.port,
        accept_poll: Duration::from_millis(config.stream.accept_poll_ms),
        write_timeout: Duration::from_millis(config.stream.write_timeout_ms),
    };
    let server = BroadcastServer::new(stream_config, Arc::clone(&screen));

    let tuning = MagicTuning {
        mouse_memory: Duration::from_millis(config.magic.mouse_memory_ms),
        move_threshold_px: config.magic.move_threshold_px,
        gaze_threshold_px: config.magic.gaze_threshold_px,
        angle_threshold_deg: config.magic.angle_threshold_deg,
    };
    let magic = MagicPointing::new(tuning, pointer, Arc::clone(&screen));

    let server_supervisor = FeatureSupervisor::new(
        "eye-tracking-server",
        Box::new(Arc::clone(&server)),
        config.features.eye_tracking_server,
    );
    let magic_supervisor = FeatureSupervisor::new(
        "magic-pointing",
        Box::new(Arc::clone(&magic)),
        config.features.magic_pointing,
    );

    // ── User-facing toggles ───────────────────────────────────────────────────
    let toggles = ToggleRegistry::new();
    {
        let supervisor = Arc::clone(&server_supervisor);
        toggles.register(
            "Eye Tracking Server",
            config.features.eye_tracking_server,
            Arc::new(move |state| supervisor.set_enabled(state)),
        );
    }
    {
        let supervisor = Arc::clone(&magic_supervisor);
        toggles.register(
            "MAGIC Pointing",
            config.features.magic_pointing,
            Arc::new(move |state| supervisor.set_enabled(state)),
        );
    }
    info!("toggles registered: {:?}", toggles.list());

    // ── Sensor + device event pump ────────────────────────────────────────────
    let sensor = if config.sensor.synthetic {
        let (source, mut events) = SyntheticGazeSource::spawn(config.sensor.sample_rate_hz);
        let pump_source: Arc<dyn GazeSource> = Arc::clone(&source) as Arc<dyn GazeSource>;
        let pump_server = Arc::clone(&server_supervisor);
        let pump_magic = Arc::clone(&magic_supervisor);

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    DeviceEvent::Attached(device) => {
                        info!("tracker attached: {} ({})", device.name, device.serial);
                        pump_server.device_attached(Arc::clone(&pump_source));
                        pump_magic.device_attached(Arc::clone(&pump_source));
                    }
                    DeviceEvent::Detached(device) => {
                        info!("tracker detached: {}", device.name);
                        pump_server.device_detached();
                        pump_magic.device_detached();
                    }
                }
            }
        });
        Some(source)
    } else {
        warn!("no sensor backend configured; features stay idle until a device attaches");
        None
    };

    // ── Ctrl-C / SIGTERM handler ──────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    info!("Gazecast daemon ready.  Press Ctrl-C to exit.");

    loop {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if !running.load(Ordering::Relaxed) {
            break;
        }
    }

    // ── Shutdown ──────────────────────────────────────────────────────────────
    if let Some(sensor) = sensor {
        sensor.stop();
    }
    server.stop();
    magic.disable();

    info!("Gazecast daemon stopped");
    Ok(())
}

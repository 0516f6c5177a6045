//! Synthetic gaze source for running the daemon without tracker hardware.
//!
//! Generates two-eye frames tracing a slow Lissajous figure across the
//! normalized gaze square on a dedicated thread, at a configurable rate.
//! The generator also plays the role of the device notifier: it announces
//! itself as an attached device once the thread is up and as detached when
//! stopped, so the feature supervisors exercise the same reconciliation
//! path they would with a real tracker.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use gazecast_core::domain::fusion::{EyeReading, GazeFrame};
use gazecast_core::domain::geometry::Vec2;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{is_same_listener, DeviceEvent, DeviceInfo, GazeListener, GazeSource};

/// Simulated horizontal offset between the two eyes in normalized units.
const EYE_SEPARATION: f64 = 0.02;

/// A frame generator that behaves like one attached tracker.
pub struct SyntheticGazeSource {
    listeners: Mutex<Vec<Arc<dyn GazeListener>>>,
    alive: AtomicBool,
    rate_hz: f64,
}

impl SyntheticGazeSource {
    /// Spawns the generator thread and returns the source together with the
    /// device-event receiver for the supervisor pump.
    ///
    /// The first event on the channel is always `Attached`.
    pub fn spawn(rate_hz: f64) -> (Arc<Self>, mpsc::Receiver<DeviceEvent>) {
        let source = Arc::new(Self {
            listeners: Mutex::new(Vec::new()),
            alive: AtomicBool::new(true),
            rate_hz: rate_hz.max(1.0),
        });

        let (tx, rx) = mpsc::channel(8);
        let worker = Arc::clone(&source);
        std::thread::Builder::new()
            .name("gazecast-synthetic".to_string())
            .spawn(move || worker.run(tx))
            .expect("failed to spawn synthetic sensor thread");

        (source, rx)
    }

    /// Stops the generator thread; it notices within one frame interval.
    pub fn stop(&self) {
        self.alive.store(false, Ordering::Relaxed);
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: "Synthetic Tracker".to_string(),
            serial: "SYN-0001".to_string(),
        }
    }

    fn run(self: Arc<Self>, events: mpsc::Sender<DeviceEvent>) {
        let interval = Duration::from_secs_f64(1.0 / self.rate_hz);
        info!(
            "synthetic gaze source running at {:.0} Hz",
            self.rate_hz
        );

        if events
            .blocking_send(DeviceEvent::Attached(self.device_info()))
            .is_err()
        {
            // Receiver dropped before startup finished; nothing to drive.
            return;
        }

        let mut tick: u64 = 0;
        while self.alive.load(Ordering::Relaxed) {
            let frame = self.frame_for_tick(tick);
            {
                let listeners = self.listeners.lock().expect("listener list lock poisoned");
                for listener in listeners.iter() {
                    listener.on_gaze(&frame);
                }
            }
            tick = tick.wrapping_add(1);
            std::thread::sleep(interval);
        }

        if events
            .blocking_send(DeviceEvent::Detached(self.device_info()))
            .is_err()
        {
            debug!("device event receiver gone before detach notification");
        }
        info!("synthetic gaze source stopped");
    }

    /// One Lissajous sample in normalized [0, 1] space, with the eyes
    /// slightly separated horizontally like a real pair would be.
    fn frame_for_tick(&self, tick: u64) -> GazeFrame {
        let t = tick as f64 / self.rate_hz;
        let center_x = 0.5 + 0.4 * (0.31 * t).sin();
        let center_y = 0.5 + 0.4 * (0.47 * t).cos();

        GazeFrame::new(
            EyeReading::new(true, Vec2::new(center_x - EYE_SEPARATION, center_y)),
            EyeReading::new(true, Vec2::new(center_x + EYE_SEPARATION, center_y)),
        )
    }
}

impl GazeSource for SyntheticGazeSource {
    fn subscribe(&self, listener: Arc<dyn GazeListener>) {
        self.listeners
            .lock()
            .expect("listener list lock poisoned")
            .push(listener);
    }

    fn unsubscribe(&self, listener: &dyn GazeListener) {
        self.listeners
            .lock()
            .expect("listener list lock poisoned")
            .retain(|stored| !is_same_listener(stored, listener));
    }

    fn devices(&self) -> Vec<DeviceInfo> {
        if self.alive.load(Ordering::Relaxed) {
            vec![self.device_info()]
        } else {
            Vec::new()
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Mock gaze source for unit testing.
//!
//! Allows tests to drive [`GazeListener`]s with synthetic frames from the
//! test thread, standing in for the tracker SDK's delivery thread.

use std::sync::{Arc, Mutex};

use gazecast_core::domain::fusion::GazeFrame;

use super::{is_same_listener, DeviceInfo, GazeListener, GazeSource};

/// A mock implementation of [`GazeSource`] that lets tests inject frames
/// and inspect the registration set.
#[derive(Default)]
pub struct MockGazeSource {
    listeners: Mutex<Vec<Arc<dyn GazeListener>>>,
    devices: Mutex<Vec<DeviceInfo>>,
}

impl MockGazeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a device as attached behind this source.
    pub fn add_device(&self, device: DeviceInfo) {
        self.devices
            .lock()
            .expect("device list lock poisoned")
            .push(device);
    }

    /// Delivers one frame to every subscribed listener, in subscription
    /// order, exactly as a tracker delivery thread would.
    pub fn emit(&self, frame: &GazeFrame) {
        let listeners = self.listeners.lock().expect("listener list lock poisoned");
        for listener in listeners.iter() {
            listener.on_gaze(frame);
        }
    }

    /// Number of currently subscribed listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().expect("listener list lock poisoned").len()
    }

    /// Whether the given listener is currently subscribed.
    pub fn is_subscribed(&self, listener: &dyn GazeListener) -> bool {
        self.listeners
            .lock()
            .expect("listener list lock poisoned")
            .iter()
            .any(|stored| is_same_listener(stored, listener))
    }
}

impl GazeSource for MockGazeSource {
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
        self.devices.lock().expect("device list lock poisoned").clone()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

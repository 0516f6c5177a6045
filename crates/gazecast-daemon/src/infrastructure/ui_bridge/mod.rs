//! Toggle bridge: exposes named boolean switches to whatever presentation
//! layer is attached (menu, tray icon, remote command).
//!
//! The daemon registers one switch per feature at startup; flipping a
//! switch invokes its callback with the new state, which feeds the
//! feature's supervisor. The registry is the only surface the UI needs,
//! keeping presentation code out of the application layer.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use tracing::{info, warn};

/// Callback invoked with the new state when a switch flips.
pub type ToggleCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// One named user-facing boolean switch.
pub struct ToggleSwitch {
    name: String,
    state: AtomicBool,
    callback: ToggleCallback,
}

impl ToggleSwitch {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> bool {
        self.state.load(Ordering::Relaxed)
    }

    /// Flips the switch and notifies the callback.
    pub fn set(&self, state: bool) {
        self.state.store(state, Ordering::Relaxed);
        info!("toggle '{}' set to {state}", self.name);
        (self.callback)(state);
    }
}

/// Registry of all switches the daemon exposes.
#[derive(Default)]
pub struct ToggleRegistry {
    switches: Mutex<Vec<Arc<ToggleSwitch>>>,
}

impl ToggleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a switch and returns a handle to it.
    ///
    /// The callback is NOT invoked for the initial state; callers apply
    /// the initial state themselves so startup ordering stays explicit.
    pub fn register(
        &self,
        name: impl Into<String>,
        initial: bool,
        callback: ToggleCallback,
    ) -> Arc<ToggleSwitch> {
        let switch = Arc::new(ToggleSwitch {
            name: name.into(),
            state: AtomicBool::new(initial),
            callback,
        });
        self.switches
            .lock()
            .expect("switch list lock poisoned")
            .push(Arc::clone(&switch));
        switch
    }

    /// Flips the named switch. Returns `false` when no such switch exists.
    pub fn set(&self, name: &str, state: bool) -> bool {
        let switch = {
            let switches = self.switches.lock().expect("switch list lock poisoned");
            switches.iter().find(|s| s.name == name).cloned()
        };
        match switch {
            Some(switch) => {
                switch.set(state);
                true
            }
            None => {
                warn!("no toggle named '{name}'");
                false
            }
        }
    }

    /// Current name/state pairs, for presentation.
    pub fn list(&self) -> Vec<(String, bool)> {
        self.switches
            .lock()
            .expect("switch list lock poisoned")
            .iter()
            .map(|s| (s.name.clone(), s.state()))
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_register_does_not_invoke_callback_for_initial_state() {
        // Arrange
        let registry = ToggleRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_cb = Arc::clone(&calls);

        // Act
        let switch = registry.register(
            "Eye Tracking Server",
            true,
            Arc::new(move |_| {
                calls_cb.fetch_add(1, Ordering::Relaxed);
            }),
        );

        // Assert
        assert_eq!(calls.load(Ordering::Relaxed), 0);
        assert!(switch.state());
    }

    #[test]
    fn test_set_flips_state_and_invokes_callback() {
        // Arrange
        let registry = ToggleRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_cb = Arc::clone(&seen);
        registry.register(
            "MAGIC Pointing",
            false,
            Arc::new(move |state| {
                seen_cb.lock().unwrap().push(state);
            }),
        );

        // Act
        assert!(registry.set("MAGIC Pointing", true));
        assert!(registry.set("MAGIC Pointing", false));

        // Assert
        assert_eq!(seen.lock().unwrap().as_slice(), &[true, false]);
        assert_eq!(registry.list(), vec![("MAGIC Pointing".to_string(), false)]);
    }

    #[test]
    fn test_set_on_unknown_switch_returns_false() {
        let registry = ToggleRegistry::new();
        assert!(!registry.set("No Such Feature", true));
    }

    #[test]
    fn test_list_reports_all_switches() {
        let registry = ToggleRegistry::new();
        registry.register("A", true, Arc::new(|_| {}));
        registry.register("B", false, Arc::new(|_| {}));

        let listed = registry.list();

        assert_eq!(
            listed,
            vec![("A".to_string(), true), ("B".to_string(), false)]
        );
    }
}

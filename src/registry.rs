//! Routing of capture interrupts to the devices that own them.
use crate::board::{
    capture::{CaptureTimer, TimerId},
    sr04::Echo,
};
use heapless::Vec;

/// Fixed-capacity table mapping timer identities to devices.
///
/// Lookups scan at most `N` entries and never allocate, so they can run in
/// interrupt context.
///
/// The table is not synchronised. Register every device during setup, before
/// the capture interrupts are unmasked; afterwards only read it.
///
/// Entries are keyed by timer, since the interrupt vector is per timer.
/// Registering a second device on an already registered timer replaces the
/// first one.
pub struct Registry<'a, T: CaptureTimer, const N: usize> {
    entries: Vec<(TimerId, &'a Echo<T>), N>,
}

impl<'a, T: CaptureTimer, const N: usize> Registry<'a, T, N> {
    /// Creates an empty registry.
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Registers `echo` under the identity of its timer.
    ///
    /// If the registry already holds `N` other timers the device is not
    /// registered, and its capture interrupts will be ignored.
    pub fn register(&mut self, echo: &'a Echo<T>) {
        let id = echo.timer_id();
        if let Some(entry) = self.entries.iter_mut().find(|(key, _)| *key == id) {
            entry.1 = echo;
            return;
        }

        if self.entries.push((id, echo)).is_err() {
            warn!("registry: full, timer {:?} not registered", id);
        }
    }

    /// Looks up the device registered for timer `id`.
    pub fn resolve(&self, id: TimerId) -> Option<&'a Echo<T>> {
        self.entries
            .iter()
            .find(|(key, _)| *key == id)
            .map(|(_, echo)| *echo)
    }

    /// Dispatches a capture interrupt raised by timer `id`.
    ///
    /// Call this from the timer's interrupt handler. Interrupts from timers
    /// with no registered device are ignored.
    pub fn on_capture_interrupt(&self, id: TimerId) {
        match self.resolve(id) {
            Some(echo) => echo.on_capture(),
            None => trace!("registry: capture on unknown timer {:?}", id),
        }
    }

    /// Number of registered timers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no device is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of timers that can be registered.
    pub fn capacity(&self) -> usize {
        N
    }
}

impl<'a, T: CaptureTimer, const N: usize> Default for Registry<'a, T, N> {
    fn default() -> Self {
        Self::new()
    }
}

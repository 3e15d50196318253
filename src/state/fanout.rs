//! Synchronous multicast of session status changes

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard,
};

use tracing::debug;

use super::SessionStatus;

/// Receives every session status change.
///
/// Called on the session's sequencing context; implementations must not
/// block for long and must not call back into the controller.
pub trait StatusObserver: Send + Sync {
    fn on_status_changed(&self, status: &SessionStatus);
}

impl<F> StatusObserver for F
where
    F: Fn(&SessionStatus) + Send + Sync,
{
    fn on_status_changed(&self, status: &SessionStatus) {
        self(status)
    }
}

/// Handle returned by [`StatusFanout::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Registry of status observers.
///
/// Cloning yields another handle to the same registry. Notification
/// iterates over a snapshot of the list, so observers may be added or
/// removed from anywhere, including from inside a callback, without a
/// remaining observer being skipped or notified twice.
#[derive(Clone, Default)]
pub struct StatusFanout {
    observers: Arc<Mutex<Vec<(ObserverId, Arc<dyn StatusObserver>)>>>,
    next_id: Arc<AtomicU64>,
}

impl StatusFanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, observer: Arc<dyn StatusObserver>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, observer));
        debug!(?id, "Status observer registered");
        id
    }

    /// Returns false if `id` was not registered.
    pub fn unregister(&self, id: ObserverId) -> bool {
        let mut observers = self.lock();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        let removed = observers.len() != before;
        if removed {
            debug!(?id, "Status observer unregistered");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn notify(&self, status: &SessionStatus) {
        let snapshot: Vec<Arc<dyn StatusObserver>> = self
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in snapshot {
            observer.on_status_changed(status);
        }
    }

    // The list is never left half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Vec<(ObserverId, Arc<dyn StatusObserver>)>> {
        self.observers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for StatusFanout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusFanout")
            .field("observers", &self.len())
            .finish()
    }
}

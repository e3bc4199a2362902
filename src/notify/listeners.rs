use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::error;
use ulid::Ulid;

use super::Notification;

/// Externally chosen identity of a listener registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(String);

impl ListenerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh unique id for consumers that have none of their own.
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ListenerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ListenerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

pub type Callback = Arc<dyn Fn(&Notification) + Send + Sync>;

struct Registration {
    id: ListenerId,
    callback: Callback,
}

/// Ordered listener set shared between the stream task and its consumers.
///
/// Cloning yields another handle to the same set. Delivery order is
/// registration order. Dispatch works on a snapshot, so callbacks may add or
/// remove listeners (themselves included) while a message is being delivered.
#[derive(Clone, Default)]
pub struct Listeners {
    inner: Arc<Mutex<Vec<Registration>>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Registration>> {
        // Callbacks never run under the lock, so poisoning cannot leave the
        // list half-updated.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `callback` under `id`. An existing registration with the same
    /// id keeps its position and gets the new callback.
    pub fn add<F>(&self, id: impl Into<ListenerId>, callback: F)
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let id = id.into();
        let callback: Callback = Arc::new(callback);
        let mut regs = self.lock();
        match regs.iter_mut().find(|r| r.id == id) {
            Some(existing) => existing.callback = callback,
            None => regs.push(Registration { id, callback }),
        }
    }

    /// Remove the registration under `id`. Returns whether one existed.
    pub fn remove(&self, id: &ListenerId) -> bool {
        let mut regs = self.lock();
        let before = regs.len();
        regs.retain(|r| &r.id != id);
        regs.len() != before
    }

    pub fn contains(&self, id: &ListenerId) -> bool {
        self.lock().iter().any(|r| &r.id == id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Deliver `message` to every listener registered when dispatch starts.
    ///
    /// A panicking callback is logged and skipped; the rest still receive the
    /// message. Returns the number of callbacks that completed.
    pub fn dispatch(&self, message: &Notification) -> usize {
        let snapshot: Vec<(ListenerId, Callback)> = self
            .lock()
            .iter()
            .map(|r| (r.id.clone(), r.callback.clone()))
            .collect();

        let mut delivered = 0;
        for (id, callback) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| callback(message))) {
                Ok(()) => delivered += 1,
                Err(panic) => {
                    let reason = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "non-string panic".into());
                    error!("listener {id} panicked: {reason}");
                    metrics::counter!(crate::observability::LISTENER_PANICS_TOTAL).increment(1);
                }
            }
        }
        delivered
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<ListenerId> = self.lock().iter().map(|r| r.id.clone()).collect();
        f.debug_struct("Listeners").field("ids", &ids).finish()
    }
}

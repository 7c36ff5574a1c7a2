//! Background worker that flushes batched publishes on a fixed interval.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::error::ServiceError;

/// Anything holding batched requests.
pub trait Flushable: Send + Sync {
    fn flush(&self);
}

struct State {
    subscribers: Vec<Arc<dyn Flushable>>,
    stopping: bool,
}

struct Shared {
    state: Mutex<State>,
    wake: Condvar,
    interval: Duration,
}

pub struct BatchFlusher {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl BatchFlusher {
    /// Spawn the worker thread; it flushes every `interval` until [`Self::shutdown`].
    pub fn start(name: &str, interval: Duration) -> Result<Self, ServiceError> {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                subscribers: Vec::new(),
                stopping: false,
            }),
            wake: Condvar::new(),
            interval,
        });
        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(format!("{name}.BatchFlusher"))
            .spawn(move || run(worker_shared))
            .map_err(|err| ServiceError::Worker(err.to_string()))?;
        tracing::debug!(name, interval_ms = interval.as_millis() as u64, "batch flusher started");

        Ok(Self {
            shared,
            worker: Mutex::new(Some(handle)),
        })
    }

    pub fn add(&self, subscriber: Arc<dyn Flushable>) {
        self.shared.state.lock().subscribers.push(subscriber);
    }

    pub fn remove(&self, subscriber: &Arc<dyn Flushable>) {
        self.shared
            .state
            .lock()
            .subscribers
            .retain(|s| !Arc::ptr_eq(s, subscriber));
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }

    /// Stop the worker after one last flush and join it. Idempotent.
    pub fn shutdown(&self) {
        self.shared.state.lock().stopping = true;
        self.shared.wake.notify_all();

        let Some(handle) = self.worker.lock().take() else {
            return;
        };
        if handle.join().is_err() {
            tracing::error!("batch flusher worker panicked");
        }
    }

    /// Drop every registered subscriber.
    pub fn clear(&self) {
        self.shared.state.lock().subscribers.clear();
    }
}

impl Drop for BatchFlusher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(shared: Arc<Shared>) {
    let mut state = shared.state.lock();
    while !state.stopping {
        let timed_out = shared
            .wake
            .wait_for(&mut state, shared.interval)
            .timed_out();
        if timed_out && !state.stopping {
            flush_unlocked(&mut state);
        }
    }
    flush_unlocked(&mut state);
}

/// Flush a snapshot of the subscribers without holding the lock.
fn flush_unlocked(state: &mut MutexGuard<'_, State>) {
    let batch = state.subscribers.clone();
    MutexGuard::unlocked(state, || {
        for subscriber in &batch {
            subscriber.flush();
        }
    });
}

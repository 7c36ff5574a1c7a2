use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::ServiceError;
use crate::flusher::BatchFlusher;
use crate::transport::{Communicator, ObjectAdapter};

const DEFAULT_FLUSH_INTERVAL_MS: i64 = 1000;
const MIN_FLUSH_INTERVAL_MS: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running,
    ShutDown,
    Destroyed,
}

/// State shared by the topic manager and its topics.
pub struct Instance {
    name: String,
    communicator: Arc<dyn Communicator>,
    publish_adapter: Mutex<Option<Arc<dyn ObjectAdapter>>>,
    flusher: Mutex<Option<Arc<BatchFlusher>>>,
    phase: Mutex<Phase>,
}

impl Instance {
    /// Reads `<name>.Flush.Timeout` (milliseconds, at least 100) and starts the
    /// batch flusher.
    pub fn new(
        name: &str,
        communicator: Arc<dyn Communicator>,
        publish_adapter: Arc<dyn ObjectAdapter>,
    ) -> Result<Self, ServiceError> {
        let interval = communicator
            .property_as_int_with_default(&format!("{name}.Flush.Timeout"), DEFAULT_FLUSH_INTERVAL_MS)
            .max(MIN_FLUSH_INTERVAL_MS);
        let flusher = BatchFlusher::start(name, Duration::from_millis(interval as u64))?;

        Ok(Self {
            name: name.to_string(),
            communicator,
            publish_adapter: Mutex::new(Some(publish_adapter)),
            flusher: Mutex::new(Some(Arc::new(flusher))),
            phase: Mutex::new(Phase::Running),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn communicator(&self) -> &Arc<dyn Communicator> {
        &self.communicator
    }

    /// `None` once destroyed.
    pub fn publish_adapter(&self) -> Option<Arc<dyn ObjectAdapter>> {
        self.publish_adapter.lock().clone()
    }

    /// `None` once destroyed.
    pub fn batch_flusher(&self) -> Option<Arc<BatchFlusher>> {
        self.flusher.lock().clone()
    }

    /// First phase: stop worker threads and join them. References stay valid.
    pub fn shutdown(&self) {
        {
            let mut phase = self.phase.lock();
            if *phase != Phase::Running {
                return;
            }
            *phase = Phase::ShutDown;
        }
        if let Some(flusher) = self.batch_flusher() {
            flusher.shutdown();
        }
        tracing::debug!(name = %self.name, "instance shut down");
    }

    /// Second phase: release shared references. Shuts down first if still running.
    pub fn destroy(&self) {
        self.shutdown();
        let mut phase = self.phase.lock();
        if *phase == Phase::Destroyed {
            return;
        }
        if let Some(flusher) = self.flusher.lock().take() {
            flusher.clear();
        }
        self.publish_adapter.lock().take();
        *phase = Phase::Destroyed;
        tracing::debug!(name = %self.name, "instance destroyed");
    }

    pub fn is_shut_down(&self) -> bool {
        *self.phase.lock() != Phase::Running
    }

    pub fn is_destroyed(&self) -> bool {
        *self.phase.lock() == Phase::Destroyed
    }
}

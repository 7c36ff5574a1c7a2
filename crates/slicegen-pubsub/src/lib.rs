//! Bootstrap lifecycle of the topic service.
//!
//! - `Service` - start against a communicator or embedder-supplied adapters, stop
//! - `Instance` - shared service state and the batch-flush worker
//! - `transport` - the communicator and adapter seams the service runs on
//!
//! Shutdown is two-phase: [`Instance::shutdown`] stops traffic and joins worker
//! threads, then [`Instance::destroy`] releases shared references.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod error;
mod flusher;
mod instance;
mod manager;
mod service;
pub mod transport;

#[cfg(test)]
mod test_utils;

pub use error::{ServiceError, TransportError};
pub use flusher::{BatchFlusher, Flushable};
pub use instance::Instance;
pub use manager::{TOPIC_MANAGER_TYPE_ID, TopicManager, TopicManagerPrx};
pub use service::{DEFAULT_INSTANCE_NAME, Service, TOPIC_DB};
pub use transport::{Communicator, Identity, ObjectAdapter, ObjectPrx, Servant};

pub type Result<T> = std::result::Result<T, ServiceError>;

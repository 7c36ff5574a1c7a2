use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::instance::Instance;
use crate::transport::{Identity, ObjectPrx, Servant};

pub const TOPIC_MANAGER_TYPE_ID: &str = "::IceStorm::TopicManager";

/// Servant behind the service entry point.
pub struct TopicManager {
    instance: Arc<Instance>,
    adapter: String,
    env_name: String,
    db_name: String,
    shut_down: AtomicBool,
}

impl TopicManager {
    pub fn new(
        instance: Arc<Instance>,
        adapter: impl Into<String>,
        env_name: impl Into<String>,
        db_name: impl Into<String>,
    ) -> Self {
        Self {
            instance,
            adapter: adapter.into(),
            env_name: env_name.into(),
            db_name: db_name.into(),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }

    /// Adapter the manager is registered with.
    pub fn adapter(&self) -> &str {
        &self.adapter
    }

    /// Storage environment the topics live in.
    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    pub fn shutdown(&self) {
        if !self.shut_down.swap(true, Ordering::SeqCst) {
            tracing::debug!(instance = %self.instance.name(), env = %self.env_name, "topic manager shut down");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

impl Servant for TopicManager {
    fn ice_id(&self) -> &str {
        TOPIC_MANAGER_TYPE_ID
    }
}

/// Typed reference to the topic manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicManagerPrx(ObjectPrx);

impl TopicManagerPrx {
    /// Wrap `proxy` without asking the server for its type.
    pub fn unchecked_cast(proxy: ObjectPrx) -> Self {
        Self(proxy)
    }

    pub fn identity(&self) -> &Identity {
        &self.0.identity
    }

    pub fn as_object(&self) -> &ObjectPrx {
        &self.0
    }
}

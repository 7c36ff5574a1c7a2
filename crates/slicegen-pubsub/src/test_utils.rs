//! In-memory communicator that records adapter traffic.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::TransportError;
use crate::transport::{Communicator, Identity, ObjectAdapter, ObjectPrx, Servant};

pub type Events = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
pub struct MockCommunicator {
    properties: HashMap<String, String>,
    fail_add: bool,
    fail_activate: HashSet<String>,
    events: Events,
    adapters: Mutex<Vec<Arc<MockAdapter>>>,
}

impl MockCommunicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    /// Every adapter created afterwards rejects registrations.
    pub fn failing_add(mut self) -> Self {
        self.fail_add = true;
        self
    }

    pub fn failing_activate(mut self, adapter: &str) -> Self {
        self.fail_activate.insert(adapter.to_string());
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    /// Adapter for the embedding host, sharing this communicator's event log.
    pub fn adapter(&self, name: &str) -> Arc<MockAdapter> {
        let adapter = Arc::new(MockAdapter {
            name: name.to_string(),
            fail_add: self.fail_add,
            fail_activate: self.fail_activate.contains(name),
            events: Arc::clone(&self.events),
            servants: Mutex::new(HashMap::new()),
        });
        self.adapters.lock().push(Arc::clone(&adapter));
        adapter
    }

    pub fn created(&self, name: &str) -> Option<Arc<MockAdapter>> {
        self.adapters.lock().iter().find(|a| a.name == name).cloned()
    }
}

impl Communicator for MockCommunicator {
    fn property(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }

    fn create_object_adapter(&self, name: &str) -> Result<Arc<dyn ObjectAdapter>, TransportError> {
        self.events.lock().push(format!("create {name}"));
        Ok(self.adapter(name))
    }
}

pub struct MockAdapter {
    name: String,
    fail_add: bool,
    fail_activate: bool,
    events: Events,
    servants: Mutex<HashMap<Identity, Arc<dyn Servant>>>,
}

impl MockAdapter {
    pub fn servant_type(&self, identity: &Identity) -> Option<String> {
        self.servants
            .lock()
            .get(identity)
            .map(|s| s.ice_id().to_string())
    }
}

impl ObjectAdapter for MockAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn add(&self, servant: Arc<dyn Servant>, identity: &Identity) -> Result<ObjectPrx, TransportError> {
        self.events.lock().push(format!("add {identity} on {}", self.name));
        if self.fail_add {
            return Err(TransportError::AlreadyRegistered(identity.to_string()));
        }
        let mut servants = self.servants.lock();
        if servants.contains_key(identity) {
            return Err(TransportError::AlreadyRegistered(identity.to_string()));
        }
        servants.insert(identity.clone(), servant);
        Ok(ObjectPrx {
            identity: identity.clone(),
            adapter: self.name.clone(),
        })
    }

    fn activate(&self) -> Result<(), TransportError> {
        self.events.lock().push(format!("activate {}", self.name));
        if self.fail_activate {
            return Err(TransportError::Other(format!("cannot listen on {}", self.name)));
        }
        Ok(())
    }

    fn deactivate(&self) {
        self.events.lock().push(format!("deactivate {}", self.name));
    }
}

use std::sync::Arc;

use parking_lot::Mutex;

use crate::Result;
use crate::error::ServiceError;
use crate::instance::Instance;
use crate::manager::{TopicManager, TopicManagerPrx};
use crate::transport::{Communicator, Identity, ObjectAdapter};

/// Identity category used when `<name>.InstanceName` is unset.
pub const DEFAULT_INSTANCE_NAME: &str = "IceStorm";
/// Database holding the topic records.
pub const TOPIC_DB: &str = "topics";

struct Running {
    name: String,
    instance: Arc<Instance>,
    manager: Arc<TopicManager>,
    proxy: TopicManagerPrx,
    /// Adapters the service created itself and deactivates on stop.
    owned_adapters: Vec<Arc<dyn ObjectAdapter>>,
}

/// Topic service lifecycle: start, hand out the topic manager, stop.
#[derive(Default)]
pub struct Service {
    running: Mutex<Option<Running>>,
}

impl Service {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start as a standalone service: creates the `<name>.TopicManager` and
    /// `<name>.Publish` adapters, registers the manager as
    /// `<InstanceName>/TopicManager`, then activates both adapters.
    pub fn start(&self, name: &str, communicator: Arc<dyn Communicator>, args: &[String]) -> Result<()> {
        let mut running = self.running.lock();
        if let Some(current) = running.as_ref() {
            return Err(ServiceError::AlreadyStarted(current.name.clone()));
        }
        tracing::info!(name, ?args, "starting topic service");

        let topic_adapter = communicator.create_object_adapter(&format!("{name}.TopicManager"))?;
        let publish_adapter = match communicator.create_object_adapter(&format!("{name}.Publish")) {
            Ok(adapter) => adapter,
            Err(err) => {
                topic_adapter.deactivate();
                return Err(err.into());
            }
        };
        let owned = vec![Arc::clone(&topic_adapter), Arc::clone(&publish_adapter)];

        let category = communicator
            .property_with_default(&format!("{name}.InstanceName"), DEFAULT_INSTANCE_NAME);
        let identity = Identity::new(category, "TopicManager");

        // The storage environment is named after the service.
        let registered = register(name, &communicator, &topic_adapter, publish_adapter.clone(), &identity, name);
        let (instance, manager, proxy) = match registered {
            Ok(parts) => parts,
            Err(err) => {
                deactivate_all(&owned);
                return Err(err);
            }
        };

        let activated = topic_adapter
            .activate()
            .and_then(|()| publish_adapter.activate());
        if let Err(err) = activated {
            tracing::warn!(name, error = %err, "adapter activation failed");
            deactivate_all(&owned);
            instance.destroy();
            return Err(err.into());
        }

        *running = Some(Running {
            name: name.to_string(),
            instance,
            manager,
            proxy,
            owned_adapters: owned,
        });
        Ok(())
    }

    /// Start inside a host that owns the adapters; they are neither activated
    /// nor deactivated here.
    pub fn start_with_adapters(
        &self,
        communicator: Arc<dyn Communicator>,
        topic_adapter: Arc<dyn ObjectAdapter>,
        publish_adapter: Arc<dyn ObjectAdapter>,
        name: &str,
        identity: &Identity,
        db_env: &str,
    ) -> Result<()> {
        let mut running = self.running.lock();
        if let Some(current) = running.as_ref() {
            return Err(ServiceError::AlreadyStarted(current.name.clone()));
        }
        tracing::info!(name, %identity, db_env, "starting embedded topic service");

        let (instance, manager, proxy) =
            register(name, &communicator, &topic_adapter, publish_adapter, identity, db_env)?;
        *running = Some(Running {
            name: name.to_string(),
            instance,
            manager,
            proxy,
            owned_adapters: Vec::new(),
        });
        Ok(())
    }

    /// New service started with [`Self::start_with_adapters`].
    pub fn create(
        communicator: Arc<dyn Communicator>,
        topic_adapter: Arc<dyn ObjectAdapter>,
        publish_adapter: Arc<dyn ObjectAdapter>,
        name: &str,
        identity: &Identity,
        db_env: &str,
    ) -> Result<Self> {
        let service = Self::new();
        service.start_with_adapters(communicator, topic_adapter, publish_adapter, name, identity, db_env)?;
        Ok(service)
    }

    pub fn topic_manager(&self) -> Result<TopicManagerPrx> {
        self.running
            .lock()
            .as_ref()
            .map(|r| r.proxy.clone())
            .ok_or(ServiceError::NotStarted)
    }

    pub fn instance(&self) -> Option<Arc<Instance>> {
        self.running.lock().as_ref().map(|r| Arc::clone(&r.instance))
    }

    pub fn manager(&self) -> Option<Arc<TopicManager>> {
        self.running.lock().as_ref().map(|r| Arc::clone(&r.manager))
    }

    pub fn is_started(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Deactivate owned adapters, shut the instance down, reap the manager, then
    /// destroy the instance.
    pub fn stop(&self) -> Result<()> {
        let running = self.running.lock().take().ok_or(ServiceError::NotStarted)?;
        tracing::info!(name = %running.name, "stopping topic service");

        deactivate_all(&running.owned_adapters);
        running.instance.shutdown();
        running.manager.shutdown();
        running.instance.destroy();
        Ok(())
    }
}

/// Build the instance and register the manager. A failed registration destroys
/// the instance before returning.
fn register(
    name: &str,
    communicator: &Arc<dyn Communicator>,
    topic_adapter: &Arc<dyn ObjectAdapter>,
    publish_adapter: Arc<dyn ObjectAdapter>,
    identity: &Identity,
    db_env: &str,
) -> Result<(Arc<Instance>, Arc<TopicManager>, TopicManagerPrx)> {
    let instance = Arc::new(Instance::new(name, Arc::clone(communicator), publish_adapter)?);
    let manager = Arc::new(TopicManager::new(
        Arc::clone(&instance),
        topic_adapter.name(),
        db_env,
        TOPIC_DB,
    ));

    match topic_adapter.add(manager.clone(), identity) {
        Ok(proxy) => Ok((instance, manager, TopicManagerPrx::unchecked_cast(proxy))),
        Err(err) => {
            tracing::warn!(name, %identity, error = %err, "topic manager registration failed");
            instance.destroy();
            Err(err.into())
        }
    }
}

fn deactivate_all(adapters: &[Arc<dyn ObjectAdapter>]) {
    for adapter in adapters {
        adapter.deactivate();
    }
}

//! Seams to the RPC runtime the service is hosted on.

use std::fmt;
use std::sync::Arc;

use crate::error::TransportError;

/// Object identity: `category/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    pub category: String,
    pub name: String,
}

impl Identity {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.category.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.category, self.name)
        }
    }
}

/// Untyped reference to a registered servant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPrx {
    pub identity: Identity,
    pub adapter: String,
}

/// Object registered with an adapter.
pub trait Servant: Send + Sync {
    /// Scoped type id of the most derived interface.
    fn ice_id(&self) -> &str;
}

pub trait ObjectAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Register `servant` under `identity`.
    fn add(&self, servant: Arc<dyn Servant>, identity: &Identity) -> Result<ObjectPrx, TransportError>;

    /// Start dispatching requests.
    fn activate(&self) -> Result<(), TransportError>;

    /// Stop dispatching; requests in progress complete first.
    fn deactivate(&self);
}

pub trait Communicator: Send + Sync {
    /// Value of a configuration property, if set.
    fn property(&self, key: &str) -> Option<String>;

    fn create_object_adapter(&self, name: &str) -> Result<Arc<dyn ObjectAdapter>, TransportError>;

    fn property_with_default(&self, key: &str, default: &str) -> String {
        self.property(key).unwrap_or_else(|| default.to_string())
    }

    fn property_as_int_with_default(&self, key: &str, default: i64) -> i64 {
        self.property(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }
}

//! Dynamic values and the instance arena.

use indexmap::IndexMap;
use slicegen_core::{ClassId, ExceptionId};

/// Named members in marshal order. An absent optional member has no entry.
pub type Record = IndexMap<String, Value>;

/// Handle to an instance in a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub(crate) u32);

impl InstanceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A decoded or to-be-encoded value.
///
/// Class instances are never stored inline; `Class` holds a handle into the
/// graph so cycles and shared references keep their identity.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(u8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Enum(i32),
    Struct(Record),
    Sequence(Vec<Value>),
    Dictionary(Vec<(Value, Value)>),
    Class(Option<InstanceId>),
    /// Proxy identity as `category/name`, or just `name`; `None` is the null proxy.
    Proxy(Option<String>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Byte(_) => "byte",
            Value::Short(_) => "short",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Enum(_) => "enum",
            Value::Struct(_) => "struct",
            Value::Sequence(_) => "sequence",
            Value::Dictionary(_) => "dictionary",
            Value::Class(_) => "class",
            Value::Proxy(_) => "proxy",
        }
    }
}

/// Opaque slice kept from a type the reader did not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceInfo {
    pub type_id: String,
    pub compact_id: Option<i32>,
    /// Slice body, excluding header and size.
    pub bytes: Vec<u8>,
    pub has_optional_members: bool,
}

/// Unknown most-derived slices preserved for re-encoding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlicedData {
    pub slices: Vec<SliceInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub class: ClassId,
    pub members: Record,
    pub sliced: Option<SlicedData>,
}

impl Instance {
    pub fn new(class: ClassId, members: Record) -> Self {
        Self {
            class,
            members,
            sliced: None,
        }
    }
}

/// Arena of class instances addressed by [`InstanceId`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Graph {
    instances: Vec<Instance>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, instance: Instance) -> InstanceId {
        let id = InstanceId(self.instances.len() as u32);
        self.instances.push(instance);
        id
    }

    pub fn get(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(id.index())
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut Instance> {
        self.instances.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (InstanceId, &Instance)> {
        self.instances
            .iter()
            .enumerate()
            .map(|(i, inst)| (InstanceId(i as u32), inst))
    }

    pub(crate) fn from_instances(instances: Vec<Instance>) -> Self {
        Self { instances }
    }
}

/// A user exception value, most-derived known type first.
#[derive(Debug, Clone, PartialEq)]
pub struct UserException {
    pub exception: ExceptionId,
    pub members: Record,
    pub sliced: Option<SlicedData>,
}

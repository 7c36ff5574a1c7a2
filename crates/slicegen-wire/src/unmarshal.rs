//! Decoder driven by the resolved type model.

use std::collections::HashMap;

use slicegen_core::layout::{OptionalFormat, marshal_order, optional_format};
use slicegen_core::{Builtin, ClassId, Definition, ExceptionId, Member, Type, Unit};

use crate::error::DecodeError;
use crate::stream::{InputStream, SliceHeader};
use crate::value::{
    Graph, Instance, InstanceId, Record, SliceInfo, SlicedData, UserException, Value,
};

/// Deferred check that a reference resolved to an instance of the right type.
#[derive(Debug)]
struct Patcher {
    slot: InstanceId,
    index: usize,
    /// `None` accepts any class.
    expected: Option<ClassId>,
}

/// Reads values of model types from an [`InputStream`].
///
/// Class references allocate graph slots on first sight. Slots are filled by
/// [`Unmarshaler::read_pending_values`], which then verifies every reference.
pub struct Unmarshaler<'u, 'b> {
    unit: &'u Unit,
    input: InputStream<'b>,
    compact_ids: HashMap<i32, ClassId>,
    slots: Vec<Option<Instance>>,
    by_index: HashMap<usize, InstanceId>,
    patchers: Vec<Patcher>,
}

impl<'u, 'b> Unmarshaler<'u, 'b> {
    pub fn new(unit: &'u Unit, bytes: &'b [u8]) -> Self {
        let compact_ids = unit
            .classes()
            .filter_map(|(id, class)| class.compact_id.map(|c| (c, id)))
            .collect();
        Self {
            unit,
            input: InputStream::new(bytes),
            compact_ids,
            slots: Vec::new(),
            by_index: HashMap::new(),
            patchers: Vec::new(),
        }
    }

    pub fn input(&mut self) -> &mut InputStream<'b> {
        &mut self.input
    }

    pub fn read(&mut self, ty: Type) -> Result<Value, DecodeError> {
        let value = match ty {
            Type::Builtin(b) => match b {
                Builtin::Bool => Value::Bool(self.input.read_bool()?),
                Builtin::Byte => Value::Byte(self.input.read_byte()?),
                Builtin::Short => Value::Short(self.input.read_short()?),
                Builtin::Int => Value::Int(self.input.read_int()?),
                Builtin::Long => Value::Long(self.input.read_long()?),
                Builtin::Float => Value::Float(self.input.read_float()?),
                Builtin::Double => Value::Double(self.input.read_double()?),
                Builtin::String => Value::String(self.input.read_string()?),
                Builtin::Object | Builtin::Value => Value::Class(self.read_reference(None)?),
                Builtin::ObjectProxy => self.read_proxy()?,
            },
            Type::Proxy(_) => self.read_proxy()?,
            Type::Class(id) => Value::Class(self.read_reference(Some(id))?),
            Type::Enum(id) => {
                let v = self.input.read_size()? as i32;
                let e = self.unit.enumeration(id);
                if e.by_value(v).is_none() {
                    return Err(DecodeError::EnumOutOfRange {
                        type_id: e.decl.scoped.clone(),
                        value: v,
                    });
                }
                Value::Enum(v)
            }
            Type::Struct(id) => {
                let unit = self.unit;
                let mut record = Record::new();
                for member in &unit.structure(id).members {
                    record.insert(member.name.clone(), self.read(member.ty)?);
                }
                Value::Struct(record)
            }
            Type::Sequence(id) => {
                let element = self.unit.sequence(id).element;
                let n = self
                    .input
                    .read_and_check_seq_size(self.unit.min_wire_size(element))?;
                let mut items = Vec::with_capacity(n);
                for _ in 0..n {
                    items.push(self.read(element)?);
                }
                Value::Sequence(items)
            }
            Type::Dictionary(id) => {
                let dict = self.unit.dictionary(id);
                let (key_ty, value_ty) = (dict.key, dict.value);
                let entry = self.unit.min_wire_size(key_ty) + self.unit.min_wire_size(value_ty);
                let n = self.input.read_and_check_seq_size(entry)?;
                let mut entries = Vec::with_capacity(n);
                for _ in 0..n {
                    let k = self.read(key_ty)?;
                    let v = self.read(value_ty)?;
                    entries.push((k, v));
                }
                Value::Dictionary(entries)
            }
        };
        Ok(value)
    }

    fn read_proxy(&mut self) -> Result<Value, DecodeError> {
        let name = self.input.read_string()?;
        let category = self.input.read_string()?;
        let proxy = match (name.is_empty(), category.is_empty()) {
            (true, _) => None,
            (false, true) => Some(name),
            (false, false) => Some(format!("{category}/{name}")),
        };
        Ok(Value::Proxy(proxy))
    }

    fn read_reference(
        &mut self,
        expected: Option<ClassId>,
    ) -> Result<Option<InstanceId>, DecodeError> {
        let index = self.input.read_size()?;
        if index == 0 {
            return Ok(None);
        }
        let slot = self.slot_for(index);
        self.patchers.push(Patcher {
            slot,
            index,
            expected,
        });
        Ok(Some(slot))
    }

    fn slot_for(&mut self, index: usize) -> InstanceId {
        if let Some(slot) = self.by_index.get(&index) {
            return *slot;
        }
        let slot = InstanceId(self.slots.len() as u32);
        self.slots.push(None);
        self.by_index.insert(index, slot);
        slot
    }

    /// Read the optional value with `tag`, if present before `end`.
    ///
    /// Smaller unknown tags are skipped. A larger tag is left in place for the
    /// next read.
    pub fn read_optional(
        &mut self,
        tag: i32,
        ty: Type,
        end: usize,
    ) -> Result<Option<Value>, DecodeError> {
        loop {
            let pos = self.input.position();
            let Some((found, format)) = self.input.read_optional_header(end)? else {
                return Ok(None);
            };
            if found < tag {
                tracing::trace!(tag = found, "skipping unknown optional");
                self.input.skip_optional(format)?;
                continue;
            }
            if found > tag {
                self.input.set_position(pos);
                return Ok(None);
            }

            let expected = optional_format(self.unit, ty);
            if format != expected {
                return Err(DecodeError::UnexpectedFormat {
                    tag,
                    expected: expected.name(),
                    found: format.name(),
                });
            }
            match format {
                OptionalFormat::VSize if ty != Type::Builtin(Builtin::String) => {
                    self.input.read_size()?;
                }
                OptionalFormat::FSize => {
                    self.input.skip(4)?;
                }
                _ => {}
            }
            return self.read(ty).map(Some);
        }
    }

    /// Members of one slice in marshal order, then any trailing optionals.
    fn read_members(
        &mut self,
        members: &[Member],
        end: usize,
        record: &mut Record,
    ) -> Result<(), DecodeError> {
        for member in marshal_order(members) {
            let value = match member.tag {
                None => Some(self.read(member.ty)?),
                Some(tag) => self.read_optional(tag, member.ty, end)?,
            };
            if let Some(value) = value {
                record.insert(member.name.clone(), value);
            }
        }
        Ok(())
    }

    fn finish_slice(&mut self, header: &SliceHeader) -> Result<(), DecodeError> {
        if header.has_optional_members() {
            self.input.skip_optionals(header.end)?;
        }
        if self.input.position() > header.end {
            return Err(DecodeError::TruncatedSlice {
                type_id: header.display_id(),
            });
        }
        self.input.set_position(header.end);
        Ok(())
    }

    fn unknown_slice(&mut self, header: &SliceHeader) -> Result<SliceInfo, DecodeError> {
        tracing::debug!(type_id = %header.display_id(), "slicing unknown type");
        let len = header.end.saturating_sub(self.input.position());
        let mut bytes = self.input.read_raw(len)?.to_vec();
        if header.has_optional_members() {
            bytes.pop();
        }
        Ok(SliceInfo {
            type_id: header.type_id.clone(),
            compact_id: header.compact_id,
            bytes,
            has_optional_members: header.has_optional_members(),
        })
    }

    fn known_class(&self, header: &SliceHeader) -> Option<ClassId> {
        if let Some(compact) = header.compact_id {
            return self.compact_ids.get(&compact).copied();
        }
        match self.unit.lookup(&header.type_id) {
            Some(Definition::Class(id)) if !self.unit.class(id).is_interface => Some(id),
            _ => None,
        }
    }

    fn read_instance(&mut self) -> Result<Instance, DecodeError> {
        let unit = self.unit;
        let mut first_id: Option<String> = None;
        let mut known: Option<ClassId> = None;
        let mut unknown = Vec::new();
        let mut members = Record::new();

        loop {
            let header = self.input.read_slice_header()?;
            first_id.get_or_insert_with(|| header.display_id());
            match (known, self.known_class(&header)) {
                (_, Some(class)) => {
                    known.get_or_insert(class);
                    self.read_members(&unit.class(class).members, header.end, &mut members)?;
                    self.finish_slice(&header)?;
                }
                (None, None) => unknown.push(self.unknown_slice(&header)?),
                (Some(_), None) => {
                    self.unknown_slice(&header)?;
                }
            }
            if header.is_last() {
                break;
            }
        }

        let Some(class) = known else {
            return Err(DecodeError::NoKnownType(first_id.unwrap_or_default()));
        };
        let sliced = (unit.class_preserves_slice(class) && !unknown.is_empty())
            .then_some(SlicedData { slices: unknown });
        Ok(Instance {
            class,
            members,
            sliced,
        })
    }

    /// Read queued instance bodies and resolve every reference seen so far.
    pub fn read_pending_values(&mut self) -> Result<(), DecodeError> {
        loop {
            let n = self.input.read_size()?;
            if n == 0 {
                break;
            }
            for _ in 0..n {
                let index = self.input.read_int()?;
                if index <= 0 {
                    return Err(DecodeError::UnresolvedReference(index));
                }
                let instance = self.read_instance()?;
                let slot = self.slot_for(index as usize);
                self.slots[slot.index()] = Some(instance);
            }
        }
        self.check_references()
    }

    fn check_references(&mut self) -> Result<(), DecodeError> {
        for patcher in std::mem::take(&mut self.patchers) {
            let Some(instance) = &self.slots[patcher.slot.index()] else {
                return Err(DecodeError::UnresolvedReference(patcher.index as i32));
            };
            let Some(expected) = patcher.expected else {
                continue;
            };
            if instance.class != expected && !self.unit.class_is_base_of(expected, instance.class)
            {
                return Err(DecodeError::UnexpectedType {
                    expected: self.unit.class(expected).decl.scoped.clone(),
                    found: self.unit.class(instance.class).decl.scoped.clone(),
                });
            }
        }
        Ok(())
    }

    fn known_exception(&self, type_id: &str) -> Option<ExceptionId> {
        match self.unit.lookup(type_id) {
            Some(Definition::Exception(id)) => Some(id),
            _ => None,
        }
    }

    /// Decode a user exception as its most-derived known type.
    pub fn read_exception(&mut self) -> Result<UserException, DecodeError> {
        let unit = self.unit;
        let uses_classes = self.input.read_bool()?;
        let mut first_id: Option<String> = None;
        let mut known: Option<ExceptionId> = None;
        let mut unknown = Vec::new();
        let mut members = Record::new();

        loop {
            let header = self.input.read_slice_header()?;
            first_id.get_or_insert_with(|| header.type_id.clone());
            match (known, self.known_exception(&header.type_id)) {
                (_, Some(id)) => {
                    known.get_or_insert(id);
                    self.read_members(&unit.exception(id).members, header.end, &mut members)?;
                    self.finish_slice(&header)?;
                }
                (None, None) => unknown.push(self.unknown_slice(&header)?),
                (Some(_), None) => {
                    self.unknown_slice(&header)?;
                }
            }
            if header.is_last() {
                break;
            }
        }

        let Some(exception) = known else {
            return Err(DecodeError::UnknownUserException(
                first_id.unwrap_or_default(),
            ));
        };
        if uses_classes {
            self.read_pending_values()?;
        }
        let sliced = (unit.exception_preserves_slice(exception) && !unknown.is_empty())
            .then_some(SlicedData { slices: unknown });
        Ok(UserException {
            exception,
            members,
            sliced,
        })
    }

    /// Instances decoded so far. Fails if a referenced instance never arrived.
    pub fn finish(self) -> Result<Graph, DecodeError> {
        let mut instances = Vec::with_capacity(self.slots.len());
        for (slot, instance) in self.slots.into_iter().enumerate() {
            let Some(instance) = instance else {
                let index = self
                    .by_index
                    .iter()
                    .find(|(_, s)| s.index() == slot)
                    .map_or(0, |(i, _)| *i);
                return Err(DecodeError::UnresolvedReference(index as i32));
            };
            instances.push(instance);
        }
        Ok(Graph::from_instances(instances))
    }
}

//! Encoder driven by the resolved type model.

use std::collections::HashMap;

use slicegen_core::layout::{OptionalFormat, marshal_order, optional_format};
use slicegen_core::{Builtin, ClassId, Member, Type, Unit};

use crate::error::EncodeError;
use crate::stream::OutputStream;
use crate::value::{Graph, InstanceId, Record, SlicedData, UserException, Value};

/// Writes values of model types to an [`OutputStream`].
///
/// Class instances are written by reference; their bodies are queued and emitted
/// by [`Marshaler::write_pending_values`].
pub struct Marshaler<'u> {
    unit: &'u Unit,
    out: OutputStream,
    indices: HashMap<InstanceId, usize>,
    queue: Vec<InstanceId>,
}

impl<'u> Marshaler<'u> {
    pub fn new(unit: &'u Unit) -> Self {
        Self {
            unit,
            out: OutputStream::new(),
            indices: HashMap::new(),
            queue: Vec::new(),
        }
    }

    pub fn output(&mut self) -> &mut OutputStream {
        &mut self.out
    }

    pub fn finish(self) -> Vec<u8> {
        self.out.into_bytes()
    }

    fn mismatch(&self, ty: Type, value: &Value) -> EncodeError {
        EncodeError::TypeMismatch {
            expected: self.unit.type_id(ty),
            found: value.kind(),
        }
    }

    pub fn write(&mut self, graph: &Graph, ty: Type, value: &Value) -> Result<(), EncodeError> {
        match (ty, value) {
            (Type::Builtin(Builtin::Bool), Value::Bool(v)) => self.out.write_bool(*v),
            (Type::Builtin(Builtin::Byte), Value::Byte(v)) => self.out.write_byte(*v),
            (Type::Builtin(Builtin::Short), Value::Short(v)) => self.out.write_short(*v),
            (Type::Builtin(Builtin::Int), Value::Int(v)) => self.out.write_int(*v),
            (Type::Builtin(Builtin::Long), Value::Long(v)) => self.out.write_long(*v),
            (Type::Builtin(Builtin::Float), Value::Float(v)) => self.out.write_float(*v),
            (Type::Builtin(Builtin::Double), Value::Double(v)) => self.out.write_double(*v),
            (Type::Builtin(Builtin::String), Value::String(v)) => self.out.write_string(v),
            (Type::Builtin(Builtin::Object | Builtin::Value) | Type::Class(_), Value::Class(r)) => {
                self.write_reference(*r)
            }
            (Type::Builtin(Builtin::ObjectProxy) | Type::Proxy(_), Value::Proxy(p)) => {
                self.write_proxy(p.as_deref())
            }
            (Type::Enum(id), Value::Enum(v)) => {
                if self.unit.enumeration(id).by_value(*v).is_none() {
                    return Err(EncodeError::Unencodable(format!(
                        "enumerator value {v} of `{}`",
                        self.unit.type_id(ty)
                    )));
                }
                self.out.write_size(*v as usize)
            }
            (Type::Struct(id), Value::Struct(record)) => {
                let unit = self.unit;
                for member in &unit.structure(id).members {
                    let v = record
                        .get(&member.name)
                        .ok_or_else(|| EncodeError::MissingMember(member.name.clone()))?;
                    self.write(graph, member.ty, v)?;
                }
            }
            (Type::Sequence(id), Value::Sequence(items)) => {
                let element = self.unit.sequence(id).element;
                self.out.write_size(items.len());
                for item in items {
                    self.write(graph, element, item)?;
                }
            }
            (Type::Dictionary(id), Value::Dictionary(entries)) => {
                let dict = self.unit.dictionary(id);
                let (key_ty, value_ty) = (dict.key, dict.value);
                self.out.write_size(entries.len());
                for (k, v) in entries {
                    self.write(graph, key_ty, k)?;
                    self.write(graph, value_ty, v)?;
                }
            }
            _ => return Err(self.mismatch(ty, value)),
        }
        Ok(())
    }

    /// Identity as `name` then `category`; the null proxy is two empty strings.
    fn write_proxy(&mut self, proxy: Option<&str>) {
        let (category, name) = match proxy {
            Some(p) => p.split_once('/').unwrap_or(("", p)),
            None => ("", ""),
        };
        self.out.write_string(name);
        self.out.write_string(category);
    }

    /// Write a present optional value with its tag header.
    pub fn write_optional(
        &mut self,
        graph: &Graph,
        tag: i32,
        ty: Type,
        value: &Value,
    ) -> Result<(), EncodeError> {
        let format = optional_format(self.unit, ty);
        self.out.write_optional_header(tag, format);
        match format {
            OptionalFormat::VSize if ty != Type::Builtin(Builtin::String) => {
                self.out.write_size(self.fixed_payload_size(ty, value));
                self.write(graph, ty, value)
            }
            OptionalFormat::FSize => {
                let pos = self.out.start_size();
                self.write(graph, ty, value)?;
                self.out.end_size(pos);
                Ok(())
            }
            _ => self.write(graph, ty, value),
        }
    }

    /// Payload size of a fixed-length struct, sequence or dictionary.
    fn fixed_payload_size(&self, ty: Type, value: &Value) -> usize {
        let count_prefix = |n: usize| if n > 254 { 5 } else { 1 };
        match (ty, value) {
            (Type::Sequence(id), Value::Sequence(items)) => {
                let element = self.unit.min_wire_size(self.unit.sequence(id).element);
                items.len() * element + count_prefix(items.len())
            }
            (Type::Dictionary(id), Value::Dictionary(entries)) => {
                let dict = self.unit.dictionary(id);
                let entry = self.unit.min_wire_size(dict.key) + self.unit.min_wire_size(dict.value);
                entries.len() * entry + count_prefix(entries.len())
            }
            _ => self.unit.min_wire_size(ty),
        }
    }

    fn write_reference(&mut self, reference: Option<InstanceId>) {
        let Some(id) = reference else {
            self.out.write_size(0);
            return;
        };
        let next = self.indices.len() + 1;
        let index = *self.indices.entry(id).or_insert_with(|| {
            self.queue.push(id);
            next
        });
        self.out.write_size(index);
    }

    /// Members in marshal order; absent optionals are skipped.
    pub fn write_members(
        &mut self,
        graph: &Graph,
        members: &[Member],
        record: &Record,
    ) -> Result<(), EncodeError> {
        for member in marshal_order(members) {
            match (member.tag, record.get(&member.name)) {
                (None, Some(v)) => self.write(graph, member.ty, v)?,
                (None, None) => return Err(EncodeError::MissingMember(member.name.clone())),
                (Some(tag), Some(v)) => self.write_optional(graph, tag, member.ty, v)?,
                (Some(_), None) => {}
            }
        }
        Ok(())
    }

    fn write_preserved(&mut self, sliced: Option<&SlicedData>) {
        for slice in sliced.into_iter().flat_map(|s| &s.slices) {
            self.out.start_slice(&slice.type_id, slice.compact_id, false);
            self.out.write_raw(&slice.bytes);
            self.out.end_slice_preserved(slice.has_optional_members);
        }
    }

    fn write_instance(&mut self, graph: &Graph, id: InstanceId) -> Result<(), EncodeError> {
        let unit = self.unit;
        let instance = graph
            .get(id)
            .ok_or(EncodeError::UnknownInstance(id.0))?;
        self.write_preserved(instance.sliced.as_ref());

        let mut current: Option<ClassId> = Some(instance.class);
        while let Some(class_id) = current {
            let class = unit.class(class_id);
            self.out
                .start_slice(&class.decl.scoped, class.compact_id, class.base.is_none());
            self.write_members(graph, &class.members, &instance.members)?;
            self.out.end_slice();
            current = class.base;
        }
        Ok(())
    }

    /// Flush queued instance bodies, including instances they reference.
    pub fn write_pending_values(&mut self, graph: &Graph) -> Result<(), EncodeError> {
        while !self.queue.is_empty() {
            let batch = std::mem::take(&mut self.queue);
            self.out.write_size(batch.len());
            for id in batch {
                let index = self.indices[&id];
                self.out.write_int(index as i32);
                self.write_instance(graph, id)?;
            }
        }
        self.out.write_size(0);
        Ok(())
    }

    /// Exception slices, most derived first, followed by any referenced instances.
    pub fn write_exception(
        &mut self,
        graph: &Graph,
        exception: &UserException,
    ) -> Result<(), EncodeError> {
        let unit = self.unit;
        let mut chain = Vec::new();
        let mut current = Some(exception.exception);
        while let Some(id) = current {
            chain.push(id);
            current = unit.exception(id).base;
        }
        let uses_classes = chain.iter().any(|id| unit.exception_uses_classes(*id));

        self.out.write_bool(uses_classes);
        self.write_preserved(exception.sliced.as_ref());
        for id in chain {
            let e = unit.exception(id);
            self.out.start_slice(&e.decl.scoped, None, e.base.is_none());
            self.write_members(graph, &e.members, &exception.members)?;
            self.out.end_slice();
        }
        if uses_classes {
            self.write_pending_values(graph)?;
        }
        Ok(())
    }
}

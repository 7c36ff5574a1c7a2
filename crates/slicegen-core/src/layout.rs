//! Wire ordering rules.
//!
//! Everything that decides *where* a value goes on the wire lives here, so the Java
//! emitters and the reference runtime agree byte for byte:
//! - optional format codes
//! - member and parameter marshal order (required first, then optional by tag)
//! - merged return/out-parameter order
//! - dispatch tables, type id lists and exception catch order

use std::collections::BTreeMap;

use crate::model::{Builtin, ClassId, ExceptionId, Member, Operation, Param, Type, Unit};

/// Encoding of an optional value, written in the low 3 bits of its header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionalFormat {
    F1 = 0,
    F2 = 1,
    F4 = 2,
    F8 = 3,
    Size = 4,
    VSize = 5,
    FSize = 6,
    Class = 7,
}

impl OptionalFormat {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => OptionalFormat::F1,
            1 => OptionalFormat::F2,
            2 => OptionalFormat::F4,
            3 => OptionalFormat::F8,
            4 => OptionalFormat::Size,
            5 => OptionalFormat::VSize,
            6 => OptionalFormat::FSize,
            7 => OptionalFormat::Class,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            OptionalFormat::F1 => "F1",
            OptionalFormat::F2 => "F2",
            OptionalFormat::F4 => "F4",
            OptionalFormat::F8 => "F8",
            OptionalFormat::Size => "Size",
            OptionalFormat::VSize => "VSize",
            OptionalFormat::FSize => "FSize",
            OptionalFormat::Class => "Class",
        }
    }
}

/// Tag byte value that escapes to a size-encoded tag.
pub const TAG_ESCAPE: i32 = 30;

/// Marker closing the optional members of a slice.
pub const OPTIONAL_END_MARKER: u8 = 0xFF;

pub fn optional_format(unit: &Unit, ty: Type) -> OptionalFormat {
    match ty {
        Type::Builtin(b) => match b {
            Builtin::Bool | Builtin::Byte => OptionalFormat::F1,
            Builtin::Short => OptionalFormat::F2,
            Builtin::Int | Builtin::Float => OptionalFormat::F4,
            Builtin::Long | Builtin::Double => OptionalFormat::F8,
            Builtin::String => OptionalFormat::VSize,
            Builtin::ObjectProxy => OptionalFormat::FSize,
            Builtin::Object | Builtin::Value => OptionalFormat::Class,
        },
        Type::Enum(_) => OptionalFormat::Size,
        Type::Class(_) => OptionalFormat::Class,
        Type::Proxy(_) => OptionalFormat::FSize,
        Type::Struct(_) => fixed_or_framed(unit.is_variable_length(ty)),
        Type::Sequence(id) => fixed_or_framed(unit.is_variable_length(unit.sequence(id).element)),
        Type::Dictionary(id) => {
            let dict = unit.dictionary(id);
            fixed_or_framed(unit.is_variable_length(dict.key) || unit.is_variable_length(dict.value))
        }
    }
}

fn fixed_or_framed(variable: bool) -> OptionalFormat {
    if variable {
        OptionalFormat::FSize
    } else {
        OptionalFormat::VSize
    }
}

// ============================================================================
// Member and parameter order
// ============================================================================

/// Anything that may carry an optional tag.
pub trait Tagged {
    fn tag(&self) -> Option<i32>;
}

impl Tagged for Member {
    fn tag(&self) -> Option<i32> {
        self.tag
    }
}

impl Tagged for Param {
    fn tag(&self) -> Option<i32> {
        self.tag
    }
}

impl<T: Tagged> Tagged for &T {
    fn tag(&self) -> Option<i32> {
        (*self).tag()
    }
}

/// Required items in declaration order, then optional items by ascending tag.
pub fn marshal_order<T: Tagged>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let (mut required, mut optional): (Vec<T>, Vec<T>) =
        items.into_iter().partition(|i| i.tag().is_none());
    optional.sort_by_key(|i| i.tag());
    required.append(&mut optional);
    required
}

/// Which slot of an operation a channel refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Index into `Operation::params`.
    Param(usize),
    Return,
}

/// One value crossing the wire for an operation.
#[derive(Debug, Clone, Copy)]
pub struct Channel<'a> {
    pub kind: ChannelKind,
    pub name: &'a str,
    pub ty: Type,
    pub tag: Option<i32>,
}

impl Channel<'_> {
    pub fn is_optional(&self) -> bool {
        self.tag.is_some()
    }

    pub fn is_return(&self) -> bool {
        self.kind == ChannelKind::Return
    }
}

impl Tagged for Channel<'_> {
    fn tag(&self) -> Option<i32> {
        self.tag
    }
}

pub const RETURN_VALUE_NAME: &str = "returnValue";

/// Input parameters in marshal order.
pub fn input_channels(op: &Operation) -> Vec<Channel<'_>> {
    let inputs = op
        .params
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.out)
        .map(|(i, p)| param_channel(i, p));
    marshal_order(inputs)
}

/// Output parameters and return value in marshal order.
///
/// Required outs, then a required return, then optional outs by tag. An optional
/// return goes before the first optional out with a larger tag, or last.
pub fn output_channels(op: &Operation) -> Vec<Channel<'_>> {
    let outs: Vec<Channel<'_>> = op
        .params
        .iter()
        .enumerate()
        .filter(|(_, p)| p.out)
        .map(|(i, p)| param_channel(i, p))
        .collect();
    let mut ordered = marshal_order(outs);

    let Some(ret) = &op.returns else {
        return ordered;
    };
    let ret = Channel {
        kind: ChannelKind::Return,
        name: RETURN_VALUE_NAME,
        ty: ret.ty,
        tag: ret.tag,
    };
    let position = match ret.tag {
        None => ordered.iter().take_while(|c| !c.is_optional()).count(),
        Some(tag) => ordered
            .iter()
            .position(|c| c.tag.is_some_and(|t| t > tag))
            .unwrap_or(ordered.len()),
    };
    ordered.insert(position, ret);
    ordered
}

fn param_channel(index: usize, p: &Param) -> Channel<'_> {
    Channel {
        kind: ChannelKind::Param(index),
        name: &p.name,
        ty: p.ty,
        tag: p.tag,
    }
}

/// Some channel can carry class instances, so a pending-value flush is required.
pub fn channels_use_classes(unit: &Unit, channels: &[Channel<'_>]) -> bool {
    channels.iter().any(|c| unit.uses_classes(c.ty))
}

// ============================================================================
// Dispatch
// ============================================================================

/// Operations every servant answers.
pub const INTROSPECTION_OPS: [&str; 4] = ["ice_id", "ice_ids", "ice_isA", "ice_ping"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchTarget {
    Introspection,
    /// Class or interface that declares the operation.
    Operation(ClassId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchEntry {
    pub name: String,
    pub target: DispatchTarget,
}

/// Sorted, deduplicated operation table for `class`, introspection names included.
pub fn dispatch_table(unit: &Unit, class: ClassId) -> Vec<DispatchEntry> {
    let mut table: BTreeMap<String, DispatchTarget> = INTROSPECTION_OPS
        .iter()
        .map(|name| (name.to_string(), DispatchTarget::Introspection))
        .collect();
    for op in unit.all_operations(class) {
        table
            .entry(op.name.clone())
            .or_insert(DispatchTarget::Operation(op.owner));
    }
    table
        .into_iter()
        .map(|(name, target)| DispatchEntry { name, target })
        .collect()
}

/// Binary search over a table produced by [`dispatch_table`].
pub fn find_operation(table: &[DispatchEntry], name: &str) -> Option<usize> {
    table
        .binary_search_by(|entry| entry.name.as_str().cmp(name))
        .ok()
}

/// Sorted, deduplicated type ids answered by `ice_ids`.
pub fn type_ids(unit: &Unit, class: ClassId) -> Vec<String> {
    let mut ids: Vec<String> = std::iter::once(class)
        .chain(unit.all_bases(class))
        .map(|c| unit.class(c).decl.scoped.clone())
        .collect();
    ids.push("::Ice::Object".to_string());
    ids.sort();
    ids.dedup();
    ids
}

/// Deduplicated exceptions, most derived first, ties broken by scoped name.
pub fn catch_order(unit: &Unit, throws: &[ExceptionId]) -> Vec<ExceptionId> {
    let mut out = throws.to_vec();
    out.sort_by(|a, b| {
        unit.exception_depth(*b)
            .cmp(&unit.exception_depth(*a))
            .then_with(|| {
                unit.exception(*a)
                    .decl
                    .scoped
                    .cmp(&unit.exception(*b).decl.scoped)
            })
    });
    out.dedup();
    out
}

// ============================================================================
// Operation attributes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid freeze metadata `{directive}' for operation `{operation}'")]
pub struct InvalidMetadata {
    pub operation: String,
    pub directive: String,
}

const TX_TYPES: [&str; 2] = ["read", "write"];
const TX_ATTRIBUTES: [&str; 4] = ["supports", "mandatory", "required", "never"];

/// Attribute bits from `freeze:read|write[:supports|mandatory|required|never]`,
/// looked up on the operation and then on its interface.
pub fn operation_attributes(unit: &Unit, op: &Operation) -> Result<i32, InvalidMetadata> {
    let directive = op
        .metadata
        .find("freeze:")
        .or_else(|| unit.class(op.owner).decl.metadata.find("freeze:"));
    let Some(directive) = directive else {
        return Ok(0);
    };
    let invalid = || InvalidMetadata {
        operation: op.name.clone(),
        directive: format!("freeze:{directive}"),
    };

    let (tx, rest) = match directive.split_once(':') {
        Some((tx, rest)) => (tx, Some(rest)),
        None => (directive, None),
    };
    let mut result = TX_TYPES
        .iter()
        .position(|t| *t == tx)
        .ok_or_else(invalid)? as i32;
    if let Some(rest) = rest {
        let attr = TX_ATTRIBUTES
            .iter()
            .position(|a| *a == rest)
            .ok_or_else(invalid)? as i32;
        result |= attr << 1;
    }
    Ok(result)
}

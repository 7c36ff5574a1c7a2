//! Request and reply bodies for operations.
//!
//! Each body is one encapsulation. Channels follow [`input_channels`] and
//! [`output_channels`]; when any channel can carry classes the optionals are
//! closed by an end marker and the pending instances follow.

use slicegen_core::layout::{Channel, channels_use_classes, input_channels, output_channels};
use slicegen_core::{Operation, Unit};

use crate::error::{DecodeError, EncodeError};
use crate::marshal::Marshaler;
use crate::unmarshal::Unmarshaler;
use crate::value::{Graph, Record, UserException};

/// Encode in-parameters keyed by parameter name.
pub fn encode_params(
    unit: &Unit,
    graph: &Graph,
    op: &Operation,
    args: &Record,
) -> Result<Vec<u8>, EncodeError> {
    encode_channels(unit, graph, &input_channels(op), args)
}

pub fn decode_params(
    unit: &Unit,
    op: &Operation,
    bytes: &[u8],
) -> Result<(Record, Graph), DecodeError> {
    decode_channels(unit, &input_channels(op), bytes)
}

/// Encode out-parameters and the return value, keyed by name and `returnValue`.
pub fn encode_results(
    unit: &Unit,
    graph: &Graph,
    op: &Operation,
    results: &Record,
) -> Result<Vec<u8>, EncodeError> {
    encode_channels(unit, graph, &output_channels(op), results)
}

pub fn decode_results(
    unit: &Unit,
    op: &Operation,
    bytes: &[u8],
) -> Result<(Record, Graph), DecodeError> {
    decode_channels(unit, &output_channels(op), bytes)
}

pub fn encode_user_exception(
    unit: &Unit,
    graph: &Graph,
    exception: &UserException,
) -> Result<Vec<u8>, EncodeError> {
    let mut m = Marshaler::new(unit);
    m.output().start_encapsulation();
    m.write_exception(graph, exception)?;
    m.output().end_encapsulation();
    Ok(m.finish())
}

pub fn decode_user_exception(
    unit: &Unit,
    bytes: &[u8],
) -> Result<(UserException, Graph), DecodeError> {
    let mut u = Unmarshaler::new(unit, bytes);
    u.input().start_encapsulation()?;
    let exception = u.read_exception()?;
    u.input().end_encapsulation();
    Ok((exception, u.finish()?))
}

fn encode_channels(
    unit: &Unit,
    graph: &Graph,
    channels: &[Channel<'_>],
    values: &Record,
) -> Result<Vec<u8>, EncodeError> {
    let mut m = Marshaler::new(unit);
    m.output().start_encapsulation();
    for channel in channels {
        match (channel.tag, values.get(channel.name)) {
            (None, Some(v)) => m.write(graph, channel.ty, v)?,
            (None, None) => return Err(EncodeError::MissingMember(channel.name.to_string())),
            (Some(tag), Some(v)) => m.write_optional(graph, tag, channel.ty, v)?,
            (Some(_), None) => {}
        }
    }
    if channels_use_classes(unit, channels) {
        m.output().write_optional_end_marker();
        m.write_pending_values(graph)?;
    }
    m.output().end_encapsulation();
    Ok(m.finish())
}

fn decode_channels(
    unit: &Unit,
    channels: &[Channel<'_>],
    bytes: &[u8],
) -> Result<(Record, Graph), DecodeError> {
    let mut u = Unmarshaler::new(unit, bytes);
    u.input().start_encapsulation()?;
    let end = u.input().limit();

    let mut record = Record::new();
    for channel in channels {
        let value = match channel.tag {
            None => Some(u.read(channel.ty)?),
            Some(tag) => u.read_optional(tag, channel.ty, end)?,
        };
        if let Some(value) = value {
            record.insert(channel.name.to_string(), value);
        }
    }
    if channels_use_classes(unit, channels) {
        u.input().skip_optionals(end)?;
        u.read_pending_values()?;
    }
    u.input().end_encapsulation();
    tracing::debug!(values = record.len(), "decoded operation body");
    Ok((record, u.finish()?))
}

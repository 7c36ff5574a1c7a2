#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Reference encoder and decoder for the slicegen wire format.
//!
//! Values are dynamic ([`Value`]) and typed by a resolved [`slicegen_core::Unit`].
//! The byte layout matches what generated Java code reads and writes, so this
//! crate doubles as an executable description of the generated marshaling.
//!
//! Class instances live in a [`Graph`] and are referenced by [`InstanceId`];
//! shared and cyclic references round-trip with their identity intact.

mod error;
mod marshal;
mod operation;
pub mod stream;
mod unmarshal;
mod value;

#[cfg(test)]
mod marshal_tests;
#[cfg(test)]
mod test_utils;

pub use error::{DecodeError, EncodeError};
pub use marshal::Marshaler;
pub use operation::{
    decode_params, decode_results, decode_user_exception, encode_params, encode_results,
    encode_user_exception,
};
pub use stream::{InputStream, OutputStream, SliceHeader};
pub use unmarshal::Unmarshaler;
pub use value::{
    Graph, Instance, InstanceId, Record, SliceInfo, SlicedData, UserException, Value,
};

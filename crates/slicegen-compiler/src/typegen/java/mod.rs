//! Java backend.
//!
//! One compilation unit per generated type: data types with their marshaling code,
//! `<T>Prx` proxies, servant interfaces with dispatch thunks, stream helpers for
//! sequences and dictionaries, and optional `<T>I` skeletons.

mod auxiliary;
mod config;
mod data;
mod dispatch;
mod emitter;
mod enums;
mod helpers;
mod members;
mod metadata;
mod names;
mod proxy;
mod results;
mod skeleton;
mod stream;
mod types;
mod writer;

#[cfg(test)]
mod emitter_tests;
#[cfg(test)]
mod proxy_tests;

pub use config::Config;
pub use emitter::{Emitter, GeneratedFile, Generation, generate};

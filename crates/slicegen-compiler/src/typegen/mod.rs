//! Source generators over a resolved type model.

pub mod java;

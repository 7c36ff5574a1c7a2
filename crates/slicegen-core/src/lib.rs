#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures for slicegen type models.
//!
//! Two layers:
//! - **Deserialization layer**: 1:1 mapping to the resolved-model JSON emitted by the front end
//! - **Analysis layer**: ID-indexed arena (`Unit`) with inheritance and wire-size queries
//!
//! The `layout` module holds the wire ordering rules shared by the code generator
//! and the reference runtime.

use indexmap::IndexMap;

mod invariants;
pub mod layout;
mod model;
mod resolve;
pub mod utils;

#[cfg(test)]
mod lib_tests;
#[cfg(test)]
mod model_tests;
#[cfg(test)]
mod test_utils;

pub use model::{
    Builtin, Class, ClassId, Const, ConstId, ConstValue, Decl, Definition, Dictionary,
    DictionaryId, Enum, EnumId, Enumerator, Exception, ExceptionId, FormatType, Location,
    Member, Metadata, Mode, Module, ModuleId, Operation, Param, ReturnValue, Sequence,
    SequenceId, SourceFile, Struct, StructId, Type, Unit,
};
pub use resolve::ModelError;

// ============================================================================
// Deserialization Layer
// ============================================================================

/// Raw model as produced by the front end.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct RawUnit {
    #[serde(default)]
    pub files: Vec<RawFile>,
    /// Precomputed type checksums keyed by scoped type id.
    #[serde(default)]
    pub checksums: IndexMap<String, String>,
}

/// One source file and its top-level modules.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawFile {
    pub name: String,
    #[serde(default)]
    pub modules: Vec<RawModule>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawModule {
    pub name: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub metadata: Vec<String>,
    #[serde(default)]
    pub modules: Vec<RawModule>,
    #[serde(default)]
    pub definitions: Vec<RawDefinition>,
}

/// A definition inside a module, discriminated by `kind`.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawDefinition {
    Struct(RawStruct),
    Class(RawClass),
    Interface(RawInterface),
    Exception(RawException),
    Enum(RawEnum),
    Sequence(RawSequence),
    Dictionary(RawDictionary),
    Const(RawConst),
}

impl RawDefinition {
    pub fn name(&self) -> &str {
        match self {
            RawDefinition::Struct(d) => &d.name,
            RawDefinition::Class(d) => &d.name,
            RawDefinition::Interface(d) => &d.name,
            RawDefinition::Exception(d) => &d.name,
            RawDefinition::Enum(d) => &d.name,
            RawDefinition::Sequence(d) => &d.name,
            RawDefinition::Dictionary(d) => &d.name,
            RawDefinition::Const(d) => &d.name,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawStruct {
    pub name: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub metadata: Vec<String>,
    #[serde(default)]
    pub members: Vec<RawMember>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawClass {
    pub name: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub metadata: Vec<String>,
    pub base: Option<String>,
    #[serde(default)]
    pub implements: Vec<String>,
    #[serde(default)]
    pub members: Vec<RawMember>,
    #[serde(default)]
    pub operations: Vec<RawOperation>,
    pub compact_id: Option<i32>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawInterface {
    pub name: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub metadata: Vec<String>,
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default)]
    pub operations: Vec<RawOperation>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawException {
    pub name: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub metadata: Vec<String>,
    pub base: Option<String>,
    #[serde(default)]
    pub members: Vec<RawMember>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawEnum {
    pub name: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub metadata: Vec<String>,
    pub enumerators: Vec<RawEnumerator>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawEnumerator {
    pub name: String,
    pub value: Option<i32>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawSequence {
    pub name: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub metadata: Vec<String>,
    pub element: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawDictionary {
    pub name: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub metadata: Vec<String>,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawConst {
    pub name: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub metadata: Vec<String>,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub value: String,
    /// Scoped name of a constant or enumerator this constant refers to.
    pub value_ref: Option<String>,
}

/// Data member of a struct, class or exception. Optional exactly when `tag` is set.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawMember {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub tag: Option<i32>,
    pub default: Option<String>,
    pub default_ref: Option<String>,
    #[serde(default)]
    pub metadata: Vec<String>,
    #[serde(default)]
    pub line: u32,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawOperation {
    pub name: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub metadata: Vec<String>,
    #[serde(default)]
    pub params: Vec<RawParam>,
    pub returns: Option<RawReturn>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub format: FormatType,
    #[serde(default)]
    pub throws: Vec<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawParam {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub out: bool,
    pub tag: Option<i32>,
    #[serde(default)]
    pub metadata: Vec<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RawReturn {
    #[serde(rename = "type")]
    pub type_name: String,
    pub tag: Option<i32>,
    #[serde(default)]
    pub metadata: Vec<String>,
}

/// Parse resolved-model JSON into the raw layer.
pub fn parse_unit(json: &str) -> Result<RawUnit, serde_json::Error> {
    serde_json::from_str(json)
}

/// Parse and resolve in one step.
pub fn load_unit(json: &str) -> Result<Unit, ModelError> {
    let raw = parse_unit(json)?;
    Unit::from_raw(raw)
}

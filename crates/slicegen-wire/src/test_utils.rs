//! Shared fixtures for wire tests.

use slicegen_core::{ClassId, Definition, ExceptionId, Operation, Type, Unit, load_unit};

/// Definitions every fixture unit shares.
const COMMON: &str = indoc::indoc! {r#"
    {"kind": "struct", "name": "Point", "members": [
      {"name": "x", "type": "int"},
      {"name": "y", "type": "int"}
    ]},
    {"kind": "enum", "name": "Color", "enumerators": [
      {"name": "red"}, {"name": "green"}, {"name": "blue"}
    ]},
    {"kind": "class", "name": "Node", "members": [
      {"name": "value", "type": "int"},
      {"name": "next", "type": "::W::Node"}
    ]},
    {"kind": "class", "name": "Base", "metadata": ["preserve-slice"], "members": [
      {"name": "id", "type": "int"},
      {"name": "label", "type": "string", "tag": 2}
    ]},
    {"kind": "class", "name": "Derived", "base": "::W::Base", "members": [
      {"name": "extra", "type": "int"},
      {"name": "note", "type": "string", "tag": 1},
      {"name": "code", "type": "int", "tag": 3}
    ]},
    {"kind": "class", "name": "Plain", "members": [
      {"name": "n", "type": "int"}
    ]},
    {"kind": "class", "name": "Tags", "members": [
      {"name": "a", "type": "int", "tag": 1},
      {"name": "c", "type": "int", "tag": 3},
      {"name": "b", "type": "int", "tag": 2}
    ]},
    {"kind": "exception", "name": "Err", "members": [
      {"name": "reason", "type": "string"}
    ]},
    {"kind": "interface", "name": "Api", "operations": [
      {"name": "op",
       "params": [
         {"name": "a", "type": "int"},
         {"name": "b", "type": "string", "tag": 1}
       ],
       "returns": {"type": "int", "tag": 0}},
      {"name": "fetch",
       "params": [{"name": "hint", "type": "::W::Point", "out": true}],
       "returns": {"type": "::W::Node"}}
    ]},
    {"kind": "enum", "name": "Shade", "enumerators": [
      {"name": "dark", "value": 0}, {"name": "light", "value": 4}
    ]},
    {"kind": "sequence", "name": "Proxies", "element": "Object*"},
    {"kind": "dictionary", "name": "Links", "key": "string", "value": "::W::Node*"}
"#};

/// Definitions only the newer peer knows about.
const NEWER: &str = indoc::indoc! {r#"
    {"kind": "class", "name": "Leaf", "base": "::W::Derived", "compact_id": 9, "members": [
      {"name": "depth", "type": "int"}
    ]},
    {"kind": "class", "name": "PlainChild", "base": "::W::Plain", "members": [
      {"name": "m", "type": "int"}
    ]},
    {"kind": "class", "name": "Orphan", "members": [
      {"name": "o", "type": "int"}
    ]},
    {"kind": "exception", "name": "Loud", "base": "::W::Err", "members": [
      {"name": "volume", "type": "int"}
    ]}
"#};

fn unit_with(definitions: &str) -> Unit {
    load_unit(&format!(
        r#"{{"files": [{{"name": "W.ice", "modules": [{{"name": "W", "definitions": [{definitions}]}}]}}]}}"#
    ))
    .unwrap()
}

/// Unit with every fixture definition.
pub fn newer_unit() -> Unit {
    unit_with(&format!("{COMMON}, {NEWER}"))
}

/// Unit missing the definitions a newer peer may send.
pub fn older_unit() -> Unit {
    unit_with(COMMON)
}

pub fn class(unit: &Unit, name: &str) -> ClassId {
    match unit.lookup(&format!("::W::{name}")) {
        Some(Definition::Class(id)) => id,
        other => panic!("{name} is {other:?}"),
    }
}

pub fn exception(unit: &Unit, name: &str) -> ExceptionId {
    match unit.lookup(&format!("::W::{name}")) {
        Some(Definition::Exception(id)) => id,
        other => panic!("{name} is {other:?}"),
    }
}

pub fn ty(unit: &Unit, name: &str) -> Type {
    match unit.lookup(&format!("::W::{name}")) {
        Some(Definition::Struct(id)) => Type::Struct(id),
        Some(Definition::Enum(id)) => Type::Enum(id),
        Some(Definition::Class(id)) => Type::Class(id),
        Some(Definition::Sequence(id)) => Type::Sequence(id),
        Some(Definition::Dictionary(id)) => Type::Dictionary(id),
        other => panic!("{name} is {other:?}"),
    }
}

pub fn operation<'u>(unit: &'u Unit, name: &str) -> &'u Operation {
    let api = class(unit, "Api");
    unit.class(api)
        .operations
        .iter()
        .find(|op| op.name == name)
        .unwrap()
}

/// Build a record from `(name, value)` pairs.
#[macro_export]
macro_rules! record {
    ($($name:literal => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut r = $crate::Record::new();
        $(r.insert($name.to_string(), $value);)*
        r
    }};
}

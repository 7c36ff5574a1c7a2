//! Shared fixtures for unit tests.

use crate::{Definition, Unit, load_unit};

pub const DEMO_MODEL: &str = indoc::indoc! {r#"
    {
      "files": [{
        "name": "Demo.ice",
        "modules": [{
          "name": "Demo",
          "line": 1,
          "metadata": ["java:package:com.acme"],
          "definitions": [
            {"kind": "struct", "name": "Point", "line": 3, "members": [
              {"name": "x", "type": "int"},
              {"name": "y", "type": "int"}
            ]},
            {"kind": "struct", "name": "Named", "line": 4, "members": [
              {"name": "name", "type": "string"},
              {"name": "at", "type": "::Demo::Point"}
            ]},
            {"kind": "enum", "name": "Color", "line": 6, "enumerators": [
              {"name": "red"}, {"name": "green"}, {"name": "blue", "value": 4}
            ]},
            {"kind": "class", "name": "Base", "line": 8, "metadata": ["preserve-slice"], "members": [
              {"name": "id", "type": "int"},
              {"name": "label", "type": "string", "tag": 2}
            ]},
            {"kind": "class", "name": "Derived", "line": 9, "base": "::Demo::Base", "compact_id": 7,
             "members": [
              {"name": "peer", "type": "::Demo::Base", "tag": 1},
              {"name": "color", "type": "::Demo::Color", "default": "green"}
            ]},
            {"kind": "exception", "name": "Err", "line": 12, "members": [
              {"name": "reason", "type": "string"}
            ]},
            {"kind": "exception", "name": "Loud", "line": 13, "base": "::Demo::Err", "members": [
              {"name": "volume", "type": "int"}
            ]},
            {"kind": "interface", "name": "Greeter", "line": 15, "operations": [
              {"name": "greet", "mode": "idempotent",
               "params": [{"name": "name", "type": "string"}],
               "returns": {"type": "string"}},
              {"name": "count",
               "params": [
                 {"name": "a", "type": "int", "out": true},
                 {"name": "b", "type": "string", "out": true, "tag": 3}
               ],
               "returns": {"type": "int", "tag": 2}}
            ]},
            {"kind": "interface", "name": "Shouter", "line": 20, "bases": ["::Demo::Greeter"], "operations": [
              {"name": "shout", "params": [{"name": "msg", "type": "string"}],
               "throws": ["::Demo::Err", "::Demo::Loud"]}
            ]},
            {"kind": "sequence", "name": "IntSeq", "line": 24, "element": "int"},
            {"kind": "sequence", "name": "BaseSeq", "line": 25, "element": "::Demo::Base"},
            {"kind": "dictionary", "name": "PointMap", "line": 26, "key": "string", "value": "::Demo::Point"},
            {"kind": "const", "name": "MaxCount", "line": 28, "type": "long", "value": "42"},
            {"kind": "const", "name": "Favorite", "line": 29, "type": "::Demo::Color", "value_ref": "::Demo::Color::blue"}
          ]
        }]
      }]
    }
"#};

pub fn demo_unit() -> Unit {
    load_unit(DEMO_MODEL).unwrap()
}

pub fn def(unit: &Unit, scoped: &str) -> Definition {
    unit.lookup(scoped)
        .unwrap_or_else(|| panic!("{scoped} not in fixture"))
}

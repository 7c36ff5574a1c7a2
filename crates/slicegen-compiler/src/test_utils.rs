//! Shared fixtures for generator tests.

use slicegen_core::{Unit, load_unit};

use crate::{Config, Generation, generate};

pub const SHOP_MODEL: &str = indoc::indoc! {r#"
    {
      "files": [{
        "name": "Shop.ice",
        "modules": [{
          "name": "Shop",
          "line": 1,
          "metadata": ["java:package:com.acme"],
          "definitions": [
            {"kind": "struct", "name": "Item", "line": 3, "members": [
              {"name": "name", "type": "string"},
              {"name": "price", "type": "double"}
            ]},
            {"kind": "enum", "name": "Status", "line": 5, "enumerators": [
              {"name": "open"}, {"name": "closed"}
            ]},
            {"kind": "sequence", "name": "ItemSeq", "line": 6, "element": "::Shop::Item"},
            {"kind": "sequence", "name": "Names", "line": 7, "element": "string",
             "metadata": ["java:type:java.util.ArrayList<String>"]},
            {"kind": "dictionary", "name": "Prices", "line": 8, "key": "string", "value": "double"},
            {"kind": "class", "name": "Note", "line": 10, "members": [
              {"name": "text", "type": "string"},
              {"name": "urgent", "type": "bool", "tag": 1}
            ]},
            {"kind": "class", "name": "Cart", "line": 12, "compact_id": 3,
             "members": [{"name": "items", "type": "::Shop::ItemSeq", "line": 13}],
             "operations": [{"name": "total", "line": 14, "returns": {"type": "double"}}]},
            {"kind": "exception", "name": "NotFound", "line": 16, "members": [
              {"name": "id", "type": "string"}
            ]},
            {"kind": "interface", "name": "Catalog", "line": 18, "operations": [
              {"name": "find", "line": 19, "mode": "idempotent",
               "params": [{"name": "id", "type": "string"}],
               "returns": {"type": "::Shop::Item"},
               "throws": ["::Shop::NotFound"]},
              {"name": "list", "line": 20,
               "params": [
                 {"name": "items", "type": "::Shop::ItemSeq", "out": true},
                 {"name": "more", "type": "bool", "out": true}
               ],
               "returns": {"type": "int"}},
              {"name": "attach", "line": 21,
               "params": [
                 {"name": "note", "type": "::Shop::Note"},
                 {"name": "memo", "type": "string", "tag": 1}
               ]},
              {"name": "latest", "line": 22, "returns": {"type": "::Shop::Note"}},
              {"name": "refresh", "line": 23, "metadata": ["amd"],
               "returns": {"type": "::Shop::Status"}},
              {"name": "snapshot", "line": 24, "metadata": ["marshaled-result"],
               "params": [{"name": "count", "type": "int", "out": true}],
               "returns": {"type": "::Shop::ItemSeq"}},
              {"name": "legacy", "line": 25, "metadata": ["deprecate"]},
              {"name": "audit", "line": 26, "metadata": ["freeze:write"]}
            ]},
            {"kind": "interface", "name": "Admin", "line": 28, "bases": ["::Shop::Catalog"],
             "operations": [{"name": "reset", "line": 29}]},
            {"kind": "const", "name": "Limit", "line": 31, "type": "int", "value": "10"}
          ]
        }]
      }]
    }
"#};

/// Declarations whose generated order or naming differs from their declared order or name.
pub const EDGE_MODEL: &str = indoc::indoc! {r#"
    {
      "files": [{
        "name": "Edge.ice",
        "modules": [{
          "name": "Edge",
          "line": 1,
          "definitions": [
            {"kind": "class", "name": "Tagged", "line": 2, "members": [
              {"name": "a", "type": "int", "tag": 1},
              {"name": "c", "type": "int", "tag": 3},
              {"name": "b", "type": "int", "tag": 2}
            ]},
            {"kind": "class", "name": "Keep", "line": 4, "metadata": ["preserve-slice"],
             "members": [{"name": "n", "type": "int"}]},
            {"kind": "exception", "name": "A", "line": 6},
            {"kind": "exception", "name": "B", "line": 7, "base": "::Edge::A"},
            {"kind": "sequence", "name": "Ints", "line": 8, "element": "int"},
            {"kind": "struct", "name": "Bag", "line": 9, "metadata": ["java:serialVersionUID:42"],
             "members": [
               {"name": "items", "type": "::Edge::Ints"},
               {"name": "label", "type": "string"}
             ]},
            {"kind": "struct", "name": "Odd", "line": 11, "metadata": ["java:serialVersionUID:abc"],
             "members": [{"name": "x", "type": "int"}]},
            {"kind": "interface", "name": "Svc", "line": 13, "operations": [
              {"name": "risky", "line": 14, "throws": ["::Edge::A", "::Edge::B"]},
              {"name": "pair", "line": 15,
               "params": [
                 {"name": "x", "type": "string", "out": true, "tag": 1},
                 {"name": "y", "type": "int", "out": true, "tag": 3},
                 {"name": "z", "type": "int", "out": true}
               ],
               "returns": {"type": "int", "tag": 2}},
              {"name": "clash", "line": 16,
               "params": [{"name": "returnValue", "type": "int", "out": true}],
               "returns": {"type": "string"}},
              {"name": "mclash", "line": 17, "metadata": ["marshaled-result"],
               "params": [{"name": "returnValue", "type": "int"}],
               "returns": {"type": "string"}}
            ]},
            {"kind": "const", "name": "Accent", "line": 19, "type": "string", "value": "é😀"},
            {"kind": "const", "name": "Full", "line": 20, "type": "byte", "value": "0xFF"}
          ]
        }]
      }]
    }
"#};

pub fn shop_unit() -> Unit {
    load_unit(SHOP_MODEL).unwrap()
}

/// Generate with `config` from a model given as JSON.
pub fn generate_json(json: &str, config: &Config) -> Generation {
    let unit = load_unit(json).unwrap();
    generate(&unit, config)
}

/// Contents of the generated file at `path`.
pub fn file<'g>(generation: &'g Generation, path: &str) -> &'g str {
    generation
        .files
        .iter()
        .find(|f| f.path == path)
        .map(|f| f.contents.as_str())
        .unwrap_or_else(|| {
            let paths: Vec<&str> = generation.files.iter().map(|f| f.path.as_str()).collect();
            panic!("{path} not generated; have {paths:?}")
        })
}

/// Paths of every generated file, in emission order.
pub fn paths(generation: &Generation) -> Vec<&str> {
    generation.files.iter().map(|f| f.path.as_str()).collect()
}

/// `text` shifted one level right, matching members written inside a class body.
pub fn indented(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                "\n".to_string()
            } else {
                format!("    {line}\n")
            }
        })
        .collect()
}

/// The declaration starting at the first line containing `header`, through the brace that
/// closes it, shifted back to column zero.
pub fn section(text: &str, header: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines
        .iter()
        .position(|line| line.contains(header))
        .unwrap_or_else(|| panic!("no line contains {header:?}"));
    let indent = lines[start].len() - lines[start].trim_start().len();
    let close = format!("{}}}", &lines[start][..indent]);
    let end = lines[start + 1..]
        .iter()
        .position(|line| line.starts_with(&close))
        .map(|offset| start + 1 + offset)
        .unwrap_or_else(|| panic!("{header:?} is never closed"));
    lines[start..=end]
        .iter()
        .map(|line| line.get(indent..).unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n")
}
